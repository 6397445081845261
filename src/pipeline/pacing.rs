//! Паузы между репликами

use rand::Rng;

use crate::config::PacingConfig;
use crate::media::audio::AudioBuffer;

/// Длительность паузы после реплики в секундах
///
/// Если случайные паузы выключены, всегда возвращается `max_seconds`.
pub fn pause_seconds<R: Rng + ?Sized>(config: &PacingConfig, rng: &mut R) -> f64 {
    if config.enabled && config.max_seconds > config.min_seconds {
        rng.gen_range(config.min_seconds..=config.max_seconds)
    } else {
        config.max_seconds
    }
}

/// Тишина после реплики; `None`, если пауза нулевая
pub fn pause_after_utterance<R: Rng + ?Sized>(
    config: &PacingConfig,
    sample_rate: u32,
    rng: &mut R,
) -> Option<AudioBuffer> {
    let seconds = pause_seconds(config, rng);
    let silence = AudioBuffer::silence(seconds, sample_rate);
    if silence.is_empty() {
        None
    } else {
        Some(silence)
    }
}
