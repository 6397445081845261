//! Озвучивание одной реплики
//!
//! Движок вызывается с фиксированными скоростью и языком, результат
//! квантуется в [`AudioBuffer`]. Если движок вернул аудио с частотой,
//! отличной от опорной частоты прогона, оно передискретизируется.

use crate::media::audio::AudioBuffer;
use crate::media::resample::resample_mono;
use crate::tts::{SpeechSynthesizer, SynthesisError};

/// Скорость речи для всех вызовов движка
pub const SYNTHESIS_SPEED: f32 = 1.0;

/// Язык для всех вызовов движка
pub const SYNTHESIS_LANG: &str = "en-us";

/// Озвучить `text` голосом `voice`
///
/// `reference_rate` - частота первой реплики прогона; `None` для самой первой.
pub fn synthesize_utterance<S: SpeechSynthesizer + ?Sized>(
    synthesizer: &S,
    text: &str,
    voice: &str,
    reference_rate: Option<u32>,
) -> Result<AudioBuffer, SynthesisError> {
    let speech = synthesizer.synthesize(text, voice, SYNTHESIS_SPEED, SYNTHESIS_LANG)?;
    if speech.sample_rate == 0 {
        return Err(SynthesisError::Engine(format!(
            "engine reported a zero sample rate for voice {}",
            voice
        )));
    }

    log::debug!(
        "Synthesized {:.2}s with voice {} at {} Hz",
        speech.duration_seconds(),
        voice,
        speech.sample_rate
    );

    match reference_rate {
        Some(rate) if rate != speech.sample_rate => {
            log::warn!(
                "Engine returned {} Hz for voice {}, resampling to {} Hz",
                speech.sample_rate,
                voice,
                rate
            );
            let samples = resample_mono(&speech.samples, speech.sample_rate, rate)
                .map_err(|e| SynthesisError::Decode(e.to_string()))?;
            Ok(AudioBuffer::from_f32(&samples, rate))
        }
        _ => Ok(AudioBuffer::from_f32(&speech.samples, speech.sample_rate)),
    }
}
