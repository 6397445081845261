//! Реплики-реакции второго ведущего
//!
//! С вероятностью `probability` поверх реплики накладывается короткая фраза
//! ("yeah", "right") голосом собеседника. Смещение выбирается равномерно в
//! диапазоне 20%-80% длины реплики, длина реплики не меняется.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{GestureConfig, VoiceConfig};
use crate::media::audio::AudioBuffer;
use crate::tts::{gesture_voice, synthesize_utterance, SpeechSynthesizer, SynthesisError};

/// Границы смещения реакции относительно длины реплики
const OFFSET_RANGE: (f64, f64) = (0.2, 0.8);

/// Наложенная реакция
#[derive(Debug, Clone, PartialEq)]
pub struct GestureOverlay {
    pub phrase: String,
    pub voice: String,
    /// Смещение начала реакции в семплах
    pub offset: usize,
}

/// Нужна ли реакция для текущей реплики
///
/// Случайное число тянется только когда реакции включены и есть фразы.
pub fn should_gesture<R: Rng + ?Sized>(config: &GestureConfig, rng: &mut R) -> bool {
    config.enabled && !config.phrase_pool.is_empty() && rng.gen::<f64>() < config.probability
}

/// Смещение реакции для реплики длиной `utterance_len` семплов
pub fn gesture_offset<R: Rng + ?Sized>(utterance_len: usize, rng: &mut R) -> usize {
    let fraction = rng.gen_range(OFFSET_RANGE.0..=OFFSET_RANGE.1);
    (fraction * utterance_len as f64) as usize
}

/// Возможно наложить реакцию на `utterance`
///
/// Возвращает описание наложенной реакции или `None`, если реакции не было.
/// Ошибка синтеза реакции прерывает сборку так же, как ошибка основной реплики.
pub fn maybe_overlay_gesture<S, R>(
    utterance: &mut AudioBuffer,
    speaker: &str,
    config: &GestureConfig,
    voices: &VoiceConfig,
    synthesizer: &S,
    rng: &mut R,
) -> Result<Option<GestureOverlay>, SynthesisError>
where
    S: SpeechSynthesizer + ?Sized,
    R: Rng + ?Sized,
{
    if !should_gesture(config, rng) {
        return Ok(None);
    }
    let Some(phrase) = config.phrase_pool.choose(rng) else {
        return Ok(None);
    };

    let voice = gesture_voice(speaker, voices);
    let gesture = synthesize_utterance(synthesizer, phrase, voice, Some(utterance.sample_rate()))?;
    if utterance.is_empty() || gesture.is_empty() {
        return Ok(None);
    }

    let offset = gesture_offset(utterance.len(), rng);
    utterance.overlay(&gesture, offset);
    log::debug!("Gesture {:?} ({}) at sample {}", phrase, voice, offset);

    Ok(Some(GestureOverlay {
        phrase: phrase.clone(),
        voice: voice.to_string(),
        offset,
    }))
}
