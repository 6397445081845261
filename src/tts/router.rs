//! Выбор голоса по имени говорящего

use crate::config::VoiceConfig;

/// Метка женского ведущего; остальные метки озвучиваются мужским голосом
pub const FEMALE: &str = "female";

/// Голос для реплики
///
/// Любая нераспознанная метка ("host", "narrator") озвучивается мужским голосом.
pub fn route_voice<'a>(speaker: &str, voices: &'a VoiceConfig) -> &'a str {
    match speaker {
        FEMALE => &voices.female_voice,
        _ => &voices.male_voice,
    }
}

/// Голос для реакции на реплику: всегда противоположный говорящему
pub fn gesture_voice<'a>(speaker: &str, voices: &'a VoiceConfig) -> &'a str {
    match speaker {
        FEMALE => &voices.male_voice,
        _ => &voices.female_voice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> VoiceConfig {
        VoiceConfig {
            male_voice: "am_michael".to_string(),
            female_voice: "af_sky".to_string(),
        }
    }

    #[test]
    fn test_known_speakers() {
        let voices = voices();
        assert_eq!(route_voice("male", &voices), "am_michael");
        assert_eq!(route_voice("female", &voices), "af_sky");
    }

    #[test]
    fn test_unknown_speakers_use_default() {
        let voices = voices();
        for speaker in ["host", "narrator", "", "Female", "speaker 1"] {
            assert_eq!(route_voice(speaker, &voices), "am_michael", "speaker {:?}", speaker);
        }
    }

    #[test]
    fn test_gesture_voice_is_opposite() {
        let voices = voices();
        for speaker in ["male", "female", "host", ""] {
            let main = route_voice(speaker, &voices);
            let gesture = gesture_voice(speaker, &voices);
            assert_ne!(main, gesture, "speaker {:?}", speaker);
        }
        assert_eq!(gesture_voice("narrator", &voices), "af_sky");
    }
}
