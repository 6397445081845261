//! Модуль для работы с движком синтеза речи
//!
//! Движок синтеза внешний: библиотеке нужен только трейт [`SpeechSynthesizer`].
//! Здесь же лежат выбор голоса, преобразование результата синтеза в
//! [`AudioBuffer`](crate::media::audio::AudioBuffer), кэш и HTTP клиент.

pub mod cache;
pub mod http;
pub mod router;
pub mod utterance;

use thiserror::Error;

pub use cache::CachedSynthesizer;
pub use http::HttpSynthesizer;
pub use router::{gesture_voice, route_voice};
pub use utterance::{synthesize_utterance, SYNTHESIS_LANG, SYNTHESIS_SPEED};

/// Результат синтеза: моно семплы и частота дискретизации
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedSpeech {
    /// PCM семплы, ожидаемый диапазон [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Частота дискретизации в Гц
    pub sample_rate: u32,
}

impl SynthesizedSpeech {
    /// Создать новый экземпляр SynthesizedSpeech
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    /// Длительность в секундах
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Ошибки движка синтеза
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Движок не смог обработать пару текст/голос
    #[error("engine error: {0}")]
    Engine(String),

    /// Ошибка HTTP запроса
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Сервис вернул неуспешный статус
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Пустой ответ
    #[error("engine returned no audio")]
    EmptyOutput,

    /// Ответ не удалось декодировать
    #[error("cannot decode engine output: {0}")]
    Decode(String),
}

/// Движок синтеза речи
///
/// Реализация может держать загруженную модель; один экземпляр используется
/// последовательно на протяжении всего пакета сценариев.
pub trait SpeechSynthesizer {
    /// Озвучить текст заданным голосом
    fn synthesize(
        &self,
        text: &str,
        voice: &str,
        speed: f32,
        lang: &str,
    ) -> Result<SynthesizedSpeech, SynthesisError>;
}

impl<T: SpeechSynthesizer + ?Sized> SpeechSynthesizer for Box<T> {
    fn synthesize(
        &self,
        text: &str,
        voice: &str,
        speed: f32,
        lang: &str,
    ) -> Result<SynthesizedSpeech, SynthesisError> {
        (**self).synthesize(text, voice, speed, lang)
    }
}
