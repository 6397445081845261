//! Модуль обработки ошибок библиотеки podcast-assembly
//!
//! Этот модуль содержит типы ошибок, которые могут возникнуть при сборке подкаста.

use thiserror::Error;

use crate::tts::SynthesisError;

/// Сообщение для пользователя, если в сценарии нет ни одной реплики
pub const EMPTY_SCRIPT_MESSAGE: &str = "No valid 'Speaker: text' lines found in the script.";

/// Ошибки библиотеки podcast-assembly
#[derive(Debug, Error)]
pub enum PodcastError {
    /// В сценарии нет ни одной строки вида "Speaker: text"
    #[error("{}", EMPTY_SCRIPT_MESSAGE)]
    EmptyScript,

    /// Движок синтеза не смог озвучить реплику
    #[error("Synthesis failed for line {index} ({speaker}): {source}")]
    Synthesis {
        index: usize,
        speaker: String,
        #[source]
        source: SynthesisError,
    },

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации/десериализации JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Ошибка создания архива
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Ошибка декодирования аудио
    #[error("Audio decoding error: {0}")]
    Decode(String),

    /// Ошибка обработки аудио
    #[error("Audio processing error: {0}")]
    AudioProcessing(String),

    /// Ошибка сохранения итогового файла
    #[error("Export error: {0}")]
    Export(String),

    /// Ошибка конфигурации
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Файл не найден
    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl PodcastError {
    /// Ошибка, которую можно показать пользователю как есть (не сбой программы)
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::EmptyScript | Self::Configuration(_))
    }
}

impl From<hound::Error> for PodcastError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => PodcastError::Io(io),
            other => PodcastError::Decode(other.to_string()),
        }
    }
}

/// Тип Result для библиотеки podcast-assembly
pub type Result<T> = std::result::Result<T, PodcastError>;
