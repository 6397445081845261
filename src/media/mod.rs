//! Модуль для работы с аудио
//!
//! Буферы в памяти, декодирование, передискретизация, фоновая музыка и
//! сохранение итогового файла.

pub mod audio;
pub mod decode;
pub mod export;
pub mod music;
pub mod resample;

pub use audio::AudioBuffer;
pub use export::{export_audio, ExportFormat};
pub use music::{mix_background, MixOutcome, MixStage, TrackLibrary};
