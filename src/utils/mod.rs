//! Вспомогательные модули: вызов FFmpeg, безопасные имена файлов, логирование

pub mod ffmpeg;
pub mod logging;
pub mod naming;
