//! Модуль для построения безопасных имен файлов

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

/// Максимальная длина основы имени файла
const MAX_STEM_LEN: usize = 60;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_\-]+").unwrap();
}

/// Безопасная основа имени файла
///
/// Берется имя файла без расширения, каждая группа недопустимых символов
/// заменяется на `_`, результат обрезается до 60 символов. Если ничего не
/// осталось, возвращаются первые 8 символов случайного UUID.
pub fn safe_stem(name: &str) -> String {
    let base = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let stem: String = UNSAFE_CHARS
        .replace_all(&base, "_")
        .chars()
        .take(MAX_STEM_LEN)
        .collect();

    if stem.is_empty() {
        uuid::Uuid::new_v4().to_string()[..8].to_string()
    } else {
        stem
    }
}

/// Добавить `.mp3`, если у имени нет поддерживаемого расширения
pub fn ensure_audio_extension(name: &str) -> String {
    let lower = name.to_lowercase();
    if lower.ends_with(".mp3") || lower.ends_with(".wav") {
        name.to_string()
    } else {
        format!("{}.mp3", name)
    }
}
