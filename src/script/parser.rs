//! Модуль для парсинга сценариев
//!
//! Сценарий состоит из строк вида `Speaker: text`. Строки без двоеточия или
//! с пустым текстом молча отбрасываются.

/// Одна реплика сценария
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// Имя говорящего в нижнем регистре ("male", "female", ...)
    pub speaker: String,
    /// Текст реплики, всегда непустой
    pub text: String,
}

impl ScriptLine {
    /// Создать новый экземпляр ScriptLine
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

/// Парсинг текста сценария
///
/// Строки разделяются любым символом конца строки, включая одиночный `\r`
/// и `\u{2028}`.
pub fn parse_script(script_text: &str) -> Vec<ScriptLine> {
    script_text
        .split(is_line_terminator)
        .filter_map(parse_line)
        .collect()
}

fn is_line_terminator(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Парсинг одной строки сценария
fn parse_line(raw: &str) -> Option<ScriptLine> {
    let line = raw.trim();
    if line.is_empty() {
        return None;
    }

    let (speaker, text) = line.split_once(':')?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    Some(ScriptLine::new(speaker.trim().to_lowercase(), text))
}

/// Собрать сценарий обратно в текст, по реплике на строку
pub fn render_script(lines: &[ScriptLine]) -> String {
    lines
        .iter()
        .map(|line| format!("{}: {}", line.speaker, line.text))
        .collect::<Vec<_>>()
        .join("\n")
}
