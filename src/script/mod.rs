//! Модуль для работы со сценариями диалогов
//!
//! Этот модуль содержит разбор сценария "Speaker: text" и чтение сценариев
//! из проектов (`meta.json`).

pub mod parser;
pub mod project;

pub use parser::{parse_script, render_script, ScriptLine};
