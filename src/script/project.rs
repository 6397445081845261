//! Модуль для чтения сценариев из проектов
//!
//! Каждый проект лежит в своей директории и содержит `meta.json` с полями
//! `title` и `script`. Поле `script` может быть списком строк или одной строкой.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{PodcastError, Result};
use crate::utils::naming::safe_stem;

/// Имя файла метаданных проекта
pub const META_FILE_NAME: &str = "meta.json";

/// Интересующие нас поля `meta.json`
#[derive(Debug, Default, Deserialize)]
struct ProjectMeta {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    script: Value,
}

/// Путь к `meta.json` проекта
pub fn meta_path(projects_dir: &Path, project_id: &str) -> PathBuf {
    projects_dir.join(project_id).join(META_FILE_NAME)
}

/// Список идентификаторов проектов, у которых есть `meta.json`, в отсортированном виде
pub fn list_project_ids(projects_dir: &Path) -> Result<Vec<String>> {
    if !projects_dir.exists() {
        return Ok(Vec::new());
    }

    let mut ids = Vec::new();
    for entry in std::fs::read_dir(projects_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if entry.path().join(META_FILE_NAME).exists() {
            ids.push(entry.file_name().to_string_lossy().to_string());
        }
    }

    ids.sort();
    Ok(ids)
}

fn read_meta(projects_dir: &Path, project_id: &str) -> Result<ProjectMeta> {
    let path = meta_path(projects_dir, project_id);
    let content = std::fs::read_to_string(&path)
        .map_err(|e| PodcastError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&content)?)
}

/// Загрузить строки сценария проекта
///
/// Пустой результат означает, что сценария нет: файл отсутствует, не читается
/// или поле `script` пустое.
pub fn load_script_lines(projects_dir: &Path, project_id: &str) -> Vec<String> {
    let meta = match read_meta(projects_dir, project_id) {
        Ok(meta) => meta,
        Err(e) => {
            log::warn!("Cannot read script of project {}: {}", project_id, e);
            return Vec::new();
        }
    };

    match meta.script {
        Value::String(text) => text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(line) => Some(line),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Имя итогового файла для проекта: безопасная основа из `title` или идентификатор
pub fn default_output_name(projects_dir: &Path, project_id: &str) -> String {
    let stem = match read_meta(projects_dir, project_id) {
        Ok(ProjectMeta { title: Some(title), .. }) if !title.trim().is_empty() => safe_stem(&title),
        _ => project_id.to_string(),
    };
    format!("{}.mp3", stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_project(root: &Path, id: &str, meta: &str) {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(META_FILE_NAME), meta).unwrap();
    }

    #[test]
    fn test_list_project_ids() {
        let root = tempfile::tempdir().unwrap();
        write_project(root.path(), "b-project", "{}");
        write_project(root.path(), "a-project", "{}");
        std::fs::create_dir_all(root.path().join("no-meta")).unwrap();
        std::fs::write(root.path().join("stray.txt"), "x").unwrap();

        let ids = list_project_ids(root.path()).unwrap();
        assert_eq!(ids, vec!["a-project", "b-project"]);

        assert!(list_project_ids(&root.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn test_script_as_list_or_string() {
        let root = tempfile::tempdir().unwrap();
        write_project(root.path(), "list", r#"{"script": ["Male: Hi", "Female: Hello", 42]}"#);
        write_project(root.path(), "text", r#"{"script": "Male: Hi\n\n  \nFemale: Hello\n"}"#);
        write_project(root.path(), "none", r#"{"title": "No script"}"#);
        write_project(root.path(), "broken", "{not json");

        assert_eq!(load_script_lines(root.path(), "list"), vec!["Male: Hi", "Female: Hello"]);
        assert_eq!(load_script_lines(root.path(), "text"), vec!["Male: Hi", "Female: Hello"]);
        assert!(load_script_lines(root.path(), "none").is_empty());
        assert!(load_script_lines(root.path(), "broken").is_empty());
        assert!(load_script_lines(root.path(), "missing").is_empty());
    }

    #[test]
    fn test_default_output_name() {
        let root = tempfile::tempdir().unwrap();
        write_project(root.path(), "p1", r#"{"title": "Attention Is All You Need!"}"#);
        write_project(root.path(), "p2", r#"{"title": ""}"#);

        assert_eq!(default_output_name(root.path(), "p1"), "Attention_Is_All_You_Need_.mp3");
        assert_eq!(default_output_name(root.path(), "p2"), "p2.mp3");
        assert_eq!(default_output_name(root.path(), "p3"), "p3.mp3");
    }
}
