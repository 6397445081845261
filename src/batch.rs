//! Пакетная сборка подкастов
//!
//! Элементы пакета ([`BatchItem`]) собираются из текстовых файлов сценариев
//! или из проектов с `meta.json`. [`BatchRunner`] обрабатывает их строго по
//! очереди одним движком синтеза; ошибка одного элемента записывается в отчет
//! и не останавливает пакет. [`OutputDirectory`] отвечает за директорию
//! результатов: список файлов, явная очистка и ZIP архив.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::Rng;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::PodcastConfig;
use crate::error::Result;
use crate::media::music::TrackLibrary;
use crate::pipeline::{run_pipeline, PipelineJob, PipelineResult};
use crate::progress::ProgressTracker;
use crate::script::project::{default_output_name, load_script_lines};
use crate::tts::SpeechSynthesizer;
use crate::utils::naming::safe_stem;

/// Сообщение для проекта без сценария
pub const MISSING_PROJECT_SCRIPT: &str = "No script found in meta.json";

/// Расширения файлов результата
const AUDIO_EXTENSIONS: [&str; 2] = ["mp3", "wav"];

/// Один сценарий пакета
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    /// Имя для отчета: имя файла или идентификатор проекта
    pub name: String,
    pub output_file_name: String,
    /// Текст сценария или причина, по которой его не удалось получить
    pub script: std::result::Result<String, String>,
}

impl BatchItem {
    pub fn new(
        name: impl Into<String>,
        output_file_name: impl Into<String>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            output_file_name: output_file_name.into(),
            script: Ok(script.into()),
        }
    }

    /// Сценарий из текстового файла; невалидный UTF-8 заменяется
    pub fn from_text_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let output_file_name = format!("{}.mp3", safe_stem(&name));

        let script = std::fs::read(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e));

        Self {
            name,
            output_file_name,
            script,
        }
    }

    /// Сценарий из `meta.json` проекта
    pub fn from_project(projects_dir: &Path, project_id: &str) -> Self {
        let lines = load_script_lines(projects_dir, project_id);
        let script = if lines.is_empty() {
            Err(MISSING_PROJECT_SCRIPT.to_string())
        } else {
            Ok(lines.join("\n"))
        };

        Self {
            name: project_id.to_string(),
            output_file_name: default_output_name(projects_dir, project_id),
            script,
        }
    }
}

/// Итог по одному элементу пакета
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub name: String,
    pub output_file_name: String,
    pub outcome: std::result::Result<PipelineResult, String>,
}

/// Отчет по пакету
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub title: String,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &PipelineResult> {
        self.entries.iter().filter_map(|e| e.outcome.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter().filter(|e| e.outcome.is_err())
    }

    pub fn to_markdown(&self) -> String {
        let mut md = format!("### Batch Results ({})", self.title);
        for entry in &self.entries {
            md.push('\n');
            match &entry.outcome {
                Ok(result) => md.push_str(&format!(
                    "- **{}** ← `{}` → {}",
                    entry.output_file_name,
                    entry.name,
                    result.summary_markdown()
                )),
                Err(reason) => md.push_str(&format!("- ❌ `{}` → {}", entry.name, reason)),
            }
        }
        md
    }
}

/// Последовательная обработка пакета одним движком синтеза
pub struct BatchRunner<'a, S: SpeechSynthesizer + ?Sized> {
    config: &'a PodcastConfig,
    tracks: &'a TrackLibrary,
    synthesizer: &'a S,
    output: &'a OutputDirectory,
    tracker: Option<&'a ProgressTracker>,
}

impl<'a, S: SpeechSynthesizer + ?Sized> BatchRunner<'a, S> {
    pub fn new(
        config: &'a PodcastConfig,
        tracks: &'a TrackLibrary,
        synthesizer: &'a S,
        output: &'a OutputDirectory,
    ) -> Self {
        Self {
            config,
            tracks,
            synthesizer,
            output,
            tracker: None,
        }
    }

    pub fn with_tracker(mut self, tracker: &'a ProgressTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Обработать элементы по очереди
    pub fn run<I, R>(&self, title: &str, items: I, rng: &mut R) -> BatchReport
    where
        I: IntoIterator<Item = BatchItem>,
        R: Rng + ?Sized,
    {
        let mut report = BatchReport {
            title: title.to_string(),
            entries: Vec::new(),
        };

        for item in items {
            let outcome = match &item.script {
                Err(reason) => {
                    log::warn!("Skipping {}: {}", item.name, reason);
                    Err(reason.clone())
                }
                Ok(script) => {
                    let job = PipelineJob::new(script, self.output.path(), &item.output_file_name);
                    run_pipeline(&job, self.config, self.tracks, self.synthesizer, rng, self.tracker)
                        .map_err(|e| {
                            log::error!("Batch item {} failed: {}", item.name, e);
                            e.to_string()
                        })
                }
            };
            report.entries.push(BatchEntry {
                name: item.name,
                output_file_name: item.output_file_name,
                outcome,
            });
        }

        log::info!(
            "Batch {} finished: {} created, {} failed",
            title,
            report.succeeded().count(),
            report.failed().count()
        );
        report
    }
}

/// Директория результатов
///
/// Очистка никогда не выполняется неявно, только через [`OutputDirectory::clear_audio_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirectory {
    root: PathBuf,
}

impl OutputDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Создать директорию, если ее нет
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Аудиофайлы директории (без вложенных), по имени
    pub fn list_audio_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() && is_audio_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Удалить аудиофайлы; возвращает количество удаленных
    pub fn clear_audio_files(&self) -> Result<usize> {
        let files = self.list_audio_files()?;
        for file in &files {
            std::fs::remove_file(file)?;
        }
        log::info!("Removed {} audio files from {}", files.len(), self.root.display());
        Ok(files.len())
    }

    /// Упаковать аудиофайлы в `{prefix}_{YYYYmmdd_HHMMSS}.zip` в этой же директории
    ///
    /// `None`, если упаковывать нечего.
    pub fn archive(&self, prefix: &str) -> Result<Option<PathBuf>> {
        let files = self.list_audio_files()?;
        if files.is_empty() {
            return Ok(None);
        }

        let zip_name = format!("{}_{}.zip", prefix, chrono::Local::now().format("%Y%m%d_%H%M%S"));
        let zip_path = self.root.join(zip_name);

        let mut writer = ZipWriter::new(BufWriter::new(File::create(&zip_path)?));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for file in &files {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            writer.start_file(name, options)?;
            std::io::copy(&mut File::open(file)?, &mut writer)?;
        }
        writer.finish()?.flush()?;

        log::info!("Archived {} files into {}", files.len(), zip_path.display());
        Ok(Some(zip_path))
    }
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
