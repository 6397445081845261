//! Готовые наблюдатели прогресса
//!
//! - [`LogProgressObserver`] пишет прогресс в лог
//! - [`MemoryProgressObserver`] копит историю (удобно в тестах)
//! - [`FileProgressObserver`] дописывает строки с отметкой времени в файл
//! - [`CallbackProgressObserver`] вызывает замыкание
//! - [`CompositeProgressObserver`] рассылает уведомление нескольким наблюдателям

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::progress::{ProgressInfo, ProgressObserver};

/// Строка прогресса в едином формате
pub fn format_progress(progress: &ProgressInfo) -> String {
    let mut line = format!(
        "{} {:.1}% (total {:.1}%)",
        progress.step, progress.step_progress, progress.total_progress
    );
    if let Some(details) = progress.details.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(": ");
        line.push_str(details);
    }
    line
}

/// Наблюдатель, пишущий прогресс в лог на уровне `info`
#[derive(Debug, Default, Clone)]
pub struct LogProgressObserver {
    prefix: Option<String>,
}

impl LogProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Префикс помогает различать элементы пакетного прогона
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl ProgressObserver for LogProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        match &self.prefix {
            Some(prefix) => log::info!("[{}] {}", prefix, format_progress(&progress)),
            None => log::info!("{}", format_progress(&progress)),
        }
    }
}

/// Наблюдатель, сохраняющий историю в памяти
///
/// Клоны разделяют одну историю: один экземпляр отдается трекеру, другой
/// остается у вызывающего кода.
#[derive(Debug, Default, Clone)]
pub struct MemoryProgressObserver {
    history: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl MemoryProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<ProgressInfo> {
        self.history.lock().clone()
    }

    /// Описания из истории, без пустых
    pub fn details(&self) -> Vec<String> {
        self.history
            .lock()
            .iter()
            .filter_map(|p| p.details.clone())
            .collect()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }
}

impl ProgressObserver for MemoryProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        self.history.lock().push(progress);
    }
}

/// Наблюдатель, дописывающий прогресс в файл
pub struct FileProgressObserver {
    file_path: PathBuf,
}

impl FileProgressObserver {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }
}

impl ProgressObserver for FileProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        let entry = format!(
            "[{}] {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            format_progress(&progress)
        );

        let written = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .and_then(|mut file| file.write_all(entry.as_bytes()));
        if let Err(e) = written {
            log::warn!("Cannot write progress to {}: {}", self.file_path.display(), e);
        }
    }
}

/// Наблюдатель с функцией обратного вызова
pub struct CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    callback: F,
}

impl<F> CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressObserver for CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    fn on_progress_update(&self, progress: ProgressInfo) {
        (self.callback)(progress);
    }
}

/// Несколько наблюдателей под одним идентификатором
#[derive(Default)]
pub struct CompositeProgressObserver {
    observers: Vec<Box<dyn ProgressObserver>>,
}

impl CompositeProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl ProgressObserver for CompositeProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        for observer in &self.observers {
            observer.on_progress_update(progress.clone());
        }
    }
}
