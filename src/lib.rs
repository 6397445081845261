//! Библиотека сборки подкастов из диалоговых сценариев
//!
//! Сценарий из строк "Speaker: text" превращается в один аудиофайл: реплики
//! озвучиваются голосами двух ведущих, между ними вставляются паузы, поверх
//! реплик могут накладываться короткие реакции собеседника, под речь
//! подмешивается фоновая музыка. Ход сборки можно отслеживать через систему
//! прогресса и уведомлений.

pub mod batch;
pub mod config;
pub mod error;
pub mod media;
pub mod notification;
pub mod pipeline;
pub mod progress;
pub mod script;
pub mod tts;
pub mod utils;

#[cfg(test)]
mod tests;

use rand::Rng;

use crate::batch::{BatchItem, BatchReport, BatchRunner, OutputDirectory};
use crate::config::PodcastConfig;
use crate::error::Result;
use crate::media::music::TrackLibrary;
use crate::pipeline::{run_pipeline, PipelineJob, PipelineResult};
use crate::progress::{DefaultProgressReporter, ProgressObserver, ProgressReporter, ProgressTracker};
use crate::tts::SpeechSynthesizer;

pub use crate::error::PodcastError;

/// Основная структура для сборки подкастов
pub struct PodcastAssembler {
    config: PodcastConfig,
    tracks: TrackLibrary,
    progress_tracker: Option<ProgressTracker>,
}

impl PodcastAssembler {
    pub fn new(config: PodcastConfig) -> Self {
        Self {
            config,
            tracks: TrackLibrary::new(),
            progress_tracker: None,
        }
    }

    pub fn with_progress_reporter(config: PodcastConfig, reporter: Box<dyn ProgressReporter>) -> Self {
        Self {
            config,
            tracks: TrackLibrary::new(),
            progress_tracker: Some(ProgressTracker::with_reporter(reporter)),
        }
    }

    /// Библиотека фоновых треков
    pub fn with_tracks(mut self, tracks: TrackLibrary) -> Self {
        self.tracks = tracks;
        self
    }

    pub fn set_progress_reporter(&mut self, reporter: Box<dyn ProgressReporter>) {
        match &mut self.progress_tracker {
            Some(tracker) => tracker.set_reporter(reporter),
            None => self.progress_tracker = Some(ProgressTracker::with_reporter(reporter)),
        }
    }

    /// Добавить наблюдателя; при отсутствии репортера создается стандартный
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize {
        let tracker = self.progress_tracker.get_or_insert_with(ProgressTracker::new);
        if !tracker.has_reporter() {
            tracker.set_reporter(Box::new(DefaultProgressReporter::new()));
        }
        tracker.add_observer(observer).unwrap_or_default()
    }

    pub fn config(&self) -> &PodcastConfig {
        &self.config
    }

    pub fn tracks(&self) -> &TrackLibrary {
        &self.tracks
    }

    /// Директория результатов из конфигурации
    pub fn output_directory(&self) -> OutputDirectory {
        OutputDirectory::new(&self.config.output_dir)
    }

    /// Собрать один подкаст в директорию результатов
    pub fn assemble<S, R>(
        &self,
        script: &str,
        output_file_name: &str,
        synthesizer: &S,
        rng: &mut R,
    ) -> Result<PipelineResult>
    where
        S: SpeechSynthesizer + ?Sized,
        R: Rng + ?Sized,
    {
        let job = PipelineJob::new(script, &self.config.output_dir, output_file_name);
        run_pipeline(
            &job,
            &self.config,
            &self.tracks,
            synthesizer,
            rng,
            self.progress_tracker.as_ref(),
        )
    }

    /// Собрать пакет подкастов одним движком синтеза
    pub fn assemble_batch<I, S, R>(
        &self,
        title: &str,
        items: I,
        synthesizer: &S,
        rng: &mut R,
    ) -> BatchReport
    where
        I: IntoIterator<Item = BatchItem>,
        S: SpeechSynthesizer + ?Sized,
        R: Rng + ?Sized,
    {
        let output = self.output_directory();
        let mut runner = BatchRunner::new(&self.config, &self.tracks, synthesizer, &output);
        if let Some(tracker) = &self.progress_tracker {
            runner = runner.with_tracker(tracker);
        }
        runner.run(title, items, rng)
    }
}
