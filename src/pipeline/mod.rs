//! Сборка подкаста из сценария
//!
//! Порядок работы [`run_pipeline`]:
//! 1. проверка настроек и разбор сценария (пустой сценарий - ошибка, файл не создается)
//! 2. для каждой реплики: выбор голоса, синтез, возможная реакция, пауза
//! 3. фоновая музыка (ошибки не прерывают сборку)
//! 4. сохранение в `output_dir/output_file_name`

pub mod gesture;
pub mod pacing;

use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::Rng;
use serde::Serialize;

use crate::config::PodcastConfig;
use crate::error::{PodcastError, Result};
use crate::media::audio::AudioBuffer;
use crate::media::export::export_audio;
use crate::media::music::{mix_background, MixOutcome, TrackLibrary};
use crate::progress::{ProcessStep, ProgressTracker};
use crate::script::parse_script;
use crate::tts::{route_voice, synthesize_utterance, SpeechSynthesizer, SynthesisError};
use crate::utils::naming::ensure_audio_extension;

pub use gesture::{maybe_overlay_gesture, GestureOverlay};
pub use pacing::{pause_after_utterance, pause_seconds};

/// Задание на сборку одного подкаста
#[derive(Debug, Clone, Copy)]
pub struct PipelineJob<'a> {
    /// Текст сценария, строки вида "Speaker: text"
    pub script: &'a str,
    /// Директория для результата; создается при необходимости и не очищается
    pub output_dir: &'a Path,
    /// Имя файла; без расширения добавляется `.mp3`
    pub output_file_name: &'a str,
}

impl<'a> PipelineJob<'a> {
    pub fn new(script: &'a str, output_dir: &'a Path, output_file_name: &'a str) -> Self {
        Self {
            script,
            output_dir,
            output_file_name,
        }
    }

    /// Итоговый путь файла
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(ensure_audio_extension(self.output_file_name.trim()))
    }
}

/// Результат сборки
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub output_path: PathBuf,
    /// Длительность итогового аудио в секундах
    pub duration_seconds: f64,
    /// Время сборки в секундах
    pub elapsed_seconds: f64,
    /// Количество озвученных реплик
    pub utterances: usize,
    /// Количество наложенных реакций
    pub gestures: usize,
    pub background: MixOutcome,
}

impl PipelineResult {
    /// Краткий отчет в Markdown
    pub fn summary_markdown(&self) -> String {
        format!(
            "**Created:** `{}`  \n**Length:** {:.2}s  \n**Processing:** {:.2}s",
            self.output_path.display(),
            self.duration_seconds,
            self.elapsed_seconds
        )
    }
}

/// Проверить имя итогового файла
///
/// Имя должно быть простым именем файла: без разделителей пути и без `.`/`..`,
/// чтобы результат всегда оказывался внутри `output_dir`.
pub fn check_output_file_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PodcastError::Configuration("Output file name is empty".to_string()));
    }
    if name.contains(|c| c == '/' || c == '\\') || name == "." || name == ".." || Path::new(name).is_absolute() {
        return Err(PodcastError::Configuration(format!(
            "Output file name must not contain path components: {:?}",
            name
        )));
    }
    Ok(())
}

/// Собрать подкаст по сценарию
///
/// Синтез выполняется строго последовательно. Частота первой реплики
/// становится частотой всего подкаста.
pub fn run_pipeline<S, R>(
    job: &PipelineJob<'_>,
    config: &PodcastConfig,
    tracks: &TrackLibrary,
    synthesizer: &S,
    rng: &mut R,
    tracker: Option<&ProgressTracker>,
) -> Result<PipelineResult>
where
    S: SpeechSynthesizer + ?Sized,
    R: Rng + ?Sized,
{
    let started = Instant::now();

    if let Some(t) = tracker {
        t.reset();
        t.update_step_progress(0.0, Some("Initializing TTS".to_string()));
    }

    config.validate()?;
    check_output_file_name(job.output_file_name)?;

    let lines = parse_script(job.script);
    if lines.is_empty() {
        log::warn!("Script has no 'Speaker: text' lines, nothing to synthesize");
        return Err(PodcastError::EmptyScript);
    }

    let total = lines.len();
    log::info!("Assembling podcast from {} lines", total);

    if let Some(t) = tracker {
        t.set_step(ProcessStep::SpeechSynthesis);
    }

    let mut narration: Option<AudioBuffer> = None;
    let mut gestures = 0;

    for (index, line) in lines.iter().enumerate() {
        let voice = route_voice(&line.speaker, &config.voices);
        let reference_rate = narration.as_ref().map(AudioBuffer::sample_rate);

        let synthesis_error = |source: SynthesisError| PodcastError::Synthesis {
            index,
            speaker: line.speaker.clone(),
            source,
        };

        let mut utterance = synthesize_utterance(synthesizer, &line.text, voice, reference_rate)
            .map_err(|e| {
                log::error!("TTS failed on line {} ({}): {}", index + 1, line.speaker, e);
                synthesis_error(e)
            })?;

        let overlay = maybe_overlay_gesture(
            &mut utterance,
            &line.speaker,
            &config.gestures,
            &config.voices,
            synthesizer,
            rng,
        )
        .map_err(|e| {
            log::error!("Gesture TTS failed on line {} ({}): {}", index + 1, line.speaker, e);
            synthesis_error(e)
        })?;
        if overlay.is_some() {
            gestures += 1;
        }

        let buffer = narration.get_or_insert_with(|| AudioBuffer::new(utterance.sample_rate()));
        buffer.append(&utterance);
        if let Some(pause) = pause_after_utterance(&config.pacing, buffer.sample_rate(), rng) {
            buffer.append(&pause);
        }

        log::debug!(
            "Line {}/{} ({}, {}): {:.2}s",
            index + 1,
            total,
            line.speaker,
            voice,
            utterance.duration_seconds()
        );

        if let Some(t) = tracker {
            let fraction = (index + 1) as f32 / (total + 1) as f32;
            t.update_step_progress(fraction * 100.0, Some(format!("TTS line {}/{}", index + 1, total)));
        }
    }

    // Цикл выше выполнился хотя бы один раз
    let mut narration = narration.ok_or(PodcastError::EmptyScript)?;

    if let Some(t) = tracker {
        t.set_step(ProcessStep::BackgroundMusic);
    }
    let background = mix_background(&mut narration, &config.background_music, tracks);

    if let Some(t) = tracker {
        t.set_step(ProcessStep::Export);
    }
    let output_path = job.output_path();
    export_audio(&narration, &output_path)?;

    let result = PipelineResult {
        output_path,
        duration_seconds: narration.duration_seconds(),
        elapsed_seconds: started.elapsed().as_secs_f64(),
        utterances: total,
        gestures,
        background,
    };

    if let Some(t) = tracker {
        t.complete();
    }
    log::info!(
        "Podcast ready: {} ({:.2}s, built in {:.2}s)",
        result.output_path.display(),
        result.duration_seconds,
        result.elapsed_seconds
    );

    Ok(result)
}
