//! Сквозные тесты сборки подкаста с детерминированным движком синтеза

use std::path::Path;

use parking_lot::Mutex;
use rand::rngs::mock::StepRng;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::batch::{BatchItem, OutputDirectory};
use crate::config::{BackgroundMusicConfig, GestureConfig, PacingConfig, PodcastConfig};
use crate::error::PodcastError;
use crate::media::decode::decode_audio_file;
use crate::media::music::{MixOutcome, MixStage, TrackLibrary};
use crate::notification::MemoryProgressObserver;
use crate::pipeline::{run_pipeline, PipelineJob};
use crate::tts::{SpeechSynthesizer, SynthesisError, SynthesizedSpeech};
use crate::PodcastAssembler;

/// Движок, выдающий синусоиду длиной 10 мс на символ текста
struct ToneSynthesizer {
    default_rate: u32,
    /// Частота для отдельного голоса
    voice_rate: Option<(&'static str, u32)>,
    /// Текст, на котором движок падает
    fail_on: Option<&'static str>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ToneSynthesizer {
    fn new() -> Self {
        Self {
            default_rate: 24000,
            voice_rate: None,
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

impl SpeechSynthesizer for ToneSynthesizer {
    fn synthesize(
        &self,
        text: &str,
        voice: &str,
        _speed: f32,
        _lang: &str,
    ) -> Result<SynthesizedSpeech, SynthesisError> {
        self.calls.lock().push((text.to_string(), voice.to_string()));
        if self.fail_on == Some(text) {
            return Err(SynthesisError::Engine(format!("cannot voice {:?}", text)));
        }

        let rate = match self.voice_rate {
            Some((v, rate)) if v == voice => rate,
            _ => self.default_rate,
        };
        let len = text.chars().count() * rate as usize / 100;
        let samples = (0..len).map(|i| (i as f32 * 0.05).sin() * 0.3).collect();
        Ok(SynthesizedSpeech::new(samples, rate))
    }
}

/// Паузы ровно 0.2 с, реакции и музыка выключены
fn plain_config(output_dir: &Path) -> PodcastConfig {
    PodcastConfig {
        pacing: PacingConfig::fixed(0.2),
        output_dir: output_dir.to_path_buf(),
        ..PodcastConfig::default()
    }
}

fn write_tone_track(path: &Path, sample_rate: u32, seconds: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..(sample_rate as f32 * seconds) as usize {
        writer
            .write_sample(((i as f32 * 0.01).sin() * 8000.0) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_two_line_script_duration() {
    let dir = tempfile::tempdir().unwrap();
    let config = plain_config(dir.path());
    let synth = ToneSynthesizer::new();
    let mut rng = StdRng::seed_from_u64(1);

    let job = PipelineJob::new("Male: Hi\nFemale: Hello", dir.path(), "episode.wav");
    let result = run_pipeline(&job, &config, &TrackLibrary::new(), &synth, &mut rng, None).unwrap();

    // Hi (0.02 с) + 0.2 + Hello (0.05 с) + 0.2
    assert!((result.duration_seconds - 0.47).abs() < 1e-9, "{}", result.duration_seconds);
    assert_eq!(result.utterances, 2);
    assert_eq!(result.gestures, 0);
    assert_eq!(result.background, MixOutcome::NotRequested);
    assert_eq!(result.output_path, dir.path().join("episode.wav"));

    let decoded = decode_audio_file(&result.output_path).unwrap();
    assert_eq!(decoded.sample_rate, 24000);
    assert_eq!(decoded.samples.len(), 11280);
    // Хвост - пауза после последней реплики
    assert!(decoded.samples[11280 - 4800..].iter().all(|&s| s == 0.0));

    assert_eq!(
        synth.calls(),
        vec![
            ("Hi".to_string(), "am_adam".to_string()),
            ("Hello".to_string(), "af_heart".to_string()),
        ]
    );
    assert!(result.summary_markdown().contains("**Length:** 0.47s"));
}

#[test]
fn test_empty_script_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("generated");
    let config = plain_config(&output_dir);
    let synth = ToneSynthesizer::new();
    let mut rng = StdRng::seed_from_u64(1);

    for script in ["", "no colon here\n\n", "Male:\nFemale:   "] {
        let job = PipelineJob::new(script, &output_dir, "episode.wav");
        let err = run_pipeline(&job, &config, &TrackLibrary::new(), &synth, &mut rng, None).unwrap_err();
        assert!(matches!(err, PodcastError::EmptyScript));
        assert!(err.is_user_facing());
        assert_eq!(err.to_string(), "No valid 'Speaker: text' lines found in the script.");
    }

    assert!(synth.calls().is_empty());
    assert!(!output_dir.exists());
}

#[test]
fn test_corrupt_or_missing_track_still_produces_narration() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.mp3");
    std::fs::write(&broken, b"garbage bytes, not an mp3").unwrap();

    let mut tracks = TrackLibrary::new();
    tracks.insert("broken.mp3", &broken);
    tracks.insert("gone.mp3", dir.path().join("gone.mp3"));

    let synth = ToneSynthesizer::new();
    let mut rng = StdRng::seed_from_u64(5);

    for (track, file) in [("broken.mp3", "a.wav"), ("gone.mp3", "b.wav")] {
        let mut config = plain_config(dir.path());
        config.background_music = BackgroundMusicConfig {
            enabled: true,
            track: Some(track.to_string()),
            append_tail: true,
            ..BackgroundMusicConfig::default()
        };

        let job = PipelineJob::new("Male: Hi\nFemale: Hello", dir.path(), file);
        let result = run_pipeline(&job, &config, &tracks, &synth, &mut rng, None).unwrap();

        assert!(matches!(
            result.background,
            MixOutcome::Recovered {
                stage: MixStage::Overlay,
                ..
            }
        ));
        assert!(result.output_path.exists());
        assert!((result.duration_seconds - 0.47).abs() < 1e-9);
    }
}

#[test]
fn test_background_music_is_mixed_under_narration() {
    let dir = tempfile::tempdir().unwrap();
    let track = dir.path().join("lofi.wav");
    write_tone_track(&track, 44100, 0.1);

    let tracks = TrackLibrary::from_dir(dir.path()).unwrap();
    let mut config = plain_config(dir.path());
    config.background_music = BackgroundMusicConfig {
        enabled: true,
        track: Some("lofi.wav".to_string()),
        reduction_db: 6,
        append_tail: true,
        tail_seconds: 3,
    };

    let synth = ToneSynthesizer::new();
    let mut rng = StdRng::seed_from_u64(9);
    let job = PipelineJob::new("Male: Hi\nFemale: Hello", dir.path(), "mixed.wav");
    let result = run_pipeline(&job, &config, &tracks, &synth, &mut rng, None).unwrap();

    // Трек короче трех секунд, поэтому хвост равен всему треку
    assert_eq!(result.background, MixOutcome::Applied { tail_appended_seconds: 0.1 });
    assert!((result.duration_seconds - 0.57).abs() < 1e-9);

    let decoded = decode_audio_file(&result.output_path).unwrap();
    let pause = &decoded.samples[480..480 + 4800];
    assert!(pause.iter().any(|&s| s != 0.0), "music must be audible in pauses");
}

#[test]
fn test_gestures_use_opposite_voice_without_changing_length() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = plain_config(dir.path());
    config.gestures = GestureConfig {
        enabled: true,
        probability: 1.0,
        phrase_pool: vec!["yeah".to_string(), "right".to_string()],
    };

    let synth = ToneSynthesizer::new();
    let mut rng = StepRng::new(0, 0);
    let job = PipelineJob::new("Male: Hi there\nFemale: Hello", dir.path(), "gestures.wav");
    let result = run_pipeline(&job, &config, &TrackLibrary::new(), &synth, &mut rng, None).unwrap();

    assert_eq!(result.gestures, 2);
    assert!((result.duration_seconds - (0.08 + 0.2 + 0.05 + 0.2)).abs() < 1e-9);
    assert_eq!(
        synth.calls(),
        vec![
            ("Hi there".to_string(), "am_adam".to_string()),
            ("yeah".to_string(), "af_heart".to_string()),
            ("Hello".to_string(), "af_heart".to_string()),
            ("yeah".to_string(), "am_adam".to_string()),
        ]
    );
}

#[test]
fn test_mismatched_engine_rate_is_resampled() {
    let dir = tempfile::tempdir().unwrap();
    let config = plain_config(dir.path());
    let synth = ToneSynthesizer {
        voice_rate: Some(("af_heart", 16000)),
        ..ToneSynthesizer::new()
    };
    let mut rng = StdRng::seed_from_u64(2);

    let job = PipelineJob::new("Male: Hi\nFemale: Hello", dir.path(), "rates.wav");
    let result = run_pipeline(&job, &config, &TrackLibrary::new(), &synth, &mut rng, None).unwrap();

    let decoded = decode_audio_file(&result.output_path).unwrap();
    assert_eq!(decoded.sample_rate, 24000);
    assert_eq!(decoded.samples.len(), 11280);
}

#[test]
fn test_output_name_cannot_leave_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("generated");
    let config = plain_config(&output_dir);
    let synth = ToneSynthesizer::new();
    let mut rng = StdRng::seed_from_u64(1);

    let job = PipelineJob::new("Male: Hi", &output_dir, "../escaped.wav");
    let err = run_pipeline(&job, &config, &TrackLibrary::new(), &synth, &mut rng, None).unwrap_err();

    assert!(matches!(err, PodcastError::Configuration(_)));
    assert!(synth.calls().is_empty());
    assert!(!dir.path().join("escaped.wav").exists());
}

#[test]
fn test_synthesis_failure_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = plain_config(dir.path());
    let synth = ToneSynthesizer {
        fail_on: Some("boom"),
        ..ToneSynthesizer::new()
    };
    let mut rng = StdRng::seed_from_u64(3);

    let job = PipelineJob::new("Male: Hi\nFemale: boom\nMale: never", dir.path(), "failed.wav");
    let err = run_pipeline(&job, &config, &TrackLibrary::new(), &synth, &mut rng, None).unwrap_err();

    match err {
        PodcastError::Synthesis { index, speaker, .. } => {
            assert_eq!(index, 1);
            assert_eq!(speaker, "female");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(synth.calls().len(), 2);
    assert!(!dir.path().join("failed.wav").exists());
}

#[test]
fn test_assembler_reports_progress_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let mut assembler = PodcastAssembler::new(plain_config(dir.path()));
    let history = MemoryProgressObserver::new();
    assembler.add_observer(Box::new(history.clone()));

    let synth = ToneSynthesizer::new();
    let mut rng = StdRng::seed_from_u64(4);
    let result = assembler
        .assemble("Male: Hi\nFemale: Hello", "progress.wav", &synth, &mut rng)
        .unwrap();
    assert_eq!(result.output_path, dir.path().join("progress.wav"));

    let details = history.details();
    assert_eq!(details.first().map(String::as_str), Some("Initializing TTS"));
    assert!(details.contains(&"TTS line 1/2".to_string()));
    assert!(details.contains(&"TTS line 2/2".to_string()));
    assert_eq!(details.last().map(String::as_str), Some("Done"));

    let line_one = history
        .history()
        .into_iter()
        .find(|p| p.details.as_deref() == Some("TTS line 1/2"))
        .unwrap();
    assert!((line_one.step_progress - 100.0 / 3.0).abs() < 1e-3);
}

#[test]
fn test_batch_continues_after_failures() {
    let dir = tempfile::tempdir().unwrap();
    let projects = dir.path().join("projects");
    std::fs::create_dir_all(projects.join("p1")).unwrap();
    std::fs::write(projects.join("p1/meta.json"), r#"{"title": "No Script"}"#).unwrap();

    let output = OutputDirectory::new(dir.path().join("generated"));
    let config = plain_config(output.path());
    let synth = ToneSynthesizer {
        fail_on: Some("boom"),
        ..ToneSynthesizer::new()
    };

    let items = vec![
        BatchItem::new("first", "first.wav", "Male: Hi"),
        BatchItem::from_project(&projects, "p1"),
        BatchItem::new("empty", "empty.wav", "nothing useful"),
        BatchItem::new("broken", "broken.wav", "Female: boom"),
        BatchItem::new("last", "last.wav", "Female: Hello"),
    ];

    let tracks = TrackLibrary::new();
    let runner = crate::batch::BatchRunner::new(&config, &tracks, &synth, &output);
    let report = runner.run("TXT", items, &mut StdRng::seed_from_u64(8));

    assert_eq!(report.entries.len(), 5);
    assert_eq!(report.succeeded().count(), 2);
    let failed: Vec<_> = report.failed().map(|e| e.name.as_str()).collect();
    assert_eq!(failed, vec!["p1", "empty", "broken"]);

    let files: Vec<_> = output
        .list_audio_files()
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(files, vec!["first.wav", "last.wav"]);

    let md = report.to_markdown();
    assert!(md.contains("- ❌ `p1` → No script found in meta.json"));
    assert!(md.contains("- **last.wav** ← `last` → **Created:**"));
}
