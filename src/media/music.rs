//! Модуль фоновой музыки
//!
//! Трек декодируется, приводится к частоте речи, ослабляется, зацикливается
//! до длины речи и подмешивается под нее. По желанию в конец добавляется
//! отдельный отрезок музыки. Любая ошибка на этих шагах не прерывает сборку:
//! она логируется и возвращается как [`MixOutcome::Recovered`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::config::BackgroundMusicConfig;
use crate::error::Result;
use crate::media::audio::AudioBuffer;
use crate::media::decode::decode_audio_file;
use crate::media::resample::resample_mono;

/// Расширения файлов, которые считаются треками
const TRACK_EXTENSIONS: [&str; 2] = ["mp3", "wav"];

/// Библиотека фоновых треков: имя -> путь к файлу
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackLibrary {
    tracks: BTreeMap<String, PathBuf>,
}

impl TrackLibrary {
    /// Создать пустую библиотеку
    pub fn new() -> Self {
        Self::default()
    }

    /// Собрать библиотеку из директории, имя трека - имя файла
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut library = Self::new();
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(library);
        }

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() || !is_track_file(entry.path()) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            library.insert(name, entry.path());
        }

        Ok(library)
    }

    /// Добавить трек
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.tracks.insert(name.into(), path.into());
    }

    /// Путь к треку по имени
    pub fn resolve(&self, name: &str) -> Option<&Path> {
        self.tracks.get(name).map(PathBuf::as_path)
    }

    /// Имена треков в алфавитном порядке
    pub fn names(&self) -> Vec<&str> {
        self.tracks.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl FromIterator<(String, PathBuf)> for TrackLibrary {
    fn from_iter<I: IntoIterator<Item = (String, PathBuf)>>(iter: I) -> Self {
        Self {
            tracks: iter.into_iter().collect(),
        }
    }
}

fn is_track_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TRACK_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Шаг, на котором произошла ошибка микширования
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MixStage {
    /// Подмешивание под речь
    Overlay,
    /// Добавление отрезка в конец
    Tail,
}

impl fmt::Display for MixStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overlay => write!(f, "overlay"),
            Self::Tail => write!(f, "tail"),
        }
    }
}

/// Итог работы с фоновой музыкой
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MixOutcome {
    /// Музыка выключена или трек не выбран
    NotRequested,
    /// Трек с таким именем не найден в библиотеке
    TrackUnavailable(String),
    /// Музыка подмешана; `tail_appended_seconds` - длина добавленного в конец отрезка
    Applied { tail_appended_seconds: f64 },
    /// Ошибка была перехвачена, результат содержит только то, что успели сделать
    Recovered { stage: MixStage, reason: String },
}

impl MixOutcome {
    /// Была ли ошибка, перехваченная при микшировании
    pub fn is_recovered(&self) -> bool {
        matches!(self, Self::Recovered { .. })
    }
}

/// Подмешать фоновую музыку к речи
///
/// `narration` изменяется на месте. Ошибки не возвращаются, а отражаются в
/// [`MixOutcome`].
pub fn mix_background(
    narration: &mut AudioBuffer,
    config: &BackgroundMusicConfig,
    tracks: &TrackLibrary,
) -> MixOutcome {
    if !config.enabled {
        return MixOutcome::NotRequested;
    }
    let name = match config.track.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => return MixOutcome::NotRequested,
    };
    let path = match tracks.resolve(name) {
        Some(path) => path,
        None => {
            log::info!("Background track {:?} is not in the library, skipping music", name);
            return MixOutcome::TrackUnavailable(name.to_string());
        }
    };

    let sample_rate = narration.sample_rate();
    let mut recovered = None;

    let overlay = load_track(path, sample_rate, config.reduction_db).map(|track| {
        let bed = track.looped_to_len(narration.len());
        narration.overlay(&bed, 0);
    });
    if let Err(e) = overlay {
        log::warn!("Background music overlay failed for {}: {}", path.display(), e);
        recovered = Some((MixStage::Overlay, e.to_string()));
    }

    // Хвост декодируется заново и не зависит от результата подмешивания
    let mut tail_appended_seconds = 0.0;
    if config.append_tail {
        match load_track(path, sample_rate, config.reduction_db) {
            Ok(track) => {
                let tail = track.head(config.tail_seconds as f64);
                narration.append(&tail);
                tail_appended_seconds = tail.duration_seconds();
            }
            Err(e) => {
                log::warn!("Background music tail failed for {}: {}", path.display(), e);
                recovered.get_or_insert((MixStage::Tail, e.to_string()));
            }
        }
    }

    match recovered {
        Some((stage, reason)) => MixOutcome::Recovered { stage, reason },
        None => MixOutcome::Applied { tail_appended_seconds },
    }
}

/// Декодировать трек, привести к частоте `sample_rate` и ослабить на `reduction_db`
pub fn load_track(path: &Path, sample_rate: u32, reduction_db: u32) -> Result<AudioBuffer> {
    let decoded = decode_audio_file(path)?;
    let samples = resample_mono(&decoded.samples, decoded.sample_rate, sample_rate)?;
    let mut track = AudioBuffer::from_f32(&samples, sample_rate);
    track.apply_gain_db(-(reduction_db as f64));
    log::debug!(
        "Loaded background track {} ({:.2}s at {} Hz, -{} dB)",
        path.display(),
        track.duration_seconds(),
        sample_rate,
        reduction_db
    );
    Ok(track)
}
