//! Модуль конфигурации библиотеки podcast-assembly
//!
//! Этот модуль содержит структуры для настройки голосов, пауз, реплик-реакций,
//! фоновой музыки и движка синтеза речи. Все структуры читаются из JSON,
//! отсутствующие поля заполняются значениями по умолчанию.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PodcastError, Result};

/// Голоса для двух ведущих
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VoiceConfig {
    /// Голос мужского ведущего (он же голос по умолчанию)
    pub male_voice: String,
    /// Голос женского ведущего
    pub female_voice: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            male_voice: "am_adam".to_string(),
            female_voice: "af_heart".to_string(),
        }
    }
}

/// Паузы между репликами
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PacingConfig {
    /// Случайная длительность паузы; если выключено, пауза всегда равна `max_seconds`
    pub enabled: bool,
    /// Минимальная пауза в секундах
    pub min_seconds: f64,
    /// Максимальная пауза в секундах
    pub max_seconds: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_seconds: 0.2,
            max_seconds: 0.4,
        }
    }
}

impl PacingConfig {
    /// Фиксированная пауза заданной длины
    pub fn fixed(seconds: f64) -> Self {
        Self {
            enabled: false,
            min_seconds: seconds,
            max_seconds: seconds,
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.min_seconds.is_finite() || !self.max_seconds.is_finite() {
            return Err(PodcastError::Configuration(
                "Pause durations must be finite numbers".to_string(),
            ));
        }
        if self.min_seconds < 0.0 || self.max_seconds < 0.0 {
            return Err(PodcastError::Configuration(format!(
                "Pause durations must be non-negative (min {}, max {})",
                self.min_seconds, self.max_seconds
            )));
        }
        if self.min_seconds > self.max_seconds {
            return Err(PodcastError::Configuration(format!(
                "Pause min {}s is greater than max {}s",
                self.min_seconds, self.max_seconds
            )));
        }
        Ok(())
    }
}

/// Короткие реплики-реакции второго ведущего ("yeah", "uh-huh")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GestureConfig {
    pub enabled: bool,
    /// Вероятность реакции на каждую реплику (0.0 - 1.0)
    pub probability: f64,
    /// Набор фраз, из которого выбирается реакция
    pub phrase_pool: Vec<String>,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            probability: 0.2,
            phrase_pool: Self::parse_phrases("yeah, uh-huh, right, ok"),
        }
    }
}

impl GestureConfig {
    /// Разобрать список фраз через запятую, пустые элементы отбрасываются
    pub fn parse_phrases(csv: &str) -> Vec<String> {
        csv.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(PodcastError::Configuration(format!(
                "Gesture probability must be within [0, 1], got {}",
                self.probability
            )));
        }
        if self.phrase_pool.iter().any(|p| p.trim().is_empty()) {
            return Err(PodcastError::Configuration(
                "Gesture phrases must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Фоновая музыка под речью
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackgroundMusicConfig {
    pub enabled: bool,
    /// Имя трека в библиотеке треков (см. `TrackLibrary`)
    pub track: Option<String>,
    /// Ослабление музыки в децибелах
    pub reduction_db: u32,
    /// Добавить отрезок музыки после окончания речи
    pub append_tail: bool,
    /// Длительность добавляемого отрезка в секундах
    pub tail_seconds: u32,
}

impl Default for BackgroundMusicConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            track: None,
            reduction_db: 20,
            append_tail: false,
            tail_seconds: 3,
        }
    }
}

/// Настройки HTTP движка синтеза речи
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Базовый адрес сервиса, например `http://localhost:8880`
    pub base_url: String,
    /// Имя модели
    pub model: String,
    /// Ключ API (необязателен для локального сервиса)
    pub api_key: Option<String>,
    /// Формат ответа сервиса
    pub response_format: String,
    /// Таймаут одного запроса в секундах
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8880".to_string(),
            model: "kokoro".to_string(),
            api_key: None,
            response_format: "wav".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Полная конфигурация сборки подкаста
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PodcastConfig {
    pub voices: VoiceConfig,
    pub pacing: PacingConfig,
    pub gestures: GestureConfig,
    pub background_music: BackgroundMusicConfig,
    pub engine: EngineConfig,
    /// Директория для готовых подкастов
    pub output_dir: PathBuf,
}

impl Default for PodcastConfig {
    fn default() -> Self {
        Self {
            voices: VoiceConfig::default(),
            pacing: PacingConfig::default(),
            gestures: GestureConfig::default(),
            background_music: BackgroundMusicConfig::default(),
            engine: EngineConfig::default(),
            output_dir: PathBuf::from("generated_podcasts"),
        }
    }
}

impl PodcastConfig {
    /// Загрузить конфигурацию из JSON файла
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PodcastError::FileNotFound(format!("{}: {}", path.display(), e))
        })?;
        let config: PodcastConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Проверить согласованность настроек
    pub fn validate(&self) -> Result<()> {
        if self.voices.male_voice.trim().is_empty() || self.voices.female_voice.trim().is_empty() {
            return Err(PodcastError::Configuration(
                "Both male and female voices must be set".to_string(),
            ));
        }
        self.pacing.validate()?;
        self.gestures.validate()?;
        Ok(())
    }
}
