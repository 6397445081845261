//! Модуль для кэширования результатов TTS
//!
//! Реплики-реакции повторяются постоянно, поэтому в пакетных прогонах
//! результаты синтеза выгодно держать в памяти. Ключ кэша - md5 от текста,
//! голоса, скорости и языка.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::tts::{SpeechSynthesizer, SynthesisError, SynthesizedSpeech};

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, SynthesizedSpeech>,
    /// Порядок вставки ключей, старые в начале
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

/// Обертка над движком синтеза с кэшем в памяти
pub struct CachedSynthesizer<S> {
    inner: S,
    max_entries: Option<usize>,
    state: Mutex<CacheState>,
}

impl<S: SpeechSynthesizer> CachedSynthesizer<S> {
    /// Кэш без ограничения размера
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            max_entries: None,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Ограничить кэш `max_entries` записями; при переполнении удаляются самые старые
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Количество записей в кэше
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (попадания, промахи)
    pub fn stats(&self) -> (u64, u64) {
        let state = self.state.lock();
        (state.hits, state.misses)
    }

    /// Очистить кэш
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn insert(&self, key: String, speech: SynthesizedSpeech) {
        if self.max_entries == Some(0) {
            return;
        }

        let mut state = self.state.lock();
        if let Some(limit) = self.max_entries {
            while state.entries.len() >= limit {
                let Some(oldest) = state.order.pop_front() else {
                    break;
                };
                state.entries.remove(&oldest);
            }
        }
        state.order.push_back(key.clone());
        state.entries.insert(key, speech);
    }
}

impl<S: SpeechSynthesizer> SpeechSynthesizer for CachedSynthesizer<S> {
    fn synthesize(
        &self,
        text: &str,
        voice: &str,
        speed: f32,
        lang: &str,
    ) -> Result<SynthesizedSpeech, SynthesisError> {
        let key = cache_key(text, voice, speed, lang);

        {
            let mut state = self.state.lock();
            if let Some(speech) = state.entries.get(&key).cloned() {
                state.hits += 1;
                log::debug!("TTS cache hit for {:?} ({})", text, voice);
                return Ok(speech);
            }
            state.misses += 1;
        }

        // Лок не держится во время вызова движка
        let speech = self.inner.synthesize(text, voice, speed, lang)?;
        self.insert(key, speech.clone());
        Ok(speech)
    }
}

/// Ключ кэша
pub fn cache_key(text: &str, voice: &str, speed: f32, lang: &str) -> String {
    let mut hasher = md5::Context::new();
    for part in [text.as_bytes(), voice.as_bytes(), &speed.to_le_bytes()[..], lang.as_bytes()] {
        hasher.consume((part.len() as u64).to_le_bytes());
        hasher.consume(part);
    }
    format!("{:x}", hasher.compute())
}
