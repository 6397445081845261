//! HTTP клиент движка синтеза речи
//!
//! Работает с сервисами, совместимыми с OpenAI `/v1/audio/speech`
//! (например, Kokoro-FastAPI). Аудио в ответе декодируется в моно f32.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::media::decode::decode_audio_bytes;
use crate::tts::{SpeechSynthesizer, SynthesisError, SynthesizedSpeech};

/// Путь эндпоинта синтеза
const SPEECH_PATH: &str = "/v1/audio/speech";

/// Тело запроса на синтез
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpeechRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
    pub voice: &'a str,
    pub speed: f32,
    pub lang_code: &'a str,
    pub response_format: &'a str,
}

/// Клиент HTTP движка синтеза
pub struct HttpSynthesizer {
    client: Client,
    config: EngineConfig,
}

impl HttpSynthesizer {
    /// Создать клиента с таймаутом из конфигурации
    pub fn new(config: EngineConfig) -> Result<Self, SynthesisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Полный адрес эндпоинта синтеза
    pub fn speech_url(&self) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), SPEECH_PATH)
    }

    /// Тело запроса для одной реплики
    pub fn request_body<'a>(
        &'a self,
        text: &'a str,
        voice: &'a str,
        speed: f32,
        lang: &'a str,
    ) -> SpeechRequest<'a> {
        SpeechRequest {
            model: &self.config.model,
            input: text,
            voice,
            speed,
            lang_code: lang,
            response_format: &self.config.response_format,
        }
    }
}

impl SpeechSynthesizer for HttpSynthesizer {
    fn synthesize(
        &self,
        text: &str,
        voice: &str,
        speed: f32,
        lang: &str,
    ) -> Result<SynthesizedSpeech, SynthesisError> {
        let url = self.speech_url();
        log::debug!("POST {} voice={} chars={}", url, voice, text.chars().count());

        let mut request = self
            .client
            .post(&url)
            .json(&self.request_body(text, voice, speed, lang));
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            request = request.bearer_auth(key);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
            log::error!("Speech service returned {}: {}", status, body);
            return Err(SynthesisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err(SynthesisError::EmptyOutput);
        }

        let decoded = decode_audio_bytes(bytes.to_vec(), Some(&self.config.response_format))
            .map_err(|e| SynthesisError::Decode(e.to_string()))?;
        if decoded.samples.is_empty() {
            return Err(SynthesisError::EmptyOutput);
        }

        Ok(SynthesizedSpeech::new(decoded.samples, decoded.sample_rate))
    }
}
