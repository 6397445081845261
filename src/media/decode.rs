//! # Audio Decoding
//!
//! Декодирование аудиофайлов и байтовых буферов в моно PCM семплы (f32).
//!
//! - WAV файлы читаются через `hound`
//! - MP3, M4A, AAC и байты из сети читаются через `symphonia`
//! - многоканальное аудио сводится в моно усреднением каналов

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{PodcastError, Result};

/// Декодированное аудио
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Моно семплы в диапазоне [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Частота дискретизации в Гц
    pub sample_rate: u32,
}

/// Декодирует аудиофайл, формат определяется по расширению
pub fn decode_audio_file<P: AsRef<Path>>(file_path: P) -> Result<DecodedAudio> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(PodcastError::FileNotFound(file_path.display().to_string()));
    }

    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "wav" => decode_wav_file(file_path),
        "mp3" | "m4a" | "aac" => {
            let file = File::open(file_path)?;
            let decoded = decode_with_symphonia(Box::new(file), Some(&extension))?;
            debug!(
                "Decoded {} samples from {} at {} Hz",
                decoded.samples.len(),
                file_path.display(),
                decoded.sample_rate
            );
            Ok(decoded)
        }
        _ => Err(PodcastError::Decode(format!(
            "Unsupported audio format: {}",
            file_path.display()
        ))),
    }
}

/// Декодирует аудио из памяти; `extension` служит подсказкой формата
pub fn decode_audio_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedAudio> {
    decode_with_symphonia(Box::new(Cursor::new(bytes)), extension)
}

fn decode_with_symphonia(source: Box<dyn MediaSource>, extension: Option<&str>) -> Result<DecodedAudio> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let format_opts = FormatOptions {
        enable_gapless: false,
        ..Default::default()
    };

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &MetadataOptions::default())
        .map_err(|e| PodcastError::Decode(format!("Cannot detect audio format: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PodcastError::Decode("No audio track found".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PodcastError::Decode(format!("Cannot create decoder: {}", e)))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut pcm_data = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(PodcastError::Decode(format!("Cannot read packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                if sample_rate == 0 {
                    sample_rate = spec.rate;
                }
                let channels = spec.channels.count().max(1);

                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                downmix_into(sample_buf.samples(), channels, &mut pcm_data);
            }
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(PodcastError::Decode(format!("Decoder failure: {}", e))),
        }
    }

    if sample_rate == 0 {
        return Err(PodcastError::Decode("Unknown sample rate".to_string()));
    }

    Ok(DecodedAudio {
        samples: pcm_data,
        sample_rate,
    })
}

/// Декодирует WAV-файл (8/16/24/32 бит целые и 32 бит float)
pub fn decode_wav_file<P: AsRef<Path>>(file_path: P) -> Result<DecodedAudio> {
    let reader = WavReader::open(file_path.as_ref())?;
    decode_wav_reader(reader)
}

fn decode_wav_reader<R: std::io::Read>(mut reader: WavReader<R>) -> Result<DecodedAudio> {
    let spec = reader.spec();

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
        _ => {
            return Err(PodcastError::Decode(format!(
                "Unsupported WAV format: {:?}, {} bits",
                spec.sample_format, spec.bits_per_sample
            )));
        }
    };

    let mut samples = Vec::with_capacity(interleaved.len() / spec.channels.max(1) as usize);
    downmix_into(&interleaved, spec.channels.max(1) as usize, &mut samples);

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Сведение чередующихся каналов в моно
fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    for frame in interleaved.chunks(channels) {
        out.push(frame.iter().sum::<f32>() / frame.len() as f32);
    }
}
