//! Сохранение итогового аудио
//!
//! Формат выбирается по расширению: `.wav` пишется напрямую (16 бит, моно),
//! `.mp3` кодируется FFmpeg из промежуточного WAV. Запись идет во временный
//! файл в той же директории, который переименовывается в целевой только после
//! успешного завершения.

use std::io::BufWriter;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use tempfile::NamedTempFile;

use crate::error::{PodcastError, Result};
use crate::media::audio::AudioBuffer;
use crate::utils::ffmpeg;

/// Формат итогового файла
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Wav,
    Mp3,
}

impl ExportFormat {
    /// Формат по расширению пути; по умолчанию MP3
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .as_deref()
        {
            Some("wav") => Self::Wav,
            _ => Self::Mp3,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }
}

/// Сохранить буфер в `output_path`
pub fn export_audio(buffer: &AudioBuffer, output_path: &Path) -> Result<()> {
    let dir = match output_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let format = ExportFormat::from_path(output_path);
    let staged = match format {
        ExportFormat::Wav => write_temp_wav(buffer, dir)?,
        ExportFormat::Mp3 => {
            let wav = write_temp_wav(buffer, dir)?;
            let mp3 = temp_file(dir, format)?;
            ffmpeg::encode_mp3(wav.path(), mp3.path())?;
            mp3
        }
    };

    make_shareable(staged.path())?;
    staged
        .persist(output_path)
        .map_err(|e| PodcastError::Export(format!("Cannot move output into place: {}", e.error)))?;

    log::info!(
        "Exported {} ({:.2}s, {} Hz, {:?})",
        output_path.display(),
        buffer.duration_seconds(),
        buffer.sample_rate(),
        format
    );
    Ok(())
}

/// Права итогового файла
#[cfg(unix)]
pub const OUTPUT_FILE_MODE: u32 = 0o644;

// Временный файл создается с правами 0600, итоговый должен читаться другими процессами
#[cfg(unix)]
fn make_shareable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(OUTPUT_FILE_MODE))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_shareable(_path: &Path) -> Result<()> {
    Ok(())
}

fn temp_file(dir: &Path, format: ExportFormat) -> Result<NamedTempFile> {
    Ok(tempfile::Builder::new()
        .prefix(".podcast-")
        .suffix(&format!(".{}", format.extension()))
        .tempfile_in(dir)?)
}

fn write_temp_wav(buffer: &AudioBuffer, dir: &Path) -> Result<NamedTempFile> {
    let mut file = temp_file(dir, ExportFormat::Wav)?;
    write_wav(buffer, BufWriter::new(file.as_file_mut()))?;
    Ok(file)
}

/// Запись буфера в WAV (16 бит, моно)
pub fn write_wav<W: std::io::Write + std::io::Seek>(buffer: &AudioBuffer, out: W) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::new(out, spec)
        .map_err(|e| PodcastError::Export(format!("Cannot start WAV: {}", e)))?;
    for &sample in buffer.samples() {
        writer
            .write_sample(sample)
            .map_err(|e| PodcastError::Export(format!("Cannot write WAV samples: {}", e)))?;
    }
    writer
        .finalize()
        .map_err(|e| PodcastError::Export(format!("Cannot finalize WAV: {}", e)))?;
    Ok(())
}
