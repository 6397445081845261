//! Модуль для работы с FFmpeg
//!
//! FFmpeg используется только для кодирования итогового WAV в MP3.

use std::path::Path;
use std::process::Command;

use crate::error::{PodcastError, Result};

/// Битрейт итогового MP3
pub const MP3_BITRATE: &str = "128k";

/// Проверка наличия FFmpeg
pub fn check_ffmpeg_installed() -> bool {
    match Command::new("ffmpeg").arg("-version").output() {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// Запуск команды FFmpeg
pub fn run_ffmpeg_command(args: &[&str]) -> Result<()> {
    log::debug!("ffmpeg {}", args.join(" "));
    let output = Command::new("ffmpeg").args(args).output().map_err(|e| {
        PodcastError::Export(format!("Failed to start ffmpeg (is it installed?): {}", e))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let last_line = stderr.lines().last().unwrap_or("");
        return Err(PodcastError::Export(format!(
            "FFmpeg command failed with status {}: {}",
            output.status, last_line
        )));
    }

    Ok(())
}

/// Кодирование WAV файла в моно MP3 (libmp3lame)
pub fn encode_mp3(wav_path: &Path, mp3_path: &Path) -> Result<()> {
    let input = path_arg(wav_path)?;
    let output = path_arg(mp3_path)?;
    run_ffmpeg_command(&[
        "-hide_banner",
        "-loglevel", "error",
        "-y",
        "-i", input,
        "-ac", "1",
        "-codec:a", "libmp3lame",
        "-b:a", MP3_BITRATE,
        "-f", "mp3",
        output,
    ])
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| PodcastError::Export(format!("Non UTF-8 path: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_missing_input_fails() {
        if !check_ffmpeg_installed() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let result = encode_mp3(&dir.path().join("absent.wav"), &dir.path().join("out.mp3"));
        assert!(matches!(result, Err(PodcastError::Export(_))));
    }
}
