//! Передискретизация моно аудио с помощью Rubato (sinc-интерполяция)

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::{PodcastError, Result};

/// Размер блока, подаваемого в ресемплер
const CHUNK_SIZE: usize = 1024;

/// Передискретизация `input` из `from_rate` в `to_rate`
///
/// Длина результата равна `round(len * to_rate / from_rate)`; задержка фильтра
/// компенсируется.
pub fn resample_mono(input: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == 0 || to_rate == 0 {
        return Err(PodcastError::AudioProcessing(format!(
            "Invalid sample rates: {} -> {}",
            from_rate, to_rate
        )));
    }
    if from_rate == to_rate || input.is_empty() {
        return Ok(input.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let expected_len = (input.len() as f64 * ratio).round() as usize;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_SIZE, 1)
        .map_err(|e| PodcastError::AudioProcessing(format!("Cannot create resampler: {}", e)))?;

    let delay = resampler.output_delay();
    let mut output: Vec<f32> = Vec::with_capacity(expected_len + delay + CHUNK_SIZE);
    let mut position = 0;

    while input.len() - position >= resampler.input_frames_next() {
        let frames = resampler.input_frames_next();
        let chunk = vec![input[position..position + frames].to_vec()];
        let processed = resampler.process(chunk.as_slice(), None).map_err(resample_error)?;
        output.extend_from_slice(&processed[0]);
        position += frames;
    }

    if position < input.len() {
        let tail = vec![input[position..].to_vec()];
        let processed = resampler
            .process_partial(Some(tail.as_slice()), None)
            .map_err(resample_error)?;
        output.extend_from_slice(&processed[0]);
    }

    // Выталкиваем остаток из фильтра
    while output.len() < expected_len + delay {
        let processed = resampler
            .process_partial::<Vec<f32>>(None, None)
            .map_err(resample_error)?;
        if processed[0].is_empty() {
            break;
        }
        output.extend_from_slice(&processed[0]);
    }

    let mut resampled: Vec<f32> = output.into_iter().skip(delay).collect();
    resampled.resize(expected_len, 0.0);
    Ok(resampled)
}

fn resample_error(e: rubato::ResampleError) -> PodcastError {
    PodcastError::AudioProcessing(format!("Resampling failed: {}", e))
}
