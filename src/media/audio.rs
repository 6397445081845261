//! Модуль для работы с аудио в памяти
//!
//! [`AudioBuffer`] хранит моно 16-битные семплы и частоту дискретизации.
//! Склейка выполняется добавлением в конец, наложение складывает семплы с
//! насыщением и никогда не меняет длину основного буфера.

/// Максимальная амплитуда при квантовании
const I16_SCALE: f32 = 32767.0;

/// Моно PCM буфер
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Пустой буфер с заданной частотой дискретизации
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
        }
    }

    /// Буфер из готовых 16-битных семплов
    pub fn from_samples(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    /// Квантование f32 семплов: ограничение до [-1.0, 1.0] и умножение на 32767
    pub fn from_f32(samples: &[f32], sample_rate: u32) -> Self {
        let samples = samples
            .iter()
            .map(|&s| {
                let s = if s.is_nan() { 0.0 } else { s.clamp(-1.0, 1.0) };
                (s * I16_SCALE) as i16
            })
            .collect();
        Self { samples, sample_rate }
    }

    /// Тишина заданной длительности
    pub fn silence(seconds: f64, sample_rate: u32) -> Self {
        let len = seconds_to_samples(seconds, sample_rate);
        Self {
            samples: vec![0; len],
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Длительность в секундах
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Семплы в диапазоне [-1.0, 1.0]
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| s as f32 / I16_SCALE).collect()
    }

    /// Добавить другой буфер в конец
    pub fn append(&mut self, other: &AudioBuffer) {
        if other.sample_rate != self.sample_rate && !other.is_empty() {
            log::warn!(
                "Appending {} Hz audio to a {} Hz buffer without resampling",
                other.sample_rate,
                self.sample_rate
            );
        }
        self.samples.extend_from_slice(&other.samples);
    }

    /// Наложить другой буфер начиная с семпла `offset`
    ///
    /// Часть накладываемого буфера, выходящая за конец основного, отбрасывается.
    pub fn overlay(&mut self, other: &AudioBuffer, offset: usize) {
        if offset >= self.samples.len() {
            return;
        }
        for (base, &add) in self.samples[offset..].iter_mut().zip(other.samples.iter()) {
            *base = base.saturating_add(add);
        }
    }

    /// Изменить громкость на `db` децибел (отрицательное значение ослабляет)
    pub fn apply_gain_db(&mut self, db: f64) {
        let factor = db_to_gain(db);
        for sample in self.samples.iter_mut() {
            let scaled = (*sample as f64 * factor).round();
            *sample = scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16;
        }
    }

    /// Копия, зацикленная целыми повторами и обрезанная ровно до `target_len` семплов
    ///
    /// Пустой буфер возвращается как есть.
    pub fn looped_to_len(&self, target_len: usize) -> AudioBuffer {
        if self.samples.is_empty() {
            return self.clone();
        }
        let repeats = target_len / self.samples.len() + 1;
        let mut samples = Vec::with_capacity(repeats * self.samples.len());
        for _ in 0..repeats {
            samples.extend_from_slice(&self.samples);
        }
        samples.truncate(target_len);
        AudioBuffer::from_samples(samples, self.sample_rate)
    }

    /// Первые `seconds` секунд буфера (или весь буфер, если он короче)
    pub fn head(&self, seconds: f64) -> AudioBuffer {
        let len = seconds_to_samples(seconds, self.sample_rate).min(self.samples.len());
        AudioBuffer::from_samples(self.samples[..len].to_vec(), self.sample_rate)
    }
}

/// Перевод секунд в количество семплов
pub fn seconds_to_samples(seconds: f64, sample_rate: u32) -> usize {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * sample_rate as f64).round() as usize
}

/// Коэффициент усиления для значения в децибелах
pub fn db_to_gain(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f32_clamps_and_quantizes() {
        let buffer = AudioBuffer::from_f32(&[0.0, 1.0, -1.0, 2.5, -3.0, 0.5, f32::NAN], 24000);
        assert_eq!(buffer.samples(), &[0, 32767, -32767, 32767, -32767, 16383, 0]);
        assert_eq!(buffer.sample_rate(), 24000);
    }

    #[test]
    fn test_silence_duration() {
        let silence = AudioBuffer::silence(0.2, 24000);
        assert_eq!(silence.len(), 4800);
        assert!(silence.samples().iter().all(|&s| s == 0));
        assert!(AudioBuffer::silence(0.0, 24000).is_empty());
        assert!(AudioBuffer::silence(-1.0, 24000).is_empty());
    }

    #[test]
    fn test_overlay_keeps_length() {
        let mut base = AudioBuffer::from_samples(vec![100; 10], 8000);
        let gesture = AudioBuffer::from_samples(vec![5; 6], 8000);
        base.overlay(&gesture, 7);

        assert_eq!(base.len(), 10);
        assert_eq!(&base.samples()[..7], &[100; 7]);
        assert_eq!(&base.samples()[7..], &[105; 3]);
    }

    #[test]
    fn test_overlay_saturates_and_ignores_out_of_range_offset() {
        let mut base = AudioBuffer::from_samples(vec![i16::MAX - 1, i16::MIN + 1], 8000);
        let loud = AudioBuffer::from_samples(vec![1000, -1000], 8000);
        base.overlay(&loud, 0);
        assert_eq!(base.samples(), &[i16::MAX, i16::MIN]);

        let before = base.clone();
        base.overlay(&loud, 2);
        base.overlay(&loud, 100);
        assert_eq!(base, before);
    }

    #[test]
    fn test_gain_reduction() {
        let mut buffer = AudioBuffer::from_samples(vec![10000, -10000, 0], 8000);
        buffer.apply_gain_db(-20.0);
        assert_eq!(buffer.samples(), &[1000, -1000, 0]);

        let mut same = AudioBuffer::from_samples(vec![1234], 8000);
        same.apply_gain_db(0.0);
        assert_eq!(same.samples(), &[1234]);
    }

    #[test]
    fn test_looped_to_len_is_exact() {
        let track = AudioBuffer::from_samples(vec![1, 2, 3], 8000);
        for target in [0usize, 1, 2, 3, 4, 7, 9, 100] {
            let extended = track.looped_to_len(target);
            assert_eq!(extended.len(), target, "target {}", target);
            for (i, &s) in extended.samples().iter().enumerate() {
                assert_eq!(s, (i % 3) as i16 + 1);
            }
        }
        assert!(AudioBuffer::new(8000).looped_to_len(50).is_empty());
    }

    #[test]
    fn test_head_then_append() {
        let track = AudioBuffer::from_samples((0..100).collect(), 10);
        assert_eq!(track.head(3.0).len(), 30);
        assert_eq!(track.head(30.0).len(), 100);

        let mut joined = track.head(1.0);
        joined.append(&AudioBuffer::silence(0.5, 10));
        assert_eq!(joined.len(), 15);
        assert!((joined.duration_seconds() - 1.5).abs() < 1e-9);
    }
}
