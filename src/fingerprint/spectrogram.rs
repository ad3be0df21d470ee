use std::f64::consts::PI;
use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::config::Config;

/// Magnitude returned for a zero-energy bin, and the lower clamp for the dB
/// conversion. Keeps silence well under any sensible amplitude floor.
pub const SILENCE_DB: f64 = -120.0;

/// One spectral slice: dB magnitudes for the non-negative frequency bins of
/// a single windowed segment, tagged with its frame index.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: u32,
    pub bins: Vec<f64>,
}

/// Windowed-FFT spectrogram over a borrowed sample slice.
///
/// `frames()` returns a fresh iterator each call, so the frame sequence is
/// restartable. Frames cover the buffer end-to-end with overlap
/// `window_size - hop_size`; the final partial window is zero-padded rather
/// than dropped. An empty buffer yields an empty sequence.
pub struct Spectrogram<'a> {
    samples: &'a [f64],
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
    window_size: usize,
    hop_size: usize,
}

impl<'a> Spectrogram<'a> {
    pub fn new(samples: &'a [f64], config: &Config) -> Self {
        let window_size = config.window_size;
        let fft = FftPlanner::<f64>::new().plan_fft_forward(window_size);
        Spectrogram {
            samples,
            window: hamming_window(window_size),
            fft,
            window_size,
            hop_size: config.hop_size,
        }
    }

    /// Number of frames `frames()` will yield.
    pub fn frame_count(&self) -> usize {
        self.samples.len().div_ceil(self.hop_size)
    }

    /// Starts a new pass over the buffer.
    pub fn frames(&self) -> Frames<'_> {
        Frames {
            spectrogram: self,
            buffer: vec![Complex::new(0.0, 0.0); self.window_size],
            scratch: vec![Complex::new(0.0, 0.0); self.fft.get_inplace_scratch_len()],
            start: 0,
            index: 0,
        }
    }
}

/// Lazy frame iterator. Scratch buffers are reused across frames, so memory
/// is bounded by the window size, not the recording length.
pub struct Frames<'s> {
    spectrogram: &'s Spectrogram<'s>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    start: usize,
    index: u32,
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let samples = self.spectrogram.samples;
        if self.start >= samples.len() {
            return None;
        }

        let end = (self.start + self.spectrogram.window_size).min(samples.len());
        let available = end - self.start;
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < available { samples[self.start + i] } else { 0.0 };
            *slot = Complex::new(sample * self.spectrogram.window[i], 0.0);
        }

        self.spectrogram
            .fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        // By symmetry only the first half of the bins carry information.
        let bins = self.buffer[..self.spectrogram.window_size / 2]
            .iter()
            .map(|c| magnitude_db(c.norm()))
            .collect();

        let frame = Frame { index: self.index, bins };
        self.start += self.spectrogram.hop_size;
        self.index += 1;
        Some(frame)
    }
}

/// Converts a raw magnitude to a decibel scale so peak extraction sees a
/// normalized dynamic range across frequency bands.
fn magnitude_db(magnitude: f64) -> f64 {
    if magnitude <= 0.0 {
        SILENCE_DB
    } else {
        (20.0 * magnitude.log10()).max(SILENCE_DB)
    }
}

fn hamming_window(size: usize) -> Vec<f64> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|i| 0.54 - 0.46 * ((2.0 * PI * i as f64) / ((size - 1) as f64)).cos())
        .collect()
}
