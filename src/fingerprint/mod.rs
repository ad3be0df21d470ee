mod hashing;
pub use hashing::*;
mod peaks;
pub use peaks::*;
mod spectrogram;
pub use spectrogram::*;

use crate::config::Config;
use crate::error::ConfigError;
use crate::models::FingerprintHash;

/// The full fingerprinting pass: samples -> spectrogram -> peaks -> hashes.
///
/// Construction validates the configuration, so a bad parameter set fails
/// before any audio is processed. The pass itself is pure CPU work with no
/// hidden randomness: the same samples and configuration always produce the
/// same hash set.
pub struct Fingerprinter {
    config: Config,
}

impl Fingerprinter {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Fingerprinter { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fingerprints one channel of PCM samples. An empty (or all-silent)
    /// channel yields an empty hash set, not an error.
    pub fn fingerprint(&self, samples: &[f64]) -> Vec<FingerprintHash> {
        let spectrogram = Spectrogram::new(samples, &self.config);
        let peaks = extract_peaks(spectrogram.frames(), &self.config);
        generate_hashes(&peaks, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn pipeline_config() -> Config {
        Config {
            sample_rate: 8_000,
            window_size: 512,
            hop_size: 256,
            amplitude_floor: 10.0,
            time_radius: 2,
            freq_radius: 4,
            fan_out: 5,
            min_time_delta: 0,
            max_time_delta: 200,
            min_vote_threshold: 5,
        }
    }

    /// A little two-tone melody: enough spectral structure to produce a
    /// healthy peak set at small window sizes.
    fn melody(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let segment_bin = if (i / 2048) % 2 == 0 { 40 } else { 90 };
                0.5 * (2.0 * PI * segment_bin as f64 * i as f64 / 512.0).sin()
            })
            .collect()
    }

    #[test]
    fn empty_samples_yield_empty_hash_set() {
        let fingerprinter = Fingerprinter::new(pipeline_config()).unwrap();
        assert!(fingerprinter.fingerprint(&[]).is_empty());
    }

    #[test]
    fn silence_yields_empty_hash_set() {
        let fingerprinter = Fingerprinter::new(pipeline_config()).unwrap();
        assert!(fingerprinter.fingerprint(&vec![0.0; 8192]).is_empty());
    }

    #[test]
    fn invalid_config_fails_at_construction() {
        let config = Config { hop_size: 0, ..pipeline_config() };
        assert!(Fingerprinter::new(config).is_err());
    }

    #[test]
    fn fingerprinting_is_deterministic() {
        let fingerprinter = Fingerprinter::new(pipeline_config()).unwrap();
        let samples = melody(16_384);
        assert_eq!(
            fingerprinter.fingerprint(&samples),
            fingerprinter.fingerprint(&samples)
        );
    }

    #[test]
    fn hash_count_respects_the_fan_out_bound() {
        let config = pipeline_config();
        let fingerprinter = Fingerprinter::new(config.clone()).unwrap();
        let samples = melody(16_384);
        let spectrogram = Spectrogram::new(&samples, &config);
        let peaks = extract_peaks(spectrogram.frames(), &config);
        let hashes = fingerprinter.fingerprint(&samples);
        assert!(!hashes.is_empty());
        assert!(hashes.len() <= peaks.len() * config.fan_out);
    }

    #[test]
    fn leading_silence_shifts_offsets_but_not_codes() {
        let config = pipeline_config();
        let fingerprinter = Fingerprinter::new(config.clone()).unwrap();

        // An arbitrary shift, deliberately not a multiple of the 5-frame
        // neighborhood span: peak selection must not depend on where the
        // signal lands relative to any internal grid.
        let shift_frames = 7u32;
        let pad = shift_frames as usize * config.hop_size;

        let samples = melody(16_384);
        let mut padded = vec![0.0; pad];
        padded.extend_from_slice(&samples);

        let original = fingerprinter.fingerprint(&samples);
        let shifted = fingerprinter.fingerprint(&padded);

        assert!(!original.is_empty());
        // Every original hash reappears with an unchanged code and its
        // offset shifted by exactly the padding, in the original order.
        // The padded signal may grow extra hashes where windows straddle
        // the silence seam, which is fine for matching.
        for hash in &original {
            let moved = FingerprintHash {
                code: hash.code,
                time_offset: hash.time_offset + shift_frames,
            };
            assert!(
                shifted.contains(&moved),
                "hash {hash:?} did not survive the shift"
            );
        }
    }
}
