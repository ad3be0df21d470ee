use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tuning parameters for the fingerprinting and matching pipeline.
///
/// Constructed once by the host and passed by reference into each component;
/// no component reads ambient global state. `validate` runs at pipeline
/// construction so a bad configuration fails before any audio is touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sample rate of the incoming PCM, in Hz.
    pub sample_rate: u32,
    /// FFT window length in samples.
    pub window_size: usize,
    /// Samples between consecutive window starts. Overlap is
    /// `window_size - hop_size`.
    pub hop_size: usize,
    /// Minimum magnitude (dB) for a spectral point to qualify as a peak.
    /// Rejects the silence/noise floor.
    pub amplitude_floor: f64,
    /// Half-extent of a peak neighborhood along the time axis, in frames.
    pub time_radius: usize,
    /// Half-extent of a peak neighborhood along the frequency axis, in bins.
    pub freq_radius: usize,
    /// Maximum number of hash pairs generated per anchor peak.
    pub fan_out: usize,
    /// Smallest anchor-to-target frame delta eligible for pairing.
    pub min_time_delta: u32,
    /// Largest anchor-to-target frame delta eligible for pairing.
    pub max_time_delta: u32,
    /// Candidates whose histogram mode falls below this vote count are
    /// dropped from match results.
    pub min_vote_threshold: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sample_rate: 44_100,
            window_size: 4096,
            hop_size: 2048,
            amplitude_floor: 10.0,
            time_radius: 20,
            freq_radius: 20,
            fan_out: 15,
            min_time_delta: 0,
            max_time_delta: 200,
            min_vote_threshold: 5,
        }
    }
}

impl Config {
    /// Checks the parameter set for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.hop_size == 0 {
            return Err(ConfigError::ZeroHop);
        }
        if self.hop_size > self.window_size {
            return Err(ConfigError::HopExceedsWindow {
                hop_size: self.hop_size,
                window_size: self.window_size,
            });
        }
        if self.time_radius == 0 || self.freq_radius == 0 {
            return Err(ConfigError::ZeroRadius);
        }
        if self.fan_out == 0 {
            return Err(ConfigError::ZeroFanOut);
        }
        if self.min_time_delta > self.max_time_delta {
            return Err(ConfigError::InvertedDeltaWindow {
                min: self.min_time_delta,
                max: self.max_time_delta,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_hop_larger_than_window() {
        let config = Config {
            window_size: 1024,
            hop_size: 2048,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::HopExceedsWindow { hop_size: 2048, window_size: 1024 })
        ));
    }

    #[test]
    fn rejects_zero_fan_out() {
        let config = Config { fan_out: 0, ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroFanOut)));
    }

    #[test]
    fn rejects_zero_radius() {
        let config = Config { freq_radius: 0, ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroRadius)));
    }

    #[test]
    fn rejects_inverted_delta_window() {
        let config = Config {
            min_time_delta: 50,
            max_time_delta: 10,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedDeltaWindow { min: 50, max: 10 })
        ));
    }
}
