use serde::{Deserialize, Serialize};

/// Captured PCM audio, one ordered sample sequence per channel.
///
/// Immutable once built; the pipeline only ever borrows it.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f64>>,
}

impl SampleBuffer {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f64>>) -> Self {
        SampleBuffer { sample_rate, channels }
    }

    /// Splits an interleaved sample sequence into per-channel sequences.
    /// A ragged tail shorter than one full frame is dropped.
    pub fn from_interleaved(sample_rate: u32, channel_count: usize, samples: &[f64]) -> Self {
        if channel_count == 0 {
            return SampleBuffer { sample_rate, channels: Vec::new() };
        }
        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        SampleBuffer { sample_rate, channels }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn duration_secs(&self) -> f64 {
        let longest = self.channels.iter().map(Vec::len).max().unwrap_or(0);
        longest as f64 / self.sample_rate as f64
    }
}

/// A local energy maximum in the time-frequency plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub time_bin: u32,
    pub freq_bin: u32,
    pub amplitude: f64,
}

/// A compact hash derived from a pair of peaks. The code packs only the
/// peaks' frequency bins and their time delta, so it is invariant to
/// absolute time shift; `time_offset` is the anchor peak's frame index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FingerprintHash {
    pub code: u32,
    pub time_offset: u32,
}

/// The persisted form of a hash, tied to a reference song. Lookups key these
/// by hash code. Append-only; duplicates are legitimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub song_id: u32,
    pub time_offset: u32,
}

/// A registered reference recording. `hash_count` grows during ingestion and
/// is read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub id: u32,
    pub title: String,
    pub artist: String,
    pub hash_count: u64,
}

/// One candidate produced by the matcher for a single query. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub song_id: u32,
    /// The offset-delta histogram mode: `stored_offset - query_offset` at
    /// the strongest alignment.
    pub aligned_offset_delta: i64,
    pub vote_count: u32,
    /// `vote_count` normalized by the query's total hash count.
    pub confidence: f64,
}

/// A match candidate joined with song metadata, ready for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct Match {
    pub song_id: u32,
    pub title: String,
    pub artist: String,
    pub aligned_offset_delta: i64,
    pub vote_count: u32,
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_interleaved_splits_channels() {
        let samples = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buffer = SampleBuffer::from_interleaved(44_100, 2, &samples);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.channels[0], vec![0.1, 0.2, 0.3]);
        assert_eq!(buffer.channels[1], vec![-0.1, -0.2, -0.3]);
    }

    #[test]
    fn from_interleaved_drops_ragged_tail() {
        let samples = [0.1, -0.1, 0.2];
        let buffer = SampleBuffer::from_interleaved(44_100, 2, &samples);
        assert_eq!(buffer.channels[0], vec![0.1]);
        assert_eq!(buffer.channels[1], vec![-0.1]);
    }

    #[test]
    fn zero_channels_yields_empty_buffer() {
        let buffer = SampleBuffer::from_interleaved(44_100, 0, &[0.5; 8]);
        assert_eq!(buffer.channel_count(), 0);
        assert_eq!(buffer.duration_secs(), 0.0);
    }
}
