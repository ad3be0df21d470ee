use std::path::Path;

use thiserror::Error;

use crate::models::SampleBuffer;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: hound::Error },

    #[error("unsupported WAV encoding: {0}")]
    Unsupported(String),

    #[error("failed to decode samples: {0}")]
    Decode(#[from] hound::Error),
}

/// Reads a WAV file into a [`SampleBuffer`], de-interleaving channels and
/// normalizing samples to [-1, 1]. Accepts 16/24/32-bit integer PCM and
/// 32-bit float.
pub fn read_wav(path: &Path) -> Result<SampleBuffer, WavError> {
    let mut reader = hound::WavReader::open(path).map_err(|source| WavError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let spec = reader.spec();

    let samples: Vec<f64> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| f64::from(v) / f64::from(1i32 << 15)))
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| f64::from(v) / f64::from(1i32 << 23)))
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f64 / (1i64 << 31) as f64))
            .collect::<Result<_, _>>()?,
        (format, bits) => {
            return Err(WavError::Unsupported(format!("{:?} at {} bits", format, bits)));
        }
    };

    Ok(SampleBuffer::from_interleaved(
        spec.sample_rate,
        spec.channels as usize,
        &samples,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_stereo_i16(path: &Path, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn reads_and_deinterleaves_int16_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_stereo_i16(&path, &[16384, -16384, 8192, -8192]);

        let buffer = read_wav(&path).unwrap();
        assert_eq!(buffer.sample_rate, 44_100);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.channels[0], vec![0.5, 0.25]);
        assert_eq!(buffer.channels[1], vec![-0.5, -0.25]);
    }

    #[test]
    fn reads_float32_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for &sample in &[0.1f32, -0.2, 0.3] {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        let buffer = read_wav(&path).unwrap();
        assert_eq!(buffer.channel_count(), 1);
        assert_eq!(buffer.channels[0].len(), 3);
        assert!((buffer.channels[0][1] - (-0.2)).abs() < 1e-6);
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = read_wav(Path::new("/nonexistent/missing.wav")).unwrap_err();
        assert!(matches!(err, WavError::Open { .. }));
        assert!(err.to_string().contains("missing.wav"));
    }
}
