use std::collections::VecDeque;

use crate::config::Config;
use crate::models::Peak;

use super::spectrogram::Frame;

/// Extracts locally-dominant time-frequency points from a frame sequence.
///
/// A point is a peak iff it dominates every other point in its sliding
/// `(2 * time_radius + 1)` frame by `(2 * freq_radius + 1)` bin
/// neighborhood, and clears `amplitude_floor`. Because the neighborhood
/// moves with the point instead of sitting on a fixed grid, shifting the
/// input in time shifts the peak set with it: hash codes built from these
/// peaks survive playback-timing offsets unchanged. Equal amplitudes are
/// won by the lower `(time_bin, freq_bin)` point, so extraction is
/// deterministic. Noise perturbs amplitudes slightly but rarely changes
/// which point dominates a neighborhood.
///
/// Frames are buffered only while inside some live neighborhood, so memory
/// is bounded by `time_radius` windows, not the recording length. Output
/// is sorted by `(time_bin, freq_bin)`.
pub fn extract_peaks<I>(frames: I, config: &Config) -> Vec<Peak>
where
    I: IntoIterator<Item = Frame>,
{
    let time_radius = config.time_radius as u32;

    let mut buffer: VecDeque<Frame> = VecDeque::new();
    let mut peaks = Vec::new();
    let mut next = 0u32;
    let mut last = None;

    for frame in frames {
        let newest = frame.index;
        last = Some(newest);
        buffer.push_back(frame);
        // Judge every frame whose forward context is complete.
        while next + time_radius <= newest {
            judge_frame(&buffer, next, config, &mut peaks);
            next += 1;
            trim_buffer(&mut buffer, next, time_radius);
        }
    }
    // Trailing frames see a truncated forward neighborhood.
    if let Some(last) = last {
        while next <= last {
            judge_frame(&buffer, next, config, &mut peaks);
            next += 1;
            trim_buffer(&mut buffer, next, time_radius);
        }
    }

    peaks
}

/// Drops frames that no longer fall inside any unjudged neighborhood.
fn trim_buffer(buffer: &mut VecDeque<Frame>, next: u32, time_radius: u32) {
    while buffer
        .front()
        .is_some_and(|frame| frame.index + time_radius < next)
    {
        buffer.pop_front();
    }
}

/// Emits every point of frame `t` that dominates its neighborhood. The
/// buffer holds exactly the frames within `time_radius` of `t`.
fn judge_frame(buffer: &VecDeque<Frame>, t: u32, config: &Config, peaks: &mut Vec<Peak>) {
    let Some(front_index) = buffer.front().map(|frame| frame.index) else {
        return;
    };
    let Some(frame) = buffer.get((t - front_index) as usize) else {
        return;
    };

    'bins: for (f, &amplitude) in frame.bins.iter().enumerate() {
        if amplitude < config.amplitude_floor {
            continue;
        }
        let lo = f.saturating_sub(config.freq_radius);
        for neighbor in buffer {
            let hi = (f + config.freq_radius).min(neighbor.bins.len() - 1);
            for nf in lo..=hi {
                if neighbor.index == t && nf == f {
                    continue;
                }
                let n_amp = neighbor.bins[nf];
                let dominated = n_amp > amplitude
                    || (n_amp == amplitude && (neighbor.index, nf) < (t, f));
                if dominated {
                    continue 'bins;
                }
            }
        }
        peaks.push(Peak { time_bin: t, freq_bin: f as u32, amplitude });
    }
}
