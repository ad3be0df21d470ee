use crate::config::Config;
use crate::models::{FingerprintHash, Peak};

/// Bits reserved in the packed code for each peak's frequency bin.
pub const HASH_FREQ_BITS: u32 = 11;
/// Bits reserved in the packed code for the anchor-to-target frame delta.
pub const HASH_DELTA_BITS: u32 = 10;

const FREQ_MASK: u32 = (1 << HASH_FREQ_BITS) - 1;
const DELTA_MASK: u32 = (1 << HASH_DELTA_BITS) - 1;

/// Packs an anchor/target frequency pair and their frame delta into one
/// 32-bit code. Only relative positions participate, which is what makes
/// the code invariant to absolute time shift. Collisions across unrelated
/// inputs are expected; the matcher resolves them statistically.
pub fn pack_code(anchor_freq: u32, target_freq: u32, delta: u32) -> u32 {
    ((anchor_freq & FREQ_MASK) << (HASH_FREQ_BITS + HASH_DELTA_BITS))
        | ((target_freq & FREQ_MASK) << HASH_DELTA_BITS)
        | (delta & DELTA_MASK)
}

/// Pairs each anchor peak with up to `fan_out` subsequent peaks whose frame
/// delta lies in `[min_time_delta, max_time_delta]`, emitting one hash per
/// pair. `peaks` must be sorted by `(time_bin, freq_bin)`, which lets the
/// inner scan stop at the first target past the delta window.
///
/// Bounding both the delta range and the fan-out keeps generation
/// near-linear in peak count; at most `peaks.len() * fan_out` hashes are
/// produced.
pub fn generate_hashes(peaks: &[Peak], config: &Config) -> Vec<FingerprintHash> {
    let mut hashes = Vec::new();
    for (i, anchor) in peaks.iter().enumerate() {
        let mut fan = 0;
        for target in &peaks[i + 1..] {
            let delta = target.time_bin - anchor.time_bin;
            if delta > config.max_time_delta {
                break;
            }
            if delta < config.min_time_delta {
                continue;
            }
            hashes.push(FingerprintHash {
                code: pack_code(anchor.freq_bin, target.freq_bin, delta),
                time_offset: anchor.time_bin,
            });
            fan += 1;
            if fan == config.fan_out {
                break;
            }
        }
    }
    hashes
}
