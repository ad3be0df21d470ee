use std::collections::HashMap;

use crate::config::Config;
use crate::error::StoreError;
use crate::models::{FingerprintHash, MatchCandidate};
use crate::store::FingerprintStore;

/// Ranks candidate songs for a query hash set by offset-delta alignment.
///
/// For every stored record sharing a code with a query hash, the frame
/// delta `stored_offset - query_offset` gets one vote in a per-song
/// histogram. A true match piles votes onto a single delta (the playback
/// offset between query and reference) while unrelated hash collisions
/// scatter across many deltas, so the histogram mode separates signal
/// from noise without any structural dedup of codes.
///
/// Stateless and read-only with respect to the store.
pub struct Matcher {
    min_vote_threshold: u32,
}

impl Matcher {
    pub fn new(config: &Config) -> Self {
        Matcher { min_vote_threshold: config.min_vote_threshold }
    }

    /// Returns candidates ordered by descending vote count (ties: lower
    /// song id), or an empty list when nothing clears the vote threshold.
    /// An empty query returns an empty list without touching the store.
    pub fn rank(
        &self,
        store: &dyn FingerprintStore,
        query: &[FingerprintHash],
    ) -> Result<Vec<MatchCandidate>, StoreError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        // A code can occur at several query offsets; every pairing votes.
        let mut query_offsets: HashMap<u32, Vec<u32>> = HashMap::new();
        for hash in query {
            query_offsets.entry(hash.code).or_default().push(hash.time_offset);
        }
        let codes: Vec<u32> = query_offsets.keys().copied().collect();

        let found = store.lookup(&codes)?;

        let mut histograms: HashMap<u32, HashMap<i64, u32>> = HashMap::new();
        for (code, records) in &found {
            let Some(offsets) = query_offsets.get(code) else { continue };
            for record in records {
                for &query_offset in offsets {
                    let delta = record.time_offset as i64 - query_offset as i64;
                    *histograms
                        .entry(record.song_id)
                        .or_default()
                        .entry(delta)
                        .or_insert(0) += 1;
                }
            }
        }

        let total_hashes = query.len() as f64;
        let mut candidates = Vec::new();
        for (song_id, histogram) in histograms {
            // Mode of the delta histogram; ties pick the smaller delta so
            // ranking is deterministic.
            let Some((&delta, &votes)) = histogram
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            else {
                continue;
            };
            if votes < self.min_vote_threshold {
                continue;
            }
            candidates.push(MatchCandidate {
                song_id,
                aligned_offset_delta: delta,
                vote_count: votes,
                confidence: votes as f64 / total_hashes,
            });
        }

        candidates.sort_by(|a, b| {
            b.vote_count
                .cmp(&a.vote_count)
                .then(a.song_id.cmp(&b.song_id))
        });
        Ok(candidates)
    }
}
