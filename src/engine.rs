use slog::{info, warn};

use crate::config::Config;
use crate::error::{Error, StoreError};
use crate::fingerprint::Fingerprinter;
use crate::matcher::Matcher;
use crate::models::{FingerprintHash, Match, MatchCandidate, SampleBuffer};
use crate::store::FingerprintStore;
use crate::utils;

/// Outcome of matching one channel of a capture. Channels are fingerprinted
/// and matched independently: one channel's store failure never aborts the
/// others, and merging results across channels is left to the host.
#[derive(Debug)]
pub struct ChannelMatches {
    pub channel: usize,
    pub hash_count: usize,
    pub result: Result<Vec<MatchCandidate>, StoreError>,
}

/// Fingerprints every channel of a buffer. Returns one hash set per
/// channel; empty channels produce empty sets.
pub fn fingerprint_buffer(
    buffer: &SampleBuffer,
    config: &Config,
) -> Result<Vec<Vec<FingerprintHash>>, Error> {
    let fingerprinter = Fingerprinter::new(config.clone())?;
    Ok(buffer
        .channels
        .iter()
        .map(|samples| fingerprinter.fingerprint(samples))
        .collect())
}

/// Registers pre-computed per-channel hash sets under a new song. Split out
/// from [`register`] so batch hosts can fingerprint off-thread and only
/// serialize this part against the store.
pub fn register_fingerprints(
    store: &mut dyn FingerprintStore,
    title: &str,
    artist: &str,
    channel_hashes: &[Vec<FingerprintHash>],
) -> Result<u32, StoreError> {
    let song_id = store.register_song(title, artist)?;
    for hashes in channel_hashes {
        store.ingest(song_id, hashes)?;
    }
    Ok(song_id)
}

/// Fingerprints a reference recording and ingests it into the store.
/// Returns the new song id.
pub fn register(
    store: &mut dyn FingerprintStore,
    buffer: &SampleBuffer,
    title: &str,
    artist: &str,
    config: &Config,
) -> Result<u32, Error> {
    let logger = utils::get_logger();
    warn_on_rate_mismatch(&logger, buffer, config);
    let channel_hashes = fingerprint_buffer(buffer, config)?;
    for (channel, hashes) in channel_hashes.iter().enumerate() {
        info!(logger, "fingerprinted channel";
            "channel" => channel + 1,
            "channels" => buffer.channel_count(),
            "hashes" => hashes.len()
        );
    }

    let song_id = register_fingerprints(store, title, artist, &channel_hashes)?;
    info!(logger, "registered song"; "song_id" => song_id, "title" => title);
    Ok(song_id)
}

/// Fingerprints a capture and ranks match candidates, channel by channel.
pub fn recognize(
    store: &dyn FingerprintStore,
    buffer: &SampleBuffer,
    config: &Config,
) -> Result<Vec<ChannelMatches>, Error> {
    let fingerprinter = Fingerprinter::new(config.clone())?;
    let matcher = Matcher::new(config);
    let logger = utils::get_logger();
    warn_on_rate_mismatch(&logger, buffer, config);

    let mut outcomes = Vec::with_capacity(buffer.channel_count());
    for (channel, samples) in buffer.channels.iter().enumerate() {
        let hashes = fingerprinter.fingerprint(samples);
        info!(logger, "fingerprinted channel";
            "channel" => channel + 1,
            "channels" => buffer.channel_count(),
            "hashes" => hashes.len()
        );
        let result = matcher.rank(store, &hashes);
        outcomes.push(ChannelMatches { channel, hash_count: hashes.len(), result });
    }
    Ok(outcomes)
}

/// Fingerprints are only comparable when reference and query audio share a
/// sample rate; a mismatch degrades matching rather than breaking it, so it
/// is logged, not rejected.
fn warn_on_rate_mismatch(logger: &slog::Logger, buffer: &SampleBuffer, config: &Config) {
    if buffer.sample_rate != config.sample_rate {
        warn!(logger, "capture sample rate differs from configuration";
            "capture" => buffer.sample_rate,
            "configured" => config.sample_rate
        );
    }
}

/// Joins candidates with song metadata for presentation. Ids the registry
/// no longer knows are logged and skipped, preserving candidate order.
pub fn describe_matches(
    store: &dyn FingerprintStore,
    candidates: &[MatchCandidate],
) -> Result<Vec<Match>, StoreError> {
    let logger = utils::get_logger();
    let mut matches = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let Some(song) = store.get_song_by_id(candidate.song_id)? else {
            warn!(logger, "song is not registered"; "song_id" => candidate.song_id);
            continue;
        };
        matches.push(Match {
            song_id: song.id,
            title: song.title,
            artist: song.artist,
            aligned_offset_delta: candidate.aligned_offset_delta,
            vote_count: candidate.vote_count,
            confidence: candidate.confidence,
        });
    }
    Ok(matches)
}
