mod memory;
pub use memory::*;
mod sqlite;
pub use sqlite::*;

use std::collections::HashMap;

use crate::error::StoreError;
use crate::models::{FingerprintHash, FingerprintRecord, Song};
use crate::utils;

/// Storage boundary for fingerprints and the song registry.
///
/// The matching core is written against this trait only, never against a
/// concrete backend. `lookup` takes `&self` so implementations can serve
/// concurrent reads; `ingest` takes `&mut self` and is serialized by the
/// host. No transactional guarantee spans multiple `ingest` calls; each
/// call is independently atomic or best-effort per the backend's own
/// contract, which also makes the per-song ingest the natural cancellation
/// checkpoint for long batch jobs.
pub trait FingerprintStore: Send {
    /// Registers a reference recording. Fails if the `title---artist` key
    /// is already taken.
    fn register_song(&mut self, title: &str, artist: &str) -> Result<u32, StoreError>;

    /// Appends one record per hash for `song_id`. Not idempotent: repeated
    /// ingestion of the same song duplicates records.
    fn ingest(&mut self, song_id: u32, hashes: &[FingerprintHash]) -> Result<(), StoreError>;

    /// Bulk lookup: every stored record whose code is in `codes`, grouped
    /// by code. Codes with no records are absent from the result.
    fn lookup(&self, codes: &[u32]) -> Result<HashMap<u32, Vec<FingerprintRecord>>, StoreError>;

    fn get_song_by_id(&self, song_id: u32) -> Result<Option<Song>, StoreError>;

    fn total_songs(&self) -> Result<u32, StoreError>;

    /// Drops every song and fingerprint.
    fn erase_all(&mut self) -> Result<(), StoreError>;
}

/// Creates a store from the environment: `DB_TYPE` selects the backend
/// (`sqlite` or `memory`, default `sqlite`), `DB_FILE` the sqlite path.
pub fn new_store() -> Result<Box<dyn FingerprintStore>, StoreError> {
    let backend = utils::get_env("DB_TYPE", Some("sqlite"));
    match backend.as_str() {
        "sqlite" => {
            let db_file = utils::get_env("DB_FILE", Some("db.sqlite3"));
            Ok(Box::new(SqliteClient::new(&db_file)?))
        }
        "memory" => Ok(Box::new(MemoryStore::new())),
        other => Err(StoreError::UnsupportedBackend(other.to_string())),
    }
}
