use std::collections::HashMap;

use crate::error::StoreError;
use crate::models::{FingerprintHash, FingerprintRecord, Song};
use crate::utils;

use super::FingerprintStore;

/// Reference store implementation: a hash-code index held in memory.
///
/// Useful for tests and for hosts that rebuild their reference set on every
/// run. Append-only like the trait demands; it never deduplicates records.
#[derive(Debug, Default)]
pub struct MemoryStore {
    index: HashMap<u32, Vec<FingerprintRecord>>,
    songs: HashMap<u32, Song>,
    keys: HashMap<String, u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl FingerprintStore for MemoryStore {
    fn register_song(&mut self, title: &str, artist: &str) -> Result<u32, StoreError> {
        let key = utils::generate_song_key(title, artist);
        if self.keys.contains_key(&key) {
            return Err(StoreError::DuplicateSong(key));
        }

        let mut id = utils::generate_unique_id();
        while self.songs.contains_key(&id) {
            id = utils::generate_unique_id();
        }

        self.songs.insert(
            id,
            Song {
                id,
                title: title.to_string(),
                artist: artist.to_string(),
                hash_count: 0,
            },
        );
        self.keys.insert(key, id);
        Ok(id)
    }

    fn ingest(&mut self, song_id: u32, hashes: &[FingerprintHash]) -> Result<(), StoreError> {
        let song = self
            .songs
            .get_mut(&song_id)
            .ok_or(StoreError::UnknownSong(song_id))?;
        song.hash_count += hashes.len() as u64;

        for hash in hashes {
            self.index.entry(hash.code).or_default().push(FingerprintRecord {
                song_id,
                time_offset: hash.time_offset,
            });
        }
        Ok(())
    }

    fn lookup(&self, codes: &[u32]) -> Result<HashMap<u32, Vec<FingerprintRecord>>, StoreError> {
        let mut found = HashMap::new();
        for &code in codes {
            if let Some(records) = self.index.get(&code) {
                found.entry(code).or_insert_with(|| records.clone());
            }
        }
        Ok(found)
    }

    fn get_song_by_id(&self, song_id: u32) -> Result<Option<Song>, StoreError> {
        Ok(self.songs.get(&song_id).cloned())
    }

    fn total_songs(&self) -> Result<u32, StoreError> {
        Ok(self.songs.len() as u32)
    }

    fn erase_all(&mut self) -> Result<(), StoreError> {
        self.index.clear();
        self.songs.clear();
        self.keys.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(code: u32, time_offset: u32) -> FingerprintHash {
        FingerprintHash { code, time_offset }
    }

    #[test]
    fn ingest_then_lookup_round_trips() {
        let mut store = MemoryStore::new();
        let song_id = store.register_song("Static Bloom", "The Relays").unwrap();
        store
            .ingest(song_id, &[hash(7, 0), hash(7, 12), hash(9, 3)])
            .unwrap();

        let found = store.lookup(&[7, 9, 1000]).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(
            found[&7],
            vec![
                FingerprintRecord { song_id, time_offset: 0 },
                FingerprintRecord { song_id, time_offset: 12 },
            ]
        );
        assert_eq!(found[&9], vec![FingerprintRecord { song_id, time_offset: 3 }]);
    }

    #[test]
    fn repeated_ingest_duplicates_records() {
        let mut store = MemoryStore::new();
        let song_id = store.register_song("Static Bloom", "The Relays").unwrap();
        store.ingest(song_id, &[hash(7, 0)]).unwrap();
        store.ingest(song_id, &[hash(7, 0)]).unwrap();

        let found = store.lookup(&[7]).unwrap();
        assert_eq!(found[&7].len(), 2);
        assert_eq!(store.get_song_by_id(song_id).unwrap().unwrap().hash_count, 2);
    }

    #[test]
    fn duplicate_song_key_is_rejected() {
        let mut store = MemoryStore::new();
        store.register_song("Static Bloom", "The Relays").unwrap();
        let err = store.register_song("Static Bloom", "The Relays").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSong(_)));
    }

    #[test]
    fn ingest_for_unknown_song_fails() {
        let mut store = MemoryStore::new();
        let err = store.ingest(42, &[hash(1, 0)]).unwrap_err();
        assert!(matches!(err, StoreError::UnknownSong(42)));
    }

    #[test]
    fn erase_all_clears_songs_and_index() {
        let mut store = MemoryStore::new();
        let song_id = store.register_song("Static Bloom", "The Relays").unwrap();
        store.ingest(song_id, &[hash(7, 0)]).unwrap();

        store.erase_all().unwrap();
        assert_eq!(store.total_songs().unwrap(), 0);
        assert!(store.lookup(&[7]).unwrap().is_empty());
        // The key is free again after an erase.
        assert!(store.register_song("Static Bloom", "The Relays").is_ok());
    }
}
