use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::StoreError;
use crate::models::{FingerprintHash, FingerprintRecord, Song};
use crate::utils;

use super::FingerprintStore;

/// SQLite-backed store. The `fingerprints` table is indexed on the hash
/// code so bulk lookups stay cheap even with thousands of query codes.
pub struct SqliteClient {
    db: Connection,
}

impl SqliteClient {
    /// Opens (or creates) the database at `data_source_name` and ensures
    /// the schema exists.
    pub fn new(data_source_name: &str) -> Result<Self, StoreError> {
        let db = Connection::open(data_source_name)?;
        create_tables(&db)?;
        Ok(SqliteClient { db })
    }
}

impl FingerprintStore for SqliteClient {
    fn register_song(&mut self, title: &str, artist: &str) -> Result<u32, StoreError> {
        let song_key = utils::generate_song_key(title, artist);
        loop {
            let song_id = utils::generate_unique_id();
            let res = self.db.execute(
                "INSERT INTO songs (id, title, artist, key, hashCount) VALUES (?, ?, ?, ?, 0)",
                params![song_id as i64, title, artist, song_key],
            );
            match res {
                Ok(_) => return Ok(song_id),
                Err(e) => {
                    if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                        // Random id already taken: roll a fresh one, as the
                        // in-memory store does.
                        if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY {
                            continue;
                        }
                        if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
                            return Err(StoreError::DuplicateSong(song_key));
                        }
                    }
                    return Err(e.into());
                }
            }
        }
    }

    fn ingest(&mut self, song_id: u32, hashes: &[FingerprintHash]) -> Result<(), StoreError> {
        let registered: Option<i64> = self
            .db
            .query_row(
                "SELECT id FROM songs WHERE id = ?",
                params![song_id as i64],
                |row| row.get(0),
            )
            .optional()?;
        if registered.is_none() {
            return Err(StoreError::UnknownSong(song_id));
        }

        let tx = self.db.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO fingerprints (code, songID, timeOffset) VALUES (?, ?, ?)",
            )?;
            for hash in hashes {
                stmt.execute(params![
                    hash.code as i64,
                    song_id as i64,
                    hash.time_offset as i64
                ])?;
            }
        }
        tx.execute(
            "UPDATE songs SET hashCount = hashCount + ? WHERE id = ?",
            params![hashes.len() as i64, song_id as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn lookup(&self, codes: &[u32]) -> Result<HashMap<u32, Vec<FingerprintRecord>>, StoreError> {
        let mut found: HashMap<u32, Vec<FingerprintRecord>> = HashMap::new();
        let mut stmt = self
            .db
            .prepare("SELECT songID, timeOffset FROM fingerprints WHERE code = ?")?;

        for &code in codes {
            if found.contains_key(&code) {
                continue;
            }
            let mut rows = stmt.query(params![code as i64])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                let song_id: i64 = row.get(0)?;
                let time_offset: i64 = row.get(1)?;
                records.push(FingerprintRecord {
                    song_id: song_id as u32,
                    time_offset: time_offset as u32,
                });
            }
            if !records.is_empty() {
                found.insert(code, records);
            }
        }

        Ok(found)
    }

    fn get_song_by_id(&self, song_id: u32) -> Result<Option<Song>, StoreError> {
        let song = self
            .db
            .query_row(
                "SELECT id, title, artist, hashCount FROM songs WHERE id = ?",
                params![song_id as i64],
                |row| {
                    Ok(Song {
                        id: row.get::<_, i64>(0)? as u32,
                        title: row.get(1)?,
                        artist: row.get(2)?,
                        hash_count: row.get::<_, i64>(3)? as u64,
                    })
                },
            )
            .optional()?;
        Ok(song)
    }

    fn total_songs(&self) -> Result<u32, StoreError> {
        let count: i64 = self
            .db
            .query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))?;
        Ok(count as u32)
    }

    fn erase_all(&mut self) -> Result<(), StoreError> {
        let tx = self.db.transaction()?;
        tx.execute("DELETE FROM fingerprints", [])?;
        tx.execute("DELETE FROM songs", [])?;
        tx.commit()?;
        Ok(())
    }
}

fn create_tables(db: &Connection) -> Result<(), StoreError> {
    db.execute(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            key TEXT NOT NULL UNIQUE,
            hashCount INTEGER NOT NULL DEFAULT 0
        );
        "#,
        [],
    )?;
    db.execute(
        r#"
        CREATE TABLE IF NOT EXISTS fingerprints (
            code INTEGER NOT NULL,
            songID INTEGER NOT NULL,
            timeOffset INTEGER NOT NULL
        );
        "#,
        [],
    )?;
    db.execute(
        "CREATE INDEX IF NOT EXISTS idx_fingerprints_code ON fingerprints (code)",
        [],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(code: u32, time_offset: u32) -> FingerprintHash {
        FingerprintHash { code, time_offset }
    }

    fn open_temp() -> (tempfile::TempDir, SqliteClient) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fingerprints.sqlite3");
        let client = SqliteClient::new(path.to_str().unwrap()).unwrap();
        (dir, client)
    }

    #[test]
    fn ingest_then_lookup_round_trips() {
        let (_dir, mut store) = open_temp();
        let song_id = store.register_song("Static Bloom", "The Relays").unwrap();
        store
            .ingest(song_id, &[hash(7, 0), hash(7, 12), hash(9, 3)])
            .unwrap();

        let found = store.lookup(&[7, 9, 1000]).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[&7].len(), 2);
        assert_eq!(found[&9], vec![FingerprintRecord { song_id, time_offset: 3 }]);
    }

    #[test]
    fn hash_count_tracks_ingestion() {
        let (_dir, mut store) = open_temp();
        let song_id = store.register_song("Static Bloom", "The Relays").unwrap();
        store.ingest(song_id, &[hash(7, 0), hash(8, 1)]).unwrap();
        store.ingest(song_id, &[hash(7, 0)]).unwrap();

        let song = store.get_song_by_id(song_id).unwrap().unwrap();
        assert_eq!(song.hash_count, 3);
        // Duplicates are kept, not collapsed.
        assert_eq!(store.lookup(&[7]).unwrap()[&7].len(), 2);
    }

    #[test]
    fn duplicate_song_key_is_rejected() {
        let (_dir, mut store) = open_temp();
        store.register_song("Static Bloom", "The Relays").unwrap();
        let err = store.register_song("Static Bloom", "The Relays").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSong(_)));
    }

    #[test]
    fn ingest_for_unknown_song_fails() {
        let (_dir, mut store) = open_temp();
        let err = store.ingest(42, &[hash(1, 0)]).unwrap_err();
        assert!(matches!(err, StoreError::UnknownSong(42)));
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fingerprints.sqlite3");
        let song_id = {
            let mut store = SqliteClient::new(path.to_str().unwrap()).unwrap();
            let song_id = store.register_song("Static Bloom", "The Relays").unwrap();
            store.ingest(song_id, &[hash(7, 5)]).unwrap();
            song_id
        };

        let store = SqliteClient::new(path.to_str().unwrap()).unwrap();
        assert_eq!(store.total_songs().unwrap(), 1);
        let found = store.lookup(&[7]).unwrap();
        assert_eq!(found[&7], vec![FingerprintRecord { song_id, time_offset: 5 }]);
    }

    #[test]
    fn erase_all_clears_everything() {
        let (_dir, mut store) = open_temp();
        let song_id = store.register_song("Static Bloom", "The Relays").unwrap();
        store.ingest(song_id, &[hash(7, 0)]).unwrap();

        store.erase_all().unwrap();
        assert_eq!(store.total_songs().unwrap(), 0);
        assert!(store.lookup(&[7]).unwrap().is_empty());
    }
}
