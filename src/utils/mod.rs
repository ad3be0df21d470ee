mod logger;
pub use logger::*;

use std::env;

use rand::Rng;

/// Generates a random u32 song identifier. Stores retry on the rare
/// collision with an existing id.
pub fn generate_unique_id() -> u32 {
    let mut rng = rand::rng();
    rng.random::<u32>()
}

/// The registry key a song is deduplicated on.
pub fn generate_song_key(song_title: &str, song_artist: &str) -> String {
    format!("{}---{}", song_title, song_artist)
}

/// Returns the value of the environment variable `key`, or the fallback
/// (empty string if none) when unset.
pub fn get_env(key: &str, fallback: Option<&str>) -> String {
    env::var(key).unwrap_or_else(|_| fallback.unwrap_or("").to_string())
}
