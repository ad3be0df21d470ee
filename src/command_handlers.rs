use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use slog::info;
use walkdir::WalkDir;

use audioprint_rs::config::Config;
use audioprint_rs::engine;
use audioprint_rs::models::Match;
use audioprint_rs::store::{self, FingerprintStore};
use audioprint_rs::utils;
use audioprint_rs::wav;

/// Registers one WAV file, or every WAV under a directory, as reference
/// recordings.
pub fn save(
    path: &str,
    title: Option<&str>,
    artist: Option<&str>,
    config: &Config,
) -> Result<()> {
    let mut store = store::new_store()?;
    let path = Path::new(path);
    if path.is_dir() {
        save_directory(store, path, config)
    } else {
        let song_id = save_file(&mut *store, path, title, artist, config)?;
        println!(
            "Saved {} (song id {})",
            path.display().to_string().green(),
            song_id
        );
        Ok(())
    }
}

fn save_file(
    store: &mut dyn FingerprintStore,
    path: &Path,
    title: Option<&str>,
    artist: Option<&str>,
    config: &Config,
) -> Result<u32> {
    let buffer =
        wav::read_wav(path).with_context(|| format!("reading {}", path.display()))?;
    let fallback_title = title_from_path(path);
    let title = title.unwrap_or(&fallback_title);
    let artist = artist.unwrap_or("unknown");
    let song_id = engine::register(store, &buffer, title, artist, config)
        .with_context(|| format!("registering {}", path.display()))?;
    Ok(song_id)
}

fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string())
}

/// Batch ingestion: fingerprinting runs on a worker pool sized to the
/// machine; only registration and ingest serialize on the store.
fn save_directory(
    store: Box<dyn FingerprintStore>,
    dir: &Path,
    config: &Config,
) -> Result<()> {
    let logger = utils::get_logger();
    let wav_paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
        })
        .collect();

    if wav_paths.is_empty() {
        println!("No WAV files found under {}", dir.display());
        return Ok(());
    }

    let store = Mutex::new(store);
    let workers = num_cpus::get().min(wav_paths.len());
    let chunk_size = wav_paths.len().div_ceil(workers);
    let saved = Mutex::new(0usize);

    thread::scope(|scope| {
        for chunk in wav_paths.chunks(chunk_size) {
            let worker_logger = logger.clone();
            let store = &store;
            let saved = &saved;
            scope.spawn(move || {
                for path in chunk {
                    match ingest_one(store, path, config) {
                        Ok(song_id) => {
                            info!(worker_logger, "saved song";
                                "path" => path.display().to_string(),
                                "song_id" => song_id
                            );
                            *saved.lock().unwrap() += 1;
                        }
                        Err(e) => {
                            let err: &dyn std::error::Error = e.as_ref();
                            utils::log_error(
                                &worker_logger,
                                &format!("failed to save {}", path.display()),
                                err,
                            );
                        }
                    }
                }
            });
        }
    });

    let saved = saved.into_inner().unwrap();
    println!(
        "Saved {} of {} file(s) from {}",
        saved,
        wav_paths.len(),
        dir.display()
    );
    Ok(())
}

fn ingest_one(
    store: &Mutex<Box<dyn FingerprintStore>>,
    path: &Path,
    config: &Config,
) -> Result<u32> {
    let buffer =
        wav::read_wav(path).with_context(|| format!("reading {}", path.display()))?;
    // Pure CPU work happens outside the lock.
    let channel_hashes = engine::fingerprint_buffer(&buffer, config)?;
    let title = title_from_path(path);

    let mut store = store.lock().unwrap();
    let song_id =
        engine::register_fingerprints(&mut **store, &title, "unknown", &channel_hashes)
            .with_context(|| format!("registering {}", path.display()))?;
    Ok(song_id)
}

#[derive(Serialize)]
struct ChannelReport {
    channel: usize,
    hash_count: usize,
    matches: Vec<Match>,
    error: Option<String>,
}

/// Recognizes a recording and prints ranked matches per channel.
pub fn find(path: &str, json: bool, config: &Config) -> Result<()> {
    let store = store::new_store()?;
    let buffer =
        wav::read_wav(Path::new(path)).with_context(|| format!("reading {}", path))?;

    let outcomes = engine::recognize(&*store, &buffer, config)?;

    let mut reports = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        let (matches, error) = match outcome.result {
            Ok(candidates) => (engine::describe_matches(&*store, &candidates)?, None),
            Err(e) => (Vec::new(), Some(e.to_string())),
        };
        reports.push(ChannelReport {
            channel: outcome.channel,
            hash_count: outcome.hash_count,
            matches,
            error,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!(
            "Channel {} ({} hashes):",
            report.channel + 1,
            report.hash_count
        );
        if let Some(error) = &report.error {
            println!("{}", format!("\terror: {}", error).yellow());
            continue;
        }
        if report.matches.is_empty() {
            println!("\tno match");
            continue;
        }
        for m in &report.matches {
            println!(
                "\t- {} by {}, votes: {}, confidence: {:.2}, offset: {} frames",
                m.title, m.artist, m.vote_count, m.confidence, m.aligned_offset_delta
            );
        }
    }

    // Merging policy across channels belongs to the host; this one simply
    // takes the strongest single-channel candidate.
    let best = reports
        .iter()
        .flat_map(|report| report.matches.first())
        .max_by_key(|m| m.vote_count);
    match best {
        Some(m) => println!(
            "\nFinal prediction: {} by {}, confidence: {:.2}",
            m.title.green(),
            m.artist,
            m.confidence
        ),
        None => println!("\nNo match found."),
    }
    Ok(())
}

/// Clears every registered song and fingerprint.
pub fn erase() -> Result<()> {
    let mut store = store::new_store()?;
    store.erase_all().context("erasing the fingerprint store")?;
    println!("Fingerprint store erased.");
    Ok(())
}
