use crate::config::CacheConfig;
use crate::domain::{ChatItem, MoonPhase};
use crate::error::{CryptomoonError, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub mod types;
pub use types::{MoonPhaseRecord, TranscriptRecord, TRANSCRIPT_VERSION};

const TRANSCRIPT_FILE: &str = "chat_cache.json";
const MOON_PHASE_FILE: &str = "moon_phase_cache.json";

/// File-backed cache for the transcript and the moon phase
///
/// Each kind lives in its own JSON file and is overwritten wholesale on
/// save. All methods block; async callers run them on the blocking pool.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Create a store in the configured (or platform default) directory
    pub fn new(config: &CacheConfig) -> Result<Self> {
        Self::new_with_path(config.resolve_dir()?)
    }

    /// Create a store rooted at `dir`, creating the directory if needed
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptomoon::storage::CacheStore;
    ///
    /// let dir = std::env::temp_dir().join("cryptomoon-doc-cache");
    /// let store = CacheStore::new_with_path(&dir).unwrap();
    /// assert!(store.dir().is_dir());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .context("Failed to create cache directory")
            .map_err(|e| CryptomoonError::Storage(format!("{:#}", e)))?;
        Ok(Self { dir })
    }

    /// Directory holding the cache files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the transcript file
    pub fn transcript_path(&self) -> PathBuf {
        self.dir.join(TRANSCRIPT_FILE)
    }

    /// Location of the moon phase file
    pub fn moon_phase_path(&self) -> PathBuf {
        self.dir.join(MOON_PHASE_FILE)
    }

    /// Persist the trailing `limit` items, replacing the previous transcript
    pub fn save_transcript(&self, items: &[ChatItem], limit: usize) -> Result<()> {
        let record = TranscriptRecord::from_trailing(items, limit, Utc::now());
        write_json(&self.transcript_path(), &record)?;
        tracing::debug!(
            saved = record.items.len(),
            total = items.len(),
            "Transcript saved"
        );
        Ok(())
    }

    /// Load the transcript; an absent file yields an empty record
    pub fn load_transcript(&self) -> Result<TranscriptRecord> {
        let path = self.transcript_path();
        if !path.exists() {
            return Ok(TranscriptRecord::empty());
        }

        let record: TranscriptRecord = read_json(&path)?;
        if record.version > TRANSCRIPT_VERSION {
            tracing::warn!(
                "Transcript was written with format version {} (this build writes {}); loading anyway",
                record.version,
                TRANSCRIPT_VERSION
            );
        }
        tracing::debug!(items = record.items.len(), "Transcript loaded");
        Ok(record)
    }

    /// Delete the transcript file; missing files are not an error
    pub fn clear_transcript(&self) -> Result<()> {
        remove_if_exists(&self.transcript_path())
    }

    /// Cache a freshly fetched moon phase
    pub fn save_moon_phase(&self, moon_phase: &MoonPhase) -> Result<()> {
        self.save_moon_phase_at(moon_phase, Utc::now())
    }

    /// Cache a moon phase with an explicit fetch time
    pub fn save_moon_phase_at(&self, moon_phase: &MoonPhase, cached_at: DateTime<Utc>) -> Result<()> {
        let record = MoonPhaseRecord {
            moon_phase: moon_phase.clone(),
            cached_at,
        };
        write_json(&self.moon_phase_path(), &record)?;
        tracing::debug!("Moon phase cached: {}", moon_phase.phase);
        Ok(())
    }

    /// Load the cached moon phase
    ///
    /// Returns `None` when the file is absent or the record is empty.
    pub fn load_moon_phase(&self) -> Result<Option<MoonPhaseRecord>> {
        let path = self.moon_phase_path();
        if !path.exists() {
            return Ok(None);
        }

        let record: MoonPhaseRecord = read_json(&path)?;
        if record.is_empty() {
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Load the cached moon phase, failing with `NoData` when there is none
    pub fn require_moon_phase(&self) -> Result<MoonPhaseRecord> {
        self.load_moon_phase()?
            .ok_or_else(|| CryptomoonError::NoData("No cached moon phase".to_string()).into())
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| {
        CryptomoonError::Storage(format!("Failed to encode {}: {}", path.display(), e))
    })?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write {}", path.display()))
        .map_err(|e| CryptomoonError::Storage(format!("{:#}", e)))?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))
        .map_err(|e| CryptomoonError::Storage(format!("{:#}", e)))?;
    serde_json::from_str(&contents).map_err(|e| {
        CryptomoonError::Deserialization(format!("Corrupt cache file {}: {}", path.display(), e))
            .into()
    })
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CryptomoonError::Storage(format!(
            "Failed to remove {}: {}",
            path.display(),
            e
        ))
        .into()),
    }
}
