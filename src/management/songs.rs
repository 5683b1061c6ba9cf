use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    error::{Error, Result},
    search::SongStore,
    types::{QuerySong, Resolution},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongRecord {
    pub song: QuerySong,
    #[serde(default)]
    pub resolution: Option<Resolution>,
}

/// JSON file backed song store.
///
/// All reads and writes go through one async mutex; every saved result is
/// written to disk before the lock is released.
pub struct SongManager {
    path: PathBuf,
    records: Mutex<Vec<SongRecord>>,
}

impl SongManager {
    /// Creates an empty store writing to `path`; nothing is read from disk.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Loads the store from `<data_local_dir>/playgen/cache/songs.json`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the file exists but cannot be read or
    /// parsed.
    ///
    /// # Example
    ///
    /// ```
    /// let store = SongManager::load().await?;
    /// store.add_songs(vec![QuerySong::new("Moderat", "Bad Kingdom", "II")]).await;
    /// store.persist().await?;
    /// ```
    pub async fn load() -> Result<Self> {
        Self::load_from(Self::cache_path()).await
    }

    /// Loads the store at `path`; a missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub async fn load_from(path: PathBuf) -> Result<Self> {
        let records = match async_fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str::<Vec<SongRecord>>(&content)
                .map_err(|e| Error::Storage(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(Error::Storage(format!("{}: {}", path.display(), e))),
        };

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Writes every record to disk, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the file cannot be written.
    pub async fn persist(&self) -> Result<()> {
        let records = self.records.lock().await;
        self.write(&records).await
    }

    /// Adds songs not yet known, returns how many were new.
    ///
    /// Songs are compared by id, so differences in case or whitespace do not
    /// create duplicates. Call [`persist`](Self::persist) to write them.
    pub async fn add_songs(&self, songs: Vec<QuerySong>) -> usize {
        let mut records = self.records.lock().await;
        let mut added = 0;

        for song in songs {
            if records.iter().any(|r| r.song.id == song.id) {
                continue;
            }
            records.push(SongRecord {
                song,
                resolution: None,
            });
            added += 1;
        }

        added
    }

    pub async fn all(&self) -> Vec<SongRecord> {
        self.records.lock().await.clone()
    }

    /// Number of stored songs, resolved or not.
    pub async fn count(&self) -> usize {
        self.records.lock().await.len()
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn write(&self, records: &[SongRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(e.to_string()))?;
        }

        let json =
            serde_json::to_string_pretty(records).map_err(|e| Error::Storage(e.to_string()))?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| Error::Storage(format!("{}: {}", self.path.display(), e)))
    }

    fn cache_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("playgen/cache/songs.json");
        path
    }
}

#[async_trait]
impl SongStore for SongManager {
    async fn unresolved_songs(&self) -> Result<Vec<QuerySong>> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .filter(|r| r.resolution.is_none())
            .map(|r| r.song.clone())
            .collect())
    }

    async fn save_match_result(&self, song_id: &str, resolution: &Resolution) -> Result<()> {
        let mut records = self.records.lock().await;
        let idx = records
            .iter()
            .position(|r| r.song.id == song_id)
            .ok_or_else(|| Error::Storage(format!("unknown song {song_id}")))?;

        // memory only changes once the file holds the new state
        let mut updated = records.clone();
        updated[idx].resolution = Some(resolution.clone());
        self.write(&updated).await?;
        *records = updated;
        Ok(())
    }
}
