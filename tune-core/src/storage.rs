//! # Score Storage
//!
//! Persists the best score and the octave selection between sessions. The
//! core only talks to the [`ScoreStore`] trait; a failing store never stops
//! the game, the session logs the error and carries on.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::score::Score;

/// Key the high score is stored under.
pub const HIGH_SCORE_KEY: &str = "tune";

/// Key the octave selection is stored under.
pub const OCTAVES_KEY: &str = "tune.octaves";

/// Narrow persistence interface consumed by the session.
pub trait ScoreStore {
    /// The stored record, `None` when nothing has been stored yet.
    fn high_score(&self) -> Result<Option<Score>>;

    fn set_high_score(&self, score: Score) -> Result<()>;

    /// The stored octave selection, `None` when nothing has been stored yet.
    fn octaves(&self) -> Result<Option<Vec<i8>>>;

    fn set_octaves(&self, octaves: &[i8]) -> Result<()>;
}

/// Stores JSON-encoded values in a single file, one entry per key.
///
/// A missing file or key reads as "no record".
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform's local data directory.
    pub fn in_data_dir() -> Result<Self> {
        let dir = dirs::data_local_dir().ok_or_else(|| anyhow!("No local data directory"))?;
        Ok(Self::new(dir.join("tune").join("store.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, Value>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e).with_context(|| format!("opening {}", self.path.display())),
        };
        let mut data = String::new();
        file.read_to_string(&mut data)?;
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let value: Value =
            serde_json::from_str(&data).with_context(|| format!("parsing {}", self.path.display()))?;
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            // Older stores held the bare high score.
            Value::Number(_) => Ok(BTreeMap::from([(HIGH_SCORE_KEY.to_string(), value)])),
            other => Err(anyhow!(
                "unexpected {} in {}",
                json_kind(&other),
                self.path.display()
            )),
        }
    }

    fn read_key<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_entries()?.remove(key) {
            Some(Value::Null) | None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    /// Writes one key, keeping the others.
    ///
    /// An unreadable file is replaced rather than blocking every later
    /// write. The new contents go to a sibling file first and are renamed
    /// over the store, so an interrupted write leaves the old file intact.
    fn write_key<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let mut entries = self.read_entries().unwrap_or_else(|e| {
            log::warn!("[STORE] Discarding unreadable store: {:#}", e);
            BTreeMap::new()
        });
        entries.insert(key.to_string(), serde_json::to_value(value)?);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json_string = serde_json::to_string_pretty(&entries)?;
        let staging = self.staging_path();
        let mut file = File::create(&staging)
            .with_context(|| format!("creating {}", staging.display()))?;
        file.write_all(json_string.as_bytes())?;
        file.sync_all()?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl ScoreStore for JsonFileStore {
    fn high_score(&self) -> Result<Option<Score>> {
        self.read_key(HIGH_SCORE_KEY)
    }

    fn set_high_score(&self, score: Score) -> Result<()> {
        self.write_key(HIGH_SCORE_KEY, &score)?;
        log::info!("[STORE] High score {} saved to {}", score, self.path.display());
        Ok(())
    }

    fn octaves(&self) -> Result<Option<Vec<i8>>> {
        self.read_key(OCTAVES_KEY)
    }

    fn set_octaves(&self, octaves: &[i8]) -> Result<()> {
        self.write_key(OCTAVES_KEY, &octaves)
    }
}

/// In-memory store that remembers every high score written to it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    high_score: Mutex<Option<Score>>,
    octaves: Mutex<Option<Vec<i8>>>,
    writes: Mutex<Vec<Score>>,
}

impl MemoryStore {
    pub fn with_high_score(score: Score) -> Self {
        Self {
            high_score: Mutex::new(Some(score)),
            ..Self::default()
        }
    }

    /// Every score passed to `set_high_score`, oldest first.
    pub fn writes(&self) -> Vec<Score> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl ScoreStore for MemoryStore {
    fn high_score(&self) -> Result<Option<Score>> {
        self.high_score
            .lock()
            .map(|s| *s)
            .map_err(|_| anyhow!("store lock poisoned"))
    }

    fn set_high_score(&self, score: Score) -> Result<()> {
        let mut high_score = self
            .high_score
            .lock()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        *high_score = Some(score);
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(score);
        }
        Ok(())
    }

    fn octaves(&self) -> Result<Option<Vec<i8>>> {
        self.octaves
            .lock()
            .map(|o| o.clone())
            .map_err(|_| anyhow!("store lock poisoned"))
    }

    fn set_octaves(&self, octaves: &[i8]) -> Result<()> {
        let mut stored = self
            .octaves
            .lock()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        *stored = Some(octaves.to_vec());
        Ok(())
    }
}
