//! Persisted set of favorite course ids.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const FAVORITES_FILE: &str = "favorites.json";

/// On-disk layout of the favorites file
#[derive(Debug, Serialize, Deserialize)]
struct FavoritesFile {
    ids: BTreeSet<String>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

/// Favorite course ids, written through to disk on every change
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    path: PathBuf,
    ids: BTreeSet<String>,
}

impl FavoritesStore {
    /// Open the store in `custom_dir`, or `~/.educompare` by default
    pub fn open(custom_dir: Option<PathBuf>) -> Result<Self> {
        let dir = match custom_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;

        let path = dir.join(FAVORITES_FILE);
        let ids = Self::load(&path)?;
        tracing::debug!("Loaded {} favorites from {}", ids.len(), path.display());

        Ok(Self { path, ids })
    }

    fn load(path: &Path) -> Result<BTreeSet<String>> {
        if !path.exists() {
            return Ok(BTreeSet::new());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: FavoritesFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse favorites file {}", path.display()))?;
        Ok(file.ids)
    }

    fn save(&self, ids: &BTreeSet<String>) -> Result<()> {
        let file = FavoritesFile {
            ids: ids.clone(),
            updated_at: chrono::Utc::now(),
        };
        let json = serde_json::to_string_pretty(&file).context("Failed to serialize favorites")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Write `ids` to disk and only then adopt it as the in-memory set
    fn commit(&mut self, ids: BTreeSet<String>) -> Result<()> {
        self.save(&ids)?;
        self.ids = ids;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Insert `id`; returns whether the set changed. The set is unchanged
    /// when the write fails.
    pub fn add(&mut self, id: &str) -> Result<bool> {
        if self.ids.contains(id) {
            return Ok(false);
        }
        let mut ids = self.ids.clone();
        ids.insert(id.to_string());
        self.commit(ids)?;
        Ok(true)
    }

    /// Remove `id`; returns whether the set changed
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        if !self.ids.contains(id) {
            return Ok(false);
        }
        let mut ids = self.ids.clone();
        ids.remove(id);
        self.commit(ids)?;
        Ok(true)
    }

    /// Flip membership of `id`; returns whether it is now a favorite
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        if self.contains(id) {
            self.remove(id)?;
            Ok(false)
        } else {
            self.add(id)?;
            Ok(true)
        }
    }
}

fn default_data_dir() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Failed to get home directory")?
        .join(".educompare"))
}
