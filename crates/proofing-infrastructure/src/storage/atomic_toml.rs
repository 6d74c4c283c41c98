//! Atomic, versioned TOML files.
//!
//! Every stored entity lives in its own TOML file carrying a top-level
//! `version` key. Reads go through a `version_migrate::Migrator` so older
//! files are upgraded transparently; writes always use the latest schema.
//!
//! Writes are tmp file + fsync + rename. Read-modify-write cycles hold an
//! exclusive `fs2` lock on a sibling `.lock` file.

use proofing_core::error::{ProofingError, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use version_migrate::Migrator;

/// A handle to one versioned TOML document on disk.
pub struct VersionedTomlFile<'a> {
    path: PathBuf,
    entity: &'static str,
    migrator: &'a Migrator,
}

impl<'a> VersionedTomlFile<'a> {
    /// # Arguments
    ///
    /// * `path` - The path to the TOML file
    /// * `entity` - Entity name registered in `migrator`
    /// * `migrator` - Migrator with a save path for `entity`
    pub fn new(path: PathBuf, entity: &'static str, migrator: &'a Migrator) -> Self {
        Self {
            path,
            entity,
            migrator,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and migrates the document.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Loaded and converted to the domain model
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read, parse, or migrate the file
    pub fn load<T>(&self) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProofingError::io(format!("Failed to read '{}': {}", self.path.display(), e))
        })?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let toml_value: toml::Value = toml::from_str(&content).map_err(|e| {
            ProofingError::serialization(
                "TOML",
                format!("Failed to parse '{}': {}", self.path.display(), e),
            )
        })?;

        let domain = self
            .migrator
            .load_flat_from(self.entity, toml_value)
            .map_err(|e| {
                ProofingError::Migration(format!(
                    "Failed to migrate '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        Ok(Some(domain))
    }

    /// Writes `domain` with the latest schema version, atomically.
    pub fn save<T>(&self, domain: &T) -> Result<()>
    where
        T: Serialize,
    {
        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                ProofingError::io(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json_str = self
            .migrator
            .save_domain_flat(self.entity, domain)
            .map_err(ProofingError::from)?;
        let json_value: serde_json::Value = serde_json::from_str(&json_str)?;
        let toml_value = json_to_toml(&json_value)?.unwrap_or(toml::Value::Table(Default::default()));
        let toml_str = toml::to_string_pretty(&toml_value)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path).map_err(|e| {
            ProofingError::io(format!(
                "Failed to create temp file '{}': {}",
                tmp_path.display(),
                e
            ))
        })?;
        tmp_file.write_all(toml_str.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            ProofingError::io(format!(
                "Failed to rename '{}' to '{}': {}",
                tmp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Loads, modifies, and saves the document while holding the file lock.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: The document after `f` was applied and saved
    /// - `Ok(None)`: The file doesn't exist; `f` was not called
    pub fn update<T, F>(&self, f: F) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> Result<()>,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let Some(mut domain) = self.load::<T>()? else {
            return Ok(None);
        };
        f(&mut domain)?;
        self.save(&domain)?;

        Ok(Some(domain))
    }

    /// Removes the document. Returns false when it did not exist.
    pub fn remove(&self) -> Result<bool> {
        let _lock = FileLock::acquire(&self.path)?;
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|e| {
            ProofingError::io(format!("Failed to delete '{}': {}", self.path.display(), e))
        })?;
        Ok(true)
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| ProofingError::io("Path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| ProofingError::io("Path has no file name"))?;

        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// Lists `*.toml` files directly under `dir`, skipping temp files.
pub fn list_toml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_toml = path.extension().and_then(|s| s.to_str()) == Some("toml");
        let is_hidden = path
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|name| name.starts_with('.'));
        if path.is_file() && is_toml && !is_hidden {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// A file lock guard released on drop.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive().map_err(|e| {
                ProofingError::io(format!(
                    "Failed to lock '{}': {}",
                    lock_path.display(),
                    e
                ))
            })?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// Converts a serde_json::Value to a toml::Value.
///
/// The migrator speaks JSON. TOML has no null, so null values are dropped
/// (`Ok(None)`) and omitted from their parent table or array.
fn json_to_toml(json: &serde_json::Value) -> Result<Option<toml::Value>> {
    let value = match json {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::Bool(b) => toml::Value::Boolean(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                toml::Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                toml::Value::Float(f)
            } else {
                return Err(ProofingError::serialization(
                    "TOML",
                    format!("Unsupported JSON number: {}", n),
                ));
            }
        }
        serde_json::Value::String(s) => toml::Value::String(s.clone()),
        serde_json::Value::Array(arr) => {
            let mut items = Vec::with_capacity(arr.len());
            for item in arr {
                if let Some(v) = json_to_toml(item)? {
                    items.push(v);
                }
            }
            toml::Value::Array(items)
        }
        serde_json::Value::Object(obj) => {
            let mut table = toml::map::Map::new();
            for (k, v) in obj {
                if let Some(v) = json_to_toml(v)? {
                    table.insert(k.clone(), v);
                }
            }
            toml::Value::Table(table)
        }
    };
    Ok(Some(value))
}
