//! Directory-backed store for native builds
//!
//! Each key maps to `<dir>/<key>.json`. Writes go to a temp file first and
//! are renamed over the old value, so a crash mid-write keeps the previous save.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StoreError};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$TOWER_PULL_DATA_DIR`, else `$XDG_DATA_HOME/tower-pull`, else
    /// `~/.local/share/tower-pull`, else `./tower-pull-data`
    pub fn from_env() -> Self {
        Self::new(resolve_data_dir(|name| std::env::var_os(name)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn resolve_data_dir(var: impl Fn(&str) -> Option<OsString>) -> PathBuf {
    if let Some(explicit) = var("TOWER_PULL_DATA_DIR") {
        return PathBuf::from(explicit);
    }

    let base = var("XDG_DATA_HOME").map(PathBuf::from).or_else(|| {
        var("HOME").map(|home| {
            let mut p = PathBuf::from(home);
            p.push(".local");
            p.push("share");
            p
        })
    });

    match base {
        Some(mut dir) => {
            dir.push("tower-pull");
            dir
        }
        None => PathBuf::from("tower-pull-data"),
    }
}
