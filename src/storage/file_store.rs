use std::{
    fs::File,
    io::{ErrorKind, Read, Seek, Write},
    path::PathBuf,
};

use anyhow::{bail, Result};
use fs4::fs_std::FileExt;
use tracing::debug;

use super::kv::{KeyValueStore, StoreKey};

const VALUE_EXTENSION: &str = "json";

/// The main realization of [KeyValueStore]. Every key is one file,
/// `<root>/<namespace>/<name>.json`, read under a shared lock and rewritten under an exclusive
/// one.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;

        Ok(Self { root })
    }

    fn path_for(&self, key: &StoreKey) -> Result<PathBuf> {
        let name = key.name();
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || key.namespace().contains(['/', '\\', '.'])
        {
            bail!("Key {key} can't be mapped to a file");
        }
        Ok(self
            .root
            .join(key.namespace())
            .join(format!("{name}.{VALUE_EXTENSION}")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &StoreKey) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => Err(e)?,
        };

        FileExt::lock_shared(&file)?;
        let mut value = String::new();
        let result = file.read_to_string(&mut value);
        FileExt::unlock(&file)?;
        result?;

        debug!("Read {} bytes from {path:?}", value.len());
        Ok(Some(value))
    }

    fn set(&self, key: &StoreKey, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Truncation happens under the lock, so readers never see a half cleared file.
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        FileExt::lock_exclusive(&file)?;
        let result = (|| -> std::io::Result<()> {
            file.set_len(0)?;
            file.rewind()?;
            file.write_all(value.as_bytes())?;
            file.flush()
        })();
        FileExt::unlock(&file)?;
        result?;

        debug!("Wrote {} bytes to {path:?}", value.len());
        Ok(())
    }

    fn remove(&self, key: &StoreKey) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
