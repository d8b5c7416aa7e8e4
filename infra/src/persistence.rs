use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::*;
use serde::{de::DeserializeOwned, Serialize};

use crate::documents::{self, Versioned};

/// A flat keyed store of serialized documents.
pub trait Storage {
    fn load_raw(&self, key: &str) -> Result<Option<String>>;
    fn save_raw(&self, key: &str, body: &str) -> Result<()>;
}

impl<'a, S: Storage + ?Sized> Storage for &'a S {
    fn load_raw(&self, key: &str) -> Result<Option<String>> {
        (**self).load_raw(key)
    }
    fn save_raw(&self, key: &str, body: &str) -> Result<()> {
        (**self).save_raw(key, body)
    }
}

/// One `<key>.json` file per document under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    docs: RefCell<HashMap<String, String>>,
}

pub struct Documents<S> {
    storage: S,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        let dir = dir.into();
        FileStorage { dir }
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn load_raw(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_of(key);
        match fs::read_to_string(&path) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No document at {:?}", path);
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("read {:?}", path)),
        }
    }

    fn save_raw(&self, key: &str, body: &str) -> Result<()> {
        let path = self.path_of(key);
        write_replacing(&path, body.as_bytes()).with_context(|| format!("write {:?}", path))?;
        debug!("Saved {} bytes to {:?}", body.len(), path);
        Ok(())
    }
}

// Writes beside the target and renames over it, so a reader never sees a
// half-written document.
fn write_replacing(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_extension("json.tmp");
    let mut file = File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn load_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.docs.borrow().get(key).cloned())
    }

    fn save_raw(&self, key: &str, body: &str) -> Result<()> {
        self.docs
            .borrow_mut()
            .insert(key.to_string(), body.to_string());
        Ok(())
    }
}

impl<S: Storage> Documents<S> {
    pub fn wrap(storage: S) -> Self {
        Documents { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn save<D: Serialize + Versioned>(&self, key: &str, document: &D) -> Result<()> {
        let json = documents::encode(document)?;
        self.storage.save_raw(key, &json)?;
        Ok(())
    }

    /// Loads the document stored under `key`, if any. Documents written with
    /// another format version are an error, see [`documents::decode`].
    pub fn load<D: DeserializeOwned + Versioned>(&self, key: &str) -> Result<Option<D>> {
        match self.storage.load_raw(key)? {
            Some(body) => {
                let doc = documents::decode(&body).with_context(|| format!("decode {}", key))?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }
}
