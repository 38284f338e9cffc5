//! Storage media backing the expiring store
//!
//! A medium is a flat string-to-string namespace. `FileMedium` persists each
//! key as a JSON file under a cache directory; `MemoryMedium` keeps
//! everything in process.

use directories::ProjectDirs;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File extension used for every stored key
const ENTRY_EXTENSION: &str = "json";

/// Longest percent-encoded key used directly as a file stem
///
/// Most filesystems cap a file name at 255 bytes, and a CJK character
/// encodes to nine.
const MAX_ENCODED_KEY_LEN: usize = 200;

/// Marks a digest-named file. `@` is always percent-encoded, so no plain
/// stem starts with it.
const DIGEST_PREFIX: char = '@';

/// A persistent string-keyed store
pub trait StorageMedium: Debug + Send + Sync {
    /// Returns the raw stored string, or `None` if the key is absent
    fn get_item(&self, key: &str) -> io::Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> io::Result<()>;

    /// Removing a missing key is not an error
    fn remove_item(&self, key: &str) -> io::Result<()>;

    fn clear(&self) -> io::Result<()>;

    fn keys(&self) -> io::Result<Vec<String>>;

    fn len(&self) -> io::Result<usize> {
        Ok(self.keys()?.len())
    }
}

/// Stores one file per key inside a directory
///
/// Keys are percent-encoded so that arbitrary search keywords (slashes,
/// non-ASCII text) map onto valid file names. A key whose encoding is too
/// long for a file name is stored as `@<sha256>.json` instead, with the
/// encoded key on the first line of the file.
#[derive(Debug, Clone)]
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    /// Uses the platform cache directory (`~/.cache/cloudsaver/` on Linux)
    ///
    /// Returns `None` if no home directory can be determined.
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "cloudsaver")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let stem = match Self::long_key_header(key) {
            Some(_) => format!("{}{:x}", DIGEST_PREFIX, Sha256::digest(key.as_bytes())),
            None => urlencoding::encode(key).into_owned(),
        };
        self.dir.join(format!("{}.{}", stem, ENTRY_EXTENSION))
    }

    /// The header line for a key too long to encode into a file name
    fn long_key_header(key: &str) -> Option<String> {
        let encoded = urlencoding::encode(key);
        (encoded.len() > MAX_ENCODED_KEY_LEN).then(|| encoded.into_owned())
    }

    fn key_from_path(path: &Path) -> io::Result<Option<String>> {
        if path.extension().map_or(true, |ext| ext != ENTRY_EXTENSION) {
            return Ok(None);
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return Ok(None);
        };

        let encoded = if stem.starts_with(DIGEST_PREFIX) {
            let content = fs::read_to_string(path)?;
            match content.split_once('\n') {
                Some((header, _)) => header.to_string(),
                None => return Ok(None),
            }
        } else {
            stem.to_string()
        };
        Ok(urlencoding::decode(&encoded).ok().map(|k| k.into_owned()))
    }
}

impl StorageMedium for FileMedium {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        let content = match fs::read_to_string(self.entry_path(key)) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let Some(expected) = Self::long_key_header(key) else {
            return Ok(Some(content));
        };
        // A digest file written for some other key reads as absent
        match content.split_once('\n') {
            Some((header, value)) if header == expected => Ok(Some(value.to_string())),
            _ => Ok(None),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let content = match Self::long_key_header(key) {
            Some(header) => format!("{}\n{}", header, value),
            None => value.to_string(),
        };
        fs::write(self.entry_path(key), content)
    }

    fn remove_item(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.entry_path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    fn clear(&self) -> io::Result<()> {
        for key in self.keys()? {
            self.remove_item(&key)?;
        }
        Ok(())
    }

    fn keys(&self) -> io::Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut keys = Vec::new();
        for entry in entries {
            if let Some(key) = Self::key_from_path(&entry?.path())? {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-process medium, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryMedium {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory medium lock poisoned"))
    }
}

impl StorageMedium for MemoryMedium {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> io::Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    fn keys(&self) -> io::Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn len(&self) -> io::Result<usize> {
        Ok(self.lock()?.len())
    }
}
