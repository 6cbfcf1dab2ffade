//! A file-backed [`Storage`] implementation.
//!
//! On construction the backing file, if present, is decoded fully into
//! memory; a missing file is treated as an empty map. Every mutation
//! only touches the in-memory map — the file is rewritten in full only
//! when [`FileStorage::persist`] is called (normally once, on clean
//! shutdown).
//!
//! # Binary layout
//!
//! ```text
//! count: usize (native byte order, native width)
//! repeat count times:
//!   key_len:   usize
//!   key_bytes: key_len octets
//!   value_len: usize
//!   value_bytes: value_len octets
//! ```
//!
//! A file that exists but does not decode fully (wrong length, EOF
//! mid-record) is a fatal construction error — we tighten the original
//! implementation's "recoverable" EOF handling, see `DESIGN.md`.

use super::Storage;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::mem::size_of;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const WORD: usize = size_of::<usize>();

pub struct FileStorage {
    path: PathBuf,
    data: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl FileStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            load(&path)?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }
}

impl Storage for FileStorage {
    fn put(&self, key: &[u8], value: &[u8]) -> bool {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
        true
    }

    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.lock().unwrap().get(key).cloned()
    }

    fn delete(&self, key: &[u8]) -> bool {
        self.data.lock().unwrap().remove(key).is_some()
    }

    fn get_all_entries(&self) -> HashMap<Vec<u8>, Vec<u8>> {
        self.data.lock().unwrap().clone()
    }

    fn persist(&self) -> Result<()> {
        let data = self.data.lock().unwrap();
        save(&self.path, &data)
    }
}

impl Drop for FileStorage {
    fn drop(&mut self) {
        if let Err(err) = self.persist() {
            log::error!("failed to persist {:?} on drop: {}", self.path, err);
        }
    }
}

fn read_exact_or_eof(f: &mut File, buf: &mut [u8]) -> Result<()> {
    f.read_exact(buf)
        .map_err(|_| Error::CorruptFile("truncated record in storage file".to_string()))
}

fn read_usize(f: &mut File) -> Result<usize> {
    let mut buf = [0u8; WORD];
    read_exact_or_eof(f, &mut buf)?;
    Ok(usize::from_ne_bytes(buf))
}

fn read_bytes(f: &mut File, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    read_exact_or_eof(f, &mut buf)?;
    Ok(buf)
}

fn load(path: &Path) -> Result<HashMap<Vec<u8>, Vec<u8>>> {
    let mut f = File::open(path)?;
    let count = read_usize(&mut f)?;
    let mut map = HashMap::with_capacity(count);
    for _ in 0..count {
        let key_len = read_usize(&mut f)?;
        let key = read_bytes(&mut f, key_len)?;
        let value_len = read_usize(&mut f)?;
        let value = read_bytes(&mut f, value_len)?;
        map.insert(key, value);
    }
    Ok(map)
}

/// Serialize `data` to `path` as a single atomic whole-file overwrite:
/// write to a sibling temp file, then rename over the destination.
fn save(path: &Path, data: &HashMap<Vec<u8>, Vec<u8>>) -> Result<()> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&data.len().to_ne_bytes());
    for (key, value) in data.iter() {
        buf.extend_from_slice(&key.len().to_ne_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(&value.len().to_ne_bytes());
        buf.extend_from_slice(value);
    }

    let tmp_path = path.with_extension("tmp");
    {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(&buf)?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
