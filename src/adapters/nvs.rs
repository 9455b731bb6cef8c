//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`PersistencePort`] for the MohnNode.  On target every call
//! opens the namespace, performs one typed NVS operation and commits; on the
//! host an in-memory map stands in, with the same 15-character name limit
//! and an optional write-failure switch for tests.
//!
//! Atomicity: ESP-IDF NVS commits are atomic per `nvs_commit()`.

use crate::app::ports::PersistencePort;
use crate::error::StorageError;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::{info, warn};

/// NVS limit on namespace and key names (excluding NUL).
pub const MAX_NAME_LEN: usize = 15;

#[cfg(target_os = "espidf")]
const MAX_STR_LEN: usize = 4000;

fn c_name(name: &str) -> Result<[u8; MAX_NAME_LEN + 1], StorageError> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_NAME_LEN || bytes.contains(&0) {
        return Err(StorageError::InvalidKey);
    }
    let mut buf = [0u8; MAX_NAME_LEN + 1];
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(buf)
}

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, PartialEq, Eq)]
enum Stored {
    Str(String),
    Int(i64),
}

pub struct NvsStore {
    #[cfg(not(target_os = "espidf"))]
    entries: HashMap<(String, String), Stored>,
    #[cfg(not(target_os = "espidf"))]
    fail_writes: bool,
}

// ───────────────────────────────────────────────────────────────
// Host simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl NvsStore {
    pub fn new() -> Self {
        log::info!("NvsStore: simulation backend");
        Self {
            entries: HashMap::new(),
            fail_writes: false,
        }
    }

    /// Make every subsequent write fail with [`StorageError::Io`].
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of keys stored in `namespace`.
    pub fn key_count(&self, namespace: &str) -> usize {
        self.entries.keys().filter(|(ns, _)| ns == namespace).count()
    }

    fn put(&mut self, namespace: &str, key: &str, value: Stored) -> Result<(), StorageError> {
        c_name(namespace)?;
        c_name(key)?;
        if self.fail_writes {
            return Err(StorageError::Io);
        }
        self.entries
            .insert((namespace.to_owned(), key.to_owned()), value);
        Ok(())
    }

    fn get(&self, namespace: &str, key: &str) -> Option<&Stored> {
        self.entries.get(&(namespace.to_owned(), key.to_owned()))
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for NvsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl PersistencePort for NvsStore {
    fn get_str(&self, namespace: &str, key: &str) -> Option<String> {
        match self.get(namespace, key) {
            Some(Stored::Str(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn get_i64(&self, namespace: &str, key: &str) -> Option<i64> {
        match self.get(namespace, key) {
            Some(Stored::Int(v)) => Some(*v),
            _ => None,
        }
    }

    fn put_str(&mut self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        self.put(namespace, key, Stored::Str(value.to_owned()))
    }

    fn put_i64(&mut self, namespace: &str, key: &str, value: i64) -> Result<(), StorageError> {
        self.put(namespace, key, Stored::Int(value))
    }

    fn clear(&mut self, namespace: &str) -> Result<(), StorageError> {
        c_name(namespace)?;
        if self.fail_writes {
            return Err(StorageError::Io);
        }
        self.entries.retain(|(ns, _), _| ns != namespace);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn map_err(code: esp_err_t) -> StorageError {
    match code {
        ESP_ERR_NVS_NOT_FOUND => StorageError::NotFound,
        ESP_ERR_NVS_NOT_ENOUGH_SPACE => StorageError::Full,
        ESP_ERR_NVS_INVALID_NAME | ESP_ERR_NVS_KEY_TOO_LONG => StorageError::InvalidKey,
        _ => StorageError::Io,
    }
}

#[cfg(target_os = "espidf")]
impl NvsStore {
    /// Initialise the default NVS partition.  On first boot or after a
    /// version mismatch the partition is erased and re-initialised.
    pub fn init() -> Result<Self, StorageError> {
        // SAFETY: called once from the main task before any other NVS access.
        let mut ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
            warn!("NvsStore: erasing and re-initialising flash partition");
            if unsafe { nvs_flash_erase() } != ESP_OK {
                return Err(StorageError::Io);
            }
            ret = unsafe { nvs_flash_init() };
        }
        if ret != ESP_OK {
            return Err(map_err(ret));
        }
        info!("NvsStore: ESP-IDF NVS initialised");
        Ok(Self {})
    }

    /// Open `namespace`, run `f` with the handle, commit if writing, close.
    fn with_handle<T>(
        namespace: &str,
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    ) -> Result<T, StorageError> {
        let ns = c_name(namespace)?;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        // SAFETY: `ns` is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(map_err(ret));
        }
        let mut result = f(handle);
        if write && result.is_ok() {
            // SAFETY: handle was opened read-write above.
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                result = Err(ret);
            }
        }
        // SAFETY: handle is valid and closed exactly once.
        unsafe { nvs_close(handle) };
        result.map_err(map_err)
    }
}

#[cfg(target_os = "espidf")]
impl PersistencePort for NvsStore {
    fn get_str(&self, namespace: &str, key: &str) -> Option<String> {
        let k = c_name(key).ok()?;
        let result = Self::with_handle(namespace, false, |handle| {
            let mut len: usize = 0;
            // SAFETY: null output pointer queries the required length.
            let ret = unsafe { nvs_get_str(handle, k.as_ptr().cast(), core::ptr::null_mut(), &mut len) };
            if ret != ESP_OK {
                return Err(ret);
            }
            if len == 0 || len > MAX_STR_LEN {
                return Err(ESP_ERR_NVS_INVALID_LENGTH);
            }
            let mut buf = vec![0u8; len];
            // SAFETY: `buf` holds `len` bytes as reported above.
            let ret = unsafe { nvs_get_str(handle, k.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut len) };
            if ret != ESP_OK {
                return Err(ret);
            }
            buf.truncate(len.saturating_sub(1)); // drop NUL
            Ok(buf)
        });
        match result {
            Ok(bytes) => String::from_utf8(bytes).ok(),
            Err(StorageError::NotFound) => None,
            Err(e) => {
                warn!("NvsStore: read {}/{} failed: {}", namespace, key, e);
                None
            }
        }
    }

    fn get_i64(&self, namespace: &str, key: &str) -> Option<i64> {
        let k = c_name(key).ok()?;
        let result = Self::with_handle(namespace, false, |handle| {
            let mut value: i64 = 0;
            // SAFETY: `value` is a valid out-pointer.
            let ret = unsafe { nvs_get_i64(handle, k.as_ptr().cast(), &mut value) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(value)
        });
        match result {
            Ok(v) => Some(v),
            Err(StorageError::NotFound) => None,
            Err(e) => {
                warn!("NvsStore: read {}/{} failed: {}", namespace, key, e);
                None
            }
        }
    }

    fn put_str(&mut self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        let k = c_name(key)?;
        if value.len() >= MAX_STR_LEN {
            return Err(StorageError::Full);
        }
        let v = std::ffi::CString::new(value).map_err(|_| StorageError::Io)?;
        Self::with_handle(namespace, true, |handle| {
            // SAFETY: both pointers are NUL-terminated and live for the call.
            let ret = unsafe { nvs_set_str(handle, k.as_ptr().cast(), v.as_ptr()) };
            if ret == ESP_OK { Ok(()) } else { Err(ret) }
        })
    }

    fn put_i64(&mut self, namespace: &str, key: &str, value: i64) -> Result<(), StorageError> {
        let k = c_name(key)?;
        Self::with_handle(namespace, true, |handle| {
            // SAFETY: key pointer is NUL-terminated and lives for the call.
            let ret = unsafe { nvs_set_i64(handle, k.as_ptr().cast(), value) };
            if ret == ESP_OK { Ok(()) } else { Err(ret) }
        })
    }

    fn clear(&mut self, namespace: &str) -> Result<(), StorageError> {
        let result = Self::with_handle(namespace, true, |handle| {
            // SAFETY: handle opened read-write by `with_handle`.
            let ret = unsafe { nvs_erase_all(handle) };
            if ret == ESP_OK { Ok(()) } else { Err(ret) }
        });
        match result {
            // Namespace never created: nothing to clear.
            Err(StorageError::NotFound) => Ok(()),
            other => {
                if other.is_ok() {
                    info!("NvsStore: cleared namespace '{}'", namespace);
                }
                other
            }
        }
    }
}
