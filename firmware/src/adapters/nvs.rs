//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`CredentialPort`] for the TftClock.
//!
//! # Layout
//!
//! | Namespace | Key    | Content                                      |
//! |-----------|--------|----------------------------------------------|
//! | `auth`    | `wifi` | postcard-encoded SSID + passphrase record    |
//!
//! Nothing else is persisted: pins and NTP settings are fixed by the build.
//! On ESP32 the `auth` namespace lives on the encrypted NVS partition when
//! `CONFIG_NVS_ENCRYPTION` is set; the simulation backend is plaintext.

use serde::{Deserialize, Serialize};

use crate::app::ports::{ConfigError, CredentialPort, StorageError};
use crate::credentials::WifiCredentials;
use log::info;

#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CRED_NAMESPACE: &str = "auth";
const CRED_KEY: &str = "wifi";

/// Upper bound for one stored value.  A full record is under 100 bytes.
pub const MAX_BLOB_SIZE: usize = 128;

/// On-flash form of [`WifiCredentials`].
#[derive(Serialize, Deserialize)]
struct CredentialRecord<'a> {
    ssid: &'a str,
    passphrase: &'a str,
}

/// Encode credentials into the record stored under `auth::wifi`.
pub fn encode_credentials(creds: &WifiCredentials) -> Result<Vec<u8>, ConfigError> {
    let record = CredentialRecord {
        ssid: &creds.ssid,
        passphrase: creds.passphrase.expose(),
    };
    postcard::to_allocvec(&record).map_err(|_| ConfigError::IoError)
}

/// Decode a stored record.  Anything that does not parse or does not fit the
/// fixed-capacity fields is [`ConfigError::Corrupted`].
pub fn decode_credentials(bytes: &[u8]) -> Result<WifiCredentials, ConfigError> {
    let record: CredentialRecord<'_> =
        postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
    WifiCredentials::new(record.ssid, record.passphrase).map_err(|_| ConfigError::Corrupted)
}

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is erased
    /// and re-initialised automatically.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(StorageError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(StorageError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    // ── Backend: simulation ───────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    #[cfg(not(target_os = "espidf"))]
    fn get(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.borrow().get(&Self::composite_key(namespace, key)) {
            Some(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            None => Err(StorageError::NotFound),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn put(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > MAX_BLOB_SIZE {
            return Err(StorageError::Full);
        }
        self.store
            .borrow_mut()
            .insert(Self::composite_key(namespace, key), data.to_vec());
        Ok(())
    }

    // ── Backend: ESP-IDF ──────────────────────────────────────

    /// NVS names are limited to 15 bytes plus NUL.
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn get(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let c_key = Self::c_name(key);
        let result = Self::with_nvs_handle(namespace, false, |handle| {
            let mut size = buf.len();
            let ret = unsafe {
                nvs_get_blob(handle, c_key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(size)
        });
        match result {
            Ok(size) => Ok(size),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
            Err(e) => {
                warn!("NvsAdapter: read {}::{} failed ({})", namespace, key, e);
                Err(StorageError::IoError)
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn put(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > MAX_BLOB_SIZE {
            return Err(StorageError::Full);
        }
        let key = Self::c_name(key);
        let result = Self::with_nvs_handle(namespace, true, |handle| {
            let ret = unsafe {
                nvs_set_blob(handle, key.as_ptr().cast(), data.as_ptr().cast(), data.len())
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        match result {
            Ok(()) => Ok(()),
            Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE => Err(StorageError::Full),
            Err(_) => Err(StorageError::IoError),
        }
    }
}

impl CredentialPort for NvsAdapter {
    fn load(&self) -> Result<WifiCredentials, ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let len = match self.get(CRED_NAMESPACE, CRED_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => return Err(ConfigError::NotFound),
            Err(_) => return Err(ConfigError::IoError),
        };
        let creds = decode_credentials(&buf[..len])?;
        info!("NvsAdapter: loaded credentials (SSID='{}')", creds.ssid);
        Ok(creds)
    }

    fn save(&self, creds: &WifiCredentials) -> Result<(), ConfigError> {
        creds.validate()?;

        let bytes = encode_credentials(creds)?;
        self.put(CRED_NAMESPACE, CRED_KEY, &bytes)
            .map_err(|_| ConfigError::IoError)?;
        info!("NvsAdapter: credentials stored (SSID='{}')", creds.ssid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> WifiCredentials {
        WifiCredentials::new("HomeNet", "password1").unwrap()
    }

    #[test]
    fn load_before_save_is_not_found() {
        let nvs = NvsAdapter::new().unwrap();
        assert_eq!(nvs.load(), Err(ConfigError::NotFound));
    }

    #[test]
    fn save_load_roundtrip_restores_passphrase() {
        let nvs = NvsAdapter::new().unwrap();
        nvs.save(&creds()).unwrap();
        let loaded = nvs.load().unwrap();
        assert_eq!(loaded, creds());
        assert_eq!(loaded.passphrase.expose(), "password1");
    }

    #[test]
    fn save_rejects_invalid_credentials() {
        let nvs = NvsAdapter::new().unwrap();
        let short = WifiCredentials::new("HomeNet", "short").unwrap();
        assert!(matches!(
            nvs.save(&short),
            Err(ConfigError::ValidationFailed(_))
        ));
        assert_eq!(nvs.load(), Err(ConfigError::NotFound));
    }

    #[test]
    fn corrupted_record_detected() {
        let nvs = NvsAdapter::new().unwrap();
        nvs.put(CRED_NAMESPACE, CRED_KEY, &[0xFF; 4]).unwrap();
        assert_eq!(nvs.load(), Err(ConfigError::Corrupted));
    }

    #[test]
    fn oversized_ssid_in_record_is_corrupted() {
        let long = "s".repeat(40);
        let bytes = postcard::to_allocvec(&CredentialRecord {
            ssid: &long,
            passphrase: "password1",
        })
        .unwrap();
        assert_eq!(decode_credentials(&bytes), Err(ConfigError::Corrupted));
    }

    #[test]
    fn record_fits_blob_limit() {
        let max = WifiCredentials::new(&"s".repeat(32), &"a".repeat(64)).unwrap();
        assert!(encode_credentials(&max).unwrap().len() <= MAX_BLOB_SIZE);
    }

    #[test]
    fn oversized_write_rejected() {
        let nvs = NvsAdapter::new().unwrap();
        let big = vec![0u8; MAX_BLOB_SIZE + 1];
        assert_eq!(nvs.put("ns", "big", &big), Err(StorageError::Full));
    }
}
