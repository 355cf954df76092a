//! Encrypted persistent storage for the directory.

use super::Directory;
use crate::config::StoreConfig;
use crate::error::ApiError;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Label mixed into the key derivation.
const KEY_DERIVATION_LABEL: &str = "ikomyut-api/directory";

/// Nonce size for AES-GCM (96 bits = 12 bytes).
const NONCE_SIZE: usize = 12;

/// AES-256-GCM encrypted file store for the directory.
pub struct EncryptedStore {
    storage_path: PathBuf,
    key: [u8; 32],
}

impl EncryptedStore {
    /// Create a store whose key is derived from `secret`.
    pub fn new(storage_path: PathBuf, secret: &str) -> Self {
        Self::with_key(storage_path, derive_key(secret))
    }

    /// Create a store with a pre-derived key.
    pub fn with_key(storage_path: PathBuf, key: [u8; 32]) -> Self {
        Self { storage_path, key }
    }

    /// Path of the encrypted file.
    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Save the directory to encrypted persistent storage.
    ///
    /// File format: [12 bytes nonce][ciphertext with auth tag]
    pub async fn save(&self, directory: &Directory) -> Result<(), ApiError> {
        let plaintext = serde_json::to_vec(directory)?;
        let data = encrypt(&plaintext, &self.key)?;

        if let Some(parent) = self.storage_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write atomically using temp file + rename
        let temp_path = self.storage_path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.storage_path).await?;

        debug!(
            "Saved encrypted directory ({} bytes) to {:?}",
            data.len(),
            self.storage_path
        );
        Ok(())
    }

    /// Load the directory from encrypted persistent storage.
    ///
    /// Returns an empty directory if the file doesn't exist.
    pub async fn load(&self) -> Result<Directory, ApiError> {
        if !self.storage_path.exists() {
            info!(
                "Directory file not found at {:?}, starting with empty directory",
                self.storage_path
            );
            return Ok(Directory::new());
        }

        let data = fs::read(&self.storage_path).await?;

        if data.len() < NONCE_SIZE {
            warn!("Directory file too short, starting with empty directory");
            return Ok(Directory::new());
        }

        let plaintext = decrypt(&data, &self.key).map_err(|_| {
            ApiError::Encryption(
                "Failed to decrypt directory. Check that STORE__SECRET has not changed."
                    .to_string(),
            )
        })?;

        let directory: Directory = serde_json::from_slice(&plaintext)?;

        info!(
            "Loaded encrypted directory with {} users and {} contacts from {:?}",
            directory.user_count(),
            directory.contact_count(),
            self.storage_path
        );
        Ok(directory)
    }

    /// Check if a directory file exists.
    pub fn exists(&self) -> bool {
        self.storage_path.exists()
    }
}

/// In-memory store for tests or when persistence is disabled.
pub struct MemoryStore;

impl MemoryStore {
    /// "Save" does nothing for memory store.
    pub async fn save(&self, _directory: &Directory) -> Result<(), ApiError> {
        debug!("Memory store: save is a no-op");
        Ok(())
    }

    /// "Load" returns an empty directory.
    pub async fn load(&self) -> Result<Directory, ApiError> {
        debug!("Memory store: returning empty directory");
        Ok(Directory::new())
    }
}

/// Storage backend selected from configuration.
pub enum Store {
    /// Encrypted file storage
    Encrypted(EncryptedStore),
    /// In-memory only (no persistence)
    Memory(MemoryStore),
}

impl Store {
    /// Pick a store from configuration.
    ///
    /// Persistence needs a secret to derive the key from; without one the
    /// memory store is used.
    pub fn from_config(config: &StoreConfig) -> Self {
        match (config.persist, config.secret.as_deref()) {
            (true, Some(secret)) if !secret.is_empty() => {
                let store = EncryptedStore::new(config.path.clone(), secret);
                info!(path = ?store.path(), "Using encrypted directory storage");
                Store::Encrypted(store)
            }
            (true, _) => {
                warn!("STORE__SECRET not set, using in-memory storage (data will be lost on restart)");
                Store::memory()
            }
            (false, _) => {
                info!("Persistence disabled, using in-memory storage");
                Store::memory()
            }
        }
    }

    /// Force encrypted store.
    pub fn encrypted(storage_path: PathBuf, secret: &str) -> Self {
        Store::Encrypted(EncryptedStore::new(storage_path, secret))
    }

    /// Force memory store.
    pub fn memory() -> Self {
        Store::Memory(MemoryStore)
    }

    /// Save the directory.
    pub async fn save(&self, directory: &Directory) -> Result<(), ApiError> {
        match self {
            Store::Encrypted(s) => s.save(directory).await,
            Store::Memory(s) => s.save(directory).await,
        }
    }

    /// Load the directory.
    pub async fn load(&self) -> Result<Directory, ApiError> {
        match self {
            Store::Encrypted(s) => s.load().await,
            Store::Memory(s) => s.load().await,
        }
    }
}

/// Derive a 32-byte key: SHA256(label || secret).
fn derive_key(secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(KEY_DERIVATION_LABEL.as_bytes());
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

fn encrypt(plaintext: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, ApiError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher.encrypt(nonce, plaintext)?;

    let mut data = nonce_bytes.to_vec();
    data.extend(ciphertext);
    Ok(data)
}

fn decrypt(data: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, ApiError> {
    if data.len() < NONCE_SIZE {
        return Err(ApiError::Encryption("Data too short".into()));
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);

    Ok(cipher.decrypt(nonce, &data[NONCE_SIZE..])?)
}
