//! API credential handling
//!
//! The bearer token is explicit configuration: loaded at startup, replaced on
//! user submission, removed on reset. It is only ever sent as an
//! `Authorization` header.

use crate::error::{AnalysisError, SageError};
use crate::Result;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Fixed key the token is stored under
pub const CREDENTIAL_KEY: &str = "perplexity_api_key";

/// Opaque bearer token. Never blank.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Trim and validate user input; blank input is a missing credential
    pub fn new(raw: &str) -> std::result::Result<Self, AnalysisError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AnalysisError::MissingCredential);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Raw token, for the Authorization header only
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First 8 hex chars of the SHA-256 of the token, safe to log
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..4])
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<redacted {}>)", self.fingerprint())
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted {}>", self.fingerprint())
    }
}

/// Single-key JSON file standing in for browser local storage
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored credential. A missing file means none is stored.
    pub async fn load(&self) -> Result<Option<Credential>> {
        let entries = self.read_entries().await?;
        let credential = entries
            .get(CREDENTIAL_KEY)
            .and_then(|raw| Credential::new(raw).ok());

        if let Some(c) = &credential {
            info!(fingerprint = %c.fingerprint(), "Loaded stored API key");
        } else {
            debug!(path = %self.path.display(), "No stored API key");
        }

        Ok(credential)
    }

    pub async fn save(&self, credential: &Credential) -> Result<()> {
        let mut entries = self.read_entries().await?;
        entries.insert(CREDENTIAL_KEY.to_string(), credential.expose().to_string());
        self.write_entries(&entries).await?;

        info!(fingerprint = %credential.fingerprint(), "Stored API key");
        Ok(())
    }

    /// Remove the stored key; other keys in the file are left alone
    pub async fn clear(&self) -> Result<()> {
        let mut entries = self.read_entries().await?;
        if entries.remove(CREDENTIAL_KEY).is_none() {
            return Ok(());
        }

        if entries.is_empty() {
            match tokio::fs::remove_file(&self.path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        } else {
            self.write_entries(&entries).await?;
        }

        info!("Cleared stored API key");
        Ok(())
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            SageError::CredentialStore(format!(
                "{} is not a valid credential file: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(entries)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await?;

        // mode() only applies on creation; tighten a file left by an older run
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
        }

        file.write_all(&json).await?;
        file.flush().await?;
        Ok(())
    }
}
