// Shop Track - Authentication
// Credentials validated offline against the OS keychain: the keychain stores
// a BLAKE3 keyed hash of the password per account, never the password itself.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use crate::error::{Result, ShopTrackError};

/// Keychain service name
const KEYCHAIN_SERVICE: &str = "com.shoptrack.app";

/// Minimum password length accepted at registration
const MIN_PASSWORD_LEN: usize = 6;

/// Secret key for BLAKE3 keyed hashing (32 bytes).
/// Light friction against casual keychain reads, not a KDF.
const CREDENTIAL_SECRET: [u8; 32] = [
    0x2f, 0x9c, 0x11, 0xe8, 0x5b, 0xd0, 0x47, 0xa3,
    0x8e, 0x64, 0xf2, 0x0d, 0xc9, 0x35, 0x7a, 0x16,
    0xb8, 0x41, 0xde, 0x93, 0x0a, 0x6f, 0xc4, 0x58,
    0xe1, 0x27, 0xb0, 0x4c, 0x99, 0x12, 0xd6, 0x85,
];

/// An authenticated staff session. No role distinction: every session
/// routes identically.
#[derive(Debug, Clone)]
pub struct Session {
    pub email: String,
    pub started_at: String,
}

/// Authentication seam. Login resolves to a session or rejects with one
/// opaque error regardless of which credential was wrong.
pub trait AuthProvider: Send + Sync {
    fn login(&self, email: &str, password: &str) -> Result<Session>;
}

fn credential_hash(email: &str, password: &str) -> String {
    let mut hasher = blake3::Hasher::new_keyed(&CREDENTIAL_SECRET);
    hasher.update(email.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hasher.finalize().to_hex().to_string()
}

fn check_registration(email: &str, password: &str) -> Result<()> {
    if !email.contains('@') || email.trim() != email || email.is_empty() {
        return Err(ShopTrackError::Credentials(format!(
            "not a usable email address: {}",
            email
        )));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ShopTrackError::Credentials(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn new_session(email: &str) -> Session {
    Session {
        email: email.to_string(),
        started_at: Utc::now().to_rfc3339(),
    }
}

/// Keychain-backed provider: one keychain entry per account email.
pub struct KeychainAuthProvider;

impl KeychainAuthProvider {
    /// Store credentials for a staff account. Unlike login, registration
    /// reports what went wrong.
    pub fn register(&self, email: &str, password: &str) -> Result<()> {
        check_registration(email, password)?;

        let entry = keyring::Entry::new(KEYCHAIN_SERVICE, email)
            .map_err(|e| ShopTrackError::Credentials(e.to_string()))?;
        entry
            .set_password(&credential_hash(email, password))
            .map_err(|e| ShopTrackError::Credentials(e.to_string()))?;

        log::info!("Registered account {}", email);
        Ok(())
    }
}

impl AuthProvider for KeychainAuthProvider {
    fn login(&self, email: &str, password: &str) -> Result<Session> {
        // Unknown account, missing keychain, wrong password: same error.
        let entry =
            keyring::Entry::new(KEYCHAIN_SERVICE, email).map_err(|_| ShopTrackError::Auth)?;
        let stored = entry.get_password().map_err(|_| ShopTrackError::Auth)?;

        if stored != credential_hash(email, password) {
            return Err(ShopTrackError::Auth);
        }
        Ok(new_session(email))
    }
}

/// In-memory provider for tests and headless setups without a keychain.
#[derive(Default)]
pub struct MemoryAuthProvider {
    accounts: Mutex<HashMap<String, String>>,
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, email: &str, password: &str) -> Result<()> {
        check_registration(email, password)?;
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), credential_hash(email, password));
        Ok(())
    }
}

impl AuthProvider for MemoryAuthProvider {
    fn login(&self, email: &str, password: &str) -> Result<Session> {
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(email) {
            Some(stored) if *stored == credential_hash(email, password) => Ok(new_session(email)),
            _ => Err(ShopTrackError::Auth),
        }
    }
}
