use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{self, Argon2, Params};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
/// Prefixed to every plaintext; a wrong passphrase fails on this check.
const MAGIC: &[u8] = b"FLOWCAST_V1";

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key derivation failed")]
    KeyDerivation,
    #[error("encryption failed")]
    Encryption,
    #[error("decryption failed: wrong passphrase or corrupted data")]
    Decryption,
    #[error("invalid data format")]
    InvalidFormat,
}

/// A passphrase-derived key bound to the salt it was derived with.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    salt: [u8; SALT_LEN],
    key: [u8; KEY_LEN],
}

impl VaultKey {
    /// Argon2id over the passphrase and salt.
    pub fn derive(passphrase: &str, salt: [u8; SALT_LEN]) -> Result<Self, CryptoError> {
        let params =
            Params::new(65536, 3, 1, Some(KEY_LEN)).map_err(|_| CryptoError::KeyDerivation)?;
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let mut key = [0u8; KEY_LEN];
        argon2
            .hash_password_into(passphrase.as_bytes(), &salt, &mut key)
            .map_err(|_| CryptoError::KeyDerivation)?;

        Ok(Self { salt, key })
    }

    /// Derive with a fresh random salt, for a vault that does not exist yet.
    pub fn generate(passphrase: &str) -> Result<Self, CryptoError> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::derive(passphrase, salt)
    }

    /// Derive the key for an existing sealed blob, reusing its salt.
    pub fn for_sealed(passphrase: &str, sealed: &[u8]) -> Result<Self, CryptoError> {
        Self::derive(passphrase, salt_of(sealed)?)
    }

    fn cipher(&self) -> Result<Aes256Gcm, CryptoError> {
        Aes256Gcm::new_from_slice(&self.key).map_err(|_| CryptoError::InvalidFormat)
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey").finish_non_exhaustive()
    }
}

fn salt_of(sealed: &[u8]) -> Result<[u8; SALT_LEN], CryptoError> {
    if sealed.len() < SALT_LEN + NONCE_LEN + MAGIC.len() {
        return Err(CryptoError::InvalidFormat);
    }
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&sealed[..SALT_LEN]);
    Ok(salt)
}

/// Encrypt with a fresh nonce.
/// Output: salt (32) || nonce (12) || ciphertext
pub fn seal(key: &VaultKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let mut payload = Vec::with_capacity(MAGIC.len() + plaintext.len());
    payload.extend_from_slice(MAGIC);
    payload.extend_from_slice(plaintext);

    let ciphertext = key
        .cipher()?
        .encrypt(Nonce::from_slice(&nonce_bytes), payload.as_slice())
        .map_err(|_| CryptoError::Encryption);
    payload.zeroize();
    let ciphertext = ciphertext?;

    let mut output = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&key.salt);
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt a blob produced by [`seal`] under the same key.
pub fn open(key: &VaultKey, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if salt_of(sealed)? != key.salt {
        return Err(CryptoError::Decryption);
    }

    let nonce = Nonce::from_slice(&sealed[SALT_LEN..SALT_LEN + NONCE_LEN]);
    let mut decrypted = key
        .cipher()?
        .decrypt(nonce, &sealed[SALT_LEN + NONCE_LEN..])
        .map_err(|_| CryptoError::Decryption)?;

    if !decrypted.starts_with(MAGIC) {
        decrypted.zeroize();
        return Err(CryptoError::Decryption);
    }

    let plaintext = decrypted[MAGIC.len()..].to_vec();
    decrypted.zeroize();
    Ok(plaintext)
}
