use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE},
};
use rand::rngs::OsRng;
use rsa::{BigUint, Oaep, RsaPublicKey};
use sha1::{Digest, Sha1};
use zeroize::Zeroizing;

use crate::errors::{GpAuthError, Result};

/// Length of the key fingerprint prefixed to every encrypted credential
pub const FINGERPRINT_LEN: usize = 5;

/// Server RSA public key parsed from its `len | modulus | len | exponent` blob
#[derive(Clone)]
pub struct ServerPublicKey {
    key: RsaPublicKey,
    fingerprint: [u8; FINGERPRINT_LEN],
}

impl ServerPublicKey {
    /// Parse a base64-encoded key blob
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let blob = STANDARD
            .decode(encoded.trim())
            .map_err(|e| GpAuthError::InvalidPublicKey(format!("invalid base64: {}", e)))?;
        Self::from_blob(&blob)
    }

    /// Parse the raw key blob
    pub fn from_blob(blob: &[u8]) -> Result<Self> {
        let (modulus, rest) = read_length_prefixed(blob, "modulus")?;
        let (exponent, _) = read_length_prefixed(rest, "exponent")?;

        let key = RsaPublicKey::new(
            BigUint::from_bytes_be(modulus),
            BigUint::from_bytes_be(exponent),
        )
        .map_err(|e| GpAuthError::InvalidPublicKey(e.to_string()))?;

        let digest = Sha1::digest(blob);
        let mut fingerprint = [0u8; FINGERPRINT_LEN];
        fingerprint[1..].copy_from_slice(&digest[..FINGERPRINT_LEN - 1]);

        Ok(Self { key, fingerprint })
    }

    /// `0x00` followed by the first four bytes of SHA-1 over the key blob
    pub fn fingerprint(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.fingerprint
    }

    /// Encrypt `login \0 password` with RSA-OAEP(SHA-1)
    ///
    /// Returns `fingerprint || ciphertext`. OAEP padding is randomized, so two
    /// calls with the same input never produce the same bytes.
    pub fn encrypt(&self, login: &str, password: &str) -> Result<Vec<u8>> {
        let mut plaintext = Zeroizing::new(Vec::with_capacity(login.len() + password.len() + 1));
        plaintext.extend_from_slice(login.as_bytes());
        plaintext.push(0);
        plaintext.extend_from_slice(password.as_bytes());

        let ciphertext = self
            .key
            .encrypt(&mut OsRng, Oaep::new::<Sha1>(), &plaintext)
            .map_err(|e| GpAuthError::Encryption(e.to_string()))?;

        let mut out = Vec::with_capacity(FINGERPRINT_LEN + ciphertext.len());
        out.extend_from_slice(&self.fingerprint);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }
}

impl std::fmt::Debug for ServerPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerPublicKey")
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

/// Credential blob ready for the `EncryptedPasswd` form field
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedCredential(String);

impl EncryptedCredential {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for EncryptedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptedCredential([REDACTED])")
    }
}

/// Encrypt a login/password pair under a base64 server key and encode it for transport
pub fn encrypt_credentials(
    login: &str,
    password: &str,
    server_public_key: &str,
) -> Result<EncryptedCredential> {
    let key = ServerPublicKey::from_base64(server_public_key)?;
    let bytes = key.encrypt(login, password)?;
    Ok(EncryptedCredential(URL_SAFE.encode(bytes)))
}

fn read_length_prefixed<'a>(data: &'a [u8], field: &str) -> Result<(&'a [u8], &'a [u8])> {
    let (len_bytes, rest) = data.split_first_chunk::<4>().ok_or_else(|| {
        GpAuthError::InvalidPublicKey(format!("truncated {} length", field))
    })?;
    let len = u32::from_be_bytes(*len_bytes) as usize;

    if rest.len() < len {
        return Err(GpAuthError::InvalidPublicKey(format!(
            "{} needs {} bytes, {} available",
            field,
            len,
            rest.len()
        )));
    }

    Ok(rest.split_at(len))
}
