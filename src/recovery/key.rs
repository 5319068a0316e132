//! Secret storage recovery keys
//!
//! Wire form: base58 of `0x8B 0x01 || key || parity`, where parity is the
//! XOR of every preceding byte. Shown to users in groups of four characters.

use std::fmt;
use thiserror::Error;

const PREFIX: [u8; 2] = [0x8B, 0x01];
pub const KEY_LENGTH: usize = 32;
const ENCODED_LENGTH: usize = PREFIX.len() + KEY_LENGTH + 1;

#[derive(Error, Debug)]
pub enum RecoveryKeyError {
    #[error("Recovery key is not valid base58: {0}")]
    Base58(#[from] bs58::decode::Error),
    #[error("Recovery key has the wrong length ({0} bytes)")]
    InvalidLength(usize),
    #[error("Recovery key has an unknown prefix")]
    InvalidPrefix,
    #[error("Recovery key parity check failed")]
    InvalidParity,
}

/// A decoded 32-byte secret storage key
#[derive(Clone, PartialEq, Eq)]
pub struct RecoveryKey([u8; KEY_LENGTH]);

impl RecoveryKey {
    #[cfg(test)]
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Decode a user-entered recovery key; whitespace is ignored
    pub fn decode(input: &str) -> Result<Self, RecoveryKeyError> {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = bs58::decode(compact).into_vec()?;

        if bytes.len() != ENCODED_LENGTH {
            return Err(RecoveryKeyError::InvalidLength(bytes.len()));
        }
        if bytes[..PREFIX.len()] != PREFIX {
            return Err(RecoveryKeyError::InvalidPrefix);
        }
        if bytes.iter().fold(0u8, |acc, b| acc ^ b) != 0 {
            return Err(RecoveryKeyError::InvalidParity);
        }

        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(&bytes[PREFIX.len()..PREFIX.len() + KEY_LENGTH]);
        Ok(Self(key))
    }

    /// Display form, e.g. `EsTc LW2K PGiF ...`
    pub fn encode(&self) -> String {
        let mut bytes = Vec::with_capacity(ENCODED_LENGTH);
        bytes.extend_from_slice(&PREFIX);
        bytes.extend_from_slice(&self.0);
        let parity = bytes.iter().fold(0u8, |acc, b| acc ^ b);
        bytes.push(parity);

        let encoded = bs58::encode(bytes).into_string();
        encoded
            .as_bytes()
            .chunks(4)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for RecoveryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecoveryKey(..)")
    }
}
