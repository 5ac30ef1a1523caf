//! Content hashing
//!
//! A file's identity is the SHA-256 digest of its full byte stream. Hashes are
//! stored as raw 32-byte arrays and rendered as 64 lowercase hex characters in
//! logs and in the persisted store.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Buffer size for streaming hash computation (64KB)
const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// SHA-256 digest of a file's content
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hex rendering of the digest
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Short prefix for log lines
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self)
    }
}

/// Error parsing a hex digest
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseHashError {
    #[error("invalid hash length: expected 64 hex characters, got {0}")]
    Length(usize),

    #[error("invalid hex digit in hash: {0:?}")]
    Digit(String),
}

impl FromStr for ContentHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(ParseHashError::Length(s.len()));
        }

        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseHashError::Digit(s.to_string()));
        }

        let mut hash = [0u8; 32];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let hex_str =
                std::str::from_utf8(chunk).map_err(|_| ParseHashError::Digit(s.to_string()))?;
            hash[i] = u8::from_str_radix(hex_str, 16)
                .map_err(|_| ParseHashError::Digit(hex_str.to_string()))?;
        }

        Ok(Self(hash))
    }
}

impl Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Failure to hash a single file
#[derive(Error, Debug)]
pub enum HashError {
    #[error("couldn't open '{}': {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("failed reading '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
}

/// Compute the SHA-256 hash of a file using streaming reads.
///
/// Any open or read failure is returned as an error; a digest is never
/// produced from partial content.
pub fn hash_file(path: &Path) -> Result<ContentHash, HashError> {
    let file = File::open(path).map_err(|source| HashError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    hash_reader(BufReader::with_capacity(HASH_BUFFER_SIZE, file)).map_err(|source| {
        HashError::Read {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Hash everything a reader yields
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<ContentHash> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(digest_to_hash(&hasher.finalize()))
}

/// Compute SHA-256 hash of in-memory data
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    digest_to_hash(&Sha256::digest(data))
}

fn digest_to_hash(digest: &[u8]) -> ContentHash {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(digest);
    ContentHash(hash)
}
