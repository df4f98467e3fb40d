//! Hex encoding of signature digests.

/// Why a hex string could not be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    #[error("hex string has an odd number of characters")]
    OddLength,

    #[error("invalid hex character {c:?} at index {index}")]
    InvalidCharacter { c: char, index: usize },
}

impl From<hex::FromHexError> for HexError {
    fn from(err: hex::FromHexError) -> Self {
        match err {
            hex::FromHexError::InvalidHexCharacter { c, index } => {
                HexError::InvalidCharacter { c, index }
            }
            hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
                HexError::OddLength
            }
        }
    }
}

/// Decode a hex string (either case) into raw bytes
pub fn hex_decode(s: &str) -> Result<Vec<u8>, HexError> {
    hex::decode(s).map_err(HexError::from)
}

/// Encode bytes as a lowercase hex string
pub fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}
