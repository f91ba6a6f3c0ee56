use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use md5::{Digest, Md5};
use serde::Serialize;

/// Every migrated workspace starts without state history.
pub const INITIAL_SERIAL: u64 = 1;

/// Attributes of a "create state version" request.
///
/// `md5` and `state` are always derived from the same byte slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateVersionPayload {
    pub serial: u64,
    pub md5: String,
    pub state: String,
}

impl StateVersionPayload {
    pub fn from_bytes(raw: &[u8]) -> Self {
        Self {
            serial: INITIAL_SERIAL,
            md5: md5_hex(raw),
            state: STANDARD.encode(raw),
        }
    }

    /// Size of the encoded state, for logging.
    pub fn encoded_len(&self) -> usize {
        self.state.len()
    }
}

pub fn md5_hex(raw: &[u8]) -> String {
    hex::encode(Md5::digest(raw))
}
