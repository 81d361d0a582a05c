//! PSBT hex/base64 codec
//!
//! Wallets hand back signed PSBTs as hex strings; callers usually want both
//! the hex and the base64 form. Parsing goes through `bitcoin::Psbt`, so a
//! malformed response is rejected here rather than passed along.

use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bitcoin::Psbt;
use serde::{Deserialize, Serialize};

/// Both string encodings of a PSBT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPsbt {
    pub hex: String,
    pub base64: String,
}

fn deserialize(bytes: &[u8]) -> Result<Psbt> {
    Psbt::deserialize(bytes).map_err(|e| Error::Psbt(format!("PSBT deserialize error: {}", e)))
}

pub fn decode_hex(psbt_hex: &str) -> Result<Psbt> {
    let trimmed = psbt_hex.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes =
        hex::decode(trimmed).map_err(|e| Error::Psbt(format!("Invalid hex string: {}", e)))?;
    deserialize(&bytes)
}

pub fn decode_base64(psbt_base64: &str) -> Result<Psbt> {
    let bytes = STANDARD
        .decode(psbt_base64.trim())
        .map_err(|e| Error::Psbt(format!("base64 decode error: {}", e)))?;
    deserialize(&bytes)
}

pub fn encode(psbt: &Psbt) -> EncodedPsbt {
    let bytes = psbt.serialize();
    EncodedPsbt {
        hex: hex::encode(&bytes),
        base64: STANDARD.encode(&bytes),
    }
}

/// Parse a hex PSBT and return it in both encodings
pub fn reencode_hex(psbt_hex: &str) -> Result<EncodedPsbt> {
    decode_hex(psbt_hex).map(|psbt| encode(&psbt))
}
