//! SealedPayload CBOR encode/decode.
//!
//! Wire format: CBOR map `{ v: uint, k: bytes, n: bytes(24), c: bytes }`
//! where `v` is the format version, `k` the wrapped data key, `n` the nonce
//! and `c` the ciphertext.

use serde::{Deserialize, Serialize};
use snapshot_crypto::nonce_from_slice;

use crate::error::SnapshotError;
use crate::types::SealedPayload;

/// Current payload format version.
pub const PAYLOAD_FORMAT_VERSION: u8 = 1;

#[derive(Serialize)]
struct WirePayloadRef<'a> {
    v: u8,
    #[serde(with = "serde_bytes")]
    k: &'a [u8],
    #[serde(with = "serde_bytes")]
    n: &'a [u8],
    #[serde(with = "serde_bytes")]
    c: &'a [u8],
}

#[derive(Deserialize)]
struct WirePayload {
    v: u8,
    #[serde(with = "serde_bytes")]
    k: Vec<u8>,
    #[serde(with = "serde_bytes")]
    n: Vec<u8>,
    #[serde(with = "serde_bytes")]
    c: Vec<u8>,
}

/// Encode a SealedPayload as CBOR bytes.
pub fn encode_payload(payload: &SealedPayload) -> Result<Vec<u8>, SnapshotError> {
    let wire = WirePayloadRef {
        v: PAYLOAD_FORMAT_VERSION,
        k: &payload.wrapped_key,
        n: &payload.nonce,
        c: &payload.ciphertext,
    };
    let mut buf = Vec::with_capacity(payload.ciphertext.len() + payload.wrapped_key.len() + 64);
    ciborium::into_writer(&wire, &mut buf)
        .map_err(|e| SnapshotError::MalformedPayload(format!("CBOR encode: {}", e)))?;
    Ok(buf)
}

/// Decode CBOR bytes into a SealedPayload.
///
/// Only the structure is checked here; authenticity is checked on decrypt.
pub fn decode_payload(data: &[u8]) -> Result<SealedPayload, SnapshotError> {
    let wire: WirePayload = ciborium::from_reader(data)
        .map_err(|e| SnapshotError::MalformedPayload(format!("CBOR decode: {}", e)))?;

    if wire.v != PAYLOAD_FORMAT_VERSION {
        return Err(SnapshotError::MalformedPayload(format!(
            "unsupported format version {}",
            wire.v
        )));
    }
    if wire.k.is_empty() {
        return Err(SnapshotError::MalformedPayload(
            "missing wrapped data key".to_string(),
        ));
    }
    let nonce = nonce_from_slice(&wire.n)?;

    Ok(SealedPayload {
        wrapped_key: wire.k,
        nonce,
        ciphertext: wire.c,
    })
}
