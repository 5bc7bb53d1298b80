//! Shape validation for chat peer identifiers.
//!
//! Accepts either a 64-char hex public key or an `npub1…` bech32 identifier.
//! The npub check is deliberately shallow: no checksum, no decode, no exact
//! payload length tied to 32-byte keys. The core decodes for real when the
//! identifier is actually used; this gate only keeps obvious garbage out of
//! the new-chat flow.

const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// True iff `candidate` looks like a usable peer identifier.
///
/// Input is used as-is; callers trim surrounding whitespace first.
pub fn is_valid_peer(candidate: &str) -> bool {
    is_hex_pubkey(candidate) || is_npub(candidate)
}

fn is_hex_pubkey(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_npub(raw: &str) -> bool {
    let s = raw.to_ascii_lowercase();
    let Some(payload) = s.strip_prefix("npub1") else {
        return false;
    };
    if payload.len() < 10 {
        return false;
    }
    payload
        .bytes()
        .all(|b| BECH32_CHARSET.as_bytes().contains(&b))
}
