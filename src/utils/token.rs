// src/utils/token.rs

use argon2::password_hash::rand_core::{OsRng, RngCore};

/// Random bytes per session token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Generates an opaque, unguessable session token as lowercase hex.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
