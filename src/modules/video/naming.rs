//! Storage key derivation.
//!
//! Keys are `<class prefix><64 hex chars>.<ext>` built from 256 bits of
//! CSPRNG output. Nothing checks the store for an existing key: a collision
//! needs on the order of 2^128 keys, and that probability is the only defence.
//! It is an accepted risk.

use rand::RngCore;

use super::classifier::AspectClass;

pub const VIDEO_EXTENSION: &str = "mp4";
const THUMBNAIL_PREFIX: &str = "thumbnails/";
const KEY_BYTES: usize = 32;

pub fn make_key(aspect: AspectClass) -> String {
    format!("{}{}.{}", aspect.prefix(), random_hex(), VIDEO_EXTENSION)
}

pub fn make_thumbnail_key(extension: &str) -> String {
    format!("{}{}.{}", THUMBNAIL_PREFIX, random_hex(), extension)
}

fn random_hex() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    // ThreadRng is a reseeding ChaCha CSPRNG seeded from the OS.
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
