//! Content hashing of serializable parameter sets.
//!
//! Values are serialized to JSON and streamed straight into an xxh64
//! hasher, so equal parameters hash equally across runs and platforms.
//!
//! ## Determinism Guarantees
//!
//! - Struct fields serialize in declaration order
//! - Vectors serialize in index order
//! - Maps must be `BTreeMap` with string keys; other maps are not stable or
//!   fail to serialize, and the failure is returned rather than hashed

use serde::Serialize;
use std::io;
use xxhash_rust::xxh64::Xxh64;

/// `io::Write` sink feeding an xxh64 hasher.
struct HashWriter(Xxh64);

impl io::Write for HashWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// xxh64 of the JSON encoding of `value`.
pub fn canonical_hash<T: Serialize + ?Sized>(value: &T) -> Result<u64, serde_json::Error> {
    let mut sink = HashWriter(Xxh64::new(0));
    serde_json::to_writer(&mut sink, value)?;
    Ok(sink.0.digest())
}

/// [`canonical_hash`] as 16 lowercase hex digits.
pub fn canonical_hash_hex<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    canonical_hash(value).map(|h| format!("{h:016x}"))
}
