//! Content hashing for the hash-guarded artifact upserts: an MD5 hex digest
//! of the encoded blob, so a build that re-encodes an unchanged artifact
//! produces the same hash and skips the write.

use md5::{Digest, Md5};

pub fn hash_bytes(blob: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(blob);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_hash_identically() {
        let a = hash_bytes(b"hello archetype");
        let b = hash_bytes(b"hello archetype");
        assert_eq!(a, b);
    }

    #[test]
    fn different_bytes_hash_differently() {
        assert_ne!(hash_bytes(b"a"), hash_bytes(b"b"));
    }
}
