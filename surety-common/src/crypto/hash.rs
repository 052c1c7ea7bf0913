use sha2::{Digest, Sha256};

/// Raw SHA-256 digest of the given data.
pub fn digest_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Deterministic draw in `[0, range)` derived from a seed, a nonce and a
/// caller-supplied context (typically the caller address).
///
/// The same inputs always produce the same value. Returns 0 when `range` is 0.
pub fn draw(seed: &[u8], nonce: u64, context: &[u8], range: u64) -> u64 {
    if range == 0 {
        return 0;
    }

    let mut hasher = Sha256::new();
    hasher.update(seed);
    hasher.update(nonce.to_le_bytes());
    hasher.update(context);
    let out = hasher.finalize();

    let mut head = [0u8; 8];
    head.copy_from_slice(&out[..8]);
    u64::from_le_bytes(head) % range
}
