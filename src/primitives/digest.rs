use multihash::{Hasher, Sha3_256};

/// Sha3-256 digest of the input bytes.
///
/// This is the hash function used by the chain for transaction
/// hashes, derived addresses and bytecode checksums.
pub fn sha3(bytes: &[u8]) -> [u8; 32] {
  let mut hasher = Sha3_256::default();
  hasher.update(bytes);
  let mut output = [0u8; 32];
  output.copy_from_slice(hasher.finalize());
  output
}
