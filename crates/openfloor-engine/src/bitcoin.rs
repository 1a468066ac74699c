//! Bitcoin address collaborator double.
//!
//! Validity is a structural base58 check; derivation hashes the user id
//! and chain index into a deterministic, always-valid address. Real
//! deployments put an actual wallet service behind the same trait.

use openfloor_types::{BitcoinApi, UserId};
use sha2::{Digest, Sha256};

/// Base58 alphabet (no `0`, `O`, `I`, `l`).
const BASE58: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const MIN_ADDRESS_LEN: usize = 26;
const MAX_ADDRESS_LEN: usize = 35;

/// Deterministic hash-derived address service.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivedBitcoinApi;

impl DerivedBitcoinApi {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl BitcoinApi for DerivedBitcoinApi {
    fn is_valid_address(&self, address: &str) -> bool {
        (MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&address.len())
            && address.starts_with(['1', '3'])
            && address.bytes().all(|b| BASE58.contains(&b))
    }

    fn derive_deposit_address(&self, user_id: UserId, chain_index: u32) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"openfloor:deposit:v1:");
        hasher.update(user_id.0.as_bytes());
        hasher.update(chain_index.to_le_bytes());
        let digest = hasher.finalize();

        let mut address = String::with_capacity(34);
        address.push('1');
        for byte in digest.iter().take(33) {
            address.push(BASE58[usize::from(*byte) % BASE58.len()] as char);
        }
        address
    }
}
