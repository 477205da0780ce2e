use ed25519_dalek::{SigningKey, VerifyingKey};
use iou_core::OwningKey;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Ed25519 key pair for signing transactions.
/// Private key material is zeroized on drop by ed25519-dalek.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair using OS-provided entropy.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create a key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Create a key pair from raw secret bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(bytes);
        let kp = Self::from_seed(&seed);
        seed.zeroize();
        Ok(kp)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// The ledger-facing form of the public key.
    pub fn owning_key(&self) -> OwningKey {
        OwningKey(self.signing_key.verifying_key().to_bytes())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.owning_key())
            .finish_non_exhaustive()
    }
}

/// Ed25519 public key for verification operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    /// Create from raw bytes (32 bytes). Fails for bytes that are not a
    /// valid curve point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        let verifying_key = VerifyingKey::from_bytes(&bytes_arr)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid public key: {}", e)))?;
        Ok(Self { verifying_key })
    }

    pub fn from_owning_key(key: &OwningKey) -> Result<Self, CryptoError> {
        Self::from_bytes(key.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.verifying_key.as_bytes()
    }

    pub fn owning_key(&self) -> OwningKey {
        OwningKey(*self.as_bytes())
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_seed_deterministic() {
        let seed = [42u8; 32];
        let kp1 = KeyPair::from_seed(&seed);
        let kp2 = KeyPair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.owning_key(), kp2.owning_key());
    }

    #[test]
    fn test_from_bytes() {
        let seed = [11u8; 32];
        let kp = KeyPair::from_bytes(&seed).unwrap();
        assert_eq!(kp.owning_key(), KeyPair::from_seed(&seed).owning_key());
        assert!(KeyPair::from_bytes(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_owning_key_roundtrip() {
        let kp = KeyPair::generate();
        let pk = PublicKey::from_owning_key(&kp.owning_key()).unwrap();
        assert_eq!(pk, kp.public_key());
        assert_eq!(pk.owning_key(), kp.owning_key());
    }

    #[test]
    fn test_public_key_rejects_short_input() {
        assert!(PublicKey::from_bytes(&[0u8; 31]).is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let kp = KeyPair::from_seed(&[7u8; 32]);
        let debug = format!("{:?}", kp);
        assert!(debug.starts_with("KeyPair"));
        assert!(!debug.contains("0707070707"));
    }
}
