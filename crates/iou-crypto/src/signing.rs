use std::collections::BTreeSet;

use ed25519_dalek::{Signer, Verifier};
use iou_core::{OwningKey, SignedTransaction, TransactionSignature, TxId};

use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};

/// Ed25519 signature (64 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    inner: ed25519_dalek::Signature,
}

impl Signature {
    pub fn to_bytes(&self) -> [u8; 64] {
        self.inner.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_arr: [u8; 64] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidInput(format!("signature must be 64 bytes, got {}", bytes.len()))
        })?;
        let inner = ed25519_dalek::Signature::from_bytes(&bytes_arr);
        Ok(Self { inner })
    }
}

/// Sign a message using Ed25519.
pub fn sign(message: &[u8], keypair: &KeyPair) -> Signature {
    let sig = keypair.signing_key().sign(message);
    Signature { inner: sig }
}

/// Verify an Ed25519 signature.
pub fn verify(message: &[u8], signature: &Signature, pubkey: &PublicKey) -> Result<(), CryptoError> {
    pubkey
        .verifying_key()
        .verify(message, &signature.inner)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

/// Sign a transaction id. The id commits to the whole wire transaction.
pub fn sign_transaction(tx_id: &TxId, keypair: &KeyPair) -> TransactionSignature {
    let sig = sign(tx_id.as_bytes(), keypair);
    TransactionSignature {
        by: keypair.owning_key(),
        bytes: sig.to_bytes().to_vec(),
    }
}

/// Check that `sig` is a valid signature over `tx_id` by `sig.by`.
pub fn verify_transaction_signature(tx_id: &TxId, sig: &TransactionSignature) -> Result<(), CryptoError> {
    let pubkey = PublicKey::from_owning_key(&sig.by)?;
    let signature = Signature::from_bytes(&sig.bytes)?;
    verify(tx_id.as_bytes(), &signature, &pubkey)
        .map_err(|_| CryptoError::InvalidTransactionSignature(sig.by))
}

/// Verify every signature on `stx`, and that all required keys have signed
/// apart from those in `allowed_missing`.
pub fn verify_signatures(
    stx: &SignedTransaction,
    allowed_missing: &BTreeSet<OwningKey>,
) -> Result<(), CryptoError> {
    let id = stx.id();
    for sig in &stx.sigs {
        verify_transaction_signature(&id, sig)?;
    }
    let missing: Vec<OwningKey> = stx
        .missing_signatures()
        .into_iter()
        .filter(|k| !allowed_missing.contains(k))
        .collect();
    if !missing.is_empty() {
        return Err(CryptoError::MissingSignatures(missing));
    }
    tracing::debug!(tx_id = %id, signatures = stx.sigs.len(), "signatures verified");
    Ok(())
}
