use iou_core::OwningKey;

/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("signature verification failed")]
    SignatureVerificationFailed,

    #[error("signature by {0} does not verify against the transaction id")]
    InvalidTransactionSignature(OwningKey),

    #[error("missing signatures from: {}", format_keys(.0))]
    MissingSignatures(Vec<OwningKey>),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

fn format_keys(keys: &[OwningKey]) -> String {
    keys.iter().map(|k| k.short()).collect::<Vec<_>>().join(", ")
}
