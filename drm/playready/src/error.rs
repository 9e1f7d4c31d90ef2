use thiserror::Error;

use drm_playready_format::FormatError;

/**
    Errors from building or verifying a PlayReady license challenge.
*/
#[derive(Debug, Clone, Error)]
pub enum CdmError {
    // ── Format errors (delegated to drm-playready-format) ────────────
    #[error(transparent)]
    Format(#[from] FormatError),

    // ── Base64 ─────────────────────────────────────────────────────────
    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    // ── Randomness ─────────────────────────────────────────────────────
    #[error("randomness source unavailable: {0}")]
    RandomUnavailable(String),

    // ── ECC ────────────────────────────────────────────────────────────
    #[error("ECC key parse failed: {0}")]
    EccKeyParse(String),
    #[error("ECC operation failed: {0}")]
    EccOperation(String),

    // ── AES ─────────────────────────────────────────────────────────────
    #[error("invalid AES-CBC input: {0}")]
    AesCbcInvalidInput(String),
    #[error("invalid PKCS#7 padding")]
    Pkcs7PaddingInvalid,

    // ── ECDSA ──────────────────────────────────────────────────────────
    #[error("ECDSA signature verification failed")]
    EcdsaSignatureMismatch,
    #[error("ECDSA signing failed: {0}")]
    EcdsaSigningFailed(String),

    // ── Challenge verification ────────────────────────────────────────
    #[error("malformed challenge: {0}")]
    MalformedChallenge(String),
    #[error("license body digest does not match SignedInfo")]
    DigestMismatch,
}

/**
    Type alias for results that may return a [`CdmError`].
*/
pub type CdmResult<T> = std::result::Result<T, CdmError>;
