/*!
    ECDSA-SHA256 signing and verification on P-256.

    - Sign: the caller passes SHA256(data); it is signed as a prehash (RFC 6979 nonce).
    - Verify: against a raw 64-byte X || Y public key.

    Signatures are the raw R || S concatenation (not DER). Each component is
    written as its minimal big-endian encoding with no zero padding, so a
    signature may be shorter than 64 bytes.
*/

use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::FieldBytes;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};

use crate::error::{CdmError, CdmResult};

const COMPONENT_LEN: usize = 32;

pub fn ecdsa_sha256_sign(signing_key: &SigningKey, digest: &[u8; 32]) -> CdmResult<Vec<u8>> {
    let signature: Signature = signing_key
        .sign_prehash(digest)
        .map_err(|e| CdmError::EcdsaSigningFailed(e.to_string()))?;

    let (r, s) = signature.split_bytes();
    let mut out = Vec::with_capacity(2 * COMPONENT_LEN);
    out.extend_from_slice(strip_leading_zeros(&r));
    out.extend_from_slice(strip_leading_zeros(&s));
    Ok(out)
}

/**
    Verify an R || S signature over a SHA-256 digest.

    Because the components are unpadded, every split of the signature where
    both halves fit in 32 bytes is tried, the even split first.
*/
pub fn ecdsa_sha256_verify(
    public_key: &[u8; 64],
    digest: &[u8; 32],
    signature: &[u8],
) -> CdmResult<()> {
    let mut sec1 = Vec::with_capacity(65);
    sec1.push(0x04);
    sec1.extend_from_slice(public_key);
    let verifying_key =
        VerifyingKey::from_sec1_bytes(&sec1).map_err(|e| CdmError::EccKeyParse(e.to_string()))?;

    let len = signature.len();
    if !(2..=2 * COMPONENT_LEN).contains(&len) {
        return Err(CdmError::EcdsaSignatureMismatch);
    }

    let mut splits: Vec<usize> = (len.saturating_sub(COMPONENT_LEN)..=COMPONENT_LEN.min(len - 1))
        .filter(|&r_len| r_len >= 1)
        .collect();
    splits.sort_by_key(|&r_len| r_len.abs_diff(len / 2));

    for r_len in splits {
        let (r, s) = signature.split_at(r_len);
        let Ok(candidate) = Signature::from_scalars(left_pad(r), left_pad(s)) else {
            continue;
        };
        if verifying_key.verify_prehash(digest, &candidate).is_ok() {
            return Ok(());
        }
    }

    Err(CdmError::EcdsaSignatureMismatch)
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

fn left_pad(bytes: &[u8]) -> FieldBytes {
    let mut padded = FieldBytes::default();
    padded[COMPONENT_LEN - bytes.len()..].copy_from_slice(bytes);
    padded
}
