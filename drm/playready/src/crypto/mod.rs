/*!
    PlayReady cryptographic operations.

    All asymmetric crypto uses ECC P-256 (secp256r1):
    - ElGamal encryption for wrapping the session point to the WMRM server key
    - ECDSA-SHA256 for challenge signing and verification

    Symmetric crypto:
    - AES-128-CBC with PKCS7 padding for client data encryption
*/

pub(crate) mod aes;
pub(crate) mod elgamal;
pub(crate) mod signing;

use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::{AffinePoint, EncodedPoint, FieldBytes};

use crate::error::{CdmError, CdmResult};

/**
    Parse a raw 64-byte X || Y public point, rejecting points not on the curve.
*/
pub(crate) fn point_from_bytes(bytes: &[u8; 64]) -> CdmResult<AffinePoint> {
    let encoded = EncodedPoint::from_affine_coordinates(
        FieldBytes::from_slice(&bytes[..32]),
        FieldBytes::from_slice(&bytes[32..]),
        false,
    );
    let point: Option<AffinePoint> = AffinePoint::from_encoded_point(&encoded).into();
    point.ok_or_else(|| CdmError::EccKeyParse("point is not on the P-256 curve".into()))
}

/**
    Serialize an affine point as raw 64-byte X || Y.
*/
pub(crate) fn point_to_bytes(point: &AffinePoint) -> CdmResult<[u8; 64]> {
    let encoded = point.to_encoded_point(false);
    let (Some(x), Some(y)) = (encoded.x(), encoded.y()) else {
        return Err(CdmError::EccOperation("point at infinity".into()));
    };
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(x);
    out[32..].copy_from_slice(y);
    Ok(out)
}
