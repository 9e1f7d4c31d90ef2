/*!
    ElGamal encryption on ECC P-256.

    Encrypt(message_point, public_key):
      k = random scalar (supplied by the caller)
      point1 = G * k
      point2 = message_point + public_key * k
      return point1.x || point1.y || point2.x || point2.y   (128 bytes)

    The license server decrypts with point2 - point1 * private_key.
*/

use p256::{ProjectivePoint, Scalar};

use super::{point_from_bytes, point_to_bytes};
use crate::error::CdmResult;

pub fn ecc256_encrypt(
    public_key: &[u8; 64],
    message: &[u8; 64],
    ephemeral: &Scalar,
) -> CdmResult<[u8; 128]> {
    let public_key = ProjectivePoint::from(point_from_bytes(public_key)?);
    let message = ProjectivePoint::from(point_from_bytes(message)?);

    let point1 = (ProjectivePoint::GENERATOR * ephemeral).to_affine();
    let point2 = (message + public_key * ephemeral).to_affine();

    let mut out = [0u8; 128];
    out[..64].copy_from_slice(&point_to_bytes(&point1)?);
    out[64..].copy_from_slice(&point_to_bytes(&point2)?);
    Ok(out)
}
