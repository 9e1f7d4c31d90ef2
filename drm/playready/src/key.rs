/*!
    Key material used when building a challenge.

    - [`EccKey`]: the caller's long-lived ECC P-256 signing key.
    - [`XmlKey`]: the per-challenge session key. A random P-256 point whose
      X coordinate doubles as AES-128 IV (`x[0..16]`) and key (`x[16..32]`).
      The point itself is ElGamal-wrapped to the WMRM server key.
*/

use core::fmt;

use p256::ProjectivePoint;
use p256::ecdsa::SigningKey;

use crate::crypto::point_to_bytes;
use crate::error::{CdmError, CdmResult};
use crate::random::{RandomSource, random_scalar};

const PRIVATE_KEY_LEN: usize = 32;
const PUBLIC_KEY_LEN: usize = 64;

/**
    An ECC P-256 signing key pair.
*/
#[derive(Clone)]
pub struct EccKey {
    signing_key: SigningKey,
    public_key: [u8; PUBLIC_KEY_LEN],
}

impl EccKey {
    /**
        Load a key from its 32-byte big-endian private scalar.
    */
    pub fn from_private_bytes(private_key: &[u8]) -> CdmResult<Self> {
        if private_key.len() != PRIVATE_KEY_LEN {
            return Err(CdmError::EccKeyParse(format!(
                "private key must be {PRIVATE_KEY_LEN} bytes, got {}",
                private_key.len()
            )));
        }
        let signing_key = SigningKey::from_slice(private_key)
            .map_err(|e| CdmError::EccKeyParse(e.to_string()))?;
        let public_key = point_to_bytes(signing_key.verifying_key().as_affine())?;
        Ok(Self {
            signing_key,
            public_key,
        })
    }

    /**
        Load a key from either a bare 32-byte private scalar, or the 96-byte
        device key layout: private scalar (32B) || X (32B) || Y (32B).

        For the 96-byte layout the stored public point must match the one
        derived from the private scalar.
    */
    pub fn from_bytes(data: impl AsRef<[u8]>) -> CdmResult<Self> {
        let data = data.as_ref();
        match data.len() {
            PRIVATE_KEY_LEN => Self::from_private_bytes(data),
            96 => {
                let key = Self::from_private_bytes(&data[..PRIVATE_KEY_LEN])?;
                if key.public_key.as_slice() != &data[PRIVATE_KEY_LEN..] {
                    return Err(CdmError::EccKeyParse(
                        "stored public key does not match private key".into(),
                    ));
                }
                Ok(key)
            }
            other => Err(CdmError::EccKeyParse(format!(
                "expected a 32 or 96 byte key, got {other} bytes"
            ))),
        }
    }

    /**
        Generate a fresh key pair.
    */
    pub fn generate(rng: &mut impl RandomSource) -> CdmResult<Self> {
        let scalar = random_scalar(rng)?;
        Self::from_private_bytes(&scalar.to_bytes())
    }

    /**
        Raw uncompressed public point, X || Y.
    */
    pub fn public_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    /**
        The 96-byte private || X || Y layout accepted by [`EccKey::from_bytes`].
    */
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PRIVATE_KEY_LEN + PUBLIC_KEY_LEN);
        out.extend_from_slice(&self.signing_key.to_bytes());
        out.extend_from_slice(&self.public_key);
        out
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for EccKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EccKey")
            .field("public_key", &data_encoding::HEXLOWER.encode(&self.public_key))
            .finish_non_exhaustive()
    }
}

/**
    Ephemeral session key material, generated fresh for every challenge.
*/
#[derive(Clone)]
pub struct XmlKey {
    public_key: [u8; PUBLIC_KEY_LEN],
    aes_key: [u8; 16],
    aes_iv: [u8; 16],
}

impl XmlKey {
    /**
        Generate a new random session key.
    */
    pub fn generate(rng: &mut impl RandomSource) -> CdmResult<Self> {
        let scalar = random_scalar(rng)?;
        let point = (ProjectivePoint::GENERATOR * scalar).to_affine();
        let public_key = point_to_bytes(&point)?;

        let mut aes_iv = [0u8; 16];
        aes_iv.copy_from_slice(&public_key[..16]);

        let mut aes_key = [0u8; 16];
        aes_key.copy_from_slice(&public_key[16..32]);

        Ok(Self {
            public_key,
            aes_key,
            aes_iv,
        })
    }

    /**
        The session point (X || Y) that gets ElGamal-wrapped.
    */
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    pub fn aes_key(&self) -> &[u8; 16] {
        &self.aes_key
    }

    pub fn aes_iv(&self) -> &[u8; 16] {
        &self.aes_iv
    }
}

impl fmt::Debug for XmlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlKey").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::OsRandom;
    use crate::random::testing::CountingRandom;

    #[test]
    fn private_key_round_trip() {
        let key = EccKey::from_private_bytes(&[0x11; 32]).unwrap();
        let bytes = key.to_bytes();
        assert_eq!(bytes.len(), 96);
        assert_eq!(&bytes[..32], &[0x11; 32]);

        let reloaded = EccKey::from_bytes(&bytes).unwrap();
        assert_eq!(reloaded.public_bytes(), key.public_bytes());
    }

    #[test]
    fn mismatched_public_key_is_rejected() {
        let mut bytes = EccKey::from_private_bytes(&[0x11; 32]).unwrap().to_bytes();
        bytes[95] ^= 0xff;
        let err = EccKey::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, CdmError::EccKeyParse(_)));
    }

    #[test]
    fn wrong_length_is_rejected() {
        let err = EccKey::from_bytes([0x11; 31]).unwrap_err();
        assert!(matches!(err, CdmError::EccKeyParse(_)));
    }

    #[test]
    fn zero_scalar_is_rejected() {
        let err = EccKey::from_private_bytes(&[0u8; 32]).unwrap_err();
        assert!(matches!(err, CdmError::EccKeyParse(_)));
    }

    #[test]
    fn generated_keys_differ() {
        let a = EccKey::generate(&mut OsRandom).unwrap();
        let b = EccKey::generate(&mut OsRandom).unwrap();
        assert_ne!(a.public_bytes(), b.public_bytes());
    }

    #[test]
    fn debug_does_not_leak_private_key() {
        let key = EccKey::from_private_bytes(&[0x11; 32]).unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains(&"11".repeat(32)));
    }

    #[test]
    fn xml_key_derives_aes_material_from_x() {
        let key = XmlKey::generate(&mut CountingRandom(1)).unwrap();
        assert_eq!(key.aes_iv(), &key.public_key()[..16]);
        assert_eq!(key.aes_key(), &key.public_key()[16..32]);
        assert_ne!(key.public_key(), &[0u8; 64]);
    }

    #[test]
    fn xml_keys_are_fresh() {
        let a = XmlKey::generate(&mut OsRandom).unwrap();
        let b = XmlKey::generate(&mut OsRandom).unwrap();
        assert_ne!(a.public_key(), b.public_key());
    }
}
