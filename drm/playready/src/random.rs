/*!
    Injectable sources of randomness and wall-clock time.

    Challenge construction draws every random byte (session key, nonce,
    ElGamal ephemeral scalar) from a [`RandomSource`] and the client time
    from a [`Clock`], so fixed implementations give reproducible output.
*/

use std::time::{SystemTime, UNIX_EPOCH};

use p256::{FieldBytes, NonZeroScalar, Scalar};
use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::error::{CdmError, CdmResult};

/// Attempts at drawing a valid scalar before the source is considered broken.
const SCALAR_ATTEMPTS: usize = 8;

/**
    A source of cryptographically secure random bytes.
*/
pub trait RandomSource {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> CdmResult<()>;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> CdmResult<()> {
        (**self).fill_bytes(dest)
    }
}

/**
    The operating system's CSPRNG.
*/
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> CdmResult<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| CdmError::RandomUnavailable(e.to_string()))
    }
}

/**
    A source of the current Unix time in whole seconds.
*/
pub trait Clock {
    fn unix_time(&self) -> u64;
}

/**
    The system wall clock.
*/
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_time(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/**
    Draw a uniformly random non-zero P-256 scalar.

    Candidates at or above the group order are rejected and redrawn.
*/
pub(crate) fn random_scalar(rng: &mut impl RandomSource) -> CdmResult<Scalar> {
    for _ in 0..SCALAR_ATTEMPTS {
        let mut bytes = FieldBytes::default();
        rng.fill_bytes(bytes.as_mut_slice())?;
        let candidate: Option<NonZeroScalar> = NonZeroScalar::from_repr(bytes).into();
        if let Some(scalar) = candidate {
            return Ok(*scalar);
        }
    }
    Err(CdmError::RandomUnavailable(
        "source keeps producing invalid P-256 scalars".into(),
    ))
}
