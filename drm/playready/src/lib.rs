#![allow(clippy::doc_overindented_list_items)]

mod challenge;
mod constants;
mod crypto;
mod error;
mod key;
mod random;
mod verify;

pub mod format {
    pub use drm_playready_format::*;
}

pub use self::challenge::{
    ChallengeBuilder, build_license_challenge, decrypt_cipher_data, license_version,
};
pub use self::constants::WMRM_SERVER_KEY;
pub use self::error::{CdmError, CdmResult};
pub use self::key::{EccKey, XmlKey};
pub use self::random::{Clock, OsRandom, RandomSource, SystemClock};
pub use self::verify::{ChallengeSummary, verify_challenge};
