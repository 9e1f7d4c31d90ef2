/*!
    Self-check of a serialized license challenge.

    Digests are recomputed over the `<LA>` and `<SignedInfo>` bytes exactly as
    they appear in the document, so any drift between what was signed and
    what was sent is caught. The parsed tree is only used to read fields.
*/

use data_encoding::BASE64;
use sha2::{Digest, Sha256};
use tracing::debug;

use drm_playready_format::Element;

use crate::crypto::signing;
use crate::error::{CdmError, CdmResult};

/**
    Fields recovered from a challenge that passed verification.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeSummary {
    /// Contents of `<Version>`.
    pub license_version: String,
    pub nonce: Vec<u8>,
    pub client_time: u64,
    /// Signer's public key, X || Y.
    pub public_key: [u8; 64],
}

/**
    Verify the digest and signature of a challenge produced by
    [`ChallengeBuilder`](crate::ChallengeBuilder).
*/
pub fn verify_challenge(document: &str) -> CdmResult<ChallengeSummary> {
    let root = Element::parse(document)?;

    let la = required(&root, "LA")?;
    let signed_info = required(&root, "SignedInfo")?;

    let expected_digest = decode(&required(signed_info, "DigestValue")?.text(), "DigestValue")?;
    let la_digest = Sha256::digest(sent_element(document, "LA")?.as_bytes());
    if la_digest.as_slice() != expected_digest.as_slice() {
        return Err(CdmError::DigestMismatch);
    }

    let public_key: [u8; 64] = decode(&required(&root, "PublicKey")?.text(), "PublicKey")?
        .try_into()
        .map_err(|_| CdmError::MalformedChallenge("PublicKey must be 64 bytes".into()))?;
    let signature = decode(&required(&root, "SignatureValue")?.text(), "SignatureValue")?;

    let signed_info_digest: [u8; 32] =
        Sha256::digest(sent_element(document, "SignedInfo")?.as_bytes()).into();
    signing::ecdsa_sha256_verify(&public_key, &signed_info_digest, &signature)?;

    let client_time: u64 = required(la, "ClientTime")?
        .text()
        .parse()
        .map_err(|e| CdmError::MalformedChallenge(format!("ClientTime: {e}")))?;

    let summary = ChallengeSummary {
        license_version: required(la, "Version")?.text(),
        nonce: decode(&required(la, "LicenseNonce")?.text(), "LicenseNonce")?,
        client_time,
        public_key,
    };
    debug!(
        license_version = %summary.license_version,
        client_time = summary.client_time,
        "challenge verified"
    );
    Ok(summary)
}

fn required<'a>(root: &'a Element, name: &str) -> CdmResult<&'a Element> {
    root.find(name)
        .ok_or_else(|| CdmError::MalformedChallenge(format!("missing <{name}>")))
}

/**
    The first `<name ...>...</name>` span of the document, byte for byte.
*/
fn sent_element<'a>(document: &'a str, name: &str) -> CdmResult<&'a str> {
    let missing = || CdmError::MalformedChallenge(format!("missing <{name}> markup"));

    let open = format!("<{name}");
    let start = document
        .match_indices(&open)
        .map(|(index, _)| index)
        .find(|&index| matches!(document.as_bytes().get(index + open.len()).copied(), Some(b' ' | b'>')))
        .ok_or_else(missing)?;

    let close = format!("</{name}>");
    let end = document[start..]
        .find(&close)
        .map(|offset| start + offset + close.len())
        .ok_or_else(missing)?;

    Ok(&document[start..end])
}

fn decode(text: &str, field: &str) -> CdmResult<Vec<u8>> {
    BASE64
        .decode(text.trim().as_bytes())
        .map_err(|e| CdmError::InvalidBase64(format!("{field}: {e}")))
}

#[cfg(test)]
mod tests {
    use drm_playready_format::WrmHeader;

    use super::*;
    use crate::challenge::ChallengeBuilder;
    use crate::key::EccKey;
    use crate::random::testing::{CountingRandom, FixedClock};

    const HEADER: &str = "<WRMHEADER xmlns=\"http://schemas.microsoft.com/DRM/2007/03/PlayReadyHeader\" version=\"4.2.0.0\">\
<DATA><PROTECTINFO><KIDS><KID ALGID=\"AESCTR\" VALUE=\"4Rplb+TbNES8tGkNFWTEHA==\"></KID></KIDS></PROTECTINFO></DATA></WRMHEADER>";

    fn challenge() -> String {
        let key = EccKey::from_private_bytes(&[0x22; 32]).unwrap();
        let header = WrmHeader::from_xml(HEADER).unwrap();
        ChallengeBuilder::new()
            .with_random(CountingRandom(0x40))
            .with_clock(FixedClock(1_700_000_000))
            .build(b"chain", &key, &header)
            .unwrap()
    }

    #[test]
    fn summary_reflects_inputs() {
        let summary = verify_challenge(&challenge()).unwrap();
        assert_eq!(summary.license_version, "4");
        assert_eq!(summary.client_time, 1_700_000_000);
        assert_eq!(summary.nonce.len(), 16);
        assert_eq!(
            &summary.public_key,
            EccKey::from_private_bytes(&[0x22; 32]).unwrap().public_bytes()
        );
    }

    #[test]
    fn tampered_body_fails_digest_check() {
        let tampered = challenge().replace(
            "<ClientTime>1700000000</ClientTime>",
            "<ClientTime>1700000001</ClientTime>",
        );
        let err = verify_challenge(&tampered).unwrap_err();
        assert!(matches!(err, CdmError::DigestMismatch));
    }

    #[test]
    fn tampered_signed_info_fails_signature_check() {
        let document = challenge();
        let tampered = document.replace("<Reference URI=\"#SignedData\">", "<Reference URI=\"#Other\">");
        assert_ne!(document, tampered);
        let err = verify_challenge(&tampered).unwrap_err();
        assert!(matches!(err, CdmError::EcdsaSignatureMismatch));
    }

    #[test]
    fn foreign_public_key_fails_signature_check() {
        let document = challenge();
        let own = BASE64.encode(EccKey::from_private_bytes(&[0x22; 32]).unwrap().public_bytes());
        let other = BASE64.encode(EccKey::from_private_bytes(&[0x33; 32]).unwrap().public_bytes());
        let err = verify_challenge(&document.replace(&own, &other)).unwrap_err();
        assert!(matches!(err, CdmError::EcdsaSignatureMismatch));
    }

    #[test]
    fn sent_element_spans_exact_markup() {
        let document = "<a><LA_URL>x</LA_URL><LA Id=\"1\"><b>y</b></LA><LA>z</LA></a>";
        assert_eq!(sent_element(document, "LA").unwrap(), "<LA Id=\"1\"><b>y</b></LA>");
        assert_eq!(sent_element(document, "b").unwrap(), "<b>y</b>");
        assert!(matches!(
            sent_element(document, "SignedInfo").unwrap_err(),
            CdmError::MalformedChallenge(_)
        ));
    }

    #[test]
    fn body_is_hashed_as_sent_not_as_reparsed() {
        // Same tree after parsing, different bytes
        let document = challenge();
        let requoted = document.replace("Id=\"SignedData\"", "Id='SignedData'");
        assert_ne!(document, requoted);
        let err = verify_challenge(&requoted).unwrap_err();
        assert!(matches!(err, CdmError::DigestMismatch));
    }

    #[test]
    fn missing_elements_are_reported() {
        let err = verify_challenge("<soap:Envelope></soap:Envelope>").unwrap_err();
        assert!(matches!(err, CdmError::MalformedChallenge(_)));
    }

    #[test]
    fn invalid_xml_is_a_format_error() {
        let err = verify_challenge("<soap:Envelope>").unwrap_err();
        assert!(matches!(err, CdmError::Format(_)));
    }
}
