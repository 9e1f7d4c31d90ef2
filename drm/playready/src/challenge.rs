/*!
    License acquisition challenge construction.

    Layering (each step consumes the canonical bytes of the previous one):
    1. Client data `<Data>` (certificate chain + features) → AES-128-CBC under
       the session key → IV || ciphertext.
    2. Session point → ElGamal to the WMRM server key.
    3. `<LA>` license body (version, content header, client info, nonce, time,
       encrypted key + data) → SHA-256.
    4. `<SignedInfo>` over the `<LA>` digest → SHA-256 → ECDSA.
    5. SOAP envelope carrying `<LA>`, the signature and the signer's public key.
*/

use data_encoding::BASE64;
use sha2::{Digest, Sha256};
use tracing::debug;

use drm_playready_format::{Element, PROTOCOL, ProtocolConstants, WrmHeader, WrmHeaderVersion};

use crate::constants::WMRM_SERVER_KEY;
use crate::crypto::{aes, elgamal, signing};
use crate::error::{CdmError, CdmResult};
use crate::key::{EccKey, XmlKey};
use crate::random::{Clock, OsRandom, RandomSource, SystemClock, random_scalar};

const IV_LEN: usize = 16;
const NONCE_LEN: usize = 16;

/**
    Map a WRM header version to the `<Version>` of the license request.

    `4.3.0.0` → 5, `4.2.0.0` → 4, anything else → 1.
*/
pub fn license_version(version: &WrmHeaderVersion) -> u32 {
    match version {
        WrmHeaderVersion::V4_3_0_0 => 5,
        WrmHeaderVersion::V4_2_0_0 => 4,
        _ => 1,
    }
}

/**
    Builds signed PlayReady license challenges.

    The builder holds no per-challenge state: every call to [`build`](Self::build)
    generates a fresh session key, IV and nonce. Randomness and time come from
    the injected [`RandomSource`] and [`Clock`].

    ```ignore
    let key = EccKey::from_bytes(&signing_key_bytes)?;
    let header = WrmHeader::from_xml(&wrm_header_xml)?;
    let challenge = ChallengeBuilder::new().build(&cert_chain, &key, &header)?;
    // POST `challenge` to the license server as text/xml
    ```
*/
#[derive(Debug, Clone)]
pub struct ChallengeBuilder<'a, R = OsRandom, C = SystemClock> {
    constants: &'a ProtocolConstants,
    rng: R,
    clock: C,
}

impl ChallengeBuilder<'static> {
    /**
        A builder using the standard protocol constants, the OS random
        generator and the system clock.
    */
    pub fn new() -> Self {
        Self {
            constants: &PROTOCOL,
            rng: OsRandom,
            clock: SystemClock,
        }
    }
}

impl Default for ChallengeBuilder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, R: RandomSource, C: Clock> ChallengeBuilder<'a, R, C> {
    pub fn with_constants<'b>(self, constants: &'b ProtocolConstants) -> ChallengeBuilder<'b, R, C> {
        ChallengeBuilder {
            constants,
            rng: self.rng,
            clock: self.clock,
        }
    }

    pub fn with_random<R2: RandomSource>(self, rng: R2) -> ChallengeBuilder<'a, R2, C> {
        ChallengeBuilder {
            constants: self.constants,
            rng,
            clock: self.clock,
        }
    }

    pub fn with_clock<C2: Clock>(self, clock: C2) -> ChallengeBuilder<'a, R, C2> {
        ChallengeBuilder {
            constants: self.constants,
            rng: self.rng,
            clock,
        }
    }

    /**
        Build a complete challenge document.

        Returns UTF-8 XML starting with an XML declaration and containing no
        newlines. Any failure aborts the whole construction; retry by calling
        `build` again, which draws a fresh session key and nonce.
    */
    pub fn build(
        &mut self,
        certificate_chain: &[u8],
        signing_key: &EccKey,
        header: &WrmHeader,
    ) -> CdmResult<String> {
        let constants = self.constants;

        // 1. Session key and encrypted client data
        let xml_key = XmlKey::generate(&mut self.rng)?;
        let cipher_data = build_cipher_data(constants, certificate_chain, &xml_key);
        debug!(
            chain_len = certificate_chain.len(),
            cipher_data_len = cipher_data.len(),
            "encrypted client data"
        );

        // 2. License body
        let la = self.license_acquisition(&xml_key, &cipher_data, header)?;
        let la_xml = wire_form(&la);
        let la_digest: [u8; 32] = Sha256::digest(la_xml.as_bytes()).into();
        debug!(body_len = la_xml.len(), "license body digest computed");

        // 3. SignedInfo over the license body digest, then sign its digest
        let signed_info = build_signed_info(constants, &la_digest);
        let signed_info_digest: [u8; 32] =
            Sha256::digest(wire_form(&signed_info).as_bytes()).into();
        let signature = signing::ecdsa_sha256_sign(signing_key.signing_key(), &signed_info_digest)?;
        debug!(signature_len = signature.len(), "signed challenge");

        // 4. Envelope
        let envelope = build_envelope(
            constants,
            la,
            signed_info,
            &signature,
            signing_key.public_bytes(),
        );

        let mut document = String::from(constants.xml_declaration);
        document.push_str(&wire_form(&envelope));
        Ok(document)
    }

    /**
        Build the `<LA>` license body element.
    */
    fn license_acquisition(
        &mut self,
        xml_key: &XmlKey,
        cipher_data: &[u8],
        header: &WrmHeader,
    ) -> CdmResult<Element> {
        let mut nonce = [0u8; NONCE_LEN];
        self.rng.fill_bytes(&mut nonce)?;

        let version = license_version(&header.version());
        debug!(
            header_version = header.declared_version(),
            license_version = version,
            "selected license version"
        );

        let ephemeral = random_scalar(&mut self.rng)?;
        let wrapped_key = elgamal::ecc256_encrypt(&WMRM_SERVER_KEY, xml_key.public_key(), &ephemeral)?;

        Ok(build_license_acquisition(
            self.constants,
            &LicenseBody {
                version,
                header,
                nonce: &nonce,
                client_time: self.clock.unix_time(),
                wrapped_key: &wrapped_key,
                cipher_data,
            },
        ))
    }
}

/**
    Build a challenge with the default builder.
*/
pub fn build_license_challenge(
    certificate_chain: &[u8],
    signing_key: &EccKey,
    header: &WrmHeader,
) -> CdmResult<String> {
    ChallengeBuilder::new().build(certificate_chain, signing_key, header)
}

/**
    Split IV || ciphertext and decrypt the client data payload.

    Returns the canonical `<Data>` XML bytes that were encrypted.
*/
pub fn decrypt_cipher_data(xml_key: &XmlKey, cipher_data: &[u8]) -> CdmResult<Vec<u8>> {
    if cipher_data.len() <= IV_LEN {
        return Err(CdmError::AesCbcInvalidInput(format!(
            "cipher data too short: {} bytes",
            cipher_data.len()
        )));
    }
    let (iv, ciphertext) = cipher_data.split_at(IV_LEN);
    let iv: &[u8; IV_LEN] = iv
        .try_into()
        .map_err(|_| CdmError::AesCbcInvalidInput("IV must be 16 bytes".into()))?;
    aes::aes_cbc_decrypt(xml_key.aes_key(), iv, ciphertext)
}

/**
    Canonical form with every `\n` removed, exactly as the element appears in
    the sent document. Digests are taken over these bytes.

    Newlines can only come from text content or raw header markup; attribute
    values escape them as `&#xA;`.
*/
fn wire_form(element: &Element) -> String {
    element.to_canonical_string().replace('\n', "")
}

/**
    Inputs of the `<LA>` element that are not protocol constants.
*/
struct LicenseBody<'a> {
    version: u32,
    header: &'a WrmHeader,
    nonce: &'a [u8; NONCE_LEN],
    client_time: u64,
    wrapped_key: &'a [u8; 128],
    cipher_data: &'a [u8],
}

/**
    The client data XML: base64 certificate chain padded with one space on
    each side, plus the feature list.
*/
fn build_client_data(constants: &ProtocolConstants, certificate_chain: &[u8]) -> Element {
    Element::new("Data")
        .with_child(
            Element::new("CertificateChains").with_child(
                Element::new("CertificateChain")
                    .with_text(format!(" {} ", BASE64.encode(certificate_chain))),
            ),
        )
        .with_child(
            Element::new("Features")
                .with_child(Element::new("Feature").with_attr("Name", constants.feature_name)),
        )
}

/**
    Encrypt the canonical client data. Output: IV (16 bytes) || ciphertext.
*/
fn build_cipher_data(
    constants: &ProtocolConstants,
    certificate_chain: &[u8],
    xml_key: &XmlKey,
) -> Vec<u8> {
    let plaintext = build_client_data(constants, certificate_chain).to_canonical_string();
    let ciphertext = aes::aes_cbc_encrypt(xml_key.aes_key(), xml_key.aes_iv(), plaintext.as_bytes());

    let mut out = Vec::with_capacity(IV_LEN + ciphertext.len());
    out.extend_from_slice(xml_key.aes_iv());
    out.extend_from_slice(&ciphertext);
    out
}

fn build_license_acquisition(constants: &ProtocolConstants, body: &LicenseBody<'_>) -> Element {
    let encrypted_key = Element::new("EncryptedKey")
        .with_attr("xmlns", constants.xmlenc_ns)
        .with_child(
            Element::new("EncryptionMethod").with_attr("Algorithm", constants.ecc256_algorithm),
        )
        .with_child(
            Element::new("KeyInfo")
                .with_attr("xmlns", constants.xmldsig_ns)
                .with_child(Element::new("KeyName").with_text(constants.key_name)),
        )
        .with_child(cipher_value(body.wrapped_key));

    let encrypted_data = Element::new("EncryptedData")
        .with_attr("xmlns", constants.xmlenc_ns)
        .with_attr("Type", constants.xmlenc_element_type)
        .with_child(
            Element::new("EncryptionMethod").with_attr("Algorithm", constants.aes128_cbc_algorithm),
        )
        .with_child(
            Element::new("KeyInfo")
                .with_attr("xmlns", constants.xmldsig_ns)
                .with_child(encrypted_key),
        )
        .with_child(cipher_value(body.cipher_data));

    Element::new("LA")
        .with_attr("xmlns", constants.protocol_ns)
        .with_attr("Id", constants.signed_data_id)
        .with_attr("xml:space", "preserve")
        .with_child(Element::new("Version").with_text(body.version.to_string()))
        .with_child(Element::new("ContentHeader").with_node(body.header.node().clone()))
        .with_child(
            Element::new("CLIENTINFO")
                .with_child(Element::new("CLIENTVERSION").with_text(constants.client_version)),
        )
        .with_child(Element::new("LicenseNonce").with_text(BASE64.encode(body.nonce)))
        .with_child(Element::new("ClientTime").with_text(body.client_time.to_string()))
        .with_child(encrypted_data)
}

fn cipher_value(data: &[u8]) -> Element {
    Element::new("CipherData").with_child(Element::new("CipherValue").with_text(BASE64.encode(data)))
}

/**
    Build the `<SignedInfo>` element referencing the `<LA>` digest.
*/
fn build_signed_info(constants: &ProtocolConstants, la_digest: &[u8; 32]) -> Element {
    Element::new("SignedInfo")
        .with_attr("xmlns", constants.xmldsig_ns)
        .with_child(
            Element::new("CanonicalizationMethod").with_attr("Algorithm", constants.c14n_algorithm),
        )
        .with_child(
            Element::new("SignatureMethod")
                .with_attr("Algorithm", constants.ecdsa_sha256_algorithm),
        )
        .with_child(
            Element::new("Reference")
                .with_attr("URI", constants.signed_data_reference())
                .with_child(
                    Element::new("DigestMethod").with_attr("Algorithm", constants.sha256_algorithm),
                )
                .with_child(Element::new("DigestValue").with_text(BASE64.encode(la_digest))),
        )
}

/**
    Assemble the complete SOAP envelope.
*/
fn build_envelope(
    constants: &ProtocolConstants,
    la: Element,
    signed_info: Element,
    signature: &[u8],
    signing_public_key: &[u8; 64],
) -> Element {
    let signature = Element::new("Signature")
        .with_attr("xmlns", constants.xmldsig_ns)
        .with_child(signed_info)
        .with_child(Element::new("SignatureValue").with_text(BASE64.encode(signature)))
        .with_child(
            Element::new("KeyInfo")
                .with_attr("xmlns", constants.xmldsig_ns)
                .with_child(
                    Element::new("KeyValue").with_child(
                        Element::new("ECCKeyValue").with_child(
                            Element::new("PublicKey").with_text(BASE64.encode(signing_public_key)),
                        ),
                    ),
                ),
        );

    let challenge = Element::new("Challenge")
        .with_attr("xmlns", constants.message_ns)
        .with_child(la)
        .with_child(signature);

    Element::new("soap:Envelope")
        .with_attr("xmlns:xsi", constants.xsi_ns)
        .with_attr("xmlns:xsd", constants.xsd_ns)
        .with_attr("xmlns:soap", constants.soap_ns)
        .with_child(
            Element::new("soap:Body").with_child(
                Element::new("AcquireLicense")
                    .with_attr("xmlns", constants.protocol_ns)
                    .with_child(Element::new("challenge").with_child(challenge)),
            ),
        )
}
