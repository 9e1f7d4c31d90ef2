/*!
    SOAP/XML protocol constants for PlayReady license acquisition.

    Challenge (client → server):
    ```xml
    <soap:Envelope xmlns:xsi="..." xmlns:xsd="..." xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
      <soap:Body>
        <AcquireLicense xmlns="http://schemas.microsoft.com/DRM/2007/03/protocols">
          <challenge>
            <Challenge xmlns="http://schemas.microsoft.com/DRM/2007/03/protocols/messages">
              <LA xmlns="..." Id="SignedData" xml:space="preserve">
                <!-- version, WRM header, client info, nonce, time, encrypted key + data -->
              </LA>
              <Signature xmlns="http://www.w3.org/2000/09/xmldsig#">
                <SignedInfo>...</SignedInfo>
                <SignatureValue><!-- ECDSA-SHA256, base64 --></SignatureValue>
                <KeyInfo><KeyValue><ECCKeyValue><PublicKey>...</PublicKey></ECCKeyValue></KeyValue></KeyInfo>
              </Signature>
            </Challenge>
          </challenge>
        </AcquireLicense>
      </soap:Body>
    </soap:Envelope>
    ```

    Every value below is part of the wire contract with the license server.
*/

/**
    The complete table of namespaces, algorithm identifiers and magic strings
    used when assembling a license challenge.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConstants {
    /// Prepended to the serialized envelope.
    pub xml_declaration: &'static str,

    pub soap_ns: &'static str,
    pub xsi_ns: &'static str,
    pub xsd_ns: &'static str,
    pub protocol_ns: &'static str,
    pub message_ns: &'static str,
    pub xmldsig_ns: &'static str,
    pub xmlenc_ns: &'static str,
    /// `Type` attribute of `<EncryptedData>`.
    pub xmlenc_element_type: &'static str,

    pub c14n_algorithm: &'static str,
    pub ecdsa_sha256_algorithm: &'static str,
    pub sha256_algorithm: &'static str,
    pub aes128_cbc_algorithm: &'static str,
    pub ecc256_algorithm: &'static str,

    /// Contents of `<CLIENTINFO><CLIENTVERSION>`.
    pub client_version: &'static str,
    /// Name of the key the session key is wrapped under.
    pub key_name: &'static str,
    /// Capability advertised inside the encrypted client data.
    pub feature_name: &'static str,
    /// `Id` of the `<LA>` element, referenced from `<SignedInfo>` as `#SignedData`.
    pub signed_data_id: &'static str,
}

pub const PROTOCOL: ProtocolConstants = ProtocolConstants {
    xml_declaration: "<?xml version=\"1.0\" encoding=\"utf-8\"?>",

    soap_ns: "http://schemas.xmlsoap.org/soap/envelope/",
    xsi_ns: "http://www.w3.org/2001/XMLSchema-instance",
    xsd_ns: "http://www.w3.org/2001/XMLSchema",
    protocol_ns: "http://schemas.microsoft.com/DRM/2007/03/protocols",
    message_ns: "http://schemas.microsoft.com/DRM/2007/03/protocols/messages",
    xmldsig_ns: "http://www.w3.org/2000/09/xmldsig#",
    xmlenc_ns: "http://www.w3.org/2001/04/xmlenc#",
    xmlenc_element_type: "http://www.w3.org/2001/04/xmlenc#Element",

    c14n_algorithm: "http://www.w3.org/TR/2001/REC-xml-c14n-20010315",
    ecdsa_sha256_algorithm: "http://schemas.microsoft.com/DRM/2007/03/protocols#ecdsa-sha256",
    sha256_algorithm: "http://schemas.microsoft.com/DRM/2007/03/protocols#sha256",
    aes128_cbc_algorithm: "http://www.w3.org/2001/04/xmlenc#aes128-cbc",
    ecc256_algorithm: "http://schemas.microsoft.com/DRM/2007/03/protocols#ecc256",

    client_version: "4.0.1.2",
    key_name: "WMRMServer",
    feature_name: "AESCBC",
    signed_data_id: "SignedData",
};

impl ProtocolConstants {
    /**
        The `URI` attribute of the signature reference (`#` + the `<LA>` Id).
    */
    pub fn signed_data_reference(&self) -> String {
        format!("#{}", self.signed_data_id)
    }
}

impl Default for ProtocolConstants {
    fn default() -> Self {
        PROTOCOL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_points_at_license_body() {
        assert_eq!(PROTOCOL.signed_data_reference(), "#SignedData");
    }

    #[test]
    fn element_type_lives_in_xmlenc_namespace() {
        assert!(PROTOCOL.xmlenc_element_type.starts_with(PROTOCOL.xmlenc_ns));
        assert!(PROTOCOL.aes128_cbc_algorithm.starts_with(PROTOCOL.xmlenc_ns));
    }

    #[test]
    fn drm_algorithms_live_in_protocol_namespace() {
        for uri in [
            PROTOCOL.ecdsa_sha256_algorithm,
            PROTOCOL.sha256_algorithm,
            PROTOCOL.ecc256_algorithm,
        ] {
            assert!(uri.starts_with(PROTOCOL.protocol_ns), "{uri}");
        }
    }
}
