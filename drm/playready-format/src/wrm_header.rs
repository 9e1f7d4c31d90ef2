/*!
    WRM (Windows Rights Management) Header XML format.

    The WRM header identifies protected content. A license challenge embeds
    it verbatim inside `<ContentHeader>`, and its `version` attribute selects
    the `<Version>` of the license request.

    Versions: 4.0, 4.1, 4.2, 4.3

    Key elements:
    - `<WRMHEADER>` root with `xmlns` and `version` attributes
    - `<DATA>` container
    - `<PROTECTINFO>` → `<KEYLEN>` + `<ALGID>` (4.0) or `<KIDS>` → `<KID VALUE="..">` (4.2+)
    - `<KID>`: base64-encoded key ID (4.0)
    - `<CHECKSUM>`: base64 of the first 8 bytes of SHA-1(KID)
*/

use core::fmt;

use data_encoding::BASE64;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use sha1::{Digest, Sha1};

use crate::error::{FormatError, FormatResult};
use crate::xml::{Element, Node};

pub const WRM_HEADER_NS: &str = "http://schemas.microsoft.com/DRM/2007/03/PlayReadyHeader";

/**
    Version written by [`build_wrm_header`].
*/
pub const WRM_HEADER_BUILD_VERSION: &str = "4.0.0.0";

const ROOT_ELEMENT: &str = "WRMHEADER";
const KEY_LENGTH: &str = "16";
const ALGORITHM_ID: &str = "AESCTR";

/**
    Declared version of a WRM header.

    Unknown version strings are kept as-is rather than rejected.
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WrmHeaderVersion {
    V4_0_0_0,
    V4_1_0_0,
    V4_2_0_0,
    V4_3_0_0,
    Unknown(String),
}

impl WrmHeaderVersion {
    pub fn from_name(name: &str) -> Self {
        match name {
            "4.0.0.0" => Self::V4_0_0_0,
            "4.1.0.0" => Self::V4_1_0_0,
            "4.2.0.0" => Self::V4_2_0_0,
            "4.3.0.0" => Self::V4_3_0_0,
            other => Self::Unknown(other.to_owned()),
        }
    }

    pub fn to_name(&self) -> &str {
        match self {
            Self::V4_0_0_0 => "4.0.0.0",
            Self::V4_1_0_0 => "4.1.0.0",
            Self::V4_2_0_0 => "4.2.0.0",
            Self::V4_3_0_0 => "4.3.0.0",
            Self::Unknown(name) => name,
        }
    }
}

impl fmt::Display for WrmHeaderVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl From<&str> for WrmHeaderVersion {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

/**
    A content header ready to be embedded in a license challenge.

    Either a parsed `<WRMHEADER>` tree (re-serialized canonically) or a
    pre-serialized subtree that is passed through byte for byte.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrmHeader {
    version: String,
    node: Node,
}

impl WrmHeader {
    /**
        Parse a WRM header document.

        Accepts an XML declaration and indentation; both are dropped. A missing
        `version` attribute is treated as an empty (unknown) version.
    */
    pub fn from_xml(xml: &str) -> FormatResult<Self> {
        let root = Element::parse(xml)?;
        if root.name() != ROOT_ELEMENT {
            return Err(FormatError::UnexpectedRoot {
                expected: ROOT_ELEMENT,
                found: root.name().to_owned(),
            });
        }
        Ok(Self {
            version: root.attr("version").unwrap_or_default().to_owned(),
            node: Node::Element(root),
        })
    }

    /**
        Wrap an already-serialized header subtree without looking inside it.

        The markup is written into `<ContentHeader>` as given, except that
        newlines are removed from the whole challenge before signing. It is not
        re-canonicalized: self-closing tags or indentation stay as they are.
        Use [`WrmHeader::from_xml`] to get canonical end tags.
    */
    pub fn from_parts(version: impl Into<String>, xml: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            node: Node::Raw(xml.into()),
        }
    }

    /**
        The `version` string exactly as declared.
    */
    pub fn declared_version(&self) -> &str {
        &self.version
    }

    pub fn version(&self) -> WrmHeaderVersion {
        WrmHeaderVersion::from_name(&self.version)
    }

    /**
        The node to place inside `<ContentHeader>`.
    */
    pub fn node(&self) -> &Node {
        &self.node
    }

    /**
        Decode every key ID listed in the header.

        Handles both the 4.0 layout (`<KID>` text) and the 4.2+ layout
        (`<KID VALUE="..">` attributes).
    */
    pub fn key_ids(&self) -> FormatResult<Vec<Vec<u8>>> {
        let parsed;
        let root = match &self.node {
            Node::Element(e) => e,
            Node::Raw(raw) => {
                parsed = Element::parse(raw)?;
                &parsed
            }
            Node::Text(_) => return Ok(Vec::new()),
        };

        root.find_all("KID")
            .into_iter()
            .map(|kid| {
                let encoded = match kid.attr("VALUE") {
                    Some(value) => value.to_owned(),
                    None => kid.text(),
                };
                decode_base64(encoded.trim())
            })
            .collect()
    }
}

/**
    Content key checksum: the first 8 bytes of SHA-1 over the raw key ID.
*/
pub fn kid_checksum(kid: &[u8]) -> [u8; 8] {
    let digest = Sha1::digest(kid);
    let mut checksum = [0u8; 8];
    checksum.copy_from_slice(&digest[..8]);
    checksum
}

/**
    Build a standalone version 4.0.0.0 WRM header document for a key ID.

    The output is conventional, human-indented XML with a declaration. It is
    meant for distribution and is not in canonical form; parse it with
    [`WrmHeader::from_xml`] before embedding it in a challenge.
*/
pub fn build_wrm_header(kid_b64: &str) -> FormatResult<String> {
    let kid = decode_base64(kid_b64)?;
    let checksum = BASE64.encode(&kid_checksum(&kid));

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 3);
    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write(
        &mut writer,
        Event::Start(
            BytesStart::new(ROOT_ELEMENT)
                .with_attributes([("xmlns", WRM_HEADER_NS), ("version", WRM_HEADER_BUILD_VERSION)]),
        ),
    )?;
    write(&mut writer, Event::Start(BytesStart::new("DATA")))?;
    write(&mut writer, Event::Start(BytesStart::new("PROTECTINFO")))?;
    write_text_element(&mut writer, "KEYLEN", KEY_LENGTH)?;
    write_text_element(&mut writer, "ALGID", ALGORITHM_ID)?;
    write(&mut writer, Event::End(BytesEnd::new("PROTECTINFO")))?;
    write_text_element(&mut writer, "KID", kid_b64)?;
    write_text_element(&mut writer, "CHECKSUM", &checksum)?;
    write(&mut writer, Event::End(BytesEnd::new("DATA")))?;
    write(&mut writer, Event::End(BytesEnd::new(ROOT_ELEMENT)))?;

    String::from_utf8(writer.into_inner()).map_err(|e| FormatError::XmlWrite(e.to_string()))
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> FormatResult<()> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> FormatResult<()> {
    writer
        .write_event(event)
        .map_err(|e| FormatError::XmlWrite(e.to_string()))
}

fn decode_base64(encoded: &str) -> FormatResult<Vec<u8>> {
    BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| FormatError::InvalidBase64(format!("KID: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KID_B64: &str = "4Rplb+TbNES8tGkNFWTEHA==";

    const HEADER_V43: &str = "<WRMHEADER xmlns=\"http://schemas.microsoft.com/DRM/2007/03/PlayReadyHeader\" version=\"4.3.0.0\">\
<DATA><PROTECTINFO><KIDS><KID ALGID=\"AESCTR\" VALUE=\"4Rplb+TbNES8tGkNFWTEHA==\"></KID></KIDS></PROTECTINFO></DATA>\
</WRMHEADER>";

    #[test]
    fn version_names_round_trip() {
        for name in ["4.0.0.0", "4.1.0.0", "4.2.0.0", "4.3.0.0"] {
            let version = WrmHeaderVersion::from_name(name);
            assert!(!matches!(version, WrmHeaderVersion::Unknown(_)));
            assert_eq!(version.to_name(), name);
        }
    }

    #[test]
    fn unknown_version_is_preserved() {
        let version = WrmHeaderVersion::from("9.9.9.9");
        assert_eq!(version, WrmHeaderVersion::Unknown("9.9.9.9".into()));
        assert_eq!(version.to_string(), "9.9.9.9");
        assert_eq!(
            WrmHeaderVersion::from_name(""),
            WrmHeaderVersion::Unknown(String::new())
        );
    }

    #[test]
    fn checksum_is_first_eight_bytes_of_sha1() {
        let kid = BASE64.decode(KID_B64.as_bytes()).unwrap();
        assert_eq!(kid_checksum(&kid), [0x2b, 0x7b, 0x3c, 0x22, 0xfe, 0xdf, 0x5c, 0x27]);
        assert_eq!(kid_checksum(&kid), kid_checksum(&kid));
    }

    #[test]
    fn build_header_contains_metadata() {
        let xml = build_wrm_header(KID_B64).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<KEYLEN>16</KEYLEN>"));
        assert!(xml.contains("<ALGID>AESCTR</ALGID>"));
        assert!(xml.contains(&format!("<KID>{KID_B64}</KID>")));
        assert!(xml.contains("<CHECKSUM>K3s8Iv7fXCc=</CHECKSUM>"));
        assert!(xml.contains('\n'));
    }

    #[test]
    fn built_header_parses_back() {
        let xml = build_wrm_header("AAECAwQFBgcICQoLDA0ODw==").unwrap();
        let header = WrmHeader::from_xml(&xml).unwrap();
        assert_eq!(header.declared_version(), "4.0.0.0");
        assert_eq!(header.version(), WrmHeaderVersion::V4_0_0_0);
        assert_eq!(header.key_ids().unwrap(), vec![(0u8..16).collect::<Vec<_>>()]);

        let Node::Element(root) = header.node() else {
            panic!("parsed header should be an element");
        };
        assert_eq!(root.attr("xmlns"), Some(WRM_HEADER_NS));
        assert_eq!(root.find("CHECKSUM").unwrap().text(), "VheLhqV/rCI=");
    }

    #[test]
    fn build_header_rejects_bad_base64() {
        let err = build_wrm_header("not base64!").unwrap_err();
        assert!(matches!(err, FormatError::InvalidBase64(_)));
    }

    #[test]
    fn parse_v43_header_with_kid_attributes() {
        let header = WrmHeader::from_xml(HEADER_V43).unwrap();
        assert_eq!(header.version(), WrmHeaderVersion::V4_3_0_0);
        let kids = header.key_ids().unwrap();
        assert_eq!(kids.len(), 1);
        assert_eq!(kids[0].len(), 16);
    }

    #[test]
    fn parsed_header_reserializes_canonically() {
        let header = WrmHeader::from_xml(HEADER_V43).unwrap();
        let Node::Element(root) = header.node() else {
            panic!("parsed header should be an element");
        };
        assert_eq!(root.to_canonical_string(), HEADER_V43);
    }

    #[test]
    fn raw_header_is_kept_verbatim() {
        let header = WrmHeader::from_parts("4.2.0.0", HEADER_V43);
        assert_eq!(header.version(), WrmHeaderVersion::V4_2_0_0);
        assert_eq!(header.node(), &Node::Raw(HEADER_V43.to_owned()));
        assert_eq!(header.key_ids().unwrap().len(), 1);
    }

    #[test]
    fn wrong_root_is_rejected() {
        let err = WrmHeader::from_xml("<DATA></DATA>").unwrap_err();
        assert!(matches!(err, FormatError::UnexpectedRoot { .. }));
    }

    #[test]
    fn missing_version_is_unknown() {
        let header = WrmHeader::from_xml("<WRMHEADER><DATA></DATA></WRMHEADER>").unwrap();
        assert_eq!(header.declared_version(), "");
        assert_eq!(header.version(), WrmHeaderVersion::Unknown(String::new()));
    }
}
