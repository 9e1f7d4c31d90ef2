#![allow(clippy::doc_overindented_list_items)]

mod error;

pub mod soap;
pub mod wrm_header;
pub mod xml;

pub use self::error::{FormatError, FormatResult};
pub use self::soap::{PROTOCOL, ProtocolConstants};
pub use self::wrm_header::{WrmHeader, WrmHeaderVersion, build_wrm_header, kid_checksum};
pub use self::xml::{Element, Node};
