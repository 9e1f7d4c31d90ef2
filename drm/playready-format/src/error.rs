use thiserror::Error;

/**
    Errors from building or parsing PlayReady wire-format fragments.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    #[error("invalid XML: {0}")]
    InvalidXml(String),

    #[error("failed to write XML: {0}")]
    XmlWrite(String),

    #[error("unexpected root element <{found}>, expected <{expected}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },
}

/**
    Type alias for results that may return a [`FormatError`].
*/
pub type FormatResult<T> = std::result::Result<T, FormatError>;
