//! Error types for helpdown operations.

use thiserror::Error;

/// Errors that can occur during conversion.
///
/// Only validation problems (an unknown target format, options that cannot
/// be applied) and hard I/O failures surface here. Resolution misses such as
/// an unknown variable or a missing snippet source degrade to warnings on the
/// conversion result instead; see [`crate::meta::Warning`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
