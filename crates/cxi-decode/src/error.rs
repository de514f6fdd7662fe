use std::path::PathBuf;

use cxi_range::RangeSyntaxError;
use cxi_store::StoreError;
use thiserror::Error;

/// Errors that abort an import.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A reference or object was declared without its `id` element.
    #[error("missing id element in {class} reference {property:?}")]
    MissingId { class: String, property: String },

    #[error("<{element}> element without {attribute:?} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("invalid id {text:?} on {class} object")]
    InvalidObjectId { class: String, text: String },

    #[error("unexpected end of input inside an object")]
    UnexpectedEof,

    #[error("no object graph file at {0}")]
    MissingEntities(PathBuf),

    #[error("invalid id range list: {0}")]
    Range(#[from] RangeSyntaxError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
