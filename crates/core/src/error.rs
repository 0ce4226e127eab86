//! Error types for the signflow compositing library.

use thiserror::Error;

/// Primary error type for PDF parsing, image embedding and serialization.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("invalid token at position {pos}: {msg}")]
    TokenError { pos: usize, msg: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("PDF object not found: {0}")]
    ObjectNotFound(u32),

    #[error("no valid xref table found")]
    NoValidXRef,

    #[error("PDF syntax error: {0}")]
    SyntaxError(String),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    #[error("invalid image data: {0}")]
    InvalidImageData(String),

    #[error("dangling reference to object {0}")]
    DanglingReference(u32),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfError {
    /// True for errors meaning the input document is not a well-formed PDF
    /// (as opposed to a bad image payload or an internal writer defect).
    pub const fn is_document_parse_error(&self) -> bool {
        matches!(
            self,
            Self::TokenError { .. }
                | Self::UnexpectedEof
                | Self::TypeError { .. }
                | Self::ObjectNotFound(_)
                | Self::NoValidXRef
                | Self::SyntaxError(_)
                | Self::DecodeError(_)
        )
    }
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
