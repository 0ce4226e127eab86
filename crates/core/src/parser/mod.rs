//! PDF syntax parsing modules.
//!
//! - `lexer`: byte-level tokenizer for PDF object syntax
//! - `pdf_parser`: token stream to PDFObject parser, content operations

pub mod lexer;
pub mod pdf_parser;

pub use lexer::{Lexer, Token};
pub use pdf_parser::{ContentParser, Operation, PDFParser};
