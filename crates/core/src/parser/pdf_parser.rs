//! PDF parser - converts lexer tokens to PDF objects.
//!
//! Handles indirect references (`num num R`) with token lookahead, and
//! provides a small content-stream operation parser used to inspect page
//! content.

use crate::error::{PdfError, Result};
use crate::model::objects::{PDFObjRef, PDFObject};
use crate::parser::lexer::{Lexer, Token};
use std::collections::HashMap;

/// PDF Parser - parses PDF object syntax.
///
/// Uses [`Lexer`] for tokenization and builds PDF objects, handling
/// indirect references (num num R) appropriately.
pub struct PDFParser<'a> {
    base: Lexer<'a>,
    /// Lookahead buffer for tokens
    lookahead: Vec<Token>,
}

impl<'a> PDFParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            base: Lexer::new(data),
            lookahead: Vec::new(),
        }
    }

    /// Get remaining unparsed data.
    ///
    /// Only meaningful when the lookahead buffer is empty, i.e. directly
    /// after a complete dict/array/string object has been parsed.
    pub fn remaining(&self) -> &'a [u8] {
        self.base.remaining()
    }

    /// Current byte position in the underlying data.
    pub fn tell(&self) -> usize {
        self.base.tell()
    }

    /// Get next token (from lookahead or lexer)
    fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(tok) = self.lookahead.pop() {
            return Ok(Some(tok));
        }
        match self.base.next_token() {
            Some(Ok((_, tok))) => Ok(Some(tok)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    /// Push token back to lookahead
    fn push_back(&mut self, tok: Token) {
        self.lookahead.push(tok);
    }

    /// Parse next PDF object
    pub fn parse_object(&mut self) -> Result<PDFObject> {
        let token = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;
        self.token_to_object(token)
    }

    /// Convert a token to a PDF object
    fn token_to_object(&mut self, token: Token) -> Result<PDFObject> {
        match token {
            Token::Int(n) => {
                // Could be start of indirect reference: objid genno R
                if let Ok(Some(tok2)) = self.next_token() {
                    if let Token::Int(m) = tok2 {
                        if let Ok(Some(tok3)) = self.next_token() {
                            if let Token::Keyword(ref kw) = tok3
                                && kw == b"R"
                                && n >= 0
                                && m >= 0
                            {
                                return Ok(PDFObject::Ref(PDFObjRef::new(n as u32, m as u32)));
                            }
                            // Not R, push back both
                            self.push_back(tok3);
                        }
                        self.push_back(Token::Int(m));
                    } else {
                        self.push_back(tok2);
                    }
                }
                Ok(PDFObject::Int(n))
            }
            Token::Real(n) => Ok(PDFObject::Real(n)),
            Token::Bool(b) => Ok(PDFObject::Bool(b)),
            Token::Literal(s) => Ok(PDFObject::Name(s)),
            Token::String(s) => Ok(PDFObject::String(s)),
            Token::Keyword(kw) => {
                if kw == b"null" {
                    return Ok(PDFObject::Null);
                }
                if kw == b"[" {
                    return self.parse_array();
                }
                if kw == b"<<" {
                    return self.parse_dict();
                }
                // Other keywords are errors in object context
                Err(PdfError::TokenError {
                    pos: self.base.tell(),
                    msg: format!("unexpected keyword: {}", String::from_utf8_lossy(&kw)),
                })
            }
        }
    }

    /// Parse array contents until ]
    fn parse_array(&mut self) -> Result<PDFObject> {
        let mut arr = Vec::new();

        loop {
            let token = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;

            if let Token::Keyword(ref kw) = token
                && kw == b"]"
            {
                break;
            }

            arr.push(self.token_to_object(token)?);
        }

        Ok(PDFObject::Array(arr))
    }

    /// Parse dict contents until >>
    fn parse_dict(&mut self) -> Result<PDFObject> {
        let mut dict = HashMap::new();

        loop {
            let token = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;

            if let Token::Keyword(ref kw) = token
                && kw == b">>"
            {
                break;
            }

            // Key must be a literal name
            let key = match token {
                Token::Literal(name) => name,
                _ => {
                    return Err(PdfError::TokenError {
                        pos: self.base.tell(),
                        msg: "expected name as dict key".into(),
                    });
                }
            };

            // Parse value
            let value = self.parse_object()?;
            dict.insert(key, value);
        }

        Ok(PDFObject::Dict(dict))
    }
}

/// Content stream operation
#[derive(Debug, Clone)]
pub struct Operation {
    /// The operator (e.g., "q", "cm", "Do")
    pub operator: Vec<u8>,
    /// Operands for this operation
    pub operands: Vec<PDFObject>,
}

/// PDF content stream parser.
///
/// Parses a content stream into a sequence of operations, each an operator
/// with its accumulated operands. Covers the operator grammar needed to
/// verify compositing output; inline image data is not interpreted.
pub struct ContentParser;

impl ContentParser {
    /// Parse a content stream into operations
    pub fn parse(data: &[u8]) -> Result<Vec<Operation>> {
        let mut lexer = Lexer::new(data);
        let mut ops = Vec::new();
        let mut operands: Vec<PDFObject> = Vec::new();
        let mut context_stack: Vec<Vec<PDFObject>> = Vec::new();

        while let Some(result) = lexer.next_token() {
            let (_, token) = result?;

            match token {
                Token::Keyword(ref kw) => {
                    // Array/dict delimiters group operands
                    if kw == b"[" || kw == b"<<" {
                        context_stack.push(std::mem::take(&mut operands));
                        continue;
                    }
                    if kw == b"]" {
                        let array_contents = std::mem::take(&mut operands);
                        operands = context_stack.pop().unwrap_or_default();
                        operands.push(PDFObject::Array(array_contents));
                        continue;
                    }
                    if kw == b">>" {
                        let dict_contents = std::mem::take(&mut operands);
                        operands = context_stack.pop().unwrap_or_default();
                        let mut dict = HashMap::new();
                        let mut iter = dict_contents.into_iter();
                        while let Some(key) = iter.next() {
                            if let PDFObject::Name(name) = key
                                && let Some(value) = iter.next()
                            {
                                dict.insert(name, value);
                            }
                        }
                        operands.push(PDFObject::Dict(dict));
                        continue;
                    }

                    if kw == b"null" {
                        operands.push(PDFObject::Null);
                        continue;
                    }

                    // Regular operator - emit operation
                    ops.push(Operation {
                        operator: kw.clone(),
                        operands: std::mem::take(&mut operands),
                    });
                }
                Token::Int(n) => operands.push(PDFObject::Int(n)),
                Token::Real(n) => operands.push(PDFObject::Real(n)),
                Token::Bool(b) => operands.push(PDFObject::Bool(b)),
                Token::Literal(s) => operands.push(PDFObject::Name(s)),
                Token::String(s) => operands.push(PDFObject::String(s)),
            }
        }

        Ok(ops)
    }
}
