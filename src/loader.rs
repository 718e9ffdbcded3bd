use crate::composer::Composer;
use crate::node::Node;
use crate::parser::Parser;
use crate::reader::Reader;
use crate::scanner::Scanner;
use crate::{ComposerError, Encoding, ParserError, ScannerError};

/// The read-path facade: bytes in, documents out.
///
/// Iteration yields one [`Node`] per document; the first malformed document
/// ends the iteration, per the one-error-per-load contract.
pub struct Loader {
    composer: Composer,
    failed: bool,
}

impl Loader {
    /// Build a loader over a byte buffer, autodetecting the encoding.
    pub fn from_bytes(input: &[u8]) -> Result<Self, ComposerError> {
        Self::with_encoding(input, None)
    }

    /// Build a loader over UTF-8 text.
    pub fn from_str(input: &str) -> Result<Self, ComposerError> {
        Self::with_encoding(input.as_bytes(), Some(Encoding::Utf8))
    }

    /// Build a loader with an explicit encoding instead of autodetection.
    pub fn with_encoding(input: &[u8], encoding: Option<Encoding>) -> Result<Self, ComposerError> {
        let reader = Reader::new(input, encoding)
            .map_err(|err| ParserError::from(ScannerError::from(err)))?;
        let composer = Composer::new(Parser::new(Scanner::new(reader)));
        Ok(Self {
            composer,
            failed: false,
        })
    }

    /// The composer, for registering resolver rules and constructor hooks.
    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    /// The next document, or `None` at the end of the stream.
    pub fn next_document(&mut self) -> Result<Option<Node>, ComposerError> {
        if self.failed {
            return Ok(None);
        }
        match self.composer.next_document() {
            Ok(document) => Ok(document),
            Err(err) => {
                self.failed = true;
                Err(err)
            }
        }
    }
}

impl Iterator for Loader {
    type Item = Result<Node, ComposerError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_document().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_documents() {
        let loader = Loader::from_str("1\n---\n2\n---\n3\n").unwrap();
        let documents: Vec<_> = loader.map(Result::unwrap).collect();
        assert_eq!(
            documents.iter().filter_map(Node::as_int).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn stops_at_first_malformed_document() {
        let mut loader = Loader::from_str("ok\n---\n&a [1, *a]\n---\nnever\n").unwrap();
        assert!(loader.next().unwrap().is_ok());
        assert!(loader.next().unwrap().is_err());
        assert!(loader.next().is_none());
    }

    #[test]
    fn reader_errors_surface_at_construction() {
        assert!(Loader::from_bytes(b"a\x01b").is_err());
    }

    #[test]
    fn loads_utf16_input() {
        let mut input = Vec::from(&b"\xFF\xFE"[..]);
        for unit in "n: 1\n".encode_utf16() {
            input.extend(unit.to_le_bytes());
        }
        let mut loader = Loader::from_bytes(&input).unwrap();
        let document = loader.next_document().unwrap().unwrap();
        assert_eq!(document.get_key("n").and_then(Node::as_int), Some(1));
    }
}
