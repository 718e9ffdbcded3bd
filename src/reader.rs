use std::rc::Rc;

use encoding_rs::{UTF_16BE, UTF_16LE};

use crate::chars::is_break;
use crate::{Encoding, Mark, ReaderError};

const BOM_UTF8: &[u8] = b"\xEF\xBB\xBF";
const BOM_UTF16LE: &[u8] = b"\xFF\xFE";
const BOM_UTF16BE: &[u8] = b"\xFE\xFF";
const BOM_UTF32LE: &[u8] = b"\xFF\xFE\x00\x00";
const BOM_UTF32BE: &[u8] = b"\x00\x00\xFE\xFF";

/// A forward cursor over the decoded input.
///
/// The whole input is transcoded to Unicode at construction; the decoded
/// buffer is shared between all saved cursors, so [`Reader::save`] is cheap.
/// The cursor tracks `(line, column)` with YAML line-break rules: `\r\n`
/// counts as a single break, and `\u{0085}`, `\u{2028}`, `\u{2029}` advance
/// the line like `\n` does.
#[derive(Clone, Debug)]
pub struct Reader {
    chars: Rc<[char]>,
    pos: usize,
    mark: Mark,
    encoding: Encoding,
}

impl Reader {
    /// Decode a byte buffer, detecting the encoding from a BOM or the
    /// zero-byte pattern of the first bytes unless a hint is given.
    pub fn new(input: &[u8], hint: Option<Encoding>) -> Result<Self, ReaderError> {
        let encoding = match hint {
            Some(encoding) => encoding,
            None => detect_encoding(input),
        };
        let input = strip_bom(input, encoding);
        let decoded = decode(input, encoding)?;
        let chars = validate(&decoded)?;
        Ok(Self {
            chars: chars.into(),
            pos: 0,
            mark: Mark::default(),
            encoding,
        })
    }

    /// The encoding the input was decoded from.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The character at `offset` positions past the cursor, if any.
    pub fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// The character under the cursor.
    pub fn front(&self) -> Option<char> {
        self.peek(0)
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// The current position.
    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// A copy of the cursor. The decoded text is shared, not copied.
    pub fn save(&self) -> Reader {
        self.clone()
    }

    /// Advance past one non-break character.
    pub fn skip(&mut self) {
        debug_assert!(!self.is_empty(), "skip past end of input");
        self.pos += 1;
        self.mark.index += 1;
        self.mark.column += 1;
    }

    /// Advance past one line break, treating `\r\n` as a single break.
    pub fn skip_break(&mut self) {
        if self.peek(0) == Some('\r') && self.peek(1) == Some('\n') {
            self.pos += 2;
            self.mark.index += 2;
        } else {
            debug_assert!(is_break(self.front()), "skip_break on a non-break");
            self.pos += 1;
            self.mark.index += 1;
        }
        self.mark.column = 0;
        self.mark.line += 1;
    }

    /// Append the character under the cursor to `string` and advance.
    pub fn read(&mut self, string: &mut String) {
        let ch = self.front().expect("read past end of input");
        string.push(ch);
        self.skip();
    }

    /// Consume one line break and append its normalized form to `string`.
    ///
    /// `\r\n`, `\r`, `\n` and `\u{0085}` all normalize to `\n`; the Unicode
    /// line and paragraph separators are preserved as themselves.
    pub fn read_break(&mut self, string: &mut String) {
        match self.front() {
            Some('\u{2028}' | '\u{2029}') => {
                string.push(self.front().unwrap());
            }
            _ => string.push('\n'),
        }
        self.skip_break();
    }
}

fn detect_encoding(input: &[u8]) -> Encoding {
    // The UTF-32LE BOM starts with the UTF-16LE BOM; test the wider one
    // first.
    if input.starts_with(BOM_UTF32LE) {
        Encoding::Utf32Le
    } else if input.starts_with(BOM_UTF32BE) {
        Encoding::Utf32Be
    } else if input.starts_with(BOM_UTF16LE) {
        Encoding::Utf16Le
    } else if input.starts_with(BOM_UTF16BE) {
        Encoding::Utf16Be
    } else if input.starts_with(BOM_UTF8) {
        Encoding::Utf8
    } else {
        // No BOM: an ASCII-range first character betrays wider encodings
        // through its zero bytes.
        match input {
            [0, 0, 0, _, ..] => Encoding::Utf32Be,
            [_, 0, 0, 0, ..] => Encoding::Utf32Le,
            [0, _, ..] => Encoding::Utf16Be,
            [_, 0, ..] => Encoding::Utf16Le,
            _ => Encoding::Utf8,
        }
    }
}

fn strip_bom(input: &[u8], encoding: Encoding) -> &[u8] {
    let bom: &[u8] = match encoding {
        Encoding::Utf8 => BOM_UTF8,
        Encoding::Utf16Le => BOM_UTF16LE,
        Encoding::Utf16Be => BOM_UTF16BE,
        Encoding::Utf32Le => BOM_UTF32LE,
        Encoding::Utf32Be => BOM_UTF32BE,
        Encoding::Any => return input,
    };
    input.strip_prefix(bom).unwrap_or(input)
}

fn decode(input: &[u8], encoding: Encoding) -> Result<String, ReaderError> {
    match encoding {
        Encoding::Any | Encoding::Utf8 => match std::str::from_utf8(input) {
            Ok(text) => Ok(String::from(text)),
            Err(err) => Err(ReaderError::InvalidUtf8 {
                offset: err.valid_up_to(),
            }),
        },
        Encoding::Utf16Le | Encoding::Utf16Be => {
            let name = if encoding == Encoding::Utf16Le {
                "UTF-16LE"
            } else {
                "UTF-16BE"
            };
            if input.len() % 2 != 0 {
                return Err(ReaderError::UnalignedInput { encoding: name });
            }
            let codec = if encoding == Encoding::Utf16Le {
                UTF_16LE
            } else {
                UTF_16BE
            };
            let (decoded, had_errors) = codec.decode_without_bom_handling(input);
            if had_errors {
                return Err(ReaderError::InvalidUtf16 { encoding: name });
            }
            Ok(decoded.into_owned())
        }
        Encoding::Utf32Le | Encoding::Utf32Be => {
            let name = if encoding == Encoding::Utf32Le {
                "UTF-32LE"
            } else {
                "UTF-32BE"
            };
            if input.len() % 4 != 0 {
                return Err(ReaderError::UnalignedInput { encoding: name });
            }
            let mut decoded = String::with_capacity(input.len() / 4);
            for (unit, bytes) in input.chunks_exact(4).enumerate() {
                let bytes: [u8; 4] = bytes.try_into().unwrap();
                let value = if encoding == Encoding::Utf32Le {
                    u32::from_le_bytes(bytes)
                } else {
                    u32::from_be_bytes(bytes)
                };
                match char::from_u32(value) {
                    Some(ch) => decoded.push(ch),
                    None => {
                        return Err(ReaderError::InvalidUtf32 {
                            offset: unit * 4,
                            value,
                        })
                    }
                }
            }
            Ok(decoded)
        }
    }
}

/// Collect the decoded text, rejecting characters outside the YAML
/// printable set (plus tab and the break characters).
fn validate(text: &str) -> Result<Vec<char>, ReaderError> {
    let mut chars = Vec::with_capacity(text.len());
    let mut mark = Mark::default();
    for ch in text.chars() {
        let allowed = ch == '\x09'
            || ch == '\x0A'
            || ch == '\x0D'
            || ch >= '\x20' && ch <= '\x7E'
            || ch == '\u{0085}'
            || ch >= '\u{00A0}' && ch <= '\u{D7FF}'
            || ch >= '\u{E000}' && ch <= '\u{FFFD}'
            || ch >= '\u{10000}' && ch <= '\u{10FFFF}';
        if !allowed {
            return Err(ReaderError::ControlCharacter {
                mark,
                value: ch as u32,
            });
        }
        mark.index += 1;
        if is_break(ch) {
            mark.line += 1;
            mark.column = 0;
        } else {
            mark.column += 1;
        }
        chars.push(ch);
    }
    Ok(chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_utf8_without_bom() {
        let reader = Reader::new(b"key: value", None).unwrap();
        assert_eq!(reader.encoding(), Encoding::Utf8);
        assert_eq!(reader.front(), Some('k'));
    }

    #[test]
    fn detects_utf16le_from_bom() {
        let mut input = Vec::from(&b"\xFF\xFE"[..]);
        for unit in "a: 1".encode_utf16() {
            input.extend(unit.to_le_bytes());
        }
        let reader = Reader::new(&input, None).unwrap();
        assert_eq!(reader.encoding(), Encoding::Utf16Le);
        assert_eq!(reader.front(), Some('a'));
    }

    #[test]
    fn detects_utf16be_from_zero_pattern() {
        let mut input = Vec::new();
        for unit in "x".encode_utf16() {
            input.extend(unit.to_be_bytes());
        }
        let reader = Reader::new(&input, None).unwrap();
        assert_eq!(reader.encoding(), Encoding::Utf16Be);
    }

    #[test]
    fn decodes_utf32be() {
        let mut input = Vec::from(&b"\x00\x00\xFE\xFF"[..]);
        for ch in "hi".chars() {
            input.extend((ch as u32).to_be_bytes());
        }
        let mut reader = Reader::new(&input, None).unwrap();
        assert_eq!(reader.encoding(), Encoding::Utf32Be);
        let mut out = String::new();
        reader.read(&mut out);
        reader.read(&mut out);
        assert_eq!(out, "hi");
        assert!(reader.is_empty());
    }

    #[test]
    fn rejects_unaligned_utf16() {
        let err = Reader::new(b"\xFF\xFEa", None).unwrap_err();
        assert!(matches!(err, ReaderError::UnalignedInput { .. }));
    }

    #[test]
    fn rejects_control_characters() {
        let err = Reader::new(b"a\x07b", None).unwrap_err();
        match err {
            ReaderError::ControlCharacter { mark, value } => {
                assert_eq!(value, 0x07);
                assert_eq!(mark.column, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn crlf_advances_one_line() {
        let mut reader = Reader::new(b"a\r\nb", None).unwrap();
        reader.skip();
        reader.skip_break();
        assert_eq!(reader.mark().line, 1);
        assert_eq!(reader.mark().column, 0);
        assert_eq!(reader.front(), Some('b'));
    }

    #[test]
    fn read_break_normalizes_nel_but_keeps_line_separator() {
        let mut reader = Reader::new("a\u{0085}b\u{2028}c".as_bytes(), None).unwrap();
        let mut out = String::new();
        reader.read(&mut out);
        reader.read_break(&mut out);
        reader.read(&mut out);
        reader.read_break(&mut out);
        reader.read(&mut out);
        assert_eq!(out, "a\nb\u{2028}c");
        assert_eq!(reader.mark().line, 2);
    }

    #[test]
    fn save_is_an_independent_cursor() {
        let mut reader = Reader::new(b"abc", None).unwrap();
        let saved = reader.save();
        reader.skip();
        reader.skip();
        assert_eq!(saved.front(), Some('a'));
        assert_eq!(reader.front(), Some('c'));
    }
}
