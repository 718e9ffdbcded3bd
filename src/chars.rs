//! Character classes shared by the scanner and the emitter.

/// Alphanumeric plus `-` and `_`; the anchor/handle alphabet.
pub(crate) fn is_alpha(ch: impl Into<Option<char>>) -> bool {
    let Some(ch) = ch.into() else {
        return false;
    };
    ch >= '0' && ch <= '9'
        || ch >= 'A' && ch <= 'Z'
        || ch >= 'a' && ch <= 'z'
        || ch == '_'
        || ch == '-'
}

pub(crate) fn is_digit(ch: impl Into<Option<char>>) -> bool {
    ch.into().map_or(false, |ch| ch.is_ascii_digit())
}

pub(crate) fn as_digit(ch: char) -> u32 {
    ch.to_digit(10).expect("not in digit range")
}

pub(crate) fn is_hex(ch: impl Into<Option<char>>) -> bool {
    ch.into().map_or(false, |ch| ch.is_ascii_hexdigit())
}

pub(crate) fn as_hex(ch: char) -> u32 {
    ch.to_digit(16).expect("not in digit range (hex)")
}

pub(crate) fn is_ascii(ch: char) -> bool {
    ch.is_ascii()
}

/// The YAML printable set, minus the byte-order mark.
pub(crate) fn is_printable(ch: char) -> bool {
    match ch {
        '\u{feff}' | '\u{fffe}' | '\u{ffff}' => false,
        '\x0a'
        | '\x20'..='\x7e'
        | '\u{00a0}'..='\u{d7ff}'
        | '\u{e000}'..='\u{fffd}'
        | '\u{10000}'..='\u{10ffff}' => true,
        _ => false,
    }
}

pub(crate) fn is_bom(ch: impl Into<Option<char>>) -> bool {
    ch.into() == Some('\u{feff}')
}

pub(crate) fn is_space(ch: impl Into<Option<char>>) -> bool {
    ch.into() == Some(' ')
}

pub(crate) fn is_tab(ch: impl Into<Option<char>>) -> bool {
    ch.into() == Some('\t')
}

pub(crate) fn is_blank(ch: impl Into<Option<char>>) -> bool {
    let ch = ch.into();
    is_space(ch) || is_tab(ch)
}

pub(crate) fn is_break(ch: impl Into<Option<char>>) -> bool {
    matches!(
        ch.into(),
        Some('\r' | '\n' | '\u{0085}' | '\u{2028}' | '\u{2029}')
    )
}

/// Break or end of input.
pub(crate) fn is_breakz(ch: impl Into<Option<char>>) -> bool {
    let ch = ch.into();
    ch.is_none() || is_break(ch)
}

/// Blank, break, or end of input.
pub(crate) fn is_blankz(ch: impl Into<Option<char>>) -> bool {
    let ch = ch.into();
    is_blank(ch) || is_breakz(ch)
}

/// Characters that may terminate a plain scalar in flow context.
pub(crate) fn is_flow_indicator(ch: impl Into<Option<char>>) -> bool {
    matches!(ch.into(), Some(',' | '?' | '[' | ']' | '{' | '}'))
}

/// The character set permitted in tag URIs without escaping.
pub(crate) fn is_uri_char(ch: char, verbatim: bool) -> bool {
    is_alpha(ch)
        || matches!(
            ch,
            ';' | '/'
                | '?'
                | ':'
                | '@'
                | '&'
                | '='
                | '+'
                | '$'
                | '.'
                | '%'
                | '!'
                | '~'
                | '*'
                | '\''
                | '('
                | ')'
        )
        || verbatim && matches!(ch, ',' | '[' | ']')
}
