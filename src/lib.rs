//! A YAML 1.1 processor.
//!
//! The read path runs Reader → Scanner → Parser → Composer and produces a
//! [`Node`] tree; the write path runs Serializer → Emitter and turns a tree
//! back into bytes. Each stage is usable on its own: [`Scanner`] yields
//! tokens, [`Parser`] yields events, and [`Emitter`] consumes events, so
//! callers can hook in at whatever level they need.
//!
//! ```
//! let document = yawl::load_str("key: [1, 2]\n").unwrap().unwrap();
//! assert_eq!(
//!     document.get_key("key").unwrap().get(1).unwrap().as_int(),
//!     Some(2)
//! );
//! // Styles are remembered, so re-emission reproduces the input shape.
//! let dumped = yawl::dump_node(&document).unwrap();
//! assert_eq!(dumped, "key: [1, 2]\n");
//! ```

#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::struct_excessive_bools,
    clippy::too_many_lines
)]
#![deny(unsafe_code)]

mod chars;
mod composer;
mod constructor;
mod dumper;
mod emitter;
mod error;
mod event;
mod loader;
mod node;
mod parser;
mod reader;
mod representer;
mod resolver;
mod scanner;
mod serializer;
mod token;

pub use crate::composer::Composer;
pub use crate::constructor::{ConstructFn, ConstructorRegistry};
pub use crate::dumper::{Dumper, DumperOptions};
pub use crate::emitter::Emitter;
pub use crate::error::{
    ComposerError, ConstructorError, EmitterError, Mark, ParserError, ReaderError, ResolverError,
    ScannerError, SerializerError, WriterError,
};
pub use crate::event::{Event, EventData};
pub use crate::loader::Loader;
pub use crate::node::{Node, NodeKind, NodeStyle, NodeValue, UserValue};
pub use crate::parser::Parser;
pub use crate::reader::Reader;
pub use crate::representer::{RepresentFn, RepresenterRegistry};
pub use crate::resolver::Resolver;
pub use crate::scanner::Scanner;
pub use crate::serializer::Serializer;
pub use crate::token::{Token, TokenData};

/// The tag `!!null` with the only possible value: `null`.
pub const NULL_TAG: &str = "tag:yaml.org,2002:null";
/// The tag `!!bool` with the values: `true` and `false`.
pub const BOOL_TAG: &str = "tag:yaml.org,2002:bool";
/// The tag `!!str` for string values.
pub const STR_TAG: &str = "tag:yaml.org,2002:str";
/// The tag `!!int` for integer values.
pub const INT_TAG: &str = "tag:yaml.org,2002:int";
/// The tag `!!float` for float values.
pub const FLOAT_TAG: &str = "tag:yaml.org,2002:float";
/// The tag `!!timestamp` for date and time values.
pub const TIMESTAMP_TAG: &str = "tag:yaml.org,2002:timestamp";
/// The tag `!!binary` for base64-encoded byte strings.
pub const BINARY_TAG: &str = "tag:yaml.org,2002:binary";
/// The tag `!!merge` for the merge key `<<`.
pub const MERGE_TAG: &str = "tag:yaml.org,2002:merge";
/// The tag `!!value` for the default key `=`.
pub const VALUE_TAG: &str = "tag:yaml.org,2002:value";

/// The tag `!!seq` is used to denote sequences.
pub const SEQ_TAG: &str = "tag:yaml.org,2002:seq";
/// The tag `!!map` is used to denote mappings.
pub const MAP_TAG: &str = "tag:yaml.org,2002:map";
/// The tag `!!set` for mappings with null values.
pub const SET_TAG: &str = "tag:yaml.org,2002:set";
/// The tag `!!omap` for ordered mappings.
pub const OMAP_TAG: &str = "tag:yaml.org,2002:omap";
/// The tag `!!pairs` for mappings with repeatable keys.
pub const PAIRS_TAG: &str = "tag:yaml.org,2002:pairs";

/// The default scalar tag is `!!str`.
pub const DEFAULT_SCALAR_TAG: &str = STR_TAG;
/// The default sequence tag is `!!seq`.
pub const DEFAULT_SEQUENCE_TAG: &str = SEQ_TAG;
/// The default mapping tag is `!!map`.
pub const DEFAULT_MAPPING_TAG: &str = MAP_TAG;

/// The version directive data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct VersionDirective {
    /// The major version number.
    pub major: i32,
    /// The minor version number.
    pub minor: i32,
}

/// The tag directive data: a `(handle, prefix)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct TagDirective {
    /// The tag handle.
    pub handle: String,
    /// The tag prefix.
    pub prefix: String,
}

/// The stream encoding.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum Encoding {
    /// Detect the encoding from the BOM or the first bytes.
    #[default]
    Any,
    /// The default UTF-8 encoding.
    Utf8,
    /// The UTF-16-LE encoding.
    Utf16Le,
    /// The UTF-16-BE encoding.
    Utf16Be,
    /// The UTF-32-LE encoding.
    Utf32Le,
    /// The UTF-32-BE encoding.
    Utf32Be,
}

/// Line break type.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum Break {
    /// Let the emitter choose the break type.
    #[default]
    Any,
    /// Use CR for line breaks (Mac style).
    Macintosh,
    /// Use LN for line breaks (Unix style).
    Unix,
    /// Use CR LN for line breaks (DOS style).
    Windows,
}

/// Scalar styles.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum ScalarStyle {
    /// Let the emitter choose the style.
    #[default]
    Any,
    /// The plain scalar style.
    Plain,
    /// The single-quoted scalar style.
    SingleQuoted,
    /// The double-quoted scalar style.
    DoubleQuoted,
    /// The literal scalar style.
    Literal,
    /// The folded scalar style.
    Folded,
}

/// Sequence styles.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum SequenceStyle {
    /// Let the emitter choose the style.
    #[default]
    Any,
    /// The block sequence style.
    Block,
    /// The flow sequence style.
    Flow,
}

/// Mapping styles.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum MappingStyle {
    /// Let the emitter choose the style.
    #[default]
    Any,
    /// The block mapping style.
    Block,
    /// The flow mapping style.
    Flow,
}

/// Load the first document of a UTF-8 string; `None` for an empty stream.
pub fn load_str(input: &str) -> Result<Option<Node>, ComposerError> {
    Loader::from_str(input)?.next_document()
}

/// Load every document of a UTF-8 string.
pub fn load_all_str(input: &str) -> Result<Vec<Node>, ComposerError> {
    Loader::from_str(input)?.collect()
}

/// Dump one document with the default options.
pub fn dump_node(node: &Node) -> Result<String, SerializerError> {
    Dumper::new().dump_to_string(std::slice::from_ref(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sanity() {
        const SANITY_INPUT: &str = r#"
unicode: "Sosa did fine.☺"
control: "\b1998\t1999\t2000\n"
hex esc: "\x0d\x0a is \r\n"

single: '"Howdy!" he cried.'
quoted: ' # Not a ''comment''.'
tie-fighter: '|\-*-/|'
"#;
        let document = load_str(SANITY_INPUT).unwrap().unwrap();
        assert_eq!(
            document.get_key("unicode").and_then(Node::as_str),
            Some("Sosa did fine.\u{263A}")
        );
        assert_eq!(
            document.get_key("hex esc").and_then(Node::as_str),
            Some("\r\n is \r\n")
        );
        assert_eq!(
            document.get_key("tie-fighter").and_then(Node::as_str),
            Some("|\\-*-/|")
        );
    }

    #[test]
    fn simple_mapping_loads() {
        let document = load_str("key: value\n").unwrap().unwrap();
        let pairs = document.as_mapping().unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(
            document.get_key("key").and_then(Node::as_str),
            Some("value")
        );
        assert_eq!(pairs[0].0.style, NodeStyle::Scalar(ScalarStyle::Plain));
        assert_eq!(pairs[0].1.style, NodeStyle::Scalar(ScalarStyle::Plain));
    }

    #[test]
    fn sequence_of_ints_resolves() {
        let document = load_str("- 1\n- 2\n- 3\n").unwrap().unwrap();
        let items = document.as_sequence().unwrap();
        assert_eq!(
            items.iter().map(|n| n.as_int().unwrap()).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(items.iter().all(|n| n.tag.as_deref() == Some(INT_TAG)));
    }

    #[test]
    fn recursive_alias_is_a_composer_error() {
        let err = load_str("&a [1, *a]").unwrap_err();
        assert!(err.to_string().contains("found recursive alias"));
    }

    #[test]
    fn merge_keys_flatten_before_the_user_sees_the_mapping() {
        let document = load_str("a: 1\nb: 2\n<<: {c: 3}\n").unwrap().unwrap();
        assert_eq!(document.get_key("a").and_then(Node::as_int), Some(1));
        assert_eq!(document.get_key("b").and_then(Node::as_int), Some(2));
        assert_eq!(document.get_key("c").and_then(Node::as_int), Some(3));
        assert!(document.get_key("<<").is_none());

        let err = load_str("a: 1\nb: 2\n<<: {c: 3}\nb: 4\n").unwrap_err();
        assert!(err.to_string().contains("found duplicate key"));
    }

    #[test]
    fn literal_strip_loads_exactly() {
        let document = load_str("|-\n  foo\n  bar\n").unwrap().unwrap();
        assert_eq!(document.as_str(), Some("foo\nbar"));
    }

    #[test]
    fn tagged_quoted_scalar_emits_shortest_form() {
        let document = load_str("&a !!str \"hi\"").unwrap().unwrap();
        assert_eq!(dump_node(&document).unwrap(), "\"hi\"\n");

        let canonical = Dumper::with_options(DumperOptions {
            canonical: true,
            ..DumperOptions::default()
        })
        .dump_to_string(std::slice::from_ref(&document))
        .unwrap();
        assert!(canonical.contains("!!str \"hi\""));
    }

    #[test]
    fn load_dump_load_fixpoint() {
        let inputs = [
            "key: value\n",
            "- 1\n- 2.5\n- true\n- null\n- text\n",
            "outer:\n  inner: [a, b]\n  other: {x: 1}\n",
            "|-\n  foo\n  bar\n",
            "big: 0x1F\nsmall: -7\nsci: -2.0e+5\n",
            "when: 2001-12-14 21:59:43.10 -5\n",
        ];
        for input in inputs {
            let first = load_str(input).unwrap().unwrap();
            let dumped = dump_node(&first).unwrap();
            let second = load_str(&dumped).unwrap().unwrap();
            assert_eq!(first, second, "through {dumped:?}");
        }
    }

    #[test]
    fn parse_emit_parse_preserves_structure() {
        let input = "a: [1, 2]\nb: some text\nc:\n- x\n";
        let first = load_all_str(input).unwrap();
        let dumped = Dumper::new().dump_to_string(&first).unwrap();
        let second = load_all_str(&dumped).unwrap();
        assert_eq!(first, second);
        assert_eq!(dumped, input);
    }

    #[test]
    fn merged_mapping_round_trips() {
        let input = "base: &base\n  a: 1\nleft:\n  <<: *base\n  b: 2\n";
        let document = load_str(input).unwrap().unwrap();
        let dumped = dump_node(&document).unwrap();
        let reloaded = load_str(&dumped).unwrap().unwrap();
        assert_eq!(document, reloaded);
        assert_eq!(
            reloaded
                .get_key("left")
                .and_then(|n| n.get_key("a"))
                .and_then(Node::as_int),
            Some(1)
        );
    }

    #[test]
    fn width_extremes() {
        let node = Node::new(NodeValue::String("word ".repeat(40).trim_end().into()));
        let narrow = Dumper::with_options(DumperOptions {
            width: 0,
            ..DumperOptions::default()
        })
        .dump_to_string(std::slice::from_ref(&node))
        .unwrap();
        assert!(narrow.lines().count() > 10);

        let wide = Dumper::with_options(DumperOptions {
            width: 1_000_000,
            ..DumperOptions::default()
        })
        .dump_to_string(std::slice::from_ref(&node))
        .unwrap();
        assert_eq!(wide.lines().count(), 1);

        for output in [narrow, wide] {
            let reloaded = load_str(&output).unwrap().unwrap();
            assert_eq!(reloaded, node);
        }
    }

    #[test]
    fn chomping_matrix_round_trips() {
        for (input, expected) in [
            ("|\n  foo\n", "foo\n"),
            ("|-\n  foo\n", "foo"),
            ("|+\n  foo\n\n", "foo\n\n"),
            (">\n  foo\n  bar\n", "foo bar\n"),
            (">-\n  foo\n  bar\n", "foo bar"),
            (">+\n  foo\n\n", "foo\n\n"),
        ] {
            let document = load_str(input).unwrap().unwrap();
            assert_eq!(document.as_str(), Some(expected), "input {input:?}");
            let dumped = dump_node(&document).unwrap();
            let reloaded = load_str(&dumped).unwrap().unwrap();
            assert_eq!(document, reloaded, "input {input:?} through {dumped:?}");
        }
    }

    #[test]
    fn comment_only_stream_has_no_documents() {
        assert!(load_str("# nothing here\n").unwrap().is_none());
        assert!(load_str("").unwrap().is_none());
    }

    #[test]
    fn empty_explicit_document_is_null() {
        let document = load_str("---\n").unwrap().unwrap();
        assert!(document.is_null());
    }

    #[test]
    fn binary_round_trips_as_bytes() {
        let document = load_str("data: !!binary \"R0lGODlh\"\n").unwrap().unwrap();
        let NodeValue::Bytes(ref bytes) = document.get_key("data").unwrap().value else {
            panic!("expected bytes");
        };
        assert_eq!(bytes, b"GIF89a");
        let dumped = dump_node(&document).unwrap();
        let reloaded = load_str(&dumped).unwrap().unwrap();
        assert_eq!(document, reloaded);
    }
}
