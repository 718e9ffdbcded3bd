use crate::emitter::Emitter;
use crate::event::Event;
use crate::node::Node;
use crate::serializer::Serializer;
use crate::{Break, Encoding, SerializerError, TagDirective, VersionDirective};

/// Output configuration for the write path.
#[derive(Debug, Clone)]
pub struct DumperOptions {
    /// Force explicit tags, double-quoted scalars and flow collections.
    pub canonical: bool,
    /// Indentation increment, 2..=9.
    pub indent: i64,
    /// Preferred maximum line length.
    pub width: i64,
    /// Allow unescaped non-ASCII output.
    pub unicode: bool,
    /// The line break to write.
    pub line_break: Break,
    /// Always write `---`.
    pub explicit_start: bool,
    /// Always write `...`.
    pub explicit_end: bool,
    /// Emit a `%YAML` directive on every document.
    pub version_directive: Option<VersionDirective>,
    /// Extra `%TAG` directives for every document.
    pub tag_directives: Vec<TagDirective>,
    /// The output encoding; UTF-8 or UTF-16.
    pub encoding: Encoding,
}

impl Default for DumperOptions {
    fn default() -> Self {
        Self {
            canonical: false,
            indent: 2,
            width: 80,
            unicode: false,
            line_break: Break::Unix,
            explicit_start: false,
            explicit_end: false,
            version_directive: None,
            tag_directives: Vec::new(),
            encoding: Encoding::Utf8,
        }
    }
}

/// The write-path facade: documents in, bytes out.
pub struct Dumper {
    options: DumperOptions,
    serializer: Serializer,
}

impl Default for Dumper {
    fn default() -> Self {
        Self::new()
    }
}

impl Dumper {
    pub fn new() -> Self {
        Self::with_options(DumperOptions::default())
    }

    pub fn with_options(options: DumperOptions) -> Self {
        let mut serializer = Serializer::new();
        serializer.set_version_directive(options.version_directive);
        serializer.set_tag_directives(options.tag_directives.clone());
        Self {
            options,
            serializer,
        }
    }

    /// The serializer, for registering representers and resolver rules.
    pub fn serializer_mut(&mut self) -> &mut Serializer {
        &mut self.serializer
    }

    /// Dump every node as one document into `output`.
    pub fn dump_all(
        &self,
        documents: &[Node],
        output: &mut dyn std::io::Write,
    ) -> Result<(), SerializerError> {
        let mut emitter = Emitter::new(output);
        emitter.set_canonical(self.options.canonical);
        emitter.set_indent(self.options.indent);
        emitter.set_width(self.options.width);
        emitter.set_unicode(self.options.unicode);
        emitter.set_break(self.options.line_break);
        emitter.set_explicit_start(self.options.explicit_start);
        emitter.set_explicit_end(self.options.explicit_end);
        emitter.set_encoding(self.options.encoding);

        emitter.emit(Event::stream_start(self.options.encoding))?;
        for document in documents {
            self.serializer.serialize(document, &mut emitter)?;
        }
        emitter.emit(Event::stream_end())?;
        Ok(())
    }

    /// Dump into a string; the encoding option is ignored in favor of UTF-8.
    pub fn dump_to_string(&self, documents: &[Node]) -> Result<String, SerializerError> {
        let mut output = Vec::new();
        let mut emitter = Emitter::new(&mut output);
        emitter.set_canonical(self.options.canonical);
        emitter.set_indent(self.options.indent);
        emitter.set_width(self.options.width);
        emitter.set_unicode(self.options.unicode);
        emitter.set_break(self.options.line_break);
        emitter.set_explicit_start(self.options.explicit_start);
        emitter.set_explicit_end(self.options.explicit_end);
        emitter.set_encoding(Encoding::Utf8);

        emitter.emit(Event::stream_start(Encoding::Utf8))?;
        for document in documents {
            self.serializer.serialize(document, &mut emitter)?;
        }
        emitter.emit(Event::stream_end())?;
        drop(emitter);
        Ok(String::from_utf8(output).expect("UTF-8 output"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeValue;
    use pretty_assertions::assert_eq;

    fn mapping(pairs: Vec<(&str, NodeValue)>) -> Node {
        Node::new(NodeValue::Mapping(
            pairs
                .into_iter()
                .map(|(key, value)| {
                    (
                        Node::new(NodeValue::String(String::from(key))),
                        Node::new(value),
                    )
                })
                .collect(),
        ))
    }

    #[test]
    fn dumps_with_default_options() {
        let dumper = Dumper::new();
        let node = mapping(vec![("a", NodeValue::Int(1)), ("b", NodeValue::Bool(true))]);
        assert_eq!(dumper.dump_to_string(&[node]).unwrap(), "a: 1\nb: true\n");
    }

    #[test]
    fn multiple_documents_get_separators() {
        let dumper = Dumper::new();
        let output = dumper
            .dump_to_string(&[
                Node::new(NodeValue::Int(1)),
                Node::new(NodeValue::Int(2)),
            ])
            .unwrap();
        assert_eq!(output, "1\n--- 2\n");
    }

    #[test]
    fn explicit_markers_apply_to_every_document() {
        let dumper = Dumper::with_options(DumperOptions {
            explicit_start: true,
            explicit_end: true,
            ..DumperOptions::default()
        });
        let output = dumper
            .dump_to_string(&[
                Node::new(NodeValue::Int(1)),
                Node::new(NodeValue::Int(2)),
            ])
            .unwrap();
        assert_eq!(output, "--- 1\n...\n--- 2\n...\n");
    }

    #[test]
    fn canonical_output() {
        let dumper = Dumper::with_options(DumperOptions {
            canonical: true,
            ..DumperOptions::default()
        });
        let node = mapping(vec![("a", NodeValue::Int(1))]);
        let output = dumper.dump_to_string(&[node]).unwrap();
        assert!(output.starts_with("---"));
        assert!(output.contains("\"a\""));
        assert!(output.contains("!!int"));
    }

    #[test]
    fn utf16_output_roundtrips_through_the_loader() {
        let dumper = Dumper::with_options(DumperOptions {
            encoding: Encoding::Utf16Le,
            ..DumperOptions::default()
        });
        let node = mapping(vec![("n", NodeValue::Int(1))]);
        let mut output = Vec::new();
        dumper.dump_all(&[node], &mut output).unwrap();
        assert!(output.starts_with(b"\xFF\xFE"));
        let mut loader = crate::loader::Loader::from_bytes(&output).unwrap();
        let document = loader.next_document().unwrap().unwrap();
        assert_eq!(document.get_key("n").and_then(Node::as_int), Some(1));
    }
}
