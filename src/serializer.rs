use crate::emitter::Emitter;
use crate::event::Event;
use crate::node::{Node, NodeKind, NodeStyle, NodeValue};
use crate::representer::{render_scalar, RepresenterRegistry};
use crate::resolver::Resolver;
use crate::{
    MappingStyle, ScalarStyle, SequenceStyle, SerializerError, TagDirective, VersionDirective,
    BINARY_TAG, BOOL_TAG, DEFAULT_MAPPING_TAG, DEFAULT_SEQUENCE_TAG, FLOAT_TAG, INT_TAG,
    NULL_TAG, STR_TAG, TIMESTAMP_TAG,
};

/// Scalars shorter than this are never anchored; an alias to a short scalar
/// usually takes more room than repeating it.
const SCALAR_ANCHOR_THRESHOLD: usize = 64;

/// The canonical tag for an untagged scalar value, by kind.
fn default_scalar_tag(value: &NodeValue) -> &'static str {
    match value {
        NodeValue::Null => NULL_TAG,
        NodeValue::Bool(_) => BOOL_TAG,
        NodeValue::Int(_) => INT_TAG,
        NodeValue::Float(_) => FLOAT_TAG,
        NodeValue::Bytes(_) => BINARY_TAG,
        NodeValue::Timestamp(_) => TIMESTAMP_TAG,
        NodeValue::String(_) => STR_TAG,
        NodeValue::Sequence(_) | NodeValue::Mapping(_) | NodeValue::User(_) => {
            unreachable!("default_scalar_tag on a non-scalar value")
        }
    }
}

/// One distinct node of the tree, tracked by structural equality.
struct AnchorRecord {
    node: Node,
    references: usize,
    anchor: Option<String>,
    serialized: bool,
}

/// Walks a [`Node`] tree and emits the corresponding event stream.
///
/// A pre-pass finds nodes that occur more than once and assigns them `idNNN`
/// anchors; the main pass emits the anchor at the first occurrence and an
/// alias afterwards. User values are converted through the representer
/// registry before anything is emitted.
///
/// Trees coming out of the composer cannot be cyclic (aliases are resolved
/// by value), but a hand-built cycle would make the pre-pass recurse
/// forever; serialization of such a tree is undefined.
pub struct Serializer {
    resolver: Resolver,
    representers: RepresenterRegistry,
    version_directive: Option<VersionDirective>,
    tag_directives: Vec<TagDirective>,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            resolver: Resolver::new(),
            representers: RepresenterRegistry::new(),
            version_directive: None,
            tag_directives: Vec::new(),
        }
    }

    /// The resolver used for implicit-tag detection on output.
    pub fn resolver_mut(&mut self) -> &mut Resolver {
        &mut self.resolver
    }

    /// The representers consulted for user values.
    pub fn representers_mut(&mut self) -> &mut RepresenterRegistry {
        &mut self.representers
    }

    /// Emit a `%YAML` directive on every document.
    pub fn set_version_directive(&mut self, version: Option<VersionDirective>) {
        self.version_directive = version;
    }

    /// Extra `%TAG` directives for every document.
    pub fn set_tag_directives(&mut self, tag_directives: Vec<TagDirective>) {
        self.tag_directives = tag_directives;
    }

    /// Serialize one document into the emitter. The caller is responsible
    /// for the surrounding STREAM-START and STREAM-END events.
    pub fn serialize(&self, node: &Node, emitter: &mut Emitter) -> Result<(), SerializerError> {
        let node = self.represent_tree(node)?;

        let mut records: Vec<AnchorRecord> = Vec::new();
        Self::count_references(&mut records, &node);
        let mut next_anchor_id = 0usize;
        for record in &mut records {
            if record.references > 1 {
                next_anchor_id += 1;
                record.anchor = Some(format!("id{next_anchor_id:03}"));
            }
        }

        let implicit = self.version_directive.is_none() && self.tag_directives.is_empty();
        emitter.emit(Event::document_start(
            self.version_directive,
            &self.tag_directives,
            implicit,
        ))?;
        self.emit_node(&mut records, &node, emitter)?;
        emitter.emit(Event::document_end(true))?;
        Ok(())
    }

    /// Replace every user value in the tree by its represented form.
    fn represent_tree(&self, node: &Node) -> Result<Node, SerializerError> {
        match &node.value {
            NodeValue::User(value) => {
                let mut represented = self.representers.represent(value.as_ref())?;
                if represented.tag.is_none() {
                    represented.tag = node.tag.clone();
                }
                self.represent_tree(&represented)
            }
            NodeValue::Sequence(items) => {
                let mut represented = node.clone();
                let items = items
                    .iter()
                    .map(|item| self.represent_tree(item))
                    .collect::<Result<Vec<_>, _>>()?;
                represented.value = NodeValue::Sequence(items);
                Ok(represented)
            }
            NodeValue::Mapping(pairs) => {
                let mut represented = node.clone();
                let pairs = pairs
                    .iter()
                    .map(|(key, value)| {
                        Ok((self.represent_tree(key)?, self.represent_tree(value)?))
                    })
                    .collect::<Result<Vec<_>, SerializerError>>()?;
                represented.value = NodeValue::Mapping(pairs);
                Ok(represented)
            }
            _ => Ok(node.clone()),
        }
    }

    /// Count occurrences of every anchorable node. Short scalars are not
    /// tracked at all; anchoring them usually enlarges the output.
    fn count_references(records: &mut Vec<AnchorRecord>, node: &Node) {
        if !Self::anchorable(node) {
            return;
        }
        if let Some(record) = records.iter_mut().find(|record| record.node == *node) {
            record.references += 1;
            return;
        }
        records.push(AnchorRecord {
            node: node.clone(),
            references: 1,
            anchor: None,
            serialized: false,
        });
        match &node.value {
            NodeValue::Sequence(items) => {
                for item in items {
                    Self::count_references(records, item);
                }
            }
            NodeValue::Mapping(pairs) => {
                for (key, value) in pairs {
                    Self::count_references(records, key);
                    Self::count_references(records, value);
                }
            }
            _ => {}
        }
    }

    fn anchorable(node: &Node) -> bool {
        match &node.value {
            NodeValue::Sequence(_) | NodeValue::Mapping(_) => true,
            value => render_scalar(value).len() >= SCALAR_ANCHOR_THRESHOLD,
        }
    }

    fn emit_node(
        &self,
        records: &mut [AnchorRecord],
        node: &Node,
        emitter: &mut Emitter,
    ) -> Result<(), SerializerError> {
        let index = records.iter().position(|record| record.node == *node);
        let anchor = match index {
            Some(index) => {
                let anchor = records[index].anchor.clone();
                if anchor.is_some() && records[index].serialized {
                    emitter.emit(Event::alias(anchor.as_deref().unwrap()))?;
                    return Ok(());
                }
                records[index].serialized = true;
                anchor
            }
            None => None,
        };

        match &node.value {
            NodeValue::Sequence(items) => {
                let tag = node
                    .tag
                    .clone()
                    .unwrap_or_else(|| String::from(DEFAULT_SEQUENCE_TAG));
                let implicit = tag == DEFAULT_SEQUENCE_TAG;
                let style = match node.style {
                    NodeStyle::Sequence(style) => style,
                    _ => SequenceStyle::Any,
                };
                emitter.emit(Event::sequence_start(
                    anchor.as_deref(),
                    Some(&tag),
                    implicit,
                    style,
                ))?;
                for item in items {
                    self.emit_node(records, item, emitter)?;
                }
                emitter.emit(Event::sequence_end())?;
            }
            NodeValue::Mapping(pairs) => {
                let tag = node
                    .tag
                    .clone()
                    .unwrap_or_else(|| String::from(DEFAULT_MAPPING_TAG));
                let implicit = tag == DEFAULT_MAPPING_TAG;
                let style = match node.style {
                    NodeStyle::Mapping(style) => style,
                    _ => MappingStyle::Any,
                };
                emitter.emit(Event::mapping_start(
                    anchor.as_deref(),
                    Some(&tag),
                    implicit,
                    style,
                ))?;
                for (key, value) in pairs {
                    self.emit_node(records, key, emitter)?;
                    self.emit_node(records, value, emitter)?;
                }
                emitter.emit(Event::mapping_end())?;
            }
            NodeValue::User(_) => unreachable!("user values are represented before emission"),
            value => {
                let text = render_scalar(value);
                let tag = node
                    .tag
                    .clone()
                    .unwrap_or_else(|| String::from(default_scalar_tag(value)));
                // The tag may stay implicit if the plain text re-resolves to
                // it, or if any quoted style already implies `!!str`.
                let detected = self.resolver.resolve(NodeKind::Scalar, None, &text, true);
                let plain_implicit = detected == tag;
                let quoted_implicit = tag == STR_TAG;
                let mut style = match node.style {
                    NodeStyle::Scalar(style) => style,
                    _ => ScalarStyle::Any,
                };
                if style == ScalarStyle::Any && matches!(value, NodeValue::Bytes(_)) {
                    style = ScalarStyle::Literal;
                }
                emitter.emit(Event::scalar(
                    anchor.as_deref(),
                    Some(&tag),
                    &text,
                    (plain_implicit, quoted_implicit),
                    style,
                ))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Encoding;
    use pretty_assertions::assert_eq;

    fn dump_one(node: &Node) -> String {
        let serializer = Serializer::new();
        let mut output = Vec::new();
        let mut emitter = Emitter::new(&mut output);
        emitter.emit(Event::stream_start(Encoding::Utf8)).unwrap();
        serializer.serialize(node, &mut emitter).unwrap();
        emitter.emit(Event::stream_end()).unwrap();
        String::from_utf8(output).unwrap()
    }

    fn string_node(value: &str) -> Node {
        Node::new(NodeValue::String(String::from(value)))
    }

    #[test]
    fn serializes_typed_scalars_without_tags() {
        let node = Node::new(NodeValue::Mapping(vec![
            (string_node("count"), Node::new(NodeValue::Int(3))),
            (string_node("ratio"), Node::new(NodeValue::Float(0.5))),
            (string_node("name"), string_node("widget")),
            (string_node("empty"), Node::new(NodeValue::Null)),
        ]));
        assert_eq!(
            dump_one(&node),
            "count: 3\nratio: 0.5\nname: widget\nempty: null\n"
        );
    }

    #[test]
    fn repeated_collection_gets_anchor_and_alias() {
        let shared = Node::new(NodeValue::Mapping(vec![(
            string_node("k"),
            Node::new(NodeValue::Int(1)),
        )]));
        let node = Node::new(NodeValue::Mapping(vec![
            (string_node("a"), shared.clone()),
            (string_node("b"), shared),
        ]));
        let output = dump_one(&node);
        assert_eq!(output, "a: &id001\n  k: 1\nb: *id001\n");
    }

    #[test]
    fn short_scalars_are_never_anchored() {
        let shared = string_node("x");
        let node = Node::new(NodeValue::Sequence(vec![shared.clone(), shared]));
        let output = dump_one(&node);
        assert!(!output.contains('&'));
        assert_eq!(output, "- x\n- x\n");
    }

    #[test]
    fn long_repeated_scalars_are_anchored() {
        let long = string_node(&"long ".repeat(20));
        let node = Node::new(NodeValue::Sequence(vec![long.clone(), long]));
        let output = dump_one(&node);
        assert!(output.contains("&id001"));
        assert!(output.contains("*id001"));
    }

    #[test]
    fn string_that_looks_like_int_is_disambiguated() {
        let node = string_node("3");
        let output = dump_one(&node);
        assert_eq!(output, "'3'\n");
    }

    #[test]
    fn untagged_empty_string_is_quoted() {
        let output = dump_one(&string_node(""));
        assert_eq!(output, "''\n");
    }

    #[test]
    fn bytes_serialize_as_tagged_base64() {
        let node = Node::new(NodeValue::Bytes(b"GIF89a".to_vec()));
        let output = dump_one(&node);
        assert_eq!(output, "!!binary |-\n  R0lGODlh\n");
    }

    #[test]
    fn explicit_non_core_tag_is_kept() {
        let node = string_node("x").with_tag("!myapp/widget");
        let output = dump_one(&node);
        assert_eq!(output, "!myapp/widget x\n");
    }

    #[test]
    fn version_directive_forces_explicit_document() {
        let mut serializer = Serializer::new();
        serializer.set_version_directive(Some(VersionDirective { major: 1, minor: 1 }));
        let mut output = Vec::new();
        let mut emitter = Emitter::new(&mut output);
        emitter.emit(Event::stream_start(Encoding::Utf8)).unwrap();
        serializer
            .serialize(&Node::new(NodeValue::Int(3)), &mut emitter)
            .unwrap();
        emitter.emit(Event::stream_end()).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output, "%YAML 1.1\n--- 3\n");
    }
}
