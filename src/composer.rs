use std::collections::HashMap;

use crate::constructor::{construct_scalar, ConstructorRegistry};
use crate::event::{Event, EventData};
use crate::node::{Node, NodeKind, NodeStyle, NodeValue};
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::{
    ComposerError, Mark, DEFAULT_MAPPING_TAG, DEFAULT_SEQUENCE_TAG, MERGE_TAG, OMAP_TAG,
    PAIRS_TAG,
};

/// One anchored node, or a sentinel while it is still being composed.
struct AnchorEntry {
    mark: Mark,
    node: Option<Node>,
}

/// Stitches parser events into [`Node`] trees, one document at a time.
///
/// Anchors live in a per-document map that is cleared between documents. A
/// node under composition is present in the map as a sentinel, so an alias
/// into it (a recursive alias, which YAML forbids) is caught immediately.
pub struct Composer {
    parser: Parser,
    resolver: Resolver,
    constructors: ConstructorRegistry,
    anchors: HashMap<String, AnchorEntry>,
    stream_started: bool,
    stream_ended: bool,
    documents_composed: usize,
}

impl Composer {
    pub fn new(parser: Parser) -> Self {
        Self {
            parser,
            resolver: Resolver::new(),
            constructors: ConstructorRegistry::new(),
            anchors: HashMap::new(),
            stream_started: false,
            stream_ended: false,
            documents_composed: 0,
        }
    }

    /// The resolver applied to every composed node.
    pub fn resolver_mut(&mut self) -> &mut Resolver {
        &mut self.resolver
    }

    /// The constructor hooks consulted for non-core tags.
    pub fn constructors_mut(&mut self) -> &mut ConstructorRegistry {
        &mut self.constructors
    }

    fn error<T>(problem: &'static str, mark: Mark) -> Result<T, ComposerError> {
        Err(ComposerError::Problem { problem, mark })
    }

    /// Compose the next document, or `None` once the stream ends.
    pub fn next_document(&mut self) -> Result<Option<Node>, ComposerError> {
        if self.stream_ended {
            return Ok(None);
        }
        if !self.stream_started {
            let event = self.parser.parse()?;
            debug_assert!(matches!(event.data, EventData::StreamStart { .. }));
            self.stream_started = true;
        }
        let event = self.parser.parse()?;
        match event.data {
            EventData::StreamEnd => {
                self.stream_ended = true;
                Ok(None)
            }
            EventData::DocumentStart { .. } => {
                let first = self.parser.parse()?;
                let root = self.compose_node(first)?;
                let end = self.parser.parse()?;
                debug_assert!(matches!(end.data, EventData::DocumentEnd { .. }));
                self.anchors.clear();
                self.documents_composed += 1;
                log::debug!(
                    "composed document {} (root {:?})",
                    self.documents_composed,
                    root.kind()
                );
                Ok(Some(root))
            }
            _ => unreachable!("parser emitted {:?} between documents", event.data),
        }
    }

    fn compose_node(&mut self, event: Event) -> Result<Node, ComposerError> {
        match event.data {
            EventData::Alias { ref anchor } => match self.anchors.get(anchor) {
                None => Self::error("found undefined alias", event.start_mark),
                Some(AnchorEntry { node: None, mark }) => Err(ComposerError::ProblemWithContext {
                    context: "while composing the anchored node",
                    context_mark: *mark,
                    problem: "found recursive alias",
                    mark: event.start_mark,
                }),
                Some(AnchorEntry {
                    node: Some(node), ..
                }) => Ok(node.clone()),
            },
            EventData::Scalar { .. } => self.compose_scalar(event),
            EventData::SequenceStart { .. } => self.compose_sequence(event),
            EventData::MappingStart { .. } => self.compose_mapping(event),
            _ => unreachable!("unexpected event {:?} while composing a node", event.data),
        }
    }

    /// Record an anchor as under-composition; duplicates within one document
    /// are rejected with both marks.
    fn register_anchor(
        &mut self,
        anchor: &Option<String>,
        mark: Mark,
    ) -> Result<(), ComposerError> {
        let Some(anchor) = anchor else {
            return Ok(());
        };
        if let Some(existing) = self.anchors.get(anchor) {
            return Err(ComposerError::ProblemWithContext {
                context: "found duplicate anchor; first occurrence",
                context_mark: existing.mark,
                problem: "second occurrence",
                mark,
            });
        }
        self.anchors
            .insert(anchor.clone(), AnchorEntry { mark, node: None });
        Ok(())
    }

    fn fill_anchor(&mut self, anchor: &Option<String>, node: &Node) {
        if let Some(anchor) = anchor {
            if let Some(entry) = self.anchors.get_mut(anchor) {
                entry.node = Some(node.clone());
            }
        }
    }

    fn compose_scalar(&mut self, event: Event) -> Result<Node, ComposerError> {
        let EventData::Scalar {
            anchor,
            tag,
            value,
            plain_implicit,
            style,
            ..
        } = event.data
        else {
            unreachable!()
        };
        self.register_anchor(&anchor, event.start_mark)?;
        let resolved =
            self.resolver
                .resolve(NodeKind::Scalar, tag.as_deref(), &value, plain_implicit);
        let node_value = match construct_scalar(&resolved, &value, event.start_mark)? {
            Some(node_value) => node_value,
            None => NodeValue::String(value),
        };
        let mut node = Node {
            value: node_value,
            tag: Some(resolved.clone()),
            style: NodeStyle::Scalar(style),
            start_mark: event.start_mark,
            end_mark: event.end_mark,
        };
        if let Some(hook) = self.constructors.get(NodeKind::Scalar, &resolved) {
            node.value = NodeValue::User(hook(&node)?);
        }
        self.fill_anchor(&anchor, &node);
        Ok(node)
    }

    fn compose_sequence(&mut self, event: Event) -> Result<Node, ComposerError> {
        let EventData::SequenceStart {
            anchor,
            tag,
            implicit,
            style,
        } = event.data
        else {
            unreachable!()
        };
        self.register_anchor(&anchor, event.start_mark)?;
        let resolved = self
            .resolver
            .resolve(NodeKind::Sequence, tag.as_deref(), "", implicit);

        let mut items = Vec::new();
        let end_mark;
        loop {
            let child = self.parser.parse()?;
            if let EventData::SequenceEnd = child.data {
                end_mark = child.end_mark;
                break;
            }
            items.push(self.compose_node(child)?);
        }

        if resolved == OMAP_TAG {
            Self::check_ordered_mapping(&items)?;
        }

        let mut node = Node {
            value: NodeValue::Sequence(items),
            tag: Some(resolved.clone()),
            style: NodeStyle::Sequence(style),
            start_mark: event.start_mark,
            end_mark,
        };
        if resolved != DEFAULT_SEQUENCE_TAG {
            if let Some(hook) = self.constructors.get(NodeKind::Sequence, &resolved) {
                node.value = NodeValue::User(hook(&node)?);
            }
        }
        self.fill_anchor(&anchor, &node);
        Ok(node)
    }

    fn compose_mapping(&mut self, event: Event) -> Result<Node, ComposerError> {
        let EventData::MappingStart {
            anchor,
            tag,
            implicit,
            style,
        } = event.data
        else {
            unreachable!()
        };
        self.register_anchor(&anchor, event.start_mark)?;
        let resolved = self
            .resolver
            .resolve(NodeKind::Mapping, tag.as_deref(), "", implicit);
        // `!!pairs` explicitly permits repeated keys.
        let check_duplicates = resolved != PAIRS_TAG;

        let mut pairs: Vec<(Node, Node)> = Vec::new();
        // Merge values are deferred until all explicit pairs are known;
        // explicit keys always win over merged ones.
        let mut merges: Vec<(Node, Mark)> = Vec::new();
        let end_mark;
        loop {
            let key_event = self.parser.parse()?;
            if let EventData::MappingEnd = key_event.data {
                end_mark = key_event.end_mark;
                break;
            }
            let key_mark = key_event.start_mark;
            let key = self.compose_node(key_event)?;
            let value_event = self.parser.parse()?;
            let value_mark = value_event.start_mark;
            let value = self.compose_node(value_event)?;

            if key.tag.as_deref() == Some(MERGE_TAG) {
                merges.push((value, value_mark));
                continue;
            }
            if check_duplicates {
                if let Some((first, _)) = pairs.iter().find(|(k, _)| *k == key) {
                    return Err(ComposerError::ProblemWithContext {
                        context: "found duplicate key; first occurrence",
                        context_mark: first.start_mark,
                        problem: "second occurrence",
                        mark: key_mark,
                    });
                }
            }
            pairs.push((key, value));
        }

        for (merge_value, merge_mark) in merges {
            Self::flatten_merge(&mut pairs, merge_value, merge_mark)?;
        }

        let mut node = Node {
            value: NodeValue::Mapping(pairs),
            tag: Some(resolved.clone()),
            style: NodeStyle::Mapping(style),
            start_mark: event.start_mark,
            end_mark,
        };
        if resolved != DEFAULT_MAPPING_TAG {
            if let Some(hook) = self.constructors.get(NodeKind::Mapping, &resolved) {
                node.value = NodeValue::User(hook(&node)?);
            }
        }
        self.fill_anchor(&anchor, &node);
        Ok(node)
    }

    /// An ordered mapping is a sequence of single-pair mappings with unique
    /// keys across entries.
    fn check_ordered_mapping(items: &[Node]) -> Result<(), ComposerError> {
        for (index, item) in items.iter().enumerate() {
            let Some(pairs) = item.as_mapping() else {
                return Self::error(
                    "expected a mapping of length 1 in an ordered mapping",
                    item.start_mark,
                );
            };
            if pairs.len() != 1 {
                return Self::error(
                    "expected a single mapping item in an ordered mapping",
                    item.start_mark,
                );
            }
            let key = &pairs[0].0;
            for earlier in &items[..index] {
                if earlier
                    .as_mapping()
                    .map_or(false, |p| p.len() == 1 && p[0].0 == *key)
                {
                    return Err(ComposerError::ProblemWithContext {
                        context: "found duplicate key in ordered mapping; first occurrence",
                        context_mark: earlier.start_mark,
                        problem: "second occurrence",
                        mark: item.start_mark,
                    });
                }
            }
        }
        Ok(())
    }

    /// Merge a `<<` value into `pairs`: each source key is appended only if
    /// no equal key is present, so explicit keys win and earlier sources win
    /// over later ones.
    fn flatten_merge(
        pairs: &mut Vec<(Node, Node)>,
        source: Node,
        mark: Mark,
    ) -> Result<(), ComposerError> {
        match source.value {
            NodeValue::Mapping(source_pairs) => {
                for (key, value) in source_pairs {
                    if !pairs.iter().any(|(existing, _)| *existing == key) {
                        pairs.push((key, value));
                    }
                }
                Ok(())
            }
            NodeValue::Sequence(items) => {
                for item in items {
                    if !matches!(item.value, NodeValue::Mapping(_)) {
                        return Self::error(
                            "expected a mapping for merging, but found scalar",
                            item.start_mark,
                        );
                    }
                    Self::flatten_merge(pairs, item, mark)?;
                }
                Ok(())
            }
            _ => Self::error(
                "expected a mapping or list of mappings for merging",
                mark,
            ),
        }
    }
}
