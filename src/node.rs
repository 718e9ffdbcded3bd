use std::any::Any;

use chrono::{DateTime, FixedOffset};

use crate::{MappingStyle, Mark, ScalarStyle, SequenceStyle};

/// A user-defined value carried inside a [`Node`].
///
/// Values produced by constructor hooks are type-erased behind this trait;
/// equality and hashing are delegated to it so that mapping-key comparison
/// and anchor detection keep working for user types.
pub trait UserValue: std::fmt::Debug {
    /// The concrete type, for representer lookup and downcasting.
    fn as_any(&self) -> &dyn Any;
    /// A display name for diagnostics.
    fn type_name(&self) -> &'static str;
    /// Structural equality against another user value.
    fn eq_value(&self, other: &dyn UserValue) -> bool;
    /// A hash consistent with [`UserValue::eq_value`].
    fn hash_value(&self) -> u64;
    fn clone_value(&self) -> Box<dyn UserValue>;
}

impl Clone for Box<dyn UserValue> {
    fn clone(&self) -> Self {
        self.clone_value()
    }
}

impl PartialEq for Box<dyn UserValue> {
    fn eq(&self, other: &Self) -> bool {
        self.eq_value(other.as_ref())
    }
}

/// The node kinds, as seen by the resolver and the constructor registry.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

/// The value of a node.
///
/// Scalars are typed by the constructor after tag resolution; collections own
/// their children. Mappings keep their pairs in document order.
#[derive(Debug, Clone)]
pub enum NodeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<FixedOffset>),
    Sequence(Vec<Node>),
    Mapping(Vec<(Node, Node)>),
    User(Box<dyn UserValue>),
}

impl PartialEq for NodeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NodeValue::Null, NodeValue::Null) => true,
            (NodeValue::Bool(a), NodeValue::Bool(b)) => a == b,
            (NodeValue::Int(a), NodeValue::Int(b)) => a == b,
            // NaN compares equal to itself so that key comparison and anchor
            // detection stay reflexive.
            (NodeValue::Float(a), NodeValue::Float(b)) => {
                a == b || a.is_nan() && b.is_nan()
            }
            (NodeValue::String(a), NodeValue::String(b)) => a == b,
            (NodeValue::Bytes(a), NodeValue::Bytes(b)) => a == b,
            (NodeValue::Timestamp(a), NodeValue::Timestamp(b)) => a == b,
            (NodeValue::Sequence(a), NodeValue::Sequence(b)) => a == b,
            (NodeValue::Mapping(a), NodeValue::Mapping(b)) => a == b,
            (NodeValue::User(a), NodeValue::User(b)) => a.eq_value(b.as_ref()),
            _ => false,
        }
    }
}

/// The style a node was read with, remembered so that re-emission can
/// reproduce the input shape.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum NodeStyle {
    Scalar(ScalarStyle),
    Sequence(SequenceStyle),
    Mapping(MappingStyle),
}

/// A node of the document tree.
///
/// A node owns its children and its strings; once composed, the tree does not
/// depend on the source buffer. Equality compares value and tag, ignoring
/// styles and marks.
#[derive(Debug, Clone)]
pub struct Node {
    /// The node value.
    pub value: NodeValue,
    /// The explicit tag, if one was given or resolution produced a
    /// non-default one.
    pub tag: Option<String>,
    /// The style the node had in the input, or requests for output.
    pub style: NodeStyle,
    /// The beginning of the node.
    pub start_mark: Mark,
    /// The end of the node.
    pub end_mark: Mark,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.tag == other.tag
    }
}

impl From<NodeValue> for Node {
    fn from(value: NodeValue) -> Self {
        Node::new(value)
    }
}

impl Node {
    pub fn new(value: NodeValue) -> Self {
        let style = match &value {
            NodeValue::Sequence(_) => NodeStyle::Sequence(SequenceStyle::Any),
            NodeValue::Mapping(_) => NodeStyle::Mapping(MappingStyle::Any),
            _ => NodeStyle::Scalar(ScalarStyle::Any),
        };
        Self {
            value,
            tag: None,
            style,
            start_mark: Mark::default(),
            end_mark: Mark::default(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn kind(&self) -> NodeKind {
        match &self.value {
            NodeValue::Sequence(_) => NodeKind::Sequence,
            NodeValue::Mapping(_) => NodeKind::Mapping,
            _ => NodeKind::Scalar,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, NodeValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            NodeValue::Bool(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            NodeValue::Int(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.value {
            NodeValue::Float(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            NodeValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.value {
            NodeValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(Node, Node)]> {
        match &self.value {
            NodeValue::Mapping(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// The sequence element at `index`, if this is a sequence.
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.as_sequence()?.get(index)
    }

    /// The value for a string key, if this is a mapping.
    pub fn get_key(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Append an element to a sequence node.
    ///
    /// # Panics
    /// Panics if the node is not a sequence.
    pub fn push(&mut self, node: Node) {
        match &mut self.value {
            NodeValue::Sequence(items) => items.push(node),
            _ => panic!("push on a non-sequence node"),
        }
    }

    /// Insert or replace a mapping entry, comparing keys structurally.
    ///
    /// # Panics
    /// Panics if the node is not a mapping.
    pub fn insert(&mut self, key: Node, value: Node) {
        match &mut self.value {
            NodeValue::Mapping(pairs) => {
                if let Some(pair) = pairs.iter_mut().find(|(k, _)| *k == key) {
                    pair.1 = value;
                } else {
                    pairs.push((key, value));
                }
            }
            _ => panic!("insert on a non-mapping node"),
        }
    }

    /// Remove a mapping entry by key; returns the removed value.
    ///
    /// # Panics
    /// Panics if the node is not a mapping.
    pub fn remove(&mut self, key: &Node) -> Option<Node> {
        match &mut self.value {
            NodeValue::Mapping(pairs) => {
                let index = pairs.iter().position(|(k, _)| k == key)?;
                Some(pairs.remove(index).1)
            }
            _ => panic!("remove on a non-mapping node"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_node(value: &str) -> Node {
        Node::new(NodeValue::String(String::from(value)))
    }

    #[test]
    fn equality_ignores_styles_and_marks() {
        let mut a = string_node("x");
        a.style = NodeStyle::Scalar(ScalarStyle::DoubleQuoted);
        a.start_mark = Mark {
            index: 9,
            line: 3,
            column: 1,
        };
        let b = string_node("x");
        assert_eq!(a, b);
    }

    #[test]
    fn equality_respects_tags() {
        let a = string_node("x").with_tag("!mine");
        let b = string_node("x");
        assert_ne!(a, b);
    }

    #[test]
    fn nan_keys_compare_equal() {
        let a = Node::new(NodeValue::Float(f64::NAN));
        let b = Node::new(NodeValue::Float(f64::NAN));
        assert_eq!(a, b);
    }

    #[test]
    fn nested_collection_equality() {
        let inner = Node::new(NodeValue::Sequence(vec![
            Node::new(NodeValue::Int(1)),
            Node::new(NodeValue::Int(2)),
        ]));
        let a = Node::new(NodeValue::Mapping(vec![(string_node("k"), inner.clone())]));
        let b = Node::new(NodeValue::Mapping(vec![(string_node("k"), inner)]));
        assert_eq!(a, b);
    }

    #[test]
    fn mapping_operations() {
        let mut mapping = Node::new(NodeValue::Mapping(vec![]));
        mapping.insert(string_node("a"), Node::new(NodeValue::Int(1)));
        mapping.insert(string_node("a"), Node::new(NodeValue::Int(2)));
        assert_eq!(mapping.as_mapping().unwrap().len(), 1);
        assert_eq!(mapping.get_key("a").and_then(Node::as_int), Some(2));
        assert!(mapping.remove(&string_node("a")).is_some());
        assert!(mapping.as_mapping().unwrap().is_empty());
    }

    #[test]
    fn sequence_operations() {
        let mut sequence = Node::new(NodeValue::Sequence(vec![]));
        sequence.push(Node::new(NodeValue::Int(7)));
        assert_eq!(sequence.get(0).and_then(Node::as_int), Some(7));
        assert_eq!(sequence.kind(), NodeKind::Sequence);
    }
}
