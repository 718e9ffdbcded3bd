use regex::Regex;

use crate::node::NodeKind;
use crate::{
    ResolverError, BOOL_TAG, DEFAULT_MAPPING_TAG, DEFAULT_SCALAR_TAG, DEFAULT_SEQUENCE_TAG,
    FLOAT_TAG, INT_TAG, MERGE_TAG, NULL_TAG, TIMESTAMP_TAG, VALUE_TAG,
};

/// One implicit-resolution rule: a tag guarded by the set of characters a
/// matching value may start with, plus the full pattern.
struct ImplicitRule {
    tag: String,
    first_chars: String,
    /// Whether an empty scalar satisfies this rule.
    matches_empty: bool,
    pattern: Regex,
}

/// Resolves the tag of a node from its kind, explicit tag and textual form.
///
/// Rules are scanned in registration order; the defaults are installed first,
/// so rules added through [`Resolver::add_rule`] cannot shadow YAML 1.1
/// semantics. The fallback for unmatched plain scalars is `!!str`.
pub struct Resolver {
    rules: Vec<ImplicitRule>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// A resolver loaded with the YAML 1.1 rule table.
    pub fn new() -> Self {
        let mut resolver = Self { rules: Vec::new() };
        resolver.add_defaults().expect("default patterns compile");
        resolver
    }

    fn add_defaults(&mut self) -> Result<(), ResolverError> {
        self.add_rule(
            BOOL_TAG,
            "^(?:yes|Yes|YES|no|No|NO\
             |true|True|TRUE|false|False|FALSE\
             |on|On|ON|off|Off|OFF)$",
            "yYnNtTfFoO",
        )?;
        self.add_rule(
            FLOAT_TAG,
            "^(?:[-+]?(?:[0-9][0-9_]*)\\.[0-9_]*(?:[eE][-+][0-9]+)?\
             |\\.[0-9_]+(?:[eE][-+][0-9]+)?\
             |[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\\.[0-9_]*\
             |[-+]?\\.(?:inf|Inf|INF)\
             |\\.(?:nan|NaN|NAN))$",
            "-+0123456789.",
        )?;
        self.add_rule(
            INT_TAG,
            "^(?:[-+]?0b[0-1_]+\
             |[-+]?0[0-7_]+\
             |[-+]?(?:0|[1-9][0-9_]*)\
             |[-+]?0x[0-9a-fA-F_]+\
             |[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+)$",
            "-+0123456789",
        )?;
        self.add_rule(MERGE_TAG, "^(?:<<)$", "<")?;
        self.add_rule(NULL_TAG, "^(?:~|null|Null|NULL|)$", "~nN")?;
        self.rules.last_mut().unwrap().matches_empty = true;
        self.add_rule(
            TIMESTAMP_TAG,
            "^(?:[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]\
             |[0-9][0-9][0-9][0-9]-[0-9][0-9]?-[0-9][0-9]?\
             (?:[Tt]|[ \\t]+)[0-9][0-9]?\
             :[0-9][0-9]:[0-9][0-9](?:\\.[0-9]*)?\
             (?:[ \\t]*(?:Z|[-+][0-9][0-9]?(?::[0-9][0-9])?))?)$",
            "0123456789",
        )?;
        self.add_rule(VALUE_TAG, "^(?:=)$", "=")?;
        Ok(())
    }

    /// Register an implicit rule after the defaults. `first_chars` is the set
    /// of characters a matching value may start with; it prunes the scan, the
    /// pattern decides.
    pub fn add_rule(
        &mut self,
        tag: &str,
        pattern: &str,
        first_chars: &str,
    ) -> Result<(), ResolverError> {
        let pattern = Regex::new(pattern)?;
        self.rules.push(ImplicitRule {
            tag: String::from(tag),
            first_chars: String::from(first_chars),
            matches_empty: false,
            pattern,
        });
        Ok(())
    }

    /// Resolve the tag for a node.
    ///
    /// An explicit tag other than the non-specific `!` wins outright.
    /// Collections and non-implicit scalars take the default tag for their
    /// kind; everything else runs the rule table over `value`.
    pub fn resolve(
        &self,
        kind: NodeKind,
        explicit_tag: Option<&str>,
        value: &str,
        implicit: bool,
    ) -> String {
        if let Some(tag) = explicit_tag {
            if tag != "!" {
                return String::from(tag);
            }
        }
        match kind {
            NodeKind::Sequence => return String::from(DEFAULT_SEQUENCE_TAG),
            NodeKind::Mapping => return String::from(DEFAULT_MAPPING_TAG),
            NodeKind::Scalar => {}
        }
        if !implicit {
            return String::from(DEFAULT_SCALAR_TAG);
        }
        for rule in &self.rules {
            let candidate = match value.chars().next() {
                Some(first) => rule.first_chars.contains(first),
                None => rule.matches_empty,
            };
            if candidate && rule.pattern.is_match(value) {
                return rule.tag.clone();
            }
        }
        String::from(DEFAULT_SCALAR_TAG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::STR_TAG;

    fn resolve_scalar(resolver: &Resolver, value: &str) -> String {
        resolver.resolve(NodeKind::Scalar, None, value, true)
    }

    #[test]
    fn resolves_core_scalar_forms() {
        let resolver = Resolver::new();
        for (value, tag) in [
            ("true", BOOL_TAG),
            ("no", BOOL_TAG),
            ("Off", BOOL_TAG),
            ("3", INT_TAG),
            ("-19", INT_TAG),
            ("0x1F", INT_TAG),
            ("0b1010_0001", INT_TAG),
            ("0755", INT_TAG),
            ("190:20:30", INT_TAG),
            ("1.5", FLOAT_TAG),
            ("-2e+5", STR_TAG),
            ("-2.0e+5", FLOAT_TAG),
            (".inf", FLOAT_TAG),
            ("-.inf", FLOAT_TAG),
            (".nan", FLOAT_TAG),
            ("190:20:30.15", FLOAT_TAG),
            ("~", NULL_TAG),
            ("null", NULL_TAG),
            ("", NULL_TAG),
            ("<<", MERGE_TAG),
            ("=", VALUE_TAG),
            ("2001-12-14", TIMESTAMP_TAG),
            ("2001-12-14 21:59:43.10 -5", TIMESTAMP_TAG),
            ("2001-12-14T21:59:43Z", TIMESTAMP_TAG),
            ("hello", STR_TAG),
            ("12 monkeys", STR_TAG),
        ] {
            assert_eq!(resolve_scalar(&resolver, value), tag, "value {value:?}");
        }
    }

    #[test]
    fn explicit_tag_wins() {
        let resolver = Resolver::new();
        assert_eq!(
            resolver.resolve(NodeKind::Scalar, Some("!mine"), "3", true),
            "!mine"
        );
    }

    #[test]
    fn non_specific_tag_falls_through_to_rules() {
        let resolver = Resolver::new();
        assert_eq!(resolver.resolve(NodeKind::Scalar, Some("!"), "3", true), INT_TAG);
    }

    #[test]
    fn quoted_scalars_are_strings() {
        let resolver = Resolver::new();
        assert_eq!(resolver.resolve(NodeKind::Scalar, None, "3", false), STR_TAG);
    }

    #[test]
    fn collections_take_kind_defaults() {
        let resolver = Resolver::new();
        assert_eq!(
            resolver.resolve(NodeKind::Sequence, None, "", true),
            DEFAULT_SEQUENCE_TAG
        );
        assert_eq!(
            resolver.resolve(NodeKind::Mapping, None, "", true),
            DEFAULT_MAPPING_TAG
        );
    }

    #[test]
    fn user_rules_register_after_defaults() {
        let mut resolver = Resolver::new();
        // A rule that would swallow integers must lose the tie.
        resolver.add_rule("!version", "^[0-9]+$", "0123456789").unwrap();
        assert_eq!(resolve_scalar(&resolver, "3"), INT_TAG);
        resolver
            .add_rule("!semver", "^[0-9]+\\.[0-9]+\\.[0-9]+$", "0123456789")
            .unwrap();
        assert_eq!(resolve_scalar(&resolver, "1.2.3"), "!semver");
    }
}
