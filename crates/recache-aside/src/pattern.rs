//! Typed invalidation pattern templates.
//!
//! A template like `post:{post_id}:*` is parsed once into literal and slot
//! segments; malformed templates fail at construction, and resolution fails
//! with the missing slot's name instead of formatting against whatever
//! arguments happen to be present.

use crate::key::CallArgs;
use recache_core::{RecacheError, RecacheResult};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(String),
}

/// A parsed invalidation pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl InvalidationPattern {
    /// Parses a template. Slots are `{name}` placeholders; everything else
    /// (including `*` and `?` wildcards) passes through literally.
    pub fn parse(template: &str) -> RecacheResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => {
                                return Err(RecacheError::PatternParse(format!(
                                    "nested '{{' in template '{}'",
                                    template
                                )));
                            }
                            Some(c) => name.push(c),
                            None => {
                                return Err(RecacheError::PatternParse(format!(
                                    "unterminated '{{' in template '{}'",
                                    template
                                )));
                            }
                        }
                    }
                    if name.is_empty() {
                        return Err(RecacheError::PatternParse(format!(
                            "empty slot in template '{}'",
                            template
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(name));
                }
                '}' => {
                    return Err(RecacheError::PatternParse(format!(
                        "unmatched '}}' in template '{}'",
                        template
                    )));
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// The original template string.
    #[must_use]
    pub fn as_template(&self) -> &str {
        &self.raw
    }

    /// Slot names, in template order.
    #[must_use]
    pub fn slots(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Slot(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Whether every slot appears in `params`, so a call site can validate
    /// a template against a producer's declared parameter list up front.
    #[must_use]
    pub fn slots_satisfiable_by(&self, params: &[&str]) -> bool {
        self.slots().iter().all(|slot| params.contains(slot))
    }

    /// Resolves the template against a call's keyword arguments.
    pub fn resolve(&self, args: &CallArgs) -> RecacheResult<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Slot(name) => {
                    let value = args.get_kwarg(name).ok_or_else(|| {
                        RecacheError::PlaceholderResolution { slot: name.clone() }
                    })?;
                    out.push_str(&render(value));
                }
            }
        }
        Ok(out)
    }
}

/// Renders a JSON value into a key segment: strings without quotes,
/// everything else in its JSON form.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_only_template() {
        let pattern = InvalidationPattern::parse("user:*").unwrap();
        assert!(pattern.slots().is_empty());
        assert_eq!(pattern.resolve(&CallArgs::new()).unwrap(), "user:*");
    }

    #[test]
    fn test_resolve_with_slot() {
        let pattern = InvalidationPattern::parse("post:{post_id}:*").unwrap();
        assert_eq!(pattern.slots(), vec!["post_id"]);

        let args = CallArgs::new().kwarg("post_id", &42).unwrap();
        assert_eq!(pattern.resolve(&args).unwrap(), "post:42:*");
    }

    #[test]
    fn test_string_slot_renders_unquoted() {
        let pattern = InvalidationPattern::parse("user:{name}:*").unwrap();
        let args = CallArgs::new().kwarg("name", &"alice").unwrap();
        assert_eq!(pattern.resolve(&args).unwrap(), "user:alice:*");
    }

    #[test]
    fn test_missing_slot_fails() {
        let pattern = InvalidationPattern::parse("post:{post_id}:*").unwrap();
        let args = CallArgs::new().kwarg("user_id", &1).unwrap();
        let err = pattern.resolve(&args).unwrap_err();
        match err {
            RecacheError::PlaceholderResolution { slot } => assert_eq!(slot, "post_id"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_templates_fail_at_parse() {
        assert!(InvalidationPattern::parse("post:{post_id:*").is_err());
        assert!(InvalidationPattern::parse("post:}x").is_err());
        assert!(InvalidationPattern::parse("post:{}:*").is_err());
        assert!(InvalidationPattern::parse("post:{a{b}}:*").is_err());
    }

    #[test]
    fn test_slots_satisfiable_by() {
        let pattern = InvalidationPattern::parse("{ns}:post:{post_id}:*").unwrap();
        assert!(pattern.slots_satisfiable_by(&["ns", "post_id", "extra"]));
        assert!(!pattern.slots_satisfiable_by(&["post_id"]));
    }

    #[test]
    fn test_multiple_slots() {
        let pattern = InvalidationPattern::parse("{a}:{b}").unwrap();
        let args = CallArgs::new()
            .kwarg("a", &"x")
            .unwrap()
            .kwarg("b", &7)
            .unwrap();
        assert_eq!(pattern.resolve(&args).unwrap(), "x:7");
    }
}
