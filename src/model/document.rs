use anyhow::Result;
use serde_json::Value;

/// Tolerant view over an API descriptor document. Field probes on the wrong
/// shape return `Missing` instead of failing, so comparison passes can walk
/// arbitrary documents without error paths.
#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    /// Entries keep the order they appear in the source document.
    Object(Vec<(String, DocNode)>),
    Array(Vec<DocNode>),
    String(String),
    Number(f64),
    Bool(bool),
    Null,
    Missing,
}

const MISSING: DocNode = DocNode::Missing;

impl DocNode {
    pub fn parse(text: &str) -> Result<DocNode> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(value))
    }

    fn from_value(value: Value) -> DocNode {
        match value {
            Value::Object(map) => DocNode::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_value(v)))
                    .collect(),
            ),
            Value::Array(items) => {
                DocNode::Array(items.into_iter().map(Self::from_value).collect())
            }
            Value::String(s) => DocNode::String(s),
            Value::Number(n) => DocNode::Number(n.as_f64().unwrap_or(0.0)),
            Value::Bool(b) => DocNode::Bool(b),
            Value::Null => DocNode::Null,
        }
    }

    /// Look up a field on an object node. Non-objects and absent keys both
    /// yield `Missing`.
    pub fn field(&self, name: &str) -> &DocNode {
        match self {
            DocNode::Object(entries) => entries
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value)
                .unwrap_or(&MISSING),
            _ => &MISSING,
        }
    }

    pub fn has(&self, name: &str) -> bool {
        !self.field(name).is_missing()
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, DocNode::Missing)
    }

    /// Object entries in document order; empty for every other node kind.
    pub fn entries(&self) -> &[(String, DocNode)] {
        match self {
            DocNode::Object(entries) => entries,
            _ => &[],
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocNode::String(s) => Some(s),
            _ => None,
        }
    }

    /// String content of the node, or `""` for anything that is not a string.
    /// Used for the `type` discriminator comparison.
    pub fn text_or_empty(&self) -> &str {
        self.as_str().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_probe_returns_missing_for_absent_keys() {
        let doc = DocNode::parse(r#"{"paths": {"/widgets": {}}}"#).unwrap();
        assert!(doc.has("paths"));
        assert!(doc.field("paths").has("/widgets"));
        assert!(doc.field("components").is_missing());
        assert!(doc.field("components").field("schemas").is_missing());
    }

    #[test]
    fn field_probe_on_non_object_is_missing() {
        let doc = DocNode::parse(r#"{"type": "string"}"#).unwrap();
        assert!(doc.field("type").field("anything").is_missing());
        assert_eq!(doc.field("type").text_or_empty(), "string");
        assert_eq!(doc.field("absent").text_or_empty(), "");
    }

    #[test]
    fn entries_preserve_document_order() {
        let doc = DocNode::parse(r#"{"b": 1, "a": 2, "c": 3}"#).unwrap();
        let keys: Vec<&str> = doc.entries().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn parse_rejects_malformed_documents() {
        assert!(DocNode::parse("not json").is_err());
    }
}
