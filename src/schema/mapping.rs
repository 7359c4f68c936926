//! Ontology URI ↔ field name mapping
//!
//! The ontology compiler emits a JSON-LD style `@context` (name → URI) and
//! its inverse `@revContext` (URI → name). Both are immutable once loaded and
//! shared read-only by every query against the schema.

use crate::rdf::namespace::fallback_iri;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{SchemaError, SchemaResult};

/// Context value that marks a field as a reverse (back-edge) lookup
pub const REVERSE_KEYWORD: &str = "@reverse";

/// Outcome of resolving a field name to its predicate IRI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldIri {
    /// Found in `@context`
    Mapped(String),
    /// Not in `@context`; synthesized in the default namespace
    Fallback(String),
}

impl FieldIri {
    pub fn iri(&self) -> &str {
        match self {
            FieldIri::Mapped(iri) | FieldIri::Fallback(iri) => iri,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FieldIri::Fallback(_))
    }

    pub fn into_iri(self) -> String {
        match self {
            FieldIri::Mapped(iri) | FieldIri::Fallback(iri) => iri,
        }
    }
}

/// Bidirectional name ↔ URI dictionary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMapping {
    /// name -> URI
    #[serde(rename = "@context")]
    context: IndexMap<String, String>,

    /// URI -> name
    #[serde(rename = "@revContext", default)]
    rev_context: IndexMap<String, String>,
}

impl SchemaMapping {
    /// Build a mapping from a forward context, deriving the reverse context.
    ///
    /// When two names share a URI the first one wins in `@revContext`.
    pub fn from_context<I, K, V>(context: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let context: IndexMap<String, String> = context
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let mut mapping = Self {
            context,
            rev_context: IndexMap::new(),
        };
        mapping.derive_rev_context();
        mapping
    }

    /// Parse the compiler's JSON output. A missing `@revContext` is derived.
    pub fn from_json_str(json: &str) -> SchemaResult<Self> {
        let mut mapping: SchemaMapping = serde_json::from_str(json)?;
        if mapping.rev_context.is_empty() {
            mapping.derive_rev_context();
        }
        if mapping.context.is_empty() {
            return Err(SchemaError::Invalid("empty @context".to_string()));
        }
        Ok(mapping)
    }

    fn derive_rev_context(&mut self) {
        for (name, uri) in &self.context {
            if uri == REVERSE_KEYWORD {
                continue;
            }
            self.rev_context
                .entry(uri.clone())
                .or_insert_with(|| name.clone());
        }
    }

    /// URI mapped to `name`
    pub fn uri_for(&self, name: &str) -> Option<&str> {
        self.context.get(name).map(String::as_str)
    }

    /// Name mapped to `uri`
    pub fn name_for(&self, uri: &str) -> Option<&str> {
        self.rev_context.get(uri).map(String::as_str)
    }

    /// Predicate IRI for a field, falling back to `namespace` + name
    pub fn field_iri(&self, name: &str, namespace: &str) -> FieldIri {
        match self.uri_for(name) {
            Some(uri) => FieldIri::Mapped(uri.to_string()),
            None => FieldIri::Fallback(fallback_iri(namespace, name)),
        }
    }

    /// The forward context, in declaration order
    pub fn context(&self) -> &IndexMap<String, String> {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_context_derives_reverse() {
        let mapping = SchemaMapping::from_context([
            ("Organization", "http://example.com/Organization"),
            ("employee", "http://example.com/employee"),
            ("_reverse", "@reverse"),
        ]);
        assert_eq!(mapping.uri_for("employee"), Some("http://example.com/employee"));
        assert_eq!(mapping.name_for("http://example.com/Organization"), Some("Organization"));
        assert_eq!(mapping.name_for("@reverse"), None);
    }

    #[test]
    fn test_field_iri_fallback() {
        let mapping = SchemaMapping::from_context([("name", "http://example.com/name")]);
        assert_eq!(
            mapping.field_iri("name", "http://schema.org/"),
            FieldIri::Mapped("http://example.com/name".to_string())
        );
        let gap = mapping.field_iri("nickname", "http://schema.org/");
        assert!(gap.is_fallback());
        assert_eq!(gap.iri(), "http://schema.org/nickname");
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "@context": {"Person": "http://example.com/Person", "age": "http://example.com/age"},
            "@revContext": {"http://example.com/Person": "Person"}
        }"#;
        let mapping = SchemaMapping::from_json_str(json).unwrap();
        assert_eq!(mapping.name_for("http://example.com/Person"), Some("Person"));
        // explicit @revContext is taken as-is
        assert_eq!(mapping.name_for("http://example.com/age"), None);

        let derived = SchemaMapping::from_json_str(r#"{"@context": {"age": "http://example.com/age"}}"#).unwrap();
        assert_eq!(derived.name_for("http://example.com/age"), Some("age"));
    }

    #[test]
    fn test_empty_context_rejected() {
        assert!(SchemaMapping::from_json_str(r#"{"@context": {}}"#).is_err());
        assert!(SchemaMapping::from_json_str("not json").is_err());
    }
}
