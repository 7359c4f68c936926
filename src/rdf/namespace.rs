//! Well-known vocabulary IRIs
//!
//! Only the handful of IRIs the resolution layer itself needs: `rdf:type`,
//! the inferred-type predicate written by the reasoning step of the data
//! loader, the XSD datatypes used when documents are converted to quads, and
//! the namespace used to synthesize predicates for unmapped field names.

/// `rdf:type`
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Predicate carrying inferred (superclass-closed) types of a subject
pub const INFERRED_TYPE: &str = "http://staple-api.org/datamodel/type";

/// Default namespace for field names missing from the schema context
pub const DEFAULT_NAMESPACE: &str = "http://schema.org/";

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// Synthesize an IRI for `local` inside `namespace`.
///
/// Namespaces ending in `/` or `#` are concatenated as-is, anything else gets
/// a `/` separator.
pub fn fallback_iri(namespace: &str, local: &str) -> String {
    if namespace.ends_with('/') || namespace.ends_with('#') {
        format!("{}{}", namespace, local)
    } else {
        format!("{}/{}", namespace, local)
    }
}

/// Type predicate for a lookup: `rdf:type`, or the inferred-type predicate
pub fn type_predicate(inferred: bool) -> &'static str {
    if inferred {
        INFERRED_TYPE
    } else {
        RDF_TYPE
    }
}
