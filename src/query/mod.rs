//! Query processing module
//!
//! The engine consumes nested field-selection trees. This module holds the
//! AST for those trees and a Pest parser for their text form:
//!
//! ```rust
//! use ontoql::query::parse_operation;
//!
//! let operation = parse_operation("{ Organization { _id employee { name } } }").unwrap();
//! assert!(operation.field_named("Organization").is_some());
//! ```

pub mod ast;
pub mod parser;

// Re-export main types
pub use ast::{Argument, ArgumentValue, Field, InlineFragment, Selection, SelectionSet};
pub use parser::{parse_operation, ParseError, ParseResult};
