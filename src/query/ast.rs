//! Selection-tree AST
//!
//! A query is an ordered sequence of selections; each is either a named field
//! (optionally with arguments and a nested selection set) or an inline
//! fragment. This is the shape the protocol executor hands to the engine.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered list of selections inside `{ ... }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionSet {
    pub selections: Vec<Selection>,
}

impl SelectionSet {
    pub fn new(selections: Vec<Selection>) -> Self {
        Self { selections }
    }

    /// First field selection with the given field name
    pub fn field_named(&self, name: &str) -> Option<&Field> {
        self.selections.iter().find_map(|selection| match selection {
            Selection::Field(field) if field.name.as_deref() == Some(name) => Some(field),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

/// One entry of a selection set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Selection {
    /// `name(args) { ... }`
    Field(Field),
    /// `... on Type { ... }`
    InlineFragment(InlineFragment),
}

/// Field selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Response alias (`alias: name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Field name; `None` only for degenerate selections built outside the parser
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_set: Option<SelectionSet>,
}

impl Field {
    /// Leaf field with no arguments
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Field with a nested selection set
    pub fn nested(name: impl Into<String>, selections: Vec<Selection>) -> Self {
        Self {
            name: Some(name.into()),
            selection_set: Some(SelectionSet::new(selections)),
            ..Self::default()
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: ArgumentValue) -> Self {
        self.arguments.push(Argument {
            name: name.into(),
            value,
        });
        self
    }

    /// Key this field is reported under in a response
    pub fn response_key(&self) -> Option<&str> {
        self.alias.as_deref().or(self.name.as_deref())
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.arguments
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }

    pub fn first_argument(&self) -> Option<&ArgumentValue> {
        self.arguments.first().map(|arg| &arg.value)
    }

    /// Arguments as a name → value map, first occurrence wins
    pub fn argument_map(&self) -> IndexMap<String, ArgumentValue> {
        let mut map = IndexMap::new();
        for arg in &self.arguments {
            map.entry(arg.name.clone()).or_insert_with(|| arg.value.clone());
        }
        map
    }
}

impl From<Field> for Selection {
    fn from(field: Field) -> Self {
        Selection::Field(field)
    }
}

/// Inline fragment selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_condition: Option<String>,
    pub selection_set: SelectionSet,
}

impl From<InlineFragment> for Selection {
    fn from(fragment: InlineFragment) -> Self {
        Selection::InlineFragment(fragment)
    }
}

/// `name: value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub value: ArgumentValue,
}

/// Argument value literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ArgumentValue>),
    Object(IndexMap<String, ArgumentValue>),
    /// Bare enum token; never produced by deserialization
    #[serde(skip_deserializing)]
    Enum(String),
}

impl ArgumentValue {
    pub fn string(s: impl Into<String>) -> Self {
        ArgumentValue::String(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgumentValue::String(s) | ArgumentValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgumentValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgumentValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// A scalar string, or the first element of a list of scalars
    pub fn first_str(&self) -> Option<&str> {
        match self {
            ArgumentValue::List(values) => values.first().and_then(ArgumentValue::as_str),
            other => other.as_str(),
        }
    }

    /// All string elements of a list; a single string yields itself
    pub fn string_list(&self) -> Vec<String> {
        match self {
            ArgumentValue::List(values) => values
                .iter()
                .filter_map(ArgumentValue::as_str)
                .map(str::to_string)
                .collect(),
            other => other.as_str().map(|s| vec![s.to_string()]).unwrap_or_default(),
        }
    }
}
