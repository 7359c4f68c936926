//! Selection-tree parser using Pest

use crate::query::ast::*;
use indexmap::IndexMap;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "query/selection.pest"]
struct SelectionParser;

/// Parser errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// Pest parsing error
    #[error("Parse error: {0}")]
    PestError(#[from] Box<pest::error::Error<Rule>>),

    /// Semantic error
    #[error("Semantic error: {0}")]
    SemanticError(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a query document into its top-level selection set
pub fn parse_operation(input: &str) -> ParseResult<SelectionSet> {
    let mut pairs = SelectionParser::parse(Rule::document, input).map_err(Box::new)?;
    let document = pairs
        .next()
        .ok_or_else(|| ParseError::SemanticError("Empty document".to_string()))?;

    for inner in document.into_inner() {
        if inner.as_rule() == Rule::operation {
            for part in inner.into_inner() {
                if part.as_rule() == Rule::selection_set {
                    return parse_selection_set(part);
                }
            }
        }
    }

    Err(ParseError::SemanticError("Missing selection set".to_string()))
}

fn parse_selection_set(pair: Pair<Rule>) -> ParseResult<SelectionSet> {
    let mut selections = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::field => selections.push(Selection::Field(parse_field(inner)?)),
            Rule::inline_fragment => {
                selections.push(Selection::InlineFragment(parse_inline_fragment(inner)?))
            }
            _ => {}
        }
    }
    Ok(SelectionSet::new(selections))
}

fn parse_field(pair: Pair<Rule>) -> ParseResult<Field> {
    let mut field = Field::default();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::alias => field.alias = Some(inner.as_str().trim().to_string()),
            Rule::name => field.name = Some(inner.as_str().to_string()),
            Rule::arguments => {
                for arg in inner.into_inner() {
                    field.arguments.push(parse_argument(arg)?);
                }
            }
            Rule::selection_set => field.selection_set = Some(parse_selection_set(inner)?),
            _ => {}
        }
    }
    Ok(field)
}

fn parse_inline_fragment(pair: Pair<Rule>) -> ParseResult<InlineFragment> {
    let mut type_condition = None;
    let mut selection_set = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::type_condition => {
                type_condition = inner
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::name)
                    .map(|p| p.as_str().to_string());
            }
            Rule::selection_set => selection_set = Some(parse_selection_set(inner)?),
            _ => {}
        }
    }
    Ok(InlineFragment {
        type_condition,
        selection_set: selection_set
            .ok_or_else(|| ParseError::SemanticError("Inline fragment without selection set".to_string()))?,
    })
}

fn parse_argument(pair: Pair<Rule>) -> ParseResult<Argument> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .ok_or_else(|| ParseError::SemanticError("Missing argument name".to_string()))?
        .as_str()
        .to_string();
    let value = inner
        .next()
        .ok_or_else(|| ParseError::SemanticError(format!("Missing value for argument {}", name)))?;
    Ok(Argument {
        name,
        value: parse_value(value)?,
    })
}

fn parse_value(pair: Pair<Rule>) -> ParseResult<ArgumentValue> {
    match pair.as_rule() {
        Rule::null => Ok(ArgumentValue::Null),
        Rule::boolean => Ok(ArgumentValue::Boolean(pair.as_str() == "true")),
        Rule::int => pair
            .as_str()
            .parse::<i64>()
            .map(ArgumentValue::Int)
            .map_err(|e| ParseError::SemanticError(format!("Invalid int {}: {}", pair.as_str(), e))),
        Rule::float => pair
            .as_str()
            .parse::<f64>()
            .map(ArgumentValue::Float)
            .map_err(|e| ParseError::SemanticError(format!("Invalid float {}: {}", pair.as_str(), e))),
        Rule::string => {
            let raw = pair
                .into_inner()
                .next()
                .map(|p| p.as_str())
                .unwrap_or_default();
            Ok(ArgumentValue::String(unescape(raw)))
        }
        Rule::list => pair
            .into_inner()
            .map(parse_value)
            .collect::<ParseResult<Vec<_>>>()
            .map(ArgumentValue::List),
        Rule::object => {
            let mut map = IndexMap::new();
            for entry in pair.into_inner() {
                let mut parts = entry.into_inner();
                let key = parts
                    .next()
                    .ok_or_else(|| ParseError::SemanticError("Missing object key".to_string()))?
                    .as_str()
                    .to_string();
                let value = parts
                    .next()
                    .ok_or_else(|| ParseError::SemanticError(format!("Missing value for key {}", key)))?;
                map.insert(key, parse_value(value)?);
            }
            Ok(ArgumentValue::Object(map))
        }
        Rule::enum_value => Ok(ArgumentValue::Enum(pair.as_str().to_string())),
        other => Err(ParseError::SemanticError(format!("Unexpected value {:?}", other))),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
