//! The search query expression language.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! or      := and ( "OR"? and )*          -- adjacency is implicit OR
//! and     := unary ( "AND" unary )*
//! unary   := "NOT" unary | primary
//! primary := "(" or ")" | field ":" value | value
//! value   := quoted phrase | bare word
//! ```
//!
//! The parser uses `nom` for token recognition with manual precedence
//! climbing. The in-memory backend evaluates the resulting tree against
//! each document's JSON projection; the Elasticsearch backend skips the
//! tree entirely and hands the raw string to `query_string`, which
//! implements the same grammar server-side.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    sequence::delimited,
};
use serde_json::Value;

use crate::error::IndexError;

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpr {
    /// The empty query; matches every document.
    MatchAll,
    /// A single term: free text when `field` is `None`, bound to one
    /// field otherwise.
    Term {
        field: Option<String>,
        value: String,
    },
    Not(Box<QueryExpr>),
    And(Box<QueryExpr>, Box<QueryExpr>),
    Or(Box<QueryExpr>, Box<QueryExpr>),
}

/// Parse a complete query string.
///
/// Returns [`IndexError::Query`] if the input cannot be parsed or has
/// trailing tokens.
pub fn parse_query(input: &str) -> Result<QueryExpr, IndexError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(QueryExpr::MatchAll);
    }
    let (rest, expr) =
        parse_or(trimmed).map_err(|e| IndexError::Query(format!("invalid query: {e}")))?;
    let rest = rest.trim();
    if !rest.is_empty() {
        return Err(IndexError::Query(format!(
            "unexpected trailing input: {rest:?}"
        )));
    }
    Ok(expr)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Characters allowed in a bare word: anything except whitespace and the
/// grammar's own punctuation.
fn is_term_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, ':' | '(' | ')' | '"')
}

/// Match an operator keyword, rejecting it when it is only a prefix of a
/// longer word (`NOTICE` is a term, not `NOT` + `ICE`).
fn keyword(kw: &'static str) -> impl Fn(&str) -> IResult<&str, &str> {
    move |input: &str| {
        let (rest, word) = tag(kw)(input)?;
        if rest.chars().next().is_some_and(is_term_char) {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Tag,
            )));
        }
        Ok((rest, word))
    }
}

fn parse_quoted(input: &str) -> IResult<&str, String> {
    let (rest, content) = delimited(char('"'), take_while(|c| c != '"'), char('"'))(input)?;
    Ok((rest, content.to_owned()))
}

fn parse_word(input: &str) -> IResult<&str, String> {
    let (rest, word) = take_while1(is_term_char)(input)?;
    Ok((rest, word.to_owned()))
}

fn parse_value(input: &str) -> IResult<&str, String> {
    alt((parse_quoted, parse_word))(input)
}

fn parse_field_term(input: &str) -> IResult<&str, QueryExpr> {
    let (rest, field) =
        take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '.')(input)?;
    let (rest, _) = char(':')(rest)?;
    let (rest, value) = parse_value(rest)?;
    Ok((
        rest,
        QueryExpr::Term {
            field: Some(field.to_owned()),
            value,
        },
    ))
}

fn parse_bare_term(input: &str) -> IResult<&str, QueryExpr> {
    let (rest, value) = parse_value(input)?;
    // Operator keywords are not terms.
    if matches!(value.as_str(), "AND" | "OR" | "NOT") {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }
    Ok((rest, QueryExpr::Term { field: None, value }))
}

fn parse_group(input: &str) -> IResult<&str, QueryExpr> {
    let (rest, _) = char('(')(input)?;
    let (rest, expr) = parse_or(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char(')')(rest)?;
    Ok((rest, expr))
}

fn parse_primary(input: &str) -> IResult<&str, QueryExpr> {
    let (input, _) = multispace0(input)?;
    alt((parse_group, parse_field_term, parse_bare_term))(input)
}

fn parse_unary(input: &str) -> IResult<&str, QueryExpr> {
    let (rest, _) = multispace0(input)?;
    if let Ok((rest, _)) = keyword("NOT")(rest) {
        let (rest, inner) = parse_unary(rest)?;
        return Ok((rest, QueryExpr::Not(Box::new(inner))));
    }
    parse_primary(rest)
}

fn parse_and(input: &str) -> IResult<&str, QueryExpr> {
    let (mut input, mut expr) = parse_unary(input)?;
    loop {
        let (rest, _) = multispace0(input)?;
        match keyword("AND")(rest) {
            Ok((rest, _)) => {
                let (rest, rhs) = parse_unary(rest)?;
                expr = QueryExpr::And(Box::new(expr), Box::new(rhs));
                input = rest;
            }
            Err(_) => break,
        }
    }
    Ok((input, expr))
}

fn parse_or(input: &str) -> IResult<&str, QueryExpr> {
    let (mut input, mut expr) = parse_and(input)?;
    loop {
        let (rest, _) = multispace0(input)?;
        // An explicit OR keyword is optional: adjacent clauses disjoin.
        let after_keyword = match keyword("OR")(rest) {
            Ok((rest, _)) => rest,
            Err(_) => rest,
        };
        match parse_and(after_keyword) {
            Ok((rest, rhs)) => {
                expr = QueryExpr::Or(Box::new(expr), Box::new(rhs));
                input = rest;
            }
            Err(_) => break,
        }
    }
    Ok((input, expr))
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Evaluate a parsed expression against a document's JSON projection.
///
/// Field terms match case-insensitive containment on the addressed
/// field (descending through arrays, so `tags.name:travel` works); free
/// text matches any scalar anywhere in the document.
#[must_use]
pub fn matches(expr: &QueryExpr, doc: &Value) -> bool {
    match expr {
        QueryExpr::MatchAll => true,
        QueryExpr::Term { field, value } => {
            let needle = value.to_lowercase();
            match field {
                Some(path) => field_values(doc, path)
                    .iter()
                    .any(|v| scalar_contains(v, &needle)),
                None => any_scalar_matches(doc, &needle),
            }
        }
        QueryExpr::Not(inner) => !matches(inner, doc),
        QueryExpr::And(lhs, rhs) => matches(lhs, doc) && matches(rhs, doc),
        QueryExpr::Or(lhs, rhs) => matches(lhs, doc) || matches(rhs, doc),
    }
}

/// Resolve a dotted path, fanning out through arrays at every step.
fn field_values<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![doc];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => {
                    if let Some(v) = map.get(segment) {
                        next.push(v);
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        if let Some(v) = item.get(segment) {
                            next.push(v);
                        }
                    }
                }
                _ => {}
            }
        }
        current = next;
    }
    // A path landing on an array matches against its elements.
    current
        .into_iter()
        .flat_map(|v| match v {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect()
}

fn scalar_contains(value: &Value, needle_lower: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle_lower),
        Value::Number(n) => n.to_string() == needle_lower,
        Value::Bool(b) => b.to_string() == needle_lower,
        _ => false,
    }
}

fn any_scalar_matches(doc: &Value, needle_lower: &str) -> bool {
    match doc {
        Value::Object(map) => map.values().any(|v| any_scalar_matches(v, needle_lower)),
        Value::Array(items) => items.iter().any(|v| any_scalar_matches(v, needle_lower)),
        other => scalar_contains(other, needle_lower),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn term(value: &str) -> QueryExpr {
        QueryExpr::Term {
            field: None,
            value: value.to_owned(),
        }
    }

    fn field_term(field: &str, value: &str) -> QueryExpr {
        QueryExpr::Term {
            field: Some(field.to_owned()),
            value: value.to_owned(),
        }
    }

    #[test]
    fn empty_query_is_match_all() {
        assert_eq!(parse_query("   ").unwrap(), QueryExpr::MatchAll);
    }

    #[test]
    fn bare_words_disjoin_implicitly() {
        let expr = parse_query("coffee beach").unwrap();
        assert_eq!(
            expr,
            QueryExpr::Or(Box::new(term("coffee")), Box::new(term("beach")))
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse_query("a OR b AND c").unwrap();
        assert_eq!(
            expr,
            QueryExpr::Or(
                Box::new(term("a")),
                Box::new(QueryExpr::And(Box::new(term("b")), Box::new(term("c")))),
            )
        );
    }

    #[test]
    fn not_binds_tightest() {
        let expr = parse_query("NOT a AND b").unwrap();
        assert_eq!(
            expr,
            QueryExpr::And(
                Box::new(QueryExpr::Not(Box::new(term("a")))),
                Box::new(term("b")),
            )
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        let expr = parse_query("(a OR b) AND c").unwrap();
        assert_eq!(
            expr,
            QueryExpr::And(
                Box::new(QueryExpr::Or(Box::new(term("a")), Box::new(term("b")))),
                Box::new(term("c")),
            )
        );
    }

    #[test]
    fn field_terms_bind_their_value() {
        let expr = parse_query("privacy:PUBLIC").unwrap();
        assert_eq!(expr, field_term("privacy", "PUBLIC"));
    }

    #[test]
    fn quoted_phrases_keep_spaces() {
        let expr = parse_query("content:\"hello world\"").unwrap();
        assert_eq!(expr, field_term("content", "hello world"));
    }

    #[test]
    fn keyword_prefix_words_are_plain_terms() {
        let expr = parse_query("NOTICE").unwrap();
        assert_eq!(expr, term("NOTICE"));
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(parse_query("a )").is_err());
        assert!(parse_query("(a").is_err());
    }

    #[test]
    fn evaluator_matches_field_through_arrays() {
        let doc = json!({
            "content": "Morning coffee",
            "tags": [{"name": "travel"}, {"name": "food"}],
        });
        assert!(matches(&parse_query("tags.name:food").unwrap(), &doc));
        assert!(!matches(&parse_query("tags.name:sports").unwrap(), &doc));
    }

    #[test]
    fn evaluator_free_text_searches_all_fields() {
        let doc = json!({"content": "Morning coffee", "location_name": "Hanoi"});
        assert!(matches(&parse_query("hanoi").unwrap(), &doc));
        assert!(matches(&parse_query("coffee").unwrap(), &doc));
        assert!(!matches(&parse_query("beach").unwrap(), &doc));
    }

    #[test]
    fn evaluator_combines_boolean_operators() {
        let doc = json!({"content": "Morning coffee", "privacy": "PUBLIC"});
        assert!(matches(
            &parse_query("coffee AND privacy:PUBLIC").unwrap(),
            &doc
        ));
        assert!(!matches(
            &parse_query("coffee AND NOT privacy:PUBLIC").unwrap(),
            &doc
        ));
        assert!(matches(
            &parse_query("beach OR privacy:PUBLIC").unwrap(),
            &doc
        ));
    }
}
