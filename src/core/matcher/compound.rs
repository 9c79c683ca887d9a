//! Compound filter expressions.
//!
//! Supported terms:
//!
//! | term            | matches when                                      |
//! |-----------------|---------------------------------------------------|
//! | `web*`          | the minion id matches the glob                    |
//! | `G@role:web*`   | grain `role` matches the glob (`a:b:glob` nests)  |
//! | `P@os:(Deb\|Ub)` | grain `os` matches the regex                      |
//! | `L@a,b,c`       | the minion id is in the list                      |
//! | `E@web\d+`      | the minion id matches the regex                   |
//!
//! Terms combine with `and`, `or`, `not` and parentheses. `not` binds
//! tightest, then `and`, then `or`.

use std::collections::HashMap;

use globset::Glob;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::HostMatcher;
use crate::core::types::MinionId;
use crate::error::MatchError;

/// Grain data of one minion.
pub type Grains = serde_json::Map<String, Value>;

/// Parsed compound expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Glob(String),
    Grain { path: Vec<String>, pattern: String },
    GrainRegex { path: Vec<String>, pattern: String },
    List(Vec<String>),
    Regex(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parse a compound expression.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::Syntax` for empty expressions, unbalanced
    /// parentheses, dangling operators and unknown term prefixes.
    pub fn parse(expr: &str) -> Result<Expr, MatchError> {
        let tokens = tokenize(expr);
        let mut parser = Parser {
            expr,
            tokens: &tokens,
            pos: 0,
        };
        let parsed = parser.or_expr()?;
        if let Some(extra) = parser.peek() {
            return Err(parser.error(format!("unexpected '{}'", extra)));
        }
        Ok(parsed)
    }

    /// Evaluate against a minion id and its grains.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::Glob` or `MatchError::Regex` if a pattern is invalid.
    pub fn eval(&self, minion_id: &str, grains: &Grains) -> Result<bool, MatchError> {
        Ok(match self {
            Expr::Glob(pattern) => glob_match(pattern, minion_id)?,
            Expr::Grain { path, pattern } => match lookup(grains, path) {
                Some(value) => any_scalar(value, |s| glob_match(pattern, s))?,
                None => false,
            },
            Expr::GrainRegex { path, pattern } => match lookup(grains, path) {
                Some(value) => {
                    let re = anchored(pattern)?;
                    any_scalar(value, |s| Ok(re.is_match(s)))?
                }
                None => false,
            },
            Expr::List(ids) => ids.iter().any(|id| id == minion_id),
            Expr::Regex(pattern) => anchored(pattern)?.is_match(minion_id),
            Expr::Not(inner) => !inner.eval(minion_id, grains)?,
            Expr::And(a, b) => a.eval(minion_id, grains)? && b.eval(minion_id, grains)?,
            Expr::Or(a, b) => a.eval(minion_id, grains)? || b.eval(minion_id, grains)?,
        })
    }
}

/// Compound matcher backed by a grain cache.
///
/// Minions without cached grains match on their id only.
#[derive(Debug, Clone, Default)]
pub struct CompoundMatcher {
    grains: HashMap<MinionId, Grains>,
}

impl CompoundMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache the grains of a minion.
    pub fn with_grains(mut self, minion_id: &str, grains: Grains) -> Self {
        self.grains.insert(minion_id.to_string(), grains);
        self
    }
}

impl HostMatcher for CompoundMatcher {
    fn is_member(&self, minion_id: &str, filter: &str) -> Result<bool, MatchError> {
        let empty = Grains::new();
        let grains = self.grains.get(minion_id).unwrap_or(&empty);
        let matched = Expr::parse(filter)?.eval(minion_id, grains)?;
        debug!(minion = minion_id, filter, matched, "compound match");
        Ok(matched)
    }
}

/// Split on whitespace and detach parentheses, including a `not(` prefix.
fn tokenize(expr: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in expr.split_whitespace() {
        let mut rest = word;
        loop {
            if let Some(stripped) = rest.strip_prefix('(') {
                tokens.push("(".to_string());
                rest = stripped;
            } else if rest.starts_with("not(") {
                tokens.push("not".to_string());
                rest = &rest[3..];
            } else {
                break;
            }
        }
        let mut closing = 0;
        while let Some(stripped) = rest.strip_suffix(')') {
            // keep parentheses that belong to a regex term
            if stripped.matches('(').count() > stripped.matches(')').count() {
                break;
            }
            closing += 1;
            rest = stripped;
        }
        if !rest.is_empty() {
            tokens.push(rest.to_string());
        }
        tokens.extend(std::iter::repeat(")".to_string()).take(closing));
    }
    tokens
}

struct Parser<'a> {
    expr: &'a str,
    tokens: &'a [String],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn next(&mut self) -> Option<&'a str> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, reason: String) -> MatchError {
        MatchError::Syntax {
            expr: self.expr.to_string(),
            reason,
        }
    }

    fn or_expr(&mut self) -> Result<Expr, MatchError> {
        let mut left = self.and_expr()?;
        while self.peek() == Some("or") {
            self.pos += 1;
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, MatchError> {
        let mut left = self.unary()?;
        while self.peek() == Some("and") {
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, MatchError> {
        match self.next() {
            None => Err(self.error("unexpected end of expression".to_string())),
            Some("not") => Ok(Expr::Not(Box::new(self.unary()?))),
            Some("(") => {
                let inner = self.or_expr()?;
                match self.next() {
                    Some(")") => Ok(inner),
                    _ => Err(self.error("unbalanced parentheses".to_string())),
                }
            }
            Some(op @ ("and" | "or" | ")")) => Err(self.error(format!("unexpected '{}'", op))),
            Some(term) => self.term(term),
        }
    }

    fn term(&self, term: &str) -> Result<Expr, MatchError> {
        let Some((engine, body)) = term.split_once('@').filter(|(e, _)| e.len() == 1) else {
            return Ok(Expr::Glob(term.to_string()));
        };

        match engine {
            "G" | "P" => {
                let (path, pattern) = body
                    .rsplit_once(':')
                    .ok_or_else(|| self.error(format!("'{}' needs key:pattern", term)))?;
                let path = path.split(':').map(str::to_string).collect();
                let pattern = pattern.to_string();
                Ok(if engine == "G" {
                    Expr::Grain { path, pattern }
                } else {
                    Expr::GrainRegex { path, pattern }
                })
            }
            "L" => Ok(Expr::List(
                body.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            "E" => Ok(Expr::Regex(body.to_string())),
            other => Err(self.error(format!("unsupported match type '{}@'", other))),
        }
    }
}

fn glob_match(pattern: &str, candidate: &str) -> Result<bool, MatchError> {
    Ok(Glob::new(pattern)?.compile_matcher().is_match(candidate))
}

fn anchored(pattern: &str) -> Result<Regex, MatchError> {
    Ok(Regex::new(&format!("^(?:{})", pattern))?)
}

fn lookup<'g>(grains: &'g Grains, path: &[String]) -> Option<&'g Value> {
    let (first, rest) = path.split_first()?;
    let mut value = grains.get(first)?;
    for key in rest {
        value = value.as_object()?.get(key)?;
    }
    Some(value)
}

/// Test a grain value; lists match when any element does.
fn any_scalar<F>(value: &Value, mut test: F) -> Result<bool, MatchError>
where
    F: FnMut(&str) -> Result<bool, MatchError>,
{
    match value {
        Value::String(s) => test(s),
        Value::Number(n) => test(&n.to_string()),
        Value::Bool(b) => test(&b.to_string()),
        Value::Array(items) => {
            for item in items {
                let hit = match item {
                    Value::String(s) => test(s)?,
                    Value::Number(n) => test(&n.to_string())?,
                    Value::Bool(b) => test(&b.to_string())?,
                    _ => false,
                };
                if hit {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Value::Null | Value::Object(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grains() -> Grains {
        json!({
            "role": "web",
            "roles": ["web", "cache"],
            "os": "Ubuntu",
            "ec2": {"tags": {"env": "prod"}},
            "cpus": 8
        })
        .as_object()
        .unwrap()
        .clone()
    }

    fn matches(expr: &str, minion: &str) -> bool {
        Expr::parse(expr).unwrap().eval(minion, &grains()).unwrap()
    }

    #[test]
    fn test_glob() {
        assert!(matches("*", "web01"));
        assert!(matches("web*", "web01"));
        assert!(!matches("db*", "web01"));
    }

    #[test]
    fn test_grains() {
        assert!(matches("G@role:web", "web01"));
        assert!(matches("G@roles:cache", "web01"));
        assert!(matches("G@ec2:tags:env:prod", "web01"));
        assert!(matches("G@cpus:8", "web01"));
        assert!(!matches("G@role:db", "web01"));
        assert!(!matches("G@missing:x", "web01"));
        assert!(matches("P@os:(Debian|Ubuntu)", "web01"));
    }

    #[test]
    fn test_list_and_regex() {
        assert!(matches("L@db01,web01", "web01"));
        assert!(!matches("L@db01,web02", "web01"));
        assert!(matches(r"E@web\d+", "web01"));
        assert!(!matches(r"E@\d+", "web01"));
    }

    #[test]
    fn test_boolean_operators() {
        assert!(matches("G@role:web and web*", "web01"));
        assert!(!matches("G@role:web and not web*", "web01"));
        assert!(matches("db* or web*", "web01"));
        // and binds tighter than or
        assert!(matches("web* or db* and G@role:db", "web01"));
        assert!(!matches("(web* or db*) and G@role:db", "web01"));
        assert!(matches("not not web01", "web01"));
    }

    #[test]
    fn test_not_without_space() {
        assert_eq!(
            Expr::parse("not(web*)").unwrap(),
            Expr::Not(Box::new(Expr::Glob("web*".to_string())))
        );
        assert!(!matches("not(web*)", "web01"));
        assert!(matches("G@role:web and not(db* or L@web02)", "web01"));
        assert!(matches("(not(db*))", "web01"));
    }

    #[test]
    fn test_regex_parentheses_stay_in_term() {
        assert_eq!(
            Expr::parse("(P@os:(Debian|Ubuntu))").unwrap(),
            Expr::GrainRegex {
                path: vec!["os".to_string()],
                pattern: "(Debian|Ubuntu)".to_string()
            }
        );
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["", "and web*", "web* or", "(web*", "web*)", "X@foo", "G@role"] {
            assert!(
                matches!(Expr::parse(bad), Err(MatchError::Syntax { .. })),
                "expected syntax error for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_matcher_uses_cached_grains() {
        let matcher = CompoundMatcher::new().with_grains("web01", grains());
        assert!(matcher.is_member("web01", "G@role:web").unwrap());
        assert!(!matcher.is_member("web02", "G@role:web").unwrap());
        assert!(matcher.is_member("web02", "web*").unwrap());
        assert!(matcher.is_member("web01", "E@(").is_err());
    }
}
