//! Compiler for a subset of OGC CQL.
//!
//! Supported:
//! - comparisons `name = 'x'`, `<>`, `!=`, `<`, `<=`, `>`, `>=`
//! - `IS [NOT] NULL`, `[NOT] LIKE '%pat_'`, `[NOT] IN (...)`, `[NOT] BETWEEN a AND b`
//! - `AND`, `OR`, `NOT`, parentheses, `INCLUDE`, `EXCLUDE`
//! - `BBOX(attr, minx, miny, maxx, maxy[, 'crs'])`
//! - `INTERSECTS|DISJOINT|WITHIN|CONTAINS|EQUALS(attr, <wkt>)`
//! - `DWITHIN(attr, <wkt>, distance, units)`
//!
//! Attribute names resolve against the flow's properties, then its source
//! records. The geometry attribute name of spatial functions is not checked;
//! they always test the flow's geometry.

use crate::models::Flow;
use geo::{Geometry, Rect};
use geopipes_core::error::{GeopipesError, Result};
use geopipes_core::models::PropertyValue;
use geopipes_geo::models::envelope_from_bounds;
use geopipes_geo::parse_wkt;
use geopipes_geo::spatial::{envelope_intersects, evaluate_spatial_predicate, SpatialPredicate};
use std::cmp::Ordering;

/// Deepest allowed chain of `NOT`s and parentheses
const MAX_NESTING: usize = 64;

const WKT_TYPES: &[&str] = &[
    "POINT",
    "LINESTRING",
    "POLYGON",
    "MULTIPOINT",
    "MULTILINESTRING",
    "MULTIPOLYGON",
    "GEOMETRYCOLLECTION",
];

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Str(String),
    Number(PropertyValue),
    Wkt(String),
    LParen,
    RParen,
    Comma,
    Compare(CompareOp),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::LtEq => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::GtEq => ordering != Ordering::Less,
        }
    }
}

/// Compiled filter expression
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Include,
    Exclude,
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare { name: String, op: CompareOp, value: PropertyValue },
    IsNull { name: String },
    Like { name: String, pattern: String },
    In { name: String, values: Vec<PropertyValue> },
    Between { name: String, low: PropertyValue, high: PropertyValue },
    BBox(Rect<f64>),
    Spatial { predicate: SpatialPredicate, geometry: Geometry<f64> },
}

/// A CQL expression compiled into a predicate over flows
#[derive(Debug, Clone, PartialEq)]
pub struct CqlFilter {
    expression: String,
    root: Expr,
}

impl CqlFilter {
    /// Compile `expression`, failing with [`GeopipesError::CqlSyntax`]
    pub fn compile(expression: &str) -> Result<Self> {
        let tokens = Lexer::new(expression).tokenize()?;
        let mut parser = Parser { expression, tokens, pos: 0, depth: 0 };
        let root = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            return Err(syntax_error(expression, token.position, "unexpected trailing input"));
        }
        Ok(Self { expression: expression.to_string(), root })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn matches(&self, flow: &Flow) -> bool {
        evaluate(&self.root, flow)
    }
}

fn syntax_error(expression: &str, position: usize, reason: impl Into<String>) -> GeopipesError {
    GeopipesError::CqlSyntax {
        expression: expression.to_string(),
        position,
        reason: reason.into(),
    }
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, position: usize, reason: impl Into<String>) -> GeopipesError {
        syntax_error(self.text, position, reason)
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek_char() {
            let start = self.pos;
            let kind = match c {
                c if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                '(' => {
                    self.bump();
                    TokenKind::LParen
                }
                ')' => {
                    self.bump();
                    TokenKind::RParen
                }
                ',' => {
                    self.bump();
                    TokenKind::Comma
                }
                '=' => {
                    self.bump();
                    TokenKind::Compare(CompareOp::Eq)
                }
                '<' | '>' | '!' => self.compare_op()?,
                '\'' => self.string()?,
                '"' => self.quoted_ident()?,
                c if c.is_ascii_digit() || c == '-' || c == '.' => self.number()?,
                c if c.is_alphabetic() || c == '_' => self.word()?,
                other => return Err(self.error(start, format!("unexpected character '{}'", other))),
            };
            tokens.push(Token { kind, position: start });
        }
        Ok(tokens)
    }

    fn compare_op(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        let first = self.bump();
        let second = self.peek_char();
        let op = match (first, second) {
            (Some('<'), Some('=')) => CompareOp::LtEq,
            (Some('<'), Some('>')) => CompareOp::NotEq,
            (Some('>'), Some('=')) => CompareOp::GtEq,
            (Some('!'), Some('=')) => CompareOp::NotEq,
            (Some('<'), _) => return Ok(TokenKind::Compare(CompareOp::Lt)),
            (Some('>'), _) => return Ok(TokenKind::Compare(CompareOp::Gt)),
            _ => return Err(self.error(start, "expected '!='")),
        };
        self.bump();
        Ok(TokenKind::Compare(op))
    }

    /// Single-quoted literal; `''` escapes a quote
    fn string(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\'') if self.peek_char() == Some('\'') => {
                    self.bump();
                    value.push('\'');
                }
                Some('\'') => return Ok(TokenKind::Str(value)),
                Some(c) => value.push(c),
                None => return Err(self.error(start, "unterminated string literal")),
            }
        }
    }

    fn quoted_ident(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        self.bump();
        let mut name = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(TokenKind::Ident(name)),
                Some(c) => name.push(c),
                None => return Err(self.error(start, "unterminated quoted identifier")),
            }
        }
    }

    fn number(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        if self.peek_char() == Some('-') {
            self.bump();
        }
        while let Some(c) = self.peek_char() {
            let exponent_sign =
                (c == '-' || c == '+') && matches!(self.text[..self.pos].chars().last(), Some('e' | 'E'));
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || exponent_sign {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.text[start..self.pos];
        if let Ok(i) = text.parse::<i64>() {
            return Ok(TokenKind::Number(PropertyValue::Integer(i)));
        }
        text.parse::<f64>()
            .map(|f| TokenKind::Number(PropertyValue::Float(f)))
            .map_err(|_| self.error(start, format!("invalid number '{}'", text)))
    }

    fn word(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' || c == '.' || c == ':' {
                self.bump();
            } else {
                break;
            }
        }
        let word = &self.text[start..self.pos];
        if WKT_TYPES.contains(&word.to_ascii_uppercase().as_str()) {
            return self.wkt(start);
        }
        Ok(TokenKind::Ident(word.to_string()))
    }

    /// A WKT literal: the type keyword followed by `EMPTY` or a balanced
    /// parenthesised body
    fn wkt(&mut self, start: usize) -> Result<TokenKind> {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.bump();
        }
        if self.rest().get(..5).is_some_and(|word| word.eq_ignore_ascii_case("EMPTY")) {
            self.pos += 5;
            return Ok(TokenKind::Wkt(self.text[start..self.pos].to_string()));
        }
        if self.peek_char() != Some('(') {
            return Err(self.error(self.pos, "expected '(' or EMPTY in geometry literal"));
        }
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(TokenKind::Wkt(self.text[start..self.pos].to_string()));
                    }
                }
                _ => {}
            }
        }
        Err(self.error(start, "unbalanced parentheses in geometry literal"))
    }
}

struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn end_position(&self) -> usize {
        self.expression.len()
    }

    fn position(&self) -> usize {
        self.peek().map(|t| t.position).unwrap_or_else(|| self.end_position())
    }

    fn error(&self, reason: impl Into<String>) -> GeopipesError {
        syntax_error(self.expression, self.position(), reason)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token { kind: TokenKind::Ident(word), .. }) if word.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", keyword)))
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<()> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.error(format!("expected {}", what))),
        }
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("OR") {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.eat_keyword("AND") {
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// Run `parse` one nesting level deeper, failing past `MAX_NESTING`.
    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Result<Expr>) -> Result<Expr> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(format!("expression nests deeper than {} levels", MAX_NESTING)));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.eat_keyword("NOT") {
            let inner = self.nested(Self::parse_not)?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => return Err(self.error("unexpected end of expression")),
        };
        match token.kind {
            TokenKind::LParen => {
                self.pos += 1;
                let inner = self.nested(Self::parse_or)?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Ident(word) => {
                let upper = word.to_ascii_uppercase();
                let is_call = matches!(
                    self.tokens.get(self.pos + 1),
                    Some(Token { kind: TokenKind::LParen, .. })
                );
                match upper.as_str() {
                    "INCLUDE" => {
                        self.pos += 1;
                        Ok(Expr::Include)
                    }
                    "EXCLUDE" => {
                        self.pos += 1;
                        Ok(Expr::Exclude)
                    }
                    "BBOX" if is_call => self.parse_bbox(),
                    "DWITHIN" if is_call => self.parse_dwithin(),
                    "INTERSECTS" | "DISJOINT" | "WITHIN" | "CONTAINS" | "EQUALS" if is_call => {
                        self.parse_spatial(&upper)
                    }
                    _ => self.parse_comparison(),
                }
            }
            _ => Err(self.error("expected attribute name, function or '('")),
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let name = match self.next() {
            Some(Token { kind: TokenKind::Ident(name), .. }) => name,
            _ => return Err(self.error("expected attribute name")),
        };

        if self.eat_keyword("IS") {
            let negated = self.eat_keyword("NOT");
            self.expect_keyword("NULL")?;
            let expr = Expr::IsNull { name };
            return Ok(if negated { Expr::Not(Box::new(expr)) } else { expr });
        }

        let negated = self.eat_keyword("NOT");
        let expr = if self.eat_keyword("LIKE") {
            match self.next() {
                Some(Token { kind: TokenKind::Str(pattern), .. }) => Expr::Like { name, pattern },
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error("expected pattern string after LIKE"));
                }
            }
        } else if self.eat_keyword("IN") {
            self.expect(TokenKind::LParen, "'(' after IN")?;
            let mut values = vec![self.parse_literal()?];
            while self.peek().is_some_and(|t| t.kind == TokenKind::Comma) {
                self.pos += 1;
                values.push(self.parse_literal()?);
            }
            self.expect(TokenKind::RParen, "')'")?;
            Expr::In { name, values }
        } else if self.eat_keyword("BETWEEN") {
            let low = self.parse_literal()?;
            self.expect_keyword("AND")?;
            let high = self.parse_literal()?;
            Expr::Between { name, low, high }
        } else if negated {
            return Err(self.error("expected LIKE, IN or BETWEEN after NOT"));
        } else {
            let op = match self.peek() {
                Some(Token { kind: TokenKind::Compare(op), .. }) => *op,
                _ => return Err(self.error("expected comparison operator")),
            };
            self.pos += 1;
            let value = self.parse_literal()?;
            Expr::Compare { name, op, value }
        };
        Ok(if negated { Expr::Not(Box::new(expr)) } else { expr })
    }

    fn parse_literal(&mut self) -> Result<PropertyValue> {
        let value = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Str(s)) => PropertyValue::String(s.clone()),
            Some(TokenKind::Number(n)) => n.clone(),
            Some(TokenKind::Ident(word)) if word.eq_ignore_ascii_case("TRUE") => {
                PropertyValue::Boolean(true)
            }
            Some(TokenKind::Ident(word)) if word.eq_ignore_ascii_case("FALSE") => {
                PropertyValue::Boolean(false)
            }
            Some(TokenKind::Ident(word)) if word.eq_ignore_ascii_case("NULL") => PropertyValue::Null,
            _ => return Err(self.error("expected literal value")),
        };
        self.pos += 1;
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<f64> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Number(n)) => {
                let value = n.as_f64().unwrap_or(f64::NAN);
                self.pos += 1;
                Ok(value)
            }
            _ => Err(self.error("expected number")),
        }
    }

    fn parse_geometry(&mut self) -> Result<Geometry<f64>> {
        let position = self.position();
        match self.next() {
            Some(Token { kind: TokenKind::Wkt(text), .. }) => parse_wkt(&text)
                .map_err(|e| syntax_error(self.expression, position, format!("invalid geometry: {}", e))),
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.error("expected geometry literal"))
            }
        }
    }

    /// Skip `NAME (` and the geometry attribute argument with its comma
    fn function_prefix(&mut self) -> Result<()> {
        self.pos += 1;
        self.expect(TokenKind::LParen, "'('")?;
        match self.next() {
            Some(Token { kind: TokenKind::Ident(_), .. }) => {}
            _ => {
                self.pos = self.pos.saturating_sub(1);
                return Err(self.error("expected geometry attribute name"));
            }
        }
        self.expect(TokenKind::Comma, "','")
    }

    fn parse_bbox(&mut self) -> Result<Expr> {
        self.function_prefix()?;
        let mut bounds = [0.0; 4];
        for (i, bound) in bounds.iter_mut().enumerate() {
            if i > 0 {
                self.expect(TokenKind::Comma, "','")?;
            }
            *bound = self.parse_number()?;
        }
        // optional CRS name
        if self.peek().is_some_and(|t| t.kind == TokenKind::Comma) {
            self.pos += 1;
            match self.next() {
                Some(Token { kind: TokenKind::Str(_), .. }) => {}
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error("expected CRS string"));
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        let [min_x, min_y, max_x, max_y] = bounds;
        Ok(Expr::BBox(envelope_from_bounds(min_x, min_y, max_x, max_y)))
    }

    fn parse_spatial(&mut self, name: &str) -> Result<Expr> {
        let predicate = match name {
            "INTERSECTS" => SpatialPredicate::Intersects,
            "DISJOINT" => SpatialPredicate::Disjoint,
            "WITHIN" => SpatialPredicate::Within,
            "CONTAINS" => SpatialPredicate::Contains,
            _ => SpatialPredicate::Equals,
        };
        self.function_prefix()?;
        let geometry = self.parse_geometry()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Expr::Spatial { predicate, geometry })
    }

    fn parse_dwithin(&mut self) -> Result<Expr> {
        self.function_prefix()?;
        let geometry = self.parse_geometry()?;
        self.expect(TokenKind::Comma, "','")?;
        let distance = self.parse_number()?;
        self.expect(TokenKind::Comma, "','")?;
        // units are accepted but distances are planar
        match self.next() {
            Some(Token { kind: TokenKind::Ident(_) | TokenKind::Str(_), .. }) => {}
            _ => {
                self.pos = self.pos.saturating_sub(1);
                return Err(self.error("expected distance units"));
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Expr::Spatial { predicate: SpatialPredicate::DWithin { distance }, geometry })
    }
}

fn evaluate(expr: &Expr, flow: &Flow) -> bool {
    match expr {
        Expr::Include => true,
        Expr::Exclude => false,
        Expr::And(a, b) => evaluate(a, flow) && evaluate(b, flow),
        Expr::Or(a, b) => evaluate(a, flow) || evaluate(b, flow),
        Expr::Not(inner) => !evaluate(inner, flow),
        Expr::Compare { name, op, value } => match flow.resolve(name) {
            Some(actual) if !actual.is_null() => compare(actual, value).is_some_and(|o| op.holds(o)),
            _ => false,
        },
        Expr::IsNull { name } => flow.resolve(name).map_or(true, PropertyValue::is_null),
        Expr::Like { name, pattern } => match flow.resolve(name) {
            Some(PropertyValue::String(s)) => like(s, pattern),
            Some(other) if !other.is_null() => like(&other.to_string(), pattern),
            _ => false,
        },
        Expr::In { name, values } => flow
            .resolve(name)
            .is_some_and(|actual| values.iter().any(|v| actual.loose_eq(v))),
        Expr::Between { name, low, high } => flow.resolve(name).is_some_and(|actual| {
            compare(actual, low).is_some_and(|o| o != Ordering::Less)
                && compare(actual, high).is_some_and(|o| o != Ordering::Greater)
        }),
        Expr::BBox(window) => envelope_intersects(&flow.geometry, window),
        Expr::Spatial { predicate, geometry } => {
            evaluate_spatial_predicate(&flow.geometry, *predicate, geometry)
        }
    }
}

/// Ordering between comparable values: numbers with numbers, strings with
/// strings, booleans with booleans
fn compare(a: &PropertyValue, b: &PropertyValue) -> Option<Ordering> {
    match (a, b) {
        (PropertyValue::String(x), PropertyValue::String(y)) => Some(x.cmp(y)),
        (PropertyValue::Boolean(x), PropertyValue::Boolean(y)) => Some(x.cmp(y)),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    }
}

/// SQL LIKE: `%` matches any run, `_` any single character
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    // matched[j]: pattern[..j] matches the text prefix read so far
    let mut matched = vec![false; pattern.len() + 1];
    matched[0] = true;
    for j in 1..=pattern.len() {
        matched[j] = matched[j - 1] && pattern[j - 1] == '%';
    }
    for c in text {
        let mut next = vec![false; pattern.len() + 1];
        for j in 1..=pattern.len() {
            next[j] = match pattern[j - 1] {
                '%' => next[j - 1] || matched[j],
                '_' => matched[j - 1],
                p => matched[j - 1] && p == c,
            };
        }
        matched = next;
    }
    matched[pattern.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use geopipes_core::models::{Properties, Record, RecordId};
    use std::sync::Arc;

    fn flow(wkt: &str, props: &[(&str, PropertyValue)]) -> Flow {
        let properties: Properties =
            props.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        let record = Record::new(RecordId(1), parse_wkt(wkt).unwrap(), properties);
        Flow::from_record(Arc::new(record))
    }

    fn street() -> Flow {
        flow(
            "LINESTRING (12 56, 12.1 56.05)",
            &[("name", "Storgatan".into()), ("lanes", PropertyValue::Integer(2))],
        )
    }

    fn check(expression: &str) -> bool {
        CqlFilter::compile(expression).unwrap().matches(&street())
    }

    #[test]
    fn test_attribute_comparisons() {
        assert!(check("name = 'Storgatan'"));
        assert!(!check("name = 'Kyrkogatan'"));
        assert!(check("name <> 'Kyrkogatan'"));
        assert!(check("lanes >= 2 AND lanes < 3"));
        assert!(check("lanes = 2.0"));
        assert!(!check("lanes > 'a'"));
    }

    #[test]
    fn test_logic_and_grouping() {
        assert!(check("NOT (name = 'x') AND (lanes = 1 OR lanes = 2)"));
        assert!(check("INCLUDE"));
        assert!(!check("EXCLUDE OR name IS NULL"));
        assert!(check("address IS NULL AND name IS NOT NULL"));
    }

    #[test]
    fn test_like_in_between() {
        assert!(check("name LIKE 'Stor%'"));
        assert!(check("name LIKE '_torgata_'"));
        assert!(!check("name NOT LIKE '%gatan'"));
        assert!(check("lanes IN (1, 2, 3)"));
        assert!(check("lanes BETWEEN 1 AND 2"));
        assert!(!check("lanes NOT BETWEEN 1 AND 2"));
    }

    #[test]
    fn test_bbox() {
        assert!(check("BBOX(the_geom, 10, 40, 20, 56.0583531)"));
        assert!(check("BBOX(the_geom, 10, 40, 20, 60, 'EPSG:4326')"));
        assert!(!check("BBOX(the_geom, 0, 0, 1, 1)"));
    }

    #[test]
    fn test_spatial_functions() {
        assert!(check("INTERSECTS(geom, POLYGON ((11 55, 11 57, 13 57, 13 55, 11 55)))"));
        assert!(check("WITHIN(geom, POLYGON ((11 55, 11 57, 13 57, 13 55, 11 55)))"));
        assert!(check("DISJOINT(geom, POINT (0 0))"));
        assert!(check("DWITHIN(geom, POINT (12 55), 1.5, meters)"));
        assert!(!check("DWITHIN(geom, POINT (12 55), 0.5, meters)"));
    }

    #[test]
    fn test_syntax_errors_carry_position() {
        let err = CqlFilter::compile("name = ").unwrap_err();
        match err {
            GeopipesError::CqlSyntax { expression, position, .. } => {
                assert_eq!(expression, "name = ");
                assert_eq!(position, 7);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        for bad in [
            "name 'x'",
            "(name = 'x'",
            "BBOX(geom, 1, 2)",
            "name = 'open",
            "a = 1 b",
            "INTERSECTS(geom, POINT 1)",
            "INTERSECTS(g, POINT ééé)",
            "INTERSECTS(g, POINT é)",
        ] {
            assert!(
                matches!(CqlFilter::compile(bad), Err(GeopipesError::CqlSyntax { .. })),
                "expected syntax error for {}",
                bad
            );
        }
    }

    #[test]
    fn test_nesting_is_capped() {
        let shallow = format!("{}name = 'x'{}", "(".repeat(10), ")".repeat(10));
        assert!(CqlFilter::compile(&shallow).is_ok());
        assert!(CqlFilter::compile(&format!("{}INCLUDE", "NOT ".repeat(10))).is_ok());

        let deep_parens = format!("{}name = 'x'{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(CqlFilter::compile(&deep_parens), Err(GeopipesError::CqlSyntax { .. })));
        let deep_nots = format!("{}INCLUDE", "NOT ".repeat(10_000));
        assert!(matches!(CqlFilter::compile(&deep_nots), Err(GeopipesError::CqlSyntax { .. })));
    }

    #[test]
    fn test_like_matcher() {
        assert!(like("abc", "a%"));
        assert!(like("abc", "%c"));
        assert!(like("abc", "a_c"));
        assert!(like("", "%"));
        assert!(!like("abc", "a_"));
    }
}
