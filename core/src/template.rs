//! RFC 6570 URI templates.
//!
//! Supports every operator (`+ # . / ; ? &`), the prefix (`:N`) and explode
//! (`*`) modifiers, and scalar, list and associative values. The colon form
//! `:name` is accepted as shorthand for `{name}`.
//!
//! Values are taken from a JSON parameter map; a missing key and
//! `Value::Null` are both undefined and expand to nothing.

use std::collections::BTreeSet;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::params::Params;

/// Everything except RFC 3986 unreserved characters.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Everything except unreserved and reserved characters. `%` stays in the
/// set; valid triplets are copied through by `encode_reserved`.
const RESERVED: &AsciiSet = &UNRESERVED
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

pub(crate) fn encode_unreserved(s: &str) -> String {
    utf8_percent_encode(s, UNRESERVED).to_string()
}

pub(crate) fn encode_reserved(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            out.extend(utf8_percent_encode(&s[start..i], RESERVED));
            out.push_str(&s[i..i + 3]);
            i += 3;
            start = i;
        } else {
            i += 1;
        }
    }
    out.extend(utf8_percent_encode(&s[start..], RESERVED));
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Simple,
    Reserved,
    Fragment,
    Label,
    Path,
    PathParam,
    Query,
    QueryContinuation,
}

impl Operator {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Reserved),
            '#' => Some(Operator::Fragment),
            '.' => Some(Operator::Label),
            '/' => Some(Operator::Path),
            ';' => Some(Operator::PathParam),
            '?' => Some(Operator::Query),
            '&' => Some(Operator::QueryContinuation),
            _ => None,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Operator::Simple | Operator::Reserved => "",
            Operator::Fragment => "#",
            Operator::Label => ".",
            Operator::Path => "/",
            Operator::PathParam => ";",
            Operator::Query => "?",
            Operator::QueryContinuation => "&",
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Operator::Simple | Operator::Reserved | Operator::Fragment => ",",
            Operator::Label => ".",
            Operator::Path => "/",
            Operator::PathParam => ";",
            Operator::Query | Operator::QueryContinuation => "&",
        }
    }

    /// Operators that emit `name=value` pairs.
    fn is_named(self) -> bool {
        matches!(
            self,
            Operator::PathParam | Operator::Query | Operator::QueryContinuation
        )
    }

    fn encode(self, s: &str) -> String {
        match self {
            Operator::Reserved | Operator::Fragment => encode_reserved(s),
            _ => encode_unreserved(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    None,
    Prefix(usize),
    Explode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct VarSpec {
    name: String,
    modifier: Modifier,
}

impl VarSpec {
    fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_suffix('*') {
            return Self {
                name: name.to_string(),
                modifier: Modifier::Explode,
            };
        }
        if let Some((name, len)) = raw.split_once(':') {
            if let Ok(len) = len.parse() {
                return Self {
                    name: name.to_string(),
                    modifier: Modifier::Prefix(len),
                };
            }
        }
        Self {
            name: raw.to_string(),
            modifier: Modifier::None,
        }
    }
}

/// One `{...}` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Expression {
    operator: Operator,
    vars: Vec<VarSpec>,
}

impl Expression {
    fn parse(body: &str) -> Self {
        let mut chars = body.chars();
        let (operator, list) = match chars.next().and_then(Operator::from_char) {
            Some(op) => (op, chars.as_str()),
            None => (Operator::Simple, body),
        };
        let vars = list
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(VarSpec::parse)
            .collect();
        Self { operator, vars }
    }

    /// Form-style query expression `{?name1,name2,...}`.
    pub(crate) fn query<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            operator: Operator::Query,
            vars: names
                .into_iter()
                .map(|name| VarSpec {
                    name: name.to_string(),
                    modifier: Modifier::None,
                })
                .collect(),
        }
    }

    pub(crate) fn expand(&self, params: &Params) -> String {
        let mut values = Vec::new();
        for var in &self.vars {
            expand_var(self.operator, var, params.get(&var.name), &mut values);
        }
        match self.operator {
            Operator::Simple | Operator::Reserved => values.join(","),
            _ if values.is_empty() => String::new(),
            op => format!("{}{}", op.prefix(), values.join(op.separator())),
        }
    }
}

/// String form of a single value; `None` when undefined.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}

fn named(op: Operator, name: &str, encoded: String) -> String {
    if op.is_named() {
        format!("{}={encoded}", encode_unreserved(name))
    } else {
        encoded
    }
}

fn expand_var(op: Operator, var: &VarSpec, value: Option<&Value>, out: &mut Vec<String>) {
    let name = var.name.as_str();
    match value {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) if s.is_empty() => match op {
            Operator::PathParam => out.push(encode_unreserved(name)),
            Operator::Query | Operator::QueryContinuation => {
                out.push(format!("{}=", encode_unreserved(name)))
            }
            _ => out.push(String::new()),
        },
        Some(Value::Array(items)) => {
            let items: Vec<String> = items.iter().filter_map(scalar).collect();
            if items.is_empty() {
                return;
            }
            if var.modifier == Modifier::Explode {
                for item in items {
                    out.push(named(op, name, op.encode(&item)));
                }
            } else {
                let joined: Vec<String> = items.iter().map(|i| op.encode(i)).collect();
                out.push(named(op, name, joined.join(",")));
            }
        }
        Some(Value::Object(map)) => {
            let pairs: Vec<(&String, String)> = map
                .iter()
                .filter_map(|(k, v)| scalar(v).map(|v| (k, v)))
                .collect();
            if pairs.is_empty() {
                return;
            }
            if var.modifier == Modifier::Explode {
                for (k, v) in pairs {
                    out.push(format!("{}={}", encode_unreserved(k), op.encode(&v)));
                }
            } else {
                let flat: Vec<String> = pairs
                    .iter()
                    .flat_map(|(k, v)| [encode_unreserved(k), op.encode(v)])
                    .collect();
                out.push(named(op, name, flat.join(",")));
            }
        }
        Some(other) => {
            let Some(mut s) = scalar(other) else {
                return;
            };
            if let Modifier::Prefix(len) = var.modifier {
                s = s.chars().take(len).collect();
            }
            out.push(named(op, name, op.encode(&s)));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Expression(Expression),
}

/// A parsed URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    parts: Vec<Part>,
}

impl Template {
    /// Parse a route template, accepting the colon form `:name`.
    pub fn parse(template: &str) -> Self {
        Self::parse_braces(&rewrite_colon_params(template))
    }

    /// Parse only `{...}` expressions; colons are literal text.
    pub fn parse_braces(template: &str) -> Self {
        let mut parts = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            let Some(len) = rest[open + 1..].find('}') else {
                break;
            };
            let body = &rest[open + 1..open + 1 + len];
            if open > 0 {
                parts.push(Part::Literal(encode_reserved(&rest[..open])));
            }
            if body.is_empty() {
                parts.push(Part::Literal("{}".to_string()));
            } else {
                parts.push(Part::Expression(Expression::parse(body)));
            }
            rest = &rest[open + len + 2..];
        }
        if !rest.is_empty() {
            parts.push(Part::Literal(encode_reserved(rest)));
        }
        Self { parts }
    }

    pub fn expand(&self, params: &Params) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                Part::Literal(s) => s.clone(),
                Part::Expression(e) => e.expand(params),
            })
            .collect()
    }

    /// Names of every variable referenced by any expression.
    pub fn variables(&self) -> BTreeSet<String> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Expression(e) => Some(e.vars.iter().map(|v| v.name.clone())),
                Part::Literal(_) => None,
            })
            .flatten()
            .collect()
    }
}

/// Variable names used anywhere in `template`.
pub fn extract_expressions(template: &str) -> BTreeSet<String> {
    Template::parse(template).variables()
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Rewrite `:name` outside braces to `{name}`. A name starts with a
/// lowercase letter and is at least two word characters long, so ports
/// (`:8080`) and schemes (`https://`) are left alone.
pub(crate) fn rewrite_colon_params(template: &str) -> String {
    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len());
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b':' if depth == 0
                && i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_lowercase()
                && is_word(bytes[i + 2]) =>
            {
                let mut end = i + 2;
                while end < bytes.len() && is_word(bytes[end]) {
                    end += 1;
                }
                out.push_str(&template[start..i]);
                out.push('{');
                out.push_str(&template[i + 1..end]);
                out.push('}');
                i = end;
                start = end;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    out.push_str(&template[start..]);
    out
}
