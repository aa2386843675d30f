//SPDX-License-Identifier: MIT OR Apache-2.0

use proc_macro::{Delimiter, Spacing, TokenStream, TokenTree};
use std::collections::VecDeque;

/// Builds a `compile_error!` invocation carrying `message`.
pub fn error(message: &str) -> TokenStream {
    format!("compile_error!({message:?});").parse().unwrap()
}

/// Time unit named in the attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Seconds,
    Millis,
    Micros,
}

impl Unit {
    fn parse(name: &str) -> Option<Unit> {
        match name {
            "seconds" | "secs" | "s" => Some(Unit::Seconds),
            "millis" | "ms" => Some(Unit::Millis),
            "micros" | "us" => Some(Unit::Micros),
            _ => None,
        }
    }

    /// Path of the matching `TimeUnit` variant.
    pub fn path(self) -> &'static str {
        match self {
            Unit::Seconds => "::tracewise::TimeUnit::Seconds",
            Unit::Millis => "::tracewise::TimeUnit::Millis",
            Unit::Micros => "::tracewise::TimeUnit::Micros",
        }
    }
}

/// Everything given between the attribute's parentheses.
#[derive(Debug)]
pub struct TrackArgs {
    pub tracer: TokenStream,
    pub threshold: u64,
    pub unit: Unit,
    pub args: bool,
    pub enabled: bool,
    pub id: Option<String>,
}

/// Parses a key, consuming the `=` after it if there is one.
///
/// Returns the key and whether a value follows. Bare keys (`args`) are flags.
fn parse_key(input: &mut VecDeque<TokenTree>) -> Result<Option<(String, bool)>, TokenStream> {
    let key = match input.pop_front() {
        None => return Ok(None),
        Some(TokenTree::Ident(i)) => i.to_string(),
        Some(other) => return Err(error(&format!("#[track]: expected a key, found `{other}`"))),
    };
    match input.front() {
        Some(TokenTree::Punct(p)) if p.as_char() == '=' => {
            input.pop_front();
            Ok(Some((key, true)))
        }
        Some(TokenTree::Punct(p)) if p.as_char() == ',' => {
            input.pop_front();
            Ok(Some((key, false)))
        }
        None => Ok(Some((key, false))),
        Some(other) => Err(error(&format!(
            "#[track]: expected `=` or `,` after `{key}`, found `{other}`"
        ))),
    }
}

/// Collects the tokens of a value up to the next top-level `,`.
///
/// Commas inside generic arguments (`Lazy<Tracer, fn() -> Tracer>`) don't end the value.
fn parse_value(input: &mut VecDeque<TokenTree>) -> Vec<TokenTree> {
    let mut value = Vec::new();
    let mut angle = AngleDepth::default();
    while let Some(token) = input.pop_front() {
        if let TokenTree::Punct(p) = &token {
            if p.as_char() == ',' && angle.is_top() {
                break;
            }
        }
        angle.feed(&token);
        value.push(token);
    }
    value
}

fn single<'a>(key: &str, value: &'a [TokenTree]) -> Result<&'a TokenTree, TokenStream> {
    match value {
        [token] => Ok(token),
        _ => Err(error(&format!("#[track]: `{key}` takes a single token"))),
    }
}

fn parse_bool(key: &str, value: &[TokenTree]) -> Result<bool, TokenStream> {
    match single(key, value)?.to_string().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(error(&format!(
            "#[track]: `{key}` must be `true` or `false`, found `{other}`"
        ))),
    }
}

fn parse_string(key: &str, value: &[TokenTree]) -> Result<String, TokenStream> {
    let literal = single(key, value)?.to_string();
    match literal.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) if !inner.contains('\\') => Ok(inner.to_string()),
        _ => Err(error(&format!(
            "#[track]: `{key}` must be a plain string literal, found `{literal}`"
        ))),
    }
}

pub fn parse_track_args(attr: TokenStream) -> Result<TrackArgs, TokenStream> {
    let mut input: VecDeque<TokenTree> = attr.into_iter().collect();
    let mut tracer = None;
    let mut parsed = TrackArgs {
        tracer: TokenStream::new(),
        threshold: 0,
        unit: Unit::Millis,
        args: false,
        enabled: true,
        id: None,
    };

    while let Some((key, has_value)) = parse_key(&mut input)? {
        let value = if has_value {
            let value = parse_value(&mut input);
            if value.is_empty() {
                return Err(error(&format!("#[track]: `{key}` is missing its value")));
            }
            value
        } else {
            Vec::new()
        };
        match (key.as_str(), has_value) {
            ("args", false) => parsed.args = true,
            ("args", true) => parsed.args = parse_bool(&key, &value)?,
            ("tracer", true) => tracer = Some(value.into_iter().collect::<TokenStream>()),
            ("threshold", true) => {
                let literal = single(&key, &value)?.to_string();
                let digits = literal.replace('_', "");
                let digits = digits.trim_end_matches("u64").trim_end_matches("u32");
                parsed.threshold = digits.parse().map_err(|_| {
                    error(&format!(
                        "#[track]: `threshold` must be a non-negative integer, found `{literal}`"
                    ))
                })?;
            }
            ("unit", true) => {
                let name = single(&key, &value)?.to_string();
                let name = name.trim_matches('"');
                parsed.unit = Unit::parse(name).ok_or_else(|| {
                    error(&format!(
                        "#[track]: unsupported unit `{name}` (expected seconds, millis or micros)"
                    ))
                })?;
            }
            ("enabled", true) => parsed.enabled = parse_bool(&key, &value)?,
            ("id", true) => parsed.id = Some(parse_string(&key, &value)?),
            (other, _) => return Err(error(&format!("#[track]: unknown option `{other}`"))),
        }
    }

    parsed.tracer = tracer.ok_or_else(|| error("#[track] requires `tracer = <expr>`"))?;
    Ok(parsed)
}

/// Tracks `<`/`>` nesting in a flat token list, ignoring the `>` of `->`.
#[derive(Default)]
pub struct AngleDepth {
    depth: usize,
    after_dash: bool,
}

impl AngleDepth {
    pub fn is_top(&self) -> bool {
        self.depth == 0
    }

    pub fn feed(&mut self, token: &TokenTree) {
        let after_dash = std::mem::take(&mut self.after_dash);
        if let TokenTree::Punct(p) = token {
            match p.as_char() {
                '<' => self.depth += 1,
                '>' if !after_dash => self.depth = self.depth.saturating_sub(1),
                '-' => self.after_dash = p.spacing() == Spacing::Joint,
                _ => {}
            }
        }
    }
}

/// Splits a flat token list on top-level commas, dropping empty pieces.
pub fn split_commas(tokens: impl IntoIterator<Item = TokenTree>) -> Vec<Vec<TokenTree>> {
    let mut pieces = vec![Vec::new()];
    let mut angle = AngleDepth::default();
    for token in tokens {
        if let TokenTree::Punct(p) = &token {
            if p.as_char() == ',' && angle.is_top() {
                pieces.push(Vec::new());
                continue;
            }
        }
        angle.feed(&token);
        if let Some(last) = pieces.last_mut() {
            last.push(token);
        }
    }
    pieces.retain(|piece| !piece.is_empty());
    pieces
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Word,
    Open,
    Sep,
}

/// Renders tokens the way they are usually written: `&'a mut Vec<u8>`, not `& 'a mut Vec < u8 >`.
pub fn compact(tokens: &[TokenTree]) -> String {
    let mut out = String::new();
    let mut prev = Prev::Start;
    let mut iter = tokens.iter().peekable();
    while let Some(token) = iter.next() {
        match token {
            TokenTree::Ident(_) | TokenTree::Literal(_) => {
                if matches!(prev, Prev::Word | Prev::Sep) {
                    out.push(' ');
                }
                out.push_str(&token.to_string());
                prev = Prev::Word;
            }
            TokenTree::Group(g) => {
                let spaced = match g.delimiter() {
                    Delimiter::Brace => prev != Prev::Start,
                    _ => prev == Prev::Sep,
                };
                if spaced {
                    out.push(' ');
                }
                let inner: Vec<TokenTree> = g.stream().into_iter().collect();
                let (open, close) = match g.delimiter() {
                    Delimiter::Parenthesis => ("(", ")"),
                    Delimiter::Bracket => ("[", "]"),
                    Delimiter::Brace => ("{ ", " }"),
                    Delimiter::None => ("", ""),
                };
                out.push_str(open);
                out.push_str(&compact(&inner));
                out.push_str(close);
                prev = Prev::Word;
            }
            TokenTree::Punct(p) => {
                let c = p.as_char();
                let joined = match iter.peek() {
                    Some(TokenTree::Punct(next)) if p.spacing() == Spacing::Joint => {
                        Some(next.as_char())
                    }
                    _ => None,
                };
                if c == '-' && joined == Some('>') {
                    iter.next();
                    out.push_str(" ->");
                    prev = Prev::Sep;
                } else if c == ':' && joined == Some(':') {
                    iter.next();
                    if prev == Prev::Sep {
                        out.push(' ');
                    }
                    out.push_str("::");
                    prev = Prev::Open;
                } else {
                    match c {
                        ',' | ';' | ':' => {
                            out.push(c);
                            prev = Prev::Sep;
                        }
                        '+' | '=' => {
                            if prev != Prev::Start {
                                out.push(' ');
                            }
                            out.push(c);
                            prev = Prev::Sep;
                        }
                        '>' => {
                            out.push(c);
                            prev = Prev::Word;
                        }
                        '<' => {
                            out.push(c);
                            prev = Prev::Open;
                        }
                        _ => {
                            if matches!(prev, Prev::Word | Prev::Sep) {
                                out.push(' ');
                            }
                            out.push(c);
                            prev = Prev::Open;
                        }
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // proc_macro types only exist inside a macro expansion, so the
    // token-level helpers are exercised through the attribute in the
    // `tracewise` integration tests. Only the plain-string parts live here.

    #[test]
    fn unit_names() {
        assert_eq!(Unit::parse("millis"), Some(Unit::Millis));
        assert_eq!(Unit::parse("us"), Some(Unit::Micros));
        assert_eq!(Unit::parse("secs"), Some(Unit::Seconds));
        assert_eq!(Unit::parse("nanos"), None);
        assert_eq!(Unit::Seconds.path(), "::tracewise::TimeUnit::Seconds");
    }
}
