//! Raw fragment handling for sea-query's PostgreSQL backend.
//!
//! WHERE fragments are written with `?` markers, one per bound argument. sea-query's
//! PostgreSQL renderer reads custom expressions differently: `$` marks the next value
//! (numbered `$1..$n` across the whole statement at build time) and `$$` is a literal
//! dollar sign. [`PostgresFragment::parse`] rewrites a fragment into that form. It lexes
//! with sea-query's own [`Tokenizer`], so quoted literals and identifiers (including
//! backslash escapes in `E'..'` strings) are skipped exactly as the renderer skips them.
//!
//! On top of the tokenizer:
//! - `??` is a literal `?`, e.g. the jsonb key-exists operator `data ?? 'key'`
//! - `--` and `/* */` comments are dropped
//! - dollar-quoted strings (`$$..$$`, `$tag$..$tag$`) are re-emitted as `E'..'` literals
//! - `?` inside `[..]` is rejected, since the renderer never binds inside brackets
//!
//! ORDER BY clauses carry no arguments; [`order_terms`] splits them into sea-query order
//! expressions.

use crate::query::error::QueryError;
use sea_query::token::{Token, Tokenizer};
use sea_query::{NullOrdering, Order};
use std::iter::Peekable;

/// A WHERE fragment in sea-query's PostgreSQL custom-expression syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PostgresFragment {
    pub sql: String,
    /// Number of bind markers; must equal the number of arguments
    pub placeholders: usize,
}

impl PostgresFragment {
    pub(crate) fn parse(fragment: &str) -> Result<Self, QueryError> {
        let mut out = Writer::default();
        let mut rest = fragment;

        'restart: while !rest.is_empty() {
            let mut tokens = Tokenizer::new(rest).iter().peekable();
            let mut offset = 0;

            while let Some(token) = tokens.next() {
                let start = offset;
                offset += text(&token).len();

                match &token {
                    Token::Punctuation(p) if p == "?" => {
                        if next_is(&mut tokens, "?") {
                            tokens.next();
                            offset += 1;
                            out.push("?");
                        } else {
                            out.marker();
                        }
                    }
                    Token::Punctuation(p) if p == "-" && next_is(&mut tokens, "-") => {
                        let end = rest[start..].find('\n').map_or(rest.len(), |i| start + i);
                        out.gap();
                        rest = &rest[end..];
                        continue 'restart;
                    }
                    Token::Punctuation(p) if p == "/" && next_is(&mut tokens, "*") => {
                        let end = start + block_comment_len(&rest[start..]);
                        out.gap();
                        rest = &rest[end..];
                        continue 'restart;
                    }
                    Token::Punctuation(p) if p == "$" => match dollar_quoted(&rest[start..]) {
                        Some((body, len)) => {
                            out.push_literal(body);
                            rest = &rest[start + len..];
                            continue 'restart;
                        }
                        None => out.push("$$"),
                    },
                    Token::Quoted(q) if q.starts_with('[') && q.contains('?') => {
                        return Err(QueryError::InvalidArgument(format!(
                            "placeholder inside brackets in `{fragment}`; bind an array and use `= ANY(?)` instead"
                        )));
                    }
                    other => out.push(text(other)),
                }
            }
            break;
        }

        Ok(Self {
            sql: out.sql.trim().to_string(),
            placeholders: out.placeholders,
        })
    }
}

#[derive(Default)]
struct Writer {
    sql: String,
    placeholders: usize,
    after_marker: bool,
}

impl Writer {
    fn push(&mut self, s: &str) {
        // `$` directly followed by a word or another `$` reads as `$N` or `$$`.
        if self.after_marker && s.starts_with(|c: char| c.is_alphanumeric() || c == '$') {
            self.sql.push(' ');
        }
        self.after_marker = false;
        self.sql.push_str(s);
    }

    fn gap(&mut self) {
        if !self.sql.is_empty() && !self.sql.ends_with(char::is_whitespace) {
            self.push(" ");
        }
    }

    fn marker(&mut self) {
        self.push("$");
        self.placeholders += 1;
        self.after_marker = true;
    }

    fn push_literal(&mut self, body: &str) {
        self.push("E'");
        for c in body.chars() {
            if c == '\\' || c == '\'' {
                self.sql.push('\\');
            }
            self.sql.push(c);
        }
        self.sql.push('\'');
    }
}

fn text(token: &Token) -> &str {
    match token {
        Token::Quoted(s) | Token::Unquoted(s) | Token::Space(s) | Token::Punctuation(s) => s,
    }
}

fn next_is(tokens: &mut Peekable<impl Iterator<Item = Token>>, mark: &str) -> bool {
    matches!(tokens.peek(), Some(Token::Punctuation(p)) if p == mark)
}

/// Byte length of the (possibly nested) block comment at the start of `s`.
fn block_comment_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'*') => {
                depth += 1;
                i += 2;
            }
            (b'*', b'/') => {
                depth = depth.saturating_sub(1);
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    s.len()
}

/// Body and total byte length of the dollar-quoted string at the start of `s`, or
/// `None` if `s` does not open a terminated one.
fn dollar_quoted(s: &str) -> Option<(&str, usize)> {
    let tag_end = s[1..].find('$')? + 1;
    let tag = &s[1..tag_end];

    let mut chars = tag.chars();
    let valid_tag = match chars.next() {
        None => true,
        Some(c) => (c.is_alphabetic() || c == '_') && chars.all(|c| c.is_alphanumeric() || c == '_'),
    };
    if !valid_tag {
        return None;
    }

    let delimiter = &s[..=tag_end];
    let body_start = tag_end + 1;
    let body_len = s[body_start..].find(delimiter)?;
    Some((
        &s[body_start..body_start + body_len],
        body_start + body_len + delimiter.len(),
    ))
}

/// Split an ORDER BY clause into `(expression, direction, nulls)` terms.
///
/// Terms are separated by top-level commas; a trailing `ASC`/`DESC` and
/// `NULLS FIRST`/`NULLS LAST` are lifted out of each term. A term without a
/// direction sorts ascending, which is PostgreSQL's default.
pub(crate) fn order_terms(clause: &str) -> Vec<(String, Order, Option<NullOrdering>)> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for token in Tokenizer::new(clause).iter() {
        match &token {
            Token::Punctuation(p) if p == "(" => depth += 1,
            Token::Punctuation(p) if p == ")" => depth = depth.saturating_sub(1),
            Token::Punctuation(p) if p == "," && depth == 0 => {
                terms.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push_str(text(&token));
    }
    terms.push(current);

    terms
        .iter()
        .map(|term| term.trim())
        .filter(|term| !term.is_empty())
        .map(order_term)
        .collect()
}

fn order_term(term: &str) -> (String, Order, Option<NullOrdering>) {
    let (term, nulls) = if let Some(head) = strip_word(term, "FIRST").and_then(|h| strip_word(h, "NULLS")) {
        (head, Some(NullOrdering::First))
    } else if let Some(head) = strip_word(term, "LAST").and_then(|h| strip_word(h, "NULLS")) {
        (head, Some(NullOrdering::Last))
    } else {
        (term, None)
    };

    let (term, order) = if let Some(head) = strip_word(term, "DESC") {
        (head, Order::Desc)
    } else if let Some(head) = strip_word(term, "ASC") {
        (head, Order::Asc)
    } else {
        (term, Order::Asc)
    };

    (term.to_string(), order, nulls)
}

fn strip_word<'a>(term: &'a str, word: &str) -> Option<&'a str> {
    let (head, last) = term.trim_end().rsplit_once(char::is_whitespace)?;
    last.eq_ignore_ascii_case(word).then(|| head.trim_end())
}
