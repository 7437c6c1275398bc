//! Fuzzy comparison of demangled function signatures
//!
//! The stack-usage report and the demangled size table spell the same
//! function differently: the former keeps return types, storage qualifiers
//! and source-level typedefs (`virtual size_t Print::write(const uint8_t*, size_t)`),
//! the latter prints the resolved types (`Print::write(unsigned char const*, unsigned int)`).
//! Both are reduced to a qualified name, a normalized parameter list and
//! the trailing qualifiers before comparing.

use std::collections::HashMap;

use crate::config::{TypeAliasGroup, default_type_aliases};

/// Maps every alias spelling of a type to its canonical spelling.
#[derive(Debug, Clone)]
pub struct TypeAliasTable {
    canonical: HashMap<String, String>,
}

impl Default for TypeAliasTable {
    fn default() -> Self {
        Self::from_groups(&default_type_aliases())
    }
}

impl TypeAliasTable {
    /// A table without any aliases. Types only match when spelled the same.
    pub fn empty() -> Self {
        Self {
            canonical: HashMap::new(),
        }
    }

    pub fn from_groups(groups: &[TypeAliasGroup]) -> Self {
        let mut canonical = HashMap::new();
        for group in groups {
            let target = normalize_words(&group.canonical);
            for alias in &group.aliases {
                canonical.insert(normalize_words(alias), target.clone());
            }
        }
        Self { canonical }
    }

    /// Canonical spelling of `ty`, or `ty` itself when it has no alias.
    pub fn canonical<'a>(&'a self, ty: &'a str) -> &'a str {
        self.canonical.get(ty).map(String::as_str).unwrap_or(ty)
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

/// Whether two signatures denote the same function. Absent names never match.
pub fn display_names_match(a: Option<&str>, b: Option<&str>, aliases: &TypeAliasTable) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    match (Signature::parse(a, aliases), Signature::parse(b, aliases)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Signature {
    name: String,
    params: Vec<String>,
    /// Whatever follows the parameter list, usually `const`.
    qualifiers: String,
}

impl Signature {
    fn parse(text: &str, aliases: &TypeAliasTable) -> Option<Self> {
        let text = text.trim();
        let Some(close) = text.rfind(')') else {
            return Some(Signature {
                name: function_name(text)?,
                params: Vec::new(),
                qualifiers: String::new(),
            });
        };
        let open = matching_open_paren(text, close)?;

        let params: Vec<String> = split_parameters(&text[open + 1..close])
            .into_iter()
            .map(|p| normalize_parameter(p, aliases))
            .filter(|p| !p.is_empty())
            .collect();
        let params = if params == ["void"] { Vec::new() } else { params };

        Some(Signature {
            name: function_name(&text[..open])?,
            params,
            qualifiers: normalize_words(&text[close + 1..]),
        })
    }
}

fn normalize_words(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn matching_open_paren(text: &str, close: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in text[..=close].char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// The qualified name is the last top-level word before the parameter
/// list; everything in front of it is return type or storage qualifiers.
fn function_name(prefix: &str) -> Option<String> {
    let words = split_top_level_words(prefix);
    let last = words.len().checked_sub(1)?;
    let start = words.iter().position(|w| w.contains("operator")).unwrap_or(last);
    let name = words[start..].join(" ");
    let name = name.trim_start_matches(['*', '&']);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn split_top_level_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut depth = 0i32;
    let mut start: Option<usize> = None;
    for (idx, ch) in text.char_indices() {
        match ch {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = (depth - 1).max(0),
            c if c.is_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    words.push(&text[s..idx]);
                }
                continue;
            }
            _ => {}
        }
        if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        words.push(&text[s..]);
    }
    words
}

fn split_parameters(text: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = (depth - 1).max(0),
            ',' if depth == 0 => {
                params.push(text[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    params.push(text[start..].trim());
    params
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Punct(char),
}

impl Token {
    fn word(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(w),
            Token::Punct(_) => None,
        }
    }
}

fn is_cv(word: &str) -> bool {
    word == "const" || word == "volatile"
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Rewrite one parameter type into a canonical spelling: east const,
/// aliases resolved, no whitespace before `*` and `&`.
fn normalize_parameter(text: &str, aliases: &TypeAliasTable) -> String {
    let mut tokens = tokenize(text);

    if matches!(tokens.first(), Some(Token::Word(w)) if w == "const") {
        tokens.remove(0);
        let at = tokens
            .iter()
            .position(|t| matches!(t, Token::Punct(_)))
            .unwrap_or(tokens.len());
        tokens.insert(at, Token::Word("const".to_string()));
    }

    let base_len = tokens
        .iter()
        .take_while(|t| matches!(t, Token::Word(w) if !is_cv(w)))
        .count();
    let base: Vec<&str> = tokens[..base_len].iter().filter_map(Token::word).collect();

    let mut out = aliases.canonical(&base.join(" ")).to_string();
    for token in &tokens[base_len..] {
        match token {
            Token::Word(w) => {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(w);
            }
            Token::Punct(c) => out.push(*c),
        }
    }
    out
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    // template arguments stay inside the word they belong to
    let mut depth = 0usize;
    let mut pending_space = false;

    for ch in text.chars() {
        if depth > 0 {
            if ch.is_whitespace() {
                pending_space = true;
                continue;
            }
            let prev_ident = word.chars().last().is_some_and(is_ident_char);
            if pending_space && prev_ident && is_ident_char(ch) {
                word.push(' ');
            }
            pending_space = false;
            match ch {
                '<' => depth += 1,
                '>' => depth -= 1,
                _ => {}
            }
            word.push(ch);
            continue;
        }

        match ch {
            '<' => {
                depth = 1;
                word.push(ch);
            }
            '*' | '&' | '(' | ')' | '[' | ']' => {
                flush_word(&mut word, &mut tokens);
                tokens.push(Token::Punct(ch));
            }
            c if c.is_whitespace() => flush_word(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush_word(&mut word, &mut tokens);
    tokens
}

fn flush_word(word: &mut String, tokens: &mut Vec<Token>) {
    if !word.is_empty() {
        tokens.push(Token::Word(std::mem::take(word)));
    }
}
