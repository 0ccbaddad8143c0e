//! Scanner: single forward pass over Python source producing tokens.
//!
//! Physical lines are folded into logical statements (open brackets,
//! backslash continuations and multi-line triple-quoted strings), plain
//! comments and blank lines are dropped, and `##` comment blocks are kept
//! verbatim for the classifier.

use regex::Regex;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(").unwrap());

static RE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^class\s+([A-Za-z_]\w*)\s*([(:])").unwrap());

static RE_DECORATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@\s*([A-Za-z_][\w.]*)").unwrap());

// Simple, annotated and tuple assignment; `==` is excluded by the last group
static RE_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][\w.]*(?:\s*,\s*[A-Za-z_][\w.]*)*)\s*(?::[^=\n]*)?=(?:[^=]|$)").unwrap()
});

static RE_STRING_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[rRuUbBfF]{0,2}("""|'''|"|')"#).unwrap());

/// Hard keywords; none of them can be an assignment target.
const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

// -- Tokens -------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// 1-based line of the first physical line
    pub line: usize,
    /// Indentation width in columns
    pub indent: usize,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `##` block with its comment markers still attached.
    Comment(Vec<String>),
    /// Statement consisting of a single string literal.
    StringLiteral { body: String, triple: bool },
    Def {
        name: String,
        params: Vec<String>,
        signature: String,
        inline_body: bool,
    },
    Class {
        name: String,
        bases: Vec<String>,
        inline_body: bool,
    },
    Decorator(String),
    /// Assignment targets, possibly dotted (`self.x`).
    Assign(Vec<String>),
    Statement,
    /// Region that could not be tokenized; scanning resumed on the next line.
    Malformed(String),
}

// -- Scanner ------------------------------------------------------------------

/// Lazy token stream over one source text. Not restartable.
pub struct Scanner<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    tab_width: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str, tab_width: usize) -> Self {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        Self {
            lines: input.lines().collect(),
            pos: 0,
            tab_width: tab_width.max(1),
        }
    }

    fn comment_block(&mut self, indent: usize) -> Token {
        let start = self.pos;
        let mut block = vec![self.lines[self.pos].trim().to_string()];
        self.pos += 1;
        while let Some(line) = self.lines.get(self.pos) {
            let trimmed = line.trim();
            if !trimmed.starts_with('#') || is_structured_start(trimmed) {
                break;
            }
            block.push(trimmed.to_string());
            self.pos += 1;
        }
        Token {
            line: start + 1,
            indent,
            kind: TokenKind::Comment(block),
        }
    }

    fn statement(&mut self, indent: usize) -> Token {
        let start = self.pos;
        let mut lexer = Lexer::default();
        loop {
            lexer.feed(self.lines[self.pos]);
            self.pos += 1;
            if lexer.is_complete() {
                break;
            }
            if self.pos >= self.lines.len() {
                // Resume right after the opening line; the rest is plain code.
                self.pos = start + 1;
                let reason = if lexer.in_triple_string() {
                    "unterminated triple-quoted string"
                } else {
                    "unbalanced brackets"
                };
                return Token {
                    line: start + 1,
                    indent,
                    kind: TokenKind::Malformed(reason.to_string()),
                };
            }
        }
        Token {
            line: start + 1,
            indent,
            kind: classify_statement(lexer.code.trim()),
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while let Some(line) = self.lines.get(self.pos) {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                self.pos += 1;
                continue;
            }
            let indent = indent_width(line, self.tab_width);
            if trimmed.starts_with('#') {
                if is_structured_start(trimmed) {
                    return Some(self.comment_block(indent));
                }
                self.pos += 1;
                continue;
            }
            return Some(self.statement(indent));
        }
        None
    }
}

/// `##` opens a block; `###...` rulers and `##****` banners do not.
fn is_structured_start(trimmed: &str) -> bool {
    match trimmed.strip_prefix("##") {
        Some(rest) => {
            let rest = rest.trim();
            rest.is_empty() || !rest.chars().all(|c| matches!(c, '#' | '*' | '=' | '-'))
        }
        None => false,
    }
}

fn indent_width(line: &str, tab_width: usize) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += tab_width - width % tab_width,
            '\u{c}' => width = 0,
            _ => break,
        }
    }
    width
}

// -- Logical-line lexer -------------------------------------------------------

#[derive(Clone, Copy)]
struct Quote {
    ch: char,
    triple: bool,
}

/// Accumulates physical lines until the statement is complete. Comments are
/// removed, string contents are kept.
#[derive(Default)]
struct Lexer {
    code: String,
    depth: usize,
    quote: Option<Quote>,
    continued: bool,
}

impl Lexer {
    fn feed(&mut self, line: &str) {
        if !self.code.is_empty() || self.quote.is_some() {
            self.code.push('\n');
        }
        self.continued = false;
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if let Some(q) = self.quote {
                self.code.push(c);
                if c == '\\' {
                    if let Some(&next) = chars.get(i + 1) {
                        self.code.push(next);
                        i += 2;
                        continue;
                    }
                } else if c == q.ch {
                    if !q.triple {
                        self.quote = None;
                    } else if chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c) {
                        self.code.push(c);
                        self.code.push(c);
                        self.quote = None;
                        i += 3;
                        continue;
                    }
                }
                i += 1;
                continue;
            }
            match c {
                '#' => break,
                '"' | '\'' => {
                    let triple = chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c);
                    let width = if triple { 3 } else { 1 };
                    (0..width).for_each(|_| self.code.push(c));
                    self.quote = Some(Quote { ch: c, triple });
                    i += width;
                    continue;
                }
                '(' | '[' | '{' => self.depth += 1,
                ')' | ']' | '}' => self.depth = self.depth.saturating_sub(1),
                '\\' if chars[i + 1..].iter().all(|c| c.is_whitespace()) => {
                    self.continued = true;
                    break;
                }
                _ => {}
            }
            self.code.push(c);
            i += 1;
        }
        // A single-quoted string cannot span lines without a backslash.
        if let Some(q) = self.quote {
            if !q.triple && !line.trim_end().ends_with('\\') {
                self.quote = None;
            }
        }
    }

    fn is_complete(&self) -> bool {
        self.quote.is_none() && self.depth == 0 && !self.continued
    }

    fn in_triple_string(&self) -> bool {
        matches!(self.quote, Some(q) if q.triple)
    }
}

// -- Statement classification -------------------------------------------------

fn classify_statement(code: &str) -> TokenKind {
    if let Some(literal) = string_statement(code) {
        return literal;
    }

    if let Some(caps) = RE_DEF.captures(code) {
        let name = caps[1].to_string();
        let open = caps.get(0).map_or(0, |m| m.end());
        let (inside, rest) = split_parens(&code[open..]);
        let raw: Vec<String> = split_top_level(inside)
            .into_iter()
            .map(|p| collapse_whitespace(&p))
            .filter(|p| !p.is_empty())
            .collect();
        let params = raw
            .iter()
            .map(|p| param_name(p))
            .filter(|p| !p.is_empty() && *p != "*" && *p != "/")
            .collect();
        return TokenKind::Def {
            name,
            params,
            signature: format!("({})", raw.join(", ")),
            inline_body: has_inline_body(rest),
        };
    }

    if let Some(caps) = RE_CLASS.captures(code) {
        let name = caps[1].to_string();
        let after = caps.get(0).map_or(0, |m| m.end());
        let (bases, rest) = if &caps[2] == "(" {
            let (inside, rest) = split_parens(&code[after..]);
            let bases = split_top_level(inside)
                .into_iter()
                .map(|b| collapse_whitespace(&b))
                .filter(|b| !b.is_empty() && !b.contains('='))
                .collect();
            (bases, rest)
        } else {
            // `:` already consumed by the pattern
            (Vec::new(), &code[after - 1..])
        };
        return TokenKind::Class {
            name,
            bases,
            inline_body: has_inline_body(rest),
        };
    }

    if let Some(caps) = RE_DECORATOR.captures(code) {
        return TokenKind::Decorator(caps[1].to_string());
    }

    if let Some(caps) = RE_ASSIGN.captures(code) {
        let targets: Vec<String> = caps[1].split(',').map(|t| t.trim().to_string()).collect();
        let is_keyword = |t: &String| t.split('.').any(|part| KEYWORDS.contains(&part));
        if !targets.iter().any(is_keyword) {
            return TokenKind::Assign(targets);
        }
    }

    TokenKind::Statement
}

/// Recognize a statement that is nothing but one string literal.
fn string_statement(code: &str) -> Option<TokenKind> {
    let caps = RE_STRING_START.captures(code)?;
    let delim = caps.get(1)?;
    let body_start = delim.end();
    let close = code[body_start..].find(delim.as_str())? + body_start;
    let rest = code[close + delim.as_str().len()..].trim();
    if !rest.is_empty() && rest != ";" {
        return None;
    }
    Some(TokenKind::StringLiteral {
        body: code[body_start..close].to_string(),
        triple: delim.as_str().len() == 3,
    })
}

/// Split `text` (starting just after an opening paren) into the contents up
/// to the matching close paren and the remainder after it.
fn split_parens(text: &str) -> (&str, &str) {
    let mut depth = 1usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return (&text[..i], &text[i + 1..]);
                }
            }
            _ => {}
        }
    }
    (text, "")
}

/// Split on commas that are not nested inside brackets or strings.
fn split_top_level(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in text.chars() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            current.push(c);
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(current);
    parts
}

/// `x: int = 1` → `x`, `**kwargs` → `**kwargs`
fn param_name(param: &str) -> String {
    param
        .split([':', '='])
        .next()
        .unwrap_or(param)
        .trim()
        .to_string()
}

/// True when something other than a comment follows the header's colon.
fn has_inline_body(rest: &str) -> bool {
    let mut depth = 0usize;
    for (i, c) in rest.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return !rest[i + 1..].trim().is_empty(),
            _ => {}
        }
    }
    false
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
