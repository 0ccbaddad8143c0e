//! Comment-style classifier: raw block → normalized [`DocBlock`].
//!
//! Both conventions end up in the same shape, so nothing downstream cares
//! whether a block was a `##` comment or a docstring.

use crate::model::{CommentStyle, DocBlock, Tag, ASSOCIATION_TAGS};
use crate::options::ScanOptions;
use crate::parser::scan::TokenKind;
use regex::Regex;
use std::sync::LazyLock;

// `@param[in] self text` / `\brief text`
static RE_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[@\\]([A-Za-z]+)(?:\[[^\]]*\])?(?:\s+(.*))?$").unwrap()
});

/// Commands whose first word names something.
const TARGETED: &[&str] = &[
    "package", "namespace", "var", "param", "fn", "class", "exception", "throws", "raises",
];

/// Commands whose whole remainder is text.
const TEXTUAL: &[&str] = &[
    "brief", "short", "details", "return", "returns", "retval", "see", "sa", "note", "todo",
    "deprecated", "warning", "author", "since", "version",
];

/// Classify a scanned token. Only `##` blocks and triple-quoted literals
/// can produce documentation.
pub fn classify(kind: &TokenKind, line: usize, options: &ScanOptions) -> Option<DocBlock> {
    match kind {
        TokenKind::Comment(lines) => classify_comment(lines, line),
        TokenKind::StringLiteral { body, triple: true } => {
            classify_docstring(body, line, !options.verbatim_docstrings)
        }
        _ => None,
    }
}

/// `##` block: strip the markers, then normalize.
pub fn classify_comment(lines: &[String], line: usize) -> Option<DocBlock> {
    let content: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| {
            let l = l.trim_start();
            let stripped = match (i, l.strip_prefix("##")) {
                (0, Some(rest)) => rest,
                _ => l.strip_prefix('#').unwrap_or(l),
            };
            stripped.trim().to_string()
        })
        .collect();
    normalize(&content, CommentStyle::StructuredComment, line, true)
}

/// Docstring body: PEP 257 trimming, then normalize. Without `commands`
/// every line is plain text, `@` and `\` included.
pub fn classify_docstring(body: &str, line: usize, commands: bool) -> Option<DocBlock> {
    normalize(&trim_docstring(body), CommentStyle::DocstringLiteral, line, commands)
}

/// PEP 257: first line stripped, the rest dedented by their common
/// indentation, surrounding blank lines removed.
fn trim_docstring(body: &str) -> Vec<String> {
    let lines: Vec<&str> = body.lines().collect();
    let Some((first, rest)) = lines.split_first() else {
        return Vec::new();
    };
    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = vec![first.trim().to_string()];
    for l in rest {
        let dedented = l.get(indent..).unwrap_or_else(|| l.trim_start());
        out.push(dedented.trim_end().to_string());
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    let leading = out.iter().take_while(|l| l.is_empty()).count();
    out.drain(..leading);
    out
}

/// Split cleaned lines into brief, details and tags.
fn normalize(lines: &[String], style: CommentStyle, line: usize, commands: bool) -> Option<DocBlock> {
    let mut tags: Vec<Tag> = Vec::new();
    let mut free: Vec<&str> = Vec::new();
    // Tag whose text the next non-blank line continues
    let mut open_tag: Option<usize> = None;

    for text in lines {
        let text = text.as_str();
        if text.trim().is_empty() {
            open_tag = None;
            free.push("");
            continue;
        }
        if let Some(tag) = commands.then(|| parse_command(text)).flatten() {
            let continues = !ASSOCIATION_TAGS.contains(&tag.name.as_str());
            tags.push(tag);
            open_tag = continues.then(|| tags.len() - 1);
            continue;
        }
        match open_tag {
            Some(idx) => {
                let tag = &mut tags[idx];
                let sep = if tag.name == "details" { '\n' } else { ' ' };
                if !tag.text.is_empty() {
                    tag.text.push(sep);
                }
                tag.text.push_str(text.trim());
            }
            None => free.push(text),
        }
    }

    let mut paragraphs: Vec<String> = free
        .split(|l| l.is_empty())
        .filter(|p| !p.is_empty())
        .map(|p| p.join("\n"))
        .collect();

    let explicit_brief = tags
        .iter()
        .find(|t| matches!(t.name.as_str(), "brief" | "short") && !t.text.is_empty())
        .map(|t| t.text.clone());
    let brief = match explicit_brief {
        Some(brief) => brief,
        None if !paragraphs.is_empty() => {
            let first = paragraphs.remove(0);
            first.lines().map(str::trim).collect::<Vec<_>>().join(" ")
        }
        None => String::new(),
    };

    paragraphs.extend(
        tags.iter()
            .filter(|t| t.name == "details" && !t.text.is_empty())
            .map(|t| t.text.clone()),
    );
    let details = paragraphs.join("\n\n");

    if brief.is_empty() && details.is_empty() && tags.is_empty() {
        return None;
    }
    Some(DocBlock {
        brief,
        details,
        style,
        line,
        tags,
    })
}

fn parse_command(text: &str) -> Option<Tag> {
    let caps = RE_COMMAND.captures(text.trim())?;
    let name = caps[1].to_string();
    let rest = caps.get(2).map_or("", |m| m.as_str()).trim();
    if TARGETED.contains(&name.as_str()) {
        let mut parts = rest.splitn(2, char::is_whitespace);
        let target = parts.next().filter(|t| !t.is_empty()).map(str::to_string);
        let text = parts.next().unwrap_or("").trim().to_string();
        Some(Tag { name, target, text })
    } else if TEXTUAL.contains(&name.as_str()) {
        Some(Tag {
            name,
            target: None,
            text: rest.to_string(),
        })
    } else {
        // Unknown command (decorator in an example, e-mail address, ...)
        None
    }
}
