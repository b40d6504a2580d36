//! Reading `replace` directives out of a module's `go.mod`.
//!
//! Only the replace subset of the format is understood; every other
//! directive and block is skipped.

use std::fmt;
use std::sync::LazyLock;
use regex::Regex;
use thiserror::Error;

static REPLACE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<old>\S+)(?:\s+(?P<old_ver>\S+))?\s*=>\s*(?P<new>\S+)(?:\s+(?P<new_ver>\S+))?$")
        .expect("replace pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModfileError {
    #[error("line {line}: malformed replace directive '{text}'")]
    Malformed { line: usize, text: String },
    #[error("unterminated replace block starting at line {line}")]
    Unterminated { line: usize },
}

/// A `replace old [version] => new [version]` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub old_path: String,
    pub old_version: Option<String>,
    pub new_path: String,
    pub new_version: Option<String>,
}

impl Replace {
    /// Whether the replacement points outside the module through `..`.
    pub fn is_relative(&self) -> bool {
        self.new_path.contains("..")
    }

    /// The `old=new@version` form understood by `go mod edit -replace`.
    pub fn edit_arg(&self) -> String {
        match &self.new_version {
            Some(version) => format!("{}={}@{}", self.old_path, self.new_path, version),
            None => format!("{}={}", self.old_path, self.new_path),
        }
    }
}

impl fmt::Display for Replace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.edit_arg())
    }
}

enum Block {
    None,
    Replace(usize),
    Other,
}

/// Extracts all replace directives from `go.mod` content, in file order.
pub fn parse_replaces(content: &str) -> Result<Vec<Replace>, ModfileError> {
    let mut replaces = Vec::new();
    let mut block = Block::None;

    for (i, raw) in content.lines().enumerate() {
        let line_no = i + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        match block {
            Block::Replace(_) | Block::Other if line == ")" => block = Block::None,
            Block::Replace(_) => replaces.push(parse_replace(line, line_no)?),
            Block::Other => {}
            Block::None => {
                let (verb, rest) = match line.split_once(|c: char| c.is_whitespace() || c == '(') {
                    Some((verb, _)) => (verb, line[verb.len()..].trim()),
                    None => (line, ""),
                };
                match (verb, rest) {
                    ("replace", "(") => block = Block::Replace(line_no),
                    ("replace", rest) => replaces.push(parse_replace(rest, line_no)?),
                    (_, "(") => block = Block::Other,
                    _ => {}
                }
            }
        }
    }

    if let Block::Replace(line) = block {
        return Err(ModfileError::Unterminated { line });
    }
    Ok(replaces)
}

fn parse_replace(text: &str, line: usize) -> Result<Replace, ModfileError> {
    let caps = REPLACE_LINE.captures(text).ok_or_else(|| ModfileError::Malformed {
        line,
        text: text.to_string(),
    })?;
    let field = |name: &str| caps.name(name).map(|m| unquote(m.as_str()));
    Ok(Replace {
        old_path: field("old").unwrap_or_default(),
        old_version: field("old_ver"),
        new_path: field("new").unwrap_or_default(),
        new_version: field("new_ver"),
    })
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(at) => &line[..at],
        None => line,
    }
}

fn unquote(s: &str) -> String {
    s.trim_matches(|c| c == '"' || c == '`').to_string()
}
