//! `.tpl` parser.
//!
//! A template is literal text with `{{ ... }}` tags:
//!
//! ```text
//! <!doctype html>
//! <title>{{ props.title }}</title>
//! {{ styles }}
//! {{ include "src/nav" current="home" }}
//! <img src="{{ file "logo.svg" hash=false }}">
//! ```
//!
//! `{{{{` emits a literal `{{`. Parsing happens once per template file
//! version; the result is a flat node list evaluated by the renderer.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// Tag body tokens: quoted strings, `=`, and bare words.
static TAG_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[ \t\r\n]*(?:("(?:[^"\\]|\\(?s:.))*"|'(?:[^'\\]|\\(?s:.))*')|(=)|([^ \t\r\n="']+))"#)
        .unwrap()
});

/// A value in a tag: literal or `props.` reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// `props.a.b` → `["a", "b"]`; bare `props` → `[]`.
    Prop(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Include {
        module: Expr,
        props: Vec<(String, Expr)>,
        /// `include_if`: skip silently when the module has no template.
        optional: bool,
    },
    File {
        path: Expr,
        hash: bool,
    },
    Link {
        path: Expr,
    },
    /// `scripts` (`js`) or `styles` (`css`).
    Assets {
        ext: &'static str,
        names: Option<Vec<Expr>>,
        hash: bool,
    },
    Prop {
        path: Vec<String>,
        raw: bool,
    },
    Skip,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTemplate {
    pub nodes: Vec<Node>,
}

impl ParsedTemplate {
    /// Whether the template opts out of producing output.
    pub fn skips(&self) -> bool {
        self.nodes.iter().any(|n| matches!(n, Node::Skip))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Eq,
    Word(String),
}

/// Parse template source. `path` is only used in error messages.
pub fn parse(source: &str, path: &str) -> Result<ParsedTemplate> {
    let mut nodes = Vec::new();
    let mut text = String::new();
    let mut pos = 0;

    while let Some(offset) = source[pos..].find("{{") {
        let open = pos + offset;
        text.push_str(&source[pos..open]);

        if source[open..].starts_with("{{{{") {
            text.push_str("{{");
            pos = open + 4;
            continue;
        }

        let body_start = open + 2;
        let Some(close) = find_tag_close(source, body_start) else {
            return Err(error_at(source, path, open, "unclosed `{{`"));
        };

        if !text.is_empty() {
            nodes.push(Node::Text(std::mem::take(&mut text)));
        }
        let tokens = tokenize(&source[body_start..close])
            .map_err(|msg| error_at(source, path, open, &msg))?;
        let node = parse_tag(tokens).map_err(|msg| error_at(source, path, open, &msg))?;
        nodes.push(node);
        pos = close + 2;
    }

    text.push_str(&source[pos..]);
    if !text.is_empty() {
        nodes.push(Node::Text(text));
    }
    Ok(ParsedTemplate { nodes })
}

/// Offset of the `}}` closing a tag body, skipping quoted strings.
fn find_tag_close(source: &str, start: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'}' && bytes.get(i + 1) == Some(&b'}') => return Some(i),
            None => {}
        }
        i += 1;
    }
    None
}

fn error_at(source: &str, path: &str, offset: usize, message: &str) -> Error {
    let line = source[..offset].matches('\n').count() + 1;
    Error::template(path, format!("line {line}: {message}"))
}

fn tokenize(body: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < body.len() {
        if body[pos..].trim().is_empty() {
            break;
        }
        let caps = TAG_TOKEN
            .captures_at(body, pos)
            .filter(|c| c.get(0).is_some_and(|m| m.start() == pos))
            .ok_or_else(|| format!("unexpected `{}`", body[pos..].trim()))?;
        if let Some(s) = caps.get(1) {
            tokens.push(Token::Str(unquote(s.as_str())));
        } else if caps.get(2).is_some() {
            tokens.push(Token::Eq);
        } else if let Some(w) = caps.get(3) {
            tokens.push(Token::Word(w.as_str().to_string()));
        }
        pos = caps.get(0).map_or(body.len(), |m| m.end());
    }
    Ok(tokens)
}

/// Strip quotes and resolve backslash escapes.
fn unquote(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Positional arguments and `key=value` options of a tag.
struct Args {
    positional: Vec<Expr>,
    options: Vec<(String, Expr)>,
}

impl Args {
    fn parse(tokens: Vec<Token>) -> std::result::Result<Self, String> {
        let mut positional = Vec::new();
        let mut options = Vec::new();
        let mut iter = tokens.into_iter().peekable();

        while let Some(token) = iter.next() {
            if let Token::Word(key) = &token
                && iter.peek() == Some(&Token::Eq)
            {
                iter.next();
                let value = iter
                    .next()
                    .ok_or_else(|| format!("missing value for `{key}`"))?;
                options.push((key.clone(), expr(value)?));
                continue;
            }
            positional.push(expr(token)?);
        }
        Ok(Self {
            positional,
            options,
        })
    }

    fn hash(&self) -> std::result::Result<bool, String> {
        match self.options.iter().find(|(k, _)| k == "hash") {
            None => Ok(true),
            Some((_, Expr::Literal(Value::Bool(b)))) => Ok(*b),
            Some(_) => Err("`hash` must be true or false".into()),
        }
    }

    fn only_options(&self, tag: &str, allowed: &[&str]) -> std::result::Result<(), String> {
        match self.options.iter().find(|(k, _)| !allowed.contains(&k.as_str())) {
            Some((key, _)) => Err(format!("`{tag}` does not take `{key}`")),
            None => Ok(()),
        }
    }

    fn single(mut self, tag: &str) -> std::result::Result<(Expr, Vec<(String, Expr)>), String> {
        if self.positional.len() != 1 {
            return Err(format!("`{tag}` takes exactly one argument"));
        }
        Ok((self.positional.remove(0), self.options))
    }
}

fn expr(token: Token) -> std::result::Result<Expr, String> {
    match token {
        Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
        Token::Eq => Err("unexpected `=`".into()),
        Token::Word(word) => {
            if let Some(path) = prop_path(&word) {
                return Ok(Expr::Prop(path));
            }
            match word.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" => Ok(Expr::Literal(Value::Null)),
                _ => match serde_json::from_str::<serde_json::Number>(&word) {
                    Ok(n) => Ok(Expr::Literal(Value::Number(n))),
                    Err(_) => Err(format!("unexpected `{word}`")),
                },
            }
        }
    }
}

/// `props.a.b` → `["a", "b"]`.
fn prop_path(word: &str) -> Option<Vec<String>> {
    if word == "props" {
        return Some(Vec::new());
    }
    let rest = word.strip_prefix("props.")?;
    let path: Vec<String> = rest.split('.').map(str::to_owned).collect();
    path.iter().all(|seg| !seg.is_empty()).then_some(path)
}

fn parse_tag(tokens: Vec<Token>) -> std::result::Result<Node, String> {
    let mut iter = tokens.into_iter();
    let Some(Token::Word(keyword)) = iter.next() else {
        return Err("empty or malformed tag".into());
    };
    let rest: Vec<Token> = iter.collect();

    if let Some(path) = prop_path(&keyword) {
        if !rest.is_empty() {
            return Err(format!("unexpected arguments after `{keyword}`"));
        }
        return Ok(Node::Prop { path, raw: false });
    }

    match keyword.as_str() {
        "raw" => match rest.as_slice() {
            [Token::Word(word)] => prop_path(word)
                .map(|path| Node::Prop { path, raw: true })
                .ok_or_else(|| "`raw` takes a `props.` reference".into()),
            _ => Err("`raw` takes a `props.` reference".into()),
        },
        "skip" if rest.is_empty() => Ok(Node::Skip),
        "include" | "include_if" => {
            let (module, props) = Args::parse(rest)?.single(&keyword)?;
            Ok(Node::Include {
                module,
                props,
                optional: keyword == "include_if",
            })
        }
        "file" => {
            let args = Args::parse(rest)?;
            args.only_options("file", &["hash"])?;
            let hash = args.hash()?;
            let (path, _) = args.single("file")?;
            Ok(Node::File { path, hash })
        }
        "link" => {
            let args = Args::parse(rest)?;
            args.only_options("link", &[])?;
            let (path, _) = args.single("link")?;
            Ok(Node::Link { path })
        }
        "scripts" | "styles" => {
            let args = Args::parse(rest)?;
            args.only_options(&keyword, &["hash"])?;
            let hash = args.hash()?;
            let names = (!args.positional.is_empty()).then_some(args.positional);
            Ok(Node::Assets {
                ext: if keyword == "scripts" { "js" } else { "css" },
                names,
                hash,
            })
        }
        _ => Err(format!("unknown tag `{keyword}`")),
    }
}
