//! Trie-based path pattern matching.
//!
//! # Responsibilities
//! - Compile path patterns (literals, `:param`, `*splat`) into a trie
//! - Find every pattern matching a request path, with captured values
//! - Compress literal chains after setup for shorter lookups
//!
//! # Design Decisions
//! - The trie is byte-level: literal edges are one byte wide at build time
//!   and compression widens them into uniform-length runs, so a pattern
//!   can branch anywhere, not just at `/` boundaries
//! - Placeholder names live with each pattern's terminal, not on trie
//!   nodes, so two patterns may name the same position differently
//! - Lookup backtracks through literal, parameter and wildcard branches
//!   and returns every match; callers pick the winner
//! - Methods are exact string keys here; callers normalize case

use std::collections::HashMap;

use thiserror::Error;

use crate::path::decode_path;

/// Captured placeholder values, keyed by placeholder name.
pub type Params = HashMap<String, String>;

/// Errors detected while tokenizing a path pattern.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// A placeholder name appears twice in one pattern.
    #[error("Duplicate placeholder name: {0}")]
    DuplicateName(String),

    /// A `:` or `*` marker with no name behind it.
    #[error("Placeholder at byte {0} has no name")]
    EmptyName(usize),

    /// A `*name` wildcard that is not the final element of the pattern.
    #[error("Wildcard must end the pattern: *{0}")]
    WildcardNotLast(String),
}

/// One pattern that matched a path.
#[derive(Debug)]
pub struct Match<'t, T> {
    /// The value stored with the pattern.
    pub value: &'t T,
    /// Captured placeholder values, still in match space (an escaped `*`
    /// stays `%2A`).
    pub params: Params,
}

/// A pattern attached at a trie node: the stored value plus the pattern's
/// placeholder names in order of appearance.
#[derive(Debug)]
struct Terminal<T> {
    value: T,
    names: Vec<String>,
}

impl<T> Terminal<T> {
    /// Zip this pattern's placeholder names with the positional captures
    /// collected on the way down.
    fn bind(&self, captures: &[&[u8]]) -> Params {
        debug_assert_eq!(self.names.len(), captures.len());
        self.names
            .iter()
            .zip(captures)
            .map(|(name, value)| (name.clone(), String::from_utf8_lossy(value).into_owned()))
            .collect()
    }
}

#[derive(Debug)]
struct Node<T> {
    /// Literal edges. Every key in the map is `literal_len` bytes long.
    literal: HashMap<Box<[u8]>, Node<T>>,
    literal_len: usize,
    /// Parameter edge (`:name`), at most one per node.
    param: Option<Box<Node<T>>>,
    /// Wildcard edge (`*name`), at most one per node.
    splat: Option<Box<Node<T>>>,
    /// Method to patterns ending here, in insertion order.
    terminals: HashMap<String, Vec<Terminal<T>>>,
}

impl<T> Node<T> {
    fn new() -> Self {
        Self {
            literal: HashMap::new(),
            literal_len: 1,
            param: None,
            splat: None,
            terminals: HashMap::new(),
        }
    }

    /// A plain node carries nothing that would pin its literal children in
    /// place, so a parent may merge through it.
    fn is_plain(&self) -> bool {
        self.terminals.is_empty() && self.param.is_none() && self.splat.is_none()
    }

    fn compress(&mut self) {
        if let Some(child) = &mut self.param {
            child.compress();
        }
        if let Some(child) = &mut self.splat {
            child.compress();
        }
        if self.literal.is_empty() {
            return;
        }
        if self.literal.values().all(Node::is_plain) {
            let mut merged = HashMap::new();
            for (key, child) in self.literal.drain() {
                // children below a merge point have never been compressed
                debug_assert_eq!(child.literal_len, 1);
                for (tail, grandchild) in child.literal {
                    let mut joined = Vec::with_capacity(key.len() + tail.len());
                    joined.extend_from_slice(&key);
                    joined.extend_from_slice(&tail);
                    merged.insert(joined.into_boxed_slice(), grandchild);
                }
            }
            self.literal = merged;
            self.literal_len += 1;
            self.compress();
        } else {
            for child in self.literal.values_mut() {
                child.compress();
            }
        }
    }

    fn walk<'n, 'p>(
        &'n self,
        method: &str,
        remaining: &'p [u8],
        captures: &mut Vec<&'p [u8]>,
        found: &mut Vec<Match<'n, T>>,
        path_matched: &mut bool,
    ) {
        if remaining.is_empty() {
            if !self.terminals.is_empty() {
                *path_matched = true;
                if let Some(entries) = self.terminals.get(method) {
                    for terminal in entries {
                        found.push(Match {
                            value: &terminal.value,
                            params: terminal.bind(captures),
                        });
                    }
                }
            }
            return;
        }
        if !self.literal.is_empty() && remaining.len() >= self.literal_len {
            if let Some(child) = self.literal.get(&remaining[..self.literal_len]) {
                child.walk(
                    method,
                    &remaining[self.literal_len..],
                    captures,
                    found,
                    path_matched,
                );
            }
        }
        if let Some(child) = &self.param {
            let end = param_len(remaining, 0);
            captures.push(&remaining[..end]);
            child.walk(method, &remaining[end..], captures, found, path_matched);
            captures.pop();
        }
        if let Some(child) = &self.splat {
            captures.push(remaining);
            child.walk(method, b"", captures, found, path_matched);
            captures.pop();
        }
    }
}

/// One tokenized element of a path pattern.
enum Step {
    Literal(Vec<u8>),
    Param,
    Splat,
}

/// Pattern matcher over (method, path) pairs.
///
/// Patterns mix literal text with `:name` parameters, which capture up to
/// the next `/` or `.`, and a trailing `*name` wildcard, which captures
/// the whole remainder. Placeholder names must be non-empty and unique
/// within one pattern; across patterns they are free.
#[derive(Debug)]
pub struct Trie<T> {
    root: Node<T>,
}

impl<T> Trie<T> {
    pub fn new() -> Self {
        Self { root: Node::new() }
    }

    /// Insert a pattern under a method.
    ///
    /// Duplicate (method, pattern) pairs are kept in insertion order, not
    /// overwritten. A malformed pattern is rejected without touching the
    /// trie.
    pub fn insert(&mut self, method: &str, path_exp: &str, value: T) -> Result<(), PatternError> {
        let (steps, names) = tokenize(path_exp)?;
        let mut node = &mut self.root;
        for step in steps {
            match step {
                Step::Literal(run) => {
                    for byte in run {
                        node = node.literal.entry(Box::from([byte])).or_insert_with(Node::new);
                    }
                }
                Step::Param => {
                    node = &mut **node.param.get_or_insert_with(|| Box::new(Node::new()));
                }
                Step::Splat => {
                    node = &mut **node.splat.get_or_insert_with(|| Box::new(Node::new()));
                }
            }
        }
        node.terminals
            .entry(method.to_string())
            .or_default()
            .push(Terminal { value, names });
        Ok(())
    }

    /// Merge literal edges into uniform-length runs.
    ///
    /// Purely a lookup-speed rewrite: match outcomes and parameter
    /// bindings are unchanged, and running it again is a no-op. Call once
    /// after all insertions; merged edges assume no literal children are
    /// added below the merge point afterwards.
    pub fn compress(&mut self) {
        self.root.compress();
    }

    /// Find every pattern matching `path` under `method`.
    ///
    /// The boolean reports whether the path reached any terminal at all,
    /// whatever its methods; it stays true even when the method filter
    /// leaves the match list empty. The path is raw bytes because decoded
    /// request paths need not be valid UTF-8.
    pub fn lookup<'p>(&self, method: &str, path: &'p [u8]) -> (Vec<Match<'_, T>>, bool) {
        let mut found = Vec::new();
        let mut path_matched = false;
        let mut captures: Vec<&'p [u8]> = Vec::new();
        self.root
            .walk(method, path, &mut captures, &mut found, &mut path_matched);
        (found, path_matched)
    }
}

impl<T> Default for Trie<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Length of the run from `start` up to the next `/` or `.`: the stop
/// rule shared by parameter names in patterns and captured values in
/// paths.
fn param_len(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i] != b'/' && bytes[i] != b'.' {
        i += 1;
    }
    i - start
}

/// End of the literal run starting at `start`: the next placeholder
/// marker or the end of the pattern.
fn literal_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i] != b':' && bytes[i] != b'*' {
        i += 1;
    }
    i
}

/// Split a pattern into steps and collect its placeholder names, in order
/// of appearance. Literal runs are percent-decoded here so patterns and
/// decoded request paths meet in the same byte space; the `%2A` star
/// escape stays encoded on both sides.
fn tokenize(path_exp: &str) -> Result<(Vec<Step>, Vec<String>), PatternError> {
    let bytes = path_exp.as_bytes();
    let mut steps = Vec::new();
    let mut names: Vec<String> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b':' => {
                let len = param_len(bytes, i + 1);
                if len == 0 {
                    return Err(PatternError::EmptyName(i));
                }
                let name = path_exp[i + 1..i + 1 + len].to_string();
                if names.contains(&name) {
                    return Err(PatternError::DuplicateName(name));
                }
                names.push(name);
                steps.push(Step::Param);
                i += 1 + len;
            }
            b'*' => {
                let name = &path_exp[i + 1..];
                if name.is_empty() {
                    return Err(PatternError::EmptyName(i));
                }
                if name.contains('/') {
                    return Err(PatternError::WildcardNotLast(name.to_string()));
                }
                if names.iter().any(|n| n == name) {
                    return Err(PatternError::DuplicateName(name.to_string()));
                }
                names.push(name.to_string());
                steps.push(Step::Splat);
                i = bytes.len();
            }
            _ => {
                let end = literal_end(bytes, i);
                steps.push(Step::Literal(decode_path(&path_exp[i..end])));
                i = end;
            }
        }
    }
    Ok((steps, names))
}
