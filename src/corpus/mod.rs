//! Test corpus discovery module
//!
//! Responsible for:
//! - Expanding `{a,b}` brace groups and glob wildcards against a root directory
//! - Dropping auxiliary files by suffix (disassembly `.dump` files)
//! - Dropping paths that contain a skip-list entry
//! - Deduplicating and ordering the result deterministically

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::{debug, warn};

use crate::error::{HarnessError, Result};
use crate::models::TestCase;

/// Everything needed to turn patterns into test cases
#[derive(Debug, Clone, Copy)]
pub struct CorpusQuery<'a> {
    pub root: &'a Path,
    pub patterns: &'a [String],
    /// Substrings; any path containing one is excluded (case-sensitive)
    pub skip: &'a [String],
    pub excluded_suffixes: &'a [String],
}

/// Resolve the query into a sorted, deduplicated list of test cases.
///
/// A pattern that matches nothing contributes nothing; only a syntactically
/// invalid pattern is an error.
pub fn resolve(query: &CorpusQuery<'_>) -> Result<Vec<TestCase>> {
    let mut found = BTreeSet::new();

    for pattern in query.patterns {
        for expanded in expand_braces(pattern) {
            let full = qualify(query.root, &expanded);
            let paths = glob::glob(&full).map_err(|source| HarnessError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;

            for entry in paths {
                match entry {
                    Ok(path) => {
                        if is_candidate(&path, query) {
                            found.insert(path);
                        }
                    }
                    Err(err) => warn!("Skipping unreadable entry: {}", err),
                }
            }
        }
    }

    debug!("resolved {} test programs from {} patterns", found.len(), query.patterns.len());
    Ok(found.into_iter().map(TestCase::new).collect())
}

fn is_candidate(path: &Path, query: &CorpusQuery<'_>) -> bool {
    if !path.is_file() {
        return false;
    }

    let text = path.to_string_lossy();
    if query
        .excluded_suffixes
        .iter()
        .any(|suffix| !suffix.is_empty() && text.ends_with(suffix.as_str()))
    {
        return false;
    }

    !query
        .skip
        .iter()
        .any(|entry| !entry.is_empty() && text.contains(entry.as_str()))
}

/// Join a relative pattern onto the root, escaping glob syntax in the root itself
fn qualify(root: &Path, pattern: &str) -> String {
    if Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }
    let root = Pattern::escape(&root.to_string_lossy());
    PathBuf::from(root).join(pattern).to_string_lossy().into_owned()
}

/// Expand shell-style brace groups: `rv64u{i,m}-p*` -> `rv64ui-p*`, `rv64um-p*`.
///
/// Groups may nest. An unmatched `{` is left as a literal.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };

    let mut depth = 0usize;
    let mut close = None;
    let mut splits = Vec::new();
    for (offset, ch) in pattern[open..].char_indices() {
        let index = open + offset;
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(index);
                    break;
                }
            }
            ',' if depth == 1 => splits.push(index),
            _ => {}
        }
    }

    let Some(close) = close else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    let mut bounds = vec![open];
    bounds.extend(splits);
    bounds.push(close);

    bounds
        .windows(2)
        .flat_map(|pair| {
            let alternative = &pattern[pair[0] + 1..pair[1]];
            expand_braces(&format!("{}{}{}", prefix, alternative, suffix))
        })
        .collect()
}
