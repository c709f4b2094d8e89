//! Smallest window of consecutive lines that is unique everywhere in a file.
//!
//! Used to size the context around an edit so the anchor text matches once.

use std::collections::HashSet;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MinContextError {
    #[error("file content is empty")]
    Empty,
}

/// Returns the minimum `k` such that every run of `k` consecutive lines in
/// `lines` occurs only once.
pub fn calculate_min_context<S: AsRef<str>>(lines: &[S]) -> Result<usize, MinContextError> {
    if lines.is_empty() {
        return Err(MinContextError::Empty);
    }

    let lines: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();
    let k = (1..=lines.len())
        .find(|&k| {
            let mut seen = HashSet::with_capacity(lines.len() + 1 - k);
            lines.windows(k).all(|window| seen.insert(window))
        })
        .unwrap_or(lines.len());

    Ok(k)
}
