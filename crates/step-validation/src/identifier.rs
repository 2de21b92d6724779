//! Identifier format and uniqueness checks
//!
//! Step identifiers are slugs that must be unique within the enclosing
//! stage's step list.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use step_model::StepFormData;

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z_][0-9a-zA-Z_]*$").expect("identifier pattern is valid")
});

/// Words the expression engine reserves
pub const RESERVED_IDENTIFIERS: &[&str] = &[
    "or", "and", "eq", "ne", "lt", "gt", "le", "ge", "div", "mod", "not", "null", "true",
    "false", "new", "var", "return", "step", "parallel", "stepGroup", "org", "account",
    "status", "liteEngineTask",
];

/// Identifier format problems
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// Not a valid slug
    #[error("invalid identifier: '{0}'")]
    InvalidFormat(String),

    /// Reserved word
    #[error("identifier '{0}' is reserved")]
    Reserved(String),
}

/// Check identifier format
///
/// # Errors
/// Returns error if the identifier is not a slug or is reserved
pub fn check_identifier_format(identifier: &str) -> Result<(), IdentifierError> {
    if !IDENTIFIER_PATTERN.is_match(identifier) {
        return Err(IdentifierError::InvalidFormat(identifier.to_string()));
    }
    if RESERVED_IDENTIFIERS.contains(&identifier) {
        return Err(IdentifierError::Reserved(identifier.to_string()));
    }
    Ok(())
}

/// Two steps sharing one identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateIdentifier {
    /// Shared identifier
    pub identifier: String,

    /// Index of the first step
    pub first_index: usize,

    /// Index of the later step
    pub second_index: usize,
}

/// Find every pair of steps sharing an identifier
///
/// Empty identifiers are reported by required-field validation instead.
///
/// # Performance
/// O(n²) in the number of steps; stages hold tens of steps at most.
#[must_use]
pub fn find_duplicate_identifiers(steps: &[StepFormData]) -> Vec<DuplicateIdentifier> {
    let mut duplicates = Vec::new();
    for i in 0..steps.len() {
        if steps[i].identifier.is_empty() {
            continue;
        }
        for j in (i + 1)..steps.len() {
            if steps[i].identifier == steps[j].identifier {
                duplicates.push(DuplicateIdentifier {
                    identifier: steps[i].identifier.clone(),
                    first_index: i,
                    second_index: j,
                });
            }
        }
    }
    duplicates
}

/// Derive an identifier from a display name
///
/// `"Call API #2"` → `"Call_API_2"`
#[must_use]
pub fn identifier_from_name(name: &str) -> String {
    let mut out: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    while out.contains("__") {
        out = out.replace("__", "_");
    }
    let out = out.trim_matches('_').to_string();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{out}")
    } else {
        out
    }
}

/// First identifier of the form `base`, `base_1`, `base_2`, ... not in `taken`
#[must_use]
pub fn next_free_identifier<'a, I>(base: &str, taken: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<&str> = taken.into_iter().collect();
    if !base.is_empty() && !taken.contains(base) {
        return base.to_string();
    }
    let mut n = 1usize;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}
