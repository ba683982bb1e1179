//! Path rewrite rules and the search filter.
//!
//! Example for path "Arm/Hand", search "Hand", text "Left":
//!   Prefix -> "Left/Arm/Hand"
//!   Infix  -> "Arm/Left"
//!   Suffix -> "Arm/Hand/Left"

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RemapError;

/// How a matched path is rewritten.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewriteMode {
    /// Prepend `text/` to the path.
    #[default]
    Prefix,
    /// Replace every occurrence of the search term with `text`.
    Infix,
    /// Append `/text` to the path.
    Suffix,
}

impl RewriteMode {
    pub const ALL: [RewriteMode; 3] = [RewriteMode::Prefix, RewriteMode::Infix, RewriteMode::Suffix];

    /// Compute the rewritten path. Pure; never fails.
    pub fn rewrite(self, path: &str, search: &str, text: &str) -> String {
        match self {
            RewriteMode::Prefix => {
                if text.is_empty() {
                    path.to_string()
                } else {
                    format!("{text}/{path}")
                }
            }
            RewriteMode::Infix => {
                // str::replace with an empty pattern would insert between every char.
                if search.is_empty() {
                    path.to_string()
                } else {
                    path.replace(search, text)
                }
            }
            RewriteMode::Suffix => {
                if text.is_empty() {
                    path.to_string()
                } else {
                    format!("{path}/{text}")
                }
            }
        }
    }

    /// Check that `apply` would do something meaningful with these inputs.
    ///
    /// Prefix/Suffix need rename text. Infix needs a search term; an empty
    /// replacement is allowed and strips the term from matching paths.
    pub fn validate(self, search: &str, text: &str) -> Result<(), RemapError> {
        let reason = match self {
            RewriteMode::Prefix | RewriteMode::Suffix if text.is_empty() => "rename text is empty",
            RewriteMode::Infix if search.is_empty() => "search term is empty",
            _ => return Ok(()),
        };
        Err(RemapError::InvalidInput {
            mode: self,
            reason: reason.to_string(),
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RewriteMode::Prefix => "prefix",
            RewriteMode::Infix => "infix",
            RewriteMode::Suffix => "suffix",
        }
    }
}

impl fmt::Display for RewriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewriteMode {
    type Err = String;

    /// Accepts the mode names case-insensitively; "between" is an alias for infix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prefix" => Ok(RewriteMode::Prefix),
            "infix" | "between" | "{between}" => Ok(RewriteMode::Infix),
            "suffix" => Ok(RewriteMode::Suffix),
            other => Err(format!("unknown rewrite mode '{other}'")),
        }
    }
}

/// Filter predicate: an empty term matches everything, otherwise a literal,
/// case-sensitive substring test.
#[inline]
pub fn matches(path: &str, search: &str) -> bool {
    search.is_empty() || path.contains(search)
}

/// Unwrap the brace form `{term}` used by the editor's search box.
///
/// Returns the contents of the first `{...}` group, or the input unchanged when
/// no closed group is present.
pub fn search_term(raw: &str) -> &str {
    if let Some(open) = raw.find('{') {
        let rest = &raw[open + 1..];
        if let Some(close) = rest.find('}') {
            return &rest[..close];
        }
    }
    raw
}

/// The inputs of one preview.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemapRequest {
    pub text: String,
    pub search: String,
    pub mode: RewriteMode,
}

impl RemapRequest {
    pub fn new(text: impl Into<String>, search: impl Into<String>, mode: RewriteMode) -> Self {
        Self {
            text: text.into(),
            search: search.into(),
            mode,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        matches(path, &self.search)
    }

    pub fn rewrite(&self, path: &str) -> String {
        self.mode.rewrite(path, &self.search, &self.text)
    }

    pub fn validate(&self) -> Result<(), RemapError> {
        self.mode.validate(&self.search, &self.text)
    }
}
