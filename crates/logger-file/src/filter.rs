//! Category based level filtering

use crate::{Error, LogLevel, Result};
use std::collections::BTreeMap;

/// Key of the level map entry that applies to categories without a more
/// specific match.
pub const DEFAULT_CATEGORY: &str = "Default";

/// Resolves the minimum level for a category from a prefix map.
///
/// The longest key that equals the category, or is a prefix of it ending on
/// a `.` boundary, wins. `A.B` matches `A.B` and `A.B.C` but not `A.BC`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    // Sorted by descending key length so the first match is the longest.
    prefixes: Vec<(String, LogLevel)>,
    default: LogLevel,
}

impl CategoryFilter {
    /// Build a filter from a level map.
    ///
    /// An empty map accepts every level. A non-empty map must contain a
    /// [`DEFAULT_CATEGORY`] entry; `path` only labels the error.
    pub fn new(levels: &BTreeMap<String, LogLevel>, path: &str) -> Result<Self> {
        if levels.is_empty() {
            return Ok(Self::accept_all());
        }

        let default = *levels
            .get(DEFAULT_CATEGORY)
            .ok_or_else(|| Error::MissingDefaultLevel {
                path: path.to_string(),
            })?;

        let mut prefixes: Vec<_> = levels
            .iter()
            .filter(|(category, _)| category.as_str() != DEFAULT_CATEGORY)
            .map(|(category, level)| (category.clone(), *level))
            .collect();
        prefixes.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));

        Ok(Self { prefixes, default })
    }

    /// A filter that lets every record through.
    pub const fn accept_all() -> Self {
        Self {
            prefixes: Vec::new(),
            default: LogLevel::Trace,
        }
    }

    /// The effective minimum level for `category`.
    pub fn min_level(&self, category: &str) -> LogLevel {
        self.prefixes
            .iter()
            .find(|(prefix, _)| matches_prefix(category, prefix))
            .map_or(self.default, |(_, level)| *level)
    }

    /// Whether a record of `level` in `category` passes.
    pub fn accepts(&self, category: &str, level: LogLevel) -> bool {
        let min = self.min_level(category);
        min != LogLevel::None && level >= min
    }
}

fn matches_prefix(category: &str, prefix: &str) -> bool {
    category
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}
