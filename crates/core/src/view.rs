//! Search and sort over the task list

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::task::Task;
use crate::Error;

/// Ordering applied to a filtered list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Keep the incoming order
    #[default]
    Default,
    /// Newest first
    Latest,
    /// Oldest first
    Oldest,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Latest => "latest",
            Self::Oldest => "oldest",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "" | "default" => Ok(Self::Default),
            "latest" => Ok(Self::Latest),
            "oldest" => Ok(Self::Oldest),
            _ => Err(Error::Validation(format!("Unknown sort mode '{}'", value))),
        }
    }
}

/// Query for listing tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortMode,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    /// Search text with surrounding whitespace removed, if any is left
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Case-insensitive substring match on title or description
pub fn matches_filter(task: &Task, filter: &str) -> bool {
    let needle = filter.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    task.title.to_lowercase().contains(&needle) || task.description.to_lowercase().contains(&needle)
}

/// Filter then sort; `Default` keeps the input order
pub fn filter_and_sort<'a, I>(tasks: I, filter: &str, sort: SortMode) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut selected: Vec<&Task> = tasks
        .into_iter()
        .filter(|t| matches_filter(t, filter))
        .collect();

    match sort {
        SortMode::Default => {}
        SortMode::Latest => selected.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortMode::Oldest => selected.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }

    selected
}
