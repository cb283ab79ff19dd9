use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mean runtime for one release year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRuntime {
    pub year: i32,
    pub average_runtime: f64,
}

/// Aggregate statistics over the cached corpus
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieStats {
    /// Genre -> number of records listing it
    pub genre_counts: BTreeMap<String, u64>,

    /// Mean rating over rated records, `None` when nothing is rated
    pub average_rating: Option<f64>,

    /// Sorted by year ascending
    pub average_runtime_by_year: Vec<YearRuntime>,
}
