use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::EditorResult;

/// One stock photo returned by a background search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub preview_url: String,
    pub full_url: String,
    pub width: u32,
    pub height: u32,
    pub attribution: String,
}

pub trait ImageSearch {
    fn search<'a>(&'a self, query: &'a str) -> LocalBoxFuture<'a, EditorResult<Vec<SearchResult>>>;

    /// Report that a result was used. Fire and forget: failures are only logged.
    fn track_download(&self, result_id: &str);
}
