//! Query analysis: SQL heuristics, context validation and suggestions

pub mod classify;
pub mod context;
pub mod recommend;
pub mod sql;

use serde::Serialize;

use crate::index::CandidateLine;

pub use sql::{AnalysisIssue, PerformanceRating};

/// Source line the query was matched to
#[derive(Debug, Clone, Serialize)]
pub struct MatchedLine {
    #[serde(flatten)]
    pub line: CandidateLine,
    pub similarity: f32,
    pub query_type: &'static str,
}

/// Everything reported for one analyzed query
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    #[serde(rename = "match")]
    pub matched: MatchedLine,
    pub validated: bool,
    pub validation_methods: Vec<String>,
    pub security_issues: Vec<String>,
    pub issues: Vec<AnalysisIssue>,
    pub suggestions: Vec<String>,
    pub performance_score: u8,
    pub performance_rating: PerformanceRating,
}
