//! Heuristic SQL quality rules
//!
//! Text-level checks over a normalized query. Nothing here parses SQL; each
//! rule is a token or regex test that can misfire on unusual input.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

static JOIN_CONDITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bjoin\s+\w+(?:\s+(?:as\s+)?\w+)?\s+on\s+(.*?)(?:\s+where\b|\s+group\b|\s+order\b|\s+limit\b|$)")
        .unwrap()
});

static JOIN_FIELDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\w+)\.(\w+)\s*=\s*(\w+)\.(\w+)").unwrap()
});

static WHERE_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bwhere\s+(.*?)(?:\s+group\b|\s+order\b|\s+limit\b|$)").unwrap()
});

/// Checked in this order; each contributes its own findings
static WHERE_FIELDS: Lazy<[Regex; 4]> = Lazy::new(|| {
    [
        Regex::new(r"(\w+)\s*=\s*\?").unwrap(),
        Regex::new(r#"(\w+)\s*=\s*['"]?\w+['"]?"#).unwrap(),
        Regex::new(r"(\w+)\s+in\s*\(").unwrap(),
        Regex::new(r#"(\w+)\s+like\s*['"]"#).unwrap(),
    ]
});

static SUBQUERY_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s*select\b").unwrap());

static LEADING_WILDCARD: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\blike\s+['"]%"#).unwrap());

/// Filter columns that are indexed in every Laravel schema
const EXEMPT_FIELDS: &[&str] = &["id", "created_at", "updated_at"];

const MAX_SUBQUERIES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    WildcardProjection,
    MissingLimit,
    JoinWithoutCondition,
    JoinFieldIndex,
    WhereFieldIndex,
    NestedSubqueries,
    OrderWithoutLimit,
    GroupWithoutHaving,
    Distinct,
    Union,
    LeadingWildcard,
}

impl Rule {
    /// Points deducted from the performance score when the rule fires
    pub fn penalty(self) -> i32 {
        match self {
            Rule::WildcardProjection => 20,
            Rule::MissingLimit => 15,
            Rule::JoinWithoutCondition => 20,
            Rule::OrderWithoutLimit => 10,
            Rule::Distinct => 10,
            Rule::Union => 10,
            Rule::LeadingWildcard => 10,
            Rule::JoinFieldIndex
            | Rule::WhereFieldIndex
            | Rule::NestedSubqueries
            | Rule::GroupWithoutHaving => 0,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Rule::WildcardProjection | Rule::JoinWithoutCondition | Rule::LeadingWildcard => {
                Severity::Critical
            }
            Rule::MissingLimit | Rule::NestedSubqueries | Rule::OrderWithoutLimit => Severity::Warning,
            Rule::JoinFieldIndex
            | Rule::WhereFieldIndex
            | Rule::GroupWithoutHaving
            | Rule::Distinct
            | Rule::Union => Severity::Info,
        }
    }
}

/// One heuristic finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisIssue {
    pub rule: Rule,
    pub message: String,
}

impl AnalysisIssue {
    fn new(rule: Rule, message: impl Into<String>) -> Self {
        Self { rule, message: message.into() }
    }

    pub fn severity(&self) -> Severity {
        self.rule.severity()
    }

    pub fn penalty(&self) -> i32 {
        self.rule.penalty()
    }

    pub fn marker(&self) -> &'static str {
        match (self.rule, self.severity()) {
            (Rule::JoinFieldIndex | Rule::WhereFieldIndex, _) => "📊",
            (_, Severity::Critical) => "🚨",
            (_, Severity::Warning) => "⚠️",
            (_, Severity::Info) => "💡",
        }
    }
}

impl fmt::Display for AnalysisIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.marker(), self.message)
    }
}

impl Serialize for AnalysisIssue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceRating {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl PerformanceRating {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::Excellent,
            75..=89 => Self::Good,
            60..=74 => Self::Fair,
            40..=59 => Self::Poor,
            _ => Self::Critical,
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            Self::Excellent => "🟢",
            Self::Good => "🟡",
            Self::Fair => "🟠",
            Self::Poor | Self::Critical => "🔴",
        }
    }
}

impl fmt::Display for PerformanceRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::Critical => "Critical",
        };
        f.write_str(label)
    }
}

/// Lower-case and collapse whitespace runs
pub fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Word tokens of a normalized query
struct Tokens<'a> {
    words: Vec<&'a str>,
}

impl<'a> Tokens<'a> {
    fn new(sql: &'a str) -> Self {
        Self {
            words: sql
                .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    fn has(&self, word: &str) -> bool {
        self.words.iter().any(|w| *w == word)
    }

    fn has_pair(&self, first: &str, second: &str) -> bool {
        self.words.windows(2).any(|w| w[0] == first && w[1] == second)
    }
}

/// Run every rule over `sql`; findings come back in rule order.
pub fn analyze(sql: &str) -> Vec<AnalysisIssue> {
    let sql = normalize_sql(sql);
    let tokens = Tokens::new(&sql);
    let mut issues = Vec::new();

    let has_limit = tokens.has("limit");

    if sql.contains("select *") {
        issues.push(AnalysisIssue::new(
            Rule::WildcardProjection,
            "Avoid SELECT * — only select necessary columns to reduce data transfer and improve performance.",
        ));
    }

    if !has_limit && (tokens.has("select") || tokens.has("union")) {
        issues.push(AnalysisIssue::new(
            Rule::MissingLimit,
            "No LIMIT clause — may return huge result sets. Add LIMIT for pagination.",
        ));
    }

    if tokens.has("join") {
        if !tokens.has("on") {
            issues.push(AnalysisIssue::new(
                Rule::JoinWithoutCondition,
                "JOIN without ON clause detected — may result in Cartesian product.",
            ));
        } else {
            for condition in JOIN_CONDITION.captures_iter(&sql) {
                for fields in JOIN_FIELDS.captures_iter(&condition[1]) {
                    for (table, field) in [(&fields[1], &fields[2]), (&fields[3], &fields[4])] {
                        issues.push(AnalysisIssue::new(
                            Rule::JoinFieldIndex,
                            format!("Ensure JOIN field '{}.{}' is indexed for optimal performance.", table, field),
                        ));
                    }
                }
            }
        }
    }

    if let Some(clause) = WHERE_CLAUSE.captures(&sql) {
        let clause = &clause[1];
        for pattern in WHERE_FIELDS.iter() {
            for caps in pattern.captures_iter(clause) {
                let field = &caps[1];
                if !EXEMPT_FIELDS.contains(&field) {
                    issues.push(AnalysisIssue::new(
                        Rule::WhereFieldIndex,
                        format!("Ensure WHERE field '{}' is indexed for optimal filtering.", field),
                    ));
                }
            }
        }
    }

    if SUBQUERY_OPEN.find_iter(&sql).count() > MAX_SUBQUERIES {
        issues.push(AnalysisIssue::new(
            Rule::NestedSubqueries,
            "Multiple subqueries detected — consider using JOINs or EXISTS for better performance.",
        ));
    }

    if tokens.has_pair("order", "by") && !has_limit {
        issues.push(AnalysisIssue::new(
            Rule::OrderWithoutLimit,
            "ORDER BY without LIMIT — sorting large datasets can be expensive.",
        ));
    }

    if tokens.has_pair("group", "by") && !tokens.has("having") {
        issues.push(AnalysisIssue::new(
            Rule::GroupWithoutHaving,
            "Consider adding HAVING clause if you need to filter grouped results.",
        ));
    }

    if tokens.has("distinct") {
        issues.push(AnalysisIssue::new(
            Rule::Distinct,
            "DISTINCT can be expensive on large datasets — ensure it's necessary.",
        ));
    }

    if tokens.has("union") {
        issues.push(AnalysisIssue::new(
            Rule::Union,
            "UNION operations can be expensive — consider if UNION ALL would suffice.",
        ));
    }

    if LEADING_WILDCARD.is_match(&sql) {
        issues.push(AnalysisIssue::new(
            Rule::LeadingWildcard,
            "LIKE with leading wildcard detected — this prevents index usage. Consider full-text search.",
        ));
    }

    issues
}

/// Performance score in `[0, 100]`.
pub fn score(sql: &str, issues: &[AnalysisIssue], validated: bool) -> u8 {
    let sql = normalize_sql(sql);
    let tokens = Tokens::new(&sql);

    let mut score: i32 = 100;
    score -= issues.iter().map(AnalysisIssue::penalty).sum::<i32>();

    if issues.len() > 3 {
        score -= 5;
    }
    if !validated {
        score -= 5;
    }

    for bonus in ["limit", "index", "explain"] {
        if tokens.has(bonus) {
            score += 5;
        }
    }

    score.clamp(0, 100) as u8
}
