//! Query type classification for matched source lines

/// How a rule decides whether a (lower-cased) line belongs to its category
#[derive(Debug, Clone, Copy)]
enum Matcher {
    /// At least one needle present
    Any(&'static [&'static str]),
    /// Every needle present
    All(&'static [&'static str]),
}

impl Matcher {
    fn matches(self, line: &str) -> bool {
        match self {
            Matcher::Any(needles) => needles.iter().any(|n| line.contains(n)),
            Matcher::All(needles) => needles.iter().all(|n| line.contains(n)),
        }
    }
}

pub const UNKNOWN_QUERY_TYPE: &str = "Unknown Query Type";

/// Ordered from raw SQL (highest risk) down to ORM helpers; first match wins.
const RULES: &[(Matcher, &str)] = &[
    (Matcher::Any(&["db::select", "db::statement"]), "Raw SQL (High Performance Risk)"),
    (Matcher::Any(&["db::raw"]), "Raw SQL with DB::raw (High Performance Risk)"),
    (Matcher::Any(&["db::table"]), "Query Builder (Moderate Performance Risk)"),
    (Matcher::Any(&["db::connection"]), "Query Builder with Custom Connection"),
    (Matcher::All(&["->where", "::"]), "Eloquent ORM (Lower Performance Risk)"),
    (Matcher::Any(&["->get()"]), "Eloquent Collection (Memory Intensive)"),
    (Matcher::Any(&["->paginate"]), "Eloquent Pagination (Good Performance)"),
    (Matcher::Any(&["->chunk"]), "Eloquent Chunking (Good for Large Datasets)"),
    (Matcher::Any(&["->with("]), "Eloquent Eager Loading (Good Performance)"),
    (Matcher::Any(&["->load("]), "Eloquent Lazy Loading (Potential N+1)"),
    (Matcher::Any(&["->join("]), "Eloquent Join (Moderate Performance Risk)"),
    (Matcher::Any(&["->leftjoin("]), "Eloquent Left Join (Moderate Performance Risk)"),
    (Matcher::Any(&["->count("]), "Eloquent Count (Good Performance)"),
    (Matcher::Any(&["->sum(", "->avg("]), "Eloquent Aggregation (Good Performance)"),
    (Matcher::Any(&["->wherehas("]), "Eloquent WhereHas (Potential Performance Issue)"),
    (Matcher::Any(&["->wheredoesnthave("]), "Eloquent WhereDoesntHave (Potential Performance Issue)"),
];

/// Map a source line to exactly one query category.
pub fn classify(line: &str) -> &'static str {
    let lower = line.to_lowercase();
    RULES
        .iter()
        .find(|(matcher, _)| matcher.matches(&lower))
        .map(|(_, category)| *category)
        .unwrap_or(UNKNOWN_QUERY_TYPE)
}
