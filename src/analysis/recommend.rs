//! Suggestion list assembly

use super::sql::AnalysisIssue;

/// How many validation methods / security issues get summarized
const SUMMARY_LIMIT: usize = 3;

const VALIDATION_GUIDANCE: &[&str] = &[
    "🔐 **Security**: Implement Laravel validation using `$request->validate()` or FormRequest classes.",
    "🔐 **Security**: Use Laravel's built-in CSRF protection and input sanitization.",
];

const SELECT_STAR_TIPS: &[&str] = &[
    "📊 **Performance**: Replace SELECT * with specific columns using `select('id', 'name', 'email')`",
    "📊 **Performance**: Use Eloquent's `select()` method for better type safety",
];

const JOIN_TIPS: &[&str] = &[
    "🔗 **Joins**: Consider using Eloquent relationships instead of manual JOINs",
    "🔗 **Joins**: Use `with()` for eager loading to avoid N+1 queries",
];

const PAGINATION_TIPS: &[&str] = &[
    "📄 **Pagination**: Implement pagination using `paginate()` or `simplePaginate()`",
    "📄 **Pagination**: For large datasets, use `chunk()` for memory efficiency",
];

const SORTING_TIPS: &[&str] = &[
    "📈 **Sorting**: Ensure ORDER BY columns are indexed",
    "📈 **Sorting**: Consider using database indexes for frequently sorted columns",
];

/// Appended to every suggestion list
pub const GENERAL_TIPS: &[&str] = &[
    "💾 **Caching**: Implement Redis caching for frequently accessed data",
    "💾 **Caching**: Use Laravel's `remember()` method for query result caching",
    "🗄️ **Database**: Run `EXPLAIN` on your query to analyze execution plan",
    "🗄️ **Database**: Consider adding composite indexes for multi-column WHERE clauses",
    "⚡ **Code**: Use Eloquent's `lazy()` for large result sets",
    "⚡ **Code**: Implement database query logging in development",
    "⚡ **Code**: Use Laravel Telescope for query monitoring in development",
];

/// Build the ordered suggestion list for one analyzed query.
pub fn compose(
    query: &str,
    validated: bool,
    issues: &[AnalysisIssue],
    validation_methods: &[String],
    security_issues: &[String],
) -> Vec<String> {
    let mut suggestions: Vec<String> = Vec::new();

    if !validated {
        push_all(&mut suggestions, VALIDATION_GUIDANCE);
    }

    if !validation_methods.is_empty() {
        suggestions.push(format!(
            "✅ **Validation Found**: {}",
            summarize(validation_methods)
        ));
    }

    if !security_issues.is_empty() {
        suggestions.push(format!("🚨 **Security Issues**: {}", summarize(security_issues)));
    }

    suggestions.extend(issues.iter().map(|i| i.to_string()));

    let query = query.to_lowercase();

    if query.contains("select *") {
        push_all(&mut suggestions, SELECT_STAR_TIPS);
    }
    if query.contains("join") {
        push_all(&mut suggestions, JOIN_TIPS);
    }
    if query.contains("where") && !query.contains("limit") {
        push_all(&mut suggestions, PAGINATION_TIPS);
    }
    if query.contains("order by") {
        push_all(&mut suggestions, SORTING_TIPS);
    }

    push_all(&mut suggestions, GENERAL_TIPS);

    suggestions
}

fn push_all(out: &mut Vec<String>, tips: &[&str]) {
    out.extend(tips.iter().map(|t| t.to_string()));
}

fn summarize(items: &[String]) -> String {
    items
        .iter()
        .take(SUMMARY_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
