//! Input validation heuristics around a matched line
//!
//! Looks for Laravel validation, output escaping and raw superglobal access
//! in the lines surrounding a match. Proximity is all this checks: a
//! `validate(` call twenty lines away counts even if it guards a different
//! request field.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_WINDOW: usize = 20;

static VALIDATION_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"validate\(",
        r"formrequest",
        r"request->validate",
        r"validator::make",
        r"->rules\(",
        r"->messages\(",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static SANITIZE_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"escape\(",
        r"htmlspecialchars",
        r"strip_tags",
        r"filter_var",
        r"preg_replace",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

const SUPERGLOBALS: &[&str] = &["$_get", "$_post", "$_request"];

/// Any of these on the same line clears a superglobal access
const GUARD_TOKENS: &[&str] = &["validate", "escape", "filter"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub validated: bool,
    pub validation_methods: Vec<String>,
    pub security_issues: Vec<String>,
}

/// Scan `window` lines either side of `line_number` (1-based) in `file_path`.
///
/// The file is read fresh on every call. An unreadable file yields an empty,
/// unvalidated report.
pub fn validate(file_path: &Path, line_number: usize, window: usize) -> ValidationReport {
    let bytes = match std::fs::read(file_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Cannot read {} for context check: {}", file_path.display(), e);
            return ValidationReport::default();
        }
    };
    let content = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = content.lines().collect();

    scan_lines(&lines, line_number, window)
}

fn scan_lines(lines: &[&str], line_number: usize, window: usize) -> ValidationReport {
    let mut report = ValidationReport::default();
    if lines.is_empty() {
        return report;
    }

    let center = line_number.max(1);
    let first = center.saturating_sub(window).max(1);
    let last = center.saturating_add(window).min(lines.len());

    for number in first..=last {
        let original = lines[number - 1].trim();
        let lower = original.to_lowercase();

        // one entry per matching marker, so a line can be listed twice
        for _ in VALIDATION_MARKERS.iter().filter(|re| re.is_match(&lower)) {
            report.validated = true;
            report.validation_methods.push(format!("Line {}: {}", number, original));
        }

        for _ in SANITIZE_MARKERS.iter().filter(|re| re.is_match(&lower)) {
            report.validated = true;
            report.validation_methods.push(format!("Line {}: Security - {}", number, original));
        }

        if SUPERGLOBALS.iter().any(|g| lower.contains(g))
            && !GUARD_TOKENS.iter().any(|t| lower.contains(t))
        {
            report.security_issues.push(format!(
                "Line {}: Direct superglobal access without validation",
                number
            ));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn controller(lines: &[&str]) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Controller.php");
        fs::write(&path, lines.join("\n")).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_file_is_unvalidated() {
        let report = validate(Path::new("/no/such/Controller.php"), 10, DEFAULT_WINDOW);
        assert_eq!(report, ValidationReport::default());
        assert!(!report.validated);
    }

    #[test]
    fn test_detects_request_validation() {
        let (_dir, path) = controller(&[
            "<?php",
            "public function store(Request $request)",
            "{",
            "    $data = $request->validate(['email' => 'required|email']);",
            "    return DB::table('users')->insert($data);",
            "}",
        ]);
        let report = validate(&path, 5, DEFAULT_WINDOW);
        assert!(report.validated);
        // `validate(` and `request->validate` both match
        let entry = "Line 4: $data = $request->validate(['email' => 'required|email']);".to_string();
        assert_eq!(report.validation_methods, vec![entry.clone(), entry]);
        assert!(report.security_issues.is_empty());
    }

    #[test]
    fn test_each_matching_marker_adds_an_entry() {
        let lines = [
            "$v = Validator::make($in, $rules)->validate();",
            "$clean = strip_tags(htmlspecialchars($raw));",
            "DB::table('t')->get();",
        ];
        let report = scan_lines(&lines, 3, DEFAULT_WINDOW);
        assert_eq!(
            report.validation_methods,
            vec![
                "Line 1: $v = Validator::make($in, $rules)->validate();".to_string(),
                "Line 1: $v = Validator::make($in, $rules)->validate();".to_string(),
                "Line 2: Security - $clean = strip_tags(htmlspecialchars($raw));".to_string(),
                "Line 2: Security - $clean = strip_tags(htmlspecialchars($raw));".to_string(),
            ]
        );
    }

    #[test]
    fn test_sanitizer_counts_as_validation() {
        let (_dir, path) = controller(&[
            "$name = htmlspecialchars($input);",
            "DB::select('select * from users where name = ?', [$name]);",
        ]);
        let report = validate(&path, 2, DEFAULT_WINDOW);
        assert!(report.validated);
        assert_eq!(report.validation_methods, vec!["Line 1: Security - $name = htmlspecialchars($input);".to_string()]);
    }

    #[test]
    fn test_flags_unguarded_superglobals() {
        let (_dir, path) = controller(&[
            "$id = $_GET['id'];",
            "$safe = filter_var($_POST['n'], FILTER_VALIDATE_INT);",
            "DB::select(\"select * from t where id = $id\");",
        ]);
        let report = validate(&path, 3, DEFAULT_WINDOW);
        assert_eq!(
            report.security_issues,
            vec!["Line 1: Direct superglobal access without validation".to_string()]
        );
    }

    #[test]
    fn test_window_is_clamped_and_bounded() {
        let mut lines = vec!["// filler"; 60];
        lines[0] = "$request->validate([]);";
        lines[59] = "$x = $_REQUEST['x'];";
        let (_dir, path) = controller(&lines);

        let near_top = validate(&path, 3, 3);
        assert!(near_top.validated);
        assert!(near_top.security_issues.is_empty());

        let middle = validate(&path, 30, 3);
        assert_eq!(middle, ValidationReport::default());

        let bottom = validate(&path, 60, 20);
        assert!(!bottom.validated);
        assert_eq!(bottom.security_issues.len(), 1);
        assert!(bottom.security_issues[0].starts_with("Line 60:"));
    }

    #[test]
    fn test_line_past_end_still_scans_tail() {
        let (_dir, path) = controller(&["Validator::make($in, $rules);", "DB::table('a')->get();"]);
        let report = validate(&path, 15, DEFAULT_WINDOW);
        assert!(report.validated);
    }
}
