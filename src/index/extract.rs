//! Candidate line extraction
//!
//! Walks a Laravel project and yields every source line that looks like it
//! issues a query. The filter is a cheap case-insensitive substring test.

use std::path::{Path, PathBuf};

use ignore::gitignore::Gitignore;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use super::CandidateLine;
use crate::config::{FilterMode, IndexConfig};
use crate::error::{ForgeError, ForgeResult};

/// Raw DB facade calls, query builder / Eloquent calls and bare SQL keywords
pub const BROAD_PATTERNS: &[&str] = &[
    "db::select", "db::statement", "db::raw", "db::table",
    "->where(", "->join(", "->leftjoin(", "->rightjoin(",
    "->select(", "->get()", "->first()", "->find(",
    "->with(", "->load(", "->paginate(", "->chunk(",
    "select ", "insert ", "update ", "delete ",
];

pub const NARROW_PATTERNS: &[&str] = &["select"];

/// Case-insensitive substring filter over source lines
#[derive(Debug, Clone)]
pub struct LineFilter {
    patterns: Vec<String>,
}

impl LineFilter {
    pub fn broad() -> Self {
        Self::custom(BROAD_PATTERNS.iter().copied())
    }

    pub fn narrow() -> Self {
        Self::custom(NARROW_PATTERNS.iter().copied())
    }

    pub fn custom<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &IndexConfig) -> Self {
        if !config.patterns.is_empty() {
            return Self::custom(&config.patterns);
        }
        match config.filter {
            FilterMode::Broad => Self::broad(),
            FilterMode::Narrow => Self::narrow(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn matches(&self, line: &str) -> bool {
        if line.trim().is_empty() {
            return false;
        }
        let lower = line.to_lowercase();
        self.patterns.iter().any(|p| lower.contains(p.as_str()))
    }
}

/// Outcome of one extraction run
#[derive(Debug)]
pub struct Extraction {
    pub scan_root: PathBuf,
    pub lines: Vec<CandidateLine>,
    pub files_scanned: usize,
    pub files_failed: usize,
    pub cap_reached: bool,
}

/// Collect candidate lines under `root`.
///
/// Output order follows a file-name-sorted walk, then line order, so two
/// runs over an unchanged tree produce identical sequences.
pub fn extract_candidates(root: &Path, config: &IndexConfig) -> ForgeResult<Extraction> {
    if !root.is_dir() {
        return Err(ForgeError::InvalidRoot(root.to_path_buf()));
    }

    let scan_root = resolve_scan_root(root, config.scan_subdir.as_deref());
    let filter = LineFilter::from_config(config);
    info!("Scanning path: {}", scan_root.display());
    debug!("Line filter patterns: {:?}", filter.patterns());

    let gitignore_path = scan_root.join(".gitignore");
    let gitignore = if config.respect_gitignore && gitignore_path.exists() {
        Gitignore::new(&gitignore_path).0
    } else {
        Gitignore::empty()
    };

    let mut extraction = Extraction {
        scan_root: scan_root.clone(),
        lines: Vec::new(),
        files_scanned: 0,
        files_failed: 0,
        cap_reached: false,
    };

    let walker = WalkDir::new(&scan_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            if e.file_type().is_dir() && is_excluded_dir(e, &scan_root, &config.exclude_dirs) {
                return false;
            }
            !gitignore.matched(e.path(), e.file_type().is_dir()).is_ignore()
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() || !has_extension(entry.path(), &config.extensions) {
            continue;
        }

        if extraction.files_scanned >= config.max_files {
            extraction.cap_reached = true;
            debug!("File cap of {} reached, stopping walk", config.max_files);
            break;
        }

        let path = entry.path();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Error reading {}: {}", path.display(), e);
                extraction.files_failed += 1;
                continue;
            }
        };

        let content = String::from_utf8_lossy(&bytes);
        let file_path = path.display().to_string();
        for (i, raw) in content.lines().enumerate() {
            if filter.matches(raw) {
                extraction.lines.push(CandidateLine {
                    file_path: file_path.clone(),
                    line_number: i + 1,
                    text: raw.trim().to_string(),
                });
            }
        }

        extraction.files_scanned += 1;
        if extraction.files_scanned % 10 == 0 {
            info!(
                "Processed {} files, found {} SQL lines",
                extraction.files_scanned,
                extraction.lines.len()
            );
        }
    }

    info!(
        "Extraction complete: {} files processed, {} SQL lines found",
        extraction.files_scanned,
        extraction.lines.len()
    );

    Ok(extraction)
}

fn resolve_scan_root(root: &Path, subdir: Option<&str>) -> PathBuf {
    match subdir {
        Some(sub) if !sub.is_empty() => {
            let candidate = root.join(sub);
            if candidate.is_dir() {
                candidate
            } else {
                warn!(
                    "{} does not exist, scanning root path: {}",
                    candidate.display(),
                    root.display()
                );
                root.to_path_buf()
            }
        }
        _ => root.to_path_buf(),
    }
}

/// Plain names match any directory with that name; entries containing `/`
/// match the tail of the path relative to the scan root.
fn is_excluded_dir(entry: &DirEntry, scan_root: &Path, exclude: &[String]) -> bool {
    let name = entry.file_name().to_string_lossy();
    let relative = entry
        .path()
        .strip_prefix(scan_root)
        .unwrap_or(entry.path())
        .to_string_lossy()
        .replace('\\', "/");

    exclude.iter().any(|pattern| {
        let pattern = pattern.trim_matches('/');
        if pattern.contains('/') {
            relative == pattern || relative.ends_with(&format!("/{}", pattern))
        } else {
            name == pattern
        }
    })
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn laravel_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app/Http/Controllers/OrderController.php",
            "<?php\n\nclass OrderController\n{\n    public function index()\n    {\n        $orders = DB::select('SELECT * FROM orders WHERE company_id = ?', [1]);\n        return Order::where('status', 'active')->get();\n    }\n}\n",
        );
        write(
            dir.path(),
            "app/Models/Order.php",
            "<?php\nclass Order extends Model\n{\n    protected $table = 'orders';\n}\n",
        );
        write(
            dir.path(),
            "app/vendor/Lib.php",
            "<?php\n$x = DB::table('hidden')->get();\n",
        );
        write(dir.path(), "app/notes.txt", "select * from ignored\n");
        dir
    }

    #[test]
    fn test_broad_filter_patterns() {
        let filter = LineFilter::broad();
        assert!(filter.matches("$q = DB::table('users')->first();"));
        assert!(filter.matches("User::with('roles')->paginate(15);"));
        assert!(filter.matches("UPDATE users SET name = ?"));
        assert!(!filter.matches("return view('home');"));
        assert!(!filter.matches("   "));
    }

    #[test]
    fn test_narrow_filter_only_select() {
        let filter = LineFilter::narrow();
        assert!(filter.matches("DB::select('Select id from users')"));
        assert!(!filter.matches("Order::where('id', 1)->get();"));
    }

    #[test]
    fn test_custom_patterns_override_mode() {
        let config = IndexConfig {
            patterns: vec!["->Cursor(".to_string()],
            ..IndexConfig::default()
        };
        let filter = LineFilter::from_config(&config);
        assert_eq!(filter.patterns(), &["->cursor(".to_string()]);
        assert!(filter.matches("foreach (Order::query()->cursor() as $o) {"));
    }

    #[test]
    fn test_extracts_lines_with_positions() {
        let dir = laravel_fixture();
        let extraction = extract_candidates(dir.path(), &IndexConfig::default()).unwrap();

        assert_eq!(extraction.scan_root, dir.path().join("app"));
        assert_eq!(extraction.files_scanned, 2);
        assert_eq!(extraction.lines.len(), 2);

        let first = &extraction.lines[0];
        assert!(first.file_path.ends_with("OrderController.php"));
        assert_eq!(first.line_number, 7);
        assert!(first.text.starts_with("$orders = DB::select("));
        assert_eq!(extraction.lines[1].line_number, 8);
    }

    #[test]
    fn test_skips_denylisted_directories() {
        let dir = laravel_fixture();
        let extraction = extract_candidates(dir.path(), &IndexConfig::default()).unwrap();
        assert!(extraction.lines.iter().all(|l| !l.file_path.contains("vendor")));
    }

    #[test]
    fn test_nested_path_exclusion() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "bootstrap/cache/services.php", "<?php DB::table('x')->get();\n");
        write(dir.path(), "bootstrap/app.php", "<?php DB::table('y')->get();\n");
        let config = IndexConfig {
            scan_subdir: None,
            ..IndexConfig::default()
        };
        let extraction = extract_candidates(dir.path(), &config).unwrap();
        assert_eq!(extraction.lines.len(), 1);
        assert!(extraction.lines[0].file_path.ends_with("app.php"));
    }

    #[test]
    fn test_falls_back_to_root_without_app_dir() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "routes/web.php", "<?php $u = DB::table('users')->get();\n");
        let extraction = extract_candidates(dir.path(), &IndexConfig::default()).unwrap();
        assert_eq!(extraction.scan_root, dir.path());
        assert_eq!(extraction.lines.len(), 1);
    }

    #[test]
    fn test_file_cap_is_applied_in_walk_order() {
        let dir = TempDir::new().unwrap();
        for name in ["a.php", "b.php", "c.php"] {
            write(dir.path(), &format!("app/{}", name), "<?php DB::table('t')->get();\n");
        }
        let config = IndexConfig {
            max_files: 2,
            ..IndexConfig::default()
        };
        let extraction = extract_candidates(dir.path(), &config).unwrap();
        assert_eq!(extraction.files_scanned, 2);
        assert!(extraction.cap_reached);
        assert!(extraction.lines[1].file_path.ends_with("b.php"));
    }

    #[test]
    fn test_invalid_utf8_is_read_lossily() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app/Legacy.php");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"<?php\n$r = DB::select(\"select \xff from t\");\n").unwrap();
        let extraction = extract_candidates(dir.path(), &IndexConfig::default()).unwrap();
        assert_eq!(extraction.lines.len(), 1);
        assert_eq!(extraction.lines[0].line_number, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = laravel_fixture();
        let locked = dir.path().join("app/Http/Controllers/AdminController.php");
        fs::write(&locked, "<?php DB::table('admins')->get();\n").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read(&locked).is_ok() {
            // permission bits do not apply to root
            return;
        }

        let extraction = extract_candidates(dir.path(), &IndexConfig::default()).unwrap();
        assert_eq!(extraction.files_failed, 1);
        assert_eq!(extraction.files_scanned, 2);
        assert_eq!(extraction.lines.len(), 2);
        assert!(extraction.lines.iter().all(|l| !l.file_path.ends_with("AdminController.php")));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let err = extract_candidates(Path::new("/definitely/not/here"), &IndexConfig::default())
            .unwrap_err();
        assert!(matches!(err, ForgeError::InvalidRoot(_)));
    }

    #[test]
    fn test_order_is_stable_across_runs() {
        let dir = laravel_fixture();
        let a = extract_candidates(dir.path(), &IndexConfig::default()).unwrap();
        let b = extract_candidates(dir.path(), &IndexConfig::default()).unwrap();
        assert_eq!(a.lines, b.lines);
    }
}
