//! Static keyword blacklist scan over an extension folder.
//!
//! Report-only: nothing is deleted or rewritten.

use anyhow::{Context, Result, bail};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Substrings that flag a file.
pub const BLACKLISTED_PATTERNS: &[&str] = &["os.remove", "subprocess", "eval(", "exec(", "open("];

/// File extensions that get scanned.
pub const SCANNED_EXTENSIONS: &[&str] = &["msx", "py", "js", "json"];

/// First blacklisted pattern found in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub path: PathBuf,
    /// 1-based.
    pub line: usize,
    pub pattern: &'static str,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Malicious pattern '{}' found in {} line {}",
            self.pattern,
            self.path.display(),
            self.line
        )
    }
}

/// First hit in `text`, as (line, pattern).
pub fn scan_text(text: &str) -> Option<(usize, &'static str)> {
    text.lines().enumerate().find_map(|(i, line)| {
        BLACKLISTED_PATTERNS
            .iter()
            .find(|p| line.contains(**p))
            .map(|p| (i + 1, *p))
    })
}

fn is_scanned(path: &Path) -> bool {
    path.extension()
        .and_then(|x| x.to_str())
        .map(|x| SCANNED_EXTENSIONS.contains(&x))
        .unwrap_or(false)
}

/// Scan every supported file under `dir`, one finding per flagged file.
pub fn scan_dir(dir: &Path) -> Result<Vec<Finding>> {
    if !dir.is_dir() {
        bail!("Extension folder '{}' not found.", dir.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_scanned(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();

    let mut findings = Vec::new();
    for path in files {
        debug!(path = %path.display(), "scanning");
        let bytes = fs::read(&path).with_context(|| format!("can't read {}", path.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        if let Some((line, pattern)) = scan_text(&text) {
            findings.push(Finding {
                path,
                line,
                pattern,
            });
        }
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_text_reports_first_hit() {
        assert_eq!(scan_text("print \"hi\"\n"), None);
        assert_eq!(
            scan_text("ok\nx = eval(y)\nimport subprocess\n"),
            Some((2, "eval("))
        );
        // Pattern order decides between hits on the same line.
        assert_eq!(scan_text("subprocess; os.remove(p)"), Some((1, "os.remove")));
    }

    #[test]
    fn test_scan_dir_only_looks_at_supported_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("clean.msx"), "print \"fine\"\n")?;
        fs::write(dir.path().join("bad.py"), "import os\nos.remove('x')\n")?;
        fs::write(dir.path().join("ignored.txt"), "eval(1)\n")?;

        let findings = scan_dir(dir.path())?;

        assert_eq!(findings.len(), 1);
        assert!(findings[0].path.ends_with("bad.py"));
        assert_eq!(findings[0].line, 2);
        assert_eq!(findings[0].pattern, "os.remove");
        assert!(findings[0].to_string().starts_with("Malicious pattern 'os.remove' found in "));
        Ok(())
    }

    #[test]
    fn test_scan_missing_dir() {
        assert!(scan_dir(Path::new("/no/such/extension")).is_err());
    }
}
