//! Annotated-file scanning
//!
//! Pulls the directive lines out of one source file. Generation rules are
//! returned with the prefix stripped; injection lines are kept verbatim
//! because the whole line doubles as the find/replace search key.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::rules::{COLGEN_PREFIX, INJECTION_PREFIX};

/// Directive lines found in one annotated file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColgenLines {
    /// `//colgen:` bodies, prefix stripped.
    pub lines: Vec<String>,
    /// Raw `//colgen@` lines.
    pub injection: Vec<String>,
    /// Module name the generated header reports: the file stem.
    pub module_name: String,
}

/// Reads `path` line by line and collects its colgen directives.
pub fn read_file(path: &Path) -> Result<ColgenLines> {
    let content = fs::read_to_string(path)?;

    let mut result = ColgenLines {
        module_name: file_stem(path),
        ..ColgenLines::default()
    };

    for raw in content.lines() {
        let line = raw.trim();
        if let Some(body) = line.strip_prefix(COLGEN_PREFIX) {
            result.lines.push(body.to_string());
        } else if line.starts_with(INJECTION_PREFIX) {
            result.injection.push(line.to_string());
        }
    }

    Ok(result)
}

/// File stem without extension (`/path/to/news.rs` => `news`).
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn collects_directives_and_module_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.rs");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(
            br#"
//colgen:News,Category
//colgen:News:Ids,UniqueIds
//colgen@NewCall(db)

pub struct News { pub id: i64 }
"#,
        )
        .unwrap();

        let cl = read_file(&path).unwrap();
        assert_eq!(cl.module_name, "news");
        assert_eq!(cl.lines, vec!["News,Category", "News:Ids,UniqueIds"]);
        assert_eq!(cl.injection, vec!["//colgen@NewCall(db)"]);
    }

    #[test]
    fn file_without_directives_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.rs");
        fs::write(&path, "fn main() {}\n").unwrap();

        let cl = read_file(&path).unwrap();
        assert!(cl.lines.is_empty());
        assert!(cl.injection.is_empty());
    }

    #[test]
    fn file_stems() {
        assert_eq!(file_stem(Path::new("/path/to/file.rs")), "file");
        assert_eq!(file_stem(Path::new("file")), "file");
    }
}
