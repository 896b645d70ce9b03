//! Path helpers shared by the traversal and the default hooks.
//!
//! Module paths are relative to the runtime cwd, use `/` as separator and
//! never start with `./`. Resolved paths handed back by
//! [`GraphHooks::resolve_path`](crate::hooks::GraphHooks::resolve_path)
//! start with `.` when they point inside the project.

use std::path::Path;

use path_clean::PathClean;

/// Normalize `path`: collapse `.`/`..` segments, use `/`, drop a leading `./`.
///
/// The project root itself normalizes to the empty string.
pub fn normalize_path(path: &str) -> String {
    let cleaned = Path::new(path).clean();
    let normalized = cleaned.to_string_lossy().replace('\\', "/");
    if normalized == "." {
        String::new()
    } else {
        normalized
    }
}

/// Join a directory and an entry name; the empty directory is the root.
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Directory part of a normalized path.
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map(|index| &path[..index]).unwrap_or("")
}

/// Resolve a relative raw path against the module importing it.
///
/// The result starts with `./` so it is recognized as a project path.
pub fn resolve_relative(module_path: &str, raw_path: &str) -> String {
    let joined = normalize_path(&join_path(parent_dir(module_path), raw_path));
    if joined.is_empty() {
        ".".to_string()
    } else {
        format!("./{joined}")
    }
}

/// A resolved path split the way a directory lookup needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    /// Directory holding the entry, relative to the cwd.
    pub dir: String,
    /// Last segment, extension included.
    pub base: String,
    /// Last segment without extension.
    pub name: String,
    /// Extension with its leading dot, or empty.
    pub ext: String,
}

impl ParsedPath {
    pub fn parse(path: &str) -> Self {
        let normalized = normalize_path(path);
        let (dir, base) = match normalized.rfind('/') {
            Some(index) => (&normalized[..index], &normalized[index + 1..]),
            None => ("", normalized.as_str()),
        };
        let (name, ext) = match base.rfind('.') {
            Some(index) if index > 0 => (&base[..index], &base[index..]),
            _ => (base, ""),
        };
        Self {
            dir: dir.to_string(),
            base: base.to_string(),
            name: name.to_string(),
            ext: ext.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./src/a.ts"), "src/a.ts");
        assert_eq!(normalize_path("src/../lib/./b.ts"), "lib/b.ts");
        assert_eq!(normalize_path("./"), "");
        assert_eq!(normalize_path("../outside.ts"), "../outside.ts");
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve_relative("a.ts", "./b"), "./b");
        assert_eq!(resolve_relative("src/a.ts", "../lib/c.js"), "./lib/c.js");
        assert_eq!(resolve_relative("src/deep/a.ts", "./"), "./src/deep");
        assert_eq!(resolve_relative("a.ts", "."), ".");
    }

    #[test]
    fn test_parsed_path() {
        let parsed = ParsedPath::parse("./src/utils/index.test.ts");
        assert_eq!(parsed.dir, "src/utils");
        assert_eq!(parsed.base, "index.test.ts");
        assert_eq!(parsed.name, "index.test");
        assert_eq!(parsed.ext, ".ts");

        let parsed = ParsedPath::parse("./.env");
        assert_eq!(parsed.dir, "");
        assert_eq!(parsed.name, ".env");
        assert_eq!(parsed.ext, "");
    }
}
