//! Root inference and path normalization.
//!
//! Archives are often created by compressing a project folder, which wraps
//! every file in one directory named after it (`myapp/src/index.js`). That
//! folder is stripped so the workspace sees `src/index.js`. Archives that
//! are already flat, or hold several top-level siblings, keep every segment.

use std::collections::BTreeSet;

/// Use `/` as the only separator and resolve `.` and `..` segments.
///
/// Leading slashes disappear with the empty segments they produce. A `..`
/// removes the segment before it and is dropped when there is none, so keys
/// never contain `..` and never climb above the archive root.
pub fn normalize_separators(raw: &str) -> String {
    let mut segments = Vec::new();
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    segments.join("/")
}

/// Find the single directory every file lives under, if there is one.
///
/// A top-level file has no directory to strip, so any path with a single
/// segment rules out a common root.
pub fn infer_root<'a>(paths: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut roots = BTreeSet::new();
    for path in paths {
        let (root, _) = path.split_once('/')?;
        roots.insert(root);
        if roots.len() > 1 {
            return None;
        }
    }
    roots.pop_first()
}

/// Remove `root` and its trailing separator from the front of `path`.
pub fn strip_root<'a>(path: &'a str, root: Option<&str>) -> &'a str {
    root.and_then(|root| path.strip_prefix(root))
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators() {
        assert_eq!(normalize_separators("myapp\\src\\index.js"), "myapp/src/index.js");
        assert_eq!(normalize_separators("/myapp//src/./index.js"), "myapp/src/index.js");
        assert_eq!(normalize_separators("index.js"), "index.js");
        assert_eq!(normalize_separators("./"), "");
    }

    #[test]
    fn resolves_parent_segments() {
        assert_eq!(normalize_separators("app/../x.js"), "x.js");
        assert_eq!(normalize_separators("app/src/../lib/a.js"), "app/lib/a.js");
        assert_eq!(normalize_separators("../../etc/passwd"), "etc/passwd");
        assert_eq!(normalize_separators("app\\..\\.."), "");
    }

    #[test]
    fn single_wrapping_folder_is_the_root() {
        let paths = ["myapp/src/index.js", "myapp/package.json"];
        assert_eq!(infer_root(paths), Some("myapp"));
    }

    #[test]
    fn siblings_have_no_root() {
        assert_eq!(infer_root(["client/app.js", "server/main.js"]), None);
    }

    #[test]
    fn top_level_files_have_no_root() {
        assert_eq!(infer_root(["index.js", "style.css"]), None);
        assert_eq!(infer_root(["index.js"]), None);
        assert_eq!(infer_root(["src/index.js", "README.md"]), None);
        assert_eq!(infer_root(["src", "src/index.js"]), None);
    }

    #[test]
    fn no_files_have_no_root() {
        assert_eq!(infer_root(std::iter::empty()), None);
    }

    #[test]
    fn strips_only_a_whole_leading_segment() {
        assert_eq!(strip_root("myapp/src/index.js", Some("myapp")), "src/index.js");
        assert_eq!(strip_root("myapp2/index.js", Some("myapp")), "myapp2/index.js");
        assert_eq!(strip_root("myapp/", Some("myapp")), "");
        assert_eq!(strip_root("index.js", None), "index.js");
    }
}
