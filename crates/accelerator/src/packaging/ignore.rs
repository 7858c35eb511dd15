//! Layered `.gitignore` matching.
//!
//! One [`IgnoreFile`] is compiled per directory that carries a `.gitignore`. While the
//! tree is walked an [`IgnoreStack`] keeps the files whose directory encloses the
//! current entry. Deeper files are consulted first. Within a file the last matching
//! line decides, so `!pattern` re-includes what an earlier line excluded.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::Match;
use tracing::debug;

/// Name of the per-directory pattern file.
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// Patterns compiled from a single pattern file.
#[derive(Debug)]
pub struct IgnoreFile {
    matcher: Gitignore,
}

impl Default for IgnoreFile {
    fn default() -> Self {
        Self {
            matcher: Gitignore::empty(),
        }
    }
}

impl IgnoreFile {
    /// Compile `content`. Lines that are not valid patterns are skipped.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        // Paths are matched relative to the file's directory, so the root is neutral.
        let mut builder = GitignoreBuilder::new(".");
        for line in content.lines() {
            if let Err(err) = builder.add_line(None, line) {
                debug!(pattern = line, error = %err, "skipping invalid ignore pattern");
            }
        }
        match builder.build() {
            Ok(matcher) => Self { matcher },
            Err(err) => {
                debug!(error = %err, "ignore patterns failed to compile");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }

    /// `Some(true)` when ignored, `Some(false)` when explicitly re-included,
    /// `None` when no line in this file applies.
    fn decide(&self, relative: &str, is_dir: bool) -> Option<bool> {
        match self.matcher.matched(relative, is_dir) {
            Match::Ignore(_) => Some(true),
            Match::Whitelist(_) => Some(false),
            Match::None => None,
        }
    }
}

#[derive(Debug)]
struct Layer {
    depth: usize,
    /// Slash-separated directory of the pattern file, relative to the walk root.
    base: String,
    file: IgnoreFile,
}

/// Pattern files in scope for the entry currently being walked.
#[derive(Debug, Default)]
pub struct IgnoreStack {
    layers: Vec<Layer>,
}

impl IgnoreStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop layers that do not enclose an entry at `depth`.
    pub fn enter(&mut self, depth: usize) {
        while self.layers.last().is_some_and(|layer| layer.depth >= depth) {
            self.layers.pop();
        }
    }

    /// Activate `file` for everything below the directory `base` at `depth`.
    pub fn push(&mut self, depth: usize, base: impl Into<String>, file: IgnoreFile) {
        if !file.is_empty() {
            self.layers.push(Layer {
                depth,
                base: base.into(),
                file,
            });
        }
    }

    /// Whether the entry at `relative` (slash-separated, relative to the walk root)
    /// is ignored.
    #[must_use]
    pub fn is_ignored(&self, relative: &str, is_dir: bool) -> bool {
        for layer in self.layers.iter().rev() {
            let scoped = if layer.base.is_empty() {
                Some(relative)
            } else {
                relative
                    .strip_prefix(layer.base.as_str())
                    .and_then(|rest| rest.strip_prefix('/'))
            };
            if let Some(decision) = scoped.and_then(|path| layer.file.decide(path, is_dir)) {
                return decision;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(content: &str) -> IgnoreStack {
        let mut stack = IgnoreStack::new();
        stack.push(0, "", IgnoreFile::parse(content));
        stack
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let file = IgnoreFile::parse("# comment\n\n   \n*.log\n");
        assert_eq!(file.matcher.num_ignores(), 1);
        assert!(IgnoreFile::parse("# only a comment\n\n").is_empty());
    }

    #[test]
    fn test_unanchored_pattern_matches_any_depth() {
        let stack = stack("*.log\n");
        assert!(stack.is_ignored("debug.log", false));
        assert!(stack.is_ignored("a/b/debug.log", false));
        assert!(!stack.is_ignored("a/b/debug.txt", false));
    }

    #[test]
    fn test_anchored_pattern_matches_from_file_directory() {
        let stack = stack("/build\ndocs/*.md\n");
        assert!(stack.is_ignored("build", true));
        assert!(!stack.is_ignored("src/build", true));
        assert!(stack.is_ignored("docs/readme.md", false));
        assert!(!stack.is_ignored("docs/nested/readme.md", false));
    }

    #[test]
    fn test_directory_only_pattern() {
        let stack = stack("target/\n");
        assert!(stack.is_ignored("target", true));
        assert!(!stack.is_ignored("target", false));
    }

    #[test]
    fn test_negation_reincludes() {
        let stack = stack("*.txt\n!keep.txt\n");
        assert!(stack.is_ignored("drop.txt", false));
        assert!(!stack.is_ignored("keep.txt", false));
    }

    #[test]
    fn test_double_star_patterns() {
        let stack = stack("**/generated\nlogs/**\n");
        assert!(stack.is_ignored("generated", true));
        assert!(stack.is_ignored("a/b/generated", true));
        assert!(stack.is_ignored("logs/a/b.txt", false));
    }

    #[test]
    fn test_negated_character_class() {
        let stack = stack("file[^a].txt\n");
        assert!(stack.is_ignored("fileb.txt", false));
        assert!(!stack.is_ignored("filea.txt", false));
    }

    #[test]
    fn test_double_star_inside_a_component() {
        let file = IgnoreFile::parse("build**\n");
        assert!(!file.is_empty());

        let stack = stack("build**\n");
        assert!(stack.is_ignored("build.out", false));
        assert!(stack.is_ignored("nested/builder", true));
        assert!(!stack.is_ignored("rebuild", false));
    }

    #[test]
    fn test_deeper_file_overrides_shallower() {
        let mut stack = stack("*.txt\n");
        stack.push(1, "inner", IgnoreFile::parse("!foo.txt\n"));
        assert!(!stack.is_ignored("inner/foo.txt", false));
        assert!(stack.is_ignored("inner/bar.txt", false));
        assert!(stack.is_ignored("foo.txt", false));
    }

    #[test]
    fn test_nested_file_scope_ends_at_its_directory() {
        let mut stack = IgnoreStack::new();
        stack.push(1, "inner", IgnoreFile::parse("secret.txt\n"));
        assert!(stack.is_ignored("inner/secret.txt", false));
        assert!(!stack.is_ignored("secret.txt", false));

        stack.enter(1);
        assert!(!stack.is_ignored("inner/secret.txt", false));
    }

    #[test]
    fn test_escaped_characters() {
        let stack = stack("\\#notes\n\\!bang\nfile\\*\n");
        assert!(stack.is_ignored("#notes", false));
        assert!(stack.is_ignored("!bang", false));
        assert!(stack.is_ignored("file*", false));
        assert!(!stack.is_ignored("fileX", false));
    }
}
