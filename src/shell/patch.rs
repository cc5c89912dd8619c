//! Exact-match file patches and generated configuration lines.
//!
//! Patches are deliberately narrow: a literal search string must be present
//! in the target file or the build stops with
//! [`KilnError::PatchTargetNotFound`]. Nothing is rewritten by pattern.
//!
//! A patch set is all-or-nothing. Every target is checked before any file is
//! written, and a tree that already carries a replacement (a rerun after a
//! failed step) is left alone.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{KilnError, Result};
use crate::recipe::Predicate;

/// Replace every occurrence of `search` in `file` with `replace`.
///
/// `file` is relative to the source directory. `replace` may use
/// placeholders; they are expanded when the build is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub file: PathBuf,
    pub search: String,
    pub replace: String,
}

/// What a patch does to a given file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchEdit {
    /// The content with `count` replacements made.
    Rewrite { content: String, count: usize },
    /// Only replaced text is present; nothing to do.
    AlreadyApplied,
    /// Neither the search string nor its replacement is present.
    Missing,
}

impl Patch {
    pub fn new(file: impl Into<PathBuf>, search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            search: search.into(),
            replace: replace.into(),
        }
    }

    /// Work out the edit for `content` without touching the file.
    ///
    /// When the replacement itself contains the search string (a path
    /// prefix inserted after a marker, say), occurrences that are already
    /// part of a replacement are not counted or rewritten again.
    pub fn edit(&self, content: &str) -> PatchEdit {
        if self.search.is_empty() {
            return PatchEdit::Missing;
        }

        let (rewritten, count) =
            if !self.replace.is_empty() && self.replace.contains(self.search.as_str()) {
                let segments: Vec<&str> = content.split(self.replace.as_str()).collect();
                let count = segments
                    .iter()
                    .map(|s| s.matches(self.search.as_str()).count())
                    .sum();
                let rewritten = segments
                    .iter()
                    .map(|s| s.replace(&self.search, &self.replace))
                    .collect::<Vec<_>>()
                    .join(&self.replace);
                (rewritten, count)
            } else {
                let count = content.matches(self.search.as_str()).count();
                (content.replace(&self.search, &self.replace), count)
            };

        if count > 0 {
            PatchEdit::Rewrite {
                content: rewritten,
                count,
            }
        } else if !self.replace.is_empty() && content.contains(self.replace.as_str()) {
            PatchEdit::AlreadyApplied
        } else {
            PatchEdit::Missing
        }
    }

    /// Apply this patch alone under `root`, returning the number of
    /// replacements made (zero when it was already applied).
    pub fn apply(&self, root: &Path) -> Result<usize> {
        let summary = apply_patches(std::slice::from_ref(self), root)?;
        Ok(summary.replacements)
    }
}

/// Outcome of [`apply_patches`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSummary {
    /// Patches that changed a file.
    pub applied: usize,
    /// Patches whose replacement was already in place.
    pub already_applied: usize,
    pub replacements: usize,
}

/// Apply a patch set under `root`.
///
/// Patches on the same file chain in declaration order. Every patch is
/// checked against the staged content first; if any target is missing the
/// error is returned and no file is written.
pub fn apply_patches(patches: &[Patch], root: &Path) -> Result<PatchSummary> {
    let mut staged: BTreeMap<PathBuf, (String, bool)> = BTreeMap::new();
    let mut summary = PatchSummary::default();

    for patch in patches {
        let path = root.join(&patch.file);
        if !staged.contains_key(&path) {
            let content = fs::read_to_string(&path)?;
            staged.insert(path.clone(), (content, false));
        }
        let Some((content, dirty)) = staged.get_mut(&path) else {
            continue;
        };

        match patch.edit(content) {
            PatchEdit::Rewrite {
                content: rewritten,
                count,
            } => {
                *content = rewritten;
                *dirty = true;
                summary.applied += 1;
                summary.replacements += count;
            }
            PatchEdit::AlreadyApplied => {
                tracing::debug!("{} already patched", path.display());
                summary.already_applied += 1;
            }
            PatchEdit::Missing => {
                return Err(KilnError::PatchTargetNotFound {
                    file: path,
                    search: patch.search.clone(),
                });
            }
        }
    }

    for (path, (content, dirty)) in &staged {
        if *dirty {
            fs::write(path, content)?;
            tracing::debug!("patched {}", path.display());
        }
    }
    Ok(summary)
}

/// A configuration line appended to a file when its condition holds.
#[derive(Debug, Clone)]
pub struct AppendSpec {
    pub file: PathBuf,
    pub line: String,
    pub when: Predicate,
}

impl AppendSpec {
    pub fn new(file: impl Into<PathBuf>, line: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: line.into(),
            when: Predicate::always(),
        }
    }

    pub fn when(mut self, when: Predicate) -> Self {
        self.when = when;
        self
    }
}

/// A rendered line ready to append.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileAppend {
    pub file: PathBuf,
    pub line: String,
}

impl FileAppend {
    /// Append the line (and a newline) under `root`, creating the file.
    ///
    /// Returns `false` without writing when the file already holds the line.
    pub fn apply(&self, root: &Path) -> Result<bool> {
        let path = root.join(&self.file);
        let existing = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        if existing.lines().any(|line| line == self.line) {
            return Ok(false);
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if !existing.is_empty() && !existing.ends_with('\n') {
            writeln!(file)?;
        }
        writeln!(file, "{}", self.line)?;
        Ok(true)
    }
}
