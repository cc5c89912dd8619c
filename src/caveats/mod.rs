//! Post-install advisories.
//!
//! Caveats run after a successful build and never fail it. A rule either
//! checks for an installed artifact under the library directory or tests a
//! condition over the build environment.

use std::path::Path;

use tracing::{debug, warn};

use crate::environment::BuildEnvironment;
use crate::recipe::Predicate;

/// A post-install advisory.
#[derive(Debug, Clone)]
pub enum CaveatRule {
    /// Emitted when nothing matching `pattern` was installed under the
    /// library directory.
    MissingArtifact {
        pattern: String,
        message: String,
        when: Predicate,
    },
    /// Emitted when the condition holds.
    Condition { when: Predicate, message: String },
}

impl CaveatRule {
    pub fn missing_artifact(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        CaveatRule::MissingArtifact {
            pattern: pattern.into(),
            message: message.into(),
            when: Predicate::always(),
        }
    }

    pub fn condition(when: Predicate, message: impl Into<String>) -> Self {
        CaveatRule::Condition {
            when,
            message: message.into(),
        }
    }

    /// Restrict an artifact rule to builds where `when` holds.
    pub fn when(self, when: Predicate) -> Self {
        match self {
            CaveatRule::MissingArtifact {
                pattern, message, ..
            } => CaveatRule::MissingArtifact {
                pattern,
                message,
                when,
            },
            CaveatRule::Condition { when: prev, message } => CaveatRule::Condition {
                when: prev.and(when),
                message,
            },
        }
    }
}

/// Looks for installed files.
pub trait ArtifactProbe {
    /// Whether any file under `dir` matches the glob `pattern`.
    fn any_match(&self, dir: &Path, pattern: &str) -> bool;
}

/// Probes the filesystem with glob patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsArtifactProbe;

impl ArtifactProbe for FsArtifactProbe {
    fn any_match(&self, dir: &Path, pattern: &str) -> bool {
        // Only `pattern` is a glob; the directory is matched literally.
        let dir = glob::Pattern::escape(&dir.to_string_lossy());
        let full = Path::new(&dir).join(pattern);
        let full = full.to_string_lossy();
        match glob::glob(&full) {
            Ok(mut paths) => paths.any(|p| p.is_ok()),
            Err(e) => {
                warn!("invalid artifact pattern '{}': {}", pattern, e);
                false
            }
        }
    }
}

/// Evaluates caveat rules for a finished build.
pub struct CaveatEmitter<'a> {
    rules: &'a [CaveatRule],
}

impl<'a> CaveatEmitter<'a> {
    pub fn new(rules: &'a [CaveatRule]) -> Self {
        Self { rules }
    }

    /// Messages for every rule that applies, in declaration order.
    pub fn emit(&self, env: &BuildEnvironment, probe: &dyn ArtifactProbe) -> Vec<String> {
        let scope = env.scope();
        let mut out = Vec::new();

        for rule in self.rules {
            match rule {
                CaveatRule::MissingArtifact {
                    pattern,
                    message,
                    when,
                } => {
                    if when.eval(&scope) && !probe.any_match(&env.libdir, pattern) {
                        debug!("no artifact matches {}", pattern);
                        out.push(message.clone());
                    }
                }
                CaveatRule::Condition { when, message } => {
                    if when.eval(&scope) {
                        out.push(message.clone());
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct NoArtifacts;

    impl ArtifactProbe for NoArtifacts {
        fn any_match(&self, _dir: &Path, _pattern: &str) -> bool {
            false
        }
    }

    #[test]
    fn missing_artifact_emits_message() {
        let env = crate::test_support::environment();
        let rules = vec![CaveatRule::missing_artifact(
            "libboost_python*",
            "Boost.Python was not built",
        )];
        let messages = CaveatEmitter::new(&rules).emit(&env, &NoArtifacts);
        assert_eq!(messages, vec!["Boost.Python was not built"]);
    }

    #[test]
    fn present_artifact_is_silent() {
        let temp = TempDir::new().unwrap();
        let mut env = crate::test_support::environment();
        env.libdir = temp.path().to_path_buf();
        fs::write(temp.path().join("libboost_python-mt.dylib"), "").unwrap();

        let rules = vec![CaveatRule::missing_artifact(
            "libboost_python*",
            "Boost.Python was not built",
        )];
        assert!(CaveatEmitter::new(&rules).emit(&env, &FsArtifactProbe).is_empty());
    }

    #[test]
    fn condition_rules_follow_the_environment() {
        let env = crate::test_support::environment();
        let rules = vec![
            CaveatRule::condition(Predicate::always(), "first"),
            CaveatRule::condition(Predicate::never(), "hidden"),
            CaveatRule::missing_artifact("libfoo*", "gated").when(Predicate::never()),
            CaveatRule::condition(Predicate::always(), "last"),
        ];
        let messages = CaveatEmitter::new(&rules).emit(&env, &NoArtifacts);
        assert_eq!(messages, vec!["first", "last"]);
    }

    #[test]
    fn fs_probe_rejects_bad_pattern_quietly() {
        let temp = TempDir::new().unwrap();
        assert!(!FsArtifactProbe.any_match(temp.path(), "lib[boost"));
    }

    #[cfg(unix)]
    #[test]
    fn fs_probe_treats_the_directory_literally() {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join("prefix[1]*/lib");
        fs::create_dir_all(&lib).unwrap();
        fs::write(lib.join("libboost_log-mt.a"), "").unwrap();

        assert!(FsArtifactProbe.any_match(&lib, "libboost_log*"));
        assert!(!FsArtifactProbe.any_match(&lib, "libboost_python*"));
    }
}
