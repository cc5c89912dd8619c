//! Compiler selection.

use serde::Serialize;

use crate::error::{KilnError, Result};
use crate::options::BuildSelection;
use crate::requirements::{Compiler, HostSnapshot};

/// A compiler the recipe is known not to build with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerFailure {
    pub compiler: Compiler,
    pub cause: String,
}

impl CompilerFailure {
    pub fn new(compiler: Compiler, cause: impl Into<String>) -> Self {
        Self {
            compiler,
            cause: cause.into(),
        }
    }
}

/// A language-standard mode switched on by an option.
///
/// When the option is on, the toolchain must be one of `compilers` (any
/// compiler when empty) and the standard flags are added to `CXXFLAGS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrictMode {
    /// Option key that turns the mode on.
    pub option: String,
    /// Language standard name, e.g. `c++11`.
    pub standard: String,
    /// Compilers able to build in this mode.
    pub compilers: Vec<Compiler>,
    /// Extra `CXXFLAGS` and `LDFLAGS` for clang (e.g. the C++ standard
    /// library switch).
    pub clang_cxxflags: Vec<String>,
}

impl StrictMode {
    /// A mode that passes `-std=<standard>`.
    pub fn new(option: impl Into<String>, standard: impl Into<String>) -> Self {
        Self {
            option: option.into(),
            standard: standard.into(),
            compilers: Vec::new(),
            clang_cxxflags: Vec::new(),
        }
    }

    pub fn compilers(mut self, compilers: Vec<Compiler>) -> Self {
        self.compilers = compilers;
        self
    }

    pub fn clang_cxxflags(mut self, flags: Vec<String>) -> Self {
        self.clang_cxxflags = flags;
        self
    }

    fn allows(&self, compiler: Compiler) -> bool {
        self.compilers.is_empty() || self.compilers.contains(&compiler)
    }
}

/// The chosen compiler and its language flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toolchain {
    pub compiler: Compiler,
    pub cc: String,
    pub cxx: String,
    /// Active language standard, if a strict mode is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
    /// Flags the standard adds to `CXXFLAGS`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cxxflags: Vec<String>,
    /// Flags the standard adds to `LDFLAGS`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ldflags: Vec<String>,
}

impl Toolchain {
    /// Pick a compiler for the build.
    ///
    /// The host default wins unless the recipe declares it failing or a
    /// strict mode rules it out; then the first other available compiler
    /// that passes both checks is used.
    pub fn select(
        host: &HostSnapshot,
        failures: &[CompilerFailure],
        strict: Option<&StrictMode>,
        selection: &BuildSelection,
    ) -> Result<Self> {
        let strict = strict.filter(|mode| selection.enabled(&mode.option));

        let mut candidates = vec![host.default_compiler];
        for compiler in &host.available_compilers {
            if !candidates.contains(compiler) {
                candidates.push(*compiler);
            }
        }

        let usable = |c: &Compiler| {
            !failures.iter().any(|f| f.compiler == *c) && strict.is_none_or(|m| m.allows(*c))
        };

        let Some(compiler) = candidates.iter().copied().find(usable) else {
            return Err(KilnError::UnsupportedToolchain {
                message: unsupported_message(&candidates, failures, strict),
            });
        };

        if compiler != host.default_compiler {
            let why = failures
                .iter()
                .find(|f| f.compiler == host.default_compiler)
                .map(|f| f.cause.clone())
                .unwrap_or_else(|| match strict {
                    Some(mode) => format!("{} mode is not supported", mode.standard),
                    None => "not usable".to_string(),
                });
            tracing::warn!(
                "{} cannot build this recipe ({}); using {}",
                host.default_compiler,
                why,
                compiler
            );
        }

        let mut cxxflags = Vec::new();
        let mut ldflags = Vec::new();
        if let Some(mode) = strict {
            cxxflags.push(format!("-std={}", mode.standard));
            if compiler == Compiler::Clang {
                cxxflags.extend(mode.clang_cxxflags.iter().cloned());
                ldflags.extend(mode.clang_cxxflags.iter().cloned());
            }
        }

        Ok(Self {
            compiler,
            cc: compiler.cc().to_string(),
            cxx: compiler.cxx().to_string(),
            standard: strict.map(|m| m.standard.clone()),
            cxxflags,
            ldflags,
        })
    }
}

fn unsupported_message(
    candidates: &[Compiler],
    failures: &[CompilerFailure],
    strict: Option<&StrictMode>,
) -> String {
    let mut lines = Vec::new();
    for compiler in candidates {
        if let Some(failure) = failures.iter().find(|f| f.compiler == *compiler) {
            lines.push(format!("{}: {}", compiler, failure.cause));
        } else if let Some(mode) = strict.filter(|m| !m.allows(*compiler)) {
            lines.push(format!("{}: cannot build in {} mode", compiler, mode.standard));
        }
    }
    format!(
        "none of the installed compilers can build this recipe\n{}",
        lines.join("\n")
    )
}
