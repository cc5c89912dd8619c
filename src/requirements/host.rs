//! Host facts consumed by the engine.
//!
//! The engine never inspects the machine directly. Everything it needs to
//! know about the host (OS, CPU, compilers, install prefix, dependency
//! locations, tool architectures) comes through the [`HostFacts`] trait.
//! [`SystemHostFacts`](super::probe::SystemHostFacts) probes the running
//! machine; [`StaticHostFacts`] is a fixed description loaded from YAML or
//! built in tests.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Macos,
    Linux,
    Windows,
    Other,
}

impl Os {
    /// Detect the current operating system.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Os::Macos
        } else if cfg!(target_os = "linux") {
            Os::Linux
        } else if cfg!(target_os = "windows") {
            Os::Windows
        } else {
            Os::Other
        }
    }
}

/// CPU family, independent of word width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CpuFamily {
    X86,
    Arm,
    Ppc,
    Other,
}

impl CpuFamily {
    /// Detect the CPU family the binary was compiled for.
    pub fn current() -> Self {
        match std::env::consts::ARCH {
            "x86" | "x86_64" => CpuFamily::X86,
            "arm" | "aarch64" => CpuFamily::Arm,
            "powerpc" | "powerpc64" => CpuFamily::Ppc,
            _ => CpuFamily::Other,
        }
    }
}

/// A concrete machine architecture a binary can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
    I386,
    X86_64,
    Ppc,
    Ppc64,
    Arm64,
}

impl Arch {
    /// The architecture name as compilers and `file` spell it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::I386 => "i386",
            Arch::X86_64 => "x86_64",
            Arch::Ppc => "ppc",
            Arch::Ppc64 => "ppc64",
            Arch::Arm64 => "arm64",
        }
    }

    /// Parse a name as printed by `file`, `lipo` or `uname -m`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "i386" | "i686" | "x86" => Some(Arch::I386),
            "x86_64" | "amd64" => Some(Arch::X86_64),
            "ppc" | "ppc7400" | "powerpc" => Some(Arch::Ppc),
            "ppc64" | "powerpc64" => Some(Arch::Ppc64),
            "arm64" | "aarch64" => Some(Arch::Arm64),
            _ => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Architectures a universal (multi-architecture) build contains.
pub const UNIVERSAL_ARCHS: &[Arch] = &[Arch::I386, Arch::X86_64];

/// Compiler identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Compiler {
    Clang,
    Gcc,
    /// GCC front end on the LLVM back end.
    LlvmGcc,
}

impl Compiler {
    /// C compiler binary name.
    pub fn cc(&self) -> &'static str {
        match self {
            Compiler::Clang => "clang",
            Compiler::Gcc => "gcc",
            Compiler::LlvmGcc => "llvm-gcc",
        }
    }

    /// C++ compiler binary name.
    pub fn cxx(&self) -> &'static str {
        match self {
            Compiler::Clang => "clang++",
            Compiler::Gcc => "g++",
            Compiler::LlvmGcc => "llvm-g++",
        }
    }

    /// Parse a compiler name as written in recipes.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "clang" => Some(Compiler::Clang),
            "gcc" => Some(Compiler::Gcc),
            "llvm" | "llvm_gcc" | "llvm-gcc" => Some(Compiler::LlvmGcc),
            _ => None,
        }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cc())
    }
}

/// Facts about the host a build runs on.
///
/// Implementations must be cheap to query and free of side effects other
/// than reading the environment; the engine may call them more than once.
pub trait HostFacts: Send + Sync {
    /// Operating system family.
    fn os(&self) -> Os;

    /// CPU family.
    fn cpu_family(&self) -> CpuFamily;

    /// Native word width in bits (32 or 64).
    fn word_width(&self) -> u8;

    /// Compiler used when nothing forces another choice.
    fn default_compiler(&self) -> Compiler;

    /// Compilers installed on the host, in order of preference.
    fn available_compilers(&self) -> Vec<Compiler> {
        vec![self.default_compiler()]
    }

    /// Install prefix the build installs into.
    ///
    /// This may be a per-recipe keg path; dependency lookups go through
    /// [`HostFacts::opt_root`] instead.
    fn prefix(&self) -> PathBuf;

    /// Shared directory whose `<name>` entries link installed dependencies.
    ///
    /// Defaults to `<prefix>/opt`, which is only right when the prefix is the
    /// shared install root.
    fn opt_root(&self) -> PathBuf {
        self.prefix().join("opt")
    }

    /// Number of parallel jobs for the build tool.
    fn make_jobs(&self) -> usize;

    /// Install location of an already-installed dependency.
    fn dependency_prefix(&self, name: &str) -> Option<PathBuf>;

    /// Whether a tool is available on the search path.
    fn tool_present(&self, tool: &str) -> bool;

    /// Architectures contained in the tool's binary (empty when absent).
    fn tool_archs(&self, tool: &str) -> Vec<Arch>;

    /// Whether the tool's binary contains every universal architecture.
    fn tool_is_universal(&self, tool: &str) -> bool {
        let archs = self.tool_archs(tool);
        UNIVERSAL_ARCHS.iter().all(|a| archs.contains(a))
    }
}

/// Immutable copy of the scalar host facts, taken once per build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostSnapshot {
    pub os: Os,
    pub cpu_family: CpuFamily,
    pub word_width: u8,
    pub default_compiler: Compiler,
    pub available_compilers: Vec<Compiler>,
    pub prefix: PathBuf,
    pub opt_root: PathBuf,
    pub make_jobs: usize,
}

impl HostSnapshot {
    /// Capture the scalar facts from a host.
    pub fn capture(host: &dyn HostFacts) -> Self {
        Self {
            os: host.os(),
            cpu_family: host.cpu_family(),
            word_width: host.word_width(),
            default_compiler: host.default_compiler(),
            available_compilers: host.available_compilers(),
            prefix: host.prefix(),
            opt_root: host.opt_root(),
            make_jobs: host.make_jobs().max(1),
        }
    }

    /// Whether the host is a 32-bit machine.
    pub fn is_32_bit(&self) -> bool {
        self.word_width == 32
    }
}

/// A fixed host description.
///
/// Used for reproducible builds (`--host-facts <file>`) and throughout the
/// test suite. Every field has a default so a YAML file only needs to list
/// what differs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StaticHostFacts {
    pub os: Os,
    pub cpu_family: CpuFamily,
    pub word_width: u8,
    pub default_compiler: Compiler,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub compilers: Vec<Compiler>,
    pub prefix: PathBuf,
    /// Dependency link directory; `<prefix>/opt` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opt_root: Option<PathBuf>,
    pub make_jobs: usize,
    /// Installed dependency prefixes by name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, PathBuf>,
    /// Tools on the search path and the architectures their binaries hold.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tools: BTreeMap<String, Vec<Arch>>,
}

impl Default for StaticHostFacts {
    fn default() -> Self {
        Self {
            os: Os::Linux,
            cpu_family: CpuFamily::X86,
            word_width: 64,
            default_compiler: Compiler::Gcc,
            compilers: Vec::new(),
            prefix: PathBuf::from("/usr/local"),
            opt_root: None,
            make_jobs: 1,
            dependencies: BTreeMap::new(),
            tools: BTreeMap::new(),
        }
    }
}

impl StaticHostFacts {
    /// A 64-bit x86 host with defaults for everything else.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_os(mut self, os: Os) -> Self {
        self.os = os;
        self
    }

    pub fn with_cpu(mut self, family: CpuFamily, word_width: u8) -> Self {
        self.cpu_family = family;
        self.word_width = word_width;
        self
    }

    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.default_compiler = compiler;
        self
    }

    pub fn with_compilers(mut self, compilers: Vec<Compiler>) -> Self {
        self.compilers = compilers;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_opt_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.opt_root = Some(root.into());
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.make_jobs = jobs;
        self
    }

    pub fn with_dependency(mut self, name: &str, prefix: impl Into<PathBuf>) -> Self {
        self.dependencies.insert(name.to_string(), prefix.into());
        self
    }

    pub fn with_tool(mut self, name: &str, archs: Vec<Arch>) -> Self {
        self.tools.insert(name.to_string(), archs);
        self
    }

    /// Load a host description from a YAML file.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| crate::error::KilnError::RecipeParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl HostFacts for StaticHostFacts {
    fn os(&self) -> Os {
        self.os
    }

    fn cpu_family(&self) -> CpuFamily {
        self.cpu_family
    }

    fn word_width(&self) -> u8 {
        self.word_width
    }

    fn default_compiler(&self) -> Compiler {
        self.default_compiler
    }

    fn available_compilers(&self) -> Vec<Compiler> {
        if self.compilers.is_empty() {
            vec![self.default_compiler]
        } else {
            self.compilers.clone()
        }
    }

    fn prefix(&self) -> PathBuf {
        self.prefix.clone()
    }

    fn opt_root(&self) -> PathBuf {
        self.opt_root
            .clone()
            .unwrap_or_else(|| self.prefix.join("opt"))
    }

    fn make_jobs(&self) -> usize {
        self.make_jobs
    }

    fn dependency_prefix(&self, name: &str) -> Option<PathBuf> {
        self.dependencies.get(name).cloned()
    }

    fn tool_present(&self, tool: &str) -> bool {
        self.tools.contains_key(tool)
    }

    fn tool_archs(&self, tool: &str) -> Vec<Arch> {
        self.tools.get(tool).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_parse_accepts_aliases() {
        assert_eq!(Arch::parse("amd64"), Some(Arch::X86_64));
        assert_eq!(Arch::parse("i686"), Some(Arch::I386));
        assert_eq!(Arch::parse("aarch64"), Some(Arch::Arm64));
        assert_eq!(Arch::parse("sparc"), None);
    }

    #[test]
    fn compiler_binary_names() {
        assert_eq!(Compiler::Clang.cxx(), "clang++");
        assert_eq!(Compiler::Gcc.cc(), "gcc");
        assert_eq!(Compiler::parse("llvm"), Some(Compiler::LlvmGcc));
    }

    #[test]
    fn static_host_defaults_to_64_bit_x86() {
        let host = StaticHostFacts::new();
        assert_eq!(host.cpu_family(), CpuFamily::X86);
        assert_eq!(host.word_width(), 64);
        assert_eq!(host.available_compilers(), vec![Compiler::Gcc]);
    }

    #[test]
    fn tool_is_universal_requires_all_archs() {
        let host = StaticHostFacts::new()
            .with_tool("python", vec![Arch::X86_64])
            .with_tool("fat", vec![Arch::I386, Arch::X86_64]);
        assert!(!host.tool_is_universal("python"));
        assert!(host.tool_is_universal("fat"));
        assert!(!host.tool_is_universal("missing"));
    }

    #[test]
    fn snapshot_clamps_jobs_to_one() {
        let host = StaticHostFacts::new().with_jobs(0);
        let snapshot = HostSnapshot::capture(&host);
        assert_eq!(snapshot.make_jobs, 1);
        assert!(!snapshot.is_32_bit());
    }

    #[test]
    fn opt_root_defaults_under_the_prefix() {
        let host = StaticHostFacts::new().with_prefix("/opt/kiln");
        assert_eq!(host.opt_root(), PathBuf::from("/opt/kiln/opt"));

        let keg = StaticHostFacts::new()
            .with_prefix("/usr/local/Cellar/boost/1.54.0")
            .with_opt_root("/usr/local/opt");
        assert_eq!(keg.opt_root(), PathBuf::from("/usr/local/opt"));
        assert_eq!(HostSnapshot::capture(&keg).opt_root, PathBuf::from("/usr/local/opt"));
    }

    #[test]
    fn static_host_parses_partial_yaml() {
        let yaml = r#"
os: macos
word_width: 32
tools:
  python: [i386, x86_64]
dependencies:
  icu4c: /opt/icu4c
"#;
        let host: StaticHostFacts = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(host.os, Os::Macos);
        assert_eq!(host.word_width, 32);
        assert_eq!(host.cpu_family, CpuFamily::X86);
        assert!(host.tool_is_universal("python"));
        assert_eq!(
            host.dependency_prefix("icu4c"),
            Some(PathBuf::from("/opt/icu4c"))
        );
    }
}
