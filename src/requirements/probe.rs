//! Host facts for the running machine.
//!
//! `SystemHostFacts` answers [`HostFacts`] queries by looking at the real
//! system: compile-time target information for OS and CPU, the `PATH`
//! environment variable for tools, `<opt root>/<name>` for installed
//! dependencies (`<prefix>/opt` unless set otherwise), and `file -b` output
//! for the architectures inside a binary.
//!
//! # Example
//!
//! ```no_run
//! use kiln::requirements::{HostFacts, SystemHostFacts};
//!
//! let host = SystemHostFacts::new("/usr/local");
//! println!("compiler: {}", host.default_compiler());
//! println!("python archs: {:?}", host.tool_archs("python3"));
//! ```

use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use super::host::{Arch, Compiler, CpuFamily, HostFacts, Os};

static RE_FILE_ARCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(x86_64|x86-64|i386|i686|arm64|aarch64|ppc64|ppc)\b")
        .expect("architecture pattern is valid")
});

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// On Windows, executability is determined by file extension, not permission bits.
#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// Resolve a tool's binary path by iterating over PATH entries.
///
/// Returns the first match that exists and is executable. Does NOT use
/// the `which` command, whose behavior varies across systems.
pub fn resolve_tool_path(tool: &str, path_entries: &[PathBuf]) -> Option<PathBuf> {
    for dir in path_entries {
        let candidate = dir.join(tool);
        if candidate.is_file() && is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Parse the system PATH environment variable into a list of directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// Extract architectures from `file -b` output.
///
/// Handles both thin binaries (`ELF 64-bit LSB executable, x86-64`) and
/// fat Mach-O files (`Mach-O universal binary with 2 architectures:
/// [i386:...] [x86_64:...]`). Order follows first appearance; duplicates
/// are dropped.
pub fn parse_file_archs(output: &str) -> Vec<Arch> {
    let mut archs = Vec::new();
    for cap in RE_FILE_ARCH.captures_iter(output) {
        let name = cap[1].replace('-', "_");
        if let Some(arch) = Arch::parse(&name) {
            if !archs.contains(&arch) {
                archs.push(arch);
            }
        }
    }
    archs
}

/// Host facts probed from the running system.
#[derive(Debug, Clone)]
pub struct SystemHostFacts {
    prefix: PathBuf,
    opt_root: Option<PathBuf>,
    path_entries: Vec<PathBuf>,
    jobs: Option<usize>,
}

impl SystemHostFacts {
    /// Probe the system, installing into `prefix`.
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            opt_root: None,
            path_entries: parse_system_path(),
            jobs: None,
        }
    }

    /// Override the detected parallelism.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Look up installed dependencies under `root` instead of `<prefix>/opt`.
    pub fn with_opt_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.opt_root = Some(root.into());
        self
    }

    /// Use an explicit search path instead of `PATH`.
    pub fn with_path_entries(mut self, entries: Vec<PathBuf>) -> Self {
        self.path_entries = entries;
        self
    }

    fn resolve(&self, tool: &str) -> Option<PathBuf> {
        resolve_tool_path(tool, &self.path_entries)
    }
}

impl HostFacts for SystemHostFacts {
    fn os(&self) -> Os {
        Os::current()
    }

    fn cpu_family(&self) -> CpuFamily {
        CpuFamily::current()
    }

    fn word_width(&self) -> u8 {
        if cfg!(target_pointer_width = "32") {
            32
        } else {
            64
        }
    }

    fn default_compiler(&self) -> Compiler {
        if cfg!(target_os = "macos") || self.resolve("gcc").is_none() {
            Compiler::Clang
        } else {
            Compiler::Gcc
        }
    }

    fn available_compilers(&self) -> Vec<Compiler> {
        let default = self.default_compiler();
        let mut compilers = vec![default];
        for candidate in [Compiler::Clang, Compiler::Gcc, Compiler::LlvmGcc] {
            if candidate != default && self.resolve(candidate.cc()).is_some() {
                compilers.push(candidate);
            }
        }
        compilers
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
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    fn dependency_prefix(&self, name: &str) -> Option<PathBuf> {
        let opt = self.opt_root().join(name);
        opt.is_dir().then_some(opt)
    }

    fn tool_present(&self, tool: &str) -> bool {
        self.resolve(tool).is_some()
    }

    fn tool_archs(&self, tool: &str) -> Vec<Arch> {
        let Some(path) = self.resolve(tool) else {
            return Vec::new();
        };

        let output = Command::new("file")
            .arg("-b")
            .arg("-L")
            .arg(&path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(out) if out.status.success() => {
                parse_file_archs(&String::from_utf8_lossy(&out.stdout))
            }
            _ => {
                tracing::debug!(
                    "could not inspect {} with `file`, assuming native architecture",
                    path.display()
                );
                Arch::parse(std::env::consts::ARCH).into_iter().collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parse_thin_elf_binary() {
        let out = "ELF 64-bit LSB pie executable, x86-64, version 1 (SYSV), dynamically linked";
        assert_eq!(parse_file_archs(out), vec![Arch::X86_64]);
    }

    #[test]
    fn parse_universal_mach_o() {
        let out = "Mach-O universal binary with 2 architectures: \
                   [i386:Mach-O executable i386] [x86_64:Mach-O 64-bit executable x86_64]";
        assert_eq!(parse_file_archs(out), vec![Arch::I386, Arch::X86_64]);
    }

    #[test]
    fn parse_unrecognised_output() {
        assert!(parse_file_archs("ASCII text").is_empty());
    }

    #[test]
    fn resolve_tool_path_finds_file() {
        let temp = TempDir::new().unwrap();
        let tool = temp.path().join("mytool");
        fs::write(&tool, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        }

        let found = resolve_tool_path("mytool", &[temp.path().to_path_buf()]);
        assert_eq!(found, Some(tool));
    }

    #[test]
    fn resolve_tool_path_returns_none_when_missing() {
        let temp = TempDir::new().unwrap();
        assert!(resolve_tool_path("nope", &[temp.path().to_path_buf()]).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn resolve_tool_path_skips_non_executable() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("plain"), "data").unwrap();
        assert!(resolve_tool_path("plain", &[temp.path().to_path_buf()]).is_none());
    }

    #[test]
    fn dependency_prefix_uses_opt_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("opt").join("icu4c")).unwrap();

        let host = SystemHostFacts::new(temp.path()).with_path_entries(Vec::new());
        assert_eq!(
            host.dependency_prefix("icu4c"),
            Some(temp.path().join("opt").join("icu4c"))
        );
        assert!(host.dependency_prefix("open-mpi").is_none());
    }

    #[test]
    fn keg_prefix_looks_up_dependencies_in_the_opt_root() {
        let temp = TempDir::new().unwrap();
        let keg = temp.path().join("Cellar").join("boost").join("1.54.0");
        let opt = temp.path().join("opt");
        fs::create_dir_all(keg.join("opt").join("icu4c")).unwrap();
        fs::create_dir_all(opt.join("python")).unwrap();

        let host = SystemHostFacts::new(&keg)
            .with_opt_root(&opt)
            .with_path_entries(Vec::new());
        assert_eq!(host.dependency_prefix("python"), Some(opt.join("python")));
        assert!(host.dependency_prefix("icu4c").is_none());
    }

    #[test]
    fn missing_tool_has_no_archs() {
        let host = SystemHostFacts::new("/usr/local").with_path_entries(Vec::new());
        assert!(!host.tool_present("python"));
        assert!(host.tool_archs("python").is_empty());
        assert!(!host.tool_is_universal("python"));
    }

    #[test]
    fn explicit_jobs_override_detection() {
        let host = SystemHostFacts::new("/usr/local").with_jobs(3);
        assert_eq!(host.make_jobs(), 3);
    }
}
