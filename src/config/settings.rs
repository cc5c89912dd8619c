//! Engine settings.
//!
//! Filled from command-line flags, each with an environment fallback:
//! `KILN_PREFIX`, `KILN_OPT_ROOT`, `KILN_JOBS`, `KILN_TIMEOUT` (seconds) and
//! `KILN_HOST_FACTS` (path to a host description).

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::requirements::{HostFacts, StaticHostFacts, SystemHostFacts};

/// Install prefix when none is configured.
pub const DEFAULT_PREFIX: &str = "/usr/local";

#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Install prefix.
    pub prefix: Option<PathBuf>,
    /// Directory linking installed dependencies; `<prefix>/opt` when unset.
    pub opt_root: Option<PathBuf>,
    /// Parallel jobs for the build tool.
    pub jobs: Option<usize>,
    /// Per-step timeout.
    pub timeout: Option<Duration>,
    /// Fixed host description replacing system probing.
    pub host_facts: Option<PathBuf>,
    /// Directory holding the source tree.
    pub workdir: PathBuf,
}

impl Settings {
    /// Host facts for this run.
    ///
    /// A host facts file wins over probing; `prefix`, `opt_root` and `jobs`
    /// override whatever the file says.
    pub fn host(&self) -> Result<Box<dyn HostFacts>> {
        if let Some(path) = &self.host_facts {
            let mut facts = StaticHostFacts::load(path)?;
            if let Some(prefix) = &self.prefix {
                facts.prefix = prefix.clone();
            }
            if let Some(root) = &self.opt_root {
                facts.opt_root = Some(root.clone());
            }
            if let Some(jobs) = self.jobs {
                facts.make_jobs = jobs;
            }
            tracing::debug!("using host facts from {}", path.display());
            return Ok(Box::new(facts));
        }

        let prefix = self
            .prefix
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFIX));
        let mut facts = SystemHostFacts::new(prefix);
        if let Some(root) = &self.opt_root {
            facts = facts.with_opt_root(root);
        }
        if let Some(jobs) = self.jobs {
            facts = facts.with_jobs(jobs);
        }
        Ok(Box::new(facts))
    }
}
