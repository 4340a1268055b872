use crate::store::Resource;
use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Runtime configuration: where the persisted resources live.
///
/// The environment contains:
/// - `vars`: a snapshot of the process variables, used for path overrides.
/// - `current_dir`: the directory relative resource paths resolve against.
/// - `should_exit`: set by the interactive loop when the user asks to leave.
///
/// Every resource has a default file name and an override variable, see
/// [`Resource::default_file_name`] and [`Resource::env_var`].
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g. `MSX_SUBS_FILE`).
    pub vars: HashMap<String, String>,
    /// Base directory for relative resource paths.
    pub current_dir: PathBuf,
    /// When set to true, indicates that an interactive loop should exit.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// An environment rooted at `dir` with no variables at all.
    pub fn isolated(dir: impl Into<PathBuf>) -> Self {
        Self {
            vars: HashMap::new(),
            current_dir: dir.into(),
            should_exit: false,
        }
    }

    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Resolve where `resource` is stored.
    pub fn resource_path(&self, resource: Resource) -> PathBuf {
        let name = self
            .get_var(resource.env_var())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| resource.default_file_name().to_string());
        self.resolve(Path::new(&name))
    }

    /// Join a relative path onto `current_dir`; absolute paths pass through.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join(path)
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
