use serde::{Deserialize, Serialize};
use std::path::Path;

/// Resource limits and jail invocation parameters for the sandbox runner.
///
/// Defaults match the contract in the grading pipeline specification: a 3
/// second wall-clock limit, a single-CPU cap, a ~700 MB address-space
/// limit, a read-only root filesystem, an unprivileged user, loopback
/// networking disabled, and a fixed locale.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SandboxConfig {
    /// Path to the jail binary (e.g. `nsjail`).
    #[serde(default = "default_jail_path")]
    pub jail_path: String,

    /// Interpreter invoked inside the jail, e.g. `/usr/bin/python3`.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// File extension of test/submission files, without the leading dot.
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_cpus")]
    pub max_cpus: u32,

    #[serde(default = "default_max_address_space_mb")]
    pub max_address_space_mb: u64,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_chroot")]
    pub chroot: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_group")]
    pub group: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            jail_path: default_jail_path(),
            interpreter: default_interpreter(),
            file_extension: default_file_extension(),
            timeout_secs: default_timeout_secs(),
            max_cpus: default_max_cpus(),
            max_address_space_mb: default_max_address_space_mb(),
            locale: default_locale(),
            chroot: default_chroot(),
            user: default_user(),
            group: default_group(),
        }
    }
}

impl SandboxConfig {
    /// Builds the fixed argument vector prefix for invoking the jail binary
    /// against `test_file` inside `cwd`, discovering the named test module
    /// via the configured interpreter's unittest runner.
    pub fn jail_argv(&self, cwd: &Path, test_file: &str) -> Vec<String> {
        vec![
            "-Mo".to_string(),
            "--time_limit".to_string(),
            self.timeout_secs.to_string(),
            "--max_cpus".to_string(),
            self.max_cpus.to_string(),
            "--rlimit_as".to_string(),
            self.max_address_space_mb.to_string(),
            "-E".to_string(),
            format!("LANG={}", self.locale),
            "--disable_proc".to_string(),
            "--chroot".to_string(),
            self.chroot.clone(),
            "--cwd".to_string(),
            cwd.display().to_string(),
            "--user".to_string(),
            self.user.clone(),
            "--group".to_string(),
            self.group.clone(),
            "--iface_no_lo".to_string(),
            "--".to_string(),
            self.interpreter.clone(),
            "-m".to_string(),
            "unittest".to_string(),
            "-v".to_string(),
            test_file.to_string(),
        ]
    }
}

fn default_jail_path() -> String {
    "/usr/local/bin/nsjail".to_string()
}

fn default_interpreter() -> String {
    "/usr/bin/python3".to_string()
}

fn default_file_extension() -> String {
    "py".to_string()
}

fn default_timeout_secs() -> u64 {
    3
}

fn default_max_cpus() -> u32 {
    1
}

fn default_max_address_space_mb() -> u64 {
    700
}

fn default_locale() -> String {
    "en_US.UTF-8".to_string()
}

fn default_chroot() -> String {
    "/".to_string()
}

fn default_user() -> String {
    "nobody".to_string()
}

fn default_group() -> String {
    "nogroup".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config_matches_spec_limits() {
        let cfg = SandboxConfig::default();
        assert_eq!(cfg.timeout_secs, 3);
        assert_eq!(cfg.max_cpus, 1);
        assert_eq!(cfg.max_address_space_mb, 700);
    }

    #[test]
    fn argv_contains_fixed_prefix_and_test_file() {
        let cfg = SandboxConfig::default();
        let argv = cfg.jail_argv(&PathBuf::from("/tmp/ex1"), "Foo_test.py");
        assert!(argv.contains(&"--time_limit".to_string()));
        assert!(argv.contains(&"3".to_string()));
        assert!(argv.last().unwrap() == "Foo_test.py");
    }
}
