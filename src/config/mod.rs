//! Immutable runtime configuration built once at startup.
//!
//! Values are layered: built-in defaults, then the optional TOML file at
//! `$XDG_CONFIG_HOME/dotfiles/config.toml`, then `DOTFILES_*` environment
//! variables. Derived paths are computed once in [`Paths::new`].
pub mod toml_loader;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::platform::Distro;

/// Prefix shared by every environment variable the tool reads.
pub const ENV_PREFIX: &str = "DOTFILES_";

/// Node.js version installed through proto unless overridden.
pub const DEFAULT_NODE_VERSION: &str = "23";

/// On-disk configuration file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Overrides [`DEFAULT_NODE_VERSION`].
    pub node_version: Option<String>,
    /// Location of the dotfiles checkout.
    pub dotfiles_dir: Option<String>,
    /// Git identity defaults.
    pub git: FileGitConfig,
}

/// `[git]` table of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileGitConfig {
    /// `user.name`.
    pub name: Option<String>,
    /// `user.email`.
    pub email: Option<String>,
    /// Email used for repositories matching `work_remote_pattern`.
    pub work_email: Option<String>,
    /// Remote URL glob selecting work repositories.
    pub work_remote_pattern: Option<String>,
}

/// Git identity gathered before prompting. `None` means "ask the user".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitIdentity {
    /// `user.name`.
    pub name: Option<String>,
    /// `user.email`.
    pub email: Option<String>,
    /// Email used for repositories matching `work_remote_pattern`.
    pub work_email: Option<String>,
    /// Remote URL glob selecting work repositories.
    pub work_remote_pattern: Option<String>,
}

/// Filesystem locations derived from `home` and `dotfiles_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// `~/.oh-my-zsh`
    pub oh_my_zsh_dir: PathBuf,
    /// `~/.oh-my-zsh/custom`
    pub oh_my_zsh_custom: PathBuf,
    /// `~/.proto`
    pub proto_home: PathBuf,
    /// `~/.proto/bin/proto`
    pub proto_bin: PathBuf,
    /// `~/.tmux/plugins/tpm`
    pub tpm_dir: PathBuf,
    /// `~/.local/bin`
    pub local_bin: PathBuf,
    /// Stow packages: `<dotfiles>/config`
    pub config_dir: PathBuf,
    /// Helper scripts: `<dotfiles>/scripts`
    pub scripts_dir: PathBuf,
    /// `~/.claude/settings.json`
    pub claude_settings: PathBuf,
}

impl Paths {
    /// Compute every derived path.
    #[must_use]
    pub fn new(home: &Path, dotfiles_dir: &Path) -> Self {
        let oh_my_zsh_dir = home.join(".oh-my-zsh");
        let proto_home = home.join(".proto");
        Self {
            oh_my_zsh_custom: oh_my_zsh_dir.join("custom"),
            oh_my_zsh_dir,
            proto_bin: proto_home.join("bin").join("proto"),
            proto_home,
            tpm_dir: home.join(".tmux").join("plugins").join("tpm"),
            local_bin: home.join(".local").join("bin"),
            config_dir: dotfiles_dir.join("config"),
            scripts_dir: dotfiles_dir.join("scripts"),
            claude_settings: home.join(".claude").join("settings.json"),
        }
    }
}

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Home directory every task writes under.
    pub home: PathBuf,
    /// Root of the dotfiles checkout.
    pub dotfiles_dir: PathBuf,
    /// Node.js version pinned through proto.
    pub node_version: String,
    /// Git identity defaults.
    pub git: GitIdentity,
    /// Detected Linux distribution.
    pub distro: Distro,
    /// Login shell from `$SHELL`, if set.
    pub shell: Option<String>,
    /// Login name from `$USER` or `$LOGNAME`.
    pub user: Option<String>,
    /// Derived paths.
    pub paths: Paths,
}

impl Config {
    /// Build the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory is set or the config file is
    /// unreadable or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration using `lookup` to read variables.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory is set or the config file is
    /// unreadable or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let env = |name: &str| var(&format!("{ENV_PREFIX}{name}"));

        let home = env("HOME")
            .or_else(|| var("HOME"))
            .map(PathBuf::from)
            .ok_or(ConfigError::NoHome)?;

        let config_root = var("XDG_CONFIG_HOME").map_or_else(|| home.join(".config"), PathBuf::from);
        let file: FileConfig =
            toml_loader::load_config(&config_root.join("dotfiles").join("config.toml"))?;

        let node_version = env("NODE_VERSION")
            .or(file.node_version)
            .unwrap_or_else(|| DEFAULT_NODE_VERSION.to_string());

        let dotfiles_dir = env("DOTFILES_DIR")
            .or(file.dotfiles_dir)
            .map_or_else(|| discover_dotfiles_dir(&home), |d| expand_tilde(&d, &home));

        // `DOTFILES_GIT__NAME` (nested form) wins over `DOTFILES_GIT_NAME`.
        let git_var = |field: &str, fallback: Option<String>| {
            env(&format!("GIT__{field}"))
                .or_else(|| env(&format!("GIT_{field}")))
                .or(fallback)
                .filter(|v| !v.is_empty())
        };
        let git = GitIdentity {
            name: git_var("NAME", file.git.name),
            email: git_var("EMAIL", file.git.email),
            work_email: git_var("WORK_EMAIL", file.git.work_email),
            work_remote_pattern: git_var("WORK_REMOTE_PATTERN", file.git.work_remote_pattern),
        };

        let paths = Paths::new(&home, &dotfiles_dir);
        Ok(Self {
            home,
            dotfiles_dir,
            node_version,
            git,
            distro: Distro::detect(),
            shell: var("SHELL"),
            user: var("USER").or_else(|| var("LOGNAME")),
            paths,
        })
    }
}

/// Expand a leading `~/` against `home`.
fn expand_tilde(value: &str, home: &Path) -> PathBuf {
    if value == "~" {
        home.to_path_buf()
    } else if let Some(rest) = value.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(value)
    }
}

/// Locate the dotfiles checkout when it is not configured.
///
/// Tries the repository root relative to the running binary (a cargo
/// `target/<profile>/` build or a `bin/` install), then the current
/// directory, then `~/dotfiles`.
fn discover_dotfiles_dir(home: &Path) -> PathBuf {
    let is_checkout = |dir: &Path| dir.join("config").is_dir();

    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = [3, 2]
            .into_iter()
            .filter_map(|depth| exe.ancestors().nth(depth))
            .find(|dir| is_checkout(dir))
    {
        return dir.to_path_buf();
    }

    if let Ok(cwd) = std::env::current_dir()
        && is_checkout(&cwd)
    {
        return cwd;
    }

    home.join("dotfiles")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn missing_home_is_error() {
        let err = config_with(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::NoHome));
    }

    #[test]
    fn defaults_and_derived_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let home = tmp.path().to_str().unwrap();
        let cfg = config_with(&[("HOME", home), ("DOTFILES_DOTFILES_DIR", "/srv/dotfiles")]).unwrap();

        assert_eq!(cfg.home, tmp.path());
        assert_eq!(cfg.node_version, DEFAULT_NODE_VERSION);
        assert_eq!(cfg.git, GitIdentity::default());
        assert_eq!(cfg.paths.oh_my_zsh_custom, tmp.path().join(".oh-my-zsh/custom"));
        assert_eq!(cfg.paths.proto_bin, tmp.path().join(".proto/bin/proto"));
        assert_eq!(cfg.paths.tpm_dir, tmp.path().join(".tmux/plugins/tpm"));
        assert_eq!(cfg.paths.config_dir, PathBuf::from("/srv/dotfiles/config"));
        assert_eq!(cfg.paths.scripts_dir, PathBuf::from("/srv/dotfiles/scripts"));
        assert_eq!(
            cfg.paths.claude_settings,
            tmp.path().join(".claude/settings.json")
        );
    }

    #[test]
    fn dotfiles_home_overrides_home() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config_with(&[
            ("HOME", "/nonexistent"),
            ("DOTFILES_HOME", tmp.path().to_str().unwrap()),
            ("DOTFILES_DOTFILES_DIR", "/srv/dotfiles"),
        ])
        .unwrap();
        assert_eq!(cfg.home, tmp.path());
    }

    #[test]
    fn nested_git_variables_win_over_flat() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config_with(&[
            ("HOME", tmp.path().to_str().unwrap()),
            ("DOTFILES_DOTFILES_DIR", "/srv/dotfiles"),
            ("DOTFILES_GIT_NAME", "Flat"),
            ("DOTFILES_GIT__NAME", "Nested"),
            ("DOTFILES_GIT_EMAIL", "flat@example.com"),
            ("DOTFILES_GIT_WORK_REMOTE_PATTERN", "*github.com:acme/**"),
        ])
        .unwrap();
        assert_eq!(cfg.git.name.as_deref(), Some("Nested"));
        assert_eq!(cfg.git.email.as_deref(), Some("flat@example.com"));
        assert_eq!(
            cfg.git.work_remote_pattern.as_deref(),
            Some("*github.com:acme/**")
        );
        assert_eq!(cfg.git.work_email, None);
    }

    #[test]
    fn file_values_are_overridden_by_env() {
        let tmp = tempfile::tempdir().unwrap();
        let xdg = tmp.path().join("xdg");
        std::fs::create_dir_all(xdg.join("dotfiles")).unwrap();
        std::fs::write(
            xdg.join("dotfiles/config.toml"),
            "node_version = \"20\"\ndotfiles_dir = \"~/src/dots\"\n\n[git]\nname = \"File Name\"\nemail = \"file@example.com\"\n",
        )
        .unwrap();

        let cfg = config_with(&[
            ("HOME", tmp.path().to_str().unwrap()),
            ("XDG_CONFIG_HOME", xdg.to_str().unwrap()),
            ("DOTFILES_GIT_EMAIL", "env@example.com"),
        ])
        .unwrap();
        assert_eq!(cfg.node_version, "20");
        assert_eq!(cfg.dotfiles_dir, tmp.path().join("src/dots"));
        assert_eq!(cfg.git.name.as_deref(), Some("File Name"));
        assert_eq!(cfg.git.email.as_deref(), Some("env@example.com"));
    }

    #[test]
    fn invalid_config_file_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(".config/dotfiles")).unwrap();
        std::fs::write(tmp.path().join(".config/dotfiles/config.toml"), "node_version = 23").unwrap();
        let err = config_with(&[("HOME", tmp.path().to_str().unwrap())]).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err}");
    }

    #[test]
    fn empty_values_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config_with(&[
            ("HOME", tmp.path().to_str().unwrap()),
            ("DOTFILES_DOTFILES_DIR", "/srv/dotfiles"),
            ("DOTFILES_NODE_VERSION", ""),
            ("DOTFILES_GIT_NAME", ""),
        ])
        .unwrap();
        assert_eq!(cfg.node_version, DEFAULT_NODE_VERSION);
        assert_eq!(cfg.git.name, None);
    }

    #[test]
    fn expand_tilde_variants() {
        let home = Path::new("/home/u");
        assert_eq!(expand_tilde("~", home), PathBuf::from("/home/u"));
        assert_eq!(expand_tilde("~/dots", home), PathBuf::from("/home/u/dots"));
        assert_eq!(expand_tilde("/abs", home), PathBuf::from("/abs"));
    }
}
