//! Application configuration for the wishlist compiler.
//!
//! User config lives at `~/.wishlist-compiler/wishlist.toml`.
//! CLI flags override config file values, which override defaults.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, WishlistError};
use crate::types::{OrderingStrategy, RepoRef};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "wishlist.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".wishlist-compiler";

// ---------------------------------------------------------------------------
// Config structs (matching wishlist.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Where the wishlist fragments live.
    #[serde(default)]
    pub source: SourceConfig,

    /// Output artifact settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API root.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Name of the env var holding the account identifier.
    #[serde(default = "default_user_env")]
    pub user_env: String,

    /// Name of the env var holding the access token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            user_env: default_user_env(),
            token_env: default_token_env(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.github.com".into()
}
fn default_user_env() -> String {
    "GH_UN".into()
}
fn default_token_env() -> String {
    "GH_TOKEN".into()
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Repository owner.
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Repository name.
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Subdirectory holding the fragments.
    #[serde(default = "default_source_path")]
    pub path: String,

    /// Files whose name contains this substring are skipped.
    #[serde(default = "default_exclude")]
    pub exclude: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            path: default_source_path(),
            exclude: default_exclude(),
        }
    }
}

fn default_owner() -> String {
    "48klocs".into()
}
fn default_repo() -> String {
    "dim-wish-list-sources".into()
}
fn default_source_path() -> String {
    "PandaPaxxy".into()
}
fn default_exclude() -> String {
    "mkb".into()
}

/// `[output]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output file; derived from the source path when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// File ordering strategy.
    #[serde(default)]
    pub ordering: OrderingStrategy,
}

// ---------------------------------------------------------------------------
// Compile config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime compile configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct CompileConfig {
    /// GitHub REST API root.
    pub api_base_url: Url,
    /// Repository holding the fragments.
    pub repo: RepoRef,
    /// Subdirectory within the repository.
    pub source_dir: String,
    /// Exclusion substring matched against file names (case-sensitive).
    pub exclude: String,
    /// Ordering strategy for this run.
    pub ordering: OrderingStrategy,
    /// Destination of the merged wishlist.
    pub output_path: PathBuf,
}

impl CompileConfig {
    /// Resolve the runtime config, anchoring a relative or derived output path at `cwd`.
    pub fn resolve(config: &AppConfig, cwd: &Path) -> Result<Self> {
        let api_base_url = Url::parse(&config.github.api_base_url).map_err(|e| {
            WishlistError::validation(format!(
                "invalid api_base_url '{}': {e}",
                config.github.api_base_url
            ))
        })?;

        let source = &config.source;
        if source.owner.is_empty() || source.repo.is_empty() {
            return Err(WishlistError::validation(
                "source.owner and source.repo must both be set",
            ));
        }

        let output_path = match &config.output.path {
            Some(p) => cwd.join(p),
            None => cwd.join(default_output_file_name(source)),
        };

        Ok(Self {
            api_base_url,
            repo: RepoRef::new(&source.owner, &source.repo),
            source_dir: source.path.trim_matches('/').to_string(),
            exclude: source.exclude.clone(),
            ordering: config.output.ordering,
            output_path,
        })
    }
}

/// `<dir>_no_<exclude>_output.txt`, or `<dir>_output.txt` with no exclusion tag.
fn default_output_file_name(source: &SourceConfig) -> String {
    let stem = source
        .path
        .trim_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(&source.repo);

    if source.exclude.is_empty() {
        format!("{stem}_output.txt")
    } else {
        format!("{stem}_no_{}_output.txt", source.exclude)
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Account identifier and access token for the GitHub API.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl Credentials {
    /// Read both credentials from the env vars named in `[github]`.
    pub fn from_env(config: &GitHubConfig) -> Result<Self> {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup.
    pub fn from_lookup(
        config: &GitHubConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let read = |var_name: &str| match lookup(var_name) {
            Some(val) if !val.is_empty() => Ok(val),
            _ => Err(WishlistError::config(format!(
                "GitHub credentials not found. Set the {var_name} environment variable."
            ))),
        };

        Ok(Self {
            username: read(&config.user_env)?,
            token: read(&config.token_env)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.wishlist-compiler/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| WishlistError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.wishlist-compiler/wishlist.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| WishlistError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| WishlistError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| WishlistError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| WishlistError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| WishlistError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("api_base_url"));
        assert!(toml_str.contains("GH_TOKEN"));
        assert!(toml_str.contains("ordering = \"history\""));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[source]
path = "voltron"

[output]
ordering = "last-modified"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.source.path, "voltron");
        assert_eq!(config.source.owner, "48klocs");
        assert_eq!(config.source.exclude, "mkb");
        assert_eq!(config.output.ordering, OrderingStrategy::LastModified);
        assert_eq!(config.github.user_env, "GH_UN");
    }

    #[test]
    fn compile_config_derives_output_name() {
        let app = AppConfig::default();
        let compile = CompileConfig::resolve(&app, Path::new("/work")).expect("resolve");
        assert_eq!(
            compile.output_path,
            PathBuf::from("/work/PandaPaxxy_no_mkb_output.txt")
        );
        assert_eq!(compile.repo.to_string(), "48klocs/dim-wish-list-sources");
        assert_eq!(compile.ordering, OrderingStrategy::History);
        assert_eq!(compile.api_base_url.as_str(), "https://api.github.com/");
    }

    #[test]
    fn compile_config_honours_explicit_output() {
        let mut app = AppConfig::default();
        app.output.path = Some("out/wishlist.txt".into());
        app.source.path = "/nested/dir/".into();
        let compile = CompileConfig::resolve(&app, Path::new("/work")).expect("resolve");
        assert_eq!(compile.output_path, PathBuf::from("/work/out/wishlist.txt"));
        assert_eq!(compile.source_dir, "nested/dir");
    }

    #[test]
    fn compile_config_rejects_bad_api_url() {
        let mut app = AppConfig::default();
        app.github.api_base_url = "not a url".into();
        let err = CompileConfig::resolve(&app, Path::new("/work")).unwrap_err();
        assert!(err.to_string().contains("invalid api_base_url"));
    }

    #[test]
    fn credentials_require_both_values() {
        let config = GitHubConfig::default();

        let err = Credentials::from_lookup(&config, |name| {
            (name == "GH_UN").then(|| "someone".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("GH_TOKEN"));

        let err = Credentials::from_lookup(&config, |_| Some(String::new())).unwrap_err();
        assert!(err.to_string().contains("GH_UN"));

        let creds = Credentials::from_lookup(&config, |name| Some(format!("{name}-value")))
            .expect("both present");
        assert_eq!(creds.username, "GH_UN-value");
        assert_eq!(creds.token, "GH_TOKEN-value");
    }

    #[test]
    fn credentials_debug_redacts_token() {
        let creds = Credentials {
            username: "someone".into(),
            token: "ghp_secret".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("someone"));
        assert!(!rendered.contains("ghp_secret"));
    }

    #[test]
    fn missing_env_var_is_config_error() {
        let mut config = GitHubConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.user_env = "WISHLIST_TEST_NONEXISTENT_USER_12345".into();
        let result = Credentials::from_env(&config);
        assert!(matches!(result, Err(WishlistError::Config { .. })));
    }
}
