//! Config file discovery and layered loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge the user config (`$UNITREG_HOME/config.toml`, else
//!    `~/.unitreg/config.toml`)
//! 3. Merge `{workspace}/.unitreg/config.toml`
//! 4. Apply `UNITREG_LOG_LEVEL`
//! 5. Deserialize merged tree → `Config`
//! 6. Validate
//!
//! Relative namespace directories are made absolute against the layer that
//! declared them before merging: the workspace root for the workspace layer,
//! the config file's directory otherwise.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Environment variable naming an alternate user config directory.
pub const HOME_ENV: &str = "UNITREG_HOME";

/// Environment variable overriding `logging.level`.
pub const LOG_LEVEL_ENV: &str = "UNITREG_LOG_LEVEL";

/// A merged configuration plus the files that contributed to it.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: Config,
    /// Config files that were found and merged, lowest precedence first.
    pub loaded_files: Vec<PathBuf>,
}

/// Load the configuration with layered file precedence.
///
/// `workspace_root` is the root of the current project. If `None`, the
/// workspace layer is skipped. `home_override` replaces user config
/// discovery: it is treated as the `.unitreg` directory itself.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// final merged configuration fails validation.
pub fn load(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    load_with_env(workspace_root, home_override, &collect_env_vars())
}

pub(crate) fn load_with_env(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<ResolvedConfig> {
    // 1. Parse embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    let mut loaded_files = Vec::new();

    // 2. User config.
    let user_dir = match (home_override, env_vars.get(HOME_ENV)) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, Some(dir)) => PathBuf::from(dir),
        (None, None) => home_directory()?.join(".unitreg"),
    };
    let user_path = user_dir.join("config.toml");
    if let Some(mut overlay) = try_load_file(&user_path)? {
        resolve_namespace_dirs(&mut overlay, &user_dir);
        deep_merge(&mut merged, &overlay);
        info!(path = %user_path.display(), "loaded user config");
        loaded_files.push(user_path);
    }

    // 3. Workspace config.
    if let Some(ws_root) = workspace_root {
        let ws_path = ws_root.join(".unitreg").join("config.toml");
        if let Some(mut overlay) = try_load_file(&ws_path)? {
            resolve_namespace_dirs(&mut overlay, ws_root);
            deep_merge(&mut merged, &overlay);
            info!(path = %ws_path.display(), "loaded workspace config");
            loaded_files.push(ws_path);
        }
    }

    // 4. Environment override.
    if let Some(level) = env_vars.get(LOG_LEVEL_ENV).filter(|l| !l.trim().is_empty()) {
        debug!(level = %level, "applying UNITREG_LOG_LEVEL override");
        if let Some(logging) = merged
            .as_table_mut()
            .and_then(|t| t.get_mut("logging"))
            .and_then(toml::Value::as_table_mut)
        {
            logging.insert("level".to_owned(), toml::Value::String(level.clone()));
        }
    }

    // 5. Deserialize.
    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    // 6. Validate.
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        loaded_files,
    })
}

/// Load a config from a specific file path (no layering beyond defaults).
///
/// Relative namespace directories resolve against the file's directory.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let mut overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
    })?;
    if let Some(parent) = path.parent() {
        resolve_namespace_dirs(&mut overlay, parent);
    }

    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    deep_merge(&mut merged, &overlay);

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: path.display().to_string(),
                source: e,
            })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Try to load a file, returning `None` if the file doesn't exist.
///
/// Uses a single read operation to avoid TOCTOU races (no separate
/// exists/metadata checks before reading).
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

/// Rewrite relative `namespaces.*.directory` values in a layer to be
/// absolute against `root`.
fn resolve_namespace_dirs(layer: &mut toml::Value, root: &Path) {
    let Some(namespaces) = layer
        .as_table_mut()
        .and_then(|t| t.get_mut("namespaces"))
        .and_then(toml::Value::as_table_mut)
    else {
        return;
    };

    for (_, section) in namespaces.iter_mut() {
        let Some(toml::Value::String(dir)) = section.get_mut("directory") else {
            continue;
        };
        let path = Path::new(dir.as_str());
        if !dir.is_empty() && path.is_relative() {
            *dir = root.join(path).display().to_string();
        }
    }
}

/// Snapshot the process environment.
fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_defaults_deserialize_to_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_without_files() {
        let home = tempfile::tempdir().unwrap();
        let resolved = load_with_env(None, Some(home.path()), &HashMap::new()).unwrap();
        assert!(resolved.loaded_files.is_empty());
        assert!(resolved.config.namespaces.is_empty());
    }

    #[test]
    fn test_workspace_overrides_user() {
        let home = tempfile::tempdir().unwrap();
        let ws = tempfile::tempdir().unwrap();
        write(
            &home.path().join("config.toml"),
            "[logging]\nlevel = \"warn\"\n\n[namespaces.exploits]\ndirectory = \"/srv/exploits\"\n",
        );
        write(
            &ws.path().join(".unitreg/config.toml"),
            "[namespaces.exploits]\nextension = \"rb\"\n\n[namespaces.payloads]\ndirectory = \"mods/payloads\"\n",
        );

        let resolved =
            load_with_env(Some(ws.path()), Some(home.path()), &HashMap::new()).unwrap();
        let config = resolved.config;

        assert_eq!(resolved.loaded_files.len(), 2);
        assert_eq!(config.logging.level, "warn");
        let exploits = config.namespace("exploits").unwrap();
        assert_eq!(exploits.directory, PathBuf::from("/srv/exploits"));
        assert_eq!(exploits.extension, "rb");
        assert_eq!(
            config.namespace("payloads").unwrap().directory,
            ws.path().join("mods/payloads")
        );
    }

    #[test]
    fn test_user_relative_dirs_resolve_against_user_dir() {
        let home = tempfile::tempdir().unwrap();
        write(
            &home.path().join("config.toml"),
            "[namespaces.aux]\ndirectory = \"units\"\n",
        );
        let resolved = load_with_env(None, Some(home.path()), &HashMap::new()).unwrap();
        assert_eq!(
            resolved.config.namespace("aux").unwrap().directory,
            home.path().join("units")
        );
    }

    #[test]
    fn test_env_log_level_override() {
        let home = tempfile::tempdir().unwrap();
        let env = HashMap::from([(LOG_LEVEL_ENV.to_owned(), "trace".to_owned())]);
        let resolved = load_with_env(None, Some(home.path()), &env).unwrap();
        assert_eq!(resolved.config.logging.level, "trace");
    }

    #[test]
    fn test_home_env_used_without_override() {
        let home = tempfile::tempdir().unwrap();
        write(
            &home.path().join("config.toml"),
            "[namespaces.post]\ndirectory = \"/srv/post\"\n",
        );
        let env = HashMap::from([(HOME_ENV.to_owned(), home.path().display().to_string())]);
        let resolved = load_with_env(None, None, &env).unwrap();
        assert!(resolved.config.namespace("post").is_some());
    }

    #[test]
    fn test_invalid_workspace_layer_fails_validation() {
        let home = tempfile::tempdir().unwrap();
        let ws = tempfile::tempdir().unwrap();
        write(
            &ws.path().join(".unitreg/config.toml"),
            "[logging]\nformat = \"xml\"\n",
        );
        let result = load_with_env(Some(ws.path()), Some(home.path()), &HashMap::new());
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_load_file_nonexistent() {
        let result = load_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_load_file_resolves_relative_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unitreg.toml");
        write(&path, "[namespaces.exploits]\ndirectory = \"exploits\"\n");
        let config = load_file(&path).unwrap();
        assert_eq!(
            config.namespace("exploits").unwrap().directory,
            dir.path().join("exploits")
        );
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        write(&path, "[namespaces\n");
        assert!(matches!(
            load_file(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("huge.toml");
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&file_path, data).unwrap();

        let result = try_load_file(&file_path);
        assert!(
            matches!(result, Err(ConfigError::ValidationError { .. })),
            "Expected ValidationError for oversized config, got: {result:?}"
        );
    }

    #[test]
    fn test_deep_merge_replaces_arrays() {
        let mut base: toml::Value = toml::from_str("a = [1, 2]\n[t]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("a = [3]\n[t]\ny = 5\n").unwrap();
        deep_merge(&mut base, &overlay);
        assert_eq!(base["a"].as_array().unwrap().len(), 1);
        assert_eq!(base["t"]["x"].as_integer(), Some(1));
        assert_eq!(base["t"]["y"].as_integer(), Some(5));
    }
}
