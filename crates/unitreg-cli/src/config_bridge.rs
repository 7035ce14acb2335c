//! Bridge from `unitreg_config::Config` to logging and registry types.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use unitreg_config::{Config, DEFAULT_EXTENSION, LoggingSection};
use unitreg_core::{ManifestLoader, Namespace, UnitDescriptor};
use unitreg_telemetry::LogConfig;

/// A namespace whose values are the manifest descriptors themselves.
pub(crate) type DescriptorNamespace = Namespace<Arc<UnitDescriptor>>;

/// Name given to the namespace defined with `--dir`.
pub(crate) const AD_HOC_NAMESPACE: &str = "default";

/// Convert the `[logging]` section into a telemetry config.
///
/// The config crate already validated `format`; anything unparseable falls
/// back to the default format.
pub(crate) fn to_log_config(logging: &LoggingSection) -> LogConfig {
    let config = LogConfig::new(logging.level.clone())
        .with_format(logging.format.parse().unwrap_or_default())
        .with_directives(logging.directives.iter().cloned());
    match &logging.directory {
        Some(dir) => config.with_file_logging(dir),
        None => config,
    }
}

/// The configured namespaces, each bound to its directory.
#[derive(Debug, Default)]
pub(crate) struct Catalog {
    namespaces: BTreeMap<String, Arc<DescriptorNamespace>>,
}

impl Catalog {
    /// Build one namespace per `[namespaces.*]` section.
    pub(crate) fn from_config(config: &Config) -> Self {
        let mut catalog = Self::default();
        for (name, section) in &config.namespaces {
            catalog.insert(name, section.directory.clone(), &section.extension);
        }
        catalog
    }

    /// Add (or replace) the ad-hoc namespace defined on the command line.
    pub(crate) fn with_ad_hoc(mut self, directory: PathBuf, extension: Option<&str>) -> Self {
        self.insert(
            AD_HOC_NAMESPACE,
            directory,
            extension.unwrap_or(DEFAULT_EXTENSION),
        );
        self
    }

    fn insert(&mut self, name: &str, directory: PathBuf, extension: &str) {
        let namespace = Namespace::new(name, extension, ManifestLoader::descriptors())
            .with_directory(directory);
        self.namespaces.insert(name.to_owned(), Arc::new(namespace));
    }

    /// Look up a namespace by name.
    pub(crate) fn get(&self, name: &str) -> anyhow::Result<Arc<DescriptorNamespace>> {
        self.namespaces.get(name).cloned().ok_or_else(|| {
            let known: Vec<&str> = self.namespaces.keys().map(String::as_str).collect();
            if known.is_empty() {
                anyhow::anyhow!(
                    "unknown namespace '{name}': no namespaces are configured (use --dir or add [namespaces.{name}] to .unitreg/config.toml)"
                )
            } else {
                anyhow::anyhow!(
                    "unknown namespace '{name}' (configured: {})",
                    known.join(", ")
                )
            }
        })
    }

    /// Iterate namespaces in name order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Arc<DescriptorNamespace>)> {
        self.namespaces.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use unitreg_config::NamespaceSection;
    use unitreg_telemetry::{LogFormat, LogTarget};

    use super::*;

    fn config_with(name: &str, dir: &Path, extension: &str) -> Config {
        let mut config = Config::default();
        config.namespaces.insert(
            name.to_owned(),
            NamespaceSection {
                directory: dir.to_path_buf(),
                extension: extension.to_owned(),
            },
        );
        config
    }

    #[test]
    fn test_to_log_config() {
        let logging = LoggingSection {
            level: "debug".into(),
            format: "json".into(),
            directives: vec!["unitreg_core=trace".into()],
            directory: None,
        };
        let lc = to_log_config(&logging);
        assert_eq!(lc.level, "debug");
        assert_eq!(lc.format, LogFormat::Json);
        assert_eq!(lc.directives, vec!["unitreg_core=trace"]);
        assert_eq!(lc.target, LogTarget::Stderr);
    }

    #[test]
    fn test_log_directory_selects_file_target() {
        let logging = LoggingSection {
            directory: Some(PathBuf::from("/var/log/unitreg")),
            ..LoggingSection::default()
        };
        let lc = to_log_config(&logging);
        assert_eq!(lc.target, LogTarget::File(PathBuf::from("/var/log/unitreg")));
        assert!(!lc.ansi);
    }

    #[test]
    fn test_catalog_binds_directories() {
        let config = config_with("exploits", Path::new("/srv/exploits"), "rb");
        let catalog = Catalog::from_config(&config);
        let ns = catalog.get("exploits").unwrap();
        assert_eq!(ns.directory().unwrap(), PathBuf::from("/srv/exploits"));
        assert_eq!(ns.extension(), "rb");
    }

    #[test]
    fn test_ad_hoc_namespace() {
        let catalog = Catalog::default().with_ad_hoc(PathBuf::from("units"), None);
        let ns = catalog.get(AD_HOC_NAMESPACE).unwrap();
        assert_eq!(ns.extension(), DEFAULT_EXTENSION);
    }

    #[test]
    fn test_unknown_namespace_lists_known_ones() {
        let config = config_with("payloads", Path::new("/p"), "toml");
        let err = Catalog::from_config(&config).get("nope").unwrap_err();
        assert!(err.to_string().contains("payloads"));
    }
}
