use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const HOST: &str = "https://api-testnet.bitscrunch.com";
pub const PATH: &str = "/api/v1/market/metrics?currency=usd&blockchain=1&metrics=holders&metrics=marketcap&time_range=24h&include_washtrade=true";

pub const DEFAULT_KEY_PATH: &str = "./access-key.json";
pub const DEFAULT_COUNT: u32 = 10;

/// Looked up under the user's config directory when no `--config` is given.
pub const CONFIG_FILE: &str = "bitscrunch/config.toml";

/// Where requests go. `path` includes the query string and is also the path
/// that appears in the signed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub path: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: HOST.to_string(),
            path: PATH.to_string(),
        }
    }
}

impl Endpoint {
    pub fn url(&self) -> String {
        format!("{}{}", self.host, self.path)
    }
}

/// Optional TOML settings file. Every key may be omitted.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    pub host: Option<String>,
    pub path: Option<String>,
    pub key_path: Option<PathBuf>,
    pub count: Option<u32>,
}

impl FileSettings {
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if settings.count == Some(0) {
            return Err(Error::Config {
                path: path.to_path_buf(),
                message: "count must be at least 1".to_string(),
            });
        }
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(path, &text)
    }

    /// An explicit path must exist. Without one, the per-user file is read
    /// only if it is there.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match dirs::config_dir().map(|dir| dir.join(CONFIG_FILE)) {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// Resolved run settings. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: Endpoint,
    pub key_path: PathBuf,
    pub count: u32,
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub key_path: Option<PathBuf>,
    pub count: Option<u32>,
}

impl Settings {
    /// Command line beats the settings file, which beats the built-in constants.
    pub fn resolve(file: FileSettings, overrides: Overrides) -> Self {
        let defaults = Endpoint::default();
        Self {
            endpoint: Endpoint {
                host: overrides.host.or(file.host).unwrap_or(defaults.host),
                path: file.path.unwrap_or(defaults.path),
            },
            key_path: overrides
                .key_path
                .or(file.key_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_PATH)),
            count: overrides.count.or(file.count).unwrap_or(DEFAULT_COUNT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_constants() {
        let settings = Settings::resolve(FileSettings::default(), Overrides::default());
        assert_eq!(settings.endpoint.url(), format!("{HOST}{PATH}"));
        assert_eq!(settings.key_path, PathBuf::from("./access-key.json"));
        assert_eq!(settings.count, 10);
    }

    #[test]
    fn test_file_then_flags_precedence() {
        let file = FileSettings::parse(
            Path::new("config.toml"),
            r#"
                host = "http://127.0.0.1:9000"
                path = "/metrics?x=1"
                key_path = "/etc/bitscrunch/key.json"
                count = 3
            "#,
        )
        .unwrap();

        let settings = Settings::resolve(
            file,
            Overrides {
                host: None,
                key_path: None,
                count: Some(7),
            },
        );
        assert_eq!(settings.endpoint.host, "http://127.0.0.1:9000");
        assert_eq!(settings.endpoint.path, "/metrics?x=1");
        assert_eq!(settings.key_path, PathBuf::from("/etc/bitscrunch/key.json"));
        assert_eq!(settings.count, 7);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = FileSettings::parse(Path::new("bad.toml"), "hots = \"x\"").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_zero_count_is_rejected() {
        let err = FileSettings::parse(Path::new("zero.toml"), "count = 0").unwrap_err();
        assert!(err.to_string().contains("count must be at least 1"));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = FileSettings::discover(Some(&missing)).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "count = 2").unwrap();
        let settings = FileSettings::discover(Some(file.path())).unwrap();
        assert_eq!(settings.count, Some(2));
        assert_eq!(settings.host, None);
    }
}
