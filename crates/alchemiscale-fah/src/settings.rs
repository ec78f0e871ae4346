//! Settings for the asynchronous FAH compute service
//!
//! Sources are layered, later ones winning: an optional YAML file,
//! `ALCHEMISCALE_FAH_*` environment variables, then command line overrides.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use alchemiscale_fah_client::FahClientConfig;
use alchemiscale_fah_client::config::{DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_READ_TIMEOUT_MS};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const ENV_PREFIX: &str = "ALCHEMISCALE_FAH";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid settings: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Settings schema for a FahAsynchronousComputeService
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct FahAsynchronousComputeServiceSettings {
    /// URL of the FAH assignment server to use
    #[validate(url)]
    pub fah_as_url: String,
    /// URL of the FAH work server to use
    #[validate(url)]
    pub fah_ws_url: String,
    /// Address the work server is registered under on the assignment server
    pub fah_ws_ip_addr: Ipv4Addr,
    /// TLS certificate used for authentication with FAH servers
    pub fah_certificate_file: PathBuf,
    /// Private key used for TLS communication with FAH servers
    pub fah_key_file: PathBuf,
    /// Whether to verify the certificate presented by FAH servers
    #[serde(default = "default_verify")]
    pub fah_client_verify: bool,
    /// Index file used by the service to track its state
    pub index_file: PathBuf,
    /// Object store directory for larger objects, such as ProtocolDAGs
    pub obj_store: PathBuf,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_verify() -> bool {
    true
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

/// Values given on the command line, applied over file and environment
#[derive(Clone, Debug, Default)]
pub struct SettingsOverrides {
    pub fah_as_url: Option<String>,
    pub fah_ws_url: Option<String>,
    pub fah_ws_ip_addr: Option<Ipv4Addr>,
    pub fah_certificate_file: Option<PathBuf>,
    pub fah_key_file: Option<PathBuf>,
    pub no_verify: bool,
}

impl FahAsynchronousComputeServiceSettings {
    /// Load from `file`, the process environment and `overrides`
    pub fn load(file: Option<&Path>, overrides: &SettingsOverrides) -> Result<Self, SettingsError> {
        Self::load_with_env(file, overrides, None)
    }

    /// Like [`Self::load`], reading environment variables from `env` when given
    pub fn load_with_env(
        file: Option<&Path>,
        overrides: &SettingsOverrides,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true)
                .source(env),
        );

        builder = builder
            .set_override_option("fah_as_url", overrides.fah_as_url.clone())?
            .set_override_option("fah_ws_url", overrides.fah_ws_url.clone())?
            .set_override_option(
                "fah_ws_ip_addr",
                overrides.fah_ws_ip_addr.map(|ip| ip.to_string()),
            )?
            .set_override_option(
                "fah_certificate_file",
                overrides.fah_certificate_file.as_deref().map(path_value),
            )?
            .set_override_option("fah_key_file", overrides.fah_key_file.as_deref().map(path_value))?;
        if overrides.no_verify {
            builder = builder.set_override("fah_client_verify", false)?;
        }

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_client_config(&self) -> FahClientConfig {
        FahClientConfig::new(&self.fah_as_url, &self.fah_ws_url, self.fah_ws_ip_addr)
            .with_identity(&self.fah_certificate_file, &self.fah_key_file)
            .with_verify(self.fah_client_verify)
            .with_timeouts(self.connect_timeout_ms, self.read_timeout_ms)
    }
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
fah_as_url: https://as.example.org/api/
fah_ws_url: https://ws.example.org/api/
fah_ws_ip_addr: 10.0.0.7
fah_certificate_file: /etc/fah/api-certificate.pem
fah_key_file: /etc/fah/api-private.pem
index_file: /var/lib/fah/index
obj_store: /var/lib/fah/objects
"#;

    fn write_yaml(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("settings.yaml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_from_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_yaml(dir.path(), YAML);

        let settings = FahAsynchronousComputeServiceSettings::load_with_env(
            Some(&path),
            &SettingsOverrides::default(),
            Some(HashMap::new()),
        )
        .unwrap();

        assert_eq!(settings.fah_ws_ip_addr, Ipv4Addr::new(10, 0, 0, 7));
        assert!(settings.fah_client_verify);
        assert_eq!(settings.connect_timeout_ms, 5000);
        assert_eq!(settings.obj_store, PathBuf::from("/var/lib/fah/objects"));
    }

    #[test]
    fn test_env_overrides_file_and_cli_overrides_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_yaml(dir.path(), YAML);

        let env = HashMap::from([
            (
                "ALCHEMISCALE_FAH_FAH_WS_URL".to_string(),
                "https://ws2.example.org/".to_string(),
            ),
            (
                "ALCHEMISCALE_FAH_FAH_AS_URL".to_string(),
                "https://as2.example.org/".to_string(),
            ),
            ("ALCHEMISCALE_FAH_READ_TIMEOUT_MS".to_string(), "1000".to_string()),
        ]);
        let overrides = SettingsOverrides {
            fah_as_url: Some("https://as3.example.org/".to_string()),
            no_verify: true,
            ..Default::default()
        };

        let settings =
            FahAsynchronousComputeServiceSettings::load_with_env(Some(&path), &overrides, Some(env))
                .unwrap();

        assert_eq!(settings.fah_ws_url, "https://ws2.example.org/");
        assert_eq!(settings.fah_as_url, "https://as3.example.org/");
        assert_eq!(settings.read_timeout_ms, 1000);
        assert!(!settings.fah_client_verify);
    }

    #[test]
    fn test_missing_required_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_yaml(dir.path(), "fah_as_url: https://as.example.org/\n");

        let err = FahAsynchronousComputeServiceSettings::load_with_env(
            Some(&path),
            &SettingsOverrides::default(),
            Some(HashMap::new()),
        )
        .unwrap_err();

        assert!(matches!(err, SettingsError::Config(_)));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_yaml(dir.path(), &YAML.replace("https://ws.example.org/api/", "ws-host"));

        let err = FahAsynchronousComputeServiceSettings::load_with_env(
            Some(&path),
            &SettingsOverrides::default(),
            Some(HashMap::new()),
        )
        .unwrap_err();

        assert!(matches!(err, SettingsError::Validation(_)));
    }

    #[test]
    fn test_settings_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_yaml(dir.path(), YAML);
        let settings = FahAsynchronousComputeServiceSettings::load_with_env(
            Some(&path),
            &SettingsOverrides::default(),
            Some(HashMap::new()),
        )
        .unwrap();

        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["fah_ws_ip_addr"], "10.0.0.7");
        assert_eq!(value["fah_client_verify"], true);
        assert_eq!(value["read_timeout_ms"], 30000);
    }

    #[test]
    fn test_to_client_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_yaml(dir.path(), YAML);
        let settings = FahAsynchronousComputeServiceSettings::load_with_env(
            Some(&path),
            &SettingsOverrides::default(),
            Some(HashMap::new()),
        )
        .unwrap();

        let config = settings.to_client_config();
        assert_eq!(config.as_api_url, "https://as.example.org/api/");
        assert_eq!(config.key_file, PathBuf::from("/etc/fah/api-private.pem"));
        assert!(config.verify);
    }
}
