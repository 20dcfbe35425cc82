use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://vitibrasil.cnpuv.embrapa.br/index.php";
const LOCAL_FILE: &str = "vitibrasil";
const ENV_PREFIX: &str = "VITI";

/// Runtime settings. Loaded once at startup and handed to the service by
/// reference; nothing else reads configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: Option<u64>,
    pub decimal_separator: char,
    pub thousands_separator: char,
    pub null_markers: Vec<String>,
    pub label_columns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("vitibrasil_scraper/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: None,
            decimal_separator: ',',
            thousands_separator: '.',
            null_markers: ["-", "—", "–", "nd", "*"].map(String::from).to_vec(),
            label_columns: vec!["Ano".to_string()],
        }
    }
}

impl Settings {
    /// Defaults, then `vitibrasil.toml` if present, then `path` if given,
    /// then `VITI_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(File::with_name(LOCAL_FILE).required(false));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("null_markers")
                    .with_list_parse_key("label_columns"),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decimal_separator == self.thousands_separator {
            return Err(ConfigError::Message(format!(
                "decimal and thousands separators are both '{}'",
                self.decimal_separator
            )));
        }
        if self.decimal_separator.is_ascii_digit() || self.thousands_separator.is_ascii_digit() {
            return Err(ConfigError::Message("separators cannot be digits".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
