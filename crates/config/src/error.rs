use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, #[source] source: toml::de::Error },

    #[error("required configuration is missing: {0}")]
    NotConfigured(&'static str),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
