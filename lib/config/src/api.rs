use serde::Deserialize;

/// REST front-end and process-level settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_port")]
    pub port: u16,
    /// Maximum accepted size of a POST / PUT request body.
    #[serde(default = "ApiConfig::default_max_put_body_bytes")]
    pub max_put_body_bytes: usize,
    /// `plain` or `json`.
    #[serde(default = "ApiConfig::default_log_format")]
    pub log_format: String,
    /// Overrides `RUST_LOG` when set.
    #[serde(default)]
    pub log_directives: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: Self::default_port(),
            max_put_body_bytes: Self::default_max_put_body_bytes(),
            log_format: Self::default_log_format(),
            log_directives: None,
        }
    }
}

impl ApiConfig {
    const fn default_port() -> u16 {
        3100
    }

    const fn default_max_put_body_bytes() -> usize {
        32 * 1024 * 1024
    }

    fn default_log_format() -> String {
        "plain".to_owned()
    }
}
