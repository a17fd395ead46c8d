//! Engine configuration.
//!
//! Controls how the binaries talk to the provisioning engine. All values are
//! driven by environment variables.

/// Runtime configuration shared by the BucketStack binaries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Endpoint override for S3 and STS (e.g. a local emulator).
    pub endpoint_url: Option<String>,
    /// Whether to use path-style bucket addressing.
    pub force_path_style: bool,
    /// Print the plan instead of applying it.
    pub preview: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            endpoint_url: None,
            force_path_style: false,
            preview: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `LOG_LEVEL` | `info` |
    /// | `AWS_ENDPOINT_URL` | *(unset)* |
    /// | `S3_FORCE_PATH_STYLE` | `false` |
    /// | `BUCKETSTACK_PREVIEW` | `false` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        config.endpoint_url = std::env::var("AWS_ENDPOINT_URL")
            .ok()
            .filter(|v| !v.is_empty());
        if let Ok(v) = std::env::var("S3_FORCE_PATH_STYLE") {
            config.force_path_style = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("BUCKETSTACK_PREVIEW") {
            config.preview = v == "1" || v.eq_ignore_ascii_case("true");
        }

        config
    }
}
