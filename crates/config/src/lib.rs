use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "letterpress.toml",
    "config/letterpress.toml",
    "crates/config/letterpress.toml",
    "../letterpress.toml",
    "../config/letterpress.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Which text generator backs the orchestrator.
///
/// The choice is made once at startup. `Stub` never talks to the network and
/// must be requested explicitly; a missing API key does not select it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorMode {
    #[default]
    Live,
    Stub,
}

impl GeneratorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Stub => "stub",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub mode: GeneratorMode,
    pub default_model: String,
    #[serde(default)]
    pub template_dir: Option<String>,
    #[serde(default)]
    pub stub_response: Option<String>,
    #[serde(default)]
    pub openrouter: OpenRouterProviderConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            mode: GeneratorMode::default(),
            default_model: "google/gemini-2.5-flash".to_string(),
            template_dir: None,
            stub_response: None,
            openrouter: OpenRouterProviderConfig::default(),
            streaming: StreamingConfig::default(),
        }
    }
}

/// Configuration options for the OpenRouter upstream.
///
/// ```
/// use letterpress_config::OpenRouterProviderConfig;
///
/// let provider = OpenRouterProviderConfig::default();
/// assert_eq!(provider.base_url, "https://openrouter.ai/api/v1");
/// assert_eq!(provider.request_timeout_seconds, 30);
/// assert!(provider.api_key.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "OpenRouterProviderConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "OpenRouterProviderConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub referer: Option<String>,
    #[serde(default = "OpenRouterProviderConfig::default_title")]
    pub title: Option<String>,
}

impl OpenRouterProviderConfig {
    fn default_base_url() -> String {
        "https://openrouter.ai/api/v1".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    fn default_title() -> Option<String> {
        Some("Letterpress".to_string())
    }
}

impl Default for OpenRouterProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Self::default_base_url(),
            request_timeout_seconds: Self::default_request_timeout(),
            referer: None,
            title: Self::default_title(),
        }
    }
}

/// Pacing of refinement chunks sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    #[serde(default = "StreamingConfig::default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "StreamingConfig::default_chunk_delay")]
    pub chunk_delay_ms: u64,
}

impl StreamingConfig {
    const fn default_chunk_size() -> usize {
        50
    }

    const fn default_chunk_delay() -> u64 {
        100
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: Self::default_chunk_size(),
            chunk_delay_ms: Self::default_chunk_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory for transient export files. Falls back to the OS temp dir.
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default = "ExportConfig::default_letterhead")]
    pub letterhead: String,
    #[serde(default = "ExportConfig::default_footer")]
    pub footer: String,
}

impl ExportConfig {
    fn default_letterhead() -> String {
        "TUM".to_string()
    }

    fn default_footer() -> String {
        "Technical University of Munich Campus Heilbronn".to_string()
    }

    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .as_deref()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            letterhead: Self::default_letterhead(),
            footer: Self::default_footer(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use letterpress_config::load;
///
/// std::env::remove_var("LETTERPRESS_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("orchestrator.mode", defaults.orchestrator.mode.as_str())?
        .set_default(
            "orchestrator.default_model",
            defaults.orchestrator.default_model.clone(),
        )?
        .set_default(
            "orchestrator.openrouter.base_url",
            defaults.orchestrator.openrouter.base_url.clone(),
        )?
        .set_default(
            "orchestrator.openrouter.request_timeout_seconds",
            i64::try_from(defaults.orchestrator.openrouter.request_timeout_seconds)
                .unwrap_or(i64::MAX),
        )?
        .set_default(
            "orchestrator.streaming.chunk_size",
            i64::try_from(defaults.orchestrator.streaming.chunk_size).unwrap_or(i64::MAX),
        )?
        .set_default(
            "orchestrator.streaming.chunk_delay_ms",
            i64::try_from(defaults.orchestrator.streaming.chunk_delay_ms).unwrap_or(i64::MAX),
        )?
        .set_default("export.letterhead", defaults.export.letterhead.clone())?
        .set_default("export.footer", defaults.export.footer.clone())?;

    if let Some(title) = defaults.orchestrator.openrouter.title.clone() {
        builder = builder.set_default("orchestrator.openrouter.title", title)?;
    }

    let environment_overrides = config::Environment::with_prefix("LETTERPRESS").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("LETTERPRESS_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via LETTERPRESS_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.orchestrator.streaming.chunk_size == 0 {
        config.orchestrator.streaming.chunk_size = 1;
    }

    debug!(
        mode = config.orchestrator.mode.as_str(),
        model = %config.orchestrator.default_model,
        address = %config.http.address,
        port = config.http.port,
        "loaded backend configuration"
    );
    Ok(config)
}
