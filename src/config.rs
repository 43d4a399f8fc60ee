//! Configuration types for document analysis and the HTTP server.
//!
//! All analysis behaviour is controlled through [`AnalysisConfig`], built via
//! its [`AnalysisConfigBuilder`]. The binary maps environment variables and
//! CLI flags onto the builder; library users set only what they care about
//! and rely on the defaults for the rest.

use crate::error::ReviewError;
use crate::prompts::DEFAULT_SECTIONS;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Provider used when none is configured and auto-detection finds nothing.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Configuration for analysing one document.
///
/// # Example
/// ```rust
/// use act_review::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .model("gemini-2.5-flash")
///     .temperature(0.3)
///     .temp_dir("./data")
///     .build()
///     .unwrap();
/// assert_eq!(config.sections.len(), 6);
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// LLM model identifier. If None, [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.3.
    ///
    /// Low enough that repeated runs over the same act give near-identical
    /// JSON, high enough that summaries do not read like a template.
    pub temperature: f32,

    /// Maximum tokens the model may generate per call. Default: 8192.
    ///
    /// The section extraction of a long act is the largest of the three
    /// outputs; truncating it mid-object turns it into a parse error.
    pub max_tokens: usize,

    /// Per-call timeout in seconds. Default: None (wait indefinitely).
    pub api_timeout_secs: Option<u64>,

    /// Directory for scoped upload files. Created on demand. Default: `./data`.
    pub temp_dir: PathBuf,

    /// Directory containing the pdfium shared library.
    /// If None, `./` and then the system library are tried.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Section names to extract. Default: [`DEFAULT_SECTIONS`].
    pub sections: Vec<String>,

    /// Run the three model calls one after another. Default: false.
    ///
    /// The calls share no data, so concurrent execution is the default.
    /// Sequential mode is for providers with tight per-second rate limits.
    pub sequential: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.3,
            max_tokens: 8192,
            api_timeout_secs: None,
            temp_dir: PathBuf::from("./data"),
            pdfium_lib_path: None,
            sections: DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect(),
            sequential: false,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("temp_dir", &self.temp_dir)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("sections", &self.sections)
            .field("sequential", &self.sequential)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model identifier that will actually be requested.
    pub fn effective_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = dir.into();
        self
    }

    pub fn pdfium_lib_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(dir.into());
        self
    }

    pub fn sections<I, S>(mut self, sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.sections = sections.into_iter().map(Into::into).collect();
        self
    }

    pub fn sequential(mut self, v: bool) -> Self {
        self.config.sequential = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, ReviewError> {
        let c = &self.config;
        if c.sections.iter().all(|s| s.trim().is_empty()) {
            return Err(ReviewError::InvalidConfig(
                "At least one section name is required".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ReviewError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(ReviewError::InvalidConfig(
                "api_timeout_secs must be ≥ 1 when set".into(),
            ));
        }
        Ok(self.config)
    }
}

/// HTTP server binding and limits.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
