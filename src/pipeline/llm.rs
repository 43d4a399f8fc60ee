//! Model interaction: send one rendered prompt, get raw text back.
//!
//! This module is intentionally thin. Prompt wording lives in
//! [`crate::prompts`], response parsing in [`super::normalize`]. What is left
//! here is the single network round-trip and its failure mapping.
//!
//! ## Injection seam
//!
//! [`PromptExecutor`] talks to a [`TextModel`], not to a concrete provider.
//! Production code wraps an `edgequake_llm` provider in [`ProviderModel`];
//! tests substitute a fake that records prompts and counts calls.
//!
//! Calls are single-shot: no retry, no backoff, no caching. Identical
//! prompts are re-sent every time.

use crate::config::{AnalysisConfig, DEFAULT_PROVIDER};
use crate::error::ReviewError;
use crate::prompts::PromptRequest;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A text-generation backend: prompt in, raw completion out.
///
/// Errors are plain strings; the executor attaches the call site.
pub trait TextModel: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, String>>;
}

/// [`TextModel`] backed by an `edgequake_llm` provider with fixed sampling.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AnalysisConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }
}

impl TextModel for ProviderModel {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, String>> {
        async move {
            let messages = vec![ChatMessage::user(prompt)];
            let response = self
                .provider
                .chat(&messages, Some(&self.options))
                .await
                .map_err(|e| e.to_string())?;
            debug!(
                "{} input tokens, {} output tokens",
                response.prompt_tokens, response.completion_tokens
            );
            Ok(response.content)
        }
        .boxed()
    }
}

/// Build `CompletionOptions` from the analysis config.
fn build_options(config: &AnalysisConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Sends prompts to a model exactly once each.
#[derive(Clone)]
pub struct PromptExecutor {
    model: Arc<dyn TextModel>,
    timeout: Option<Duration>,
}

impl PromptExecutor {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self {
            model,
            timeout: None,
        }
    }

    /// Fail calls that take longer than `secs` seconds.
    pub fn with_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.timeout = secs.map(Duration::from_secs);
        self
    }

    /// Render `request` and return the model's raw response text.
    ///
    /// # Errors
    /// - [`ReviewError::ModelCall`] when the provider call fails
    /// - [`ReviewError::ModelTimeout`] when the configured timeout elapses
    /// - [`ReviewError::Internal`] when the template cannot be rendered
    pub async fn execute(&self, request: PromptRequest) -> Result<String, ReviewError> {
        let call = request.kind();
        let prompt = request.render()?;
        debug!("{}: prompt is {} chars", call, prompt.len());

        let start = Instant::now();
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.model.generate(&prompt))
                .await
                .map_err(|_| ReviewError::ModelTimeout {
                    call,
                    secs: limit.as_secs(),
                })?,
            None => self.model.generate(&prompt).await,
        };

        let text = outcome.map_err(|detail| ReviewError::ModelCall { call, detail })?;
        info!(
            "{}: {} chars in {}ms",
            call,
            text.len(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ReviewError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ReviewError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or
///    the default model; the factory reads the matching API key variable.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **Gemini key present** (`GEMINI_API_KEY`), the default provider.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &AnalysisConfig) -> Result<Arc<dyn LLMProvider>, ReviewError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.effective_model());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if std::env::var("GEMINI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_provider(DEFAULT_PROVIDER, config.effective_model());
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReviewError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY (or OPENAI_API_KEY, ANTHROPIC_API_KEY), \
                or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{summary_request, PromptKind};
    use std::sync::Mutex;

    struct Echo;

    impl TextModel for Echo {
        fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, String>> {
            async move { Ok(format!("echo:{}", prompt.len())) }.boxed()
        }
    }

    struct Failing;

    impl TextModel for Failing {
        fn generate<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String, String>> {
            async move { Err("401 unauthorized".to_string()) }.boxed()
        }
    }

    struct Slow;

    impl TextModel for Slow {
        fn generate<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String, String>> {
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(String::new())
            }
            .boxed()
        }
    }

    struct Recording(Mutex<Vec<String>>);

    impl TextModel for Recording {
        fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, String>> {
            self.0.lock().unwrap().push(prompt.to_string());
            async move { Ok("ok".to_string()) }.boxed()
        }
    }

    #[test]
    fn build_options_defaults() {
        let config = AnalysisConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.3));
        assert_eq!(opts.max_tokens, Some(8192));
    }

    #[tokio::test]
    async fn execute_returns_raw_text() {
        let exec = PromptExecutor::new(Arc::new(Echo));
        let req = summary_request("abc");
        let expected = format!("echo:{}", req.render().unwrap().len());
        assert_eq!(exec.execute(req).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn execute_sends_rendered_prompt_once() {
        let model = Arc::new(Recording(Mutex::new(Vec::new())));
        let exec = PromptExecutor::new(model.clone());
        exec.execute(summary_request("The Act.")).await.unwrap();
        let prompts = model.0.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with("bullet points:\nThe Act."));
    }

    #[tokio::test]
    async fn execute_maps_failure_to_model_call_error() {
        let exec = PromptExecutor::new(Arc::new(Failing));
        let err = exec.execute(summary_request("x")).await.unwrap_err();
        match err {
            ReviewError::ModelCall { call, detail } => {
                assert_eq!(call, PromptKind::Summary);
                assert_eq!(detail, "401 unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn execute_times_out() {
        let exec = PromptExecutor::new(Arc::new(Slow)).with_timeout_secs(Some(1));
        let err = exec.execute(summary_request("x")).await.unwrap_err();
        assert!(matches!(err, ReviewError::ModelTimeout { secs: 1, .. }));
    }
}
