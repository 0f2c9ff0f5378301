//! Text Generator - Bindings for the fine-tuned debate model
//!
//! The model is served by a text-generation endpoint (`POST /generate`).
//! This crate provides the decoding presets used by the composer, the
//! [`TextGenerator`] seam and the process-wide model handle.
//!
//! ## Model handle
//!
//! The handle is installed once at startup with [`install`] and is read-only
//! afterwards. [`shared`] fails with [`GenerationError::ModelNotLoaded`]
//! until then.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";
pub const MODEL_NAME: &str = "debate_model_finetuned";

/// Sampling parameters; absent means greedy decoding
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DecodingConfig {
    pub max_new_tokens: u32,
    pub sampling: Option<Sampling>,
}

impl DecodingConfig {
    /// Short greedy output for topic/position/stage prompts
    pub fn basic() -> Self {
        Self {
            max_new_tokens: 100,
            sampling: None,
        }
    }

    /// Longer sampled output for evidence-backed chat replies
    pub fn chat() -> Self {
        Self {
            max_new_tokens: 300,
            sampling: Some(Sampling {
                temperature: 0.7,
                top_p: 0.9,
                repetition_penalty: 1.2,
            }),
        }
    }
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Model not loaded")]
    ModelNotLoaded,
    #[error("Model already loaded")]
    AlreadyLoaded,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Generation endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Inference error: {0}")]
    InferenceError(String),
}

pub trait TextGenerator: Send + Sync {
    fn model_name(&self) -> &str;

    fn generate(&self, prompt: &str, config: &DecodingConfig) -> Result<String, GenerationError>;
}

// ============ HTTP backend ============

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Debug, Serialize, PartialEq)]
struct GenerateParameters {
    max_new_tokens: u32,
    do_sample: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repetition_penalty: Option<f32>,
    /// Decoded output starts with the prompt
    return_full_text: bool,
}

impl From<&DecodingConfig> for GenerateParameters {
    fn from(config: &DecodingConfig) -> Self {
        Self {
            max_new_tokens: config.max_new_tokens,
            do_sample: config.sampling.is_some(),
            temperature: config.sampling.map(|s| s.temperature),
            top_p: config.sampling.map(|s| s.top_p),
            repetition_penalty: config.sampling.map(|s| s.repetition_penalty),
            return_full_text: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Generated {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Single(Generated),
    Batch(Vec<Generated>),
}

fn parse_generation(body: &str) -> Result<String, GenerationError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::InferenceError(format!("unreadable response: {}", e)))?;

    let text = match response {
        GenerateResponse::Single(g) => Some(g.generated_text),
        GenerateResponse::Batch(batch) => batch.into_iter().next().map(|g| g.generated_text),
    };

    text.filter(|t| !t.trim().is_empty())
        .ok_or_else(|| GenerationError::InferenceError("empty generation".to_string()))
}

/// Generator backed by a text-generation server
pub struct HttpGenerator {
    http: Client,
    endpoint: String,
    model: String,
}

impl HttpGenerator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GenerationError> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: MODEL_NAME.to_string(),
        })
    }
}

impl TextGenerator for HttpGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str, config: &DecodingConfig) -> Result<String, GenerationError> {
        debug!(
            endpoint = %self.endpoint,
            max_new_tokens = config.max_new_tokens,
            sampled = config.sampling.is_some(),
            "requesting generation"
        );

        let response = self
            .http
            .post(format!("{}/generate", self.endpoint))
            .json(&GenerateRequest {
                inputs: prompt,
                parameters: config.into(),
            })
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_generation(&body)
    }
}

// ============ Process-wide handle ============

static MODEL: OnceLock<Box<dyn TextGenerator>> = OnceLock::new();

/// Install the process-wide generator. Fails if one is already installed.
pub fn install(generator: Box<dyn TextGenerator>) -> Result<&'static dyn TextGenerator, GenerationError> {
    MODEL
        .set(generator)
        .map_err(|_| GenerationError::AlreadyLoaded)?;
    shared()
}

pub fn shared() -> Result<&'static dyn TextGenerator, GenerationError> {
    MODEL
        .get()
        .map(|g| &**g)
        .ok_or(GenerationError::ModelNotLoaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoGenerator;

    impl TextGenerator for EchoGenerator {
        fn model_name(&self) -> &str {
            "echo"
        }

        fn generate(&self, prompt: &str, config: &DecodingConfig) -> Result<String, GenerationError> {
            Ok(format!("{}[{} tokens]", prompt, config.max_new_tokens))
        }
    }

    #[test]
    fn test_basic_parameters_are_greedy() {
        let body = serde_json::to_value(GenerateRequest {
            inputs: "Debate Topic: x",
            parameters: (&DecodingConfig::basic()).into(),
        })
        .unwrap();

        assert_eq!(body["parameters"]["max_new_tokens"], 100);
        assert_eq!(body["parameters"]["do_sample"], false);
        assert_eq!(body["parameters"]["return_full_text"], true);
        assert!(body["parameters"].get("temperature").is_none());
    }

    #[test]
    fn test_chat_parameters_sample() {
        let params = GenerateParameters::from(&DecodingConfig::chat());
        assert_eq!(params.max_new_tokens, 300);
        assert!(params.do_sample);
        assert_eq!(params.temperature, Some(0.7));
        assert_eq!(params.top_p, Some(0.9));
        assert_eq!(params.repetition_penalty, Some(1.2));
    }

    #[test]
    fn test_parse_generation_shapes() {
        assert_eq!(
            parse_generation(r#"{"generated_text": "Argument: yes"}"#).unwrap(),
            "Argument: yes"
        );
        assert_eq!(
            parse_generation(r#"[{"generated_text": "Argument: no"}]"#).unwrap(),
            "Argument: no"
        );
    }

    #[test]
    fn test_parse_generation_rejects_empty() {
        assert!(matches!(
            parse_generation(r#"[]"#),
            Err(GenerationError::InferenceError(_))
        ));
        assert!(matches!(
            parse_generation(r#"{"generated_text": "  "}"#),
            Err(GenerationError::InferenceError(_))
        ));
        assert!(parse_generation("<html>").is_err());
    }

    // The handle is process-wide, so its whole lifecycle lives in one test
    #[test]
    fn test_model_handle_lifecycle() {
        assert!(matches!(shared(), Err(GenerationError::ModelNotLoaded)));

        let generator = install(Box::new(EchoGenerator)).unwrap();
        assert_eq!(generator.model_name(), "echo");
        assert_eq!(
            shared()
                .unwrap()
                .generate("Argument:\n", &DecodingConfig::basic())
                .unwrap(),
            "Argument:\n[100 tokens]"
        );

        assert!(matches!(
            install(Box::new(EchoGenerator)),
            Err(GenerationError::AlreadyLoaded)
        ));
    }
}
