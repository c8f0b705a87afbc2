//! Server-only settings.
//!
//! Read from the same config.toml and `SCHEDULIFY_*` environment as the core
//! `Settings`; keys the server doesn't know are ignored. The unprefixed
//! `GEMINI_API_KEY`, `GOOGLE_API_KEY`, `GEMINI_MODEL`, `OLLAMA_HOST` and
//! `OLLAMA_MODEL` variables are honoured as fallbacks.

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "models/gemini-2.0-flash";
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

/// Which collaborator turns uploads into schedule data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// Gemini vision model over the image itself
    Gemini,
    /// Tesseract OCR, then a local Ollama model over the text
    Ollama,
    /// Tesseract OCR, then the offline block detector
    Heuristic,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_gemini_endpoint() -> String {
    DEFAULT_GEMINI_ENDPOINT.to_string()
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_ollama_host() -> String {
    DEFAULT_OLLAMA_HOST.to_string()
}

fn default_ollama_model() -> String {
    DEFAULT_OLLAMA_MODEL.to_string()
}

fn default_ocr_hint() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Origins allowed by CORS; "*" allows any.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Unset: Gemini when an API key is configured, otherwise heuristic.
    #[serde(default)]
    pub extractor: Option<ExtractorKind>,

    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_gemini_endpoint")]
    pub gemini_endpoint: String,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    /// Send Tesseract's transcription along with the image when available.
    #[serde(default = "default_ocr_hint")]
    pub ocr_hint: bool,

    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,

    /// Explicit tesseract binary; otherwise looked up in PATH.
    #[serde(default)]
    pub tesseract_path: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind: default_bind(),
            cors_origins: default_cors_origins(),
            extractor: None,
            gemini_api_key: None,
            gemini_endpoint: default_gemini_endpoint(),
            gemini_model: default_gemini_model(),
            ocr_hint: default_ocr_hint(),
            ollama_host: default_ollama_host(),
            ollama_model: default_ollama_model(),
            tesseract_path: None,
        }
    }
}

fn legacy_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

impl ServerSettings {
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let mut settings: ServerSettings = builder
            .add_source(
                Environment::with_prefix("SCHEDULIFY")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_origins"),
            )
            .build()
            .context("Failed to read server settings")?
            .try_deserialize()
            .context("Invalid server settings")?;

        if settings.gemini_api_key.is_none() {
            settings.gemini_api_key = legacy_env(&["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
        }
        // Only where the config left the built-in default
        for (field, default, names) in [
            (&mut settings.gemini_model, DEFAULT_GEMINI_MODEL, &["GEMINI_MODEL"]),
            (&mut settings.ollama_host, DEFAULT_OLLAMA_HOST, &["OLLAMA_HOST"]),
            (&mut settings.ollama_model, DEFAULT_OLLAMA_MODEL, &["OLLAMA_MODEL"]),
        ] {
            if field.as_str() == default {
                if let Some(value) = legacy_env(names) {
                    *field = value;
                }
            }
        }

        Ok(settings)
    }

    pub fn extractor_kind(&self) -> ExtractorKind {
        self.extractor.unwrap_or(if self.gemini_api_key.is_some() {
            ExtractorKind::Gemini
        } else {
            ExtractorKind::Heuristic
        })
    }
}
