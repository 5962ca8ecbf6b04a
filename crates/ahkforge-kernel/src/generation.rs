//! Request building and response parsing for model-generated scripts.
//!
//! Transport is the caller's business. This module only shapes the JSON
//! payload for the configured endpoint and digs the script back out of
//! whatever JSON the provider returns. Generated text then goes through the
//! sanitizer like any other input.

use ahkforge_types::ScriptText;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::config::GenerationConfig;

/// Instructions sent ahead of every request.
pub const SYSTEM_INSTRUCTIONS: &str = "You are an AutoHotkey v2 scripting specialist. OUTPUT MUST BE STRICT AutoHotkey v2. \
Hard requirements: (1) Begin with '#Requires AutoHotkey v2.0' \
(2) Use ONLY function syntax for former v1 commands: MsgBox('text'), Send('keys'), TrayTip('text', 'title'), \
SoundSetMute(-1), SoundGetMute(), SoundSetVolume(n), SoundGetVolume(). \
(3) NEVER use legacy comma command syntax like 'MsgBox,', 'Send,', 'SoundSet,' or 'SoundGet,'. \
(4) Use braces { } for multi-line hotkey bodies. \
If the request asks for legacy syntax, upgrade it to v2 instead. Return ONLY code without explanations.";

/// Fields tried in order for providers that nest output under a wrapper key.
const WRAPPER_KEYS: [&str; 3] = ["output", "data", "result"];
/// Keys that carry a provider-reported error.
const ERROR_KEYS: [&str; 2] = ["error", "detail"];

/// Model response could not be turned into a script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("provider reported an error: {0}")]
    Provider(String),

    #[error("response contained no script text")]
    EmptyResponse,
}

/// API flavor, decided from the endpoint URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKind {
    Llama,
    OpenAi,
    OpenAiCompatible,
}

impl ApiKind {
    /// Classify an endpoint. Llama hosts are checked first, then OpenAI,
    /// then known OpenAI-compatible servers; anything else is Llama.
    pub fn from_endpoint(url: &str) -> Self {
        let url = url.to_ascii_lowercase();
        if url.contains("llama.com") {
            ApiKind::Llama
        } else if url.contains("openai.com") {
            ApiKind::OpenAi
        } else if ["ollama", "lmstudio", "together", "groq"]
            .iter()
            .any(|host| url.contains(host))
        {
            ApiKind::OpenAiCompatible
        } else {
            ApiKind::Llama
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKind::Llama => "llama",
            ApiKind::OpenAi => "openai",
            ApiKind::OpenAiCompatible => "openai-compatible",
        }
    }
}

/// One generation request.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub config: &'a GenerationConfig,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(prompt: &'a str, config: &'a GenerationConfig) -> Self {
        Self { prompt, config }
    }

    pub fn api_kind(&self) -> ApiKind {
        ApiKind::from_endpoint(&self.config.endpoint)
    }

    /// Chat endpoints take a message list; others take a flat prompt.
    pub fn is_chat(&self) -> bool {
        self.config.endpoint.contains("/chat/completions")
    }

    /// JSON body for the configured endpoint.
    pub fn payload(&self) -> Value {
        if self.is_chat() {
            json!({
                "model": self.config.model,
                "messages": [
                    { "role": "system", "content": SYSTEM_INSTRUCTIONS },
                    { "role": "user", "content": self.prompt },
                ],
                "max_tokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            })
        } else {
            json!({
                "prompt": format!(
                    "{SYSTEM_INSTRUCTIONS}\n\nUSER REQUEST: {}\n\nReturn only AutoHotkey v2 code:",
                    self.prompt
                ),
                "max_tokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            })
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn provider_error(response: &Value) -> Option<String> {
    ERROR_KEYS.iter().find_map(|key| match response.get(key)? {
        Value::String(message) => Some(message.clone()),
        obj @ Value::Object(_) => Some(
            non_empty_str(obj.get("message"))
                .or_else(|| non_empty_str(obj.get("error")))
                .map_or_else(|| obj.to_string(), str::to_string),
        ),
        _ => None,
    })
}

/// Pull the generated text out of a provider response.
///
/// Tries, in order: `choices[0].message.content`, `choices[0].content`,
/// `choices[0].text`, a string or `{text|content}` object under
/// `output`/`data`/`result`, and `completion_message.content.text`.
pub fn extract_completion(response: &Value) -> Result<String, GenerationError> {
    if let Some(message) = provider_error(response) {
        return Err(GenerationError::Provider(message));
    }

    let choice = response.pointer("/choices/0");
    let from_choice = choice.and_then(|c| {
        non_empty_str(c.pointer("/message/content"))
            .or_else(|| non_empty_str(c.get("content")))
            .or_else(|| non_empty_str(c.get("text")))
    });

    let from_wrapper = || {
        WRAPPER_KEYS.iter().find_map(|key| match response.get(key)? {
            s @ Value::String(_) => non_empty_str(Some(s)),
            obj @ Value::Object(_) => {
                non_empty_str(obj.get("text")).or_else(|| non_empty_str(obj.get("content")))
            }
            _ => None,
        })
    };

    let from_completion_message =
        || non_empty_str(response.pointer("/completion_message/content/text"));

    from_choice
        .or_else(from_wrapper)
        .or_else(from_completion_message)
        .map(|text| text.trim().to_string())
        .ok_or(GenerationError::EmptyResponse)
}

/// Remove a Markdown code fence around a script.
///
/// Only text that starts with a fence is touched: the opening ```` ```lang ````
/// line goes, as do trailing fence and blank lines.
pub fn strip_code_fences(text: &str) -> String {
    let text = text.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }

    let mut lines: Vec<&str> = text.lines().skip(1).collect();
    while lines
        .last()
        .is_some_and(|line| matches!(line.trim(), "```" | ""))
    {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// Turn a raw provider response into script text.
///
/// `raw` may be a JSON document or plain text. Plain text is used as is.
pub fn script_from_response(raw: &str) -> Result<ScriptText, GenerationError> {
    let text = match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => extract_completion(&value)?,
        _ => raw.trim().to_string(),
    };

    let code = strip_code_fences(&text);
    if code.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    debug!(chars = code.len(), "extracted script from response");
    Ok(ScriptText::new(&code))
}
