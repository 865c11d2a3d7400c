// Chat-completions backend for the semantic matcher
//
// Sends one survey student plus the numbered attendee list to an
// OpenAI-compatible endpoint and parses the structured verdict.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use rollmatch_recon::config::{SemanticConfig, SemanticProvider};
use rollmatch_recon::scorer::{SemanticBackend, SemanticRequest, SemanticResponse};

// ============================================================================
// API types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// JSON object the model is asked to return.
#[derive(Deserialize)]
struct MatchVerdict {
    match_index: i64,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}

// ============================================================================
// Backend
// ============================================================================

enum Auth {
    Bearer(String),
    ApiKey(String),
}

pub struct ChatCompletionsBackend {
    client: reqwest::blocking::Client,
    url: String,
    auth: Auth,
    /// Sent in the body for OpenAI; Azure routes by deployment in the URL.
    model: Option<String>,
    max_tokens: u32,
}

impl ChatCompletionsBackend {
    pub fn new(config: &SemanticConfig, api_key: String) -> Result<Self, String> {
        let base_url = config.resolved_endpoint().ok_or_else(|| {
            format!("no endpoint configured for provider \"{}\"", config.provider.name())
        })?;
        Self::with_base_url(config, api_key, base_url)
    }

    pub fn with_base_url(config: &SemanticConfig, api_key: String, base_url: String) -> Result<Self, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| format!("cannot build HTTP client: {e}"))?;

        let base = base_url.trim_end_matches('/');
        let (url, auth, model) = match config.provider {
            SemanticProvider::OpenAI => (
                format!("{base}/chat/completions"),
                Auth::Bearer(api_key),
                Some(config.model.clone()),
            ),
            SemanticProvider::Azure => (
                format!(
                    "{base}/openai/deployments/{}/chat/completions?api-version={}",
                    config.model, config.api_version
                ),
                Auth::ApiKey(api_key),
                None,
            ),
        };

        Ok(Self {
            client,
            url,
            auth,
            model,
            max_tokens: config.max_tokens,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn call(&self, request: &SemanticRequest) -> Result<String, String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: build_system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: build_user_prompt(request),
                },
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let builder = self.client.post(&self.url).json(&body);
        let builder = match &self.auth {
            Auth::Bearer(key) => builder.bearer_auth(key),
            Auth::ApiKey(key) => builder.header("api-key", key),
        };

        let response = builder.send().map_err(|e| format!("network error: {e}"))?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(format!("API error ({}): {message}", status.as_u16()));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| format!("cannot parse API response: {e}"))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| "no choices in response".to_string())
    }
}

impl SemanticBackend for ChatCompletionsBackend {
    fn resolve(&self, request: &SemanticRequest) -> Result<SemanticResponse, String> {
        let content = self.call(request)?;
        debug!("semantic response for '{}': {content}", request.query.name);
        parse_match_response(&content)
    }
}

// ============================================================================
// Prompt
// ============================================================================

fn build_system_prompt() -> String {
    r#"You match student names between an event survey and a ticket registration list.

The same student may appear under a nickname, abbreviation, misspelling, reordered name, or with a middle name missing. School and year are supporting evidence, not requirements.

Return ONLY a JSON object with exactly these keys:
- "match_index": the 1-based number of the matching attendee, or 0 if none is a good match
- "confidence": an integer from 0 to 100
- "reasoning": one short sentence explaining the decision"#
        .to_string()
}

fn build_user_prompt(request: &SemanticRequest) -> String {
    let q = &request.query;
    let mut prompt = String::new();

    prompt.push_str("SURVEY STUDENT:\n");
    prompt.push_str(&format!("Name: {}, School: {}, Year: {}\n", q.name, q.school, q.year));

    prompt.push_str("\nATTENDEES:\n");
    for (i, p) in request.numbered() {
        prompt.push_str(&format!("{i}. Name: {}, School: {}, Year: {}\n", p.name, p.school, p.year));
    }

    prompt.push_str("\nWhich attendee is the survey student? Set match_index to 0 if there is no good match.");
    prompt
}

// ============================================================================
// Response parsing
// ============================================================================

/// Parse the model's verdict. Accepts surrounding text around the JSON object.
pub fn parse_match_response(content: &str) -> Result<SemanticResponse, String> {
    let verdict: MatchVerdict = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            let extracted = content
                .find('{')
                .zip(content.rfind('}'))
                .filter(|(start, end)| start < end)
                .and_then(|(start, end)| serde_json::from_str(&content[start..=end]).ok());
            match extracted {
                Some(v) => v,
                None => return Err(format!("cannot parse match response: {e}. Raw: {content}")),
            }
        }
    };

    let match_index = u64::try_from(verdict.match_index)
        .map_err(|_| format!("negative match_index {}", verdict.match_index))?;

    let confidence = if verdict.confidence.is_finite() {
        verdict.confidence.clamp(0.0, 100.0)
    } else {
        0.0
    };

    Ok(SemanticResponse {
        match_index,
        confidence,
        reasoning: verdict.reasoning.trim().to_string(),
    })
}
