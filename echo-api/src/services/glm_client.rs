//! GLM chat-completion emotion analysis client
//!
//! Wraps the remote emotion classifier with a fixed-interval rate gate and a
//! deterministic keyword fallback. `analyze_emotion` never fails: any
//! network, protocol, or parse problem degrades to the fallback classifier.

use crate::services::keyword_classifier;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

const GLM_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";
const GLM_MODEL: &str = "glm-4-plus";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default minimum interval between outbound requests
pub const DEFAULT_RATE_LIMIT_MS: u64 = 2000;

/// Confidence reported for fallback-derived analyses
const FALLBACK_CONFIDENCE: f64 = 0.7;

const SYSTEM_PROMPT: &str = r#"You are an expert emotion analyst. Analyze the emotional content of text and respond with a JSON object containing:
{
  "primaryEmotion": "dominant emotion (nostalgia, joy, peace, love, warmth, contemplative, grateful, calm, hopeful, excitement, melancholy, wonder, etc.)",
  "confidence": confidence_score_0_to_1,
  "emotions": [
    {"emotion": "emotion_name", "intensity": intensity_0_to_1}
  ],
  "summary": "brief emotional summary in 1-2 sentences"
}

Focus on nuanced, specific emotions beyond basic happy/sad. Consider cultural context and subtle emotional undertones."#;

/// GLM client errors
///
/// Every variant reduces to the keyword fallback; the tags exist so the
/// reduction is a single explicit step instead of nested catch blocks.
#[derive(Debug, Error)]
pub enum GlmError {
    #[error("GLM API key not configured")]
    ApiKeyMissing,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("No content received from GLM API")]
    MissingContent,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid analysis structure")]
    InvalidStructure,
}

/// Structured emotion analysis, serialized camelCase for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionAnalysis {
    pub primary_emotion: String,
    pub confidence: f64,
    #[serde(default)]
    pub emotions: Vec<EmotionScore>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionScore {
    pub emotion: String,
    pub intensity: f64,
}

impl EmotionAnalysis {
    /// Clamp confidence and all intensities to [0, 1]
    fn clamp(&mut self) {
        self.confidence = self.confidence.clamp(0.0, 1.0);
        for score in &mut self.emotions {
            score.intensity = score.intensity.clamp(0.0, 1.0);
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Fixed-interval rate gate shared by all callers of one client
///
/// Stamps the last-request instant on every wait, so concurrent callers
/// serialize on the configured minimum spacing.
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("GLM rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// GLM emotion classification client
pub struct GlmClient {
    http_client: reqwest::Client,
    rate_limiter: RateLimiter,
    api_key: RwLock<Option<String>>,
    base_url: String,
}

impl GlmClient {
    /// Create a client against the production GLM endpoint.
    ///
    /// A missing API key is not an error here: the client still works and
    /// every analysis takes the keyword fallback path until a key is
    /// configured.
    pub fn new(api_key: Option<String>, rate_limit_ms: u64) -> Result<Self, GlmError> {
        Self::with_base_url(api_key, GLM_BASE_URL, rate_limit_ms)
    }

    /// Create a client against an arbitrary chat-completion endpoint.
    /// Used by tests to point at a local mock server.
    pub fn with_base_url(
        api_key: Option<String>,
        base_url: impl Into<String>,
        rate_limit_ms: u64,
    ) -> Result<Self, GlmError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GlmError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: RateLimiter::new(rate_limit_ms),
            api_key: RwLock::new(api_key.filter(|k| !k.trim().is_empty())),
            base_url: base_url.into(),
        })
    }

    /// Replace the configured API key at runtime
    pub async fn set_api_key(&self, key: String) {
        *self.api_key.write().await = Some(key);
    }

    /// Whether a key is currently configured
    pub async fn has_api_key(&self) -> bool {
        self.api_key.read().await.is_some()
    }

    /// Analyze the emotional content of text. Never fails: any remote
    /// failure reduces to the keyword fallback classifier.
    pub async fn analyze_emotion(&self, text: &str) -> EmotionAnalysis {
        match self.request_analysis(text).await {
            Ok(analysis) => analysis,
            Err(err) => {
                tracing::warn!(error = %err, "GLM emotion analysis failed, using keyword fallback");
                fallback_analysis(text)
            }
        }
    }

    /// Analyze a voice transcript, prepending recording context when present
    pub async fn analyze_voice_transcript(
        &self,
        transcript: &str,
        context: Option<&str>,
    ) -> EmotionAnalysis {
        let contextual_text = match context {
            Some(ctx) => format!("Context: {}\n\nTranscript: {}", ctx, transcript),
            None => transcript.to_string(),
        };

        self.analyze_emotion(&contextual_text).await
    }

    /// Single remote attempt: rate-gate, POST, parse, validate. No retries.
    async fn request_analysis(&self, text: &str) -> Result<EmotionAnalysis, GlmError> {
        let api_key = self
            .api_key
            .read()
            .await
            .clone()
            .ok_or(GlmError::ApiKeyMissing)?;

        // Rate limit; stamps the shared timestamp for every outbound attempt
        self.rate_limiter.wait().await;

        let request = ChatRequest {
            model: GLM_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Analyze the emotional content of this text: \"{}\"", text),
                },
            ],
            temperature: 0.3,
            max_tokens: 300,
        };

        tracing::debug!(text_len = text.len(), "Querying GLM emotion API");

        let response = self
            .http_client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GlmError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GlmError::Api(status.as_u16(), error_text));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| GlmError::Parse(e.to_string()))?;

        let content = chat
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or(GlmError::MissingContent)?;

        let mut analysis: EmotionAnalysis =
            serde_json::from_str(content).map_err(|e| GlmError::Parse(e.to_string()))?;

        if analysis.primary_emotion.trim().is_empty() {
            return Err(GlmError::InvalidStructure);
        }

        analysis.clamp();

        tracing::info!(
            emotion = %analysis.primary_emotion,
            confidence = analysis.confidence,
            "GLM emotion analysis succeeded"
        );

        Ok(analysis)
    }
}

/// Wrap the keyword classifier result in the EmotionAnalysis shape.
/// Used for every failure variant so all degradation paths are identical.
pub fn fallback_analysis(text: &str) -> EmotionAnalysis {
    let classification = keyword_classifier::classify(text);

    EmotionAnalysis {
        primary_emotion: classification.emotion.to_string(),
        confidence: FALLBACK_CONFIDENCE,
        emotions: vec![EmotionScore {
            emotion: classification.emotion.to_string(),
            intensity: classification.intensity,
        }],
        summary: format!(
            "Detected {} emotion through text analysis.",
            classification.emotion
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limiter_stores_min_interval() {
        let limiter = RateLimiter::new(2000);
        assert_eq!(limiter.min_interval, Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn rate_limiter_spaces_consecutive_waits() {
        let limiter = RateLimiter::new(200);

        let start = Instant::now();

        // First request passes immediately
        limiter.wait().await;
        let first_elapsed = start.elapsed();

        // Second and third requests each wait ~200ms
        limiter.wait().await;
        let second_elapsed = start.elapsed();

        limiter.wait().await;
        let third_elapsed = start.elapsed();

        assert!(first_elapsed < Duration::from_millis(100));
        assert!(second_elapsed >= Duration::from_millis(180));
        assert!(third_elapsed >= Duration::from_millis(380));
    }

    #[test]
    fn client_creation_without_key() {
        let client = GlmClient::new(None, DEFAULT_RATE_LIMIT_MS);
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn blank_api_key_counts_as_missing() {
        let client = GlmClient::new(Some("   ".to_string()), DEFAULT_RATE_LIMIT_MS).unwrap();
        assert!(!client.has_api_key().await);
    }

    #[tokio::test]
    async fn missing_key_falls_back_without_touching_network() {
        let client = GlmClient::with_base_url(None, "http://127.0.0.1:1/", 0).unwrap();

        let analysis = client
            .analyze_emotion("I am so angry and furious about this")
            .await;

        assert_eq!(analysis.primary_emotion, "anger");
        assert_eq!(analysis.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(analysis.emotions.len(), 1);
    }

    #[test]
    fn fallback_matches_keyword_classifier() {
        let text = "Walking through the park reminds me of my childhood";
        let classification = keyword_classifier::classify(text);
        let analysis = fallback_analysis(text);

        assert_eq!(analysis.primary_emotion, classification.emotion);
        assert_eq!(analysis.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(analysis.emotions[0].intensity, classification.intensity);
        assert!(analysis.summary.contains("nostalgia"));
    }

    #[test]
    fn clamp_limits_confidence_and_intensities() {
        let mut analysis = EmotionAnalysis {
            primary_emotion: "joy".to_string(),
            confidence: 1.7,
            emotions: vec![EmotionScore {
                emotion: "joy".to_string(),
                intensity: -0.2,
            }],
            summary: String::new(),
        };

        analysis.clamp();

        assert_eq!(analysis.confidence, 1.0);
        assert_eq!(analysis.emotions[0].intensity, 0.0);
    }

    #[test]
    fn analysis_serializes_camel_case() {
        let analysis = fallback_analysis("so happy today");
        let json = serde_json::to_value(&analysis).unwrap();

        assert!(json.get("primaryEmotion").is_some());
        assert!(json.get("confidence").is_some());
        assert!(json.get("emotions").is_some());
        assert!(json.get("summary").is_some());
    }
}
