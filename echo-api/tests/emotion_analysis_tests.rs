//! Emotion classification integration tests
//!
//! Runs the GLM client against a local mock chat-completion server to verify
//! the success path, every degradation path, and the rate-limit spacing.

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use echo_api::services::keyword_classifier;
use echo_api::services::GlmClient;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

/// Bind a router on an ephemeral port and return its base URL
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/", addr)
}

/// Mock chat-completion endpoint whose model reply is the given content
fn chat_router_with_content(content: &str) -> Router {
    let body = json!({"choices": [{"message": {"content": content}}]});
    Router::new().route(
        "/",
        post(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    )
}

fn client_for(base_url: &str, rate_limit_ms: u64) -> GlmClient {
    GlmClient::with_base_url(Some("test-key".to_string()), base_url, rate_limit_ms).unwrap()
}

fn assert_matches_fallback(analysis: &echo_api::services::EmotionAnalysis, text: &str) {
    let expected = keyword_classifier::classify(text);
    assert_eq!(analysis.primary_emotion, expected.emotion);
    assert_eq!(analysis.confidence, 0.7);
    assert_eq!(analysis.emotions.len(), 1);
    assert_eq!(analysis.emotions[0].intensity, expected.intensity);
}

#[tokio::test]
async fn accepts_well_formed_remote_analysis() {
    let content = serde_json::to_string(&json!({
        "primaryEmotion": "wonder",
        "confidence": 0.92,
        "emotions": [{"emotion": "wonder", "intensity": 0.9}, {"emotion": "joy", "intensity": 0.4}],
        "summary": "A sense of quiet awe."
    }))
    .unwrap();

    let base_url = serve(chat_router_with_content(&content)).await;
    let client = client_for(&base_url, 0);

    let analysis = client.analyze_emotion("The northern lights filled the sky").await;

    assert_eq!(analysis.primary_emotion, "wonder");
    assert_eq!(analysis.confidence, 0.92);
    assert_eq!(analysis.emotions.len(), 2);
    assert_eq!(analysis.summary, "A sense of quiet awe.");
}

#[tokio::test]
async fn clamps_out_of_range_remote_scores() {
    let content = serde_json::to_string(&json!({
        "primaryEmotion": "joy",
        "confidence": 1.8,
        "emotions": [{"emotion": "joy", "intensity": -0.4}],
        "summary": "Over the top."
    }))
    .unwrap();

    let base_url = serve(chat_router_with_content(&content)).await;
    let client = client_for(&base_url, 0);

    let analysis = client.analyze_emotion("great day").await;

    assert_eq!(analysis.confidence, 1.0);
    assert_eq!(analysis.emotions[0].intensity, 0.0);
}

#[tokio::test]
async fn falls_back_on_http_error_status() {
    let router = Router::new().route(
        "/",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "GLM unavailable") }),
    );
    let base_url = serve(router).await;
    let client = client_for(&base_url, 0);

    let text = "I am so angry and furious about this";
    let analysis = client.analyze_emotion(text).await;

    assert_matches_fallback(&analysis, text);
    assert_eq!(analysis.primary_emotion, "anger");
}

#[tokio::test]
async fn falls_back_on_corrupt_model_content() {
    let base_url = serve(chat_router_with_content("this is not json at all")).await;
    let client = client_for(&base_url, 0);

    let text = "Walking through the park reminds me of my childhood";
    let analysis = client.analyze_emotion(text).await;

    assert_matches_fallback(&analysis, text);
    assert_eq!(analysis.primary_emotion, "nostalgia");
}

#[tokio::test]
async fn falls_back_on_missing_required_fields() {
    // Valid JSON, but no primaryEmotion
    let content = serde_json::to_string(&json!({"confidence": 0.9})).unwrap();
    let base_url = serve(chat_router_with_content(&content)).await;
    let client = client_for(&base_url, 0);

    let text = "feeling calm and peaceful";
    let analysis = client.analyze_emotion(text).await;
    assert_matches_fallback(&analysis, text);

    // Empty primaryEmotion is rejected too
    let content =
        serde_json::to_string(&json!({"primaryEmotion": "", "confidence": 0.9})).unwrap();
    let base_url = serve(chat_router_with_content(&content)).await;
    let client = client_for(&base_url, 0);

    let analysis = client.analyze_emotion(text).await;
    assert_matches_fallback(&analysis, text);
}

#[tokio::test]
async fn falls_back_on_empty_choices() {
    let router = Router::new().route(
        "/",
        post(|| async { Json(json!({"choices": []})) }),
    );
    let base_url = serve(router).await;
    let client = client_for(&base_url, 0);

    let text = "so thankful and blessed";
    let analysis = client.analyze_emotion(text).await;

    assert_matches_fallback(&analysis, text);
    assert_eq!(analysis.primary_emotion, "grateful");
}

#[tokio::test]
async fn falls_back_on_unreachable_endpoint() {
    // Nothing listens on port 1
    let client = client_for("http://127.0.0.1:1/", 0);

    let text = "scared and worried about tomorrow";
    let analysis = client.analyze_emotion(text).await;

    assert_matches_fallback(&analysis, text);
    assert_eq!(analysis.primary_emotion, "fear");
}

#[tokio::test]
async fn analyze_never_fails_regardless_of_input() {
    let client = client_for("http://127.0.0.1:1/", 0);

    for text in ["", "a", "no keywords here at all", &"x".repeat(10_000)] {
        let analysis = client.analyze_emotion(text).await;
        assert!(!analysis.primary_emotion.is_empty());
        assert!((0.0..=1.0).contains(&analysis.confidence));
    }
}

#[tokio::test]
async fn back_to_back_remote_attempts_are_rate_limited() {
    let content = serde_json::to_string(&json!({
        "primaryEmotion": "joy",
        "confidence": 0.9
    }))
    .unwrap();

    let base_url = serve(chat_router_with_content(&content)).await;
    let client = client_for(&base_url, 400);

    let start = Instant::now();

    let first = client.analyze_emotion("first request").await;
    let second = client.analyze_emotion("second request").await;

    let elapsed = start.elapsed();

    assert_eq!(first.primary_emotion, "joy");
    assert_eq!(second.primary_emotion, "joy");
    assert!(
        elapsed >= Duration::from_millis(350),
        "calls completed only {:?} apart",
        elapsed
    );
}

#[tokio::test]
async fn voice_transcript_prepends_context_for_classification() {
    // The mock echoes whether the user message carried the context prefix
    let router = Router::new().route(
        "/",
        post(|Json(body): Json<Value>| async move {
            let user_message = body["messages"][1]["content"].as_str().unwrap_or_default();
            let emotion = if user_message.contains("Context: rainy rooftop") {
                "melancholy"
            } else {
                "joy"
            };
            let content = serde_json::to_string(&json!({
                "primaryEmotion": emotion,
                "confidence": 0.8
            }))
            .unwrap();
            Json(json!({"choices": [{"message": {"content": content}}]}))
        }),
    );
    let base_url = serve(router).await;
    let client = client_for(&base_url, 0);

    let with_context = client
        .analyze_voice_transcript("thinking about the past", Some("rainy rooftop"))
        .await;
    assert_eq!(with_context.primary_emotion, "melancholy");

    let without_context = client
        .analyze_voice_transcript("thinking about the past", None)
        .await;
    assert_eq!(without_context.primary_emotion, "joy");
}
