//! Service layer for echo-api
//!
//! Emotion classification: the GLM remote client and its deterministic
//! keyword fallback.

pub mod glm_client;
pub mod keyword_classifier;

pub use glm_client::{EmotionAnalysis, EmotionScore, GlmClient};
pub use keyword_classifier::KeywordClassification;
