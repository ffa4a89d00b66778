//! Request and response model shared between the gateway and the
//! inference backend seam.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// The kind of assistant operation a caller is requesting.
///
/// The set is closed: route handlers map their endpoints onto these
/// variants, so an "unrecognized operation" is unrepresentable past the
/// HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Backend liveness probe.
    Health,
    /// Parse free-form text into a structured transaction.
    Parse,
    /// Conversational finance question.
    Chat,
    /// Spending/budget analysis over a larger prompt.
    Analyze,
}

impl OperationKind {
    /// Stable lowercase name, used for metric labels and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Health => "health",
            OperationKind::Parse => "parse",
            OperationKind::Chat => "chat",
            OperationKind::Analyze => "analyze",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single network attempt handed to the inference backend.
///
/// The payload is reference-counted so the retrying caller can re-send
/// it across attempts without copying the prompt text. The deadline is
/// advisory for the backend client (it may use it to set its own
/// request timeout); the gateway enforces it regardless.
#[derive(Debug, Clone)]
pub struct AttemptRequest {
    /// What the caller is asking for.
    pub kind: OperationKind,
    /// Opaque prompt/request text, already enriched upstream.
    pub payload: Arc<str>,
    /// Hard upper bound for this attempt.
    pub deadline: Duration,
    /// Zero-based attempt number within the logical request.
    pub attempt: u32,
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Produced by the real inference backend.
    Model,
    /// Produced locally by the rule-based fallback responder.
    Fallback,
}

/// A well-formed assistant response.
///
/// Degraded (fallback) responses are structurally identical to model
/// responses but carry `ResponseSource::Fallback` and a reduced
/// confidence, so downstream consumers can surface a "reduced accuracy"
/// notice instead of silently passing them off as model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResponse {
    /// The operation this response answers.
    pub kind: OperationKind,
    /// Response body (assistant text or structured summary).
    pub content: String,
    /// Confidence in `[0.0, 1.0]`; fallback responses are always low.
    pub confidence: f32,
    /// Whether the model or the fallback produced this.
    pub source: ResponseSource,
}

impl InferenceResponse {
    /// Builds a full-confidence model response.
    pub fn from_model(kind: OperationKind, content: impl Into<String>, confidence: f32) -> Self {
        Self {
            kind,
            content: content.into(),
            confidence,
            source: ResponseSource::Model,
        }
    }

    /// True if this response was produced without the backend.
    pub fn is_degraded(&self) -> bool {
        self.source == ResponseSource::Fallback
    }
}
