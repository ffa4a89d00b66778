//! Rule-based fallback responder.
//!
//! When the backend cannot be reached (queue saturated, circuit open,
//! retries exhausted, payload rejected), the gateway still owes the
//! caller a structurally valid response. This module produces one
//! deterministically from the request payload alone: no network, no
//! model, just local pattern matching over the text.

use ledgerly_gateway_core::{InferenceResponse, OperationKind, ResponseSource};

/// Confidence assigned to every fallback response. Low enough that
/// downstream consumers can reliably surface a "reduced accuracy"
/// notice.
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

/// Spending categories the rule-based parser can recognize without the
/// model. Keyword tables, first match wins.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("groceries", &["grocery", "groceries", "supermarket", "market"]),
    ("dining", &["coffee", "cafe", "restaurant", "lunch", "dinner", "pizza", "takeout"]),
    ("transport", &["uber", "lyft", "taxi", "bus", "train", "fuel", "gas", "parking"]),
    ("housing", &["rent", "mortgage", "landlord"]),
    ("utilities", &["electric", "electricity", "water", "internet", "phone", "utility"]),
    ("subscriptions", &["netflix", "spotify", "subscription", "membership"]),
    ("income", &["salary", "paycheck", "payout", "refund", "deposit"]),
];

/// Produces deterministic degraded responses.
///
/// Pure and stateless: the same (kind, payload) pair always yields the
/// same response, which keeps the gateway facade's total contract
/// trivially testable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResponder;

impl FallbackResponder {
    /// Creates a new responder.
    pub fn new() -> Self {
        Self
    }

    /// Builds a degraded response of the same shape the backend would
    /// have returned for this operation.
    pub fn respond(&self, kind: OperationKind, payload: &str) -> InferenceResponse {
        let content = match kind {
            OperationKind::Health => {
                "assistant backend unreachable; gateway is serving degraded responses".to_string()
            }
            OperationKind::Parse => parse_transaction(payload),
            OperationKind::Chat => chat_reply(payload),
            OperationKind::Analyze => analyze_summary(payload),
        };
        InferenceResponse {
            kind,
            content,
            confidence: FALLBACK_CONFIDENCE,
            source: ResponseSource::Fallback,
        }
    }
}

/// Extracts amount, merchant, and category from free-form transaction
/// text using token heuristics.
fn parse_transaction(payload: &str) -> String {
    let amount = extract_amount(payload);
    let merchant = extract_merchant(payload);
    let category = categorize(payload);

    let mut parts = Vec::new();
    match amount {
        Some(amount) => parts.push(format!("amount={amount:.2}")),
        None => parts.push("amount=unknown".to_string()),
    }
    parts.push(format!("merchant={}", merchant.unwrap_or("unknown".to_string())));
    parts.push(format!("category={category}"));
    parts.join("; ")
}

fn chat_reply(payload: &str) -> String {
    let lower = payload.to_lowercase();
    if lower.contains("budget") {
        "The assistant is temporarily unavailable. Your budgets are still tracked; check the \
         budgets screen for current limits and usage."
            .to_string()
    } else if lower.contains("goal") || lower.contains("save") || lower.contains("saving") {
        "The assistant is temporarily unavailable. Your savings goals are unaffected; recent \
         progress is visible on the goals screen."
            .to_string()
    } else {
        "The assistant is temporarily unavailable. Your transactions, budgets, and goals are \
         still accessible, and full answers will return once the backend recovers."
            .to_string()
    }
}

fn analyze_summary(payload: &str) -> String {
    let mut mentioned: Vec<&str> = Vec::new();
    let lower = payload.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            mentioned.push(category);
        }
    }
    if mentioned.is_empty() {
        "Detailed analysis is unavailable right now. Review the reports screen for your \
         latest spending breakdown."
            .to_string()
    } else {
        format!(
            "Detailed analysis is unavailable right now. Categories mentioned in your request: \
             {}. The reports screen has your latest per-category totals.",
            mentioned.join(", ")
        )
    }
}

/// First token that parses as a positive amount, after stripping
/// currency symbols and thousands separators.
fn extract_amount(payload: &str) -> Option<f64> {
    payload
        .split_whitespace()
        .filter_map(|token| {
            let cleaned: String = token
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()
        })
        .find(|amount| *amount > 0.0)
}

/// Merchant guess: the capitalized run following "at"/"from", if any.
fn extract_merchant(payload: &str) -> Option<String> {
    let tokens: Vec<&str> = payload.split_whitespace().collect();
    for (i, token) in tokens.iter().enumerate() {
        let lower = token.to_lowercase();
        if (lower == "at" || lower == "from") && i + 1 < tokens.len() {
            let name: Vec<&str> = tokens[i + 1..]
                .iter()
                .take_while(|t| t.chars().next().is_some_and(|c| c.is_uppercase()))
                .copied()
                .collect();
            if !name.is_empty() {
                return Some(name.join(" ").trim_end_matches(['.', ',', '!']).to_string());
            }
        }
    }
    None
}

fn categorize(payload: &str) -> &'static str {
    let lower = payload.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return category;
        }
    }
    "uncategorized"
}
