use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::repo_types::{
    AiResponse, MealSuggestion, ResponseKind, Substitution, VoiceIntent, WeeklyPlan,
};
use crate::classify::expiry;
use crate::error::{AppError, Result};
use crate::pantry::Ingredient;

/// Text-completion collaborator. Prompt construction beyond the payload shape is its concern.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, kind: ResponseKind, prompt: &str) -> anyhow::Result<String>;
}

/// The JSON inside a completion: a fenced block if there is one, else the span from the
/// first opening bracket to the last matching closing bracket.
pub fn extract_json(text: &str) -> Option<&str> {
    let body = match text.find("```") {
        Some(start) => {
            let after = &text[start + 3..];
            // Skip a language tag such as `json`.
            let after = after.find('\n').map_or(after, |nl| &after[nl + 1..]);
            after.find("```").map_or(after, |end| &after[..end])
        }
        None => text,
    };
    let open = body.find(['{', '['])?;
    let closer = if body[open..].starts_with('{') { '}' } else { ']' };
    let close = body.rfind(closer)?;
    (close > open).then(|| body[open..=close].trim())
}

fn malformed(kind: ResponseKind, detail: impl std::fmt::Display) -> AppError {
    AppError::UpstreamMalformed(format!("{:?} response: {}", kind, detail))
}

/// Accepts a bare array or an object wrapping the array under one of `keys`.
fn list_payload<T: DeserializeOwned>(
    kind: ResponseKind,
    value: Value,
    keys: &[&str],
) -> Result<Vec<T>> {
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => keys
            .iter()
            .find_map(|k| map.remove(*k))
            .ok_or_else(|| malformed(kind, format!("expected one of {:?}", keys)))?,
        other => return Err(malformed(kind, format!("unexpected {}", other))),
    };
    serde_json::from_value(list).map_err(|e| malformed(kind, e))
}

pub fn decode(kind: ResponseKind, text: &str) -> Result<AiResponse> {
    let json = extract_json(text).ok_or_else(|| malformed(kind, "no JSON found"))?;
    let value: Value = serde_json::from_str(json).map_err(|e| malformed(kind, e))?;
    let response = match kind {
        ResponseKind::Suggestions => {
            let keys = ["suggestions", "meals", "recipes"];
            let list: Vec<MealSuggestion> = list_payload(kind, value, &keys)?;
            if list.iter().any(|s| s.title.trim().is_empty()) {
                return Err(malformed(kind, "suggestion without a title"));
            }
            AiResponse::SuggestionList(list)
        }
        ResponseKind::Substitutions => {
            let keys = ["substitutions", "substitutes"];
            let list: Vec<Substitution> = list_payload(kind, value, &keys)?;
            if list.iter().any(|s| s.substitute.trim().is_empty()) {
                return Err(malformed(kind, "empty substitute"));
            }
            AiResponse::SubstitutionList(list)
        }
        ResponseKind::WeeklyPlan => {
            let plan: WeeklyPlan = serde_json::from_value(value).map_err(|e| malformed(kind, e))?;
            AiResponse::WeeklyPlan(plan)
        }
        ResponseKind::VoiceIntent => {
            let intent: VoiceIntent =
                serde_json::from_value(value).map_err(|e| malformed(kind, e))?;
            AiResponse::VoiceIntent(intent)
        }
    };
    Ok(response)
}

pub fn suggestions_or_empty(text: &str) -> Vec<MealSuggestion> {
    match decode(ResponseKind::Suggestions, text) {
        Ok(AiResponse::SuggestionList(list)) => list,
        Ok(_) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "discarding meal suggestions");
            Vec::new()
        }
    }
}

pub fn substitutions_or_empty(text: &str) -> Vec<Substitution> {
    match decode(ResponseKind::Substitutions, text) {
        Ok(AiResponse::SubstitutionList(list)) => list,
        Ok(_) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "discarding substitutions");
            Vec::new()
        }
    }
}

/// Unusable intents degrade to a chat turn carrying the original transcript.
pub fn voice_intent_or_chat(text: &str, transcript: &str) -> VoiceIntent {
    match decode(ResponseKind::VoiceIntent, text) {
        Ok(AiResponse::VoiceIntent(intent)) => intent,
        other => {
            if let Err(e) = other {
                debug!(error = %e, "voice intent unreadable; treating as chat");
            }
            VoiceIntent::Chat {
                message: transcript.to_string(),
            }
        }
    }
}

pub async fn interpret_transcript(model: &dyn LanguageModel, transcript: &str) -> VoiceIntent {
    let transcript = transcript.trim();
    match model.complete(ResponseKind::VoiceIntent, transcript).await {
        Ok(text) => voice_intent_or_chat(&text, transcript),
        Err(e) => {
            let err = AppError::remote(e);
            warn!(error = %err, "voice intent request failed");
            VoiceIntent::Chat {
                message: transcript.to_string(),
            }
        }
    }
}

/// Asks for meals built from what is on hand, naming what expires within `horizon_days`.
pub async fn suggest_meals(
    model: &dyn LanguageModel,
    pantry: &[Ingredient],
    horizon_days: i64,
) -> Vec<MealSuggestion> {
    let on_hand: Vec<&str> = pantry.iter().map(|i| i.name.as_str()).collect();
    let now = time::OffsetDateTime::now_utc();
    let expiring: Vec<&str> = expiry::expiring_within(pantry, horizon_days, now)
        .into_iter()
        .map(|(i, _)| i.name.as_str())
        .collect();
    let prompt = format!(
        "On hand: {}\nUse soon: {}",
        on_hand.join(", "),
        expiring.join(", ")
    );
    match model.complete(ResponseKind::Suggestions, &prompt).await {
        Ok(text) => suggestions_or_empty(&text),
        Err(e) => {
            let err = AppError::remote(e);
            warn!(error = %err, "meal suggestion request failed");
            Vec::new()
        }
    }
}
