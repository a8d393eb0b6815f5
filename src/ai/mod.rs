mod repo_types;
mod services;

pub use repo_types::{
    AiResponse, MealSuggestion, PlannedDay, PlannedMeal, ResponseKind, Substitution, VoiceIntent,
    VoiceItem, WeeklyPlan,
};
pub use services::{
    decode, extract_json, interpret_transcript, substitutions_or_empty, suggest_meals,
    suggestions_or_empty, voice_intent_or_chat, LanguageModel,
};
