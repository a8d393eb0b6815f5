use std::collections::HashSet;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::{classify, suggest_unit};
use crate::error::{AppError, Result};
use crate::pantry::NewIngredient;

pub const DEFAULT_MAX_ITEMS: usize = 20;

/// Lines containing any of these words are receipt furniture, not groceries.
const STOPWORDS: &[&str] = &[
    "total", "subtotal", "sub", "tax", "vat", "change", "cash", "card", "credit", "debit",
    "visa", "mastercard", "amex", "discover", "balance", "due", "tender", "tendered",
    "payment", "paid", "receipt", "thank", "thanks", "you", "cashier", "register", "store",
    "date", "time", "am", "pm", "savings", "saved", "discount", "coupon", "member",
    "rewards", "points", "approved", "auth", "ref", "transaction", "trans", "tel", "phone",
    "www", "com", "items", "qty", "price", "refund", "return", "welcome", "jan", "feb",
    "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

lazy_static! {
    static ref TRAILING_PRICE_RE: Regex =
        Regex::new(r"\s*[$€£]?\s*-?\d+[.,]\d{2}\s*[A-Za-z*]{0,2}\s*$").unwrap();
    static ref LEADING_CODE_RE: Regex = Regex::new(r"^\s*\d{3,}\s+").unwrap();
    static ref TRAILING_CODE_RE: Regex = Regex::new(r"\s+\d{3,}\s*$").unwrap();
    static ref PUNCTUATION_RE: Regex = Regex::new(r"[^\w\s'-]").unwrap();
}

/// Structured line from a receipt-parsing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    #[serde(default)]
    pub qty: Option<f64>,
    #[serde(default)]
    pub line_total: Option<f64>,
}

/// Receipt line the user still has to confirm before it reaches the pantry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptCandidate {
    pub name: String,
    pub quantity: f64,
}

impl ReceiptCandidate {
    pub fn to_new_ingredient(&self) -> NewIngredient {
        let category = classify(&self.name);
        NewIngredient::new(
            self.name.clone(),
            category,
            self.quantity,
            suggest_unit(&self.name, category),
        )
    }
}

/// OCR or receipt-parsing collaborator: image in, text or line items out.
#[async_trait]
pub trait ReceiptScanner: Send + Sync {
    async fn recognize_text(&self, image: &[u8]) -> anyhow::Result<String>;
    async fn parse_line_items(&self, image: &[u8]) -> anyhow::Result<Vec<LineItem>>;
}

fn clean_line(line: &str) -> Option<String> {
    let line = TRAILING_PRICE_RE.replace(line, "");
    let line = LEADING_CODE_RE.replace(&line, "");
    let line = TRAILING_CODE_RE.replace(&line, "");
    let line = PUNCTUATION_RE.replace_all(&line, " ");
    let cleaned = line
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| c == '-' || c == '\''))
        .filter(|token| !is_noise_token(token))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if cleaned.chars().count() < 3 {
        return None;
    }
    if !cleaned.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    if cleaned
        .split(|c: char| c.is_whitespace() || c == '-' || c == '\'')
        .any(|word| STOPWORDS.contains(&word))
    {
        return None;
    }
    Some(title_case(&cleaned))
}

/// Isolated numbers and single letters (tax flags, department codes).
fn is_noise_token(token: &str) -> bool {
    token.chars().count() <= 1 || token.chars().all(|c| c.is_ascii_digit() || c == '_')
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Likely item names from raw OCR text, in receipt order, deduplicated.
pub fn extract_items(raw_text: &str, max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let items: Vec<String> = raw_text
        .lines()
        .filter_map(clean_line)
        .filter(|name| seen.insert(name.clone()))
        .take(max)
        .collect();
    debug!(lines = raw_text.lines().count(), kept = items.len(), "receipt text filtered");
    items
}

pub fn extract_candidates(raw_text: &str, max: usize) -> Vec<ReceiptCandidate> {
    extract_items(raw_text, max)
        .into_iter()
        .map(|name| ReceiptCandidate { name, quantity: 1.0 })
        .collect()
}

/// Structured path: descriptions go through the same filter, quantities default to one.
pub fn normalize_line_items(items: &[LineItem], max: usize) -> Vec<ReceiptCandidate> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| {
            let name = clean_line(&item.description)?;
            let quantity = item
                .qty
                .filter(|q| q.is_finite() && *q > 0.0)
                .unwrap_or(1.0);
            Some(ReceiptCandidate { name, quantity })
        })
        .filter(|c| seen.insert(c.name.clone()))
        .take(max)
        .collect()
}

/// Candidates from a captured receipt image. Structured line items are preferred;
/// when the parsing service fails or finds nothing the raw OCR text is filtered instead.
pub async fn scan_receipt(
    scanner: &dyn ReceiptScanner,
    image: &[u8],
    max: usize,
) -> Result<Vec<ReceiptCandidate>> {
    if image.is_empty() {
        return Err(AppError::DeviceUnavailable("no receipt image captured".into()));
    }
    match scanner.parse_line_items(image).await {
        Ok(items) if !items.is_empty() => return Ok(normalize_line_items(&items, max)),
        Ok(_) => debug!("no structured line items; using raw text"),
        Err(e) => warn!(error = %e, "receipt parsing failed; using raw text"),
    }
    let text = scanner
        .recognize_text(image)
        .await
        .map_err(|e| AppError::DeviceUnavailable(format!("text recognition: {:#}", e)))?;
    Ok(extract_candidates(&text, max))
}
