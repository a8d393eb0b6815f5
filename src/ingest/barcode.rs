use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::{classify, suggest_unit};
use crate::error::{AppError, Result};
use crate::pantry::NewIngredient;

const BARE_UNIT: &str = "unit";

/// Product as returned by a barcode lookup service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    /// Free text such as "500 g" or "2 L".
    #[serde(default)]
    pub quantity_text: Option<String>,
}

#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn lookup(&self, barcode: &str) -> anyhow::Result<Option<ProductRecord>>;
}

/// Leading `number + unit letters`, else one bare unit.
pub fn parse_product_quantity(text: &str) -> (f64, String) {
    lazy_static! {
        static ref QUANTITY_RE: Regex = Regex::new(r"(\d+(?:[.,]\d+)?)\s*([A-Za-z]+)").unwrap();
    }
    QUANTITY_RE
        .captures(text)
        .and_then(|caps| {
            let amount = caps[1].replace(',', ".").parse::<f64>().ok()?;
            Some((amount, caps[2].to_lowercase()))
        })
        .unwrap_or_else(|| (1.0, BARE_UNIT.to_string()))
}

/// Pantry draft for a scanned product. The scanned unit beats the classifier's
/// suggestion unless the scan only yielded the bare default.
pub fn normalize_product(record: &ProductRecord) -> Result<NewIngredient> {
    let name = record.name.trim();
    if name.is_empty() {
        return Err(AppError::UpstreamMalformed("product record has no name".into()));
    }
    let category = classify(name);
    let (quantity, unit) = record
        .quantity_text
        .as_deref()
        .map(parse_product_quantity)
        .unwrap_or_else(|| (1.0, BARE_UNIT.to_string()));
    let unit = if unit == BARE_UNIT {
        suggest_unit(name, category)
    } else {
        unit
    };
    debug!(name, ?category, quantity, %unit, "normalized scanned product");
    Ok(NewIngredient::new(name, category, quantity, unit))
}

/// Looks up and normalizes a barcode. `Ok(None)` when the product is unknown.
pub async fn lookup_product(
    lookup: &dyn ProductLookup,
    barcode: &str,
) -> Result<Option<NewIngredient>> {
    let record = lookup.lookup(barcode.trim()).await.map_err(|e| {
        warn!(barcode, error = %e, "product lookup failed");
        AppError::remote(e)
    })?;
    record.as_ref().map(normalize_product).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Category;

    #[test]
    fn quantity_text_parses_number_and_unit() {
        assert_eq!(parse_product_quantity("500 g"), (500.0, "g".to_string()));
        assert_eq!(parse_product_quantity("1,5L"), (1.5, "l".to_string()));
        assert_eq!(parse_product_quantity("family size"), (1.0, "unit".to_string()));
        assert_eq!(parse_product_quantity(""), (1.0, "unit".to_string()));
    }

    #[test]
    fn scanned_unit_wins_over_suggestion() {
        let record = ProductRecord {
            name: "Whole Milk".into(),
            brand: Some("Local Farm".into()),
            quantity_text: Some("2 L".into()),
        };
        let draft = normalize_product(&record).unwrap();
        assert_eq!(draft.category, Category::Dairy);
        assert_eq!(draft.quantity, 2.0);
        assert_eq!(draft.unit, "l");
    }

    #[test]
    fn bare_default_falls_back_to_suggestion() {
        let record = ProductRecord {
            name: "Whole Milk".into(),
            brand: None,
            quantity_text: None,
        };
        let draft = normalize_product(&record).unwrap();
        assert_eq!(draft.quantity, 1.0);
        assert_eq!(draft.unit, "gal");
    }

    #[test]
    fn nameless_record_is_malformed() {
        let record = ProductRecord {
            name: "  ".into(),
            brand: None,
            quantity_text: None,
        };
        assert!(matches!(normalize_product(&record), Err(AppError::UpstreamMalformed(_))));
    }

    struct Catalog;

    #[async_trait]
    impl ProductLookup for Catalog {
        async fn lookup(&self, barcode: &str) -> anyhow::Result<Option<ProductRecord>> {
            match barcode {
                "0001" => Ok(Some(ProductRecord {
                    name: "Basmati Rice".into(),
                    brand: None,
                    quantity_text: Some("1 kg".into()),
                })),
                "0000" => anyhow::bail!("lookup service down"),
                _ => Ok(None),
            }
        }
    }

    #[tokio::test]
    async fn lookup_maps_outcomes() {
        let found = lookup_product(&Catalog, " 0001 ").await.unwrap().unwrap();
        assert_eq!(found.name, "Basmati Rice");
        assert_eq!(found.unit, "kg");
        assert!(lookup_product(&Catalog, "9999").await.unwrap().is_none());
        assert!(matches!(
            lookup_product(&Catalog, "0000").await,
            Err(AppError::RemoteUnavailable(_))
        ));
    }
}
