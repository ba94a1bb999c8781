//! Server-confirmed product records.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// A product as stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub sku: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<u32>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub uploaded_by: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub uploaded_at: DateTime<Utc>,
}

/// Body of `GET /products`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductList {
    #[serde(default)]
    pub products: Vec<ProductRecord>,
    #[serde(default)]
    pub total_products: u64,
}

/// Accepts RFC 3339 as well as zone-less ISO timestamps, which are read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid timestamp '{}'", raw))
    })
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::str::FromStr;

    const RECORD: &str = r#"{
        "productId": "p-1",
        "name": "Desk Lamp",
        "description": "Warm light",
        "price": 24.99,
        "category": "Home & Garden",
        "sku": "SKU-1-abc",
        "brand": "Lumo",
        "stockQuantity": 7,
        "imageUrl": "/products/p-1/image",
        "uploadedBy": "jane",
        "uploadedAt": "2024-03-01T10:15:30.123"
    }"#;

    #[test]
    fn test_deserialize_product_record() {
        let record: ProductRecord = serde_json::from_str(RECORD).unwrap();

        assert_eq!(record.product_id, "p-1");
        assert_eq!(record.price, Decimal::from_str("24.99").unwrap());
        assert_eq!(record.brand.as_deref(), Some("Lumo"));
        assert_eq!(record.weight, None);
        assert_eq!(record.stock_quantity, Some(7));
        assert_eq!(record.uploaded_at.year(), 2024);
        assert_eq!(record.uploaded_at.hour(), 10);
    }

    #[test]
    fn test_timestamp_formats() {
        let zoned = parse_timestamp("2024-03-01T10:15:30+02:00").unwrap();
        assert_eq!(zoned.hour(), 8);

        assert!(parse_timestamp("2024-03-01T10:15:30").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_product_list_defaults() {
        let list: ProductList = serde_json::from_str("{}").unwrap();
        assert!(list.products.is_empty());
        assert_eq!(list.total_products, 0);
    }
}
