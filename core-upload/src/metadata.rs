//! Editable product metadata attached to each pending item.

use bridge_traits::time::{Clock, SystemClock};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Product category. Serialized as its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Electronics,
    Clothing,
    #[serde(rename = "Home & Garden")]
    HomeAndGarden,
    Sports,
    Books,
    Toys,
    #[serde(rename = "Food & Beverage")]
    FoodAndBeverage,
    Beauty,
    Other,
}

impl Category {
    /// Every category in presentation order.
    pub const ALL: [Category; 9] = [
        Category::Electronics,
        Category::Clothing,
        Category::HomeAndGarden,
        Category::Sports,
        Category::Books,
        Category::Toys,
        Category::FoodAndBeverage,
        Category::Beauty,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Clothing => "Clothing",
            Category::HomeAndGarden => "Home & Garden",
            Category::Sports => "Sports",
            Category::Books => "Books",
            Category::Toys => "Toys",
            Category::FoodAndBeverage => "Food & Beverage",
            Category::Beauty => "Beauty",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Metadata sent alongside one file in a bulk upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMetadata {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: Category,
    pub sku: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<u32>,
}

impl ProductMetadata {
    /// Defaults for a freshly selected file.
    pub fn for_file(file_name: &str, sku: String) -> Self {
        Self {
            name: strip_extension(file_name).to_string(),
            description: String::new(),
            price: Decimal::ZERO,
            category: Category::default(),
            sku,
            brand: None,
            weight: None,
            stock_quantity: Some(0),
        }
    }

    /// Replace the single field named by `update`.
    pub fn apply(&mut self, update: MetadataUpdate) {
        match update {
            MetadataUpdate::Name(v) => self.name = v,
            MetadataUpdate::Description(v) => self.description = v,
            MetadataUpdate::Price(v) => self.price = v,
            MetadataUpdate::Category(v) => self.category = v,
            MetadataUpdate::Sku(v) => self.sku = v,
            MetadataUpdate::Brand(v) => self.brand = v,
            MetadataUpdate::Weight(v) => self.weight = v,
            MetadataUpdate::StockQuantity(v) => self.stock_quantity = v,
        }
    }

    /// Local checks run before a batch is sent. Empty when valid.
    pub fn validate(&self) -> Vec<MetadataViolation> {
        let mut violations = Vec::new();

        if self.name.trim().is_empty() {
            violations.push(MetadataViolation::new("name", "Product name is required"));
        }
        if self.price.is_sign_negative() {
            violations.push(MetadataViolation::new("price", "Price must not be negative"));
        }
        if self.sku.trim().is_empty() {
            violations.push(MetadataViolation::new("sku", "SKU is required"));
        }
        if self.weight.is_some_and(|w| w.is_sign_negative()) {
            violations.push(MetadataViolation::new("weight", "Weight must not be negative"));
        }

        violations
    }
}

/// One field-level edit. Each variant carries that field's own type.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataUpdate {
    Name(String),
    Description(String),
    Price(Decimal),
    Category(Category),
    Sku(String),
    Brand(Option<String>),
    Weight(Option<Decimal>),
    StockQuantity(Option<u32>),
}

impl MetadataUpdate {
    /// Wire name of the field this update targets.
    pub fn field(&self) -> &'static str {
        match self {
            MetadataUpdate::Name(_) => "name",
            MetadataUpdate::Description(_) => "description",
            MetadataUpdate::Price(_) => "price",
            MetadataUpdate::Category(_) => "category",
            MetadataUpdate::Sku(_) => "sku",
            MetadataUpdate::Brand(_) => "brand",
            MetadataUpdate::Weight(_) => "weight",
            MetadataUpdate::StockQuantity(_) => "stockQuantity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataViolation {
    pub field: &'static str,
    pub message: String,
}

impl MetadataViolation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// `shoe.final.png` -> `shoe.final`; names without an extension are kept.
pub fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(dot) if dot + 1 < file_name.len() && !file_name[dot + 1..].contains('/') => {
            &file_name[..dot]
        }
        _ => file_name,
    }
}

const SKU_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SKU_SUFFIX_LEN: usize = 9;

/// Generates `SKU-<unix millis>-<9 base36 chars>` identifiers.
#[derive(Clone)]
pub struct SkuGenerator {
    clock: Arc<dyn Clock>,
}

impl Default for SkuGenerator {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl SkuGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn generate(&self) -> String {
        let millis = self.clock.unix_timestamp_millis();
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SKU_SUFFIX_LEN)
            .map(|_| SKU_ALPHABET[rng.gen_range(0..SKU_ALPHABET.len())] as char)
            .collect();
        format!("SKU-{}-{}", millis, suffix)
    }

    /// `count` pairwise-distinct SKUs.
    pub fn generate_distinct(&self, count: usize) -> Vec<String> {
        let mut seen = HashSet::with_capacity(count);
        let mut skus = Vec::with_capacity(count);
        while skus.len() < count {
            let sku = self.generate();
            if seen.insert(sku.clone()) {
                skus.push(sku);
            }
        }
        skus
    }
}
