use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lowest price a category may carry; `pricePerKg` below this never validates.
pub const MIN_PRICE_PER_KG: f64 = 0.1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryPrice {
    pub name: String,
    pub price_per_kg: f64,
}

impl CategoryPrice {
    pub fn new(name: impl Into<String>, price_per_kg: f64) -> Self {
        Self {
            name: name.into(),
            price_per_kg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PriceTableError {
    #[error("price table must list at least one category")]
    Empty,
    #[error("category name at index {0} is empty")]
    EmptyName(usize),
    #[error("duplicate category: '{0}'")]
    Duplicate(String),
    #[error("category '{name}' has invalid price {price} (must be at least 0.1)")]
    InvalidPrice { name: String, price: f64 },
}

/// Category name -> price per kilogram, in selector order. Read-only once built.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceTable {
    entries: Vec<CategoryPrice>,
}

impl PriceTable {
    pub fn new(entries: Vec<CategoryPrice>) -> Result<Self, PriceTableError> {
        if entries.is_empty() {
            return Err(PriceTableError::Empty);
        }
        let mut seen = HashSet::new();
        for (i, e) in entries.iter().enumerate() {
            if e.name.trim().is_empty() {
                return Err(PriceTableError::EmptyName(i));
            }
            if !seen.insert(e.name.as_str()) {
                return Err(PriceTableError::Duplicate(e.name.clone()));
            }
            if !e.price_per_kg.is_finite() || e.price_per_kg < MIN_PRICE_PER_KG {
                return Err(PriceTableError::InvalidPrice {
                    name: e.name.clone(),
                    price: e.price_per_kg,
                });
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CategoryPrice] {
        &self.entries
    }

    pub fn price_of(&self, category: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.name == category)
            .map(|e| e.price_per_kg)
    }

    /// Derives `pricePerKg` for a category. Empty and unknown categories both
    /// derive 0; the schema rejects unknown ones separately.
    pub fn price_for_category(&self, category: &str) -> f64 {
        if category.is_empty() {
            return 0.0;
        }
        self.price_of(category).unwrap_or(0.0)
    }
}

pub fn default_categories() -> Vec<CategoryPrice> {
    vec![
        CategoryPrice::new("Amazon cat A", 20.0),
        CategoryPrice::new("Amazon cat B", 30.0),
        CategoryPrice::new("Aliexpress", 35.0),
        CategoryPrice::new("Temu", 50.0),
    ]
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            entries: default_categories(),
        }
    }
}

/// `weight × price_per_kg` rounded to cents.
pub fn total_price(weight: f64, price_per_kg: f64) -> f64 {
    (weight * price_per_kg * 100.0).round() / 100.0
}

pub fn format_amount(v: f64) -> String {
    format!("{v:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_prices() {
        let t = PriceTable::default();
        assert_eq!(t.price_for_category("Amazon cat A"), 20.0);
        assert_eq!(t.price_for_category("Aliexpress"), 35.0);
        assert_eq!(t.price_for_category("Temu"), 50.0);
        assert_eq!(t.price_for_category(""), 0.0);
        assert_eq!(t.entries().len(), 4);
    }

    #[test]
    fn unknown_category_derives_zero() {
        let t = PriceTable::default();
        assert_eq!(t.price_of("eBay"), None);
        assert_eq!(t.price_for_category("eBay"), 0.0);
    }

    #[test]
    fn total_rounds_to_cents() {
        assert_eq!(total_price(2.0, 50.0), 100.0);
        assert_eq!(format_amount(total_price(2.0, 50.0)), "100.00");
        assert_eq!(format_amount(total_price(0.1, 35.0)), "3.50");
        assert_eq!(format_amount(total_price(1.333, 20.0)), "26.66");
    }

    #[test]
    fn total_stays_within_half_a_cent_of_the_product() {
        for wi in 1..=40 {
            for pi in [1, 7, 200, 350, 500] {
                let w = wi as f64 * 0.1;
                let p = pi as f64 * 0.1;
                let t = total_price(w, p);
                assert!((t - w * p).abs() <= 0.005 + 1e-9, "{w} x {p} -> {t}");
                let cents = t * 100.0;
                assert!((cents - cents.round()).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn table_rejects_bad_entries() {
        assert_eq!(PriceTable::new(vec![]), Err(PriceTableError::Empty));
        let dup = PriceTable::new(vec![
            CategoryPrice::new("Temu", 50.0),
            CategoryPrice::new("Temu", 40.0),
        ]);
        assert_eq!(dup, Err(PriceTableError::Duplicate("Temu".into())));
        let cheap = PriceTable::new(vec![CategoryPrice::new("Free", 0.0)]);
        assert!(matches!(cheap, Err(PriceTableError::InvalidPrice { .. })));
        let blank = PriceTable::new(vec![CategoryPrice::new("  ", 5.0)]);
        assert_eq!(blank, Err(PriceTableError::EmptyName(0)));
    }
}
