use crate::order::ValidationError;
use crate::order::pricing::PriceTable;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Delivery {
    Pickup,
    Courier,
    Drone,
}

impl Delivery {
    pub const ALL: [Delivery; 3] = [Delivery::Pickup, Delivery::Courier, Delivery::Drone];
    pub const KEYS: &'static [&'static str] = &["pickup", "courier", "drone"];

    pub fn as_str(self) -> &'static str {
        match self {
            Delivery::Pickup => "pickup",
            Delivery::Courier => "courier",
            Delivery::Drone => "drone",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Delivery::Pickup => "Pickup",
            Delivery::Courier => "Courier",
            Delivery::Drone => "Drone",
        }
    }
}

impl FromStr for Delivery {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Delivery::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Restriction {
    Vegan,
    GlutenFree,
    NutFree,
}

impl Restriction {
    pub const ALL: [Restriction; 3] = [
        Restriction::Vegan,
        Restriction::GlutenFree,
        Restriction::NutFree,
    ];
    pub const KEYS: &'static [&'static str] = &["vegan", "gluten-free", "nut-free"];

    pub fn as_str(self) -> &'static str {
        match self {
            Restriction::Vegan => "vegan",
            Restriction::GlutenFree => "gluten-free",
            Restriction::NutFree => "nut-free",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Restriction::Vegan => "Vegan",
            Restriction::GlutenFree => "Gluten-free",
            Restriction::NutFree => "Nut-free",
        }
    }
}

impl FromStr for Restriction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Restriction::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryTime {
    Morning,
    Afternoon,
    Evening,
}

impl DeliveryTime {
    pub const ALL: [DeliveryTime; 3] = [
        DeliveryTime::Morning,
        DeliveryTime::Afternoon,
        DeliveryTime::Evening,
    ];
    pub const KEYS: &'static [&'static str] = &["morning", "afternoon", "evening"];

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryTime::Morning => "morning",
            DeliveryTime::Afternoon => "afternoon",
            DeliveryTime::Evening => "evening",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeliveryTime::Morning => "Morning",
            DeliveryTime::Afternoon => "Afternoon",
            DeliveryTime::Evening => "Evening",
        }
    }
}

impl FromStr for DeliveryTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ValidationError::Required);
        }
        DeliveryTime::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed(s.to_string()))
    }
}

/// Current contents of the order form.
///
/// Choice fields keep their raw keys so values that did not come from the
/// selectors (for example a replayed payload) can still be validated and
/// rejected field by field. Numbers that failed to parse are held as NaN.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFormValues {
    pub username: String,
    pub tel: String,
    pub email: String,
    pub delivery: String,
    pub restrictions: Vec<String>,
    pub delivery_time: String,
    pub message: String,
    pub weight: f64,
    pub price_per_kg: f64,
    pub category: String,
}

impl OrderFormValues {
    /// Seed defaults the form mounts with and resets to after a submit.
    pub fn seed() -> Self {
        Self {
            username: String::new(),
            tel: String::new(),
            email: String::new(),
            delivery: Delivery::Pickup.as_str().to_string(),
            restrictions: Vec::new(),
            delivery_time: String::new(),
            message: String::new(),
            weight: 1.0,
            price_per_kg: 0.0,
            category: String::new(),
        }
    }

    /// Category change event: stores the category and re-derives `price_per_kg`.
    pub fn set_category(&mut self, category: impl Into<String>, prices: &PriceTable) {
        self.category = category.into();
        self.price_per_kg = prices.price_for_category(&self.category);
    }
}

impl Default for OrderFormValues {
    fn default() -> Self {
        Self::seed()
    }
}
