use crate::order::error::FieldErrors;
use crate::order::pricing::{format_amount, total_price, PriceTable};
use crate::order::schema::{self, Field};
use crate::order::values::{Delivery, DeliveryTime, OrderFormValues, Restriction};
use serde::Serialize;

/// What a sink receives for an accepted order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub username: String,
    pub tel: String,
    pub email: String,
    pub delivery: Delivery,
    pub restrictions: Vec<Restriction>,
    pub delivery_time: DeliveryTime,
    pub message: String,
    pub weight: f64,
    pub price_per_kg: f64,
    pub category: String,
    /// `weight × pricePerKg`, two decimals.
    pub total_price: String,
}

impl OrderPayload {
    /// Validates the full value set and, when every field passes, builds the
    /// typed payload with its computed total.
    pub fn build(values: &OrderFormValues, prices: &PriceTable) -> Result<Self, FieldErrors> {
        schema::validate(values, prices)?;
        let delivery = values
            .delivery
            .parse::<Delivery>()
            .map_err(|e| FieldErrors::single(Field::Delivery, e))?;
        let delivery_time = values
            .delivery_time
            .parse::<DeliveryTime>()
            .map_err(|e| FieldErrors::single(Field::DeliveryTime, e))?;
        let restrictions = values
            .restrictions
            .iter()
            .map(|r| r.parse::<Restriction>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FieldErrors::single(Field::Restrictions, e))?;
        Ok(Self {
            username: values.username.clone(),
            tel: values.tel.clone(),
            email: values.email.clone(),
            delivery,
            restrictions,
            delivery_time,
            message: values.message.clone(),
            weight: values.weight,
            price_per_kg: values.price_per_kg,
            category: values.category.clone(),
            total_price: format_amount(total_price(values.weight, values.price_per_kg)),
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
