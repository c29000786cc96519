//! Order domain: the form's values, the category price table, the declarative
//! validation schema and the payload handed to a sink after a valid submit.

pub mod error;
pub mod payload;
pub mod pricing;
pub mod schema;
pub mod values;

pub use error::{FieldErrors, ValidationError};
pub use payload::OrderPayload;
pub use pricing::{format_amount, total_price, CategoryPrice, PriceTable};
pub use schema::Field;
pub use values::{Delivery, DeliveryTime, OrderFormValues, Restriction};
