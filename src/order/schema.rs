//! Declarative validation schema for the order form.
//!
//! Rules are plain data: each field lists the rules it must satisfy, in the
//! order they are checked. The first failing rule provides the field's error.
//! The same table drives inline feedback while editing and the full check on
//! submit.

use crate::order::error::{FieldErrors, ValidationError};
use crate::order::pricing::PriceTable;
use crate::order::values::{Delivery, DeliveryTime, OrderFormValues, Restriction};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Username,
    Tel,
    Email,
    Delivery,
    Restrictions,
    DeliveryTime,
    Message,
    Weight,
    PricePerKg,
    Category,
}

impl Field {
    /// Payload key of the field.
    pub fn key(self) -> &'static str {
        match self {
            Field::Username => "username",
            Field::Tel => "tel",
            Field::Email => "email",
            Field::Delivery => "delivery",
            Field::Restrictions => "restrictions",
            Field::DeliveryTime => "deliveryTime",
            Field::Message => "message",
            Field::Weight => "weight",
            Field::PricePerKg => "pricePerKg",
            Field::Category => "category",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Username => "Name",
            Field::Tel => "Phone",
            Field::Email => "Email",
            Field::Delivery => "Delivery",
            Field::Restrictions => "Restrictions",
            Field::DeliveryTime => "Delivery time",
            Field::Message => "Message",
            Field::Weight => "Weight (kg)",
            Field::PricePerKg => "Price per kg",
            Field::Category => "Category",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rule {
    /// Non-blank text, or a finite number.
    Required,
    MinLen(usize),
    MaxLen(usize),
    Email,
    Min(f64),
    OneOf(&'static [&'static str]),
    EachOneOf(&'static [&'static str]),
    /// Category must be a key of the configured price table.
    KnownCategory,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldRules {
    pub field: Field,
    pub rules: &'static [Rule],
}

/// Field order here is also the on-screen order.
pub const ORDER_SCHEMA: &[FieldRules] = &[
    FieldRules {
        field: Field::Username,
        rules: &[Rule::Required, Rule::MinLen(2)],
    },
    FieldRules {
        field: Field::Tel,
        rules: &[Rule::Required, Rule::MinLen(5)],
    },
    FieldRules {
        field: Field::Email,
        rules: &[Rule::Required, Rule::Email],
    },
    FieldRules {
        field: Field::Delivery,
        rules: &[Rule::Required, Rule::OneOf(Delivery::KEYS)],
    },
    FieldRules {
        field: Field::Restrictions,
        rules: &[Rule::EachOneOf(Restriction::KEYS)],
    },
    FieldRules {
        field: Field::DeliveryTime,
        rules: &[Rule::Required, Rule::OneOf(DeliveryTime::KEYS)],
    },
    FieldRules {
        field: Field::Message,
        rules: &[Rule::MaxLen(200)],
    },
    FieldRules {
        field: Field::Weight,
        rules: &[Rule::Required, Rule::Min(0.1)],
    },
    FieldRules {
        field: Field::PricePerKg,
        rules: &[Rule::Required, Rule::Min(0.1)],
    },
    FieldRules {
        field: Field::Category,
        rules: &[Rule::Required, Rule::KnownCategory],
    },
];

pub fn rules_for(field: Field) -> &'static [Rule] {
    ORDER_SCHEMA
        .iter()
        .find(|r| r.field == field)
        .map(|r| r.rules)
        .unwrap_or(&[])
}

pub fn is_required(field: Field) -> bool {
    rules_for(field).contains(&Rule::Required)
}

enum Value<'a> {
    Text(&'a str),
    Number(f64),
    List(&'a [String]),
}

fn value_of(values: &OrderFormValues, field: Field) -> Value<'_> {
    match field {
        Field::Username => Value::Text(&values.username),
        Field::Tel => Value::Text(&values.tel),
        Field::Email => Value::Text(&values.email),
        Field::Delivery => Value::Text(&values.delivery),
        Field::Restrictions => Value::List(&values.restrictions),
        Field::DeliveryTime => Value::Text(&values.delivery_time),
        Field::Message => Value::Text(&values.message),
        Field::Weight => Value::Number(values.weight),
        Field::PricePerKg => Value::Number(values.price_per_kg),
        Field::Category => Value::Text(&values.category),
    }
}

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

pub fn is_email(s: &str) -> bool {
    email_re().map(|re| re.is_match(s)).unwrap_or(false)
}

fn check(rule: Rule, value: &Value<'_>, prices: &PriceTable) -> Result<(), ValidationError> {
    match (rule, value) {
        (Rule::Required, Value::Text(s)) => {
            if s.trim().is_empty() {
                return Err(ValidationError::Required);
            }
        }
        (Rule::Required, Value::Number(n)) => {
            if !n.is_finite() {
                return Err(ValidationError::NotANumber);
            }
        }
        (Rule::MinLen(min), Value::Text(s)) => {
            if !s.is_empty() && s.chars().count() < min {
                return Err(ValidationError::TooShort(min));
            }
        }
        (Rule::MaxLen(max), Value::Text(s)) => {
            if s.chars().count() > max {
                return Err(ValidationError::TooLong(max));
            }
        }
        (Rule::Email, Value::Text(s)) => {
            if !s.is_empty() && !is_email(s) {
                return Err(ValidationError::InvalidEmail);
            }
        }
        (Rule::Min(min), Value::Number(n)) => {
            if !n.is_finite() {
                return Err(ValidationError::NotANumber);
            }
            if *n < min {
                return Err(ValidationError::BelowMinimum(min));
            }
        }
        (Rule::OneOf(allowed), Value::Text(s)) => {
            if !s.is_empty() && !allowed.contains(s) {
                return Err(ValidationError::NotAllowed(s.to_string()));
            }
        }
        (Rule::EachOneOf(allowed), Value::List(items)) => {
            if let Some(bad) = items.iter().find(|i| !allowed.contains(&i.as_str())) {
                return Err(ValidationError::NotAllowed(bad.clone()));
            }
            // a set: each token at most once
            let mut seen = HashSet::new();
            if let Some(dup) = items.iter().find(|i| !seen.insert(i.as_str())) {
                return Err(ValidationError::Duplicate(dup.clone()));
            }
        }
        (Rule::KnownCategory, Value::Text(s)) => {
            if !s.is_empty() && prices.price_of(s).is_none() {
                return Err(ValidationError::UnknownCategory(s.to_string()));
            }
        }
        // A rule that does not apply to the value's shape never fails.
        _ => {}
    }
    Ok(())
}

/// Runs one field's rules and returns the first failure.
pub fn validate_field(
    field: Field,
    values: &OrderFormValues,
    prices: &PriceTable,
) -> Result<(), ValidationError> {
    let value = value_of(values, field);
    for rule in rules_for(field) {
        check(*rule, &value, prices)?;
    }
    Ok(())
}

/// Runs every field's rules.
pub fn validate(values: &OrderFormValues, prices: &PriceTable) -> Result<(), FieldErrors> {
    let mut errs = FieldErrors::default();
    for entry in ORDER_SCHEMA {
        if let Err(e) = validate_field(entry.field, values, prices) {
            errs.insert(entry.field, e);
        }
    }
    if errs.is_empty() {
        Ok(())
    } else {
        Err(errs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> OrderFormValues {
        let prices = PriceTable::default();
        let mut v = OrderFormValues::seed();
        v.username = "Ann".into();
        v.tel = "12345".into();
        v.email = "a@b.com".into();
        v.delivery = "pickup".into();
        v.delivery_time = "morning".into();
        v.weight = 2.0;
        v.set_category("Temu", &prices);
        v
    }

    fn error_for(v: &OrderFormValues, field: Field) -> Option<ValidationError> {
        validate(v, &PriceTable::default())
            .err()
            .and_then(|e| e.get(field).cloned())
    }

    #[test]
    fn valid_values_pass() {
        assert_eq!(validate(&valid(), &PriceTable::default()), Ok(()));
    }

    #[test]
    fn seed_values_fail_on_required_fields() {
        let errs = validate(&OrderFormValues::seed(), &PriceTable::default()).unwrap_err();
        assert_eq!(errs.get(Field::Username), Some(&ValidationError::Required));
        assert_eq!(errs.get(Field::Tel), Some(&ValidationError::Required));
        assert_eq!(errs.get(Field::Email), Some(&ValidationError::Required));
        assert_eq!(errs.get(Field::DeliveryTime), Some(&ValidationError::Required));
        assert_eq!(errs.get(Field::Category), Some(&ValidationError::Required));
        assert_eq!(
            errs.get(Field::PricePerKg),
            Some(&ValidationError::BelowMinimum(0.1))
        );
        assert!(errs.get(Field::Delivery).is_none());
        assert!(errs.get(Field::Weight).is_none());
    }

    #[test]
    fn blocking_cases() {
        let mut v = valid();
        v.username = "A".into();
        assert_eq!(error_for(&v, Field::Username), Some(ValidationError::TooShort(2)));

        let mut v = valid();
        v.tel = "1234".into();
        assert_eq!(error_for(&v, Field::Tel), Some(ValidationError::TooShort(5)));

        let mut v = valid();
        v.email = "not-an-email".into();
        assert_eq!(error_for(&v, Field::Email), Some(ValidationError::InvalidEmail));

        let mut v = valid();
        v.weight = 0.0;
        assert_eq!(
            error_for(&v, Field::Weight),
            Some(ValidationError::BelowMinimum(0.1))
        );

        let mut v = valid();
        v.delivery_time = String::new();
        assert_eq!(error_for(&v, Field::DeliveryTime), Some(ValidationError::Required));
    }

    #[test]
    fn weight_minimum_is_inclusive() {
        let mut v = valid();
        v.weight = 0.1;
        assert_eq!(error_for(&v, Field::Weight), None);
        v.weight = 0.09;
        assert!(error_for(&v, Field::Weight).is_some());
        v.weight = f64::NAN;
        assert_eq!(error_for(&v, Field::Weight), Some(ValidationError::NotANumber));
    }

    #[test]
    fn restrictions_accept_any_subset() {
        let subsets: [&[&str]; 5] = [
            &[],
            &["vegan"],
            &["gluten-free", "nut-free"],
            &["nut-free", "vegan"],
            &["vegan", "gluten-free", "nut-free"],
        ];
        for s in subsets {
            let mut v = valid();
            v.restrictions = s.iter().map(|x| x.to_string()).collect();
            assert_eq!(error_for(&v, Field::Restrictions), None, "{s:?}");
        }
        let mut v = valid();
        v.restrictions = vec!["vegan".into(), "keto".into()];
        assert_eq!(
            error_for(&v, Field::Restrictions),
            Some(ValidationError::NotAllowed("keto".into()))
        );
    }

    #[test]
    fn restrictions_reject_repeated_tokens() {
        let mut v = valid();
        v.restrictions = vec!["vegan".into(), "nut-free".into(), "vegan".into()];
        assert_eq!(
            error_for(&v, Field::Restrictions),
            Some(ValidationError::Duplicate("vegan".into()))
        );
    }

    #[test]
    fn message_length_limit() {
        let mut v = valid();
        v.message = "x".repeat(200);
        assert_eq!(error_for(&v, Field::Message), None);
        v.message = "x".repeat(201);
        assert_eq!(error_for(&v, Field::Message), Some(ValidationError::TooLong(200)));
        // counted in chars, not bytes
        v.message = "é".repeat(200);
        assert_eq!(error_for(&v, Field::Message), None);
    }

    #[test]
    fn enumerated_fields_reject_unknown_tokens() {
        let mut v = valid();
        v.delivery = "teleport".into();
        assert_eq!(
            error_for(&v, Field::Delivery),
            Some(ValidationError::NotAllowed("teleport".into()))
        );
        let mut v = valid();
        v.delivery_time = "midnight".into();
        assert_eq!(
            error_for(&v, Field::DeliveryTime),
            Some(ValidationError::NotAllowed("midnight".into()))
        );
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut v = valid();
        v.set_category("eBay", &PriceTable::default());
        assert_eq!(
            error_for(&v, Field::Category),
            Some(ValidationError::UnknownCategory("eBay".into()))
        );
        assert_eq!(
            error_for(&v, Field::PricePerKg),
            Some(ValidationError::BelowMinimum(0.1))
        );
    }

    #[test]
    fn email_shapes() {
        assert!(is_email("a@b.com"));
        assert!(is_email("first.last+tag@example.co.uk"));
        assert!(!is_email("not-an-email"));
        assert!(!is_email("a@b"));
        assert!(!is_email("a b@c.com"));
    }

    #[test]
    fn required_flags_follow_the_schema() {
        assert!(is_required(Field::Username));
        assert!(is_required(Field::PricePerKg));
        assert!(!is_required(Field::Message));
        assert!(!is_required(Field::Restrictions));
    }
}
