use crate::order::schema::Field;
use std::collections::BTreeMap;

/// A single rule failure, scoped to one field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("This field is required")]
    Required,
    #[error("Must be at least {0} characters")]
    TooShort(usize),
    #[error("Must be at most {0} characters")]
    TooLong(usize),
    #[error("Enter a valid email address")]
    InvalidEmail,
    #[error("Must be a number")]
    NotANumber,
    #[error("Must be at least {0}")]
    BelowMinimum(f64),
    #[error("'{0}' is not an allowed value")]
    NotAllowed(String),
    #[error("'{0}' is selected more than once")]
    Duplicate(String),
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),
}

/// Every failing field with the first error its rules produced.
#[derive(Debug, Clone, Default, PartialEq, thiserror::Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct FieldErrors(BTreeMap<Field, ValidationError>);

impl FieldErrors {
    pub fn single(field: Field, err: ValidationError) -> Self {
        let mut errs = Self::default();
        errs.insert(field, err);
        errs
    }

    pub fn insert(&mut self, field: Field, err: ValidationError) {
        self.0.entry(field).or_insert(err);
    }

    pub fn get(&self, field: Field) -> Option<&ValidationError> {
        self.0.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &ValidationError)> {
        self.0.iter().map(|(f, e)| (*f, e))
    }
}
