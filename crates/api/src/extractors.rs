//! Request extractors.
//!
//! Malformed bodies, bad query strings and failed field validation are all
//! reported as `400 VALIDATION_ERROR` with the offending fields listed.

use agencia_shared::types::money::is_money_scale;
use agencia_shared::{AppError, FieldError};
use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::ApiError;

/// Header carrying the client-chosen idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Longest accepted idempotency key.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// JSON body that passed deserialization and field validation.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| schema_failure("body", rejection.body_text()))?;
        value.validate().map_err(validation_failure)?;
        Ok(Self(value))
    }
}

/// Query string that passed deserialization and field validation.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| schema_failure("query", rejection.body_text()))?;
        value.validate().map_err(validation_failure)?;
        Ok(Self(value))
    }
}

/// Optional `Idempotency-Key` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdempotencyKey(pub Option<String>);

impl IdempotencyKey {
    /// Returns the key, if the client sent one.
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(IDEMPOTENCY_KEY_HEADER) else {
            return Ok(Self(None));
        };
        let key = raw
            .to_str()
            .map_err(|_| schema_failure(IDEMPOTENCY_KEY_HEADER, "must be visible ASCII"))?
            .trim();
        if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(schema_failure(
                IDEMPOTENCY_KEY_HEADER,
                format!("must be between 1 and {MAX_IDEMPOTENCY_KEY_LEN} characters"),
            ));
        }
        Ok(Self(Some(key.to_string())))
    }
}

/// Rejects amounts with more than two decimal places.
///
/// # Errors
///
/// Returns a `money_scale` validation error.
pub fn money_scale(value: &Decimal) -> Result<(), ValidationError> {
    if is_money_scale(*value) {
        Ok(())
    } else {
        Err(ValidationError::new("money_scale")
            .with_message("must have at most two decimal places".into()))
    }
}

fn schema_failure(field: &str, message: impl Into<String>) -> ApiError {
    AppError::Validation(vec![FieldError::new(field, message)]).into()
}

fn validation_failure(errors: ValidationErrors) -> ApiError {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let name = wire_name(&field);
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map_or_else(|| e.code.to_string(), ToString::to_string);
                FieldError::new(name.clone(), message)
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    AppError::Validation(fields).into()
}

/// Converts a Rust field name to the camelCase name clients send.
fn wire_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("conta_origem_id", "contaOrigemId")]
    #[case("valor", "valor")]
    #[case("dataVencimento", "dataVencimento")]
    fn test_wire_name(#[case] field: &str, #[case] expected: &str) {
        assert_eq!(wire_name(field), expected);
    }

    #[test]
    fn test_money_scale() {
        assert!(money_scale(&dec!(10.50)).is_ok());
        assert!(money_scale(&dec!(10)).is_ok());
        assert!(money_scale(&dec!(10.505)).is_err());
    }
}
