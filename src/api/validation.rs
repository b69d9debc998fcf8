use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;
use std::fmt;

use super::ApiError;

/// Extractor accepting either a JSON or a form-encoded request body,
/// deserialized into the same typed record. Deserialization failures
/// surface as validation errors before any handler logic runs.
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if content_type.starts_with("application/json") {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::validation(humanize(&rejection.body_text())))?;
            return Ok(Self(value));
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::validation(humanize(&rejection.body_text())))?;
            return Ok(Self(value));
        }

        Err(ApiError::validation(
            "Expected a JSON or form-encoded request body",
        ))
    }
}

/// Rewrite serde's missing-field phrasing into the message shape clients
/// already rely on.
fn humanize(rejection: &str) -> String {
    if let Some(rest) = rejection.split("missing field `").nth(1)
        && let Some(field) = rest.split('`').next()
    {
        return format!("Missing field: {field}");
    }

    rejection.to_string()
}

/// Deserialize a float that may arrive as a JSON number or as a numeric
/// string (form-encoded bodies carry everything as strings).
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct FloatVisitor;

    impl serde::de::Visitor<'_> for FloatVisitor {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or a numeric string")
        }

        fn visit_f64<E: serde::de::Error>(self, value: f64) -> Result<f64, E> {
            Ok(value)
        }

        #[allow(clippy::cast_precision_loss)]
        fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<f64, E> {
            Ok(value as f64)
        }

        #[allow(clippy::cast_precision_loss)]
        fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<f64, E> {
            Ok(value as f64)
        }

        fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<f64, E> {
            value
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid number: {value:?}")))
        }
    }

    deserializer.deserialize_any(FloatVisitor)
}

/// Deserialize an integer-coded field from a JSON number or a numeric
/// string. Fractional values are rejected rather than truncated.
pub fn lenient_i32<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct IntVisitor;

    impl serde::de::Visitor<'_> for IntVisitor {
        type Value = i32;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or an integer string")
        }

        fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<i32, E> {
            i32::try_from(value).map_err(|_| E::custom(format!("integer out of range: {value}")))
        }

        fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<i32, E> {
            i32::try_from(value).map_err(|_| E::custom(format!("integer out of range: {value}")))
        }

        #[allow(clippy::cast_possible_truncation)]
        fn visit_f64<E: serde::de::Error>(self, value: f64) -> Result<i32, E> {
            if value.fract() != 0.0 {
                return Err(E::custom(format!("expected an integer, got {value}")));
            }
            i32::try_from(value as i64)
                .map_err(|_| E::custom(format!("integer out of range: {value}")))
        }

        fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<i32, E> {
            value
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid integer: {value:?}")))
        }
    }

    deserializer.deserialize_any(IntVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Vitals {
        #[serde(deserialize_with = "lenient_f64")]
        temp_c: f64,
        #[serde(deserialize_with = "lenient_i32")]
        hr: i32,
    }

    #[test]
    fn accepts_json_numbers() {
        let vitals: Vitals = serde_json::from_str(r#"{"temp_c": 36.8, "hr": 72}"#).unwrap();
        assert!((vitals.temp_c - 36.8).abs() < f64::EPSILON);
        assert_eq!(vitals.hr, 72);
    }

    #[test]
    fn accepts_numeric_strings() {
        let vitals: Vitals = serde_json::from_str(r#"{"temp_c": "36.8", "hr": "72"}"#).unwrap();
        assert!((vitals.temp_c - 36.8).abs() < f64::EPSILON);
        assert_eq!(vitals.hr, 72);
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Vitals>(r#"{"temp_c": "warm", "hr": 72}"#).is_err());
        assert!(serde_json::from_str::<Vitals>(r#"{"temp_c": 36.8, "hr": 72.5}"#).is_err());
    }

    #[test]
    fn humanize_names_the_missing_field() {
        let msg = humanize(
            "Failed to deserialize the JSON body into the target type: missing field `Age` at line 1 column 10",
        );
        assert_eq!(msg, "Missing field: Age");
    }

    #[test]
    fn humanize_passes_other_errors_through() {
        let msg = humanize("invalid number: \"abc\"");
        assert_eq!(msg, "invalid number: \"abc\"");
    }
}
