use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::{
    event::{PropertyValue, ScalarValue},
    format::{FormatProvider, provider_or_default},
};

/// A value in one column of a table entity, typed the way the table service stores it.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    String(String),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    Binary(Bytes),
}

impl CellValue {
    /// The OData type annotation the service needs to interpret the JSON form of this value.
    ///
    /// Strings, 32-bit integers, booleans and finite doubles are inferred from JSON and carry
    /// no annotation.
    pub fn edm_type(&self) -> Option<&'static str> {
        match self {
            CellValue::String(_) | CellValue::Int32(_) | CellValue::Boolean(_) => None,
            CellValue::Double(value) if value.is_finite() => None,
            CellValue::Double(_) => Some("Edm.Double"),
            CellValue::Int64(_) => Some("Edm.Int64"),
            CellValue::DateTime(_) => Some("Edm.DateTime"),
            CellValue::Guid(_) => Some("Edm.Guid"),
            CellValue::Binary(_) => Some("Edm.Binary"),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(value) => Some(value),
            _ => None,
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::String(value) => serializer.serialize_str(value),
            CellValue::Int32(value) => serializer.serialize_i32(*value),
            // Int64 travels as a string so it survives JSON parsers limited to doubles.
            CellValue::Int64(value) => serializer.collect_str(value),
            CellValue::Double(value) if value.is_finite() => serializer.serialize_f64(*value),
            CellValue::Double(value) if value.is_nan() => serializer.serialize_str("NaN"),
            CellValue::Double(value) if value.is_sign_positive() => {
                serializer.serialize_str("Infinity")
            }
            CellValue::Double(_) => serializer.serialize_str("-Infinity"),
            CellValue::Boolean(value) => serializer.serialize_bool(*value),
            CellValue::DateTime(value) => {
                serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            CellValue::Guid(value) => serializer.collect_str(&value.hyphenated()),
            CellValue::Binary(value) => {
                serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(value))
            }
        }
    }
}

/// Converts a property value into the cell stored for it.
///
/// Scalars with a native column type keep it. Everything else, including sequences,
/// structures and dictionaries, is stored as its display string rendered with `format` and
/// `provider`. This never fails.
pub fn to_entity_value(
    value: &PropertyValue,
    format: Option<&str>,
    provider: Option<&dyn FormatProvider>,
) -> CellValue {
    let provider = provider_or_default(provider);
    match value {
        PropertyValue::Scalar(scalar) => scalar_to_entity_value(scalar, format, provider),
        composite => CellValue::String(composite.to_display_string(format, provider)),
    }
}

fn scalar_to_entity_value(
    scalar: &ScalarValue,
    format: Option<&str>,
    provider: &dyn FormatProvider,
) -> CellValue {
    match scalar {
        ScalarValue::Boolean(value) => CellValue::Boolean(*value),
        ScalarValue::Int32(value) => CellValue::Int32(*value),
        ScalarValue::Int64(value) => CellValue::Int64(*value),
        ScalarValue::UInt64(value) => match i64::try_from(*value) {
            Ok(value) => CellValue::Int64(value),
            Err(_) => CellValue::String(value.to_string()),
        },
        ScalarValue::Float(value) => CellValue::Double(*value),
        ScalarValue::String(value) => CellValue::String(value.clone()),
        ScalarValue::Timestamp(value) => CellValue::DateTime(*value),
        ScalarValue::Bytes(value) => CellValue::Binary(value.clone()),
        ScalarValue::Uuid(value) => CellValue::Guid(*value),
        ScalarValue::Char(value) => CellValue::String(value.to_string()),
        ScalarValue::Null => {
            let mut out = String::new();
            scalar.render(&mut out, format, provider);
            CellValue::String(out)
        }
    }
}
