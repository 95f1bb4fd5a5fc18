use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::format::{FormatProvider, InvariantFormat};

/// A single, non-composite property value.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    UInt64(u64),
    Float(f64),
    String(String),
    Char(char),
    Timestamp(DateTime<Utc>),
    Bytes(Bytes),
    Uuid(Uuid),
}

/// A structured object captured from a log call, optionally tagged with its type name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructureValue {
    pub type_tag: Option<String>,
    pub properties: Vec<(String, PropertyValue)>,
}

/// The value of a named log event property.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Scalar(ScalarValue),
    Sequence(Vec<PropertyValue>),
    Structure(StructureValue),
    Dictionary(Vec<(ScalarValue, PropertyValue)>),
}

impl ScalarValue {
    /// Writes the display form of this scalar.
    ///
    /// Strings and chars are quoted unless the `l` (literal) format is requested.
    pub fn render(&self, out: &mut String, format: Option<&str>, provider: &dyn FormatProvider) {
        match self {
            ScalarValue::Null => out.push_str("null"),
            ScalarValue::Boolean(value) => out.push_str(if *value { "true" } else { "false" }),
            ScalarValue::Int32(value) => out.push_str(&value.to_string()),
            ScalarValue::Int64(value) => out.push_str(&value.to_string()),
            ScalarValue::UInt64(value) => out.push_str(&value.to_string()),
            ScalarValue::Float(value) => out.push_str(&provider.format_float(*value, format)),
            ScalarValue::String(value) => render_text(out, value, format),
            ScalarValue::Char(value) => {
                if format == Some("l") {
                    out.push(*value);
                } else {
                    out.push('\'');
                    out.push(*value);
                    out.push('\'');
                }
            }
            ScalarValue::Timestamp(value) => {
                out.push_str(&provider.format_timestamp(value, format))
            }
            ScalarValue::Bytes(value) => {
                out.push_str("0x");
                for byte in value.iter() {
                    out.push_str(&format!("{byte:02X}"));
                }
            }
            ScalarValue::Uuid(value) => out.push_str(&value.hyphenated().to_string()),
        }
    }
}

impl PropertyValue {
    /// Writes the display form of this value, recursing into composites.
    ///
    /// The format is handed down to every nested scalar.
    pub fn render(&self, out: &mut String, format: Option<&str>, provider: &dyn FormatProvider) {
        match self {
            PropertyValue::Scalar(scalar) => scalar.render(out, format, provider),
            PropertyValue::Sequence(elements) => {
                out.push('[');
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    element.render(out, format, provider);
                }
                out.push(']');
            }
            PropertyValue::Structure(structure) => {
                if let Some(tag) = &structure.type_tag {
                    out.push_str(tag);
                    out.push(' ');
                }
                out.push_str("{ ");
                for (index, (name, value)) in structure.properties.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(name);
                    out.push_str(": ");
                    value.render(out, format, provider);
                }
                out.push_str(" }");
            }
            PropertyValue::Dictionary(entries) => {
                out.push('[');
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    out.push('(');
                    key.render(out, format, provider);
                    out.push_str(": ");
                    value.render(out, format, provider);
                    out.push(')');
                }
                out.push(']');
            }
        }
    }

    pub fn to_display_string(&self, format: Option<&str>, provider: &dyn FormatProvider) -> String {
        let mut out = String::new();
        self.render(&mut out, format, provider);
        out
    }

    pub fn structure<I, K>(type_tag: Option<&str>, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertyValue)>,
        K: Into<String>,
    {
        PropertyValue::Structure(StructureValue {
            type_tag: type_tag.map(Into::into),
            properties: properties
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        })
    }

    pub fn dictionary<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertyValue)>,
        K: Into<ScalarValue>,
    {
        PropertyValue::Dictionary(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }
}

fn render_text(out: &mut String, text: &str, format: Option<&str>) {
    if format == Some("l") {
        out.push_str(text);
        return;
    }

    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('"');
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render(&mut out, None, &InvariantFormat);
        f.write_str(&out)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string(None, &InvariantFormat))
    }
}

macro_rules! impl_scalar_from {
    ($t:ty, $variant:ident) => {
        impl From<$t> for ScalarValue {
            fn from(value: $t) -> Self {
                ScalarValue::$variant(value.into())
            }
        }

        impl From<$t> for PropertyValue {
            fn from(value: $t) -> Self {
                PropertyValue::Scalar(value.into())
            }
        }
    };
}

impl_scalar_from!(bool, Boolean);
impl_scalar_from!(i8, Int32);
impl_scalar_from!(i16, Int32);
impl_scalar_from!(i32, Int32);
impl_scalar_from!(i64, Int64);
impl_scalar_from!(u8, Int32);
impl_scalar_from!(u16, Int32);
impl_scalar_from!(u32, Int64);
impl_scalar_from!(u64, UInt64);
impl_scalar_from!(f32, Float);
impl_scalar_from!(f64, Float);
impl_scalar_from!(String, String);
impl_scalar_from!(&str, String);
impl_scalar_from!(char, Char);
impl_scalar_from!(DateTime<Utc>, Timestamp);
impl_scalar_from!(Bytes, Bytes);
impl_scalar_from!(Uuid, Uuid);

impl From<ScalarValue> for PropertyValue {
    fn from(scalar: ScalarValue) -> Self {
        PropertyValue::Scalar(scalar)
    }
}

impl From<StructureValue> for PropertyValue {
    fn from(structure: StructureValue) -> Self {
        PropertyValue::Structure(structure)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(elements: Vec<T>) -> Self {
        PropertyValue::Sequence(elements.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        match value {
            None => PropertyValue::Scalar(ScalarValue::Null),
            Some(value) => value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::format::CultureFormat;

    #[test]
    fn scalar_display() {
        assert_eq!(ScalarValue::Null.to_string(), "null");
        assert_eq!(ScalarValue::from(true).to_string(), "true");
        assert_eq!(ScalarValue::from(42).to_string(), "42");
        assert_eq!(ScalarValue::from(0.5).to_string(), "0.5");
        assert_eq!(ScalarValue::from("say \"hi\"").to_string(), r#""say \"hi\"""#);
        assert_eq!(ScalarValue::from('x').to_string(), "'x'");
        assert_eq!(
            ScalarValue::from(Bytes::from_static(&[0x0a, 0xff])).to_string(),
            "0x0AFF"
        );
        assert_eq!(
            ScalarValue::from(Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap()).to_string(),
            "2020-01-02T03:04:05.000Z"
        );
    }

    #[test]
    fn literal_format_skips_quotes() {
        let value = PropertyValue::from("plain");
        assert_eq!(value.to_display_string(Some("l"), &InvariantFormat), "plain");
    }

    #[test]
    fn composite_display() {
        let sequence = PropertyValue::from(vec![1, 2, 3]);
        assert_eq!(sequence.to_string(), "[1, 2, 3]");

        let structure = PropertyValue::structure(
            Some("Order"),
            [
                ("Id", PropertyValue::from(7)),
                ("Customer", PropertyValue::from("ann")),
            ],
        );
        assert_eq!(structure.to_string(), r#"Order { Id: 7, Customer: "ann" }"#);

        let untagged = PropertyValue::structure(None::<&str>, [("A", PropertyValue::from(1))]);
        assert_eq!(untagged.to_string(), "{ A: 1 }");

        let dictionary = PropertyValue::dictionary([
            ("a", PropertyValue::from(1)),
            ("b", PropertyValue::from(vec!["x"])),
        ]);
        assert_eq!(dictionary.to_string(), r#"[("a": 1), ("b": ["x"])]"#);
    }

    #[test]
    fn nested_values_use_provider() {
        let value = PropertyValue::from(vec![1.5, 2.25]);
        assert_eq!(
            value.to_display_string(None, &CultureFormat::new(',')),
            "[1,5, 2,25]"
        );
    }

    #[test]
    fn missing_option_is_null() {
        assert_eq!(
            PropertyValue::from(None::<i32>),
            PropertyValue::Scalar(ScalarValue::Null)
        );
    }
}
