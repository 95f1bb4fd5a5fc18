use indexmap::IndexMap;

use super::PropertyValue;
use crate::format::FormatProvider;

/// The message template a log event was written with, e.g. `"Processed {Count} items"`.
///
/// Property tokens take the form `{Name}`, `{Name,alignment}`, `{Name:format}` or
/// `{Name,alignment:format}`, optionally prefixed with `@` or `$`. `{{` and `}}` escape braces.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct MessageTemplate {
    text: String,
}

impl MessageTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitutes property values into the template.
    ///
    /// Tokens naming a property that is not present, and malformed tokens, are kept verbatim.
    pub fn render(
        &self,
        properties: &IndexMap<String, PropertyValue>,
        provider: &dyn FormatProvider,
    ) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();

        while let Some(start) = rest.find(['{', '}']) {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];

            if let Some(after) = tail.strip_prefix("{{") {
                out.push('{');
                rest = after;
            } else if let Some(after) = tail.strip_prefix("}}") {
                out.push('}');
                rest = after;
            } else if let Some(after) = tail.strip_prefix('}') {
                out.push('}');
                rest = after;
            } else {
                // `tail` starts with an opening brace.
                let body = &tail[1..];
                match body.find(['{', '}']) {
                    Some(end) if body[end..].starts_with('}') => {
                        let raw = &tail[..end + 2];
                        render_token(&mut out, &body[..end], raw, properties, provider);
                        rest = &body[end + 1..];
                    }
                    _ => {
                        out.push('{');
                        rest = body;
                    }
                }
            }
        }
        out.push_str(rest);

        out
    }
}

impl From<&str> for MessageTemplate {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for MessageTemplate {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Widest padding a token may request; wider alignments leave the token unrendered.
const MAX_ALIGNMENT: u32 = 10_000;

fn render_token(
    out: &mut String,
    token: &str,
    raw: &str,
    properties: &IndexMap<String, PropertyValue>,
    provider: &dyn FormatProvider,
) {
    let token = token
        .strip_prefix('@')
        .or_else(|| token.strip_prefix('$'))
        .unwrap_or(token);
    let (head, format) = match token.split_once(':') {
        Some((head, format)) => (head, Some(format)),
        None => (token, None),
    };
    let (name, alignment) = match head.split_once(',') {
        Some((name, alignment)) => match alignment.trim().parse::<i32>() {
            Ok(alignment) if alignment.unsigned_abs() <= MAX_ALIGNMENT => (name, Some(alignment)),
            _ => {
                out.push_str(raw);
                return;
            }
        },
        None => (head, None),
    };

    let valid_name =
        !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    let Some(value) = properties.get(name).filter(|_| valid_name) else {
        out.push_str(raw);
        return;
    };

    let rendered = value.to_display_string(format, provider);
    match alignment {
        None => out.push_str(&rendered),
        Some(alignment) => {
            let width = alignment.unsigned_abs() as usize;
            let padding = width.saturating_sub(rendered.chars().count());
            if alignment >= 0 {
                out.extend(std::iter::repeat_n(' ', padding));
                out.push_str(&rendered);
            } else {
                out.push_str(&rendered);
                out.extend(std::iter::repeat_n(' ', padding));
            }
        }
    }
}
