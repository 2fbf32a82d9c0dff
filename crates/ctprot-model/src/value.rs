//! Display coercion for raw parameter strings.

use serde::{Deserialize, Serialize};

/// A spreadsheet cell value coerced from a raw protocol string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Coerce a raw extracted value for display.
    ///
    /// Quote characters are stripped first; the remainder is promoted to an
    /// integer or a decimal when it matches the respective pattern, and kept
    /// as text otherwise. Signs are not recognized, matching the extraction
    /// source where negative parameters never occur.
    pub fn coerce(raw: &str) -> Self {
        let unquoted: String = raw.chars().filter(|c| *c != '"').collect();
        let trimmed = unquoted.trim();
        if is_integer(trimmed)
            && let Ok(n) = trimmed.parse::<i64>()
        {
            return Self::Int(n);
        }
        if is_decimal(trimmed)
            && let Ok(x) = trimmed.parse::<f64>()
        {
            return Self::Float(x);
        }
        Self::Text(unquoted)
    }
}

/// `\d+`
fn is_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `\d*.\d+` or `\d+.\d*`
fn is_decimal(s: &str) -> bool {
    let Some((whole, frac)) = s.split_once('.') else {
        return false;
    };
    let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(whole) || !digits_only(frac) {
        return false;
    }
    !whole.is_empty() || !frac.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_coercion() {
        assert_eq!(CellValue::coerce("123"), CellValue::Int(123));
        assert_eq!(CellValue::coerce("\"80\""), CellValue::Int(80));
        assert_eq!(CellValue::coerce(" 7 "), CellValue::Int(7));
    }

    #[test]
    fn float_coercion() {
        assert_eq!(CellValue::coerce("12.5"), CellValue::Float(12.5));
        assert_eq!(CellValue::coerce("\".6\""), CellValue::Float(0.6));
        assert_eq!(CellValue::coerce("3."), CellValue::Float(3.0));
    }

    #[test]
    fn text_fallback_strips_quotes() {
        assert_eq!(
            CellValue::coerce("\"ABC\""),
            CellValue::Text("ABC".to_string())
        );
        assert_eq!(
            CellValue::coerce("1.2.3"),
            CellValue::Text("1.2.3".to_string())
        );
        assert_eq!(
            CellValue::coerce("-5"),
            CellValue::Text("-5".to_string())
        );
        assert_eq!(CellValue::coerce("."), CellValue::Text(".".to_string()));
    }
}
