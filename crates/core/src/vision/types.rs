//! Extraction payload types and lenient parsing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::VisionError;

/// Date formats models actually emit, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%B %d, %Y", "%d %B %Y"];

/// Best-effort receipt fields extracted from an image.
///
/// Every field is optional; an unreadable receipt yields an empty draft, not
/// an error. Amounts are tax-inclusive totals, matching stored records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedReceipt {
    /// Merchant or vendor name.
    pub merchant: Option<String>,
    /// Transaction date.
    pub transaction_date: Option<NaiveDate>,
    /// Tax-inclusive total.
    pub amount: Option<Decimal>,
    /// Tax portion, when printed on the receipt.
    pub tax: Option<Decimal>,
    /// Suggested category label.
    pub category: Option<String>,
    /// Line-item breakdown or other notable text from the receipt.
    pub notes: Option<String>,
}

/// Wire shape of the model's JSON answer. Numbers arrive as JSON numbers or
/// as strings ("$1,234.50"), dates in whatever format the receipt used, so
/// every field is parsed leniently after deserialization.
#[derive(Debug, Deserialize)]
struct RawExtraction {
    merchant: Option<Value>,
    #[serde(alias = "date")]
    transaction_date: Option<Value>,
    #[serde(alias = "total")]
    amount: Option<Value>,
    tax: Option<Value>,
    category: Option<Value>,
    #[serde(alias = "description")]
    notes: Option<Value>,
}

/// Parses the model's text answer into an extraction draft.
///
/// Strips surrounding prose and markdown code fences by slicing from the
/// first `{` to the last `}` before deserializing.
pub fn parse_extraction(raw: &str) -> Result<ExtractedReceipt, VisionError> {
    let cleaned = clean_json_output(raw);
    let parsed: RawExtraction =
        serde_json::from_str(&cleaned).map_err(|e| VisionError::InvalidPayload(e.to_string()))?;

    Ok(ExtractedReceipt {
        merchant: parsed.merchant.as_ref().and_then(text_field),
        transaction_date: parsed.transaction_date.as_ref().and_then(date_field),
        amount: parsed.amount.as_ref().and_then(money_field),
        tax: parsed.tax.as_ref().and_then(money_field),
        category: parsed.category.as_ref().and_then(text_field),
        notes: parsed.notes.as_ref().and_then(text_field),
    })
}

fn clean_json_output(raw: &str) -> String {
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            return raw[start..=end].to_string();
        }
    }
    raw.trim().to_string()
}

fn text_field(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("null") || text.eq_ignore_ascii_case("unknown")
    {
        return None;
    }
    Some(text.to_string())
}

fn date_field(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

fn money_field(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => Decimal::from_str(&number.to_string()).ok(),
        Value::String(text) => {
            let stripped: String = text
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            if stripped.is_empty() {
                None
            } else {
                Decimal::from_str(&stripped).ok()
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_full_payload() {
        let raw = r#"{"merchant":"Cafe Aurora","transaction_date":"2024-03-15","amount":42.00,"tax":2.00,"category":"Meals","notes":"2x coffee, 1x sandwich"}"#;
        let receipt = parse_extraction(raw).unwrap();
        assert_eq!(receipt.merchant.as_deref(), Some("Cafe Aurora"));
        assert_eq!(
            receipt.transaction_date,
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(receipt.amount, Some(dec!(42.00)));
        assert_eq!(receipt.tax, Some(dec!(2.00)));
        assert_eq!(receipt.category.as_deref(), Some("Meals"));
        assert_eq!(receipt.notes.as_deref(), Some("2x coffee, 1x sandwich"));
    }

    #[test]
    fn test_notes_accepts_description_alias() {
        let raw = r#"{"merchant": "Gas Plus", "description": "diesel, 41.2L"}"#;
        let receipt = parse_extraction(raw).unwrap();
        assert_eq!(receipt.notes.as_deref(), Some("diesel, 41.2L"));

        let blank = parse_extraction(r#"{"notes": "  "}"#).unwrap();
        assert_eq!(blank.notes, None);
    }

    #[test]
    fn test_strips_code_fences_and_prose() {
        let raw = "Here is the extraction:\n```json\n{\"merchant\": \"Hotel Nord\", \"amount\": \"105.00\"}\n```";
        let receipt = parse_extraction(raw).unwrap();
        assert_eq!(receipt.merchant.as_deref(), Some("Hotel Nord"));
        assert_eq!(receipt.amount, Some(dec!(105.00)));
    }

    #[test]
    fn test_currency_symbols_and_thousands_separators() {
        let raw = r#"{"amount": "$1,234.50", "tax": "61.73 CAD"}"#;
        let receipt = parse_extraction(raw).unwrap();
        assert_eq!(receipt.amount, Some(dec!(1234.50)));
        assert_eq!(receipt.tax, Some(dec!(61.73)));
    }

    #[test]
    fn test_alternate_field_names_and_date_formats() {
        let raw = r#"{"merchant": "Gas Plus", "date": "15/03/2024", "total": 80.25}"#;
        let receipt = parse_extraction(raw).unwrap();
        assert_eq!(
            receipt.transaction_date,
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(receipt.amount, Some(dec!(80.25)));
    }

    #[test]
    fn test_unreadable_fields_come_back_empty() {
        let raw = r#"{"merchant": "unknown", "transaction_date": "not visible", "amount": null}"#;
        let receipt = parse_extraction(raw).unwrap();
        assert_eq!(receipt, ExtractedReceipt::default());
    }

    #[test]
    fn test_non_json_answer_is_an_error() {
        let raw = "I could not read this receipt, sorry.";
        assert!(matches!(
            parse_extraction(raw),
            Err(VisionError::InvalidPayload(_))
        ));
    }
}
