//! Expense record and category types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// One expense/receipt entry.
///
/// The `amount` is always the tax-inclusive total paid. `tax` is the tax
/// portion as captured from the receipt; when absent the reporting layer
/// derives it (see [`crate::tax::derive_tax`]). Records are read-only for
/// aggregation and export; mutation happens only through explicit edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Stable identifier, assigned on creation.
    pub id: Uuid,
    /// Owner profile tag.
    pub owner: String,
    /// Storage key of the source receipt image, if one was uploaded.
    pub image_key: Option<String>,
    /// Merchant name as printed on the receipt.
    pub merchant: String,
    /// Transaction date (calendar date, no time-of-day semantics).
    pub transaction_date: NaiveDate,
    /// Total amount paid, tax included, 2 fractional digits.
    pub amount: Decimal,
    /// Captured tax portion, 2 fractional digits. Absent means "derive it".
    pub tax: Option<Decimal>,
    /// Expense category.
    pub category: Category,
    /// Free-text notes; may contain a plain-text line-item breakdown.
    pub notes: Option<String>,
}

/// Expense category: a fixed enumerated set plus a free-text escape hatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// One of the fixed, enumerated categories.
    Known(CategoryKind),
    /// Free-text category override.
    Custom(String),
}

/// The fixed enumerated category set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    /// Meals and entertainment.
    Meals,
    /// Transport and travel.
    Travel,
    /// Office supplies.
    OfficeSupplies,
    /// Utilities (power, water, telecom).
    Utilities,
    /// Vehicle fuel.
    Fuel,
    /// Hotels and lodging.
    Lodging,
    /// Tools and equipment.
    Equipment,
    /// Accounting, legal and other professional services.
    ProfessionalServices,
    /// Advertising and marketing.
    Marketing,
    /// Repairs and maintenance.
    Maintenance,
}

impl CategoryKind {
    /// The display label, also used as the storage representation.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Meals => "Meals",
            Self::Travel => "Travel",
            Self::OfficeSupplies => "Office Supplies",
            Self::Utilities => "Utilities",
            Self::Fuel => "Fuel",
            Self::Lodging => "Lodging",
            Self::Equipment => "Equipment",
            Self::ProfessionalServices => "Professional Services",
            Self::Marketing => "Marketing",
            Self::Maintenance => "Maintenance",
        }
    }

    /// All enumerated categories.
    #[must_use]
    pub const fn all() -> [Self; 10] {
        [
            Self::Meals,
            Self::Travel,
            Self::OfficeSupplies,
            Self::Utilities,
            Self::Fuel,
            Self::Lodging,
            Self::Equipment,
            Self::ProfessionalServices,
            Self::Marketing,
            Self::Maintenance,
        ]
    }
}

impl Category {
    /// Parses a label: an exact match on the enumerated set yields
    /// `Known`, anything else becomes `Custom` verbatim.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        CategoryKind::all()
            .into_iter()
            .find(|kind| kind.label() == label)
            .map_or_else(|| Self::Custom(label.to_string()), Self::Known)
    }

    /// The category label used for grouping, filtering and display.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Known(kind) => kind.label(),
            Self::Custom(label) => label.as_str(),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

// Categories travel as plain label strings on the wire and in storage; the
// Known/Custom split is recovered by exact label match.
impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels_round_trip() {
        for kind in CategoryKind::all() {
            assert_eq!(Category::from_label(kind.label()), Category::Known(kind));
        }
    }

    #[test]
    fn test_unknown_label_becomes_custom() {
        assert_eq!(
            Category::from_label("Boat Rental"),
            Category::Custom("Boat Rental".to_string())
        );
        // Label matching is exact; case differences fall through to Custom.
        assert_eq!(
            Category::from_label("meals"),
            Category::Custom("meals".to_string())
        );
    }

    #[test]
    fn test_category_serde_as_label() {
        let json = serde_json::to_string(&Category::Known(CategoryKind::Meals)).unwrap();
        assert_eq!(json, "\"Meals\"");

        let parsed: Category = serde_json::from_str("\"Travel\"").unwrap();
        assert_eq!(parsed, Category::Known(CategoryKind::Travel));

        let custom: Category = serde_json::from_str("\"Snacks\"").unwrap();
        assert_eq!(custom, Category::Custom("Snacks".to_string()));
    }
}
