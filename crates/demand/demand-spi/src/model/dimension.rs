//! Grouping dimensions and typed group keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ForecastError;

/// Label used for blank or missing dimension values.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Normalize a raw dimension value: trimmed, with blanks mapped to [`UNKNOWN_LABEL`].
pub fn normalize_label(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// A categorical dimension records can be grouped by.
///
/// State, Dealer and Location form a tree (state owns dealers, dealer owns
/// locations). CapacityRange and Sector are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    State,
    Dealer,
    Location,
    CapacityRange,
    Sector,
}

impl Dimension {
    /// All dimensions, hierarchy first.
    pub const ALL: [Dimension; 5] = [
        Dimension::State,
        Dimension::Dealer,
        Dimension::Location,
        Dimension::CapacityRange,
        Dimension::Sector,
    ];

    /// Field name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::State => "state",
            Dimension::Dealer => "dealer",
            Dimension::Location => "location",
            Dimension::CapacityRange => "capacity_range",
            Dimension::Sector => "sector",
        }
    }

    /// Parent dimension in the state → dealer → location tree.
    pub fn parent(&self) -> Option<Dimension> {
        match self {
            Dimension::Dealer => Some(Dimension::State),
            Dimension::Location => Some(Dimension::Dealer),
            _ => None,
        }
    }

    /// Whether this dimension takes part in the reconciled hierarchy.
    pub fn is_hierarchical(&self) -> bool {
        matches!(
            self,
            Dimension::State | Dimension::Dealer | Dimension::Location
        )
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "state" => Ok(Dimension::State),
            "dealer" => Ok(Dimension::Dealer),
            "location" => Ok(Dimension::Location),
            "capacity_range" | "range" | "kva_range" => Ok(Dimension::CapacityRange),
            "sector" | "segment" => Ok(Dimension::Sector),
            other => Err(ForecastError::invalid(
                "dimension",
                format!(
                    "unknown dimension '{}' (expected state, dealer, location, capacity_range or sector)",
                    other
                ),
            )),
        }
    }
}

/// A (dimension, value) pair partitioning the records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    dimension: Dimension,
    value: String,
}

impl GroupKey {
    /// Create a key; blank values become [`UNKNOWN_LABEL`].
    pub fn new(dimension: Dimension, value: impl AsRef<str>) -> Self {
        Self {
            dimension,
            value: normalize_label(value.as_ref()),
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the value was blank in the source data.
    pub fn is_unknown(&self) -> bool {
        self.value == UNKNOWN_LABEL
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.dimension, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_normalize_to_unknown() {
        assert_eq!(normalize_label(""), UNKNOWN_LABEL);
        assert_eq!(normalize_label("   "), UNKNOWN_LABEL);
        assert_eq!(normalize_label(" Pune "), "Pune");

        let key = GroupKey::new(Dimension::Dealer, "");
        assert!(key.is_unknown());
        assert_eq!(key.to_string(), "dealer=Unknown");
    }

    #[test]
    fn test_hierarchy_parents() {
        assert_eq!(Dimension::State.parent(), None);
        assert_eq!(Dimension::Dealer.parent(), Some(Dimension::State));
        assert_eq!(Dimension::Location.parent(), Some(Dimension::Dealer));
        assert_eq!(Dimension::Sector.parent(), None);
        assert!(!Dimension::CapacityRange.is_hierarchical());
    }

    #[test]
    fn test_dimension_from_str_aliases() {
        assert_eq!("kva_range".parse::<Dimension>().unwrap(), Dimension::CapacityRange);
        assert_eq!("Segment".parse::<Dimension>().unwrap(), Dimension::Sector);
        assert_eq!("STATE".parse::<Dimension>().unwrap(), Dimension::State);
        assert!("region".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_keys_order_by_dimension_then_value() {
        let mut keys = vec![
            GroupKey::new(Dimension::Dealer, "B"),
            GroupKey::new(Dimension::State, "Z"),
            GroupKey::new(Dimension::Dealer, "A"),
        ];
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, vec!["state=Z", "dealer=A", "dealer=B"]);
    }
}
