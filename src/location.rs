//! Defines the [`Location`] type, the unit being matched, and the
//! [`Distance`] score used to rank candidates.

use serde::{Deserialize, Serialize};

/// A named place with a postal code. On parsing a dataset, the `slug` field
/// becomes the identifier and `zip` the postal code.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Location {
    /// The location's display name, e.g., `Saint-Denis`.
    pub name: String,

    /// The unique identifier for the location. Two locations may share a
    /// name or a postal code, but never an identifier.
    #[serde(rename = "slug")]
    pub id: String,

    /// The postal code as it appears in the source data. It's kept as a
    /// string since it may carry leading zeros, letters (Corsica), or be
    /// malformed altogether.
    #[serde(rename = "zip", alias = "postal_code", alias = "postcode")]
    pub postal_code: String,
}

impl Location {
    pub fn new(id: &str, name: &str, postal_code: &str) -> Location {
        Location {
            id: id.to_owned(),
            name: name.to_owned(),
            postal_code: postal_code.to_owned(),
        }
    }

    /// Parses the postal code as an integer. Surrounding whitespace is
    /// ignored; anything else that isn't a plain number yields `None`.
    pub fn postal_number(&self) -> Option<u64> {
        self.postal_code.trim().parse().ok()
    }

    /// Scores how far `other` is from `self` by postal code. See
    /// [`Distance`].
    pub fn distance_to(&self, other: &Location) -> Distance {
        Distance::between(self.postal_number(), other.postal_number())
    }
}

/// The estimated distance between two locations: the absolute difference of
/// their postal codes. If either code doesn't parse, the distance is
/// [`Distance::Unknown`], which orders after every known distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Distance {
    Known(u64),
    Unknown,
}

impl Distance {
    pub fn between(a: Option<u64>, b: Option<u64>) -> Distance {
        match (a, b) {
            (Some(a), Some(b)) => Distance::Known(if a > b { a - b } else { b - a }),
            _ => Distance::Unknown,
        }
    }
}
