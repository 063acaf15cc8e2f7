//! Defect Classifier
//!
//! Decides whether an item is defective from its physical dimensions.

use defmt::Format;
use serde::{Deserialize, Serialize};

use crate::config::Tolerances;

/// Classification outcome for one item
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format, Serialize, Deserialize)]
pub enum Verdict {
    NotDefective = 0,
    Defective = 1,
}

impl Verdict {
    /// Wire value: 0 for acceptable items, 1 for defective ones
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn is_defective(self) -> bool {
        self == Verdict::Defective
    }
}

/// Classify against the product 1 tolerances
pub fn classify(actual_length: u8, actual_width: u8) -> Verdict {
    classify_with(&Tolerances::PRODUCT_1, actual_length, actual_width)
}

/// Classify against an explicit set of tolerances
pub fn classify_with(tolerances: &Tolerances, actual_length: u8, actual_width: u8) -> Verdict {
    if tolerances.length.contains(actual_length) && tolerances.width.contains(actual_width) {
        Verdict::NotDefective
    } else {
        Verdict::Defective
    }
}
