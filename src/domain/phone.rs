//! Phone number validation and batch partitioning
//!
//! Numbers arrive as free-form lines from uploaded lists. Validation looks
//! only at the digits; the original display string is what gets dialed and
//! stored.

use std::collections::HashMap;

/// Minimum digit count for a dialable number.
pub const MIN_DIGITS: usize = 9;
/// Maximum digit count for a dialable number.
pub const MAX_DIGITS: usize = 15;

/// Strip everything but ASCII digits.
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// A number is dialable when its digit count falls within [9, 15].
pub fn is_valid(raw: &str) -> bool {
    let digits = normalize(raw).len();
    (MIN_DIGITS..=MAX_DIGITS).contains(&digits)
}

/// One number to dial, with the display name it was submitted with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialEntry {
    pub phone_number: String,
    pub customer_name: Option<String>,
}

/// Split a raw number list into dialable entries and rejected inputs.
///
/// Order is preserved and duplicates are kept - each occurrence is dispatched
/// independently. Blank lines are ignored entirely; everything else that fails
/// validation lands in the rejected list so the caller can report it.
pub fn partition(
    numbers: &[String],
    customer_names: &HashMap<String, String>,
) -> (Vec<DialEntry>, Vec<String>) {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();

    for raw in numbers {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if is_valid(line) {
            valid.push(DialEntry {
                phone_number: line.to_string(),
                customer_name: customer_names.get(line).cloned(),
            });
        } else {
            invalid.push(line.to_string());
        }
    }

    (valid, invalid)
}
