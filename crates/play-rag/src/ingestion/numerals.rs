//! Roman numeral conversion for act and scene headings

use crate::error::{Error, Result};

fn symbol_value(symbol: char) -> Option<u32> {
    match symbol {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    }
}

/// Convert a roman numeral to its integer value.
///
/// Scans left to right: when a symbol is larger than its predecessor, the
/// predecessor was already added once, so `current - 2 * previous` is added.
/// Malformed but well-alphabeted input (e.g. `"IIX"`) still yields a
/// deterministic value; only characters outside `IVXLCDM` are rejected.
pub fn roman_to_int(numeral: &str) -> Result<u32> {
    let mut total: u32 = 0;
    let mut previous: Option<u32> = None;

    for symbol in numeral.chars() {
        let current = symbol_value(symbol).ok_or_else(|| {
            Error::parse(format!("'{}' is not a roman numeral symbol in '{}'", symbol, numeral))
        })?;

        total = match previous {
            // total >= previous, so total + current > 2 * previous
            Some(prev) if current > prev => total.saturating_add(current) - 2 * prev,
            _ => total.saturating_add(current),
        };
        previous = Some(current);
    }

    Ok(total)
}
