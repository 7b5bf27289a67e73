//! Free-text extraction of listing fields.
//!
//! Each field is a single first-match scan over the raw fragment. The
//! scans are independent: nothing validates that the matched price and
//! year belong to the same listing phrase, which is acceptable because
//! fragments arrive pre-segmented per listing.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{parse_digits, ListingRecord};

lazy_static! {
    // Four-digit year in 1900-2099.
    static ref YEAR_REGEX: Regex = Regex::new(r"\b(19|20)\d{2}\b").unwrap();

    // Currency marker followed by digits with locale separators.
    static ref PRICE_REGEX: Regex = Regex::new(r"\$[\d\.]+").unwrap();

    // Digits with separators immediately followed by a km unit marker.
    static ref MILEAGE_REGEX: Regex = Regex::new(r"(?i)[\d\.]+\s*km").unwrap();
}

/// Parse one listing fragment into a structured record.
///
/// `brand` and `model` are the search targets and are copied into the
/// record; the fragment is only scanned for the remaining fields. A
/// field whose pattern never matches stays `None`.
pub fn extract(brand: &str, model: &str, text: &str) -> ListingRecord {
    let year = YEAR_REGEX
        .find(text)
        .and_then(|m| parse_digits(m.as_str()))
        .map(|y| y as i32);

    let price = PRICE_REGEX.find(text).and_then(|m| parse_digits(m.as_str()));

    let mileage_km = MILEAGE_REGEX
        .find(text)
        .and_then(|m| parse_digits(m.as_str()));

    ListingRecord {
        year,
        price,
        mileage_km,
        brand: brand.to_string(),
        model: model.to_string(),
        model_detail: extract_model_detail(brand, model, text),
    }
}

/// Capture the trim/version text that follows `<brand> <model>`.
///
/// Non-greedy capture up to the next bullet separator, currency marker
/// or end of input. An empty capture after trimming means the listing
/// named the bare model, so `None`.
fn extract_model_detail(brand: &str, model: &str, text: &str) -> Option<String> {
    let pattern = format!(
        r"(?i){}\s+{}\s*(.*?)\s*(?:·|\$|$)",
        regex::escape(brand),
        regex::escape(model)
    );
    // Brand/model are request input, escaped above; the pattern itself
    // cannot fail to compile.
    let re = Regex::new(&pattern).ok()?;

    let detail = re.captures(text)?.get(1)?.as_str().trim();
    if detail.is_empty() {
        None
    } else {
        Some(detail.to_string())
    }
}
