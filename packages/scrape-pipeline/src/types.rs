//! Data types shared across the pipeline.

use serde::{Deserialize, Serialize};

use crate::error::SkipReason;

/// One normalized marketplace listing.
///
/// Immutable once produced. `Eq + Hash` over every field so that
/// duplicate removal downstream is full-field equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingRecord {
    pub year: Option<i32>,
    pub price: Option<i64>,
    pub mileage_km: Option<i64>,
    pub brand: String,
    pub model: String,
    pub model_detail: Option<String>,
}

impl ListingRecord {
    /// Whether the record can participate in the mileage regression.
    pub fn has_price_and_mileage(&self) -> bool {
        self.price.is_some() && self.mileage_km.is_some()
    }
}

/// The brand/model/year triple behind a valuation request.
///
/// Each source gets a differently shaped query string: the listing
/// site is searched with the year included, the marketplace without it
/// to widen recall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub brand: String,
    pub model: String,
    pub year: i32,
}

impl SearchQuery {
    pub fn new(brand: impl Into<String>, model: impl Into<String>, year: i32) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            year,
        }
    }

    /// Query text for source A: `"brand model year"`.
    pub fn with_year(&self) -> String {
        format!("{} {} {}", self.brand, self.model, self.year)
    }

    /// Query text for source B: `"brand model"`.
    pub fn without_year(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }
}

/// A source-B item as scraped: numeric fields still string-typed.
///
/// The marketplace page layout determines the fields; the extraction
/// schema maps the item title to `title` and the attribute list to
/// `year`/`km`. Any of them may be absent on odd layouts.
#[derive(Debug, Clone, Deserialize)]
pub struct RawListing {
    #[serde(rename = "model")]
    pub title: Option<String>,
    pub price: Option<String>,
    pub year: Option<String>,
    pub km: Option<String>,
}

impl RawListing {
    /// Coerce the string-typed fields into a [`ListingRecord`].
    ///
    /// Every numeric field must be present and contain at least one
    /// digit; otherwise the whole record is skipped with a reason.
    /// Callers isolate the skip instead of aborting the batch.
    pub fn into_record(self, brand: &str) -> Result<ListingRecord, SkipReason> {
        let title = self.title.ok_or(SkipReason::MissingField("model"))?;
        let price = coerce_field("price", self.price)?;
        let year = coerce_field("year", self.year)?;
        let km = coerce_field("km", self.km)?;

        Ok(ListingRecord {
            year: Some(year as i32),
            price: Some(price),
            mileage_km: Some(km),
            brand: brand.to_string(),
            model: title,
            model_detail: None,
        })
    }
}

fn coerce_field(field: &'static str, value: Option<String>) -> Result<i64, SkipReason> {
    let value = value.ok_or(SkipReason::MissingField(field))?;
    parse_digits(&value).ok_or(SkipReason::NotNumeric {
        field,
        value,
    })
}

/// Strip every non-digit character and parse what remains.
///
/// Handles locale separators (`9.990.000`, `45.000 km`) by ignoring
/// them entirely. Returns `None` when no digits are present.
pub fn parse_digits(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}
