//! Source adapters for the two marketplace data origins.

pub mod chileautos;
pub mod mercadolibre;

pub use chileautos::ChileautosSource;
pub use mercadolibre::MercadolibreSource;
