pub mod health;
pub mod progress_ws;
pub mod valuation;

pub use health::health_handler;
pub use progress_ws::progress_ws_handler;
pub use valuation::valuation_handler;
