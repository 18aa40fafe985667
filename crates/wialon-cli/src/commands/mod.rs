//! Command implementations for wialon-query
//!
//! Every command runs inside [`wialon_client::Session::scoped`], so the
//! server session is closed whatever the outcome.

pub mod areas;
pub mod messages;
pub mod query;
pub mod units;

pub use areas::areas;
pub use messages::{count, messages, parse_time};
pub use query::query;
pub use units::units;
