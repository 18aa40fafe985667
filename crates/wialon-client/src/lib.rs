//! Wialon Remote API Client Library
//!
//! Provides an authenticated session for the Wialon Remote API together with
//! typed helpers for units, geofences ("areas") and interval message loading.
//!
//! # Example
//!
//! ```rust,no_run
//! use wialon_client::{IntervalQuery, Session};
//!
//! #[tokio::main]
//! async fn main() -> wialon_client::Result<()> {
//!     let mut session = Session::builder("access-token").open().await?;
//!
//!     // List units
//!     let units = session.load_units(None).await?;
//!
//!     // Count a day of messages for the first one
//!     let query = IntervalQuery::new(units[0].id, 1_600_000_000, 1_600_086_400);
//!     let count = session.count_messages(&query).await?;
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Geofences
//!
//! ```rust,ignore
//! let areas = session.load_areas().await?;
//! for area in &areas {
//!     if area.is_circle() && area.contains(53.9, 27.56)? {
//!         println!("inside {}", area);
//!     }
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module provides a scripted API endpoint for integration tests:
//!
//! ```rust,ignore
//! use wialon_client::testing::{MockApi, TestServer};
//!
//! let api = MockApi::new().with_login("S1", "alice", 42);
//! let server = TestServer::start(api.router()).await?;
//! let session = server.open_session("token").await?;
//! ```

pub mod areas;
mod client;
pub mod codes;
mod config;
pub mod dump;
mod error;
pub mod flags;
pub mod geodesy;
pub mod messages;
pub mod testing;
mod types;
mod units;

pub use client::{Session, SessionBuilder, SessionState};
pub use config::{SessionConfig, SessionConfigBuilder, DEFAULT_API_HOST, DEFAULT_API_PATH};
pub use error::{ApiError, Result, WialonError};
pub use types::*;

// Re-export frequently used types for convenience
pub use areas::{Area, AreaType, Shape};
pub use codes::{ErrorCode, ErrorKind};
pub use dump::{DirectorySink, Exchange, ResponseSink};
pub use flags::{join, AreaFlag, Flag, MessageFlag, ResourceFlag, UnitFlag};
pub use geodesy::{distance, Point};
pub use messages::{IntervalQuery, Timestamp};
