//! Sweep - Container Registry Tag Retention Library
//!
//! Sweep deletes old image tags from a regional container registry according
//! to a retention policy: a grace period, a number of tags to keep per image,
//! a tag name pattern and a set of tag statuses to leave alone.
//!
//! # Quick Start
//!
//! ```no_run
//! use libsweep::{Credentials, RetentionPolicy, Sweeper};
//! use libsweep::retention::parse_grace;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sweeper = Sweeper::builder()
//!         .with_credentials(Credentials::Token("secret".to_string()))
//!         .build()?;
//!
//!     let policy = RetentionPolicy::new()
//!         .with_grace(parse_grace("48hr")?)
//!         .with_keep(3);
//!
//!     // Preview
//!     let plan = sweeper.plan("my-team", &policy).await?;
//!     for tag in plan.tags() {
//!         println!("{}", tag.reference());
//!     }
//!
//!     // Delete
//!     let report = sweeper.execute(&plan).await;
//!     println!("{} deleted", report.deleted.len());
//!     Ok(())
//! }
//! ```
//!
//! # Main Types
//!
//! - [`Sweeper`] - Main entry point: plan and execute sweeps
//! - [`SweeperBuilder`] - Builder for advanced configuration
//! - [`RetentionPolicy`] - What to delete
//! - [`Plan`] - Tags selected for deletion in one namespace
//! - [`DeleteReport`] - Outcome of executing a plan
//!
//! # Architecture
//!
//! - **High-level API** ([`Sweeper`]) - Recommended for most users
//! - **Low-level modules** - The resilient transport, the typed registry
//!   client, the concurrent fetch, the retention engine and the bulk delete,
//!   hidden from docs but public for fine-grained control

#![warn(clippy::all)]

/// Returns the libsweep crate version.
///
/// # Examples
///
/// ```
/// let version = libsweep::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// High-level public API (main entry point)
mod sweeper;
pub use sweeper::{Plan, Sweeper, SweeperBuilder};

// Re-export commonly used types for convenience
pub use client::{Credentials, Region};
pub use config::Config;
pub use delete::DeleteReport;
pub use error::{Result, SweepError};
pub use models::{ImageRef, TagStatus};
pub use retention::RetentionPolicy;

// Low-level implementation modules (hidden from docs but still public)
#[doc(hidden)]
pub mod client;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod delete;
#[doc(hidden)]
pub mod error;
#[doc(hidden)]
pub mod fetch;
#[doc(hidden)]
pub mod format;
#[doc(hidden)]
pub mod models;
#[doc(hidden)]
pub mod retention;
#[doc(hidden)]
pub mod transport;
