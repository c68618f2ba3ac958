//! Polling engine for CGH Monitor.
//!
//! This crate provides:
//! - [`DataFetcher`]: one request to the backend per call, no retries
//! - [`HttpFetcher`]: the JSON-over-HTTP implementation
//! - [`PollingSession`]: poll state, refresh cadence, and start/stop control
//!
//! # Usage
//!
//! ```ignore
//! use cgh_common::{MonitorConfig, Registry};
//! use cgh_poller::{HttpFetcher, PollingSession};
//!
//! let config = MonitorConfig::default();
//! let fetcher = HttpFetcher::new(&config.backend)?;
//! let session = PollingSession::spawn(
//!     config.selection.clone(),
//!     Registry::builtin(),
//!     fetcher,
//!     config.polling.clone(),
//! );
//!
//! session.fetch_now().await;
//! println!("{:?}", session.state().snapshot);
//! ```

mod fetcher;
mod session;

pub use fetcher::*;
pub use session::*;
