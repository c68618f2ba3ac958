#![doc = "Common types shared across the CGH Monitor workspace."]

pub mod config;
pub mod descriptor;
pub mod error;
pub mod iec_types;
pub mod panels;
pub mod registry;
pub mod snapshot;
pub mod state;
pub mod status;

pub use config::*;
pub use descriptor::*;
pub use error::*;
pub use iec_types::*;
pub use panels::*;
pub use registry::*;
pub use snapshot::*;
pub use state::*;
pub use status::*;
