//! End-to-end tests for CGH Monitor.

mod common;
mod config_test;
mod dashboard_test;
mod polling_test;
mod soak_test;
