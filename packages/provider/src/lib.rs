// Library root. Exposes the provider internals to the integration tests in `tests/`.
// Production entry point remains `src/main.rs`.

pub mod api;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod resources;
pub mod services;

pub mod cli;
pub mod config;
pub mod logging;
