//! Front end for a city issue reporting desk.
//!
//! Residents file issues through [`submission`]; administrators work them
//! through the [`dashboard`] once the [`gate`] accepts their secret. Both
//! talk to the desk server through [`client::ApiClient`]. The CLI entry
//! points live in [`commands`].

pub mod client;
pub mod commands;
pub mod config;
pub mod credential;
pub mod dashboard;
pub mod error;
pub mod gate;
pub mod geo;
pub mod logging;
pub mod models;
pub mod render;
pub mod submission;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::ApiClient;
pub use config::DeskConfig;
pub use dashboard::Dashboard;
pub use error::ApiError;
pub use gate::AuthGate;
pub use transport::HttpTransport;
