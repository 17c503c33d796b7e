#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod client;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

pub use client::{ApiClient, ApiClientBuilder, RequestBuilder};
pub use error::{ApiError, Result};
