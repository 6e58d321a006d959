//! The Lime gateway service.
//!
//! This crate turns the resolution pipeline into a network service: the
//! JSON-RPC codec, the `Lime` service and its dispatcher, the axum HTTP
//! server and the command-line entry point.
//!
//! # Components
//!
//! - `codec`: wire envelopes, method translation and argument binding
//! - `lime`: the four exposed operations
//! - `dispatch`: routing of dispatch keys onto handlers
//! - `server`: HTTP transport
//! - `service`: assembly from configuration

pub mod cli;
pub mod codec;
pub mod dispatch;
mod error;
pub mod hashes;
pub mod lime;
pub mod server;
pub mod service;

pub use error::RpcError;
