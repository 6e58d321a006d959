//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lime-gateway")]
#[command(about = "JSON-RPC gateway resolving Ethereum transactions", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
	/// Path to configuration file (TOML, JSON or YAML)
	#[arg(short, long, value_name = "FILE", env = "LIME_CONFIG", default_value = "config/lime.toml")]
	pub config: PathBuf,

	/// Log level override (trace, debug, info, warn, error)
	#[arg(long, env = "LIME_LOG_LEVEL")]
	pub log_level: Option<String>,

	#[command(subcommand)]
	pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
	/// Start the gateway
	Start,
	/// Validate the configuration file
	Validate,
}
