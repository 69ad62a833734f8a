//! Command-line interface definitions for the `hcloud-builder` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `hcloud-builder` binary.
#[derive(Debug, Parser)]
#[command(
    name = "hcloud-builder",
    about = "Provision a Hetzner Cloud build server from a server template",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Create a build server and report its address.
    #[command(name = "provision", about = "Create a build server and report its address")]
    Provision(ProvisionCommand),
}

/// Arguments for the `hcloud-builder provision` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ProvisionCommand {
    /// Path to the JSON server template.
    #[arg(long, value_name = "PATH")]
    pub(crate) template: String,
    /// Identifier of the SSH key registered for this build.
    ///
    /// The key is always installed on the server, ahead of any keys the
    /// template names.
    #[arg(long, value_name = "ID")]
    pub(crate) ssh_key_id: i64,
    /// Keep the server after a successful build instead of deleting it.
    #[arg(long)]
    pub(crate) keep: bool,
}
