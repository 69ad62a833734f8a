//! Binary entry point for the hcloud-builder CLI.

use std::io::{self, Write};
use std::process;
use std::sync::Arc;

use camino::Utf8Path;
use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use hcloud_builder::{
    BuildContext, BuildState, CleanupPolicy, ConfigError, ConsoleUi, HcloudClient, HcloudConfig,
    HcloudError, PipelineError, ServerConfig, Step, StepCreateServer, StepFetchServerType,
    run_steps,
};

mod cli;

use cli::{Cli, ProvisionCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("provider error: {0}")]
    Provider(#[from] HcloudError),
    #[error("build failed: {0}")]
    Build(#[from] PipelineError),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli {
        Cli::Provision(command) => provision(command).await,
    }
}

async fn provision(args: ProvisionCommand) -> Result<(), CliError> {
    let template = ServerConfig::load_template(Utf8Path::new(&args.template))?;
    let hcloud_config = HcloudConfig::load_without_cli_args()?;
    let client = HcloudClient::new(&hcloud_config)?;

    let mut ctx = BuildContext::new(
        Arc::new(client),
        Arc::new(ConsoleUi::new("hcloud")),
        template,
        args.ssh_key_id,
    );
    let mut steps: Vec<Box<dyn Step>> = vec![
        Box::new(StepFetchServerType),
        Box::new(StepCreateServer::new()),
    ];

    run_steps(&mut steps, &mut ctx, cleanup_policy(args.keep)).await?;
    report_outcome(io::stdout(), &ctx.state, args.keep);
    Ok(())
}

const fn cleanup_policy(keep: bool) -> CleanupPolicy {
    if keep {
        CleanupPolicy::OnFailure
    } else {
        CleanupPolicy::Always
    }
}

fn report_outcome(mut target: impl Write, state: &BuildState, keep: bool) {
    let Some(id) = state.server_id else {
        return;
    };
    let ip = state
        .server_ip
        .map_or_else(|| String::from("none"), |ip| ip.to_string());
    let outcome = if keep { "kept" } else { "deleted" };
    writeln!(target, "server {id} ({ip}) {outcome}").ok();
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::keep(true, CleanupPolicy::OnFailure)]
    #[case::discard(false, CleanupPolicy::Always)]
    fn keep_flag_selects_cleanup_policy(#[case] keep: bool, #[case] expected: CleanupPolicy) {
        assert_eq!(cleanup_policy(keep), expected);
    }

    #[test]
    fn outcome_names_server_and_address() {
        let mut state = BuildState::new(1);
        state.record_server(99, Some(Ipv4Addr::new(192, 0, 2, 4)));
        let mut buffer = Vec::new();

        report_outcome(&mut buffer, &state, true);

        assert_eq!(String::from_utf8_lossy(&buffer), "server 99 (192.0.2.4) kept\n");
    }

    #[test]
    fn outcome_is_silent_without_server() {
        let mut buffer = Vec::new();

        report_outcome(&mut buffer, &BuildState::new(1), false);

        assert!(buffer.is_empty());
    }

    #[test]
    fn write_error_prefixes_category() {
        let mut buffer = Vec::new();
        let err = CliError::Config(ConfigError::MissingField(String::from("server_type")));

        write_error(&mut buffer, &err);

        assert_eq!(
            String::from_utf8_lossy(&buffer),
            "configuration error: missing configuration field: server_type\n"
        );
    }
}
