mod bench;
mod cli;
mod domains;
mod output;
mod reporter;
mod resolver;
mod retry;
mod servers;
mod stats;

use clap::Parser;
use log::LevelFilter;
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, LogMode};
use crate::reporter::ConsoleReporter;

fn init_logging(mode: LogMode) {
	let level = match mode {
		LogMode::Default => LevelFilter::Info,
		LogMode::Verbose => LevelFilter::Debug,
		LogMode::Disabled => LevelFilter::Off,
	};
	env_logger::Builder::new()
		.filter_level(level)
		.parse_default_env()
		.init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	cli.validate()?;
	init_logging(cli.log);

	let servers = servers::load_servers(cli.resolvers_file.as_deref(), cli.major)?;
	let domains = domains::load_domains(cli.sites_file.as_deref())?;
	let config = cli.bench_config();

	log::info!(
		"benchmark starting servers={} domains={} repeats={} timeout={:?} concurrency={}",
		servers.len(),
		domains.len(),
		config.repeats,
		config.lookup_timeout,
		config.max_concurrency,
	);

	// First Ctrl-C cancels the run gracefully, partial results still print.
	let cancel = CancellationToken::new();
	let ctrlc_cancel = cancel.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			log::warn!("interrupt received, finishing current queries");
			ctrlc_cancel.cancel();
		}
	});

	let reporter = ConsoleReporter;
	let (results, run_err) =
		bench::run_benchmark(&config, &servers, &domains, Some(&reporter), &cancel).await;

	output::print_summary(&results, cli.output)?;

	if let Some(path) = &cli.report {
		output::write_report(path, &results)?;
	}
	if let Some(path) = &cli.matrix {
		output::write_matrix_report(path, &results, &domains)?;
	}

	if let Some(err) = run_err {
		return Err(err.into());
	}
	Ok(())
}
