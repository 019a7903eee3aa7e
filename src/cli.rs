use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};

use crate::bench::BenchConfig;

/// Format of the final summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	Default,
	Csv,
	Table,
	Json,
}

/// Logging verbosity switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogMode {
	Default,
	Verbose,
	Disabled,
}

/// DNS benchmark tool
#[derive(Parser, Debug)]
#[command(name = "dnsbench")]
#[command(about = "Test DNS resolvers against popular websites to measure latency and reliability")]
pub struct Cli {
	/// Optional file with extra resolvers (name;ip per line)
	#[arg(short = 'f', long = "resolvers-file")]
	pub resolvers_file: Option<String>,

	/// Optional file with domains to test (one domain per line)
	#[arg(short = 's', long = "sites-file")]
	pub sites_file: Option<String>,

	/// Number of times each domain is queried
	#[arg(short = 'n', long = "repeats", default_value = "10")]
	pub repeats: usize,

	/// Timeout per DNS query in milliseconds
	#[arg(short = 't', long = "timeout-ms", default_value = "3000")]
	pub timeout_ms: u64,

	/// Maximum concurrent DNS queries per resolver
	#[arg(short = 'c', long = "concurrency", default_value_t = default_concurrency())]
	pub concurrency: usize,

	/// Number of warmup queries per resolver/domain before benchmarking
	#[arg(long = "warmup", default_value = "0")]
	pub warmup: usize,

	/// Benchmark only major DNS resolvers
	#[arg(long = "major")]
	pub major: bool,

	/// Disable per-query retries with backoff
	#[arg(long = "no-retry")]
	pub no_retry: bool,

	/// Output format: default, csv, table, or json
	#[arg(long = "output", value_enum, default_value = "default")]
	pub output: OutputFormat,

	/// Logging level: default, verbose, or disabled
	#[arg(long = "log", value_enum, default_value = "default")]
	pub log: LogMode,

	/// Path for the output CSV report
	#[arg(short = 'o', long = "report")]
	pub report: Option<String>,

	/// Path for the per-site matrix report (domain x resolver)
	#[arg(long = "matrix")]
	pub matrix: Option<String>,
}

/// Half the CPUs, floor 2.
fn default_concurrency() -> usize {
	std::thread::available_parallelism()
		.map(|n| n.get() / 2)
		.unwrap_or(2)
		.max(2)
}

impl Cli {
	/// Reject configurations the engine would misbehave on.
	pub fn validate(&self) -> Result<()> {
		if self.repeats < 1 {
			return Err(anyhow!("repeats must be at least 1"));
		}
		if self.concurrency < 1 {
			return Err(anyhow!("concurrency must be at least 1"));
		}
		if self.timeout_ms < 100 {
			return Err(anyhow!("timeout must be at least 100ms"));
		}
		Ok(())
	}

	pub fn bench_config(&self) -> BenchConfig {
		BenchConfig {
			repeats: self.repeats,
			lookup_timeout: Duration::from_millis(self.timeout_ms),
			max_concurrency: self.concurrency,
			warmup_runs: self.warmup,
			retry: !self.no_retry,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let cli = Cli::try_parse_from(["dnsbench"]).unwrap();
		assert_eq!(cli.repeats, 10);
		assert_eq!(cli.timeout_ms, 3000);
		assert_eq!(cli.warmup, 0);
		assert!(!cli.major);
		assert!(!cli.no_retry);
		assert_eq!(cli.output, OutputFormat::Default);
		assert_eq!(cli.log, LogMode::Default);
		assert!(cli.validate().is_ok());
	}

	#[test]
	fn test_validate_rejects_bad_values() {
		let cli = Cli::try_parse_from(["dnsbench", "-n", "0"]).unwrap();
		assert!(cli.validate().is_err());

		let cli = Cli::try_parse_from(["dnsbench", "-c", "0"]).unwrap();
		assert!(cli.validate().is_err());

		let cli = Cli::try_parse_from(["dnsbench", "-t", "50"]).unwrap();
		assert!(cli.validate().is_err());
	}

	#[test]
	fn test_bench_config_mapping() {
		let cli = Cli::try_parse_from([
			"dnsbench", "-n", "5", "-t", "1500", "-c", "4", "--warmup", "2", "--no-retry",
		])
		.unwrap();
		let config = cli.bench_config();
		assert_eq!(config.repeats, 5);
		assert_eq!(config.lookup_timeout, Duration::from_millis(1500));
		assert_eq!(config.max_concurrency, 4);
		assert_eq!(config.warmup_runs, 2);
		assert!(!config.retry);
	}

	#[test]
	fn test_output_and_log_flags() {
		let cli = Cli::try_parse_from(["dnsbench", "--output", "json", "--log", "verbose"])
			.unwrap();
		assert_eq!(cli.output, OutputFormat::Json);
		assert_eq!(cli.log, LogMode::Verbose);

		assert!(Cli::try_parse_from(["dnsbench", "--output", "xml"]).is_err());
	}
}
