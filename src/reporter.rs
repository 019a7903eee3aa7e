use std::time::Duration;

use crate::bench::{BenchmarkResult, RunError};
use crate::resolver::QueryError;
use crate::servers::DnsServer;
use crate::stats::Stats;

/// Progress hooks fired by the orchestrator at well-defined checkpoints.
///
/// Calls come from the orchestrator's single collector, already serialized,
/// and must return promptly: the engine never waits on a reporter, so slow
/// consumers have to drop or buffer on their own side.
pub trait Reporter: Send + Sync {
	fn on_start(&self, _total_servers: usize, _domains: &[String]) {}

	fn on_resolver_start(&self, _server: &DnsServer, _index: usize, _total: usize) {}

	/// One query finished; `latency_ms` is 0.0 when `err` is set.
	fn on_query_result(
		&self,
		_server: &DnsServer,
		_domain: &str,
		_latency_ms: f64,
		_err: Option<&QueryError>,
	) {
	}

	fn on_resolver_done(&self, _server: &DnsServer, _stats: &Stats, _elapsed: Duration) {}

	fn on_complete(&self, _results: &[BenchmarkResult], _err: Option<&RunError>) {}
}

/// Used when no callbacks are needed.
pub struct NoopReporter;

impl Reporter for NoopReporter {}

/// Logs benchmark progress through the `log` facade.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
	fn on_start(&self, total_servers: usize, domains: &[String]) {
		log::info!(
			"starting benchmark resolvers={} domains={}",
			total_servers,
			domains.len(),
		);
	}

	fn on_resolver_start(&self, server: &DnsServer, index: usize, total: usize) {
		log::info!(
			"benchmarking resolver name={} addr={} [{}/{}]",
			server.name, server.addr, index + 1, total,
		);
	}

	fn on_query_result(
		&self,
		server: &DnsServer,
		domain: &str,
		latency_ms: f64,
		err: Option<&QueryError>,
	) {
		match err {
			Some(err) => log::debug!(
				"query error resolver={} domain={} err={}",
				server.name, domain, err,
			),
			None => log::debug!(
				"query ok resolver={} domain={} latency_ms={:.2}",
				server.name, domain, latency_ms,
			),
		}
	}

	fn on_resolver_done(&self, server: &DnsServer, stats: &Stats, elapsed: Duration) {
		log::info!(
			"finished resolver name={} addr={} success={}/{} took_ms={}",
			server.name, server.addr, stats.count, stats.total, elapsed.as_millis(),
		);
	}

	fn on_complete(&self, results: &[BenchmarkResult], err: Option<&RunError>) {
		match err {
			Some(err) => log::warn!(
				"benchmark finished with error results={} err={}",
				results.len(), err,
			),
			None => log::info!("benchmark completed results={}", results.len()),
		}
	}
}
