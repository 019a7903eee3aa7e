use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::reporter::{NoopReporter, Reporter};
use crate::resolver::{Resolver, RetryPolicy};
use crate::servers::DnsServer;
use crate::stats::{calculate_stats, Stats};

/// Warmup queries run with a short fixed deadline and no retries.
const WARMUP_TIMEOUT: Duration = Duration::from_secs(1);

/// Settling pauses between phases. The original runtime forced garbage
/// collection here; a fixed delay is the equivalent noise-reduction
/// heuristic without a GC.
const WARMUP_SETTLE: Duration = Duration::from_millis(50);
const SERVER_COOLDOWN: Duration = Duration::from_secs(1);

/// Per-run parameters, fixed for the duration of a run.
#[derive(Debug, Clone)]
pub struct BenchConfig {
	pub repeats: usize,
	pub lookup_timeout: Duration,
	pub max_concurrency: usize,
	pub warmup_runs: usize,
	pub retry: bool,
}

/// One server's benchmark outcome: its stats plus per-domain mean latencies.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkResult {
	pub server: DnsServer,
	pub stats: Stats,
	pub domain_mean: HashMap<String, f64>,
}

/// Run-level failures. Per-query errors never abort a run; these do (or,
/// for cancellation, cut it short while keeping finished results).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
	#[error("no servers to benchmark")]
	NoServers,
	#[error("no domains to benchmark")]
	NoDomains,
	#[error("benchmark canceled")]
	Canceled,
}

/// Benchmark every server sequentially against the full (domain x repeat)
/// query matrix.
///
/// Results are appended in the caller-supplied server order. On
/// cancellation, servers not yet started are skipped and whatever results
/// were already finalized are returned alongside [RunError::Canceled].
pub async fn run_benchmark(
	config: &BenchConfig,
	servers: &[DnsServer],
	domains: &[String],
	reporter: Option<&dyn Reporter>,
	cancel: &CancellationToken,
) -> (Vec<BenchmarkResult>, Option<RunError>) {
	if servers.is_empty() {
		return (Vec::new(), Some(RunError::NoServers));
	}
	if domains.is_empty() {
		return (Vec::new(), Some(RunError::NoDomains));
	}

	let reporter = reporter.unwrap_or(&NoopReporter);
	reporter.on_start(servers.len(), domains);

	let mut results = Vec::with_capacity(servers.len());
	let mut run_err = None;

	for (i, server) in servers.iter().enumerate() {
		if cancel.is_cancelled() {
			log::warn!("run canceled, stopping before resolver {}", server.name);
			run_err = Some(RunError::Canceled);
			break;
		}

		reporter.on_resolver_start(server, i, servers.len());
		let start = Instant::now();

		let (stats, domain_mean) =
			benchmark_resolver(config, server, domains, reporter, cancel).await;

		reporter.on_resolver_done(server, &stats, start.elapsed());
		results.push(BenchmarkResult {
			server: server.clone(),
			stats,
			domain_mean,
		});

		// cooldown between servers so one burst's leftover sockets and
		// allocation churn do not bleed into the next measurement
		if i + 1 < servers.len() {
			tokio::time::sleep(SERVER_COOLDOWN).await;
		}
	}

	reporter.on_complete(&results, run_err.as_ref());
	(results, run_err)
}

/// Benchmark a single server: optional warmup, then the full query matrix
/// under a bounded worker pool, funnelled through one collector.
async fn benchmark_resolver(
	config: &BenchConfig,
	server: &DnsServer,
	domains: &[String],
	reporter: &dyn Reporter,
	cancel: &CancellationToken,
) -> (Stats, HashMap<String, f64>) {
	let resolver = Arc::new(Resolver::new(server.addr, config.max_concurrency));
	let total = domains.len() * config.repeats;

	if config.warmup_runs > 0 {
		warmup(&resolver, domains, config.warmup_runs, cancel).await;
	}

	let retry = if config.retry {
		RetryPolicy::Enabled
	} else {
		RetryPolicy::Disabled
	};

	// pool limit caps aggregate in-flight queries for this server, on top
	// of the resolver's own limiter
	let pool = Arc::new(Semaphore::new(config.max_concurrency));
	let (tx, mut rx) = mpsc::channel(total.max(1));

	let mut handles = Vec::with_capacity(total);
	for _ in 0..config.repeats {
		for domain in domains {
			let resolver = resolver.clone();
			let pool = pool.clone();
			let tx = tx.clone();
			let cancel = cancel.clone();
			let domain = domain.clone();
			let timeout = config.lookup_timeout;

			handles.push(tokio::spawn(async move {
				let _slot = pool.acquire().await.expect("pool is never closed");
				let outcome = resolver.query(&cancel, &domain, timeout, retry).await;
				// the collector outlives every sender, so this cannot fail
				let _ = tx.send((domain, outcome)).await;
			}));
		}
	}
	drop(tx);

	// single collection point: serializes all task outcomes
	let mut latencies = Vec::with_capacity(total);
	let mut per_domain: HashMap<String, Vec<f64>> = HashMap::with_capacity(domains.len());
	let mut error_count = 0usize;
	let mut received = 0usize;

	while let Some((domain, outcome)) = rx.recv().await {
		received += 1;
		match outcome {
			Ok(latency) => {
				let latency_ms = latency.as_secs_f64() * 1000.0;
				reporter.on_query_result(server, &domain, latency_ms, None);
				latencies.push(latency_ms);
				per_domain.entry(domain).or_default().push(latency_ms);
			}
			Err(err) => {
				reporter.on_query_result(server, &domain, 0.0, Some(&err));
				error_count += 1;
			}
		}
	}

	// task panics are logged, not fatal; a query that never reported
	// counts as an implicit error so the fixed total stays accounted for
	for handle in handles {
		if let Err(err) = handle.await {
			log::warn!("query task failed resolver={} err={}", server.name, err);
		}
	}
	error_count += total - received;

	let domain_mean = per_domain
		.into_iter()
		.map(|(domain, lats)| {
			let mean = lats.iter().sum::<f64>() / lats.len() as f64;
			(domain, mean)
		})
		.collect();

	(calculate_stats(latencies, error_count, total), domain_mean)
}

/// Prime resolver and OS caches with untimed queries; outcomes are discarded.
async fn warmup(
	resolver: &Arc<Resolver>,
	domains: &[String],
	runs: usize,
	cancel: &CancellationToken,
) {
	log::debug!("warmup: {} runs per domain", runs);

	let mut handles = Vec::with_capacity(domains.len() * runs);
	for domain in domains {
		for _ in 0..runs {
			let resolver = resolver.clone();
			let cancel = cancel.clone();
			let domain = domain.clone();

			handles.push(tokio::spawn(async move {
				let _ = resolver
					.query(&cancel, &domain, WARMUP_TIMEOUT, RetryPolicy::Disabled)
					.await;
			}));
		}
	}

	for handle in handles {
		let _ = handle.await;
	}

	tokio::time::sleep(WARMUP_SETTLE).await;
}
