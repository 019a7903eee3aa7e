use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use hickory_resolver::config::{NameServerConfig, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{ResolveError, TokioResolver};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::retry::{retry_with_backoff, RetryError};

const DNS_PORT: u16 = 53;

/// Retry budget when retries are enabled: up to 10 attempts, backoff
/// growing from 2s to 60s.
const MAX_ATTEMPTS: u32 = 10;
const INITIAL_BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Queries slower than this are logged at debug level.
const SLOW_QUERY_THRESHOLD: Duration = Duration::from_millis(200);

/// Whether a failed query is re-attempted with backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
	Enabled,
	Disabled,
}

/// Why a single DNS query failed.
#[derive(Debug, Error)]
pub enum QueryError {
	#[error("empty domain name")]
	EmptyDomain,
	#[error("invalid retry configuration")]
	InvalidRetryConfig,
	#[error("DNS query timeout for {domain} via {server}")]
	Timeout { domain: String, server: IpAddr },
	#[error("no addresses found for domain {domain} by resolver {server}")]
	NoAddresses { domain: String, server: IpAddr },
	#[error("DNS query failed for {domain} via {server}: {source}")]
	Lookup {
		domain: String,
		server: IpAddr,
		#[source]
		source: ResolveError,
	},
	#[error("query canceled")]
	Canceled,
}

impl QueryError {
	pub fn is_timeout(&self) -> bool {
		matches!(self, QueryError::Timeout { .. })
	}

	pub fn is_canceled(&self) -> bool {
		matches!(self, QueryError::Canceled)
	}
}

/// Issues DNS lookups against one server over UDP.
///
/// Owns its concurrency limiter, so in-flight query caps apply per server
/// rather than globally.
pub struct Resolver {
	inner: TokioResolver,
	server_addr: IpAddr,
	limiter: Option<Semaphore>,
}

impl Resolver {
	/// Build a resolver pinned to `server_addr`, limited to `concurrency`
	/// simultaneous in-flight queries (0 disables the limiter).
	pub fn new(server_addr: IpAddr, concurrency: usize) -> Resolver {
		let mut config = ResolverConfig::new();
		config.add_name_server(NameServerConfig::new(
			SocketAddr::new(server_addr, DNS_PORT),
			Protocol::Udp,
		));

		let mut opts = ResolverOpts::default();
		// per-attempt deadlines and retries are enforced here, not by hickory
		opts.timeout = Duration::from_secs(60);
		opts.attempts = 0;
		// a cached answer would make repeat measurements meaningless
		opts.cache_size = 0;

		let inner = TokioResolver::builder_with_config(
			config,
			TokioConnectionProvider::default(),
		)
		.with_options(opts)
		.build();

		Resolver {
			inner,
			server_addr,
			limiter: if concurrency >= 1 {
				Some(Semaphore::new(concurrency))
			} else {
				None
			},
		}
	}

	/// Resolve `domain` once, with a per-attempt deadline of `timeout`.
	///
	/// Returns the wall-clock time the successful lookup took. Holds a
	/// limiter permit for the whole call; the permit is released on every
	/// exit path when it drops.
	pub async fn query(
		&self,
		cancel: &CancellationToken,
		domain: &str,
		timeout: Duration,
		retry: RetryPolicy,
	) -> Result<Duration, QueryError> {
		if domain.is_empty() {
			return Err(QueryError::EmptyDomain);
		}

		let _permit = match &self.limiter {
			Some(limiter) => tokio::select! {
				_ = cancel.cancelled() => return Err(QueryError::Canceled),
				permit = limiter.acquire() => Some(permit.expect("limiter is never closed")),
			},
			None => None,
		};

		let max_retries = match retry {
			RetryPolicy::Enabled => MAX_ATTEMPTS,
			RetryPolicy::Disabled => 1,
		};

		retry_with_backoff(
			cancel,
			|attempt| self.attempt(cancel, domain, timeout, attempt),
			max_retries,
			INITIAL_BACKOFF,
			MAX_BACKOFF,
		)
		.await
		.map_err(|err| match err {
			RetryError::Canceled => QueryError::Canceled,
			RetryError::Operation(query_err) => query_err,
			RetryError::InvalidMaxRetries => QueryError::InvalidRetryConfig,
		})
	}

	/// One lookup attempt with its own deadline.
	async fn attempt(
		&self,
		cancel: &CancellationToken,
		domain: &str,
		timeout: Duration,
		attempt: u32,
	) -> Result<Duration, QueryError> {
		if attempt > 0 {
			log::debug!(
				"retrying query domain={} resolver={} attempt={}",
				domain, self.server_addr, attempt,
			);
		}

		let start = Instant::now();
		let outcome = tokio::select! {
			_ = cancel.cancelled() => return Err(QueryError::Canceled),
			res = tokio::time::timeout(timeout, self.inner.lookup_ip(domain)) => res,
		};
		let took = start.elapsed();

		let lookup = match outcome {
			Err(_elapsed) => {
				log::debug!(
					"query deadline exceeded domain={} resolver={} took_ms={}",
					domain, self.server_addr, took.as_millis(),
				);
				return Err(QueryError::Timeout {
					domain: domain.to_string(),
					server: self.server_addr,
				});
			}
			Ok(Err(err)) => {
				log::debug!(
					"query failed domain={} resolver={} err={}",
					domain, self.server_addr, err,
				);
				return Err(QueryError::Lookup {
					domain: domain.to_string(),
					server: self.server_addr,
					source: err,
				});
			}
			Ok(Ok(lookup)) => lookup,
		};

		// a lookup that returned but blew its budget still counts as a timeout
		if took > timeout {
			log::debug!(
				"query exceeded timeout domain={} resolver={} took_ms={}",
				domain, self.server_addr, took.as_millis(),
			);
			return Err(QueryError::Timeout {
				domain: domain.to_string(),
				server: self.server_addr,
			});
		}

		if lookup.iter().next().is_none() {
			log::debug!(
				"no addresses found domain={} resolver={}",
				domain, self.server_addr,
			);
			return Err(QueryError::NoAddresses {
				domain: domain.to_string(),
				server: self.server_addr,
			});
		}

		if took > SLOW_QUERY_THRESHOLD {
			log::debug!(
				"slow query domain={} resolver={} took_ms={}",
				domain, self.server_addr, took.as_millis(),
			);
		}

		Ok(took)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_empty_domain_fails_fast() {
		let resolver = Resolver::new("8.8.8.8".parse().unwrap(), 1);
		let cancel = CancellationToken::new();

		let start = Instant::now();
		let result = resolver
			.query(&cancel, "", Duration::from_secs(2), RetryPolicy::Disabled)
			.await;

		assert!(matches!(result, Err(QueryError::EmptyDomain)));
		// rejected before any network work
		assert!(start.elapsed() < Duration::from_millis(100));
	}

	#[tokio::test]
	async fn test_canceled_before_query() {
		let resolver = Resolver::new("8.8.8.8".parse().unwrap(), 1);
		let cancel = CancellationToken::new();
		cancel.cancel();

		let result = resolver
			.query(&cancel, "google.com", Duration::from_secs(2), RetryPolicy::Enabled)
			.await;

		assert!(matches!(result, Err(QueryError::Canceled)));
	}

	#[tokio::test]
	async fn test_limiter_scoped_to_concurrency() {
		let limited = Resolver::new("8.8.8.8".parse().unwrap(), 4);
		assert_eq!(limited.limiter.as_ref().map(|l| l.available_permits()), Some(4));

		let unlimited = Resolver::new("8.8.8.8".parse().unwrap(), 0);
		assert!(unlimited.limiter.is_none());
	}

	#[test]
	fn test_error_classification() {
		let timeout = QueryError::Timeout {
			domain: "example.com".to_string(),
			server: "1.1.1.1".parse().unwrap(),
		};
		assert!(timeout.is_timeout());
		assert!(!timeout.is_canceled());
		// both domain and server end up in the message for diagnosability
		let msg = timeout.to_string();
		assert!(msg.contains("example.com"));
		assert!(msg.contains("1.1.1.1"));

		assert!(QueryError::Canceled.is_canceled());
		assert!(!QueryError::EmptyDomain.is_timeout());
	}
}
