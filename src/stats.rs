use serde::Serialize;

/// Latency statistics for one resolver over a full benchmark pass.
///
/// All latencies are in milliseconds. `count + errors` accounts for every
/// query of the fixed `total = domains * repeats` matrix.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
	pub min: f64,
	pub max: f64,
	pub mean: f64,
	pub median: f64,
	pub count: usize,
	pub errors: usize,
	pub total: usize,
}

impl Stats {
	/// True if the stats contain at least one measured latency.
	pub fn is_valid(&self) -> bool {
		self.count > 0 && !self.mean.is_nan()
	}

	/// Fraction of queries that succeeded, 0.0 when nothing was attempted.
	pub fn success_rate(&self) -> f64 {
		if self.total == 0 {
			return 0.0;
		}
		self.count as f64 / self.total as f64
	}
}

/// Reduce a batch of latency samples plus error/total counts into [Stats].
///
/// An empty batch yields NaN for min/max/mean/median and `count == 0`, so an
/// all-failed resolver is still distinguishable from one that was never
/// tested.
pub fn calculate_stats(mut latencies: Vec<f64>, errors: usize, total: usize) -> Stats {
	if latencies.is_empty() {
		return Stats {
			min: f64::NAN,
			max: f64::NAN,
			mean: f64::NAN,
			median: f64::NAN,
			count: 0,
			errors,
			total,
		};
	}

	latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

	let n = latencies.len();
	let sum: f64 = latencies.iter().sum();

	let median = if n % 2 == 0 && n > 1 {
		(latencies[n / 2 - 1] + latencies[n / 2]) / 2.0
	} else {
		latencies[n / 2]
	};

	Stats {
		min: latencies[0],
		max: latencies[n - 1],
		mean: sum / n as f64,
		median,
		count: n,
		errors,
		total,
	}
}
