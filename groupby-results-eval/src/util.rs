use groupby_results_core::{LogFileIdentity, MeasurementRecord, ResultTable};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

pub const MACHINES: [&str; 2] = ["m1", "m2"];
pub const DISTRIBUTIONS: [&str; 2] = ["uniform", "skewed"];
/// (size_config, n_rows, n_groups)
pub const SIZE_CONFIGS: [(&str, u64, u64); 2] =
  [("8M-1K", 8_000_000, 1_000), ("1M-10", 1_000_000, 10)];
pub const NATIVE_ALGORITHMS: [&str; 2] = ["two-phase-radix", "lock-free-hash-table"];
pub const ENGINE_ALGORITHMS: [&str; 2] = ["duckdb", "polars"];
pub const THREAD_COUNTS: [u32; 4] = [1, 2, 4, 8];

/// Share of `aggregation_time` spent in each phase of a native algorithm.
const PHASE_SHARES: [f64; 4] = [0.1, 0.4, 0.3, 0.2];

/// A synthetic experiment with the shape of a real sweep. Seeded, so equal arguments give equal
/// tables.
pub fn gen_experiment(exp_id: &str, trials: u32) -> ResultTable {
  gen_experiment_with(&mut SmallRng::seed_from_u64(511), exp_id, trials)
}

/// Every machine, distribution and size runs every algorithm at every thread count, plus one
/// single-thread `sequential` reference per configuration. Latency scales with `n_rows` and
/// shrinks sublinearly with threads; each trial carries ~5% of normal noise.
pub fn gen_experiment_with<R: Rng>(rng: &mut R, exp_id: &str, trials: u32) -> ResultTable {
  let mut builder = ResultTable::builder(exp_id);

  for machine in MACHINES {
    for distribution in DISTRIBUTIONS {
      for (size_config, n_rows, n_groups) in SIZE_CONFIGS {
        let identity = |algorithm: &str, thread_count: u32| LogFileIdentity {
          machine_id: machine.to_string(),
          distribution: distribution.to_string(),
          size_config: size_config.to_string(),
          n_rows,
          n_groups,
          algorithm: algorithm.to_string(),
          thread_count,
        };
        let base = n_rows as f64 / 100_000.0;

        builder.append(gen_native(rng, exp_id, identity("sequential", 1), base, trials));
        for algorithm in NATIVE_ALGORITHMS {
          for np in THREAD_COUNTS {
            let latency = base / (np as f64).powf(0.8);
            builder.append(gen_native(rng, exp_id, identity(algorithm, np), latency, trials));
          }
        }
        for algorithm in ENGINE_ALGORITHMS {
          for np in THREAD_COUNTS {
            let latency = 1.5 * base / (np as f64).powf(0.6);
            builder.append(gen_engine(rng, exp_id, identity(algorithm, np), latency, trials));
          }
        }
      }
    }
  }

  builder.finish()
}

fn noisy<R: Rng>(rng: &mut R, mean: f64) -> f64 {
  let noise: f64 = StandardNormal.sample(rng);
  mean * (1.0 + 0.05 * noise).max(0.5)
}

fn record(
  exp_id: &str,
  identity: &LogFileIdentity,
  trial_id: u32,
  attribute: &str,
  value: f64,
) -> MeasurementRecord {
  MeasurementRecord {
    exp_id: exp_id.to_string(),
    identity: identity.clone(),
    trial_id,
    attribute: attribute.to_string(),
    value,
  }
}

fn gen_native<R: Rng>(
  rng: &mut R,
  exp_id: &str,
  identity: LogFileIdentity,
  latency: f64,
  trials: u32,
) -> Vec<MeasurementRecord> {
  let mut records = vec![];
  for trial_id in 0..trials {
    let aggregation_time = noisy(rng, latency);
    for (phase, share) in PHASE_SHARES.iter().enumerate() {
      let attribute = format!("phase_{phase}");
      records.push(record(exp_id, &identity, trial_id, &attribute, aggregation_time * share));
    }
    records.push(record(exp_id, &identity, trial_id, "aggregation_time", aggregation_time));
    let load_time = noisy(rng, latency * 0.25);
    records.push(record(exp_id, &identity, trial_id, "elapsed_time", aggregation_time + load_time));
  }
  records
}

fn gen_engine<R: Rng>(
  rng: &mut R,
  exp_id: &str,
  identity: LogFileIdentity,
  latency: f64,
  trials: u32,
) -> Vec<MeasurementRecord> {
  (0..trials)
    .map(|trial_id| record(exp_id, &identity, trial_id, "elapsed_time", noisy(rng, latency)))
    .collect()
}
