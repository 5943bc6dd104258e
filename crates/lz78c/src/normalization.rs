//! Normalization of LZ78 complexity against random sequences.
//!
//! The complexity of a sequence grows with its length and alphabet size, so
//! raw counts are hard to compare. Dividing by the mean complexity of
//! uniformly random sequences of the same length and alphabet gives a ratio
//! that is close to 1 for random-looking data and smaller for structured
//! data. The means are estimated by simulation: since the running complexity
//! of one random sequence of length `n_max` gives the complexity of each of
//! its prefixes, a single batch of samples fills in every length at once.

use anyhow::{ensure, Result};
use bytes::{Buf, BufMut, Bytes};
use itertools::Itertools;
use ndarray::Array1;
use ndarray_stats::QuantileExt;
use rand::{distributions::Uniform, prelude::Distribution, rngs::StdRng, SeedableRng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{complexity::running_lz78_complexity, error::ComplexityError, storage::ToFromBytes};

/// Number of distinct symbols in `input`
pub fn alphabet_size(input: &[u8]) -> u32 {
    input.iter().unique().count() as u32
}

/// Running sums over samples, one entry per sequence length
#[derive(Debug, Clone)]
struct Moments {
    sum: Array1<f64>,
    sum_sq: Array1<f64>,
    max: Array1<f64>,
}

impl Moments {
    fn zeros(n: usize) -> Self {
        Self {
            sum: Array1::zeros(n),
            sum_sq: Array1::zeros(n),
            max: Array1::zeros(n),
        }
    }

    fn from_running(running: Vec<u64>) -> Self {
        let c = Array1::from_iter(running.into_iter().map(|c| c as f64));
        Self {
            sum_sq: &c * &c,
            max: c.clone(),
            sum: c,
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.sum += &other.sum;
        self.sum_sq += &other.sum_sq;
        self.max.zip_mut_with(&other.max, |a, &b| *a = a.max(b));
        self
    }
}

/// Statistics of the LZ78 complexity of uniformly random sequences over an
/// alphabet of `alphabet_size` symbols, for every length from 1 to `n_max`.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomComplexityTable {
    alphabet_size: u32,
    samples: u64,
    /// `mean[n - 1]` is the mean complexity at length `n`
    mean: Array1<f64>,
    variance: Array1<f64>,
    max: Array1<f64>,
}

impl RandomComplexityTable {
    /// Simulates `samples` random sequences of length `n_max` in parallel.
    /// Sample `i` is drawn from a generator seeded with `seed + i`, so the
    /// table only depends on the arguments.
    pub fn simulate(n_max: usize, alphabet_size: u32, samples: u64, seed: u64) -> Result<Self> {
        ensure!(n_max >= 1, "Sequence length must be positive");
        ensure!(
            (2..=256).contains(&alphabet_size),
            "Alphabet size must be between 2 and 256, got {alphabet_size}"
        );
        ensure!(samples >= 1, "Need at least one sample");

        let moments = (0..samples)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i));
                let seq = Uniform::new(0, alphabet_size)
                    .sample_iter(&mut rng)
                    .take(n_max)
                    .map(|sym| sym as u8)
                    .collect_vec();
                running_lz78_complexity(&seq).map(Moments::from_running)
            })
            .try_reduce(|| Moments::zeros(n_max), |a, b| Ok::<_, ComplexityError>(a.merge(b)))?;

        let n = samples as f64;
        let mean = &moments.sum / n;
        let variance = if samples > 1 {
            (&moments.sum_sq - &(&mean * &mean * n)) / (n - 1.0)
        } else {
            Array1::zeros(n_max)
        };

        Ok(Self {
            alphabet_size,
            samples,
            mean,
            variance: variance.mapv(|v| v.max(0.0)),
            max: moments.max,
        })
    }

    /// Longest sequence length covered by the table
    pub fn n_max(&self) -> usize {
        self.mean.len()
    }

    pub fn alphabet_size(&self) -> u32 {
        self.alphabet_size
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    fn lookup(values: &Array1<f64>, n: usize) -> Option<f64> {
        n.checked_sub(1).and_then(|idx| values.get(idx)).copied()
    }

    /// Mean complexity of random sequences of length `n`, if covered
    pub fn mean(&self, n: usize) -> Option<f64> {
        Self::lookup(&self.mean, n)
    }

    pub fn variance(&self, n: usize) -> Option<f64> {
        Self::lookup(&self.variance, n)
    }

    pub fn max(&self, n: usize) -> Option<f64> {
        Self::lookup(&self.max, n)
    }

    /// Largest complexity seen in any sample at any length
    pub fn max_observed(&self) -> Option<f64> {
        self.max.max().ok().copied()
    }

    /// Complexity `c` of a length-`n` sequence divided by the random mean.
    /// `None` if `n` is outside the table.
    pub fn normalize(&self, c: u64, n: usize) -> Option<f64> {
        self.mean(n).map(|mean| c as f64 / mean)
    }

    /// Normalizes a running complexity; entry `i` is the complexity of the
    /// length-`i + 1` prefix. Lengths beyond the table give NaN.
    pub fn normalize_running(&self, running: &[u64]) -> Array1<f64> {
        Array1::from_iter(
            running
                .iter()
                .enumerate()
                .map(|(i, &c)| self.normalize(c, i + 1).unwrap_or(f64::NAN)),
        )
    }
}

impl ToFromBytes for RandomComplexityTable {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        bytes.put_u32_le(self.alphabet_size);
        bytes.put_u64_le(self.samples);
        bytes.extend(self.mean.to_bytes()?);
        bytes.extend(self.variance.to_bytes()?);
        bytes.extend(self.max.to_bytes()?);

        Ok(bytes)
    }

    fn from_bytes(bytes: &mut Bytes) -> Result<Self>
    where
        Self: Sized,
    {
        ensure!(bytes.remaining() >= 12, "Could not decode RandomComplexityTable");
        let alphabet_size = bytes.get_u32_le();
        let samples = bytes.get_u64_le();
        let mean = Array1::<f64>::from_bytes(bytes)?;
        let variance = Array1::<f64>::from_bytes(bytes)?;
        let max = Array1::<f64>::from_bytes(bytes)?;
        ensure!(
            variance.len() == mean.len() && max.len() == mean.len(),
            "Mismatched statistic lengths in RandomComplexityTable"
        );

        Ok(Self {
            alphabet_size,
            samples,
            mean,
            variance,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_size() {
        assert_eq!(alphabet_size(b"000101"), 2);
        assert_eq!(alphabet_size(b""), 0);
        assert_eq!(alphabet_size(b"abcabcd"), 4);
    }

    #[test]
    fn test_short_lengths_are_exact() {
        // Every length-1 sequence has complexity 1, every length-2 binary
        // sequence has complexity 1 ("00", "11") or 2 ("01", "10")
        let table = RandomComplexityTable::simulate(20, 2, 200, 7).unwrap();
        assert_eq!(table.n_max(), 20);
        assert_eq!(table.mean(1), Some(1.0));
        assert_eq!(table.variance(1), Some(0.0));
        let mean2 = table.mean(2).unwrap();
        assert!((1.0..=2.0).contains(&mean2));
        assert_eq!(table.max(2), Some(2.0));
        assert_eq!(table.mean(0), None);
        assert_eq!(table.mean(21), None);
    }

    #[test]
    fn test_means_are_non_decreasing() {
        let table = RandomComplexityTable::simulate(100, 4, 50, 1).unwrap();
        for n in 1..100 {
            assert!(table.mean(n).unwrap() <= table.mean(n + 1).unwrap());
            assert!(table.mean(n).unwrap() <= table.max(n).unwrap());
        }
        assert!(table.max_observed().unwrap() <= 100.0);
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let a = RandomComplexityTable::simulate(64, 3, 16, 42).unwrap();
        let b = RandomComplexityTable::simulate(64, 3, 16, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize() {
        let table = RandomComplexityTable::simulate(10, 2, 10, 0).unwrap();
        let mean = table.mean(10).unwrap();
        assert_eq!(table.normalize(5, 10), Some(5.0 / mean));
        assert_eq!(table.normalize(5, 11), None);

        let normalized = table.normalize_running(&vec![1; 12]);
        assert_eq!(normalized.len(), 12);
        assert_eq!(normalized[0], 1.0);
        assert!(normalized[10].is_nan() && normalized[11].is_nan());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(RandomComplexityTable::simulate(0, 2, 10, 0).is_err());
        assert!(RandomComplexityTable::simulate(10, 1, 10, 0).is_err());
        assert!(RandomComplexityTable::simulate(10, 257, 10, 0).is_err());
        assert!(RandomComplexityTable::simulate(10, 2, 0, 0).is_err());
    }

    #[test]
    fn test_table_to_from_bytes() {
        let table = RandomComplexityTable::simulate(32, 2, 8, 3).unwrap();
        let mut bytes: Bytes = table.to_bytes().unwrap().into();
        assert_eq!(RandomComplexityTable::from_bytes(&mut bytes).unwrap(), table);
    }
}
