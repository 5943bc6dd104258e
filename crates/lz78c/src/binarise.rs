use anyhow::{bail, ensure, Result};
use itertools::Itertools;
use ndarray::ArrayView1;

/// Value that splits real-valued data into the symbols `0` and `1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Threshold {
    #[default]
    Median,
    Mean,
}

impl Threshold {
    pub fn compute(&self, x: ArrayView1<f64>) -> Result<f64> {
        ensure!(!x.is_empty(), "Cannot compute a threshold of empty data");
        if x.iter().any(|v| v.is_nan()) {
            bail!("Cannot binarise data containing NaN");
        }

        Ok(match self {
            Threshold::Mean => x.sum() / x.len() as f64,
            Threshold::Median => {
                let sorted = x.iter().copied().sorted_by(|a, b| a.total_cmp(b)).collect_vec();
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
        })
    }
}

/// Converts real-valued data to a string of ASCII `0`s and `1`s: a `1`
/// wherever the value is strictly above the threshold.
pub fn binarise(x: ArrayView1<f64>, threshold: Threshold) -> Result<Vec<u8>> {
    let cutoff = threshold.compute(x)?;
    Ok(x.iter()
        .map(|&v| if v > cutoff { b'1' } else { b'0' })
        .collect_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_median_threshold() {
        let x = array![3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(Threshold::Median.compute(x.view()).unwrap(), 3.0);
        assert_eq!(binarise(x.view(), Threshold::Median).unwrap(), b"00101");

        let even = array![1.0, 2.0, 3.0, 10.0];
        assert_eq!(Threshold::Median.compute(even.view()).unwrap(), 2.5);
        assert_eq!(binarise(even.view(), Threshold::Median).unwrap(), b"0011");
    }

    #[test]
    fn test_mean_threshold() {
        let x = array![1.0, 2.0, 3.0, 10.0];
        assert_eq!(binarise(x.view(), Threshold::Mean).unwrap(), b"0001");
    }

    #[test]
    fn test_invalid_data() {
        let empty = ndarray::Array1::<f64>::zeros(0);
        assert!(binarise(empty.view(), Threshold::Median).is_err());
        let nan = array![1.0, f64::NAN];
        assert!(binarise(nan.view(), Threshold::Mean).is_err());
    }
}
