use anyhow::{ensure, Result};
use bytes::{Buf, BufMut, Bytes};
use itertools::Itertools;
use ndarray::Array1;
use std::{
    fs::File,
    io::{Read, Write},
};

pub trait ToFromBytes {
    fn to_bytes(&self) -> Result<Vec<u8>>;
    fn from_bytes(bytes: &mut Bytes) -> Result<Self>
    where
        Self: Sized;

    fn save_to_file(&self, path: &str) -> Result<()> {
        let bytes = self.to_bytes()?;

        let mut file = File::create(path)?;
        file.write_all(&bytes)?;

        Ok(())
    }

    fn from_file(path: &str) -> Result<Self>
    where
        Self: Sized,
    {
        let mut file = File::open(path)?;
        let mut bytes: Vec<u8> = Vec::new();
        file.read_to_end(&mut bytes)?;
        let mut bytes: Bytes = bytes.into();
        Self::from_bytes(&mut bytes)
    }
}

/// Reads a u64 length prefix and checks that `elem_size` bytes per element
/// are actually available.
pub(crate) fn get_len_prefix(bytes: &mut Bytes, elem_size: usize) -> Result<usize> {
    ensure!(bytes.remaining() >= 8, "Unexpected end of data reading length");
    let n = bytes.get_u64_le() as usize;
    ensure!(
        n.checked_mul(elem_size)
            .is_some_and(|len| len <= bytes.remaining()),
        "Length prefix {n} exceeds the remaining {} bytes",
        bytes.remaining()
    );
    Ok(n)
}

impl ToFromBytes for Vec<u64> {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(8 * (self.len() + 1));
        bytes.put_u64_le(self.len() as u64);
        for &val in self.iter() {
            bytes.put_u64_le(val);
        }

        Ok(bytes)
    }

    fn from_bytes(bytes: &mut Bytes) -> Result<Self>
    where
        Self: Sized,
    {
        let n = get_len_prefix(bytes, 8)?;
        Ok((0..n).map(|_| bytes.get_u64_le()).collect_vec())
    }
}

impl ToFromBytes for Array1<f64> {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(8 * (self.len() + 1));
        bytes.put_u64_le(self.len() as u64);
        for &val in self.iter() {
            bytes.put_f64_le(val);
        }

        Ok(bytes)
    }

    fn from_bytes(bytes: &mut Bytes) -> Result<Self>
    where
        Self: Sized,
    {
        let n = get_len_prefix(bytes, 8)?;
        Ok(Array1::from_iter((0..n).map(|_| bytes.get_f64_le())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_counts_to_from_bytes() {
        let counts: Vec<u64> = vec![1, 1, 2, 3, 3, 3, 4];
        let mut bytes: Bytes = counts.to_bytes().unwrap().into();
        assert_eq!(Vec::<u64>::from_bytes(&mut bytes).unwrap(), counts);
        assert_eq!(bytes.remaining(), 0);
    }

    #[test]
    fn test_truncated_data_is_rejected() {
        let counts: Vec<u64> = vec![5, 6, 7];
        let mut raw = counts.to_bytes().unwrap();
        raw.truncate(raw.len() - 3);
        let mut bytes: Bytes = raw.into();
        assert!(Vec::<u64>::from_bytes(&mut bytes).is_err());

        let mut empty = Bytes::new();
        assert!(Array1::<f64>::from_bytes(&mut empty).is_err());
    }
}
