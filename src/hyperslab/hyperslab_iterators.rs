use std::iter::FusedIterator;

use itertools::izip;

use crate::{array::ArrayIndices, hyperslab::Hyperslab};

/// Iterates over runs of elements in a [`Hyperslab`] that are contiguous along the last axis.
///
/// Runs are visited in buffer order (block index fastest, then count index).
/// Each item is the array indices of the first element of the run and the run length.
/// For a hyperslab with rank zero there is a single run of length one.
pub struct ContiguousRunsIterator<'a> {
    hyperslab: &'a Hyperslab,
    radices: Vec<u64>,
    index: u64,
    num_runs: u64,
}

impl<'a> ContiguousRunsIterator<'a> {
    /// Create a new contiguous runs iterator.
    ///
    /// The hyperslab is assumed to be valid; components with mismatched dimensionality are truncated to the shortest.
    #[must_use]
    pub fn new(hyperslab: &'a Hyperslab) -> Self {
        // Mixed radix over [count..., block[..rank-1]...], the last radix varies fastest
        let rank = hyperslab.dimensionality();
        let radices: Vec<u64> = hyperslab
            .count()
            .iter()
            .chain(hyperslab.block().iter().take(rank.saturating_sub(1)))
            .copied()
            .collect();
        let num_runs = radices.iter().product();
        Self {
            hyperslab,
            radices,
            index: 0,
            num_runs,
        }
    }

    /// Return the length of every run.
    #[must_use]
    pub fn run_length(&self) -> u64 {
        self.hyperslab.block().last().copied().unwrap_or(1)
    }
}

impl Iterator for ContiguousRunsIterator<'_> {
    type Item = (ArrayIndices, u64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.num_runs {
            return None;
        }
        let rank = self.hyperslab.dimensionality();
        let mut digits = vec![0u64; self.radices.len()];
        let mut current = self.index;
        for (digit, &radix) in std::iter::zip(digits.iter_mut().rev(), self.radices.iter().rev()) {
            *digit = current % radix;
            current /= radix;
        }
        let (count_digits, block_digits) = digits.split_at(rank);
        let indices = izip!(
            self.hyperslab.start(),
            self.hyperslab.stride(),
            count_digits,
        )
        .enumerate()
        .map(|(axis, (&start, &stride, &count_index))| {
            let block_index = block_digits.get(axis).copied().unwrap_or(0);
            start + stride * count_index + block_index
        })
        .collect();
        self.index += 1;
        Some((indices, self.run_length()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.num_runs - self.index).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ContiguousRunsIterator<'_> {}

impl FusedIterator for ContiguousRunsIterator<'_> {}
