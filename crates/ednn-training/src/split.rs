//! Seeded train/validation partitioning and batch plans.

use crate::error::{TrainingError, TrainingResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Disjoint train/validation index sets over a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub train: Vec<usize>,
    pub val: Vec<usize>,
}

impl Split {
    #[must_use]
    pub fn train_size(&self) -> usize {
        self.train.len()
    }

    #[must_use]
    pub fn val_size(&self) -> usize {
        self.val.len()
    }
}

/// `floor(fraction * len)`; the remainder goes to validation.
pub fn train_size_for(len: usize, train_fraction: f64) -> TrainingResult<usize> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(TrainingError::InvalidConfig(format!(
            "train_fraction must be in (0, 1), got {train_fraction}"
        )));
    }
    Ok(((len as f64) * train_fraction).floor() as usize)
}

/// Shuffle `0..len` with a seeded RNG and cut it at `floor(fraction * len)`.
pub fn random_split(len: usize, train_fraction: f64, seed: u64) -> TrainingResult<Split> {
    let train_size = train_size_for(len, train_fraction)?;

    let mut indices: Vec<usize> = (0..len).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let val = indices.split_off(train_size);
    Ok(Split { train: indices, val })
}

/// Batch plan over a fixed index subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLoader {
    pub indices: Vec<usize>,
    pub batch_size: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl DataLoader {
    pub fn new(indices: Vec<usize>, batch_size: usize, shuffle: bool, seed: u64) -> TrainingResult<Self> {
        if batch_size == 0 {
            return Err(TrainingError::InvalidConfig("batch_size must be >= 1".to_string()));
        }
        Ok(Self { indices, batch_size, shuffle, seed })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[must_use]
    pub fn num_batches(&self) -> usize {
        self.indices.len().div_ceil(self.batch_size)
    }

    /// Index batches for `epoch`. The last batch may be short.
    #[must_use]
    pub fn batches(&self, epoch: u32) -> Vec<Vec<usize>> {
        let mut order = self.indices.clone();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(u64::from(epoch)));
            order.shuffle(&mut rng);
        }
        order.chunks(self.batch_size).map(<[usize]>::to_vec).collect()
    }
}
