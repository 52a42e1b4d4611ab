// Shared fixtures for the ml and infra test modules.

use burn::prelude::*;

use crate::domain::naming::Architecture;
use crate::ml::backbone::BackboneConfig;

pub type TestBackend = burn::backend::Autodiff<burn::backend::NdArray>;

pub fn device() -> <TestBackend as Backend>::Device {
    Default::default()
}

/// Five blocks, so tests can address both the first and a late layer.
pub fn tiny_config(architecture: Architecture) -> BackboneConfig {
    BackboneConfig::new(architecture, 96, 48, 16, 2, 5, 32)
}

pub fn input_ids<const N: usize>(rows: &[[i32; N]]) -> Tensor<TestBackend, 2, Int> {
    let flat: Vec<i32> = rows.iter().flatten().copied().collect();
    Tensor::<TestBackend, 1, Int>::from_ints(flat.as_slice(), &device())
        .reshape([rows.len(), N])
}

pub fn token_rows(ids: Tensor<TestBackend, 2, Int>) -> Vec<Vec<i64>> {
    let [_, seq_len] = ids.dims();
    let flat: Vec<i64> = ids.into_data().iter::<i64>().collect();
    flat.chunks(seq_len).map(<[i64]>::to_vec).collect()
}
