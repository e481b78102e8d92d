// ============================================================
// Layer 5 — Compute Context
// ============================================================
// The device and seed a training run works with, passed around
// explicitly. Creating a context seeds the backend RNG so that
// parameter initialisation is reproducible.

use burn::prelude::*;

#[derive(Debug, Clone)]
pub struct ComputeContext<B: Backend> {
    device: B::Device,
    seed:   u64,
}

impl<B: Backend> ComputeContext<B> {
    pub fn new(device: B::Device, seed: u64) -> Self {
        B::seed(seed);
        tracing::debug!("Compute context on {:?} with seed {}", device, seed);
        Self { device, seed }
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Shuffle seed of a 1-based epoch.
    pub fn epoch_seed(&self, epoch: usize) -> u64 {
        self.seed.wrapping_add(epoch as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_epoch_seeds_differ() {
        let ctx = ComputeContext::<NdArray>::new(Default::default(), 42);
        assert_eq!(ctx.epoch_seed(1), 43);
        assert_ne!(ctx.epoch_seed(1), ctx.epoch_seed(2));
    }
}
