// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Used when a corpus ships without a validation split: the
// training documents are shuffled and the tail is held out.
//
// The shuffle is seeded so that the same configuration always
// holds out the same documents; otherwise two runs sharing a
// checkpoint slot would compare metrics over different splits.
//
// Reference: rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, validation).
///
/// `train_fraction` is clamped to [0, 1].
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction.clamp(0.0, 1.0)).round() as usize;
    let val      = samples.split_off(split_at.min(total));

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val) = split_train_val(items, 0.9, 7);
        assert_eq!(train.len(), 90);
        assert_eq!(val.len(), 10);
    }

    #[test]
    fn test_same_seed_same_split() {
        let (a, _) = split_train_val((0..30).collect::<Vec<_>>(), 0.5, 11);
        let (b, _) = split_train_val((0..30).collect::<Vec<_>>(), 0.5, 11);
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_items_preserved() {
        let (mut train, val) = split_train_val((0..50).collect::<Vec<usize>>(), 0.7, 1);
        train.extend(val);
        train.sort();
        assert_eq!(train, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_dataset() {
        let (train, val) = split_train_val(Vec::<usize>::new(), 0.8, 0);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }
}
