// ============================================================
// Layer 3 — LabelSet
// ============================================================
// Ordered list of label names fixed when the model is built.
// The order matters once chaining is on: label i may only
// depend on labels 0..i.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::error::{TrainError, TrainResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    /// Build a label set, rejecting empty or duplicated names.
    pub fn new(names: Vec<String>) -> TrainResult<Self> {
        if names.is_empty() {
            return Err(TrainError::Configuration("label set is empty".into()));
        }
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(TrainError::Configuration(format!("duplicate label '{name}'")));
            }
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Turn a label subset into a boolean target vector in set order.
    /// Unknown names are a data error.
    pub fn encode<S: AsRef<str>>(&self, subset: &[S]) -> TrainResult<Vec<bool>> {
        let mut targets = vec![false; self.names.len()];
        for name in subset {
            let name = name.as_ref();
            let idx = self.index_of(name).ok_or_else(|| {
                TrainError::DataShape(format!("label '{name}' is not part of the label set"))
            })?;
            targets[idx] = true;
        }
        Ok(targets)
    }

    /// Names of the labels switched on in `decisions`.
    pub fn decode(&self, decisions: &[bool]) -> Vec<&str> {
        self.names
            .iter()
            .zip(decisions)
            .filter(|(_, &on)| on)
            .map(|(n, _)| n.as_str())
            .collect()
    }
}

impl TryFrom<Vec<String>> for LabelSet {
    type Error = TrainError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        LabelSet::new(names)
    }
}

impl From<LabelSet> for Vec<String> {
    fn from(set: LabelSet) -> Self {
        set.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> LabelSet {
        LabelSet::new(names.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        assert!(matches!(LabelSet::new(vec![]), Err(TrainError::Configuration(_))));
        assert!(LabelSet::new(vec!["a".into(), "a".into()]).is_err());
    }

    #[test]
    fn test_encode_follows_set_order() {
        let labels = set(&["earn", "acq", "grain"]);
        assert_eq!(labels.encode(&["grain", "earn"]).unwrap(), vec![true, false, true]);
        assert_eq!(labels.encode::<&str>(&[]).unwrap(), vec![false, false, false]);
    }

    #[test]
    fn test_encode_unknown_label_is_data_error() {
        let labels = set(&["earn"]);
        assert!(matches!(labels.encode(&["crude"]), Err(TrainError::DataShape(_))));
    }

    #[test]
    fn test_decode() {
        let labels = set(&["earn", "acq", "grain"]);
        assert_eq!(labels.decode(&[false, true, true]), vec!["acq", "grain"]);
    }
}
