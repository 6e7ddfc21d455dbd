//! Anonymization labels for the ranking stage.
//!
//! The label/model mapping is the ranking stage's transient secret: it is
//! built fresh per request from the successful stage-1 subset, passed
//! explicitly to the functions that need it, and revealed only in the
//! de-anonymized aggregate output - never inside a judge prompt.

use crate::core::model::Model;
use serde::Serialize;
use std::collections::BTreeMap;

/// Request-local bijection between short labels ("A", "B", ... "Z", "AA", ...)
/// and the panel models whose answers they anonymize.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    entries: Vec<(String, Model)>,
}

impl LabelMap {
    /// Assign labels to models in the given order.
    ///
    /// The order is stable for a fixed input but deliberately not revealed
    /// to judges.
    pub fn assign(models: impl IntoIterator<Item = Model>) -> Self {
        let entries = models
            .into_iter()
            .enumerate()
            .map(|(i, model)| (label_for_index(i), model))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a label back to its source model
    pub fn model_for(&self, label: &str) -> Option<&Model> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, m)| m)
    }

    /// Look up the label assigned to a model
    pub fn label_for(&self, model: &Model) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, m)| m == model)
            .map(|(l, _)| l.as_str())
    }

    /// Iterate labels and models in assignment order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Model)> {
        self.entries.iter().map(|(l, m)| (l.as_str(), m))
    }

    /// All labels in assignment order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    /// Sorted label-to-model view for de-anonymized output
    pub fn to_map(&self) -> BTreeMap<String, Model> {
        self.entries.iter().cloned().collect()
    }
}

impl Serialize for LabelMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_map().serialize(serializer)
    }
}

/// Label for the i-th answer: A..Z, then AA, AB, ...
fn label_for_index(mut index: usize) -> String {
    let mut label = String::new();
    loop {
        label.insert(0, (b'A' + (index % 26) as u8) as char);
        index /= 26;
        if index == 0 {
            break;
        }
        index -= 1;
    }
    label
}
