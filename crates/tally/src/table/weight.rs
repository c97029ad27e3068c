use serde::{Deserialize, Serialize};

use crate::common::Map;
use crate::table::{parse_key_value_lines, report_malformed};

/// Weight used for partitions that are missing from the table.
pub const DEFAULT_PARTITION_WEIGHT: f64 = 1.0;

/// Maps partition names to the multiplier applied to CPU time consumed in that partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    weights: Map<String, f64>,
    default_weight: f64,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            weights: Map::default(),
            default_weight: DEFAULT_PARTITION_WEIGHT,
        }
    }
}

impl WeightTable {
    /// Parses `partition,weight` lines. Malformed lines are logged and skipped.
    /// If a partition is listed more than once, the last entry wins.
    pub fn load(text: &str) -> Self {
        let (records, malformed) = parse_key_value_lines(text, parse_weight);
        report_malformed("partition weight", &malformed);
        Self::from_entries(records)
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            weights: entries
                .into_iter()
                .map(|(partition, weight)| (partition.into(), weight))
                .collect(),
            default_weight: DEFAULT_PARTITION_WEIGHT,
        }
    }

    pub fn with_default_weight(mut self, weight: f64) -> Self {
        self.default_weight = weight;
        self
    }

    pub fn weight_of(&self, partition: &str) -> f64 {
        self.weights
            .get(partition)
            .copied()
            .unwrap_or(self.default_weight)
    }

    pub fn default_weight(&self) -> f64 {
        self.default_weight
    }

    /// Names of all partitions with a configured weight, sorted by name.
    pub fn partitions(&self) -> Vec<String> {
        let mut partitions: Vec<String> = self.weights.keys().cloned().collect();
        partitions.sort_unstable();
        partitions
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights
            .iter()
            .map(|(partition, weight)| (partition.as_str(), *weight))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

fn parse_weight(value: &str) -> Result<f64, String> {
    let weight: f64 = value
        .parse()
        .map_err(|_| format!("weight `{value}` is not a number"))?;
    if !weight.is_finite() || weight < 0.0 {
        return Err(format!("weight `{value}` must be a non-negative number"));
    }
    Ok(weight)
}
