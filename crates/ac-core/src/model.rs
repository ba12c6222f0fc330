//! Data-model facade the navigation graph resolves against
//!
//! Nav nodes never hold datapoint references; they carry series keys
//! and indices and look the data up at resolution time, so the model
//! behind a map can be swapped without invalidating the graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single facet value of a datapoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FacetValue {
    Number(f64),
    Text(String),
}

/// Key-based identity of one datapoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatapointId {
    pub series_key: String,
    pub index: usize,
}

/// One datapoint of one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    pub series_key: String,
    pub index: usize,
    pub facets: BTreeMap<String, FacetValue>,
}

impl Datapoint {
    pub fn new(series_key: impl Into<String>, index: usize) -> Self {
        Self {
            series_key: series_key.into(),
            index,
            facets: BTreeMap::new(),
        }
    }

    pub fn with_facet(mut self, key: impl Into<String>, value: FacetValue) -> Self {
        self.facets.insert(key.into(), value);
        self
    }

    pub fn id(&self) -> DatapointId {
        DatapointId {
            series_key: self.series_key.clone(),
            index: self.index,
        }
    }
}

/// An ordered, keyed series of datapoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub key: String,
    pub datapoints: Vec<Datapoint>,
}

impl Series {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            datapoints: Vec::new(),
        }
    }

    /// Build a series whose datapoints carry one numeric `value` facet
    pub fn with_values(key: impl Into<String>, values: &[f64]) -> Self {
        let key = key.into();
        let datapoints = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                Datapoint::new(key.clone(), index).with_facet("value", FacetValue::Number(*value))
            })
            .collect();
        Self { key, datapoints }
    }

    pub fn len(&self) -> usize {
        self.datapoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datapoints.is_empty()
    }
}

/// Trait for the data model behind a chart
pub trait ChartModel: Send + Sync {
    /// All series, in chart order
    fn series(&self) -> &[Series];

    /// Facet keys of the dependent axis
    fn dependent_facet_keys(&self) -> &[String];

    fn series_by_key(&self, key: &str) -> Option<&Series> {
        self.series().iter().find(|series| series.key == key)
    }

    fn at_key_and_index(&self, key: &str, index: usize) -> Option<&Datapoint> {
        self.series_by_key(key)?.datapoints.get(index)
    }
}

/// A fully loaded in-memory model
pub struct InMemoryModel {
    series: Vec<Series>,
    dependent_facet_keys: Vec<String>,
}

impl InMemoryModel {
    pub fn new(series: Vec<Series>, dependent_facet_keys: Vec<String>) -> Self {
        Self {
            series,
            dependent_facet_keys,
        }
    }
}

impl ChartModel for InMemoryModel {
    fn series(&self) -> &[Series] {
        &self.series
    }

    fn dependent_facet_keys(&self) -> &[String] {
        &self.dependent_facet_keys
    }
}

/// A contiguous index range identified by trend analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRange {
    pub start: usize,
    pub end: usize,
}

impl SequenceRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Whether an index falls inside `[start, end)`
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }
}

/// Per-series output of the external trend analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesAnalysis {
    pub sequences: Vec<SequenceRange>,
}

/// One cluster from the external clustering collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterResult {
    pub datapoint_ids: Vec<DatapointId>,
    pub outlier_ids: Vec<DatapointId>,
    pub centroid: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_resolve_by_key_and_index() {
        let model = InMemoryModel::new(
            vec![
                Series::with_values("alpha", &[1.0, 2.0]),
                Series::with_values("beta", &[3.0]),
            ],
            vec!["value".into()],
        );
        assert_eq!(model.series().len(), 2);
        assert_eq!(model.series_by_key("beta").map(Series::len), Some(1));
        let dp = model.at_key_and_index("alpha", 1).expect("datapoint");
        assert_eq!(dp.facets.get("value"), Some(&FacetValue::Number(2.0)));
        assert!(model.at_key_and_index("alpha", 2).is_none());
        assert!(model.at_key_and_index("gamma", 0).is_none());
    }

    #[test]
    fn sequence_range_is_half_open() {
        let range = SequenceRange::new(2, 5);
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5));
        assert!(!range.contains(1));
    }
}
