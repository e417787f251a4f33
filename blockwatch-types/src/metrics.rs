//! Metric samples and the per-poll metrics snapshot.

use alloc::borrow::ToOwned;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// A set of Prometheus labels. `BTreeMap` keys are unique and ordered, so two
/// label sets written in different orders compare equal.
pub type LabelSet = BTreeMap<String, String>;

/// Semantic kind of a metric family, taken from `# TYPE` metadata.
///
/// Families without usable metadata default to [`MetricKind::Gauge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricKind {
    /// Monotonically increasing counter.
    Counter,
    /// Point-in-time measurement.
    #[default]
    Gauge,
}

impl MetricKind {
    /// Classify a `# TYPE` token. Unknown tokens fall back to `Gauge`.
    pub fn from_type_token(token: &str) -> Self {
        match token {
            "counter" => MetricKind::Counter,
            _ => MetricKind::Gauge,
        }
    }
}

/// A single observed metric value.
///
/// Samples are immutable once produced. Equality compares the value bitwise
/// so that `NaN` samples are stable across polls instead of registering as a
/// change every cycle.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricSample {
    /// Metric family name, e.g. `blocky_query_total`.
    pub name: String,

    /// Label key/value pairs identifying this series within the family.
    pub labels: LabelSet,

    /// Observed value. `+Inf`, `-Inf`, and `NaN` are preserved as-is.
    pub value: f64,

    /// Unix timestamp in milliseconds of the poll that observed this value.
    pub timestamp_ms: u64,
}

impl MetricSample {
    /// Create a sample from a name, label pairs, value, and poll timestamp.
    pub fn new<N, I, K, V>(name: N, labels: I, value: f64, timestamp_ms: u64) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            value,
            timestamp_ms,
        }
    }

    /// Create an unlabeled sample.
    pub fn unlabeled<N: Into<String>>(name: N, value: f64, timestamp_ms: u64) -> Self {
        Self {
            name: name.into(),
            labels: LabelSet::new(),
            value,
            timestamp_ms,
        }
    }
}

impl PartialEq for MetricSample {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.labels == other.labels
            && self.value.to_bits() == other.value.to_bits()
            && self.timestamp_ms == other.timestamp_ms
    }
}

impl Eq for MetricSample {}

/// The latest sample per (name, label set) pair, plus family classification.
///
/// The source exposition format has no deduplication guarantee, so inserting
/// a sample for a key that already exists replaces the earlier one. Iteration
/// is ordered by metric name, then by canonical label-set ordering.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "MetricsSnapshotRepr", from = "MetricsSnapshotRepr")
)]
pub struct MetricsSnapshot {
    samples: BTreeMap<(String, LabelSet), MetricSample>,
    kinds: BTreeMap<String, MetricKind>,
}

/// Serialized form: a flat sample list, since the in-memory key is implied
/// by each sample's name and labels.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct MetricsSnapshotRepr {
    samples: Vec<MetricSample>,
    kinds: BTreeMap<String, MetricKind>,
}

#[cfg(feature = "serde")]
impl From<MetricsSnapshot> for MetricsSnapshotRepr {
    fn from(snapshot: MetricsSnapshot) -> Self {
        Self {
            samples: snapshot.samples.into_values().collect(),
            kinds: snapshot.kinds,
        }
    }
}

#[cfg(feature = "serde")]
impl From<MetricsSnapshotRepr> for MetricsSnapshot {
    fn from(repr: MetricsSnapshotRepr) -> Self {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.kinds = repr.kinds;
        for sample in repr.samples {
            snapshot.insert(sample);
        }
        snapshot
    }
}

impl MetricsSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sample. A sample for an existing (name, label set) key
    /// replaces the previous one.
    pub fn insert(&mut self, sample: MetricSample) {
        self.samples
            .insert((sample.name.clone(), sample.labels.clone()), sample);
    }

    /// Record the semantic kind of a metric family.
    pub fn set_kind(&mut self, name: impl Into<String>, kind: MetricKind) {
        self.kinds.insert(name.into(), kind);
    }

    /// The kind of a family. Defaults to `Gauge` for unclassified families.
    pub fn kind(&self, name: &str) -> MetricKind {
        self.kinds.get(name).copied().unwrap_or_default()
    }

    /// Look up the sample with this exact name and label set.
    pub fn get(&self, name: &str, labels: &LabelSet) -> Option<&MetricSample> {
        self.samples.get(&(name.to_owned(), labels.clone()))
    }

    /// Look up an unlabeled sample by name.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name, &LabelSet::new()).map(|s| s.value)
    }

    /// All samples of one family, in canonical label order.
    pub fn family<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MetricSample> {
        self.samples
            .range((name.to_owned(), LabelSet::new())..)
            .take_while(move |((n, _), _)| n == name)
            .map(|(_, sample)| sample)
    }

    /// Sum of all samples in a family, `None` if the family is absent.
    ///
    /// A family with a single series sums to that series' value, so this is
    /// the right aggregate for both labeled and unlabeled families.
    pub fn sum(&self, name: &str) -> Option<f64> {
        let mut total = 0.0;
        let mut seen = false;
        for sample in self.family(name) {
            total += sample.value;
            seen = true;
        }
        seen.then_some(total)
    }

    /// Sum a family's samples grouped by one label key.
    ///
    /// Samples without the key are grouped under `"unknown"`, matching how
    /// per-client and per-type breakdowns treat unlabeled series.
    pub fn group_by_label(&self, name: &str, key: &str) -> BTreeMap<String, f64> {
        let mut grouped: BTreeMap<String, f64> = BTreeMap::new();
        for sample in self.family(name) {
            let group = sample
                .labels
                .get(key)
                .map(String::as_str)
                .unwrap_or("unknown");
            *grouped.entry(group.to_owned()).or_insert(0.0) += sample.value;
        }
        grouped
    }

    /// Names of all families present, deduplicated, in order.
    pub fn families(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (name, _) in self.samples.keys() {
            if names.last() != Some(&name.as_str()) {
                names.push(name.as_str());
            }
        }
        names
    }

    /// Whether two snapshots report the same facts: identical keys, values
    /// (compared bitwise), and family kinds. Observation timestamps are
    /// ignored, so re-reading an unchanged server compares equal even though
    /// every scrape re-stamps its samples.
    pub fn content_eq(&self, other: &Self) -> bool {
        self.kinds == other.kinds
            && self.samples.len() == other.samples.len()
            && self
                .samples
                .iter()
                .zip(other.samples.iter())
                .all(|((key_a, a), (key_b, b))| {
                    key_a == key_b && a.value.to_bits() == b.value.to_bits()
                })
    }

    /// Number of samples in the snapshot.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the snapshot holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterate over all samples in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &MetricSample> {
        self.samples.values()
    }
}
