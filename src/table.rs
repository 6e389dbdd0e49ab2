//! Dense label-keyed probability tables.
//!
//! A [`ProbabilityTable`] maps a `(row, column)` pair of labels to a probability. Rows are always
//! states; columns are either states (a transition table) or emissions (an emission table). The
//! labels are resolved to integer indices once, through a [`LabelSet`], so that the decoders can
//! read the underlying matrix directly.

use crate::error::{Error, Result};
use crate::{ROW_TOLERANCE, SUM_SLACK};
use ndarray::prelude::*;
#[cfg(feature = "serde-1")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "serde-1")]
use std::convert::TryFrom;

/// Which alphabet a set of labels is drawn from. This decides which error an unknown label raises.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde-1", derive(Serialize, Deserialize))]
pub enum LabelKind {
    State,
    Emission,
}

impl LabelKind {
    fn unknown(self, label: &str) -> Error {
        match self {
            LabelKind::State => Error::UnknownState(label.to_owned()),
            LabelKind::Emission => Error::UnknownEmission(label.to_owned()),
        }
    }
}

/// An ordered set of distinct labels with a bijective label → index map.
///
/// Only the kind and the names are serialized; the index is rebuilt through [`LabelSet::new`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-1",
    derive(Serialize, Deserialize),
    serde(try_from = "SerializedLabels", into = "SerializedLabels")
)]
pub struct LabelSet {
    kind: LabelKind,
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelSet {
    /// Fails if `names` is empty or contains a duplicate.
    pub fn new<S: AsRef<str>>(kind: LabelKind, names: &[S]) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::EmptyLabelSet);
        }
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let name = name.as_ref();
            if index.insert(name.to_owned(), i).is_some() {
                return Err(Error::DuplicateLabel(name.to_owned()));
            }
        }
        Ok(Self {
            kind,
            names: names.iter().map(|name| name.as_ref().to_owned()).collect(),
            index,
        })
    }

    pub fn kind(&self) -> LabelKind {
        self.kind
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

    /// The label at index `i`.
    pub fn name(&self, i: usize) -> Result<&str> {
        self.names
            .get(i)
            .map(String::as_str)
            .ok_or(Error::IndexOutOfRange {
                index: i,
                len: self.names.len(),
            })
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// The index of `label`, or `UnknownState`/`UnknownEmission` depending on the kind of set.
    pub fn index_of(&self, label: &str) -> Result<usize> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| self.kind.unknown(label))
    }

    /// Resolve every label in `labels`, failing on the first unknown one.
    pub fn encode<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>> {
        labels
            .iter()
            .map(|label| self.index_of(label.as_ref()))
            .collect()
    }

    /// Map every index in `indices` back to its label, failing on the first out-of-range one.
    pub fn decode(&self, indices: &[usize]) -> Result<Vec<String>> {
        indices
            .iter()
            .map(|&i| self.name(i).map(str::to_owned))
            .collect()
    }

    pub fn same_labels<S: AsRef<str>>(&self, names: &[S]) -> bool {
        self.names.len() == names.len()
            && self
                .names
                .iter()
                .zip(names)
                .all(|(a, b)| a.as_str() == b.as_ref())
    }
}

#[cfg(feature = "serde-1")]
#[derive(Serialize, Deserialize)]
struct SerializedLabels {
    kind: LabelKind,
    names: Vec<String>,
}

#[cfg(feature = "serde-1")]
impl TryFrom<SerializedLabels> for LabelSet {
    type Error = Error;

    fn try_from(labels: SerializedLabels) -> Result<Self> {
        Self::new(labels.kind, &labels.names)
    }
}

#[cfg(feature = "serde-1")]
impl From<LabelSet> for SerializedLabels {
    fn from(labels: LabelSet) -> Self {
        Self {
            kind: labels.kind,
            names: labels.names,
        }
    }
}

/// A fully populated two-key table of probabilities.
///
/// Every `(row, column)` cell of the declared label sets always holds a value. Reading or writing a
/// label outside those sets is an error: [`set`](ProbabilityTable::set) never silently ignores a
/// foreign key.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-1",
    derive(Serialize, Deserialize),
    serde(try_from = "SerializedTable", into = "SerializedTable")
)]
pub struct ProbabilityTable {
    rows: LabelSet,
    columns: LabelSet,
    values: Array2<f64>,
}

impl ProbabilityTable {
    /// Create a table where every cell holds `default`.
    pub fn new(rows: LabelSet, columns: LabelSet, default: f64) -> Self {
        let values = Array2::from_elem((rows.len(), columns.len()), default);
        Self {
            rows,
            columns,
            values,
        }
    }

    /// A state → state table.
    pub fn transitions<S: AsRef<str>>(states: &[S], default: f64) -> Result<Self> {
        let states = LabelSet::new(LabelKind::State, states)?;
        Ok(Self::new(states.clone(), states, default))
    }

    /// A state → emission table.
    pub fn emissions<S: AsRef<str>, E: AsRef<str>>(
        states: &[S],
        emissions: &[E],
        default: f64,
    ) -> Result<Self> {
        Ok(Self::new(
            LabelSet::new(LabelKind::State, states)?,
            LabelSet::new(LabelKind::Emission, emissions)?,
            default,
        ))
    }

    /// Wrap an existing matrix, where `values[(i, j)]` is the cell for `rows[i]` and `columns[j]`.
    pub fn from_array(
        rows: LabelSet,
        columns: LabelSet,
        values: Array2<f64>,
        table: &'static str,
    ) -> Result<Self> {
        if values.dim() != (rows.len(), columns.len()) {
            return Err(Error::LabelMismatch { table });
        }
        Ok(Self {
            rows,
            columns,
            values,
        })
    }

    pub fn rows(&self) -> &LabelSet {
        &self.rows
    }

    pub fn columns(&self) -> &LabelSet {
        &self.columns
    }

    /// The dense matrix behind this table, indexed the same way as the label sets.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn get(&self, row: &str, column: &str) -> Result<f64> {
        let i = self.rows.index_of(row)?;
        let j = self.columns.index_of(column)?;
        Ok(self.values[(i, j)])
    }

    pub fn set(&mut self, row: &str, column: &str, value: f64) -> Result<()> {
        let i = self.rows.index_of(row)?;
        let j = self.columns.index_of(column)?;
        self.values[(i, j)] = value;
        Ok(())
    }

    /// The fan-out of `row`: every column label with its value, in declared column order.
    pub fn row_view<'a>(&'a self, row: &str) -> Result<impl Iterator<Item = (&'a str, f64)> + 'a> {
        let i = self.rows.index_of(row)?;
        Ok(self
            .columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.row(i).into_iter().copied()))
    }

    /// Check that every row is a probability distribution.
    pub(crate) fn validate_rows(&self, table: &'static str) -> Result<()> {
        for (name, row) in self.rows.names().iter().zip(self.values.rows()) {
            validate_distribution(table, name, row)?;
        }
        Ok(())
    }
}

#[cfg(feature = "serde-1")]
#[derive(Serialize, Deserialize)]
struct SerializedTable {
    rows: LabelSet,
    columns: LabelSet,
    values: Array2<f64>,
}

#[cfg(feature = "serde-1")]
impl TryFrom<SerializedTable> for ProbabilityTable {
    type Error = Error;

    fn try_from(table: SerializedTable) -> Result<Self> {
        Self::from_array(table.rows, table.columns, table.values, "table")
    }
}

#[cfg(feature = "serde-1")]
impl From<ProbabilityTable> for SerializedTable {
    fn from(table: ProbabilityTable) -> Self {
        Self {
            rows: table.rows,
            columns: table.columns,
            values: table.values,
        }
    }
}

/// Every entry must lie in `[0, 1]` and the entries must sum to 1. A sum may fall short of 1 by up to
/// [`ROW_TOLERANCE`] but exceed it only by [`SUM_SLACK`], so any accepted row can be sampled from.
pub(crate) fn validate_distribution(
    table: &'static str,
    row: &str,
    values: ArrayView1<f64>,
) -> Result<()> {
    validate_probabilities(table, row, values)?;
    let sum = values.sum();
    if sum < 1.0 - ROW_TOLERANCE || sum > 1.0 + SUM_SLACK {
        return Err(Error::InvalidProbabilityRow {
            table,
            row: row.to_owned(),
            sum,
        });
    }
    Ok(())
}

/// Every entry must lie in `[0, 1]`.
pub(crate) fn validate_probabilities(
    table: &'static str,
    row: &str,
    values: ArrayView1<f64>,
) -> Result<()> {
    match values.iter().find(|&&p| !(0.0..=1.0).contains(&p)) {
        Some(&value) => Err(Error::NegativeProbability {
            table,
            row: row.to_owned(),
            value,
        }),
        None => Ok(()),
    }
}
