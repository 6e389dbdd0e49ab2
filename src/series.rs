//! Per-state, time-indexed tables of decoding values.

use crate::error::{Error, Result};
use crate::table::LabelSet;
use ndarray::prelude::*;
#[cfg(feature = "serde-1")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde-1")]
use std::convert::TryFrom;

/// One sequence of values per state, indexed by position in the observation sequence.
///
/// This backs the forward, backward, posterior and Viterbi tables. Values are written in time
/// order (forwards or backwards, depending on the recurrence) and read many times afterwards.
/// A position counts as populated only once it is populated for every state, so the table is
/// always read as a rectangle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-1",
    derive(Serialize, Deserialize),
    serde(
        try_from = "SerializedSeries<T>",
        into = "SerializedSeries<T>",
        bound(serialize = "T: Clone + Serialize", deserialize = "T: Deserialize<'de>")
    )
)]
pub struct StateIndexedSeries<T> {
    states: LabelSet,
    columns: Vec<Vec<T>>,
}

impl<T: Copy> StateIndexedSeries<T> {
    /// An empty series over `states`.
    pub fn new(states: &LabelSet) -> Self {
        Self {
            states: states.clone(),
            columns: vec![Vec::new(); states.len()],
        }
    }

    /// A series of length `len` where every value is `value`. Used when a recurrence populates
    /// positions from right to left.
    pub fn filled(states: &LabelSet, len: usize, value: T) -> Self {
        Self {
            states: states.clone(),
            columns: vec![vec![value; len]; states.len()],
        }
    }

    pub fn states(&self) -> &LabelSet {
        &self.states
    }

    /// The number of positions populated for every state.
    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).min().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write `value` at `index` for `state`. `index` may be an already populated position, which
    /// is overwritten, or the next position for that state, which is appended.
    pub fn append_or_set(&mut self, state: &str, index: usize, value: T) -> Result<()> {
        let s = self.states.index_of(state)?;
        self.put(s, index, value)
    }

    pub fn get(&self, state: &str, index: usize) -> Result<T> {
        let s = self.states.index_of(state)?;
        self.at(s, index)
    }

    /// The most recently populated value for `state`.
    pub fn last(&self, state: &str) -> Result<T> {
        let s = self.states.index_of(state)?;
        self.columns[s]
            .last()
            .copied()
            .ok_or(Error::IndexOutOfRange { index: 0, len: 0 })
    }

    /// Every value populated for `state`, in position order.
    pub fn values_for(&self, state: &str) -> Result<&[T]> {
        let s = self.states.index_of(state)?;
        Ok(&self.columns[s])
    }

    /// The values of every state at `index`, in declared state order.
    pub fn row(&self, index: usize) -> Result<Array1<T>> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        Ok(self.columns.iter().map(|column| column[index]).collect())
    }

    /// Index-based counterpart of [`append_or_set`](Self::append_or_set).
    pub(crate) fn put(&mut self, s: usize, index: usize, value: T) -> Result<()> {
        let column = self.column_mut(s)?;
        let len = column.len();
        if index < len {
            column[index] = value;
        } else if index == len {
            column.push(value);
        } else {
            return Err(Error::IndexOutOfRange { index, len });
        }
        Ok(())
    }

    /// Write a whole position at once, one value per state.
    pub(crate) fn put_row(&mut self, index: usize, row: ArrayView1<T>) -> Result<()> {
        for (s, &value) in row.iter().enumerate() {
            self.put(s, index, value)?;
        }
        Ok(())
    }

    /// Index-based counterpart of [`get`](Self::get).
    pub fn at(&self, s: usize, index: usize) -> Result<T> {
        let column = self.column(s)?;
        column.get(index).copied().ok_or(Error::IndexOutOfRange {
            index,
            len: column.len(),
        })
    }
}

impl<T> StateIndexedSeries<T> {
    fn column(&self, s: usize) -> Result<&Vec<T>> {
        let len = self.columns.len();
        self.columns
            .get(s)
            .ok_or(Error::IndexOutOfRange { index: s, len })
    }

    fn column_mut(&mut self, s: usize) -> Result<&mut Vec<T>> {
        let len = self.columns.len();
        self.columns
            .get_mut(s)
            .ok_or(Error::IndexOutOfRange { index: s, len })
    }
}

#[cfg(feature = "serde-1")]
#[derive(Serialize, Deserialize)]
struct SerializedSeries<T> {
    states: LabelSet,
    columns: Vec<Vec<T>>,
}

#[cfg(feature = "serde-1")]
impl<T> TryFrom<SerializedSeries<T>> for StateIndexedSeries<T> {
    type Error = Error;

    fn try_from(series: SerializedSeries<T>) -> Result<Self> {
        if series.columns.len() != series.states.len() {
            return Err(Error::LabelMismatch { table: "series" });
        }
        Ok(Self {
            states: series.states,
            columns: series.columns,
        })
    }
}

#[cfg(feature = "serde-1")]
impl<T> From<StateIndexedSeries<T>> for SerializedSeries<T> {
    fn from(series: StateIndexedSeries<T>) -> Self {
        Self {
            states: series.states,
            columns: series.columns,
        }
    }
}
