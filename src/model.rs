use crate::error::{Error, Result};
use crate::table::{
    validate_distribution, validate_probabilities, LabelKind, LabelSet, ProbabilityTable,
};
use itertools::Itertools;
use ndarray::prelude::*;
#[cfg(feature = "serde-1")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "serde-1")]
use std::convert::TryFrom;

/// A time-invariant Hidden Markov Model with labelled states and emissions.
///
/// # Math
///
/// The model explains an observed sequence of emissions
///
/// $$Y=(Y_0=y_0, Y_1=y_1, \ldots, Y_{T-1}=y_{T-1})$$
///
/// with a hidden sequence of states $X=(X_0, \ldots, X_{T-1})$. It has four parameters:
/// * $A$, the $N × N$ transition table: $a_{ij}=P(X_t=j|X_{t-1}=i)$
/// * $B$, the $N × M$ emission table: $b_{ik}=P(Y_t=y_k|X_t=i)$
/// * $π$, the begin priors: $π_i=P(X_0=i)$
/// * $ε$, the end priors: $ε_i$ is the probability that state $i$ is the last state. These need
///   not sum to 1.
///
/// The label sets are fixed at construction. The probability tables and the observed/ground-truth
/// sequences can be replaced wholesale afterwards; every replacement is validated exactly as at
/// construction, so a model that exists is always well-formed. With the `serde-1` feature, a
/// deserialized model goes through [`from_arrays`](HiddenMarkovModel::from_arrays) too.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-1",
    derive(Serialize, Deserialize),
    serde(try_from = "SerializedModel", into = "SerializedModel")
)]
pub struct HiddenMarkovModel {
    states: LabelSet,
    emissions: LabelSet,
    transition: ProbabilityTable,
    emission: ProbabilityTable,
    begin: Array1<f64>,
    end: Array1<f64>,
    emission_sequence: Option<Vec<String>>,
    state_sequence: Option<Vec<String>>,
}

impl HiddenMarkovModel {
    /// Create a new model from labelled tables.
    ///
    /// `begin` and `end` map state labels to probabilities; a state missing from either map gets
    /// probability 0.
    ///
    /// Fails if any of:
    /// - A table is not declared over exactly `states` (rows) and `states`/`emissions` (columns)
    /// - A row of `transition` or `emission` is not a distribution
    /// - `begin` is not a distribution, or `end` holds a value outside `[0, 1]`
    /// - `begin` or `end` mention a label that is not a state
    pub fn new<S: AsRef<str>, E: AsRef<str>>(
        states: &[S],
        emissions: &[E],
        transition: ProbabilityTable,
        emission: ProbabilityTable,
        begin: &HashMap<String, f64>,
        end: &HashMap<String, f64>,
    ) -> Result<Self> {
        let states = LabelSet::new(LabelKind::State, states)?;
        let emissions = LabelSet::new(LabelKind::Emission, emissions)?;
        let begin = prior_array(&states, begin)?;
        let end = prior_array(&states, end)?;
        let hmm = Self {
            states,
            emissions,
            transition,
            emission,
            begin,
            end,
            emission_sequence: None,
            state_sequence: None,
        };
        hmm.validate()?;
        Ok(hmm)
    }

    /// Create a new model from dense arrays indexed in the declared label order.
    ///
    /// This could be useful for loading a saved model or a preset.
    pub fn from_arrays<S: AsRef<str>, E: AsRef<str>>(
        states: &[S],
        emissions: &[E],
        transition: Array2<f64>,
        emission: Array2<f64>,
        begin: Array1<f64>,
        end: Array1<f64>,
    ) -> Result<Self> {
        let state_labels = LabelSet::new(LabelKind::State, states)?;
        let emission_labels = LabelSet::new(LabelKind::Emission, emissions)?;
        let transition = ProbabilityTable::from_array(
            state_labels.clone(),
            state_labels.clone(),
            transition,
            "transition",
        )?;
        let emission = ProbabilityTable::from_array(
            state_labels.clone(),
            emission_labels.clone(),
            emission,
            "emission",
        )?;
        if begin.len() != state_labels.len() {
            return Err(Error::LabelMismatch { table: "begin" });
        }
        if end.len() != state_labels.len() {
            return Err(Error::LabelMismatch { table: "end" });
        }
        let hmm = Self {
            states: state_labels,
            emissions: emission_labels,
            transition,
            emission,
            begin,
            end,
            emission_sequence: None,
            state_sequence: None,
        };
        hmm.validate()?;
        Ok(hmm)
    }

    fn validate(&self) -> Result<()> {
        self.check_transition(&self.transition)?;
        self.check_emission(&self.emission)?;
        validate_distribution("begin", "begin", self.begin.view())?;
        validate_probabilities("end", "end", self.end.view())
    }

    fn check_transition(&self, table: &ProbabilityTable) -> Result<()> {
        if table.rows() != &self.states || table.columns() != &self.states {
            return Err(Error::LabelMismatch { table: "transition" });
        }
        table.validate_rows("transition")
    }

    fn check_emission(&self, table: &ProbabilityTable) -> Result<()> {
        if table.rows() != &self.states || table.columns() != &self.emissions {
            return Err(Error::LabelMismatch { table: "emission" });
        }
        table.validate_rows("emission")
    }

    /// $N$, the number of states in this HMM
    pub fn n(&self) -> usize {
        self.states.len()
    }

    /// $M$, the number of possible emissions that this model can emit
    pub fn m(&self) -> usize {
        self.emissions.len()
    }

    pub fn states(&self) -> &LabelSet {
        &self.states
    }

    pub fn emissions(&self) -> &LabelSet {
        &self.emissions
    }

    pub fn transition(&self) -> &ProbabilityTable {
        &self.transition
    }

    pub fn emission(&self) -> &ProbabilityTable {
        &self.emission
    }

    /// $A$ as a dense matrix
    pub fn a(&self) -> &Array2<f64> {
        self.transition.values()
    }

    /// $B$ as a dense matrix
    pub fn b(&self) -> &Array2<f64> {
        self.emission.values()
    }

    /// $π$, in declared state order
    pub fn begin(&self) -> &Array1<f64> {
        &self.begin
    }

    /// $ε$, in declared state order
    pub fn end(&self) -> &Array1<f64> {
        &self.end
    }

    pub fn begin_probability(&self, state: &str) -> Result<f64> {
        Ok(self.begin[self.states.index_of(state)?])
    }

    pub fn end_probability(&self, state: &str) -> Result<f64> {
        Ok(self.end[self.states.index_of(state)?])
    }

    pub fn emission_sequence(&self) -> Option<&[String]> {
        self.emission_sequence.as_deref()
    }

    pub fn state_sequence(&self) -> Option<&[String]> {
        self.state_sequence.as_deref()
    }

    /// Replace the observed emissions. Fails if a label is not an emission, or if a ground-truth
    /// state sequence of a different length is present.
    pub fn set_emission_sequence<S: AsRef<str>>(&mut self, emissions: &[S]) -> Result<()> {
        self.emissions.encode(emissions)?;
        if let Some(states) = &self.state_sequence {
            check_lengths(emissions.len(), states.len())?;
        }
        self.emission_sequence = Some(to_owned_labels(emissions));
        Ok(())
    }

    /// Replace the ground-truth states. Fails if a label is not a state, or if an emission
    /// sequence of a different length is present.
    pub fn set_state_sequence<S: AsRef<str>>(&mut self, states: &[S]) -> Result<()> {
        self.states.encode(states)?;
        if let Some(emissions) = &self.emission_sequence {
            check_lengths(emissions.len(), states.len())?;
        }
        self.state_sequence = Some(to_owned_labels(states));
        Ok(())
    }

    /// Replace both sequences at once.
    pub fn set_trajectory<E: AsRef<str>, S: AsRef<str>>(
        &mut self,
        emissions: &[E],
        states: &[S],
    ) -> Result<()> {
        check_lengths(emissions.len(), states.len())?;
        self.emissions.encode(emissions)?;
        self.states.encode(states)?;
        self.emission_sequence = Some(to_owned_labels(emissions));
        self.state_sequence = Some(to_owned_labels(states));
        Ok(())
    }

    pub fn clear_sequences(&mut self) {
        self.emission_sequence = None;
        self.state_sequence = None;
    }

    pub fn set_transition_table(&mut self, table: ProbabilityTable) -> Result<()> {
        self.check_transition(&table)?;
        self.transition = table;
        Ok(())
    }

    pub fn set_emission_table(&mut self, table: ProbabilityTable) -> Result<()> {
        self.check_emission(&table)?;
        self.emission = table;
        Ok(())
    }

    pub fn set_begin(&mut self, begin: &HashMap<String, f64>) -> Result<()> {
        let begin = prior_array(&self.states, begin)?;
        validate_distribution("begin", "begin", begin.view())?;
        self.begin = begin;
        Ok(())
    }

    pub fn set_end(&mut self, end: &HashMap<String, f64>) -> Result<()> {
        let end = prior_array(&self.states, end)?;
        validate_probabilities("end", "end", end.view())?;
        self.end = end;
        Ok(())
    }

    /// The model's emission sequence as indices. Fails if there is none, or if it is empty.
    pub(crate) fn encoded_observations(&self) -> Result<Vec<usize>> {
        match &self.emission_sequence {
            Some(emissions) if !emissions.is_empty() => self.emissions.encode(emissions),
            _ => Err(Error::EmptyObservationSequence),
        }
    }

    /// Return the natural-log joint probability of a path of states and the emissions it
    /// produced, including the begin and end priors.
    ///
    /// An empty path has log probability 0. An impossible path has log probability negative
    /// infinity.
    pub fn path_log_probability<S: AsRef<str>, E: AsRef<str>>(
        &self,
        states: &[S],
        emissions: &[E],
    ) -> Result<f64> {
        check_lengths(emissions.len(), states.len())?;
        let xs = self.states.encode(states)?;
        let ys = self.emissions.encode(emissions)?;
        Ok(self.ll_given_states(&xs, &ys))
    }

    pub(crate) fn ll_given_states(&self, xs: &[usize], ys: &[usize]) -> f64 {
        // This special case is required b/c we treat the first and last time steps specially
        let (first, last) = match (xs.first(), xs.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return 0.0,
        };

        // When looping, we skip the initial observation
        let initial_log_prob = self.begin[first].ln() + self.b()[(first, ys[0])].ln();
        let the_rest: f64 = xs
            .iter()
            .zip(ys)
            .tuple_windows()
            .map(|((&state0, _observation0), (&state1, &observation1))| {
                self.a()[(state0, state1)].ln() + self.b()[(state1, observation1)].ln()
            })
            .sum();

        initial_log_prob + the_rest + self.end[last].ln()
    }
}

/// The wire form of a model: labels and dense arrays in declared order.
#[cfg(feature = "serde-1")]
#[derive(Serialize, Deserialize)]
struct SerializedModel {
    states: Vec<String>,
    emissions: Vec<String>,
    transition: Array2<f64>,
    emission: Array2<f64>,
    begin: Array1<f64>,
    end: Array1<f64>,
    emission_sequence: Option<Vec<String>>,
    state_sequence: Option<Vec<String>>,
}

#[cfg(feature = "serde-1")]
impl TryFrom<SerializedModel> for HiddenMarkovModel {
    type Error = Error;

    fn try_from(model: SerializedModel) -> Result<Self> {
        let mut hmm = Self::from_arrays(
            &model.states,
            &model.emissions,
            model.transition,
            model.emission,
            model.begin,
            model.end,
        )?;
        match (model.emission_sequence, model.state_sequence) {
            (Some(emissions), Some(states)) => hmm.set_trajectory(&emissions, &states)?,
            (Some(emissions), None) => hmm.set_emission_sequence(&emissions)?,
            (None, Some(states)) => hmm.set_state_sequence(&states)?,
            (None, None) => {}
        }
        Ok(hmm)
    }
}

#[cfg(feature = "serde-1")]
impl From<HiddenMarkovModel> for SerializedModel {
    fn from(hmm: HiddenMarkovModel) -> Self {
        Self {
            states: hmm.states.names().to_vec(),
            emissions: hmm.emissions.names().to_vec(),
            transition: hmm.transition.values().clone(),
            emission: hmm.emission.values().clone(),
            begin: hmm.begin,
            end: hmm.end,
            emission_sequence: hmm.emission_sequence,
            state_sequence: hmm.state_sequence,
        }
    }
}

fn prior_array(states: &LabelSet, priors: &HashMap<String, f64>) -> Result<Array1<f64>> {
    let mut array = Array1::zeros(states.len());
    for (label, &p) in priors {
        array[states.index_of(label)?] = p;
    }
    Ok(array)
}

fn check_lengths(emissions: usize, states: usize) -> Result<()> {
    if emissions == states {
        Ok(())
    } else {
        Err(Error::SequenceLengthMismatch { emissions, states })
    }
}

fn to_owned_labels<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    labels.iter().map(|label| label.as_ref().to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;
    use crate::tests::new_rng;
    use ndarray::array;
    use spectral::prelude::*;

    fn priors(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|&(k, v)| (k.to_owned(), v)).collect()
    }

    fn coin_tables() -> (ProbabilityTable, ProbabilityTable) {
        let mut transition = ProbabilityTable::transitions(&["Fair", "Biased"], 0.5).unwrap();
        transition.set("Fair", "Fair", 0.9).unwrap();
        transition.set("Fair", "Biased", 0.1).unwrap();
        let emission = ProbabilityTable::emissions(&["Fair", "Biased"], &["H", "T"], 0.5).unwrap();
        (transition, emission)
    }

    #[test]
    fn new_from_tables() {
        let (transition, emission) = coin_tables();
        let hmm = HiddenMarkovModel::new(
            &["Fair", "Biased"],
            &["H", "T"],
            transition,
            emission,
            &priors(&[("Fair", 1.0)]),
            &priors(&[("Fair", 0.5), ("Biased", 0.5)]),
        )
        .unwrap();
        assert_eq!(2, hmm.n());
        assert_eq!(2, hmm.m());
        assert_eq!(&array![1.0, 0.0], hmm.begin());
        assert_eq!(Ok(0.0), hmm.begin_probability("Biased"));
        assert_eq!(Ok(0.5), hmm.end_probability("Biased"));
        assert_eq!(Ok(0.1), hmm.transition().get("Fair", "Biased"));
        assert!(hmm.emission_sequence().is_none());
    }

    #[test]
    fn new_rejects_foreign_table_labels() {
        let (transition, _) = coin_tables();
        let emission = ProbabilityTable::emissions(&["Fair", "Biased"], &["1", "2"], 0.5).unwrap();
        let result = HiddenMarkovModel::new(
            &["Fair", "Biased"],
            &["H", "T"],
            transition,
            emission,
            &priors(&[("Fair", 1.0)]),
            &priors(&[]),
        );
        assert_eq!(Err(Error::LabelMismatch { table: "emission" }), result);
    }

    #[test]
    fn new_rejects_unknown_prior_label() {
        let (transition, emission) = coin_tables();
        let result = HiddenMarkovModel::new(
            &["Fair", "Biased"],
            &["H", "T"],
            transition,
            emission,
            &priors(&[("Loaded", 1.0)]),
            &priors(&[]),
        );
        assert_eq!(Err(Error::UnknownState("Loaded".to_owned())), result);
    }

    #[test]
    fn new_rejects_bad_transition_row() {
        let (mut transition, emission) = coin_tables();
        transition.set("Biased", "Biased", 0.7).unwrap();
        let result = HiddenMarkovModel::new(
            &["Fair", "Biased"],
            &["H", "T"],
            transition,
            emission,
            &priors(&[("Fair", 1.0)]),
            &priors(&[]),
        );
        match result {
            Err(Error::InvalidProbabilityRow { table, row, .. }) => {
                assert_eq!("transition", table);
                assert_eq!("Biased", row);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn new_rejects_bad_begin() {
        let (transition, emission) = coin_tables();
        let result = HiddenMarkovModel::new(
            &["Fair", "Biased"],
            &["H", "T"],
            transition,
            emission,
            &priors(&[("Fair", 0.6)]),
            &priors(&[]),
        );
        assert_that(&result.map(|_| ())).is_err();
    }

    /// Every model that can be built must also be sampleable
    #[test]
    fn rows_above_one_are_rejected() {
        let result = HiddenMarkovModel::from_arrays(
            &["a", "b"],
            &["x", "y"],
            array![[0.500004, 0.5], [0.5, 0.5]],
            array![[1.0, 0.0], [0.0, 1.0]],
            array![0.5, 0.5],
            array![1.0, 1.0],
        );
        assert!(matches!(
            result,
            Err(Error::InvalidProbabilityRow { table: "transition", .. })
        ));

        let hmm = HiddenMarkovModel::from_arrays(
            &["a", "b"],
            &["x", "y"],
            array![[0.499996, 0.5], [0.5, 0.5]],
            array![[1.0, 0.0], [0.0, 1.0]],
            array![0.5, 0.5],
            array![1.0, 1.0],
        )
        .unwrap();
        assert!(hmm.sampler(&mut new_rng()).is_ok());
    }

    #[test]
    fn end_need_not_sum_to_one() {
        let hmm = presets::weather().unwrap();
        assert_eq!(&array![1.0, 1.0], hmm.end());
    }

    #[test]
    fn from_arrays_checks_dimensions() {
        let result = HiddenMarkovModel::from_arrays(
            &["a", "b"],
            &["x"],
            array![[1.0, 0.0], [0.0, 1.0]],
            array![[1.0], [1.0]],
            array![1.0],
            array![1.0, 1.0],
        );
        assert_eq!(Err(Error::LabelMismatch { table: "begin" }), result);
    }

    #[test]
    fn sequences_must_match_in_length() {
        let mut hmm = presets::weather().unwrap();
        hmm.set_emission_sequence(&["See Umbrella", "See No Umbrella"])
            .unwrap();
        assert_eq!(
            Err(Error::SequenceLengthMismatch {
                emissions: 2,
                states: 1
            }),
            hmm.set_state_sequence(&["Rain"])
        );
        hmm.set_state_sequence(&["Rain", "No Rain"]).unwrap();
        assert_eq!(Some(&["Rain".to_owned(), "No Rain".to_owned()][..]), hmm.state_sequence());
    }

    #[test]
    fn sequences_reject_unknown_labels() {
        let mut hmm = presets::weather().unwrap();
        assert_eq!(
            Err(Error::UnknownEmission("See Hat".to_owned())),
            hmm.set_emission_sequence(&["See Umbrella", "See Hat"])
        );
        assert_eq!(
            Err(Error::UnknownState("Snow".to_owned())),
            hmm.set_trajectory(&["See Umbrella"], &["Snow"])
        );
        assert!(hmm.emission_sequence().is_none());
    }

    #[test]
    fn replace_tables_wholesale() {
        let mut hmm = presets::weather().unwrap();
        let mut transition = hmm.transition().clone();
        transition.set("Rain", "Rain", 0.5).unwrap();
        transition.set("Rain", "No Rain", 0.5).unwrap();
        hmm.set_transition_table(transition).unwrap();
        assert_eq!(Ok(0.5), hmm.transition().get("Rain", "Rain"));

        let mut broken = hmm.emission().clone();
        broken.set("Rain", "See Umbrella", 0.0).unwrap();
        assert_that(&hmm.set_emission_table(broken)).is_err();
        assert_eq!(Ok(0.9), hmm.emission().get("Rain", "See Umbrella"));
    }

    #[test]
    fn replace_priors() {
        let mut hmm = presets::weather().unwrap();
        hmm.set_begin(&priors(&[("Rain", 0.25), ("No Rain", 0.75)]))
            .unwrap();
        assert_eq!(&array![0.25, 0.75], hmm.begin());
        assert_that(&hmm.set_end(&priors(&[("Rain", 2.0)]))).is_err();
        assert_eq!(&array![1.0, 1.0], hmm.end());
    }

    #[test]
    fn encoded_observations_requires_sequence() {
        let mut hmm = presets::weather().unwrap();
        assert_eq!(
            Err(Error::EmptyObservationSequence),
            hmm.encoded_observations()
        );
        let empty: [&str; 0] = [];
        hmm.set_emission_sequence(&empty).unwrap();
        assert_eq!(
            Err(Error::EmptyObservationSequence),
            hmm.encoded_observations()
        );
    }

    #[test]
    fn path_log_probability_empty() {
        let empty: [&str; 0] = [];
        let hmm = presets::weather().unwrap();
        assert_eq!(Ok(0.0), hmm.path_log_probability(&empty, &empty));
    }

    #[test]
    fn path_log_probability_by_hand() {
        let hmm = presets::weather().unwrap();
        let lp = hmm
            .path_log_probability(&["Rain", "No Rain"], &["See Umbrella", "See No Umbrella"])
            .unwrap();
        // 0.5 * 0.9 * 0.3 * 0.8 * 1.0
        asserting("log probability")
            .that(&lp)
            .is_close_to(0.108f64.ln(), 1e-12);
    }

    #[test]
    fn path_log_probability_impossible() {
        let mut hmm = presets::casino().unwrap();
        let mut end_l_only = HashMap::new();
        end_l_only.insert("L".to_owned(), 1.0);
        hmm.set_end(&end_l_only).unwrap();
        let lp = hmm.path_log_probability(&["F"], &["6"]).unwrap();
        assert!(lp.is_infinite() & lp.is_sign_negative())
    }
}
