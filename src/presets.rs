//! Ready-made models for demonstrations and tests.
//!
//! The occasionally dishonest casino is from *Biological Sequence Analysis* by Durbin, Eddy, Krogh
//! and Mitchison, 1998. The umbrella world is the weather example from *Artificial Intelligence: A
//! Modern Approach* by Russell and Norvig.

use crate::error::Result;
use crate::model::HiddenMarkovModel;
use ndarray::prelude::*;

const CASINO_STATES: [&str; 2] = ["F", "L"];
const CASINO_EMISSIONS: [&str; 6] = ["1", "2", "3", "4", "5", "6"];

/// 300 rolls, one character per roll
pub const CASINO_TEST_ROLLS: &str = concat!(
    "315116246446644245311321631164152133625144543631656626566666",
    "651166453132651245636664631636663162326455236266666625151631",
    "222555441666566563564324364131513465146353411126414626253356",
    "366163666466232534413661661163252562462255265252266435353336",
    "233121625364414432335163243633665562466662632666612355245242",
);

/// The die used for each of `CASINO_TEST_ROLLS`: `F`air or `L`oaded
pub const CASINO_TEST_DICE: &str = concat!(
    "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFLLLLLLLLLLLLLLL",
    "LLLLLLFFFFFFFFFFFFLLLLLLLLLLLLLLLLFFFLLLLLLLLLLLLLLFFFFFFFFF",
    "FFFFFFFFLLLLLLLLLLLLLFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFLL",
    "LLLLLLLLFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
    "FFFFFFFFFFFFFFFFFFFFFFFFFFFLLLLLLLLLLLLLLLLLLLLLLFFFFFFFFFFF",
);

/// A casino that usually rolls a fair die (`F`) but sometimes switches to a loaded one (`L`) that
/// rolls a six half the time.
pub fn casino() -> Result<HiddenMarkovModel> {
    casino_with_transitions(array![[0.95, 0.05], [0.1, 0.9]])
}

/// The casino with a caller-chosen transition matrix, rows and columns ordered `F`, `L`.
pub fn casino_with_transitions(transition: Array2<f64>) -> Result<HiddenMarkovModel> {
    let fair = 1.0 / 6.0;
    HiddenMarkovModel::from_arrays(
        &CASINO_STATES,
        &CASINO_EMISSIONS,
        transition,
        array![
            [fair, fair, fair, fair, fair, fair],
            [0.1, 0.1, 0.1, 0.1, 0.1, 0.5]
        ],
        array![0.95, 0.05],
        array![0.95, 0.05],
    )
}

/// Store the 300-roll casino trajectory on `hmm`.
pub fn add_casino_test_sequence(hmm: &mut HiddenMarkovModel) -> Result<()> {
    hmm.set_trajectory(&characters(CASINO_TEST_ROLLS), &characters(CASINO_TEST_DICE))
}

/// Whether it rains, guessed from whether the director carries an umbrella.
pub fn weather() -> Result<HiddenMarkovModel> {
    HiddenMarkovModel::from_arrays(
        &["Rain", "No Rain"],
        &["See Umbrella", "See No Umbrella"],
        array![[0.7, 0.3], [0.3, 0.7]],
        array![[0.9, 0.1], [0.2, 0.8]],
        array![0.5, 0.5],
        array![1.0, 1.0],
    )
}

/// Store a five-day umbrella trajectory on `hmm`.
pub fn add_weather_test_sequence(hmm: &mut HiddenMarkovModel) -> Result<()> {
    hmm.set_trajectory(
        &[
            "See Umbrella",
            "See Umbrella",
            "See No Umbrella",
            "See Umbrella",
            "See Umbrella",
        ],
        &["Rain", "Rain", "No Rain", "Rain", "Rain"],
    )
}

fn characters(s: &str) -> Vec<String> {
    s.chars().map(String::from).collect()
}
