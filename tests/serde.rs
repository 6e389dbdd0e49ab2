#![cfg(feature = "serde-1")]

use hmmdecode::*;
use serde_json::json;

#[test]
fn model_survives_json() {
    let mut hmm = presets::weather().unwrap();
    presets::add_weather_test_sequence(&mut hmm).unwrap();
    let json = serde_json::to_string(&hmm).unwrap();
    let restored: HiddenMarkovModel = serde_json::from_str(&json).unwrap();
    assert_eq!(hmm, restored);
    assert_eq!(
        ViterbiDecoder.decode(&hmm).unwrap(),
        ViterbiDecoder.decode(&restored).unwrap()
    );
}

#[test]
fn confusion_counts_as_json() {
    let counts = ConfusionCounts {
        true_positives: 1,
        false_positives: 2,
        true_negatives: 3,
        false_negatives: 4,
    };
    let value = serde_json::to_value(&counts).unwrap();
    assert_eq!(4, value["false_negatives"]);
}

fn weather_json() -> serde_json::Value {
    let mut hmm = presets::weather().unwrap();
    presets::add_weather_test_sequence(&mut hmm).unwrap();
    serde_json::to_value(&hmm).unwrap()
}

#[test]
fn bad_row_sum_is_rejected() {
    let mut value = weather_json();
    value["transition"]["data"] = json!([5.0, 5.0, 5.0, 5.0]);
    assert!(serde_json::from_value::<HiddenMarkovModel>(value).is_err());
}

#[test]
fn row_just_above_one_is_rejected() {
    let mut value = weather_json();
    value["transition"]["data"] = json!([0.700004, 0.3, 0.3, 0.7]);
    assert!(serde_json::from_value::<HiddenMarkovModel>(value).is_err());
}

#[test]
fn wrong_dimensions_are_rejected() {
    let mut value = weather_json();
    value["emission"] = json!({"v": 1, "dim": [1, 2], "data": [0.9, 0.1]});
    assert!(serde_json::from_value::<HiddenMarkovModel>(value).is_err());

    let mut value = weather_json();
    value["begin"] = json!({"v": 1, "dim": [3], "data": [0.5, 0.5, 0.0]});
    assert!(serde_json::from_value::<HiddenMarkovModel>(value).is_err());
}

#[test]
fn bad_labels_are_rejected() {
    let mut value = weather_json();
    value["states"] = json!(["Rain", "Rain"]);
    assert!(serde_json::from_value::<HiddenMarkovModel>(value).is_err());

    let mut value = weather_json();
    value["emission_sequence"] = json!(["Umbrella", "Hat", "Umbrella", "Umbrella", "Umbrella"]);
    assert!(serde_json::from_value::<HiddenMarkovModel>(value).is_err());
}

#[test]
fn table_dimensions_are_checked() {
    let table = ProbabilityTable::transitions(&["a", "b"], 0.5).unwrap();
    let mut value = serde_json::to_value(&table).unwrap();
    value["values"] = json!({"v": 1, "dim": [1, 1], "data": [1.0]});
    assert!(serde_json::from_value::<ProbabilityTable>(value).is_err());

    let labels = json!({"kind": "State", "names": ["a", "a"]});
    assert!(serde_json::from_value::<LabelSet>(labels).is_err());
}
