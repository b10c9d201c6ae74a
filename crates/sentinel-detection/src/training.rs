//! Training rows for baseline construction.

use ml_sentinel_core::{events::FeatureMap, Error, Result};
use serde::Deserialize;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

type SampleRow = (
    i64,
    &'static str,
    i64,
    &'static str,
    i64,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    i64,
    i64,
    i64,
    &'static str,
);

/// Ten adult-census rows the bundled model was fitted on (income label omitted).
#[rustfmt::skip]
const SAMPLE: [SampleRow; 10] = [
    (39, "State-gov", 77516, "Bachelors", 13, "Never-married", "Adm-clerical", "Not-in-family", "White", "Male", 2174, 0, 40, "United-States"),
    (50, "Self-emp-not-inc", 83311, "Bachelors", 13, "Married-civ-spouse", "Exec-managerial", "Husband", "White", "Male", 0, 0, 13, "United-States"),
    (38, "Private", 215646, "HS-grad", 9, "Divorced", "Handlers-cleaners", "Not-in-family", "White", "Male", 0, 0, 40, "United-States"),
    (53, "Private", 234721, "11th", 7, "Married-civ-spouse", "Handlers-cleaners", "Husband", "Black", "Male", 0, 0, 40, "United-States"),
    (28, "Private", 338409, "Bachelors", 13, "Married-civ-spouse", "Prof-specialty", "Wife", "Black", "Female", 0, 0, 40, "Cuba"),
    (37, "Private", 284582, "Masters", 14, "Married-civ-spouse", "Exec-managerial", "Wife", "White", "Female", 0, 0, 40, "United-States"),
    (49, "Private", 160187, "9th", 5, "Married-spouse-absent", "Other-service", "Not-in-family", "Black", "Female", 0, 0, 16, "Jamaica"),
    (52, "Self-emp-not-inc", 209642, "HS-grad", 9, "Married-civ-spouse", "Exec-managerial", "Husband", "White", "Male", 0, 0, 45, "United-States"),
    (31, "Private", 45781, "Masters", 14, "Never-married", "Prof-specialty", "Not-in-family", "White", "Female", 14084, 0, 50, "United-States"),
    (42, "Private", 159449, "Bachelors", 13, "Married-civ-spouse", "Exec-managerial", "Husband", "White", "Male", 5178, 0, 40, "United-States"),
];

fn to_feature_map(row: &SampleRow) -> FeatureMap {
    FeatureMap::from([
        ("age".to_string(), row.0.into()),
        ("workclass".to_string(), row.1.into()),
        ("fnlwgt".to_string(), row.2.into()),
        ("education".to_string(), row.3.into()),
        ("education_num".to_string(), row.4.into()),
        ("marital_status".to_string(), row.5.into()),
        ("occupation".to_string(), row.6.into()),
        ("relationship".to_string(), row.7.into()),
        ("race".to_string(), row.8.into()),
        ("sex".to_string(), row.9.into()),
        ("capital_gain".to_string(), row.10.into()),
        ("capital_loss".to_string(), row.11.into()),
        ("hours_per_week".to_string(), row.12.into()),
        ("native_country".to_string(), row.13.into()),
    ])
}

/// The built-in sample training set
pub fn sample_rows() -> Vec<FeatureMap> {
    SAMPLE.iter().map(to_feature_map).collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TrainingLine {
    Wrapped { features: FeatureMap },
    Bare(FeatureMap),
}

/// Read newline-delimited JSON training rows.
///
/// Each line is either a bare feature map or an object carrying one under
/// `features` (so audit log lines are accepted too). Blank lines are skipped;
/// any other unparseable line fails the whole load.
pub fn load_training_rows(path: &Path) -> Result<Vec<FeatureMap>> {
    let file = File::open(path).map_err(|e| {
        Error::TrainingData(format!("cannot open {}: {e}", path.display()))
    })?;

    let mut rows = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = match serde_json::from_str::<TrainingLine>(&line) {
            Ok(TrainingLine::Wrapped { features }) | Ok(TrainingLine::Bare(features)) => features,
            Err(e) => {
                return Err(Error::TrainingData(format!(
                    "{} line {}: {e}",
                    path.display(),
                    i + 1
                )))
            }
        };
        rows.push(row);
    }
    Ok(rows)
}
