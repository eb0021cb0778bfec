//! CSV export of an assembled record with its prediction.
//!
//! One header row (declared features, then `Prediction`) and one data row.
//! Codes are written as integers and measurements in shortest float form.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::{PatientRecord, PredictionResult, Target};

/// Error type for export operations.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Cannot write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Export filename for a target.
#[must_use]
pub fn export_file_name(target: Target) -> String {
    format!("slecare_prediction_{}.csv", target.file_stem())
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render the record and prediction as CSV text.
#[must_use]
pub fn to_csv(record: &PatientRecord, prediction: &PredictionResult) -> String {
    let header: Vec<String> = record
        .names()
        .chain(std::iter::once("Prediction"))
        .map(quote)
        .collect();
    let row: Vec<String> = record
        .iter()
        .map(|(_, value)| value.to_string())
        .chain(std::iter::once(prediction.label.to_string()))
        .map(|v| quote(&v))
        .collect();

    format!("{}\n{}\n", header.join(","), row.join(","))
}

/// Write the CSV export into `dir`, returning the file path.
///
/// # Errors
/// Returns `ExportError::Write` if the directory or file cannot be written.
pub fn write_csv(
    dir: &Path,
    record: &PatientRecord,
    prediction: &PredictionResult,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_file_name(record.target));
    let to_err = |source| ExportError::Write {
        path: path.display().to_string(),
        source,
    };

    fs::create_dir_all(dir).map_err(to_err)?;
    let mut file = fs::File::create(&path).map_err(to_err)?;
    file.write_all(to_csv(record, prediction).as_bytes())
        .map_err(to_err)?;

    tracing::info!(path = %path.display(), "Exported prediction");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{assemble, Pipeline, RawInput, RawValue, TargetSchema};

    fn record() -> PatientRecord {
        let schema = TargetSchema::from_feature_list(
            Pipeline::CurrentState,
            Target::Remission,
            vec!["AC KIDNEY INJURY INITIAL (AKI)".into(), "UPCR".into(), "RACE".into()],
            "inline",
        )
        .unwrap();
        let raw: RawInput = [
            ("RACE", RawValue::Choice(2)),
            ("UPCR", RawValue::Number(1.25)),
            ("AC KIDNEY INJURY INITIAL (AKI)", RawValue::Choice(0)),
        ]
        .iter()
        .map(|(n, v)| (n.to_string(), *v))
        .collect();
        assemble(&schema, &raw).unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let prediction = PredictionResult::interpret(Target::Remission, 0);
        let csv = to_csv(&record(), &prediction);
        assert_eq!(
            csv,
            "AC KIDNEY INJURY INITIAL (AKI),UPCR,RACE,Prediction\n0,1.25,2,0\n"
        );
    }

    #[test]
    fn test_quote_fields() {
        assert_eq!(quote("A,B"), "\"A,B\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote("ACE/ARB"), "ACE/ARB");
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let prediction = PredictionResult::interpret(Target::Remission, 1);
        let path = write_csv(&dir.path().join("exports"), &record(), &prediction).unwrap();

        assert!(path.ends_with("slecare_prediction_remission.csv"));
        let written = fs::read_to_string(path).unwrap();
        assert!(written.ends_with(",1\n"));
    }
}
