use thiserror::Error;
use tracing::debug;

use crate::models::tips::{CATEGORICAL_COLUMNS, REQUIRED_COLUMNS};
use crate::models::{TipRecord, TipsTable};
use crate::services::stats_service::{self, CorrelationMatrix};

/// Tips upload errors
#[derive(Debug, Error)]
pub enum TipsError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error("The uploaded file contains no data rows")]
    Empty,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Parse and validate an uploaded tips CSV
///
/// The header is checked for every required column before any row is read,
/// so a misnamed column is reported by name rather than as a row failure.
pub fn parse_tips_csv(data: &[u8]) -> Result<TipsTable, TipsError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(TipsError::MissingColumn(required.to_string()));
        }
    }

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        // data rows are numbered from 1, the header is row 0
        let view = RowView {
            headers: &headers,
            row: &row,
            number: idx + 1,
        };
        records.push(view.to_record()?);
    }

    if records.is_empty() {
        return Err(TipsError::Empty);
    }
    debug!("Parsed {} tip records", records.len());
    Ok(TipsTable { records })
}

struct RowView<'a> {
    headers: &'a csv::StringRecord,
    row: &'a csv::StringRecord,
    number: usize,
}

impl<'a> RowView<'a> {
    fn field(&self, column: &str) -> &'a str {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| self.row.get(i))
            .unwrap_or("")
    }

    fn invalid(&self, column: &str) -> TipsError {
        TipsError::InvalidValue {
            row: self.number,
            column: column.to_string(),
            value: self.field(column).to_string(),
        }
    }

    fn number(&self, column: &str) -> Result<f64, TipsError> {
        self.field(column)
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.invalid(column))
    }

    fn text(&self, column: &str) -> Result<String, TipsError> {
        match self.field(column) {
            "" => Err(self.invalid(column)),
            value => Ok(value.to_string()),
        }
    }

    /// Whole, non-negative count; `2.0` is accepted as 2
    fn party_size(&self) -> Result<u32, TipsError> {
        let value = self.number("size")?;
        if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
            return Err(self.invalid("size"));
        }
        Ok(value as u32)
    }

    fn to_record(&self) -> Result<TipRecord, TipsError> {
        Ok(TipRecord {
            total_bill: self.number("total_bill")?,
            tip: self.number("tip")?,
            sex: self.text("sex")?,
            smoker: self.text("smoker")?,
            day: self.text("day")?,
            time: self.text("time")?,
            size: self.party_size()?,
        })
    }
}

/// Mean tip per day, ordered by day name
pub fn mean_tip_by_day(table: &TipsTable) -> Vec<(String, f64)> {
    stats_service::mean_by(&table.records, |r| r.day.as_str(), |r| r.tip)
}

/// Numeric columns followed by one-hot encoded categorical columns
pub fn encoded_features(table: &TipsTable) -> Vec<(String, Vec<f64>)> {
    let records = &table.records;
    let mut columns = vec![
        ("total_bill".to_string(), records.iter().map(|r| r.total_bill).collect()),
        ("tip".to_string(), records.iter().map(|r| r.tip).collect()),
        ("size".to_string(), records.iter().map(|r| r.size as f64).collect()),
    ];

    for name in CATEGORICAL_COLUMNS {
        let values: Vec<&str> = records.iter().filter_map(|r| r.category(name)).collect();
        columns.extend(stats_service::one_hot(name, &values));
    }
    columns
}

pub fn correlation(table: &TipsTable) -> CorrelationMatrix {
    stats_service::correlation_matrix(&encoded_features(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
total_bill,tip,sex,smoker,day,time,size
16.99,1.01,Female,No,Sun,Dinner,2
10.34,1.66,Male,No,Sun,Dinner,3
21.01,3.5,Male,No,Sun,Dinner,3
20.65,3.35,Male,No,Sat,Dinner,3
17.92,4.08,Male,Yes,Sat,Dinner,2
27.2,4.0,Male,No,Thur,Lunch,4
8.77,2.0,Male,No,Sun,Dinner,2
";

    #[test]
    fn test_parse_sample() {
        let table = parse_tips_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 7);
        assert_eq!(table.records[0].sex, "Female");
        assert_eq!(table.records[5].size, 4);
        assert_eq!(table.records[4].tip, 4.08);
    }

    #[test]
    fn test_mean_tip_by_day_matches_reference() {
        let table = parse_tips_csv(SAMPLE.as_bytes()).unwrap();
        let means = mean_tip_by_day(&table);

        let mut days: Vec<&str> = table.records.iter().map(|r| r.day.as_str()).collect();
        days.sort();
        days.dedup();
        assert_eq!(means.len(), days.len());

        for (day, mean) in &means {
            let tips: Vec<f64> = table
                .records
                .iter()
                .filter(|r| &r.day == day)
                .map(|r| r.tip)
                .collect();
            let reference = tips.iter().sum::<f64>() / tips.len() as f64;
            assert!((mean - reference).abs() < 1e-12, "{}: {} vs {}", day, mean, reference);
        }
        assert_eq!(means[0].0, "Sat");
        assert!((means[0].1 - 3.715).abs() < 1e-12);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let csv = "total_bill,tip,sex,smoker,weekday,time,size\n16.99,1.01,Female,No,Sun,Dinner,2\n";
        let err = parse_tips_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, TipsError::MissingColumn(ref c) if c == "day"));
        assert_eq!(err.to_string(), "Missing required column: day");
    }

    #[test]
    fn test_invalid_value_names_row_and_column() {
        let csv = "total_bill,tip,sex,smoker,day,time,size\n16.99,1.01,Female,No,Sun,Dinner,2\n10.34,abc,Male,No,Sun,Dinner,3\n";
        let err = parse_tips_csv(csv.as_bytes()).unwrap_err();
        match err {
            TipsError::InvalidValue { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "tip");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_size_accepts_whole_floats() {
        let csv = "total_bill,tip,sex,smoker,day,time,size\n16.99,1.01,Female,No,Sun,Dinner,2.0\n";
        let table = parse_tips_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.records[0].size, 2);

        for bad in ["2.5", "-1", "two"] {
            let csv = format!("total_bill,tip,sex,smoker,day,time,size\n16.99,1.01,Female,No,Sun,Dinner,{}\n", bad);
            let err = parse_tips_csv(csv.as_bytes()).unwrap_err();
            assert!(
                matches!(err, TipsError::InvalidValue { ref column, ref value, .. } if column == "size" && value == bad),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_header_only_is_empty() {
        let csv = "total_bill,tip,sex,smoker,day,time,size\n";
        assert!(matches!(parse_tips_csv(csv.as_bytes()), Err(TipsError::Empty)));
    }

    #[test]
    fn test_extra_columns_and_order_are_accepted() {
        let csv = "id, size ,day,tip,time,smoker,sex,total_bill\n1,2,Fri,1.5,Lunch,Yes,Female,12.5\n";
        let table = parse_tips_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.records[0].day, "Fri");
        assert_eq!(table.records[0].total_bill, 12.5);
        assert_eq!(table.records[0].size, 2);
    }

    #[test]
    fn test_encoded_features() {
        let table = parse_tips_csv(SAMPLE.as_bytes()).unwrap();
        let names: Vec<String> = encoded_features(&table).into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "total_bill",
                "tip",
                "size",
                "sex_Male",
                "smoker_Yes",
                "day_Sun",
                "day_Thur",
                "time_Lunch"
            ]
        );

        let matrix = correlation(&table);
        assert_eq!(matrix.labels.len(), 8);
        assert!((matrix.values[1][1].unwrap() - 1.0).abs() < 1e-12);
    }
}
