//! Tips dataset models

/// Columns every tips upload must provide
pub const REQUIRED_COLUMNS: [&str; 7] = ["total_bill", "tip", "sex", "smoker", "day", "time", "size"];

/// Categorical columns that are one-hot encoded for the correlation matrix
pub const CATEGORICAL_COLUMNS: [&str; 4] = ["sex", "smoker", "day", "time"];

/// A single validated row of the tips dataset
#[derive(Debug, Clone, PartialEq)]
pub struct TipRecord {
    pub total_bill: f64,
    pub tip: f64,
    pub sex: String,
    pub smoker: String,
    pub day: String,
    pub time: String,
    pub size: u32,
}

impl TipRecord {
    /// Value of a categorical column by name
    pub fn category(&self, column: &str) -> Option<&str> {
        match column {
            "sex" => Some(&self.sex),
            "smoker" => Some(&self.smoker),
            "day" => Some(&self.day),
            "time" => Some(&self.time),
            _ => None,
        }
    }
}

/// A parsed tips upload
#[derive(Debug, Clone)]
pub struct TipsTable {
    pub records: Vec<TipRecord>,
}

impl TipsTable {
    pub fn tips(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.tip).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
