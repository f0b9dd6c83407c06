use jiff::Timestamp;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlsRow {
    pub timestamp: Timestamp,
    pub tries: usize,
    pub flips: usize,
    pub current: f64,
    pub best: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRow {
    pub timestamp: Timestamp,
    pub generation: usize,
    pub best: f64,
    pub average: f64,
    pub diversity: f64,
}

/// Per iteration progress of an optimizer run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum RunStatistics {
    Sls(Vec<SlsRow>),
    Generations(Vec<GenerationRow>),
}

impl RunStatistics {
    pub fn len(&self) -> usize {
        match self {
            RunStatistics::Sls(rows) => rows.len(),
            RunStatistics::Generations(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            RunStatistics::Sls(_) => &["tries", "flips", "current", "best"],
            RunStatistics::Generations(_) => &["generation", "best", "average", "diversity"],
        }
    }

    /// Rows formatted for display, in the order of [`RunStatistics::headers`].
    pub fn formatted_rows(&self) -> Vec<Vec<String>> {
        match self {
            RunStatistics::Sls(rows) => rows
                .iter()
                .map(|row| {
                    vec![
                        row.tries.to_string(),
                        row.flips.to_string(),
                        format!("{:.2}", row.current),
                        format!("{:.2}", row.best),
                    ]
                })
                .collect(),
            RunStatistics::Generations(rows) => rows
                .iter()
                .map(|row| {
                    vec![
                        row.generation.to_string(),
                        format!("{:.2}", row.best),
                        format!("{:.2}", row.average),
                        format!("{:.4}", row.diversity),
                    ]
                })
                .collect(),
        }
    }
}
