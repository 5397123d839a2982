use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Worsening,
    Variable,
    InsufficientData,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Worsening => "worsening",
            Trend::Variable => "variable",
            Trend::InsufficientData => "insufficient_data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunTime {
    pub run_id: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AthleteProgression {
    pub bib: String,
    pub runs_entered: usize,
    pub completed_runs: usize,

    pub per_split_best: Vec<Option<f64>>,
    pub finish_best: Option<f64>,
    pub per_split_improvement_count: Vec<u32>,
    pub finish_improvement_count: u32,
    /// `100 / (1 + variance)`; `None` with fewer than two observations.
    pub per_split_consistency: Vec<Option<f64>>,
    pub finish_consistency: Option<f64>,
    pub per_split_trend: Vec<Trend>,
    pub trend: Trend,

    pub split_history: Vec<Vec<RunTime>>,
    pub finish_history: Vec<RunTime>,
    pub average_finish: Option<f64>,
    pub improvement_rate: Option<f64>,
    pub best_run: Option<u32>,
    pub warnings: Vec<String>,
}

impl AthleteProgression {
    pub fn completion_rate(&self) -> f64 {
        if self.runs_entered == 0 {
            return 0.0;
        }
        self.completed_runs as f64 / self.runs_entered as f64 * 100.0
    }

    pub fn performance_notes(&self, consistent: f64, inconsistent: f64) -> Vec<&'static str> {
        let mut notes = Vec::new();
        match self.trend {
            Trend::Improving => notes.push("Consistent improvement"),
            Trend::Worsening => notes.push("Performance declining"),
            _ => {}
        }
        if let Some(score) = self.finish_consistency {
            if score > consistent {
                notes.push("Very consistent");
            } else if score < inconsistent {
                notes.push("Inconsistent");
            }
        }
        notes
    }
}
