use serde::Serialize;

/// Seconds recorded by the timing system; `None` for DNF/DSQ/DNS/blank/zero cells.
pub type TimeValue = Option<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryStatus {
    Valid,
    Dnf,
    Dsq,
    Dns,
    Err,
}

impl EntryStatus {
    /// Maps a status cell to a status. Blank cells are normal finishers;
    /// unknown tokens yield `None` so the caller can decide how to log them.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "" | "OK" | "VALID" => Some(EntryStatus::Valid),
            "DNF" => Some(EntryStatus::Dnf),
            "DSQ" => Some(EntryStatus::Dsq),
            "DNS" => Some(EntryStatus::Dns),
            "ERR" => Some(EntryStatus::Err),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Valid => "VALID",
            EntryStatus::Dnf => "DNF",
            EntryStatus::Dsq => "DSQ",
            EntryStatus::Dns => "DNS",
            EntryStatus::Err => "ERR",
        }
    }

    pub fn is_valid(self) -> bool {
        self == EntryStatus::Valid
    }

    /// DNF and DSQ are officiating decisions and are never overridden by ERR.
    pub fn is_officiated_out(self) -> bool {
        matches!(self, EntryStatus::Dnf | EntryStatus::Dsq)
    }

    /// Split times of DNF/DSQ entries still count for split rankings.
    pub fn contributes_splits(self) -> bool {
        !matches!(self, EntryStatus::Dns | EntryStatus::Err)
    }

    pub fn contributes_finish(self) -> bool {
        self.is_valid()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Split(usize),
    Finish,
}

impl Column {
    pub fn label(self) -> String {
        match self {
            Column::Split(idx) => format!("Split {}", idx + 1),
            Column::Finish => "Finish".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunEntry {
    pub bib: String,
    pub splits: Vec<TimeValue>,
    pub finish: TimeValue,
    pub status: EntryStatus,
    pub error_notes: Vec<String>,
}

impl RunEntry {
    pub fn new(bib: impl Into<String>, splits: Vec<TimeValue>, finish: TimeValue) -> Self {
        Self {
            bib: bib.into(),
            splits,
            finish,
            status: EntryStatus::Valid,
            error_notes: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = status;
        self
    }

    pub fn split(&self, idx: usize) -> TimeValue {
        self.splits.get(idx).copied().flatten()
    }

    pub fn value(&self, column: Column) -> TimeValue {
        match column {
            Column::Split(idx) => self.split(idx),
            Column::Finish => self.finish,
        }
    }

    pub fn has_any_time(&self) -> bool {
        self.splits.iter().any(|v| recorded(*v).is_some()) || recorded(self.finish).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub id: u32,
    pub entries: Vec<RunEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub num_splits: usize,
    pub split_labels: Vec<String>,
    /// Ascending by run id.
    pub runs: Vec<Run>,
}

impl Session {
    pub fn entry_count(&self) -> usize {
        self.runs.iter().map(|r| r.entries.len()).sum()
    }
}

/// A time that actually counts: present and strictly positive.
pub fn recorded(value: TimeValue) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

/// Bibs are compared numerically when they are numeric, so `007` and `7` match.
pub fn normalize_bib(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let stripped = trimmed.trim_start_matches('0');
        if stripped.is_empty() {
            return "0".to_string();
        }
        return stripped.to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/entry.rs"]
mod tests;
