use serde::Serialize;

use crate::model::entry::{Column, recorded};
use crate::model::thresholds::ValidationProfile;
use crate::pipeline::stage2_statistics::RunStatistics;
use crate::pipeline::stage3_validate::ValidatedRun;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedItem {
    pub value: f64,
    pub bib: String,
    pub entry_index: usize,
}

/// Times of one column, ascending. Built per run and dropped once the cell
/// ranks are derived.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedColumn {
    pub column: Column,
    pub items: Vec<RankedItem>,
}

impl RankedColumn {
    pub fn collect(run: &ValidatedRun, column: Column) -> Self {
        let mut items = run
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| match column {
                Column::Split(_) => e.status.contributes_splits(),
                Column::Finish => e.status.contributes_finish(),
            })
            .filter_map(|(idx, e)| {
                recorded(e.value(column)).map(|value| RankedItem {
                    value,
                    bib: e.bib.clone(),
                    entry_index: idx,
                })
            })
            .collect::<Vec<_>>();
        // sort_by is stable: ties keep entry order
        items.sort_by(|a, b| a.value.total_cmp(&b.value));
        Self { column, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn best(&self) -> Option<f64> {
        self.items.first().map(|i| i.value)
    }
}

/// What a renderer needs to colour one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellRank {
    pub rank: usize,
    pub total_ranked: usize,
    pub is_acceleration_ramp: bool,
    pub opacity: f64,
    pub diff_to_best: f64,
}

impl CellRank {
    pub fn gradient_position(&self) -> f64 {
        gradient_position(self.rank, self.total_ranked)
    }
}

/// Position of a 1-based rank on [0, 1]; 0 is the best time. Single-item
/// columns map to 0.
pub fn gradient_position(rank: usize, total: usize) -> f64 {
    if total <= 1 || rank == 0 {
        return 0.0;
    }
    (rank - 1) as f64 / (total - 1) as f64
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntryRanks {
    pub splits: Vec<Option<CellRank>>,
    pub finish: Option<CellRank>,
}

impl EntryRanks {
    pub fn cell(&self, column: Column) -> Option<&CellRank> {
        match column {
            Column::Split(idx) => self.splits.get(idx).and_then(|c| c.as_ref()),
            Column::Finish => self.finish.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRanking {
    pub run_id: u32,
    /// Indexed like `ValidatedRun::entries`.
    pub entries: Vec<EntryRanks>,
    pub split_best: Vec<Option<f64>>,
    pub finish_best: Option<f64>,
}

pub fn run_stage4(
    run: &ValidatedRun,
    stats: &RunStatistics,
    num_splits: usize,
    profile: &ValidationProfile,
) -> RunRanking {
    let mut entries = vec![
        EntryRanks {
            splits: vec![None; num_splits],
            finish: None,
        };
        run.entries.len()
    ];
    let mut split_best = Vec::with_capacity(num_splits);

    for idx in 0..num_splits {
        let column = Column::Split(idx);
        let ranked = RankedColumn::collect(run, column);
        split_best.push(ranked.best());
        for (entry_index, cell) in cell_ranks(&ranked, stats, profile) {
            entries[entry_index].splits[idx] = Some(cell);
        }
    }

    let ranked = RankedColumn::collect(run, Column::Finish);
    let finish_best = ranked.best();
    for (entry_index, cell) in cell_ranks(&ranked, stats, profile) {
        entries[entry_index].finish = Some(cell);
    }

    RunRanking {
        run_id: run.id,
        entries,
        split_best,
        finish_best,
    }
}

fn cell_ranks(
    ranked: &RankedColumn,
    stats: &RunStatistics,
    profile: &ValidationProfile,
) -> Vec<(usize, CellRank)> {
    let is_acceleration_ramp = stats.is_acceleration(ranked.column);
    let opacity = if is_acceleration_ramp {
        profile.accel_opacity
    } else {
        profile.regular_opacity
    };
    let best = ranked.best().unwrap_or(0.0);
    let total_ranked = ranked.len();

    ranked
        .items
        .iter()
        .enumerate()
        .map(|(pos, item)| {
            (
                item.entry_index,
                CellRank {
                    rank: pos + 1,
                    total_ranked,
                    is_acceleration_ramp,
                    opacity,
                    diff_to_best: item.value - best,
                },
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_rank.rs"]
mod tests;
