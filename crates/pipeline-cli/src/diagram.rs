//! Pipeline diagram: one row per issued instruction, one column per cycle.
//!
//! Only the most recent rows are kept, and each row stores its cycles from the
//! first non-idle stage on, so long-running loops render a bounded window.

use std::collections::VecDeque;
use std::fmt::Write as _;

use pipeline_core::{SimEvent, Stage, Trace, TraceEntry, TraceSink};

/// Width of the instruction column.
pub const INSTRUCTION_WIDTH: usize = 25;
/// Width of each cycle column.
pub const CELL_WIDTH: usize = 10;
/// Rows kept by [`DiagramRecorder::new`].
pub const DEFAULT_DIAGRAM_ROWS: usize = 64;

/// One issued instruction and the cycles it spent in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramRow {
    /// Program index of the instruction.
    pub index: usize,
    /// Global cycle of the first non-idle entry.
    pub start: usize,
    /// Entries from `start` to the end of the trace.
    pub entries: Vec<TraceEntry>,
}

impl DiagramRow {
    fn from_trace(index: usize, trace: &Trace) -> Self {
        let start = trace
            .iter()
            .position(|entry| entry.stage != Stage::Idle)
            .unwrap_or(trace.len());
        Self {
            index,
            start,
            entries: trace.entries()[start..].to_vec(),
        }
    }

    /// Cycle just past the row's last entry.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.entries.len()
    }
}

/// Sink that collects completed traces in issue order, keeping the latest rows.
#[derive(Debug, Clone)]
pub struct DiagramRecorder {
    rows: VecDeque<DiagramRow>,
    limit: Option<usize>,
    omitted: usize,
}

impl Default for DiagramRecorder {
    fn default() -> Self {
        Self::with_row_limit(Some(DEFAULT_DIAGRAM_ROWS))
    }
}

impl DiagramRecorder {
    /// Creates a recorder keeping the last [`DEFAULT_DIAGRAM_ROWS`] rows.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder keeping at most `limit` rows; `None` keeps all.
    #[must_use]
    pub const fn with_row_limit(limit: Option<usize>) -> Self {
        Self {
            rows: VecDeque::new(),
            limit,
            omitted: 0,
        }
    }

    /// Rows kept, oldest first.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &DiagramRow> {
        self.rows.iter()
    }

    /// Rows dropped to stay within the limit.
    #[must_use]
    pub const fn omitted(&self) -> usize {
        self.omitted
    }

    fn push(&mut self, row: DiagramRow) {
        match self.limit {
            Some(0) => {
                self.omitted += 1;
                return;
            }
            Some(limit) if self.rows.len() == limit => {
                self.rows.pop_front();
                self.omitted += 1;
            }
            _ => {}
        }
        self.rows.push_back(row);
    }

    /// Renders the kept rows; `lines` gives the display text per program index.
    ///
    /// Columns span from the earliest kept start cycle to the latest end.
    #[must_use]
    pub fn render(&self, lines: &[String]) -> String {
        let first = self.rows.iter().map(|row| row.start).min().unwrap_or(0);
        let last = self.rows.iter().map(DiagramRow::end).max().unwrap_or(0);
        let mut out = String::new();

        if self.omitted > 0 {
            let _ = writeln!(out, "({} earlier row(s) not shown)", self.omitted);
        }

        let mut header = format!("{:<INSTRUCTION_WIDTH$}", "Instruction");
        for cycle in first + 1..=last {
            let _ = write!(header, "{cycle:<CELL_WIDTH$}");
        }
        out.push_str(header.trim_end());
        out.push('\n');

        for row in &self.rows {
            let text = lines.get(row.index).map_or("?", String::as_str);
            let mut line = format!("{text:<INSTRUCTION_WIDTH$}");
            for _ in first..row.start {
                let _ = write!(line, "{:<CELL_WIDTH$}", "");
            }
            for entry in &row.entries {
                let _ = write!(line, "{:<CELL_WIDTH$}", cell(entry));
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

impl TraceSink for DiagramRecorder {
    fn on_event(&mut self, event: SimEvent<'_>) {
        if let SimEvent::TraceCompleted { index, trace } = event {
            self.push(DiagramRow::from_trace(index, trace));
        }
    }
}

/// Text shown for one trace entry.
#[must_use]
pub fn cell(entry: &TraceEntry) -> String {
    match entry.stage {
        _ if entry.stalled => "stall".to_string(),
        Stage::Idle | Stage::Complete => String::new(),
        stage if stage.is_memory() => "MEM".to_string(),
        stage => stage.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{cell, DiagramRecorder};
    use pipeline_core::{SimEvent, Stage, Trace, TraceEntry, TraceSink};

    fn entry(stage: Stage, stalled: bool) -> TraceEntry {
        TraceEntry { stage, stalled }
    }

    fn complete(recorder: &mut DiagramRecorder, index: usize, stages: &[Stage]) {
        let trace = Trace::from_stages(stages.iter().copied());
        recorder.on_event(SimEvent::TraceCompleted {
            index,
            trace: &trace,
        });
    }

    const FIVE: [Stage; 5] = [
        Stage::Fetch,
        Stage::Decode,
        Stage::Execute,
        Stage::Mem1,
        Stage::WriteBack,
    ];

    fn delayed(idle: usize) -> Vec<Stage> {
        let mut stages = vec![Stage::Idle; idle];
        stages.extend(FIVE);
        stages
    }

    #[test]
    fn cells_hide_idle_and_collapse_memory_stages() {
        assert_eq!(cell(&entry(Stage::Idle, false)), "");
        assert_eq!(cell(&entry(Stage::Fetch, false)), "IF");
        assert_eq!(cell(&entry(Stage::Decode, true)), "stall");
        assert_eq!(cell(&entry(Stage::Mem1, false)), "MEM");
        assert_eq!(cell(&entry(Stage::Mem3, false)), "MEM");
        assert_eq!(cell(&entry(Stage::WriteBack, false)), "WB");
    }

    #[test]
    fn rows_drop_leading_idle_cycles() {
        let mut recorder = DiagramRecorder::new();
        complete(&mut recorder, 4, &delayed(3));

        let row = recorder.rows().next().expect("one row");
        assert_eq!(row.index, 4);
        assert_eq!(row.start, 3);
        assert_eq!(row.entries.len(), 5);
        assert_eq!(row.end(), 8);
    }

    #[test]
    fn render_aligns_cycles_into_columns() {
        let mut recorder = DiagramRecorder::new();
        complete(&mut recorder, 0, &FIVE);
        complete(&mut recorder, 1, &delayed(1));
        let lines = vec!["LI $1, 10".to_string(), "ADD $3, $1, $2".to_string()];

        let rendered = recorder.render(&lines);
        let rows: Vec<&str> = rendered.lines().collect();

        assert_eq!(
            rows[0],
            format!("{:<25}{:<10}{:<10}{:<10}{:<10}{:<10}6", "Instruction", 1, 2, 3, 4, 5)
        );
        assert_eq!(
            rows[1],
            format!("{:<25}{:<10}{:<10}{:<10}{:<10}WB", "LI $1, 10", "IF", "ID", "EX", "MEM")
        );
        assert_eq!(
            rows[2],
            format!(
                "{:<25}{:<10}{:<10}{:<10}{:<10}{:<10}WB",
                "ADD $3, $1, $2", "", "IF", "ID", "EX", "MEM"
            )
        );
    }

    #[test]
    fn row_limit_keeps_the_latest_rows_and_narrows_the_window() {
        let mut recorder = DiagramRecorder::with_row_limit(Some(2));
        for index in 0..5 {
            complete(&mut recorder, index, &delayed(index * 100));
        }
        let lines: Vec<String> = (0..5).map(|n| format!("LI ${n}, {n}")).collect();

        assert_eq!(recorder.omitted(), 3);
        assert_eq!(
            recorder.rows().map(|row| row.index).collect::<Vec<_>>(),
            vec![3, 4]
        );

        let rendered = recorder.render(&lines);
        let rows: Vec<&str> = rendered.lines().collect();
        assert_eq!(rows[0], "(3 earlier row(s) not shown)");
        assert!(rows[1].starts_with(&format!("{:<25}{:<10}", "Instruction", 301)));
        assert!(rows[2].starts_with(&format!("{:<25}IF", "LI $3, 3")));
        assert_eq!(rows.len(), 4);
        assert!(rendered.len() < 2 * 1024 * 4);
    }

    #[test]
    fn zero_limit_keeps_nothing() {
        let mut recorder = DiagramRecorder::with_row_limit(Some(0));
        complete(&mut recorder, 0, &FIVE);

        assert_eq!(recorder.rows().len(), 0);
        assert_eq!(recorder.omitted(), 1);
    }

    #[test]
    fn unlimited_recorder_keeps_every_row() {
        let mut recorder = DiagramRecorder::with_row_limit(None);
        for index in 0..100 {
            complete(&mut recorder, index, &FIVE);
        }
        assert_eq!(recorder.rows().len(), 100);
        assert_eq!(recorder.omitted(), 0);
    }

    #[test]
    fn empty_recorder_renders_only_the_header() {
        assert_eq!(DiagramRecorder::new().render(&[]), "Instruction\n");
    }
}
