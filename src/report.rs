use std::fmt::Write as _;

use crate::model::{ParsedScenario, RawScenarioTables};
use crate::warning::{Diagnostics, ExtractWarning};

/// End-of-run summary for one game's pipeline pass. Always produced, even
/// when the output is empty; the CLI decides the exit code from the counts.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub scenario_count: usize,
    pub table_count: usize,
    pub row_count: usize,
    pub confederate_unit_count: usize,
    pub union_unit_count: usize,
    pub warnings: Vec<ExtractWarning>,
    pub unknown_symbols: Vec<char>,
}

impl ExtractionReport {
    #[must_use]
    pub fn for_raw(scenarios: &[RawScenarioTables], diagnostics: &Diagnostics) -> Self {
        fn tables(
            scenario: &RawScenarioTables,
        ) -> impl Iterator<Item = &crate::model::RawTable> {
            scenario
                .confederate_tables
                .iter()
                .chain(&scenario.union_tables)
        }

        Self {
            scenario_count: scenarios.len(),
            table_count: scenarios.iter().flat_map(tables).count(),
            row_count: scenarios
                .iter()
                .flat_map(tables)
                .map(|table| table.rows.len())
                .sum(),
            confederate_unit_count: 0,
            union_unit_count: 0,
            warnings: diagnostics.warnings.clone(),
            unknown_symbols: diagnostics.unknown_symbols.iter().copied().collect(),
        }
    }

    #[must_use]
    pub fn for_parsed(
        raw: &[RawScenarioTables],
        scenarios: &[ParsedScenario],
        diagnostics: &Diagnostics,
    ) -> Self {
        let mut report = Self::for_raw(raw, diagnostics);
        report.scenario_count = scenarios.len();
        report.confederate_unit_count = scenarios
            .iter()
            .map(|scenario| scenario.confederate_units.len())
            .sum();
        report.union_unit_count = scenarios
            .iter()
            .map(|scenario| scenario.union_units.len())
            .sum();
        report
    }

    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.confederate_unit_count + self.union_unit_count
    }

    /// Human-readable one-paragraph summary, ending with the unknown-symbol
    /// listing when any turned up.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} scenario(s), {} table(s), {} row(s)",
            self.scenario_count, self.table_count, self.row_count
        );
        if self.unit_count() > 0 {
            let _ = write!(
                out,
                "; {} Confederate / {} Union unit(s)",
                self.confederate_unit_count, self.union_unit_count
            );
        }
        if !self.warnings.is_empty() {
            let _ = write!(out, "; {} warning(s)", self.warnings.len());
        }
        if !self.unknown_symbols.is_empty() {
            let symbols: String = self.unknown_symbols.iter().collect();
            let _ = write!(
                out,
                "\nunknown footnote symbols: {symbols} (extend the configured footnote_symbols)"
            );
        }
        out
    }
}
