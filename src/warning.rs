use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    NoScenariosDetected,
    OrphanContinuation,
    SideUnresolved,
    SharedScenarioSkipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractWarning {
    pub code: WarningCode,
    pub message: String,
    pub page: Option<u32>,
    pub scenario: Option<u32>,
    pub table: Option<String>,
}

impl ExtractWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
            scenario: None,
            table: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_scenario(mut self, scenario: u32) -> Self {
        self.scenario = Some(scenario);
        self
    }

    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
}

/// Run-level diagnostics threaded through every stage. Nothing in here is
/// ever fatal; the CLI reports the contents at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub warnings: Vec<ExtractWarning>,
    pub unknown_symbols: BTreeSet<char>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn warn(&mut self, warning: ExtractWarning) {
        self.warnings.push(warning);
    }

    pub(crate) fn record_unknown_symbol(&mut self, symbol: char) {
        self.unknown_symbols.insert(symbol);
    }
}
