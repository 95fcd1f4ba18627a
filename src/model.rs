use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Plain text of a single PDF page, as delivered by the text-extraction
/// layer. An empty `text` means extraction failed for that page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Confederate,
    Union,
}

/// A raw setup table as it appears in the booklet text, before any row is
/// interpreted. Rows accumulate in source order, including across a page
/// break, until the next table header or scenario boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub name: String,
    pub page_numbers: Vec<u32>,
    pub header_row: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub annotations: BTreeMap<String, String>,
}

impl RawTable {
    pub(crate) fn new(name: impl Into<String>, page: u32) -> Self {
        Self {
            name: name.into(),
            page_numbers: vec![page],
            ..Self::default()
        }
    }

    /// Records a page the table spans. Pages arrive in order, so a
    /// membership check is enough to avoid duplicates.
    pub(crate) fn record_page(&mut self, page: u32) {
        if !self.page_numbers.contains(&page) {
            self.page_numbers.push(page);
        }
    }
}

/// All raw tables found for one scenario, grouped by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawScenarioTables {
    pub scenario_number: u32,
    pub scenario_name: String,
    pub start_page: u32,
    pub end_page: u32,
    pub advanced_game_rules_page: Option<u32>,
    pub confederate_tables: Vec<RawTable>,
    pub union_tables: Vec<RawTable>,
}

/// One parsed unit row. `size` and `unit_type` hold values from the
/// configured vocabularies; `manpower_value` keeps any footnote glyphs for
/// display while `notes` carries the extracted symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub unit_leader: String,
    pub size: String,
    pub command: String,
    pub unit_type: String,
    pub manpower_value: String,
    pub hex_location: String,
    pub side: Side,
    pub notes: Vec<String>,
    pub turn: Option<String>,
    pub reinforcement_set: Option<String>,
    pub table_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedScenario {
    pub number: u32,
    pub name: String,
    pub start_page: u32,
    pub confederate_units: Vec<Unit>,
    pub union_units: Vec<Unit>,
    pub confederate_footnotes: BTreeMap<String, String>,
    pub union_footnotes: BTreeMap<String, String>,
}

impl ParsedScenario {
    pub(crate) fn new(number: u32, name: impl Into<String>, start_page: u32) -> Self {
        Self {
            number,
            name: name.into(),
            start_page,
            confederate_units: Vec::new(),
            union_units: Vec::new(),
            confederate_footnotes: BTreeMap::new(),
            union_footnotes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.confederate_units.is_empty() && self.union_units.is_empty()
    }
}
