mod config;
mod dedup;
mod error;
mod json_out;
mod model;
mod pdf_reader;
mod report;
mod scenario;
mod table_detect;
mod unit_parse;
mod warning;

use std::path::Path;

pub use config::{Column, ConfigFile, GameConfig, PageWindow};
pub use error::ExtractError;
pub use model::{PageText, ParsedScenario, RawScenarioTables, RawTable, Side, Unit};
pub use report::ExtractionReport;
pub use warning::{Diagnostics, ExtractWarning, WarningCode};

/// Stage 1: groups page text lines into named per-scenario tables. The
/// window narrows the scan when one PDF holds several game booklets; when
/// absent, the game's configured page range (or the whole document) is
/// used.
pub fn extract_raw_tables(
    pages: &[PageText],
    window: Option<PageWindow>,
    config: &GameConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<RawScenarioTables> {
    table_detect::extract_raw_tables(pages, window, config, diagnostics)
}

/// Stages 2 and 3: converts raw tables into structured units, then
/// deduplicates leaders and resolves by-reference scenario setups.
pub fn parse_raw_scenarios(
    raw: &[RawScenarioTables],
    config: &GameConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<ParsedScenario> {
    scenario::parse_raw_scenarios(raw, config, diagnostics)
}

/// Full stage-1 pass over a PDF on disk.
pub fn extract_pdf_to_raw_tables(
    input_pdf: &Path,
    window: Option<PageWindow>,
    config: &GameConfig,
) -> Result<(Vec<RawScenarioTables>, ExtractionReport), ExtractError> {
    let pages = pdf_reader::read_pdf_pages(input_pdf)?;
    let mut diagnostics = Diagnostics::new();
    let scenarios = extract_raw_tables(&pages, window, config, &mut diagnostics);
    let report = ExtractionReport::for_raw(&scenarios, &diagnostics);
    Ok((scenarios, report))
}

/// Full stage-2/3 pass over a stage-1 artifact on disk.
pub fn parse_raw_tables_file(
    input_json: &Path,
    config: &GameConfig,
) -> Result<(Vec<ParsedScenario>, ExtractionReport), ExtractError> {
    let raw: Vec<RawScenarioTables> = json_out::read_json(input_json)?;
    let mut diagnostics = Diagnostics::new();
    let scenarios = parse_raw_scenarios(&raw, config, &mut diagnostics);
    let report = ExtractionReport::for_parsed(&raw, &scenarios, &diagnostics);
    Ok((scenarios, report))
}

/// Writes a stage-1 artifact (`<game>_raw_tables.json`).
pub fn write_raw_tables(path: &Path, scenarios: &[RawScenarioTables]) -> Result<(), ExtractError> {
    json_out::write_json(path, &scenarios)
}

/// Writes a stage-2/3 artifact (`<game>_parsed.json`).
pub fn write_parsed_scenarios(
    path: &Path,
    scenarios: &[ParsedScenario],
) -> Result<(), ExtractError> {
    json_out::write_json(path, &scenarios)
}

/// Serializes either artifact without touching the filesystem.
pub fn artifact_to_json<T: serde::Serialize>(value: &T) -> Result<String, ExtractError> {
    json_out::to_json_string(value)
}
