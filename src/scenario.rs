use crate::config::GameConfig;
use crate::dedup::{apply_shared_scenarios, deduplicate_leaders};
use crate::model::{ParsedScenario, RawScenarioTables, Side};
use crate::unit_parse::parse_table;
use crate::warning::Diagnostics;

/// Converts one raw scenario into structured units, collecting table
/// footnotes per side and collapsing repeated leader entries.
pub(crate) fn parse_scenario(
    raw: &RawScenarioTables,
    config: &GameConfig,
    diagnostics: &mut Diagnostics,
) -> ParsedScenario {
    let mut scenario = ParsedScenario::new(
        raw.scenario_number,
        raw.scenario_name.clone(),
        raw.start_page,
    );

    for table in &raw.confederate_tables {
        let units = parse_table(
            table,
            Side::Confederate,
            raw.scenario_number,
            config,
            diagnostics,
        );
        scenario.confederate_units.extend(units);
        for (symbol, text) in &table.annotations {
            scenario
                .confederate_footnotes
                .insert(symbol.clone(), text.clone());
        }
    }
    scenario.confederate_units = deduplicate_leaders(std::mem::take(&mut scenario.confederate_units));

    for table in &raw.union_tables {
        let units = parse_table(table, Side::Union, raw.scenario_number, config, diagnostics);
        scenario.union_units.extend(units);
        for (symbol, text) in &table.annotations {
            scenario.union_footnotes.insert(symbol.clone(), text.clone());
        }
    }
    scenario.union_units = deduplicate_leaders(std::mem::take(&mut scenario.union_units));

    tracing::debug!(
        scenario = scenario.number,
        confederate_units = scenario.confederate_units.len(),
        union_units = scenario.union_units.len(),
        "parsed scenario"
    );

    scenario
}

/// Parses every raw scenario of a game, then resolves by-reference setups.
pub(crate) fn parse_raw_scenarios(
    raw: &[RawScenarioTables],
    config: &GameConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<ParsedScenario> {
    let mut scenarios: Vec<ParsedScenario> = raw
        .iter()
        .map(|scenario| parse_scenario(scenario, config, diagnostics))
        .collect();

    apply_shared_scenarios(&mut scenarios, config, diagnostics);
    scenarios
}
