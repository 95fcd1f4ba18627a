use std::collections::BTreeSet;
use std::collections::HashMap;

use crate::config::GameConfig;
use crate::model::{ParsedScenario, Unit};
use crate::warning::{Diagnostics, ExtractWarning, WarningCode};

/// Collapses leader entries repeated across a scenario's physically
/// separate setup sub-tables (the same leader listed in both an Army and a
/// Corps table). Only `Ldr` units deduplicate, and only on an exact
/// `(name, hex)` match; the same leader at a different hex is two genuine
/// entries. First occurrence wins. Leaders keep their relative order ahead
/// of the non-leader units.
pub(crate) fn deduplicate_leaders(units: Vec<Unit>) -> Vec<Unit> {
    let mut leaders = Vec::new();
    let mut non_leaders = Vec::new();
    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();

    for unit in units {
        if unit.unit_type == "Ldr" {
            let key = (unit.unit_leader.clone(), unit.hex_location.clone());
            if seen.insert(key) {
                leaders.push(unit);
            }
        } else {
            non_leaders.push(unit);
        }
    }

    leaders.extend(non_leaders);
    leaders
}

/// Fills scenarios whose setup is defined by reference ("use Scenario N's
/// setup") with independent copies of the source scenario's data. A target
/// that already has units is left alone.
pub(crate) fn apply_shared_scenarios(
    scenarios: &mut [ParsedScenario],
    config: &GameConfig,
    diagnostics: &mut Diagnostics,
) {
    let by_number: HashMap<u32, usize> = scenarios
        .iter()
        .enumerate()
        .map(|(index, scenario)| (scenario.number, index))
        .collect();

    for &(target_number, source_number) in &config.shared_scenarios {
        let (Some(&target), Some(&source)) =
            (by_number.get(&target_number), by_number.get(&source_number))
        else {
            continue;
        };

        if !scenarios[target].is_empty() {
            diagnostics.warn(
                ExtractWarning::new(
                    WarningCode::SharedScenarioSkipped,
                    format!("scenario {target_number} already has units; not copying from scenario {source_number}"),
                )
                .with_scenario(target_number),
            );
            continue;
        }

        tracing::debug!(
            target = target_number,
            source = source_number,
            "copying shared scenario setup"
        );

        let (confederate_units, union_units, confederate_footnotes, union_footnotes) = {
            let source = &scenarios[source];
            (
                source.confederate_units.clone(),
                source.union_units.clone(),
                source.confederate_footnotes.clone(),
                source.union_footnotes.clone(),
            )
        };

        let target = &mut scenarios[target];
        target.confederate_units = confederate_units;
        target.union_units = union_units;
        target.confederate_footnotes = confederate_footnotes;
        target.union_footnotes = union_footnotes;
    }
}
