use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Semantic column roles a table layout can declare, in left-to-right order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Name,
    Turn,
    Set,
    Size,
    Command,
    Type,
    Manpower,
    Hex,
}

/// 1-indexed inclusive page range, used both for per-game sub-ranges of a
/// shared PDF and for the CLI `--pages` override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start: u32,
    pub end: u32,
}

impl PageWindow {
    #[must_use]
    pub fn contains(self, page: u32) -> bool {
        (self.start..=self.end).contains(&page)
    }
}

impl FromStr for PageWindow {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (start, end) = spec
            .split_once('-')
            .ok_or_else(|| format!("invalid page window '{spec}', expected start-end"))?;
        let start: u32 = start
            .trim()
            .parse()
            .map_err(|_| format!("invalid window start: '{start}'"))?;
        let end: u32 = end
            .trim()
            .parse()
            .map_err(|_| format!("invalid window end: '{end}'"))?;
        if start == 0 || end == 0 {
            return Err("pages are 1-based".to_string());
        }
        if end < start {
            return Err(format!("invalid window '{spec}': end is smaller than start"));
        }
        Ok(Self { start, end })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Defaults {
    columns: Vec<Column>,
    valid_sizes: Vec<String>,
    valid_types: Vec<String>,
    footnote_symbols: Vec<String>,
    special_unit_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ColumnsOverride {
    columns: Vec<Column>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ScenarioSection {
    table_overrides: BTreeMap<String, ColumnsOverride>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct GameSection {
    columns: Option<Vec<Column>>,
    page_range: Option<(u32, u32)>,
    scenario_names: BTreeMap<String, String>,
    table_patterns: BTreeMap<String, ColumnsOverride>,
    scenarios: BTreeMap<String, ScenarioSection>,
    shared_scenarios: BTreeMap<String, SharedScenarioValue>,
}

/// A `shared_scenarios` map value: either a source scenario number, or any
/// other JSON carried by a `_`-prefixed comment key (skipped at resolve time,
/// per DESIGN.md). Untagged so numeric entries deserialize as `Source` and
/// comment strings fall through to `Comment`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SharedScenarioValue {
    Source(u32),
    Comment(serde_json::Value),
}

/// The deserialized configuration file: a `defaults` section plus one
/// section per game id.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    defaults: Defaults,
    #[serde(flatten)]
    games: BTreeMap<String, GameSection>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ExtractError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Game ids configured in this file, in stable order.
    #[must_use]
    pub fn game_ids(&self) -> Vec<String> {
        self.games
            .keys()
            .filter(|key| !key.starts_with('_'))
            .cloned()
            .collect()
    }

    /// Builds the merged per-game view used by the extractor and parser.
    pub fn resolve(&self, game_id: &str) -> Result<GameConfig, ExtractError> {
        let game = self
            .games
            .get(game_id)
            .ok_or_else(|| ExtractError::UnknownGame(game_id.to_string()))?;

        let columns = game
            .columns
            .clone()
            .unwrap_or_else(|| self.defaults.columns.clone());

        let page_range = match game.page_range {
            Some((start, end)) if start == 0 || end < start => {
                return Err(ExtractError::Config(format!(
                    "game '{game_id}': invalid page_range {start}-{end}"
                )));
            }
            Some((start, end)) => Some(PageWindow { start, end }),
            None => None,
        };

        let scenario_names = parse_numbered_keys(game_id, &game.scenario_names, Clone::clone)?;
        let scenario_overrides = parse_numbered_keys(game_id, &game.scenarios, |section| {
            section
                .table_overrides
                .iter()
                .map(|(name, over)| (name.clone(), over.columns.clone()))
                .collect::<BTreeMap<_, _>>()
        })?;

        let table_patterns = game
            .table_patterns
            .iter()
            .map(|(pattern, over)| {
                let regex = Regex::new(&format!("(?i){pattern}")).map_err(|error| {
                    ExtractError::Config(format!(
                        "game '{game_id}': bad table pattern '{pattern}': {error}"
                    ))
                })?;
                Ok((regex, over.columns.clone()))
            })
            .collect::<Result<Vec<_>, ExtractError>>()?;

        let special_unit_patterns = self
            .defaults
            .special_unit_patterns
            .iter()
            .map(|pattern| {
                Regex::new(&format!("(?i){pattern}")).map_err(|error| {
                    ExtractError::Config(format!("bad special unit pattern '{pattern}': {error}"))
                })
            })
            .collect::<Result<Vec<_>, ExtractError>>()?;

        let shared_scenarios = game
            .shared_scenarios
            .iter()
            .filter(|(key, _)| !key.starts_with('_'))
            .map(|(key, value)| {
                let target: u32 = key.parse().map_err(|_| {
                    ExtractError::Config(format!(
                        "game '{game_id}': shared scenario key '{key}' is not a number"
                    ))
                })?;
                let source = match value {
                    SharedScenarioValue::Source(source) => *source,
                    SharedScenarioValue::Comment(_) => {
                        return Err(ExtractError::Config(format!(
                            "game '{game_id}': shared scenario '{key}' value is not a number"
                        )));
                    }
                };
                Ok((target, source))
            })
            .collect::<Result<Vec<_>, ExtractError>>()?;

        let footnote_chars: BTreeSet<char> = self
            .defaults
            .footnote_symbols
            .iter()
            .flat_map(|symbol| symbol.chars())
            .collect();
        let footnote_line = if footnote_chars.is_empty() {
            None
        } else {
            let class: String = footnote_chars
                .iter()
                .map(|ch| regex::escape(&ch.to_string()))
                .collect();
            Some(
                Regex::new(&format!("^([{class}]+)\\s+(.+)$")).map_err(|error| {
                    ExtractError::Config(format!("bad footnote symbol set: {error}"))
                })?,
            )
        };

        Ok(GameConfig {
            game_id: game_id.to_string(),
            columns,
            valid_sizes: self.defaults.valid_sizes.clone(),
            valid_types: self.defaults.valid_types.clone(),
            footnote_symbols: self.defaults.footnote_symbols.clone(),
            page_range,
            special_unit_patterns,
            scenario_names,
            table_patterns,
            scenario_overrides,
            shared_scenarios,
            footnote_chars,
            footnote_line,
        })
    }
}

fn parse_numbered_keys<V, T>(
    game_id: &str,
    map: &BTreeMap<String, V>,
    convert: impl Fn(&V) -> T,
) -> Result<BTreeMap<u32, T>, ExtractError> {
    map.iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .map(|(key, value)| {
            let number: u32 = key.parse().map_err(|_| {
                ExtractError::Config(format!(
                    "game '{game_id}': scenario key '{key}' is not a number"
                ))
            })?;
            Ok((number, convert(value)))
        })
        .collect()
}

// Two-word special unit names that a single-token pattern cannot catch.
static TWO_WORD_SPECIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:Naval Battery|Wagon Train)").expect("static regex"));

/// One game's merged configuration view, built once per run and passed by
/// reference into the extractor and parser.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub game_id: String,
    pub columns: Vec<Column>,
    pub valid_sizes: Vec<String>,
    pub valid_types: Vec<String>,
    pub footnote_symbols: Vec<String>,
    pub page_range: Option<PageWindow>,
    special_unit_patterns: Vec<Regex>,
    scenario_names: BTreeMap<u32, String>,
    table_patterns: Vec<(Regex, Vec<Column>)>,
    scenario_overrides: BTreeMap<u32, BTreeMap<String, Vec<Column>>>,
    pub shared_scenarios: Vec<(u32, u32)>,
    footnote_chars: BTreeSet<char>,
    footnote_line: Option<Regex>,
}

impl GameConfig {
    #[must_use]
    pub fn scenario_name(&self, number: u32) -> Option<&str> {
        self.scenario_names.get(&number).map(String::as_str)
    }

    /// Column layout when the header row resolves nothing: scenario-specific
    /// override by exact table name, then table-name pattern, then the game
    /// default.
    pub(crate) fn fallback_columns(&self, table_name: &str, scenario: u32) -> &[Column] {
        if let Some(overrides) = self.scenario_overrides.get(&scenario)
            && let Some(columns) = overrides.get(table_name)
        {
            return columns;
        }
        for (pattern, columns) in &self.table_patterns {
            if pattern.is_match(table_name) {
                return columns;
            }
        }
        &self.columns
    }

    pub(crate) fn is_valid_size(&self, token: &str) -> bool {
        self.valid_sizes.iter().any(|size| size == token)
    }

    pub(crate) fn is_valid_type(&self, token: &str) -> bool {
        self.valid_types.iter().any(|kind| kind == token)
    }

    pub(crate) fn is_special_unit(&self, tokens: &[String]) -> bool {
        let Some(first) = tokens.first() else {
            return false;
        };
        if self
            .special_unit_patterns
            .iter()
            .any(|pattern| pattern.is_match(first))
        {
            return true;
        }
        if let [first, second, ..] = tokens {
            return TWO_WORD_SPECIAL.is_match(&format!("{first} {second}"));
        }
        false
    }

    pub(crate) fn is_known_symbol_char(&self, symbol: char) -> bool {
        self.footnote_chars.contains(&symbol)
    }

    pub(crate) fn footnote_line(&self) -> Option<&Regex> {
        self.footnote_line.as_ref()
    }
}
