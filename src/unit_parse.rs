use std::sync::LazyLock;

use regex::Regex;

use crate::config::{Column, GameConfig};
use crate::model::{RawTable, Side, Unit};
use crate::warning::Diagnostics;

// Coordinate-shaped tokens: an optional map-edge letter and four digits.
// Some booklets print bare four-digit hexes.
static COORDINATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[NS]?\d{4}").expect("static regex"));

static GUNBOAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\(?Gunboat").expect("static regex"));
static TWO_TOKEN_SPECIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:Naval|Wagon)").expect("static regex"));

static SINGLE_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d$").expect("static regex"));

// Where a special unit's hex location can begin instead of a coordinate.
const LOCATION_KEYWORDS: [&str; 4] = ["box", "river", "display", "reinforcement"];

// A location longer than this absorbed a paragraph, not a hex reference.
const MAX_HEX_LOCATION_LEN: usize = 60;

/// Removes every configured footnote symbol from `value`. Returns the
/// cleaned string and the symbols found; any other non-alphanumeric marker
/// character is recorded as an unknown symbol for the end-of-run report.
pub(crate) fn extract_footnotes(
    value: &str,
    config: &GameConfig,
    diagnostics: &mut Diagnostics,
) -> (String, Vec<String>) {
    let mut clean = value.to_string();
    let mut symbols = Vec::new();

    for symbol in &config.footnote_symbols {
        if clean.contains(symbol.as_str()) {
            symbols.push(symbol.clone());
            clean = clean.replace(symbol.as_str(), "");
        }
    }

    for ch in value.chars() {
        if !config.is_known_symbol_char(ch)
            && !ch.is_alphanumeric()
            && !ch.is_whitespace()
            && !matches!(ch, ',' | '.' | '-' | '/' | '(' | ')' | '[' | ']')
        {
            diagnostics.record_unknown_symbol(ch);
        }
    }

    (clean.trim().to_string(), symbols)
}

fn strip_symbols_for_match(token: &str, config: &GameConfig) -> String {
    let mut clean = token.to_string();
    for symbol in &config.footnote_symbols {
        clean = clean.replace(symbol.as_str(), "");
    }
    clean.trim().to_string()
}

/// Finds the size token that anchors a standard row. `D-Div` is an
/// abbreviation of `Demi-Div` in some booklets and is canonicalized here.
pub(crate) fn find_size_index(
    tokens: &[String],
    config: &GameConfig,
) -> Option<(usize, String)> {
    for (index, token) in tokens.iter().enumerate() {
        let clean = strip_symbols_for_match(token, config);
        if config.is_valid_size(&clean) {
            let normalized = if clean == "D-Div" {
                "Demi-Div".to_string()
            } else {
                clean
            };
            return Some((index, normalized));
        }
    }
    None
}

fn special_unit_name(tokens: &[String]) -> Option<(String, usize)> {
    let first = tokens.first()?;
    if GUNBOAT.is_match(first) {
        return Some((first.clone(), 1));
    }
    if tokens.len() >= 2 && TWO_TOKEN_SPECIAL.is_match(first) {
        // A lone uppercase letter after the name is a train designator
        // ("Wagon Train A"); keep it with the name.
        let mut taken = 2;
        let mut name = format!("{first} {}", tokens[1]);
        if let Some(suffix) = tokens.get(2)
            && suffix.len() == 1
            && suffix.chars().all(|ch| ch.is_ascii_uppercase())
        {
            name.push(' ');
            name.push_str(suffix);
            taken = 3;
        }
        return Some((name, taken));
    }
    None
}

fn parse_special_unit(tokens: &[String], side: Side, table_name: &str) -> Option<Unit> {
    let (unit_name, taken) = special_unit_name(tokens)?;
    let remaining = &tokens[taken..];

    let hex_start = remaining.iter().position(|token| {
        COORDINATE.is_match(token) || LOCATION_KEYWORDS.contains(&token.to_lowercase().as_str())
    });
    let mut hex_location = hex_start.map_or_else(String::new, |start| remaining[start..].join(" "));

    if hex_location.chars().count() > MAX_HEX_LOCATION_LEN {
        hex_location = String::new();
    }

    Some(Unit {
        unit_leader: unit_name,
        size: "-".to_string(),
        command: "-".to_string(),
        unit_type: "Special".to_string(),
        manpower_value: "-".to_string(),
        hex_location,
        side,
        notes: Vec::new(),
        turn: None,
        reinforcement_set: None,
        table_name: some_table_name(table_name),
    })
}

fn some_table_name(table_name: &str) -> Option<String> {
    (!table_name.is_empty()).then(|| table_name.to_string())
}

fn parse_standard_unit(
    tokens: &[String],
    side: Side,
    columns: &[Column],
    table_name: &str,
    config: &GameConfig,
    diagnostics: &mut Diagnostics,
) -> Option<Unit> {
    let (mut size_index, mut size_value) = find_size_index(tokens, config)?;

    let mut turn_value = None;
    let mut set_value = None;
    let mut name_start = 0;
    let mut name_end = size_index;

    // A leading turn column shifts everything right by one token.
    if columns.first() == Some(&Column::Turn) {
        turn_value = Some(tokens[0].clone());
        name_start = 1;
        let (index, value) = find_size_index(&tokens[1..], config)?;
        size_index = index + 1;
        size_value = value;
        name_end = size_index;
    }

    let has_set_column = columns.contains(&Column::Set);

    // A bare digit just before the size is a reinforcement set number in
    // layouts that declare one.
    if has_set_column
        && size_index > name_start
        && SINGLE_DIGIT.is_match(&tokens[size_index - 1])
    {
        set_value = Some(tokens[size_index - 1].clone());
        name_end = size_index - 1;
    }

    let name_tokens = &tokens[name_start..name_end];
    if name_tokens.is_empty() {
        return None;
    }
    let (unit_name, name_notes) =
        extract_footnotes(&name_tokens.join(" "), config, diagnostics);

    let remaining = &tokens[size_index + 1..];
    if remaining.len() < 3 {
        return None;
    }

    let command = remaining[0].clone();
    let unit_type = remaining[1].clone();
    let manpower = remaining[2].clone();

    if !config.is_valid_type(&unit_type) {
        return None;
    }

    // The displayed manpower keeps its symbols; only the notes get them.
    let (_, manpower_notes) = extract_footnotes(&manpower, config, diagnostics);

    let mut hex_tokens = remaining[3..].to_vec();
    if has_set_column
        && hex_tokens
            .last()
            .is_some_and(|last| SINGLE_DIGIT.is_match(last))
    {
        set_value = hex_tokens.pop();
    }
    let hex_location = hex_tokens.join(" ");

    let mut notes = name_notes;
    notes.extend(manpower_notes);
    notes.sort();
    notes.dedup();

    Some(Unit {
        unit_leader: unit_name,
        size: size_value,
        command,
        unit_type,
        manpower_value: manpower,
        hex_location,
        side,
        notes,
        turn: turn_value,
        reinforcement_set: set_value,
        table_name: some_table_name(table_name),
    })
}

/// Parses one row into a Unit, or nothing when the row does not fit any
/// known shape. Failures are silent; interleaved prose is expected.
pub(crate) fn parse_row(
    tokens: &[String],
    side: Side,
    columns: &[Column],
    table_name: &str,
    config: &GameConfig,
    diagnostics: &mut Diagnostics,
) -> Option<Unit> {
    if tokens.len() < 4 {
        return None;
    }

    if config.is_special_unit(tokens) {
        return parse_special_unit(tokens, side, table_name);
    }

    parse_standard_unit(tokens, side, columns, table_name, config, diagnostics)
}

/// Derives a column layout from a header row. Unrecognized tokens are
/// dropped; an empty result means the caller should use the configured
/// fallback.
pub(crate) fn detect_columns_from_header(header_row: &[String]) -> Vec<Column> {
    let mut columns = Vec::new();

    for token in header_row {
        let lower = token.to_lowercase();
        if lower.contains("unit/leader") {
            columns.push(Column::Name);
        } else if lower == "turn" {
            columns.push(Column::Turn);
        } else if lower == "set" || (lower.contains("reinforcement") && lower.contains("set")) {
            columns.push(Column::Set);
        } else if lower == "size" {
            columns.push(Column::Size);
        } else if lower == "command" {
            columns.push(Column::Command);
        } else if lower == "type" {
            columns.push(Column::Type);
        } else if lower.contains("manpower") {
            columns.push(Column::Manpower);
        } else if lower == "hex" || lower == "entry" {
            columns.push(Column::Hex);
        }
    }

    columns
}

/// One layout per table: the header row wins when it resolves, otherwise
/// the configured fallbacks apply.
pub(crate) fn resolve_columns(
    table: &RawTable,
    scenario_number: u32,
    config: &GameConfig,
) -> Vec<Column> {
    if !table.header_row.is_empty() {
        let columns = detect_columns_from_header(&table.header_row);
        if !columns.is_empty() {
            return columns;
        }
    }
    config
        .fallback_columns(&table.name, scenario_number)
        .to_vec()
}

pub(crate) fn parse_table(
    table: &RawTable,
    side: Side,
    scenario_number: u32,
    config: &GameConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<Unit> {
    let columns = resolve_columns(table, scenario_number, config);

    table
        .rows
        .iter()
        .filter_map(|row| parse_row(row, side, &columns, &table.name, config, diagnostics))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::config::{Column, ConfigFile, GameConfig};
    use crate::model::{RawTable, Side};
    use crate::warning::Diagnostics;

    use super::{
        detect_columns_from_header, extract_footnotes, find_size_index, parse_row, parse_table,
        resolve_columns,
    };

    fn config() -> GameConfig {
        let raw = r#"{
            "defaults": {
                "columns": ["name", "size", "command", "type", "manpower", "hex"],
                "valid_sizes": ["Army", "District", "Corps", "Demi-Div", "D-Div", "Div", "Brig", "Regt"],
                "valid_types": ["Ldr", "Inf", "Cav", "Art"],
                "footnote_symbols": ["*", "†", "‡"],
                "special_unit_patterns": ["^\\(?Gunboat", "^Wagon$", "^Naval$"]
            },
            "otr2": {}
        }"#;
        ConfigFile::from_json_str(raw)
            .expect("test config should parse")
            .resolve("otr2")
            .expect("otr2 should resolve")
    }

    fn tokens(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| (*part).to_string()).collect()
    }

    const STANDARD: [Column; 6] = [
        Column::Name,
        Column::Size,
        Column::Command,
        Column::Type,
        Column::Manpower,
        Column::Hex,
    ];

    const WITH_TURN: [Column; 7] = [
        Column::Turn,
        Column::Name,
        Column::Size,
        Column::Command,
        Column::Type,
        Column::Manpower,
        Column::Hex,
    ];

    const WITH_SET: [Column; 7] = [
        Column::Name,
        Column::Size,
        Column::Command,
        Column::Type,
        Column::Manpower,
        Column::Hex,
        Column::Set,
    ];

    #[test]
    fn extracts_single_footnote_symbol() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let (clean, notes) = extract_footnotes("Ward*", &config, &mut diagnostics);
        assert_eq!(clean, "Ward");
        assert_eq!(notes, vec!["*"]);
    }

    #[test]
    fn extracts_multiple_symbols_and_trims() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let (clean, notes) = extract_footnotes(" Unit*† ", &config, &mut diagnostics);
        assert_eq!(clean, "Unit");
        assert!(notes.contains(&"*".to_string()));
        assert!(notes.contains(&"†".to_string()));
    }

    #[test]
    fn value_without_symbols_is_unchanged() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let (clean, notes) = extract_footnotes("Longstreet", &config, &mut diagnostics);
        assert_eq!(clean, "Longstreet");
        assert!(notes.is_empty());
    }

    #[test]
    fn unknown_marker_characters_are_tracked() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        extract_footnotes("Unit@", &config, &mut diagnostics);
        assert!(diagnostics.unknown_symbols.contains(&'@'));
    }

    #[test]
    fn finds_size_after_multi_word_name() {
        let config = config();
        let result = find_size_index(&tokens(&["10", "GA", "Regt", "M", "Inf", "1", "S5017"]), &config);
        assert_eq!(result, Some((2, "Regt".to_string())));
    }

    #[test]
    fn finds_size_despite_footnote_symbol() {
        let config = config();
        let result = find_size_index(&tokens(&["Ward*", "Brig", "M", "Inf", "2*", "S5510"]), &config);
        assert_eq!(result, Some((1, "Brig".to_string())));
    }

    #[test]
    fn normalizes_d_div_to_demi_div() {
        let config = config();
        let result = find_size_index(&tokens(&["Unit", "D-Div", "X", "Inf", "3", "S1234"]), &config);
        assert_eq!(result, Some((1, "Demi-Div".to_string())));
    }

    #[test]
    fn no_size_token_yields_none() {
        let config = config();
        assert_eq!(
            find_size_index(&tokens(&["Gunboat", "USS", "Monitor", "-", "River"]), &config),
            None
        );
    }

    #[test]
    fn rows_shorter_than_four_tokens_parse_to_nothing() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        for row in [&[][..], &["Ward"][..], &["Ward", "Brig"][..], &["Ward", "Brig", "M"][..]] {
            assert_eq!(
                parse_row(&tokens(row), Side::Confederate, &STANDARD, "Set-Up", &config, &mut diagnostics),
                None
            );
        }
    }

    #[test]
    fn parses_leader_row() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let unit = parse_row(
            &tokens(&["Magruder", "Div", "M", "Ldr", "-", "S5510", "(Yorktown)"]),
            Side::Confederate,
            &STANDARD,
            "Confederate Set-Up",
            &config,
            &mut diagnostics,
        )
        .expect("leader row should parse");

        assert_eq!(unit.unit_leader, "Magruder");
        assert_eq!(unit.size, "Div");
        assert_eq!(unit.command, "M");
        assert_eq!(unit.unit_type, "Ldr");
        assert_eq!(unit.manpower_value, "-");
        assert_eq!(unit.hex_location, "S5510 (Yorktown)");
        assert_eq!(unit.side, Side::Confederate);
    }

    #[test]
    fn infantry_row_keeps_symbols_on_manpower_but_not_name() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let unit = parse_row(
            &tokens(&["Ward*", "Brig", "M", "Inf", "2*", "S5510", "(Yorktown)"]),
            Side::Confederate,
            &STANDARD,
            "Confederate Set-Up",
            &config,
            &mut diagnostics,
        )
        .expect("infantry row should parse");

        assert_eq!(unit.unit_leader, "Ward");
        assert_eq!(unit.manpower_value, "2*");
        assert_eq!(unit.notes, vec!["*"]);
        assert_eq!(unit.hex_location, "S5510 (Yorktown)");
    }

    #[test]
    fn invalid_unit_type_rejects_the_row() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        assert_eq!(
            parse_row(
                &tokens(&["Unit", "Brig", "M", "Wag", "5", "S1234"]),
                Side::Confederate,
                &STANDARD,
                "Set-Up",
                &config,
                &mut diagnostics,
            ),
            None
        );
    }

    #[test]
    fn multi_hex_location_is_joined() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let unit = parse_row(
            &tokens(&["Wilcox-A", "Brig", "M", "Inf", "6", "S4811,", "S4912", "or", "S5017"]),
            Side::Confederate,
            &STANDARD,
            "Confederate Set-Up",
            &config,
            &mut diagnostics,
        )
        .expect("row should parse");
        assert_eq!(unit.hex_location, "S4811, S4912 or S5017");
    }

    #[test]
    fn turn_column_peels_the_leading_token() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let unit = parse_row(
            &tokens(&["1", "Smith", "Brig", "S", "Inf", "4", "Entry", "Area"]),
            Side::Union,
            &WITH_TURN,
            "Union Reinforcements",
            &config,
            &mut diagnostics,
        )
        .expect("turn row should parse");

        assert_eq!(unit.turn.as_deref(), Some("1"));
        assert_eq!(unit.unit_leader, "Smith");
        assert_eq!(unit.size, "Brig");
        assert_eq!(unit.hex_location, "Entry Area");
    }

    #[test]
    fn trailing_set_digit_moves_out_of_the_hex() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let unit = parse_row(
            &tokens(&["Rodes", "Div", "E", "Inf", "5", "N2311", "2"]),
            Side::Confederate,
            &WITH_SET,
            "Confederate Reinforcement Track",
            &config,
            &mut diagnostics,
        )
        .expect("set row should parse");

        assert_eq!(unit.reinforcement_set.as_deref(), Some("2"));
        assert_eq!(unit.hex_location, "N2311");
    }

    #[test]
    fn set_digit_before_size_is_peeled_from_the_name() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let unit = parse_row(
            &tokens(&["Ramseur", "3", "Brig", "E", "Inf", "4", "N2311"]),
            Side::Confederate,
            &WITH_SET,
            "Confederate Reinforcement Track",
            &config,
            &mut diagnostics,
        )
        .expect("set row should parse");

        assert_eq!(unit.reinforcement_set.as_deref(), Some("3"));
        assert_eq!(unit.unit_leader, "Ramseur");
    }

    #[test]
    fn parses_gunboat_special_unit() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let unit = parse_row(
            &tokens(&["Gunboat", "-", "-", "-", "River", "Display"]),
            Side::Union,
            &STANDARD,
            "Union Set-Up",
            &config,
            &mut diagnostics,
        )
        .expect("gunboat row should parse");

        assert_eq!(unit.unit_leader, "Gunboat");
        assert_eq!(unit.unit_type, "Special");
        assert_eq!(unit.size, "-");
        assert_eq!(unit.manpower_value, "-");
        assert_eq!(unit.hex_location, "River Display");
    }

    #[test]
    fn parses_naval_battery_special_unit() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let unit = parse_row(
            &tokens(&["Naval", "Battery", "-", "-", "S1234"]),
            Side::Confederate,
            &STANDARD,
            "Confederate Set-Up",
            &config,
            &mut diagnostics,
        )
        .expect("naval battery row should parse");

        assert_eq!(unit.unit_leader, "Naval Battery");
        assert_eq!(unit.unit_type, "Special");
        assert_eq!(unit.hex_location, "S1234");
    }

    #[test]
    fn wagon_train_keeps_designator_letter_and_bare_hex() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let unit = parse_row(
            &tokens(&["Wagon", "Train", "A", "-", "-", "Wag", "2+", "0324", "(Colored", "Church)"]),
            Side::Union,
            &STANDARD,
            "Union Set-Up",
            &config,
            &mut diagnostics,
        )
        .expect("wagon train row should parse");

        assert_eq!(unit.unit_leader, "Wagon Train A");
        assert_eq!(unit.hex_location, "0324 (Colored Church)");
    }

    #[test]
    fn hyphenated_wagon_train_suffix_stays_in_the_name() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let unit = parse_row(
            &tokens(&["Wagon", "Train-A", "-", "-", "-", "2*", "S4407", "(Williamsburg)"]),
            Side::Union,
            &STANDARD,
            "Union Set-Up",
            &config,
            &mut diagnostics,
        )
        .expect("wagon train row should parse");

        assert_eq!(unit.unit_leader, "Wagon Train-A");
        assert_eq!(unit.hex_location, "S4407 (Williamsburg)");
    }

    #[test]
    fn runaway_special_unit_location_is_emptied() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let mut row = tokens(&["Gunboat", "-", "-", "river"]);
        row.extend(std::iter::repeat_n("word".to_string(), 30));
        let unit = parse_row(&row, Side::Union, &STANDARD, "Set-Up", &config, &mut diagnostics)
            .expect("gunboat row should parse");
        assert!(unit.hex_location.is_empty());
    }

    #[test]
    fn duplicated_type_token_artifact_lands_in_the_command_field() {
        // PDF extraction sometimes doubles the type column ("Cav Cav").
        // The row still parses, with the first duplicate read as the
        // command code; an accepted source-data limitation.
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let unit = parse_row(
            &tokens(&["3", "VA", "Regt", "Cav", "Cav", "1", "Any", "hex"]),
            Side::Confederate,
            &STANDARD,
            "Set-Up",
            &config,
            &mut diagnostics,
        )
        .expect("artifact row still parses");
        assert_eq!(unit.command, "Cav");
        assert_eq!(unit.unit_type, "Cav");
        assert_eq!(unit.unit_leader, "3 VA");
    }

    #[test]
    fn detects_standard_columns_from_header() {
        let header = ["Unit/Leader", "Size", "Command", "Type", "Manpower Value", "Hex"]
            .map(str::to_string);
        let columns = detect_columns_from_header(&header);
        assert_eq!(columns, STANDARD.to_vec());
    }

    #[test]
    fn detects_turn_and_set_columns_from_header() {
        let turn_header =
            ["Turn", "Unit/Leader", "Size", "Command", "Type", "Manpower Value", "Hex"]
                .map(str::to_string);
        assert_eq!(detect_columns_from_header(&turn_header), WITH_TURN.to_vec());

        let set_header =
            ["Unit/Leader", "Size", "Command", "Type", "Manpower Value", "Hex", "Reinforcement Set #"]
                .map(str::to_string);
        assert_eq!(detect_columns_from_header(&set_header), WITH_SET.to_vec());
    }

    #[test]
    fn empty_header_falls_back_to_configured_columns() {
        let config = config();
        let table = RawTable::new("Confederate Set-Up", 1);
        assert_eq!(resolve_columns(&table, 1, &config), config.columns);
    }

    #[test]
    fn parse_table_skips_unparseable_rows() {
        let config = config();
        let mut diagnostics = Diagnostics::new();
        let mut table = RawTable::new("Test Table", 1);
        table.header_row =
            ["Unit/Leader", "Size", "Command", "Type", "Manpower Value", "Hex"].map(str::to_string).to_vec();
        table.rows = vec![
            tokens(&["Valid", "Brig", "M", "Inf", "2", "S1234"]),
            tokens(&["Too", "Few"]),
            tokens(&["Another", "Corps", "A", "Ldr", "-", "S5000"]),
        ];

        let units = parse_table(&table, Side::Union, 1, &config, &mut diagnostics);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].unit_leader, "Valid");
        assert_eq!(units[1].unit_leader, "Another");
        assert_eq!(units[0].table_name.as_deref(), Some("Test Table"));
    }
}
