use std::sync::LazyLock;

use regex::Regex;

use crate::config::{GameConfig, PageWindow};
use crate::model::{PageText, RawScenarioTables, RawTable, Side};
use crate::warning::{Diagnostics, ExtractWarning, WarningCode};

static SCENARIO_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)scenario\s+(\d+):\s*(.*?)(?:\s{2,}|$)").expect("static regex")
});

// Dot leaders mark table-of-contents entries ("Scenario 1: ... 4").
static DOT_LEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").expect("static regex"));

// Table section headers, anchored at line start. "Unon" is a typo for
// "Union" present in one source booklet; the apostrophe in "Stuart's" may be
// straight or curly depending on the PDF's font encoding.
static TABLE_HEADER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(?:confederate|union|unon)\s+set-up",
        r"(?i)^army\s+of\s+(?:the\s+)?potomac\s+(?:first|second|third)\s+increment",
        r"(?i)^army\s+of\s+northern\s+virginia\s+(?:first|second|third)\s+increment",
        r"(?i)^(?:west\s+virginia|baltimore(?:/dc)?|pennsylvania\s+militia|confederate)\s+reinforcement\s+track",
        r"(?i)^richmond\s+garrison\s+(?:track|reinforcement)",
        r"(?i)^placed\s+upon\s+stuart['\u{2019}]?s\s+arrival",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static regex"))
    .collect()
});

static ADVANCED_NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d+\.\d*\s+advanced\s+game").expect("static regex"));
static ADVANCED_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^advanced\s+game\s+rules\b").expect("static regex"));
static ADVANCED_INTRO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^the following rules are used only in advanced game").expect("static regex")
});
static SECTION_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(see\s+\d").expect("static regex"));

// Header cleanup: victory-condition text that the PDF sometimes merges onto
// the same line as the table header.
static HEADER_RUNOFF: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\s+\d+\s+or\s+(?:less|more)",
        r"(?i)\s+(?:decisive|substantive|marginal)\s+victory",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static regex"))
    .collect()
});

static HEX_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[SN]\d{4}").expect("static regex"));

/// One line of booklet text, classified. Variants are tried in this order;
/// the first match wins, so precedence stays visible in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineClass {
    ScenarioHeader { number: u32, name: String },
    AdvancedRulesHeader,
    Continuation,
    TableHeader { name: String, side: Option<Side> },
    ColumnHeader(Vec<String>),
    Footnote { symbols: String, text: String },
    DataRow(Vec<String>),
    Other,
}

pub(crate) fn classify_line(line: &str, config: &GameConfig) -> LineClass {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineClass::Other;
    }

    if let Some(caps) = SCENARIO_HEADER.captures(trimmed)
        && let Ok(number) = caps[1].parse::<u32>()
    {
        return LineClass::ScenarioHeader {
            number,
            name: caps[2].trim().to_string(),
        };
    }

    if is_advanced_rules_header(trimmed) {
        return LineClass::AdvancedRulesHeader;
    }

    if trimmed.to_lowercase().contains("(cntd)") {
        return LineClass::Continuation;
    }

    // Anything longer than a real header line is rules prose.
    if trimmed.chars().count() <= 80
        && TABLE_HEADER_PATTERNS
            .iter()
            .any(|pattern| pattern.is_match(trimmed))
    {
        let name = clean_header(trimmed);
        let side = determine_side(&name);
        return LineClass::TableHeader { name, side };
    }

    if trimmed.to_lowercase().contains("unit/leader") {
        return LineClass::ColumnHeader(parse_header_row(trimmed));
    }

    if let Some(footnote) = config.footnote_line()
        && let Some(caps) = footnote.captures(trimmed)
    {
        return LineClass::Footnote {
            symbols: caps[1].to_string(),
            text: caps[2].to_string(),
        };
    }

    if let Some(tokens) = data_row_candidate(trimmed, config) {
        return LineClass::DataRow(tokens);
    }

    LineClass::Other
}

fn is_advanced_rules_header(line: &str) -> bool {
    if ADVANCED_NUMBERED.is_match(line) || ADVANCED_INTRO.is_match(line) {
        return true;
    }
    ADVANCED_TITLE.is_match(line)
        && !SECTION_REFERENCE.is_match(line)
        && !line.to_lowercase().contains("apply")
}

/// Title casing over alphabetic runs: first letter upper, the rest lower.
pub(crate) fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_alpha = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

fn clean_header(header: &str) -> String {
    let mut cleaned = header.split_whitespace().collect::<Vec<_>>().join(" ");

    static UNON: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)\bUnon\b").expect("static regex"));
    cleaned = UNON.replace_all(&cleaned, "Union").into_owned();

    for pattern in HEADER_RUNOFF.iter() {
        if let Some(start) = pattern.find(&cleaned).map(|found| found.start()) {
            cleaned.truncate(start);
            cleaned = cleaned.trim_end().to_string();
        }
    }

    title_case(&cleaned)
}

fn determine_side(header: &str) -> Option<Side> {
    let lower = header.to_lowercase();

    if lower.contains("confederate") {
        return Some(Side::Confederate);
    }
    if lower.contains("union") || lower.contains("unon") {
        return Some(Side::Union);
    }

    if lower.contains("potomac") {
        return Some(Side::Union);
    }
    if lower.contains("northern virginia") {
        return Some(Side::Confederate);
    }

    for location in ["baltimore", "dc", "pennsylvania", "west virginia"] {
        if lower.contains(location) {
            return Some(Side::Union);
        }
    }

    if lower.contains("stuart") || lower.contains("richmond") {
        return Some(Side::Confederate);
    }

    None
}

/// Splits a column-header line into headers, recombining the multi-word
/// ones the booklets use.
fn parse_header_row(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let mut headers = Vec::new();

    let mut index = 0;
    while index < parts.len() {
        let lower = parts[index].to_lowercase();
        let next_is = |word: &str| {
            parts
                .get(index + 1)
                .is_some_and(|next| next.eq_ignore_ascii_case(word))
        };
        if lower == "unit/leader" {
            headers.push("Unit/Leader".to_string());
        } else if lower == "manpower" && next_is("value") {
            headers.push("Manpower Value".to_string());
            index += 1;
        } else if lower == "reinforcement" && next_is("set") {
            headers.push("Reinforcement Set #".to_string());
            index += 1;
            if parts.get(index + 1) == Some(&"#") {
                index += 1;
            }
        } else {
            headers.push(title_case(parts[index]));
        }
        index += 1;
    }

    headers
}

/// Accepts a line as a table data row, or rejects it as prose. Special
/// units (gunboats, wagon trains, naval batteries) follow a relaxed shape
/// and must carry a dash placeholder or a coordinate token so that prose
/// mentioning the keyword is not absorbed.
fn data_row_candidate(line: &str, config: &GameConfig) -> Option<Vec<String>> {
    let parts: Vec<String> = line.split_whitespace().map(str::to_string).collect();
    if parts.len() < 4 {
        return None;
    }

    if config.is_special_unit(&parts) {
        let has_dash = parts.iter().any(|part| part == "-");
        let has_hex = parts.iter().any(|part| HEX_TOKEN.is_match(part));
        return (has_dash || has_hex).then_some(parts);
    }

    // The unit name is at most a few tokens, so the size token must appear
    // early; after it come command, type, and manpower.
    let size_index = parts
        .iter()
        .take(6)
        .position(|part| config.is_valid_size(part))?;
    let remaining = &parts[size_index + 1..];
    if remaining.len() < 3 {
        return None;
    }
    if !config.is_valid_type(&remaining[1]) {
        return None;
    }

    Some(parts)
}

struct ScenarioStart {
    page_index: usize,
    number: u32,
    name: String,
}

fn find_scenario_starts(
    pages: &[PageText],
    start_index: usize,
    end_index: usize,
    config: &GameConfig,
) -> Vec<ScenarioStart> {
    let mut starts: Vec<ScenarioStart> = Vec::new();

    for (page_index, page) in pages.iter().enumerate().take(end_index).skip(start_index) {
        if page.text.trim().is_empty() {
            continue;
        }
        // Real content lists each scenario once; contents pages reference
        // them all and are skipped wholesale.
        if page.text.to_lowercase().contains("table of contents") {
            continue;
        }

        for line in page.text.lines() {
            let trimmed = line.trim();
            if DOT_LEADER.is_match(trimmed) {
                continue;
            }
            let LineClass::ScenarioHeader { number, name } = classify_line(trimmed, config) else {
                continue;
            };
            if starts.iter().any(|start| start.number == number) {
                continue;
            }

            let extracted = name.split("...").next().unwrap_or("").trim().to_string();
            let extracted = title_case(&extracted);
            let name = if extracted.chars().count() > 3 {
                extracted
            } else {
                config
                    .scenario_name(number)
                    .map_or_else(|| format!("Scenario {number}"), str::to_string)
            };

            starts.push(ScenarioStart {
                page_index,
                number,
                name,
            });
            break;
        }
    }

    starts
}

fn extract_scenario(
    pages: &[PageText],
    start_index: usize,
    end_index: usize,
    number: u32,
    name: &str,
    config: &GameConfig,
    diagnostics: &mut Diagnostics,
) -> RawScenarioTables {
    let mut scenario = RawScenarioTables {
        scenario_number: number,
        scenario_name: name.to_string(),
        start_page: pages[start_index].page_number,
        end_page: pages[end_index.saturating_sub(1).max(start_index)].page_number,
        advanced_game_rules_page: None,
        confederate_tables: Vec::new(),
        union_tables: Vec::new(),
    };

    let mut current_side: Option<Side> = None;
    let mut current_table: Option<RawTable> = None;
    let mut found_scenario_header = false;
    let mut rows_collected = 0_usize;

    // One page past the nominal end, to catch tables continued onto the
    // next scenario's first page.
    let walk_end = (end_index + 1).min(pages.len());

    'pages: for page in &pages[start_index..walk_end] {
        if page.text.trim().is_empty() {
            continue;
        }

        for line in page.text.lines() {
            let trimmed = line.trim();

            if !found_scenario_header {
                if let LineClass::ScenarioHeader { number: found, .. } =
                    classify_line(trimmed, config)
                    && found == number
                {
                    found_scenario_header = true;
                }
                continue;
            }

            match classify_line(trimmed, config) {
                LineClass::ScenarioHeader { number: next, .. } => {
                    if next != number {
                        break 'pages;
                    }
                }
                LineClass::AdvancedRulesHeader => {
                    if rows_collected == 0 {
                        scenario.advanced_game_rules_page = Some(page.page_number);
                        break 'pages;
                    }
                    // A notes blob mentioning advanced rules must not cut a
                    // table short once rows are in hand.
                }
                LineClass::TableHeader { name, side } => {
                    if let Some(table) = current_table.take() {
                        attach_table(&mut scenario, table, current_side, diagnostics);
                    }
                    if let Some(side) = side {
                        current_side = Some(side);
                    }
                    current_table = Some(RawTable::new(name, page.page_number));
                }
                LineClass::Continuation => {
                    if current_table.is_none() {
                        diagnostics.warn(
                            ExtractWarning::new(
                                WarningCode::OrphanContinuation,
                                "continuation marker with no open table",
                            )
                            .with_page(page.page_number)
                            .with_scenario(number),
                        );
                    }
                }
                LineClass::ColumnHeader(headers) => {
                    if let Some(table) = current_table.as_mut() {
                        table.header_row = headers;
                        table.record_page(page.page_number);
                    }
                }
                LineClass::Footnote { symbols, text } => {
                    if let Some(table) = current_table.as_mut() {
                        for symbol in symbols.chars() {
                            if !config.is_known_symbol_char(symbol) {
                                diagnostics.record_unknown_symbol(symbol);
                            }
                        }
                        table.annotations.insert(symbols, text);
                    }
                }
                LineClass::DataRow(tokens) => {
                    if let Some(table) = current_table.as_mut() {
                        table.rows.push(tokens);
                        table.record_page(page.page_number);
                        rows_collected += 1;
                    }
                }
                LineClass::Other => {}
            }
        }
    }

    if let Some(table) = current_table.take() {
        attach_table(&mut scenario, table, current_side, diagnostics);
    }

    scenario
}

fn attach_table(
    scenario: &mut RawScenarioTables,
    table: RawTable,
    side: Option<Side>,
    diagnostics: &mut Diagnostics,
) {
    match side {
        Some(Side::Union) => scenario.union_tables.push(table),
        Some(Side::Confederate) => scenario.confederate_tables.push(table),
        None => {
            diagnostics.warn(
                ExtractWarning::new(
                    WarningCode::SideUnresolved,
                    "table side could not be determined; defaulting to Confederate",
                )
                .with_scenario(scenario.scenario_number)
                .with_table(table.name.clone()),
            );
            scenario.confederate_tables.push(table);
        }
    }
}

/// Walks the page texts and groups contiguous data lines into named tables
/// per scenario. Lines matching nothing are prose or noise and are skipped.
pub(crate) fn extract_raw_tables(
    pages: &[PageText],
    window: Option<PageWindow>,
    config: &GameConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<RawScenarioTables> {
    let window = window.or(config.page_range);
    let in_window =
        |page: &PageText| window.is_none_or(|window| window.contains(page.page_number));

    let start_index = pages.iter().position(in_window).unwrap_or(pages.len());
    let end_index = pages
        .iter()
        .rposition(in_window)
        .map_or(start_index, |index| index + 1);

    let starts = find_scenario_starts(pages, start_index, end_index, config);
    if starts.is_empty() {
        diagnostics.warn(ExtractWarning::new(
            WarningCode::NoScenariosDetected,
            "no scenario headers found in the selected pages",
        ));
        return Vec::new();
    }

    let mut scenarios = Vec::with_capacity(starts.len());
    for (index, start) in starts.iter().enumerate() {
        let segment_end = starts
            .get(index + 1)
            .map_or(end_index, |next| next.page_index);
        tracing::debug!(
            scenario = start.number,
            name = %start.name,
            page = pages[start.page_index].page_number,
            "extracting scenario tables"
        );
        scenarios.push(extract_scenario(
            pages,
            start.page_index,
            segment_end,
            start.number,
            &start.name,
            config,
            diagnostics,
        ));
    }

    scenarios
}
