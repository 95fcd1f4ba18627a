use std::collections::BTreeMap;
use std::path::Path;

use lopdf::Document;
use lopdf::Object;
use lopdf::content::Content;

use crate::error::ExtractError;
use crate::model::PageText;

fn split_text_into_pages(raw_text: &str) -> Vec<String> {
    let mut pages = raw_text
        .split('\u{000C}')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if pages.last().is_some_and(String::is_empty) {
        pages.pop();
    }
    pages
}

/// Favors extractions that keep the table structure: many lines, several
/// whitespace-separated tokens per line.
fn extraction_quality_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return i64::MIN / 4;
    }

    let mut non_empty_lines = 0_i64;
    let mut multi_token_lines = 0_i64;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        non_empty_lines += 1;
        if line.split_whitespace().count() >= 4 {
            multi_token_lines += 1;
        }
    }

    multi_token_lines * 50 + non_empty_lines
}

fn choose_best_text(candidates: &[String]) -> String {
    candidates
        .iter()
        .max_by_key(|text| extraction_quality_score(text))
        .cloned()
        .unwrap_or_default()
}

/// Rebuilds page text from the content stream, breaking lines on the text
/// positioning operators. This preserves row boundaries that the generic
/// extractors sometimes flatten.
fn extract_text_from_page_content(document: &Document, page_id: lopdf::ObjectId) -> Option<String> {
    fn collect_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => {
                    text.push_str(&Document::decode_text(encoding, bytes));
                }
                Object::Array(items) => {
                    collect_text(text, encoding, items);
                    text.push(' ');
                }
                Object::Integer(value) => {
                    if *value < -100 {
                        text.push(' ');
                    }
                }
                _ => {}
            }
        }
    }

    let raw_content = document.get_page_content(page_id).ok()?;
    let content = Content::decode(&raw_content).ok()?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_encoding = None;
    for operation in content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                if let Some(font_name) = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                {
                    current_encoding = encodings.get(font_name).copied();
                }
            }
            "Tj" | "TJ" | "'" | "\"" => {
                collect_text(&mut current, current_encoding, &operation.operands);
            }
            "T*" | "Td" | "TD" | "ET" => {
                if !current.trim().is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
            _ => {}
        }
    }

    if !current.trim().is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Reads every page's text, choosing per page between the content-stream
/// rebuild, lopdf's extractor, and the pdf-extract whole-document pass.
/// A page with no recoverable text stays empty and is skipped downstream.
pub(crate) fn read_pdf_pages(input_pdf: &Path) -> Result<Vec<PageText>, ExtractError> {
    let document = Document::load(input_pdf)?;
    let pages_map = document.get_pages();
    if pages_map.is_empty() {
        return Err(ExtractError::NoPages);
    }

    let whole_document = pdf_extract::extract_text(input_pdf)
        .ok()
        .map(|text| split_text_into_pages(&text))
        .filter(|pages| pages.len() == pages_map.len());

    let mut pages = Vec::with_capacity(pages_map.len());
    for (index, (page_no, page_id)) in pages_map.iter().enumerate() {
        let mut candidates = Vec::new();
        if let Some(text) = extract_text_from_page_content(&document, *page_id) {
            candidates.push(text);
        }
        if let Some(text) = document
            .extract_text(&[*page_no])
            .ok()
            .filter(|text| !text.trim().is_empty())
        {
            candidates.push(text);
        }
        if let Some(text) = whole_document
            .as_ref()
            .and_then(|fallback| fallback.get(index).cloned())
            .filter(|text| !text.trim().is_empty())
        {
            candidates.push(text);
        }

        pages.push(PageText {
            page_number: *page_no,
            text: choose_best_text(&candidates),
        });
    }

    if pages.iter().all(|page| page.text.trim().is_empty()) {
        return Err(ExtractError::PdfExtract(
            "no text could be extracted from any page".to_string(),
        ));
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::{choose_best_text, extraction_quality_score, split_text_into_pages};

    #[test]
    fn splits_form_feed_delimited_pages() {
        let pages = split_text_into_pages("p1\u{000C}p2\u{000C}");
        assert_eq!(pages, vec!["p1", "p2"]);
    }

    #[test]
    fn keeps_trailing_non_empty_page() {
        let pages = split_text_into_pages("p1\u{000C}p2");
        assert_eq!(pages, vec!["p1", "p2"]);
    }

    #[test]
    fn prefers_line_structured_candidates() {
        let flat = "Magruder Div M Ldr - S5510 Ward Brig M Inf 2 S5510".to_string();
        let structured = "Magruder Div M Ldr - S5510\nWard Brig M Inf 2 S5510".to_string();
        assert_eq!(choose_best_text(&[flat, structured.clone()]), structured);
    }

    #[test]
    fn empty_text_scores_lowest() {
        assert!(extraction_quality_score("") < extraction_quality_score("one line"));
    }
}
