use std::borrow::Cow;
use std::sync::LazyLock;

use encoding_rs::{Encoding, WINDOWS_1252};
use regex::bytes::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::table::RawTable;
use crate::error::ParseError;
use crate::fetch::Document;

static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static META_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([a-z0-9_:.-]+)"#).unwrap());

const SNIFF_BYTES: usize = 1024;
const MAX_SPAN: usize = 1000;

/// Finds the data tables of a document.
pub trait TableLocator {
    fn locate(&self, doc: &Document) -> Result<Vec<RawTable>, ParseError>;
}

/// Reads `<table>` elements with html5ever, the way a browser would build
/// the tree. Tables without a header row or without data rows (layout
/// tables) are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlTableLocator;

impl TableLocator for HtmlTableLocator {
    fn locate(&self, doc: &Document) -> Result<Vec<RawTable>, ParseError> {
        let text = decode(doc)?;
        let html = Html::parse_document(&text);

        let mut tables = Vec::new();
        for (position, element) in html.select(&TABLE_SEL).enumerate() {
            match read_table(position, element)? {
                Some(table) => tables.push(table),
                None => debug!("Skipping table #{} in {}: no header or data rows", position, doc.url),
            }
        }
        debug!("Located {} tables in {}", tables.len(), doc.url);
        Ok(tables)
    }
}

// ── Decoding ──

/// BOM, then the HTTP charset, then `<meta charset>`. Undeclared bytes are
/// read as UTF-8, or windows-1252 when they are not valid UTF-8. Bytes
/// invalid in the chosen encoding become U+FFFD.
pub fn decode(doc: &Document) -> Result<Cow<'_, str>, ParseError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(&doc.body) {
        return Ok(decode_lossy(doc, encoding, &doc.body[bom_len..]));
    }

    match doc.charset.clone().or_else(|| sniff_meta_charset(&doc.body)) {
        Some(label) => {
            let encoding = Encoding::for_label(label.trim().as_bytes())
                .ok_or(ParseError::UnknownEncoding(label))?;
            Ok(decode_lossy(doc, encoding, &doc.body))
        }
        None => match std::str::from_utf8(&doc.body) {
            Ok(text) => Ok(Cow::Borrowed(text)),
            Err(_) => Ok(WINDOWS_1252.decode_without_bom_handling(&doc.body).0),
        },
    }
}

fn decode_lossy<'a>(doc: &Document, encoding: &'static Encoding, bytes: &'a [u8]) -> Cow<'a, str> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        warn!("{} is not valid {}; replacing bad bytes", doc.url, encoding.name());
    }
    text
}

fn sniff_meta_charset(body: &[u8]) -> Option<String> {
    let head = &body[..body.len().min(SNIFF_BYTES)];
    let caps = META_CHARSET_RE.captures(head)?;
    Some(String::from_utf8_lossy(&caps[1]).into_owned())
}

// ── Table structure ──

struct SpanCell {
    text: String,
    colspan: usize,
    rowspan: usize,
}

#[derive(Clone)]
struct Carry {
    text: String,
    rows_left: usize,
}

struct GridRow {
    cells: Vec<String>,
    all_th: bool,
}

fn read_table(position: usize, table: ElementRef) -> Result<Option<RawTable>, ParseError> {
    let mut head: Vec<GridRow> = Vec::new();
    let mut body: Vec<GridRow> = Vec::new();
    let mut has_thead = false;

    for child in child_elements(table) {
        match child.value().name() {
            "thead" => {
                has_thead = true;
                head.extend(expand_group(&rows_of(child)));
            }
            "tbody" | "tfoot" => body.extend(expand_group(&rows_of(child))),
            "tr" => body.extend(expand_group(&[child])),
            _ => {}
        }
    }

    if !has_thead {
        let leading = body.iter().take_while(|r| r.all_th).count();
        head = body.drain(..leading).collect();
    }
    body.retain(|r| !r.cells.is_empty());

    let width = head.iter().map(|r| r.cells.len()).max().unwrap_or(0);
    if width == 0 || body.is_empty() {
        return Ok(None);
    }

    let header = merge_header(&head, width);
    let rows = body
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            fit_row(row.cells, width).map_err(|found| ParseError::RaggedRow {
                table: position,
                row: i,
                expected: width,
                found,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(RawTable { header, rows }))
}

fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element.children().filter_map(ElementRef::wrap)
}

fn rows_of(group: ElementRef) -> Vec<ElementRef> {
    child_elements(group)
        .filter(|e| e.value().name() == "tr")
        .collect()
}

/// Lay out one row group on a grid, repeating `colspan` cells and carrying
/// `rowspan` cells down. Spans never cross row groups.
fn expand_group(rows: &[ElementRef]) -> Vec<GridRow> {
    let mut carry: Vec<Option<Carry>> = Vec::new();
    let mut out = Vec::with_capacity(rows.len());

    for tr in rows {
        let mut all_th = true;
        let cells: Vec<SpanCell> = child_elements(*tr)
            .filter(|e| matches!(e.value().name(), "td" | "th"))
            .map(|e| {
                all_th &= e.value().name() == "th";
                SpanCell {
                    text: cell_text(e),
                    colspan: span(e, "colspan"),
                    rowspan: span(e, "rowspan"),
                }
            })
            .collect();
        let all_th = all_th && !cells.is_empty();

        let mut grid = Vec::new();
        let mut cells = cells.into_iter();
        loop {
            let col = grid.len();
            if let Some(Some(c)) = carry.get_mut(col) {
                grid.push(c.text.clone());
                c.rows_left -= 1;
                let done = c.rows_left == 0;
                if done {
                    carry[col] = None;
                }
                continue;
            }

            let Some(cell) = cells.next() else {
                // a carried cell further right still needs its slot
                if carry.iter().skip(col).any(Option::is_some) {
                    grid.push(String::new());
                    continue;
                }
                break;
            };

            for _ in 0..cell.colspan {
                if cell.rowspan > 1 {
                    let col = grid.len();
                    if carry.len() <= col {
                        carry.resize(col + 1, None);
                    }
                    carry[col] = Some(Carry {
                        text: cell.text.clone(),
                        rows_left: cell.rowspan - 1,
                    });
                }
                grid.push(cell.text.clone());
            }
        }

        out.push(GridRow { cells: grid, all_th });
    }
    out
}

fn span(cell: ElementRef, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
        .min(MAX_SPAN)
}

fn cell_text(cell: ElementRef) -> String {
    let raw: String = cell.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stacked header rows become one name per column: the distinct non-empty
/// texts, top to bottom.
fn merge_header(rows: &[GridRow], width: usize) -> Vec<String> {
    (0..width)
        .map(|col| {
            let mut parts: Vec<&str> = Vec::new();
            for row in rows {
                if let Some(text) = row.cells.get(col) {
                    if !text.is_empty() && !parts.contains(&text.as_str()) {
                        parts.push(text);
                    }
                }
            }
            parts.join(" ")
        })
        .collect()
}

/// Pad to `width`, or drop trailing empty cells. `Err(len)` when the row
/// has real content past the header.
fn fit_row(mut cells: Vec<String>, width: usize) -> Result<Vec<String>, usize> {
    if cells.len() > width {
        if cells[width..].iter().any(|c| !c.is_empty()) {
            return Err(cells.len());
        }
        cells.truncate(width);
    }
    cells.resize(width, String::new());
    Ok(cells)
}
