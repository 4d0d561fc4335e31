//! Deterministic parser for registers laid out as Markdown tables
//!
//! Walks the document line by line, keeping a [`HierarchicalContext`]
//! up to date from page markers and headings. Every table whose header row
//! names a product, material description or result column is read into
//! [`AcmRecord`]s stamped with the context at the point the table starts.

use crate::patterns::{classify_header, page_marker, school_title, Header};
use acmreg_domain::{AcmRecord, HierarchicalContext, ResultStatus, UNKNOWN_BUILDING};
use tracing::{debug, info, warn};

const TABLE_MARKERS: [&str; 3] = ["product", "material description", "result"];

/// Parse every register table in a document
///
/// Returns records in document order. Empty input yields no records.
pub fn parse_register(text: &str, source_id: &str) -> Vec<AcmRecord> {
    if text.trim().is_empty() {
        warn!("Empty document provided for source {}", source_id);
        return Vec::new();
    }

    let mut context = match school_title(text) {
        Some(name) => HierarchicalContext::for_school(&name),
        None => HierarchicalContext::default(),
    };
    debug!(school = %context.school_name, "Parsing register");

    let lines: Vec<&str> = text.lines().collect();
    let mut records = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();

        if let Some(page) = page_marker(line) {
            context.set_page(page);
        }

        match classify_header(line) {
            Some(Header::Building(header)) => {
                debug!("Building: {} - {}", header.id, header.name);
                context.enter_building(header);
            }
            Some(Header::Room(header)) => {
                debug!("Room: {} - {}", header.id, header.name);
                context.enter_room(header);
            }
            Some(Header::Area(area)) => context.set_area_type(area),
            None => {}
        }

        if is_table_header(line) {
            let (table, end) = collect_table(&lines, i);
            records.extend(parse_table(&table, &context, source_id));
            i = end;
            continue;
        }

        i += 1;
    }

    info!("Parsed {} records from source {}", records.len(), source_id);
    records
}

fn is_table_header(line: &str) -> bool {
    if !line.contains('|') {
        return false;
    }
    let joined = line
        .split('|')
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    TABLE_MARKERS.iter().any(|marker| joined.contains(marker))
}

/// Collect a table starting at `start`, returning its lines and the index after it
///
/// A single blank line inside the table is skipped when the next line
/// continues it.
fn collect_table<'a>(lines: &[&'a str], start: usize) -> (Vec<&'a str>, usize) {
    let mut table = vec![lines[start].trim()];
    let mut j = start + 1;

    while j < lines.len() {
        let next = lines[j].trim();
        if next.contains('|') {
            table.push(next);
            j += 1;
        } else if next.is_empty() && lines.get(j + 1).is_some_and(|l| l.contains('|')) {
            j += 1;
        } else {
            break;
        }
    }

    (table, j)
}

/// Column positions resolved from a header row
#[derive(Debug, Default)]
struct Columns {
    product: Option<usize>,
    material_description: Option<usize>,
    extent: Option<usize>,
    location: Option<usize>,
    friable: Option<usize>,
    condition: Option<usize>,
    risk_status: Option<usize>,
    result: Option<usize>,
}

impl Columns {
    fn from_header(line: &str) -> Self {
        let mut columns = Self::default();
        let headers = line
            .split('|')
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());

        // Later columns win when two headers map to the same field
        for (i, header) in headers.enumerate() {
            let slot = if header.contains("product") {
                &mut columns.product
            } else if header.contains("material") && header.contains("desc") {
                &mut columns.material_description
            } else if header.contains("extent") {
                &mut columns.extent
            } else if header.contains("location") {
                &mut columns.location
            } else if header.contains("friable") {
                &mut columns.friable
            } else if header.contains("condition") {
                &mut columns.condition
            } else if header.contains("risk") {
                &mut columns.risk_status
            } else if header.contains("result") {
                &mut columns.result
            } else {
                continue;
            };
            *slot = Some(i);
        }

        columns
    }
}

fn row_cells(line: &str) -> Vec<&str> {
    let mut cells: Vec<&str> = line.split('|').map(str::trim).collect();
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

fn parse_table(table: &[&str], context: &HierarchicalContext, source_id: &str) -> Vec<AcmRecord> {
    let Some((header, rows)) = table.split_first() else {
        return Vec::new();
    };
    let columns = Columns::from_header(header);

    rows.iter()
        .filter(|row| !row.contains("---"))
        .filter_map(|row| {
            let cells = row_cells(row);
            if cells.len() < 2 {
                return None;
            }
            let cell = |idx: Option<usize>| {
                idx.and_then(|i| cells.get(i))
                    .filter(|c| !c.is_empty())
                    .map(|c| c.to_string())
            };

            let product = cell(columns.product)?;
            let material_description = cell(columns.material_description)?;
            let result = cell(columns.result)
                .map(|r| ResultStatus::normalize_table_cell(&r))
                .unwrap_or_default();

            Some(AcmRecord {
                id: None,
                source_id: source_id.to_string(),
                school_name: context.school_name.clone(),
                school_code: context.school_code.clone(),
                building_id: context
                    .building_id
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_BUILDING.to_string()),
                building_name: context.building_name.clone(),
                building_year: context.building_year,
                building_construction: context.building_construction.clone(),
                room_id: context.room_id.clone(),
                room_name: context.room_name.clone(),
                room_area: context.room_area,
                area_type: context.area_type.as_str().to_string(),
                product,
                material_description,
                extent: cell(columns.extent),
                location: cell(columns.location),
                friable: cell(columns.friable),
                material_condition: cell(columns.condition),
                risk_status: cell(columns.risk_status),
                result,
                page_number: Some(context.current_page),
                ..AcmRecord::default()
            })
        })
        .collect()
}
