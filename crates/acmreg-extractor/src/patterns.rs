//! Structural header patterns in converted register documents
//!
//! Register headings look like:
//!
//! ```text
//! # Hillside Primary School - Asbestos Register
//! ## Building: B00A - Main Block - 1965 - Brick
//! ### Area Type: Exterior
//! ### Room: B00A-R0001 - Classroom 1 - 56.2 m²
//! --- Page 4 ---
//! ```
//!
//! Every prefix word (`Building:`, `Room:`, `Area Type:`) is optional and
//! matching ignores case.

use acmreg_domain::{AreaType, BuildingHeader, RoomHeader};
use regex::Regex;
use std::sync::LazyLock;

static BUILDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^#+\s*(?:Building[:\s]*)?([A-Z]\d+[A-Z]?)\s*[-–]\s*([^-–\n]+?)(?:\s*[-–]\s*(\d{4}))?(?:\s*[-–]\s*([^-–\n]+?))?$",
    )
    .expect("building pattern")
});

static ROOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^#+\s*(?:Room[:\s]*)?([A-Z0-9]+-?R?\d+)\s*[-–]\s*([^-–\n]+?)(?:\s*[-–]\s*([\d.]+)\s*m(?:²|2))?$",
    )
    .expect("room pattern")
});

// Room ids of the `B00A-R0001` form, or an explicit `Room` prefix
static ROOM_ID_FORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-Z0-9]+-?R\d+$").expect("room id pattern"));
static ROOM_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^#+\s*Room\b").expect("room prefix pattern"));

static AREA_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^#+\s*(?:Area\s*Type[:\s]*)?(\bExterior\b|\bInterior\b|\bGrounds\b)")
        .expect("area type pattern")
});

static SCHOOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^#[ \t]*([^#\-–\n][^-–\n]*?)(?:\s*[-–]\s*(?:Asbestos|ACM|SAMP).*)?$")
        .expect("school pattern")
});

/// `--- Page N ---` markers, dashes or em-dashes
pub(crate) static PAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\n)[-—]+\s*Page\s+(\d+)\s*[-—]+").expect("page marker pattern")
});

/// A recognized structural heading
#[derive(Debug, Clone, PartialEq)]
pub enum Header {
    /// Building heading
    Building(BuildingHeader),
    /// Room heading
    Room(RoomHeader),
    /// Interior / Exterior / Grounds heading
    Area(AreaType),
}

/// Classify a trimmed line as a structural heading
///
/// A line is read as at most one kind of heading. Room headings win when
/// the id has the `<building>-R<n>` form or the line says `Room`, since
/// such lines also fit the looser building shape.
pub fn classify_header(line: &str) -> Option<Header> {
    if !line.starts_with('#') {
        return None;
    }

    if let Some(caps) = AREA_TYPE.captures(line) {
        if let Some(area) = AreaType::parse(&caps[1]) {
            return Some(Header::Area(area));
        }
    }

    let room = parse_room(line);
    if let Some(room) = &room {
        if ROOM_ID_FORM.is_match(&room.id) || ROOM_PREFIX.is_match(line) {
            return Some(Header::Room(room.clone()));
        }
    }

    if let Some(building) = parse_building(line) {
        return Some(Header::Building(building));
    }

    room.map(Header::Room)
}

fn parse_building(line: &str) -> Option<BuildingHeader> {
    let caps = BUILDING.captures(line)?;
    Some(BuildingHeader {
        id: caps[1].trim().to_string(),
        name: caps[2].trim().to_string(),
        year: caps.get(3).and_then(|m| m.as_str().parse().ok()),
        construction: caps.get(4).map(|m| m.as_str().trim().to_string()),
    })
}

fn parse_room(line: &str) -> Option<RoomHeader> {
    let caps = ROOM.captures(line)?;
    Some(RoomHeader {
        id: caps[1].trim().to_string(),
        name: caps[2].trim().to_string(),
        area: caps.get(3).and_then(|m| m.as_str().parse().ok()),
    })
}

/// Page number from a marker line
pub fn page_marker(line: &str) -> Option<u32> {
    PAGE_MARKER
        .captures(line)
        .and_then(|caps| caps[1].parse().ok())
}

/// School name from the first level-1 heading in the document
pub fn school_title(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find_map(|line| SCHOOL.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_with_year_and_construction() {
        let header = classify_header("## Building: B00A - Main Block - 1965 - Brick");
        assert_eq!(
            header,
            Some(Header::Building(BuildingHeader {
                id: "B00A".to_string(),
                name: "Main Block".to_string(),
                year: Some(1965),
                construction: Some("Brick".to_string()),
            }))
        );
    }

    #[test]
    fn test_plain_building() {
        match classify_header("## B1 - Block A") {
            Some(Header::Building(b)) => {
                assert_eq!(b.id, "B1");
                assert_eq!(b.name, "Block A");
                assert_eq!(b.year, None);
                assert_eq!(b.construction, None);
            }
            other => panic!("expected building, got {:?}", other),
        }
    }

    #[test]
    fn test_room_header_is_not_a_building() {
        match classify_header("### B1-R1 - Office") {
            Some(Header::Room(r)) => {
                assert_eq!(r.id, "B1-R1");
                assert_eq!(r.name, "Office");
                assert_eq!(r.area, None);
            }
            other => panic!("expected room, got {:?}", other),
        }
    }

    #[test]
    fn test_room_with_area() {
        let header = classify_header("### Room: B00A-R0001 - Classroom 1 - 56.2 m²");
        assert_eq!(
            header,
            Some(Header::Room(RoomHeader {
                id: "B00A-R0001".to_string(),
                name: "Classroom 1".to_string(),
                area: Some(56.2),
            }))
        );

        match classify_header("### B009-R0005 - Store - 6.61 m2") {
            Some(Header::Room(r)) => assert_eq!(r.area, Some(6.61)),
            other => panic!("expected room, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_room_falls_back_to_room() {
        match classify_header("### 101 - Library") {
            Some(Header::Room(r)) => assert_eq!(r.id, "101"),
            other => panic!("expected room, got {:?}", other),
        }
    }

    #[test]
    fn test_area_type_headers() {
        assert_eq!(classify_header("## Exterior"), Some(Header::Area(AreaType::Exterior)));
        assert_eq!(
            classify_header("### Area Type: grounds"),
            Some(Header::Area(AreaType::Grounds))
        );
        assert_eq!(classify_header("## Exteriors"), None);
    }

    #[test]
    fn test_non_headers() {
        assert_eq!(classify_header("B1 - Block A"), None);
        assert_eq!(classify_header("## Summary of findings"), None);
        assert_eq!(classify_header("| Product | Result |"), None);
    }

    #[test]
    fn test_page_markers() {
        assert_eq!(page_marker("--- Page 12 ---"), Some(12));
        assert_eq!(page_marker("—— page 3 ——"), Some(3));
        assert_eq!(page_marker("Page 3"), None);
    }

    #[test]
    fn test_school_title() {
        let text = "Intro\n# Hillside Primary School - Asbestos Register\n## B1 - Block A";
        assert_eq!(school_title(text), Some("Hillside Primary School".to_string()));
        assert_eq!(school_title("# Riverside PS"), Some("Riverside PS".to_string()));
        assert_eq!(school_title("## B1 - Block A\n### Exterior"), None);
    }
}
