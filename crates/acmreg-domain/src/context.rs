//! Hierarchical position inside a register document
//!
//! Both extraction paths walk a document top to bottom and need to know
//! which school, building and room the current line belongs to. The
//! context is a plain value: the table parser owns one per call, and the
//! AI pipeline threads one through its stages and bridges it across chunk
//! boundaries.

use crate::record::ExtractedRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// School name used until a title is known
pub const UNKNOWN_SCHOOL: &str = "Unknown School";

/// Which part of a site a room belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AreaType {
    /// Inside a building (most registers list these first)
    #[default]
    Interior,
    /// Building envelope
    Exterior,
    /// Open site areas
    Grounds,
}

impl AreaType {
    /// Parse a heading word, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interior" => Some(Self::Interior),
            "exterior" => Some(Self::Exterior),
            "grounds" => Some(Self::Grounds),
            _ => None,
        }
    }

    /// Title-case name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interior => "Interior",
            Self::Exterior => "Exterior",
            Self::Grounds => "Grounds",
        }
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields captured from a building heading
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingHeader {
    /// Building identifier, e.g. `B00A`
    pub id: String,
    /// Building name
    pub name: String,
    /// Construction year
    pub year: Option<i32>,
    /// Construction type, e.g. `Brick`
    pub construction: Option<String>,
}

/// Fields captured from a room heading
#[derive(Debug, Clone, PartialEq)]
pub struct RoomHeader {
    /// Room identifier, e.g. `B00A-R0001`
    pub id: String,
    /// Room name
    pub name: String,
    /// Floor area in m²
    pub area: Option<f64>,
}

/// Current School → Building → Room → Area position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchicalContext {
    /// School or facility name
    pub school_name: String,
    /// School code, e.g. `PS123`
    pub school_code: Option<String>,
    /// Building identifier
    pub building_id: Option<String>,
    /// Building name
    pub building_name: Option<String>,
    /// Construction year
    pub building_year: Option<i32>,
    /// Construction type
    pub building_construction: Option<String>,
    /// Room identifier
    pub room_id: Option<String>,
    /// Room name
    pub room_name: Option<String>,
    /// Room area in m²
    pub room_area: Option<f64>,
    /// Area type of the current room
    pub area_type: AreaType,
    /// Page being read (1-based)
    pub current_page: u32,
}

impl Default for HierarchicalContext {
    fn default() -> Self {
        Self {
            school_name: UNKNOWN_SCHOOL.to_string(),
            school_code: None,
            building_id: None,
            building_name: None,
            building_year: None,
            building_construction: None,
            room_id: None,
            room_name: None,
            room_area: None,
            area_type: AreaType::Interior,
            current_page: 1,
        }
    }
}

impl HierarchicalContext {
    /// Create a context seeded with a school name
    ///
    /// Blank names keep the default.
    pub fn for_school(name: &str) -> Self {
        let mut context = Self::default();
        let name = name.trim();
        if !name.is_empty() {
            context.school_name = name.to_string();
        }
        context
    }

    /// Enter a new building
    ///
    /// Building attributes are replaced wholesale. Room fields are cleared
    /// and the area type returns to Interior.
    pub fn enter_building(&mut self, header: BuildingHeader) {
        self.building_id = Some(header.id);
        self.building_name = Some(header.name);
        self.building_year = header.year;
        self.building_construction = header.construction;
        self.room_id = None;
        self.room_name = None;
        self.room_area = None;
        self.area_type = AreaType::Interior;
    }

    /// Enter a room inside the current building
    ///
    /// Room fields are replaced as a whole; a heading without an area
    /// clears the previous room's area.
    pub fn enter_room(&mut self, header: RoomHeader) {
        self.room_id = Some(header.id);
        self.room_name = Some(header.name);
        self.room_area = header.area;
    }

    /// Switch area type
    pub fn set_area_type(&mut self, area_type: AreaType) {
        self.area_type = area_type;
    }

    /// Move to a page, clamped to 1
    pub fn set_page(&mut self, page: u32) {
        self.current_page = page.max(1);
    }

    /// Carry building/room identity over from the last record a model returned
    ///
    /// Used between chunks so the next prompt knows where the previous chunk
    /// left off. Empty identifiers leave the context untouched.
    pub fn bridge_from(&mut self, record: &ExtractedRecord) {
        if !record.building_id.trim().is_empty() {
            self.building_id = Some(record.building_id.clone());
            self.building_name = record.building_name.clone();
        }
        if let Some(room_id) = record.room_id.as_deref().filter(|r| !r.trim().is_empty()) {
            self.room_id = Some(room_id.to_string());
            self.room_name = record.room_name.clone();
        }
    }

    /// Building id if one has been seen
    pub fn building(&self) -> Option<&str> {
        self.building_id.as_deref().filter(|b| !b.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn building(id: &str) -> BuildingHeader {
        BuildingHeader {
            id: id.to_string(),
            name: "Block A".to_string(),
            year: Some(1965),
            construction: Some("Brick".to_string()),
        }
    }

    fn room(id: &str, area: Option<f64>) -> RoomHeader {
        RoomHeader {
            id: id.to_string(),
            name: "Office".to_string(),
            area,
        }
    }

    #[test]
    fn test_defaults() {
        let context = HierarchicalContext::default();
        assert_eq!(context.school_name, "Unknown School");
        assert_eq!(context.building_id, None);
        assert_eq!(context.area_type, AreaType::Interior);
        assert_eq!(context.current_page, 1);
    }

    #[test]
    fn test_blank_school_keeps_default() {
        assert_eq!(HierarchicalContext::for_school("  ").school_name, UNKNOWN_SCHOOL);
        assert_eq!(HierarchicalContext::for_school("Hillside PS").school_name, "Hillside PS");
    }

    #[test]
    fn test_building_resets_room_and_area() {
        let mut context = HierarchicalContext::default();
        context.enter_building(building("B1"));
        context.enter_room(room("B1-R1", Some(12.5)));
        context.set_area_type(AreaType::Exterior);

        context.enter_building(building("B2"));

        assert_eq!(context.building_id.as_deref(), Some("B2"));
        assert_eq!(context.room_id, None);
        assert_eq!(context.room_name, None);
        assert_eq!(context.room_area, None);
        assert_eq!(context.area_type, AreaType::Interior);
    }

    #[test]
    fn test_room_keeps_building() {
        let mut context = HierarchicalContext::default();
        context.enter_building(building("B1"));
        context.enter_room(room("B1-R1", None));

        assert_eq!(context.building_id.as_deref(), Some("B1"));
        assert_eq!(context.building_year, Some(1965));
        assert_eq!(context.building_construction.as_deref(), Some("Brick"));
        assert_eq!(context.room_id.as_deref(), Some("B1-R1"));
    }

    #[test]
    fn test_room_without_area_clears_previous_area() {
        let mut context = HierarchicalContext::default();
        context.enter_building(building("B1"));
        context.enter_room(room("B1-R1", Some(20.0)));
        context.enter_room(room("B1-R2", None));

        assert_eq!(context.room_id.as_deref(), Some("B1-R2"));
        assert_eq!(context.room_area, None);
    }

    #[test]
    fn test_bridge_from_record() {
        let mut context = HierarchicalContext::default();
        let record = ExtractedRecord {
            building_id: "B7".to_string(),
            building_name: Some("Hall".to_string()),
            room_id: Some("B7-R2".to_string()),
            room_name: Some("Stage".to_string()),
            ..ExtractedRecord::default()
        };

        context.bridge_from(&record);
        assert_eq!(context.building(), Some("B7"));
        assert_eq!(context.room_name.as_deref(), Some("Stage"));

        // A record with no ids leaves the bridge in place
        context.bridge_from(&ExtractedRecord::default());
        assert_eq!(context.building(), Some("B7"));
        assert_eq!(context.room_id.as_deref(), Some("B7-R2"));
    }

    #[test]
    fn test_page_clamped() {
        let mut context = HierarchicalContext::default();
        context.set_page(0);
        assert_eq!(context.current_page, 1);
        context.set_page(12);
        assert_eq!(context.current_page, 12);
    }

    #[test]
    fn test_area_type_parse() {
        assert_eq!(AreaType::parse("EXTERIOR"), Some(AreaType::Exterior));
        assert_eq!(AreaType::parse(" grounds "), Some(AreaType::Grounds));
        assert_eq!(AreaType::parse("roof"), None);
    }
}
