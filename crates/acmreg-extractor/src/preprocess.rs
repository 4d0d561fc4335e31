//! Structural markers for text-extracted registers
//!
//! PDF text often stacks table columns vertically, so a room header ends up
//! on its own line far from its rows. Marking building and room headers and
//! positive results gives the model firmer anchors.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// B009 - Special Purpose - 1950 - Steel
static BUILDING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"B\d{3}\s*-\s*[A-Za-z][^-\n]+\s*-\s*\d{4}\s*-\s*[A-Za-z]+")
        .expect("building line pattern")
});

// B009 - R0005 - General Storeroom - 6.61 m2
static ROOM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"B\d{3}\s*-\s*R\d{4,5}\s*-\s*[^-\n]+\s*-\s*[\d.]+\s*m2").expect("room line pattern")
});

static ACM_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Asbestos-containing[ \n]material").expect("acm phrase pattern"));

const ACM_MARKER: &str = ">>> ACM DETECTED: Asbestos-containing material <<<";

/// Counts gathered while preprocessing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessMetadata {
    /// Input length in bytes
    pub original_length: usize,
    /// Output length in bytes
    pub processed_length: usize,
    /// Building header lines found
    pub buildings_found: usize,
    /// Room header lines found
    pub rooms_found: usize,
    /// Occurrences of "Asbestos-containing"
    pub acm_indicators_found: usize,
    /// Occurrences of "No Asbestos"
    pub no_asbestos_found: usize,
}

/// Insert building, room and ACM markers into register text
pub fn preprocess(content: &str) -> (String, PreprocessMetadata) {
    let mut metadata = PreprocessMetadata {
        original_length: content.len(),
        buildings_found: BUILDING_LINE.find_iter(content).count(),
        rooms_found: ROOM_LINE.find_iter(content).count(),
        acm_indicators_found: content.matches("Asbestos-containing").count(),
        no_asbestos_found: content.matches("No Asbestos").count(),
        ..PreprocessMetadata::default()
    };

    let processed = BUILDING_LINE.replace_all(content, "\n\n=== BUILDING: ${0} ===\n${0}");
    let processed = ROOM_LINE.replace_all(&processed, "\n--- ROOM: ${0} ---\n${0}");
    let processed = ACM_PHRASE.replace_all(&processed, ACM_MARKER).into_owned();

    metadata.processed_length = processed.len();
    (processed, metadata)
}
