use crate::random::RandomSource;
use serde::{Deserialize, Serialize};

/// Token standard the collection is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    Erc721,
    Erc1155,
}

impl CollectionType {
    pub const ALL: [CollectionType; 2] = [CollectionType::Erc721, CollectionType::Erc1155];

    /// Uniform pick between the supported standards.
    pub fn random(rng: &mut dyn RandomSource) -> Self {
        Self::ALL[rng.index(Self::ALL.len())]
    }
}

/// Metadata scraped from a collection page, as submitted to the ingestion API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub symbol: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: CollectionType,
}

impl CollectionInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: CollectionType) -> Self {
        let name = name.into();
        Self {
            symbol: symbol_for(&name),
            name,
            description: description.into(),
            kind,
        }
    }
}

/// A collection the ingestion API accepted, ready for asset harvesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedCollection {
    #[serde(flatten)]
    pub info: CollectionInfo,
    pub collection_id: String,
    pub item_cnt: u32,
}

/// First three characters of `name`, uppercased, capped at three characters.
///
/// ```
/// use harvest_marketplace::model::symbol_for;
///
/// assert_eq!(symbol_for("Bored Ape Yacht Club"), "BOR");
/// assert_eq!(symbol_for("ok"), "OK");
/// assert_eq!(symbol_for(""), "");
/// ```
pub fn symbol_for(name: &str) -> String {
    name.chars()
        .take(3)
        .collect::<String>()
        .to_uppercase()
        .chars()
        .take(3)
        .collect()
}

/// Random asset count in `[1, min(configured_max, observed_max))`.
///
/// An empty range (the smaller bound is 0 or 1) yields 1.
pub fn pick_item_count(rng: &mut dyn RandomSource, configured_max: u32, observed_max: u32) -> u32 {
    let upper = configured_max.min(observed_max);
    if upper <= 1 {
        return 1;
    }
    rng.range(1, u64::from(upper)) as u32
}
