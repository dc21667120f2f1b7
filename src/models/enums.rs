//! Closed vocabularies for wine records.
//!
//! These double as the allow-lists the extraction validator enforces:
//! a reasoner response naming a retailer or type outside these lists is
//! discarded, never coerced to the nearest value.

use serde::{Deserialize, Serialize};

/// Dutch supermarkets we track. Values match the names used in captions
/// and on shelf labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Supermarket {
    #[serde(rename = "Albert Heijn")]
    AlbertHeijn,
    Dirk,
    #[serde(rename = "HEMA")]
    Hema,
    #[serde(rename = "LIDL")]
    Lidl,
    Jumbo,
    #[serde(rename = "ALDI")]
    Aldi,
    Plus,
    Sligro,
}

impl Supermarket {
    pub const ALL: &'static [Supermarket] = &[
        Supermarket::AlbertHeijn,
        Supermarket::Dirk,
        Supermarket::Hema,
        Supermarket::Lidl,
        Supermarket::Jumbo,
        Supermarket::Aldi,
        Supermarket::Plus,
        Supermarket::Sligro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Supermarket::AlbertHeijn => "Albert Heijn",
            Supermarket::Dirk => "Dirk",
            Supermarket::Hema => "HEMA",
            Supermarket::Lidl => "LIDL",
            Supermarket::Jumbo => "Jumbo",
            Supermarket::Aldi => "ALDI",
            Supermarket::Plus => "Plus",
            Supermarket::Sligro => "Sligro",
        }
    }

    /// Strict allow-list lookup. Case-insensitive on the canonical name,
    /// but no alias resolution — "Appie" does not parse.
    pub fn parse(value: &str) -> Option<Supermarket> {
        let value = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WineType {
    Red,
    White,
    Rose,
    Sparkling,
}

impl WineType {
    pub const ALL: &'static [WineType] = &[
        WineType::Red,
        WineType::White,
        WineType::Rose,
        WineType::Sparkling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WineType::Red => "red",
            WineType::White => "white",
            WineType::Rose => "rose",
            WineType::Sparkling => "sparkling",
        }
    }

    pub fn parse(value: &str) -> Option<WineType> {
        let value = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supermarket_parse_is_strict() {
        assert_eq!(Supermarket::parse("Albert Heijn"), Some(Supermarket::AlbertHeijn));
        assert_eq!(Supermarket::parse("jumbo"), Some(Supermarket::Jumbo));
        // Aliases and unknown retailers do not parse
        assert_eq!(Supermarket::parse("Appie"), None);
        assert_eq!(Supermarket::parse("Spar"), None);
        assert_eq!(Supermarket::parse(""), None);
    }

    #[test]
    fn wine_type_round_trip() {
        for t in WineType::ALL {
            assert_eq!(WineType::parse(t.as_str()), Some(*t));
        }
        assert_eq!(WineType::parse("orange"), None);
    }

    #[test]
    fn serde_names_match_canonical_strings() {
        let json = serde_json::to_string(&Supermarket::Hema).unwrap();
        assert_eq!(json, "\"HEMA\"");
        let json = serde_json::to_string(&WineType::Rose).unwrap();
        assert_eq!(json, "\"rose\"");
    }
}
