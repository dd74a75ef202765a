//! Hierarchical media identifiers
//!
//! Every node of the catalog is addressed by a [`MediaId`] with up to three
//! components, encoded as a single string:
//!
//! | form                    | example           |
//! |-------------------------|-------------------|
//! | `type`                  | `albums`          |
//! | `type/category`         | `albums/42`       |
//! | `type/category\|track`  | `albums/42\|1337` |
//!
//! The media type is made of letters only, the category of letters and
//! digits, and the track is a non-negative integer. Decoding is the exact
//! inverse of encoding, and two identifiers are equal iff their encoded forms
//! are equal.

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Media type of the single catalog root.
pub const ROOT_TYPE: &str = "root";

const CATEGORY_SEPARATOR: char = '/';
const TRACK_SEPARATOR: char = '|';

/// Address of a node in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaId {
    media_type: String,
    category: Option<String>,
    track: Option<u64>,
}

fn is_valid_type(value: &str) -> bool {
    !value.is_empty() && value.chars().all(char::is_alphabetic)
}

fn is_valid_category(value: &str) -> bool {
    !value.is_empty() && value.chars().all(char::is_alphanumeric)
}

fn parse_track(value: &str, encoded: &str) -> Result<u64> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(CatalogError::InvalidIdentifier(format!(
            "track component of '{}' is not a non-negative integer",
            encoded
        )));
    }
    value.parse::<u64>().map_err(|_| {
        CatalogError::InvalidIdentifier(format!("track component of '{}' is out of range", encoded))
    })
}

/// Encodes identifier components without building a [`MediaId`].
///
/// Fails when a track is given without a category or when a component does
/// not satisfy its grammar.
pub fn encode(media_type: &str, category: Option<&str>, track: Option<u64>) -> Result<String> {
    MediaId::new(media_type, category, track).map(|id| id.to_string())
}

impl MediaId {
    /// Builds an identifier from its components, validating each of them.
    pub fn new(media_type: &str, category: Option<&str>, track: Option<u64>) -> Result<Self> {
        if !is_valid_type(media_type) {
            return Err(CatalogError::InvalidIdentifier(format!(
                "media type '{}' must be non-empty and contain letters only",
                media_type
            )));
        }
        if let Some(category) = category {
            if !is_valid_category(category) {
                return Err(CatalogError::InvalidIdentifier(format!(
                    "category '{}' must be non-empty and alphanumeric",
                    category
                )));
            }
        }
        if track.is_some() && category.is_none() {
            return Err(CatalogError::InvalidIdentifier(format!(
                "track given without a category under '{}'",
                media_type
            )));
        }

        Ok(Self {
            media_type: media_type.to_string(),
            category: category.map(str::to_string),
            track,
        })
    }

    /// Decodes an encoded identifier.
    pub fn parse(encoded: &str) -> Result<Self> {
        let (media_type, rest) = match encoded.split_once(CATEGORY_SEPARATOR) {
            Some((media_type, rest)) => (media_type, Some(rest)),
            None => (encoded, None),
        };

        let Some(rest) = rest else {
            return Self::new(media_type, None, None);
        };

        let (category, track) = match rest.split_once(TRACK_SEPARATOR) {
            Some((category, track)) => (category, Some(parse_track(track, encoded)?)),
            None => (rest, None),
        };

        Self::new(media_type, Some(category), track).map_err(|err| match err {
            CatalogError::InvalidIdentifier(reason) => {
                CatalogError::InvalidIdentifier(format!("'{}': {}", encoded, reason))
            }
            other => other,
        })
    }

    /// The catalog root.
    pub fn root() -> Self {
        Self {
            media_type: ROOT_TYPE.to_string(),
            category: None,
            track: None,
        }
    }

    /// Identifier of a top-level media type.
    pub fn of_type(media_type: &str) -> Result<Self> {
        Self::new(media_type, None, None)
    }

    /// Child category of this type-level identifier.
    pub fn category_of(&self, category: &str) -> Result<Self> {
        if self.category.is_some() {
            return Err(CatalogError::InvalidIdentifier(format!(
                "'{}' already has a category",
                self
            )));
        }
        Self::new(&self.media_type, Some(category), None)
    }

    /// Track under this category-level identifier.
    pub fn track_of(&self, track: u64) -> Result<Self> {
        match (&self.category, self.track) {
            (Some(category), None) => Ok(Self {
                media_type: self.media_type.clone(),
                category: Some(category.clone()),
                track: Some(track),
            }),
            _ => Err(CatalogError::InvalidIdentifier(format!(
                "'{}' cannot hold tracks",
                self
            ))),
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn track(&self) -> Option<u64> {
        self.track
    }

    pub fn is_root(&self) -> bool {
        self.category.is_none() && self.media_type == ROOT_TYPE
    }

    /// Tracks are leaves; every other identifier may have children.
    pub fn is_browsable(&self) -> bool {
        self.track.is_none()
    }

    /// Identifier of the node listing this one, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match (&self.category, self.track) {
            (Some(category), Some(_)) => Some(Self {
                media_type: self.media_type.clone(),
                category: Some(category.clone()),
                track: None,
            }),
            (Some(_), None) => Some(Self {
                media_type: self.media_type.clone(),
                category: None,
                track: None,
            }),
            _ => Some(Self::root()),
        }
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.media_type)?;
        if let Some(category) = &self.category {
            write!(f, "{}{}", CATEGORY_SEPARATOR, category)?;
        }
        if let Some(track) = self.track {
            write!(f, "{}{}", TRACK_SEPARATOR, track)?;
        }
        Ok(())
    }
}

impl FromStr for MediaId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for MediaId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MediaId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::parse(&encoded).map_err(serde::de::Error::custom)
    }
}
