//! Sprite-index text files.
//!
//! A handful of UTF-16LE text files inside the bundle tree describe where
//! individual 2D art images sit inside their packed sprite sheets, one image
//! per line:
//!
//! ```text
//! "Art/2DArt/UIImages/Common/Icon" "Art/Textures/Interface/2D/sheet.dds" 0 0 63 63
//! ```

use std::sync::OnceLock;

use derive_more::derive::{Constructor, Deref};
use regex::Regex;
use widestring::U16Str;

use crate::error::{Error, Result};

/// A sprite-index file together with the path prefixes it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteList {
    /// Path of the index text file inside the bundle tree
    pub path: &'static str,

    /// Prefix of the image names this list describes
    pub name_prefix: &'static str,

    /// Prefix of the sprite-sheet textures this list points into
    pub sprite_prefix: &'static str,
}

/// All known sprite-index files.
pub const SPRITE_LISTS: &[SpriteList] = &[
    SpriteList {
        path: "Art/UIImages1.txt",
        name_prefix: "Art/2DArt/UIImages/",
        sprite_prefix: "Art/Textures/Interface/2D/",
    },
    SpriteList {
        path: "Art/UIDivinationImages.txt",
        name_prefix: "Art/2DItems/Divination/Images/",
        sprite_prefix: "Art/Textures/Interface/2D/DivinationCards/",
    },
    SpriteList {
        path: "Art/UIShopImages.txt",
        name_prefix: "Art/2DArt/Shop/",
        sprite_prefix: "Art/Textures/Interface/2D/Shop/",
    },
];

/// One image inside a sprite sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteImage {
    /// Logical name of the image
    pub name: String,

    /// Path of the sheet texture holding the image
    pub sprite_path: String,

    /// Top edge of the crop inside the sheet
    pub top: i32,

    /// Left edge of the crop inside the sheet
    pub left: i32,

    /// Crop width in pixels
    pub width: i32,

    /// Crop height in pixels
    pub height: i32,
}

/// A parsed sprite-index file.
#[derive(Constructor, Debug, Clone, PartialEq, Eq, Deref)]
pub struct SpriteIndex(Vec<SpriteImage>);

/// Whether `path` names an image packed inside one of the known sprite sheets.
pub fn is_inside_sprite(path: &str) -> bool {
    SPRITE_LISTS
        .iter()
        .any(|list| path.starts_with(list.name_prefix))
}

fn sprite_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^"([^"]+)" "([^"]+)" ([^ ]+) ([^ ]+) ([^ ]+) ([^ ]+)$"#).unwrap()
    })
}

/// Parse a sprite-index file (UTF-16LE text) into its image records.
pub fn parse_sprite_index(data: &[u8]) -> Result<SpriteIndex> {
    let text = decode_utf16le(data)?;
    let pattern = sprite_line_pattern();

    let mut images = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let captures = pattern
            .captures(line)
            .ok_or(Error::InvalidSpriteIndex { line: i + 1 })?;
        let coord = |n: usize| -> Result<i32> {
            captures[n]
                .parse()
                .map_err(|_| Error::InvalidSpriteIndex { line: i + 1 })
        };

        let (top, left) = (coord(3)?, coord(4)?);
        let (bottom, right) = (coord(5)?, coord(6)?);
        images.push(SpriteImage {
            name: captures[1].to_string(),
            sprite_path: captures[2].to_string(),
            top,
            left,
            width: bottom - top + 1,
            height: right - left + 1,
        });
    }

    Ok(SpriteIndex::new(images))
}

/// Decode UTF-16LE bytes to a string, stripping a leading BOM if present.
pub fn decode_utf16le(data: &[u8]) -> Result<String> {
    if data.len() % 2 != 0 {
        return Err(Error::InvalidSpriteIndex { line: 0 });
    }

    let mut units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes(pair.try_into().unwrap()))
        .collect();
    if units.first() == Some(&0xfeff) {
        units.remove(0);
    }

    Ok(U16Str::from_slice(&units).to_string_lossy())
}
