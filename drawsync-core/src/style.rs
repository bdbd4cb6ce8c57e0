//! Style defaults and lookup tables.
//!
//! The canvas server wants numeric font family identifiers and literal colors.
//! [`StyleTables`] maps the friendlier document spellings onto those. A shared
//! read-only instance is available through [`StyleTables::shared`]; the
//! compiler takes the tables by reference so tests can substitute their own.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::model::FontFamily;

/// Default stroke color.
pub const DEFAULT_STROKE: &str = "#1e1e1e";
/// Default background color.
pub const DEFAULT_BACKGROUND: &str = "transparent";
/// Default fill style.
pub const DEFAULT_FILL_STYLE: &str = "solid";
/// Default stroke width.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;
/// Default stroke style.
pub const DEFAULT_STROKE_STYLE: &str = "solid";
/// Default roughness (1 = "artist").
pub const DEFAULT_ROUGHNESS: f64 = 1.0;
/// Default opacity.
pub const DEFAULT_OPACITY: f64 = 100.0;
/// Font size of labels bound to shapes and connectors.
pub const LABEL_FONT_SIZE: f64 = 16.0;
/// Font size of free-standing texts.
pub const TEXT_FONT_SIZE: f64 = 20.0;
/// Font family used when none is given or the name is unknown (Virgil).
pub const DEFAULT_FONT_FAMILY: u8 = 1;

/// Font and color lookup tables.
#[derive(Debug, Clone)]
pub struct StyleTables {
    fonts: HashMap<String, u8>,
    palette: HashMap<String, String>,
}

impl Default for StyleTables {
    fn default() -> Self {
        let fonts = [("virgil", 1), ("helvetica", 2), ("cascadia", 3)]
            .into_iter()
            .map(|(name, id)| (name.to_string(), id))
            .collect();

        let palette = [
            ("light-blue", "#a5d8ff"),
            ("red", "#ffc9c9"),
            ("green", "#b2f2bb"),
            ("yellow", "#ffec99"),
            ("purple", "#d0bfff"),
            ("orange", "#ffd8a8"),
            ("gray", "#dee2e6"),
            ("pink", "#fcc2d7"),
            ("cyan", "#99e9f2"),
            ("white", "#ffffff"),
            ("black", "#1e1e1e"),
        ]
        .into_iter()
        .map(|(name, hex)| (name.to_string(), hex.to_string()))
        .collect();

        Self { fonts, palette }
    }
}

impl StyleTables {
    /// Process-wide default tables, built on first use.
    #[must_use]
    pub fn shared() -> &'static Self {
        static TABLES: OnceLock<StyleTables> = OnceLock::new();
        TABLES.get_or_init(Self::default)
    }

    /// Tables with no fonts or palette entries.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            fonts: HashMap::new(),
            palette: HashMap::new(),
        }
    }

    /// Register a font family name (case-insensitive).
    #[must_use]
    pub fn with_font(mut self, name: &str, id: u8) -> Self {
        self.fonts.insert(name.to_ascii_lowercase(), id);
        self
    }

    /// Register a named color (case-insensitive).
    #[must_use]
    pub fn with_color(mut self, name: &str, value: &str) -> Self {
        self.palette
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Resolve a font family to its numeric identifier.
    ///
    /// Unknown names fall back to [`DEFAULT_FONT_FAMILY`].
    #[must_use]
    pub fn font_id(&self, family: Option<&FontFamily>) -> u8 {
        match family {
            Some(FontFamily::Id(id)) => *id,
            Some(FontFamily::Named(name)) => self
                .fonts
                .get(&name.to_ascii_lowercase())
                .copied()
                .unwrap_or_else(|| {
                    tracing::debug!("unknown font family '{name}', using default");
                    DEFAULT_FONT_FAMILY
                }),
            None => DEFAULT_FONT_FAMILY,
        }
    }

    /// Resolve a color, translating palette names. Anything else passes through.
    #[must_use]
    pub fn color(&self, value: &str) -> String {
        self.palette
            .get(&value.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| value.to_string())
    }
}
