use serde::{Deserialize, Serialize};

use super::attachment::Attachment;
use super::color::Color;

/// Index of a slot in the skeleton's slot storage. Stable across draw-order changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub usize);

/// Logical blend mode authored on a slot.
///
/// Unknown names and indices fall back to `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlendMode {
    #[default]
    Normal,
    Additive,
    Multiply,
    Screen,
}

impl BlendMode {
    pub const ALL: [BlendMode; 4] = [
        BlendMode::Normal,
        BlendMode::Additive,
        BlendMode::Multiply,
        BlendMode::Screen,
    ];

    /// Map the exported integer encoding (0..=3) to a blend mode.
    pub fn from_index(index: u32) -> Self {
        match index {
            1 => Self::Additive,
            2 => Self::Multiply,
            3 => Self::Screen,
            _ => Self::Normal,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "additive" => Self::Additive,
            "multiply" => Self::Multiply,
            "screen" => Self::Screen,
            _ => Self::Normal,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Additive => "additive",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
        }
    }
}

impl From<String> for BlendMode {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<BlendMode> for String {
    fn from(mode: BlendMode) -> Self {
        mode.name().to_string()
    }
}

/// A draw-order entry: which bone it follows, its tint, blend mode and the
/// attachment currently shown (if any).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Slot {
    pub name: String,
    /// Index into `Skeleton::bones`.
    pub bone: usize,
    pub color: Color,
    pub blend_mode: BlendMode,
    pub attachment: Option<Attachment>,
}

impl Slot {
    pub fn new(name: impl Into<String>, bone: usize) -> Self {
        Self {
            name: name.into(),
            bone,
            ..Self::default()
        }
    }

    pub fn with_attachment(mut self, attachment: impl Into<Attachment>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }
}
