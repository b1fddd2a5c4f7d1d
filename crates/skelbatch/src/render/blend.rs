use crate::skeleton::BlendMode;

/// Fixed-function blend factor, named after the GL/wgpu equivalents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusSrcColor,
}

/// Concrete `(source, destination)` factor pair a batch is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendFunc {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendFunc {
    pub const fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self { src, dst }
    }
}

const NORMAL: BlendFunc = BlendFunc::new(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
const ADDITIVE: BlendFunc = BlendFunc::new(BlendFactor::SrcAlpha, BlendFactor::One);
const MULTIPLY: BlendFunc = BlendFunc::new(BlendFactor::DstColor, BlendFactor::OneMinusSrcAlpha);
const SCREEN: BlendFunc = BlendFunc::new(BlendFactor::One, BlendFactor::OneMinusSrcColor);

const NORMAL_PMA: BlendFunc = BlendFunc::new(BlendFactor::One, BlendFactor::OneMinusSrcAlpha);
const ADDITIVE_PMA: BlendFunc = BlendFunc::new(BlendFactor::One, BlendFactor::One);
const MULTIPLY_PMA: BlendFunc = BlendFunc::new(BlendFactor::DstColor, BlendFactor::OneMinusSrcAlpha);
const SCREEN_PMA: BlendFunc = BlendFunc::new(BlendFactor::One, BlendFactor::OneMinusSrcColor);

/// Pick the blend function for a slot's logical mode.
///
/// `premultiplied` selects the variants for textures whose color channels
/// are already multiplied by alpha.
pub fn select_blend(mode: BlendMode, premultiplied: bool) -> BlendFunc {
    match (mode, premultiplied) {
        (BlendMode::Normal, false) => NORMAL,
        (BlendMode::Additive, false) => ADDITIVE,
        (BlendMode::Multiply, false) => MULTIPLY,
        (BlendMode::Screen, false) => SCREEN,
        (BlendMode::Normal, true) => NORMAL_PMA,
        (BlendMode::Additive, true) => ADDITIVE_PMA,
        (BlendMode::Multiply, true) => MULTIPLY_PMA,
        (BlendMode::Screen, true) => SCREEN_PMA,
    }
}
