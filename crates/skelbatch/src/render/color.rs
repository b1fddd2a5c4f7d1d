use crate::render::blend::{BlendFunc, select_blend};
use crate::skeleton::{BlendMode, Color};

/// Final vertex color, one byte per channel.
pub type Rgba8 = [u8; 4];

fn channel(value: f32) -> u8 {
    // NaN casts to 0.
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Multiply skeleton, slot and attachment tints channel-wise and quantize.
pub fn composite_color(skeleton: Color, slot: Color, attachment: Color) -> Rgba8 {
    let c = skeleton * slot * attachment;
    [channel(c.r), channel(c.g), channel(c.b), channel(c.a)]
}

/// Vertex color and blend function for one slot.
pub fn composite(
    skeleton: Color,
    slot: Color,
    attachment: Color,
    blend_mode: BlendMode,
    premultiplied: bool,
) -> (Rgba8, BlendFunc) {
    (
        composite_color(skeleton, slot, attachment),
        select_blend(blend_mode, premultiplied),
    )
}
