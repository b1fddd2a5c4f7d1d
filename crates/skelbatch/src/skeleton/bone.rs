use serde::{Deserialize, Serialize};

/// A posed bone: the world affine transform produced by the skeleton update,
/// plus the `active` flag toggled by skin constraints.
///
/// A bone-local point `(x, y)` maps to world space as
/// `(a * x + b * y + world_x, c * x + d * y + world_y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bone {
    pub name: String,
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub world_x: f32,
    pub world_y: f32,
    pub active: bool,
}

impl Default for Bone {
    fn default() -> Self {
        Self {
            name: String::new(),
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            world_x: 0.0,
            world_y: 0.0,
            active: true,
        }
    }
}

impl Bone {
    /// Identity-transform bone at the origin.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Unrotated, unscaled bone translated to `(x, y)`.
    pub fn at(name: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            world_x: x,
            world_y: y,
            ..Self::new(name)
        }
    }

    /// Bone rotated by `radians` and scaled uniformly, translated to `(x, y)`.
    pub fn rotated(name: impl Into<String>, x: f32, y: f32, radians: f32, scale: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos * scale,
            b: -sin * scale,
            c: sin * scale,
            d: cos * scale,
            ..Self::at(name, x, y)
        }
    }

    pub fn local_to_world(&self, x: f32, y: f32) -> [f32; 2] {
        [
            x * self.a + y * self.b + self.world_x,
            x * self.c + y * self.d + self.world_y,
        ]
    }
}
