//! Geometry primitives shared by the model, compositor, and gesture engines.
//!
//! Clip positions are normalized: `(0.0, 0.0)` is the top-left and
//! `(1.0, 1.0)` the bottom-right corner of the canvas. Sizes are in canvas
//! pixels.

use serde::{Deserialize, Serialize};

/// A 2D vector, used both for normalized points and for per-axis scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const ONE: Vec2 = Vec2 { x: 1.0, y: 1.0 };
    /// Canvas center in normalized coordinates.
    pub const CENTER: Vec2 = Vec2 { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Same value on both axes.
    pub fn splat(v: f64) -> Self {
        Self { x: v, y: v }
    }

    /// Linear interpolation between two vectors. `t` is not clamped.
    pub fn lerp(a: &Vec2, b: &Vec2, t: f64) -> Vec2 {
        Vec2 {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Vec2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Whether both components differ from `other` by at most `epsilon`.
    pub fn approx_eq(&self, other: &Vec2, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }
}

impl Default for Vec2 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions are non-zero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Convert a normalized point to canvas pixels.
    pub fn to_pixels(&self, normalized: Vec2) -> Vec2 {
        Vec2::new(
            normalized.x * self.width as f64,
            normalized.y * self.height as f64,
        )
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// An axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centered on `center`.
    pub fn centered(center: Vec2, width: f64, height: f64) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }
}
