//! Rotation about the vertical (Z) axis, the only rotation buildings use.
//!
//! Buildings store their rotation as a sine/cosine pair. Every component that
//! needs to move a point between a building's local frame and world space goes
//! through [`XyRotation::rotate_about`] and [`XyRotation::inverse_rotate_about`];
//! the inverse simply negates the sine term.

use glam::{Vec2, Vec3};

/// A rotation in the XY plane, stored as `(sin, cos)` of the angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XyRotation {
    pub sin: f32,
    pub cos: f32,
}

impl Default for XyRotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl XyRotation {
    pub const IDENTITY: Self = Self { sin: 0.0, cos: 1.0 };

    pub fn from_angle(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self { sin, cos }
    }

    pub fn is_identity(&self) -> bool {
        self.sin == 0.0
    }

    /// The opposite rotation.
    pub fn inverse(&self) -> Self {
        Self {
            sin: -self.sin,
            cos: self.cos,
        }
    }

    /// Rotate a direction (no pivot).
    pub fn rotate_vec2(&self, v: Vec2) -> Vec2 {
        Vec2::new(v.x * self.cos - v.y * self.sin, v.y * self.cos + v.x * self.sin)
    }

    /// Rotate `p` about `pivot`, XY only.
    pub fn rotate_about_xy(&self, pivot: Vec2, p: Vec2) -> Vec2 {
        self.rotate_vec2(p - pivot) + pivot
    }

    /// Rotate `p` about `pivot` in the XY plane; Z is left unchanged.
    pub fn rotate_about(&self, pivot: Vec3, p: Vec3) -> Vec3 {
        self.rotate_about_xy(pivot.truncate(), p.truncate()).extend(p.z)
    }

    /// Undo [`rotate_about`](Self::rotate_about): world space back into the local frame.
    pub fn inverse_rotate_about(&self, pivot: Vec3, p: Vec3) -> Vec3 {
        self.inverse().rotate_about(pivot, p)
    }

    pub fn inverse_rotate_about_xy(&self, pivot: Vec2, p: Vec2) -> Vec2 {
        self.inverse().rotate_about_xy(pivot, p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn quarter_turn_maps_x_to_y() {
        let r = XyRotation::from_angle(FRAC_PI_2);
        let p = r.rotate_about(Vec3::ZERO, Vec3::new(1.0, 0.0, 5.0));
        assert!((p - Vec3::new(0.0, 1.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn inverse_round_trips_about_pivot() {
        let r = XyRotation::from_angle(0.7);
        let pivot = Vec3::new(10.0, -4.0, 0.0);
        let p = Vec3::new(13.0, 2.0, 7.0);
        let back = r.inverse_rotate_about(pivot, r.rotate_about(pivot, p));
        assert!((back - p).length() < 1e-4);
    }

    #[test]
    fn identity_is_noop() {
        let p = Vec3::new(3.0, 4.0, 5.0);
        assert!(XyRotation::IDENTITY.is_identity());
        assert_eq!(XyRotation::IDENTITY.rotate_about(Vec3::ONE, p), p);
    }
}
