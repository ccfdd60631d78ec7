use std::ops::{Add, Mul};

use gtk::graphene;
use nalgebra::{vector, Scalar, Vector2};
use num_traits::Zero;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<T> {
    pub x_min: T,
    pub y_min: T,
    pub x_max: T,
    pub y_max: T,
}

impl<T> Bounds<T> {
    /// Bounds with origin at zero and the given size.
    pub fn from_size(size: Vector2<T>) -> Self
    where
        T: Scalar + Copy + Zero,
    {
        Self {
            x_min: T::zero(),
            y_min: T::zero(),
            x_max: size.x,
            y_max: size.y,
        }
    }
}

impl<T> Add<Vector2<T>> for Bounds<T>
where
    T: Scalar + Copy,
    T: Add<T, Output = T>,
{
    type Output = Bounds<T>;

    fn add(self, offset: Vector2<T>) -> Self::Output {
        Self {
            x_min: self.x_min + offset.x,
            y_min: self.y_min + offset.y,
            x_max: self.x_max + offset.x,
            y_max: self.y_max + offset.y,
        }
    }
}

impl<T> Mul<T> for Bounds<T>
where
    T: Copy,
    T: Mul<T, Output = T>,
{
    type Output = Bounds<T>;

    fn mul(self, scale: T) -> Self::Output {
        Self {
            x_min: self.x_min * scale,
            y_min: self.y_min * scale,
            x_max: self.x_max * scale,
            y_max: self.y_max * scale,
        }
    }
}

impl From<Bounds<f64>> for graphene::Rect {
    fn from(b: Bounds<f64>) -> Self {
        graphene::Rect::new(
            b.x_min as _,
            b.y_min as _,
            (b.x_max - b.x_min) as _,
            (b.y_max - b.y_min) as _,
        )
    }
}

/// Screen-space transform of the displayed map image: a point `p` of the
/// image is drawn at `offset + p * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub offset: Vector2<f64>,
    pub scale: f64,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            offset: vector![0.0, 0.0],
            scale: 1.0,
        }
    }

    pub fn apply(&self, bounds: Bounds<f64>) -> Bounds<f64> {
        bounds * self.scale + self.offset
    }

    /// Scale by `ratio` while keeping the screen point `focus` fixed.
    pub fn zoom_with_focus(&self, focus: Vector2<f64>, ratio: f64) -> Self {
        Self {
            offset: focus - (focus - self.offset) * ratio,
            scale: self.scale * ratio,
        }
    }

    pub fn translate(&self, delta: Vector2<f64>) -> Self {
        Self {
            offset: self.offset + delta,
            scale: self.scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transform_apply() {
        let t = Transform {
            offset: vector![10.0, -5.0],
            scale: 2.0,
        };

        let b = t.apply(Bounds::from_size(vector![100.0, 50.0]));

        assert_eq!(
            b,
            Bounds {
                x_min: 10.0,
                y_min: -5.0,
                x_max: 210.0,
                y_max: 95.0,
            }
        );
    }

    #[test]
    fn zoom_keeps_focus_fixed() {
        let t = Transform::identity().translate(vector![4.0, 8.0]);
        let focus = vector![50.0, 30.0];

        let z = t.zoom_with_focus(focus, 1.25);

        // the image point under the focus before zooming stays there
        let p = (focus - t.offset) / t.scale;
        assert_eq!(z.offset + p * z.scale, focus);
        assert_eq!(z.scale, 1.25);
    }
}
