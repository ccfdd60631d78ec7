use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Axis-aligned bounding box in the units of the map service.
///
/// Expected to satisfy `minx < maxx` and `miny < maxy`. This is not enforced:
/// an inverted extent is passed on to the server as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    pub fn sign(self) -> f64 {
        match self {
            ZoomDirection::In => 1.0,
            ZoomDirection::Out => -1.0,
        }
    }

    pub fn from_sign(value: f64) -> Option<Self> {
        if value > 0.0 {
            Some(ZoomDirection::In)
        } else if value < 0.0 {
            Some(ZoomDirection::Out)
        } else {
            None
        }
    }
}

impl Extent {
    pub fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self {
            minx,
            miny,
            maxx,
            maxy,
        }
    }

    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }

    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.minx + self.maxx) / 2.0,
            (self.miny + self.maxy) / 2.0,
        )
    }

    /// Shrink (zoom in) or grow (zoom out) the extent around its center by
    /// `factor` of its current width and height.
    ///
    /// The result is derived from the extent it is called on, so repeated
    /// zooms compound: zooming in and then out by the same factor yields a
    /// width of `w * (1 - f) * (1 + f)`, not `w`.
    pub fn zoom(&self, direction: ZoomDirection, factor: f64) -> Self {
        let dx = direction.sign() * self.width() * factor / 2.0;
        let dy = direction.sign() * self.height() * factor / 2.0;

        Self {
            minx: self.minx + dx,
            miny: self.miny + dy,
            maxx: self.maxx - dx,
            maxy: self.maxy - dy,
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            minx: self.minx + dx,
            miny: self.miny + dy,
            maxx: self.maxx + dx,
            maxy: self.maxy + dy,
        }
    }
}

impl FromStr for Extent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split_whitespace()
            .map(f64::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidExtent(s.into()))?;

        match values[..] {
            [minx, miny, maxx, maxy] => Ok(Extent::new(minx, miny, maxx, maxy)),
            _ => Err(Error::InvalidExtent(s.into())),
        }
    }
}

// Rust float formatting never depends on the process locale, so the server
// always receives '.' as decimal separator.
impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.minx, self.miny, self.maxx, self.maxy)
    }
}
