//! Rectangular extents in the KVP encoding used by WMS and WFS.

use serde::{Deserialize, Serialize};

use crate::crs::AxisOrder;

/// Extent in a single CRS, always stored easting/longitude first.
///
/// Services that declare northing-first axes receive the swapped form through
/// [`to_kvp_ordered`](Self::to_kvp_ordered).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse `minx,miny,maxx,maxy`. Whitespace around ordinates is ignored.
    pub fn from_kvp(value: &str) -> Result<Self, BboxParseError> {
        let ordinates = value
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<f64>()
                    .map_err(|_| BboxParseError::InvalidOrdinate(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match ordinates[..] {
            [min_x, min_y, max_x, max_y] => Ok(Self::new(min_x, min_y, max_x, max_y)),
            _ => Err(BboxParseError::WrongArity {
                value: value.to_string(),
                found: ordinates.len(),
            }),
        }
    }

    /// `minx,miny,maxx,maxy` with the shortest float representation.
    pub fn to_kvp(&self) -> String {
        format!("{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }

    /// KVP value in the axis order the server expects.
    pub fn to_kvp_ordered(&self, order: AxisOrder) -> String {
        if order.is_swapped() {
            self.swapped().to_kvp()
        } else {
            self.to_kvp()
        }
    }

    /// Same extent with the two axes exchanged.
    pub fn swapped(&self) -> Self {
        Self::new(self.min_y, self.min_x, self.max_y, self.max_x)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Zero or negative extent on either axis.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BboxParseError {
    #[error("BBOX '{value}' has {found} ordinates, expected minx,miny,maxx,maxy")]
    WrongArity { value: String, found: usize },

    #[error("BBOX ordinate '{0}' is not a number")]
    InvalidOrdinate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swapped_kvp() {
        let bbox = BoundingBox::new(-74.02, 40.70, -74.0, 40.72);
        assert_eq!(bbox.to_kvp_ordered(AxisOrder::XY), "-74.02,40.7,-74,40.72");
        assert_eq!(bbox.to_kvp_ordered(AxisOrder::YX), "40.7,-74.02,40.72,-74");
        assert_eq!(bbox.swapped().swapped(), bbox);
    }

    #[test]
    fn test_degenerate() {
        assert!(BoundingBox::new(0.0, 0.0, 0.0, 0.0).is_degenerate());
        assert!(BoundingBox::new(5.0, 0.0, 1.0, 1.0).is_degenerate());
        assert!(!BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }
}
