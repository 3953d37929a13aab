//! Structuring elements for binary morphology

use coastlines_core::{Error, Result};

/// Shape of a structuring element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuringElement {
    /// Square of side 2r+1 (chessboard distance ≤ r)
    Square(usize),
    /// Plus shape with arms of length r
    Cross(usize),
    /// Euclidean disk, cells with dr² + dc² ≤ r²
    Disk(usize),
}

impl Default for StructuringElement {
    fn default() -> Self {
        StructuringElement::Disk(1)
    }
}

impl StructuringElement {
    pub fn validate(&self) -> Result<()> {
        if self.radius() == 0 {
            return Err(Error::InvalidParameter {
                name: "radius",
                value: "0".to_string(),
                reason: "structuring element radius must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn radius(&self) -> usize {
        match self {
            StructuringElement::Square(r)
            | StructuringElement::Cross(r)
            | StructuringElement::Disk(r) => *r,
        }
    }

    /// (dr, dc) offsets of every active cell, centre included
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let r = self.radius() as isize;
        let mut offsets = Vec::new();
        for dr in -r..=r {
            for dc in -r..=r {
                let active = match self {
                    StructuringElement::Square(_) => true,
                    StructuringElement::Cross(_) => dr == 0 || dc == 0,
                    StructuringElement::Disk(_) => dr * dr + dc * dc <= r * r,
                };
                if active {
                    offsets.push((dr, dc));
                }
            }
        }
        offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_counts() {
        assert_eq!(StructuringElement::Square(1).offsets().len(), 9);
        assert_eq!(StructuringElement::Cross(2).offsets().len(), 9);
        // r = 1 disk excludes diagonals (√2 > 1)
        assert_eq!(StructuringElement::Disk(1).offsets().len(), 5);
        assert_eq!(StructuringElement::Disk(3).offsets().len(), 29);
    }

    #[test]
    fn test_zero_radius_rejected() {
        assert!(StructuringElement::Disk(0).validate().is_err());
        assert!(StructuringElement::Square(2).validate().is_ok());
    }
}
