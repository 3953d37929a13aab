//! Top-hat and black-hat transforms on binary masks
//!
//! - **Top-hat**: mask minus its opening. Small or thin foreground features.
//! - **Black-hat**: closing minus the mask. Small or thin background gaps
//!   enclosed by foreground, e.g. river channels cutting through land.

use coastlines_core::Result;
use ndarray::{Array2, Zip};

use super::binary::{closing, opening};
use super::element::StructuringElement;

/// Foreground cells removed by an opening
pub fn top_hat(mask: &Array2<bool>, element: &StructuringElement) -> Result<Array2<bool>> {
    let opened = opening(mask, element)?;
    Ok(Zip::from(mask).and(&opened).map_collect(|&m, &o| m && !o))
}

/// Background cells filled by a closing
pub fn black_hat(mask: &Array2<bool>, element: &StructuringElement) -> Result<Array2<bool>> {
    let closed = closing(mask, element)?;
    Ok(Zip::from(mask).and(&closed).map_collect(|&m, &c| c && !m))
}
