//! Binary mathematical morphology and region analysis
//!
//! Operations on boolean masks used by the coastal masker:
//! - **Erosion / dilation / opening / closing** with square, cross or disk
//!   structuring elements
//! - **Top-hat / black-hat**: thin foreground features / thin enclosed gaps
//! - **Distance transform**: exact squared Euclidean distance to a mask
//! - **Labelling**: connected components, sieving and seed selection

mod binary;
mod distance;
mod element;
mod label;
mod tophat;

pub use binary::{boundary, closing, dilate, erode, opening};
pub use distance::squared_distance_to;
pub use element::StructuringElement;
pub use label::{
    label, label_classes, select_touching, sieve, sieve_classes, Connectivity, Labels,
};
pub use tophat::{black_hat, top_hat};
