//! # Coastlines Parallel
//!
//! Parallel execution for the coastlines pipeline.
//!
//! This crate provides:
//! - Processing modes (sequential, all cores, fixed thread count)
//! - Tile scheduling where a failing or panicking tile never affects others

pub mod strategy;
pub mod tiles;

pub use strategy::{set_num_threads, ParallelStrategy, ProcessingMode};
pub use tiles::{run_tiles, TileOutcome, TileReport, TileStatus};
