//! Podium features for Formula 1 race results.
//!
//! Derives, for every driver entry of every race, trailing-window form statistics of the driver
//! and of the constructor, together with the constructor's points to date in the season. Only
//! races strictly before the entry ever contribute to its features. Statistics left undefined
//! for want of history are filled with the global median of their column.

pub mod config;
pub mod csv;
pub mod data;
pub mod error;
pub mod features;
pub mod file;
pub mod fill;
pub mod linear;
pub mod metrics;
pub mod placeholder;
pub mod print;
pub mod score;
pub mod scorer;
pub mod season;
pub mod standings;
pub mod stub;
pub mod synthetic;
pub mod train;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

#[doc = include_str!("../README.md")]
#[cfg(doc)]
fn readme() {}
