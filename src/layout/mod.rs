//! Page geometry: skew, rows, repeating noise and column zones.

pub mod header;
pub mod noise;
pub mod rows;
pub mod skew;
pub mod zones;
