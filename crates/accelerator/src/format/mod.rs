//! Text rendering of listings and detail views.

pub mod describe;
pub mod table;
