//! Parsing of external import sources into candidates

pub mod csv;

pub use self::csv::parse_candidates;
