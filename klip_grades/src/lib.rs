//! French-scale climbing grades ("cotations") and the values derived from them.
//!
//! - [`cotation`]: parsing, ordering and validation of grade strings such as `"6a+"`.
//! - [`summary`]: per-route aggregates (hardest pitch, total length) used by listings.

#![deny(missing_docs)]

pub mod cotation;
pub mod summary;

pub use cotation::{
    Grade, GradeError, HasCotation, compare_grades, is_valid_cotation, max_cotation, parse_grade,
};
pub use summary::{PitchMetrics, RouteSummary, total_length};
