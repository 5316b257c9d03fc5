//! Per-route values derived from pitches.
//!
//! Nothing here is persisted: a route's hardest grade and total length are
//! recomputed from its pitches whenever a listing needs them.

use serde::Serialize;

use crate::cotation::{HasCotation, max_cotation};

/// A pitch as seen by route aggregation.
pub trait PitchMetrics: HasCotation {
    /// Pitch length in metres, if known.
    fn length(&self) -> Option<i32>;
}

impl<T: PitchMetrics + ?Sized> PitchMetrics for &T {
    fn length(&self) -> Option<i32> {
        (**self).length()
    }
}

/// Total route length.
///
/// An explicit route length wins. Otherwise the pitch lengths are summed, but
/// only when every pitch has one: partial data gives `None`, never a partial sum.
/// A sum that does not fit in `i32` is also `None`.
pub fn total_length<P: PitchMetrics>(route_length: Option<i32>, pitches: &[P]) -> Option<i32> {
    route_length.or_else(|| {
        pitches
            .iter()
            .try_fold(0i32, |acc, p| acc.checked_add(p.length()?))
    })
}

/// What a route listing shows for one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    /// Hardest pitch cotation, `None` when no pitch is graded.
    pub max_cotation: Option<String>,
    /// See [`total_length`].
    pub total_length: Option<i32>,
    /// Number of pitches.
    pub pitch_count: usize,
    /// `false` when at least one pitch has no cotation.
    pub all_pitches_graded: bool,
}

impl RouteSummary {
    /// Aggregate `pitches` of a route whose own length is `route_length`.
    pub fn of<P: PitchMetrics>(route_length: Option<i32>, pitches: &[P]) -> Self {
        Self {
            max_cotation: max_cotation(pitches),
            total_length: total_length(route_length, pitches),
            pitch_count: pitches.len(),
            all_pitches_graded: pitches.iter().all(|p| p.cotation().is_some()),
        }
    }

    /// `"42m"`, or `"?m"` when the length is unknown.
    pub fn length_label(&self) -> String {
        match self.total_length {
            Some(n) => format!("{n}m"),
            None => "?m".to_string(),
        }
    }

    /// The hardest cotation, or `"?"`.
    pub fn cotation_label(&self) -> &str {
        self.max_cotation.as_deref().unwrap_or("?")
    }
}
