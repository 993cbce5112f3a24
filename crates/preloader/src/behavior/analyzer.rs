#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::fmt;

/// Predicted near-future need derived from recent interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Intent {
    BrowsePlaces,
    PlanTrip,
    OpenCommunity,
    ManageProfile,
}

impl Intent {
    pub const ALL: [Intent; 4] = [
        Intent::BrowsePlaces,
        Intent::PlanTrip,
        Intent::OpenCommunity,
        Intent::ManageProfile,
    ];

    /// Route whose bundle satisfies this intent.
    pub fn route(self) -> &'static str {
        match self {
            Intent::BrowsePlaces => "places",
            Intent::PlanTrip => "planner",
            Intent::OpenCommunity => "community",
            Intent::ManageProfile => "profile",
        }
    }

    /// Interaction names whose presence anywhere in the log fires this intent.
    pub fn markers(self) -> &'static [&'static str] {
        match self {
            Intent::BrowsePlaces => &["search-input-focus", "place-card-hover"],
            Intent::PlanTrip => &["planner-cta-hover", "trip-form-focus"],
            Intent::OpenCommunity => &["community-tab-hover", "post-card-hover"],
            Intent::ManageProfile => &["avatar-menu-open", "subscription-badge-hover"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::BrowsePlaces => "likely-to-browse-places",
            Intent::PlanTrip => "likely-to-plan-trip",
            Intent::OpenCommunity => "likely-to-open-community",
            Intent::ManageProfile => "likely-to-manage-profile",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait BehaviorAnalyzer: Send + Sync {
    /// Map an interaction history to the intents it implies. Must be pure.
    fn predict(&self, interactions: &[&str]) -> BTreeSet<Intent>;
}

/// Fires an intent when any of its marker interactions is present.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkerAnalyzer;

impl BehaviorAnalyzer for MarkerAnalyzer {
    fn predict(&self, interactions: &[&str]) -> BTreeSet<Intent> {
        Intent::ALL
            .into_iter()
            .filter(|intent| {
                intent
                    .markers()
                    .iter()
                    .any(|marker| interactions.contains(marker))
            })
            .collect()
    }
}
