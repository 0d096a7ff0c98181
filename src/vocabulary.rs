//! Closed vocabularies for analyst ratings and actions.

use std::fmt;

pub const DEFAULT_RATING: &str = "hold";
pub const DEFAULT_ACTION: &str = "initiated by";

/// Five-point analyst rating scale, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Buy,
    Outperform,
    Hold,
    Underperform,
    Sell,
}

impl Rating {
    /// Maps a trimmed, lowercased rating label onto the scale.
    ///
    /// Returns `None` for labels outside the known synonyms.
    pub fn parse(label: &str) -> Option<Rating> {
        match label {
            "buy" | "strong-buy" | "strong buy" | "speculative buy" | "positive" => Some(Rating::Buy),

            "outperform" | "sector outperform" | "market outperform" | "overweight"
            | "outperformer" => Some(Rating::Outperform),

            "hold" | "neutral" | "unchanged" | "market perform" | "equal weight" | "in-line"
            | "sector perform" | "sector weight" | "peer perform" => Some(Rating::Hold),

            "underperform" | "underweight" | "sector underperform" | "under perform" | "reduce" => {
                Some(Rating::Underperform)
            }

            "sell" | "negative" => Some(Rating::Sell),

            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Buy => "buy",
            Rating::Outperform => "outperform",
            Rating::Hold => "hold",
            Rating::Underperform => "underperform",
            Rating::Sell => "sell",
        }
    }

    /// Position on the scale in `[0, 1]`, sell = 0 and buy = 1.
    pub fn ordinal(&self) -> f64 {
        match self {
            Rating::Buy => 1.0,
            Rating::Outperform => 0.75,
            Rating::Hold => 0.5,
            Rating::Underperform => 0.25,
            Rating::Sell => 0.0,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical label for a rating; unknown labels are returned unchanged.
pub fn canonical_rating(label: &str) -> String {
    match Rating::parse(label) {
        Some(rating) => rating.as_str().to_string(),
        None => label.to_string(),
    }
}

/// Ordinal of a stored rating label. Unknown labels score as the worst case.
pub fn rating_ordinal(label: &str) -> f64 {
    Rating::parse(label).map(|r| r.ordinal()).unwrap_or(0.0)
}

/// What the brokerage did to its price target or rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Upgraded,
    TargetRaised,
    Initiated,
    Reiterated,
    TargetSet,
    TargetLowered,
    Downgraded,
}

impl Action {
    /// Accepts the feed's wording with or without the trailing `" by"`.
    pub fn parse(label: &str) -> Option<Action> {
        let label = label.trim();
        let label = label.strip_suffix(" by").unwrap_or(label);
        match label {
            "upgraded" => Some(Action::Upgraded),
            "target raised" => Some(Action::TargetRaised),
            "initiated" => Some(Action::Initiated),
            "reiterated" => Some(Action::Reiterated),
            "target set" => Some(Action::TargetSet),
            "target lowered" => Some(Action::TargetLowered),
            "downgraded" => Some(Action::Downgraded),
            _ => None,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            Action::Upgraded => 1.0,
            Action::TargetRaised => 0.75,
            Action::Initiated | Action::Reiterated | Action::TargetSet => 0.5,
            Action::TargetLowered => 0.25,
            Action::Downgraded => 0.0,
        }
    }
}
