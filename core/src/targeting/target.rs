use serde::{Deserialize, Serialize};
use std::fmt;

/// The three pulse-check sites the user can cycle through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PulseSite {
    #[default]
    Carotid,
    Brachial,
    Radial,
}

impl PulseSite {
    pub const ALL: [PulseSite; 3] = [PulseSite::Carotid, PulseSite::Brachial, PulseSite::Radial];

    /// Order used when the user taps "next position".
    pub fn next(self) -> PulseSite {
        match self {
            PulseSite::Carotid => PulseSite::Brachial,
            PulseSite::Brachial => PulseSite::Radial,
            PulseSite::Radial => PulseSite::Carotid,
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            PulseSite::Carotid => &["carotid", "neck"],
            PulseSite::Brachial => &["brachial", "upper arm"],
            PulseSite::Radial => &["radial", "wrist"],
        }
    }

    /// Plausible vertical band for the site in a typical framing.
    pub fn accepts_y(self, y: f32) -> bool {
        match self {
            PulseSite::Carotid => y < 0.5,
            PulseSite::Brachial => y > 0.3 && y < 0.7,
            PulseSite::Radial => y > 0.6,
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            PulseSite::Carotid => {
                "Place two fingers in the groove beside the windpipe, just below the jaw."
            }
            PulseSite::Brachial => {
                "Place two fingers on the inside of the upper arm, between elbow and shoulder."
            }
            PulseSite::Radial => "Place two fingers on the thumb side of the inner wrist.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PulseSite::Carotid => "carotid",
            PulseSite::Brachial => "brachial",
            PulseSite::Radial => "radial",
        }
    }
}

impl fmt::Display for PulseSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a placement target stands for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase", tag = "kind", content = "site")]
pub enum PositionKind {
    Chest,
    Pulse(PulseSite),
}

/// The single normalized point the user should align hands or fingers to.
/// Replaced wholesale whenever a new analysis arrives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlacementTarget {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
    pub kind: Option<PositionKind>,
}

impl PlacementTarget {
    pub fn new(x: f32, y: f32, confidence: f32, kind: Option<PositionKind>) -> Self {
        Self {
            x,
            y,
            confidence,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_cycle_returns_to_start() {
        let mut site = PulseSite::Carotid;
        for _ in 0..PulseSite::ALL.len() {
            site = site.next();
        }
        assert_eq!(site, PulseSite::Carotid);
        assert_eq!(PulseSite::Carotid.next(), PulseSite::Brachial);
    }

    #[test]
    fn vertical_bands_match_anatomy() {
        assert!(PulseSite::Carotid.accepts_y(0.3));
        assert!(!PulseSite::Carotid.accepts_y(0.5));
        assert!(PulseSite::Brachial.accepts_y(0.5));
        assert!(!PulseSite::Brachial.accepts_y(0.3));
        assert!(PulseSite::Radial.accepts_y(0.8));
        assert!(!PulseSite::Radial.accepts_y(0.6));
    }
}
