use serde::{Deserialize, Serialize};

/// Weights surfaced verbatim in the scoring prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub skills_weight: u8,
    pub geography_weight: u8,
    pub experience_weight: u8,
    pub status_weight: u8,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            skills_weight: 30,
            geography_weight: 30,
            experience_weight: 20,
            status_weight: 20,
        }
    }
}

impl ScoringRules {
    pub fn total(&self) -> u16 {
        u16::from(self.skills_weight)
            + u16::from(self.geography_weight)
            + u16::from(self.experience_weight)
            + u16::from(self.status_weight)
    }
}
