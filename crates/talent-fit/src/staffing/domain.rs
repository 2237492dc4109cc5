use std::collections::BTreeMap;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier for an employee profile that can be staffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub i64);

/// Identifier for a project needing staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationId(pub i64);

impl FromStr for ProjectId {
    type Err = ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.trim().parse::<i64>().map(ProjectId)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dense embedding produced by the provider model. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Cosine similarity in `[-1, 1]`; mismatched or zero-length vectors score 0.
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> f64 {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return 0.0;
        }

        let mut dot = 0.0_f64;
        let mut left = 0.0_f64;
        let mut right = 0.0_f64;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            let (a, b) = (f64::from(*a), f64::from(*b));
            dot += a * b;
            left += a * a;
            right += b * b;
        }

        if left == 0.0 || right == 0.0 {
            return 0.0;
        }
        dot / (left.sqrt() * right.sqrt())
    }
}

/// User fields joined onto a candidate for display.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserSummary {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    pub geo: String,
    pub profile_type: String,
    pub skills: Vec<String>,
    pub years_of_experience: u32,
    pub industry: String,
    pub open_to_extra_work: bool,
    pub date_of_joining: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notice_date: Option<NaiveDate>,
    #[serde(skip)]
    pub embedding: Option<EmbeddingVector>,
}

impl Candidate {
    pub fn display_name(&self) -> String {
        match &self.user {
            Some(user) => format!("{} {}", user.first_name, user.last_name)
                .trim()
                .to_string(),
            None => format!("Candidate {}", self.id),
        }
    }

    /// True when any field feeding the embedding text differs. Skill order is ignored.
    pub fn describing_fields_changed(&self, other: &Candidate) -> bool {
        let mut mine = self.skills.clone();
        let mut theirs = other.skills.clone();
        mine.sort();
        theirs.sort();

        mine != theirs
            || self.profile_type != other.profile_type
            || self.industry != other.industry
            || self.geo != other.geo
            || self.years_of_experience != other.years_of_experience
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub seats_by_role: BTreeMap<String, u32>,
    #[serde(default)]
    pub summary: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(skip)]
    pub embedding: Option<EmbeddingVector>,
}

impl Project {
    /// Roles with at least one open seat, in stable order.
    pub fn staffed_roles(&self) -> Vec<&str> {
        self.seats_by_role
            .iter()
            .filter(|(_, seats)| **seats > 0)
            .map(|(role, _)| role.as_str())
            .collect()
    }

    pub fn describing_fields_changed(&self, other: &Project) -> bool {
        self.description != other.description || self.seats_by_role != other.seats_by_role
    }
}

/// Assignment of a candidate to a project. No end date means open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub project_id: ProjectId,
    pub candidate_id: CandidateId,
    pub allocation_type: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl Allocation {
    pub fn is_open_ended(&self) -> bool {
        self.end_date.is_none()
    }
}
