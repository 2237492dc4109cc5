use std::collections::BTreeMap;

use crate::staffing::domain::{Candidate, Project};

/// Collapses runs of whitespace (including newlines and tabs) to single spaces and trims.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fields of a candidate that feed its embedding text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEmbeddingInput<'a> {
    pub skills: &'a [String],
    pub profile_type: &'a str,
    pub industry: &'a str,
    pub geo: &'a str,
    pub years_of_experience: u32,
}

impl<'a> From<&'a Candidate> for CandidateEmbeddingInput<'a> {
    fn from(candidate: &'a Candidate) -> Self {
        Self {
            skills: &candidate.skills,
            profile_type: &candidate.profile_type,
            industry: &candidate.industry,
            geo: &candidate.geo,
            years_of_experience: candidate.years_of_experience,
        }
    }
}

impl CandidateEmbeddingInput<'_> {
    /// `Skills: a, b. Role: X. Industry: Y. Location: Z. Experience: N years`, skipping empty parts.
    pub fn to_text(&self) -> String {
        let mut parts = Vec::new();
        let skills: Vec<&str> = self
            .skills
            .iter()
            .map(|skill| skill.trim())
            .filter(|skill| !skill.is_empty())
            .collect();
        if !skills.is_empty() {
            parts.push(format!("Skills: {}", skills.join(", ")));
        }
        push_labeled(&mut parts, "Role", self.profile_type);
        push_labeled(&mut parts, "Industry", self.industry);
        push_labeled(&mut parts, "Location", self.geo);
        if self.years_of_experience > 0 {
            parts.push(format!("Experience: {} years", self.years_of_experience));
        }
        normalize_text(&parts.join(". "))
    }
}

/// Fields of a project that feed its embedding text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEmbeddingInput<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub seats_by_role: &'a BTreeMap<String, u32>,
    pub summary: &'a str,
}

impl<'a> From<&'a Project> for ProjectEmbeddingInput<'a> {
    fn from(project: &'a Project) -> Self {
        Self {
            name: &project.name,
            description: &project.description,
            seats_by_role: &project.seats_by_role,
            summary: &project.summary,
        }
    }
}

impl ProjectEmbeddingInput<'_> {
    pub fn to_text(&self) -> String {
        let mut parts = Vec::new();
        push_labeled(&mut parts, "Project", self.name);
        push_labeled(&mut parts, "Description", self.description);

        let requirements: Vec<String> = self
            .seats_by_role
            .iter()
            .filter(|(_, seats)| **seats > 0)
            .map(|(role, seats)| format!("{role}: {seats}"))
            .collect();
        if !requirements.is_empty() {
            parts.push(format!("Requirements: {}", requirements.join(", ")));
        }
        push_labeled(&mut parts, "Project Requirements", self.summary);
        normalize_text(&parts.join(". "))
    }
}

fn push_labeled(parts: &mut Vec<String>, label: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        parts.push(format!("{label}: {value}"));
    }
}
