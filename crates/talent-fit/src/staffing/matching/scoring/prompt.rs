use std::fmt::Write as _;

use super::rules::ScoringRules;
use crate::staffing::matching::store::SimilarityMatch;

pub const SCORING_SYSTEM_PROMPT: &str = "You are an expert technical recruiter scoring how well \
staffing candidates fit a project. Respond with a JSON array only, without commentary or code fences.";

/// Renders the scoring prompt for one project and its retrieved candidate pool.
pub fn build_prompt(project_summary: &str, candidates: &[SimilarityMatch], rules: &ScoringRules) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Project requirements:\n{}\n", project_summary.trim());
    let _ = writeln!(prompt, "Candidates:");

    for (ordinal, entry) in candidates.iter().enumerate() {
        let candidate = &entry.candidate;
        let skills = if candidate.skills.is_empty() {
            "None specified".to_string()
        } else {
            candidate.skills.join(", ")
        };
        let status = entry
            .status
            .map(|status| status.label())
            .unwrap_or("unset");

        let _ = writeln!(prompt, "{}. {}", ordinal + 1, candidate.display_name());
        let _ = writeln!(prompt, "   - ID: {}", candidate.id);
        let _ = writeln!(prompt, "   - Skills: {skills}");
        let _ = writeln!(prompt, "   - Geography: {}", candidate.geo);
        let _ = writeln!(prompt, "   - Experience: {} years", candidate.years_of_experience);
        let _ = writeln!(prompt, "   - Industry: {}", candidate.industry);
        let _ = writeln!(prompt, "   - Open to extra work: {}", candidate.open_to_extra_work);
        let _ = writeln!(prompt, "   - Status: {status}");
        let _ = writeln!(prompt, "   - Similarity: {:.1}%", entry.similarity * 100.0);
    }

    let _ = writeln!(prompt, "\nScoring rules (weights out of {}):", rules.total());
    let _ = writeln!(prompt, "- Skills match: {}", rules.skills_weight);
    let _ = writeln!(prompt, "- Geography match: {}", rules.geography_weight);
    let _ = writeln!(prompt, "- Experience match: {}", rules.experience_weight);
    let _ = writeln!(prompt, "- Bench status: {}", rules.status_weight);

    prompt.push_str(
        "\nPreference rules:
- If the project does not specify a geography, lightly favor India-based candidates over others at a comparable skill level (add 5-10 points).
- Favor candidates with status onBench even when their skill match is somewhat weaker (add 5-10 points), and say explicitly in the reason that the candidate is on the bench when this rule is applied.

Return ONLY a JSON array, one element per candidate, in this exact shape:
[{\"candidate_id\": <ID as integer>, \"score\": <integer 0-100>, \"reason\": \"<one or two sentences>\"}]",
    );

    prompt
}
