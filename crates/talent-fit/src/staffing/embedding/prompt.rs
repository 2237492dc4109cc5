use std::collections::BTreeMap;

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert technical recruiter and project analyst. \
Analyze project descriptions and extract structured technical requirements, skills, and role \
specifications for talent matching. Focus on specific technical skills and experience levels, \
normalize geographic information to countries or regions, and filter out generic soft skills.";

/// User prompt for the project summary. Roles render as `<count> <Role>` in role order.
pub fn summary_prompt(description: &str, seats_by_role: &BTreeMap<String, u32>) -> String {
    let roles = seats_by_role
        .iter()
        .map(|(role, seats)| format!("{seats} {}", title_case(role)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are given a project description and role requirements.
1. Extract key skills grouped strictly by the role types provided. Do not invent new role categories.
2. Keep only specific technical or management skills (languages, frameworks, tools, methodologies). \
Include cloud infrastructure inferred from the description; if none is given use aws as the default. \
Consider devops skills as well.
3. Exclude generic soft skills such as communication, leadership, teamwork, adaptability, fast learner.
4. For each role, keep 5-7 skills at most and remove duplicates across roles.
5. Identify years of experience, geo, and industry if mentioned.
   - If geo is given as a timezone, map it to the most likely country or region \
(\"MT timezone\" -> \"United States\", \"CET timezone\" -> \"Europe\", \"IST\" -> \"India\"). \
Only when no geo information is found, default to India.
   - Infer industry from the description; if it is unclear, output \"Unspecified\".
   - If experience is not mentioned, infer it from industry standards; if that is not possible, output \"Unspecified\".
6. Break broad stacks into concrete technologies (a .NET stack means C#, SQL Server, REST API, .NET Core).
7. Answer in the format:
\"Project requires: Skills: <skills>, Experience: <experience>, Location/Geo: <geo>, Industry: <industry>. Roles: <roles>.\"
Description: {description}
Roles: {roles}"
    )
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
