//! Data Normalizer — folds whatever shape the model returned into the
//! canonical document schema.
//!
//! The model drifts: an organization arrives as `company`, `company_name`, or
//! `employer`; a description arrives as a string, a bullet list under half a
//! dozen key names, or not at all; a period arrives as one compound
//! "Jan 2020 – Present" string. Every known variation is listed in an explicit
//! alias table and mapped deterministically. Unknown fields are dropped,
//! never rejected, and normalizing already-canonical data is a no-op.

use serde_json::{Map, Value};

use crate::models::document::{
    CanonicalDocument, EducationEntry, ExperienceEntry, Identity, ProjectEntry, SkillGroups,
};

type AliasTable = &'static [(&'static str, &'static [&'static str])];

const TOP_LEVEL_ALIASES: AliasTable = &[
    ("identity", &["personal_info", "contact", "contact_info"]),
    ("summary", &["professional_summary", "profile"]),
    ("experience", &["work_experience", "employment", "work_history"]),
    ("education", &["education_history"]),
    ("skills", &["skill_groups"]),
    (
        "projects",
        &["key_projects_achievements", "key_projects", "achievements"],
    ),
    (
        "recognitions",
        &["awards_and_recognitions", "awards", "honors"],
    ),
];

const IDENTITY_ALIASES: AliasTable = &[
    ("full_name", &["name"]),
    ("title", &["job_title", "headline", "professional_title"]),
    ("email", &["email_address"]),
    ("phone", &["phone_number"]),
    ("location", &["city", "address"]),
    ("linkedin", &["linkedin_url"]),
    ("website", &["website_url", "portfolio"]),
];

const EXPERIENCE_ALIASES: AliasTable = &[
    ("organization", &["company", "company_name", "employer"]),
    ("role", &["title", "job_title", "position"]),
    ("start", &["start_date", "from"]),
    ("end", &["end_date", "to"]),
    ("location", &["city"]),
];

/// Bullet-list keys joined into the canonical `description`.
const BULLET_ALIASES: &[&str] = &[
    "description_bullets",
    "key_responsibilities",
    "responsibilities",
    "bullets",
    "highlights",
];

/// Compound employment-period keys split into `start`/`end`.
const PERIOD_ALIASES: &[&str] = &["dates_employed", "dates", "period", "duration"];

const EDUCATION_ALIASES: AliasTable = &[
    ("institution", &["school", "university", "college"]),
    ("credential", &["degree", "qualification"]),
    ("field", &["field_of_study", "major"]),
    (
        "completed",
        &["graduation_date", "end_date", "completion", "year"],
    ),
    ("details", &["description", "notes"]),
];

const PROJECT_ALIASES: AliasTable = &[
    ("name", &["project_name", "title"]),
    ("description", &["summary", "details"]),
    (
        "technologies",
        &["tech_stack", "key_areas_used", "tools_used"],
    ),
];

const SKILL_ALIASES: AliasTable = &[
    ("core_competencies", &["competencies", "skills", "core"]),
    ("tools", &["software_proficiency", "software", "technologies"]),
    ("languages", &["language_fluency", "spoken_languages"]),
    ("certifications", &["certs"]),
];

/// Converts an arbitrary structured value into the canonical document shape.
///
/// Returns `None` only when the input is not an object at all — the caller
/// treats that as "nothing extracted", never as an error. Fields that do not
/// match any canonical key or alias are silently dropped.
pub fn normalize(raw: &Value) -> Option<CanonicalDocument> {
    let mut root = raw.as_object()?.clone();
    apply_aliases(&mut root, TOP_LEVEL_ALIASES);

    let identity = root
        .get("identity")
        .and_then(Value::as_object)
        .map(normalize_identity)
        .unwrap_or_default();

    let summary = string_field(&root, "summary");

    let experience = entry_list(&root, "experience", normalize_experience_entry);
    let education = entry_list(&root, "education", normalize_education_entry);
    let projects = entry_list(&root, "projects", normalize_project_entry);

    let skills = root
        .get("skills")
        .and_then(Value::as_object)
        .map(normalize_skills)
        .unwrap_or_default();

    let recognitions = root
        .get("recognitions")
        .map(string_list)
        .unwrap_or_default();

    Some(CanonicalDocument {
        identity,
        summary,
        experience,
        education,
        skills,
        projects,
        recognitions,
    })
}

/// Moves the first present alias to its canonical key and strips the rest.
/// A value already under the canonical key always wins.
fn apply_aliases(obj: &mut Map<String, Value>, table: AliasTable) {
    for (canonical, aliases) in table {
        for alias in *aliases {
            let taken = obj.remove(*alias);
            if !obj.contains_key(*canonical) {
                if let Some(value) = taken {
                    obj.insert((*canonical).to_string(), value);
                }
            }
        }
    }
}

fn normalize_identity(obj: &Map<String, Value>) -> Identity {
    let mut obj = obj.clone();
    apply_aliases(&mut obj, IDENTITY_ALIASES);
    Identity {
        full_name: string_field(&obj, "full_name"),
        title: string_field(&obj, "title"),
        email: string_field(&obj, "email"),
        phone: string_field(&obj, "phone"),
        location: string_field(&obj, "location"),
        linkedin: string_field(&obj, "linkedin"),
        website: string_field(&obj, "website"),
    }
}

fn normalize_experience_entry(obj: &Map<String, Value>) -> ExperienceEntry {
    let mut obj = obj.clone();
    apply_aliases(&mut obj, EXPERIENCE_ALIASES);

    // Bullet lists under any alias are joined into a single description and
    // replace a scalar `description` when both are present; the bullets are
    // the richer form of the same field.
    let mut bullets = None;
    for alias in BULLET_ALIASES {
        if let Some(value) = obj.remove(*alias) {
            if bullets.is_none() {
                let joined = join_lines(&value);
                if !joined.is_empty() {
                    bullets = Some(joined);
                }
            }
        }
    }
    let description = bullets
        .unwrap_or_else(|| obj.get("description").map(join_lines).unwrap_or_default());

    let mut start = string_field(&obj, "start");
    let mut end = string_field(&obj, "end");

    // A compound "Jan 2020 – Present" period string fills whatever the
    // explicit start/end fields did not.
    for alias in PERIOD_ALIASES {
        if let Some(value) = obj.remove(*alias) {
            if start.is_empty() {
                if let Some((s, e)) = split_period(&trimmed(&value)) {
                    start = s;
                    if end.is_empty() {
                        end = e;
                    }
                }
            }
        }
    }

    ExperienceEntry {
        organization: string_field(&obj, "organization"),
        role: string_field(&obj, "role"),
        start,
        end,
        location: string_field(&obj, "location"),
        description,
    }
}

fn normalize_education_entry(obj: &Map<String, Value>) -> EducationEntry {
    let mut obj = obj.clone();
    apply_aliases(&mut obj, EDUCATION_ALIASES);
    EducationEntry {
        institution: string_field(&obj, "institution"),
        credential: string_field(&obj, "credential"),
        field: string_field(&obj, "field"),
        completed: string_field(&obj, "completed"),
        details: string_field(&obj, "details"),
    }
}

fn normalize_project_entry(obj: &Map<String, Value>) -> ProjectEntry {
    let mut obj = obj.clone();
    apply_aliases(&mut obj, PROJECT_ALIASES);
    ProjectEntry {
        name: string_field(&obj, "name"),
        description: obj.get("description").map(join_lines).unwrap_or_default(),
        technologies: obj.get("technologies").map(string_list).unwrap_or_default(),
    }
}

fn normalize_skills(obj: &Map<String, Value>) -> SkillGroups {
    let mut obj = obj.clone();
    apply_aliases(&mut obj, SKILL_ALIASES);
    SkillGroups {
        core_competencies: obj
            .get("core_competencies")
            .map(string_list)
            .unwrap_or_default(),
        tools: obj.get("tools").map(string_list).unwrap_or_default(),
        languages: obj.get("languages").map(string_list).unwrap_or_default(),
        certifications: obj
            .get("certifications")
            .map(string_list)
            .unwrap_or_default(),
    }
}

/// Splits "Jan 2020 – Present" on an em-dash, en-dash, spaced hyphen, or
/// " to " separator. A missing second segment defaults to "Present".
/// Bare hyphens are deliberately not split so "2020-01" survives intact.
fn split_period(period: &str) -> Option<(String, String)> {
    for sep in ["—", "–", " - ", " to "] {
        if let Some((start, end)) = period.split_once(sep) {
            let start = start.trim().to_string();
            if start.is_empty() {
                return None;
            }
            let end = end.trim();
            let end = if end.is_empty() { "Present" } else { end };
            return Some((start, end.to_string()));
        }
    }
    None
}

fn entry_list<T>(root: &Map<String, Value>, key: &str, f: impl Fn(&Map<String, Value>) -> T) -> Vec<T>
where
    T: PartialEq + Default,
{
    root.get(key)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_object)
                .map(f)
                .filter(|e| *e != T::default())
                .collect()
        })
        .unwrap_or_default()
}

fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key).map(trimmed).unwrap_or_default()
}

/// Strings pass through trimmed; numbers are rendered (graduation years
/// sometimes arrive as integers); everything else is dropped.
fn trimmed(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn join_lines(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(trimmed)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        other => trimmed(other),
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(trimmed)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_object_input_yields_none() {
        assert!(normalize(&json!("just a sentence")).is_none());
        assert!(normalize(&json!([1, 2, 3])).is_none());
        assert!(normalize(&Value::Null).is_none());
    }

    #[test]
    fn aliases_map_to_canonical_keys() {
        let raw = json!({
            "personal_info": { "name": "Jane Doe", "email_address": "jane@example.com" },
            "work_experience": [
                { "company_name": "Acme", "job_title": "Engineer" }
            ],
            "awards_and_recognitions": ["Employee of the month"]
        });

        let doc = normalize(&raw).unwrap();
        assert_eq!(doc.identity.full_name, "Jane Doe");
        assert_eq!(doc.identity.email, "jane@example.com");
        assert_eq!(doc.experience[0].organization, "Acme");
        assert_eq!(doc.experience[0].role, "Engineer");
        assert_eq!(doc.recognitions, vec!["Employee of the month"]);
    }

    #[test]
    fn canonical_key_wins_over_alias() {
        let raw = json!({
            "experience": [
                { "organization": "Canonical Corp", "company": "Alias Inc" }
            ]
        });

        let doc = normalize(&raw).unwrap();
        assert_eq!(doc.experience[0].organization, "Canonical Corp");
    }

    #[test]
    fn bullet_lists_join_into_description() {
        let raw = json!({
            "experience": [{
                "company": "Acme",
                "key_responsibilities": ["Built the API", "Led two interns"]
            }]
        });

        let doc = normalize(&raw).unwrap();
        assert_eq!(doc.experience[0].description, "Built the API\nLed two interns");
    }

    #[test]
    fn bullet_lists_replace_an_existing_description() {
        let raw = json!({
            "experience": [{
                "company": "Acme",
                "description": "Old one-liner",
                "description_bullets": ["Led the rewrite", "Mentored interns"]
            }]
        });

        let doc = normalize(&raw).unwrap();
        assert_eq!(
            doc.experience[0].description,
            "Led the rewrite\nMentored interns"
        );
    }

    #[test]
    fn empty_bullet_list_keeps_the_scalar_description() {
        let raw = json!({
            "experience": [{
                "company": "Acme",
                "description": "Kept as-is",
                "highlights": []
            }]
        });

        let doc = normalize(&raw).unwrap();
        assert_eq!(doc.experience[0].description, "Kept as-is");
    }

    #[test]
    fn description_as_array_joins_too() {
        let raw = json!({
            "experience": [{ "company": "Acme", "description": ["One", "Two"] }]
        });

        let doc = normalize(&raw).unwrap();
        assert_eq!(doc.experience[0].description, "One\nTwo");
    }

    #[test]
    fn compound_period_splits_on_dash() {
        let raw = json!({
            "experience": [{ "company": "Acme", "dates_employed": "Jan 2020 – Mar 2022" }]
        });

        let doc = normalize(&raw).unwrap();
        assert_eq!(doc.experience[0].start, "Jan 2020");
        assert_eq!(doc.experience[0].end, "Mar 2022");
    }

    #[test]
    fn open_ended_period_defaults_to_present() {
        let raw = json!({
            "experience": [{ "company": "Acme", "period": "Jan 2020 –" }]
        });

        let doc = normalize(&raw).unwrap();
        assert_eq!(doc.experience[0].start, "Jan 2020");
        assert_eq!(doc.experience[0].end, "Present");
    }

    #[test]
    fn bare_hyphen_dates_are_not_split() {
        // "2020-01" is a date, not a range.
        assert_eq!(split_period("2020-01"), None);
        assert_eq!(
            split_period("2020-01 - 2021-06"),
            Some(("2020-01".to_string(), "2021-06".to_string()))
        );
        assert_eq!(
            split_period("2019 to 2021"),
            Some(("2019".to_string(), "2021".to_string()))
        );
    }

    #[test]
    fn unknown_fields_are_dropped_silently() {
        let raw = json!({
            "summary": "An engineer.",
            "favorite_color": "teal",
            "experience": [{ "company": "Acme", "mood": "great" }]
        });

        let doc = normalize(&raw).unwrap();
        assert_eq!(doc.summary, "An engineer.");
        assert_eq!(doc.experience[0].organization, "Acme");
    }

    #[test]
    fn skill_groups_map_known_aliases() {
        let raw = json!({
            "skills": {
                "software_proficiency": ["Rust", "Postgres"],
                "language_fluency": ["English"],
                "core_competencies": ["Systems design"]
            }
        });

        let doc = normalize(&raw).unwrap();
        assert_eq!(doc.skills.tools, vec!["Rust", "Postgres"]);
        assert_eq!(doc.skills.languages, vec!["English"]);
        assert_eq!(doc.skills.core_competencies, vec!["Systems design"]);
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = json!({
            "personal_info": { "name": " Jane Doe " },
            "experience": [{
                "company": "Acme",
                "job_title": "Engineer",
                "description_bullets": ["Did a thing", "Did another"],
                "dates_employed": "2020 – Present"
            }],
            "skills": { "software_proficiency": ["Rust"] }
        });

        let once = normalize(&raw).unwrap();
        let twice = normalize(&serde_json::to_value(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_entries_are_filtered() {
        let raw = json!({ "experience": [{}, { "company": "Acme" }] });
        let doc = normalize(&raw).unwrap();
        assert_eq!(doc.experience.len(), 1);
    }
}
