//! Merge Engine — folds one normalized extraction into the session's
//! accumulated document.
//!
//! Invariants the orchestrator leans on:
//! - an empty incoming value never erases data already collected
//! - entity lists are matched by natural key, so re-sending the same entry
//!   refines it in place instead of duplicating it
//! - `merge(d, d) == d` and `merge(d, empty) == d`, which is what makes the
//!   "no new information" check a simple equality test

use crate::models::document::{
    CanonicalDocument, EducationEntry, ExperienceEntry, Identity, ProjectEntry, SkillGroups,
};

pub fn merge(current: &CanonicalDocument, incoming: &CanonicalDocument) -> CanonicalDocument {
    CanonicalDocument {
        identity: merge_identity(&current.identity, &incoming.identity),
        summary: merge_scalar(&current.summary, &incoming.summary),
        experience: merge_entries(
            &current.experience,
            &incoming.experience,
            experience_key_match,
            merge_experience,
        ),
        education: merge_entries(
            &current.education,
            &incoming.education,
            education_key_match,
            merge_education,
        ),
        skills: merge_skills(&current.skills, &incoming.skills),
        projects: merge_entries(
            &current.projects,
            &incoming.projects,
            project_key_match,
            merge_project,
        ),
        recognitions: merge_string_set(&current.recognitions, &incoming.recognitions),
    }
}

/// Incoming wins only when it actually says something.
fn merge_scalar(current: &str, incoming: &str) -> String {
    let incoming = incoming.trim();
    if incoming.is_empty() {
        current.to_string()
    } else {
        incoming.to_string()
    }
}

fn merge_identity(current: &Identity, incoming: &Identity) -> Identity {
    Identity {
        full_name: merge_scalar(&current.full_name, &incoming.full_name),
        title: merge_scalar(&current.title, &incoming.title),
        email: merge_scalar(&current.email, &incoming.email),
        phone: merge_scalar(&current.phone, &incoming.phone),
        location: merge_scalar(&current.location, &incoming.location),
        linkedin: merge_scalar(&current.linkedin, &incoming.linkedin),
        website: merge_scalar(&current.website, &incoming.website),
    }
}

/// Generic list-of-entity merge: existing order preserved, natural-key
/// matches shallow-merged in place, the rest appended.
fn merge_entries<T: Clone>(
    current: &[T],
    incoming: &[T],
    key_match: impl Fn(&T, &T) -> bool,
    merge_one: impl Fn(&T, &T) -> T,
) -> Vec<T> {
    let mut result: Vec<T> = current.to_vec();
    for new_entry in incoming {
        match result.iter_mut().find(|e| key_match(e, new_entry)) {
            Some(existing) => *existing = merge_one(existing, new_entry),
            None => result.push(new_entry.clone()),
        }
    }
    result
}

fn experience_key_match(a: &ExperienceEntry, b: &ExperienceEntry) -> bool {
    a.organization.eq_ignore_ascii_case(&b.organization) && a.role.eq_ignore_ascii_case(&b.role)
}

fn merge_experience(current: &ExperienceEntry, incoming: &ExperienceEntry) -> ExperienceEntry {
    ExperienceEntry {
        organization: merge_scalar(&current.organization, &incoming.organization),
        role: merge_scalar(&current.role, &incoming.role),
        start: merge_scalar(&current.start, &incoming.start),
        end: merge_scalar(&current.end, &incoming.end),
        location: merge_scalar(&current.location, &incoming.location),
        description: merge_scalar(&current.description, &incoming.description),
    }
}

fn education_key_match(a: &EducationEntry, b: &EducationEntry) -> bool {
    a.institution.eq_ignore_ascii_case(&b.institution)
        && a.credential.eq_ignore_ascii_case(&b.credential)
}

fn merge_education(current: &EducationEntry, incoming: &EducationEntry) -> EducationEntry {
    EducationEntry {
        institution: merge_scalar(&current.institution, &incoming.institution),
        credential: merge_scalar(&current.credential, &incoming.credential),
        field: merge_scalar(&current.field, &incoming.field),
        completed: merge_scalar(&current.completed, &incoming.completed),
        details: merge_scalar(&current.details, &incoming.details),
    }
}

fn project_key_match(a: &ProjectEntry, b: &ProjectEntry) -> bool {
    a.name.eq_ignore_ascii_case(&b.name)
}

fn merge_project(current: &ProjectEntry, incoming: &ProjectEntry) -> ProjectEntry {
    ProjectEntry {
        name: merge_scalar(&current.name, &incoming.name),
        description: merge_scalar(&current.description, &incoming.description),
        technologies: merge_string_set(&current.technologies, &incoming.technologies),
    }
}

fn merge_skills(current: &SkillGroups, incoming: &SkillGroups) -> SkillGroups {
    SkillGroups {
        core_competencies: merge_string_set(
            &current.core_competencies,
            &incoming.core_competencies,
        ),
        tools: merge_string_set(&current.tools, &incoming.tools),
        languages: merge_string_set(&current.languages, &incoming.languages),
        certifications: merge_string_set(&current.certifications, &incoming.certifications),
    }
}

/// Union keeping current order, then new items in their incoming order.
/// Dedup is case-insensitive; empties are filtered.
fn merge_string_set(current: &[String], incoming: &[String]) -> Vec<String> {
    let mut result: Vec<String> = current
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    for item in incoming {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if !result.iter().any(|r| r.eq_ignore_ascii_case(item)) {
            result.push(item.to_string());
        }
    }
    result
}
