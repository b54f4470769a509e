//! Progress Tracker — which top-level sections are collected, how far along
//! the document is, and which section to ask about next.
//!
//! The section list is fixed and ordered; the first missing section in this
//! order is always the next topic. 7 sections, so each one is worth ~14%.

use serde::{Deserialize, Serialize};

use crate::models::document::CanonicalDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Identity,
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Recognitions,
}

/// Canonical section order. Drives both progress percentage and the
/// "next missing section" question targeting.
pub const SECTIONS: [Section; 7] = [
    Section::Identity,
    Section::Summary,
    Section::Experience,
    Section::Education,
    Section::Skills,
    Section::Projects,
    Section::Recognitions,
];

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Identity => "identity",
            Section::Summary => "summary",
            Section::Experience => "experience",
            Section::Education => "education",
            Section::Skills => "skills",
            Section::Projects => "projects",
            Section::Recognitions => "recognitions",
        }
    }

    /// Hint handed to the question-generation prompt when this section is the
    /// next topic.
    pub fn follow_up_hint(&self) -> &'static str {
        match self {
            Section::Identity => {
                "Ask for their full name, professional title, and contact \
                 information (email, phone, location)."
            }
            Section::Summary => "Ask for a brief professional summary (2-3 sentences).",
            Section::Experience => {
                "Ask about their most recent work experience, including role, \
                 organization, dates, and key responsibilities."
            }
            Section::Education => {
                "Ask about their educational background, like credential, \
                 institution, and completion date."
            }
            Section::Skills => "Ask what skills, software, or languages they are proficient in.",
            Section::Projects => {
                "Ask about any significant projects or achievements they want to highlight."
            }
            Section::Recognitions => {
                "Ask if they have received any professional awards or recognitions."
            }
        }
    }

    fn is_collected(&self, doc: &CanonicalDocument) -> bool {
        match self {
            Section::Identity => !doc.identity.is_empty(),
            Section::Summary => !doc.summary.is_empty(),
            Section::Experience => !doc.experience.is_empty(),
            Section::Education => !doc.education.is_empty(),
            Section::Skills => !doc.skills.is_empty(),
            Section::Projects => !doc.projects.is_empty(),
            Section::Recognitions => !doc.recognitions.is_empty(),
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn collected_sections(doc: &CanonicalDocument) -> Vec<Section> {
    SECTIONS
        .iter()
        .copied()
        .filter(|s| s.is_collected(doc))
        .collect()
}

pub fn missing_sections(doc: &CanonicalDocument) -> Vec<Section> {
    SECTIONS
        .iter()
        .copied()
        .filter(|s| !s.is_collected(doc))
        .collect()
}

/// Completion percentage, 0–100, rounded to the nearest integer.
pub fn progress(doc: &CanonicalDocument) -> u8 {
    let collected = collected_sections(doc).len();
    ((collected as f64 / SECTIONS.len() as f64) * 100.0).round() as u8
}

pub fn is_complete(doc: &CanonicalDocument) -> bool {
    progress(doc) >= 100
}
