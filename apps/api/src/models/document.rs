use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// The single normalized schema every extracted fragment is folded into.
///
/// Every field carries `#[serde(default)]` so a partial JSON object — which is
/// what the model usually returns — always deserializes. Empty strings and
/// empty lists mean "not collected yet"; `PartialEq` is what the orchestrator
/// uses to detect a turn that produced no new information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalDocument {
    pub identity: Identity,
    pub summary: String,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub skills: SkillGroups,
    pub projects: Vec<ProjectEntry>,
    pub recognitions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub full_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
    pub website: String,
}

impl Identity {
    pub fn is_empty(&self) -> bool {
        [
            &self.full_name,
            &self.title,
            &self.email,
            &self.phone,
            &self.location,
            &self.linkedin,
            &self.website,
        ]
        .iter()
        .all(|f| f.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub organization: String,
    pub role: String,
    pub start: String,
    pub end: String,
    pub location: String,
    /// Single block of text; bullet lists are joined with newlines by the
    /// normalizer before this struct ever exists.
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub institution: String,
    pub credential: String,
    pub field: String,
    pub completed: String,
    pub details: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillGroups {
    pub core_competencies: Vec<String>,
    pub tools: Vec<String>,
    pub languages: Vec<String>,
    pub certifications: Vec<String>,
}

impl SkillGroups {
    pub fn is_empty(&self) -> bool {
        self.core_competencies.is_empty()
            && self.tools.is_empty()
            && self.languages.is_empty()
            && self.certifications.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectEntry {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
}

/// Which kind of document a session is building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Cv,
    CoverLetter,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Cv => "cv",
            DocType::CoverLetter => "cover_letter",
        }
    }
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalized document as persisted by the document store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredDocument {
    pub id: Uuid,
    pub user_id: Uuid,
    pub doc_type: String,
    pub title: String,
    pub content: Value,
    pub created_at: DateTime<Utc>,
}

/// Input to `DocumentStore::create`. Content is the session's canonical
/// document serialized as-is — finalize never re-runs extraction.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub user_id: Uuid,
    pub doc_type: DocType,
    pub title: String,
    pub content: CanonicalDocument,
}
