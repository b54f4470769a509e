// Conversational document-builder prompt templates.
// All prompts for the chat module are defined here.

use crate::chat::progress::{missing_sections, progress};
use crate::models::document::{CanonicalDocument, DocType};

/// The implied question behind a session's opening message, also the fallback
/// when a history has no assistant turn yet.
pub const OPENING_QUESTION: &str =
    "Please share some initial details so we can start building your document.";

const EXTRACTION_PROMPT: &str = r#"You are a CV data processing expert.
Your task is to update a document provided in JSON format based on a user's response to a specific question.
Analyze the user's response and integrate the new information into the correct fields of the JSON structure.

RULES:
1. ONLY return the complete, updated JSON object.
2. Do NOT return any explanatory text, markdown fences, or anything other than the raw JSON.
3. If the user's response is unclear or doesn't answer the question, return the original JSON unchanged.
4. Keep the top-level sections: identity, summary, experience, education, skills, projects, recognitions.
5. Each experience entry should follow this structure:
   {
     "organization": "Organization Name",
     "role": "Job Title",
     "start": "YYYY-MM",
     "end": "YYYY-MM" or "Present",
     "location": "City, Country",
     "description": "A summary of responsibilities and achievements."
   }
   The description may be a single string or an array of bullet strings.

Current document JSON:
{current_document}

Question asked to the user:
"{last_question}"

User's response:
"{user_response}"

Return the updated and complete JSON object now."#;

const NEXT_QUESTION_PROMPT: &str = r#"You are a helpful and professional CV writing assistant.
Your goal is to help a user build their {doc_type} by asking them questions one by one.

Current document state:
{current_document}

Your instruction:
{instruction}

Generate and return ONLY the single question you should ask the user next. Do not add any preamble."#;

const COMPLETE_INSTRUCTION: &str = "The user's {doc_type} is nearly complete. Politely ask if \
     they have any final additions or if they are ready to finalize the document.";

const NEXT_TOPIC_INSTRUCTION: &str = "The next topic to ask about is \"{section}\". Your task is \
     to formulate a friendly, conversational question based on this hint: \"{hint}\". Acknowledge \
     the user's progress and ask only ONE question.";

pub fn extraction_prompt(
    current: &CanonicalDocument,
    last_question: &str,
    user_response: &str,
) -> String {
    EXTRACTION_PROMPT
        .replace("{current_document}", &document_json(current))
        .replace("{last_question}", last_question)
        .replace("{user_response}", user_response)
}

pub fn next_question_prompt(current: &CanonicalDocument, doc_type: DocType) -> String {
    let instruction = if progress(current) >= 100 {
        COMPLETE_INSTRUCTION.replace("{doc_type}", doc_type.as_str())
    } else {
        // First missing section in the fixed order is always the next topic.
        let next = missing_sections(current)[0];
        NEXT_TOPIC_INSTRUCTION
            .replace("{section}", next.as_str())
            .replace("{hint}", next.follow_up_hint())
    };

    NEXT_QUESTION_PROMPT
        .replace("{doc_type}", doc_type.as_str())
        .replace("{current_document}", &document_json(current))
        .replace("{instruction}", &instruction)
}

/// Built locally, no model call: shown when a turn produced no new
/// information, instead of advancing to a new topic.
pub fn rephrase_request(last_question: &str) -> String {
    let topic: String = last_question.to_lowercase().chars().take(50).collect();
    format!(
        "I'm sorry, I had trouble understanding your response about \"{topic}...\". \
         Could you please try rephrasing that for me?"
    )
}

fn document_json(doc: &CanonicalDocument) -> String {
    serde_json::to_string_pretty(doc).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_question_targets_first_missing_section() {
        let mut doc = CanonicalDocument::default();
        doc.identity.full_name = "Jane Doe".into();

        let prompt = next_question_prompt(&doc, DocType::Cv);
        assert!(prompt.contains("\"summary\""));
        assert!(prompt.contains("ONE question"));
    }

    #[test]
    fn complete_document_asks_for_final_additions() {
        let mut doc = CanonicalDocument::default();
        doc.identity.full_name = "Jane".into();
        doc.summary = "Engineer.".into();
        doc.experience.push(Default::default());
        doc.education.push(Default::default());
        doc.skills.tools.push("Rust".into());
        doc.projects.push(Default::default());
        doc.recognitions.push("Award".into());

        let prompt = next_question_prompt(&doc, DocType::Cv);
        assert!(prompt.contains("finalize"));
    }

    #[test]
    fn rephrase_quotes_a_bounded_slice_of_the_last_question() {
        let long_question = "Could you tell me about your most recent position, including \
                             the organization, your role, and the dates you worked there?";
        let message = rephrase_request(long_question);
        assert!(message.contains("could you tell me about your most recent position"));
        assert!(message.contains("rephrasing"));
    }
}
