//! Prompt Composer
//!
//! Renders the assistant instructions for a scenario. The instructions define
//! the two roles the model switches between: the persona being interviewed,
//! and the audit partner who delivers the debrief once the user types the
//! trigger phrase.

use crate::scenario::Scenario;

/// Phrase that moves the assistant from the persona role to the debrief role.
pub const DEBRIEF_TRIGGER: &str = "end walkthrough";

/// File name of the instructions template inside a prompts directory.
pub const TEMPLATE_FILE_NAME: &str = "walkthrough_instructions.md";

const DEFAULT_TEMPLATE: &str = include_str!("../prompts/walkthrough_instructions.md");

/// Renders instruction templates with `{placeholder}` substitution.
///
/// Recognized placeholders: `{persona_name}`, `{persona_role}`,
/// `{process_document_id}` and `{standards_document_ids}`.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    template: String,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl PromptComposer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Produces the assistant instructions for one scenario.
    ///
    /// The template is scanned once, left to right. Substituted values are
    /// copied verbatim and never rescanned, and unknown `{...}` tokens are
    /// left as they are.
    pub fn build_instructions(&self, scenario: &Scenario) -> String {
        let standards = scenario.standards_document_ids.join(", ");
        let lookup = |key: &str| match key {
            "persona_name" => Some(scenario.persona_name.as_str()),
            "persona_role" => Some(scenario.persona_role.as_str()),
            "process_document_id" => Some(scenario.process_document_id.as_str()),
            "standards_document_ids" => Some(standards.as_str()),
            _ => None,
        };

        let mut rendered = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let placeholder = after
                .find('}')
                .and_then(|close| lookup(&after[..close]).map(|value| (close, value)));
            match placeholder {
                Some((close, value)) => {
                    rendered.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    rendered.push('{');
                    rest = after;
                }
            }
        }
        rendered.push_str(rest);
        rendered
    }
}

/// Renders the built-in template for `scenario`.
pub fn build_instructions(scenario: &Scenario) -> String {
    PromptComposer::default().build_instructions(scenario)
}
