//! NIT section of the system prompt.

use std::collections::HashMap;

use nit_primitives::NitId;

use crate::template::{PromptTemplate, TemplateError, TemplateResult};

/// Instructions teaching the model the script syntax.
pub const USAGE_TEMPLATE: &str = "\
## NIT Tools
Call tools by writing a script inside a tagged block:

{{open_tag}}
$result = tool_name(arg=\"value\", count=3)
next_tool(input=$result)
{{close_tag}}

Arguments are named. Values are quoted strings, numbers, or $variables bound earlier in the same block.

{{tools}}
{{handshake}}{{lightweight}}";

/// Placeholders a usage template must contain.
const REQUIRED_PLACEHOLDERS: [&str; 3] = ["open_tag", "close_tag", "tools"];

/// Assembles the NIT section from a tool description and turn state.
#[derive(Debug, Clone)]
pub struct NitPromptBuilder {
    template: PromptTemplate,
    tools: String,
    nit_id: Option<NitId>,
    handshake: String,
    lightweight: Option<Vec<String>>,
}

impl Default for NitPromptBuilder {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl NitPromptBuilder {
    /// Starts from a rendered tool catalog.
    #[must_use]
    pub fn new(tools_description: impl Into<String>) -> Self {
        Self {
            template: PromptTemplate::new(USAGE_TEMPLATE),
            tools: tools_description.into(),
            nit_id: None,
            handshake: String::new(),
            lightweight: None,
        }
    }

    /// Replaces [`USAGE_TEMPLATE`]. The template must reference
    /// `{{open_tag}}`, `{{close_tag}}` and `{{tools}}`; its own variables
    /// and required variables are honoured at render time.
    #[must_use]
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Uses the turn's tag in the syntax example and appends the handshake
    /// instructions.
    #[must_use]
    pub fn with_handshake(mut self, nit_id: NitId, instructions: impl Into<String>) -> Self {
        self.nit_id = Some(nit_id);
        self.handshake = instructions.into();
        self
    }

    /// Appends the lightweight-mode notice naming the plugins still offered.
    #[must_use]
    pub fn with_lightweight_notice<I, S>(mut self, allowlist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lightweight = Some(allowlist.into_iter().map(Into::into).collect());
        self
    }

    /// Renders the section.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingPlaceholder`] when the template omits
    /// one of the turn placeholders, and propagates render failures.
    pub fn build(self) -> TemplateResult<String> {
        let placeholders = self.template.placeholders();
        if let Some(missing) = REQUIRED_PLACEHOLDERS
            .iter()
            .find(|name| !placeholders.contains(*name))
        {
            return Err(TemplateError::MissingPlaceholder {
                name: (*missing).to_owned(),
            });
        }

        let (open_tag, close_tag) = match &self.nit_id {
            Some(id) => (id.open_tag(), id.close_tag()),
            None => ("<nit>".to_owned(), "</nit>".to_owned()),
        };
        let lightweight = self.lightweight.map_or_else(String::new, |allowed| {
            format!(
                "\n[Lightweight chat mode is on. Only {} remain available. \
                 Skip extended reasoning and write NIT scripts directly when a tool is needed.]\n",
                allowed.join(", ")
            )
        });

        let values = HashMap::from([
            ("open_tag".to_owned(), open_tag),
            ("close_tag".to_owned(), close_tag),
            ("tools".to_owned(), self.tools),
            ("handshake".to_owned(), self.handshake),
            ("lightweight".to_owned(), lightweight),
        ]);
        self.template.render_with(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_example_without_handshake() {
        let prompt = NitPromptBuilder::new("### Notes").build().unwrap();
        assert!(prompt.contains("<nit>\n$result"));
        assert!(prompt.contains("### Notes"));
        assert!(!prompt.contains("Lightweight"));
    }

    #[test]
    fn handshake_and_lightweight_are_appended() {
        let id = NitId::new("beef").unwrap();
        let prompt = NitPromptBuilder::new("")
            .with_handshake(id, "[NIT SECURITY PROTOCOL]")
            .with_lightweight_notice(["MemoryOps"])
            .build()
            .unwrap();

        assert!(prompt.contains("<nit-BEEF>\n$result"));
        assert!(prompt.contains("</nit-BEEF>"));
        assert!(prompt.contains("[NIT SECURITY PROTOCOL]"));
        assert!(prompt.contains("Only MemoryOps remain available"));
    }

    #[test]
    fn custom_template_keeps_its_own_variables() {
        let template = PromptTemplate::new("{{persona}} uses {{open_tag}}{{close_tag}}: {{tools}}")
            .with_required_variable("persona");
        let err = NitPromptBuilder::new("search")
            .with_template(template.clone())
            .build()
            .expect_err("persona is unset");
        assert_eq!(
            err,
            TemplateError::MissingVariable {
                name: "persona".into()
            }
        );

        let prompt = NitPromptBuilder::new("search")
            .with_template(template.with_variable("persona", "Pero"))
            .with_handshake(NitId::new("a9b2").unwrap(), "")
            .build()
            .unwrap();
        assert_eq!(prompt, "Pero uses <nit-A9B2></nit-A9B2>: search");
    }

    #[test]
    fn template_without_tag_placeholders_is_rejected() {
        let err = NitPromptBuilder::new("search")
            .with_template(PromptTemplate::new("{{tools}} in {{open_tag}}"))
            .build()
            .expect_err("close tag missing");
        assert_eq!(
            err,
            TemplateError::MissingPlaceholder {
                name: "close_tag".into()
            }
        );
    }
}
