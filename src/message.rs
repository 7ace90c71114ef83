use serde::{Deserialize, Serialize};

/// A role-tagged record in a shared transcript.
///
/// Messages are what specialist nodes append to the accumulating transcript
/// field and what the completion service consumes and produces. The role is a
/// free-form string; use the constants on [`Message`] for the standard ones.
///
/// # Examples
///
/// ```
/// use relaygraph::message::Message;
///
/// let directive = Message::system("You are a radiology specialist.");
/// let question = Message::user("Please review this CT finding.");
/// assert!(question.has_role(Message::USER));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// Sender role, e.g. "user", "assistant", "system", "tool".
    pub role: String,
    /// Text content of the record.
    pub content: String,
}

impl Message {
    /// User input role.
    pub const USER: &'static str = "user";
    /// Completion-service response role.
    pub const ASSISTANT: &'static str = "assistant";
    /// Persona or system directive role.
    pub const SYSTEM: &'static str = "system";
    /// Capability result fed back into a completion call.
    pub const TOOL: &'static str = "tool";

    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    /// Creates a tool-result message, used when a node honors a tool-call
    /// request and feeds the capability output back to the completion service.
    #[must_use]
    pub fn tool(content: &str) -> Self {
        Self::new(Self::TOOL, content)
    }

    /// Returns true if this message has the specified role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}
