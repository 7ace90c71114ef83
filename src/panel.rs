//! Specialist opinion panels.
//!
//! The motivating use of the engine: a linear chain of specialist nodes, each
//! holding a persona directive and a shared completion service, appending one
//! opinion to a shared transcript per run while counting service invocations.

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

use crate::clients::CompletionService;
use crate::graph::{CompileError, GraphBuilder, GraphError, Schedule};
use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError};
use crate::reducers::MergePolicy;
use crate::state::{State, StateError, StatePartial, StateSchema};

/// Accumulating transcript field: ordered [`Message`] records.
pub const TRANSCRIPT: &str = "transcript";
/// Scalar invocation counter, merged with [`MergePolicy::Sum`].
pub const CALLS: &str = "calls";

/// Errors raised while assembling or seeding a panel.
#[derive(Debug, Error, Diagnostic)]
pub enum PanelError {
    #[error("a panel requires at least one specialist")]
    #[diagnostic(code(relaygraph::panel::empty))]
    Empty,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    #[diagnostic(code(relaygraph::panel::serde))]
    Serde(#[from] serde_json::Error),
}

/// The schema every panel runs against: an accumulating transcript plus a
/// summed invocation counter.
#[must_use]
pub fn panel_schema() -> StateSchema {
    StateSchema::builder()
        .accumulating(TRANSCRIPT)
        .scalar(CALLS, MergePolicy::Sum)
        .expect("sum is valid for scalar fields")
        .build()
}

/// Decodes the transcript field of a state into messages.
pub fn transcript(state: &State) -> Result<Vec<Message>, NodeError> {
    match state.get(TRANSCRIPT) {
        Some(value) => Ok(serde_json::from_value(value.clone())?),
        None => Err(NodeError::MissingInput { what: TRANSCRIPT }),
    }
}

/// A specialist that contributes one opinion per run.
///
/// Each invocation sends its persona directive followed by the prior
/// transcript to the completion service and appends the single response
/// message, incrementing the `calls` counter by one. Tool-call requests in
/// the response are logged, not executed: an un-executed request is a valid
/// end state, and a node wanting to honor one must call the capability
/// itself and feed the result back via a follow-up completion.
pub struct SpecialistNode {
    name: String,
    persona: String,
    service: Arc<dyn CompletionService>,
}

impl SpecialistNode {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        persona: impl Into<String>,
        service: Arc<dyn CompletionService>,
    ) -> Self {
        Self {
            name: name.into(),
            persona: persona.into(),
            service,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Node for SpecialistNode {
    async fn run(&self, state: &State, ctx: NodeContext) -> Result<StatePartial, NodeError> {
        let prior = transcript(state)?;
        let mut messages = Vec::with_capacity(prior.len() + 1);
        messages.push(Message::system(&self.persona));
        messages.extend(prior);

        let completion =
            self.service
                .complete(&messages)
                .await
                .map_err(|error| NodeError::Provider {
                    provider: "completion",
                    message: error.to_string(),
                })?;

        if completion.has_tool_calls() {
            tracing::warn!(
                node = %ctx.node_name,
                requested = completion.tool_calls.len(),
                "completion requested tool calls; appending response without executing them"
            );
        }

        Ok(StatePartial::new()
            .with_field(TRANSCRIPT, serde_json::to_value(vec![completion.message])?)
            .with_field(CALLS, json!(1)))
    }

    fn writes(&self) -> Vec<String> {
        vec![TRANSCRIPT.to_string(), CALLS.to_string()]
    }
}

/// Wires specialists into a linear chain, in the order given, and compiles
/// the result.
pub fn panel_chain(specialists: Vec<SpecialistNode>) -> Result<Schedule, PanelError> {
    if specialists.is_empty() {
        return Err(PanelError::Empty);
    }

    let names: Vec<String> = specialists.iter().map(|s| s.name.clone()).collect();
    let mut builder = GraphBuilder::new(panel_schema());
    for specialist in specialists {
        let name = specialist.name.clone();
        builder = builder.add_node(name, specialist)?;
    }
    for pair in names.windows(2) {
        builder = builder.add_edge(pair[0].clone(), pair[1].clone())?;
    }
    Ok(builder.compile()?)
}

/// Seeds a fresh state with the caller's question as the opening transcript
/// record.
pub fn consultation_state(schedule: &Schedule, question: &str) -> Result<State, PanelError> {
    let opening = serde_json::to_value(vec![Message::user(question)])?;
    Ok(schedule.initial_state().with_value(TRANSCRIPT, opening)?)
}
