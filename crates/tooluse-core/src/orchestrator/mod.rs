//! Two-pass tool-augmented query orchestration
//!
//! ```text
//!   Idle ──▶ AwaitingFirstResponse ──┬──▶ NoToolCalls ───────────────────────────────▶ Done
//!                                    └──▶ HasToolCalls ──▶ ExecutingTools
//!                                                              └──▶ AwaitingFinalResponse ──▶ Done
//! ```
//!
//! The first model call offers every discovered tool with tool choice
//! `auto`. Requested calls are executed against the session (concurrently
//! unless configured otherwise) and their results appended in request
//! order. The second call forbids tools, so a query never takes more than
//! two model calls.

mod context;
mod error;
mod lifecycle;

pub use context::{OrchestratorContext, QueryState};
pub use error::{OrchestratorError, OrchestratorResult, Pass};
pub use lifecycle::{run_scoped, with_context};
