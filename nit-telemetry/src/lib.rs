//! Observability utilities for the NIT engine.

#![warn(missing_docs, clippy::pedantic)]

mod logging;
mod record;

pub use logging::{DEFAULT_FILTER, init_tracing};
pub use record::{
    InvocationOutcome, InvocationRecord, PARAMS_PREVIEW_LEN, PendingInvocation,
    RESULT_PREVIEW_LEN, preview,
};
