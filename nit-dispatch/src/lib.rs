//! NIT dispatcher: finds script blocks in model output, checks them against
//! the turn's NIT-ID, and runs their tool calls against the plugin registry.
//!
//! Name resolution repairs path-like tool names, consults per-dispatch extra
//! tools before the registry, routes plugin-level calls through a `command`
//! parameter, and applies the [`ToolGate`](nit_security::ToolGate) before a
//! tool runs. Every invocation is timed and reported to a
//! [`DispatchObserver`].

#![warn(missing_docs, clippy::pedantic)]

mod dispatcher;
pub mod observer;
mod record;

pub use dispatcher::Dispatcher;
pub use observer::{
    CollectingObserver, CompositeDispatchObserver, DispatchObserver, TracingDispatchObserver,
};
pub use record::{DispatchRecord, DispatchStatus, SCRIPT_PLUGIN};
