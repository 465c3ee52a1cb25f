//! doeff-fiber: cooperative, single-threaded execution contexts.
//!
//! A [`Hub`] owns a root context and any number of child contexts. Control
//! moves between them only through explicit transfers:
//!
//! - **switch** delivers a value to the target's suspension point;
//! - **throw** raises a [`Fault`] there instead;
//! - **kill** throws the clean-kill fault, a quiet termination signal.
//!
//! # Architecture
//!
//! - **Fixed parent chain**: when a context's entry returns (or lets a fault
//!   escape), control goes to its creation-time parent, skipping dead
//!   ancestors, never to whoever last switched into it.
//! - **Stack per context**: each context runs on a `corosensei` coroutine;
//!   the root drives a trampoline that resumes whichever context is named
//!   next.
//! - **Faults as values**: a suspension point observes `Result<Value, Fault>`;
//!   entries handle faults with ordinary matching and propagate with `?`.
//!
//! ```no_run
//! use doeff_fiber::{Hub, Value};
//!
//! let hub = Hub::new();
//! let child = hub.create(|hub, _| {
//!     let reply = hub.switch_to_parent("ready")?;
//!     Ok(reply)
//! });
//! assert_eq!(hub.switch(child, ()).unwrap(), Value::from("ready"));
//! assert_eq!(hub.switch(child, 7i64).unwrap(), Value::Int(7));
//! assert!(hub.is_dead(child));
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod fault;
pub mod hub;
pub mod ids;
mod propagate;
pub mod throw;
mod transfer;
pub mod transfer_log;
pub mod value;

// Re-exports for convenience
pub use config::HubConfig;
pub use context::{ContextInfo, ContextOptions, ContextState, EntryFn};
pub use error::HubError;
pub use fault::{Fault, FaultKind, Trace, TraceFrame};
pub use hub::Hub;
pub use ids::{ContextId, HubId};
pub use throw::ThrowArgs;
pub use transfer::TransferResult;
pub use transfer_log::{running_sequence, ExitOutcome, TransferEvent};
pub use value::Value;
