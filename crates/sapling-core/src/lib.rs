//! Engine-agnostic primitives for the sapling behavior tree runtime.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod cancel;
pub mod tick;
pub mod variable;

pub use cancel::{CancelScope, PoolStats, Released, ScopeId, ScopePool, ScopePoolConfig};
pub use tick::TickContext;
pub use variable::{Reinitialize, Subscription, Variable};
