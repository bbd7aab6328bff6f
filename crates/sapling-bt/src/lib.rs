//! Behavior tree runtime with lifecycle hooks, reactive invalidation and recursive subtrees.
//!
//! Trees are built with [`Builder`] and driven with [`Tree::tick`], once per external step.
//! Nodes walk the [`SubStatus`] lifecycle; side effects live in hooks registered through
//! [`NodeSetup`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod builder;
mod composite;
pub mod context;
mod decorator;
pub mod dynamic;
pub mod error;
pub mod hooks;
mod leaf;
pub mod node;
mod reactive;
pub mod setup;
pub mod snapshot;
pub mod status;
pub mod tree;

pub use builder::Builder;
pub use composite::ParallelPolicy;
pub use context::Cx;
pub use dynamic::{Resolve, ResolvePolicy, YieldConfig};
pub use error::BuildError;
pub use hooks::{task, wait_ticks, FnTask, HookTask, Phase, Step, WaitTicks};
pub use node::{is_invalid, reset_all_gracefully, Behavior, Node, NodeId};
pub use setup::NodeSetup;
pub use snapshot::NodeSnapshot;
pub use status::{Status, SubStatus};
pub use tree::{Tree, TreeConfig};

pub use sapling_core::{CancelScope, PoolStats, ScopePool, TickContext, Variable};
