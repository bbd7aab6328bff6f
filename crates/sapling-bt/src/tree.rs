#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use sapling_core::{ScopePool, ScopePoolConfig, TickContext};
use sapling_tools::{NullTraceSink, TraceSink};

use crate::context::Cx;
use crate::node::Node;
use crate::snapshot::NodeSnapshot;
use crate::status::Status;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TreeConfig {
    /// Yield nodes nested deeper than this fail instead of resolving. `None` = unbounded.
    pub max_yield_depth: Option<u32>,
    /// Re-enter the root on the step after it finished.
    pub restart_on_complete: bool,
    pub dt_seconds: f32,
    pub scope_pool: ScopePoolConfig,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_yield_depth: None,
            restart_on_complete: false,
            dt_seconds: 0.1,
            scope_pool: ScopePoolConfig::default(),
        }
    }
}

impl TreeConfig {
    pub fn with_max_yield_depth(mut self, max: u32) -> Self {
        self.max_yield_depth = Some(max);
        self
    }

    pub fn with_restart_on_complete(mut self, restart: bool) -> Self {
        self.restart_on_complete = restart;
        self
    }

    pub fn with_dt_seconds(mut self, dt_seconds: f32) -> Self {
        self.dt_seconds = dt_seconds;
        self
    }

    pub fn with_scope_pool(mut self, scope_pool: ScopePoolConfig) -> Self {
        self.scope_pool = scope_pool;
        self
    }
}

/// Drives one root: owns the scope pool, the trace sink and the step counter.
///
/// Each [`Tree::tick`] or [`Tree::reset_gracefully`] call is one external step.
pub struct Tree<W: 'static> {
    root: Node<W>,
    config: TreeConfig,
    scopes: ScopePool,
    sink: Box<dyn TraceSink>,
    tick: TickContext,
}

impl<W: 'static> std::fmt::Debug for Tree<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("scopes", &self.scopes)
            .field("tick", &self.tick)
            .finish()
    }
}

impl<W: 'static> Tree<W> {
    pub fn new(root: Node<W>) -> Self {
        Self::with_config(root, TreeConfig::default())
    }

    pub fn with_config(root: Node<W>, config: TreeConfig) -> Self {
        Self {
            root,
            scopes: ScopePool::with_config(config.scope_pool),
            config,
            sink: Box::new(NullTraceSink),
            tick: TickContext::default(),
        }
    }

    pub fn with_sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn root(&self) -> &Node<W> {
        &self.root
    }

    pub fn scopes(&self) -> &ScopePool {
        &self.scopes
    }

    /// Step counter of the last external step (0 before the first one).
    pub fn current_tick(&self) -> u64 {
        self.tick.tick
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        self.root.snapshot()
    }

    fn advance(&mut self) {
        self.tick = self.tick.next(self.config.dt_seconds);
    }

    pub fn tick(&mut self, world: &mut W) -> Status {
        self.advance();
        let mut cx = Cx::new(self.tick, world, &mut self.scopes, self.sink.as_mut())
            .with_max_yield_depth(self.config.max_yield_depth);
        self.root.tick(&mut cx, self.config.restart_on_complete)
    }

    /// One step of winding the whole tree down. Returns `true` once the root is at `None`.
    pub fn reset_gracefully(&mut self, world: &mut W) -> bool {
        self.advance();
        let mut cx = Cx::new(self.tick, world, &mut self.scopes, self.sink.as_mut())
            .with_max_yield_depth(self.config.max_yield_depth);
        self.root.reset_gracefully(&mut cx)
    }

    pub fn reset_immediately(&mut self, world: &mut W) {
        let mut cx = Cx::new(self.tick, world, &mut self.scopes, self.sink.as_mut())
            .with_max_yield_depth(self.config.max_yield_depth);
        self.root.reset_immediately(&mut cx);
    }

    pub fn into_root(self) -> Node<W> {
        self.root
    }
}
