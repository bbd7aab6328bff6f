use sapling_core::{CancelScope, ScopePool, TickContext};
use sapling_tools::{TraceEvent, TraceSink};

use crate::node::NodeId;

#[derive(Debug, Clone, Default)]
pub(crate) struct Frame {
    pub(crate) node: Option<NodeId>,
    pub(crate) scope: Option<CancelScope>,
}

/// Everything a node, hook or selector can reach during one external step.
///
/// `Cx` is rebuilt by the driver for every tick. While a node runs its hooks and
/// aggregation, [`Cx::scope`] is that node's own cancellation scope.
pub struct Cx<'a, W> {
    pub tick: TickContext,
    pub world: &'a mut W,
    scopes: &'a mut ScopePool,
    sink: &'a mut dyn TraceSink,
    frame: Frame,
    yield_depth: u32,
    max_yield_depth: Option<u32>,
}

impl<'a, W> Cx<'a, W> {
    pub fn new(
        tick: TickContext,
        world: &'a mut W,
        scopes: &'a mut ScopePool,
        sink: &'a mut dyn TraceSink,
    ) -> Self {
        Self {
            tick,
            world,
            scopes,
            sink,
            frame: Frame::default(),
            yield_depth: 0,
            max_yield_depth: None,
        }
    }

    pub fn with_max_yield_depth(mut self, max: Option<u32>) -> Self {
        self.max_yield_depth = max;
        self
    }

    /// Scope of the node currently executing.
    pub fn scope(&self) -> Option<&CancelScope> {
        self.frame.scope.as_ref()
    }

    /// The executing node's scope (or an ancestor's) was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.frame
            .scope
            .as_ref()
            .map(CancelScope::is_requested)
            .unwrap_or(false)
    }

    pub fn node(&self) -> Option<NodeId> {
        self.frame.node
    }

    pub fn emit(&mut self, event: TraceEvent) {
        self.sink.emit(event);
    }

    pub fn yield_depth(&self) -> u32 {
        self.yield_depth
    }

    pub fn max_yield_depth(&self) -> Option<u32> {
        self.max_yield_depth
    }

    pub(crate) fn scopes(&mut self) -> &mut ScopePool {
        &mut *self.scopes
    }

    pub(crate) fn push_frame(&mut self, node: NodeId, scope: Option<CancelScope>) -> Frame {
        std::mem::replace(
            &mut self.frame,
            Frame {
                node: Some(node),
                scope,
            },
        )
    }

    pub(crate) fn pop_frame(&mut self, previous: Frame) {
        self.frame = previous;
    }

    pub(crate) fn parent_scope(&self) -> Option<CancelScope> {
        self.frame.scope.clone()
    }

    pub(crate) fn enter_yield(&mut self) {
        self.yield_depth += 1;
    }

    pub(crate) fn leave_yield(&mut self) {
        self.yield_depth = self.yield_depth.saturating_sub(1);
    }
}
