//! Yield nodes: subtrees chosen at tick time.
//!
//! The selector gets a fork of the builder and the previously resolved node, and either
//! keeps it, switches to a freshly built node, or fails. Selectors may call the very
//! constructor that contains the yield node, which is how recursive plans are expressed.

use sapling_tools::{tags, TraceEvent};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::builder::Builder;
use crate::context::Cx;
use crate::node::{Behavior, Node};
use crate::status::Status;

/// Selector decision.
pub enum Resolve<W: 'static> {
    /// Keep ticking the previously resolved node.
    Keep,
    /// Replace the resolved node.
    Switch(Node<W>),
    Fail,
}

impl<W: 'static> std::fmt::Debug for Resolve<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolve::Keep => f.write_str("Keep"),
            Resolve::Switch(node) => f.debug_tuple("Switch").field(&node.name()).finish(),
            Resolve::Fail => f.write_str("Fail"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResolvePolicy {
    /// Consult the selector on every step.
    #[default]
    EveryTick,
    /// Consult the selector once per activation or re-entry.
    OncePerEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct YieldConfig {
    pub resolve: ResolvePolicy,
    /// Wind the old node down gracefully before activating its replacement. When false the
    /// old node is reset immediately and dropped.
    pub reset_on_change: bool,
    /// Reset the resolved node gracefully when the yield node exits.
    pub reset_on_exit: bool,
}

impl Default for YieldConfig {
    fn default() -> Self {
        Self {
            resolve: ResolvePolicy::EveryTick,
            reset_on_change: true,
            reset_on_exit: false,
        }
    }
}

impl YieldConfig {
    pub fn with_resolve(mut self, resolve: ResolvePolicy) -> Self {
        self.resolve = resolve;
        self
    }

    pub fn with_reset_on_change(mut self, reset_on_change: bool) -> Self {
        self.reset_on_change = reset_on_change;
        self
    }

    pub fn with_reset_on_exit(mut self, reset_on_exit: bool) -> Self {
        self.reset_on_exit = reset_on_exit;
        self
    }
}

pub(crate) type SelectorFn<W> =
    Box<dyn FnMut(&mut Cx<'_, W>, &mut Builder<W>, Option<&Node<W>>) -> Resolve<W>>;

pub(crate) struct Yield<W: 'static> {
    config: YieldConfig,
    selector: SelectorFn<W>,
    template: Builder<W>,
    current: Option<Node<W>>,
    /// Replacement waiting for the old node to finish winding down.
    incoming: Option<Node<W>>,
    touched: bool,
    resolved: bool,
}

impl<W: 'static> Yield<W> {
    pub(crate) fn new(config: YieldConfig, selector: SelectorFn<W>, template: Builder<W>) -> Self {
        Self {
            config,
            selector,
            template,
            current: None,
            incoming: None,
            touched: false,
            resolved: false,
        }
    }

    fn resolve(&mut self, cx: &mut Cx<'_, W>) -> Option<Resolve<W>> {
        if self.config.resolve == ResolvePolicy::OncePerEntry && self.resolved {
            return None;
        }
        self.resolved = true;

        let mut builder = self.template.fork();
        match (self.selector)(cx, &mut builder, self.current.as_ref()) {
            Resolve::Switch(node) => match builder.finish(node) {
                Ok(node) => Some(Resolve::Switch(node)),
                Err(err) => panic!("yield selector built an invalid subtree: {err}"),
            },
            other => Some(other),
        }
    }

    /// Retire the current node in favour of `incoming`. Returns `false` while the old node
    /// is still winding down.
    fn complete_switch(&mut self, cx: &mut Cx<'_, W>) -> bool {
        if let Some(old) = self.current.as_mut() {
            if self.config.reset_on_change {
                if !old.reset_gracefully(cx) {
                    return false;
                }
            } else {
                old.reset_immediately(cx);
            }
        }

        let Some(next) = self.incoming.take() else {
            return true;
        };
        let owner = cx.node().map(|id| id.0).unwrap_or_default();
        tracing::debug!(
            node = owner,
            from = self.current.as_ref().map(|n| n.id().0),
            to = next.id().0,
            name = %next.name(),
            "yield switched subtree"
        );
        self.current = Some(next);
        self.touched = false;
        let tick = cx.tick.tick;
        cx.emit(TraceEvent::new(tick, tags::STRUCTURE_CHANGED).with_a(owner));
        true
    }
}

impl<W: 'static> Behavior<W> for Yield<W> {
    fn kind(&self) -> &'static str {
        "Yield"
    }

    fn enter(&mut self, _cx: &mut Cx<'_, W>) {
        self.touched = false;
        self.resolved = false;
    }

    fn tick(&mut self, cx: &mut Cx<'_, W>) -> Status {
        if let Some(max) = cx.max_yield_depth() {
            if cx.yield_depth() >= max {
                tracing::warn!(
                    node = cx.node().map(|id| id.0),
                    depth = cx.yield_depth(),
                    max,
                    "yield nesting limit reached"
                );
                return Status::Failure;
            }
        }

        if self.incoming.is_some() {
            if !self.complete_switch(cx) {
                return Status::Running;
            }
        } else {
            match self.resolve(cx) {
                None | Some(Resolve::Keep) => {}
                Some(Resolve::Fail) => return Status::Failure,
                Some(Resolve::Switch(node)) => {
                    self.incoming = Some(node);
                    if !self.complete_switch(cx) {
                        return Status::Running;
                    }
                }
            }
        }

        let Some(current) = self.current.as_mut() else {
            return Status::Failure;
        };
        cx.enter_yield();
        let status = current.tick(cx, !self.touched);
        cx.leave_yield();
        self.touched = true;
        status
    }

    fn exit(&mut self, cx: &mut Cx<'_, W>) -> bool {
        if !self.config.reset_on_exit {
            return true;
        }
        match self.current.as_mut() {
            Some(current) => current.reset_gracefully(cx),
            None => true,
        }
    }

    fn invalidated(&mut self, cx: &mut Cx<'_, W>) -> bool {
        match self.current.as_mut() {
            Some(current) => current.poll_invalid(cx),
            None => false,
        }
    }

    fn reset_gracefully(&mut self, cx: &mut Cx<'_, W>) -> bool {
        self.incoming = None;
        match self.current.as_mut() {
            Some(current) => current.reset_gracefully(cx),
            None => true,
        }
    }

    fn reset_immediately(&mut self, cx: &mut Cx<'_, W>) {
        self.incoming = None;
        if let Some(current) = self.current.as_mut() {
            current.reset_immediately(cx);
        }
    }

    fn children(&self) -> &[Node<W>] {
        self.current.as_slice()
    }

    fn children_mut(&mut self) -> &mut [Node<W>] {
        self.current.as_mut_slice()
    }
}
