use std::borrow::Cow;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use sapling_core::{CancelScope, Reinitialize};
use sapling_tools::{tags, TraceEvent};

use crate::context::Cx;
use crate::hooks::{Hooks, Phase, PhaseRun};
use crate::snapshot::NodeSnapshot;
use crate::status::{Status, SubStatus};

/// Builder-assigned identity, stable across re-entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The part of a node that decides its result: leaf logic, composite aggregation or a
/// decorator around a single child.
///
/// The lifecycle (phases, hooks, scopes, resets) is handled by [`Node`]; a behavior only
/// sees the calls below. `reset_gracefully` is polled every step until it reports `true`
/// and must be safe to call again after that.
pub trait Behavior<W: 'static>: 'static {
    fn kind(&self) -> &'static str;

    /// Called when the node moves to `Running`, on first activation and on every re-entry.
    fn enter(&mut self, _cx: &mut Cx<'_, W>) {}

    fn tick(&mut self, cx: &mut Cx<'_, W>) -> Status;

    /// Called once the node finished, before its OnExit hooks. Return `false` to hold the
    /// node in `Exiting` until a later step.
    fn exit(&mut self, _cx: &mut Cx<'_, W>) -> bool {
        true
    }

    /// Extra invalidation source for reactive parents, on top of OnInvalidCheck hooks.
    fn invalidated(&mut self, _cx: &mut Cx<'_, W>) -> bool {
        false
    }

    /// Tear down owned children. Returns `true` once every child is back at `None`.
    fn reset_gracefully(&mut self, cx: &mut Cx<'_, W>) -> bool {
        reset_all_gracefully(self.children_mut(), cx)
    }

    fn reset_immediately(&mut self, cx: &mut Cx<'_, W>) {
        for child in self.children_mut() {
            child.reset_immediately(cx);
        }
    }

    fn children(&self) -> &[Node<W>] {
        &[]
    }

    fn children_mut(&mut self) -> &mut [Node<W>] {
        &mut []
    }
}

/// Reset `children` one at a time, in index order. A child is not touched until every
/// child before it has reached `None`.
pub fn reset_all_gracefully<W: 'static>(children: &mut [Node<W>], cx: &mut Cx<'_, W>) -> bool {
    for child in children.iter_mut() {
        if !child.reset_gracefully(cx) {
            return false;
        }
    }
    true
}

/// Teardown progress while `Disabling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Teardown {
    /// Finish whatever phase was suspended when the reset arrived.
    Draining,
    Children,
    Exit,
    Disabled,
}

pub struct Node<W: 'static> {
    id: NodeId,
    name: Cow<'static, str>,
    status: Status,
    sub: SubStatus,
    hooks: Hooks<W>,
    behavior: Box<dyn Behavior<W>>,
    variables: Vec<Box<dyn Reinitialize>>,
    run: PhaseRun<W>,
    scope: Option<CancelScope>,
    done_at: Option<u64>,
    needs_exit: bool,
    teardown: Option<Teardown>,
}

impl<W: 'static> fmt::Debug for Node<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.behavior.kind())
            .field("status", &self.status)
            .field("sub_status", &self.sub)
            .field("hooks", &self.hooks.len())
            .field("children", &self.behavior.children().len())
            .finish()
    }
}

impl<W: 'static> Node<W> {
    pub(crate) fn new(
        id: NodeId,
        name: Cow<'static, str>,
        behavior: Box<dyn Behavior<W>>,
        hooks: Hooks<W>,
        variables: Vec<Box<dyn Reinitialize>>,
    ) -> Self {
        Self {
            id,
            name,
            status: Status::None,
            sub: SubStatus::None,
            hooks,
            behavior,
            variables,
            run: PhaseRun::default(),
            scope: None,
            done_at: None,
            needs_exit: false,
            teardown: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &'static str {
        self.behavior.kind()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn sub_status(&self) -> SubStatus {
        self.sub
    }

    pub fn is_done(&self) -> bool {
        self.sub == SubStatus::Done
    }

    /// Activated and not yet finished (includes a pending teardown).
    pub fn is_active(&self) -> bool {
        !matches!(self.sub, SubStatus::None | SubStatus::Done)
    }

    pub fn children(&self) -> &[Node<W>] {
        self.behavior.children()
    }

    /// Scope of the current activation session, if any.
    pub fn scope(&self) -> Option<&CancelScope> {
        self.scope.as_ref()
    }

    /// External step in which the node last reached `Done`.
    pub(crate) fn done_at(&self) -> Option<u64> {
        self.done_at
    }

    pub(crate) fn merge_hooks(&mut self, hooks: Hooks<W>, variables: Vec<Box<dyn Reinitialize>>) {
        self.hooks.absorb(hooks);
        self.variables.extend(variables);
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            id: self.id,
            name: self.name.to_string(),
            kind: self.behavior.kind().to_string(),
            status: self.status,
            sub_status: self.sub,
            children: self.children().iter().map(Node::snapshot).collect(),
        }
    }

    /// Advance the node by one external step.
    ///
    /// Returns `Running` until the node reaches `Done` within this call, then its terminal
    /// status. With `allow_reenter` a `Done` node starts a new run (skipping OnEnabled),
    /// unless it finished during this same step.
    pub fn tick(&mut self, cx: &mut Cx<'_, W>, allow_reenter: bool) -> Status {
        if self.teardown.is_some() {
            return if self.reset_gracefully(cx) {
                Status::None
            } else {
                Status::Running
            };
        }

        match self.sub {
            SubStatus::Done => {
                if !allow_reenter || self.done_at == Some(cx.tick.tick) {
                    return self.status;
                }
                self.status = Status::Running;
                self.needs_exit = true;
                self.transition(cx, SubStatus::Entering);
            }
            SubStatus::None => self.activate(cx),
            _ => {}
        }

        let previous = cx.push_frame(self.id, self.scope.clone());
        let status = self.advance(cx);
        cx.pop_frame(previous);
        status
    }

    fn activate(&mut self, cx: &mut Cx<'_, W>) {
        let parent = cx.parent_scope();
        self.scope = Some(cx.scopes().acquire(parent.as_ref()));
        for variable in &self.variables {
            variable.reinitialize();
        }
        self.status = Status::Running;
        self.done_at = None;
        self.transition(cx, SubStatus::Enabling);
    }

    fn advance(&mut self, cx: &mut Cx<'_, W>) -> Status {
        loop {
            match self.sub {
                SubStatus::Enabling => {
                    if !self.run.run(Phase::Enabled, &mut self.hooks, cx) {
                        return Status::Running;
                    }
                    self.needs_exit = true;
                    self.transition(cx, SubStatus::Entering);
                }
                SubStatus::Entering => {
                    if !self.run.run(Phase::Enter, &mut self.hooks, cx) {
                        return Status::Running;
                    }
                    self.transition(cx, SubStatus::Running);
                    self.behavior.enter(cx);
                }
                SubStatus::Running => {
                    for hook in self.hooks.pre_tick.iter_mut() {
                        hook(cx);
                    }
                    let result = self.behavior.tick(cx);
                    for hook in self.hooks.tick.iter_mut() {
                        hook(cx);
                    }
                    match result {
                        Status::Success => {
                            self.status = Status::Success;
                            self.transition(cx, SubStatus::Succeeding);
                        }
                        Status::Failure => {
                            self.status = Status::Failure;
                            self.transition(cx, SubStatus::Failing);
                        }
                        Status::Running | Status::None => return Status::Running,
                    }
                }
                SubStatus::Succeeding | SubStatus::Failing => {
                    let phase = if self.sub == SubStatus::Succeeding {
                        Phase::Success
                    } else {
                        Phase::Failure
                    };
                    if !self.run.run(phase, &mut self.hooks, cx) {
                        return Status::Running;
                    }
                    self.transition(cx, SubStatus::Exiting);
                }
                SubStatus::Exiting => {
                    if self.run.active() != Some(Phase::Exit) && !self.behavior.exit(cx) {
                        return Status::Running;
                    }
                    if !self.run.run(Phase::Exit, &mut self.hooks, cx) {
                        return Status::Running;
                    }
                    self.needs_exit = false;
                    self.done_at = Some(cx.tick.tick);
                    self.transition(cx, SubStatus::Done);
                    return self.status;
                }
                SubStatus::Done => return self.status,
                SubStatus::None | SubStatus::Disabling => return Status::Running,
            }
        }
    }

    /// Wind the node down to `None`, running the hooks that are owed on the way.
    ///
    /// Returns `false` while hooks are still suspended; call again on later steps. A
    /// node already at `None` returns `true` immediately.
    pub fn reset_gracefully(&mut self, cx: &mut Cx<'_, W>) -> bool {
        if self.teardown.is_none() {
            if self.sub == SubStatus::None {
                return true;
            }
            tracing::debug!(node = self.id.0, name = %self.name, from = ?self.sub, "graceful reset");
            self.teardown = Some(Teardown::Draining);
        }

        let previous = cx.push_frame(self.id, self.scope.clone());
        let finished = self.drive_teardown(cx);
        cx.pop_frame(previous);

        if finished {
            self.teardown = None;
            self.status = Status::None;
            self.done_at = None;
            self.needs_exit = false;
            self.transition(cx, SubStatus::None);
            if let Some(scope) = self.scope.take() {
                cx.scopes().release(scope);
            }
            let tick = cx.tick.tick;
            cx.emit(TraceEvent::new(tick, tags::RESET_GRACEFUL).with_a(self.id.0));
        }
        finished
    }

    fn drive_teardown(&mut self, cx: &mut Cx<'_, W>) -> bool {
        loop {
            let Some(stage) = self.teardown else {
                return true;
            };
            match stage {
                Teardown::Draining => {
                    if let Some(phase) = self.run.active() {
                        if !self.run.run(phase, &mut self.hooks, cx) {
                            return false;
                        }
                        if phase == Phase::Exit {
                            self.needs_exit = false;
                        }
                    }
                    self.transition(cx, SubStatus::Disabling);
                    self.teardown = Some(Teardown::Children);
                }
                Teardown::Children => {
                    if !self.behavior.reset_gracefully(cx) {
                        return false;
                    }
                    self.teardown = Some(Teardown::Exit);
                }
                Teardown::Exit => {
                    if self.needs_exit {
                        if !self.run.run(Phase::Exit, &mut self.hooks, cx) {
                            return false;
                        }
                        self.needs_exit = false;
                    }
                    self.teardown = Some(Teardown::Disabled);
                }
                Teardown::Disabled => {
                    return self.run.run(Phase::Disabled, &mut self.hooks, cx);
                }
            }
        }
    }

    /// Cancel the node's scope, abandon every in-flight hook (children first) and return
    /// to `None` within this call. No hooks run.
    pub fn reset_immediately(&mut self, cx: &mut Cx<'_, W>) {
        if self.sub == SubStatus::None && self.teardown.is_none() {
            return;
        }
        if let Some(scope) = self.scope.as_ref() {
            scope.cancel();
        }

        let previous = cx.push_frame(self.id, self.scope.clone());
        self.behavior.reset_immediately(cx);
        let cancelled = self.run.cancel(cx);
        cx.pop_frame(previous);

        tracing::debug!(node = self.id.0, name = %self.name, cancelled, "immediate reset");
        self.teardown = None;
        self.status = Status::None;
        self.done_at = None;
        self.needs_exit = false;
        if self.sub != SubStatus::Disabling {
            self.transition(cx, SubStatus::Disabling);
        }
        self.transition(cx, SubStatus::None);
        if let Some(scope) = self.scope.take() {
            cx.scopes().release(scope);
        }
        let tick = cx.tick.tick;
        cx.emit(
            TraceEvent::new(tick, tags::RESET_IMMEDIATE)
                .with_a(self.id.0)
                .with_b(cancelled as u64),
        );
    }

    /// Whether a reactive parent should rewind to this node: any OnInvalidCheck hook
    /// reports true, or the behavior itself reports a change since entry.
    pub fn poll_invalid(&mut self, cx: &mut Cx<'_, W>) -> bool {
        if !matches!(self.sub, SubStatus::Running | SubStatus::Done) {
            return false;
        }
        let previous = cx.push_frame(self.id, self.scope.clone());
        let mut invalid = false;
        for check in self.hooks.invalid_check.iter_mut() {
            if check(cx) {
                invalid = true;
                break;
            }
        }
        if !invalid {
            invalid = self.behavior.invalidated(cx);
        }
        cx.pop_frame(previous);
        invalid
    }

    fn transition(&mut self, cx: &mut Cx<'_, W>, to: SubStatus) {
        let from = self.sub;
        debug_assert!(
            from.can_transition_to(to),
            "illegal sub-status transition {from:?} -> {to:?} on {}",
            self.name
        );
        self.sub = to;
        tracing::trace!(node = self.id.0, name = %self.name, ?from, ?to, "sub-status");
        let tick = cx.tick.tick;
        cx.emit(
            TraceEvent::new(tick, tags::STATUS_CHANGED)
                .with_a(self.id.0)
                .with_b(to.code()),
        );
    }
}

/// A cached node reference should be rebuilt: it is absent, or it finished with `Failure`.
pub fn is_invalid<W: 'static>(node: Option<&Node<W>>) -> bool {
    match node {
        None => true,
        Some(node) => node.is_done() && node.status().is_failure(),
    }
}

/// Tick a child inside a composite session. The first tick of a session may re-enter a
/// child left `Done` by the previous session; later ticks read its cached result.
pub(crate) fn tick_fresh<W: 'static>(
    child: &mut Node<W>,
    touched: &mut bool,
    cx: &mut Cx<'_, W>,
) -> Status {
    let status = child.tick(cx, !*touched);
    *touched = true;
    status
}

/// Tick with re-entry and report the status only when the child finished during this
/// call. A `Done` child whose re-entry is blocked for this step reports `None`.
pub(crate) fn tick_completion<W: 'static>(child: &mut Node<W>, cx: &mut Cx<'_, W>) -> Option<Status> {
    let before = child.done_at();
    let status = child.tick(cx, true);
    if status.is_terminal() && child.is_done() && child.done_at() != before {
        Some(status)
    } else {
        None
    }
}
