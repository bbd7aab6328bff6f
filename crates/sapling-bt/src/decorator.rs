//! Single-child decorators.
//!
//! Each decorator is an ordinary node whose behavior owns exactly one child. The builder
//! attaches them through its pending list; see [`crate::Builder::condition`] and friends.

use std::slice;

use sapling_core::Variable;

use crate::context::Cx;
use crate::node::{tick_completion, tick_fresh, Behavior, Node};
use crate::status::{Status, SubStatus};

pub(crate) type Predicate<W> = Box<dyn FnMut(&mut Cx<'_, W>) -> bool>;

/// Child accessors, plus forwarding of reactive invalidation to the wrapped child unless
/// the decorator has its own notion of it.
macro_rules! single_child {
    (children) => {
        fn children(&self) -> &[Node<W>] {
            slice::from_ref(&self.child)
        }

        fn children_mut(&mut self) -> &mut [Node<W>] {
            slice::from_mut(&mut self.child)
        }
    };
    () => {
        fn invalidated(&mut self, cx: &mut Cx<'_, W>) -> bool {
            self.child.poll_invalid(cx)
        }

        single_child!(children);
    };
}

/// Guard evaluated before the child every step.
pub(crate) struct Condition<W: 'static> {
    predicate: Predicate<W>,
    latch: bool,
    child: Node<W>,
    touched: bool,
    /// Predicate value seen when the session started.
    observed: Option<bool>,
    failing: bool,
}

impl<W: 'static> Condition<W> {
    pub(crate) fn new(predicate: Predicate<W>, latch: bool, child: Node<W>) -> Self {
        Self {
            predicate,
            latch,
            child,
            touched: false,
            observed: None,
            failing: false,
        }
    }

    fn latched(&self) -> bool {
        self.latch && self.touched && self.child.is_active()
    }
}

impl<W: 'static> Behavior<W> for Condition<W> {
    fn kind(&self) -> &'static str {
        if self.latch {
            "ConditionLatch"
        } else {
            "Condition"
        }
    }

    fn enter(&mut self, _cx: &mut Cx<'_, W>) {
        self.touched = false;
        self.observed = None;
        self.failing = false;
    }

    fn tick(&mut self, cx: &mut Cx<'_, W>) -> Status {
        if !self.failing && !self.latched() {
            let holds = (self.predicate)(cx);
            self.observed.get_or_insert(holds);
            if !holds {
                self.failing = true;
            }
        }

        if self.failing {
            // A child that never entered is already at `None`.
            if self.child.reset_gracefully(cx) {
                return Status::Failure;
            }
            return Status::Running;
        }

        tick_fresh(&mut self.child, &mut self.touched, cx)
    }

    fn invalidated(&mut self, cx: &mut Cx<'_, W>) -> bool {
        if self.latched() {
            return false;
        }
        let holds = (self.predicate)(cx);
        if self.observed.is_some_and(|seen| seen != holds) {
            return true;
        }
        self.child.poll_invalid(cx)
    }

    fn reset_gracefully(&mut self, cx: &mut Cx<'_, W>) -> bool {
        self.failing = false;
        self.child.reset_gracefully(cx)
    }

    single_child!(children);
}

pub(crate) struct Invert<W: 'static> {
    child: Node<W>,
    touched: bool,
}

impl<W: 'static> Invert<W> {
    pub(crate) fn new(child: Node<W>) -> Self {
        Self {
            child,
            touched: false,
        }
    }
}

impl<W: 'static> Behavior<W> for Invert<W> {
    fn kind(&self) -> &'static str {
        "Invert"
    }

    fn enter(&mut self, _cx: &mut Cx<'_, W>) {
        self.touched = false;
    }

    fn tick(&mut self, cx: &mut Cx<'_, W>) -> Status {
        tick_fresh(&mut self.child, &mut self.touched, cx).invert()
    }

    single_child!();
}

pub(crate) struct AlwaysSucceed<W: 'static> {
    child: Node<W>,
    touched: bool,
}

impl<W: 'static> AlwaysSucceed<W> {
    pub(crate) fn new(child: Node<W>) -> Self {
        Self {
            child,
            touched: false,
        }
    }
}

impl<W: 'static> Behavior<W> for AlwaysSucceed<W> {
    fn kind(&self) -> &'static str {
        "AlwaysSucceed"
    }

    fn enter(&mut self, _cx: &mut Cx<'_, W>) {
        self.touched = false;
    }

    fn tick(&mut self, cx: &mut Cx<'_, W>) -> Status {
        match tick_fresh(&mut self.child, &mut self.touched, cx) {
            Status::Failure => Status::Success,
            other => other,
        }
    }

    single_child!();
}

/// Re-enter the child until it finishes with `target`.
pub(crate) struct Until<W: 'static> {
    target: Status,
    child: Node<W>,
}

impl<W: 'static> Until<W> {
    pub(crate) fn new(target: Status, child: Node<W>) -> Self {
        Self { target, child }
    }
}

impl<W: 'static> Behavior<W> for Until<W> {
    fn kind(&self) -> &'static str {
        "Until"
    }

    fn tick(&mut self, cx: &mut Cx<'_, W>) -> Status {
        match tick_completion(&mut self.child, cx) {
            Some(status) if status == self.target => status,
            _ => Status::Running,
        }
    }

    single_child!();
}

/// Re-enter the child on completion, `count` times or forever.
pub(crate) struct Repeat<W: 'static> {
    count: Option<u32>,
    completed: u32,
    child: Node<W>,
}

impl<W: 'static> Repeat<W> {
    pub(crate) fn new(count: Option<u32>, child: Node<W>) -> Self {
        Self {
            count,
            completed: 0,
            child,
        }
    }
}

impl<W: 'static> Behavior<W> for Repeat<W> {
    fn kind(&self) -> &'static str {
        if self.count.is_some() {
            "RepeatCount"
        } else {
            "Repeat"
        }
    }

    fn enter(&mut self, _cx: &mut Cx<'_, W>) {
        self.completed = 0;
    }

    fn tick(&mut self, cx: &mut Cx<'_, W>) -> Status {
        if self.count == Some(0) {
            return Status::Success;
        }
        if tick_completion(&mut self.child, cx).is_some() {
            self.completed = self.completed.saturating_add(1);
            if self.count.is_some_and(|count| self.completed >= count) {
                return Status::Success;
            }
        }
        Status::Running
    }

    single_child!();
}

pub(crate) type ItemsFn<W, T> = Box<dyn FnMut(&mut Cx<'_, W>) -> Vec<T>>;

/// Run the child once per item, publishing the current item through `out`.
pub(crate) struct ForEach<W: 'static, T: 'static> {
    items: ItemsFn<W, T>,
    out: Variable<T>,
    child: Node<W>,
    pending: Vec<T>,
    index: usize,
    published: bool,
}

impl<W: 'static, T: Clone + PartialEq + 'static> ForEach<W, T> {
    pub(crate) fn new(items: ItemsFn<W, T>, out: Variable<T>, child: Node<W>) -> Self {
        Self {
            items,
            out,
            child,
            pending: Vec::new(),
            index: 0,
            published: false,
        }
    }
}

impl<W: 'static, T: Clone + PartialEq + 'static> Behavior<W> for ForEach<W, T> {
    fn kind(&self) -> &'static str {
        "ForEach"
    }

    fn enter(&mut self, cx: &mut Cx<'_, W>) {
        self.pending = (self.items)(cx);
        self.index = 0;
        self.published = false;
    }

    fn tick(&mut self, cx: &mut Cx<'_, W>) -> Status {
        let Some(item) = self.pending.get(self.index) else {
            return Status::Success;
        };
        if !self.published {
            self.out.set(item.clone());
            self.published = true;
        }

        if tick_completion(&mut self.child, cx).is_some() {
            self.index += 1;
            self.published = false;
            if self.index >= self.pending.len() {
                return Status::Success;
            }
        }
        Status::Running
    }

    single_child!();
}

/// Keep the child running while the predicate holds.
pub(crate) struct While<W: 'static> {
    predicate: Predicate<W>,
    child: Node<W>,
    /// The child was left as-is when the predicate last turned false.
    stale: bool,
}

impl<W: 'static> While<W> {
    pub(crate) fn new(predicate: Predicate<W>, child: Node<W>) -> Self {
        Self {
            predicate,
            child,
            stale: false,
        }
    }
}

impl<W: 'static> Behavior<W> for While<W> {
    fn kind(&self) -> &'static str {
        "While"
    }

    fn tick(&mut self, cx: &mut Cx<'_, W>) -> Status {
        if self.stale {
            if !(self.predicate)(cx) {
                return Status::Success;
            }
            if !self.child.reset_gracefully(cx) {
                return Status::Running;
            }
            self.stale = false;
        } else if !(self.predicate)(cx) {
            self.stale = self.child.sub_status() != SubStatus::None;
            return Status::Success;
        }

        self.child.tick(cx, true);
        Status::Running
    }

    fn reset_gracefully(&mut self, cx: &mut Cx<'_, W>) -> bool {
        let done = self.child.reset_gracefully(cx);
        if done {
            self.stale = false;
        }
        done
    }

    single_child!();
}

/// Tear the child down to `None` on every activation before ticking it.
pub(crate) struct ResetChild<W: 'static> {
    child: Node<W>,
    pending: bool,
}

impl<W: 'static> ResetChild<W> {
    pub(crate) fn new(child: Node<W>) -> Self {
        Self {
            child,
            pending: false,
        }
    }
}

impl<W: 'static> Behavior<W> for ResetChild<W> {
    fn kind(&self) -> &'static str {
        "Reset"
    }

    fn enter(&mut self, _cx: &mut Cx<'_, W>) {
        self.pending = true;
    }

    fn tick(&mut self, cx: &mut Cx<'_, W>) -> Status {
        if self.pending {
            if !self.child.reset_gracefully(cx) {
                return Status::Running;
            }
            self.pending = false;
        }
        self.child.tick(cx, false)
    }

    single_child!();
}
