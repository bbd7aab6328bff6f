//! Composite nodes: ordered (sequence, sequence-always, selector), parallel and race.
//!
//! Every composite keeps one `touched` flag per child for the current session. The first
//! tick of a child in a session may re-enter it; after that a `Done` child only reports its
//! cached status, so the active child is recomputed from children states every step.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::context::Cx;
use crate::node::{reset_all_gracefully, tick_fresh, Behavior, Node};
use crate::reactive::Reactive;
use crate::status::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OrderedMode {
    /// Stop at the first failure.
    Sequence,
    /// Record failures and keep going.
    SequenceAlways,
    /// Stop at the first success.
    Selector,
}

pub(crate) struct Ordered<W: 'static> {
    mode: OrderedMode,
    children: Vec<Node<W>>,
    touched: Vec<bool>,
    reactive: Option<Reactive>,
}

impl<W: 'static> Ordered<W> {
    pub(crate) fn new(mode: OrderedMode, reactive: bool, children: Vec<Node<W>>) -> Self {
        Self {
            mode,
            touched: vec![false; children.len()],
            children,
            reactive: reactive.then(Reactive::default),
        }
    }
}

impl<W: 'static> Behavior<W> for Ordered<W> {
    fn kind(&self) -> &'static str {
        match (self.mode, self.reactive.is_some()) {
            (OrderedMode::Sequence, false) => "Sequence",
            (OrderedMode::Sequence, true) => "ReactiveSequence",
            (OrderedMode::SequenceAlways, false) => "SequenceAlways",
            (OrderedMode::SequenceAlways, true) => "ReactiveSequenceAlways",
            (OrderedMode::Selector, false) => "Selector",
            (OrderedMode::Selector, true) => "ReactiveSelector",
        }
    }

    fn enter(&mut self, _cx: &mut Cx<'_, W>) {
        self.touched.fill(false);
        if let Some(reactive) = self.reactive.as_mut() {
            reactive.clear();
        }
    }

    fn tick(&mut self, cx: &mut Cx<'_, W>) -> Status {
        if let Some(reactive) = self.reactive.as_mut() {
            if !reactive.poll(&mut self.children, &mut self.touched, cx) {
                return Status::Running;
            }
        }

        let mut failed = false;
        for (child, touched) in self.children.iter_mut().zip(self.touched.iter_mut()) {
            match (self.mode, tick_fresh(child, touched, cx)) {
                (OrderedMode::Sequence, Status::Success) => continue,
                (OrderedMode::Sequence, Status::Failure) => return Status::Failure,
                (OrderedMode::SequenceAlways, Status::Success) => continue,
                (OrderedMode::SequenceAlways, Status::Failure) => failed = true,
                (OrderedMode::Selector, Status::Success) => return Status::Success,
                (OrderedMode::Selector, Status::Failure) => continue,
                (_, Status::Running | Status::None) => return Status::Running,
            }
        }

        match self.mode {
            OrderedMode::Sequence => Status::Success,
            OrderedMode::SequenceAlways if failed => Status::Failure,
            OrderedMode::SequenceAlways => Status::Success,
            OrderedMode::Selector => Status::Failure,
        }
    }

    fn reset_gracefully(&mut self, cx: &mut Cx<'_, W>) -> bool {
        if let Some(reactive) = self.reactive.as_mut() {
            reactive.clear();
        }
        reset_all_gracefully(&mut self.children, cx)
    }

    fn children(&self) -> &[Node<W>] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut [Node<W>] {
        &mut self.children
    }
}

/// How a parallel group turns its children's results into one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParallelPolicy {
    /// Success iff every child succeeded.
    #[default]
    RequireAll,
    /// Success iff at least one child succeeded.
    RequireOne,
}

impl ParallelPolicy {
    fn aggregate(self, mut results: impl Iterator<Item = Status>) -> Status {
        let ok = match self {
            ParallelPolicy::RequireAll => results.all(Status::is_success),
            ParallelPolicy::RequireOne => results.any(Status::is_success),
        };
        if ok {
            Status::Success
        } else {
            Status::Failure
        }
    }
}

pub(crate) struct Parallel<W: 'static> {
    policy: ParallelPolicy,
    children: Vec<Node<W>>,
    touched: Vec<bool>,
}

impl<W: 'static> Parallel<W> {
    pub(crate) fn new(policy: ParallelPolicy, children: Vec<Node<W>>) -> Self {
        Self {
            policy,
            touched: vec![false; children.len()],
            children,
        }
    }
}

impl<W: 'static> Behavior<W> for Parallel<W> {
    fn kind(&self) -> &'static str {
        "Parallel"
    }

    fn enter(&mut self, _cx: &mut Cx<'_, W>) {
        self.touched.fill(false);
    }

    fn tick(&mut self, cx: &mut Cx<'_, W>) -> Status {
        let mut all_done = true;
        for (child, touched) in self.children.iter_mut().zip(self.touched.iter_mut()) {
            if !tick_fresh(child, touched, cx).is_terminal() {
                all_done = false;
            }
        }
        if !all_done {
            return Status::Running;
        }
        self.policy
            .aggregate(self.children.iter().map(Node::status))
    }

    fn children(&self) -> &[Node<W>] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut [Node<W>] {
        &mut self.children
    }
}

/// Every child is ticked each step. The lowest-index child to finish wins; the rest are
/// wound down before the race reports.
pub(crate) struct Race<W: 'static> {
    children: Vec<Node<W>>,
    touched: Vec<bool>,
    winner: Option<(usize, Status)>,
}

impl<W: 'static> Race<W> {
    pub(crate) fn new(children: Vec<Node<W>>) -> Self {
        Self {
            touched: vec![false; children.len()],
            children,
            winner: None,
        }
    }
}

impl<W: 'static> Behavior<W> for Race<W> {
    fn kind(&self) -> &'static str {
        "Race"
    }

    fn enter(&mut self, _cx: &mut Cx<'_, W>) {
        self.touched.fill(false);
        self.winner = None;
    }

    fn tick(&mut self, cx: &mut Cx<'_, W>) -> Status {
        if self.winner.is_none() {
            for (index, (child, touched)) in self
                .children
                .iter_mut()
                .zip(self.touched.iter_mut())
                .enumerate()
            {
                let status = tick_fresh(child, touched, cx);
                if self.winner.is_none() && status.is_terminal() {
                    tracing::debug!(winner = index, name = %child.name(), ?status, "race decided");
                    self.winner = Some((index, status));
                }
            }
        }

        let Some((winner, status)) = self.winner else {
            return Status::Running;
        };
        for (index, child) in self.children.iter_mut().enumerate() {
            if index != winner && !child.reset_gracefully(cx) {
                return Status::Running;
            }
        }
        status
    }

    fn reset_gracefully(&mut self, cx: &mut Cx<'_, W>) -> bool {
        self.winner = None;
        reset_all_gracefully(&mut self.children, cx)
    }

    fn children(&self) -> &[Node<W>] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut [Node<W>] {
        &mut self.children
    }
}
