//! Lifecycle callbacks and the phase runner.
//!
//! A phase (OnEnabled, OnEnter, ...) holds an ordered list of callbacks. Synchronous
//! callbacks complete when called. Task callbacks produce a [`HookTask`]: a step function
//! polled once per tick until it returns [`Step::Done`], which is how a hook suspends
//! across external ticks without any async runtime.

use std::fmt;
use std::marker::PhantomData;

use crate::context::Cx;

/// Result of polling a [`HookTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Pending,
    Done,
}

impl Step {
    pub fn is_done(self) -> bool {
        matches!(self, Step::Done)
    }
}

/// A lifecycle hook that may span several ticks.
pub trait HookTask<W>: 'static {
    fn poll(&mut self, cx: &mut Cx<'_, W>) -> Step;

    /// Called when the task is abandoned by an immediate reset, before it is dropped.
    fn cancel(&mut self, _cx: &mut Cx<'_, W>) {}
}

/// [`HookTask`] built from a polling closure.
pub struct FnTask<W, F> {
    poll: F,
    on_cancel: Option<Box<dyn FnOnce()>>,
    _world: PhantomData<fn(&mut W)>,
}

impl<W, F> FnTask<W, F> {
    /// Cleanup run if the task is abandoned.
    pub fn on_cancel(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_cancel = Some(Box::new(f));
        self
    }
}

impl<W, F> fmt::Debug for FnTask<W, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTask")
            .field("on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}

/// Wrap a polling closure as a [`HookTask`].
pub fn task<W, F>(poll: F) -> FnTask<W, F>
where
    F: FnMut(&mut Cx<'_, W>) -> Step + 'static,
{
    FnTask {
        poll,
        on_cancel: None,
        _world: PhantomData,
    }
}

impl<W: 'static, F> HookTask<W> for FnTask<W, F>
where
    F: FnMut(&mut Cx<'_, W>) -> Step + 'static,
{
    fn poll(&mut self, cx: &mut Cx<'_, W>) -> Step {
        (self.poll)(cx)
    }

    fn cancel(&mut self, _cx: &mut Cx<'_, W>) {
        if let Some(f) = self.on_cancel.take() {
            f();
        }
    }
}

/// Suspends for `ticks` polls, completing on the following one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTicks {
    remaining: u32,
}

pub fn wait_ticks(ticks: u32) -> WaitTicks {
    WaitTicks { remaining: ticks }
}

impl<W> HookTask<W> for WaitTicks {
    fn poll(&mut self, _cx: &mut Cx<'_, W>) -> Step {
        if self.remaining == 0 {
            return Step::Done;
        }
        self.remaining -= 1;
        Step::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Enabled,
    Enter,
    Success,
    Failure,
    Exit,
    Disabled,
}

pub(crate) type SyncHook<W> = Box<dyn FnMut(&mut Cx<'_, W>)>;
pub(crate) type TaskFactory<W> = Box<dyn FnMut(&mut Cx<'_, W>) -> Box<dyn HookTask<W>>>;
pub(crate) type InvalidCheck<W> = Box<dyn FnMut(&mut Cx<'_, W>) -> bool>;

pub(crate) enum Callback<W> {
    Sync(SyncHook<W>),
    Task(TaskFactory<W>),
}

pub(crate) struct Hooks<W> {
    pub(crate) enabled: Vec<Callback<W>>,
    pub(crate) enter: Vec<Callback<W>>,
    pub(crate) success: Vec<Callback<W>>,
    pub(crate) failure: Vec<Callback<W>>,
    pub(crate) exit: Vec<Callback<W>>,
    pub(crate) disabled: Vec<Callback<W>>,
    pub(crate) pre_tick: Vec<SyncHook<W>>,
    pub(crate) tick: Vec<SyncHook<W>>,
    pub(crate) invalid_check: Vec<InvalidCheck<W>>,
}

impl<W> Default for Hooks<W> {
    fn default() -> Self {
        Self {
            enabled: Vec::new(),
            enter: Vec::new(),
            success: Vec::new(),
            failure: Vec::new(),
            exit: Vec::new(),
            disabled: Vec::new(),
            pre_tick: Vec::new(),
            tick: Vec::new(),
            invalid_check: Vec::new(),
        }
    }
}

impl<W> Hooks<W> {
    pub(crate) fn phase_mut(&mut self, phase: Phase) -> &mut Vec<Callback<W>> {
        match phase {
            Phase::Enabled => &mut self.enabled,
            Phase::Enter => &mut self.enter,
            Phase::Success => &mut self.success,
            Phase::Failure => &mut self.failure,
            Phase::Exit => &mut self.exit,
            Phase::Disabled => &mut self.disabled,
        }
    }

    /// Append `other`'s callbacks after the ones already registered.
    pub(crate) fn absorb(&mut self, other: Hooks<W>) {
        self.enabled.extend(other.enabled);
        self.enter.extend(other.enter);
        self.success.extend(other.success);
        self.failure.extend(other.failure);
        self.exit.extend(other.exit);
        self.disabled.extend(other.disabled);
        self.pre_tick.extend(other.pre_tick);
        self.tick.extend(other.tick);
        self.invalid_check.extend(other.invalid_check);
    }

    pub(crate) fn len(&self) -> usize {
        self.enabled.len()
            + self.enter.len()
            + self.success.len()
            + self.failure.len()
            + self.exit.len()
            + self.disabled.len()
            + self.pre_tick.len()
            + self.tick.len()
            + self.invalid_check.len()
    }
}

/// Progress through one phase's callback list.
pub(crate) struct PhaseRun<W> {
    phase: Option<Phase>,
    cursor: usize,
    in_flight: Option<Box<dyn HookTask<W>>>,
}

impl<W> Default for PhaseRun<W> {
    fn default() -> Self {
        Self {
            phase: None,
            cursor: 0,
            in_flight: None,
        }
    }
}

impl<W: 'static> PhaseRun<W> {
    /// Phase started but not yet complete.
    pub(crate) fn active(&self) -> Option<Phase> {
        self.phase
    }

    /// Drive `phase` forward. Callbacks run one after another in insertion order; a
    /// pending task stops the walk until the next call. Returns `true` once every
    /// callback has completed.
    pub(crate) fn run(&mut self, phase: Phase, hooks: &mut Hooks<W>, cx: &mut Cx<'_, W>) -> bool {
        if self.phase != Some(phase) {
            debug_assert!(self.in_flight.is_none(), "phase switched with a task in flight");
            self.phase = Some(phase);
            self.cursor = 0;
            self.in_flight = None;
        }

        let callbacks = hooks.phase_mut(phase);
        loop {
            if let Some(task) = self.in_flight.as_mut() {
                match task.poll(cx) {
                    Step::Pending => return false,
                    Step::Done => self.in_flight = None,
                }
            }

            let Some(callback) = callbacks.get_mut(self.cursor) else {
                self.phase = None;
                self.cursor = 0;
                return true;
            };
            self.cursor += 1;

            match callback {
                Callback::Sync(f) => f(cx),
                Callback::Task(make) => self.in_flight = Some(make(cx)),
            }
        }
    }

    /// Abandon the current phase. Returns the number of tasks cancelled.
    pub(crate) fn cancel(&mut self, cx: &mut Cx<'_, W>) -> usize {
        self.phase = None;
        self.cursor = 0;
        match self.in_flight.take() {
            Some(mut task) => {
                task.cancel(cx);
                1
            }
            None => 0,
        }
    }
}
