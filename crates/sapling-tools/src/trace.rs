#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

/// Tags emitted by the engine.
pub mod tags {
    /// A node's children were rebuilt. `a` = node id.
    pub const STRUCTURE_CHANGED: &str = "bt.structure";
    /// A node changed sub-status. `a` = node id, `b` = sub-status code.
    pub const STATUS_CHANGED: &str = "bt.status";
    /// A reactive composite found an invalid child. `a` = composite id, `b` = child index.
    pub const INVALIDATED: &str = "bt.invalidated";
    /// A graceful reset finished. `a` = node id.
    pub const RESET_GRACEFUL: &str = "bt.reset.graceful";
    /// An immediate reset ran. `a` = node id, `b` = number of cancelled hooks.
    pub const RESET_IMMEDIATE: &str = "bt.reset.immediate";
}

/// A small, allocation-friendly trace event.
///
/// This is intentionally "dumb data" so it can be recorded during a tick and later rendered
/// by tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub tick: u64,
    pub tag: Cow<'static, str>,
    pub a: u64,
    pub b: u64,
}

impl TraceEvent {
    pub fn new(tick: u64, tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tick,
            tag: tag.into(),
            a: 0,
            b: 0,
        }
    }

    pub fn with_a(mut self, a: u64) -> Self {
        self.a = a;
        self
    }

    pub fn with_b(mut self, b: u64) -> Self {
        self.b = b;
        self
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }
}

pub trait TraceSink {
    fn emit(&mut self, event: TraceEvent);
}

#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn emit(&mut self, _event: TraceEvent) {}
}

#[derive(Debug, Default)]
pub struct VecTraceSink {
    pub events: Vec<TraceEvent>,
}

impl TraceSink for VecTraceSink {
    fn emit(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a TraceEvent> + 'a {
        self.events.iter().filter(move |e| e.is(tag))
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl TraceSink for TraceLog {
    fn emit(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Sink handle that can be given to a tree while the caller keeps a clone to read from.
#[derive(Debug)]
pub struct SharedTraceSink<S> {
    inner: Rc<RefCell<S>>,
}

impl<S> Clone for SharedTraceSink<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: TraceSink> SharedTraceSink<S> {
    pub fn new(sink: S) -> Self {
        Self {
            inner: Rc::new(RefCell::new(sink)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.borrow())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }
}

impl<S: TraceSink> TraceSink for SharedTraceSink<S> {
    fn emit(&mut self, event: TraceEvent) {
        self.inner.borrow_mut().emit(event);
    }
}
