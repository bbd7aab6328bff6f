//! Cooperative cancellation scopes.
//!
//! Every active node owns one [`CancelScope`], derived from its parent's scope. Hooks
//! that run across several ticks poll [`CancelScope::is_requested`]; cancelling a scope
//! is observed by every scope derived from it.
//!
//! Scopes are recycled through an explicit [`ScopePool`] owned by the tree driver rather
//! than a process-wide singleton, so tests can inspect the pool's accounting.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScopeId(pub u64);

struct ScopeInner {
    id: ScopeId,
    requested: Cell<bool>,
    parent: RefCell<Option<CancelScope>>,
}

#[derive(Clone)]
pub struct CancelScope {
    inner: Rc<ScopeInner>,
}

impl fmt::Debug for CancelScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelScope")
            .field("id", &self.inner.id)
            .field("requested", &self.inner.requested.get())
            .field(
                "parent",
                &self.inner.parent.borrow().as_ref().map(|p| p.id()),
            )
            .finish()
    }
}

impl CancelScope {
    fn fresh(id: ScopeId) -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                id,
                requested: Cell::new(false),
                parent: RefCell::new(None),
            }),
        }
    }

    /// A scope that does not belong to any pool.
    pub fn detached() -> Self {
        Self::fresh(ScopeId(u64::MAX))
    }

    pub fn id(&self) -> ScopeId {
        self.inner.id
    }

    /// Cancellation was requested on this scope or any ancestor.
    pub fn is_requested(&self) -> bool {
        if self.inner.requested.get() {
            return true;
        }
        match self.inner.parent.borrow().as_ref() {
            Some(parent) => parent.is_requested(),
            None => false,
        }
    }

    /// Cancellation was requested on this scope itself.
    pub fn is_cancelled_here(&self) -> bool {
        self.inner.requested.get()
    }

    pub fn cancel(&self) {
        self.inner.requested.set(true);
    }

    pub fn parent(&self) -> Option<CancelScope> {
        self.inner.parent.borrow().clone()
    }

    pub fn same_scope(&self, other: &CancelScope) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn is_shared(&self) -> bool {
        Rc::strong_count(&self.inner) > 1
    }
}

/// What [`ScopePool::release`] did with a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    /// Back in the free list.
    Recycled,
    /// Cancelled, or still referenced elsewhere; never handed out again.
    Disposed,
    /// The pool was already at capacity.
    Dropped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolStats {
    pub allocated: u64,
    pub acquired: u64,
    pub recycled: u64,
    pub disposed: u64,
    pub dropped: u64,
}

impl PoolStats {
    /// Scopes handed out and not yet returned.
    pub fn outstanding(&self) -> u64 {
        self.acquired
            .saturating_sub(self.recycled + self.disposed + self.dropped)
    }

    /// Every acquired scope was released exactly once.
    pub fn is_balanced(&self) -> bool {
        self.outstanding() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScopePoolConfig {
    /// Maximum number of idle scopes kept for reuse.
    pub capacity: usize,
}

impl Default for ScopePoolConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

#[derive(Debug, Default)]
pub struct ScopePool {
    config: ScopePoolConfig,
    free: Vec<CancelScope>,
    next_id: u64,
    stats: PoolStats,
}

impl ScopePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScopePoolConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Hand out a clean scope, linked to `parent` when given.
    pub fn acquire(&mut self, parent: Option<&CancelScope>) -> CancelScope {
        let scope = match self.free.pop() {
            Some(scope) => scope,
            None => {
                let id = ScopeId(self.next_id);
                self.next_id += 1;
                self.stats.allocated += 1;
                CancelScope::fresh(id)
            }
        };
        *scope.inner.parent.borrow_mut() = parent.cloned();
        self.stats.acquired += 1;
        scope
    }

    /// Return a scope obtained from [`ScopePool::acquire`].
    ///
    /// Cancelled scopes and scopes with outstanding clones are disposed: handing them out
    /// again would let a stale holder observe (or cause) a cancellation that belongs to a
    /// different activation.
    pub fn release(&mut self, scope: CancelScope) -> Released {
        if scope.is_cancelled_here() || scope.is_shared() {
            tracing::trace!(scope = scope.id().0, "scope disposed");
            // Already reports requested on its own; the ancestor link only pins the parent.
            if scope.is_cancelled_here() {
                *scope.inner.parent.borrow_mut() = None;
            }
            self.stats.disposed += 1;
            return Released::Disposed;
        }

        *scope.inner.parent.borrow_mut() = None;
        if self.free.len() >= self.config.capacity {
            self.stats.dropped += 1;
            return Released::Dropped;
        }

        self.free.push(scope);
        self.stats.recycled += 1;
        Released::Recycled
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    pub fn idle(&self) -> usize {
        self.free.len()
    }
}
