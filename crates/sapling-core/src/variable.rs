use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Subscriber<T> = Rc<dyn Fn(&T)>;

struct VariableInner<T> {
    name: Cow<'static, str>,
    value: RefCell<T>,
    init: Option<Box<dyn Fn() -> T>>,
    subscribers: RefCell<Vec<(u64, Subscriber<T>)>>,
    next_subscriber: Cell<u64>,
}

/// A reactive, typed storage cell.
///
/// `Variable` is a cheap, clonable handle: every clone refers to the same cell. The node
/// whose setup created the variable owns its initializer; other nodes read it through
/// captured handles.
///
/// Writes through [`Variable::set`] that change the value (by `PartialEq`) notify every
/// subscriber synchronously, before `set` returns. Subscribers may write to the variable
/// again (reentrant notification) or add/remove subscriptions while being notified.
pub struct Variable<T: 'static> {
    inner: Rc<VariableInner<T>>,
}

impl<T: 'static> Clone for Variable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Variable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.inner.name)
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

impl<T: 'static> Variable<T> {
    /// Variable without an initializer; the value survives node re-activation.
    pub fn new(name: impl Into<Cow<'static, str>>, value: T) -> Self {
        Self::build(name.into(), value, None)
    }

    /// Variable whose value is reset by `init` each time the owning node is enabled.
    pub fn with_init(
        name: impl Into<Cow<'static, str>>,
        init: impl Fn() -> T + 'static,
    ) -> Self {
        let value = init();
        Self::build(name.into(), value, Some(Box::new(init)))
    }

    fn build(name: Cow<'static, str>, value: T, init: Option<Box<dyn Fn() -> T>>) -> Self {
        Self {
            inner: Rc::new(VariableInner {
                name,
                value: RefCell::new(value),
                init,
                subscribers: RefCell::new(Vec::new()),
                next_subscriber: Cell::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn has_initializer(&self) -> bool {
        self.inner.init.is_some()
    }

    /// Borrow the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Update the value without notifying subscribers.
    pub fn set_silently(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
    }

    /// Mutate the value in place without notifying subscribers.
    pub fn update_silently(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
    }

    /// Run the initializer again (activation start or restore). No change signal fires.
    ///
    /// Returns `false` when the variable has no initializer.
    pub fn reinitialize(&self) -> bool {
        let Some(init) = self.inner.init.as_ref() else {
            return false;
        };
        let value = init();
        self.set_silently(value);
        tracing::trace!(variable = %self.name(), "reinitialized");
        true
    }

    /// Register a change subscriber. The subscription lives until the returned handle is
    /// dropped or [`Subscription::detach`] is called.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let id = self.inner.next_subscriber.get();
        self.inner.next_subscriber.set(id + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::new(f)));

        let weak: Weak<VariableInner<T>> = Rc::downgrade(&self.inner);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Two handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self, value: &T) {
        // Snapshot so subscribers can (un)subscribe while being notified.
        let subscribers: Vec<Subscriber<T>> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, f)| Rc::clone(f))
            .collect();
        for f in subscribers {
            f(value);
        }
    }
}

impl<T: Clone + 'static> Variable<T> {
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

impl<T: Clone + PartialEq + 'static> Variable<T> {
    /// Write a value, notifying subscribers when it differs from the current one.
    ///
    /// Returns whether the value changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        self.notify(&value);
        true
    }

    /// Mutate through a closure; subscribers are notified when the result differs.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }
}

/// Type-erased access to a variable's initializer, used by nodes to reset the
/// variables they own when an activation session begins.
pub trait Reinitialize {
    fn reinitialize(&self) -> bool;
}

impl<T: 'static> Reinitialize for Variable<T> {
    fn reinitialize(&self) -> bool {
        Variable::reinitialize(self)
    }
}

/// Handle returned by [`Variable::subscribe`].
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Keep the subscriber registered for the lifetime of the variable.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}
