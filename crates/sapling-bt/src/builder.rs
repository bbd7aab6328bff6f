//! Tree construction.
//!
//! Node constructors return owned [`Node`]s; children are built inside a closure that gets
//! the same builder back. Decorator calls do not return anything to nest into: they push
//! onto a pending list which the next constructed node takes in full, the first pushed
//! decorator ending up outermost.
//!
//! ```ignore
//! let mut b = Builder::new();
//! let root = b.reactive_sequence("patrol", |b| {
//!     b.condition(|cx: &mut Cx<'_, World>| cx.world.awake);
//!     vec![b.leaf("walk", |s| { s.on_base_tick(|_| Status::Running); })]
//! });
//! let tree = Tree::new(b.finish(root)?);
//! ```

use std::borrow::Cow;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use sapling_core::{Reinitialize, Variable};

use crate::composite::{Ordered, OrderedMode, Parallel, ParallelPolicy, Race};
use crate::context::Cx;
use crate::decorator::{
    AlwaysSucceed, Condition, ForEach, Invert, Repeat, ResetChild, Until, While,
};
use crate::dynamic::{Resolve, Yield, YieldConfig};
use crate::error::BuildError;
use crate::hooks::Hooks;
use crate::leaf::Leaf;
use crate::node::{Behavior, Node, NodeId};
use crate::setup::NodeSetup;
use crate::status::Status;

type Wrap<W> = Box<dyn FnOnce(Node<W>) -> Box<dyn Behavior<W>>>;

struct PendingDecorator<W: 'static> {
    kind: &'static str,
    wrap: Wrap<W>,
}

pub struct Builder<W: 'static> {
    ids: Rc<Cell<u64>>,
    pending: Vec<PendingDecorator<W>>,
    errors: Vec<BuildError>,
}

impl<W: 'static> fmt::Debug for Builder<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("next_id", &self.ids.get())
            .field(
                "pending",
                &self.pending.iter().map(|d| d.kind).collect::<Vec<_>>(),
            )
            .field("errors", &self.errors)
            .finish()
    }
}

impl<W: 'static> Default for Builder<W> {
    fn default() -> Self {
        Self {
            ids: Rc::new(Cell::new(0)),
            pending: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<W: 'static> Builder<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh builder sharing this one's id sequence, so nodes built later (for example
    /// by yield selectors) never collide with existing ids.
    pub fn fork(&self) -> Self {
        Self {
            ids: Rc::clone(&self.ids),
            pending: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Check the construction and hand back the root.
    pub fn finish(mut self, root: Node<W>) -> Result<Node<W>, BuildError> {
        if !self.pending.is_empty() {
            self.errors.push(BuildError::DanglingDecorators {
                scope: Cow::Borrowed("builder"),
                count: self.pending.len(),
            });
        }
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(root),
        }
    }

    /// Decorators waiting for the next constructed node.
    pub fn pending_decorators(&self) -> usize {
        self.pending.len()
    }

    fn next_id(&self) -> NodeId {
        let id = self.ids.get();
        self.ids.set(id + 1);
        NodeId(id)
    }

    fn push<B: Behavior<W>>(
        &mut self,
        kind: &'static str,
        wrap: impl FnOnce(Node<W>) -> B + 'static,
    ) -> &mut Self {
        let wrap: Wrap<W> =
            Box::new(move |child: Node<W>| Box::new(wrap(child)) as Box<dyn Behavior<W>>);
        self.pending.push(PendingDecorator { kind, wrap });
        self
    }

    fn assemble(
        &mut self,
        name: Cow<'static, str>,
        decorators: Vec<PendingDecorator<W>>,
        behavior: Box<dyn Behavior<W>>,
        hooks: Hooks<W>,
        variables: Vec<Box<dyn Reinitialize>>,
    ) -> Node<W> {
        let mut node = Node::new(self.next_id(), name, behavior, hooks, variables);
        for decorator in decorators.into_iter().rev() {
            let behavior = (decorator.wrap)(node);
            node = Node::new(
                self.next_id(),
                Cow::Borrowed(decorator.kind),
                behavior,
                Hooks::default(),
                Vec::new(),
            );
        }
        node
    }

    fn composite<B: Behavior<W>>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        children: impl FnOnce(&mut Self) -> Vec<Node<W>>,
        make: impl FnOnce(&mut Self, &Cow<'static, str>, Vec<Node<W>>) -> B,
    ) -> Node<W> {
        let name = name.into();
        let decorators = std::mem::take(&mut self.pending);
        let kids = children(self);
        if !self.pending.is_empty() {
            tracing::debug!(scope = %name, count = self.pending.len(), "dangling decorators");
            self.errors.push(BuildError::DanglingDecorators {
                scope: name.clone(),
                count: self.pending.len(),
            });
            self.pending.clear();
        }
        let behavior = Box::new(make(self, &name, kids));
        self.assemble(name, decorators, behavior, Hooks::default(), Vec::new())
    }

    // Decorators.

    /// Fail (after winding the child down) whenever `predicate` is false.
    pub fn condition(
        &mut self,
        predicate: impl FnMut(&mut Cx<'_, W>) -> bool + 'static,
    ) -> &mut Self {
        self.push("Condition", move |child| {
            Condition::new(Box::new(predicate), false, child)
        })
    }

    /// Like [`Builder::condition`], but ignored while the child is running.
    pub fn condition_latch(
        &mut self,
        predicate: impl FnMut(&mut Cx<'_, W>) -> bool + 'static,
    ) -> &mut Self {
        self.push("ConditionLatch", move |child| {
            Condition::new(Box::new(predicate), true, child)
        })
    }

    pub fn invert(&mut self) -> &mut Self {
        self.push("Invert", Invert::new)
    }

    pub fn always_succeed(&mut self) -> &mut Self {
        self.push("AlwaysSucceed", AlwaysSucceed::new)
    }

    /// Re-run the child (on the next step) until it finishes with `target`.
    pub fn until(&mut self, target: Status) -> &mut Self {
        assert!(target.is_terminal(), "until() needs Success or Failure, got {target:?}");
        self.push("Until", move |child| Until::new(target, child))
    }

    /// Re-run the child forever, re-entering it on the step after each completion.
    pub fn repeat(&mut self) -> &mut Self {
        self.push("Repeat", |child| Repeat::new(None, child))
    }

    /// Re-run the child until it completed `count` times, then succeed.
    ///
    /// Re-entry happens on the step after each completion, so a child that finishes
    /// within one step takes `count` steps in total.
    pub fn repeat_count(&mut self, count: u32) -> &mut Self {
        self.push("RepeatCount", move |child| Repeat::new(Some(count), child))
    }

    /// Run the child once per item; the current item is written to `out`.
    pub fn for_each<T: Clone + PartialEq + 'static>(
        &mut self,
        items: impl FnMut(&mut Cx<'_, W>) -> Vec<T> + 'static,
        out: Variable<T>,
    ) -> &mut Self {
        self.push("ForEach", move |child| ForEach::new(Box::new(items), out, child))
    }

    /// Keep the child running while `predicate` holds; succeed once it stops holding.
    pub fn while_holds(
        &mut self,
        predicate: impl FnMut(&mut Cx<'_, W>) -> bool + 'static,
    ) -> &mut Self {
        self.push("While", move |child| While::new(Box::new(predicate), child))
    }

    /// Tear the child down to `None` on every activation.
    pub fn reset(&mut self) -> &mut Self {
        self.push("Reset", ResetChild::new)
    }

    // Nodes.

    pub fn leaf(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        setup: impl FnOnce(&mut NodeSetup<W>),
    ) -> Node<W> {
        let decorators = std::mem::take(&mut self.pending);
        let mut node_setup = NodeSetup::default();
        setup(&mut node_setup);
        let (hooks, variables, base) = node_setup.into_parts();
        self.assemble(
            name.into(),
            decorators,
            Box::new(Leaf::new(base)),
            hooks,
            variables,
        )
    }

    /// Node driven by a caller-defined [`Behavior`].
    pub fn behavior(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        behavior: impl Behavior<W>,
    ) -> Node<W> {
        let decorators = std::mem::take(&mut self.pending);
        self.assemble(
            name.into(),
            decorators,
            Box::new(behavior),
            Hooks::default(),
            Vec::new(),
        )
    }

    /// Attach hooks and variables to an already built node (composites included). When
    /// `node` is decorated the hooks land on the outermost decorator.
    pub fn setup(&mut self, mut node: Node<W>, setup: impl FnOnce(&mut NodeSetup<W>)) -> Node<W> {
        let mut node_setup = NodeSetup::default();
        setup(&mut node_setup);
        let (hooks, variables, base) = node_setup.into_parts();
        if base.is_some() {
            self.errors.push(BuildError::LateBaseTick {
                name: Cow::Owned(node.name().to_string()),
            });
        }
        node.merge_hooks(hooks, variables);
        node
    }

    pub fn sequence(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        children: impl FnOnce(&mut Self) -> Vec<Node<W>>,
    ) -> Node<W> {
        self.composite(name, children, |_, _, kids| {
            Ordered::new(OrderedMode::Sequence, false, kids)
        })
    }

    pub fn reactive_sequence(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        children: impl FnOnce(&mut Self) -> Vec<Node<W>>,
    ) -> Node<W> {
        self.composite(name, children, |_, _, kids| {
            Ordered::new(OrderedMode::Sequence, true, kids)
        })
    }

    pub fn sequence_always(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        children: impl FnOnce(&mut Self) -> Vec<Node<W>>,
    ) -> Node<W> {
        self.composite(name, children, |_, _, kids| {
            Ordered::new(OrderedMode::SequenceAlways, false, kids)
        })
    }

    pub fn reactive_sequence_always(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        children: impl FnOnce(&mut Self) -> Vec<Node<W>>,
    ) -> Node<W> {
        self.composite(name, children, |_, _, kids| {
            Ordered::new(OrderedMode::SequenceAlways, true, kids)
        })
    }

    pub fn selector(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        children: impl FnOnce(&mut Self) -> Vec<Node<W>>,
    ) -> Node<W> {
        self.composite(name, children, |_, _, kids| {
            Ordered::new(OrderedMode::Selector, false, kids)
        })
    }

    pub fn reactive_selector(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        children: impl FnOnce(&mut Self) -> Vec<Node<W>>,
    ) -> Node<W> {
        self.composite(name, children, |_, _, kids| {
            Ordered::new(OrderedMode::Selector, true, kids)
        })
    }

    pub fn parallel(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        policy: ParallelPolicy,
        children: impl FnOnce(&mut Self) -> Vec<Node<W>>,
    ) -> Node<W> {
        self.composite(name, children, move |_, _, kids| Parallel::new(policy, kids))
    }

    pub fn race(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        children: impl FnOnce(&mut Self) -> Vec<Node<W>>,
    ) -> Node<W> {
        self.composite(name, children, |b, name, kids| {
            if kids.is_empty() {
                b.errors.push(BuildError::EmptyRace { name: name.clone() });
            }
            Race::new(kids)
        })
    }

    /// Subtree chosen at tick time, with the default [`YieldConfig`].
    pub fn yield_node(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        selector: impl FnMut(&mut Cx<'_, W>, &mut Builder<W>, Option<&Node<W>>) -> Resolve<W> + 'static,
    ) -> Node<W> {
        self.yield_node_with(name, YieldConfig::default(), selector)
    }

    pub fn yield_node_with(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        config: YieldConfig,
        selector: impl FnMut(&mut Cx<'_, W>, &mut Builder<W>, Option<&Node<W>>) -> Resolve<W> + 'static,
    ) -> Node<W> {
        let decorators = std::mem::take(&mut self.pending);
        let template = self.fork();
        self.assemble(
            name.into(),
            decorators,
            Box::new(Yield::new(config, Box::new(selector), template)),
            Hooks::default(),
            Vec::new(),
        )
    }
}
