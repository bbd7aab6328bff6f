use std::borrow::Cow;

use sapling_core::{Reinitialize, Variable};

use crate::context::Cx;
use crate::hooks::{Callback, HookTask, Hooks, Phase, TaskFactory};
use crate::leaf::BaseTick;
use crate::status::Status;

/// Hooks and variables for one node, collected while the node is built.
///
/// Hooks in the same phase run in the order they were added.
pub struct NodeSetup<W: 'static> {
    hooks: Hooks<W>,
    variables: Vec<Box<dyn Reinitialize>>,
    base: Option<BaseTick<W>>,
}

impl<W: 'static> Default for NodeSetup<W> {
    fn default() -> Self {
        Self {
            hooks: Hooks::default(),
            variables: Vec::new(),
            base: None,
        }
    }
}

impl<W: 'static> NodeSetup<W> {
    pub(crate) fn into_parts(self) -> (Hooks<W>, Vec<Box<dyn Reinitialize>>, Option<BaseTick<W>>) {
        (self.hooks, self.variables, self.base)
    }

    /// Variable owned by this node, reset to `initial` whenever the node is enabled.
    pub fn variable<T: Clone + 'static>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        initial: T,
    ) -> Variable<T> {
        self.variable_with(name, move || initial.clone())
    }

    /// Variable owned by this node, reset by `init` whenever the node is enabled.
    pub fn variable_with<T: 'static>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        init: impl Fn() -> T + 'static,
    ) -> Variable<T> {
        let variable = Variable::with_init(name, init);
        self.variables.push(Box::new(variable.clone()));
        variable
    }

    fn sync(&mut self, phase: Phase, f: impl FnMut(&mut Cx<'_, W>) + 'static) -> &mut Self {
        self.hooks.phase_mut(phase).push(Callback::Sync(Box::new(f)));
        self
    }

    fn task<T, F>(&mut self, phase: Phase, mut make: F) -> &mut Self
    where
        T: HookTask<W>,
        F: FnMut(&mut Cx<'_, W>) -> T + 'static,
    {
        let factory: TaskFactory<W> =
            Box::new(move |cx: &mut Cx<'_, W>| Box::new(make(cx)) as Box<dyn HookTask<W>>);
        self.hooks.phase_mut(phase).push(Callback::Task(factory));
        self
    }

    pub fn on_enabled(&mut self, f: impl FnMut(&mut Cx<'_, W>) + 'static) -> &mut Self {
        self.sync(Phase::Enabled, f)
    }

    pub fn on_enabled_task<T: HookTask<W>>(
        &mut self,
        make: impl FnMut(&mut Cx<'_, W>) -> T + 'static,
    ) -> &mut Self {
        self.task(Phase::Enabled, make)
    }

    pub fn on_enter(&mut self, f: impl FnMut(&mut Cx<'_, W>) + 'static) -> &mut Self {
        self.sync(Phase::Enter, f)
    }

    pub fn on_enter_task<T: HookTask<W>>(
        &mut self,
        make: impl FnMut(&mut Cx<'_, W>) -> T + 'static,
    ) -> &mut Self {
        self.task(Phase::Enter, make)
    }

    pub fn on_success(&mut self, f: impl FnMut(&mut Cx<'_, W>) + 'static) -> &mut Self {
        self.sync(Phase::Success, f)
    }

    pub fn on_success_task<T: HookTask<W>>(
        &mut self,
        make: impl FnMut(&mut Cx<'_, W>) -> T + 'static,
    ) -> &mut Self {
        self.task(Phase::Success, make)
    }

    pub fn on_failure(&mut self, f: impl FnMut(&mut Cx<'_, W>) + 'static) -> &mut Self {
        self.sync(Phase::Failure, f)
    }

    pub fn on_failure_task<T: HookTask<W>>(
        &mut self,
        make: impl FnMut(&mut Cx<'_, W>) -> T + 'static,
    ) -> &mut Self {
        self.task(Phase::Failure, make)
    }

    pub fn on_exit(&mut self, f: impl FnMut(&mut Cx<'_, W>) + 'static) -> &mut Self {
        self.sync(Phase::Exit, f)
    }

    pub fn on_exit_task<T: HookTask<W>>(
        &mut self,
        make: impl FnMut(&mut Cx<'_, W>) -> T + 'static,
    ) -> &mut Self {
        self.task(Phase::Exit, make)
    }

    pub fn on_disabled(&mut self, f: impl FnMut(&mut Cx<'_, W>) + 'static) -> &mut Self {
        self.sync(Phase::Disabled, f)
    }

    pub fn on_disabled_task<T: HookTask<W>>(
        &mut self,
        make: impl FnMut(&mut Cx<'_, W>) -> T + 'static,
    ) -> &mut Self {
        self.task(Phase::Disabled, make)
    }

    /// Runs every step before the base tick.
    pub fn on_pre_tick(&mut self, f: impl FnMut(&mut Cx<'_, W>) + 'static) -> &mut Self {
        self.hooks.pre_tick.push(Box::new(f));
        self
    }

    /// Runs every step after the base tick.
    pub fn on_tick(&mut self, f: impl FnMut(&mut Cx<'_, W>) + 'static) -> &mut Self {
        self.hooks.tick.push(Box::new(f));
        self
    }

    /// Consulted by reactive parents while the node is running or done.
    pub fn on_invalid_check(&mut self, f: impl FnMut(&mut Cx<'_, W>) -> bool + 'static) -> &mut Self {
        self.hooks.invalid_check.push(Box::new(f));
        self
    }

    /// Leaf logic. Replaces any earlier base tick.
    pub fn on_base_tick(&mut self, f: impl FnMut(&mut Cx<'_, W>) -> Status + 'static) -> &mut Self {
        self.base = Some(Box::new(f));
        self
    }
}
