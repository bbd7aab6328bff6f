use crate::context::Cx;
use crate::node::Behavior;
use crate::status::Status;

pub(crate) type BaseTick<W> = Box<dyn FnMut(&mut Cx<'_, W>) -> Status>;

/// Caller-supplied logic. A leaf without a base tick succeeds on its first tick.
pub(crate) struct Leaf<W> {
    base: Option<BaseTick<W>>,
}

impl<W> Leaf<W> {
    pub(crate) fn new(base: Option<BaseTick<W>>) -> Self {
        Self { base }
    }
}

impl<W: 'static> Behavior<W> for Leaf<W> {
    fn kind(&self) -> &'static str {
        "Leaf"
    }

    fn tick(&mut self, cx: &mut Cx<'_, W>) -> Status {
        match self.base.as_mut() {
            Some(base) => base(cx),
            None => Status::Success,
        }
    }
}
