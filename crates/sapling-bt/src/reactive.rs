//! Reactive rewind for ordered composites.
//!
//! Before aggregating, a reactive composite looks at its finished children. The first one
//! that reports itself invalid becomes the rewind point: every later child is reset
//! gracefully (one at a time, possibly over several steps), then the invalid child is
//! re-entered and aggregation continues in the same step.

use sapling_tools::{tags, TraceEvent};

use crate::context::Cx;
use crate::node::Node;

#[derive(Debug, Default)]
pub(crate) struct Reactive {
    rewind: Option<usize>,
}

impl Reactive {
    pub(crate) fn clear(&mut self) {
        self.rewind = None;
    }

    /// Returns `false` while later children are still winding down.
    pub(crate) fn poll<W: 'static>(
        &mut self,
        children: &mut [Node<W>],
        touched: &mut [bool],
        cx: &mut Cx<'_, W>,
    ) -> bool {
        if self.rewind.is_none() {
            self.rewind = children
                .iter_mut()
                .zip(touched.iter())
                .position(|(child, &entered)| entered && child.is_done() && child.poll_invalid(cx));

            if let Some(index) = self.rewind {
                let owner = cx.node().map(|id| id.0).unwrap_or_default();
                tracing::debug!(
                    composite = owner,
                    child = index,
                    name = %children[index].name(),
                    "child invalidated, rewinding"
                );
                let tick = cx.tick.tick;
                cx.emit(
                    TraceEvent::new(tick, tags::INVALIDATED)
                        .with_a(owner)
                        .with_b(index as u64),
                );
            }
        }

        let Some(index) = self.rewind else {
            return true;
        };
        for later in children[index + 1..].iter_mut() {
            if !later.reset_gracefully(cx) {
                return false;
            }
        }
        touched[index] = false;
        self.rewind = None;
        true
    }
}
