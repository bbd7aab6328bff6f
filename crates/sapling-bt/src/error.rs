use std::borrow::Cow;

use thiserror::Error;

/// Tree construction mistakes reported by [`crate::Builder::finish`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("{count} decorator(s) left pending at the end of `{scope}`")]
    DanglingDecorators {
        scope: Cow<'static, str>,
        count: usize,
    },

    #[error("race `{name}` has no children")]
    EmptyRace { name: Cow<'static, str> },

    #[error("base tick for `{name}` must be given when the leaf is built")]
    LateBaseTick { name: Cow<'static, str> },
}
