//! Observation primitives for sapling trees.
//!
//! This crate is intentionally lightweight. Visualizers and history recorders consume
//! [`TraceEvent`]s through a [`TraceSink`]; the engine itself never reads them back.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{
    tags, NullTraceSink, SharedTraceSink, TraceEvent, TraceLog, TraceSink, VecTraceSink,
};
