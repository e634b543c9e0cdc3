//! Control-flow and data-flow analysis over the quarry-hir body IR.
//!
//! This crate is the "semantic data-flow oracle" the refactoring engine
//! consumes: CFG construction, backward liveness, and per-region fact
//! bundles ([`RegionFacts`]). It knows nothing about refactorings.

mod cfg;
mod flow;

pub use cfg::{BasicBlock, BlockId, ControlFlowGraph, Terminator};
pub use flow::{build_cfg_with, compute_liveness, region_facts, RegionFacts};

#[cfg(test)]
mod tests;
