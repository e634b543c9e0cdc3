//! Flow-oriented body IR for C# function bodies.
//!
//! [`body`] defines the IR; [`body_lowering`] produces it from syntax. The
//! IR feeds `quarry-flow`'s control-flow graph construction and data-flow
//! queries; it intentionally carries no type information.

pub mod body;
pub mod body_lowering;

pub use body::{Body, Expr, ExprId, ExprKind, Local, LocalId, LocalKind, Stmt, StmtId, StmtKind, SwitchArm};
pub use body_lowering::{lower_flow_body_with, lower_flow_statements_with};

#[cfg(test)]
mod tests;
