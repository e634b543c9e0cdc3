//! Flow-oriented method-body IR.
//!
//! A [`Body`] is an arena of statements and expressions lowered from one
//! function-shaped syntax node (method, constructor, accessor, local
//! function, or the top-level statement list). It models exactly what the
//! control-flow and data-flow passes need: local reads/writes, structured
//! control flow, and spans back into the source. Everything else — types,
//! member resolution, operator semantics — is deliberately absent.

use quarry_core::{Name, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(u32);

impl LocalId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Reconstruct an id from an index into [`Body::locals`].
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StmtId(u32);

impl StmtId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalKind {
    /// Declared in the enclosing function's parameter list.
    Param,
    /// Declared by a statement in the body (including `foreach`/`catch`/
    /// `using`/`fixed` bindings and `out var` declarations).
    Local,
}

/// A local variable or parameter. `span` is the declaring name token, which
/// doubles as the key for looking up the declared type text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Local {
    pub name: Name,
    pub kind: LocalKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchArm {
    /// Case label expressions; empty for `default:`.
    pub values: Vec<ExprId>,
    pub body: StmtId,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    Block(Vec<StmtId>),
    Let {
        local: LocalId,
        initializer: Option<ExprId>,
    },
    Assign {
        target: LocalId,
        value: ExprId,
    },
    Expr(ExprId),
    If {
        condition: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    While {
        condition: ExprId,
        body: StmtId,
    },
    DoWhile {
        body: StmtId,
        condition: ExprId,
    },
    For {
        init: Option<StmtId>,
        condition: Option<ExprId>,
        update: Option<StmtId>,
        body: StmtId,
    },
    Foreach {
        local: LocalId,
        iterable: ExprId,
        body: StmtId,
    },
    Switch {
        expression: ExprId,
        arms: Vec<SwitchArm>,
    },
    Try {
        body: StmtId,
        catches: Vec<StmtId>,
        finally: Option<StmtId>,
    },
    Return(Option<ExprId>),
    /// `Throw(None)` is a bare rethrow.
    Throw(Option<ExprId>),
    Break,
    Continue,
    Nop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    /// A name bound to a local or parameter of this body.
    Local(LocalId),
    /// Literals and names that do not resolve to a local (fields, types,
    /// external members). Opaque to flow analysis.
    Opaque,
    This,
    New {
        args: Vec<ExprId>,
    },
    Unary {
        expr: ExprId,
    },
    Binary {
        lhs: ExprId,
        rhs: ExprId,
    },
    Conditional {
        condition: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
    },
    FieldAccess {
        receiver: ExprId,
    },
    Index {
        receiver: ExprId,
        args: Vec<ExprId>,
    },
    Call {
        receiver: Option<ExprId>,
        args: Vec<ExprId>,
    },
    Await {
        expr: ExprId,
    },
    Tuple {
        elements: Vec<ExprId>,
    },
    /// Embedded assignment (`(x = e)`, `x += e` in expression position).
    /// A compound assignment's read of the target is modeled by `value`.
    Assign {
        target: Option<LocalId>,
        value: ExprId,
    },
    /// `ref x` / `out x` argument; writes (and for `ref`, reads) the local.
    ByRefArg {
        target: Option<LocalId>,
        is_out: bool,
    },
    /// Anything lowering does not understand; children keep flow facts
    /// best-effort.
    Invalid {
        children: Vec<ExprId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Body {
    locals: Vec<Local>,
    stmts: Vec<Stmt>,
    exprs: Vec<Expr>,
    root: Option<StmtId>,
}

impl Body {
    #[must_use]
    pub fn locals(&self) -> &[Local] {
        &self.locals
    }

    #[must_use]
    pub fn local(&self, id: LocalId) -> &Local {
        &self.locals[id.index()]
    }

    #[must_use]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[must_use]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[must_use]
    pub fn root(&self) -> StmtId {
        self.root.expect("body has been lowered")
    }

    pub fn stmt_ids(&self) -> impl Iterator<Item = StmtId> {
        (0..self.stmts.len()).map(StmtId::new)
    }

    pub fn expr_ids(&self) -> impl Iterator<Item = ExprId> {
        (0..self.exprs.len()).map(ExprId::new)
    }

    pub(crate) fn alloc_local(&mut self, local: Local) -> LocalId {
        let id = LocalId::new(self.locals.len());
        self.locals.push(local);
        id
    }

    pub(crate) fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(self.stmts.len());
        self.stmts.push(stmt);
        id
    }

    pub(crate) fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(self.exprs.len());
        self.exprs.push(expr);
        id
    }

    pub(crate) fn set_root(&mut self, root: StmtId) {
        self.root = Some(root);
    }

    /// Find a local by name, honoring shadowing by preferring the latest
    /// declaration whose span starts before `use_start`.
    #[must_use]
    pub fn resolve_local(&self, name: &str, use_start: usize) -> Option<LocalId> {
        let mut best: Option<LocalId> = None;
        for (idx, local) in self.locals.iter().enumerate() {
            if local.name.as_str() != name {
                continue;
            }
            if local.kind == LocalKind::Local && local.span.start > use_start {
                continue;
            }
            match best {
                Some(prev) if self.locals[prev.index()].span.start >= local.span.start => {}
                _ => best = Some(LocalId::new(idx)),
            }
        }
        best
    }
}
