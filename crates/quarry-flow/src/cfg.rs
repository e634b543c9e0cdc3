use quarry_hir::{ExprId, StmtId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

impl BlockId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Straight-line statements plus one terminator. Control-flow statements
/// never appear in `stmts`; they are encoded by terminators, except for
/// binding statements (`Let`, `Assign`, `Foreach` headers) which carry their
/// write effect here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub stmts: Vec<StmtId>,
    pub terminator: Terminator,
}

impl BasicBlock {
    pub fn successors(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.terminator.successors()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    /// Unconditional jump.
    Goto {
        target: BlockId,
        from: Option<StmtId>,
    },
    /// Jump to several possible targets at once; models exception edges from
    /// a `try` body into its handlers without a synthetic condition.
    Multi {
        targets: Vec<BlockId>,
        from: StmtId,
    },
    /// Two-way branch on a condition expression. Also used for loop headers,
    /// where `condition` is the loop condition (or the iterated expression
    /// for `foreach`).
    If {
        condition: ExprId,
        then_target: BlockId,
        else_target: BlockId,
        from: StmtId,
    },
    /// Multi-way branch on a scrutinee expression (`switch`).
    Switch {
        expression: ExprId,
        targets: Vec<BlockId>,
        from: StmtId,
    },
    Return {
        value: Option<ExprId>,
        from: StmtId,
    },
    /// `value` is `None` for a bare rethrow.
    Throw {
        value: Option<ExprId>,
        from: StmtId,
    },
    Exit,
}

impl Terminator {
    pub fn successors(&self) -> impl Iterator<Item = BlockId> + '_ {
        let (slice, pair): (&[BlockId], Option<[BlockId; 2]>) = match self {
            Terminator::Goto { target, .. } => (std::slice::from_ref(target), None),
            Terminator::If {
                then_target,
                else_target,
                ..
            } => (&[], Some([*then_target, *else_target])),
            Terminator::Multi { targets, .. } | Terminator::Switch { targets, .. } => {
                (targets.as_slice(), None)
            }
            Terminator::Return { .. } | Terminator::Throw { .. } | Terminator::Exit => (&[], None),
        };
        slice
            .iter()
            .copied()
            .chain(pair.into_iter().flatten())
    }

    #[must_use]
    pub fn from_stmt(&self) -> Option<StmtId> {
        match *self {
            Terminator::Goto { from, .. } => from,
            Terminator::If { from, .. }
            | Terminator::Switch { from, .. }
            | Terminator::Multi { from, .. }
            | Terminator::Return { from, .. }
            | Terminator::Throw { from, .. } => Some(from),
            Terminator::Exit => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlFlowGraph {
    pub entry: BlockId,
    pub blocks: Vec<BasicBlock>,
    preds: Vec<Vec<BlockId>>,
}

impl ControlFlowGraph {
    #[must_use]
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    #[must_use]
    pub fn predecessors(&self, id: BlockId) -> &[BlockId] {
        &self.preds[id.index()]
    }

    pub fn successors(&self, id: BlockId) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks[id.index()].successors()
    }

    #[must_use]
    pub fn reachable_blocks_with(&self, check_cancelled: &mut dyn FnMut()) -> Vec<bool> {
        let mut reachable = vec![false; self.blocks.len()];
        let mut stack = vec![self.entry];
        while let Some(bb) = stack.pop() {
            check_cancelled();
            if reachable[bb.index()] {
                continue;
            }
            reachable[bb.index()] = true;
            stack.extend(self.successors(bb));
        }
        reachable
    }
}

pub(crate) struct CfgBuilder {
    blocks: Vec<BasicBlock>,
}

impl CfgBuilder {
    pub(crate) fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub(crate) fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(BasicBlock {
            stmts: Vec::new(),
            terminator: Terminator::Exit,
        });
        id
    }

    pub(crate) fn push_stmt(&mut self, bb: BlockId, stmt: StmtId) {
        self.blocks[bb.index()].stmts.push(stmt);
    }

    pub(crate) fn set_terminator(&mut self, bb: BlockId, term: Terminator) {
        self.blocks[bb.index()].terminator = term;
    }

    pub(crate) fn build(self, entry: BlockId) -> ControlFlowGraph {
        // Predecessors are derived from final terminators in one pass.
        let mut preds: Vec<Vec<BlockId>> = vec![Vec::new(); self.blocks.len()];
        for (idx, bb) in self.blocks.iter().enumerate() {
            let from = BlockId(idx);
            for to in bb.successors() {
                preds[to.index()].push(from);
            }
        }

        ControlFlowGraph {
            entry,
            blocks: self.blocks,
            preds,
        }
    }
}
