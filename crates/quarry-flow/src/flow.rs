use std::collections::{HashMap, HashSet};

use quarry_core::Span;
use quarry_hir::{Body, ExprId, ExprKind, LocalId, LocalKind, StmtId, StmtKind};

use crate::cfg::{BlockId, CfgBuilder, ControlFlowGraph, Terminator};

/// Build a control-flow graph for a lowered body.
pub fn build_cfg_with(body: &Body, check_cancelled: &mut dyn FnMut()) -> ControlFlowGraph {
    let mut builder = HirCfgBuilder {
        body,
        cfg: CfgBuilder::new(),
        loop_stack: Vec::new(),
        check_cancelled,
    };
    let entry = builder.cfg.new_block();
    let root = body.root();
    let _ = builder.build_stmt(root, entry);
    builder.cfg.build(entry)
}

#[derive(Debug, Clone, Copy)]
struct LoopContext {
    break_target: BlockId,
    continue_target: Option<BlockId>,
}

struct HirCfgBuilder<'a> {
    body: &'a Body,
    cfg: CfgBuilder,
    loop_stack: Vec<LoopContext>,
    check_cancelled: &'a mut dyn FnMut(),
}

impl HirCfgBuilder<'_> {
    fn build_seq(&mut self, stmts: &[StmtId], entry: BlockId) -> Option<BlockId> {
        let mut reachable_current: Option<BlockId> = Some(entry);
        let mut unreachable_current: Option<BlockId> = None;

        for &stmt in stmts {
            if let Some(cur) = reachable_current {
                reachable_current = self.build_stmt(stmt, cur);
                continue;
            }

            let cur = unreachable_current.unwrap_or_else(|| {
                let bb = self.cfg.new_block();
                unreachable_current = Some(bb);
                bb
            });

            unreachable_current = self.build_stmt(stmt, cur);
        }

        reachable_current
    }

    /// Lower `stmt` starting in `entry`; returns the block where control
    /// falls through, or `None` when the statement never falls through.
    fn build_stmt(&mut self, stmt: StmtId, entry: BlockId) -> Option<BlockId> {
        (self.check_cancelled)();
        let stmt_data = self.body.stmt(stmt);
        match &stmt_data.kind {
            StmtKind::Block(stmts) => self.build_seq(stmts, entry),

            StmtKind::Let { .. }
            | StmtKind::Assign { .. }
            | StmtKind::Expr(_)
            | StmtKind::Nop => {
                self.cfg.push_stmt(entry, stmt);
                Some(entry)
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let then_entry = self.cfg.new_block();
                let else_entry = self.cfg.new_block();
                let join = self.cfg.new_block();

                self.cfg.set_terminator(
                    entry,
                    Terminator::If {
                        condition: *condition,
                        then_target: then_entry,
                        else_target: else_entry,
                        from: stmt,
                    },
                );

                if let Some(end) = self.build_stmt(*then_branch, then_entry) {
                    self.cfg
                        .set_terminator(end, Terminator::Goto { target: join, from: None });
                }
                match else_branch {
                    Some(else_branch) => {
                        if let Some(end) = self.build_stmt(*else_branch, else_entry) {
                            self.cfg
                                .set_terminator(end, Terminator::Goto { target: join, from: None });
                        }
                    }
                    None => {
                        self.cfg
                            .set_terminator(else_entry, Terminator::Goto { target: join, from: None });
                    }
                }
                Some(join)
            }

            StmtKind::While { condition, body } => {
                let header = self.cfg.new_block();
                let body_entry = self.cfg.new_block();
                let join = self.cfg.new_block();

                self.cfg
                    .set_terminator(entry, Terminator::Goto { target: header, from: None });
                self.cfg.set_terminator(
                    header,
                    Terminator::If {
                        condition: *condition,
                        then_target: body_entry,
                        else_target: join,
                        from: stmt,
                    },
                );

                self.loop_stack.push(LoopContext {
                    break_target: join,
                    continue_target: Some(header),
                });
                if let Some(end) = self.build_stmt(*body, body_entry) {
                    self.cfg
                        .set_terminator(end, Terminator::Goto { target: header, from: None });
                }
                self.loop_stack.pop();
                Some(join)
            }

            StmtKind::DoWhile { body, condition } => {
                let body_entry = self.cfg.new_block();
                let cond_block = self.cfg.new_block();
                let join = self.cfg.new_block();

                self.cfg
                    .set_terminator(entry, Terminator::Goto { target: body_entry, from: None });
                self.cfg.set_terminator(
                    cond_block,
                    Terminator::If {
                        condition: *condition,
                        then_target: body_entry,
                        else_target: join,
                        from: stmt,
                    },
                );

                self.loop_stack.push(LoopContext {
                    break_target: join,
                    continue_target: Some(cond_block),
                });
                if let Some(end) = self.build_stmt(*body, body_entry) {
                    self.cfg
                        .set_terminator(end, Terminator::Goto { target: cond_block, from: None });
                }
                self.loop_stack.pop();
                Some(join)
            }

            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => {
                let mut current = entry;
                if let Some(init) = init {
                    match self.build_stmt(*init, current) {
                        Some(end) => current = end,
                        None => return None,
                    }
                }

                let header = self.cfg.new_block();
                let body_entry = self.cfg.new_block();
                let update_block = self.cfg.new_block();
                let join = self.cfg.new_block();

                self.cfg
                    .set_terminator(current, Terminator::Goto { target: header, from: None });
                match condition {
                    Some(condition) => self.cfg.set_terminator(
                        header,
                        Terminator::If {
                            condition: *condition,
                            then_target: body_entry,
                            else_target: join,
                            from: stmt,
                        },
                    ),
                    None => self
                        .cfg
                        .set_terminator(header, Terminator::Goto { target: body_entry, from: None }),
                }

                self.loop_stack.push(LoopContext {
                    break_target: join,
                    continue_target: Some(update_block),
                });
                if let Some(end) = self.build_stmt(*body, body_entry) {
                    self.cfg
                        .set_terminator(end, Terminator::Goto { target: update_block, from: None });
                }
                self.loop_stack.pop();

                let update_end = match update {
                    Some(update) => self.build_stmt(*update, update_block),
                    None => Some(update_block),
                };
                if let Some(end) = update_end {
                    self.cfg
                        .set_terminator(end, Terminator::Goto { target: header, from: None });
                }
                Some(join)
            }

            StmtKind::Foreach {
                iterable, body, ..
            } => {
                let header = self.cfg.new_block();
                let body_entry = self.cfg.new_block();
                let join = self.cfg.new_block();

                // The foreach statement itself sits in the header so the
                // iteration variable's per-iteration write is visible to the
                // liveness transfer function.
                self.cfg.push_stmt(header, stmt);
                self.cfg
                    .set_terminator(entry, Terminator::Goto { target: header, from: None });
                self.cfg.set_terminator(
                    header,
                    Terminator::If {
                        condition: *iterable,
                        then_target: body_entry,
                        else_target: join,
                        from: stmt,
                    },
                );

                self.loop_stack.push(LoopContext {
                    break_target: join,
                    continue_target: Some(header),
                });
                if let Some(end) = self.build_stmt(*body, body_entry) {
                    self.cfg
                        .set_terminator(end, Terminator::Goto { target: header, from: None });
                }
                self.loop_stack.pop();
                Some(join)
            }

            StmtKind::Switch { expression, arms } => {
                let join = self.cfg.new_block();
                let mut targets = Vec::with_capacity(arms.len() + 1);
                let mut has_default = false;

                // `break` inside a section leaves the switch; `continue`
                // still targets the enclosing loop.
                let outer_continue = self.loop_stack.last().and_then(|ctx| ctx.continue_target);
                self.loop_stack.push(LoopContext {
                    break_target: join,
                    continue_target: outer_continue,
                });

                for arm in arms {
                    let arm_entry = self.cfg.new_block();
                    targets.push(arm_entry);
                    has_default |= arm.is_default;
                    if let Some(end) = self.build_stmt(arm.body, arm_entry) {
                        self.cfg
                            .set_terminator(end, Terminator::Goto { target: join, from: None });
                    }
                }
                self.loop_stack.pop();

                if !has_default {
                    targets.push(join);
                }
                self.cfg.set_terminator(
                    entry,
                    Terminator::Switch {
                        expression: *expression,
                        targets,
                        from: stmt,
                    },
                );
                Some(join)
            }

            StmtKind::Try {
                body,
                catches,
                finally,
            } => {
                let body_entry = self.cfg.new_block();
                let mut catch_entries = Vec::with_capacity(catches.len());
                let join = self.cfg.new_block();

                for _ in catches {
                    catch_entries.push(self.cfg.new_block());
                }

                let mut targets = vec![body_entry];
                targets.extend(catch_entries.iter().copied());
                self.cfg
                    .set_terminator(entry, Terminator::Multi { targets, from: stmt });

                if let Some(end) = self.build_stmt(*body, body_entry) {
                    self.cfg
                        .set_terminator(end, Terminator::Goto { target: join, from: None });
                }
                for (catch, catch_entry) in catches.iter().zip(catch_entries) {
                    if let Some(end) = self.build_stmt(*catch, catch_entry) {
                        self.cfg
                            .set_terminator(end, Terminator::Goto { target: join, from: None });
                    }
                }

                match finally {
                    Some(finally) => {
                        let finally_end = self.build_stmt(*finally, join);
                        finally_end
                    }
                    None => Some(join),
                }
            }

            StmtKind::Return(value) => {
                self.cfg.set_terminator(
                    entry,
                    Terminator::Return {
                        value: *value,
                        from: stmt,
                    },
                );
                None
            }

            StmtKind::Throw(value) => {
                self.cfg.set_terminator(
                    entry,
                    Terminator::Throw {
                        value: *value,
                        from: stmt,
                    },
                );
                None
            }

            StmtKind::Break => {
                match self.loop_stack.last() {
                    Some(ctx) => {
                        let target = ctx.break_target;
                        self.cfg
                            .set_terminator(entry, Terminator::Goto { target, from: Some(stmt) });
                    }
                    // A break whose target is outside this body: flow simply
                    // leaves.
                    None => self.cfg.set_terminator(
                        entry,
                        Terminator::Return {
                            value: None,
                            from: stmt,
                        },
                    ),
                }
                None
            }

            StmtKind::Continue => {
                match self.loop_stack.last().and_then(|ctx| ctx.continue_target) {
                    Some(target) => {
                        self.cfg
                            .set_terminator(entry, Terminator::Goto { target, from: Some(stmt) });
                    }
                    None => self.cfg.set_terminator(
                        entry,
                        Terminator::Return {
                            value: None,
                            from: stmt,
                        },
                    ),
                }
                None
            }
        }
    }
}

// === Liveness ===

pub fn compute_liveness(
    body: &Body,
    cfg: &ControlFlowGraph,
    check_cancelled: &mut dyn FnMut(),
) -> (Vec<HashSet<LocalId>>, Vec<HashSet<LocalId>>) {
    let n = cfg.blocks.len();
    let mut live_in: Vec<HashSet<LocalId>> = vec![HashSet::new(); n];
    let mut live_out: Vec<HashSet<LocalId>> = vec![HashSet::new(); n];

    loop {
        check_cancelled();
        let mut changed = false;

        // Backward analysis; reverse order converges faster on structured code.
        for idx in (0..n).rev() {
            let bb_id = BlockId(idx);

            let mut out = HashSet::new();
            for succ in cfg.successors(bb_id) {
                out.extend(live_in[succ.index()].iter().copied());
            }

            let mut live = out.clone();
            add_terminator_uses(body, &cfg.block(bb_id).terminator, &mut live);

            for stmt in cfg.block(bb_id).stmts.iter().rev() {
                transfer_stmt_liveness(body, *stmt, &mut live);
            }

            if live != live_in[idx] {
                live_in[idx] = live;
                changed = true;
            }
            if out != live_out[idx] {
                live_out[idx] = out;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    (live_in, live_out)
}

fn transfer_stmt_liveness(body: &Body, stmt: StmtId, live: &mut HashSet<LocalId>) {
    match &body.stmt(stmt).kind {
        StmtKind::Let { local, initializer } => {
            live.remove(local);
            if let Some(init) = initializer {
                add_expr_uses(body, *init, live);
            }
        }
        StmtKind::Assign { target, value } => {
            live.remove(target);
            add_expr_uses(body, *value, live);
        }
        StmtKind::Expr(expr) => {
            add_expr_uses(body, *expr, live);
        }
        StmtKind::Foreach {
            local, iterable, ..
        } => {
            live.remove(local);
            add_expr_uses(body, *iterable, live);
        }
        StmtKind::Nop => {}
        // Structured statements never land inside a basic block.
        other => {
            debug_assert!(
                matches!(
                    other,
                    StmtKind::Block(_)
                        | StmtKind::If { .. }
                        | StmtKind::While { .. }
                        | StmtKind::DoWhile { .. }
                        | StmtKind::For { .. }
                        | StmtKind::Switch { .. }
                        | StmtKind::Try { .. }
                        | StmtKind::Return(_)
                        | StmtKind::Throw(_)
                        | StmtKind::Break
                        | StmtKind::Continue
                ),
                "unexpected statement in basic block: {other:?}"
            );
        }
    }
}

fn add_terminator_uses(body: &Body, term: &Terminator, live: &mut HashSet<LocalId>) {
    match term {
        Terminator::If { condition, .. } => add_expr_uses(body, *condition, live),
        Terminator::Switch { expression, .. } => add_expr_uses(body, *expression, live),
        Terminator::Return { value, .. } | Terminator::Throw { value, .. } => {
            if let Some(value) = value {
                add_expr_uses(body, *value, live);
            }
        }
        Terminator::Goto { .. } | Terminator::Multi { .. } | Terminator::Exit => {}
    }
}

fn add_expr_uses(body: &Body, expr: ExprId, live: &mut HashSet<LocalId>) {
    match &body.expr(expr).kind {
        ExprKind::Local(local) => {
            live.insert(*local);
        }
        ExprKind::Opaque | ExprKind::This => {}
        ExprKind::New { args } => {
            for arg in args {
                add_expr_uses(body, *arg, live);
            }
        }
        ExprKind::Unary { expr } | ExprKind::Await { expr } => add_expr_uses(body, *expr, live),
        ExprKind::Binary { lhs, rhs } => {
            add_expr_uses(body, *lhs, live);
            add_expr_uses(body, *rhs, live);
        }
        ExprKind::Conditional {
            condition,
            then_expr,
            else_expr,
        } => {
            add_expr_uses(body, *condition, live);
            add_expr_uses(body, *then_expr, live);
            add_expr_uses(body, *else_expr, live);
        }
        ExprKind::FieldAccess { receiver } => add_expr_uses(body, *receiver, live),
        ExprKind::Index { receiver, args } => {
            add_expr_uses(body, *receiver, live);
            for arg in args {
                add_expr_uses(body, *arg, live);
            }
        }
        ExprKind::Call { receiver, args } => {
            if let Some(recv) = receiver {
                add_expr_uses(body, *recv, live);
            }
            for arg in args {
                add_expr_uses(body, *arg, live);
            }
        }
        ExprKind::Tuple { elements } => {
            for element in elements {
                add_expr_uses(body, *element, live);
            }
        }
        ExprKind::Assign { value, .. } => {
            // Expression-position writes do not kill; the embedded value is
            // read. Compound reads are already folded into `value`.
            add_expr_uses(body, *value, live);
        }
        ExprKind::ByRefArg { target, is_out } => {
            // `ref x` reads and writes; `out x` only writes.
            if let (Some(target), false) = (target, is_out) {
                live.insert(*target);
            }
        }
        ExprKind::Invalid { children } => {
            for child in children {
                add_expr_uses(body, *child, live);
            }
        }
    }
}

// === Region facts (the data-flow oracle consumed by refactorings) ===

/// Data-flow facts about a contiguous source region of a body, in the shape
/// the Extract Method analyzer consumes: what is read and written inside,
/// what stays live after, what the region definitely assigns, and where each
/// local is first touched.
#[derive(Debug, Default)]
pub struct RegionFacts {
    /// Locals read inside the region, ordered by first read position.
    pub reads_inside: Vec<LocalId>,
    pub writes_inside: HashSet<LocalId>,
    /// Locals whose value is still needed on some path after the region.
    pub live_after: HashSet<LocalId>,
    /// Locals assigned on every fall-through path through the region.
    pub always_assigned: HashSet<LocalId>,
    /// Locals whose declaration lies inside the region.
    pub declared_inside: HashSet<LocalId>,
    /// Byte offset of the first read of each local inside the region.
    pub first_read: HashMap<LocalId, usize>,
    /// Byte offset of the first write of each local inside the region.
    pub first_write: HashMap<LocalId, usize>,
}

pub fn region_facts(body: &Body, region: Span, check_cancelled: &mut dyn FnMut()) -> RegionFacts {
    let mut facts = RegionFacts::default();

    collect_region_accesses(body, body.root(), region, &mut facts, check_cancelled);

    // Order reads by first-use position.
    let RegionFacts {
        reads_inside,
        first_read,
        ..
    } = &mut facts;
    reads_inside.sort_by_key(|local| first_read.get(local).copied().unwrap_or(usize::MAX));

    for (idx, local) in body.locals().iter().enumerate() {
        if local.kind == LocalKind::Local && local.span.within(region) {
            facts.declared_inside.insert(LocalId::from_index(idx));
        }
    }

    let cfg = build_cfg_with(body, check_cancelled);
    let (_live_in, live_out) = compute_liveness(body, &cfg, check_cancelled);
    facts.live_after = live_after_region(body, &cfg, &live_out, region);

    let mut assigned = HashSet::new();
    must_assign(body, body.root(), region, &mut assigned);
    facts.always_assigned = assigned;

    facts
}

fn record_read(facts: &mut RegionFacts, local: LocalId, pos: usize) {
    let entry = facts.first_read.entry(local).or_insert(pos);
    if pos < *entry {
        *entry = pos;
    }
    if !facts.reads_inside.contains(&local) {
        facts.reads_inside.push(local);
    }
}

fn record_write(facts: &mut RegionFacts, local: LocalId, pos: usize) {
    let entry = facts.first_write.entry(local).or_insert(pos);
    if pos < *entry {
        *entry = pos;
    }
    facts.writes_inside.insert(local);
}

fn collect_region_accesses(
    body: &Body,
    stmt_id: StmtId,
    region: Span,
    facts: &mut RegionFacts,
    check_cancelled: &mut dyn FnMut(),
) {
    check_cancelled();
    let stmt = body.stmt(stmt_id);
    if !stmt.span.intersects(region) {
        return;
    }
    let contained = stmt.span.within(region);

    match &stmt.kind {
        StmtKind::Block(stmts) => {
            for child in stmts {
                collect_region_accesses(body, *child, region, facts, check_cancelled);
            }
        }
        StmtKind::Let { local, initializer } => {
            if let Some(init) = initializer {
                collect_expr_accesses(body, *init, region, facts);
            }
            if contained {
                // The binding happens after the initializer is evaluated.
                record_write(facts, *local, stmt.span.end);
            }
        }
        StmtKind::Assign { target, value } => {
            collect_expr_accesses(body, *value, region, facts);
            if contained {
                record_write(facts, *target, stmt.span.end);
            }
        }
        StmtKind::Expr(expr) => {
            collect_expr_accesses(body, *expr, region, facts);
        }
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            collect_expr_accesses(body, *condition, region, facts);
            collect_region_accesses(body, *then_branch, region, facts, check_cancelled);
            if let Some(else_branch) = else_branch {
                collect_region_accesses(body, *else_branch, region, facts, check_cancelled);
            }
        }
        StmtKind::While { condition, body: inner } => {
            collect_expr_accesses(body, *condition, region, facts);
            collect_region_accesses(body, *inner, region, facts, check_cancelled);
        }
        StmtKind::DoWhile { body: inner, condition } => {
            collect_region_accesses(body, *inner, region, facts, check_cancelled);
            collect_expr_accesses(body, *condition, region, facts);
        }
        StmtKind::For {
            init,
            condition,
            update,
            body: inner,
        } => {
            if let Some(init) = init {
                collect_region_accesses(body, *init, region, facts, check_cancelled);
            }
            if let Some(condition) = condition {
                collect_expr_accesses(body, *condition, region, facts);
            }
            if let Some(update) = update {
                collect_region_accesses(body, *update, region, facts, check_cancelled);
            }
            collect_region_accesses(body, *inner, region, facts, check_cancelled);
        }
        StmtKind::Foreach {
            local,
            iterable,
            body: inner,
        } => {
            collect_expr_accesses(body, *iterable, region, facts);
            if contained {
                record_write(facts, *local, stmt.span.start);
            }
            collect_region_accesses(body, *inner, region, facts, check_cancelled);
        }
        StmtKind::Switch { expression, arms } => {
            collect_expr_accesses(body, *expression, region, facts);
            for arm in arms {
                for value in &arm.values {
                    collect_expr_accesses(body, *value, region, facts);
                }
            }
            for arm in arms {
                collect_region_accesses(body, arm.body, region, facts, check_cancelled);
            }
        }
        StmtKind::Try {
            body: inner,
            catches,
            finally,
        } => {
            collect_region_accesses(body, *inner, region, facts, check_cancelled);
            for catch in catches {
                collect_region_accesses(body, *catch, region, facts, check_cancelled);
            }
            if let Some(finally) = finally {
                collect_region_accesses(body, *finally, region, facts, check_cancelled);
            }
        }
        StmtKind::Return(value) | StmtKind::Throw(value) => {
            if let Some(value) = value {
                collect_expr_accesses(body, *value, region, facts);
            }
        }
        StmtKind::Break | StmtKind::Continue | StmtKind::Nop => {}
    }
}

fn collect_expr_accesses(body: &Body, expr_id: ExprId, region: Span, facts: &mut RegionFacts) {
    let expr = body.expr(expr_id);
    // Descend through partially-covered expressions; only accesses whose own
    // span lies inside the region are recorded.
    if !expr.span.intersects(region) {
        return;
    }
    let inside = expr.span.within(region);

    match &expr.kind {
        ExprKind::Local(local) => {
            if inside {
                record_read(facts, *local, expr.span.start);
            }
        }
        ExprKind::Opaque | ExprKind::This => {}
        ExprKind::New { args } => {
            for arg in args {
                collect_expr_accesses(body, *arg, region, facts);
            }
        }
        ExprKind::Unary { expr: inner } | ExprKind::Await { expr: inner } => {
            collect_expr_accesses(body, *inner, region, facts);
        }
        ExprKind::Binary { lhs, rhs } => {
            collect_expr_accesses(body, *lhs, region, facts);
            collect_expr_accesses(body, *rhs, region, facts);
        }
        ExprKind::Conditional {
            condition,
            then_expr,
            else_expr,
        } => {
            collect_expr_accesses(body, *condition, region, facts);
            collect_expr_accesses(body, *then_expr, region, facts);
            collect_expr_accesses(body, *else_expr, region, facts);
        }
        ExprKind::FieldAccess { receiver } => collect_expr_accesses(body, *receiver, region, facts),
        ExprKind::Index { receiver, args } => {
            collect_expr_accesses(body, *receiver, region, facts);
            for arg in args {
                collect_expr_accesses(body, *arg, region, facts);
            }
        }
        ExprKind::Call { receiver, args } => {
            if let Some(recv) = receiver {
                collect_expr_accesses(body, *recv, region, facts);
            }
            for arg in args {
                collect_expr_accesses(body, *arg, region, facts);
            }
        }
        ExprKind::Tuple { elements } => {
            for element in elements {
                collect_expr_accesses(body, *element, region, facts);
            }
        }
        ExprKind::Assign { target, value } => {
            collect_expr_accesses(body, *value, region, facts);
            if inside {
                if let Some(target) = target {
                    record_write(facts, *target, expr.span.end);
                }
            }
        }
        ExprKind::ByRefArg { target, is_out } => {
            if inside {
                if let Some(target) = target {
                    if !is_out {
                        record_read(facts, *target, expr.span.start);
                    }
                    record_write(facts, *target, expr.span.start);
                }
            }
        }
        ExprKind::Invalid { children } => {
            for child in children {
                collect_expr_accesses(body, *child, region, facts);
            }
        }
    }
}

// === Live-after-region ===

#[derive(Debug, Clone, Copy)]
enum StmtLocation {
    InBlock { block: BlockId, index: usize },
    Terminator { block: BlockId },
}

fn live_after_region(
    body: &Body,
    cfg: &ControlFlowGraph,
    live_out: &[HashSet<LocalId>],
    region: Span,
) -> HashSet<LocalId> {
    let locations = collect_stmt_locations(cfg);

    let Some(last_stmt) = last_stmt_in_region(body, region, &locations) else {
        return HashSet::new();
    };
    let Some(location) = locations.get(&last_stmt).copied() else {
        return HashSet::new();
    };

    match location {
        StmtLocation::InBlock { block, index } => {
            let bb = cfg.block(block);
            let mut live = live_out
                .get(block.index())
                .cloned()
                .unwrap_or_default();
            add_terminator_uses(body, &bb.terminator, &mut live);

            // Walk the statements *after* the selected one backwards.
            for stmt in bb.stmts.iter().skip(index + 1).rev() {
                transfer_stmt_liveness(body, *stmt, &mut live);
            }

            live
        }
        StmtLocation::Terminator { block } => live_out
            .get(block.index())
            .cloned()
            .unwrap_or_default(),
    }
}

fn collect_stmt_locations(cfg: &ControlFlowGraph) -> HashMap<StmtId, StmtLocation> {
    let mut out = HashMap::new();
    for (idx, bb) in cfg.blocks.iter().enumerate() {
        let bb_id = BlockId(idx);
        for (pos, stmt) in bb.stmts.iter().enumerate() {
            out.entry(*stmt).or_insert(StmtLocation::InBlock {
                block: bb_id,
                index: pos,
            });
        }
        if let Some(from) = bb.terminator.from_stmt() {
            out.entry(from)
                .or_insert(StmtLocation::Terminator { block: bb_id });
        }
    }
    out
}

fn last_stmt_in_region(
    body: &Body,
    region: Span,
    locations: &HashMap<StmtId, StmtLocation>,
) -> Option<StmtId> {
    let mut best: Option<(usize, usize, usize, StmtId)> = None; // (end, start, stmt_idx, id)

    for stmt_id in locations.keys().copied() {
        let span = body.stmt(stmt_id).span;
        if !span.within(region) {
            continue;
        }
        let key = (span.end, span.start, stmt_id.index());
        if best
            .as_ref()
            .is_none_or(|(end, start, idx, _)| key > (*end, *start, *idx))
        {
            best = Some((key.0, key.1, key.2, stmt_id));
        }
    }

    best.map(|(_, _, _, id)| id)
}

// === Definite assignment over the region (structural must-assign) ===

/// Conservatively collect locals assigned on every fall-through path through
/// the portion of `stmt` inside the region.
fn must_assign(body: &Body, stmt_id: StmtId, region: Span, assigned: &mut HashSet<LocalId>) {
    let stmt = body.stmt(stmt_id);
    if !stmt.span.intersects(region) {
        return;
    }
    let contained = stmt.span.within(region);

    match &stmt.kind {
        StmtKind::Block(stmts) => {
            for child in stmts {
                must_assign(body, *child, region, assigned);
            }
        }
        StmtKind::Let { local, initializer } => {
            if contained && initializer.is_some() {
                assigned.insert(*local);
            }
        }
        StmtKind::Assign { target, .. } => {
            if contained {
                assigned.insert(*target);
            }
        }
        StmtKind::Expr(expr) => {
            if contained {
                must_assign_expr(body, *expr, assigned);
            }
        }
        StmtKind::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        } => {
            let mut then_set = HashSet::new();
            let mut else_set = HashSet::new();
            must_assign(body, *then_branch, region, &mut then_set);
            must_assign(body, *else_branch, region, &mut else_set);
            assigned.extend(then_set.intersection(&else_set).copied());
        }
        // Zero-iteration paths exist: nothing is guaranteed.
        StmtKind::If { .. }
        | StmtKind::While { .. }
        | StmtKind::For { .. }
        | StmtKind::Foreach { .. } => {}
        // The body runs at least once.
        StmtKind::DoWhile { body: inner, .. } => must_assign(body, *inner, region, assigned),
        StmtKind::Switch { arms, expression: _ } => {
            let mut common: Option<HashSet<LocalId>> = None;
            let mut has_default = false;
            for arm in arms {
                has_default |= arm.is_default;
                let mut arm_set = HashSet::new();
                must_assign(body, arm.body, region, &mut arm_set);
                common = Some(match common {
                    Some(prev) => prev.intersection(&arm_set).copied().collect(),
                    None => arm_set,
                });
            }
            if has_default {
                if let Some(common) = common {
                    assigned.extend(common);
                }
            }
        }
        // Exceptional edges make try/catch guarantees void; `finally` always
        // runs.
        StmtKind::Try { finally, .. } => {
            if let Some(finally) = finally {
                must_assign(body, *finally, region, assigned);
            }
        }
        StmtKind::Return(_)
        | StmtKind::Throw(_)
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Nop => {}
    }
}

fn must_assign_expr(body: &Body, expr_id: ExprId, assigned: &mut HashSet<LocalId>) {
    match &body.expr(expr_id).kind {
        ExprKind::Assign {
            target: Some(target),
            ..
        } => {
            assigned.insert(*target);
        }
        ExprKind::ByRefArg {
            target: Some(target),
            ..
        } => {
            assigned.insert(*target);
        }
        ExprKind::Call { receiver, args } => {
            if let Some(recv) = receiver {
                must_assign_expr(body, *recv, assigned);
            }
            for arg in args {
                must_assign_expr(body, *arg, assigned);
            }
        }
        ExprKind::New { args } => {
            for arg in args {
                must_assign_expr(body, *arg, assigned);
            }
        }
        ExprKind::Unary { expr } | ExprKind::Await { expr } => {
            must_assign_expr(body, *expr, assigned)
        }
        ExprKind::Binary { lhs, rhs } => {
            must_assign_expr(body, *lhs, assigned);
            must_assign_expr(body, *rhs, assigned);
        }
        _ => {}
    }
}
