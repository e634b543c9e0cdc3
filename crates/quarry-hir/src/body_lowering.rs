//! Lowering from the syntax tree to the flow body IR.
//!
//! Lowering is name-based: an identifier that matches an in-scope local or
//! parameter lowers to [`ExprKind::Local`]; everything else is opaque. The
//! lowerer never fails — constructs it does not understand become
//! [`ExprKind::Invalid`] wrappers around their lowered children so data-flow
//! facts degrade gracefully instead of disappearing.

use std::collections::HashMap;

use quarry_core::{Name, Span};
use quarry_syntax::ast::{self, AstNode};
use quarry_syntax::{SyntaxNode, SyntaxToken};

use crate::body::{Body, Expr, ExprId, ExprKind, Local, LocalId, LocalKind, Stmt, StmtId, StmtKind, SwitchArm};

/// Lower a function body block. `params` are the enclosing function's
/// parameters as `(name, name-token-span)` pairs.
pub fn lower_flow_body_with(
    block: &ast::Block,
    params: Vec<(Name, Span)>,
    check_cancelled: &mut dyn FnMut(),
) -> Body {
    let stmts: Vec<ast::Statement> = block.statements().collect();
    lower_flow_statements_with(&stmts, node_span(block.syntax()), params, check_cancelled)
}

/// Lower a free-standing statement list (top-level statements).
pub fn lower_flow_statements_with(
    stmts: &[ast::Statement],
    span: Span,
    params: Vec<(Name, Span)>,
    check_cancelled: &mut dyn FnMut(),
) -> Body {
    let mut lowerer = Lowerer {
        body: Body::default(),
        scopes: vec![HashMap::new()],
        check_cancelled,
    };
    for (name, span) in params {
        let id = lowerer.body.alloc_local(Local {
            name: name.clone(),
            kind: LocalKind::Param,
            span,
        });
        lowerer.bind(name.as_str(), id);
    }

    let mut lowered = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        lowered.push(lowerer.lower_stmt(stmt));
    }
    let root = lowerer.body.alloc_stmt(Stmt {
        kind: StmtKind::Block(lowered),
        span,
    });
    lowerer.body.set_root(root);
    lowerer.body
}

fn node_span(node: &SyntaxNode) -> Span {
    let range = node.text_range();
    Span::new(u32::from(range.start()) as usize, u32::from(range.end()) as usize)
}

fn token_span(token: &SyntaxToken) -> Span {
    let range = token.text_range();
    Span::new(u32::from(range.start()) as usize, u32::from(range.end()) as usize)
}

struct Lowerer<'a> {
    body: Body,
    scopes: Vec<HashMap<String, LocalId>>,
    check_cancelled: &'a mut dyn FnMut(),
}

impl Lowerer<'_> {
    fn bind(&mut self, name: &str, id: LocalId) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name.to_string(), id);
    }

    fn resolve(&self, name: &str) -> Option<LocalId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    fn declare(&mut self, token: &SyntaxToken) -> LocalId {
        let name = Name::new(token.text());
        let id = self.body.alloc_local(Local {
            name: name.clone(),
            kind: LocalKind::Local,
            span: token_span(token),
        });
        self.bind(name.as_str(), id);
        id
    }

    fn stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        self.body.alloc_stmt(Stmt { kind, span })
    }

    fn expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.body.alloc_expr(Expr { kind, span })
    }

    fn lower_stmt(&mut self, stmt: &ast::Statement) -> StmtId {
        (self.check_cancelled)();
        let span = node_span(stmt.syntax());
        match stmt {
            ast::Statement::Block(block) => self.lower_block(block),
            ast::Statement::LocalDeclarationStatement(decl) => {
                let mut lets = Vec::new();
                if let Some(list) = decl.declarator_list() {
                    for declarator in list.declarators() {
                        let initializer = declarator
                            .initializer()
                            .map(|expr| self.lower_expr(&expr));
                        let Some(name_tok) = declarator.name_token() else {
                            continue;
                        };
                        let local = self.declare(&name_tok);
                        lets.push(self.stmt(
                            StmtKind::Let { local, initializer },
                            node_span(declarator.syntax()),
                        ));
                    }
                }
                match lets.len() {
                    1 => lets[0],
                    _ => self.stmt(StmtKind::Block(lets), span),
                }
            }
            ast::Statement::ExpressionStatement(expr_stmt) => {
                match expr_stmt.expression() {
                    Some(expr) => self.lower_expr_statement(&expr, span),
                    None => self.stmt(StmtKind::Nop, span),
                }
            }
            ast::Statement::IfStatement(if_stmt) => {
                let condition = self.lower_opt_expr(if_stmt.condition(), span);
                let then_branch = self.lower_opt_stmt(if_stmt.then_branch(), span);
                let else_branch = if_stmt.else_branch().map(|s| self.lower_stmt(&s));
                self.stmt(
                    StmtKind::If {
                        condition,
                        then_branch,
                        else_branch,
                    },
                    span,
                )
            }
            ast::Statement::WhileStatement(while_stmt) => {
                let condition = self.lower_opt_expr(while_stmt.condition(), span);
                let body = self.lower_opt_stmt(while_stmt.body(), span);
                self.stmt(StmtKind::While { condition, body }, span)
            }
            ast::Statement::DoWhileStatement(do_stmt) => {
                let body = self.lower_opt_stmt(do_stmt.body(), span);
                let condition = self.lower_opt_expr(do_stmt.condition(), span);
                self.stmt(StmtKind::DoWhile { body, condition }, span)
            }
            ast::Statement::ForStatement(for_stmt) => self.lower_for(for_stmt, span),
            ast::Statement::ForeachStatement(foreach) => {
                let iterable = self.lower_opt_expr(foreach.expression(), span);
                self.scopes.push(HashMap::new());
                let local = match foreach.name_token() {
                    Some(tok) => self.declare(&tok),
                    None => self.body.alloc_local(Local {
                        name: Name::new("<missing>"),
                        kind: LocalKind::Local,
                        span,
                    }),
                };
                let body = self.lower_opt_stmt(foreach.body(), span);
                self.scopes.pop();
                self.stmt(
                    StmtKind::Foreach {
                        local,
                        iterable,
                        body,
                    },
                    span,
                )
            }
            ast::Statement::SwitchStatement(switch) => {
                let expression = self.lower_opt_expr(switch.expression(), span);
                let mut arms = Vec::new();
                for section in switch.sections() {
                    let mut values = Vec::new();
                    let mut is_default = false;
                    for label in section.labels() {
                        if label.is_default() {
                            is_default = true;
                        } else if let Some(expr) = label.expression() {
                            values.push(self.lower_expr(&expr));
                        }
                    }
                    self.scopes.push(HashMap::new());
                    let stmts: Vec<StmtId> = section
                        .statements()
                        .map(|s| self.lower_stmt(&s))
                        .collect();
                    self.scopes.pop();
                    let body = self.stmt(StmtKind::Block(stmts), node_span(section.syntax()));
                    arms.push(SwitchArm {
                        values,
                        body,
                        is_default,
                    });
                }
                self.stmt(StmtKind::Switch { expression, arms }, span)
            }
            ast::Statement::TryStatement(try_stmt) => {
                let body = match try_stmt.block() {
                    Some(block) => self.lower_block(&block),
                    None => self.stmt(StmtKind::Nop, span),
                };
                let mut catches = Vec::new();
                for catch in try_stmt.catch_clauses() {
                    self.scopes.push(HashMap::new());
                    let mut stmts = Vec::new();
                    if let Some(name_tok) = catch.name_token() {
                        let local = self.declare(&name_tok);
                        stmts.push(self.stmt(
                            StmtKind::Let {
                                local,
                                initializer: None,
                            },
                            token_span(&name_tok),
                        ));
                    }
                    if let Some(block) = catch.block() {
                        stmts.push(self.lower_block(&block));
                    }
                    self.scopes.pop();
                    catches.push(self.stmt(StmtKind::Block(stmts), node_span(catch.syntax())));
                }
                let finally = try_stmt
                    .finally_clause()
                    .and_then(|f| f.block())
                    .map(|block| self.lower_block(&block));
                self.stmt(
                    StmtKind::Try {
                        body,
                        catches,
                        finally,
                    },
                    span,
                )
            }
            ast::Statement::UsingStatement(using) => {
                self.scopes.push(HashMap::new());
                let mut stmts = Vec::new();
                if let Some(list) = using.declarator_list() {
                    for declarator in list.declarators() {
                        let initializer = declarator
                            .initializer()
                            .map(|expr| self.lower_expr(&expr));
                        if let Some(name_tok) = declarator.name_token() {
                            let local = self.declare(&name_tok);
                            stmts.push(self.stmt(
                                StmtKind::Let { local, initializer },
                                node_span(declarator.syntax()),
                            ));
                        }
                    }
                } else if let Some(expr) = using.expression() {
                    let lowered = self.lower_expr(&expr);
                    stmts.push(self.stmt(StmtKind::Expr(lowered), span));
                }
                if let Some(body) = using.body() {
                    stmts.push(self.lower_stmt(&body));
                }
                self.scopes.pop();
                self.stmt(StmtKind::Block(stmts), span)
            }
            ast::Statement::FixedStatement(fixed) => {
                self.scopes.push(HashMap::new());
                let mut stmts = Vec::new();
                if let Some(list) = fixed.declarator_list() {
                    for declarator in list.declarators() {
                        let initializer = declarator
                            .initializer()
                            .map(|expr| self.lower_expr(&expr));
                        if let Some(name_tok) = declarator.name_token() {
                            let local = self.declare(&name_tok);
                            stmts.push(self.stmt(
                                StmtKind::Let { local, initializer },
                                node_span(declarator.syntax()),
                            ));
                        }
                    }
                }
                if let Some(body) = fixed.body() {
                    stmts.push(self.lower_stmt(&body));
                }
                self.scopes.pop();
                self.stmt(StmtKind::Block(stmts), span)
            }
            ast::Statement::LockStatement(lock) => {
                let mut stmts = Vec::new();
                if let Some(expr) = lock.expression() {
                    let lowered = self.lower_expr(&expr);
                    stmts.push(self.stmt(StmtKind::Expr(lowered), span));
                }
                if let Some(body) = lock.body() {
                    stmts.push(self.lower_stmt(&body));
                }
                self.stmt(StmtKind::Block(stmts), span)
            }
            ast::Statement::CheckedStatement(checked) => match checked.block() {
                Some(block) => self.lower_block(&block),
                None => self.stmt(StmtKind::Nop, span),
            },
            ast::Statement::UnsafeStatement(unsafe_stmt) => match unsafe_stmt.block() {
                Some(block) => self.lower_block(&block),
                None => self.stmt(StmtKind::Nop, span),
            },
            ast::Statement::ReturnStatement(ret) => {
                let value = ret.expression().map(|expr| self.lower_expr(&expr));
                self.stmt(StmtKind::Return(value), span)
            }
            ast::Statement::YieldStatement(yield_stmt) => {
                // `yield` terminates flow from this body's perspective; the
                // selection validator rejects selections containing it long
                // before flow facts matter.
                let value = yield_stmt.expression().map(|expr| self.lower_expr(&expr));
                self.stmt(StmtKind::Return(value), span)
            }
            ast::Statement::ThrowStatement(throw) => {
                let value = throw.expression().map(|expr| self.lower_expr(&expr));
                self.stmt(StmtKind::Throw(value), span)
            }
            ast::Statement::BreakStatement(_) => self.stmt(StmtKind::Break, span),
            ast::Statement::ContinueStatement(_) => self.stmt(StmtKind::Continue, span),
            ast::Statement::LocalFunctionStatement(_) => {
                // Local functions have their own body; the statement itself
                // transfers no control and touches no locals at its site.
                self.stmt(StmtKind::Nop, span)
            }
            ast::Statement::EmptyStatement(_) => self.stmt(StmtKind::Nop, span),
        }
    }

    fn lower_block(&mut self, block: &ast::Block) -> StmtId {
        self.scopes.push(HashMap::new());
        let stmts: Vec<StmtId> = block.statements().map(|s| self.lower_stmt(&s)).collect();
        self.scopes.pop();
        self.stmt(StmtKind::Block(stmts), node_span(block.syntax()))
    }

    fn lower_for(&mut self, for_stmt: &ast::ForStatement, span: Span) -> StmtId {
        self.scopes.push(HashMap::new());
        let header = for_stmt.header();

        let init = header.as_ref().and_then(|header| {
            if header.has_declaration() {
                let mut lets = Vec::new();
                if let Some(list) = header.declarator_list() {
                    for declarator in list.declarators() {
                        let initializer = declarator
                            .initializer()
                            .map(|expr| self.lower_expr(&expr));
                        if let Some(name_tok) = declarator.name_token() {
                            let local = self.declare(&name_tok);
                            lets.push(self.stmt(
                                StmtKind::Let { local, initializer },
                                node_span(declarator.syntax()),
                            ));
                        }
                    }
                }
                Some(self.stmt(StmtKind::Block(lets), span))
            } else {
                let inits = header.init_expressions();
                if inits.is_empty() {
                    return None;
                }
                let stmts: Vec<StmtId> = inits
                    .iter()
                    .map(|expr| {
                        let expr_span = node_span(expr.syntax());
                        self.lower_expr_statement(expr, expr_span)
                    })
                    .collect();
                Some(self.stmt(StmtKind::Block(stmts), span))
            }
        });

        let condition = header
            .as_ref()
            .and_then(|h| h.condition())
            .map(|expr| self.lower_expr(&expr));

        let update = header.as_ref().and_then(|header| {
            let updates = header.update_expressions();
            if updates.is_empty() {
                return None;
            }
            let stmts: Vec<StmtId> = updates
                .iter()
                .map(|expr| {
                    let expr_span = node_span(expr.syntax());
                    self.lower_expr_statement(expr, expr_span)
                })
                .collect();
            Some(self.stmt(StmtKind::Block(stmts), span))
        });

        let body = self.lower_opt_stmt(for_stmt.body(), span);
        self.scopes.pop();
        self.stmt(
            StmtKind::For {
                init,
                condition,
                update,
                body,
            },
            span,
        )
    }

    /// Lower an expression in statement position, turning writable shapes
    /// (assignments, increments, deconstructions) into `Assign`/`Let`.
    fn lower_expr_statement(&mut self, expr: &ast::Expression, span: Span) -> StmtId {
        match expr {
            ast::Expression::AssignmentExpression(assign) => {
                let target = assign.target().map(|t| t.unparenthesized());
                match target {
                    Some(ast::Expression::NameExpression(name)) => {
                        let local = name
                            .name_token()
                            .and_then(|tok| self.resolve(tok.text()));
                        let Some(local) = local else {
                            let lowered = self.lower_expr(expr);
                            return self.stmt(StmtKind::Expr(lowered), span);
                        };
                        let value = self.lower_assignment_value(assign, local);
                        self.stmt(StmtKind::Assign { target: local, value }, span)
                    }
                    Some(ast::Expression::TupleExpression(tuple)) => {
                        self.lower_deconstruction(assign, &tuple, span)
                    }
                    _ => {
                        let lowered = self.lower_expr(expr);
                        self.stmt(StmtKind::Expr(lowered), span)
                    }
                }
            }
            ast::Expression::UnaryExpression(unary) => {
                // `x++` / `--x` write their operand.
                let target = unary
                    .operand()
                    .map(|op| op.unparenthesized())
                    .and_then(|op| match op {
                        ast::Expression::NameExpression(name) => name
                            .name_token()
                            .and_then(|tok| self.resolve(tok.text())),
                        _ => None,
                    });
                let is_increment = unary.op_token().is_some_and(|tok| {
                    matches!(
                        tok.kind(),
                        quarry_syntax::SyntaxKind::PlusPlus | quarry_syntax::SyntaxKind::MinusMinus
                    )
                });
                match target {
                    Some(local) if is_increment => {
                        let read = self.expr(ExprKind::Local(local), span);
                        let value = self.expr(ExprKind::Unary { expr: read }, span);
                        self.stmt(StmtKind::Assign { target: local, value }, span)
                    }
                    _ => {
                        let lowered = self.lower_expr(expr);
                        self.stmt(StmtKind::Expr(lowered), span)
                    }
                }
            }
            _ => {
                let lowered = self.lower_expr(expr);
                self.stmt(StmtKind::Expr(lowered), span)
            }
        }
    }

    /// Value expression for an assignment to `target`, modeling the compound
    /// operator's read of the target.
    fn lower_assignment_value(
        &mut self,
        assign: &ast::AssignmentExpression,
        target: LocalId,
    ) -> ExprId {
        let span = node_span(assign.syntax());
        let rhs = match assign.value() {
            Some(value) => self.lower_expr(&value),
            None => self.expr(ExprKind::Opaque, span),
        };
        let is_simple = assign
            .op_token()
            .is_some_and(|tok| tok.kind() == quarry_syntax::SyntaxKind::Eq);
        if is_simple {
            rhs
        } else {
            let read = self.expr(ExprKind::Local(target), span);
            self.expr(ExprKind::Binary { lhs: read, rhs }, span)
        }
    }

    fn lower_deconstruction(
        &mut self,
        assign: &ast::AssignmentExpression,
        tuple: &ast::TupleExpression,
        span: Span,
    ) -> StmtId {
        let value = match assign.value() {
            Some(value) => self.lower_expr(&value),
            None => self.expr(ExprKind::Opaque, span),
        };
        let mut stmts = Vec::new();
        let mut value_used = false;
        for element in tuple.syntax().children() {
            if let Some(decl) = ast::DeclarationPattern::cast(element.clone()) {
                if let Some(name_tok) = decl.name_token() {
                    let local = self.declare(&name_tok);
                    let initializer = (!value_used).then(|| {
                        value_used = true;
                        value
                    });
                    stmts.push(self.stmt(
                        StmtKind::Let { local, initializer },
                        node_span(&element),
                    ));
                }
            } else if let Some(ast::Expression::NameExpression(name)) =
                ast::Expression::cast(element.clone()).map(|e| e.unparenthesized())
            {
                if let Some(local) = name
                    .name_token()
                    .and_then(|tok| self.resolve(tok.text()))
                {
                    let element_value = if value_used {
                        self.expr(ExprKind::Opaque, span)
                    } else {
                        value_used = true;
                        value
                    };
                    stmts.push(self.stmt(
                        StmtKind::Assign {
                            target: local,
                            value: element_value,
                        },
                        node_span(&element),
                    ));
                }
            }
        }
        if !value_used {
            stmts.push(self.stmt(StmtKind::Expr(value), span));
        }
        self.stmt(StmtKind::Block(stmts), span)
    }

    fn lower_opt_stmt(&mut self, stmt: Option<ast::Statement>, span: Span) -> StmtId {
        match stmt {
            Some(stmt) => self.lower_stmt(&stmt),
            None => self.stmt(StmtKind::Nop, span),
        }
    }

    fn lower_opt_expr(&mut self, expr: Option<ast::Expression>, span: Span) -> ExprId {
        match expr {
            Some(expr) => self.lower_expr(&expr),
            None => self.expr(ExprKind::Opaque, span),
        }
    }

    fn lower_expr(&mut self, expr: &ast::Expression) -> ExprId {
        let span = node_span(expr.syntax());
        match expr {
            ast::Expression::NameExpression(name) => {
                let resolved = name
                    .name_token()
                    .and_then(|tok| self.resolve(tok.text()));
                match resolved {
                    Some(local) => self.expr(ExprKind::Local(local), span),
                    None => self.expr(ExprKind::Opaque, span),
                }
            }
            ast::Expression::LiteralExpression(_) => self.expr(ExprKind::Opaque, span),
            ast::Expression::ThisExpression(_) | ast::Expression::BaseExpression(_) => {
                self.expr(ExprKind::This, span)
            }
            ast::Expression::ParenthesizedExpression(paren) => match paren.expression() {
                Some(inner) => self.lower_expr(&inner),
                None => self.expr(ExprKind::Opaque, span),
            },
            ast::Expression::TupleExpression(tuple) => {
                let elements = tuple
                    .expressions()
                    .map(|e| self.lower_expr(&e))
                    .collect();
                self.expr(ExprKind::Tuple { elements }, span)
            }
            ast::Expression::MemberAccessExpression(access) => {
                let receiver = self.lower_opt_expr(access.receiver(), span);
                self.expr(ExprKind::FieldAccess { receiver }, span)
            }
            ast::Expression::ElementAccessExpression(access) => {
                let receiver = self.lower_opt_expr(access.receiver(), span);
                let args = access.indices().map(|e| self.lower_expr(&e)).collect();
                self.expr(ExprKind::Index { receiver, args }, span)
            }
            ast::Expression::InvocationExpression(call) => {
                let receiver = match call.callee().map(|c| c.unparenthesized()) {
                    Some(ast::Expression::MemberAccessExpression(access)) => {
                        Some(self.lower_opt_expr(access.receiver(), span))
                    }
                    Some(ast::Expression::NameExpression(name)) => name
                        .name_token()
                        .and_then(|tok| self.resolve(tok.text()))
                        .map(|local| self.expr(ExprKind::Local(local), span)),
                    Some(other) => Some(self.lower_expr(&other)),
                    None => None,
                };
                let args = self.lower_arguments(call.argument_list());
                self.expr(ExprKind::Call { receiver, args }, span)
            }
            ast::Expression::ObjectCreationExpression(creation) => {
                let mut args = self.lower_arguments(creation.argument_list());
                if let Some(init) = creation.initializer() {
                    args.extend(init.expressions().map(|e| self.lower_expr(&e)));
                }
                self.expr(ExprKind::New { args }, span)
            }
            ast::Expression::ArrayCreationExpression(creation) => {
                let mut args: Vec<ExprId> = creation
                    .syntax()
                    .children()
                    .filter_map(ast::Expression::cast)
                    .map(|e| self.lower_expr(&e))
                    .collect();
                if let Some(init) = creation.initializer() {
                    args.extend(init.expressions().map(|e| self.lower_expr(&e)));
                }
                self.expr(ExprKind::New { args }, span)
            }
            ast::Expression::InitializerExpression(init) => {
                let args = init.expressions().map(|e| self.lower_expr(&e)).collect();
                self.expr(ExprKind::New { args }, span)
            }
            ast::Expression::StackAllocExpression(alloc) => {
                let args = alloc
                    .syntax()
                    .children()
                    .filter_map(ast::Expression::cast)
                    .map(|e| self.lower_expr(&e))
                    .collect();
                self.expr(ExprKind::New { args }, span)
            }
            ast::Expression::UnaryExpression(unary) => {
                let is_increment = unary.op_token().is_some_and(|tok| {
                    matches!(
                        tok.kind(),
                        quarry_syntax::SyntaxKind::PlusPlus | quarry_syntax::SyntaxKind::MinusMinus
                    )
                });
                let target = unary
                    .operand()
                    .map(|op| op.unparenthesized())
                    .and_then(|op| match op {
                        ast::Expression::NameExpression(name) => name
                            .name_token()
                            .and_then(|tok| self.resolve(tok.text())),
                        _ => None,
                    });
                match (is_increment, target) {
                    (true, Some(local)) => {
                        let read = self.expr(ExprKind::Local(local), span);
                        let value = self.expr(ExprKind::Unary { expr: read }, span);
                        self.expr(
                            ExprKind::Assign {
                                target: Some(local),
                                value,
                            },
                            span,
                        )
                    }
                    _ => {
                        let operand = self.lower_opt_expr(unary.operand(), span);
                        self.expr(ExprKind::Unary { expr: operand }, span)
                    }
                }
            }
            ast::Expression::BinaryExpression(binary) => {
                match (binary.lhs(), binary.rhs()) {
                    (Some(lhs), Some(rhs)) => {
                        let lhs = self.lower_expr(&lhs);
                        let rhs = self.lower_expr(&rhs);
                        self.expr(ExprKind::Binary { lhs, rhs }, span)
                    }
                    (Some(lhs), None) => {
                        // `expr as Type` — only the value operand flows.
                        let lhs = self.lower_expr(&lhs);
                        self.expr(ExprKind::Unary { expr: lhs }, span)
                    }
                    _ => self.expr(ExprKind::Opaque, span),
                }
            }
            ast::Expression::AssignmentExpression(assign) => {
                let target = assign
                    .target()
                    .map(|t| t.unparenthesized())
                    .and_then(|t| match t {
                        ast::Expression::NameExpression(name) => name
                            .name_token()
                            .and_then(|tok| self.resolve(tok.text())),
                        _ => None,
                    });
                match target {
                    Some(local) => {
                        let value = self.lower_assignment_value(assign, local);
                        self.expr(
                            ExprKind::Assign {
                                target: Some(local),
                                value,
                            },
                            span,
                        )
                    }
                    None => {
                        let mut children = Vec::new();
                        if let Some(t) = assign.target() {
                            children.push(self.lower_expr(&t));
                        }
                        if let Some(v) = assign.value() {
                            children.push(self.lower_expr(&v));
                        }
                        self.expr(ExprKind::Invalid { children }, span)
                    }
                }
            }
            ast::Expression::ConditionalExpression(cond) => {
                let condition = self.lower_opt_expr(cond.condition(), span);
                let then_expr = self.lower_opt_expr(cond.then_expr(), span);
                let else_expr = self.lower_opt_expr(cond.else_expr(), span);
                self.expr(
                    ExprKind::Conditional {
                        condition,
                        then_expr,
                        else_expr,
                    },
                    span,
                )
            }
            ast::Expression::CastExpression(cast) => {
                let operand = self.lower_opt_expr(cast.expression(), span);
                self.expr(ExprKind::Unary { expr: operand }, span)
            }
            ast::Expression::AwaitExpression(await_expr) => {
                let operand = self.lower_opt_expr(await_expr.expression(), span);
                self.expr(ExprKind::Await { expr: operand }, span)
            }
            ast::Expression::IsPatternExpression(is_pattern) => {
                let operand = self.lower_opt_expr(is_pattern.expression(), span);
                let designation = is_pattern
                    .pattern()
                    .and_then(|p| p.name_token());
                match designation {
                    Some(name_tok) => {
                        // `x is T y` declares and conditionally writes `y`.
                        let local = self.declare(&name_tok);
                        self.expr(
                            ExprKind::Assign {
                                target: Some(local),
                                value: operand,
                            },
                            span,
                        )
                    }
                    None => self.expr(ExprKind::Unary { expr: operand }, span),
                }
            }
            ast::Expression::LambdaExpression(lambda) => {
                // Captured reads inside an expression-bodied lambda still
                // matter for parameter collection; block bodies stay opaque.
                match lambda.body_expression() {
                    Some(body) => {
                        let inner = self.lower_expr(&body);
                        self.expr(
                            ExprKind::Invalid {
                                children: vec![inner],
                            },
                            span,
                        )
                    }
                    None => self.expr(ExprKind::Opaque, span),
                }
            }
        }
    }

    fn lower_arguments(&mut self, list: Option<ast::ArgumentList>) -> Vec<ExprId> {
        let Some(list) = list else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for arg in list.arguments() {
            let span = node_span(arg.syntax());
            let is_ref = arg.ref_token().is_some();
            let is_out = arg.out_token().is_some();
            if is_ref || is_out {
                let target = if let Some(decl) = arg.declaration() {
                    // `out var x` declares a fresh local.
                    decl.name_token().map(|tok| self.declare(&tok))
                } else {
                    arg.expression()
                        .map(|e| e.unparenthesized())
                        .and_then(|e| match e {
                            ast::Expression::NameExpression(name) => name
                                .name_token()
                                .and_then(|tok| self.resolve(tok.text())),
                            _ => None,
                        })
                };
                out.push(self.expr(ExprKind::ByRefArg { target, is_out }, span));
            } else if let Some(expr) = arg.expression() {
                out.push(self.lower_expr(&expr));
            }
        }
        out
    }
}
