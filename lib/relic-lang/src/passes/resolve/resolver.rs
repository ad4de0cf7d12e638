//! Declaration and member access resolution.

use std::collections::HashSet;

use crate::ast::{
    Ast, Declaration, ExprId, ExprKind, FuncItem, Item, Loc, MemberDecl, StmtId, StmtKind,
    StructSpec, TypeSpec,
};
use crate::context::{Interner, Symbol};
use crate::error::{CompileError, CompileErrorKind, CompileErrors, ErrorSuggestion};
use crate::suggestions;
use crate::types::{layout, ScalarType, TypeRef, TypeTable};

use super::scope::ScopeStack;
use super::table::{
    FuncDef, MemberAccess, Resolutions, ResolvedProgram, Storage, VarDef, VarId,
};

/// Resolves declarations, types, and member accesses over one unit.
///
/// Resolution runs in two passes: function names are collected first so
/// calls work regardless of definition order, then items are resolved in
/// source order. Errors accumulate; resolution recovers where it can so one
/// broken declaration does not hide everything behind it.
pub struct DeclResolver<'a> {
    ast: Ast,
    interner: &'a Interner,
    types: TypeTable,
    scopes: ScopeStack,
    resolutions: Resolutions,
    errors: CompileErrors,
    /// Next free byte in the current function's frame. Block locals are
    /// not reclaimed on scope exit, so this only grows within a function.
    frame_cursor: usize,
    globals_size: usize,
    in_function: bool,
}

impl<'a> DeclResolver<'a> {
    pub fn new(ast: Ast, interner: &'a Interner) -> Self {
        Self {
            ast,
            interner,
            types: TypeTable::default(),
            scopes: ScopeStack::new(),
            resolutions: Resolutions::default(),
            errors: CompileErrors::new(),
            frame_cursor: 0,
            globals_size: 0,
            in_function: false,
        }
    }

    pub fn resolve(mut self) -> Result<ResolvedProgram, CompileErrors> {
        self.collect_functions();

        let items = self.ast.items.clone();
        for item in &items {
            match item {
                Item::Function(func) => self.resolve_function(func),
                Item::Decl(decl) => {
                    self.resolve_declaration(decl);
                }
            }
        }

        tracing::debug!(
            types = self.types.len(),
            vars = self.resolutions.vars.len(),
            funcs = self.resolutions.funcs.len(),
            errors = self.errors.len(),
            "resolution finished"
        );

        let Self {
            ast,
            types,
            resolutions,
            errors,
            globals_size,
            ..
        } = self;
        errors.into_result(ResolvedProgram {
            ast,
            types,
            resolutions,
            globals_size,
        })
    }

    /// First pass: function names go into a flat table so calls resolve
    /// regardless of definition order.
    fn collect_functions(&mut self) {
        for item in self.ast.items.clone() {
            if let Item::Function(func) = item {
                if self.resolutions.func_by_name.contains_key(&func.name) {
                    self.errors.push(CompileError::new(
                        CompileErrorKind::AlreadyDefined(func.name),
                        func.loc.clone(),
                    ));
                    continue;
                }
                let id = self.resolutions.funcs.alloc(FuncDef {
                    name: func.name,
                    ret: func.ret,
                    params: Vec::new(),
                    arity: func.params.len(),
                    body: func.body.clone(),
                    frame_size: 0,
                    loc: func.loc.clone(),
                });
                self.resolutions.func_by_name.insert(func.name, id);
            }
        }
    }

    fn resolve_function(&mut self, func: &FuncItem) {
        let id = match self.resolutions.func_by_name.get(&func.name) {
            Some(id) => *id,
            None => return,
        };
        // Duplicate definitions were reported during collection; only the
        // first one owns the definition.
        if self.resolutions.funcs.get(id).loc != func.loc {
            return;
        }

        self.frame_cursor = 0;
        self.in_function = true;
        self.scopes.push();

        let mut params = Vec::with_capacity(func.params.len());
        for param in &func.params {
            if self.scopes.lookup_var_current(param.name).is_some() {
                self.errors.push(CompileError::new(
                    CompileErrorKind::AlreadyDefined(param.name),
                    param.loc.clone(),
                ));
                continue;
            }
            params.push(self.bind_var(param.name, TypeRef::Scalar(param.ty)));
        }

        for stmt in &func.body {
            self.resolve_stmt(*stmt);
        }

        self.scopes.pop();
        self.in_function = false;

        let frame_size = self.frame_cursor;
        let def = self.resolutions.funcs.get_mut(id);
        def.params = params;
        def.frame_size = frame_size;
    }

    fn resolve_stmt(&mut self, stmt_id: StmtId) {
        let stmt = self.ast.stmts.get(stmt_id).clone();
        match &stmt.kind {
            StmtKind::Decl(decl) => {
                let vars = self.resolve_declaration(decl);
                self.resolutions.decl_vars.insert(stmt_id, vars);
            }
            StmtKind::Expr(expr) => {
                self.resolve_expr(*expr);
            }
            StmtKind::Return(value) => {
                if let Some(ty) = self.resolve_expr(*value) {
                    self.require_scalar(&ty, *value, "return value");
                }
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if let Some(ty) = self.resolve_expr(*cond) {
                    self.require_scalar(&ty, *cond, "condition");
                }
                self.resolve_stmt(*then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(*else_branch);
                }
            }
            StmtKind::While { cond, body } => {
                if let Some(ty) = self.resolve_expr(*cond) {
                    self.require_scalar(&ty, *cond, "condition");
                }
                self.resolve_stmt(*body);
            }
            StmtKind::Block(stmts) => {
                self.scopes.push();
                for stmt in stmts {
                    self.resolve_stmt(*stmt);
                }
                self.scopes.pop();
            }
        }
    }

    /// Resolves one declaration: the specifier once, then every declarator
    /// against the single type it produced. Returns the variables in
    /// declarator order.
    fn resolve_declaration(&mut self, decl: &Declaration) -> Vec<VarId> {
        // A bare `struct s;` (no declarators, no members) declares the tag
        // in this frame; with declarators the same spelling is a use.
        let tag_only = decl.declarators.is_empty()
            && matches!(&decl.spec, TypeSpec::Struct(spec) if spec.members.is_none());

        let ty = match &decl.spec {
            TypeSpec::Scalar(scalar) => Some(TypeRef::Scalar(*scalar)),
            TypeSpec::Struct(spec) => self.resolve_struct_spec(spec, tag_only),
        };

        let ty = match ty {
            Some(ty) => ty,
            None => return Vec::new(),
        };

        let mut vars = Vec::with_capacity(decl.declarators.len());
        for declarator in &decl.declarators {
            // Variables need a complete type. Report it, but bind the name
            // anyway so later uses resolve against the intended type
            // instead of cascading into undefined variable errors.
            if self.types.size_align(&ty).is_none() {
                self.errors.push(CompileError::new(
                    CompileErrorKind::IncompleteType { tag: self.tag_of(&ty) },
                    declarator.loc.clone(),
                ));
            }

            if self.scopes.lookup_var_current(declarator.name).is_some() {
                self.errors.push(CompileError::new(
                    CompileErrorKind::AlreadyDefined(declarator.name),
                    declarator.loc.clone(),
                ));
                continue;
            }

            let var = self.bind_var(declarator.name, ty);
            vars.push(var);

            if let Some(init) = declarator.init {
                let init_ty = self.resolve_expr(init);
                if !ty.is_scalar() {
                    let described = self.types.describe(&ty, self.interner);
                    self.errors.push(
                        CompileError::new(
                            CompileErrorKind::TypeMismatch,
                            self.ast.exprs.get(init).loc.clone(),
                        )
                        .with_context(format!("cannot initialize {} from an expression", described)),
                    );
                } else if let Some(init_ty) = init_ty {
                    self.require_scalar(&init_ty, init, "initializer");
                }
            }
        }
        vars
    }

    /// Resolves a struct specifier to a type.
    ///
    /// Definitions always bind the tag in the current frame before their
    /// member list is resolved, so members can refer to the tag being
    /// defined and a nested definition of the same tag is caught as a
    /// redefinition when the outer list tries to complete it again.
    fn resolve_struct_spec(&mut self, spec: &StructSpec, tag_only: bool) -> Option<TypeRef> {
        match (spec.tag, &spec.members) {
            // `struct { ... }` is anonymous: always a fresh type, never
            // bound to any tag.
            (None, Some(members)) => {
                let members = self.resolve_member_list(members, None)?;
                match self.types.define(None, members) {
                    Ok(id) => Some(TypeRef::Aggregate(id)),
                    Err(kind) => {
                        self.errors.push(CompileError::new(kind, spec.loc.clone()));
                        None
                    }
                }
            }

            // `struct s { ... }` defines the tag in the current frame.
            (Some(tag), Some(members)) => {
                let existing = self
                    .scopes
                    .lookup_tag_current(tag)
                    .filter(|id| !self.types.get(*id).complete);

                // Completing a forward declaration keeps its identity; any
                // other case (fresh tag, or a complete type being
                // redeclared) binds a fresh identity. Variables of the old
                // type keep pointing at the old identity.
                let id = match existing {
                    Some(id) => id,
                    None => {
                        let id = self.types.declare_incomplete(Some(tag));
                        self.scopes.bind_tag(tag, id);
                        id
                    }
                };

                let members = self.resolve_member_list(members, Some(tag))?;
                match self.types.complete(id, members) {
                    Ok(()) => Some(TypeRef::Aggregate(id)),
                    Err(kind) => {
                        self.errors.push(CompileError::new(kind, spec.loc.clone()));
                        None
                    }
                }
            }

            // `struct s` with declarators references a visible tag.
            (Some(tag), None) if !tag_only => match self.scopes.lookup_tag(tag) {
                Some(id) => Some(TypeRef::Aggregate(id)),
                None => {
                    let candidates = self.scopes.visible_tags();
                    let mut err = CompileError::new(
                        CompileErrorKind::UnknownTag { tag },
                        spec.loc.clone(),
                    );
                    if let Some(suggestion) = self.suggest(tag, &candidates) {
                        err = err.with_suggestion(suggestion);
                    }
                    self.errors.push(err);
                    None
                }
            },

            // `struct s;` declares the tag here if this frame has none.
            (Some(tag), None) => {
                if self.scopes.lookup_tag_current(tag).is_none() {
                    let id = self.types.declare_incomplete(Some(tag));
                    self.scopes.bind_tag(tag, id);
                }
                None
            }

            // The grammar never produces `struct` with neither tag nor
            // members.
            (None, None) => None,
        }
    }

    /// Resolves member declarations to `(name, type)` pairs. Duplicates are
    /// reported and skipped; a specifier that fails to resolve poisons the
    /// whole list and leaves the aggregate incomplete.
    fn resolve_member_list(
        &mut self,
        members: &[MemberDecl],
        tag: Option<Symbol>,
    ) -> Option<Vec<(Symbol, TypeRef)>> {
        let mut resolved = Vec::new();
        let mut seen = HashSet::new();
        for member in members {
            let ty = match &member.spec {
                TypeSpec::Scalar(scalar) => TypeRef::Scalar(*scalar),
                TypeSpec::Struct(spec) => self.resolve_struct_spec(spec, false)?,
            };
            for (name, loc) in &member.names {
                if !seen.insert(*name) {
                    self.errors.push(CompileError::new(
                        CompileErrorKind::DuplicateMember { member: *name, tag },
                        loc.clone(),
                    ));
                    continue;
                }
                resolved.push((*name, ty));
            }
        }
        Some(resolved)
    }

    fn resolve_expr(&mut self, expr_id: ExprId) -> Option<TypeRef> {
        let expr = self.ast.exprs.get(expr_id).clone();
        let ty = match &expr.kind {
            ExprKind::Integer(_) => Some(TypeRef::Scalar(ScalarType::Int)),

            ExprKind::Variable(name) => match self.scopes.lookup_var(*name) {
                Some(var) => {
                    self.resolutions.var_uses.insert(expr_id, var);
                    Some(self.resolutions.vars.get(var).ty)
                }
                None => {
                    let candidates = self.scopes.visible_vars();
                    let mut err = CompileError::new(
                        CompileErrorKind::UndefinedVariable { name: *name },
                        expr.loc.clone(),
                    );
                    if let Some(suggestion) = self.suggest(*name, &candidates) {
                        err = err.with_suggestion(suggestion);
                    }
                    self.errors.push(err);
                    None
                }
            },

            ExprKind::Member { base, member } => {
                self.resolve_member(expr_id, *base, *member, &expr.loc)
            }

            ExprKind::Assign { lhs, rhs } => self.resolve_assign(*lhs, *rhs, &expr.loc),

            ExprKind::Binary { op, lhs, rhs } => {
                let what = format!("operand of '{}'", op.symbol());
                if let Some(ty) = self.resolve_expr(*lhs) {
                    self.require_scalar(&ty, *lhs, &what);
                }
                if let Some(ty) = self.resolve_expr(*rhs) {
                    self.require_scalar(&ty, *rhs, &what);
                }
                // Arithmetic and comparisons both produce int.
                Some(TypeRef::Scalar(ScalarType::Int))
            }

            ExprKind::Call { callee, args } => {
                self.resolve_call(expr_id, *callee, args, &expr.loc)
            }

            ExprKind::SizeOf(operand) => match self.resolve_expr(*operand) {
                Some(operand_ty) => {
                    if self.types.size_align(&operand_ty).is_none() {
                        self.errors.push(CompileError::new(
                            CompileErrorKind::IncompleteType {
                                tag: self.tag_of(&operand_ty),
                            },
                            expr.loc.clone(),
                        ));
                        None
                    } else {
                        Some(TypeRef::Scalar(ScalarType::Long))
                    }
                }
                None => None,
            },
        };

        if let Some(ty) = &ty {
            self.resolutions.expr_types.insert(expr_id, *ty);
        }
        ty
    }

    fn resolve_member(
        &mut self,
        expr_id: ExprId,
        base: ExprId,
        member: Symbol,
        loc: &Loc,
    ) -> Option<TypeRef> {
        let base_ty = self.resolve_expr(base)?;
        let id = match base_ty {
            TypeRef::Aggregate(id) => id,
            TypeRef::Scalar(scalar) => {
                self.errors.push(
                    CompileError::new(CompileErrorKind::NotAnAggregate, loc.clone())
                        .with_context(format!(
                            "member access on '{}', which is not a struct",
                            scalar.name()
                        )),
                );
                return None;
            }
        };

        let agg = self.types.get(id);
        if !agg.complete {
            let tag = agg.tag;
            self.errors.push(CompileError::new(
                CompileErrorKind::IncompleteType { tag },
                loc.clone(),
            ));
            return None;
        }

        match agg.member(member) {
            Some(found) => {
                let access = MemberAccess {
                    offset: found.offset,
                    ty: found.ty,
                };
                self.resolutions.member_accesses.insert(expr_id, access);
                Some(access.ty)
            }
            None => {
                let tag = agg.tag;
                let names: Vec<Symbol> = agg.members.iter().map(|m| m.name).collect();
                let mut err = CompileError::new(
                    CompileErrorKind::UnknownMember { member, tag },
                    loc.clone(),
                );
                if let Some(suggestion) = self.suggest(member, &names) {
                    err = err.with_suggestion(suggestion);
                }
                self.errors.push(err);
                None
            }
        }
    }

    fn resolve_assign(&mut self, lhs: ExprId, rhs: ExprId, loc: &Loc) -> Option<TypeRef> {
        if !self.is_lvalue(lhs) {
            self.errors.push(
                CompileError::new(CompileErrorKind::TypeMismatch, loc.clone())
                    .with_context("left side of assignment is not assignable"),
            );
            // Both sides still get resolved for their own errors.
            self.resolve_expr(lhs);
            self.resolve_expr(rhs);
            return None;
        }

        let lhs_ty = self.resolve_expr(lhs);
        let rhs_ty = self.resolve_expr(rhs);
        let (lhs_ty, rhs_ty) = (lhs_ty?, rhs_ty?);

        match (&lhs_ty, &rhs_ty) {
            (TypeRef::Scalar(_), TypeRef::Scalar(_)) => Some(lhs_ty),
            // Struct assignment requires the exact same type identity, and
            // copies bytes, so the right side must itself live somewhere.
            (TypeRef::Aggregate(a), TypeRef::Aggregate(b)) if a == b => {
                if !self.is_lvalue(rhs) {
                    self.errors.push(
                        CompileError::new(CompileErrorKind::TypeMismatch, loc.clone())
                            .with_context(
                                "struct assignment needs a variable or member on the right",
                            ),
                    );
                    return None;
                }
                Some(lhs_ty)
            }
            _ => {
                let rhs_name = self.types.describe(&rhs_ty, self.interner);
                let lhs_name = self.types.describe(&lhs_ty, self.interner);
                self.errors.push(
                    CompileError::new(CompileErrorKind::TypeMismatch, loc.clone())
                        .with_context(format!("cannot assign {} to {}", rhs_name, lhs_name)),
                );
                None
            }
        }
    }

    fn resolve_call(
        &mut self,
        expr_id: ExprId,
        callee: Symbol,
        args: &[ExprId],
        loc: &Loc,
    ) -> Option<TypeRef> {
        let func_id = match self.resolutions.func_by_name.get(&callee) {
            Some(id) => *id,
            None => {
                let candidates: Vec<Symbol> =
                    self.resolutions.func_by_name.keys().copied().collect();
                let mut err = CompileError::new(
                    CompileErrorKind::UndefinedFunction { name: callee },
                    loc.clone(),
                );
                if let Some(suggestion) = self.suggest(callee, &candidates) {
                    err = err.with_suggestion(suggestion);
                }
                self.errors.push(err);
                // Arguments still get resolved for their own errors.
                for arg in args {
                    self.resolve_expr(*arg);
                }
                return None;
            }
        };

        let (arity, ret) = {
            let def = self.resolutions.funcs.get(func_id);
            (def.arity, def.ret)
        };

        if args.len() != arity {
            self.errors.push(CompileError::new(
                CompileErrorKind::ArityMismatch {
                    expected: arity,
                    actual: args.len(),
                },
                loc.clone(),
            ));
        }

        for arg in args {
            if let Some(ty) = self.resolve_expr(*arg) {
                self.require_scalar(&ty, *arg, "argument");
            }
        }

        self.resolutions.call_targets.insert(expr_id, func_id);
        Some(TypeRef::Scalar(ret))
    }

    /// Allocates storage for a variable and binds it in the current frame.
    fn bind_var(&mut self, name: Symbol, ty: TypeRef) -> VarId {
        // Incomplete types only reach here on the error recovery path; the
        // program never executes, so zero bytes of storage is fine.
        let (size, align) = self.types.size_align(&ty).unwrap_or((0, 1));
        let storage = if self.in_function {
            let offset = layout::align_up(self.frame_cursor, align);
            self.frame_cursor = offset + size;
            Storage::Local { offset }
        } else {
            let offset = layout::align_up(self.globals_size, align);
            self.globals_size = offset + size;
            Storage::Global { offset }
        };
        let id = self.resolutions.vars.alloc(VarDef { name, ty, storage });
        self.scopes.bind_var(name, id);
        id
    }

    fn require_scalar(&mut self, ty: &TypeRef, expr: ExprId, what: &str) {
        if !ty.is_scalar() {
            let described = self.types.describe(ty, self.interner);
            self.errors.push(
                CompileError::new(
                    CompileErrorKind::TypeMismatch,
                    self.ast.exprs.get(expr).loc.clone(),
                )
                .with_context(format!("{} must be a scalar, found {}", what, described)),
            );
        }
    }

    fn is_lvalue(&self, expr: ExprId) -> bool {
        matches!(
            self.ast.exprs.get(expr).kind,
            ExprKind::Variable(_) | ExprKind::Member { .. }
        )
    }

    fn tag_of(&self, ty: &TypeRef) -> Option<Symbol> {
        match ty {
            TypeRef::Aggregate(id) => self.types.get(*id).tag,
            TypeRef::Scalar(_) => None,
        }
    }

    fn suggest(&self, wrong: Symbol, candidates: &[Symbol]) -> Option<ErrorSuggestion> {
        let wrong = self.interner.resolve(wrong);
        let names: Vec<String> = candidates
            .iter()
            .map(|sym| self.interner.resolve(*sym).to_string())
            .collect();
        let (suggestion, confidence) = suggestions::find_similar(wrong, &names)?;
        Some(ErrorSuggestion::DidYouMean {
            wrong: wrong.to_string(),
            suggestion,
            confidence,
        })
    }
}
