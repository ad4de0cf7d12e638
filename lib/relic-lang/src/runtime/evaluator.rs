//! Tree walking evaluator over resolved programs.
//!
//! Values live in raw little endian byte segments (one frame per call plus
//! a globals segment), so the member offsets and padding computed at
//! resolution time are exactly what execution observes. Scalars narrow on
//! store and sign extend on load, matching C conversion behavior.

use crate::ast::{BinOp, ExprId, ExprKind, Loc, StmtId, StmtKind};
use crate::context::Interner;
use crate::error::{CompileError, CompileErrorKind};
use crate::passes::resolve::{FuncId, ResolvedProgram, Storage, VarId};
use crate::types::{ScalarType, TypeRef};

const MAX_CALL_DEPTH: usize = 256;

/// Bookkeeping for one active call, for the depth cap and diagnostics.
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub function_name: String,
    pub call_site: Loc,
}

#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<StackFrame>,
}

impl CallStack {
    pub fn push(&mut self, frame: StackFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<StackFrame> {
        self.frames.pop()
    }

    pub fn current(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// Where a value lives: the current frame or the globals segment.
#[derive(Debug, Clone, Copy)]
enum Addr {
    Local(usize),
    Global(usize),
}

/// Control flow out of a statement.
enum Flow {
    Next,
    Return(i64),
}

pub struct Evaluator<'a> {
    program: &'a ResolvedProgram,
    interner: &'a Interner,
    globals: Vec<u8>,
    call_stack: CallStack,
}

impl<'a> Evaluator<'a> {
    pub fn new(program: &'a ResolvedProgram, interner: &'a Interner) -> Self {
        Self {
            program,
            interner,
            // File scope variables start zero initialized.
            globals: vec![0; program.globals_size],
            call_stack: CallStack::default(),
        }
    }

    /// Runs `main` with no arguments and returns its exit value.
    pub fn run_main(&mut self) -> Result<i64, CompileError> {
        let program = self.program;
        let func_id = self
            .interner
            .get("main")
            .and_then(|name| program.resolutions.func_by_name.get(&name).copied());
        let func_id = match func_id {
            Some(id) => id,
            None => {
                return Err(CompileError::new(
                    CompileErrorKind::Runtime("no 'main' function".to_string()),
                    Loc::generated(),
                ))
            }
        };

        let def = program.resolutions.funcs.get(func_id);
        if def.arity != 0 {
            return Err(CompileError::new(
                CompileErrorKind::Runtime("'main' must not take parameters".to_string()),
                def.loc.clone(),
            ));
        }

        let value = self.call(func_id, &[], Loc::generated())?;
        tracing::debug!(exit = value, "main returned");
        Ok(value)
    }

    fn call(&mut self, func_id: FuncId, args: &[i64], call_site: Loc) -> Result<i64, CompileError> {
        let program = self.program;
        let def = program.resolutions.funcs.get(func_id);

        if self.call_stack.depth() >= MAX_CALL_DEPTH {
            return Err(self.runtime_error("call depth limit exceeded", call_site));
        }
        self.call_stack.push(StackFrame {
            function_name: self.interner.resolve(def.name).to_string(),
            call_site,
        });
        tracing::trace!(
            function = self.interner.resolve(def.name),
            depth = self.call_stack.depth(),
            "call"
        );

        let mut frame = vec![0u8; def.frame_size];

        // Argument values narrow into the parameter slots on the way in.
        for (param, value) in def.params.iter().zip(args) {
            let var = program.resolutions.vars.get(*param);
            if let (Storage::Local { offset }, TypeRef::Scalar(scalar)) = (var.storage, var.ty) {
                store_scalar(&mut frame, offset, scalar.size(), *value);
            }
        }

        let mut result = Ok(0);
        for stmt in &def.body {
            match self.eval_stmt(*stmt, &mut frame) {
                Ok(Flow::Next) => {}
                Ok(Flow::Return(value)) => {
                    // The return value converts to the declared return type.
                    result = Ok(convert_scalar(value, def.ret));
                    break;
                }
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }

        self.call_stack.pop();
        result
    }

    fn eval_stmt(&mut self, stmt_id: StmtId, frame: &mut Vec<u8>) -> Result<Flow, CompileError> {
        let program = self.program;
        let stmt = program.ast.stmts.get(stmt_id);
        match &stmt.kind {
            StmtKind::Decl(decl) => {
                // Initializers run in declarator order.
                if let Some(vars) = program.resolutions.decl_vars.get(&stmt_id) {
                    for (declarator, var) in decl.declarators.iter().zip(vars) {
                        let init = match declarator.init {
                            Some(init) => init,
                            None => continue,
                        };
                        let value = self.eval_expr(init, frame)?;
                        let def = program.resolutions.vars.get(*var);
                        if let TypeRef::Scalar(scalar) = def.ty {
                            let addr = self.var_addr(*var);
                            self.store(addr, scalar, value, frame);
                        }
                    }
                }
                Ok(Flow::Next)
            }

            StmtKind::Expr(expr) => {
                self.eval_expr(*expr, frame)?;
                Ok(Flow::Next)
            }

            StmtKind::Return(value) => {
                let value = self.eval_expr(*value, frame)?;
                Ok(Flow::Return(value))
            }

            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval_expr(*cond, frame)? != 0 {
                    self.eval_stmt(*then_branch, frame)
                } else if let Some(else_branch) = else_branch {
                    self.eval_stmt(*else_branch, frame)
                } else {
                    Ok(Flow::Next)
                }
            }

            StmtKind::While { cond, body } => {
                while self.eval_expr(*cond, frame)? != 0 {
                    if let Flow::Return(value) = self.eval_stmt(*body, frame)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Next)
            }

            StmtKind::Block(stmts) => {
                for stmt in stmts {
                    if let Flow::Return(value) = self.eval_stmt(*stmt, frame)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Next)
            }
        }
    }

    fn eval_expr(&mut self, expr_id: ExprId, frame: &mut Vec<u8>) -> Result<i64, CompileError> {
        let program = self.program;
        let expr = program.ast.exprs.get(expr_id);
        match &expr.kind {
            ExprKind::Integer(value) => Ok(*value),

            ExprKind::Variable(_) | ExprKind::Member { .. } => {
                let (addr, ty) = self.lvalue_addr(expr_id)?;
                match ty {
                    TypeRef::Scalar(scalar) => Ok(self.load(addr, scalar, frame)),
                    TypeRef::Aggregate(_) => Err(self.runtime_error(
                        "struct value used where a scalar is needed",
                        expr.loc.clone(),
                    )),
                }
            }

            ExprKind::Assign { lhs, rhs } => match self.expr_type(expr_id)? {
                TypeRef::Scalar(_) => {
                    let value = self.eval_expr(*rhs, frame)?;
                    let (addr, lhs_ty) = self.lvalue_addr(*lhs)?;
                    let scalar = match lhs_ty {
                        TypeRef::Scalar(scalar) => scalar,
                        TypeRef::Aggregate(_) => {
                            return Err(self.runtime_error(
                                "scalar assignment to a struct location",
                                expr.loc.clone(),
                            ))
                        }
                    };
                    self.store(addr, scalar, value, frame);
                    // The assignment's value is what the location holds
                    // after narrowing, not the raw right hand side.
                    Ok(self.load(addr, scalar, frame))
                }
                TypeRef::Aggregate(id) => {
                    let size = program.types.get(id).size;
                    let (src, _) = self.lvalue_addr(*rhs)?;
                    let (dst, _) = self.lvalue_addr(*lhs)?;
                    self.copy_bytes(dst, src, size, frame);
                    Ok(0)
                }
            },

            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.eval_expr(*lhs, frame)?;
                let rhs = self.eval_expr(*rhs, frame)?;
                self.apply_binop(*op, lhs, rhs, &expr.loc)
            }

            ExprKind::Call { callee: _, args } => {
                let func_id = match program.resolutions.call_targets.get(&expr_id) {
                    Some(id) => *id,
                    None => {
                        return Err(self.runtime_error(
                            "call without a resolved target",
                            expr.loc.clone(),
                        ))
                    }
                };
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(*arg, frame)?);
                }
                self.call(func_id, &values, expr.loc.clone())
            }

            ExprKind::SizeOf(operand) => {
                // sizeof never evaluates its operand; the size comes from
                // the resolved type.
                let ty = self.expr_type(*operand)?;
                match program.types.size_of(&ty) {
                    Some(size) => Ok(size as i64),
                    None => Err(self.runtime_error(
                        "sizeof of an incomplete type",
                        expr.loc.clone(),
                    )),
                }
            }
        }
    }

    /// Address and type of an assignable expression. Member chains fold
    /// into the base variable's address plus accumulated offsets.
    fn lvalue_addr(&self, expr_id: ExprId) -> Result<(Addr, TypeRef), CompileError> {
        let program = self.program;
        let expr = program.ast.exprs.get(expr_id);
        match &expr.kind {
            ExprKind::Variable(_) => {
                let var = match program.resolutions.var_uses.get(&expr_id) {
                    Some(var) => *var,
                    None => {
                        return Err(
                            self.runtime_error("unresolved variable", expr.loc.clone())
                        )
                    }
                };
                let def = program.resolutions.vars.get(var);
                Ok((self.var_addr(var), def.ty))
            }
            ExprKind::Member { base, .. } => {
                let (base_addr, _) = self.lvalue_addr(*base)?;
                let access = match program.resolutions.member_accesses.get(&expr_id) {
                    Some(access) => *access,
                    None => {
                        return Err(
                            self.runtime_error("unresolved member access", expr.loc.clone())
                        )
                    }
                };
                let addr = match base_addr {
                    Addr::Local(offset) => Addr::Local(offset + access.offset),
                    Addr::Global(offset) => Addr::Global(offset + access.offset),
                };
                Ok((addr, access.ty))
            }
            _ => Err(self.runtime_error("expression is not assignable", expr.loc.clone())),
        }
    }

    fn var_addr(&self, var: VarId) -> Addr {
        match self.program.resolutions.vars.get(var).storage {
            Storage::Local { offset } => Addr::Local(offset),
            Storage::Global { offset } => Addr::Global(offset),
        }
    }

    fn load(&self, addr: Addr, scalar: ScalarType, frame: &[u8]) -> i64 {
        match addr {
            Addr::Local(offset) => load_scalar(frame, offset, scalar.size()),
            Addr::Global(offset) => load_scalar(&self.globals, offset, scalar.size()),
        }
    }

    fn store(&mut self, addr: Addr, scalar: ScalarType, value: i64, frame: &mut [u8]) {
        match addr {
            Addr::Local(offset) => store_scalar(frame, offset, scalar.size(), value),
            Addr::Global(offset) => store_scalar(&mut self.globals, offset, scalar.size(), value),
        }
    }

    /// Copies `size` bytes between locations. Source and destination can
    /// overlap within one segment, so the copy goes through a buffer.
    fn copy_bytes(&mut self, dst: Addr, src: Addr, size: usize, frame: &mut [u8]) {
        let mut buf = vec![0u8; size];
        match src {
            Addr::Local(offset) => buf.copy_from_slice(&frame[offset..offset + size]),
            Addr::Global(offset) => buf.copy_from_slice(&self.globals[offset..offset + size]),
        }
        match dst {
            Addr::Local(offset) => frame[offset..offset + size].copy_from_slice(&buf),
            Addr::Global(offset) => self.globals[offset..offset + size].copy_from_slice(&buf),
        }
    }

    fn apply_binop(&self, op: BinOp, lhs: i64, rhs: i64, loc: &Loc) -> Result<i64, CompileError> {
        let value = match op {
            BinOp::Add => lhs.wrapping_add(rhs),
            BinOp::Sub => lhs.wrapping_sub(rhs),
            BinOp::Mul => lhs.wrapping_mul(rhs),
            BinOp::Div => {
                if rhs == 0 {
                    return Err(self.runtime_error("division by zero", loc.clone()));
                }
                lhs.wrapping_div(rhs)
            }
            BinOp::Rem => {
                if rhs == 0 {
                    return Err(self.runtime_error("remainder by zero", loc.clone()));
                }
                lhs.wrapping_rem(rhs)
            }
            BinOp::Eq => (lhs == rhs) as i64,
            BinOp::Ne => (lhs != rhs) as i64,
            BinOp::Lt => (lhs < rhs) as i64,
            BinOp::Le => (lhs <= rhs) as i64,
            BinOp::Gt => (lhs > rhs) as i64,
            BinOp::Ge => (lhs >= rhs) as i64,
        };
        Ok(value)
    }

    fn expr_type(&self, expr_id: ExprId) -> Result<TypeRef, CompileError> {
        match self.program.resolutions.expr_types.get(&expr_id) {
            Some(ty) => Ok(*ty),
            None => Err(self.runtime_error(
                "expression without a resolved type",
                self.program.ast.exprs.get(expr_id).loc.clone(),
            )),
        }
    }

    fn runtime_error(&self, message: &str, loc: Loc) -> CompileError {
        let err = CompileError::new(CompileErrorKind::Runtime(message.to_string()), loc);
        match self.call_stack.current() {
            Some(frame) => err.with_context(format!("in {}", frame.function_name)),
            None => err,
        }
    }
}

/// Writes the low `size` bytes of `value` little endian.
fn store_scalar(bytes: &mut [u8], offset: usize, size: usize, value: i64) {
    let le = value.to_le_bytes();
    bytes[offset..offset + size].copy_from_slice(&le[..size]);
}

/// Reads `size` bytes little endian and sign extends from the top bit of
/// the loaded width.
fn load_scalar(bytes: &[u8], offset: usize, size: usize) -> i64 {
    let mut le = [0u8; 8];
    le[..size].copy_from_slice(&bytes[offset..offset + size]);
    let shift = (8 - size) * 8;
    (i64::from_le_bytes(le) << shift) >> shift
}

/// Narrows a value to a scalar width and sign extends it back, the same as
/// a store followed by a reload.
fn convert_scalar(value: i64, ty: ScalarType) -> i64 {
    match ty {
        ScalarType::Char => value as i8 as i64,
        ScalarType::Short => value as i16 as i64,
        ScalarType::Int => value as i32 as i64,
        ScalarType::Long => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_sign_extends_negative_values() {
        let mut bytes = vec![0u8; 8];
        store_scalar(&mut bytes, 0, 1, -1);
        assert_eq!(load_scalar(&bytes, 0, 1), -1);
        store_scalar(&mut bytes, 0, 2, -300);
        assert_eq!(load_scalar(&bytes, 0, 2), -300);
    }

    #[test]
    fn store_truncates_to_the_scalar_width() {
        let mut bytes = vec![0u8; 8];
        store_scalar(&mut bytes, 0, 1, 300);
        assert_eq!(load_scalar(&bytes, 0, 1), 44);
    }

    #[test]
    fn stores_do_not_disturb_neighboring_bytes() {
        let mut bytes = vec![0xffu8; 8];
        store_scalar(&mut bytes, 2, 2, 0);
        assert_eq!(bytes[1], 0xff);
        assert_eq!(bytes[4], 0xff);
        assert_eq!(load_scalar(&bytes, 2, 2), 0);
    }

    #[test]
    fn conversion_matches_store_and_reload() {
        assert_eq!(convert_scalar(300, ScalarType::Char), 44);
        assert_eq!(convert_scalar(-1, ScalarType::Short), -1);
        assert_eq!(convert_scalar(1 << 40, ScalarType::Int), 0);
        assert_eq!(convert_scalar(i64::MIN, ScalarType::Long), i64::MIN);
    }
}
