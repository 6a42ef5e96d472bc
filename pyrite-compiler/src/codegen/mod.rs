//! SSA code generator (spec §4.7), grounded in
//! `examples/meftunca-vex/vex-compiler/src/codegen_ast` — alloca-per-binding
//! function bodies built directly against `inkwell`'s builder API, `Result<T,
//! CodegenError>` threaded the same way the teacher threads `Result<T,
//! String>`.

pub mod errors;
pub mod runtime;
pub mod types;

pub use errors::CodegenError;

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::values::{BasicValue, BasicValueEnum, FunctionValue, PointerValue};
use inkwell::{AddressSpace, IntPredicate};
use pyrite_ast::{
    BinaryOp, Block, Enum, Expr, ExprKind, Function, IntWidth, Item, Param, Pattern, Program,
    Stmt, StmtKind, Struct, Type, UnaryOp,
};
use std::collections::HashMap;

use self::types::llvm_type;

/// One entry per lexical scope: the defer statements pushed while that scope
/// was live, in push order (run LIFO on exit, per spec §4.7). Stored by
/// value rather than by reference so the generator never has to tie its own
/// lifetime to the borrowed `Program`.
type DeferFrame = Vec<Stmt>;

/// Branch targets for the innermost enclosing loop, plus the defer-stack
/// depth at loop-body entry so `break`/`continue` know exactly which
/// still-open scopes' defers to run before jumping (spec §4.7).
#[derive(Clone, Copy)]
struct LoopContext<'ctx> {
    continue_target: BasicBlock<'ctx>,
    break_target: BasicBlock<'ctx>,
    defer_depth: usize,
}

pub struct CodeGenerator<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,

    functions: HashMap<String, FunctionValue<'ctx>>,
    function_defs: HashMap<String, Function>,
    struct_defs: HashMap<String, Struct>,
    enum_defs: HashMap<String, Enum>,
    trait_impl_methods: HashMap<(String, String), Vec<String>>,

    variables: HashMap<String, PointerValue<'ctx>>,
    variable_types: HashMap<String, Type>,
    current_function: Option<FunctionValue<'ctx>>,
    defer_stack: Vec<DeferFrame>,
    loop_stack: Vec<LoopContext<'ctx>>,
    closure_counter: usize,
}

impl<'ctx> CodeGenerator<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        let module = context.create_module(module_name);
        runtime::declare_all(context, &module);
        Self {
            context,
            module,
            builder: context.create_builder(),
            functions: HashMap::new(),
            function_defs: HashMap::new(),
            struct_defs: HashMap::new(),
            enum_defs: HashMap::new(),
            trait_impl_methods: HashMap::new(),
            variables: HashMap::new(),
            variable_types: HashMap::new(),
            current_function: None,
            defer_stack: Vec::new(),
            loop_stack: Vec::new(),
            closure_counter: 0,
        }
    }

    /// Renders the generated module — satisfies the "generated module text"
    /// output contract of spec §6 directly.
    pub fn print_to_string(&self) -> String {
        self.module.print_to_string().to_string()
    }

    fn current_function(&self) -> Result<FunctionValue<'ctx>, CodegenError> {
        self.current_function
            .ok_or_else(|| CodegenError::new("no function is being compiled"))
    }

    fn runtime_fn(&self, name: &str) -> Result<FunctionValue<'ctx>, CodegenError> {
        self.functions
            .get(name)
            .copied()
            .ok_or_else(|| CodegenError::new(format!("runtime function `{}` was not declared", name)))
    }

    pub fn compile_program(&mut self, program: &Program) -> Result<(), CodegenError> {
        for item in &program.items {
            match item {
                Item::Struct(s) => {
                    self.struct_defs.insert(s.name.clone(), s.clone());
                }
                Item::Enum(e) => {
                    self.enum_defs.insert(e.name.clone(), e.clone());
                }
                Item::TraitImpl(impl_) => {
                    let type_name = type_name_of(&impl_.for_type);
                    let methods: Vec<String> = impl_.methods.iter().map(|m| m.name.clone()).collect();
                    self.trait_impl_methods
                        .insert((impl_.trait_name.clone(), type_name), methods);
                }
                _ => {}
            }
        }

        for item in &program.items {
            if let Item::Function(f) = item {
                self.function_defs.insert(f.name.clone(), f.clone());
                self.declare_function(f)?;
            }
        }
        for s in self.struct_defs.clone().values() {
            for method in &s.methods {
                let mangled = format!("{}_{}", s.name, method.name);
                self.function_defs.insert(mangled.clone(), method.clone());
                self.declare_named_function(&mangled, method)?;
            }
        }
        for item in &program.items {
            if let Item::TraitImpl(impl_) = item {
                let type_name = type_name_of(&impl_.for_type);
                for method in &impl_.methods {
                    let mangled = format!("{}_{}_{}", type_name, impl_.trait_name, method.name);
                    self.function_defs.insert(mangled.clone(), method.clone());
                    self.declare_named_function(&mangled, method)?;
                }
            }
        }

        for item in &program.items {
            if let Item::Function(f) = item {
                self.compile_function(&f.name, f)?;
            }
        }
        for s in self.struct_defs.clone().values() {
            for method in &s.methods {
                let mangled = format!("{}_{}", s.name, method.name);
                self.compile_function(&mangled, method)?;
            }
        }
        for item in &program.items {
            if let Item::TraitImpl(impl_) = item {
                let type_name = type_name_of(&impl_.for_type);
                for method in &impl_.methods {
                    let mangled = format!("{}_{}_{}", type_name, impl_.trait_name, method.name);
                    self.compile_function(&mangled, method)?;
                }
            }
        }

        Ok(())
    }

    fn declare_function(&mut self, f: &Function) -> Result<(), CodegenError> {
        self.declare_named_function(&f.name, f)
    }

    fn declare_named_function(&mut self, name: &str, f: &Function) -> Result<(), CodegenError> {
        let mut param_types = Vec::new();
        if let Some(receiver) = &f.receiver {
            param_types.push(llvm_type(self.context, &receiver.ty)?.into());
        }
        for param in &f.params {
            param_types.push(llvm_type(self.context, &param.ty)?.into());
        }

        let fn_type = match &f.return_type {
            Some(ty) => {
                let ret = llvm_type(self.context, ty)?;
                fn_type_for(ret, &param_types)
            }
            None => self.context.i32_type().fn_type(&param_types, false),
        };

        let fn_val = self.module.add_function(name, fn_type, None);
        self.functions.insert(name.to_string(), fn_val);
        Ok(())
    }

    fn compile_function(&mut self, name: &str, f: &Function) -> Result<(), CodegenError> {
        let fn_val = *self
            .functions
            .get(name)
            .ok_or_else(|| CodegenError::new(format!("function `{}` was not declared", name)))?;

        self.current_function = Some(fn_val);
        self.variables.clear();
        self.variable_types.clear();
        self.defer_stack.clear();

        let entry = self.context.append_basic_block(fn_val, "entry");
        self.builder.position_at_end(entry);

        let mut offset = 0;
        if let Some(receiver) = &f.receiver {
            self.bind_param(fn_val, 0, "self", &receiver.ty)?;
            offset = 1;
        }
        for (i, param) in f.params.iter().enumerate() {
            self.bind_param(fn_val, i as u32 + offset, &param.name, &param.ty)?;
        }

        self.defer_stack.push(Vec::new());
        self.compile_block(&f.body)?;
        self.defer_stack.pop();

        if self
            .builder
            .get_insert_block()
            .and_then(|b| b.get_terminator())
            .is_none()
        {
            if f.return_type.is_none() {
                let zero = self.context.i32_type().const_int(0, false);
                self.builder
                    .build_return(Some(&zero))
                    .map_err(|e| CodegenError::new(e.to_string()))?;
            } else {
                return Err(CodegenError::new(format!(
                    "function `{}` falls off the end without returning",
                    name
                )));
            }
        }

        Ok(())
    }

    fn bind_param(
        &mut self,
        fn_val: FunctionValue<'ctx>,
        index: u32,
        name: &str,
        ty: &Type,
    ) -> Result<(), CodegenError> {
        let param_val = fn_val
            .get_nth_param(index)
            .ok_or_else(|| CodegenError::new(format!("missing parameter `{}`", name)))?;
        let llvm_ty = llvm_type(self.context, ty)?;
        let alloca = self
            .builder
            .build_alloca(llvm_ty, name)
            .map_err(|e| CodegenError::new(e.to_string()))?;
        self.builder
            .build_store(alloca, param_val)
            .map_err(|e| CodegenError::new(e.to_string()))?;
        self.variables.insert(name.to_string(), alloca);
        self.variable_types.insert(name.to_string(), ty.clone());
        Ok(())
    }

    fn compile_block(&mut self, block: &Block) -> Result<(), CodegenError> {
        self.defer_stack.push(Vec::new());
        for stmt in &block.statements {
            self.compile_stmt(stmt)?;
            if self.block_terminated() {
                break;
            }
        }
        if !self.block_terminated() {
            self.run_defers_for_current_scope()?;
        }
        self.defer_stack.pop();
        Ok(())
    }

    fn block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|b| b.get_terminator())
            .is_some()
    }

    /// Runs (and consumes) the defers belonging to the innermost still-open
    /// scope, LIFO. Used both on normal fall-through and before any early
    /// exit edge.
    fn run_defers_for_current_scope(&mut self) -> Result<(), CodegenError> {
        if let Some(frame) = self.defer_stack.last().cloned() {
            for stmt in frame.into_iter().rev() {
                self.compile_stmt_no_defer_tracking(&stmt)?;
            }
        }
        Ok(())
    }

    /// `return` runs every still-live defer in the function, innermost scope
    /// first (spec §4.7).
    fn run_all_defers(&mut self) -> Result<(), CodegenError> {
        self.run_defers_since(0)
    }

    /// `break`/`continue` run every defer pushed since the given defer-stack
    /// depth, innermost scope first — every scope opened inside the loop
    /// body up to (and including) the body's own scope, but none outside it.
    fn run_defers_since(&mut self, depth: usize) -> Result<(), CodegenError> {
        for frame in self.defer_stack[depth..].to_vec().into_iter().rev() {
            for stmt in frame.into_iter().rev() {
                self.compile_stmt_no_defer_tracking(&stmt)?;
            }
        }
        Ok(())
    }

    fn compile_stmt_no_defer_tracking(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match &stmt.kind {
            StmtKind::Expression(e) => {
                self.compile_expr(e)?;
                Ok(())
            }
            _ => self.compile_stmt(stmt),
        }
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match &stmt.kind {
            StmtKind::Let { name, value, ty, .. } => {
                let compiled = self.compile_expr(value)?;
                let var_ty = ty.clone().unwrap_or_else(|| infer_literal_type(value));
                let llvm_ty = llvm_type(self.context, &var_ty)?;
                let alloca = self
                    .builder
                    .build_alloca(llvm_ty, name)
                    .map_err(|e| CodegenError::new(e.to_string()))?;
                self.builder
                    .build_store(alloca, compiled)
                    .map_err(|e| CodegenError::new(e.to_string()))?;
                self.variables.insert(name.clone(), alloca);
                self.variable_types.insert(name.clone(), var_ty);
                Ok(())
            }
            StmtKind::Assign { target, value } => {
                let compiled = self.compile_expr(value)?;
                let ptr = self.compile_place(target)?;
                self.builder
                    .build_store(ptr, compiled)
                    .map_err(|e| CodegenError::new(e.to_string()))?;
                Ok(())
            }
            StmtKind::CompoundAssign { target, op, value } => {
                let ptr = self.compile_place(target)?;
                let current = self
                    .builder
                    .build_load(self.context.i32_type(), ptr, "compound.lhs")
                    .map_err(|e| CodegenError::new(e.to_string()))?;
                let rhs = self.compile_expr(value)?;
                let result = self.apply_compound(*op, current, rhs)?;
                self.builder
                    .build_store(ptr, result)
                    .map_err(|e| CodegenError::new(e.to_string()))?;
                Ok(())
            }
            StmtKind::Return(expr) => {
                let value = expr.as_ref().map(|e| self.compile_expr(e)).transpose()?;
                self.run_all_defers()?;
                self.builder
                    .build_return(value.as_ref().map(|v| v as &dyn BasicValue))
                    .map_err(|e| CodegenError::new(e.to_string()))?;
                Ok(())
            }
            StmtKind::Break => {
                let ctx = self
                    .loop_stack
                    .last()
                    .copied()
                    .ok_or_else(|| CodegenError::new("`break` outside of a loop"))?;
                self.run_defers_since(ctx.defer_depth)?;
                self.builder
                    .build_unconditional_branch(ctx.break_target)
                    .map_err(|e| CodegenError::new(e.to_string()))?;
                Ok(())
            }
            StmtKind::Continue => {
                let ctx = self
                    .loop_stack
                    .last()
                    .copied()
                    .ok_or_else(|| CodegenError::new("`continue` outside of a loop"))?;
                self.run_defers_since(ctx.defer_depth)?;
                self.builder
                    .build_unconditional_branch(ctx.continue_target)
                    .map_err(|e| CodegenError::new(e.to_string()))?;
                Ok(())
            }
            StmtKind::Defer(inner) => {
                if let Some(frame) = self.defer_stack.last_mut() {
                    frame.push((**inner).clone());
                }
                Ok(())
            }
            StmtKind::If {
                condition,
                then_block,
                elif_branches,
                else_block,
            } => self.compile_if(condition, then_block, elif_branches, else_block.as_ref()),
            StmtKind::While { condition, body } => self.compile_while(condition, body),
            StmtKind::ForRange {
                var,
                start,
                end,
                inclusive,
                body,
            } => self.compile_for_range(var, start, end, *inclusive, body),
            StmtKind::With { .. } => Err(CodegenError::new(
                "`with` must be desugared before codegen",
            )),
            StmtKind::Unsafe(block) => self.compile_block(block),
            StmtKind::Expression(e) => {
                self.compile_expr(e)?;
                Ok(())
            }
        }
    }

    fn compile_if(
        &mut self,
        condition: &Expr,
        then_block: &Block,
        elif_branches: &[(Expr, Block)],
        else_block: Option<&Block>,
    ) -> Result<(), CodegenError> {
        let fn_val = self.current_function()?;
        let cond = self.compile_expr(condition)?.into_int_value();
        let then_bb = self.context.append_basic_block(fn_val, "if.then");
        let else_bb = self.context.append_basic_block(fn_val, "if.else");
        let merge_bb = self.context.append_basic_block(fn_val, "if.merge");

        self.builder
            .build_conditional_branch(cond, then_bb, else_bb)
            .map_err(|e| CodegenError::new(e.to_string()))?;

        self.builder.position_at_end(then_bb);
        self.compile_block(then_block)?;
        if !self.block_terminated() {
            self.builder
                .build_unconditional_branch(merge_bb)
                .map_err(|e| CodegenError::new(e.to_string()))?;
        }

        self.builder.position_at_end(else_bb);
        match elif_branches.split_first() {
            Some(((cond, body), rest)) => {
                self.compile_if(cond, body, rest, else_block)?;
            }
            None => {
                if let Some(block) = else_block {
                    self.compile_block(block)?;
                }
            }
        }
        if !self.block_terminated() {
            self.builder
                .build_unconditional_branch(merge_bb)
                .map_err(|e| CodegenError::new(e.to_string()))?;
        }

        self.builder.position_at_end(merge_bb);
        Ok(())
    }

    fn compile_while(&mut self, condition: &Expr, body: &Block) -> Result<(), CodegenError> {
        let fn_val = self.current_function()?;
        let cond_bb = self.context.append_basic_block(fn_val, "while.cond");
        let body_bb = self.context.append_basic_block(fn_val, "while.body");
        let end_bb = self.context.append_basic_block(fn_val, "while.end");

        self.builder
            .build_unconditional_branch(cond_bb)
            .map_err(|e| CodegenError::new(e.to_string()))?;

        self.builder.position_at_end(cond_bb);
        let cond = self.compile_expr(condition)?.into_int_value();
        self.builder
            .build_conditional_branch(cond, body_bb, end_bb)
            .map_err(|e| CodegenError::new(e.to_string()))?;

        self.builder.position_at_end(body_bb);
        self.loop_stack.push(LoopContext {
            continue_target: cond_bb,
            break_target: end_bb,
            defer_depth: self.defer_stack.len(),
        });
        self.compile_block(body)?;
        self.loop_stack.pop();
        if !self.block_terminated() {
            self.builder
                .build_unconditional_branch(cond_bb)
                .map_err(|e| CodegenError::new(e.to_string()))?;
        }

        self.builder.position_at_end(end_bb);
        Ok(())
    }

    fn compile_for_range(
        &mut self,
        var: &str,
        start: &Expr,
        end: &Expr,
        inclusive: bool,
        body: &Block,
    ) -> Result<(), CodegenError> {
        let fn_val = self.current_function()?;
        let i32t = self.context.i32_type();
        let start_val = self.compile_expr(start)?;
        let end_val = self.compile_expr(end)?.into_int_value();

        let induction = self
            .builder
            .build_alloca(i32t, var)
            .map_err(|e| CodegenError::new(e.to_string()))?;
        self.builder
            .build_store(induction, start_val)
            .map_err(|e| CodegenError::new(e.to_string()))?;
        self.variables.insert(var.to_string(), induction);
        self.variable_types.insert(var.to_string(), Type::i32());

        let cond_bb = self.context.append_basic_block(fn_val, "for.cond");
        let body_bb = self.context.append_basic_block(fn_val, "for.body");
        let inc_bb = self.context.append_basic_block(fn_val, "for.inc");
        let end_bb = self.context.append_basic_block(fn_val, "for.end");

        self.builder
            .build_unconditional_branch(cond_bb)
            .map_err(|e| CodegenError::new(e.to_string()))?;

        self.builder.position_at_end(cond_bb);
        let current = self
            .builder
            .build_load(i32t, induction, "for.i")
            .map_err(|e| CodegenError::new(e.to_string()))?
            .into_int_value();
        let predicate = if inclusive { IntPredicate::SLE } else { IntPredicate::SLT };
        let cond = self
            .builder
            .build_int_compare(predicate, current, end_val, "for.test")
            .map_err(|e| CodegenError::new(e.to_string()))?;
        self.builder
            .build_conditional_branch(cond, body_bb, end_bb)
            .map_err(|e| CodegenError::new(e.to_string()))?;

        self.builder.position_at_end(body_bb);
        self.loop_stack.push(LoopContext {
            continue_target: inc_bb,
            break_target: end_bb,
            defer_depth: self.defer_stack.len(),
        });
        self.compile_block(body)?;
        self.loop_stack.pop();
        if !self.block_terminated() {
            self.builder
                .build_unconditional_branch(inc_bb)
                .map_err(|e| CodegenError::new(e.to_string()))?;
        }

        self.builder.position_at_end(inc_bb);
        let current = self
            .builder
            .build_load(i32t, induction, "for.i")
            .map_err(|e| CodegenError::new(e.to_string()))?
            .into_int_value();
        let one = i32t.const_int(1, false);
        let next = self
            .builder
            .build_int_add(current, one, "for.next")
            .map_err(|e| CodegenError::new(e.to_string()))?;
        self.builder
            .build_store(induction, next)
            .map_err(|e| CodegenError::new(e.to_string()))?;
        self.builder
            .build_unconditional_branch(cond_bb)
            .map_err(|e| CodegenError::new(e.to_string()))?;

        self.builder.position_at_end(end_bb);
        Ok(())
    }

    /// Returns the storage address of an lvalue expression (`Ident` or
    /// `FieldAccess`) for `Assign`/`CompoundAssign`.
    fn compile_place(&mut self, expr: &Expr) -> Result<PointerValue<'ctx>, CodegenError> {
        match &expr.kind {
            ExprKind::Ident(name) => self
                .variables
                .get(name)
                .copied()
                .ok_or_else(|| CodegenError::new(format!("undefined variable `{}`", name))),
            ExprKind::FieldAccess { object, field } => {
                let (ptr, struct_name) = self.compile_place_typed(object)?;
                let struct_def = self
                    .struct_defs
                    .get(&struct_name)
                    .ok_or_else(|| CodegenError::new(format!("unknown struct `{}`", struct_name)))?
                    .clone();
                let index = struct_def
                    .fields
                    .iter()
                    .position(|f| &f.name == field)
                    .ok_or_else(|| CodegenError::new(format!("unknown field `{}`", field)))?;
                let llvm_struct_ty = llvm_type(self.context, &Type::Struct {
                    name: struct_name.clone(),
                    fields: struct_def.fields.iter().map(|f| (f.name.clone(), f.ty.clone())).collect(),
                })?;
                self.builder
                    .build_struct_gep(llvm_struct_ty, ptr, index as u32, field)
                    .map_err(|e| CodegenError::new(e.to_string()))
            }
            _ => Err(CodegenError::new("expression is not assignable")),
        }
    }

    fn compile_place_typed(&mut self, expr: &Expr) -> Result<(PointerValue<'ctx>, String), CodegenError> {
        let ptr = self.compile_place(expr)?;
        let name = match &expr.kind {
            ExprKind::Ident(name) => name.clone(),
            _ => return Err(CodegenError::new("cannot determine static type of place")),
        };
        let ty = self
            .variable_types
            .get(&name)
            .cloned()
            .ok_or_else(|| CodegenError::new(format!("untyped variable `{}`", name)))?;
        Ok((ptr, type_name_of(&ty)))
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        match &expr.kind {
            ExprKind::IntLiteral(n) => Ok(self.context.i32_type().const_int(*n as u64, true).into()),
            ExprKind::FloatLiteral(n) => Ok(self.context.f64_type().const_float(*n).into()),
            ExprKind::BoolLiteral(b) => Ok(self.context.bool_type().const_int(*b as u64, false).into()),
            ExprKind::CharLiteral(c) => Ok(self.context.i32_type().const_int(*c as u64, false).into()),
            ExprKind::StringLiteral(s) => self.compile_string_literal(s),

            ExprKind::Ident(name) => {
                let ptr = *self
                    .variables
                    .get(name)
                    .ok_or_else(|| CodegenError::new(format!("undefined variable `{}`", name)))?;
                let ty = self
                    .variable_types
                    .get(name)
                    .cloned()
                    .unwrap_or(Type::i32());
                let llvm_ty = llvm_type(self.context, &ty)?;
                self.builder
                    .build_load(llvm_ty, ptr, name)
                    .map_err(|e| CodegenError::new(e.to_string()))
            }

            ExprKind::Binary { left, op, right } => self.compile_binary(left, *op, right),
            ExprKind::Unary { op, expr } => self.compile_unary(*op, expr),

            ExprKind::Call { func, args, .. } => self.compile_call(func, args),
            ExprKind::MethodCall { receiver, method, args } => {
                self.compile_method_call(receiver, method, args)
            }
            ExprKind::FieldAccess { object, field } => {
                let (ptr, struct_name) = self.compile_place_typed(object)?;
                let struct_def = self
                    .struct_defs
                    .get(&struct_name)
                    .ok_or_else(|| CodegenError::new(format!("unknown struct `{}`", struct_name)))?
                    .clone();
                let index = struct_def
                    .fields
                    .iter()
                    .position(|f| &f.name == field)
                    .ok_or_else(|| CodegenError::new(format!("unknown field `{}`", field)))?;
                let field_ty = struct_def.fields[index].ty.clone();
                let llvm_struct_ty = llvm_type(self.context, &Type::Struct {
                    name: struct_name,
                    fields: struct_def.fields.iter().map(|f| (f.name.clone(), f.ty.clone())).collect(),
                })?;
                let gep = self
                    .builder
                    .build_struct_gep(llvm_struct_ty, ptr, index as u32, field)
                    .map_err(|e| CodegenError::new(e.to_string()))?;
                let llvm_field_ty = llvm_type(self.context, &field_ty)?;
                self.builder
                    .build_load(llvm_field_ty, gep, field)
                    .map_err(|e| CodegenError::new(e.to_string()))
            }
            ExprKind::Index { object, index } => self.compile_index(object, index),

            ExprKind::ArrayLiteral(items) => self.compile_array_literal(items),
            ExprKind::TupleLiteral(items) => self.compile_tuple_literal(items),
            ExprKind::StructLiteral { name, fields, .. } => self.compile_struct_literal(name, fields),
            ExprKind::EnumLiteral { enum_name, variant, data } => {
                self.compile_enum_literal(enum_name, variant, data)
            }

            ExprKind::Reference { expr: inner, .. } => {
                let ptr = self.compile_place(inner);
                match ptr {
                    Ok(p) => Ok(p.into()),
                    Err(_) => self.compile_expr(inner),
                }
            }
            ExprKind::Deref(inner) => {
                let value = self.compile_expr(inner)?;
                Ok(value)
            }

            ExprKind::Match { scrutinee, arms } => self.compile_match(scrutinee, arms),
            ExprKind::Block { statements, tail } => {
                for stmt in statements {
                    self.compile_stmt(stmt)?;
                }
                match tail {
                    Some(tail) => self.compile_expr(tail),
                    None => Ok(self.context.i32_type().const_int(0, false).into()),
                }
            }

            ExprKind::Cast { expr, target_type } => self.compile_cast(expr, target_type),
            ExprKind::Try(inner) => self.compile_try(inner),

            ExprKind::ParamClosure { .. } => Err(CodegenError::new(
                "parameter closure reached codegen — must be inlined first",
            )),
            ExprKind::RuntimeClosure { params, return_type, body, captures } => {
                self.compile_runtime_closure(params, return_type, body, captures)
            }
        }
    }

    fn compile_string_literal(&mut self, s: &str) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let global = self
            .builder
            .build_global_string_ptr(s, "str")
            .map_err(|e| CodegenError::new(e.to_string()))?;
        let len = self.context.i64_type().const_int(s.len() as u64, false);
        let struct_ty = types::string_type(self.context);
        let value = struct_ty.const_named_struct(&[global.as_pointer_value().into(), len.into()]);
        Ok(value.into())
    }

    fn compile_binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let lhs = self.compile_expr(left)?;
        let rhs = self.compile_expr(right)?;
        if lhs.is_float_value() || rhs.is_float_value() {
            return self.compile_float_binary(lhs, op, rhs);
        }
        self.compile_int_binary(lhs, op, rhs)
    }

    fn compile_int_binary(&mut self, lhs: BasicValueEnum<'ctx>, op: BinaryOp, rhs: BasicValueEnum<'ctx>) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let l = lhs.into_int_value();
        let r = rhs.into_int_value();
        let b = &self.builder;
        let result = match op {
            BinaryOp::Add => b.build_int_add(l, r, "add").map(Into::into),
            BinaryOp::Sub => b.build_int_sub(l, r, "sub").map(Into::into),
            BinaryOp::Mul => b.build_int_mul(l, r, "mul").map(Into::into),
            BinaryOp::Div => b.build_int_signed_div(l, r, "div").map(Into::into),
            BinaryOp::Mod => b.build_int_signed_rem(l, r, "rem").map(Into::into),
            BinaryOp::Eq => b.build_int_compare(IntPredicate::EQ, l, r, "eq").map(Into::into),
            BinaryOp::NotEq => b.build_int_compare(IntPredicate::NE, l, r, "ne").map(Into::into),
            BinaryOp::Lt => b.build_int_compare(IntPredicate::SLT, l, r, "lt").map(Into::into),
            BinaryOp::LtEq => b.build_int_compare(IntPredicate::SLE, l, r, "le").map(Into::into),
            BinaryOp::Gt => b.build_int_compare(IntPredicate::SGT, l, r, "gt").map(Into::into),
            BinaryOp::GtEq => b.build_int_compare(IntPredicate::SGE, l, r, "ge").map(Into::into),
            BinaryOp::And => b.build_and(l, r, "and").map(Into::into),
            BinaryOp::Or => b.build_or(l, r, "or").map(Into::into),
            BinaryOp::BitAnd => b.build_and(l, r, "bitand").map(Into::into),
            BinaryOp::BitOr => b.build_or(l, r, "bitor").map(Into::into),
            BinaryOp::BitXor => b.build_xor(l, r, "bitxor").map(Into::into),
            BinaryOp::Shl => b.build_left_shift(l, r, "shl").map(Into::into),
            BinaryOp::Shr => b.build_right_shift(l, r, true, "shr").map(Into::into),
        };
        result.map_err(|e| CodegenError::new(e.to_string()))
    }

    fn compile_float_binary(&mut self, lhs: BasicValueEnum<'ctx>, op: BinaryOp, rhs: BasicValueEnum<'ctx>) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let l = lhs.into_float_value();
        let r = rhs.into_float_value();
        let b = &self.builder;
        use inkwell::FloatPredicate;
        let result = match op {
            BinaryOp::Add => b.build_float_add(l, r, "fadd").map(Into::into),
            BinaryOp::Sub => b.build_float_sub(l, r, "fsub").map(Into::into),
            BinaryOp::Mul => b.build_float_mul(l, r, "fmul").map(Into::into),
            BinaryOp::Div => b.build_float_div(l, r, "fdiv").map(Into::into),
            BinaryOp::Mod => b.build_float_rem(l, r, "frem").map(Into::into),
            BinaryOp::Eq => b.build_float_compare(FloatPredicate::OEQ, l, r, "feq").map(Into::into),
            BinaryOp::NotEq => b.build_float_compare(FloatPredicate::ONE, l, r, "fne").map(Into::into),
            BinaryOp::Lt => b.build_float_compare(FloatPredicate::OLT, l, r, "flt").map(Into::into),
            BinaryOp::LtEq => b.build_float_compare(FloatPredicate::OLE, l, r, "fle").map(Into::into),
            BinaryOp::Gt => b.build_float_compare(FloatPredicate::OGT, l, r, "fgt").map(Into::into),
            BinaryOp::GtEq => b.build_float_compare(FloatPredicate::OGE, l, r, "fge").map(Into::into),
            _ => return Err(CodegenError::new(format!("operator {:?} is not defined on floats", op))),
        };
        result.map_err(|e| CodegenError::new(e.to_string()))
    }

    fn apply_compound(&mut self, op: pyrite_ast::CompoundOp, lhs: BasicValueEnum<'ctx>, rhs: BasicValueEnum<'ctx>) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        use pyrite_ast::CompoundOp;
        let binary_op = match op {
            CompoundOp::Add => BinaryOp::Add,
            CompoundOp::Sub => BinaryOp::Sub,
            CompoundOp::Mul => BinaryOp::Mul,
            CompoundOp::Div => BinaryOp::Div,
            CompoundOp::Mod => BinaryOp::Mod,
            CompoundOp::BitAnd => BinaryOp::BitAnd,
            CompoundOp::BitOr => BinaryOp::BitOr,
            CompoundOp::BitXor => BinaryOp::BitXor,
            CompoundOp::Shl => BinaryOp::Shl,
            CompoundOp::Shr => BinaryOp::Shr,
        };
        self.compile_int_binary(lhs, binary_op, rhs)
    }

    fn compile_unary(&mut self, op: UnaryOp, expr: &Expr) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let value = self.compile_expr(expr)?;
        match op {
            UnaryOp::Neg if value.is_float_value() => self
                .builder
                .build_float_neg(value.into_float_value(), "fneg")
                .map(Into::into)
                .map_err(|e| CodegenError::new(e.to_string())),
            UnaryOp::Neg => self
                .builder
                .build_int_neg(value.into_int_value(), "neg")
                .map(Into::into)
                .map_err(|e| CodegenError::new(e.to_string())),
            UnaryOp::Not => self
                .builder
                .build_not(value.into_int_value(), "not")
                .map(Into::into)
                .map_err(|e| CodegenError::new(e.to_string())),
        }
    }

    fn compile_call(&mut self, func: &Expr, args: &[Expr]) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let name = match &func.kind {
            ExprKind::Ident(name) => name.clone(),
            _ => return Err(CodegenError::new("indirect calls through non-identifier callees are only supported for closure values")),
        };

        if let Some(fn_val) = self.functions.get(&name).copied() {
            let compiled: Result<Vec<_>, _> = args.iter().map(|a| self.compile_expr(a)).collect();
            let compiled = compiled?;
            let metadata: Vec<_> = compiled.iter().map(|v| (*v).into()).collect();
            let call = self
                .builder
                .build_call(fn_val, &metadata, "call")
                .map_err(|e| CodegenError::new(e.to_string()))?;
            return call
                .try_as_basic_value()
                .left()
                .ok_or_else(|| CodegenError::new(format!("call to `{}` produced no value", name)));
        }

        // Calling a closure-typed variable: {fn ptr, env ptr} pair.
        if let Some(ptr) = self.variables.get(&name).copied() {
            let closure_ty = self
                .variable_types
                .get(&name)
                .cloned()
                .ok_or_else(|| CodegenError::new(format!("untyped closure `{}`", name)))?;
            let llvm_ty = llvm_type(self.context, &closure_ty)?;
            let loaded = self
                .builder
                .build_load(llvm_ty, ptr, "closure")
                .map_err(|e| CodegenError::new(e.to_string()))?
                .into_struct_value();
            let fn_ptr = self
                .builder
                .build_extract_value(loaded, 0, "fn_ptr")
                .map_err(|e| CodegenError::new(e.to_string()))?
                .into_pointer_value();
            let env_ptr = self
                .builder
                .build_extract_value(loaded, 1, "env_ptr")
                .map_err(|e| CodegenError::new(e.to_string()))?;
            let compiled: Result<Vec<_>, _> = args.iter().map(|a| self.compile_expr(a)).collect();
            let mut metadata: Vec<inkwell::values::BasicMetadataValueEnum> = vec![env_ptr.into()];
            metadata.extend(compiled?.iter().map(|v| (*v).into()));
            let Type::Function { return_type, param_types } = closure_ty else {
                return Err(CodegenError::new(format!("`{}` is not callable", name)));
            };
            let mut fn_param_types = vec![self.context.ptr_type(AddressSpace::default()).into()];
            for p in &param_types {
                fn_param_types.push(llvm_type(self.context, p)?.into());
            }
            let fn_ty = match &return_type {
                Some(ret) => fn_type_for(llvm_type(self.context, ret)?, &fn_param_types),
                None => self.context.i32_type().fn_type(&fn_param_types, false),
            };
            let call = self
                .builder
                .build_indirect_call(fn_ty, fn_ptr, &metadata, "closure_call")
                .map_err(|e| CodegenError::new(e.to_string()))?;
            return call
                .try_as_basic_value()
                .left()
                .ok_or_else(|| CodegenError::new("closure call produced no value".to_string()));
        }

        Err(CodegenError::new(format!("call to undefined function `{}`", name)))
    }

    /// Direct method dispatch (never v-tables): inherent `T_method` first,
    /// then `T_Trait_method` for each trait impl on `T`.
    fn compile_method_call(&mut self, receiver: &Expr, method: &str, args: &[Expr]) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let (receiver_ptr, type_name) = self.compile_place_typed(receiver).or_else(|_| {
            let value = self.compile_expr(receiver)?;
            Err::<(PointerValue<'ctx>, String), CodegenError>(CodegenError::new(format!(
                "method receiver is not addressable (got value of kind producing {:?})",
                value.get_type()
            )))
        })?;

        let inherent = format!("{}_{}", type_name, method);
        let mangled = if self.functions.contains_key(&inherent) {
            inherent
        } else {
            self.trait_impl_methods
                .iter()
                .find(|((_, ty), methods)| ty == &type_name && methods.contains(&method.to_string()))
                .map(|((trait_name, ty), _)| format!("{}_{}_{}", ty, trait_name, method))
                .ok_or_else(|| CodegenError::new(format!("no method `{}` on `{}`", method, type_name)))?
        };

        let fn_val = *self
            .functions
            .get(&mangled)
            .ok_or_else(|| CodegenError::new(format!("method `{}` was not declared", mangled)))?;

        let mut metadata: Vec<inkwell::values::BasicMetadataValueEnum> = vec![receiver_ptr.into()];
        for arg in args {
            metadata.push(self.compile_expr(arg)?.into());
        }
        let call = self
            .builder
            .build_call(fn_val, &metadata, "method_call")
            .map_err(|e| CodegenError::new(e.to_string()))?;
        call.try_as_basic_value()
            .left()
            .ok_or_else(|| CodegenError::new(format!("method `{}` produced no value", mangled)))
    }

    fn compile_index(&mut self, object: &Expr, index: &Expr) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let (object_ptr, array_ty) = match &object.kind {
            ExprKind::Ident(name) => {
                let ptr = *self
                    .variables
                    .get(name)
                    .ok_or_else(|| CodegenError::new(format!("undefined variable `{}`", name)))?;
                let ty = self
                    .variable_types
                    .get(name)
                    .cloned()
                    .ok_or_else(|| CodegenError::new(format!("untyped variable `{}`", name)))?;
                (ptr, ty)
            }
            _ => return Err(CodegenError::new("indexing is only supported on named variables")),
        };
        let Type::Array { element, size } = &array_ty else {
            return Err(CodegenError::new("index target is not an array"));
        };

        let index_val = self.compile_expr(index)?.into_int_value();
        let size_val = self.context.i64_type().const_int(*size, false);
        let index_ext = self
            .builder
            .build_int_z_extend(index_val, self.context.i64_type(), "idx64")
            .map_err(|e| CodegenError::new(e.to_string()))?;
        let check_fn = self.runtime_fn("pyrite_check_bounds")?;
        self.builder
            .build_call(check_fn, &[index_ext.into(), size_val.into()], "bounds_check")
            .map_err(|e| CodegenError::new(e.to_string()))?;

        let elem_ty = llvm_type(self.context, element)?;
        let array_llvm_ty = elem_ty.array_type(*size as u32);
        let zero = self.context.i32_type().const_int(0, false);
        let gep = unsafe {
            self.builder
                .build_gep(array_llvm_ty, object_ptr, &[zero, index_val], "elem_ptr")
                .map_err(|e| CodegenError::new(e.to_string()))?
        };
        self.builder
            .build_load(elem_ty, gep, "elem")
            .map_err(|e| CodegenError::new(e.to_string()))
    }

    fn compile_array_literal(&mut self, items: &[Expr]) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let values: Result<Vec<_>, _> = items.iter().map(|e| self.compile_expr(e)).collect();
        let values = values?;
        let elem_ty = values
            .first()
            .map(|v| v.get_type())
            .unwrap_or_else(|| self.context.i32_type().into());
        let array_ty = elem_ty.array_type(values.len() as u32);
        let alloca = self
            .builder
            .build_alloca(array_ty, "array")
            .map_err(|e| CodegenError::new(e.to_string()))?;
        for (i, value) in values.iter().enumerate() {
            let idx = self.context.i32_type().const_int(i as u64, false);
            let zero = self.context.i32_type().const_int(0, false);
            let gep = unsafe {
                self.builder
                    .build_gep(array_ty, alloca, &[zero, idx], "elem")
                    .map_err(|e| CodegenError::new(e.to_string()))?
            };
            self.builder
                .build_store(gep, *value)
                .map_err(|e| CodegenError::new(e.to_string()))?;
        }
        self.builder
            .build_load(array_ty, alloca, "array_val")
            .map_err(|e| CodegenError::new(e.to_string()))
    }

    fn compile_tuple_literal(&mut self, items: &[Expr]) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let values: Result<Vec<_>, _> = items.iter().map(|e| self.compile_expr(e)).collect();
        let values = values?;
        let types: Vec<_> = values.iter().map(|v| v.get_type()).collect();
        let struct_ty = self.context.struct_type(&types, false);
        let mut agg = struct_ty.get_undef();
        for (i, value) in values.iter().enumerate() {
            agg = self
                .builder
                .build_insert_value(agg, *value, i as u32, "tuple")
                .map_err(|e| CodegenError::new(e.to_string()))?
                .into_struct_value();
        }
        Ok(agg.into())
    }

    fn compile_struct_literal(&mut self, name: &str, fields: &[(String, Expr)]) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let struct_def = self
            .struct_defs
            .get(name)
            .ok_or_else(|| CodegenError::new(format!("unknown struct `{}`", name)))?
            .clone();
        let ty = Type::Struct {
            name: name.to_string(),
            fields: struct_def.fields.iter().map(|f| (f.name.clone(), f.ty.clone())).collect(),
        };
        let llvm_ty = llvm_type(self.context, &ty)?;
        let struct_ty = llvm_ty.into_struct_type();
        let mut agg = struct_ty.get_undef();
        for decl in &struct_def.fields {
            let (_, expr) = fields
                .iter()
                .find(|(n, _)| n == &decl.name)
                .ok_or_else(|| CodegenError::new(format!("missing field `{}` in struct literal", decl.name)))?;
            let value = self.compile_expr(expr)?;
            let index = struct_def
                .fields
                .iter()
                .position(|f| f.name == decl.name)
                .ok_or_else(|| CodegenError::new(format!("unknown field `{}`", decl.name)))?;
            agg = self
                .builder
                .build_insert_value(agg, value, index as u32, &decl.name)
                .map_err(|e| CodegenError::new(e.to_string()))?
                .into_struct_value();
        }
        Ok(agg.into())
    }

    /// An enum literal materializes the tagged union directly — never a
    /// call (spec §4.7).
    fn compile_enum_literal(&mut self, enum_name: &str, variant: &str, data: &[Expr]) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let enum_def = self
            .enum_defs
            .get(enum_name)
            .ok_or_else(|| CodegenError::new(format!("unknown enum `{}`", enum_name)))?
            .clone();
        let tag = enum_def
            .variants
            .iter()
            .position(|v| v.name == variant)
            .ok_or_else(|| CodegenError::new(format!("unknown variant `{}`", variant)))?;

        let has_payload = enum_def.variants.iter().any(|v| !v.data.is_empty());
        if !has_payload {
            return Ok(self.context.i32_type().const_int(tag as u64, false).into());
        }

        let payload_fields = types::max_payload_fields(
            &enum_def
                .variants
                .iter()
                .map(|v| (v.name.clone(), if v.data.is_empty() { None } else { Some(v.data.clone()) }))
                .collect::<Vec<_>>(),
        );
        let mut field_types = vec![self.context.i32_type().into()];
        field_types.extend((0..payload_fields).map(|_| self.context.i64_type().into()));
        let struct_ty = self.context.struct_type(&field_types, false);
        let mut agg = struct_ty.get_undef();
        agg = self
            .builder
            .build_insert_value(agg, self.context.i32_type().const_int(tag as u64, false), 0, "tag")
            .map_err(|e| CodegenError::new(e.to_string()))?
            .into_struct_value();

        for (i, expr) in data.iter().enumerate() {
            let value = self.compile_expr(expr)?;
            let widened = self.widen_to_i64(value)?;
            agg = self
                .builder
                .build_insert_value(agg, widened, (i + 1) as u32, "payload")
                .map_err(|e| CodegenError::new(e.to_string()))?
                .into_struct_value();
        }
        Ok(agg.into())
    }

    fn widen_to_i64(&mut self, value: BasicValueEnum<'ctx>) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        if let BasicValueEnum::IntValue(i) = value {
            if i.get_type().get_bit_width() < 64 {
                return self
                    .builder
                    .build_int_z_extend(i, self.context.i64_type(), "widen")
                    .map(Into::into)
                    .map_err(|e| CodegenError::new(e.to_string()));
            }
        }
        Ok(value)
    }

    /// `match` lowers to chained compare-and-branch: each arm is a test
    /// block followed by the arm body block, first match wins (spec §4.7).
    fn compile_match(&mut self, scrutinee: &Expr, arms: &[pyrite_ast::MatchArm]) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let fn_val = self.current_function()?;
        let scrutinee_val = self.compile_expr(scrutinee)?;
        let merge_bb = self.context.append_basic_block(fn_val, "match.merge");
        let mut incoming: Vec<(BasicValueEnum<'ctx>, inkwell::basic_block::BasicBlock<'ctx>)> = Vec::new();

        for (i, arm) in arms.iter().enumerate() {
            let is_last = i == arms.len() - 1;
            let test_bb = self.context.append_basic_block(fn_val, "match.test");
            let body_bb = self.context.append_basic_block(fn_val, "match.body");
            let next_bb = if is_last {
                merge_bb
            } else {
                self.context.append_basic_block(fn_val, "match.next")
            };

            self.builder
                .build_unconditional_branch(test_bb)
                .map_err(|e| CodegenError::new(e.to_string()))?;
            self.builder.position_at_end(test_bb);

            let scrutinee_ty = self.static_type_of(scrutinee).unwrap_or(Type::i32());
            match &arm.pattern {
                Pattern::Wildcard | Pattern::Ident(_) => {
                    if let Pattern::Ident(name) = &arm.pattern {
                        self.bind_pattern_ident(name, scrutinee_val, scrutinee_ty.clone());
                    }
                    self.builder
                        .build_unconditional_branch(body_bb)
                        .map_err(|e| CodegenError::new(e.to_string()))?;
                }
                Pattern::Literal(lit) => {
                    let lit_val = self.compile_expr(lit)?;
                    let cond = self.values_equal(scrutinee_val, lit_val)?;
                    self.builder
                        .build_conditional_branch(cond, body_bb, next_bb)
                        .map_err(|e| CodegenError::new(e.to_string()))?;
                }
                Pattern::Enum { name: _, variant, data } => {
                    let enum_struct = scrutinee_val.into_struct_value();
                    let tag = self
                        .builder
                        .build_extract_value(enum_struct, 0, "tag")
                        .map_err(|e| CodegenError::new(e.to_string()))?
                        .into_int_value();
                    let expected = self.variant_tag(scrutinee, variant)?;
                    let expected_val = self.context.i32_type().const_int(expected as u64, false);
                    let cond = self
                        .builder
                        .build_int_compare(IntPredicate::EQ, tag, expected_val, "tag_eq")
                        .map_err(|e| CodegenError::new(e.to_string()))?;
                    self.builder
                        .build_conditional_branch(cond, body_bb, next_bb)
                        .map_err(|e| CodegenError::new(e.to_string()))?;
                    self.builder.position_at_end(body_bb);
                    let payload_types = self
                        .enum_defs
                        .get(&type_name_of(&scrutinee_ty))
                        .and_then(|e| e.variants.iter().find(|v| &v.name == variant))
                        .map(|v| v.data.clone())
                        .unwrap_or_default();
                    for (i, pat) in data.iter().enumerate() {
                        if let Pattern::Ident(name) = pat {
                            let payload = self
                                .builder
                                .build_extract_value(enum_struct, (i + 1) as u32, "payload")
                                .map_err(|e| CodegenError::new(e.to_string()))?;
                            // Payload slots are always widened to i64 in the tagged
                            // union; narrow back to the variant's declared field
                            // type so later reads of this binding load correctly.
                            let field_ty = payload_types.get(i).cloned().unwrap_or(Type::Int(IntWidth::W64));
                            let narrowed = self.narrow_from_i64(payload, &field_ty)?;
                            self.bind_pattern_ident(name, narrowed, field_ty);
                        }
                    }
                }
                _ => {
                    self.builder
                        .build_unconditional_branch(body_bb)
                        .map_err(|e| CodegenError::new(e.to_string()))?;
                }
            }

            self.builder.position_at_end(body_bb);
            let body_val = self.compile_expr(&arm.body)?;
            if !self.block_terminated() {
                let current_block = self
                    .builder
                    .get_insert_block()
                    .ok_or_else(|| CodegenError::new("builder has no current block"))?;
                incoming.push((body_val, current_block));
                self.builder
                    .build_unconditional_branch(merge_bb)
                    .map_err(|e| CodegenError::new(e.to_string()))?;
            }

            if !is_last {
                self.builder.position_at_end(next_bb);
            }
        }

        self.builder.position_at_end(merge_bb);
        if incoming.is_empty() {
            return Ok(self.context.i32_type().const_int(0, false).into());
        }
        let phi = self
            .builder
            .build_phi(incoming[0].0.get_type(), "match.result")
            .map_err(|e| CodegenError::new(e.to_string()))?;
        for (value, block) in &incoming {
            phi.add_incoming(&[(value, *block)]);
        }
        Ok(phi.as_basic_value())
    }

    fn bind_pattern_ident(&mut self, name: &str, value: BasicValueEnum<'ctx>, ty: Type) {
        let alloca = self.builder.build_alloca(value.get_type(), name);
        if let Ok(alloca) = alloca {
            let _ = self.builder.build_store(alloca, value);
            self.variables.insert(name.to_string(), alloca);
            self.variable_types.insert(name.to_string(), ty);
        }
    }

    /// The statically known type of a place expression already tracked in
    /// `variable_types`, used to recover a match scrutinee's type for
    /// pattern-binding and variant-tag lookups.
    fn static_type_of(&self, expr: &Expr) -> Option<Type> {
        match &expr.kind {
            ExprKind::Ident(name) => self.variable_types.get(name).cloned(),
            _ => None,
        }
    }

    /// Narrows a widened `i64` enum payload slot back to its declared field
    /// type (spec §4.7's tagged-union layout widens every payload to `i64`).
    fn narrow_from_i64(&mut self, value: BasicValueEnum<'ctx>, target: &Type) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let llvm_target = llvm_type(self.context, target)?;
        if let (BasicValueEnum::IntValue(i), true) = (value, llvm_target.is_int_type()) {
            let target_int = llvm_target.into_int_type();
            if target_int.get_bit_width() < i.get_type().get_bit_width() {
                return self
                    .builder
                    .build_int_truncate(i, target_int, "narrow")
                    .map(Into::into)
                    .map_err(|e| CodegenError::new(e.to_string()));
            }
        }
        Ok(value)
    }

    fn variant_tag(&self, scrutinee: &Expr, variant: &str) -> Result<usize, CodegenError> {
        let enum_name = match &scrutinee.kind {
            ExprKind::Ident(name) => self
                .variable_types
                .get(name)
                .map(type_name_of)
                .unwrap_or_default(),
            _ => String::new(),
        };
        self.enum_defs
            .get(&enum_name)
            .and_then(|e| e.variants.iter().position(|v| v.name == variant))
            .ok_or_else(|| CodegenError::new(format!("unknown variant `{}`", variant)))
    }

    fn values_equal(&mut self, a: BasicValueEnum<'ctx>, b: BasicValueEnum<'ctx>) -> Result<inkwell::values::IntValue<'ctx>, CodegenError> {
        if a.is_int_value() {
            self.builder
                .build_int_compare(IntPredicate::EQ, a.into_int_value(), b.into_int_value(), "eq")
                .map_err(|e| CodegenError::new(e.to_string()))
        } else {
            Err(CodegenError::new("unsupported literal pattern comparison"))
        }
    }

    fn compile_cast(&mut self, expr: &Expr, target: &Type) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let value = self.compile_expr(expr)?;
        let target_llvm = llvm_type(self.context, target)?;
        if value.is_int_value() && target_llvm.is_int_type() {
            return self
                .builder
                .build_int_cast(value.into_int_value(), target_llvm.into_int_type(), "cast")
                .map(Into::into)
                .map_err(|e| CodegenError::new(e.to_string()));
        }
        if value.is_int_value() && target_llvm.is_float_type() {
            return self
                .builder
                .build_signed_int_to_float(value.into_int_value(), target_llvm.into_float_type(), "cast")
                .map(Into::into)
                .map_err(|e| CodegenError::new(e.to_string()));
        }
        if value.is_float_value() && target_llvm.is_int_type() {
            return self
                .builder
                .build_float_to_signed_int(value.into_float_value(), target_llvm.into_int_type(), "cast")
                .map(Into::into)
                .map_err(|e| CodegenError::new(e.to_string()));
        }
        Ok(value)
    }

    /// `try e`: if the Result's tag is `Err`, run every live defer and
    /// return the whole `Result` as-is; otherwise decode the `Ok` payload.
    fn compile_try(&mut self, inner: &Expr) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let fn_val = self.current_function()?;
        let result = self.compile_expr(inner)?.into_struct_value();
        let tag = self
            .builder
            .build_extract_value(result, 0, "result.tag")
            .map_err(|e| CodegenError::new(e.to_string()))?
            .into_int_value();
        let zero = self.context.i32_type().const_int(0, false);
        let is_ok = self
            .builder
            .build_int_compare(IntPredicate::EQ, tag, zero, "is_ok")
            .map_err(|e| CodegenError::new(e.to_string()))?;

        let ok_bb = self.context.append_basic_block(fn_val, "try.ok");
        let err_bb = self.context.append_basic_block(fn_val, "try.err");
        self.builder
            .build_conditional_branch(is_ok, ok_bb, err_bb)
            .map_err(|e| CodegenError::new(e.to_string()))?;

        self.builder.position_at_end(err_bb);
        self.run_all_defers()?;
        self.builder
            .build_return(Some(&result))
            .map_err(|e| CodegenError::new(e.to_string()))?;

        self.builder.position_at_end(ok_bb);
        self.builder
            .build_extract_value(result, 1, "result.ok")
            .map_err(|e| CodegenError::new(e.to_string()))
    }

    /// Runtime closures lower to a top-level function whose first hidden
    /// parameter is the environment pointer; the closure value itself is the
    /// `{fn ptr, env ptr}` pair (spec §4.7). Captures are copied into a
    /// malloc'd buffer of `i64` slots (the same widened-scalar convention the
    /// tagged-union enum layout uses) and unpacked back into locals of the
    /// same name at the top of the generated function, so the body compiles
    /// exactly as if those names were still in scope.
    fn compile_runtime_closure(
        &mut self,
        params: &[Param],
        return_type: &Option<Type>,
        body: &Expr,
        captures: &[String],
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let ptr_ty = self.context.ptr_type(AddressSpace::default());
        let captured_types: Vec<(String, Type)> = captures
            .iter()
            .map(|name| (name.clone(), self.variable_types.get(name).cloned().unwrap_or_else(Type::i32)))
            .collect();

        let env_ptr = if captures.is_empty() {
            ptr_ty.const_null()
        } else {
            let malloc = self.runtime_fn("malloc")?;
            let size = self.context.i64_type().const_int((captures.len() * 8) as u64, false);
            let call = self
                .builder
                .build_call(malloc, &[size.into()], "closure_env")
                .map_err(|e| CodegenError::new(e.to_string()))?;
            let env = call
                .try_as_basic_value()
                .left()
                .ok_or_else(|| CodegenError::new("malloc produced no value".to_string()))?
                .into_pointer_value();
            for (i, (name, ty)) in captured_types.iter().enumerate() {
                let src_ptr = *self.variables.get(name).ok_or_else(|| {
                    CodegenError::new(format!("closure captures undefined variable `{}`", name))
                })?;
                let llvm_ty = llvm_type(self.context, ty)?;
                let value = self
                    .builder
                    .build_load(llvm_ty, src_ptr, "capture")
                    .map_err(|e| CodegenError::new(e.to_string()))?;
                let widened = self.widen_to_i64(value)?;
                let slot = unsafe {
                    self.builder
                        .build_gep(
                            self.context.i64_type(),
                            env,
                            &[self.context.i32_type().const_int(i as u64, false)],
                            "capture_slot",
                        )
                        .map_err(|e| CodegenError::new(e.to_string()))?
                };
                self.builder
                    .build_store(slot, widened)
                    .map_err(|e| CodegenError::new(e.to_string()))?;
            }
            env
        };

        let fn_val = self.declare_closure_function(params, return_type)?;
        self.compile_closure_body(fn_val, params, &captured_types, body)?;
        let fn_ptr = fn_val.as_global_value().as_pointer_value();

        let closure_ty = self.context.struct_type(&[ptr_ty.into(), ptr_ty.into()], false);
        let mut agg = closure_ty.get_undef();
        agg = self
            .builder
            .build_insert_value(agg, fn_ptr, 0, "fn_ptr")
            .map_err(|e| CodegenError::new(e.to_string()))?
            .into_struct_value();
        agg = self
            .builder
            .build_insert_value(agg, env_ptr, 1, "env_ptr")
            .map_err(|e| CodegenError::new(e.to_string()))?
            .into_struct_value();
        Ok(agg.into())
    }

    /// Declares the synthesized top-level function a runtime closure lowers
    /// to: environment pointer first, then the closure's own parameters.
    fn declare_closure_function(
        &mut self,
        params: &[Param],
        return_type: &Option<Type>,
    ) -> Result<FunctionValue<'ctx>, CodegenError> {
        let ptr_ty = self.context.ptr_type(AddressSpace::default());
        let mut param_types: Vec<inkwell::types::BasicMetadataTypeEnum> = vec![ptr_ty.into()];
        for param in params {
            param_types.push(llvm_type(self.context, &param.ty)?.into());
        }
        let fn_type = match return_type {
            Some(ty) => fn_type_for(llvm_type(self.context, ty)?, &param_types),
            None => self.context.i32_type().fn_type(&param_types, false),
        };
        let name = format!("__closure_{}", self.closure_counter);
        self.closure_counter += 1;
        Ok(self.module.add_function(&name, fn_type, None))
    }

    /// Compiles a closure's body into the function `declare_closure_function`
    /// just declared, saving and restoring every bit of generator state that
    /// `compile_function` would otherwise own exclusively — a closure can be
    /// created in the middle of compiling its enclosing function, so codegen
    /// must return to exactly where it left off once the closure is done.
    fn compile_closure_body(
        &mut self,
        fn_val: FunctionValue<'ctx>,
        params: &[Param],
        captured_types: &[(String, Type)],
        body: &Expr,
    ) -> Result<(), CodegenError> {
        let outer_block = self.builder.get_insert_block();
        let outer_function = self.current_function;
        let outer_variables = std::mem::take(&mut self.variables);
        let outer_variable_types = std::mem::take(&mut self.variable_types);
        let outer_defer_stack = std::mem::take(&mut self.defer_stack);
        let outer_loop_stack = std::mem::take(&mut self.loop_stack);

        self.current_function = Some(fn_val);
        let entry = self.context.append_basic_block(fn_val, "entry");
        self.builder.position_at_end(entry);

        let env_param = fn_val
            .get_nth_param(0)
            .ok_or_else(|| CodegenError::new("closure function is missing its environment parameter"))?
            .into_pointer_value();
        for (i, (name, ty)) in captured_types.iter().enumerate() {
            let slot = unsafe {
                self.builder
                    .build_gep(
                        self.context.i64_type(),
                        env_param,
                        &[self.context.i32_type().const_int(i as u64, false)],
                        "capture_slot",
                    )
                    .map_err(|e| CodegenError::new(e.to_string()))?
            };
            let raw = self
                .builder
                .build_load(self.context.i64_type(), slot, "capture")
                .map_err(|e| CodegenError::new(e.to_string()))?;
            let narrowed = self.narrow_from_i64(raw, ty)?;
            let llvm_ty = llvm_type(self.context, ty)?;
            let alloca = self
                .builder
                .build_alloca(llvm_ty, name)
                .map_err(|e| CodegenError::new(e.to_string()))?;
            self.builder
                .build_store(alloca, narrowed)
                .map_err(|e| CodegenError::new(e.to_string()))?;
            self.variables.insert(name.clone(), alloca);
            self.variable_types.insert(name.clone(), ty.clone());
        }
        for (i, param) in params.iter().enumerate() {
            self.bind_param(fn_val, (i + 1) as u32, &param.name, &param.ty)?;
        }

        self.defer_stack.push(Vec::new());
        let value = self.compile_expr(body)?;
        if !self.block_terminated() {
            self.run_defers_for_current_scope()?;
            self.builder
                .build_return(Some(&value))
                .map_err(|e| CodegenError::new(e.to_string()))?;
        }
        self.defer_stack.pop();

        self.current_function = outer_function;
        self.variables = outer_variables;
        self.variable_types = outer_variable_types;
        self.defer_stack = outer_defer_stack;
        self.loop_stack = outer_loop_stack;
        if let Some(block) = outer_block {
            self.builder.position_at_end(block);
        }
        Ok(())
    }
}

fn fn_type_for<'ctx>(
    ret: inkwell::types::BasicTypeEnum<'ctx>,
    params: &[inkwell::types::BasicMetadataTypeEnum<'ctx>],
) -> inkwell::types::FunctionType<'ctx> {
    use inkwell::types::BasicTypeEnum;
    match ret {
        BasicTypeEnum::IntType(t) => t.fn_type(params, false),
        BasicTypeEnum::FloatType(t) => t.fn_type(params, false),
        BasicTypeEnum::ArrayType(t) => t.fn_type(params, false),
        BasicTypeEnum::StructType(t) => t.fn_type(params, false),
        BasicTypeEnum::PointerType(t) => t.fn_type(params, false),
        BasicTypeEnum::VectorType(t) => t.fn_type(params, false),
        BasicTypeEnum::ScalableVectorType(t) => t.fn_type(params, false),
    }
}

fn type_name_of(ty: &Type) -> String {
    match ty {
        Type::Struct { name, .. } | Type::Enum { name, .. } | Type::Generic { name, .. } | Type::Opaque { name } => name.clone(),
        Type::Reference { inner, .. } | Type::Pointer { inner, .. } => type_name_of(inner),
        other => other.to_string(),
    }
}

fn infer_literal_type(expr: &Expr) -> Type {
    match &expr.kind {
        ExprKind::IntLiteral(_) => Type::i32(),
        ExprKind::FloatLiteral(_) => Type::Float(pyrite_ast::FloatWidth::W64),
        ExprKind::BoolLiteral(_) => Type::Bool,
        ExprKind::CharLiteral(_) => Type::Char,
        ExprKind::StringLiteral(_) => Type::String,
        _ => Type::i32(),
    }
}
