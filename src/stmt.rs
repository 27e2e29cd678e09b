//! Statement, declaration and module generation.
//!
//! This is the driver of a generation run. It opens a scope frame around
//! every nested block and defines each new binding before generating code
//! that may refer to it, so the expression engine only ever sees bindings
//! that are legal at that point of the program.

use rand::seq::SliceRandom;

use crate::emit::Emit;
use crate::names;
use crate::records::RecordField;
use crate::scope::{BindingKind, ParamTypes, Scope, ScopeEntry};
use crate::types::Type;


/// Reserved name of the entry function.
pub const MAIN: &str = "main";

/// Statement kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StmtKind {
    Value,
    Variable,
    If,
    Block,
    AssignOrCall,
    Switch,
    For,
    ForEach,
}

/// Draw table for statement kinds. Declarations get two slots each, which
/// keeps the expected number of nested statements per statement below one.
const STMT_TABLE: [StmtKind; 10] = [
    StmtKind::Value,
    StmtKind::Value,
    StmtKind::Variable,
    StmtKind::Variable,
    StmtKind::If,
    StmtKind::Block,
    StmtKind::AssignOrCall,
    StmtKind::Switch,
    StmtKind::For,
    StmtKind::ForEach,
];

/// Statements drawn once the nesting ceiling is reached.
const FLAT_STMT_TABLE: [StmtKind; 5] = [
    StmtKind::Value,
    StmtKind::Value,
    StmtKind::Variable,
    StmtKind::Variable,
    StmtKind::AssignOrCall,
];

/// One label of a `switch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SwitchLabel {
    Case(i64),
    Default,
}

// ---------------------------------------------------------------------------
// Module level
// ---------------------------------------------------------------------------

impl Emit<'_> {
    /// Generate a complete module: functions and records, plus exactly one
    /// `main` function.
    pub fn module(&mut self) -> String {
        let count = self.random_in(self.profile.module_items);
        let mut items = Vec::with_capacity(count + 1);
        let mut has_main = false;
        let mut functions = 0;

        for _ in 0..count {
            if !has_main && self.chance(0.2) {
                items.push(self.main_function());
                has_main = true;
            }
            if self.chance(0.7) {
                items.push(self.function());
                functions += 1;
            } else {
                items.push(self.record());
            }
        }
        if !has_main {
            items.push(self.main_function());
        }

        tracing::debug!(
            items = items.len(),
            functions,
            records = self.records.len(),
            "generated module"
        );
        items.join(" ")
    }

    /// `function void main() { ... }`
    pub(crate) fn main_function(&mut self) -> String {
        tracing::trace!("declare main");
        self.scope
            .define_function(MAIN.to_string(), Type::Void, ParamTypes::new());
        self.nested(|emit| {
            let body = emit.statements(emit.profile.function_body);
            format!("function void {MAIN}() {{ {body} }} ")
        })
    }

    /// A function with random return and parameter types.
    ///
    /// The function is defined before its body is generated, so the body may
    /// call it recursively.
    pub(crate) fn function(&mut self) -> String {
        let return_type = if self.chance(0.7) {
            self.random_type(true)
        } else {
            Type::Void
        };
        let id = self.scope.free_function_identifier(&return_type, self.rng);
        let count = self.random_in(self.profile.function_params);
        let params: ParamTypes = (0..count).map(|_| self.random_type(true)).collect();

        tracing::trace!(function = %id, %return_type, params = params.len(), "declare function");
        self.scope
            .define_function(id.clone(), return_type.clone(), params.clone());
        let return_text = self.type_text(&return_type);

        self.nested(|emit| {
            let params: Vec<String> = params
                .iter()
                .map(|ty| {
                    let name = emit.scope.free_identifier(ty, emit.rng);
                    let text = emit.type_text(ty);
                    emit.scope.define_variable(name.clone(), ty.clone());
                    format!("{text} {name}")
                })
                .collect();

            let count = emit.random_in(emit.profile.function_body);
            let mut body: Vec<String> = (0..count).map(|_| emit.statement()).collect();
            if !return_type.is_void() {
                body.push(emit.return_stmt(&return_type));
            }

            format!(
                "function {return_text} {id}({}) {{ {} }} ",
                params.join(", "),
                body.join(" ")
            )
        })
    }

    /// A record declaration.
    ///
    /// Fields are never records themselves. Field names are allocated in a
    /// throwaway frame so they are unique within the record.
    pub(crate) fn record(&mut self) -> String {
        let placeholder = Type::Record(String::new());
        let id = names::unique_name(
            self.rng,
            |rng| names::variable_name(&placeholder, rng),
            |id| self.records.contains(id) || self.scope.in_current_frame(id),
        );

        let count = self.random_in(self.profile.record_fields);
        let mut fields = Vec::with_capacity(count);
        let mut decls = Vec::with_capacity(count);

        self.scope.descend();
        for _ in 0..count {
            let ty = self.random_type(false);
            let name = self.scope.free_identifier(&ty, self.rng);
            self.scope.define_variable(name.clone(), ty.clone());
            let mutable = self.chance(0.5);
            let keyword = if mutable { "var" } else { "val" };
            decls.push(format!("{keyword} {} {name} ;", self.type_text(&ty)));
            fields.push(RecordField { ty, name, mutable });
        }
        self.scope.exit();

        self.records.define(id.clone(), fields);
        format!("record {id} {{ {} }} ", decls.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

impl Emit<'_> {
    /// A random number of statements in `range`, space separated.
    pub(crate) fn statements(&mut self, range: (usize, usize)) -> String {
        let count = self.random_in(range);
        let stmts: Vec<String> = (0..count).map(|_| self.statement()).collect();
        stmts.join(" ")
    }

    /// Generate one statement.
    pub fn statement(&mut self) -> String {
        match self.stmt_kind() {
            StmtKind::Value => self.value_decl(),
            StmtKind::Variable => self.var_decl(),
            StmtKind::If => self.if_stmt(),
            StmtKind::Block => self.block(),
            StmtKind::AssignOrCall => self.assign_or_call(),
            StmtKind::Switch => self.switch(),
            StmtKind::For => self.for_loop(),
            StmtKind::ForEach => self.foreach(),
        }
    }

    pub(crate) fn stmt_kind(&mut self) -> StmtKind {
        let table: &[StmtKind] = if self.stmt_depth >= self.profile.max_stmt_depth {
            &FLAT_STMT_TABLE
        } else {
            &STMT_TABLE
        };
        table.choose(self.rng).copied().unwrap_or(StmtKind::Value)
    }

    pub(crate) fn value_decl(&mut self) -> String {
        let ty = self.random_type(true);
        self.value_decl_of(ty)
    }

    /// `val T id = expr ;`
    ///
    /// The initializer is generated before `id` enters scope.
    pub(crate) fn value_decl_of(&mut self, ty: Type) -> String {
        let init = self.expr(&ty, 0);
        let id = self.scope.free_identifier(&ty, self.rng);
        let ty_text = self.type_text(&ty);
        self.scope.define_value(id.clone(), ty);
        format!("val {ty_text} {id} = {init} ;")
    }

    /// `var T id ;`
    pub(crate) fn var_decl(&mut self) -> String {
        let ty = self.random_type(true);
        let id = self.scope.free_identifier(&ty, self.rng);
        let ty_text = self.type_text(&ty);
        self.scope.define_variable(id.clone(), ty);
        format!("var {ty_text} {id} ;")
    }

    pub(crate) fn if_stmt(&mut self) -> String {
        let cond = self.expr(&Type::Bool, 0);
        let then = self.nested(|emit| emit.statement());
        if self.chance(0.6) {
            return format!("if ({cond}) {then}");
        }
        let otherwise = self.nested(|emit| emit.statement());
        format!("if ({cond}) {then} else {otherwise}")
    }

    pub(crate) fn block(&mut self) -> String {
        let range = self.profile.block_body;
        let body = self.nested(|emit| emit.statements(range));
        format!(" {{ {body} }} ")
    }

    /// Assign to a variable or call a function already in scope.
    ///
    /// Falls back to a variable declaration when there is neither.
    pub(crate) fn assign_or_call(&mut self) -> String {
        let Some(target) = self.pick(|scope| scope.lookup_variable_or_function()) else {
            tracing::trace!("no assignment or call target, declaring a variable");
            return self.var_decl();
        };
        if target.is_function() {
            return format!("{} ;", self.call(&target.name, &target.params, 0));
        }
        format!("{} ;", self.assignment(&target.name, &target.ty, true))
    }

    /// `target = expr`, optionally through a record field or an element.
    ///
    /// With `projections` unset only the plain form is produced.
    pub(crate) fn assignment(&mut self, name: &str, ty: &Type, projections: bool) -> String {
        if projections {
            if let Some(record) = ty.record_id()
                && self.chance(0.3)
                && let Some(field) = self.records.random_mutable_field(record, self.rng).cloned()
            {
                let value = self.expr(&field.ty, 0);
                return format!("{name} @ {} = {value}", field.name);
            }
            if ty.is_vector() && self.chance(0.1) {
                let index = self.expr(&Type::Int, 0);
                let value = self.expr(&ty.element_type(), 0);
                return format!("{name}[{index}] = {value}");
            }
            if ty.is_matrix() && self.chance(0.1) {
                let row = self.expr(&Type::Int, 0);
                let col = self.expr(&Type::Int, 0);
                let value = self.expr(&ty.element_type(), 0);
                return format!("{name}[{row}][{col}] = {value}");
            }
        }
        format!("{name} = {}", self.expr(ty, 0))
    }

    /// The labels of one `switch`: distinct case values, at most one default.
    pub(crate) fn switch_labels(&mut self) -> Vec<SwitchLabel> {
        let count = self.random_in(self.profile.switch_cases);
        let base = self.gen_i64_range(-100, 100);
        let stride = self.gen_i64_range(1, 9);
        let mut has_default = false;

        (0..count as i64)
            .map(|i| {
                if !has_default && self.chance(0.1) {
                    has_default = true;
                    SwitchLabel::Default
                } else {
                    SwitchLabel::Case(base + i * stride)
                }
            })
            .collect()
    }

    pub(crate) fn switch(&mut self) -> String {
        let scrutinee = self.expr(&Type::Int, 0);
        let cases: Vec<String> = self
            .switch_labels()
            .into_iter()
            .map(|label| {
                let label = match label {
                    SwitchLabel::Case(value) => format!("case {}", self.constant(value)),
                    SwitchLabel::Default => "default".to_string(),
                };
                let body = self.nested(|emit| emit.statement());
                format!("{label} : {body}")
            })
            .collect();
        format!("switch ({scrutinee}) {{ {} }} ", cases.join(" "))
    }

    /// `for(init; cond; update) body`, reusing two variables in scope.
    ///
    /// Falls back to a variable declaration when no variable is visible.
    pub(crate) fn for_loop(&mut self) -> String {
        let counter = self.pick(|scope| scope.lookup_variable());
        let update = self.pick(|scope| scope.lookup_variable());
        let (Some(counter), Some(update)) = (counter, update) else {
            tracing::trace!("no loop variables in scope, declaring a variable");
            return self.var_decl();
        };

        let init = self.assignment(&counter.name, &counter.ty, false);
        let cond = self.expr(&Type::Bool, 0);
        let step = self.assignment(&update.name, &update.ty, false);
        let body = self.nested(|emit| emit.statement());
        format!("for({init}; {cond}; {step}) {body}")
    }

    /// `foreach(val|var T id : collection) body`
    ///
    /// Iterates an existing vector or matrix 70% of the time when one is in
    /// scope, otherwise an inline collection.
    pub(crate) fn foreach(&mut self) -> String {
        let existing = self.pick(|scope| scope.lookup_vector_or_matrix());
        self.nested(|emit| {
            let (keyword, elem_ty, collection) = match existing.filter(|_| emit.chance(0.7)) {
                Some(source) => {
                    let mutable = source.kind == BindingKind::Variable && emit.chance(0.7);
                    let keyword = if mutable { "var" } else { "val" };
                    (keyword, source.ty.element_type(), source.name)
                }
                None => {
                    let ty = emit.random_tensor_type(0.7);
                    let collection = emit.expr(&ty, 0);
                    ("val", ty.element_type(), collection)
                }
            };

            let id = emit.scope.free_identifier(&elem_ty, emit.rng);
            let ty_text = emit.type_text(&elem_ty);
            if keyword == "var" {
                emit.scope.define_variable(id.clone(), elem_ty);
            } else {
                emit.scope.define_value(id.clone(), elem_ty);
            }
            let body = emit.statement();
            format!("foreach({keyword} {ty_text} {id} : {collection}) {body}")
        })
    }

    /// `return expr ;`
    pub(crate) fn return_stmt(&mut self, ty: &Type) -> String {
        format!("return {} ;", self.expr(ty, 0))
    }

    /// A random entry of a scope query, cloned out of the scope.
    fn pick<F>(&mut self, query: F) -> Option<ScopeEntry>
    where
        F: for<'s> FnOnce(&'s Scope) -> Vec<&'s ScopeEntry>,
    {
        let candidates = query(&self.scope);
        candidates.choose(self.rng).map(|entry| (*entry).clone())
    }
}
