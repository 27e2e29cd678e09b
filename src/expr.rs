//! Type-directed expression generation.
//!
//! Each precedence level of MAVL is one method taking the required type and
//! the current nesting depth. A level either combines recursive calls with an
//! operator that is legal for that type, or hands the type down to the next
//! level. Lowest binding first:
//!
//! ```text
//! select   a ? b : c
//! or       a | b
//! and      a & b
//! not      ! a
//! compare  a < b, a == b, ...
//! add_sub  a + b, a - b
//! mul_div  a * b, a / b
//! unary    - a
//! exp      a ^ b
//! dim      a .dimension, a .rows, a .cols
//! dot      a .* b
//! matmul   a # b
//! subrange a {lo : step : hi}
//! element  a [i]
//! atom     literal, identifier, call, field access, ( expr )
//! ```
//!
//! The additive and multiplicative levels fall through to the atom directly.
//! Only the right operand of `*` and `/` walks down through the tensor levels
//! below them.
//!
//! Every combination consumes one unit of the depth budget and one node of
//! the expression's node budget, which is refilled for each top-level
//! expression (depth 0). Once either is spent, [`Emit::expr`] returns a
//! literal.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::emit::Emit;
use crate::scope::BindingKind;
use crate::types::{Scalar, Type};

#[cfg(test)]
pub(crate) mod check;

/// String literals are drawn from this pool.
const STRINGS: &[&str] = &[
    "fizz",
    "buzz",
    "foo",
    "bar",
    "Hello World!",
    "localhost",
    "127.0.0.1",
    "@tu-darmstadt.de",
];

const COMPARE_OPS: &[&str] = &["==", "<=", ">=", "!=", ">", "<"];

/// Operand types of a matrix multiplication producing `ty`.
///
/// `shared` is the contracted dimension. For vector results,
/// `vector_on_left` chooses between `vector # matrix` and `matrix # vector`.
/// Returns `None` when no multiplication can produce `ty`: non-numeric types,
/// length-1 vectors and matrices with a dimension of 1.
pub(crate) fn matmul_operands(
    ty: &Type,
    shared: usize,
    vector_on_left: bool,
) -> Option<(Type, Type)> {
    match *ty {
        Type::Vector(kind, x) if x > 1 => Some(if vector_on_left {
            (Type::vector(kind, shared), Type::matrix(kind, shared, x))
        } else {
            (Type::matrix(kind, x, shared), Type::vector(kind, shared))
        }),
        Type::Matrix(kind, x, y) if x > 1 && y > 1 => {
            Some((Type::matrix(kind, x, shared), Type::matrix(kind, shared, y)))
        }
        Type::Int | Type::Float => {
            let operand = ty.as_vector_of(shared);
            Some((operand.clone(), operand))
        }
        _ => None,
    }
}

/// Inclusive index range of `len` elements starting at `start`.
fn span(start: i64, len: usize) -> (i64, i64) {
    (start, start + len as i64 - 1)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

impl Emit<'_> {
    /// Generate an expression of type `ty`.
    ///
    /// A call at depth 0 starts a new expression and refills the node budget.
    pub fn expr(&mut self, ty: &Type, depth: usize) -> String {
        if depth == 0 {
            self.expr_nodes = self.profile.max_expr_nodes;
        }
        if depth >= self.profile.max_expr_depth || self.expr_nodes == 0 {
            return self.literal(ty, depth);
        }
        self.select(ty, depth)
    }

    /// Whether a level should combine sub-expressions here. Taking the
    /// combination spends one node.
    fn combine(&mut self, depth: usize, prob: f64) -> bool {
        if depth >= self.profile.max_expr_depth || self.expr_nodes == 0 || !self.chance(prob) {
            return false;
        }
        self.expr_nodes -= 1;
        true
    }
}

// ---------------------------------------------------------------------------
// Boolean levels
// ---------------------------------------------------------------------------

impl Emit<'_> {
    pub(crate) fn select(&mut self, ty: &Type, depth: usize) -> String {
        if self.combine(depth, 0.1) {
            let cond = self.or(&Type::Bool, depth + 1);
            let then = self.or(ty, depth + 1);
            let otherwise = self.or(ty, depth + 1);
            return format!("{cond} ? {then} : {otherwise}");
        }
        self.or(ty, depth)
    }

    fn or(&mut self, ty: &Type, depth: usize) -> String {
        if ty.is_bool() && self.combine(depth, 0.3) {
            let lhs = self.and(ty, depth + 1);
            let rhs = self.or(ty, depth + 1);
            return format!("{lhs} | {rhs}");
        }
        self.and(ty, depth)
    }

    fn and(&mut self, ty: &Type, depth: usize) -> String {
        if ty.is_bool() && self.combine(depth, 0.2) {
            let lhs = self.not(ty, depth + 1);
            let rhs = self.and(ty, depth + 1);
            return format!("{lhs} & {rhs}");
        }
        self.not(ty, depth)
    }

    fn not(&mut self, ty: &Type, depth: usize) -> String {
        if ty.is_bool() && self.combine(depth, 0.3) {
            return format!("! {}", self.compare(ty, depth + 1));
        }
        self.compare(ty, depth)
    }

    /// Comparisons pick their own numeric operand type.
    pub(crate) fn compare(&mut self, ty: &Type, depth: usize) -> String {
        if ty.is_bool() && self.combine(depth, 0.3) {
            let operand = Type::scalar(Scalar::random(self.rng));
            let op = COMPARE_OPS.choose(self.rng).copied().unwrap_or("==");
            let lhs = self.add_sub(&operand, depth + 1);
            let rhs = self.add_sub(&operand, depth + 1);
            return format!("{lhs} {op} {rhs}");
        }
        self.add_sub(ty, depth)
    }
}

// ---------------------------------------------------------------------------
// Arithmetic levels
// ---------------------------------------------------------------------------

impl Emit<'_> {
    pub(crate) fn add_sub(&mut self, ty: &Type, depth: usize) -> String {
        if ty.is_arithmetic() && self.combine(depth, 0.3) {
            let op = if self.chance(0.5) { "+" } else { "-" };
            let lhs = self.add_sub(ty, depth + 1);
            let rhs = self.mul_div(ty, depth + 1);
            return format!("{lhs} {op} {rhs}");
        }
        if ty.is_tensor() && self.combine(depth, 0.2) {
            // Scalar broadcast on either side.
            let elem = ty.element_type();
            let (lhs, rhs) = if self.chance(0.5) {
                (self.add_sub(&elem, depth + 1), self.mul_div(ty, depth + 1))
            } else {
                (self.add_sub(ty, depth + 1), self.mul_div(&elem, depth + 1))
            };
            return format!("{lhs} + {rhs}");
        }
        self.atom(ty, depth)
    }

    fn mul_div(&mut self, ty: &Type, depth: usize) -> String {
        if ty.is_arithmetic() && self.combine(depth, 0.3) {
            let op = if ty.is_number() && self.chance(0.5) {
                "/"
            } else {
                "*"
            };
            let lhs = self.mul_div(ty, depth + 1);
            let rhs = self.unary(ty, depth + 1);
            return format!("{lhs} {op} {rhs}");
        }
        if ty.is_tensor() && self.combine(depth, 0.2) {
            let elem = ty.element_type();
            let (lhs, rhs) = if self.chance(0.5) {
                (self.mul_div(&elem, depth + 1), self.unary(ty, depth + 1))
            } else {
                (self.mul_div(ty, depth + 1), self.unary(&elem, depth + 1))
            };
            return format!("{lhs} * {rhs}");
        }
        self.atom(ty, depth)
    }

    fn unary(&mut self, ty: &Type, depth: usize) -> String {
        if ty.is_number() && self.combine(depth, 0.2) {
            return format!("- {}", self.exp(ty, depth + 1));
        }
        self.exp(ty, depth)
    }

    fn exp(&mut self, ty: &Type, depth: usize) -> String {
        if ty.is_arithmetic() && self.combine(depth, 0.3) {
            let base = self.dim(ty, depth + 1);
            let power = self.exp(ty, depth + 1);
            return format!("{base} ^ {power}");
        }
        if ty.is_tensor() && self.combine(depth, 0.3) {
            let base = self.dim(ty, depth + 1);
            let power = self.exp(&ty.element_type(), depth + 1);
            return format!("{base} ^ {power}");
        }
        self.dim(ty, depth)
    }
}

// ---------------------------------------------------------------------------
// Tensor levels
// ---------------------------------------------------------------------------

impl Emit<'_> {
    /// `.dimension`, `.rows` and `.cols` all yield `int`.
    pub(crate) fn dim(&mut self, ty: &Type, depth: usize) -> String {
        if ty.is_int() && self.combine(depth, 0.1) {
            let kind = Scalar::random(self.rng);
            let x = self.dimension();
            let y = self.dimension();
            if self.chance(0.5) {
                let operand = self.dot(&Type::vector(kind, x), depth + 1);
                return format!("{operand} .dimension");
            }
            let query = if self.chance(0.5) { ".rows" } else { ".cols" };
            let operand = self.dot(&Type::matrix(kind, x, y), depth + 1);
            return format!("{operand} {query}");
        }
        self.dot(ty, depth)
    }

    fn dot(&mut self, ty: &Type, depth: usize) -> String {
        if ty.is_number() && self.combine(depth, 0.15) {
            let size = self.dimension();
            let operand = ty.as_vector_of(size);
            let lhs = self.dot(&operand, depth + 1);
            let rhs = self.matmul(&operand, depth + 1);
            return format!("{lhs} .* {rhs}");
        }
        self.matmul(ty, depth)
    }

    pub(crate) fn matmul(&mut self, ty: &Type, depth: usize) -> String {
        let shared = self.dimension();
        let vector_on_left = self.chance(0.5);
        let prob = match ty {
            Type::Vector(..) => 0.4,
            Type::Matrix(..) => 0.3,
            _ => 0.2,
        };
        if let Some((lhs_ty, rhs_ty)) = matmul_operands(ty, shared, vector_on_left)
            && self.combine(depth, prob)
        {
            let lhs = self.matmul(&lhs_ty, depth + 1);
            let rhs = self.subrange(&rhs_ty, depth + 1);
            return format!("{lhs} # {rhs}");
        }
        self.subrange(ty, depth)
    }

    /// Slices with constant bounds. Bounds are chosen so the slice keeps the
    /// requested shape; a single-element slice of a vector is a scalar.
    pub(crate) fn subrange(&mut self, ty: &Type, depth: usize) -> String {
        match *ty {
            Type::Int | Type::Float if self.combine(depth, 0.1) => {
                if self.chance(0.75) {
                    let size = self.dimension();
                    let offset = self.centered_offset(size);
                    let source = self.element(&ty.as_vector_of(size), depth + 1);
                    let lo = self.constant(offset);
                    let step = self.expr(&Type::Int, depth + 1);
                    let hi = self.constant(offset);
                    format!("{source} {{{lo} : {step} : {hi}}}")
                } else {
                    let rows = self.dimension();
                    let cols = self.dimension();
                    let row = self.centered_offset(rows);
                    let col = self.centered_offset(cols);
                    let source = self.element(&ty.as_matrix_of(rows, cols), depth + 1);
                    let rows = self.bounds(row, row, depth);
                    let cols = self.bounds(col, col, depth);
                    format!("{source} {{{rows} }}{{ {cols}}}")
                }
            }
            Type::Vector(kind, x) if x > 1 && self.combine(depth, 0.1) => {
                let start = self.gen_i64_range(-5, 5);
                let (lo, hi) = span(start, x);
                if self.chance(0.75) {
                    let size = x + self.random_in((0, 5));
                    let source = self.element(&Type::vector(kind, size), depth + 1);
                    let cols = self.bounds(lo, hi, depth);
                    format!("{source} {{{cols}}}")
                } else {
                    let row = self.gen_i64_range(-5, 5);
                    let rows = self.dimension();
                    let cols = x + self.random_in((0, 5));
                    let source = self.element(&Type::matrix(kind, rows, cols), depth + 1);
                    let rows = self.bounds(row, row, depth);
                    let cols = self.bounds(lo, hi, depth);
                    format!("{source} {{{rows} }}{{ {cols}}}")
                }
            }
            Type::Matrix(kind, x, y) if x > 1 && self.combine(depth, 0.1) => {
                let (row_lo, row_hi) = span(self.gen_i64_range(-5, 5), x);
                let (col_lo, col_hi) = span(self.gen_i64_range(-5, 5), y);
                let rows = x + self.random_in((0, 5));
                let cols = y + self.random_in((0, 5));
                let source = self.element(&Type::matrix(kind, rows, cols), depth + 1);
                let rows = self.bounds(row_lo, row_hi, depth);
                let cols = self.bounds(col_lo, col_hi, depth);
                format!("{source} {{{rows} }}{{ {cols}}}")
            }
            _ => self.element(ty, depth),
        }
    }

    /// `lo : step : hi` with constant bounds.
    fn bounds(&mut self, lo: i64, hi: i64, depth: usize) -> String {
        let lo = self.constant(lo);
        let step = self.expr(&Type::Int, depth + 1);
        let hi = self.constant(hi);
        format!("{lo} : {step} : {hi}")
    }

    /// A random offset in roughly `-size/2..size/2`.
    fn centered_offset(&mut self, size: usize) -> i64 {
        let r: f64 = self.rng.gen_range(0.0..1.0);
        (size as f64 * r - (size / 2) as f64) as i64
    }

    pub(crate) fn element(&mut self, ty: &Type, depth: usize) -> String {
        match *ty {
            Type::Int | Type::Float if self.combine(depth, 0.2) => {
                let cols = self.dimension();
                let source = self.atom(&ty.as_vector_of(cols), depth + 1);
                let index = self.expr(&Type::Int, depth + 1);
                format!("{source} [{index}]")
            }
            Type::Vector(_, x) if x > 1 && self.combine(depth, 0.2) => {
                let rows = self.dimension();
                let source = self.atom(&ty.as_matrix_of(rows, x), depth + 1);
                let index = self.expr(&Type::Int, depth + 1);
                format!("{source}[{index}]")
            }
            _ => self.atom(ty, depth),
        }
    }
}

// ---------------------------------------------------------------------------
// Atoms
// ---------------------------------------------------------------------------

impl Emit<'_> {
    /// The terminal level: a parenthesized expression, a reference to
    /// something in scope, or a fresh literal.
    pub(crate) fn atom(&mut self, ty: &Type, depth: usize) -> String {
        if self.combine(depth, 0.05) {
            return format!("( {} )", self.expr(ty, depth + 1));
        }
        if self.chance(0.5)
            && let Some(reference) = self.reference(ty, depth)
        {
            return reference;
        }
        self.literal(ty, depth)
    }

    /// Reuse a binding in scope: an identifier, a call, or a field read.
    ///
    /// `None` when nothing in scope fits, or when a function was picked and
    /// the call was not taken. A call spends a node like any combination.
    fn reference(&mut self, ty: &Type, depth: usize) -> Option<String> {
        let entry = {
            let candidates = self.scope.lookup_by_type(ty, &self.records);
            (*candidates.choose(self.rng)?).clone()
        };

        if ty.record_id().is_none()
            && let Some(record) = entry.record_id()
        {
            let field = self.records.field_of_type(record, ty)?.name.clone();
            if entry.is_function() {
                if !self.combine(depth, 1.0) {
                    return None;
                }
                let call = self.call(&entry.name, &entry.params, depth);
                return Some(format!("{call} @ {field}"));
            }
            return Some(format!("{} @ {field}", entry.name));
        }

        match entry.kind {
            BindingKind::Value | BindingKind::Variable => Some(entry.name),
            BindingKind::Function if self.combine(depth, 0.4) => {
                Some(self.call(&entry.name, &entry.params, depth))
            }
            BindingKind::Function => None,
        }
    }

    /// `name(arg, ...)` with one generated argument per parameter.
    pub(crate) fn call(&mut self, name: &str, params: &[Type], depth: usize) -> String {
        let args: Vec<String> = params
            .iter()
            .map(|param| self.expr(param, depth + 1))
            .collect();
        format!("{name}({})", args.join(", "))
    }

    /// A fresh literal of type `ty`.
    ///
    /// Scalars and integer tensors are plain literals. Float tensors and
    /// record literals may embed sub-expressions, which are themselves
    /// literals once the depth budget is spent.
    pub fn literal(&mut self, ty: &Type, depth: usize) -> String {
        match ty {
            Type::Bool => {
                let value = self.chance(0.5);
                value.to_string()
            }
            Type::Int => self.int_literal(),
            Type::Float => self.float_literal(),
            Type::String => {
                let text = STRINGS.choose(self.rng).copied().unwrap_or("foo");
                format!("\"{text}\"")
            }
            Type::Void => String::new(),
            Type::Vector(kind, x) => self.inline_vector(*kind, *x, depth),
            Type::Matrix(kind, x, y) => {
                let rows: Vec<String> = (0..*x)
                    .map(|_| self.inline_vector(*kind, *y, depth))
                    .collect();
                format!("[{}]", rows.join(", "))
            }
            Type::Record(id) => {
                let field_types: Vec<Type> = self
                    .records
                    .fields(id)
                    .map(|fields| fields.iter().map(|f| f.ty.clone()).collect())
                    .unwrap_or_default();
                let values: Vec<String> = field_types
                    .iter()
                    .map(|field| self.expr(field, depth + 1))
                    .collect();
                format!("@ {id} [{}]", values.join(", "))
            }
        }
    }

    fn int_literal(&mut self) -> String {
        self.rng.gen_range(0..1000).to_string()
    }

    fn float_literal(&mut self) -> String {
        let value: f64 = self.rng.gen_range(0.0..20.0);
        format!("{value:.5}")
    }

    fn inline_vector(&mut self, kind: Scalar, len: usize, depth: usize) -> String {
        let values: Vec<String> = (0..len)
            .map(|_| match kind {
                Scalar::Int => self.int_literal(),
                Scalar::Float if self.chance(0.8) => self.float_literal(),
                Scalar::Float => self.expr(&Type::Float, depth + 1),
            })
            .collect();
        format!("[{}]", values.join(", "))
    }
}
