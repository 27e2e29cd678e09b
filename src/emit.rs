//! The [`Emit`] engine state shared by the expression and statement grammars.
//!
//! `Emit` owns the random source for one generation run together with the
//! scope stack and the record registry. The grammar levels live in
//! [`expr`](crate::expr) and [`stmt`](crate::stmt) as further `impl Emit`
//! blocks; this module holds construction and the small helpers every level
//! shares.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::constant;
use crate::profile::Profile;
use crate::records::RecordRegistry;
use crate::scope::Scope;
use crate::types::{Scalar, Type};

// ---------------------------------------------------------------------------
// Emit
// ---------------------------------------------------------------------------

/// Generation engine for one MAVL module.
///
/// All state of a run lives here, so independent runs never share anything
/// but the read-only profile.
pub struct Emit<'a> {
    /// The random number generator (type-erased to avoid generic explosion).
    pub(crate) rng: &'a mut dyn RngCore,
    pub(crate) profile: &'a Profile,
    pub(crate) scope: Scope,
    pub(crate) records: RecordRegistry,
    /// Current statement nesting depth.
    pub(crate) stmt_depth: usize,
    /// Combinations left for the expression being generated.
    pub(crate) expr_nodes: usize,
}

const SCALAR_TYPES: [Type; 5] = [Type::Int, Type::Int, Type::Float, Type::Bool, Type::String];

impl<'a> Emit<'a> {
    pub fn new(rng: &'a mut dyn RngCore, profile: &'a Profile) -> Self {
        Self {
            rng,
            profile,
            scope: Scope::new(),
            records: RecordRegistry::new(),
            stmt_depth: 0,
            expr_nodes: profile.max_expr_nodes,
        }
    }
}

// ---------------------------------------------------------------------------
// RNG convenience
// ---------------------------------------------------------------------------

impl Emit<'_> {
    /// Return `true` with probability `prob` (0.0..=1.0).
    pub fn chance(&mut self, prob: f64) -> bool {
        self.rng.gen_bool(prob.clamp(0.0, 1.0))
    }

    /// A random `usize` in the inclusive range `[min, max]`.
    pub fn random_in(&mut self, (min, max): (usize, usize)) -> usize {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// A random `i64` in the inclusive range `[min, max]`.
    pub fn gen_i64_range(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// A random vector or matrix dimension in `1..=max_dimension`.
    pub fn dimension(&mut self) -> usize {
        self.random_in((1, self.profile.max_dimension.max(1)))
    }

    /// Pick a random type for a declaration.
    ///
    /// Records are only drawn when `allow_records` is set and at least one
    /// record has been declared.
    pub fn random_type(&mut self, allow_records: bool) -> Type {
        if self.chance(0.6) {
            return SCALAR_TYPES.choose(self.rng).cloned().unwrap_or(Type::Int);
        }
        if self.chance(0.5) {
            let kind = Scalar::random(self.rng);
            let x = self.dimension();
            return Type::vector(kind, x);
        }
        if self.chance(0.4)
            && allow_records
            && let Some(record) = self.records.random_record_type(self.rng)
        {
            return record;
        }
        let kind = Scalar::random(self.rng);
        let x = self.dimension();
        let y = self.dimension();
        Type::matrix(kind, x, y)
    }

    /// A random vector or matrix type of either numeric kind.
    pub fn random_tensor_type(&mut self, vector_probability: f64) -> Type {
        let kind = Scalar::random(self.rng);
        if self.chance(vector_probability) {
            let x = self.dimension();
            Type::vector(kind, x)
        } else {
            let x = self.dimension();
            let y = self.dimension();
            Type::matrix(kind, x, y)
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering helpers
// ---------------------------------------------------------------------------

impl Emit<'_> {
    /// `value` as a constant expression.
    pub fn constant(&mut self, value: i64) -> String {
        constant::render(self.rng, value, self.profile.max_const_depth)
    }

    /// Source text of `ty`, with dimensions spelled as constant expressions.
    pub fn type_text(&mut self, ty: &Type) -> String {
        ty.render(self.rng, self.profile.max_const_depth)
    }

    /// Run `f` inside a fresh scope frame one statement level deeper.
    ///
    /// Bindings declared by `f` are discarded when it returns.
    pub fn nested<F, T>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        self.scope.descend();
        self.stmt_depth += 1;
        let result = f(self);
        self.stmt_depth -= 1;
        self.scope.exit();
        result
    }
}
