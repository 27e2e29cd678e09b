//! Lexical scope tracking for generated programs.
//!
//! `Scope` is a stack of frames. Every nested block of the generated program
//! opens a frame on entry and closes it on exit; bindings declared in a frame
//! disappear with it. Lookups see every frame on the stack, with inner
//! declarations shadowing outer ones of the same name.

use rand::Rng;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::names;
use crate::records::RecordRegistry;
use crate::types::Type;

// ---------------------------------------------------------------------------
// ScopeEntry
// ---------------------------------------------------------------------------

/// Structural kind of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Immutable `val`.
    Value,
    /// Assignable `var`.
    Variable,
    /// Function; its type is the return type.
    Function,
}

/// Parameter types of a function binding.
pub type ParamTypes = SmallVec<[Type; 4]>;

/// One declared binding.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeEntry {
    pub kind: BindingKind,
    pub ty: Type,
    pub name: String,
    /// Parameter types; empty unless `kind` is [`BindingKind::Function`].
    pub params: ParamTypes,
}

impl ScopeEntry {
    pub fn is_function(&self) -> bool {
        self.kind == BindingKind::Function
    }

    /// Record identifier of the binding's type, if it is a record.
    pub fn record_id(&self) -> Option<&str> {
        self.ty.record_id()
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Stack of lexical frames, outermost first.
///
/// The outermost (module) frame is never popped.
#[derive(Debug)]
pub struct Scope {
    frames: Vec<Vec<ScopeEntry>>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    pub fn new() -> Self {
        Self {
            frames: vec![Vec::new()],
        }
    }

    /// Number of frames above the module frame.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Open a new innermost frame.
    pub fn descend(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Close the innermost frame, discarding its bindings.
    ///
    /// # Panics
    ///
    /// Panics when no frame was opened with [`descend`](Scope::descend);
    /// carrying on would resurrect bindings that have gone out of scope.
    pub fn exit(&mut self) {
        assert!(
            self.frames.len() > 1,
            "scope exit without a matching descend"
        );
        self.frames.pop();
    }

    fn current_frame(&mut self) -> &mut Vec<ScopeEntry> {
        // `new` installs the module frame and `exit` never removes it.
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn define(&mut self, kind: BindingKind, name: String, ty: Type, params: ParamTypes) {
        self.current_frame().push(ScopeEntry {
            kind,
            ty,
            name,
            params,
        });
    }

    pub fn define_value(&mut self, name: String, ty: Type) {
        self.define(BindingKind::Value, name, ty, ParamTypes::new());
    }

    pub fn define_variable(&mut self, name: String, ty: Type) {
        self.define(BindingKind::Variable, name, ty, ParamTypes::new());
    }

    pub fn define_function(&mut self, name: String, return_type: Type, params: ParamTypes) {
        self.define(BindingKind::Function, name, return_type, params);
    }

    /// Whether `name` is declared in the innermost frame.
    pub fn in_current_frame(&self, name: &str) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.iter().any(|entry| entry.name == name))
    }

    /// A variable name for `ty` not yet declared in the current frame.
    ///
    /// Outer frames are not consulted; shadowing them is allowed.
    pub fn free_identifier<R: Rng + ?Sized>(&self, ty: &Type, rng: &mut R) -> String {
        names::unique_name(
            rng,
            |rng| names::variable_name(ty, rng),
            |name| self.in_current_frame(name),
        )
    }

    /// A function name for `return_type` not yet declared in the current frame.
    pub fn free_function_identifier<R: Rng + ?Sized>(
        &self,
        return_type: &Type,
        rng: &mut R,
    ) -> String {
        names::unique_name(
            rng,
            |rng| names::function_name(return_type, rng),
            |name| self.in_current_frame(name),
        )
    }

    /// All visible bindings, innermost first, one per name.
    pub(crate) fn visible(&self) -> impl Iterator<Item = &ScopeEntry> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .filter(move |entry| seen.insert(entry.name.as_str()))
    }

    /// Bindings of type `ty`, plus record-typed bindings with a field of
    /// type `ty`.
    pub fn lookup_by_type(&self, ty: &Type, records: &RecordRegistry) -> Vec<&ScopeEntry> {
        self.visible()
            .filter(|entry| {
                entry.ty == *ty
                    || entry
                        .record_id()
                        .is_some_and(|id| records.has_field_of_type(id, ty))
            })
            .collect()
    }

    /// Assignable variables and callable functions.
    pub fn lookup_variable_or_function(&self) -> Vec<&ScopeEntry> {
        self.visible()
            .filter(|entry| matches!(entry.kind, BindingKind::Variable | BindingKind::Function))
            .collect()
    }

    /// Assignable variables.
    pub fn lookup_variable(&self) -> Vec<&ScopeEntry> {
        self.visible()
            .filter(|entry| entry.kind == BindingKind::Variable)
            .collect()
    }

    /// Values and variables of vector or matrix type.
    pub fn lookup_vector_or_matrix(&self) -> Vec<&ScopeEntry> {
        self.visible()
            .filter(|entry| !entry.is_function() && entry.ty.is_tensor())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
