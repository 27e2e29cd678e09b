//! Registry of declared record shapes.
//!
//! Records are declared once and never change afterwards. Every record stays
//! visible for the rest of generation, so the registry only ever grows.

use rand::Rng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashMap;

use crate::types::Type;

/// One field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    pub ty: Type,
    pub name: String,
    /// Declared with `var` (assignable) rather than `val`.
    pub mutable: bool,
}

/// Record identifier to field list, in declaration order.
#[derive(Debug, Default)]
pub struct RecordRegistry {
    /// Identifiers in declaration order, so random picks are reproducible.
    order: Vec<String>,
    shapes: FxHashMap<String, Vec<RecordField>>,
}

impl RecordRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the shape of record `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is already registered; shapes are immutable once
    /// defined.
    pub fn define(&mut self, id: String, fields: Vec<RecordField>) {
        assert!(
            !self.shapes.contains_key(&id),
            "record '{id}' is already defined"
        );
        tracing::trace!(record = %id, fields = fields.len(), "define record");
        self.order.push(id.clone());
        self.shapes.insert(id, fields);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.shapes.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Field list of record `id`, if defined.
    pub fn fields(&self, id: &str) -> Option<&[RecordField]> {
        self.shapes.get(id).map(Vec::as_slice)
    }

    /// Records in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RecordField])> {
        self.order
            .iter()
            .filter_map(|id| self.fields(id).map(|fields| (id.as_str(), fields)))
    }

    pub fn has_field_of_type(&self, id: &str, ty: &Type) -> bool {
        self.field_of_type(id, ty).is_some()
    }

    /// First field of record `id` whose type is `ty`.
    pub fn field_of_type(&self, id: &str, ty: &Type) -> Option<&RecordField> {
        self.fields(id)?.iter().find(|field| field.ty == *ty)
    }

    pub fn has_mutable_field(&self, id: &str) -> bool {
        self.fields(id)
            .is_some_and(|fields| fields.iter().any(|field| field.mutable))
    }

    /// A random `var` field of record `id`.
    pub fn random_mutable_field<R: Rng + ?Sized>(
        &self,
        id: &str,
        rng: &mut R,
    ) -> Option<&RecordField> {
        let mutable: Vec<&RecordField> = self
            .fields(id)?
            .iter()
            .filter(|field| field.mutable)
            .collect();
        mutable.choose(rng).copied()
    }

    /// The type of a random registered record.
    pub fn random_record_type<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Type> {
        self.order.choose(rng).map(|id| Type::Record(id.clone()))
    }
}
