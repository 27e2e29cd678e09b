//! The closed type model of the generated language.
//!
//! Every grammar level matches exhaustively on [`Type`], so adding a variant
//! forces every production that must handle it to be revisited.

use std::fmt;

use rand::Rng;

use crate::constant;

/// Numeric element kind shared by scalars, vectors and matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Int,
    Float,
}

impl Scalar {
    /// Pick `int` or `float` with equal probability.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Scalar::Int
        } else {
            Scalar::Float
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scalar::Int => "int",
            Scalar::Float => "float",
        }
    }
}

/// A MAVL type.
///
/// Vector and matrix dimensions are plain sizes; they are rendered through the
/// constant-expression synthesizer whenever the type is printed, so two
/// printings of the same type differ textually but always agree in value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    Int,
    Float,
    String,
    Void,
    /// `vector <kind> [x]`
    Vector(Scalar, usize),
    /// `matrix <kind> [x][y]`
    Matrix(Scalar, usize, usize),
    /// A reference to a declared record, by identifier.
    Record(String),
}

impl Type {
    pub fn scalar(kind: Scalar) -> Self {
        match kind {
            Scalar::Int => Type::Int,
            Scalar::Float => Type::Float,
        }
    }

    /// Vector of `kind` with `x` elements.
    ///
    /// # Panics
    ///
    /// Panics if `x` is zero.
    pub fn vector(kind: Scalar, x: usize) -> Self {
        assert!(x >= 1, "vector dimension must be at least 1");
        Type::Vector(kind, x)
    }

    /// Matrix of `kind` with `x` rows and `y` columns.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn matrix(kind: Scalar, x: usize, y: usize) -> Self {
        assert!(x >= 1 && y >= 1, "matrix dimensions must be at least 1");
        Type::Matrix(kind, x, y)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Type::Int)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Type::Vector(..))
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, Type::Matrix(..))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// Vector or matrix.
    pub fn is_tensor(&self) -> bool {
        self.is_vector() || self.is_matrix()
    }

    /// Scalar, vector or matrix: the types arithmetic operators accept.
    pub fn is_arithmetic(&self) -> bool {
        self.numeric_kind().is_some()
    }

    /// The record identifier, for record types.
    pub fn record_id(&self) -> Option<&str> {
        match self {
            Type::Record(id) => Some(id),
            _ => None,
        }
    }

    /// Numeric kind of an int/float scalar, vector or matrix.
    pub fn numeric_kind(&self) -> Option<Scalar> {
        match self {
            Type::Int => Some(Scalar::Int),
            Type::Float => Some(Scalar::Float),
            Type::Vector(kind, _) | Type::Matrix(kind, _, _) => Some(*kind),
            Type::Bool | Type::String | Type::Void | Type::Record(_) => None,
        }
    }

    /// First dimension: vector length or matrix row count, 0 otherwise.
    pub fn x(&self) -> usize {
        match self {
            Type::Vector(_, x) | Type::Matrix(_, x, _) => *x,
            _ => 0,
        }
    }

    /// Matrix column count, 0 otherwise.
    pub fn y(&self) -> usize {
        match self {
            Type::Matrix(_, _, y) => *y,
            _ => 0,
        }
    }

    /// Element type of a vector or matrix; every other type maps to itself.
    pub fn element_type(&self) -> Type {
        match self {
            Type::Vector(kind, _) | Type::Matrix(kind, _, _) => Type::scalar(*kind),
            other => other.clone(),
        }
    }

    /// Vector of the same numeric kind with `size` elements.
    ///
    /// Non-numeric types map to themselves; callers only use this on
    /// arithmetic types.
    pub fn as_vector_of(&self, size: usize) -> Type {
        match self.numeric_kind() {
            Some(kind) => Type::vector(kind, size),
            None => self.clone(),
        }
    }

    /// Matrix of the same numeric kind with the given shape.
    ///
    /// Non-numeric types map to themselves.
    pub fn as_matrix_of(&self, x: usize, y: usize) -> Type {
        match self.numeric_kind() {
            Some(kind) => Type::matrix(kind, x, y),
            None => self.clone(),
        }
    }

    /// Render the type as source text, spelling every dimension as a freshly
    /// synthesized constant expression.
    pub fn render<R: Rng + ?Sized>(&self, rng: &mut R, max_const_depth: usize) -> String {
        match self {
            Type::Vector(kind, x) => format!(
                "vector <{}> [{}]",
                kind.as_str(),
                constant::render(rng, *x as i64, max_const_depth)
            ),
            Type::Matrix(kind, x, y) => {
                let x = constant::render(rng, *x as i64, max_const_depth);
                let y = constant::render(rng, *y as i64, max_const_depth);
                format!("matrix <{}> [{}][{}]", kind.as_str(), x, y)
            }
            other => other.to_string(),
        }
    }
}

/// Plain rendering with literal dimensions, used for diagnostics.
impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Void => write!(f, "void"),
            Type::Vector(kind, x) => write!(f, "vector <{}> [{}]", kind.as_str(), x),
            Type::Matrix(kind, x, y) => write!(f, "matrix <{}> [{}][{}]", kind.as_str(), x, y),
            Type::Record(id) => write!(f, "{id}"),
        }
    }
}
