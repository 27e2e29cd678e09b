//! Independent parser and type checker for generated expressions.
//!
//! Parses the MAVL expression grammar from text and computes the type of the
//! whole expression against a scope and a record registry. Integer constants
//! are folded along the way so subrange bounds can be measured.
//!
//! Precedence, lowest first: `? :`, `|`, `&`, `!`, comparisons, `+ -`,
//! `* /`, unary `-`, `^`, `.dimension .rows .cols`, `.*`, `#`, subranges,
//! element selection, atoms.

use crate::records::RecordRegistry;
use crate::scope::{BindingKind, Scope};
use crate::types::{Scalar, Type};

/// Type of `text`, or a description of the first error.
pub fn check(text: &str, scope: &Scope, records: &RecordRegistry) -> Result<Type, String> {
    let tokens = tokenize(text)?;
    let mut checker = Checker {
        tokens,
        pos: 0,
        scope,
        records,
    };
    let typed = checker.select()?;
    if checker.pos != checker.tokens.len() {
        return Err(format!(
            "trailing {:?} in {text:?}",
            &checker.tokens[checker.pos..]
        ));
    }
    Ok(typed.ty)
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Int(i128),
    Float,
    Str,
    Ident(String),
    /// `.dimension`, `.rows` or `.cols`, without the dot.
    Query(String),
    Punct(&'static str),
}

/// Two-character operators come first so they win over their prefixes.
const PUNCTS: &[&str] = &[
    "<=", ">=", "==", "!=", ".*", "(", ")", "[", "]", "{", "}", ",", ":", "?", "|", "&", "!", "<",
    ">", "+", "-", "*", "/", "^", "#", "@",
];

const COMPARE: &[&str] = &["==", "!=", "<=", ">=", "<", ">"];

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn tokenize(text: &str) -> Result<Vec<Tok>, String> {
    let mut out = Vec::new();
    let mut rest = text.trim_start();
    while let Some(c) = rest.chars().next() {
        if c.is_ascii_digit() {
            let int_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            let after = &rest[int_end..];
            if after.starts_with('.') && after[1..].starts_with(|c: char| c.is_ascii_digit()) {
                let frac_end = after[1..]
                    .find(|c: char| !c.is_ascii_digit())
                    .map_or(after.len(), |i| i + 1);
                out.push(Tok::Float);
                rest = &after[frac_end..];
            } else {
                let value = rest[..int_end].parse().map_err(|e| format!("{e}"))?;
                out.push(Tok::Int(value));
                rest = after;
            }
        } else if c == '"' {
            let close = rest[1..]
                .find('"')
                .ok_or_else(|| format!("unterminated string in {text:?}"))?;
            out.push(Tok::Str);
            rest = &rest[close + 2..];
        } else if c.is_ascii_alphabetic() || c == '_' {
            let end = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
            out.push(Tok::Ident(rest[..end].to_string()));
            rest = &rest[end..];
        } else if c == '.' && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            let body = &rest[1..];
            let end = body.find(|c: char| !is_ident_char(c)).unwrap_or(body.len());
            out.push(Tok::Query(body[..end].to_string()));
            rest = &body[end..];
        } else if let Some(p) = PUNCTS.iter().find(|p| rest.starts_with(**p)) {
            out.push(Tok::Punct(*p));
            rest = &rest[p.len()..];
        } else {
            return Err(format!("unexpected character {c:?} in {text:?}"));
        }
        rest = rest.trim_start();
    }
    Ok(out)
}

/// A checked sub-expression with its folded integer value, if constant.
#[derive(Debug, Clone)]
struct Typed {
    ty: Type,
    value: Option<i128>,
}

impl Typed {
    fn of(ty: Type) -> Self {
        Self { ty, value: None }
    }
}

struct Checker<'a> {
    tokens: Vec<Tok>,
    pos: usize,
    scope: &'a Scope,
    records: &'a RecordRegistry,
}

fn require(ty: &Type, expected: &Type, what: &str) -> Result<(), String> {
    if ty == expected {
        Ok(())
    } else {
        Err(format!("{what}: expected {expected}, found {ty}"))
    }
}

/// Result of `lhs op rhs` for `+ - * / ^`.
fn arithmetic(lhs: &Type, rhs: &Type, op: &str) -> Result<Type, String> {
    if lhs == rhs && lhs.is_arithmetic() {
        if op == "/" && !lhs.is_number() {
            return Err(format!("division of {lhs}"));
        }
        return Ok(lhs.clone());
    }
    let broadcast = match op {
        "+" | "*" => {
            (lhs.is_tensor() && *rhs == lhs.element_type())
                || (rhs.is_tensor() && *lhs == rhs.element_type())
        }
        "^" => lhs.is_tensor() && *rhs == lhs.element_type(),
        _ => false,
    };
    if broadcast {
        return Ok(if lhs.is_tensor() { lhs.clone() } else { rhs.clone() });
    }
    Err(format!("{lhs} {op} {rhs}"))
}

fn matmul(lhs: &Type, rhs: &Type) -> Result<Type, String> {
    match (lhs, rhs) {
        (Type::Vector(a, n), Type::Vector(b, m)) if a == b && n == m => Ok(Type::scalar(*a)),
        (Type::Vector(a, n), Type::Matrix(b, rows, cols)) if a == b && n == rows => {
            Ok(Type::vector(*a, *cols))
        }
        (Type::Matrix(a, rows, cols), Type::Vector(b, n)) if a == b && cols == n => {
            Ok(Type::vector(*a, *rows))
        }
        (Type::Matrix(a, rows, inner), Type::Matrix(b, inner2, cols))
            if a == b && inner == inner2 =>
        {
            Ok(Type::matrix(*a, *rows, *cols))
        }
        _ => Err(format!("{lhs} # {rhs}")),
    }
}

fn fold(lhs: Option<i128>, rhs: Option<i128>, op: &str) -> Option<i128> {
    let (a, b) = (lhs?, rhs?);
    match op {
        "+" => a.checked_add(b),
        "-" => a.checked_sub(b),
        "*" => a.checked_mul(b),
        "/" if b != 0 && a % b == 0 => Some(a / b),
        "^" => a.checked_pow(u32::try_from(b).ok()?),
        _ => None,
    }
}

impl Checker<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn peek_punct(&self) -> Option<&'static str> {
        match self.peek() {
            Some(Tok::Punct(p)) => Some(*p),
            _ => None,
        }
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.peek_punct() == Some(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> Result<(), String> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(format!("expected {punct:?}, found {:?}", self.peek()))
        }
    }

    fn ident(&mut self) -> Result<String, String> {
        match self.peek().cloned() {
            Some(Tok::Ident(name)) => {
                self.pos += 1;
                Ok(name)
            }
            other => Err(format!("expected identifier, found {other:?}")),
        }
    }

    /// Comma separated expressions up to `close`.
    fn list(&mut self, close: &str) -> Result<Vec<Typed>, String> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.select()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(",")?;
        }
    }

    fn select(&mut self) -> Result<Typed, String> {
        let cond = self.or()?;
        if !self.eat("?") {
            return Ok(cond);
        }
        require(&cond.ty, &Type::Bool, "select condition")?;
        let then = self.or()?;
        self.expect(":")?;
        let otherwise = self.or()?;
        require(&otherwise.ty, &then.ty, "select branches")?;
        Ok(Typed::of(then.ty))
    }

    fn or(&mut self) -> Result<Typed, String> {
        let lhs = self.and()?;
        if !self.eat("|") {
            return Ok(lhs);
        }
        let rhs = self.or()?;
        require(&lhs.ty, &Type::Bool, "|")?;
        require(&rhs.ty, &Type::Bool, "|")?;
        Ok(Typed::of(Type::Bool))
    }

    fn and(&mut self) -> Result<Typed, String> {
        let lhs = self.not()?;
        if !self.eat("&") {
            return Ok(lhs);
        }
        let rhs = self.and()?;
        require(&lhs.ty, &Type::Bool, "&")?;
        require(&rhs.ty, &Type::Bool, "&")?;
        Ok(Typed::of(Type::Bool))
    }

    fn not(&mut self) -> Result<Typed, String> {
        if !self.eat("!") {
            return self.compare();
        }
        let operand = self.compare()?;
        require(&operand.ty, &Type::Bool, "!")?;
        Ok(Typed::of(Type::Bool))
    }

    fn compare(&mut self) -> Result<Typed, String> {
        let lhs = self.add()?;
        let Some(op) = self.peek_punct().filter(|p| COMPARE.contains(p)) else {
            return Ok(lhs);
        };
        self.pos += 1;
        let rhs = self.add()?;
        if !lhs.ty.is_number() {
            return Err(format!("comparison of {}", lhs.ty));
        }
        require(&rhs.ty, &lhs.ty, op)?;
        Ok(Typed::of(Type::Bool))
    }

    fn add(&mut self) -> Result<Typed, String> {
        let mut lhs = self.mul()?;
        while let Some(op) = self.peek_punct().filter(|p| matches!(*p, "+" | "-")) {
            self.pos += 1;
            let rhs = self.mul()?;
            lhs = Typed {
                ty: arithmetic(&lhs.ty, &rhs.ty, op)?,
                value: fold(lhs.value, rhs.value, op),
            };
        }
        Ok(lhs)
    }

    fn mul(&mut self) -> Result<Typed, String> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek_punct().filter(|p| matches!(*p, "*" | "/")) {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Typed {
                ty: arithmetic(&lhs.ty, &rhs.ty, op)?,
                value: fold(lhs.value, rhs.value, op),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Typed, String> {
        if !self.eat("-") {
            return self.exp();
        }
        let operand = self.unary()?;
        if !operand.ty.is_number() {
            return Err(format!("negation of {}", operand.ty));
        }
        Ok(Typed {
            value: operand.value.and_then(i128::checked_neg),
            ty: operand.ty,
        })
    }

    fn exp(&mut self) -> Result<Typed, String> {
        let base = self.dim()?;
        if !self.eat("^") {
            return Ok(base);
        }
        let power = self.exp()?;
        Ok(Typed {
            ty: arithmetic(&base.ty, &power.ty, "^")?,
            value: fold(base.value, power.value, "^"),
        })
    }

    fn dim(&mut self) -> Result<Typed, String> {
        let operand = self.dot()?;
        let Some(Tok::Query(query)) = self.peek().cloned() else {
            return Ok(operand);
        };
        self.pos += 1;
        match (query.as_str(), &operand.ty) {
            ("dimension", Type::Vector(..)) | ("rows" | "cols", Type::Matrix(..)) => {
                Ok(Typed::of(Type::Int))
            }
            _ => Err(format!(".{query} of {}", operand.ty)),
        }
    }

    fn dot(&mut self) -> Result<Typed, String> {
        let mut lhs = self.matmul()?;
        while self.eat(".*") {
            let rhs = self.matmul()?;
            match (&lhs.ty, &rhs.ty) {
                (Type::Vector(a, n), Type::Vector(b, m)) if a == b && n == m => {
                    lhs = Typed::of(Type::scalar(*a));
                }
                (l, r) => return Err(format!("{l} .* {r}")),
            }
        }
        Ok(lhs)
    }

    fn matmul(&mut self) -> Result<Typed, String> {
        let mut lhs = self.subrange()?;
        while self.eat("#") {
            let rhs = self.subrange()?;
            lhs = Typed::of(matmul(&lhs.ty, &rhs.ty)?);
        }
        Ok(lhs)
    }

    /// `lo : step : hi` with constant bounds; the number of selected indices.
    fn range(&mut self) -> Result<usize, String> {
        let lo = self.select()?;
        self.expect(":")?;
        let step = self.select()?;
        self.expect(":")?;
        let hi = self.select()?;
        for part in [&lo, &step, &hi] {
            require(&part.ty, &Type::Int, "subrange bound")?;
        }
        let (Some(lo), Some(hi)) = (lo.value, hi.value) else {
            return Err("subrange bounds are not constant".to_string());
        };
        match usize::try_from(hi - lo + 1) {
            Ok(count) if count >= 1 => Ok(count),
            _ => Err(format!("empty subrange {lo} : {hi}")),
        }
    }

    fn subrange(&mut self) -> Result<Typed, String> {
        let source = self.element()?;
        if !self.eat("{") {
            return Ok(source);
        }
        let ty = match source.ty {
            Type::Vector(kind, _) => {
                let count = self.range()?;
                self.expect("}")?;
                if count == 1 {
                    Type::scalar(kind)
                } else {
                    Type::vector(kind, count)
                }
            }
            Type::Matrix(kind, _, _) => {
                let rows = self.range()?;
                self.expect("}")?;
                self.expect("{")?;
                let cols = self.range()?;
                self.expect("}")?;
                match (rows, cols) {
                    (1, 1) => Type::scalar(kind),
                    (1, cols) => Type::vector(kind, cols),
                    (rows, cols) => Type::matrix(kind, rows, cols),
                }
            }
            other => return Err(format!("subrange of {other}")),
        };
        Ok(Typed::of(ty))
    }

    fn element(&mut self) -> Result<Typed, String> {
        let source = self.atom()?;
        if !self.eat("[") {
            return Ok(source);
        }
        let index = self.select()?;
        self.expect("]")?;
        require(&index.ty, &Type::Int, "index")?;
        match source.ty {
            Type::Vector(kind, _) => Ok(Typed::of(Type::scalar(kind))),
            Type::Matrix(kind, _, cols) => Ok(Typed::of(Type::vector(kind, cols))),
            other => Err(format!("indexing {other}")),
        }
    }

    fn atom(&mut self) -> Result<Typed, String> {
        let Some(token) = self.peek().cloned() else {
            return Err("unexpected end of expression".to_string());
        };
        self.pos += 1;
        match token {
            Tok::Int(value) => Ok(Typed {
                ty: Type::Int,
                value: Some(value),
            }),
            Tok::Float => Ok(Typed::of(Type::Float)),
            Tok::Str => Ok(Typed::of(Type::String)),
            Tok::Punct("(") => {
                let inner = self.select()?;
                self.expect(")")?;
                Ok(inner)
            }
            Tok::Punct("[") => {
                let items = self.list("]")?;
                Ok(Typed::of(list_type(&items)?))
            }
            Tok::Punct("@") => {
                let id = self.ident()?;
                self.expect("[")?;
                let values = self.list("]")?;
                let records = self.records;
                let fields = records
                    .fields(&id)
                    .ok_or_else(|| format!("unknown record {id}"))?;
                if fields.len() != values.len() {
                    return Err(format!("{id} literal with {} values", values.len()));
                }
                for (field, value) in fields.iter().zip(&values) {
                    require(&value.ty, &field.ty, &field.name)?;
                }
                Ok(Typed::of(Type::Record(id)))
            }
            Tok::Ident(name) if name == "true" || name == "false" => Ok(Typed::of(Type::Bool)),
            Tok::Ident(name) => {
                let ty = self.reference(&name)?;
                if !self.eat("@") {
                    return Ok(Typed::of(ty));
                }
                let name = self.ident()?;
                let id = ty
                    .record_id()
                    .ok_or_else(|| format!("field access on {ty}"))?;
                let records = self.records;
                let field = records
                    .fields(id)
                    .and_then(|fields| fields.iter().find(|f| f.name == name))
                    .ok_or_else(|| format!("{id} has no field {name}"))?;
                Ok(Typed::of(field.ty.clone()))
            }
            other => Err(format!("unexpected {other:?}")),
        }
    }

    /// Type of an identifier or of a call to it.
    fn reference(&mut self, name: &str) -> Result<Type, String> {
        let scope = self.scope;
        let entry = scope
            .visible()
            .find(|entry| entry.name == name)
            .ok_or_else(|| format!("{name} is not in scope"))?;
        if !self.eat("(") {
            if entry.kind == BindingKind::Function {
                return Err(format!("function {name} used without a call"));
            }
            return Ok(entry.ty.clone());
        }
        if entry.kind != BindingKind::Function {
            return Err(format!("{name} is not a function"));
        }
        let args = self.list(")")?;
        if args.len() != entry.params.len() {
            return Err(format!("{name} called with {} arguments", args.len()));
        }
        for (arg, param) in args.iter().zip(&entry.params) {
            require(&arg.ty, param, name)?;
        }
        Ok(entry.ty.clone())
    }
}

/// Type of an inline `[a, b, ...]` literal: a vector of scalars or a matrix
/// of equal-length vectors.
fn list_type(items: &[Typed]) -> Result<Type, String> {
    let first = items.first().ok_or("empty list literal")?;
    if let Some(bad) = items.iter().find(|item| item.ty != first.ty) {
        return Err(format!("list mixes {} and {}", first.ty, bad.ty));
    }
    match &first.ty {
        Type::Int => Ok(Type::vector(Scalar::Int, items.len())),
        Type::Float => Ok(Type::vector(Scalar::Float, items.len())),
        Type::Vector(kind, cols) => Ok(Type::matrix(*kind, items.len(), *cols)),
        other => Err(format!("list of {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RecordField;
    use crate::scope::ParamTypes;
    use smallvec::smallvec;

    fn fixture() -> (Scope, RecordRegistry) {
        let mut records = RecordRegistry::new();
        records.define(
            "ioNode".into(),
            vec![
                RecordField {
                    ty: Type::Bool,
                    name: "isLoaded".into(),
                    mutable: true,
                },
                RecordField {
                    ty: Type::Int,
                    name: "stackCount".into(),
                    mutable: false,
                },
            ],
        );
        let mut scope = Scope::new();
        scope.define_value("shiftVector".into(), Type::vector(Scalar::Int, 3));
        scope.define_variable("dataMatrix".into(), Type::matrix(Scalar::Float, 2, 3));
        scope.define_value("packet".into(), Type::Record("ioNode".into()));
        scope.define_function(
            "fetchStackCount".into(),
            Type::Int,
            smallvec![Type::Bool, Type::Float],
        );
        scope.define_function(
            "buildPacket".into(),
            Type::Record("ioNode".into()),
            ParamTypes::new(),
        );
        (scope, records)
    }

    fn type_of(text: &str) -> Result<Type, String> {
        let (scope, records) = fixture();
        check(text, &scope, &records)
    }

    #[test]
    fn literals_and_references() {
        assert_eq!(type_of("42"), Ok(Type::Int));
        assert_eq!(type_of("3.14159"), Ok(Type::Float));
        assert_eq!(type_of("\"Hello World!\""), Ok(Type::String));
        assert_eq!(type_of("[1, 2]"), Ok(Type::vector(Scalar::Int, 2)));
        assert_eq!(
            type_of("[[1.00000, 2.00000], [3.00000, 4.00000]]"),
            Ok(Type::matrix(Scalar::Float, 2, 2))
        );
        assert_eq!(type_of("@ ioNode [true, 3]"), Ok(Type::Record("ioNode".into())));
        assert_eq!(type_of("packet @ stackCount"), Ok(Type::Int));
        assert_eq!(type_of("buildPacket() @ isLoaded"), Ok(Type::Bool));
        assert_eq!(type_of("fetchStackCount(true, 1.50000)"), Ok(Type::Int));
    }

    #[test]
    fn operators_follow_precedence() {
        assert_eq!(type_of("1 + 2 * 3 < 4 ? 1.00000 : 2.00000"), Ok(Type::Float));
        assert_eq!(type_of("! 1 < 2 & true | false"), Ok(Type::Bool));
        assert_eq!(type_of("shiftVector .* [1, 2, 3]"), Ok(Type::Int));
        assert_eq!(type_of("shiftVector .dimension ^ 2"), Ok(Type::Int));
        assert_eq!(type_of("- 2 ^ 3"), Ok(Type::Int));
        assert_eq!(type_of("2 + shiftVector"), Ok(Type::vector(Scalar::Int, 3)));
    }

    #[test]
    fn tensor_shapes() {
        assert_eq!(
            type_of("dataMatrix # [1.00000, 2.00000, 3.00000]"),
            Ok(Type::vector(Scalar::Float, 2))
        );
        assert_eq!(
            type_of("dataMatrix # [[1.00000], [2.00000], [3.00000]]"),
            Ok(Type::matrix(Scalar::Float, 2, 1))
        );
        assert_eq!(type_of("dataMatrix[0]"), Ok(Type::vector(Scalar::Float, 3)));
        assert_eq!(type_of("shiftVector [1]"), Ok(Type::Int));
        assert_eq!(
            type_of("shiftVector {-1 : 1 : 2 - 2}"),
            Ok(Type::vector(Scalar::Int, 2))
        );
        assert_eq!(type_of("shiftVector {2 : 1 : 4 / 2}"), Ok(Type::Int));
        assert_eq!(
            type_of("dataMatrix {0 : 1 : 0 }{ 0 : 1 : 2 ^ 1}"),
            Ok(Type::vector(Scalar::Float, 3))
        );
    }

    #[test]
    fn ill_typed_text_is_rejected() {
        for text in [
            "1 + 2.00000",
            "shiftVector # dataMatrix",
            "true + 1",
            "fetchStackCount(1, 2)",
            "fetchStackCount",
            "unknownName",
            "packet @ missing",
            "shiftVector {0 : 1 : queueDepth}",
            "[1, 2.00000]",
            "@ ioNode [1, 2]",
            "1 2",
        ] {
            assert!(type_of(text).is_err(), "{text} was accepted");
        }
    }
}
