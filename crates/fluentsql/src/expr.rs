//! Expression layer for projections, filters, join constraints and ordering.
//!
//! An [`Expr`] is an immutable tree. Every combinator consumes its operands
//! and returns a new node, so a finished expression never changes underneath
//! a query that holds it.
//!
//! Three kinds of `?` can appear in a rendered expression:
//! - [`Expr::Placeholder`] created by [`arg()`], waiting for a value from the
//!   call that attaches the expression to a query
//! - [`Expr::Bound`], a placeholder whose value has been supplied
//! - markers inside [`Expr::Raw`] fragments, paired with their values by [`raw()`]
//!
//! Subqueries embedded with [`Expr::in_`] carry their own bound arguments and
//! contribute them to the enclosing render.

use std::collections::{BTreeMap, BTreeSet};
use std::ops;

use crate::error::{QbError, QbResult};
use crate::param::{Param, ParamList};
use crate::query::Query;
use crate::writer::{SqlWriter, count_placeholders};

/// A literal value inlined into the SQL text.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub(crate) fn write_sql(&self, w: &mut SqlWriter) {
        match self {
            Value::Null => {
                w.push("NULL");
            }
            Value::Integer(v) => {
                w.push(&v.to_string());
            }
            // SQLite has no literal for NaN or infinity.
            Value::Real(v) if !v.is_finite() => {
                w.push("NULL");
            }
            // Debug keeps the fractional part (`1.0`), so the literal stays REAL.
            Value::Real(v) => {
                w.push(&format!("{v:?}"));
            }
            Value::Text(s) => {
                w.push_char('\'');
                w.push(&s.replace('\'', "''"));
                w.push_char('\'');
            }
        }
    }
}

macro_rules! value_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Integer(i64::from(v))
                }
            }
        )*
    };
}

value_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Prefix and postfix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    IsNull,
    IsNotNull,
}

/// Infix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    In,
    NotIn,
    Is,
    IsNot,
    Like,
    Glob,
    Concat,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::In => "IN",
            BinaryOp::NotIn => "NOT IN",
            BinaryOp::Is => "IS",
            BinaryOp::IsNot => "IS NOT",
            BinaryOp::Like => "LIKE",
            BinaryOp::Glob => "GLOB",
            BinaryOp::Concat => "||",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    // SQLite operator precedence, loosest first.
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::In
            | BinaryOp::NotIn
            | BinaryOp::Is
            | BinaryOp::IsNot
            | BinaryOp::Like
            | BinaryOp::Glob => 4,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 5,
            BinaryOp::Add | BinaryOp::Sub => 6,
            BinaryOp::Mul | BinaryOp::Div => 7,
            BinaryOp::Concat => 8,
        }
    }

    fn is_associative(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

const PREC_RAW: u8 = 0;
const PREC_NOT: u8 = 3;
const PREC_IS_NULL: u8 = 4;
const PREC_COLLATE: u8 = 9;
const PREC_ATOM: u8 = 10;

/// Expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Column reference, optionally qualified: `t.c`
    Column { table: Option<String>, name: String },

    /// Literal rendered inline; never becomes an argument.
    Literal(Value),

    /// Unbound `?` awaiting a value.
    Placeholder,

    /// `?` with its value already supplied.
    Bound(Param),

    /// Verbatim SQL with values for its `?` markers, in order.
    Raw { sql: String, params: Vec<Param> },

    Unary { op: UnaryOp, operand: Box<Expr> },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Function call: `NAME(arg, ...)`
    Function { name: String, args: Vec<Expr> },

    /// `expr COLLATE sequence`
    Collate { expr: Box<Expr>, collation: String },

    /// Parenthesized subquery.
    Subquery(Box<Query>),
}

/// Build a column reference.
pub fn column(name: impl Into<String>) -> Expr {
    Expr::Column {
        table: None,
        name: name.into(),
    }
}

/// Build a table-qualified column reference: `table.name`.
pub fn column_of(table: impl Into<String>, name: impl Into<String>) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        name: name.into(),
    }
}

/// Build a literal.
pub fn literal(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

/// Build a `NULL` literal.
pub fn nul() -> Expr {
    Expr::Literal(Value::Null)
}

/// Build an unbound `?` placeholder.
pub fn arg() -> Expr {
    Expr::Placeholder
}

/// Build a raw SQL fragment, binding `values` to its `?` markers left to right.
///
/// `?` inside quoted literals is not a marker. Passing no values (an empty
/// collection or `None`) is valid when the text has no markers.
///
/// # Example
/// ```ignore
/// let e = fluentsql::raw("status = ? AND kind = ?", fluentsql::params!["new", 3])?;
/// ```
pub fn raw<I>(sql: impl Into<String>, values: I) -> QbResult<Expr>
where
    I: IntoIterator,
    I::Item: Into<Param>,
{
    let sql = sql.into();
    let params: Vec<Param> = values.into_iter().map(Into::into).collect();
    let expected = count_placeholders(&sql);
    if expected != params.len() {
        return Err(QbError::argument_count(expected, params.len()));
    }
    Ok(Expr::Raw { sql, params })
}

/// `NOT expr`
pub fn not(expr: Expr) -> Expr {
    Expr::Unary {
        op: UnaryOp::Not,
        operand: Box::new(expr),
    }
}

/// Call a function by name.
pub fn function(name: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Function {
        name: name.into(),
        args: args.into_iter().collect(),
    }
}

pub fn sum(expr: Expr) -> Expr {
    function("SUM", [expr])
}

pub fn count(expr: Expr) -> Expr {
    function("COUNT", [expr])
}

/// `COUNT(*)`
pub fn count_all() -> Expr {
    function(
        "COUNT",
        [Expr::Raw {
            sql: "*".to_string(),
            params: Vec::new(),
        }],
    )
}

pub fn min(expr: Expr) -> Expr {
    function("MIN", [expr])
}

pub fn max(expr: Expr) -> Expr {
    function("MAX", [expr])
}

pub fn avg(expr: Expr) -> Expr {
    function("AVG", [expr])
}

/// `COALESCE(a, b, ...)`; requires at least two expressions.
pub fn coalesce(exprs: impl IntoIterator<Item = Expr>) -> QbResult<Expr> {
    let args: Vec<Expr> = exprs.into_iter().collect();
    if args.len() < 2 {
        return Err(QbError::FunctionArity {
            function: "COALESCE",
            min: 2,
            actual: args.len(),
        });
    }
    Ok(function("COALESCE", args))
}

/// `IFNULL(a, b)`
pub fn ifnull(expr: Expr, fallback: impl Into<Expr>) -> Expr {
    function("IFNULL", [expr, fallback.into()])
}

/// Merge the arguments of `expr` into `args`, in the order its `?` markers render.
///
/// `values` fill the unbound placeholders; already bound values (raw
/// fragments, subqueries) are taken from the expression itself. Fails when
/// the number of values differs from the number of unbound placeholders.
pub fn add_expression_args<I>(args: &mut ParamList, expr: &Expr, values: I) -> QbResult<()>
where
    I: IntoIterator,
    I::Item: Into<Param>,
{
    let bound = expr.clone().bind(values)?;
    let mut w = SqlWriter::new();
    bound.write_sql(&mut w);
    let (_, params) = w.finish_bound();
    args.extend(&params);
    Ok(())
}

/// Intermediate state of `expr.is()`, completed by [`IsExpr::nul`] or [`IsExpr::expr`].
#[derive(Clone, Debug)]
#[must_use]
pub struct IsExpr {
    operand: Expr,
    negated: bool,
}

impl IsExpr {
    /// Negate: `IS NOT ...`
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// `IS NULL` / `IS NOT NULL`
    pub fn nul(self) -> Expr {
        let op = if self.negated {
            UnaryOp::IsNotNull
        } else {
            UnaryOp::IsNull
        };
        Expr::Unary {
            op,
            operand: Box::new(self.operand),
        }
    }

    /// `IS rhs` / `IS NOT rhs`
    pub fn expr(self, rhs: impl Into<Expr>) -> Expr {
        let op = if self.negated {
            BinaryOp::IsNot
        } else {
            BinaryOp::Is
        };
        self.operand.binary(op, rhs.into())
    }
}

impl Expr {
    fn binary(self, op: BinaryOp, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(rhs),
        }
    }

    /// `self == rhs`
    pub fn eq(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Eq, rhs.into())
    }

    /// `self <> rhs`
    pub fn ne(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Ne, rhs.into())
    }

    pub fn lt(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Lt, rhs.into())
    }

    pub fn gt(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Gt, rhs.into())
    }

    pub fn le(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Le, rhs.into())
    }

    pub fn ge(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Ge, rhs.into())
    }

    pub fn and(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::And, rhs.into())
    }

    pub fn or(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Or, rhs.into())
    }

    pub fn like(self, pattern: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Like, pattern.into())
    }

    pub fn glob(self, pattern: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Glob, pattern.into())
    }

    /// String concatenation: `self || rhs`
    pub fn concat(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Concat, rhs.into())
    }

    pub fn add(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Add, rhs.into())
    }

    pub fn sub(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Sub, rhs.into())
    }

    pub fn mul(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Mul, rhs.into())
    }

    pub fn div(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Div, rhs.into())
    }

    /// `self IN (subquery)`
    pub fn in_(self, subquery: Query) -> Expr {
        self.binary(BinaryOp::In, Expr::Subquery(Box::new(subquery)))
    }

    /// `self NOT IN (subquery)`
    pub fn not_in(self, subquery: Query) -> Expr {
        self.binary(BinaryOp::NotIn, Expr::Subquery(Box::new(subquery)))
    }

    /// Start an `IS` comparison.
    ///
    /// `column("a").is().not().nul()` renders `a IS NOT NULL`.
    pub fn is(self) -> IsExpr {
        IsExpr {
            operand: self,
            negated: false,
        }
    }

    pub fn is_null(self) -> Expr {
        self.is().nul()
    }

    pub fn is_not_null(self) -> Expr {
        self.is().not().nul()
    }

    /// `self COLLATE collation`
    pub fn collate(self, collation: impl Into<String>) -> Expr {
        Expr::Collate {
            expr: Box::new(self),
            collation: collation.into(),
        }
    }

    /// Number of `?` markers still waiting for a value.
    ///
    /// Subqueries never contribute: their values were bound when they were built.
    pub fn placeholder_count(&self) -> usize {
        match self {
            Expr::Placeholder => 1,
            Expr::Column { .. } | Expr::Literal(_) | Expr::Bound(_) | Expr::Subquery(_) => 0,
            Expr::Raw { sql, params } => count_placeholders(sql).saturating_sub(params.len()),
            Expr::Unary { operand, .. } => operand.placeholder_count(),
            Expr::Binary { left, right, .. } => left.placeholder_count() + right.placeholder_count(),
            Expr::Function { args, .. } => args.iter().map(Expr::placeholder_count).sum(),
            Expr::Collate { expr, .. } => expr.placeholder_count(),
        }
    }

    /// Supply values for the unbound placeholders, left to right.
    ///
    /// Fails unless exactly one value is given per placeholder.
    pub fn bind<I>(mut self, values: I) -> QbResult<Expr>
    where
        I: IntoIterator,
        I::Item: Into<Param>,
    {
        let values: Vec<Param> = values.into_iter().map(Into::into).collect();
        self.check_raw_params()?;
        let expected = self.placeholder_count();
        if expected != values.len() {
            return Err(QbError::argument_count(expected, values.len()));
        }
        if expected > 0 {
            self.bind_in_place(&mut values.into_iter());
        }
        Ok(self)
    }

    /// Rejects raw fragments carrying more values than they have `?` markers.
    pub(crate) fn check_raw_params(&self) -> QbResult<()> {
        match self {
            Expr::Raw { sql, params } => {
                let markers = count_placeholders(sql);
                if params.len() > markers {
                    return Err(QbError::argument_count(markers, params.len()));
                }
                Ok(())
            }
            Expr::Unary { operand, .. } => operand.check_raw_params(),
            Expr::Binary { left, right, .. } => {
                left.check_raw_params()?;
                right.check_raw_params()
            }
            Expr::Function { args, .. } => args.iter().try_for_each(Expr::check_raw_params),
            Expr::Collate { expr, .. } => expr.check_raw_params(),
            Expr::Placeholder
            | Expr::Column { .. }
            | Expr::Literal(_)
            | Expr::Bound(_)
            | Expr::Subquery(_) => Ok(()),
        }
    }

    // Visits children in render order.
    fn bind_in_place(&mut self, values: &mut std::vec::IntoIter<Param>) {
        match self {
            Expr::Placeholder => {
                if let Some(value) = values.next() {
                    *self = Expr::Bound(value);
                }
            }
            Expr::Raw { sql, params } => {
                let missing = count_placeholders(sql).saturating_sub(params.len());
                params.extend(values.take(missing));
            }
            Expr::Unary { operand, .. } => operand.bind_in_place(values),
            Expr::Binary { left, right, .. } => {
                left.bind_in_place(values);
                right.bind_in_place(values);
            }
            Expr::Function { args, .. } => {
                for a in args {
                    a.bind_in_place(values);
                }
            }
            Expr::Collate { expr, .. } => expr.bind_in_place(values),
            Expr::Column { .. } | Expr::Literal(_) | Expr::Bound(_) | Expr::Subquery(_) => {}
        }
    }

    /// Values already bound, keyed by the 0-based index of their `?` in the rendered text.
    ///
    /// Includes values from nested subqueries. Unbound placeholders occupy an
    /// index but have no entry.
    pub fn bound_args(&self) -> BTreeMap<usize, Param> {
        let mut w = SqlWriter::new();
        self.write_sql(&mut w);
        let (_, slots) = w.finish();
        slots
            .into_iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|p| (i, p)))
            .collect()
    }

    /// Render as standalone SQL text.
    ///
    /// Only unbound placeholders may appear as `?`; an expression carrying
    /// bound values cannot be expressed without its argument list and is
    /// rejected.
    pub fn to_raw_sql(&self) -> QbResult<String> {
        let mut w = SqlWriter::new();
        self.write_sql(&mut w);
        let (sql, slots) = w.finish();
        let bound = slots.iter().filter(|s| s.is_some()).count();
        if bound > 0 {
            return Err(QbError::unsupported(format!(
                "expression has {bound} bound argument(s) and cannot be rendered as raw SQL"
            )));
        }
        Ok(sql)
    }

    /// Tables referenced by subqueries anywhere in this expression.
    pub fn tables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_tables(&mut out);
        out
    }

    pub(crate) fn collect_tables(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Subquery(q) => q.collect_tables(out),
            Expr::Unary { operand, .. } => operand.collect_tables(out),
            Expr::Binary { left, right, .. } => {
                left.collect_tables(out);
                right.collect_tables(out);
            }
            Expr::Function { args, .. } => {
                for a in args {
                    a.collect_tables(out);
                }
            }
            Expr::Collate { expr, .. } => expr.collect_tables(out),
            Expr::Column { .. }
            | Expr::Literal(_)
            | Expr::Placeholder
            | Expr::Bound(_)
            | Expr::Raw { .. } => {}
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Raw { .. } => PREC_RAW,
            Expr::Unary { op: UnaryOp::Not, .. } => PREC_NOT,
            Expr::Unary { .. } => PREC_IS_NULL,
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Collate { .. } => PREC_COLLATE,
            Expr::Column { .. }
            | Expr::Literal(_)
            | Expr::Placeholder
            | Expr::Bound(_)
            | Expr::Function { .. }
            | Expr::Subquery(_) => PREC_ATOM,
        }
    }

    fn write_operand(&self, w: &mut SqlWriter, parens: bool) {
        if parens {
            w.push_char('(');
            self.write_sql(w);
            w.push_char(')');
        } else {
            self.write_sql(w);
        }
    }

    pub(crate) fn write_sql(&self, w: &mut SqlWriter) {
        match self {
            Expr::Column { table, name } => {
                if let Some(t) = table {
                    w.push(t).push_char('.');
                }
                w.push(name);
            }
            Expr::Literal(v) => v.write_sql(w),
            Expr::Placeholder => {
                w.placeholder(None);
            }
            Expr::Bound(p) => {
                w.placeholder(Some(p.clone()));
            }
            // Top-level raw text goes out verbatim; nested raw text is parenthesized
            // by its parent since its precedence is unknown.
            Expr::Raw { sql, params } => {
                w.push_raw(sql, params);
            }
            Expr::Unary { op, operand } => {
                let prec = self.precedence();
                match op {
                    UnaryOp::Not => {
                        w.push("NOT ");
                        operand.write_operand(w, operand.precedence() < prec);
                    }
                    UnaryOp::IsNull => {
                        operand.write_operand(w, operand.precedence() <= prec);
                        w.push(" IS NULL");
                    }
                    UnaryOp::IsNotNull => {
                        operand.write_operand(w, operand.precedence() <= prec);
                        w.push(" IS NOT NULL");
                    }
                }
            }
            Expr::Binary { op, left, right } => {
                let prec = op.precedence();
                left.write_operand(w, left.precedence() < prec);
                w.push_char(' ').push(op.as_str()).push_char(' ');
                let right_parens = if op.is_associative() {
                    right.precedence() < prec
                } else {
                    right.precedence() <= prec
                };
                right.write_operand(w, right_parens);
            }
            Expr::Function { name, args } => {
                w.push(name).push_char('(');
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        w.push(", ");
                    }
                    a.write_sql(w);
                }
                w.push_char(')');
            }
            Expr::Collate { expr, collation } => {
                expr.write_operand(w, expr.precedence() < PREC_COLLATE);
                w.push(" COLLATE ").push(collation);
            }
            Expr::Subquery(q) => {
                w.push_char('(');
                q.write_sql(w);
                w.push_char(')');
            }
        }
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        not(self)
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Literal(v)
    }
}

impl From<Query> for Expr {
    fn from(q: Query) -> Self {
        Expr::Subquery(Box::new(q))
    }
}

macro_rules! expr_from_literal {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Expr {
                fn from(v: $ty) -> Self {
                    Expr::Literal(Value::from(v))
                }
            }
        )*
    };
}

expr_from_literal!(i8, i16, i32, i64, u8, u16, u32, f32, f64, bool);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::select;

    fn subquery_with_bound_arg() -> Query {
        select()
            .column("id")
            .from("table_a")
            .where_with(column("name").eq(arg()), ["Smith"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_comparison_renders_sqlite_operators() {
        assert_eq!(column("id").eq(literal(0)).to_raw_sql().unwrap(), "id == 0");
        assert_eq!(column("a").ne(1).to_raw_sql().unwrap(), "a <> 1");
        assert_eq!(column("a").le(arg()).to_raw_sql().unwrap(), "a <= ?");
    }

    #[test]
    fn test_literals() {
        assert_eq!(literal("it's").to_raw_sql().unwrap(), "'it''s'");
        assert_eq!(literal(-1).to_raw_sql().unwrap(), "-1");
        assert_eq!(literal(1.0).to_raw_sql().unwrap(), "1.0");
        assert_eq!(nul().to_raw_sql().unwrap(), "NULL");
        assert_eq!(literal(None::<i32>).to_raw_sql().unwrap(), "NULL");
    }

    #[test]
    fn test_is_not_null_chain() {
        let e = column("col_a").is().not().nul();
        assert_eq!(e.to_raw_sql().unwrap(), "col_a IS NOT NULL");
        assert_eq!(column("b").is_null().to_raw_sql().unwrap(), "b IS NULL");
        assert_eq!(
            column("b").is().not().expr(literal(1)).to_raw_sql().unwrap(),
            "b IS NOT 1"
        );
    }

    #[test]
    fn test_precedence_parenthesizes_looser_operands() {
        let e = column("a").eq(1).or(column("b").eq(2)).and(column("c").eq(3));
        assert_eq!(e.to_raw_sql().unwrap(), "(a == 1 OR b == 2) AND c == 3");

        let e = column("a").eq(1).and(column("b").eq(2)).or(column("c").eq(3));
        assert_eq!(e.to_raw_sql().unwrap(), "a == 1 AND b == 2 OR c == 3");

        let e = !column("a").eq(1).and(column("b").eq(2));
        assert_eq!(e.to_raw_sql().unwrap(), "NOT (a == 1 AND b == 2)");

        let e = column("a").sub(column("b").sub(column("c")));
        assert_eq!(e.to_raw_sql().unwrap(), "a - (b - c)");
    }

    #[test]
    fn test_functions() {
        assert_eq!(sum(column("col_b")).gt(literal(0)).to_raw_sql().unwrap(), "SUM(col_b) > 0");
        assert_eq!(count_all().to_raw_sql().unwrap(), "COUNT(*)");
        assert_eq!(
            coalesce([column("a"), literal(0)]).unwrap().to_raw_sql().unwrap(),
            "COALESCE(a, 0)"
        );
        assert_eq!(ifnull(column("a"), 0).to_raw_sql().unwrap(), "IFNULL(a, 0)");
    }

    #[test]
    fn test_coalesce_rejects_fewer_than_two() {
        let err = coalesce(Vec::<Expr>::new()).unwrap_err();
        assert!(err.is_invalid_argument());
        let err = coalesce([literal(666)]).unwrap_err();
        assert_eq!(
            err,
            QbError::FunctionArity {
                function: "COALESCE",
                min: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_raw_validates_marker_count() {
        assert!(raw("a = ?", [1]).is_ok());
        assert!(raw("a IS NULL", None::<Param>).is_ok());
        assert_eq!(raw("a = ?", None::<Param>).unwrap_err(), QbError::argument_count(1, 0));
        assert_eq!(raw("a = ?", [1, 2]).unwrap_err(), QbError::argument_count(1, 2));
        assert!(raw("a = '?'", crate::params![]).is_ok());
    }

    #[test]
    fn test_bind_replaces_placeholders_in_order() {
        let e = column("a").eq(arg()).and(column("b").eq(arg()));
        assert_eq!(e.placeholder_count(), 2);
        let bound = e.bind(["x", "y"]).unwrap();
        assert_eq!(bound.placeholder_count(), 0);
        assert_eq!(
            bound.bound_args(),
            BTreeMap::from([(0, Param::from("x")), (1, Param::from("y"))])
        );
    }

    #[test]
    fn test_bind_rejects_count_mismatch() {
        assert!(column("a").eq(arg()).bind(None::<Param>).unwrap_err().is_argument_count());
        assert!(column("a").eq(arg()).bind([1, 2]).unwrap_err().is_argument_count());
        assert!(column("a").is_null().bind(None::<Param>).is_ok());
    }

    #[test]
    fn test_raw_with_surplus_params_is_rejected() {
        let e = Expr::Raw {
            sql: "a = ?".to_string(),
            params: vec![Param::from(1), Param::from(2)],
        };
        assert_eq!(e.clone().bind(None::<Param>).unwrap_err(), QbError::argument_count(1, 2));
        assert!(not(e.clone()).bind(None::<Param>).unwrap_err().is_argument_count());
        assert!(select().from("t").where_(e.clone()).build().unwrap_err().is_argument_count());
        assert!(select().from("t").order_by(e).build().unwrap_err().is_argument_count());
    }

    #[test]
    fn test_non_finite_reals_render_null() {
        assert_eq!(literal(f64::NAN).to_raw_sql().unwrap(), "NULL");
        assert_eq!(literal(f64::INFINITY).to_raw_sql().unwrap(), "NULL");
        assert_eq!(literal(f64::NEG_INFINITY).to_raw_sql().unwrap(), "NULL");
        assert_eq!(literal(1.5).to_raw_sql().unwrap(), "1.5");
    }

    #[test]
    fn test_bound_args_from_subqueries() {
        let e = column("deleted")
            .eq(arg())
            .and(column("id").in_(subquery_with_bound_arg()))
            .and(column("priority").eq(arg()));
        assert_eq!(e.bound_args(), BTreeMap::from([(1, Param::from("Smith"))]));
        assert_eq!(e.placeholder_count(), 2);
    }

    #[test]
    fn test_raw_sql_rejects_bound_args() {
        let err = column("id").in_(subquery_with_bound_arg()).to_raw_sql().unwrap_err();
        assert!(matches!(err, QbError::Unsupported(_)));
    }

    #[test]
    fn test_tables_come_from_subqueries_only() {
        assert!(column_of("t", "a").tables().is_empty());
        let e = column("id").in_(subquery_with_bound_arg());
        assert_eq!(e.tables(), BTreeSet::from(["table_a".to_string()]));
    }

    #[test]
    fn test_add_expression_args_merges_in_text_order() {
        let e = column("a")
            .eq(arg())
            .and(column("id").in_(subquery_with_bound_arg()));
        let mut args = ParamList::new();
        add_expression_args(&mut args, &e, [7]).unwrap();
        assert_eq!(args.into_strings(), vec!["7".to_string(), "Smith".to_string()]);
    }

    #[test]
    fn test_add_expression_args_rejects_missing_values() {
        let mut args = ParamList::new();
        let err = add_expression_args(&mut args, &arg(), None::<Param>).unwrap_err();
        assert!(err.is_argument_count());
        assert!(args.is_empty());

        add_expression_args(&mut args, &column("a").is_null(), None::<Param>).unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn test_collate_wraps_compound_operands() {
        assert_eq!(
            column("a").collate("NOCASE").to_raw_sql().unwrap(),
            "a COLLATE NOCASE"
        );
        assert_eq!(
            column("a").concat(column("b")).collate("NOCASE").to_raw_sql().unwrap(),
            "(a || b) COLLATE NOCASE"
        );
    }
}
