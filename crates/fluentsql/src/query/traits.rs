//! Conversions accepted by the builder's clause methods.
//!
//! Each clause takes either a string (a table name or raw SQL) or a typed
//! value, and `Option` wrappers where an absent value is a silent no-op.

use crate::error::{QbError, QbResult};
use crate::expr::{Expr, raw};
use crate::param::Param;
use crate::query::builder::QueryBuilder;
use crate::query::state::Source;
use crate::query::Query;

/// Something usable as a `FROM` or `JOIN` target.
pub trait IntoSource {
    fn into_source(self) -> QbResult<Source>;
}

impl IntoSource for &str {
    fn into_source(self) -> QbResult<Source> {
        Ok(Source::Table(self.to_string()))
    }
}

impl IntoSource for String {
    fn into_source(self) -> QbResult<Source> {
        Ok(Source::Table(self))
    }
}

impl IntoSource for &String {
    fn into_source(self) -> QbResult<Source> {
        Ok(Source::Table(self.clone()))
    }
}

impl IntoSource for Query {
    fn into_source(self) -> QbResult<Source> {
        Ok(Source::Subquery(Box::new(self)))
    }
}

impl IntoSource for &Query {
    fn into_source(self) -> QbResult<Source> {
        Ok(Source::Subquery(Box::new(self.clone())))
    }
}

/// An unbuilt builder is built on attachment; its error becomes the caller's.
impl IntoSource for QueryBuilder {
    fn into_source(self) -> QbResult<Source> {
        self.build().map(|q| Source::Subquery(Box::new(q)))
    }
}

/// A `WHERE`, `HAVING` or `ON` predicate, paired with values for its placeholders.
///
/// Strings are raw SQL; `None` and blank text add nothing.
pub trait IntoPredicate {
    fn into_predicate(self, values: Vec<Param>) -> QbResult<Option<Expr>>;
}

/// Raw SQL text, or nothing when the text is blank.
fn raw_or_absent(sql: &str, values: Vec<Param>) -> QbResult<Option<Expr>> {
    if sql.trim().is_empty() {
        return Ok(None);
    }
    raw(sql, values).map(Some)
}

impl IntoPredicate for &str {
    fn into_predicate(self, values: Vec<Param>) -> QbResult<Option<Expr>> {
        raw_or_absent(self, values)
    }
}

impl IntoPredicate for String {
    fn into_predicate(self, values: Vec<Param>) -> QbResult<Option<Expr>> {
        raw_or_absent(&self, values)
    }
}

impl IntoPredicate for &String {
    fn into_predicate(self, values: Vec<Param>) -> QbResult<Option<Expr>> {
        raw_or_absent(self, values)
    }
}

impl IntoPredicate for Expr {
    fn into_predicate(self, values: Vec<Param>) -> QbResult<Option<Expr>> {
        self.bind(values).map(Some)
    }
}

impl<T: IntoPredicate> IntoPredicate for Option<T> {
    fn into_predicate(self, values: Vec<Param>) -> QbResult<Option<Expr>> {
        // Values supplied alongside an absent predicate are ignored with it.
        self.map_or(Ok(None), |p| p.into_predicate(values))
    }
}

/// A `GROUP BY` or `ORDER BY` term. Blank text and `None` add nothing.
///
/// There is no way to supply values here, so expressions with unbound
/// placeholders are rejected.
pub trait IntoTerm {
    fn into_term(self) -> QbResult<Option<Expr>>;
}

impl IntoTerm for &str {
    fn into_term(self) -> QbResult<Option<Expr>> {
        raw_or_absent(self, Vec::new())
    }
}

impl IntoTerm for String {
    fn into_term(self) -> QbResult<Option<Expr>> {
        raw_or_absent(&self, Vec::new())
    }
}

impl IntoTerm for &String {
    fn into_term(self) -> QbResult<Option<Expr>> {
        raw_or_absent(self, Vec::new())
    }
}

impl IntoTerm for Expr {
    fn into_term(self) -> QbResult<Option<Expr>> {
        fully_bound(self).map(Some)
    }
}

impl<T: IntoTerm> IntoTerm for Option<T> {
    fn into_term(self) -> QbResult<Option<Expr>> {
        self.map_or(Ok(None), IntoTerm::into_term)
    }
}

/// A `LIMIT` or `OFFSET` value. `None` is an explicit "no limit".
pub trait IntoLimit {
    fn into_limit(self) -> QbResult<Option<Expr>>;
}

macro_rules! limit_from_integer {
    ($($ty:ty),*) => {
        $(
            impl IntoLimit for $ty {
                fn into_limit(self) -> QbResult<Option<Expr>> {
                    let v = i64::try_from(self).map_err(|_| {
                        QbError::unsupported(format!("limit value {self} does not fit in i64"))
                    })?;
                    Ok(Some(Expr::from(v)))
                }
            }
        )*
    };
}

limit_from_integer!(i32, i64, u32, u64, usize);

impl IntoLimit for &str {
    fn into_limit(self) -> QbResult<Option<Expr>> {
        raw(self, None::<Param>).map(Some)
    }
}

impl IntoLimit for String {
    fn into_limit(self) -> QbResult<Option<Expr>> {
        raw(self, None::<Param>).map(Some)
    }
}

impl IntoLimit for Expr {
    fn into_limit(self) -> QbResult<Option<Expr>> {
        fully_bound(self).map(Some)
    }
}

impl<T: IntoLimit> IntoLimit for Option<T> {
    fn into_limit(self) -> QbResult<Option<Expr>> {
        self.map_or(Ok(None), IntoLimit::into_limit)
    }
}

/// Reject expressions that still wait for values.
pub(crate) fn fully_bound(expr: Expr) -> QbResult<Expr> {
    expr.check_raw_params()?;
    match expr.placeholder_count() {
        0 => Ok(expr),
        n => Err(QbError::argument_count(n, 0)),
    }
}
