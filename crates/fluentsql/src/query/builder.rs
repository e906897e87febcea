//! Chainable SELECT builder.

use std::collections::BTreeSet;

use crate::error::{QbError, QbResult};
use crate::expr::{self, Expr, Value};
use crate::param::Param;
use crate::query::Query;
use crate::query::state::{
    Compound, CompoundOp, Direction, FromClause, Join, JoinConstraint, JoinKind, LimitState,
    OrderTerm, ProjectionItem, QueryState,
};
use crate::query::traits::{IntoLimit, IntoPredicate, IntoSource, IntoTerm, fully_bound};

/// What `alias()`, `of()`, `asc()` and friends apply to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Cursor {
    #[default]
    None,
    /// Projection items appended by the last projection call, from `start` to the end.
    Projection { start: usize },
    Source,
    Join,
    OrderBy,
    Compound,
}

/// SELECT builder.
///
/// Every method consumes and returns the builder. The first construction
/// error is recorded and reported by [`build`](Self::build); the offending
/// call leaves the query unchanged.
///
/// Clause calls always apply to the last block of a compound chain, so
/// `union()` followed by `from()` fills the right-hand side.
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct QueryBuilder {
    state: QueryState,
    cursor: Cursor,
    pending_join: Option<JoinKind>,
    build_error: Option<QbError>,
}

/// Start a new SELECT.
pub fn select() -> QueryBuilder {
    QueryBuilder::new()
}

fn collect_params<I>(values: I) -> Vec<Param>
where
    I: IntoIterator,
    I::Item: Into<Param>,
{
    values.into_iter().map(Into::into).collect()
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_state(state: QueryState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// The first recorded construction error, if any.
    pub fn build_error(&self) -> Option<&QbError> {
        self.build_error.as_ref()
    }

    fn fail(&mut self, err: QbError) {
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
    }

    fn misplaced(&mut self, call: &str, expected: &str) {
        self.fail(QbError::invalid_state(format!(
            "{call}() must follow {expected}"
        )));
    }

    // ==================== SELECT ====================

    /// Begin clause calls for the block opened by a compound operator.
    ///
    /// Also valid on a fresh builder, where it does nothing.
    pub fn select(mut self) -> Self {
        self.cursor = Cursor::None;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.state.current_block_mut().distinct = true;
        self
    }

    /// Clear `DISTINCT`; directly after `union()` turns it into `UNION ALL`.
    pub fn all(mut self) -> Self {
        if self.cursor == Cursor::Compound {
            if let Some(last) = self.state.compounds.last_mut() {
                if last.op == CompoundOp::Union {
                    last.op = CompoundOp::UnionAll;
                    return self;
                }
            }
        }
        self.state.current_block_mut().distinct = false;
        self
    }

    // ==================== Projection ====================

    fn push_projection(mut self, items: Vec<ProjectionItem>) -> Self {
        let block = self.state.current_block_mut();
        let start = block.projection.len();
        block.projection.extend(items);
        self.cursor = Cursor::Projection { start };
        self
    }

    /// `*`; qualify with [`of`](Self::of) for `table.*`.
    pub fn all_columns(self) -> Self {
        self.push_projection(vec![ProjectionItem::AllColumns { table: None }])
    }

    pub fn column(self, name: impl Into<String>) -> Self {
        self.expr(expr::column(name))
    }

    pub fn column_of(self, table: impl Into<String>, name: impl Into<String>) -> Self {
        self.expr(expr::column_of(table, name))
    }

    /// Append several columns; an empty list or `None` appends nothing.
    pub fn columns<I>(self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let items = names
            .into_iter()
            .map(|name| ProjectionItem::Expr {
                expr: expr::column(name),
                alias: None,
            })
            .collect();
        self.push_projection(items)
    }

    /// Append an expression. Unbound placeholders are rejected.
    pub fn expr(mut self, expr: Expr) -> Self {
        match fully_bound(expr) {
            Ok(expr) => self.push_projection(vec![ProjectionItem::Expr { expr, alias: None }]),
            Err(err) => {
                self.fail(err);
                self
            }
        }
    }

    pub fn literal(self, value: impl Into<Value>) -> Self {
        self.expr(expr::literal(value))
    }

    /// `NULL` in the projection.
    pub fn nul(self) -> Self {
        self.expr(expr::nul())
    }

    /// Alias the last projection item, the source, or the last join.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        match self.cursor {
            Cursor::Projection { start } => {
                match self.state.current_block_mut().projection[start..].last_mut() {
                    Some(ProjectionItem::Expr { alias: slot, .. }) => *slot = Some(alias),
                    Some(ProjectionItem::AllColumns { .. }) => {
                        self.fail(QbError::invalid_state("cannot alias '*'"));
                    }
                    None => self.misplaced("alias", "a projection item, source or join"),
                }
            }
            Cursor::Source => {
                if let Some(from) = &mut self.state.current_block_mut().from {
                    from.alias = Some(alias);
                }
            }
            Cursor::Join => {
                if let Some(join) = self.state.current_block_mut().joins.last_mut() {
                    join.alias = Some(alias);
                }
            }
            _ => self.misplaced("alias", "a projection item, source or join"),
        }
        self
    }

    /// Qualify the columns appended by the last projection call with `table`.
    pub fn of(mut self, table: impl Into<String>) -> Self {
        let Cursor::Projection { start } = self.cursor else {
            self.misplaced("of", "a projection call");
            return self;
        };
        let table = table.into();
        for item in &mut self.state.current_block_mut().projection[start..] {
            match item {
                ProjectionItem::AllColumns { table: slot @ None } => *slot = Some(table.clone()),
                ProjectionItem::Expr {
                    expr: Expr::Column { table: slot @ None, .. },
                    ..
                } => *slot = Some(table.clone()),
                _ => {}
            }
        }
        self
    }

    /// Alias each column from the last projection call to its own name.
    ///
    /// `columns(["a", "b"]).of("t").as_column_names()` renders `t.a AS a, t.b AS b`.
    pub fn as_column_names(mut self) -> Self {
        let Cursor::Projection { start } = self.cursor else {
            self.misplaced("as_column_names", "a projection call");
            return self;
        };
        for item in &mut self.state.current_block_mut().projection[start..] {
            if let ProjectionItem::Expr {
                expr: Expr::Column { name, .. },
                alias,
            } = item
            {
                *alias = Some(name.clone());
            }
        }
        self
    }

    // ==================== FROM / JOIN ====================

    /// Set the source of the current block, replacing any previous one.
    pub fn from(mut self, source: impl IntoSource) -> Self {
        match source.into_source() {
            Ok(source) => {
                self.state.current_block_mut().from = Some(FromClause {
                    source,
                    alias: None,
                });
                self.cursor = Cursor::Source;
            }
            Err(err) => self.fail(err),
        }
        self
    }

    /// Make the next `join()` a `LEFT JOIN`.
    pub fn left(mut self) -> Self {
        self.pending_join = Some(JoinKind::Left);
        self
    }

    /// Make the next `join()` a `CROSS JOIN`.
    pub fn cross(mut self) -> Self {
        self.pending_join = Some(JoinKind::Cross);
        self
    }

    /// Make the next `join()` a `NATURAL JOIN`.
    pub fn natural(mut self) -> Self {
        self.pending_join = Some(JoinKind::Natural);
        self
    }

    /// Append a join, `INNER` unless `left()`, `cross()` or `natural()` came first.
    pub fn join(mut self, target: impl IntoSource) -> Self {
        let kind = self.pending_join.take().unwrap_or_default();
        match target.into_source() {
            Ok(target) => {
                self.state.current_block_mut().joins.push(Join {
                    kind,
                    target,
                    alias: None,
                    constraint: None,
                });
                self.cursor = Cursor::Join;
            }
            Err(err) => self.fail(err),
        }
        self
    }

    pub fn on(self, constraint: impl IntoPredicate) -> Self {
        self.on_with(constraint, None::<Param>)
    }

    /// Constrain the last join with `ON (...)`, binding `values` to its placeholders.
    pub fn on_with<P, I>(mut self, constraint: P, values: I) -> Self
    where
        P: IntoPredicate,
        I: IntoIterator,
        I::Item: Into<Param>,
    {
        if self.cursor != Cursor::Join {
            self.misplaced("on", "join");
            return self;
        }
        match constraint.into_predicate(collect_params(values)) {
            Ok(Some(expr)) => self.set_join_constraint(JoinConstraint::On(expr)),
            Ok(None) => {}
            Err(err) => self.fail(err),
        }
        self
    }

    /// Constrain the last join with `USING (...)`. The list must not be empty.
    pub fn using<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        if self.cursor != Cursor::Join {
            self.misplaced("using", "join");
            return self;
        }
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            self.fail(QbError::MissingList("USING column list"));
            return self;
        }
        self.set_join_constraint(JoinConstraint::Using(columns));
        self
    }

    fn set_join_constraint(&mut self, constraint: JoinConstraint) {
        if let Some(join) = self.state.current_block_mut().joins.last_mut() {
            join.constraint = Some(constraint);
        }
    }

    // ==================== WHERE / GROUP BY / HAVING ====================

    /// AND a predicate onto the current block. `None` is a no-op.
    pub fn where_(self, predicate: impl IntoPredicate) -> Self {
        self.where_with(predicate, None::<Param>)
    }

    /// AND a predicate onto the current block, binding `values` to its placeholders.
    ///
    /// # Example
    /// ```ignore
    /// select().from("users").where_with("age > ?", [18]);
    /// select().from("users").where_with(column("age").gt(arg()), [18]);
    /// ```
    pub fn where_with<P, I>(mut self, predicate: P, values: I) -> Self
    where
        P: IntoPredicate,
        I: IntoIterator,
        I::Item: Into<Param>,
    {
        self.cursor = Cursor::None;
        match predicate.into_predicate(collect_params(values)) {
            Ok(Some(expr)) => self.state.current_block_mut().selection.push(expr),
            Ok(None) => {}
            Err(err) => self.fail(err),
        }
        self
    }

    pub fn group_by(mut self, term: impl IntoTerm) -> Self {
        self.cursor = Cursor::None;
        match term.into_term() {
            Ok(Some(expr)) => self.state.current_block_mut().group_by.push(expr),
            Ok(None) => {}
            Err(err) => self.fail(err),
        }
        self
    }

    pub fn having(self, predicate: impl IntoPredicate) -> Self {
        self.having_with(predicate, None::<Param>)
    }

    /// Like [`where_with`](Self::where_with) for `HAVING`; requires a prior `group_by()`
    /// unless the predicate is absent.
    pub fn having_with<P, I>(mut self, predicate: P, values: I) -> Self
    where
        P: IntoPredicate,
        I: IntoIterator,
        I::Item: Into<Param>,
    {
        self.cursor = Cursor::None;
        let grouped = !self.state.current_block_mut().group_by.is_empty();
        match predicate.into_predicate(collect_params(values)) {
            Ok(Some(_)) if !grouped => {
                self.fail(QbError::invalid_state("HAVING requires a GROUP BY clause"));
            }
            Ok(Some(expr)) => self.state.current_block_mut().having.push(expr),
            Ok(None) => {}
            Err(err) => self.fail(err),
        }
        self
    }

    // ==================== ORDER BY / LIMIT / OFFSET ====================

    /// Append an `ORDER BY` term for the whole query. `None` and blank text are no-ops.
    pub fn order_by(mut self, term: impl IntoTerm) -> Self {
        match term.into_term() {
            Ok(Some(expr)) => {
                self.state.trailing.order_by.push(OrderTerm {
                    expr,
                    direction: None,
                    collation: None,
                });
                self.cursor = Cursor::OrderBy;
            }
            Ok(None) => self.cursor = Cursor::None,
            Err(err) => self.fail(err),
        }
        self
    }

    fn set_order(&mut self, call: &str, apply: impl FnOnce(&mut OrderTerm)) {
        if self.cursor == Cursor::OrderBy {
            if let Some(term) = self.state.trailing.order_by.last_mut() {
                apply(term);
                return;
            }
        }
        self.misplaced(call, "order_by");
    }

    pub fn asc(mut self) -> Self {
        self.set_order("asc", |t| t.direction = Some(Direction::Asc));
        self
    }

    pub fn desc(mut self) -> Self {
        self.set_order("desc", |t| t.direction = Some(Direction::Desc));
        self
    }

    /// Collate the last `ORDER BY` term, by name or [`CollatingSequence`](crate::CollatingSequence).
    pub fn collate(mut self, collation: impl Into<String>) -> Self {
        let collation = collation.into();
        self.set_order("collate", |t| t.collation = Some(collation));
        self
    }

    /// Set `LIMIT` once per query. `None` records the call without rendering a limit.
    pub fn limit(mut self, limit: impl IntoLimit) -> Self {
        self.cursor = Cursor::None;
        if self.state.trailing.limit != LimitState::Unset {
            self.fail(QbError::invalid_state("LIMIT can only be set once"));
            return self;
        }
        match limit.into_limit() {
            Ok(Some(expr)) => self.state.trailing.limit = LimitState::Value(expr),
            Ok(None) => self.state.trailing.limit = LimitState::Null,
            Err(err) => self.fail(err),
        }
        self
    }

    /// Set `OFFSET`; requires a prior non-null `limit()`.
    pub fn offset(mut self, offset: impl IntoLimit) -> Self {
        self.cursor = Cursor::None;
        if !matches!(self.state.trailing.limit, LimitState::Value(_)) {
            self.fail(QbError::invalid_state("OFFSET requires a non-null LIMIT"));
            return self;
        }
        if self.state.trailing.offset.is_some() {
            self.fail(QbError::invalid_state("OFFSET can only be set once"));
            return self;
        }
        match offset.into_limit() {
            Ok(expr) => self.state.trailing.offset = expr,
            Err(err) => self.fail(err),
        }
        self
    }

    // ==================== Compound ====================

    fn compound(mut self, op: CompoundOp) -> Self {
        self.state.compounds.push(Compound {
            op,
            block: Default::default(),
        });
        self.pending_join = None;
        self.cursor = Cursor::Compound;
        self
    }

    /// Close the current block with `UNION`; `.all()` right after makes it `UNION ALL`.
    pub fn union(self) -> Self {
        self.compound(CompoundOp::Union)
    }

    pub fn union_all(self) -> Self {
        self.compound(CompoundOp::UnionAll)
    }

    pub fn intersect(self) -> Self {
        self.compound(CompoundOp::Intersect)
    }

    pub fn except(self) -> Self {
        self.compound(CompoundOp::Except)
    }

    // ==================== Finalization ====================

    /// Tables referenced anywhere in the query so far, including subqueries.
    pub fn tables(&self) -> BTreeSet<String> {
        self.state.tables()
    }

    /// Validate and snapshot the query. The builder stays usable.
    pub fn build(&self) -> QbResult<Query> {
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }
        if let Some(kind) = self.pending_join {
            return Err(QbError::invalid_state(format!(
                "{} without a following join()",
                kind.as_str()
            )));
        }
        self.state.validate()?;
        Ok(Query::from_state(self.state.clone()))
    }
}
