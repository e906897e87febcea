//! Query state shared by [`QueryBuilder`](super::QueryBuilder) and [`Query`](super::Query).
//!
//! A query is a head [`SelectBlock`] followed by zero or more compound links,
//! plus one set of trailing clauses (`ORDER BY`, `LIMIT`, `OFFSET`) that
//! applies to the whole chain. All of it is owned data, so cloning a state
//! never aliases anything.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{QbError, QbResult};
use crate::expr::Expr;
use crate::query::Query;
use crate::writer::SqlWriter;

/// Join operator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Cross,
    Natural,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Cross => "CROSS JOIN",
            JoinKind::Natural => "NATURAL JOIN",
        }
    }
}

/// Set operator linking two select blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompoundOp {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl CompoundOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompoundOp::Union => "UNION",
            CompoundOp::UnionAll => "UNION ALL",
            CompoundOp::Intersect => "INTERSECT",
            CompoundOp::Except => "EXCEPT",
        }
    }
}

/// Built-in SQLite collating sequences.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollatingSequence {
    Binary,
    NoCase,
    RTrim,
}

impl CollatingSequence {
    pub fn as_str(self) -> &'static str {
        match self {
            CollatingSequence::Binary => "BINARY",
            CollatingSequence::NoCase => "NOCASE",
            CollatingSequence::RTrim => "RTRIM",
        }
    }
}

impl fmt::Display for CollatingSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CollatingSequence> for String {
    fn from(c: CollatingSequence) -> Self {
        c.as_str().to_string()
    }
}

/// Sort direction of an `ORDER BY` term.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ProjectionItem {
    /// `*` or `table.*`
    AllColumns { table: Option<String> },
    Expr { expr: Expr, alias: Option<String> },
}

/// Table name or subquery, as used by `FROM` and `JOIN`.
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    Table(String),
    Subquery(Box<Query>),
}

impl Source {
    fn write_sql(&self, w: &mut SqlWriter) {
        match self {
            Source::Table(name) => {
                w.push(name);
            }
            Source::Subquery(q) => {
                w.push_char('(');
                q.write_sql(w);
                w.push_char(')');
            }
        }
    }

    fn collect_tables(&self, out: &mut BTreeSet<String>) {
        match self {
            Source::Table(name) => {
                out.insert(name.clone());
            }
            Source::Subquery(q) => q.collect_tables(out),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FromClause {
    pub(crate) source: Source,
    pub(crate) alias: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum JoinConstraint {
    On(Expr),
    Using(Vec<String>),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Join {
    pub(crate) kind: JoinKind,
    pub(crate) target: Source,
    pub(crate) alias: Option<String>,
    pub(crate) constraint: Option<JoinConstraint>,
}

impl Join {
    fn write_sql(&self, w: &mut SqlWriter) {
        w.push(self.kind.as_str()).push_char(' ');
        self.target.write_sql(w);
        if let Some(alias) = &self.alias {
            w.push(" AS ").push(alias);
        }
        match &self.constraint {
            Some(JoinConstraint::On(expr)) => {
                w.push(" ON (");
                expr.write_sql(w);
                w.push_char(')');
            }
            Some(JoinConstraint::Using(columns)) => {
                w.push(" USING (").push(&columns.join(", ")).push_char(')');
            }
            None => {}
        }
    }
}

/// One `SELECT ... FROM ... WHERE ... GROUP BY ... HAVING ...` unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SelectBlock {
    pub(crate) distinct: bool,
    pub(crate) projection: Vec<ProjectionItem>,
    pub(crate) from: Option<FromClause>,
    pub(crate) joins: Vec<Join>,
    pub(crate) selection: Vec<Expr>,
    pub(crate) group_by: Vec<Expr>,
    pub(crate) having: Vec<Expr>,
}

impl SelectBlock {
    fn validate(&self) -> QbResult<()> {
        if !self.having.is_empty() && self.group_by.is_empty() {
            return Err(QbError::invalid_state("HAVING requires a GROUP BY clause"));
        }
        if self.from.is_none() && !self.joins.is_empty() {
            return Err(QbError::invalid_state("JOIN requires a FROM clause"));
        }
        if self.from.is_none() {
            let literal_only = !self.projection.is_empty()
                && self
                    .projection
                    .iter()
                    .all(|item| matches!(item, ProjectionItem::Expr { .. }));
            if !literal_only {
                return Err(QbError::invalid_state(
                    "query without a source table needs an explicit projection",
                ));
            }
        }
        Ok(())
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("SELECT ");
        if self.distinct {
            w.push("DISTINCT ");
        }

        if self.projection.is_empty() {
            w.push_char('*');
        }
        for (i, item) in self.projection.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            match item {
                ProjectionItem::AllColumns { table: None } => {
                    w.push_char('*');
                }
                ProjectionItem::AllColumns { table: Some(t) } => {
                    w.push(t).push(".*");
                }
                ProjectionItem::Expr { expr, alias } => {
                    expr.write_sql(w);
                    if let Some(alias) = alias {
                        w.push(" AS ").push(alias);
                    }
                }
            }
        }

        if let Some(from) = &self.from {
            w.push(" FROM ");
            from.source.write_sql(w);
            if let Some(alias) = &from.alias {
                w.push(" AS ").push(alias);
            }
        }

        for join in &self.joins {
            w.push_char(' ');
            join.write_sql(w);
        }

        write_conjunction(w, " WHERE ", &self.selection);

        if !self.group_by.is_empty() {
            w.push(" GROUP BY ");
            write_list(w, &self.group_by);
        }

        write_conjunction(w, " HAVING ", &self.having);
    }

    fn collect_tables(&self, out: &mut BTreeSet<String>) {
        if let Some(from) = &self.from {
            from.source.collect_tables(out);
        }
        for join in &self.joins {
            join.target.collect_tables(out);
            if let Some(JoinConstraint::On(expr)) = &join.constraint {
                expr.collect_tables(out);
            }
        }
        for item in &self.projection {
            if let ProjectionItem::Expr { expr, .. } = item {
                expr.collect_tables(out);
            }
        }
        for expr in self.selection.iter().chain(&self.group_by).chain(&self.having) {
            expr.collect_tables(out);
        }
    }
}

fn write_conjunction(w: &mut SqlWriter, keyword: &str, predicates: &[Expr]) {
    if predicates.is_empty() {
        return;
    }
    w.push(keyword);
    for (i, p) in predicates.iter().enumerate() {
        if i > 0 {
            w.push(" AND ");
        }
        w.push_char('(');
        p.write_sql(w);
        w.push_char(')');
    }
}

fn write_list(w: &mut SqlWriter, exprs: &[Expr]) {
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        e.write_sql(w);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Compound {
    pub(crate) op: CompoundOp,
    pub(crate) block: SelectBlock,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct OrderTerm {
    pub(crate) expr: Expr,
    pub(crate) direction: Option<Direction>,
    pub(crate) collation: Option<String>,
}

/// Whether `limit()` was called, and with what.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) enum LimitState {
    #[default]
    Unset,
    /// Called with no value; renders nothing but still counts as set.
    Null,
    Value(Expr),
}

/// Clauses applying to the whole compound chain.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Trailing {
    pub(crate) order_by: Vec<OrderTerm>,
    pub(crate) limit: LimitState,
    pub(crate) offset: Option<Expr>,
}

impl Trailing {
    fn write_sql(&self, w: &mut SqlWriter) {
        if !self.order_by.is_empty() {
            w.push(" ORDER BY ");
            for (i, term) in self.order_by.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                term.expr.write_sql(w);
                if let Some(c) = &term.collation {
                    w.push(" COLLATE ").push(c);
                }
                match term.direction {
                    Some(Direction::Asc) => {
                        w.push(" ASC");
                    }
                    Some(Direction::Desc) => {
                        w.push(" DESC");
                    }
                    None => {}
                }
            }
        }
        if let LimitState::Value(limit) = &self.limit {
            w.push(" LIMIT ");
            limit.write_sql(w);
            if let Some(offset) = &self.offset {
                w.push(" OFFSET ");
                offset.write_sql(w);
            }
        }
    }

    fn collect_tables(&self, out: &mut BTreeSet<String>) {
        for term in &self.order_by {
            term.expr.collect_tables(out);
        }
        if let LimitState::Value(limit) = &self.limit {
            limit.collect_tables(out);
        }
        if let Some(offset) = &self.offset {
            offset.collect_tables(out);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct QueryState {
    pub(crate) head: SelectBlock,
    pub(crate) compounds: Vec<Compound>,
    pub(crate) trailing: Trailing,
}

impl QueryState {
    /// The block that receives clause calls: the last one in the chain.
    pub(crate) fn current_block_mut(&mut self) -> &mut SelectBlock {
        match self.compounds.last_mut() {
            Some(c) => &mut c.block,
            None => &mut self.head,
        }
    }

    pub(crate) fn blocks(&self) -> impl Iterator<Item = &SelectBlock> {
        std::iter::once(&self.head).chain(self.compounds.iter().map(|c| &c.block))
    }

    pub(crate) fn validate(&self) -> QbResult<()> {
        self.blocks().try_for_each(SelectBlock::validate)
    }

    pub(crate) fn write_sql(&self, w: &mut SqlWriter) {
        self.head.write_sql(w);
        for c in &self.compounds {
            w.push_char(' ').push(c.op.as_str()).push_char(' ');
            c.block.write_sql(w);
        }
        self.trailing.write_sql(w);
    }

    pub(crate) fn collect_tables(&self, out: &mut BTreeSet<String>) {
        for block in self.blocks() {
            block.collect_tables(out);
        }
        self.trailing.collect_tables(out);
    }

    pub(crate) fn tables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_tables(&mut out);
        out
    }
}
