//! SELECT queries: the chainable [`QueryBuilder`] and the immutable [`Query`] it builds.
//!
//! # Example
//! ```ignore
//! use fluentsql::prelude::*;
//!
//! let q = select()
//!     .column_of("u", "name")
//!     .from("users").alias("u")
//!     .left().join("orders").alias("o")
//!     .on(column_of("o", "user_id").eq(column_of("u", "id")))
//!     .where_with("u.status = ?", ["active"])
//!     .order_by("u.name").asc()
//!     .limit(10)
//!     .build()?;
//!
//! let built = q.to_sql();
//! assert_eq!(built.args, vec!["active"]);
//! ```

mod builder;
mod state;
mod traits;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;
use std::fmt;

pub use builder::{QueryBuilder, select};
pub use state::{CollatingSequence, CompoundOp, Direction, JoinKind, Source};
pub use traits::{IntoLimit, IntoPredicate, IntoSource, IntoTerm};

use crate::executor::Executor;
use crate::writer::SqlWriter;
use state::QueryState;

/// Rendered SQL text with its arguments in `?` order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuiltQuery {
    pub sql: String,
    pub args: Vec<String>,
}

impl fmt::Display for BuiltQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// A validated, immutable SELECT.
///
/// Produced by [`QueryBuilder::build`]. A `Query` owns all of its state;
/// [`build_upon`](Self::build_upon) hands out an independent copy.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    state: QueryState,
}

impl Query {
    pub(crate) fn from_state(state: QueryState) -> Self {
        Self { state }
    }

    /// Reopen as a new builder. Changes to it never affect `self`.
    pub fn build_upon(&self) -> QueryBuilder {
        QueryBuilder::from_state(self.state.clone())
    }

    /// Render SQL text and arguments.
    pub fn to_sql(&self) -> BuiltQuery {
        let mut w = SqlWriter::new();
        self.write_sql(&mut w);
        let (sql, params) = w.finish_bound();
        BuiltQuery {
            sql,
            args: params.into_strings(),
        }
    }

    pub fn sql(&self) -> String {
        self.to_sql().sql
    }

    pub fn args(&self) -> Vec<String> {
        self.to_sql().args
    }

    /// Tables referenced by every block, join and nested subquery.
    pub fn tables(&self) -> BTreeSet<String> {
        self.state.tables()
    }

    /// Render and hand the statement to `executor`, exactly once.
    ///
    /// The executor's result, success or failure, is returned unchanged.
    pub fn perform<E: Executor>(&self, executor: &E) -> Result<E::Rows, E::Error> {
        let built = self.to_sql();
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "fluentsql.sql",
            sql = %built.sql,
            args = built.args.len(),
            "perform"
        );
        executor.execute(&built.sql, &built.args)
    }

    pub(crate) fn write_sql(&self, w: &mut SqlWriter) {
        self.state.write_sql(w);
    }

    pub(crate) fn collect_tables(&self, out: &mut BTreeSet<String>) {
        self.state.collect_tables(out);
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql())
    }
}
