//! # fluentsql
//!
//! A fluent builder for SQLite `SELECT` statements.
//!
//! ## Features
//!
//! - **Typed expressions**: columns, literals, placeholders, functions and subqueries as an [`Expr`] tree
//! - **Raw SQL where convenient**: strings are accepted for predicates, terms and limits
//! - **Ordered arguments**: rendered args always follow the `?` order of the SQL text
//! - **Compound queries**: `UNION`, `UNION ALL`, `INTERSECT`, `EXCEPT` with one trailing `ORDER BY`/`LIMIT`
//! - **Independent copies**: a built [`Query`] never changes, and [`Query::build_upon`] forks it
//! - **Table discovery**: [`Query::tables`] walks sources, joins and nested subqueries
//! - **Execution monitoring**: hooks, stats and `tracing` output around any [`Executor`]
//!
//! ## Example
//!
//! ```ignore
//! use fluentsql::prelude::*;
//!
//! let q = select()
//!     .columns(["id", "name"])
//!     .from("contacts")
//!     .where_with(column("owner_id").eq(arg()), [42])
//!     .where_("deleted_at IS NULL")
//!     .order_by("name").collate(CollatingSequence::NoCase)
//!     .limit(20)
//!     .build()?;
//!
//! let rows = q.perform(&|sql: &str, args: &[String]| db.raw_query(sql, args))?;
//! ```

pub mod error;
pub mod executor;
pub mod expr;
pub mod monitor;
pub mod param;
pub mod prelude;
pub mod query;

mod writer;

pub use error::{QbError, QbResult};
pub use executor::Executor;
pub use expr::{
    BinaryOp, Expr, IsExpr, UnaryOp, Value, add_expression_args, arg, avg, coalesce, column,
    column_of, count, count_all, function, ifnull, literal, max, min, not, nul, raw, sum,
};
pub use monitor::{
    CompositeHook, CompositeMonitor, InstrumentedExecutor, MonitorConfig, NoopMonitor,
    QueryContext, QueryHook, QueryMonitor, QueryOutcome, QueryStats, StatsMonitor,
};
pub use param::{Param, ParamList};
pub use query::{
    BuiltQuery, CollatingSequence, CompoundOp, Direction, IntoLimit, IntoPredicate, IntoSource,
    IntoTerm, JoinKind, Query, QueryBuilder, Source, select,
};

#[cfg(feature = "tracing")]
pub use monitor::TracingSqlHook;
