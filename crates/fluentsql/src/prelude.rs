//! Convenient imports for typical `fluentsql` usage.
//!
//! ```ignore
//! use fluentsql::prelude::*;
//! ```

pub use crate::{
    CollatingSequence, Executor, Expr, Param, QbError, QbResult, Query, QueryBuilder, arg, column,
    column_of, literal, nul, params, raw, select,
};
