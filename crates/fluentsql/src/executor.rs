//! Execution boundary.
//!
//! The crate never talks to a database itself. Anything that can run a
//! statement given its SQL text and string arguments implements [`Executor`];
//! [`Query::perform`](crate::Query::perform) calls it once and returns
//! whatever it returns. Closures `Fn(&str, &[String]) -> Result<R, E>`
//! qualify directly.

/// Runs a rendered statement.
pub trait Executor {
    /// Result of a successful execution, e.g. a cursor or row set.
    type Rows;
    /// Failure reported by the underlying engine, passed through untouched.
    type Error;

    fn execute(&self, sql: &str, args: &[String]) -> Result<Self::Rows, Self::Error>;
}

impl<F, R, E> Executor for F
where
    F: Fn(&str, &[String]) -> Result<R, E>,
{
    type Rows = R;
    type Error = E;

    fn execute(&self, sql: &str, args: &[String]) -> Result<R, E> {
        self(sql, args)
    }
}
