//! Router error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    /// Route registration input the compiler rejected.
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    /// No registered pattern matched the path. Recovered internally
    /// by the fallback navigation, never surfaced from `go`/`replace`.
    #[error("No route matched path: {0}")]
    NoMatchingRoute(String),

    /// Every matching route's admission predicate declined. Same
    /// recovery as [`RouterError::NoMatchingRoute`].
    #[error("All matching routes declined path: {0}")]
    AllCandidatesDeclined(String),
}
