//! Veer client-side navigation dispatcher
//!
//! Maps URL-like paths to ordered chains of handler stages, updates
//! browsing history through environment drivers, and sequences
//! asynchronous middleware per navigation:
//! - first-match-wins route matching over possibly-overlapping
//!   patterns, with an ordered-first-settled race arbitrating among
//!   asynchronous admission predicates,
//! - a cancellable pipeline of serial and parallel handler stages
//!   driven by an explicit continuation contract,
//! - a monotonically increasing dispatch version that silently
//!   invalidates superseded in-flight navigations.
//!
//! Pattern syntax is not implemented here; an external
//! [`PatternCompiler`] supplies matchers, and the environment drivers
//! live in `veer-env`.

mod context;
mod error;
mod fns;
mod matcher;
mod race;
mod route;
mod router;

#[cfg(test)]
mod testutil;

pub use context::NavigationContext;
pub use error::RouterError;
pub use fns::{
    decode_uri, decode_url_component, extract_path, extract_query_params, extract_query_string,
    Params,
};
pub use matcher::{CaptureKey, CompiledPattern, PatternCompiler, PatternMatcher, WILDCARD};
pub use race::{ordered_first_settled, Outcome};
pub use route::{handler, AdmissionCheck, Handler, Metadata, Next, RouteSpec, Stage};
pub use router::{
    Environment, RouteCompletion, RouteCompleteCallback, RouteStartCallback, Router, RouterOptions,
};

pub type Result<T> = std::result::Result<T, RouterError>;
