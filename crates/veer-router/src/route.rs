//! Route model
//!
//! A route pairs a pattern with an ordered list of handler stages, an
//! optional asynchronous admission predicate, and opaque metadata.
//! Routes are immutable once compiled; the handler-or-group shape is
//! resolved into [`Stage`] at construction, never re-inspected at
//! runtime.

use futures_util::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::context::NavigationContext;
use crate::fns::{decode_uri, decode_url_component, Params};
use crate::matcher::{wildcard_pattern, CaptureKey, PatternCompiler, PatternMatcher, WILDCARD};
use crate::Result;

/// Opaque key/value mapping passed through to lifecycle callbacks.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A handler receives the shared context and a continuation. It must
/// consume [`Next::proceed`] — synchronously or from a task it spawns
/// — for the chain to advance past its stage.
pub type Handler = Arc<dyn Fn(Arc<NavigationContext>, Next) + Send + Sync>;

/// Asynchronous "should this route handle the request" predicate,
/// invoked with the extracted path and the route's matched params.
/// Resolving `false` declines the match; absence always admits.
pub type AdmissionCheck = Arc<dyn Fn(&str, &Params) -> BoxFuture<'static, bool> + Send + Sync>;

/// Continuation handed to each handler. Consuming it advances the
/// chain; dropping it without proceeding abandons the attempt.
pub struct Next {
    tx: oneshot::Sender<()>,
}

impl Next {
    pub(crate) fn channel() -> (Next, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Next { tx }, rx)
    }

    /// Advance the chain past this handler's stage.
    pub fn proceed(self) {
        // The receiver is gone only when the dispatch was superseded;
        // proceeding then is a no-op by design.
        let _ = self.tx.send(());
    }
}

/// One unit of a handler chain: a single handler, or a group whose
/// members run concurrently and whose stage advances only once every
/// member has proceeded.
pub enum Stage {
    Serial(Handler),
    Parallel(Vec<Handler>),
}

impl Stage {
    pub fn serial<F>(handler: F) -> Self
    where
        F: Fn(Arc<NavigationContext>, Next) + Send + Sync + 'static,
    {
        Stage::Serial(Arc::new(handler))
    }

    pub fn parallel(handlers: Vec<Handler>) -> Self {
        Stage::Parallel(handlers)
    }
}

/// Convenience constructor for a boxed [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(Arc<NavigationContext>, Next) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Registration input for a single route.
pub struct RouteSpec {
    pub pattern: String,
    pub stages: Vec<Stage>,
    pub admission: Option<AdmissionCheck>,
    pub metadata: Option<Metadata>,
}

impl RouteSpec {
    pub fn new(pattern: impl Into<String>, stages: Vec<Stage>) -> Self {
        Self {
            pattern: pattern.into(),
            stages,
            admission: None,
            metadata: None,
        }
    }

    pub fn with_admission<F>(mut self, check: F) -> Self
    where
        F: Fn(&str, &Params) -> BoxFuture<'static, bool> + Send + Sync + 'static,
    {
        self.admission = Some(Arc::new(check));
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Immutable compiled form of a [`RouteSpec`].
pub struct Route {
    pattern: String,
    stages: Vec<Stage>,
    admission: Option<AdmissionCheck>,
    metadata: Option<Metadata>,
    keys: Vec<CaptureKey>,
    matcher: Box<dyn PatternMatcher>,
}

impl Route {
    pub(crate) fn compile(spec: RouteSpec, compiler: &dyn PatternCompiler) -> Result<Self> {
        let compiled = if spec.pattern == WILDCARD {
            wildcard_pattern()
        } else {
            compiler.compile(&spec.pattern)?
        };

        Ok(Self {
            pattern: spec.pattern,
            stages: spec.stages,
            admission: spec.admission,
            metadata: spec.metadata,
            keys: compiled.keys,
            matcher: compiled.matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub(crate) fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub(crate) fn admission(&self) -> Option<&AdmissionCheck> {
        self.admission.as_ref()
    }

    /// Match this route against an already-decoded path, extracting
    /// decoded params for its capture keys. A capture that did not
    /// participate never overwrites a previously set defined value for
    /// the same key.
    pub(crate) fn match_path(&self, decoded_path: &str) -> Option<Params> {
        let captures = self.matcher.captures(decoded_path)?;
        let mut params = Params::new();
        for (key, raw) in self.keys.iter().zip(captures) {
            match raw.map(|value| decode_url_component(&value)) {
                Some(value) => {
                    params.insert(key.name.clone(), Some(value));
                }
                None => {
                    if !params.contains_key(&key.name) {
                        params.insert(key.name.clone(), None);
                    }
                }
            }
        }
        Some(params)
    }
}

/// One matching route paired with its extracted params.
pub(crate) struct RouteMatch {
    pub route: Arc<Route>,
    pub params: Params,
}

/// All routes matching the URI-decoded `path`, in registration order.
pub(crate) fn match_routes(routes: &[Arc<Route>], path: &str) -> Vec<RouteMatch> {
    let decoded_path = decode_uri(path);
    routes
        .iter()
        .filter_map(|route| {
            route.match_path(&decoded_path).map(|params| RouteMatch {
                route: Arc::clone(route),
                params,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::CompiledPattern;
    use crate::testutil::SegmentCompiler;

    fn noop_stage() -> Stage {
        Stage::serial(|_ctx, next| next.proceed())
    }

    #[test]
    fn test_compile_extracts_keys() {
        let route = Route::compile(
            RouteSpec::new("/users/:id/posts/:post", vec![noop_stage()]),
            &SegmentCompiler,
        )
        .unwrap();
        assert_eq!(route.keys.len(), 2);
        assert_eq!(route.keys[0].name, "id");
        assert_eq!(route.keys[1].name, "post");
    }

    #[test]
    fn test_match_path_decodes_captures() {
        let route = Route::compile(
            RouteSpec::new("/search/:term", vec![noop_stage()]),
            &SegmentCompiler,
        )
        .unwrap();

        let params = route.match_path("/search/rust+lang%21").unwrap();
        assert_eq!(params["term"], Some("rust lang!".to_string()));
    }

    #[test]
    fn test_match_routes_returns_all_matches_in_registration_order() {
        let compiler = SegmentCompiler;
        let routes = vec![
            Arc::new(
                Route::compile(RouteSpec::new("/a/:x", vec![noop_stage()]), &compiler).unwrap(),
            ),
            Arc::new(
                Route::compile(RouteSpec::new("/b/:x", vec![noop_stage()]), &compiler).unwrap(),
            ),
            Arc::new(Route::compile(RouteSpec::new("*", vec![noop_stage()]), &compiler).unwrap()),
        ];

        let matches = match_routes(&routes, "/a/1");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].route.pattern(), "/a/:x");
        assert_eq!(matches[1].route.pattern(), "*");
        assert_eq!(matches[0].params["x"], Some("1".to_string()));
        assert_eq!(matches[1].params["0"], Some("/a/1".to_string()));
    }

    #[test]
    fn test_match_routes_decodes_path_before_matching() {
        let routes = vec![Arc::new(
            Route::compile(RouteSpec::new("/files/:name", vec![noop_stage()]), &SegmentCompiler)
                .unwrap(),
        )];
        // %2D decodes to '-', so the literal segment matches.
        let matches = match_routes(&routes, "/files/read%2Dme");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].params["name"], Some("read-me".to_string()));
    }

    #[test]
    fn test_absent_capture_never_overwrites_defined_value() {
        // Two capture groups share a name; the second did not
        // participate in the match. The defined value must survive.
        struct DuplicateKeyCompiler;
        struct FixedMatcher;

        impl PatternMatcher for FixedMatcher {
            fn captures(&self, _path: &str) -> Option<Vec<Option<String>>> {
                Some(vec![Some("7".to_string()), None])
            }
        }

        impl PatternCompiler for DuplicateKeyCompiler {
            fn compile(&self, _pattern: &str) -> crate::Result<CompiledPattern> {
                Ok(CompiledPattern {
                    matcher: Box::new(FixedMatcher),
                    keys: vec![CaptureKey::new("id"), CaptureKey::new("id")],
                })
            }
        }

        let route = Route::compile(
            RouteSpec::new("/ignored", vec![noop_stage()]),
            &DuplicateKeyCompiler,
        )
        .unwrap();

        let params = route.match_path("/ignored").unwrap();
        assert_eq!(params["id"], Some("7".to_string()));
    }

    #[test]
    fn test_absent_capture_sets_none_when_key_unset() {
        struct AbsentOnlyCompiler;
        struct AbsentMatcher;

        impl PatternMatcher for AbsentMatcher {
            fn captures(&self, _path: &str) -> Option<Vec<Option<String>>> {
                Some(vec![None])
            }
        }

        impl PatternCompiler for AbsentOnlyCompiler {
            fn compile(&self, _pattern: &str) -> crate::Result<CompiledPattern> {
                Ok(CompiledPattern {
                    matcher: Box::new(AbsentMatcher),
                    keys: vec![CaptureKey::new("opt")],
                })
            }
        }

        let route = Route::compile(
            RouteSpec::new("/ignored", vec![noop_stage()]),
            &AbsentOnlyCompiler,
        )
        .unwrap();

        let params = route.match_path("/ignored").unwrap();
        assert_eq!(params["opt"], None);
    }
}
