//! Dispatch engine
//!
//! Owns the route table and the dispatch version, and sequences
//! matching, admission arbitration, handler execution, and
//! history/event side effects for every navigation attempt.
//!
//! Cancellation is implicit: there is no cancel operation on a single
//! dispatch. Starting a new one bumps the version, and every pending
//! continuation of the old one becomes a no-op once its captured
//! [`DispatchToken`] goes stale.

use parking_lot::{Mutex, RwLock};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{self, BoxFuture, FutureExt};

use veer_env::{DocumentDriver, HistoryDriver, ListenerId, PopstateEvent, WindowDriver};

use crate::context::NavigationContext;
use crate::error::RouterError;
use crate::fns;
use crate::matcher::PatternCompiler;
use crate::race::{ordered_first_settled, Outcome};
use crate::route::{match_routes, Metadata, Next, Route, RouteMatch, RouteSpec, Stage};
use crate::Result;

/// How a dispatch reached the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// New history entry (`go`).
    Push,
    /// Overwrite the current entry (`replace`).
    Replace,
    /// Back/forward event; history already reflects the move.
    Pop,
}

/// Report delivered to the route-complete callback.
#[derive(Debug, Clone)]
pub struct RouteCompletion {
    /// Canonical path of the previous completed navigation, `None` on
    /// the first navigation after construction or reset.
    pub from_path: Option<String>,
    pub to_path: String,
    pub duration: Duration,
    pub started_at: Instant,
    pub ended_at: Instant,
    /// The winning route's metadata, passed through untouched.
    pub metadata: Option<Metadata>,
}

pub type RouteStartCallback = Arc<dyn Fn(&NavigationContext) + Send + Sync>;
pub type RouteCompleteCallback = Arc<dyn Fn(RouteCompletion) + Send + Sync>;

#[derive(Default)]
pub struct RouterOptions {
    /// Prefix stripped from canonical paths before matching. Plain
    /// substring removal, see [`crate::extract_path`].
    pub base: String,
    /// Fires before the first handler of each attempt. The exception
    /// is a replace claimed while another attempt's chain is running
    /// (a mid-chain redirect): that attempt continues the navigation
    /// already announced, so no second start fires.
    pub on_route_start: Option<RouteStartCallback>,
    /// Fires after the final handler of an attempt has advanced.
    pub on_route_complete: Option<RouteCompleteCallback>,
}

/// Environment drivers the engine consumes.
#[derive(Clone)]
pub struct Environment {
    pub history: Arc<dyn HistoryDriver>,
    pub window: Arc<dyn WindowDriver>,
    pub document: Arc<dyn DocumentDriver>,
}

/// Version stamp captured when a dispatch is claimed.
///
/// Every continuation compares the token it captured against the live
/// counter instead of re-reading engine state ad hoc; a stale token
/// means the navigation was superseded and all remaining effects must
/// be suppressed.
#[derive(Clone)]
pub struct DispatchToken {
    id: u64,
    current: Arc<AtomicU64>,
}

impl DispatchToken {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_stale(&self) -> bool {
        self.id != self.current.load(Ordering::SeqCst)
    }
}

pub struct Router {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    base: String,
    on_route_start: Option<RouteStartCallback>,
    on_route_complete: Option<RouteCompleteCallback>,
    compiler: Arc<dyn PatternCompiler>,
    env: Environment,
    routes: RwLock<Vec<Arc<Route>>>,
    catchall_path: RwLock<Option<String>>,
    dispatch_id: Arc<AtomicU64>,
    current_canonical_path: RwLock<Option<String>>,
    from_path: RwLock<Option<String>>,
    started_at: RwLock<Option<Instant>>,
    chain_depth: AtomicU64,
    popstate_enabled: AtomicBool,
    popstate_listener: Mutex<Option<ListenerId>>,
}

impl Router {
    /// Build a router and attach its popstate listener to the window
    /// driver. Pop-triggered dispatches are spawned onto the ambient
    /// tokio runtime, so construction belongs inside one.
    pub fn new(
        opts: RouterOptions,
        env: Environment,
        compiler: Arc<dyn PatternCompiler>,
    ) -> Self {
        let inner = Arc::new(RouterInner {
            base: opts.base,
            on_route_start: opts.on_route_start,
            on_route_complete: opts.on_route_complete,
            compiler,
            env,
            routes: RwLock::new(Vec::new()),
            catchall_path: RwLock::new(None),
            dispatch_id: Arc::new(AtomicU64::new(0)),
            current_canonical_path: RwLock::new(None),
            from_path: RwLock::new(None),
            started_at: RwLock::new(None),
            chain_depth: AtomicU64::new(0),
            popstate_enabled: AtomicBool::new(true),
            popstate_listener: Mutex::new(None),
        });
        RouterInner::attach_popstate_listener(&inner);
        Self { inner }
    }

    /// Compile and append routes. Registration order is match-priority
    /// order. All-or-nothing: a compile failure registers none of the
    /// batch.
    pub fn register_routes(&self, specs: Vec<RouteSpec>) -> Result<()> {
        let mut compiled = Vec::with_capacity(specs.len());
        for spec in specs {
            compiled.push(Arc::new(Route::compile(spec, self.inner.compiler.as_ref())?));
        }

        let mut routes = self.inner.routes.write();
        let count = compiled.len();
        routes.extend(compiled);
        tracing::info!(count, total = routes.len(), "registered routes");
        Ok(())
    }

    /// Full-page navigation target used when no route claims a path.
    pub fn register_catchall_path(&self, path: impl Into<String>) {
        *self.inner.catchall_path.write() = Some(path.into());
    }

    /// Push-mode navigation. The dispatch version is claimed before
    /// this returns; awaiting the returned future drives the attempt.
    pub fn go(&self, canonical_path: impl Into<String>) -> impl Future<Output = ()> + Send + 'static {
        Arc::clone(&self.inner).dispatch(canonical_path.into(), DispatchMode::Push)
    }

    /// Replace-mode navigation. Same contract as [`Router::go`].
    pub fn replace(
        &self,
        canonical_path: impl Into<String>,
    ) -> impl Future<Output = ()> + Send + 'static {
        Arc::clone(&self.inner).dispatch(canonical_path.into(), DispatchMode::Replace)
    }

    /// Clear the route table and all navigation state, and detach the
    /// popstate listener.
    pub fn reset(&self) {
        self.inner.routes.write().clear();
        *self.inner.catchall_path.write() = None;
        self.inner.dispatch_id.store(0, Ordering::SeqCst);
        *self.inner.current_canonical_path.write() = None;
        *self.inner.from_path.write() = None;
        *self.inner.started_at.write() = None;
        if let Some(id) = self.inner.popstate_listener.lock().take() {
            self.inner.env.window.remove_popstate_listener(id);
        }
        tracing::info!("router reset");
    }

    /// Run `op` with popstate handling suppressed. Handling is
    /// re-enabled after `op` settles regardless of outcome, and the
    /// outcome is propagated unchanged.
    pub async fn execute_without_popstate_listener<F, T>(&self, op: F) -> T
    where
        F: Future<Output = T>,
    {
        self.inner.popstate_enabled.store(false, Ordering::SeqCst);
        let _reenable = PopstateReenable(Arc::clone(&self.inner));
        op.await
    }

    /// Canonical path of the most recent successfully admitted
    /// dispatch, if any.
    pub fn current_canonical_path(&self) -> Option<String> {
        self.inner.current_canonical_path.read().clone()
    }

    pub fn route_count(&self) -> usize {
        self.inner.routes.read().len()
    }
}

impl Clone for Router {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Re-enables popstate handling on drop, so suppression lifts even if
/// the wrapped operation panics.
struct PopstateReenable(Arc<RouterInner>);

impl Drop for PopstateReenable {
    fn drop(&mut self) {
        self.0.popstate_enabled.store(true, Ordering::SeqCst);
    }
}

/// Decrements the running-chain depth on drop, so an abandoned or
/// cancelled attempt never leaves the counter raised.
struct ChainDepthGuard<'a>(&'a AtomicU64);

impl Drop for ChainDepthGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RouterInner {
    fn attach_popstate_listener(inner: &Arc<Self>) {
        let weak = Arc::downgrade(inner);
        let id = inner
            .env
            .window
            .add_popstate_listener(Arc::new(move |event| {
                if let Some(strong) = weak.upgrade() {
                    strong.on_popstate(event);
                }
            }));
        *inner.popstate_listener.lock() = Some(id);
    }

    fn on_popstate(self: Arc<Self>, event: PopstateEvent) {
        if !self.popstate_enabled.load(Ordering::SeqCst) {
            tracing::debug!("popstate handling suppressed, ignoring event");
            return;
        }
        // Events without state carry nothing to re-dispatch.
        let Some(state) = event.state else { return };
        tokio::spawn(self.dispatch(state.canonical_path, DispatchMode::Pop));
    }

    /// Claim a dispatch version and return the future that drives the
    /// attempt. The claim happens synchronously so a later call
    /// supersedes this one even before the future is first polled.
    fn dispatch(
        self: Arc<Self>,
        canonical_path: String,
        mode: DispatchMode,
    ) -> impl Future<Output = ()> + Send + 'static {
        let id = self.dispatch_id.fetch_add(1, Ordering::SeqCst) + 1;
        let token = DispatchToken {
            id,
            current: Arc::clone(&self.dispatch_id),
        };
        // A replace claimed while a chain is running is a redirect:
        // it continues a navigation already announced, so it must not
        // fire a second start callback.
        let redirect = mode == DispatchMode::Replace
            && self.chain_depth.load(Ordering::SeqCst) > 0;
        if mode != DispatchMode::Replace {
            *self.started_at.write() = Some(Instant::now());
        }
        tracing::debug!(path = %canonical_path, ?mode, dispatch_id = id, "dispatch requested");

        async move { self.run_dispatch(canonical_path, mode, redirect, token).await }
    }

    async fn run_dispatch(
        self: Arc<Self>,
        canonical_path: String,
        mode: DispatchMode,
        redirect: bool,
        token: DispatchToken,
    ) {
        if token.is_stale() {
            return;
        }

        let title = self.env.document.title();
        let path = fns::extract_path(&self.base, &canonical_path);

        let selected = self.select_route(&path).await;
        if token.is_stale() {
            tracing::debug!(path = %canonical_path, dispatch_id = token.id(), "superseded during arbitration");
            return;
        }
        let RouteMatch { route, params } = match selected {
            Ok(matched) => matched,
            Err(error) => {
                tracing::debug!(path = %canonical_path, %error, "no admissible route");
                self.catchall();
                return;
            }
        };

        let ctx = Arc::new(NavigationContext::new(
            canonical_path.clone(),
            path,
            title,
            params,
            token.id(),
        ));

        match mode {
            DispatchMode::Push => {
                self.env
                    .history
                    .push_state(ctx.history_state(), &ctx.title, &ctx.canonical_path)
            }
            DispatchMode::Replace => {
                self.env
                    .history
                    .replace_state(ctx.history_state(), &ctx.title, &ctx.canonical_path)
            }
            // History already reflects the browser's own move.
            DispatchMode::Pop => {}
        }
        *self.current_canonical_path.write() = Some(canonical_path.clone());

        if !redirect {
            if let Some(on_start) = &self.on_route_start {
                on_start(&ctx);
            }
        }

        let advanced = {
            self.chain_depth.fetch_add(1, Ordering::SeqCst);
            let _depth = ChainDepthGuard(&self.chain_depth);
            self.run_stages(route.stages(), &ctx, &token).await
        };
        if !advanced {
            return;
        }
        if token.is_stale() {
            return;
        }

        self.complete(&canonical_path, route.metadata().cloned());
    }

    /// Match the route table and arbitrate admission among all
    /// matches, preserving registration-order priority.
    async fn select_route(&self, path: &str) -> Result<RouteMatch> {
        let routes = self.routes.read().clone();
        let mut matches = match_routes(&routes, path);
        if matches.is_empty() {
            return Err(RouterError::NoMatchingRoute(path.to_string()));
        }

        let candidates: Vec<BoxFuture<'static, Outcome<()>>> = matches
            .iter()
            .map(|matched| match matched.route.admission() {
                None => future::ready(Outcome::Admitted(())).boxed(),
                Some(check) => {
                    let admitted = check(path, &matched.params);
                    async move {
                        if admitted.await {
                            Outcome::Admitted(())
                        } else {
                            Outcome::Declined
                        }
                    }
                    .boxed()
                }
            })
            .collect();

        match ordered_first_settled(candidates).await {
            Some((index, ())) if index < matches.len() => Ok(matches.swap_remove(index)),
            _ => Err(RouterError::AllCandidatesDeclined(path.to_string())),
        }
    }

    /// Run the winning route's chain. Returns false when the attempt
    /// was abandoned before the final stage advanced.
    async fn run_stages(
        &self,
        stages: &[Stage],
        ctx: &Arc<NavigationContext>,
        token: &DispatchToken,
    ) -> bool {
        for stage in stages {
            if token.is_stale() {
                tracing::debug!(dispatch_id = token.id(), "superseded, abandoning handler chain");
                return false;
            }
            let advanced = match stage {
                Stage::Serial(handler) => {
                    let (next, done) = Next::channel();
                    handler(Arc::clone(ctx), next);
                    done.await.is_ok()
                }
                Stage::Parallel(handlers) => {
                    let mut waits = Vec::with_capacity(handlers.len());
                    for handler in handlers {
                        let (next, done) = Next::channel();
                        handler(Arc::clone(ctx), next);
                        waits.push(done);
                    }
                    future::try_join_all(waits).await.is_ok()
                }
            };
            if !advanced {
                tracing::debug!(dispatch_id = token.id(), "handler dropped its continuation, abandoning chain");
                return false;
            }
        }
        true
    }

    fn complete(&self, canonical_path: &str, metadata: Option<Metadata>) {
        let ended_at = Instant::now();
        let started_at = self.started_at.read().unwrap_or(ended_at);
        let duration = ended_at.duration_since(started_at);
        let from_path = self.from_path.read().clone();

        tracing::info!(from = ?from_path, to = %canonical_path, ?duration, "navigation complete");

        if let Some(on_complete) = &self.on_route_complete {
            on_complete(RouteCompletion {
                from_path,
                to_path: canonical_path.to_string(),
                duration,
                started_at,
                ended_at,
                metadata,
            });
        }

        *self.from_path.write() = Some(canonical_path.to_string());
    }

    fn catchall(&self) {
        let target = self.catchall_path.read().clone();
        match target {
            Some(path) => {
                tracing::warn!(catchall = %path, "falling back to full-page navigation");
                self.env.window.navigate(&path);
            }
            None => tracing::warn!("no catchall path registered, staying put"),
        }
    }
}
