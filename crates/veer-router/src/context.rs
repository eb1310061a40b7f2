//! Navigation context
//!
//! Immutable snapshot of a single navigation attempt's derived facts.
//! Exactly one context exists per dispatch attempt, shared by every
//! handler in that attempt's chain via `Arc`.

use veer_env::HistoryState;

use crate::fns::{self, Params};

pub struct NavigationContext {
    /// Full path as requested, including any query string. The unit
    /// pushed to history.
    pub canonical_path: String,
    /// Base-stripped, query-stripped path used for matching.
    pub path: String,
    /// Document title captured at dispatch time.
    pub title: String,
    /// Decoded values for the winning route's capture keys.
    pub params: Params,
    /// Decoded query key/value pairs from the canonical path.
    pub query_params: Params,
    /// Raw query substring of the canonical path.
    pub query_string: String,
    /// Version of the dispatch this context belongs to.
    pub dispatch_id: u64,
}

impl NavigationContext {
    pub(crate) fn new(
        canonical_path: String,
        path: String,
        title: String,
        params: Params,
        dispatch_id: u64,
    ) -> Self {
        let query_string = fns::extract_query_string(&canonical_path);
        let query_params = fns::extract_query_params(&canonical_path);
        Self {
            canonical_path,
            path,
            title,
            params,
            query_params,
            query_string,
            dispatch_id,
        }
    }

    /// State payload for the history entry of this navigation.
    pub fn history_state(&self) -> HistoryState {
        HistoryState::new(self.canonical_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_fields_derive_from_canonical_path() {
        let mut params = Params::new();
        params.insert("id".to_string(), Some("123".to_string()));

        let ctx = NavigationContext::new(
            "/bar/123/baz?account_id=4".to_string(),
            "/bar/123/baz".to_string(),
            "Bar".to_string(),
            params,
            1,
        );

        assert_eq!(ctx.query_string, "account_id=4");
        assert_eq!(ctx.query_params["account_id"], Some("4".to_string()));
        assert_eq!(ctx.params["id"], Some("123".to_string()));
    }

    #[test]
    fn test_history_state_carries_canonical_path() {
        let ctx = NavigationContext::new(
            "/a?x=1".to_string(),
            "/a".to_string(),
            String::new(),
            Params::new(),
            7,
        );
        assert_eq!(ctx.history_state().canonical_path, "/a?x=1");
    }
}
