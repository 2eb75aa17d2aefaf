//! Route table and request-time resolution.
//!
//! # Responsibilities
//! - Validate and install the ordered route table
//! - Build the pattern trie over route handles
//! - Resolve (method, path) to the first-defined matching route
//!
//! # Design Decisions
//! - Routes live in an arena `Vec`; a route's position is its handle and
//!   its first-defined-wins priority, so no separate index map exists
//! - `set_routes` builds the new arena and trie aside and swaps them in
//!   only on success; a failed install keeps the previous table answering
//! - Matching runs over the decoded path with `%2A` kept escaped; the
//!   winner's parameter values are fully decoded before they are returned

use thiserror::Error;
use url::Url;

use crate::config::RouterConfig;
use crate::matcher::{Params, PatternError, Trie};
use crate::path;
use crate::route::{Route, RouteId};

/// Errors detected while installing routes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// A route declared an empty path expression.
    #[error("Route {index} has an empty path expression")]
    EmptyPath { index: usize },

    /// A route's path expression does not start with `/`.
    #[error("Route {index} must start with '/', got {path:?}")]
    NoLeadingSlash { index: usize, path: String },

    /// A route's path expression is not a valid pattern.
    #[error("Route {index} has an invalid pattern {path:?}: {source}")]
    Pattern {
        index: usize,
        path: String,
        #[source]
        source: PatternError,
    },
}

/// Errors for the string-based lookup entry point.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The URL string could not be parsed.
    #[error("Malformed URL {url:?}: {source}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// A route that matched, with its parameter values fully decoded.
#[derive(Debug)]
pub struct RouteMatch<'r, H> {
    /// The matched route declaration.
    pub route: &'r Route<H>,
    /// Placeholder values captured from the path.
    pub params: Params,
}

/// Outcome of a lookup: the winning route, if any, plus whether the path
/// matched some pattern regardless of method.
///
/// `matched == None` with `path_matched == true` is the "method not
/// allowed" case; with `path_matched == false` it is a plain not-found.
/// Neither is an error.
#[derive(Debug)]
pub struct RouteLookup<'r, H> {
    pub matched: Option<RouteMatch<'r, H>>,
    pub path_matched: bool,
}

/// First-defined-wins route dispatcher.
///
/// Lookups take `&self` and may run concurrently; installing or adding
/// routes takes `&mut self`. Shared setups build the table once and wrap
/// the router in an `Arc`, or serialize mutations behind a lock.
#[derive(Debug)]
pub struct Router<H> {
    routes: Vec<Route<H>>,
    trie: Trie<RouteId>,
    config: RouterConfig,
}

impl<H> Router<H> {
    /// Create an empty router with default configuration.
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Create an empty router with the given configuration.
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            routes: Vec::new(),
            trie: Trie::new(),
            config,
        }
    }

    /// Create a router and install `routes` in one step.
    pub fn from_routes(routes: Vec<Route<H>>) -> Result<Self, RouteError> {
        let mut router = Self::new();
        router.set_routes(routes)?;
        Ok(router)
    }

    /// Replace the whole route table.
    ///
    /// Declaration order is the priority when several routes match one
    /// request: the first defined wins. Methods are uppercased as the
    /// routes are stored. The swap is atomic: on error the previously
    /// installed table keeps answering lookups unchanged.
    pub fn set_routes(&mut self, routes: Vec<Route<H>>) -> Result<(), RouteError> {
        let mut table = Vec::with_capacity(routes.len());
        let mut trie = Trie::new();
        for (index, mut route) in routes.into_iter().enumerate() {
            route.method = route.method.to_ascii_uppercase();
            validate_path_exp(index, &route.path_exp)?;
            insert_route(&mut trie, index, &route)?;
            table.push(route);
        }
        if !self.config.disable_trie_compression {
            trie.compress();
        }
        tracing::debug!(
            routes = table.len(),
            compressed = !self.config.disable_trie_compression,
            "Route table installed"
        );
        self.routes = table;
        self.trie = trie;
        Ok(())
    }

    /// Add one route to the live table.
    ///
    /// The route gets the next declaration index, so it loses the
    /// first-defined-wins tie-break against every installed route and
    /// wins against later additions. On error the router is unchanged.
    ///
    /// This is a best-effort addition: compression is not re-run, and a
    /// table compressed by a previous [`Router::set_routes`] may have
    /// merged away the literal edges the new pattern needs, leaving it
    /// unreachable until the table is installed again. Routers configured
    /// with [`RouterConfig::disable_trie_compression`] do not have this
    /// limitation.
    pub fn add_route(&mut self, mut route: Route<H>) -> Result<(), RouteError> {
        let index = self.routes.len();
        route.method = route.method.to_ascii_uppercase();
        validate_path_exp(index, &route.path_exp)?;
        insert_route(&mut self.trie, index, &route)?;
        tracing::debug!(
            index,
            method = %route.method,
            path = %route.path_exp,
            "Route added"
        );
        self.routes.push(route);
        Ok(())
    }

    /// Find the first-defined route matching `method` and the path of
    /// `url`.
    ///
    /// The method may be any case. Parameter values in the result are
    /// fully percent-decoded. Not matching any route is a normal result,
    /// never an error.
    pub fn find_route_from_url(&self, method: &str, url: &Url) -> RouteLookup<'_, H> {
        self.resolve(method, url.path())
    }

    /// Find a route from a URL string: either an origin-form target such
    /// as `/users/7?page=2` or an absolute URL.
    ///
    /// Fails only when the string cannot be parsed as a URL; not matching
    /// any route is a normal result.
    pub fn find_route(
        &self,
        method: &str,
        url_str: &str,
    ) -> Result<RouteLookup<'_, H>, RequestError> {
        if url_str.starts_with('/') {
            return Ok(self.resolve(method, path::request_path(url_str)));
        }
        let url = Url::parse(url_str).map_err(|source| RequestError::MalformedUrl {
            url: url_str.to_string(),
            source,
        })?;
        Ok(self.find_route_from_url(method, &url))
    }

    /// Installed routes in declaration order, methods uppercased.
    pub fn routes(&self) -> &[Route<H>] {
        &self.routes
    }

    fn resolve(&self, method: &str, raw_path: &str) -> RouteLookup<'_, H> {
        let method = method.to_ascii_uppercase();
        let decoded = path::decode_path(raw_path);
        let (matches, path_matched) = self.trie.lookup(&method, &decoded);
        let matched = matches.into_iter().min_by_key(|m| *m.value).map(|winner| {
            let mut params = winner.params;
            path::restore_stars(&mut params);
            RouteMatch {
                route: &self.routes[winner.value.0],
                params,
            }
        });
        if matched.is_none() {
            tracing::debug!(
                method = %method,
                path = %raw_path,
                path_matched,
                "No route matched"
            );
        }
        RouteLookup {
            matched,
            path_matched,
        }
    }
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_path_exp(index: usize, path_exp: &str) -> Result<(), RouteError> {
    if path_exp.is_empty() {
        return Err(RouteError::EmptyPath { index });
    }
    if !path_exp.starts_with('/') {
        return Err(RouteError::NoLeadingSlash {
            index,
            path: path_exp.to_string(),
        });
    }
    Ok(())
}

fn insert_route<H>(
    trie: &mut Trie<RouteId>,
    index: usize,
    route: &Route<H>,
) -> Result<(), RouteError> {
    trie.insert(&route.method, &route.path_exp, RouteId(index))
        .map_err(|source| RouteError::Pattern {
            index,
            path: route.path_exp.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(routes: &[(&str, &str)]) -> Router<usize> {
        let table = routes
            .iter()
            .enumerate()
            .map(|(i, (method, path))| Route::new(*method, *path, i))
            .collect();
        Router::from_routes(table).unwrap()
    }

    fn winner<'r>(lookup: &'r RouteLookup<'_, usize>) -> &'r RouteMatch<'r, usize> {
        lookup.matched.as_ref().expect("expected a match")
    }

    #[test]
    fn test_set_routes_error_variants() {
        let mut r: Router<usize> = Router::new();
        let err = r
            .set_routes(vec![Route::new("GET", "/ok", 0), Route::new("GET", "", 1)])
            .unwrap_err();
        assert_eq!(err, RouteError::EmptyPath { index: 1 });

        let err = r.set_routes(vec![Route::new("GET", "users", 0)]).unwrap_err();
        assert_eq!(
            err,
            RouteError::NoLeadingSlash {
                index: 0,
                path: "users".to_string(),
            }
        );

        let err = r
            .set_routes(vec![Route::new("GET", "/a/:x/:x", 0)])
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::Pattern {
                index: 0,
                path: "/a/:x/:x".to_string(),
                source: PatternError::DuplicateName("x".to_string()),
            }
        );
    }

    #[test]
    fn test_set_routes_failure_keeps_previous_table() {
        let mut r = router(&[("GET", "/users/:id")]);
        let err = r
            .set_routes(vec![Route::new("GET", "/broken/:x/:x", 9)])
            .unwrap_err();
        assert!(matches!(err, RouteError::Pattern { .. }));
        let lookup = r.find_route("GET", "/users/7").unwrap();
        assert_eq!(winner(&lookup).route.handler, 0);
        assert!(r.find_route("GET", "/broken/1/1").unwrap().matched.is_none());
    }

    #[test]
    fn test_first_defined_wins_across_duplicates() {
        let r = router(&[("GET", "/dup"), ("GET", "/dup")]);
        let lookup = r.find_route("GET", "/dup").unwrap();
        assert_eq!(winner(&lookup).route.handler, 0);
    }

    #[test]
    fn test_add_route_assigns_next_index_for_tie_break() {
        let config = RouterConfig {
            disable_trie_compression: true,
        };
        let mut r = Router::with_config(config);
        r.set_routes(vec![Route::new("GET", "/users/:id", 0usize)])
            .unwrap();
        r.add_route(Route::new("get", "/users/new", 1usize)).unwrap();
        r.add_route(Route::new("GET", "/teams", 2usize)).unwrap();

        // both match; the installed route was defined first and wins
        let lookup = r.find_route("GET", "/users/new").unwrap();
        let m = winner(&lookup);
        assert_eq!(m.route.handler, 0);
        assert_eq!(m.params["id"], "new");

        // added routes are live, ordered after the installed table
        assert_eq!(r.routes().len(), 3);
        assert_eq!(r.routes()[1].method, "GET");
        let lookup = r.find_route("GET", "/teams").unwrap();
        assert_eq!(winner(&lookup).route.handler, 2);
    }

    #[test]
    fn test_add_route_after_compression_is_best_effort() {
        let mut r = router(&[("GET", "/aaa/bbb")]);
        r.add_route(Route::new("GET", "/aaa/ccc", 9)).unwrap();

        // merged literal edges hide the added pattern until reinstall
        let lookup = r.find_route("GET", "/aaa/ccc").unwrap();
        assert!(lookup.matched.is_none());
        assert!(!lookup.path_matched);

        // the installed route is untouched
        let lookup = r.find_route("GET", "/aaa/bbb").unwrap();
        assert_eq!(winner(&lookup).route.handler, 0);
    }

    #[test]
    fn test_add_route_validates() {
        let mut r: Router<usize> = Router::new();
        assert_eq!(
            r.add_route(Route::new("GET", "", 0)).unwrap_err(),
            RouteError::EmptyPath { index: 0 }
        );
        assert!(matches!(
            r.add_route(Route::new("GET", "no-slash", 0)).unwrap_err(),
            RouteError::NoLeadingSlash { index: 0, .. }
        ));
        assert!(r.routes().is_empty());
    }

    #[test]
    fn test_routes_accessor_uppercases_methods() {
        let r = router(&[("get", "/a"), ("Post", "/b")]);
        let methods: Vec<&str> = r.routes().iter().map(|route| route.method.as_str()).collect();
        assert_eq!(methods, ["GET", "POST"]);
    }

    #[test]
    fn test_empty_router_answers_lookups() {
        let r: Router<usize> = Router::new();
        let lookup = r.find_route("GET", "/anything").unwrap();
        assert!(lookup.matched.is_none());
        assert!(!lookup.path_matched);
    }
}
