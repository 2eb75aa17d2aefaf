//! First-defined-wins HTTP route dispatch.
//!
//! Declare an ordered route table, then resolve (method, path) pairs to
//! the first matching route and its captured parameters:
//!
//! ```
//! use rest_router::{Route, Router};
//!
//! let router = Router::from_routes(vec![
//!     Route::new("GET", "/users/:id", "user_detail"),
//!     Route::new("GET", "/static/*path", "static_files"),
//! ])
//! .unwrap();
//!
//! let lookup = router.find_route("GET", "/users/42?full=1").unwrap();
//! let matched = lookup.matched.unwrap();
//! assert_eq!(matched.route.handler, "user_detail");
//! assert_eq!(matched.params["id"], "42");
//! ```

pub mod config;
pub mod matcher;
pub mod route;
pub mod router;

mod path;

pub use config::RouterConfig;
pub use matcher::{Params, PatternError};
pub use route::{Route, RouteId};
pub use router::{RequestError, RouteError, RouteLookup, RouteMatch, Router};
