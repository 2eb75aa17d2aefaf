//! Route declarations and their handles.

/// A single route declaration: an HTTP method, a path expression and an
/// opaque handler value.
///
/// The handler is whatever the caller dispatches to when the route
/// matches; the router stores and returns it without ever inspecting it.
#[derive(Debug, Clone)]
pub struct Route<H> {
    /// Pass-through flag for callers that treat some routes as private.
    /// Not interpreted by the router.
    pub is_private: bool,

    /// HTTP method, any case. Uppercased when the route enters a router.
    pub method: String,

    /// Path expression, e.g. `/resource/:id.json` or `/static/*filepath`.
    /// Must be non-empty and start with `/`.
    pub path_exp: String,

    /// Opaque handler payload.
    pub handler: H,
}

impl<H> Route<H> {
    /// Create a route with `is_private` unset.
    pub fn new(method: impl Into<String>, path_exp: impl Into<String>, handler: H) -> Self {
        Self {
            is_private: false,
            method: method.into(),
            path_exp: path_exp.into(),
            handler,
        }
    }
}

/// Handle to a route in a router's table: the zero-based declaration
/// index. Doubles as the first-defined-wins priority, lower wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_route_is_public() {
        let route = Route::new("get", "/users/:id", ());
        assert!(!route.is_private);
        assert_eq!(route.method, "get");
        assert_eq!(route.path_exp, "/users/:id");
    }

    #[test]
    fn test_route_id_orders_by_declaration() {
        assert!(RouteId(0) < RouteId(1));
        assert_eq!(RouteId(3), RouteId(3));
    }
}
