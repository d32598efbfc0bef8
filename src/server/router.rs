//! Routing trie mapping method + path to a handler.
//!
//! Patterns are split on `/` into segments, each one of:
//!
//! - a literal such as `books`, matched exactly;
//! - a parameter `{name}`, matching any single segment and capturing it;
//! - a wildcard `*`, matching one or more segments.
//!
//! Children are keyed by `(segment, method)`, so the same path can lead to
//! different handlers per method. At each node a literal child is preferred
//! over the parameter child, which is preferred over the wildcard. Lookups
//! never backtrack.

use std::collections::HashMap;
use std::fmt;

use crate::parser::Method;
use crate::server::error::Error;
use crate::server::handler::{HandlerFn, PathParameters};

const WILDCARD: &str = "*";

#[derive(Default)]
struct Node {
    children: HashMap<(String, Method), Node>,
    /// Raw `{name}` text of the parameter child, if any.
    param: Option<String>,
    wildcard: bool,
    handler: Option<HandlerFn>,
}

/// Segment kinds of a route pattern.
enum Segment<'a> {
    Literal,
    Param(&'a str),
    Wildcard,
}

impl<'a> Segment<'a> {
    fn classify(pattern: &str, raw: &'a str) -> Result<Self, Error> {
        if raw == WILDCARD {
            return Ok(Segment::Wildcard);
        }
        if raw.starts_with('{') || raw.ends_with('}') {
            let name = raw
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
                .filter(|name| !name.is_empty() && !name.contains(['{', '}']))
                .ok_or_else(|| {
                    Error::invalid_route(pattern, format!("malformed parameter segment {raw:?}"))
                })?;
            return Ok(Segment::Param(name));
        }
        Ok(Segment::Literal)
    }
}

/// Split a path (query already removed) into segments.
///
/// `/` yields a single empty segment; trailing empty segments are dropped.
fn segments(path: &str) -> Vec<&str> {
    let rest = path.strip_prefix('/').unwrap_or(path);
    let mut parts: Vec<&str> = rest.split('/').collect();
    while parts.len() > 1 && parts.last() == Some(&"") {
        parts.pop();
    }
    parts
}

fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(path, _)| path)
}

/// The route table. Built before the server starts, read-only afterwards.
#[derive(Default)]
pub struct Router {
    root: Node,
    routes: Vec<(Method, String)>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` requests matching `pattern`.
    ///
    /// Registering the same pattern and method again replaces the handler.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRoute`] if the pattern is empty, does not start with
    /// `/`, has a malformed `{name}` segment, or names a parameter
    /// differently from one already declared at the same position.
    pub fn add(&mut self, pattern: &str, method: Method, handler: HandlerFn) -> Result<(), Error> {
        if pattern.is_empty() {
            return Err(Error::invalid_route(pattern, "empty pattern"));
        }
        if !pattern.starts_with('/') {
            return Err(Error::invalid_route(pattern, "pattern must start with '/'"));
        }

        let path = strip_query(pattern);
        let parts = segments(path)
            .into_iter()
            .map(|raw| Segment::classify(pattern, raw).map(|segment| (raw, segment)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut node = &mut self.root;
        for (raw, segment) in parts {
            match segment {
                Segment::Param(name) => {
                    if let Some(existing) = node.param.as_deref().filter(|existing| *existing != raw) {
                        return Err(Error::invalid_route(
                            pattern,
                            format!("parameter {{{name}}} conflicts with {existing}"),
                        ));
                    }
                    node.param = Some(raw.to_string());
                }
                Segment::Wildcard => node.wildcard = true,
                Segment::Literal => {}
            }
            node = node.children.entry((raw.to_string(), method)).or_default();
        }

        if node.handler.replace(handler).is_none() {
            self.routes.push((method, path.to_string()));
        }
        Ok(())
    }

    /// Resolve a request path to its handler and captured parameters.
    ///
    /// Any query string on `path` is ignored.
    pub fn find(&self, path: &str, method: Method) -> Option<(PathParameters, HandlerFn)> {
        let mut params = PathParameters::new();
        let mut node = &self.root;
        // Set while `node` is a wildcard child absorbing segments
        let mut absorbing = false;

        for part in segments(strip_query(path)) {
            if let Some(next) = node.children.get(&(part.to_string(), method)) {
                node = next;
                absorbing = false;
                continue;
            }

            if let Some(param) = &node.param {
                if let Some(next) = node.children.get(&(param.clone(), method)) {
                    params.insert(param[1..param.len() - 1].to_string(), part.to_string());
                    node = next;
                    absorbing = false;
                    continue;
                }
            }

            if absorbing {
                continue;
            }

            if node.wildcard {
                if let Some(next) = node.children.get(&(WILDCARD.to_string(), method)) {
                    node = next;
                    absorbing = true;
                    continue;
                }
            }

            return None;
        }

        node.handler.clone().map(|handler| (params, handler))
    }

    /// Registered `(method, pattern)` pairs in registration order.
    pub fn routes(&self) -> &[(Method, String)] {
        &self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("routes", &self.routes).finish()
    }
}
