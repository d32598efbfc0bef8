//! Request handlers and captured path parameters.

use std::collections::HashMap;
use std::sync::Arc;

use crate::parser::HttpRequest;
use crate::server::{Error, HttpResponse};

/// Parameters captured from `{name}` segments of a matched route.
pub type PathParameters = HashMap<String, String>;

/// Handles one matched request.
///
/// Called synchronously on the worker thread that owns the connection. An
/// `Err` (or a panic) turns into a 500 response; the error is only logged.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: HttpRequest, params: PathParameters) -> Result<HttpResponse, Error>;
}

impl<F> Handler for F
where
    F: Fn(HttpRequest, PathParameters) -> Result<HttpResponse, Error> + Send + Sync + 'static,
{
    fn handle(&self, request: HttpRequest, params: PathParameters) -> Result<HttpResponse, Error> {
        self(request, params)
    }
}

/// Shared handle to a registered handler.
pub type HandlerFn = Arc<dyn Handler>;
