//! A small book catalogue served by microhttp-rs.
//!
//! Run with `RUST_LOG=info cargo run --example books`, then try:
//!
//! ```text
//! curl http://127.0.0.1:8090/books
//! curl http://127.0.0.1:8090/books/42?format=short
//! curl -X POST -H 'Content-Type: application/json' -d '{"title":"Dune"}' http://127.0.0.1:8090/books
//! ```

use log::info;
use microhttp_rs::{
    HttpRequest, HttpResponse, HttpServer, Method, PathParameters, ServerConfig, ServerError,
    StatusCode,
};

struct BookController;

impl BookController {
    fn get_all(_req: HttpRequest, _params: PathParameters) -> Result<HttpResponse, ServerError> {
        Ok(HttpResponse::new(StatusCode::Ok).with_body_string("Handling GET all books"))
    }

    fn get_by_id(req: HttpRequest, params: PathParameters) -> Result<HttpResponse, ServerError> {
        let mut params: Vec<_> = params.into_iter().collect();
        params.sort();
        Ok(HttpResponse::new(StatusCode::Ok).with_body_string(format!(
            "Handling GET book by id: {params:?} query={:?} content-type={}",
            req.query_params(),
            req.content_type()
        )))
    }

    fn browse(req: HttpRequest, _params: PathParameters) -> Result<HttpResponse, ServerError> {
        Ok(HttpResponse::new(StatusCode::Ok)
            .with_body_string(format!("Browsing the shelves under {}", req.path())))
    }

    fn create(req: HttpRequest, _params: PathParameters) -> Result<HttpResponse, ServerError> {
        let body = req.body().json_value()?;
        let keys: Vec<&String> = body
            .as_object()
            .map(|fields| fields.keys().collect())
            .unwrap_or_default();
        Ok(HttpResponse::new(StatusCode::Created).with_body_string(format!(
            "Handling POST request to add a new book: {keys:?}"
        )))
    }

    fn update(req: HttpRequest, _params: PathParameters) -> Result<HttpResponse, ServerError> {
        Ok(HttpResponse::new(StatusCode::Ok).with_body_string(format!(
            "Handling PUT request to update book with id: {}",
            req.target()
        )))
    }

    fn delete(req: HttpRequest, _params: PathParameters) -> Result<HttpResponse, ServerError> {
        Ok(HttpResponse::new(StatusCode::Ok).with_body_string(format!(
            "Handling DELETE request to delete book with id: {}",
            req.target()
        )))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut server = HttpServer::new(ServerConfig::with_addr("127.0.0.1:8090".parse()?));

    server.add_route("/books", Method::GET, BookController::get_all)?;
    server.add_route("/books/{id}", Method::GET, BookController::get_by_id)?;
    server.add_route("/books/{id}/{name}", Method::GET, BookController::get_by_id)?;
    server.add_route("/books/*", Method::GET, BookController::browse)?;
    server.add_route("/books/*/h/{id}/*", Method::GET, BookController::get_by_id)?;
    server.add_route("/libs", Method::GET, BookController::get_all)?;
    server.add_route("/books", Method::POST, BookController::create)?;
    server.add_route("/books/{id}", Method::PUT, BookController::update)?;
    server.add_route("/books/{id}", Method::DELETE, BookController::delete)?;

    let addr = server.start()?;
    info!("Book catalogue ready on http://{addr}, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    server.stop();
    Ok(())
}
