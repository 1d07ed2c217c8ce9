//! Rocket HTTP routes.
//!
//! Every route captures the rest of the path so the handlers see the decoded
//! segments and can decide for themselves what doesn't resolve. Handlers that
//! touch the store block, so they run on the blocking thread pool.

use std::sync::Arc;

use chrono::Utc;

use log::error;

use rocket::form::Form;
use rocket::http::uri::Origin;
use rocket::http::Status;
use rocket::response::{Redirect, Responder};
use rocket::tokio::task::spawn_blocking;
use rocket::{catch, catchers, get, post, routes, Catcher, Request, Route, State};

use crate::handlers::{self, App, PostForm, ReplyForm, Response};
use crate::models::Registry;
use crate::path;
use crate::views::{ErrorPage, View};

impl<'r> Responder<'r, 'static> for Response {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'static> {
        match self {
            Response::Rendered(view) => view.respond_to(req),
            Response::SeeOther(uri) => Redirect::to(uri).respond_to(req),
        }
    }
}

/// Get all routes.
pub fn routes() -> Vec<Route> {
    routes![
        crate::routes::index,
        crate::routes::board,
        crate::routes::thread,
        crate::routes::post_form,
        crate::routes::submit_post,
        crate::routes::reply_form,
        crate::routes::submit_reply,
        crate::routes::kill,
        crate::routes::error,
    ]
}

/// Get all catchers.
pub fn catchers() -> Vec<Catcher> {
    catchers![crate::routes::default_catcher]
}

/// The percent-decoded path of a request.
fn request_path(origin: &Origin<'_>) -> String {
    origin.path().raw().percent_decode_lossy().into_owned()
}

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Run a handler that uses the store on the blocking thread pool.
async fn run_blocking<F>(app: &State<Arc<App>>, handler: F) -> Response
where
    F: FnOnce(&App) -> Response + Send + 'static,
{
    let app = Arc::clone(app.inner());

    match spawn_blocking(move || handler(&app)).await {
        Ok(res) => res,
        Err(err) => {
            error!("Request handler didn't finish: {}", err);
            Response::SeeOther(path::error_uri(500))
        }
    }
}

/// Serve the home page. Anything no other route claims ends up here.
#[get("/<_..>", rank = 20)]
pub async fn index(origin: &Origin<'_>, app: &State<Arc<App>>) -> Response {
    let req_path = request_path(origin);

    run_blocking(app, move |app| {
        handlers::index(app.context(), &app.store, &req_path)
    })
    .await
}

/// Serve a board.
#[get("/board/<_..>")]
pub async fn board(origin: &Origin<'_>, app: &State<Arc<App>>) -> Response {
    let req_path = request_path(origin);

    run_blocking(app, move |app| {
        handlers::board(app.context(), &app.store, &req_path)
    })
    .await
}

/// Serve a thread.
#[get("/thread/<_..>")]
pub async fn thread(origin: &Origin<'_>, app: &State<Arc<App>>) -> Response {
    let req_path = request_path(origin);

    run_blocking(app, move |app| {
        handlers::thread(app.context(), &app.store, &req_path)
    })
    .await
}

/// Serve the form for a new thread.
#[get("/post/<_..>")]
pub fn post_form(origin: &Origin<'_>, app: &State<Arc<App>>) -> Response {
    handlers::post_form(app.context(), &request_path(origin))
}

/// Create a new thread.
#[post("/post/<_..>", data = "<form>")]
pub async fn submit_post(
    origin: &Origin<'_>,
    app: &State<Arc<App>>,
    form: Option<Form<PostForm>>,
) -> Response {
    let req_path = request_path(origin);
    let form = form.map(Form::into_inner);
    let time_stamp = now();

    run_blocking(app, move |app| {
        handlers::submit_post(app.context(), &app.store, &req_path, form, time_stamp)
    })
    .await
}

/// Serve the form for a reply.
#[get("/reply/<_..>")]
pub fn reply_form(origin: &Origin<'_>, app: &State<Arc<App>>) -> Response {
    handlers::reply_form(app.context(), &request_path(origin))
}

/// Create a new reply.
#[post("/reply/<_..>", data = "<form>")]
pub async fn submit_reply(
    origin: &Origin<'_>,
    app: &State<Arc<App>>,
    form: Option<Form<ReplyForm>>,
) -> Response {
    let req_path = request_path(origin);
    let form = form.map(Form::into_inner);
    let time_stamp = now();

    run_blocking(app, move |app| {
        handlers::submit_reply(app.context(), &app.store, &req_path, form, time_stamp)
    })
    .await
}

/// Serve the notice for a killed thread.
#[get("/kill/<_..>")]
pub fn kill(origin: &Origin<'_>, app: &State<Arc<App>>) -> Response {
    handlers::kill(app.context(), &request_path(origin))
}

/// Serve the notice for an error.
#[get("/error/<_..>")]
pub fn error(origin: &Origin<'_>, app: &State<Arc<App>>) -> Response {
    handlers::error(app.context(), &request_path(origin))
}

/// Render the error notice for anything Rocket rejects before a route runs,
/// like a POST to a path no route takes.
#[catch(default)]
pub fn default_catcher(status: Status, req: &Request<'_>) -> View {
    let fallback = Registry::default();
    let registry = req
        .rocket()
        .state::<Arc<App>>()
        .map_or(&fallback, |app| &app.registry);

    View::Error(ErrorPage::new(i64::from(status.code), registry))
}
