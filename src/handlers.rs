//! What each route does, independent of the HTTP server.
//!
//! A handler either renders a page or sends the client somewhere else. Paths
//! that don't resolve and things that don't exist go to the "not found"
//! notice; store failures go to the "internal server error" notice. A form
//! that fails validation is rendered again in place with what was submitted.

use log::{error, warn};

use rocket::FromForm;

use crate::config::Config;
use crate::lifecycle::{self, Limits, ReplyOutcome};
use crate::models::{Gateway, Registry, Store};
use crate::path;
use crate::validate::{validate_post, validate_reply};
use crate::views::*;
use crate::{Error, Result};

/// The state every request shares, built once at startup.
#[derive(Debug)]
pub struct App {
    pub config: Config,
    pub registry: Registry,
    pub limits: Limits,
    pub store: Store,
}

impl App {
    /// Check `config` and open the store it names.
    pub fn new(config: Config) -> Result<App> {
        let registry = config.registry()?;
        let limits = config.limits()?;
        let store = Store::open(&config.database_url)?;

        Ok(App {
            config,
            registry,
            limits,
            store,
        })
    }

    pub fn context(&self) -> Context<'_> {
        Context {
            config: &self.config,
            registry: &self.registry,
            limits: self.limits,
        }
    }
}

/// Everything a handler needs that doesn't change between requests.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub config: &'a Config,
    pub registry: &'a Registry,
    pub limits: Limits,
}

/// What a handler decided to do with a request.
#[derive(Debug)]
pub enum Response {
    /// Show a page.
    Rendered(View),
    /// Send the client to another URI with 303 See Other.
    SeeOther(String),
}

impl Response {
    /// Where the client is sent, if this is a redirect.
    pub fn redirect_uri(&self) -> Option<&str> {
        match self {
            Response::SeeOther(uri) => Some(uri),
            Response::Rendered(_) => None,
        }
    }
}

/// Form data for starting a thread.
#[derive(Debug, Default, FromForm)]
pub struct PostForm {
    #[field(default = String::new())]
    pub title: String,
    #[field(default = String::new())]
    pub comment: String,
}

/// Form data for replying to a thread.
#[derive(Debug, Default, FromForm)]
pub struct ReplyForm {
    #[field(default = String::new())]
    pub comment: String,
}

fn not_found(err: Error) -> Response {
    warn!("{}", err);
    Response::SeeOther(path::error_uri(404))
}

fn internal_error(err: Error) -> Response {
    error!("{}", err);
    Response::SeeOther(path::error_uri(500))
}

fn failure(err: Error) -> Response {
    if err.is_not_found() {
        not_found(err)
    } else {
        internal_error(err)
    }
}

/// Check out a connection and run `f` against it.
fn with_gateway<T, F>(store: &Store, f: F) -> Result<T>
where
    F: FnOnce(&mut dyn Gateway) -> Result<T>,
{
    let mut conn = store.connect()?;
    f(conn.gateway())
}

/// The home page: the most recent threads on every board.
pub fn index(ctx: Context, store: &Store, req_path: &str) -> Response {
    if let Err(err) = path::resolve_root(&path::segments(req_path)) {
        return not_found(err);
    }

    match with_gateway(store, |db| db.recent_threads(ctx.config.recent_threads)) {
        Ok(threads) => Response::Rendered(View::Index(IndexPage::new(threads, ctx.registry))),
        Err(err) => internal_error(err),
    }
}

/// The threads on a board.
pub fn board(ctx: Context, store: &Store, req_path: &str) -> Response {
    let board = match path::resolve_board(&path::segments(req_path), ctx.registry) {
        Ok(board) => board,
        Err(err) => return not_found(err),
    };
    let board_id = ctx.registry.resolve_board_id(&board.name);

    match with_gateway(store, |db| db.board_threads(board_id)) {
        Ok(threads) => {
            Response::Rendered(View::Board(BoardPage::new(board, threads, ctx.registry)))
        }
        Err(err) => internal_error(err),
    }
}

/// A thread and its replies.
pub fn thread(ctx: Context, store: &Store, req_path: &str) -> Response {
    let thread_id = match path::resolve_thread_id(&path::segments(req_path), ctx.registry) {
        Ok(thread_id) => thread_id,
        Err(err) => return not_found(err),
    };

    let res = with_gateway(store, |db| {
        let thread = db.thread(thread_id)?;
        let replies = db.replies(thread_id)?;
        Ok((thread, replies))
    });

    match res {
        Ok((thread, replies)) => {
            Response::Rendered(View::Thread(ThreadPage::new(thread, replies, ctx.registry)))
        }
        Err(err) => failure(err),
    }
}

/// The form for starting a thread.
pub fn post_form(ctx: Context, req_path: &str) -> Response {
    match path::resolve_board(&path::segments(req_path), ctx.registry) {
        Ok(board) => Response::Rendered(View::Post(PostPage::new(board, ctx.registry))),
        Err(err) => not_found(err),
    }
}

/// Start a thread.
pub fn submit_post(
    ctx: Context,
    store: &Store,
    req_path: &str,
    form: Option<PostForm>,
    time_stamp: i64,
) -> Response {
    let board = match path::resolve_board(&path::segments(req_path), ctx.registry) {
        Ok(board) => board,
        Err(err) => return not_found(err),
    };

    let PostForm { title, comment } = match form {
        Some(form) => form,
        None => return internal_error(Error::FormDataCouldntParse),
    };

    let (errors, ok) = validate_post(&title, &comment);
    if !ok {
        let page = PostPage::with_errors(board, title, comment, errors, ctx.registry);
        return Response::Rendered(View::Post(page));
    }

    let board_id = ctx.registry.resolve_board_id(&board.name);
    let limits = ctx.limits;

    let res = with_gateway(store, |db| {
        lifecycle::create_thread(db, limits, board_id, &title, &comment, time_stamp)
    });

    match res {
        Ok(_) => Response::SeeOther(board.uri()),
        Err(err) => internal_error(err),
    }
}

/// The form for replying to a thread.
pub fn reply_form(ctx: Context, req_path: &str) -> Response {
    match path::resolve_thread_id(&path::segments(req_path), ctx.registry) {
        Ok(thread_id) => Response::Rendered(View::Reply(ReplyPage::new(thread_id, ctx.registry))),
        Err(err) => not_found(err),
    }
}

/// Reply to a thread.
pub fn submit_reply(
    ctx: Context,
    store: &Store,
    req_path: &str,
    form: Option<ReplyForm>,
    time_stamp: i64,
) -> Response {
    let thread_id = match path::resolve_thread_id(&path::segments(req_path), ctx.registry) {
        Ok(thread_id) => thread_id,
        Err(err) => return not_found(err),
    };

    let ReplyForm { comment } = match form {
        Some(form) => form,
        None => return internal_error(Error::FormDataCouldntParse),
    };

    let (error, ok) = validate_reply(&comment);
    if !ok {
        let page = ReplyPage::with_error(thread_id, comment, error, ctx.registry);
        return Response::Rendered(View::Reply(page));
    }

    let limits = ctx.limits;

    let res = with_gateway(store, |db| {
        lifecycle::create_reply(db, limits, thread_id, &comment, time_stamp)
    });

    match res {
        Ok(ReplyOutcome::Created(_)) => Response::SeeOther(path::thread_uri(thread_id)),
        Ok(ReplyOutcome::Killed(thread_id)) => Response::SeeOther(path::kill_uri(thread_id)),
        Err(err) => failure(err),
    }
}

/// The notice that a thread was killed.
pub fn kill(ctx: Context, req_path: &str) -> Response {
    match path::resolve_thread_id(&path::segments(req_path), ctx.registry) {
        Ok(thread_id) => Response::Rendered(View::Kill(KillPage::new(thread_id, ctx.registry))),
        Err(err) => not_found(err),
    }
}

/// The notice for an error status.
pub fn error(ctx: Context, req_path: &str) -> Response {
    match path::resolve_status(&path::segments(req_path), ctx.registry) {
        Ok(status) => Response::Rendered(View::Error(ErrorPage::new(status, ctx.registry))),
        Err(err) => not_found(err),
    }
}
