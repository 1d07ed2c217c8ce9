//! Views, types to generate layouts.
//!
//! Most of these types are meant to be returned from a handler.

use chrono::{DateTime, Utc};

use maplit::hashmap;

use serde::{Serialize, Serializer};

use serde_json::value::{to_value, Value as JsonValue};

use crate::models::*;
use crate::path;
use crate::validate::FormError;

pub mod error;

pub use error::ErrorPage;

#[macro_export]
macro_rules! impl_template_responder {
    ($t:ty, $template:expr) => {
        impl<'r> ::rocket::response::Responder<'r, 'static> for $t {
            fn respond_to(
                self,
                req: &'r ::rocket::request::Request<'_>,
            ) -> ::rocket::response::Result<'static> {
                log::trace!("Rendering template at {}", $template);

                let template =
                    ::rocket_dyn_templates::Template::render($template, &self);

                ::rocket::response::Responder::respond_to(template, req)
            }
        }
    };
}

/// Format a time stamp for display.
fn format_time_stamp(time_stamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(time_stamp, 0)
        .map(|time| time.format("%F %R").to_string())
        .unwrap_or_default()
}

/// Display information for a page.
#[derive(Debug, Serialize)]
pub struct PageInfo {
    /// The title of the page.
    pub title: String,
    /// A list of boards the user can go to.
    pub boards: Vec<BoardView>,
    /// Where the home page is.
    pub home_uri: String,
    /// The version of the anonboard server.
    pub version: String,
}

impl PageInfo {
    pub fn new<S>(title: S, registry: &Registry) -> PageInfo
    where
        S: Into<String>,
    {
        PageInfo {
            title: title.into(),
            boards: registry.boards().iter().cloned().map(BoardView).collect(),
            home_uri: path::index_uri(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A wrapper for a board that can be passed into a template.
#[derive(Debug)]
pub struct BoardView(pub Board);

impl Serialize for BoardView {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = hashmap! {
            "name" => self.0.name.clone(),
            "description" => self.0.description.clone(),
            "uri" => self.0.uri(),
            "post_uri" => path::post_uri(&self.0.name),
        };

        data.serialize(serializer)
    }
}

/// A wrapper for thread that can be passed into a template.
#[derive(Debug)]
pub struct ThreadView {
    pub thread: Thread,
    /// The name of the board the thread is on, if it's still configured.
    pub board_name: Option<String>,
}

impl ThreadView {
    pub fn new(thread: Thread, registry: &Registry) -> ThreadView {
        let board_name = registry
            .board_by_id(thread.board_id)
            .map(|board| board.name.clone());

        ThreadView { thread, board_name }
    }
}

impl Serialize for ThreadView {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let time_stamp = format_time_stamp(self.thread.time_stamp);
        let uri = path::thread_uri(self.thread.id);
        let reply_uri = path::reply_uri(self.thread.id);

        let mut data = to_value(&self.thread)
            .map_err(<S::Error as serde::ser::Error>::custom)?;

        if let Some(obj) = data.as_object_mut() {
            obj.insert("time_stamp".into(), JsonValue::String(time_stamp));
            obj.insert("uri".into(), JsonValue::String(uri));
            obj.insert("reply_uri".into(), JsonValue::String(reply_uri));

            if let Some(ref board_name) = self.board_name {
                obj.insert("board_name".into(), JsonValue::String(board_name.clone()));
                obj.insert(
                    "board_uri".into(),
                    JsonValue::String(path::board_uri(board_name)),
                );
            }
        }

        data.serialize(serializer)
    }
}

/// A wrapper for reply that can be passed into a template.
#[derive(Debug)]
pub struct ReplyView(pub Reply);

impl Serialize for ReplyView {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let time_stamp = format_time_stamp(self.0.time_stamp);

        let mut data =
            to_value(&self.0).map_err(<S::Error as serde::ser::Error>::custom)?;

        if let Some(obj) = data.as_object_mut() {
            obj.insert("time_stamp".into(), JsonValue::String(time_stamp));
        }

        data.serialize(serializer)
    }
}

/// The home page.
#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub page_info: PageInfo,
    pub threads: Vec<ThreadView>,
}

impl IndexPage {
    pub fn new(threads: Vec<Thread>, registry: &Registry) -> IndexPage {
        IndexPage {
            page_info: PageInfo::new("Home", registry),
            threads: threads
                .into_iter()
                .map(|thread| ThreadView::new(thread, registry))
                .collect(),
        }
    }
}

impl_template_responder!(IndexPage, "pages/index");

/// A page for a board.
#[derive(Debug, Serialize)]
pub struct BoardPage {
    pub page_info: PageInfo,
    pub board: BoardView,
    pub threads: Vec<ThreadView>,
}

impl BoardPage {
    pub fn new(board: &Board, threads: Vec<Thread>, registry: &Registry) -> BoardPage {
        BoardPage {
            page_info: PageInfo::new(format!("/{}/", board.name), registry),
            board: BoardView(board.clone()),
            threads: threads
                .into_iter()
                .map(|thread| ThreadView::new(thread, registry))
                .collect(),
        }
    }
}

impl_template_responder!(BoardPage, "pages/board");

/// A page for a thread.
#[derive(Debug, Serialize)]
pub struct ThreadPage {
    pub page_info: PageInfo,
    pub thread: ThreadView,
    pub replies: Vec<ReplyView>,
}

impl ThreadPage {
    pub fn new(thread: Thread, replies: Vec<Reply>, registry: &Registry) -> ThreadPage {
        ThreadPage {
            page_info: PageInfo::new(thread.title.clone(), registry),
            thread: ThreadView::new(thread, registry),
            replies: replies.into_iter().map(ReplyView).collect(),
        }
    }
}

impl_template_responder!(ThreadPage, "pages/thread");

/// The form for starting a new thread.
#[derive(Debug, Serialize)]
pub struct PostPage {
    pub page_info: PageInfo,
    pub board: BoardView,
    pub title: String,
    pub comment: String,
    pub errors: [FormError; 2],
}

impl PostPage {
    /// An empty form.
    pub fn new(board: &Board, registry: &Registry) -> PostPage {
        PostPage::with_errors(
            board,
            String::new(),
            String::new(),
            [FormError::none("title"), FormError::none("comment")],
            registry,
        )
    }

    /// A form filled in with what was submitted and what was wrong with it.
    pub fn with_errors(
        board: &Board,
        title: String,
        comment: String,
        errors: [FormError; 2],
        registry: &Registry,
    ) -> PostPage {
        PostPage {
            page_info: PageInfo::new(format!("New thread on /{}/", board.name), registry),
            board: BoardView(board.clone()),
            title,
            comment,
            errors,
        }
    }
}

impl_template_responder!(PostPage, "pages/post");

/// The form for replying to a thread.
#[derive(Debug, Serialize)]
pub struct ReplyPage {
    pub page_info: PageInfo,
    pub thread_id: ThreadId,
    pub thread_uri: String,
    pub reply_uri: String,
    pub comment: String,
    pub error: FormError,
}

impl ReplyPage {
    /// An empty form.
    pub fn new(thread_id: ThreadId, registry: &Registry) -> ReplyPage {
        ReplyPage::with_error(thread_id, String::new(), FormError::none("comment"), registry)
    }

    /// A form filled in with what was submitted and what was wrong with it.
    pub fn with_error(
        thread_id: ThreadId,
        comment: String,
        error: FormError,
        registry: &Registry,
    ) -> ReplyPage {
        ReplyPage {
            page_info: PageInfo::new(format!("Reply to #{}", thread_id), registry),
            thread_id,
            thread_uri: path::thread_uri(thread_id),
            reply_uri: path::reply_uri(thread_id),
            comment,
            error,
        }
    }
}

impl_template_responder!(ReplyPage, "pages/reply");

/// The notice shown after a thread was deleted for having too many replies.
#[derive(Debug, Serialize)]
pub struct KillPage {
    pub page_info: PageInfo,
    pub thread_id: ThreadId,
}

impl KillPage {
    pub fn new(thread_id: ThreadId, registry: &Registry) -> KillPage {
        KillPage {
            page_info: PageInfo::new("Thread killed", registry),
            thread_id,
        }
    }
}

impl_template_responder!(KillPage, "pages/kill");

/// Any page a handler can render.
#[derive(Debug)]
pub enum View {
    Index(IndexPage),
    Board(BoardPage),
    Thread(ThreadPage),
    Post(PostPage),
    Reply(ReplyPage),
    Kill(KillPage),
    Error(ErrorPage),
}

impl<'r> rocket::response::Responder<'r, 'static> for View {
    fn respond_to(
        self,
        req: &'r rocket::request::Request<'_>,
    ) -> rocket::response::Result<'static> {
        match self {
            View::Index(page) => rocket::response::Responder::respond_to(page, req),
            View::Board(page) => rocket::response::Responder::respond_to(page, req),
            View::Thread(page) => rocket::response::Responder::respond_to(page, req),
            View::Post(page) => rocket::response::Responder::respond_to(page, req),
            View::Reply(page) => rocket::response::Responder::respond_to(page, req),
            View::Kill(page) => rocket::response::Responder::respond_to(page, req),
            View::Error(page) => rocket::response::Responder::respond_to(page, req),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread() -> Thread {
        Thread {
            id: 5,
            time_stamp: 0,
            title: "title".into(),
            comment: "comment".into(),
            board_id: 3,
        }
    }

    #[test]
    fn thread_view_has_links() {
        let registry = Registry::default();
        let data = to_value(ThreadView::new(thread(), &registry)).unwrap();

        assert_eq!(data["uri"], "/thread/5");
        assert_eq!(data["reply_uri"], "/reply/5");
        assert_eq!(data["board_uri"], "/board/tech");
        assert_eq!(data["time_stamp"], "1970-01-01 00:00");
        assert_eq!(data["title"], "title");
    }

    #[test]
    fn page_info_lists_boards() {
        let data = to_value(PageInfo::new("Home", &Registry::default())).unwrap();

        assert_eq!(data["boards"][0]["name"], "sports");
        assert_eq!(data["boards"][2]["post_uri"], "/post/tech");
    }

    #[test]
    fn post_page_keeps_submission() {
        let registry = Registry::default();
        let board = registry.board("random").unwrap();
        let page = PostPage::with_errors(
            board,
            "".into(),
            "my comment".into(),
            [FormError::required("title"), FormError::none("comment")],
            &registry,
        );

        let data = to_value(&page).unwrap();

        assert_eq!(data["comment"], "my comment");
        assert_eq!(data["errors"][0]["failed"], true);
        assert_eq!(data["board"]["name"], "random");
    }
}
