//! Turning request paths into route parameters, and route parameters back
//! into paths.
//!
//! Every route is mounted one segment deep (`/board/`, `/thread/`, ...) and
//! takes exactly one parameter in the segment after that. Splitting a path on
//! `/` gives `["", "<mount>", "<param>", ...]`; anything non-empty past the
//! parameter is not a route.

use crate::models::{Board, Registry, ThreadId};
use crate::{Error, Result};

/// Which parameter a route expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    BoardName,
    ThreadId,
    Status,
}

/// The typed parameter taken from a route's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteParams<'a> {
    Board(&'a Board),
    ThreadId(ThreadId),
    Status(i64),
}

/// Split a request path into segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').collect()
}

fn not_found(segments: &[&str]) -> Error {
    Error::PathNotFound {
        path: segments.join("/"),
    }
}

/// Resolve the parameter a route expects from its path segments.
pub fn resolve<'a>(
    segments: &[&str],
    shape: Shape,
    registry: &'a Registry,
) -> Result<RouteParams<'a>> {
    if segments.iter().skip(3).any(|segment| !segment.is_empty()) {
        return Err(not_found(segments));
    }

    let param = *segments.get(2).ok_or_else(|| not_found(segments))?;

    match shape {
        Shape::BoardName => registry
            .board(param)
            .map(RouteParams::Board)
            .ok_or_else(|| not_found(segments)),
        Shape::ThreadId => param
            .parse()
            .map(RouteParams::ThreadId)
            .map_err(|_| not_found(segments)),
        Shape::Status => param
            .parse()
            .map(RouteParams::Status)
            .map_err(|_| not_found(segments)),
    }
}

/// Resolve a board name route.
pub fn resolve_board<'a>(
    segments: &[&str],
    registry: &'a Registry,
) -> Result<&'a Board> {
    match resolve(segments, Shape::BoardName, registry)? {
        RouteParams::Board(board) => Ok(board),
        _ => Err(not_found(segments)),
    }
}

/// Resolve a thread ID route.
pub fn resolve_thread_id(
    segments: &[&str],
    registry: &Registry,
) -> Result<ThreadId> {
    match resolve(segments, Shape::ThreadId, registry)? {
        RouteParams::ThreadId(thread_id) => Ok(thread_id),
        _ => Err(not_found(segments)),
    }
}

/// Resolve a status code route.
pub fn resolve_status(segments: &[&str], registry: &Registry) -> Result<i64> {
    match resolve(segments, Shape::Status, registry)? {
        RouteParams::Status(status) => Ok(status),
        _ => Err(not_found(segments)),
    }
}

/// Check that a path is the root and nothing else.
pub fn resolve_root(segments: &[&str]) -> Result<()> {
    if segments.iter().any(|segment| !segment.is_empty()) {
        return Err(not_found(segments));
    }

    Ok(())
}

pub fn index_uri() -> String {
    "/".to_string()
}

pub fn board_uri(board_name: &str) -> String {
    format!("/board/{}", board_name)
}

pub fn thread_uri(thread_id: ThreadId) -> String {
    format!("/thread/{}", thread_id)
}

pub fn post_uri(board_name: &str) -> String {
    format!("/post/{}", board_name)
}

pub fn reply_uri(thread_id: ThreadId) -> String {
    format!("/reply/{}", thread_id)
}

pub fn kill_uri(thread_id: ThreadId) -> String {
    format!("/kill/{}", thread_id)
}

pub fn error_uri(status: u16) -> String {
    format!("/error/{}", status)
}
