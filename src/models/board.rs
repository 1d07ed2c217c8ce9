//! Types related to boards.

use serde::{Deserialize, Serialize};

use crate::models::BoardId;
use crate::path;
use crate::{Error, Result};

/// A fixed category of threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// The ID threads on this board are stored under.
    pub id: BoardId,
    /// The unique name of the board.
    pub name: String,
    /// The description of the board.
    #[serde(default)]
    pub description: String,
}

impl Board {
    pub fn new<S1, S2>(id: BoardId, name: S1, description: S2) -> Board
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Board {
            id,
            name: name.into(),
            description: description.into(),
        }
    }

    /// The URI for the board.
    pub fn uri(&self) -> String {
        path::board_uri(&self.name)
    }
}

/// The boards this instance serves, fixed at startup.
#[derive(Debug, Clone)]
pub struct Registry {
    boards: Vec<Board>,
}

impl Registry {
    /// Identifier returned for a name that isn't registered.
    pub const UNKNOWN: BoardId = 0;

    /// Create a registry, checking that names and IDs are unique.
    pub fn new<B>(boards: B) -> Result<Registry>
    where
        B: Into<Vec<Board>>,
    {
        let boards = boards.into();

        for (i, board) in boards.iter().enumerate() {
            let clash = boards[..i]
                .iter()
                .any(|other| other.name == board.name || other.id == board.id);

            if clash || board.id == Registry::UNKNOWN {
                return Err(Error::DuplicateBoard {
                    name: board.name.clone(),
                    id: board.id,
                });
            }
        }

        Ok(Registry { boards })
    }

    /// The boards every fresh instance starts with.
    pub fn default_boards() -> Vec<Board> {
        vec![
            Board::new(1, "sports", "Sports"),
            Board::new(2, "random", "Anything goes"),
            Board::new(3, "tech", "Technology"),
        ]
    }

    /// Look up a board by name.
    pub fn board<S>(&self, name: S) -> Option<&Board>
    where
        S: AsRef<str>,
    {
        self.boards.iter().find(|board| board.name == name.as_ref())
    }

    /// Look up a board by ID.
    pub fn board_by_id(&self, id: BoardId) -> Option<&Board> {
        self.boards.iter().find(|board| board.id == id)
    }

    /// The ID of a board, or `Registry::UNKNOWN` if there's no such board.
    pub fn resolve_board_id<S>(&self, name: S) -> BoardId
    where
        S: AsRef<str>,
    {
        self.board(name).map_or(Registry::UNKNOWN, |board| board.id)
    }

    /// All boards, in configuration order.
    pub fn boards(&self) -> &[Board] {
        &self.boards
    }
}

impl Default for Registry {
    fn default() -> Registry {
        Registry {
            boards: Registry::default_boards(),
        }
    }
}
