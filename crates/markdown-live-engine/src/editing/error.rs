use thiserror::Error;

use crate::editing::document::BlockId;
use crate::editing::location::ItemPath;

/// Structural failures of an edit. The document is left unchanged whenever
/// one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("block {0:?} is not in the document")]
    BlockNotFound(BlockId),

    #[error("block {0:?} is not a list")]
    NotAList(BlockId),

    #[error("path {0:?} does not point at a list item")]
    NotAListItem(ItemPath),

    #[error("expected list container around {0:?} is missing")]
    MissingContainer(ItemPath),

    #[error("caret location does not resolve")]
    UnresolvedLocation,
}
