use thiserror::Error;
use xref_store::TableError;

pub type Result<T> = std::result::Result<T, ServingError>;

/// Errors surfaced by the serving engine, grouped the way callers
/// distinguish them: invalid arguments, the decorations not-found
/// sentinel, internal corruption, and store failures carrying the
/// offending ticket or key.
#[derive(Error, Debug)]
pub enum ServingError {
    #[error("invalid page_size: {0}")]
    InvalidPageSize(i32),

    #[error("invalid page_token: {0:?}")]
    InvalidPageToken(String),

    #[error("missing location")]
    MissingLocation,

    #[error(transparent)]
    InvalidTicket(#[from] xref_schema::TicketError),

    #[error(transparent)]
    InvalidSpan(#[from] xref_text::TextError),

    /// Sentinel for a file ticket with no stored decorations.
    #[error("decorations not found")]
    DecorationsNotFound,

    /// A `PageIndex` entry referenced an edge page the store does not
    /// hold; the corpus is corrupt, not merely missing data.
    #[error("internal error: missing edge page {0:?}")]
    MissingEdgePage(String),

    /// A cross-reference page index referenced a missing page.
    #[error("internal error: missing cross-references page {0:?}")]
    MissingCrossReferencesPage(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("error loading reference target locations: {0}")]
    TargetDefinitions(#[source] Box<ServingError>),

    #[error("error getting related nodes: {0}")]
    RelatedNodes(#[source] Box<ServingError>),

    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: TableError,
    },
}

impl ServingError {
    pub(crate) fn store(context: impl Into<String>, source: TableError) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }
}
