use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TicketError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TicketError {
    #[error("no tickets specified")]
    NoTickets,

    #[error("invalid ticket {ticket:?}: {reason}")]
    Invalid { ticket: String, reason: String },
}

impl TicketError {
    fn invalid(ticket: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            ticket: ticket.to_string(),
            reason: reason.into(),
        }
    }
}

const URI_PREFIX: &str = "kythe://";

/// Parsed components of a ticket URI.
///
/// The wire form is `kythe://corpus?lang=L?path=P?root=R#signature`,
/// attributes separated by `?`. Serialization always emits attributes in
/// `lang`, `path`, `root` order, so a re-serialized ticket is the
/// canonical spelling used as a storage key.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub corpus: String,
    pub language: String,
    pub path: String,
    pub root: String,
    pub signature: String,
}

impl Ticket {
    pub fn parse(ticket: &str) -> Result<Self> {
        let rest = ticket
            .strip_prefix(URI_PREFIX)
            .ok_or_else(|| TicketError::invalid(ticket, format!("missing {URI_PREFIX} scheme")))?;

        let (body, signature) = match rest.split_once('#') {
            Some((body, signature)) => (body, signature),
            None => (rest, ""),
        };

        let mut parts = body.split('?');
        let corpus = parts.next().unwrap_or_default();

        let mut parsed = Self {
            corpus: corpus.to_string(),
            signature: signature.to_string(),
            ..Self::default()
        };
        for attr in parts {
            let Some((name, value)) = attr.split_once('=') else {
                return Err(TicketError::invalid(
                    ticket,
                    format!("malformed attribute {attr:?}"),
                ));
            };
            match name {
                "lang" => parsed.language = value.to_string(),
                "path" => parsed.path = clean_path(value),
                "root" => parsed.root = clean_path(value),
                _ => {
                    return Err(TicketError::invalid(
                        ticket,
                        format!("unknown attribute {name:?}"),
                    ))
                }
            }
        }
        Ok(parsed)
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{URI_PREFIX}{}", self.corpus)?;
        if !self.language.is_empty() {
            write!(f, "?lang={}", self.language)?;
        }
        if !self.path.is_empty() {
            write!(f, "?path={}", self.path)?;
        }
        if !self.root.is_empty() {
            write!(f, "?root={}", self.root)?;
        }
        if !self.signature.is_empty() {
            write!(f, "#{}", self.signature)?;
        }
        Ok(())
    }
}

/// Parses and re-serializes one ticket in canonical attribute order.
pub fn fix_ticket(ticket: &str) -> Result<String> {
    Ok(Ticket::parse(ticket)?.to_string())
}

/// Canonicalizes every ticket of a request. An empty request is an error:
/// the caller forgot its tickets, not asked for nothing.
pub fn fix_tickets(tickets: &[String]) -> Result<Vec<String>> {
    if tickets.is_empty() {
        return Err(TicketError::NoTickets);
    }
    tickets.iter().map(|ticket| fix_ticket(ticket)).collect()
}

/// Resolves `.` and `..` segments and collapses repeated slashes.
fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
