use crate::error::{Result, ServingError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use xref_serving::PageToken;

/// Page size used when a request leaves `page_size` at zero.
pub const DEFAULT_PAGE_SIZE: usize = 2048;
/// Hard cap applied to any requested page size.
pub const MAX_PAGE_SIZE: usize = 10000;

/// Applies the page-size policy: negative is an error, zero means the
/// default, anything above the cap clamps to it.
pub fn resolve_page_size(page_size: i32) -> Result<usize> {
    if page_size < 0 {
        return Err(ServingError::InvalidPageSize(page_size));
    }
    let page_size = page_size as usize;
    if page_size == 0 {
        Ok(DEFAULT_PAGE_SIZE)
    } else {
        Ok(page_size.min(MAX_PAGE_SIZE))
    }
}

/// Decodes an opaque page token. The empty token is the start of the
/// result set; anything else must be valid base64 of a serialized
/// [`PageToken`] with a non-negative index.
pub fn decode_page_token(token: &str) -> Result<PageToken> {
    if token.is_empty() {
        return Ok(PageToken::default());
    }
    let invalid = || ServingError::InvalidPageToken(token.to_string());
    let bytes = STANDARD.decode(token).map_err(|_| invalid())?;
    let decoded: PageToken = serde_json::from_slice(&bytes).map_err(|_| invalid())?;
    if decoded.index < 0 {
        return Err(invalid());
    }
    Ok(decoded)
}

/// Encodes a continuation cursor as an opaque page token.
pub fn encode_page_token(token: &PageToken) -> Result<String> {
    let bytes = serde_json::to_vec(token)
        .map_err(|err| ServingError::Internal(format!("error marshalling page token: {err}")))?;
    Ok(STANDARD.encode(bytes))
}

pub(crate) fn token_index(count: usize) -> Result<i32> {
    i32::try_from(count).map_err(|_| ServingError::Internal("page token index overflow".into()))
}

/// Skip/limit cursor threaded through record-by-record accumulation.
///
/// Request-local; mutated in place by the walk over inline groups and
/// overflow pages.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FilterStats {
    pub skip: usize,
    pub total: usize,
    pub max: usize,
}

impl FilterStats {
    pub fn new(max: usize, skip: usize) -> Self {
        Self {
            skip,
            total: 0,
            max,
        }
    }

    pub fn is_full(&self) -> bool {
        self.total == self.max
    }

    /// Consumes a whole page against the skip without loading it, when
    /// every item in it would be skipped anyway.
    pub fn skip_page(&mut self, count: usize) -> bool {
        if count <= self.skip {
            self.skip -= count;
            return true;
        }
        false
    }

    /// Applies skip/limit to one contiguous run of items, returning the
    /// surviving window and advancing the cursor by its length.
    pub fn filter_window<'a, T>(&mut self, items: &'a [T]) -> Option<&'a [T]> {
        if items.len() <= self.skip {
            self.skip -= items.len();
            return None;
        }
        let mut items = &items[self.skip..];
        self.skip = 0;
        if items.len() > self.max - self.total {
            items = &items[..self.max - self.total];
        }
        self.total += items.len();
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }
}
