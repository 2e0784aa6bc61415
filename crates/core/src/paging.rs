//! Paginated listing sessions
//!
//! A listing is a fold over a lazy sequence of pages: each page carries items
//! plus an opaque continuation token, and the fold stops when the token
//! disappears (exhaustion), when the caller asked for a single page, or when
//! an accumulated-count bound is reached. The token held at the stop point is
//! returned alongside the items so the caller can resume later.

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Accumulated listing results plus the resumption token
///
/// `continuation` is None when the collection was exhausted; otherwise it is
/// the token to pass back into the next session to continue where this one
/// stopped.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub continuation: Option<String>,
}

/// How a listing session is bounded
#[derive(Debug, Clone, Default)]
pub struct PagingOptions {
    /// Keep fetching pages until exhaustion or the bound is reached; when
    /// false, return after the first page and surface its token
    pub iterate_in_results: bool,

    /// Advisory bound on the accumulated item count. A page is never
    /// truncated, so the result can overshoot; the session only stops
    /// requesting further pages once the bound is reached.
    pub max_results: Option<u32>,

    /// Token from a previous session to resume from
    pub resume_from: Option<String>,
}

/// Drive list calls until the session's stop condition
///
/// `fetch` issues one list call, receiving the continuation token to pass
/// along (None on the first call). Items are accumulated in server order.
/// The cancellation token is checked before every fetch.
pub async fn drain_pages<'a, T, F>(
    mut fetch: F,
    options: PagingOptions,
    cancel: &CancellationToken,
) -> Result<Listing<T>>
where
    F: FnMut(Option<String>) -> BoxFuture<'a, Result<crate::traits::Page<T>>>,
{
    let mut items: Vec<T> = Vec::new();
    let mut continuation = options.resume_from;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Interrupted);
        }

        let page = fetch(continuation.take()).await?;
        items.extend(page.items);
        continuation = page.continuation.filter(|token| !token.is_empty());

        if !options.iterate_in_results {
            break;
        }
        if continuation.is_none() {
            break;
        }
        if let Some(bound) = options.max_results {
            if items.len() as u64 >= u64::from(bound) {
                break;
            }
        }
    }

    Ok(Listing {
        items,
        continuation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Page;
    use futures::FutureExt as _;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serve scripted pages, counting how many calls were made
    struct ScriptedPages {
        pages: Vec<Page<u32>>,
        calls: AtomicUsize,
        seen_tokens: std::sync::Mutex<Vec<Option<String>>>,
    }

    impl ScriptedPages {
        fn new(pages: Vec<Page<u32>>) -> Self {
            Self {
                pages,
                calls: AtomicUsize::new(0),
                seen_tokens: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn page(&self, token: Option<String>) -> Result<Page<u32>> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_tokens.lock().unwrap().push(token);
            Ok(self.pages[index].clone())
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn page(items: &[u32], continuation: Option<&str>) -> Page<u32> {
        Page {
            items: items.to_vec(),
            continuation: continuation.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_single_page_mode_surfaces_token() {
        // iterate_in_results = false: exactly one call, token passed through
        let script = ScriptedPages::new(vec![page(&[1, 2], Some("next"))]);
        let token = CancellationToken::new();

        let listing = drain_pages(
            |t| async { script.page(t) }.boxed(),
            PagingOptions {
                iterate_in_results: false,
                ..Default::default()
            },
            &token,
        )
        .await
        .unwrap();

        assert_eq!(script.call_count(), 1);
        assert_eq!(listing.items, vec![1, 2]);
        assert_eq!(listing.continuation.as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn test_single_page_mode_exhausted() {
        let script = ScriptedPages::new(vec![page(&[1], None)]);
        let token = CancellationToken::new();

        let listing = drain_pages(
            |t| async { script.page(t) }.boxed(),
            PagingOptions::default(),
            &token,
        )
        .await
        .unwrap();

        assert_eq!(script.call_count(), 1);
        assert!(listing.continuation.is_none());
    }

    #[tokio::test]
    async fn test_iterates_until_exhaustion() {
        let script = ScriptedPages::new(vec![
            page(&[1, 2], Some("a")),
            page(&[3], Some("b")),
            page(&[4, 5], None),
        ]);
        let token = CancellationToken::new();

        let listing = drain_pages(
            |t| async { script.page(t) }.boxed(),
            PagingOptions {
                iterate_in_results: true,
                ..Default::default()
            },
            &token,
        )
        .await
        .unwrap();

        assert_eq!(script.call_count(), 3);
        assert_eq!(listing.items, vec![1, 2, 3, 4, 5]);
        assert!(listing.continuation.is_none());
        // Tokens are threaded page to page in order
        assert_eq!(
            *script.seen_tokens.lock().unwrap(),
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[tokio::test]
    async fn test_max_results_stops_requesting() {
        // Bound of 3 reached after the second page; the third is never fetched
        let script = ScriptedPages::new(vec![
            page(&[1, 2], Some("a")),
            page(&[3, 4], Some("b")),
            page(&[5], None),
        ]);
        let token = CancellationToken::new();

        let listing = drain_pages(
            |t| async { script.page(t) }.boxed(),
            PagingOptions {
                iterate_in_results: true,
                max_results: Some(3),
                ..Default::default()
            },
            &token,
        )
        .await
        .unwrap();

        assert_eq!(script.call_count(), 2);
        // The bound is advisory: the page that crossed it is kept whole
        assert_eq!(listing.items, vec![1, 2, 3, 4]);
        assert_eq!(listing.continuation.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_empty_token_means_exhausted() {
        let script = ScriptedPages::new(vec![page(&[1], Some(""))]);
        let token = CancellationToken::new();

        let listing = drain_pages(
            |t| async { script.page(t) }.boxed(),
            PagingOptions {
                iterate_in_results: true,
                ..Default::default()
            },
            &token,
        )
        .await
        .unwrap();

        assert_eq!(script.call_count(), 1);
        assert!(listing.continuation.is_none());
    }

    #[tokio::test]
    async fn test_resume_from_token() {
        let script = ScriptedPages::new(vec![page(&[7], None)]);
        let token = CancellationToken::new();

        drain_pages(
            |t| async { script.page(t) }.boxed(),
            PagingOptions {
                resume_from: Some("carry-on".into()),
                ..Default::default()
            },
            &token,
        )
        .await
        .unwrap();

        assert_eq!(
            *script.seen_tokens.lock().unwrap(),
            vec![Some("carry-on".to_string())]
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_first_fetch() {
        let script = ScriptedPages::new(vec![page(&[1], None)]);
        let token = CancellationToken::new();
        token.cancel();

        let result = drain_pages(
            |t| async { script.page(t) }.boxed(),
            PagingOptions::default(),
            &token,
        )
        .await;

        assert!(matches!(result, Err(Error::Interrupted)));
        assert_eq!(script.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let token = CancellationToken::new();
        let result: Result<Listing<u32>> = drain_pages(
            |_| {
                async {
                    Err(Error::Remote {
                        status: 404,
                        message: "FilesystemNotFound".into(),
                    })
                }
                .boxed()
            },
            PagingOptions::default(),
            &token,
        )
        .await;

        assert!(matches!(result, Err(Error::Remote { status: 404, .. })));
    }
}
