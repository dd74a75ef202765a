//! Children providers and stream plumbing shared by them
//!
//! A [`ChildrenSource`] turns a parent identifier into a live stream of that
//! parent's children. Streams obey one contract: every item is either the
//! full current listing or a terminal error, after which the stream ends.

use crate::content::MediaContent;
use crate::error::{CatalogError, Result};
use crate::id::MediaId;
use bridge_traits::media::LiveStream;
use futures::future::ready;
use futures::stream::{self, BoxStream, StreamExt};

/// Live listing of one parent's children.
pub type ChildrenStream = BoxStream<'static, Result<Vec<MediaContent>>>;

/// Produces the children of parents under one media type.
///
/// Implementations are mounted on a catalog tree, either for a fixed category
/// or for a whole media type. A type-level source receives the type
/// identifier when the tree enumerates categories and a category identifier
/// when it lists a category.
#[cfg_attr(test, mockall::automock)]
pub trait ChildrenSource: Send + Sync {
    fn children(&self, parent: &MediaId) -> ChildrenStream;
}

/// Stream failing once with `err`.
pub fn fail(err: CatalogError) -> ChildrenStream {
    stream::once(ready(Err(err))).boxed()
}

/// Stream emitting `children` once and then staying open without changes.
pub fn fixed(children: Vec<MediaContent>) -> ChildrenStream {
    stream::once(ready(Ok(children)))
        .chain(stream::pending())
        .boxed()
}

/// Rejects track identifiers, which have no children.
pub(crate) fn reject_leaf(parent: &MediaId) -> Option<ChildrenStream> {
    if parent.is_browsable() {
        None
    } else {
        Some(fail(CatalogError::NotBrowsable(parent.to_string())))
    }
}

/// Ends the stream right after its first error.
pub(crate) fn until_error<T>(stream: BoxStream<'static, Result<T>>) -> BoxStream<'static, Result<T>>
where
    T: Send + 'static,
{
    stream
        .scan(false, |failed, item| {
            if *failed {
                return ready(None);
            }
            *failed = item.is_err();
            ready(Some(item))
        })
        .boxed()
}

/// Maps every emission of a host collection through `derive`.
pub(crate) fn derive<R, F>(collection: LiveStream<R>, mut derive: F) -> ChildrenStream
where
    R: Send + 'static,
    F: FnMut(R) -> Result<Vec<MediaContent>> + Send + 'static,
{
    until_error(
        collection
            .map(move |item| item.map_err(CatalogError::from).and_then(&mut derive))
            .boxed(),
    )
}

enum Side<A, B> {
    Left(A),
    Right(B),
}

/// Combines two host collections, emitting `combine(left, right)` on every
/// emission of either once both have produced a value.
pub(crate) fn combine_latest<A, B, F>(
    left: LiveStream<A>,
    right: LiveStream<B>,
    combine: F,
) -> ChildrenStream
where
    A: Send + 'static,
    B: Send + 'static,
    F: FnMut(&A, &B) -> Result<Vec<MediaContent>> + Send + 'static,
{
    let left = left.map(|item| item.map(Side::Left));
    let right = right.map(|item| item.map(Side::Right));

    let combined = stream::select(left, right)
        .scan((None, None, combine), |(latest_left, latest_right, combine), item| {
            let out = match item {
                Err(err) => Some(Err(CatalogError::from(err))),
                Ok(side) => {
                    match side {
                        Side::Left(value) => *latest_left = Some(value),
                        Side::Right(value) => *latest_right = Some(value),
                    }
                    match (latest_left.as_ref(), latest_right.as_ref()) {
                        (Some(a), Some(b)) => Some(combine(a, b)),
                        _ => None,
                    }
                }
            };
            ready(Some(out))
        })
        .filter_map(ready)
        .boxed();

    until_error(combined)
}

/// Current listing of a children stream: its first emission.
pub async fn first_value(mut stream: ChildrenStream) -> Result<Vec<MediaContent>> {
    match stream.next().await {
        Some(result) => result,
        None => Err(CatalogError::SourceUnavailable(
            "children stream ended without a value".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MediaCategory;
    use bridge_traits::BridgeError;
    use futures::FutureExt;
    use tokio::sync::mpsc;

    fn manual<T: Send + 'static>() -> (mpsc::UnboundedSender<bridge_traits::Result<T>>, LiveStream<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stream = stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) });
        (tx, stream.boxed())
    }

    fn category(name: &str) -> MediaContent {
        MediaCategory::new(MediaId::parse(&format!("test/{}", name)).unwrap(), name).into()
    }

    fn labels(a: &Vec<&'static str>, b: &Vec<&'static str>) -> Result<Vec<MediaContent>> {
        Ok(a.iter().chain(b.iter()).map(|name| category(name)).collect())
    }

    #[tokio::test]
    async fn test_combine_waits_for_both_sides() {
        let (left_tx, left) = manual();
        let (right_tx, right) = manual();
        let mut combined = combine_latest(left, right, labels);

        left_tx.send(Ok(vec!["a"])).unwrap();
        tokio::task::yield_now().await;
        assert!(combined.next().now_or_never().is_none());

        right_tx.send(Ok(vec!["b"])).unwrap();
        assert_eq!(combined.next().await.unwrap().unwrap().len(), 2);

        left_tx.send(Ok(vec!["a", "c"])).unwrap();
        assert_eq!(combined.next().await.unwrap().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_combine_ends_after_error() {
        let (left_tx, left) = manual::<Vec<&'static str>>();
        let (_right_tx, right) = manual::<Vec<&'static str>>();
        let mut combined = combine_latest(left, right, labels);

        left_tx
            .send(Err(BridgeError::PermissionDenied("denied".to_string())))
            .unwrap();
        assert!(matches!(
            combined.next().await,
            Some(Err(CatalogError::PermissionDenied(_)))
        ));
        assert!(combined.next().await.is_none());
    }

    #[tokio::test]
    async fn test_derive_maps_and_stops_on_error() {
        let (tx, collection) = manual::<Vec<&'static str>>();
        let mut derived = derive(collection, |names| {
            if names.is_empty() {
                Err(CatalogError::NotFound("test/empty".to_string()))
            } else {
                Ok(names.into_iter().map(category).collect())
            }
        });

        tx.send(Ok(vec!["x"])).unwrap();
        tx.send(Ok(vec![])).unwrap();
        tx.send(Ok(vec!["y"])).unwrap();

        assert_eq!(derived.next().await.unwrap().unwrap().len(), 1);
        assert!(matches!(derived.next().await, Some(Err(CatalogError::NotFound(_)))));
        assert!(derived.next().await.is_none());
    }

    #[tokio::test]
    async fn test_first_value_of_fixed_and_failed() {
        assert_eq!(first_value(fixed(vec![category("a")])).await.unwrap().len(), 1);
        assert!(matches!(
            first_value(fail(CatalogError::NotFound("x".to_string()))).await,
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            first_value(stream::empty().boxed()).await,
            Err(CatalogError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn test_reject_leaf() {
        assert!(reject_leaf(&MediaId::parse("a/b").unwrap()).is_none());
        assert!(reject_leaf(&MediaId::parse("a/b|1").unwrap()).is_some());
    }
}
