//! The `ListingSource` trait: where giveaways come from.

use std::future::Future;

use crate::{
  filter::{ItemType, ListingFilter, Platform},
  item::{Item, ItemId, Summary},
};

/// Outcome of a lookup that reached the source.
///
/// Transport failures are the `Err` side of the surrounding `Result`; a
/// missing entity is an ordinary answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
  Found(T),
  NotFound,
}

impl<T> Lookup<T> {
  pub fn found(self) -> Option<T> {
    match self {
      Lookup::Found(v) => Some(v),
      Lookup::NotFound => None,
    }
  }
}

/// A remote listing of live giveaways.
///
/// Implementations do not retry; errors bubble up to the caller, which
/// decides whether the failure is worth retrying later.
pub trait ListingSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Current giveaways matching `filter`, in the order the source returns
  /// them. The poll loop relies on newest-first order for
  /// [`SortBy::Date`](crate::filter::SortBy::Date).
  fn list<'a>(
    &'a self,
    filter: &'a ListingFilter,
  ) -> impl Future<Output = Result<Vec<Item>, Self::Error>> + Send + 'a;

  fn fetch_one<'a>(
    &'a self,
    id: &'a ItemId,
  ) -> impl Future<Output = Result<Lookup<Item>, Self::Error>> + Send + 'a;

  fn summary(
    &self,
    platform: Option<Platform>,
    kind: Option<ItemType>,
  ) -> impl Future<Output = Result<Lookup<Summary>, Self::Error>> + Send + '_;
}
