//! Listing filters accepted by the giveaway source.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

macro_rules! slug_enum {
  (
    $(#[$meta:meta])*
    $name:ident, $err:ident { $($variant:ident => $slug:literal),+ $(,)? }
  ) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum $name {
      $(#[serde(rename = $slug)] $variant),+
    }

    impl $name {
      pub const ALL: &'static [$name] = &[$($name::$variant),+];

      /// The slug used by the upstream API.
      pub fn as_str(self) -> &'static str {
        match self {
          $($name::$variant => $slug),+
        }
      }
    }

    impl FromStr for $name {
      type Err = Error;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
          $($slug => Ok($name::$variant),)+
          other => Err(Error::$err(other.to_owned())),
        }
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
      }
    }
  };
}

slug_enum! {
  /// Storefronts and consoles the upstream API can filter on.
  Platform, UnknownPlatform {
    Pc => "pc",
    Steam => "steam",
    EpicGamesStore => "epic-games-store",
    Ubisoft => "ubisoft",
    Gog => "gog",
    Itchio => "itchio",
    Ps4 => "ps4",
    Ps5 => "ps5",
    XboxOne => "xbox-one",
    XboxSeriesXs => "xbox-series-xs",
    Switch => "switch",
    Android => "android",
    Ios => "ios",
    Vr => "vr",
    Battlenet => "battlenet",
    Origin => "origin",
    DrmFree => "drm-free",
    Xbox360 => "xbox-360",
  }
}

slug_enum! {
  ItemType, UnknownItemType {
    Game => "game",
    Loot => "loot",
    Beta => "beta",
  }
}

slug_enum! {
  SortBy, UnknownSort {
    Date => "date",
    Value => "value",
    Popularity => "popularity",
  }
}

/// Parameters for [`ListingSource::list`](crate::source::ListingSource::list).
///
/// Empty vectors mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
  pub platforms: Vec<Platform>,
  pub types:     Vec<ItemType>,
  pub sort:      Option<SortBy>,
}

impl ListingFilter {
  /// The filter the poll loop uses: everything, newest first.
  pub fn newest_first() -> Self {
    Self { sort: Some(SortBy::Date), ..Self::default() }
  }

  /// Parse comma-separated platform and type lists, e.g. `"steam,gog"`.
  pub fn parse(
    platforms: Option<&str>,
    types: Option<&str>,
    sort: Option<&str>,
  ) -> crate::Result<Self> {
    Ok(Self {
      platforms: split_list(platforms)?,
      types:     split_list(types)?,
      sort:      sort
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<SortBy>)
        .transpose()?,
    })
  }

  /// Whether the filter needs the multi-value endpoint.
  pub fn is_compound(&self) -> bool { self.platforms.len() > 1 || self.types.len() > 1 }
}

fn split_list<T: FromStr<Err = Error>>(raw: Option<&str>) -> crate::Result<Vec<T>> {
  raw
    .map(|s| {
      s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect::<crate::Result<Vec<T>>>()
    })
    .transpose()
    .map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_comma_separated_lists() {
    let f = ListingFilter::parse(Some("steam, GOG"), Some("game"), Some("value")).unwrap();
    assert_eq!(f.platforms, vec![Platform::Steam, Platform::Gog]);
    assert_eq!(f.types, vec![ItemType::Game]);
    assert_eq!(f.sort, Some(SortBy::Value));
    assert!(f.is_compound());
  }

  #[test]
  fn parse_empty_means_unrestricted() {
    let f = ListingFilter::parse(None, Some(""), Some(" ")).unwrap();
    assert_eq!(f, ListingFilter::default());
    assert!(!f.is_compound());
  }

  #[test]
  fn parse_rejects_unknown_platform() {
    let err = ListingFilter::parse(Some("steam,amiga"), None, None).unwrap_err();
    assert_eq!(err, Error::UnknownPlatform("amiga".into()));
  }

  #[test]
  fn slugs_round_trip_through_from_str() {
    for p in Platform::ALL {
      assert_eq!(p.as_str().parse::<Platform>().unwrap(), *p);
    }
  }
}
