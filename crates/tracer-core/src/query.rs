//! The query façade: turns untrusted page/sort/search parameters into a
//! bounded, allow-listed [`PageRequest`] the store can execute verbatim.
//!
//! Nothing here ever fails. Unknown sort fields fall back to the entity's
//! default, unknown directions fall back to ascending, and page numbers and
//! sizes are clamped into range.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
const MAX_SEARCH_LEN: usize = 200;

// ─── Sort keys ───────────────────────────────────────────────────────────────

/// A closed set of sortable columns for one entity kind.
///
/// The static string of each variant is the column name in the store, so
/// a validated key can be interpolated into a query without escaping.
pub trait SortKey:
  Copy + Default + FromStr + Into<&'static str> + std::fmt::Debug + Send + 'static
{
  /// Text columns matched by the free-text search (OR semantics).
  const SEARCH_COLUMNS: &'static [&'static str];

  fn column(self) -> &'static str { self.into() }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PersonSort {
  InstitutionId,
  #[default]
  Name,
  Program,
  CohortYear,
  GraduationYear,
  Email,
  CreatedAt,
}

impl SortKey for PersonSort {
  const SEARCH_COLUMNS: &'static [&'static str] =
    &["institution_id", "name", "program", "email", "phone", "address"];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EngagementSort {
  Employer,
  Position,
  Industry,
  Location,
  StartDate,
  EndDate,
  Status,
  #[default]
  CreatedAt,
}

impl SortKey for EngagementSort {
  const SEARCH_COLUMNS: &'static [&'static str] =
    &["employer", "position", "industry", "location"];
}

// ─── Direction ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  #[default]
  Asc,
  Desc,
}

impl SortOrder {
  pub fn normalize(raw: Option<&str>) -> Self {
    match raw.map(str::trim) {
      Some(s) if s.eq_ignore_ascii_case("desc") => Self::Desc,
      _ => Self::Asc,
    }
  }

  pub fn as_sql(self) -> &'static str {
    match self {
      Self::Asc => "ASC",
      Self::Desc => "DESC",
    }
  }
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// Raw listing parameters as they arrive from a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
  pub search:  Option<String>,
  #[serde(alias = "sortBy")]
  pub sort_by: Option<String>,
  pub order:   Option<String>,
  pub page:    Option<i64>,
  pub limit:   Option<i64>,
}

/// A validated listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<K: SortKey> {
  /// Trimmed; empty matches everything.
  pub search: String,
  pub sort:   K,
  pub order:  SortOrder,
  /// 1-based.
  pub page:   u32,
  pub limit:  u32,
}

impl<K: SortKey> Default for PageRequest<K> {
  fn default() -> Self { ListParams::default().normalize() }
}

impl ListParams {
  pub fn normalize<K: SortKey>(&self) -> PageRequest<K> {
    let sort = self
      .sort_by
      .as_deref()
      .map(str::trim)
      .and_then(|s| K::from_str(s).ok())
      .unwrap_or_default();

    let search: String = self
      .search
      .as_deref()
      .unwrap_or_default()
      .trim()
      .chars()
      .take(MAX_SEARCH_LEN)
      .collect();

    let page = match self.page {
      Some(p) if p >= 1 => p.min(i64::from(u32::MAX)) as u32,
      _ => 1,
    };

    let limit = match self.limit {
      None => DEFAULT_PAGE_SIZE,
      Some(l) => l.clamp(1, i64::from(MAX_PAGE_SIZE)) as u32,
    };

    PageRequest {
      search,
      sort,
      order: SortOrder::normalize(self.order.as_deref()),
      page,
      limit,
    }
  }
}

impl<K: SortKey> PageRequest<K> {
  pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }

  pub fn meta(&self, total: u64) -> PageMeta {
    PageMeta {
      page:    self.page,
      limit:   self.limit,
      total,
      pages:   total.div_ceil(u64::from(self.limit)),
      sort_by: self.sort.column(),
      order:   self.order,
      search:  self.search.clone(),
    }
  }
}

// ─── Response ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
  pub page:    u32,
  pub limit:   u32,
  /// Matches before pagination.
  pub total:   u64,
  pub pages:   u64,
  pub sort_by: &'static str,
  pub order:   SortOrder,
  pub search:  String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub data: Vec<T>,
  pub meta: PageMeta,
}
