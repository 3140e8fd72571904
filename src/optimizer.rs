//! Simulated cleanup engine.
//!
//! Nothing here touches the filesystem: counts and sizes are random within
//! fixed per-category ranges, and "cleaning" only records item ids so that
//! later queries exclude them for the lifetime of the process.

use std::{collections::HashSet, fmt, ops::Range, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Browsing,
  Registry,
  Files,
  Privacy,
  Shortcuts,
  Services,
  Settings,
  Recycle,
}

impl Category {
  pub const ALL: [Category; 8] = [
    Category::Browsing,
    Category::Registry,
    Category::Files,
    Category::Privacy,
    Category::Shortcuts,
    Category::Services,
    Category::Settings,
    Category::Recycle,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Category::Browsing => "browsing",
      Category::Registry => "registry",
      Category::Files => "files",
      Category::Privacy => "privacy",
      Category::Shortcuts => "shortcuts",
      Category::Services => "services",
      Category::Settings => "settings",
      Category::Recycle => "recycle",
    }
  }

  fn profile(self) -> Profile {
    use Category::*;
    match self {
      Browsing => Profile::sized(100..600, 500..2500, 5.0),
      Registry => Profile::count(1000..3000),
      Files => Profile::sized(200..1000, 300..1800, 5.0),
      Privacy => Profile::sized(500..2500, 5..55, 0.02),
      Shortcuts => Profile::count(0..10),
      Services => Profile::count(0..3),
      Settings => Profile::count(1..6),
      Recycle => Profile::sized(0..50, 10..510, 3.0),
    }
  }

  /// Display name and path for a synthetic item.
  fn describe(self, i: usize) -> (String, String) {
    use Category::*;
    match self {
      Browsing => (
        format!("Temporary Internet File {}", i + 1),
        format!(
          r"C:\Users\User\AppData\Local\Microsoft\Windows\INetCache\IE\file{i}.tmp"
        ),
      ),
      Registry => (
        format!("Obsolete Registry Key {}", i + 1),
        format!(
          r"HKEY_LOCAL_MACHINE\SOFTWARE\Classes\CLSID\{{{:08x}}}",
          rand::thread_rng().r#gen::<u32>()
        ),
      ),
      Files => (
        format!("Temp File {}.tmp", i + 1),
        format!(r"C:\Windows\Temp\file{i}.tmp"),
      ),
      Privacy => (
        format!("Cookie {}", i + 1),
        r"C:\Users\User\AppData\Local\Google\Chrome\User Data\Default\Cookies"
          .to_string(),
      ),
      Shortcuts => (
        format!("Invalid Shortcut {}.lnk", i + 1),
        format!(r"C:\Users\User\Desktop\shortcut{i}.lnk"),
      ),
      Services => (
        format!("Unused Service {}", i + 1),
        format!(r"Services\UnusedService{i}"),
      ),
      Settings => (
        format!("Performance Setting {}", i + 1),
        format!(r"System\Performance\Setting{i}"),
      ),
      Recycle => (
        format!("Deleted File {}", i + 1),
        format!(r"C:\$Recycle.Bin\S-1-5-21\file{i}"),
      ),
    }
  }

  /// Fixed item size in KB for categories whose items carry no payload.
  fn fixed_item_size(self) -> Option<u64> {
    match self {
      Category::Registry | Category::Services | Category::Settings => Some(0),
      Category::Shortcuts => Some(1),
      _ => None,
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Category {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Category::ALL
      .into_iter()
      .find(|c| c.as_str() == s)
      .ok_or_else(|| Error::InvalidArgs(format!("Unknown category: {s}")))
  }
}

struct Profile {
  count: Range<u64>,
  size_mb: Option<Range<u64>>,
  /// MB subtracted from the size per cleaned item.
  size_per_cleaned: f64,
}

impl Profile {
  fn count(count: Range<u64>) -> Self {
    Self { count, size_mb: None, size_per_cleaned: 0.0 }
  }

  fn sized(count: Range<u64>, size_mb: Range<u64>, per: f64) -> Self {
    Self { count, size_mb: Some(size_mb), size_per_cleaned: per }
  }
}

fn sample(rng: &mut impl Rng, range: &Range<u64>) -> u64 {
  if range.is_empty() { range.start } else { rng.gen_range(range.clone()) }
}

/// One value per category, serialized with the client's field names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerCategory<T> {
  pub browsing_traces: T,
  pub registry_entries: T,
  pub unnecessary_files: T,
  pub privacy_traces: T,
  pub invalid_shortcuts: T,
  pub unnecessary_services: T,
  pub optimizable_settings: T,
  pub recycle_bin: T,
}

impl<T> PerCategory<T> {
  pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
    Self {
      browsing_traces: f(Category::Browsing),
      registry_entries: f(Category::Registry),
      unnecessary_files: f(Category::Files),
      privacy_traces: f(Category::Privacy),
      invalid_shortcuts: f(Category::Shortcuts),
      unnecessary_services: f(Category::Services),
      optimizable_settings: f(Category::Settings),
      recycle_bin: f(Category::Recycle),
    }
  }

  pub fn get(&self, category: Category) -> &T {
    match category {
      Category::Browsing => &self.browsing_traces,
      Category::Registry => &self.registry_entries,
      Category::Files => &self.unnecessary_files,
      Category::Privacy => &self.privacy_traces,
      Category::Shortcuts => &self.invalid_shortcuts,
      Category::Services => &self.unnecessary_services,
      Category::Settings => &self.optimizable_settings,
      Category::Recycle => &self.recycle_bin,
    }
  }

  pub fn values(&self) -> impl Iterator<Item = &T> {
    Category::ALL.into_iter().map(|c| self.get(c))
  }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Finding {
  pub count: u64,
  #[serde(rename = "sizeMB")]
  pub size_mb: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSummary {
  pub total_objects: u64,
  #[serde(rename = "totalSizeMB")]
  pub total_size_mb: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
  #[serde(flatten)]
  pub categories: PerCategory<Finding>,
  pub summary: DiagnosticsSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
  pub id: String,
  pub name: String,
  pub path: String,
  /// KB
  pub size: u64,
  pub last_modified: DateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedItems {
  pub category: Category,
  pub total_count: u64,
  #[serde(rename = "totalSizeMB")]
  pub total_size_mb: f64,
  pub items: Vec<Item>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cleaned {
  pub category: Category,
  pub items_cleaned: usize,
  pub space_freed: u64,
  pub success: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Freed {
  pub items_cleaned: u64,
  pub space_freed: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
  pub total_items_cleaned: u64,
  pub total_space_freed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Run {
  pub success: bool,
  pub results: PerCategory<Freed>,
  pub summary: RunSummary,
}

const MAX_ITEMS: usize = 100;
const MB_PER_CLEANED_ITEM: u64 = 5;

#[derive(Default)]
pub struct Optimizer {
  cleaned: DashMap<Category, HashSet<String>>,
}

impl Optimizer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cleaned_count(&self, category: Category) -> u64 {
    self.cleaned.get(&category).map_or(0, |set| set.len() as u64)
  }

  pub fn is_cleaned(&self, category: Category, id: &str) -> bool {
    self.cleaned.get(&category).is_some_and(|set| set.contains(id))
  }

  fn finding(&self, rng: &mut impl Rng, category: Category) -> Finding {
    let profile = category.profile();
    let cleaned = self.cleaned_count(category);

    let count = sample(rng, &profile.count).saturating_sub(cleaned);
    let size_mb = profile.size_mb.as_ref().map_or(0.0, |range| {
      let size = sample(rng, range) as f64;
      (size - cleaned as f64 * profile.size_per_cleaned).max(0.0)
    });

    Finding { count, size_mb }
  }

  pub fn diagnostics(&self) -> Diagnostics {
    let mut rng = rand::thread_rng();
    let categories = PerCategory::from_fn(|c| self.finding(&mut rng, c));

    let summary = DiagnosticsSummary {
      total_objects: categories.values().map(|f| f.count).sum(),
      total_size_mb: categories.values().map(|f| f.size_mb).sum(),
    };

    Diagnostics { categories, summary }
  }

  pub fn detailed_items(&self, category: Category) -> DetailedItems {
    let mut rng = rand::thread_rng();
    let Finding { count, size_mb } = self.finding(&mut rng, category);
    let cleaned = self.cleaned_count(category);

    let avg_kb =
      if count > 0 { size_mb * 1024.0 / count as f64 } else { 100.0 };
    let now = Utc::now().naive_utc();

    let items = (0..(count + cleaned) as usize)
      .map(|i| (i, format!("{category}-{i}")))
      .filter(|(_, id)| !self.is_cleaned(category, id))
      .take(MAX_ITEMS)
      .map(|(i, id)| {
        let (name, path) = category.describe(i);
        let size = category.fixed_item_size().unwrap_or_else(|| {
          (rng.r#gen::<f64>() * avg_kb * 2.0).floor() as u64 + 10
        });
        let age = TimeDelta::seconds(rng.gen_range(0..90 * 24 * 3600));
        Item { id, name, path, size, last_modified: now - age }
      })
      .collect();

    let remaining = count.saturating_sub(cleaned);
    let total_size_mb = if count > 0 {
      (size_mb * remaining as f64 / count as f64).max(0.0)
    } else {
      0.0
    };

    DetailedItems { category, total_count: remaining, total_size_mb, items }
  }

  pub fn clean_selected(&self, category: Category, ids: &[String]) -> Cleaned {
    self.cleaned.entry(category).or_default().extend(ids.iter().cloned());

    Cleaned {
      category,
      items_cleaned: ids.len(),
      space_freed: ids.len() as u64 * MB_PER_CLEANED_ITEM,
      success: true,
    }
  }

  /// Full simulated run across every category.
  pub fn run_full(&self) -> Run {
    let mut rng = rand::thread_rng();
    let mut freed = |items: Range<u64>, space: Option<Range<u64>>| Freed {
      items_cleaned: sample(&mut rng, &items),
      space_freed: space.map_or(0, |range| sample(&mut rng, &range)),
    };

    let results = PerCategory {
      browsing_traces: freed(200..500, Some(500..2000)),
      registry_entries: freed(500..1500, None),
      unnecessary_files: freed(200..600, Some(300..1100)),
      privacy_traces: freed(500..1500, Some(5..25)),
      invalid_shortcuts: freed(1..6, None),
      unnecessary_services: freed(1..4, None),
      optimizable_settings: freed(2..7, None),
      recycle_bin: freed(10..40, Some(50..250)),
    };

    let summary = RunSummary {
      total_items_cleaned: results.values().map(|f| f.items_cleaned).sum(),
      total_space_freed: results.values().map(|f| f.space_freed).sum(),
    };

    Run { success: true, results, summary }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn diagnostics_stay_in_range() {
    let optimizer = Optimizer::new();
    let diag = optimizer.diagnostics();

    let browsing = diag.categories.browsing_traces;
    assert!((100..600).contains(&browsing.count));
    assert!((500.0..2500.0).contains(&browsing.size_mb));
    assert!((1..6).contains(&diag.categories.optimizable_settings.count));
    assert_eq!(diag.categories.registry_entries.size_mb, 0.0);

    let total: u64 = diag.categories.values().map(|f| f.count).sum();
    assert_eq!(diag.summary.total_objects, total);
  }

  #[test]
  fn cleaned_items_are_excluded() {
    let optimizer = Optimizer::new();
    let ids: Vec<String> =
      (0..3).map(|i| format!("files-{i}")).collect();

    let cleaned = optimizer.clean_selected(Category::Files, &ids);
    assert_eq!(cleaned.items_cleaned, 3);
    assert_eq!(cleaned.space_freed, 15);
    assert!(cleaned.success);

    let detail = optimizer.detailed_items(Category::Files);
    assert!(detail.items.iter().all(|item| !ids.contains(&item.id)));
    assert_eq!(detail.items.first().map(|i| i.id.as_str()), Some("files-3"));
    assert!(detail.items.len() <= MAX_ITEMS);
  }

  #[test]
  fn empty_selection_frees_nothing() {
    let optimizer = Optimizer::new();
    let cleaned = optimizer.clean_selected(Category::Browsing, &[]);

    assert!(cleaned.success);
    assert_eq!(cleaned.items_cleaned, 0);
    assert_eq!(cleaned.space_freed, 0);
  }

  #[test]
  fn fixed_size_categories() {
    let optimizer = Optimizer::new();
    let detail = optimizer.detailed_items(Category::Registry);
    assert!(detail.items.iter().all(|item| item.size == 0));
    assert_eq!(detail.total_size_mb, 0.0);
  }

  #[test]
  fn full_run_totals() {
    let run = Optimizer::new().run_full();
    let items: u64 = run.results.values().map(|f| f.items_cleaned).sum();
    assert_eq!(run.summary.total_items_cleaned, items);
    assert!(run.summary.total_space_freed >= 500 + 300 + 5 + 50);
  }

  #[test]
  fn unknown_category_is_rejected() {
    assert!("downloads".parse::<Category>().is_err());
    assert_eq!("recycle".parse::<Category>().unwrap(), Category::Recycle);
  }
}
