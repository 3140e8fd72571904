use std::cmp::Ordering;

use rand::{Rng, distributions::Alphanumeric};

use crate::prelude::*;

pub fn format_date(date: DateTime) -> String {
  date.format("%d.%m.%Y %H:%M").to_string()
}

pub fn format_duration(duration: TimeDelta) -> String {
  format!(
    "{}d {}h {}m",
    duration.num_days(),
    duration.num_hours() % 24,
    duration.num_minutes() % 60
  )
}

/// `now + days`, or `None` when the result leaves the representable range.
pub fn days_after(now: DateTime, days: i64) -> Option<DateTime> {
  TimeDelta::try_days(days).and_then(|delta| now.checked_add_signed(delta))
}

const KEY_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Device license key: `FMAI-XXXX-XXXX-XXXX-XXXX` without look-alike glyphs.
pub fn device_license_key() -> String {
  let mut rng = rand::thread_rng();
  let mut parts = vec![String::from("FMAI")];

  for _ in 0..4 {
    let segment = (0..4)
      .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
      .collect();
    parts.push(segment);
  }

  parts.join("-")
}

/// Subscription key issued from the admin panel: `FM-` + 16 characters.
pub fn subscription_key() -> String {
  let tail: String = rand::thread_rng()
    .sample_iter(&Alphanumeric)
    .take(16)
    .map(|c| (c as char).to_ascii_uppercase())
    .collect();
  format!("FM-{tail}")
}

/// Compares dotted numeric versions; missing or non-numeric parts count as 0.
pub fn compare_versions(current: &str, latest: &str) -> Ordering {
  let parse = |v: &str| -> Vec<u64> {
    v.split('.').map(|part| part.trim().parse().unwrap_or(0)).collect()
  };

  let (current, latest) = (parse(current), parse(latest));
  let len = current.len().max(latest.len());

  for i in 0..len {
    let a = current.get(i).copied().unwrap_or(0);
    let b = latest.get(i).copied().unwrap_or(0);
    match a.cmp(&b) {
      Ordering::Equal => continue,
      other => return other,
    }
  }

  Ordering::Equal
}

/// Percentage improvement where lower is better, rounded half up to an
/// integer.
pub fn improvement(before: Option<i32>, after: Option<i32>) -> Option<i64> {
  match (before, after) {
    (Some(before), Some(after)) if before != 0 => {
      let (before, after) = (f64::from(before), f64::from(after));
      let percent = (before - after) * 100.0 / before;
      Some((percent + 0.5).floor() as i64)
    }
    _ => None,
  }
}

/// Maximum message length for Telegram Bot API (4096 characters).
/// We use a slightly smaller limit to account for HTML entity expansion.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4000;

/// Splits a long message into chunks that fit within Telegram's limit,
/// preferring newline boundaries.
pub fn chunk_message(text: &str, max_len: usize) -> Vec<String> {
  let max_len =
    if max_len == 0 { TELEGRAM_MAX_MESSAGE_LENGTH } else { max_len };

  if text.len() <= max_len {
    return vec![text.to_string()];
  }

  let mut chunks = Vec::new();
  let mut current = String::new();

  for line in text.lines() {
    if !current.is_empty() && current.len() + line.len() + 1 > max_len {
      chunks.push(std::mem::take(&mut current));
    }

    if line.len() > max_len {
      if !current.is_empty() {
        chunks.push(std::mem::take(&mut current));
      }
      let mut rest = line;
      while rest.len() > max_len {
        let mut cut = max_len;
        while !rest.is_char_boundary(cut) {
          cut -= 1;
        }
        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
      }
      current = rest.to_string();
    } else {
      if !current.is_empty() {
        current.push('\n');
      }
      current.push_str(line);
    }
  }

  if !current.is_empty() {
    chunks.push(current);
  }

  chunks
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn device_key_format() {
    let key = device_license_key();
    let parts: Vec<&str> = key.split('-').collect();

    assert_eq!(parts.len(), 5);
    assert_eq!(parts[0], "FMAI");
    for part in &parts[1..] {
      assert_eq!(part.len(), 4);
      assert!(part.bytes().all(|b| KEY_ALPHABET.contains(&b)));
    }
  }

  #[test]
  fn subscription_key_format() {
    let key = subscription_key();
    assert!(key.starts_with("FM-"));
    assert_eq!(key.len(), 19);
    assert!(!key[3..].chars().any(|c| c.is_ascii_lowercase()));
  }

  #[test]
  fn versions() {
    assert_eq!(compare_versions("1.0.0", "1.0.1"), Ordering::Less);
    assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Equal);
    assert_eq!(compare_versions("2.0.0", "1.9.9"), Ordering::Greater);
    assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
  }

  #[test]
  fn improvement_math() {
    assert_eq!(improvement(Some(60), Some(45)), Some(25));
    assert_eq!(improvement(Some(3), Some(2)), Some(33));
    assert_eq!(improvement(Some(40), Some(50)), Some(-25));
    assert_eq!(improvement(Some(0), Some(10)), None);
    assert_eq!(improvement(None, Some(10)), None);
    assert_eq!(improvement(Some(10), None), None);
  }

  #[test]
  fn improvement_rounds_half_up() {
    assert_eq!(improvement(Some(40), Some(41)), Some(-2));
    assert_eq!(improvement(Some(40), Some(39)), Some(3));
    assert_eq!(improvement(Some(8), Some(7)), Some(13));
  }

  #[test]
  fn improvement_handles_extreme_values() {
    assert_eq!(improvement(Some(i32::MAX), Some(-1)), Some(100));
    assert_eq!(improvement(Some(i32::MIN), Some(i32::MAX)), Some(200));
    assert_eq!(improvement(Some(1), Some(i32::MIN)), Some(214_748_364_900));
  }

  #[test]
  fn chunks_respect_limit() {
    let text = "line one\nline two\nline three";
    let chunks = chunk_message(text, 10);
    assert!(chunks.iter().all(|c| c.len() <= 10));
    assert_eq!(chunks.join("\n"), text);
  }
}
