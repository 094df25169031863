//! Answer verification for the five game modes.
//!
//! Free-text modes (first-letter recall, reconstruction) compare fully
//! normalized strings. Fill-in-the-blanks uses a narrower normalization
//! without whitespace collapsing, since gap answers are typically single
//! words. Scramble is exact string equality on the joined chunk order,
//! no normalization at all.

/// Punctuation stripped by both normalizers.
const STRIPPED_PUNCTUATION: [char; 6] = ['.', ',', ';', ':', '!', '?'];

/// Full normalization for free-text submissions: trim, lowercase, strip
/// punctuation (including double quotes), collapse whitespace runs.
pub fn normalize_text(text: &str) -> String {
  let stripped: String = text
    .trim()
    .to_lowercase()
    .chars()
    .filter(|c| !STRIPPED_PUNCTUATION.contains(c) && *c != '"')
    .collect();
  stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Narrow normalization for fill-in-the-blank entries: trim, lowercase,
/// strip punctuation. Whitespace inside the entry is left as typed.
pub fn normalize_blank(text: &str) -> String {
  text
    .trim()
    .to_lowercase()
    .chars()
    .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
    .collect()
}

/// Gap indices whose entry does not match the canonical answer.
/// Missing entries count as empty and therefore incorrect.
pub fn incorrect_blank_indices(answers: &[String], entries: &[String]) -> Vec<usize> {
  answers
    .iter()
    .enumerate()
    .filter(|(i, answer)| {
      let entry = entries.get(*i).map(String::as_str).unwrap_or("");
      normalize_blank(entry) != normalize_blank(answer)
    })
    .map(|(i, _)| i)
    .collect()
}

/// Scramble check: exact equality of the space-joined sequences.
pub fn chunk_order_matches(arranged: &[String], canonical: &[String]) -> bool {
  arranged.join(" ") == canonical.join(" ")
}

/// Full-verse recall check (first-letter and reconstruction modes).
pub fn recall_matches(submission: &str, original_verse: &str) -> bool {
  normalize_text(submission) == normalize_text(original_verse)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn normalization_is_idempotent() {
    for raw in [
      "  Vì Đức Chúa Trời   yêu thương \"thế gian\",  ",
      "Already normalized text",
      "",
      "nhiều   khoảng    trắng",
      "Dấu chấm. Dấu phẩy, chấm hỏi?",
    ] {
      let once = normalize_text(raw);
      assert_eq!(normalize_text(&once), once, "not idempotent for {:?}", raw);
    }
  }

  #[test]
  fn blank_normalization_is_idempotent() {
    for raw in ["  Yêu, ", "thế gian", "GHÉT!?"] {
      let once = normalize_blank(raw);
      assert_eq!(normalize_blank(&once), once);
    }
  }

  #[test]
  fn blanks_accept_case_and_punctuation_differences() {
    let answers = owned(&["yêu", "thế gian"]);
    let entries = owned(&["Yêu", "Thế Gian"]);
    assert!(incorrect_blank_indices(&answers, &entries).is_empty());
  }

  #[test]
  fn blanks_report_exactly_the_wrong_indices() {
    let answers = owned(&["yêu", "thế gian"]);
    let entries = owned(&["ghét", "thế gian"]);
    assert_eq!(incorrect_blank_indices(&answers, &entries), vec![0]);
  }

  #[test]
  fn blanks_treat_missing_entries_as_incorrect() {
    let answers = owned(&["yêu", "thế gian"]);
    assert_eq!(incorrect_blank_indices(&answers, &owned(&["yêu"])), vec![1]);
  }

  #[test]
  fn blank_normalization_keeps_inner_whitespace() {
    // The narrow form must NOT collapse runs; "thế  gian" stays distinct.
    let answers = owned(&["thế gian"]);
    let entries = owned(&["thế  gian"]);
    assert_eq!(incorrect_blank_indices(&answers, &entries), vec![0]);
  }

  #[test]
  fn chunk_order_requires_exact_sequence() {
    let canonical = owned(&["Vì", "Đức Chúa Trời", "yêu", "thế gian"]);
    let permuted = owned(&["Đức Chúa Trời", "Vì", "yêu", "thế gian"]);
    assert!(chunk_order_matches(&canonical, &canonical));
    assert!(!chunk_order_matches(&permuted, &canonical));
  }

  #[test]
  fn recall_collapses_whitespace_and_strips_quotes() {
    let verse = "Ban đầu, Đức Chúa Trời dựng nên trời đất.";
    assert!(recall_matches("ban đầu đức chúa trời   dựng nên \"trời đất\"", verse));
    assert!(!recall_matches("ban đầu đức chúa trời dựng nên đất trời", verse));
  }
}
