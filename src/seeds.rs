//! Built-in verse bank and the local challenge builder.
//!
//! The bank keeps the trainer usable when no provider is configured: a
//! freeform query is matched against references and keywords, and a full
//! challenge is derived locally at the requested difficulty. The same
//! builder serves TOML-configured bank verses.

use std::collections::HashSet;

use rand::seq::SliceRandom;

use crate::domain::{split_template, Challenge, ChallengeSource, MultipleChoiceOption, GAP_MARKER};
use crate::verify;

/// One verse the backend can turn into a challenge without the provider.
#[derive(Clone, Debug)]
pub struct BankVerse {
  pub reference: String,
  pub verse: String,
  pub keywords: Vec<String>,
  pub source: ChallengeSource,
}

fn seed(reference: &str, verse: &str, keywords: &[&str]) -> BankVerse {
  BankVerse {
    reference: reference.to_string(),
    verse: verse.to_string(),
    keywords: keywords.iter().map(|k| k.to_string()).collect(),
    source: ChallengeSource::SeedBank,
  }
}

/// Minimal set of built-in verses that guarantee the trainer is useful
/// even without external config or a provider key.
pub fn seed_verses() -> Vec<BankVerse> {
  vec![
    seed(
      "Giăng 3:16",
      "Vì Đức Chúa Trời yêu thương thế gian, đến nỗi đã ban Con một của Ngài, hầu cho hễ ai tin Con ấy không bị hư mất mà được sự sống đời đời.",
      &["giăng 3:16", "john 3:16", "tình yêu", "yêu thương"],
    ),
    seed(
      "Thi-thiên 23:1",
      "Đức Giê-hô-va là Đấng chăn giữ tôi; tôi sẽ chẳng thiếu thốn gì.",
      &["thi-thiên 23:1", "psalm 23", "người chăn"],
    ),
    seed(
      "Phi-líp 4:13",
      "Tôi làm được mọi sự nhờ Đấng ban thêm sức cho tôi.",
      &["phi-líp 4:13", "philippians 4:13", "sức mạnh"],
    ),
    seed(
      "Sáng-thế Ký 1:1",
      "Ban đầu Đức Chúa Trời dựng nên trời đất.",
      &["sáng-thế ký 1:1", "genesis 1:1", "sáng tạo"],
    ),
    seed(
      "Giăng 14:6",
      "Vậy Đức Chúa Jêsus đáp rằng: Ta là đường đi, lẽ thật, và sự sống; chẳng bởi ta thì không ai được đến cùng Cha.",
      &["giăng 14:6", "john 14:6", "đường đi", "lẽ thật"],
    ),
  ]
}

/// Share of verse words blanked per difficulty level. The provider prompt
/// and the local builder honor the same shares.
pub fn blank_share(difficulty: u8) -> f32 {
  match difficulty {
    2 => 0.40,
    3 => 0.60,
    _ => 0.25,
  }
}

/// Match a freeform query against the bank by reference or keyword.
pub fn find_bank_verse<'a>(bank: &'a [BankVerse], query: &str) -> Option<&'a BankVerse> {
  let q = query.trim().to_lowercase();
  if q.is_empty() {
    return None;
  }
  bank.iter().find(|v| {
    let r = v.reference.to_lowercase();
    r == q || r.contains(&q) || q.contains(&r) || v.keywords.iter().any(|k| q.contains(k.as_str()))
  })
}

/// Derive a full challenge from a bank verse at the given difficulty.
///
/// Blanks are spread evenly across the verse words; distractors are drawn
/// from the other removed words first, padded from the remaining verse
/// words. Chunking targets the 5-8 phrase range for typical verse lengths.
pub fn build_local_challenge(entry: &BankVerse, difficulty: u8) -> Challenge {
  let words: Vec<&str> = entry.verse.split_whitespace().collect();
  if words.is_empty() {
    // Callers validate bank entries; an empty verse still must not panic.
    return Challenge {
      original_verse: entry.verse.clone(),
      reference: entry.reference.clone(),
      challenge_template: vec![String::new()],
      answers: Vec::new(),
      ordered_chunks: Vec::new(),
      multiple_choice_options: Vec::new(),
      first_letters: String::new(),
      source: entry.source,
    };
  }
  let n = words.len();
  let blank_count = ((n as f32 * blank_share(difficulty)).round() as usize)
    .clamp(1, n.saturating_sub(1).max(1));
  let gap_indices: Vec<usize> = (0..blank_count).map(|j| j * n / blank_count).collect();

  let answers: Vec<String> = gap_indices.iter().map(|&i| words[i].to_string()).collect();

  let raw_challenge = words
    .iter()
    .enumerate()
    .map(|(i, w)| if gap_indices.contains(&i) { GAP_MARKER } else { *w })
    .collect::<Vec<_>>()
    .join(" ");

  let chunk_count = (n / 3).max(2).min(8).min(n);
  let chunk_size = (n + chunk_count - 1) / chunk_count;
  let ordered_chunks: Vec<String> = words.chunks(chunk_size).map(|c| c.join(" ")).collect();

  let mut rng = rand::thread_rng();
  let multiple_choice_options = answers
    .iter()
    .map(|answer| {
      let mut seen = HashSet::new();
      seen.insert(verify::normalize_blank(answer));
      let mut candidates: Vec<&str> = Vec::new();
      for word in answers.iter().map(String::as_str).chain(words.iter().copied()) {
        let key = verify::normalize_blank(word);
        if key.is_empty() || !seen.insert(key) {
          continue;
        }
        candidates.push(word);
      }
      candidates.shuffle(&mut rng);
      MultipleChoiceOption {
        answer: answer.clone(),
        distractors: candidates.into_iter().take(3).map(str::to_string).collect(),
      }
    })
    .collect();

  let first_letters = words
    .iter()
    .filter_map(|w| w.chars().next())
    .map(|c| c.to_string())
    .collect::<Vec<_>>()
    .join(" ");

  Challenge {
    original_verse: entry.verse.clone(),
    reference: entry.reference.clone(),
    challenge_template: split_template(&raw_challenge),
    answers,
    ordered_chunks,
    multiple_choice_options,
    first_letters,
    source: entry.source,
  }
}
