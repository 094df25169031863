//! Domain models: verse challenges, game modes, sources, and the display theme.

use serde::{Deserialize, Serialize};

/// Literal marker the provider uses to delimit gaps in the challenge string.
pub const GAP_MARKER: &str = "[...]";

/// Difficulty starts here on every new verse.
pub const DIFFICULTY_BASELINE: u8 = 1;
/// Hard upper bound on the "next level" escalation.
pub const DIFFICULTY_MAX: u8 = 3;

/// The mini-game the learner picked for the active verse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
  FillInTheBlanks,
  Scramble,
  MultipleChoice,
  FirstLetter,
  Reconstruct,
}

/// Where did the challenge come from?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeSource {
  Generated, // generated by the AI provider
  SeedBank,  // built-in seed verses
  LocalBank, // from user-provided TOML bank
}

/// One gap's multiple-choice material: the correct answer plus distractors.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultipleChoiceOption {
  pub answer: String,
  pub distractors: Vec<String>,
}

/// Core challenge structure, immutable once built and owned by a session
/// for the lifetime of one verse.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
  /// Canonical full verse text.
  #[serde(rename = "originalVerse")]
  pub original_verse: String,
  /// Citation string; opaque, never parsed.
  pub reference: String,
  /// Literal text fragments; gaps sit between consecutive fragments, so
  /// fragment count = answers count + 1 whenever answers is non-empty.
  #[serde(rename = "challengeTemplate")]
  pub challenge_template: Vec<String>,
  /// Words removed from the verse, one per gap, order-significant.
  pub answers: Vec<String>,
  /// Phrase fragments whose single-space join reconstructs the verse.
  #[serde(rename = "orderedChunks")]
  pub ordered_chunks: Vec<String>,
  /// Per-gap choice material, same length and order as `answers`.
  #[serde(rename = "multipleChoiceOptions")]
  pub multiple_choice_options: Vec<MultipleChoiceOption>,
  /// One leading letter per verse word, space-separated.
  #[serde(rename = "firstLetters")]
  pub first_letters: String,
  pub source: ChallengeSource,
}

/// Split a raw challenge string into template fragments on the gap marker.
pub fn split_template(challenge: &str) -> Vec<String> {
  challenge.split(GAP_MARKER).map(str::to_string).collect()
}

/// Two-valued display preference persisted across sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  Warm,
  Cool,
}

impl Default for Theme {
  fn default() -> Self {
    Theme::Warm
  }
}

impl Theme {
  pub fn toggled(self) -> Self {
    match self {
      Theme::Warm => Theme::Cool,
      Theme::Cool => Theme::Warm,
    }
  }
}
