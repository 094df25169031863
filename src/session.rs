//! Per-connection session state machine.
//!
//! The screen is a sum type: each variant carries only the data that screen
//! needs, so states like "scramble screen with mode-selection data" cannot
//! be represented. A provider fetch is pending exactly while the screen is
//! `Loading`; every other fetch-starting action is rejected, which enforces
//! the single-outstanding-call rule structurally instead of by UI
//! disablement.

use rand::seq::SliceRandom;
use tracing::{info, warn};

use crate::domain::{Challenge, GameMode, DIFFICULTY_BASELINE, DIFFICULTY_MAX};
use crate::verify;

/// Fixed user-facing message when the provider cannot supply a verse.
pub const FETCH_FALLBACK_MESSAGE: &str =
  "Sorry, that verse could not be found. Please try another reference or topic.";
/// Shown on the kept success result when a next-level fetch fails.
pub const NEXT_LEVEL_FALLBACK_MESSAGE: &str =
  "Could not raise the difficulty any further. Try a new verse!";

#[derive(Clone, Debug, PartialEq)]
pub enum Screen {
  Welcome {
    error: Option<String>,
  },
  Loading,
  LearningPlan,
  Memorize,
  ModeSelection,
  /// Fill-in-the-blank round.
  Challenge {
    entries: Vec<String>,
    incorrect: Vec<usize>,
    verdict: Option<bool>,
  },
  Scramble {
    pool: Vec<String>,
    arranged: Vec<String>,
    verdict: Option<bool>,
  },
  MultipleChoice {
    gap: usize,
    chosen: Vec<Option<String>>,
    /// Shuffled options for the active gap; redrawn on gap entry, stable
    /// across wrong picks.
    options: Vec<String>,
    wrong_pick: bool,
  },
  FirstLetter {
    verdict: Option<bool>,
  },
  Reconstruct {
    /// Failed submission, kept for side-by-side display. The first-letter
    /// mode deliberately does not retain its failed submission.
    submission: Option<String>,
    verdict: Option<bool>,
  },
  Result {
    mode: GameMode,
    success: bool,
    notice: Option<String>,
  },
}

/// Why the session is waiting on the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FetchKind {
  Initial,
  NextLevel,
}

/// A provider request the caller must run while the session shows `Loading`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
  pub query: String,
  pub difficulty: u8,
}

pub struct Session {
  screen: Screen,
  challenge: Option<Challenge>,
  difficulty: u8,
  last_input: String,
  plan_day: Option<u32>,
  pending: Option<FetchKind>,
}

impl Default for Session {
  fn default() -> Self {
    Self::new()
  }
}

impl Session {
  pub fn new() -> Self {
    Self {
      screen: Screen::Welcome { error: None },
      challenge: None,
      difficulty: DIFFICULTY_BASELINE,
      last_input: String::new(),
      plan_day: None,
      pending: None,
    }
  }

  pub fn screen(&self) -> &Screen {
    &self.screen
  }

  pub fn challenge(&self) -> Option<&Challenge> {
    self.challenge.as_ref()
  }

  pub fn difficulty(&self) -> u8 {
    self.difficulty
  }

  pub fn plan_day(&self) -> Option<u32> {
    self.plan_day
  }

  /// Welcome/LearningPlan -> Loading. Returns the provider request to run.
  pub fn start_verse(&mut self, input: &str, plan_day: Option<u32>) -> Result<FetchRequest, String> {
    if self.pending.is_some() {
      return Err("a verse is already being fetched".into());
    }
    if !matches!(self.screen, Screen::Welcome { .. } | Screen::LearningPlan) {
      return Err("starting a verse is only available from the welcome and plan screens".into());
    }
    if input.trim().is_empty() {
      return Err("please enter a verse reference or topic".into());
    }

    self.challenge = None;
    self.difficulty = DIFFICULTY_BASELINE;
    self.last_input = input.to_string();
    self.plan_day = plan_day;
    self.pending = Some(FetchKind::Initial);
    self.screen = Screen::Loading;
    info!(target: "session", plan_day = ?plan_day, "Verse fetch started");
    Ok(FetchRequest { query: input.to_string(), difficulty: DIFFICULTY_BASELINE })
  }

  /// Result(success, fill-in-the-blanks) -> Loading at difficulty + 1.
  /// The difficulty itself is only bumped once the fetch resolves.
  pub fn next_level(&mut self) -> Result<FetchRequest, String> {
    if self.pending.is_some() {
      return Err("a verse is already being fetched".into());
    }
    if !matches!(
      self.screen,
      Screen::Result { mode: GameMode::FillInTheBlanks, success: true, .. }
    ) {
      return Err("next level is only offered after a solved fill-in-the-blank round".into());
    }
    if !self.can_next_level() {
      return Err("this verse is too short for a harder round".into());
    }
    if self.last_input.trim().is_empty() {
      return Err("no previous request to raise the difficulty for".into());
    }

    self.pending = Some(FetchKind::NextLevel);
    self.screen = Screen::Loading;
    info!(target: "session", difficulty = self.difficulty + 1, "Next-level fetch started");
    Ok(FetchRequest { query: self.last_input.clone(), difficulty: self.difficulty + 1 })
  }

  /// Only offered while the current difficulty can still escalate AND the
  /// verse has enough gaps to support more blanks.
  pub fn can_next_level(&self) -> bool {
    match (&self.challenge, &self.screen) {
      (Some(ch), Screen::Result { mode: GameMode::FillInTheBlanks, success: true, .. }) => {
        self.difficulty < DIFFICULTY_MAX && ch.answers.len() > (self.difficulty as usize) * 2
      }
      _ => false,
    }
  }

  /// Loading -> Memorize.
  pub fn resolve_fetch(&mut self, challenge: Challenge) {
    let Some(kind) = self.pending.take() else {
      warn!(target: "session", "Fetch resolution without a pending fetch; ignoring");
      return;
    };
    if kind == FetchKind::NextLevel {
      self.difficulty += 1;
    }
    info!(target: "session", reference = %challenge.reference, difficulty = self.difficulty, "Challenge ready");
    self.challenge = Some(challenge);
    self.screen = Screen::Memorize;
  }

  /// Loading -> Welcome with the fixed fallback message. A failed
  /// next-level fetch instead returns to the kept success result with a
  /// notice, so the solved round is not lost.
  pub fn fail_fetch(&mut self) {
    let Some(kind) = self.pending.take() else {
      warn!(target: "session", "Fetch failure without a pending fetch; ignoring");
      return;
    };
    match kind {
      FetchKind::Initial => {
        self.challenge = None;
        self.screen = Screen::Welcome { error: Some(FETCH_FALLBACK_MESSAGE.into()) };
      }
      FetchKind::NextLevel => {
        self.screen = Screen::Result {
          mode: GameMode::FillInTheBlanks,
          success: true,
          notice: Some(NEXT_LEVEL_FALLBACK_MESSAGE.into()),
        };
      }
    }
  }

  /// Welcome -> LearningPlan.
  pub fn open_plan(&mut self) -> Result<(), String> {
    if !matches!(self.screen, Screen::Welcome { .. }) {
      return Err("the learning plan opens from the welcome screen".into());
    }
    self.screen = Screen::LearningPlan;
    Ok(())
  }

  /// Memorize -> ModeSelection.
  pub fn ready(&mut self) -> Result<(), String> {
    if !matches!(self.screen, Screen::Memorize) {
      return Err("not on the memorize screen".into());
    }
    if self.challenge.is_none() {
      self.fail_safe_welcome("mode selection");
      return Ok(());
    }
    self.screen = Screen::ModeSelection;
    Ok(())
  }

  /// ModeSelection -> the picked game screen.
  pub fn select_mode(&mut self, mode: GameMode) -> Result<(), String> {
    if !matches!(self.screen, Screen::ModeSelection) {
      return Err("not on the mode selection screen".into());
    }
    self.enter_mode(mode);
    Ok(())
  }

  /// Grade a fill-in-the-blank submission. Returns the plan day to mark
  /// complete when the round is solved for a plan verse.
  pub fn submit_blanks(&mut self, entries: Vec<String>) -> Result<Option<u32>, String> {
    if !matches!(self.screen, Screen::Challenge { verdict: None, .. }) {
      return Err("not awaiting a fill-in-the-blank submission".into());
    }
    let Some(challenge) = self.challenge.as_ref() else {
      self.fail_safe_welcome("fill-in-the-blank submission");
      return Ok(None);
    };

    let incorrect = verify::incorrect_blank_indices(&challenge.answers, &entries);
    if incorrect.is_empty() {
      info!(target: "session", reference = %challenge.reference, "Fill-in-the-blank round solved");
      self.screen =
        Screen::Result { mode: GameMode::FillInTheBlanks, success: true, notice: None };
      Ok(self.plan_day)
    } else {
      info!(target: "session", wrong_gaps = incorrect.len(), "Fill-in-the-blank submission incorrect");
      self.screen = Screen::Challenge { entries, incorrect, verdict: Some(false) };
      Ok(None)
    }
  }

  /// Move a chunk from the pool into the arranged sequence (appended).
  pub fn scramble_pick(&mut self, index: usize) -> Result<(), String> {
    let Screen::Scramble { pool, arranged, verdict: None } = &mut self.screen else {
      return Err("not arranging chunks".into());
    };
    if index >= pool.len() {
      return Err("chunk index out of range".into());
    }
    arranged.push(pool.remove(index));
    Ok(())
  }

  /// Move a chunk back from the arranged sequence to the pool.
  pub fn scramble_unpick(&mut self, index: usize) -> Result<(), String> {
    let Screen::Scramble { pool, arranged, verdict: None } = &mut self.screen else {
      return Err("not arranging chunks".into());
    };
    if index >= arranged.len() {
      return Err("chunk index out of range".into());
    }
    pool.push(arranged.remove(index));
    Ok(())
  }

  /// Grade the arranged chunk order. Only available once the pool is empty.
  pub fn scramble_check(&mut self) -> Result<(), String> {
    let Some(challenge) = self.challenge.as_ref() else {
      self.fail_safe_welcome("scramble check");
      return Ok(());
    };
    let canonical = challenge.ordered_chunks.clone();

    let mut solved = false;
    {
      let Screen::Scramble { pool, arranged, verdict } = &mut self.screen else {
        return Err("not arranging chunks".into());
      };
      if verdict.is_some() {
        return Err("already checked; retry first".into());
      }
      if !pool.is_empty() {
        return Err("place every chunk before checking".into());
      }
      if verify::chunk_order_matches(arranged, &canonical) {
        solved = true;
      } else {
        *verdict = Some(false);
      }
    }
    if solved {
      self.screen = Screen::Result { mode: GameMode::Scramble, success: true, notice: None };
    }
    Ok(())
  }

  /// Resolve one multiple-choice pick for the active gap. A correct pick
  /// advances (or finalizes on the last gap); a wrong pick is not recorded
  /// and leaves the gap active.
  pub fn choose_option(&mut self, option: &str) -> Result<(), String> {
    let Some(challenge) = self.challenge.as_ref() else {
      self.fail_safe_welcome("multiple choice pick");
      return Ok(());
    };
    let gap_material = challenge.multiple_choice_options.clone();

    let mut finish: Option<bool> = None;
    {
      let Screen::MultipleChoice { gap, chosen, options, wrong_pick } = &mut self.screen else {
        return Err("not on the multiple choice screen".into());
      };
      let Some(current) = gap_material.get(*gap) else {
        return Err("no active gap".into());
      };
      if option == current.answer {
        chosen[*gap] = Some(option.to_string());
        *wrong_pick = false;
        if *gap + 1 < gap_material.len() {
          *gap += 1;
          *options = shuffled_gap_options(&gap_material[*gap]);
        } else {
          // Advance-only-on-correct makes this always true; the check
          // guards against inconsistent recorded state.
          let all_correct = chosen
            .iter()
            .zip(gap_material.iter())
            .all(|(c, o)| c.as_deref() == Some(o.answer.as_str()));
          if !all_correct {
            warn!(target: "session", "Multiple choice finished with inconsistent recorded answers");
          }
          finish = Some(all_correct);
        }
      } else {
        *wrong_pick = true;
      }
    }
    if let Some(success) = finish {
      self.screen = Screen::Result { mode: GameMode::MultipleChoice, success, notice: None };
    }
    Ok(())
  }

  /// Grade a full-verse recall submission (first-letter or reconstruction).
  pub fn submit_recall(&mut self, text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
      return Err("please type the verse before checking".into());
    }
    let mode = match &self.screen {
      Screen::FirstLetter { verdict: None } => GameMode::FirstLetter,
      Screen::Reconstruct { verdict: None, .. } => GameMode::Reconstruct,
      _ => return Err("not awaiting a recall submission".into()),
    };
    let Some(challenge) = self.challenge.as_ref() else {
      self.fail_safe_welcome("recall submission");
      return Ok(());
    };

    if verify::recall_matches(text, &challenge.original_verse) {
      self.screen = Screen::Result { mode, success: true, notice: None };
    } else if mode == GameMode::FirstLetter {
      self.screen = Screen::FirstLetter { verdict: Some(false) };
    } else {
      self.screen =
        Screen::Reconstruct { submission: Some(text.to_string()), verdict: Some(false) };
    }
    Ok(())
  }

  /// Clear a failed round and re-enter the same mode; the challenge data
  /// is left untouched.
  pub fn try_again(&mut self) -> Result<(), String> {
    let mode = match &self.screen {
      Screen::Challenge { verdict: Some(false), .. } => GameMode::FillInTheBlanks,
      Screen::Scramble { verdict: Some(false), .. } => GameMode::Scramble,
      Screen::FirstLetter { verdict: Some(false) } => GameMode::FirstLetter,
      Screen::Reconstruct { verdict: Some(false), .. } => GameMode::Reconstruct,
      Screen::Result { success: false, mode, .. } => *mode,
      _ => return Err("nothing to retry on this screen".into()),
    };
    self.enter_mode(mode);
    Ok(())
  }

  /// Reset the whole session and return to the welcome screen.
  pub fn new_verse(&mut self) -> Result<(), String> {
    if self.pending.is_some() {
      return Err("a verse is being fetched".into());
    }
    self.challenge = None;
    self.difficulty = DIFFICULTY_BASELINE;
    self.last_input.clear();
    self.plan_day = None;
    self.screen = Screen::Welcome { error: None };
    Ok(())
  }

  fn enter_mode(&mut self, mode: GameMode) {
    let Some(challenge) = self.challenge.as_ref() else {
      warn!(target: "session", ?mode, "Game screen requested without challenge data; redirecting to welcome");
      self.screen = Screen::Welcome { error: None };
      return;
    };
    self.screen = match mode {
      GameMode::FillInTheBlanks => Screen::Challenge {
        entries: vec![String::new(); challenge.answers.len()],
        incorrect: Vec::new(),
        verdict: None,
      },
      GameMode::Scramble => Screen::Scramble {
        pool: shuffled_chunk_pool(&challenge.ordered_chunks),
        arranged: Vec::new(),
        verdict: None,
      },
      GameMode::MultipleChoice => {
        let options = challenge
          .multiple_choice_options
          .first()
          .map(shuffled_gap_options)
          .unwrap_or_default();
        Screen::MultipleChoice {
          gap: 0,
          chosen: vec![None; challenge.multiple_choice_options.len()],
          options,
          wrong_pick: false,
        }
      }
      GameMode::FirstLetter => Screen::FirstLetter { verdict: None },
      GameMode::Reconstruct => Screen::Reconstruct { submission: None, verdict: None },
    };
  }

  fn fail_safe_welcome(&mut self, action: &str) {
    warn!(target: "session", action, "Challenge data missing; redirecting to welcome");
    self.challenge = None;
    self.screen = Screen::Welcome { error: None };
  }
}

/// The offered pool is the canonical multiset, reordered. The shuffle is
/// redrawn until it differs from the canonical order whenever a differing
/// arrangement is feasible.
fn shuffled_chunk_pool(chunks: &[String]) -> Vec<String> {
  let mut pool: Vec<String> = chunks.to_vec();
  let mut rng = rand::thread_rng();
  let feasible = pool.len() >= 2 && pool.iter().any(|c| c != &pool[0]);
  for _ in 0..32 {
    pool.shuffle(&mut rng);
    if !feasible || pool != chunks {
      break;
    }
  }
  pool
}

/// Options for one gap: the correct answer plus its distractors, shuffled.
fn shuffled_gap_options(material: &crate::domain::MultipleChoiceOption) -> Vec<String> {
  let mut options = Vec::with_capacity(1 + material.distractors.len());
  options.push(material.answer.clone());
  options.extend(material.distractors.iter().cloned());
  options.shuffle(&mut rand::thread_rng());
  options
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{ChallengeSource, MultipleChoiceOption};

  fn fixture(answers: &[&str]) -> Challenge {
    let template: Vec<String> = (0..=answers.len()).map(|i| format!("fragment{} ", i)).collect();
    Challenge {
      original_verse: "Vì Đức Chúa Trời yêu thế gian".into(),
      reference: "Giăng 3:16".into(),
      challenge_template: template,
      answers: answers.iter().map(|s| s.to_string()).collect(),
      ordered_chunks: vec![
        "Vì".into(),
        "Đức Chúa Trời".into(),
        "yêu".into(),
        "thế gian".into(),
      ],
      multiple_choice_options: answers
        .iter()
        .map(|a| MultipleChoiceOption {
          answer: a.to_string(),
          distractors: vec!["ghét".into(), "bỏ qua".into()],
        })
        .collect(),
      first_letters: "V Đ C T y t g".into(),
      source: ChallengeSource::SeedBank,
    }
  }

  fn session_at_mode_selection(answers: &[&str], plan_day: Option<u32>) -> Session {
    let mut s = Session::new();
    let req = s.start_verse("Giăng 3:16", plan_day).expect("fetch starts");
    assert_eq!(req.difficulty, DIFFICULTY_BASELINE);
    assert!(matches!(s.screen(), Screen::Loading));
    s.resolve_fetch(fixture(answers));
    assert!(matches!(s.screen(), Screen::Memorize));
    s.ready().expect("memorize -> mode selection");
    s
  }

  fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn provider_failure_lands_on_welcome_with_message() {
    let mut s = Session::new();
    s.start_verse("not in any bank", None).expect("fetch starts");
    s.fail_fetch();
    match s.screen() {
      Screen::Welcome { error: Some(msg) } => assert!(!msg.is_empty()),
      other => panic!("expected welcome with error, got {:?}", other),
    }
  }

  #[test]
  fn second_fetch_is_rejected_while_one_is_pending() {
    let mut s = Session::new();
    s.start_verse("Giăng 3:16", None).expect("fetch starts");
    assert!(s.start_verse("Giăng 3:16", None).is_err());
  }

  #[test]
  fn empty_input_is_rejected_at_the_boundary() {
    let mut s = Session::new();
    assert!(s.start_verse("   ", None).is_err());
    assert!(matches!(s.screen(), Screen::Welcome { .. }));
  }

  #[test]
  fn blanks_solve_with_case_and_punctuation_differences() {
    let mut s = session_at_mode_selection(&["yêu", "thế gian"], Some(3));
    s.select_mode(GameMode::FillInTheBlanks).expect("mode entered");
    let completed = s.submit_blanks(owned(&["Yêu", "Thế Gian"])).expect("graded");
    assert_eq!(completed, Some(3));
    assert!(matches!(
      s.screen(),
      Screen::Result { mode: GameMode::FillInTheBlanks, success: true, notice: None }
    ));
  }

  #[test]
  fn blanks_partial_failure_reports_only_the_wrong_gap() {
    let mut s = session_at_mode_selection(&["yêu", "thế gian"], None);
    s.select_mode(GameMode::FillInTheBlanks).expect("mode entered");
    let completed = s.submit_blanks(owned(&["ghét", "thế gian"])).expect("graded");
    assert_eq!(completed, None);
    match s.screen() {
      Screen::Challenge { incorrect, verdict, entries } => {
        assert_eq!(incorrect, &vec![0]);
        assert_eq!(verdict, &Some(false));
        assert_eq!(entries, &owned(&["ghét", "thế gian"]));
      }
      other => panic!("expected challenge screen, got {:?}", other),
    }
    // A second submission requires an explicit retry first.
    assert!(s.submit_blanks(owned(&["yêu", "thế gian"])).is_err());
    s.try_again().expect("retry clears the round");
    match s.screen() {
      Screen::Challenge { incorrect, verdict, entries } => {
        assert!(incorrect.is_empty());
        assert!(verdict.is_none());
        assert!(entries.iter().all(String::is_empty));
      }
      other => panic!("expected reset challenge screen, got {:?}", other),
    }
  }

  #[test]
  fn scramble_requires_exact_canonical_order() {
    let mut s = session_at_mode_selection(&["yêu"], None);
    s.select_mode(GameMode::Scramble).expect("mode entered");
    let canonical = s.challenge().expect("challenge present").ordered_chunks.clone();

    // Arrange in reverse order: wrong.
    for chunk in canonical.iter().rev() {
      let index = match s.screen() {
        Screen::Scramble { pool, .. } => pool.iter().position(|c| c == chunk).expect("chunk in pool"),
        other => panic!("expected scramble screen, got {:?}", other),
      };
      s.scramble_pick(index).expect("pick");
    }
    s.scramble_check().expect("check runs");
    assert!(matches!(s.screen(), Screen::Scramble { verdict: Some(false), .. }));

    // Retry, then arrange canonically: correct.
    s.try_again().expect("retry");
    for chunk in &canonical {
      let index = match s.screen() {
        Screen::Scramble { pool, .. } => pool.iter().position(|c| c == chunk).expect("chunk in pool"),
        other => panic!("expected scramble screen, got {:?}", other),
      };
      s.scramble_pick(index).expect("pick");
    }
    s.scramble_check().expect("check runs");
    assert!(matches!(s.screen(), Screen::Result { mode: GameMode::Scramble, success: true, .. }));
  }

  #[test]
  fn scramble_keeps_the_canonical_multiset_and_gates_on_empty_pool() {
    let mut s = session_at_mode_selection(&["yêu"], None);
    s.select_mode(GameMode::Scramble).expect("mode entered");
    let mut canonical = s.challenge().expect("challenge present").ordered_chunks.clone();
    canonical.sort();

    // Checking with chunks still in the pool is rejected.
    assert!(s.scramble_check().is_err());

    s.scramble_pick(0).expect("pick");
    match s.screen() {
      Screen::Scramble { pool, arranged, .. } => {
        let mut offered: Vec<String> = pool.iter().chain(arranged.iter()).cloned().collect();
        offered.sort();
        assert_eq!(offered, canonical);
      }
      other => panic!("expected scramble screen, got {:?}", other),
    }

    // Unpick returns the chunk to the pool.
    s.scramble_unpick(0).expect("unpick");
    match s.screen() {
      Screen::Scramble { pool, arranged, .. } => {
        assert_eq!(pool.len(), canonical.len());
        assert!(arranged.is_empty());
      }
      other => panic!("expected scramble screen, got {:?}", other),
    }
  }

  #[test]
  fn multiple_choice_advances_only_on_correct_picks() {
    let mut s = session_at_mode_selection(&["yêu", "thế gian"], None);
    s.select_mode(GameMode::MultipleChoice).expect("mode entered");

    // Wrong pick: gap stays active, nothing recorded, hint flagged.
    s.choose_option("ghét").expect("pick handled");
    match s.screen() {
      Screen::MultipleChoice { gap, chosen, wrong_pick, .. } => {
        assert_eq!(*gap, 0);
        assert!(chosen.iter().all(Option::is_none));
        assert!(wrong_pick);
      }
      other => panic!("expected multiple choice screen, got {:?}", other),
    }

    // Correct pick advances and records.
    s.choose_option("yêu").expect("pick handled");
    match s.screen() {
      Screen::MultipleChoice { gap, chosen, wrong_pick, options } => {
        assert_eq!(*gap, 1);
        assert_eq!(chosen[0].as_deref(), Some("yêu"));
        assert!(!wrong_pick);
        assert!(options.contains(&"thế gian".to_string()));
      }
      other => panic!("expected multiple choice screen, got {:?}", other),
    }

    // Last gap correct finalizes.
    s.choose_option("thế gian").expect("pick handled");
    assert!(matches!(
      s.screen(),
      Screen::Result { mode: GameMode::MultipleChoice, success: true, .. }
    ));
  }

  #[test]
  fn first_letter_failure_keeps_no_submission() {
    let mut s = session_at_mode_selection(&["yêu"], None);
    s.select_mode(GameMode::FirstLetter).expect("mode entered");
    s.submit_recall("một câu hoàn toàn khác").expect("graded");
    assert!(matches!(s.screen(), Screen::FirstLetter { verdict: Some(false) }));
  }

  #[test]
  fn reconstruct_failure_retains_the_submission() {
    let mut s = session_at_mode_selection(&["yêu"], None);
    s.select_mode(GameMode::Reconstruct).expect("mode entered");
    s.submit_recall("một câu hoàn toàn khác").expect("graded");
    match s.screen() {
      Screen::Reconstruct { submission, verdict } => {
        assert_eq!(submission.as_deref(), Some("một câu hoàn toàn khác"));
        assert_eq!(verdict, &Some(false));
      }
      other => panic!("expected reconstruct screen, got {:?}", other),
    }
    s.try_again().expect("retry");
    assert!(matches!(s.screen(), Screen::Reconstruct { submission: None, verdict: None }));
  }

  #[test]
  fn recall_solves_with_normalized_text() {
    let mut s = session_at_mode_selection(&["yêu"], None);
    s.select_mode(GameMode::Reconstruct).expect("mode entered");
    assert!(s.submit_recall("  ").is_err());
    s.submit_recall("vì đức chúa trời   YÊU thế gian!").expect("graded");
    assert!(matches!(
      s.screen(),
      Screen::Result { mode: GameMode::Reconstruct, success: true, .. }
    ));
  }

  #[test]
  fn next_level_gating_tracks_gap_count_and_difficulty() {
    // 4 gaps at difficulty 1: 4 > 2, allowed.
    let mut s = session_at_mode_selection(&["a", "b", "c", "d"], None);
    s.select_mode(GameMode::FillInTheBlanks).expect("mode entered");
    s.submit_blanks(owned(&["a", "b", "c", "d"])).expect("graded");
    assert!(s.can_next_level());

    // 2 gaps at difficulty 1: 2 > 2 is false, gated off.
    let mut s = session_at_mode_selection(&["yêu", "thế gian"], None);
    s.select_mode(GameMode::FillInTheBlanks).expect("mode entered");
    s.submit_blanks(owned(&["yêu", "thế gian"])).expect("graded");
    assert!(!s.can_next_level());
    assert!(s.next_level().is_err());
  }

  #[test]
  fn next_level_resolve_bumps_difficulty_and_memorizes() {
    let mut s = session_at_mode_selection(&["a", "b", "c", "d"], None);
    s.select_mode(GameMode::FillInTheBlanks).expect("mode entered");
    s.submit_blanks(owned(&["a", "b", "c", "d"])).expect("graded");

    let req = s.next_level().expect("next level starts");
    assert_eq!(req.difficulty, 2);
    assert_eq!(s.difficulty(), 1, "difficulty bumps only on resolve");
    s.resolve_fetch(fixture(&["a", "b", "c", "d", "e"]));
    assert_eq!(s.difficulty(), 2);
    assert!(matches!(s.screen(), Screen::Memorize));
  }

  #[test]
  fn next_level_failure_keeps_the_success_result_with_a_notice() {
    let mut s = session_at_mode_selection(&["a", "b", "c", "d"], None);
    s.select_mode(GameMode::FillInTheBlanks).expect("mode entered");
    s.submit_blanks(owned(&["a", "b", "c", "d"])).expect("graded");

    s.next_level().expect("next level starts");
    s.fail_fetch();
    match s.screen() {
      Screen::Result { mode: GameMode::FillInTheBlanks, success: true, notice: Some(msg) } => {
        assert!(!msg.is_empty());
      }
      other => panic!("expected kept success result, got {:?}", other),
    }
    assert_eq!(s.difficulty(), 1);
  }

  #[test]
  fn new_verse_resets_the_whole_session() {
    let mut s = session_at_mode_selection(&["a", "b", "c", "d"], Some(7));
    s.select_mode(GameMode::FillInTheBlanks).expect("mode entered");
    s.submit_blanks(owned(&["a", "b", "c", "d"])).expect("graded");

    s.new_verse().expect("reset");
    assert!(matches!(s.screen(), Screen::Welcome { error: None }));
    assert!(s.challenge().is_none());
    assert_eq!(s.difficulty(), DIFFICULTY_BASELINE);
    assert_eq!(s.plan_day(), None);
  }

  #[test]
  fn game_screen_without_challenge_redirects_to_welcome() {
    let mut s = Session::new();
    s.screen = Screen::ModeSelection;
    s.select_mode(GameMode::Scramble).expect("handled");
    assert!(matches!(s.screen(), Screen::Welcome { error: None }));
  }

  #[test]
  fn plan_flow_carries_the_day_through_loading() {
    let mut s = Session::new();
    s.open_plan().expect("plan opens");
    assert!(matches!(s.screen(), Screen::LearningPlan));
    s.start_verse("Giăng 3:16", Some(3)).expect("fetch starts");
    assert_eq!(s.plan_day(), Some(3));
  }

  #[test]
  fn scramble_shuffle_differs_from_canonical_when_feasible() {
    let chunks = owned(&["Vì", "Đức Chúa Trời", "yêu", "thế gian"]);
    for _ in 0..8 {
      let pool = shuffled_chunk_pool(&chunks);
      assert_ne!(pool, chunks);
      let mut sorted_pool = pool.clone();
      let mut sorted_canonical = chunks.clone();
      sorted_pool.sort();
      sorted_canonical.sort();
      assert_eq!(sorted_pool, sorted_canonical);
    }
    // Degenerate pools are allowed to match.
    let single = owned(&["một"]);
    assert_eq!(shuffled_chunk_pool(&single), single);
  }
}
