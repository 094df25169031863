//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{GameMode, Theme};
use crate::plan;
use crate::session::{Screen, Session};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  StartVerse {
    input: String,
    #[serde(default, rename = "planDay")]
    plan_day: Option<u32>,
  },
  OpenPlan,
  SelectPlanDay {
    day: u32,
  },
  Ready,
  SelectMode {
    mode: GameMode,
  },
  SubmitBlanks {
    entries: Vec<String>,
  },
  ScramblePick {
    index: usize,
  },
  ScrambleUnpick {
    index: usize,
  },
  ScrambleCheck,
  ChooseOption {
    option: String,
  },
  SubmitRecall {
    text: String,
  },
  TryAgain,
  NextLevel,
  NewVerse,
  ToggleTheme,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  Screen { view: ScreenView },
  Theme { theme: Theme },
  Error { message: String },
}

/// One plan day with its presentation flags.
#[derive(Debug, Serialize)]
pub struct PlanDayView {
  pub day: u32,
  pub reference: &'static str,
  pub topic: &'static str,
  pub completed: bool,
  pub current: bool,
  pub locked: bool,
}

/// The plan partitioned into weeks, flagged against the completed set.
pub fn plan_view(completed: &HashSet<u32>) -> Vec<Vec<PlanDayView>> {
  let current = plan::first_uncompleted_day(completed);
  plan::weeks()
    .iter()
    .map(|week| {
      week
        .iter()
        .map(|v| PlanDayView {
          day: v.day,
          reference: v.reference,
          topic: v.topic,
          completed: completed.contains(&v.day),
          current: v.day == current,
          locked: v.day > current,
        })
        .collect()
    })
    .collect()
}

/// Serialized projection of the current screen for rendering.
#[derive(Debug, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ScreenView {
  Welcome {
    error: Option<String>,
  },
  Loading,
  LearningPlan {
    weeks: Vec<Vec<PlanDayView>>,
    #[serde(rename = "completedCount")]
    completed_count: usize,
    total: usize,
  },
  Memorize {
    verse: String,
    reference: String,
  },
  ModeSelection {
    reference: String,
  },
  Challenge {
    reference: String,
    template: Vec<String>,
    entries: Vec<String>,
    incorrect: Vec<usize>,
    /// First letter of each wrong answer, revealed after a failed check.
    hints: Vec<Option<String>>,
    verdict: Option<bool>,
    difficulty: u8,
  },
  Scramble {
    reference: String,
    pool: Vec<String>,
    arranged: Vec<String>,
    verdict: Option<bool>,
  },
  MultipleChoice {
    reference: String,
    template: Vec<String>,
    gap: usize,
    chosen: Vec<Option<String>>,
    options: Vec<String>,
    #[serde(rename = "wrongPick")]
    wrong_pick: bool,
  },
  FirstLetter {
    reference: String,
    #[serde(rename = "firstLetters")]
    first_letters: String,
    verdict: Option<bool>,
    /// Revealed once the check failed.
    verse: Option<String>,
  },
  Reconstruct {
    reference: String,
    submission: Option<String>,
    verdict: Option<bool>,
    verse: Option<String>,
  },
  Result {
    reference: String,
    verse: String,
    mode: GameMode,
    success: bool,
    notice: Option<String>,
    #[serde(rename = "canNextLevel")]
    can_next_level: bool,
    difficulty: u8,
  },
}

/// Project a session onto the wire.
///
/// Mirrors the render split of the trainer UI: welcome/loading/plan render
/// without challenge data; every other screen falls back to welcome when no
/// challenge is held.
pub fn screen_view(session: &Session, completed: &HashSet<u32>) -> ScreenView {
  match session.screen() {
    Screen::Welcome { error } => return ScreenView::Welcome { error: error.clone() },
    Screen::Loading => return ScreenView::Loading,
    Screen::LearningPlan => {
      return ScreenView::LearningPlan {
        weeks: plan_view(completed),
        completed_count: completed.len(),
        total: plan::learning_plan().len(),
      }
    }
    _ => {}
  }

  let Some(ch) = session.challenge() else {
    return ScreenView::Welcome { error: None };
  };
  let reference = ch.reference.clone();

  match session.screen() {
    Screen::Memorize => ScreenView::Memorize { verse: ch.original_verse.clone(), reference },
    Screen::ModeSelection => ScreenView::ModeSelection { reference },
    Screen::Challenge { entries, incorrect, verdict } => {
      let hints = ch
        .answers
        .iter()
        .enumerate()
        .map(|(i, answer)| {
          if incorrect.contains(&i) {
            answer.chars().next().map(|c| c.to_string())
          } else {
            None
          }
        })
        .collect();
      ScreenView::Challenge {
        reference,
        template: ch.challenge_template.clone(),
        entries: entries.clone(),
        incorrect: incorrect.clone(),
        hints,
        verdict: *verdict,
        difficulty: session.difficulty(),
      }
    }
    Screen::Scramble { pool, arranged, verdict } => ScreenView::Scramble {
      reference,
      pool: pool.clone(),
      arranged: arranged.clone(),
      verdict: *verdict,
    },
    Screen::MultipleChoice { gap, chosen, options, wrong_pick } => ScreenView::MultipleChoice {
      reference,
      template: ch.challenge_template.clone(),
      gap: *gap,
      chosen: chosen.clone(),
      options: options.clone(),
      wrong_pick: *wrong_pick,
    },
    Screen::FirstLetter { verdict } => ScreenView::FirstLetter {
      reference,
      first_letters: ch.first_letters.clone(),
      verdict: *verdict,
      verse: matches!(verdict, Some(false)).then(|| ch.original_verse.clone()),
    },
    Screen::Reconstruct { submission, verdict } => ScreenView::Reconstruct {
      reference,
      submission: submission.clone(),
      verdict: *verdict,
      verse: matches!(verdict, Some(false)).then(|| ch.original_verse.clone()),
    },
    Screen::Result { mode, success, notice } => ScreenView::Result {
      reference,
      verse: ch.original_verse.clone(),
      mode: *mode,
      success: *success,
      notice: notice.clone(),
      can_next_level: session.can_next_level(),
      difficulty: session.difficulty(),
    },
    // Handled above; unreachable with a held challenge.
    Screen::Welcome { .. } | Screen::Loading | Screen::LearningPlan => {
      ScreenView::Welcome { error: None }
    }
  }
}

//
// HTTP response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}

#[derive(Serialize)]
pub struct PlanOut {
  pub weeks: Vec<Vec<PlanDayView>>,
  #[serde(rename = "completedCount")]
  pub completed_count: usize,
  pub total: usize,
}

#[derive(Serialize)]
pub struct ProgressOut {
  pub completed: Vec<u32>,
}

#[derive(Serialize)]
pub struct ThemeOut {
  pub theme: Theme,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn client_messages_parse_from_wire_json() {
    let msg: ClientWsMessage =
      serde_json::from_str(r#"{"type":"start_verse","input":"Giăng 3:16","planDay":3}"#)
        .expect("valid message");
    match msg {
      ClientWsMessage::StartVerse { input, plan_day } => {
        assert_eq!(input, "Giăng 3:16");
        assert_eq!(plan_day, Some(3));
      }
      other => panic!("unexpected message {:?}", other),
    }

    let msg: ClientWsMessage =
      serde_json::from_str(r#"{"type":"select_mode","mode":"fill_in_the_blanks"}"#)
        .expect("valid message");
    assert!(matches!(msg, ClientWsMessage::SelectMode { mode: GameMode::FillInTheBlanks }));
  }

  #[test]
  fn new_session_projects_to_a_clean_welcome() {
    let session = Session::new();
    let view = screen_view(&session, &HashSet::new());
    let json = serde_json::to_value(&view).expect("serializable");
    assert_eq!(json["screen"], "welcome");
    assert!(json["error"].is_null());
  }

  #[test]
  fn plan_view_flags_completed_current_and_locked_days() {
    let completed = HashSet::from([1]);
    let weeks = plan_view(&completed);
    let week1 = &weeks[0];
    assert!(week1[0].completed && !week1[0].locked);
    assert!(week1[1].current && !week1[1].locked);
    assert!(week1[2].locked);
  }

  #[test]
  fn failed_blank_round_reveals_first_letter_hints() {
    let mut session = Session::new();
    session.start_verse("Giăng 3:16", None).expect("fetch starts");
    session.resolve_fetch(crate::seeds::build_local_challenge(
      &crate::seeds::seed_verses()[0],
      1,
    ));
    session.ready().expect("ready");
    session.select_mode(GameMode::FillInTheBlanks).expect("mode entered");
    let gaps = session.challenge().expect("challenge present").answers.len();
    session
      .submit_blanks(vec![String::new(); gaps])
      .expect("graded");

    match screen_view(&session, &HashSet::new()) {
      ScreenView::Challenge { hints, incorrect, verdict, .. } => {
        assert_eq!(verdict, Some(false));
        assert_eq!(incorrect.len(), gaps);
        assert!(hints.iter().all(|h| h.as_ref().is_some_and(|s| !s.is_empty())));
      }
      other => panic!("expected challenge view, got {:?}", other),
    }
  }
}
