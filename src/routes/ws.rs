//! WebSocket upgrade + session loop. Each connection owns one trainer
//! session; client messages are parsed as JSON and drive the state machine
//! one at a time, so all session mutations are linearized. Most requests
//! get a single reply; fetch-starting requests emit the loading screen
//! first and the outcome screen once the provider call settles.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::plan;
use crate::protocol::{screen_view, ClientWsMessage, ServerWsMessage};
use crate::session::{FetchRequest, Session};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "versicle_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let session_id = Uuid::new_v4();
  info!(target: "versicle_backend", %session_id, "WebSocket connected");
  let mut session = Session::new();

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize replies.
        let replies = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "versicle_backend", %session_id, "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &mut session, &state).await
          }
          Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
        };

        if !send_all(&mut socket, replies).await {
          return;
        }
      }
      Message::Ping(payload) => {
        let _ = socket.send(Message::Pong(payload)).await;
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "versicle_backend", %session_id, "WebSocket disconnected");
}

async fn send_all(socket: &mut WebSocket, replies: Vec<ServerWsMessage>) -> bool {
  for reply in replies {
    let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
      serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) })
        .to_string()
    });
    if let Err(e) = socket.send(Message::Text(out)).await {
      error!(target: "versicle_backend", error = %e, "WS send error");
      return false;
    }
  }
  true
}

#[instrument(level = "info", skip(session, state))]
async fn handle_client_ws(
  msg: ClientWsMessage,
  session: &mut Session,
  state: &AppState,
) -> Vec<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => vec![ServerWsMessage::Pong],

    ClientWsMessage::StartVerse { input, plan_day } => {
      match session.start_verse(&input, plan_day) {
        Ok(req) => run_fetch(session, state, req).await,
        Err(message) => vec![ServerWsMessage::Error { message }],
      }
    }

    ClientWsMessage::SelectPlanDay { day } => {
      let completed = state.progress.read().await.completed().clone();
      if plan::is_locked(day, &completed) {
        return vec![ServerWsMessage::Error { message: format!("day {} is still locked", day) }];
      }
      let Some(verse) = plan::verse_for_day(day) else {
        return vec![ServerWsMessage::Error { message: format!("unknown plan day {}", day) }];
      };
      match session.start_verse(verse.reference, Some(day)) {
        Ok(req) => run_fetch(session, state, req).await,
        Err(message) => vec![ServerWsMessage::Error { message }],
      }
    }

    ClientWsMessage::OpenPlan => reply_or_error(session.open_plan(), session, state).await,
    ClientWsMessage::Ready => reply_or_error(session.ready(), session, state).await,
    ClientWsMessage::SelectMode { mode } => {
      reply_or_error(session.select_mode(mode), session, state).await
    }

    ClientWsMessage::SubmitBlanks { entries } => match session.submit_blanks(entries) {
      Ok(completed_day) => {
        if let Some(day) = completed_day {
          let newly = state.progress.write().await.mark_complete(day);
          info!(target: "challenge", day, newly, "Plan day completed");
        }
        vec![screen_reply(session, state).await]
      }
      Err(message) => vec![ServerWsMessage::Error { message }],
    },

    ClientWsMessage::ScramblePick { index } => {
      reply_or_error(session.scramble_pick(index), session, state).await
    }
    ClientWsMessage::ScrambleUnpick { index } => {
      reply_or_error(session.scramble_unpick(index), session, state).await
    }
    ClientWsMessage::ScrambleCheck => {
      reply_or_error(session.scramble_check(), session, state).await
    }

    ClientWsMessage::ChooseOption { option } => {
      reply_or_error(session.choose_option(&option), session, state).await
    }
    ClientWsMessage::SubmitRecall { text } => {
      reply_or_error(session.submit_recall(&text), session, state).await
    }
    ClientWsMessage::TryAgain => reply_or_error(session.try_again(), session, state).await,

    ClientWsMessage::NextLevel => match session.next_level() {
      Ok(req) => run_fetch(session, state, req).await,
      Err(message) => vec![ServerWsMessage::Error { message }],
    },

    ClientWsMessage::NewVerse => reply_or_error(session.new_verse(), session, state).await,

    ClientWsMessage::ToggleTheme => {
      let theme = state.prefs.write().await.toggle();
      vec![ServerWsMessage::Theme { theme }]
    }
  }
}

async fn reply_or_error(
  result: Result<(), String>,
  session: &Session,
  state: &AppState,
) -> Vec<ServerWsMessage> {
  match result {
    Ok(()) => vec![screen_reply(session, state).await],
    Err(message) => vec![ServerWsMessage::Error { message }],
  }
}

async fn screen_reply(session: &Session, state: &AppState) -> ServerWsMessage {
  let completed = state.progress.read().await.completed().clone();
  ServerWsMessage::Screen { view: screen_view(session, &completed) }
}

/// Run the provider request the session just issued. The loading frame goes
/// out before the call; the session settles to memorize or to the failure
/// screen once it returns.
async fn run_fetch(
  session: &mut Session,
  state: &AppState,
  req: FetchRequest,
) -> Vec<ServerWsMessage> {
  let mut replies = vec![screen_reply(session, state).await];
  match state.fetch_challenge(&req.query, req.difficulty).await {
    Ok(challenge) => session.resolve_fetch(challenge),
    Err(e) => {
      error!(target: "challenge", error = %e, "Verse fetch failed");
      session.fail_fetch();
    }
  }
  replies.push(screen_reply(session, state).await);
  replies
}
