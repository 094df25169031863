//! Shared application state: persistent stores, the verse bank, prompts,
//! and the optional provider client.
//!
//! The fetch policy lives here: a configured provider is authoritative and
//! its failures surface to the session; without a provider the built-in
//! bank keeps the trainer usable offline.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, instrument};

use crate::config::load_agent_config_from_env;
use crate::config::Prompts;
use crate::domain::{Challenge, ChallengeSource};
use crate::gemini::Gemini;
use crate::seeds::{self, BankVerse};
use crate::store::{PrefStore, ProgressStore};
use crate::util::trunc_for_log;

#[derive(Clone)]
pub struct AppState {
  pub progress: Arc<RwLock<ProgressStore>>,
  pub prefs: Arc<RwLock<PrefStore>>,
  pub bank: Arc<Vec<BankVerse>>,
  pub prompts: Prompts,
  pub gemini: Option<Gemini>,
}

impl AppState {
  /// Build state from env: load config, merge the verse bank, open the
  /// stores, init the provider client.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    let cfg_opt = load_agent_config_from_env();
    let prompts = cfg_opt.as_ref().map(|c| c.prompts.clone()).unwrap_or_default();

    let mut bank = seeds::seed_verses();
    if let Some(cfg) = &cfg_opt {
      for v in &cfg.verses {
        if v.verse.trim().is_empty() {
          error!(target: "challenge", reference = %v.reference, "Skipping bank verse: empty text");
          continue;
        }
        bank.push(BankVerse {
          reference: v.reference.clone(),
          verse: v.verse.clone(),
          keywords: v.keywords.iter().map(|k| k.to_lowercase()).collect(),
          source: ChallengeSource::LocalBank,
        });
      }
    }
    let seed_count = bank.iter().filter(|v| v.source == ChallengeSource::SeedBank).count();
    info!(
      target: "challenge",
      seed = seed_count,
      local_bank = bank.len() - seed_count,
      "Startup verse inventory"
    );

    let progress_path =
      std::env::var("PROGRESS_PATH").unwrap_or_else(|_| "./data/progress.json".into());
    let theme_path = std::env::var("THEME_PATH").unwrap_or_else(|_| "./data/theme.json".into());

    let gemini = Gemini::from_env();
    if let Some(g) = &gemini {
      info!(target: "versicle_backend", base_url = %g.base_url, model = %g.model, "Gemini enabled.");
    } else {
      info!(target: "versicle_backend", "Gemini disabled (no GEMINI_API_KEY). Serving bank verses locally.");
    }

    Self {
      progress: Arc::new(RwLock::new(ProgressStore::load(progress_path))),
      prefs: Arc::new(RwLock::new(PrefStore::load(theme_path))),
      bank: Arc::new(bank),
      prompts,
      gemini,
    }
  }

  /// Fetch a verse challenge for a freeform query at the given difficulty.
  #[instrument(level = "info", skip(self, query), fields(%difficulty, query_len = query.len()))]
  pub async fn fetch_challenge(&self, query: &str, difficulty: u8) -> Result<Challenge, String> {
    if let Some(gemini) = &self.gemini {
      return gemini.generate_challenge(&self.prompts, query, difficulty).await;
    }
    match seeds::find_bank_verse(&self.bank, query) {
      Some(entry) => {
        info!(target: "challenge", reference = %entry.reference, source = ?entry.source, "Serving bank verse");
        Ok(seeds::build_local_challenge(entry, difficulty))
      }
      None => Err(format!("no bank verse matches '{}'", trunc_for_log(query, 40))),
    }
  }
}
