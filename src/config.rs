//! Loading agent configuration (prompts + optional verse bank) from TOML.
//!
//! See `AgentConfig` and `Prompts` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub verses: Vec<VerseCfg>,
}

/// Verse entry accepted in TOML configuration. Entries join the built-in
/// bank and are served through the local challenge builder.
#[derive(Clone, Debug, Deserialize)]
pub struct VerseCfg {
  pub reference: String,
  pub verse: String,
  #[serde(default)]
  pub keywords: Vec<String>,
}

/// Prompts used by the provider client. Defaults are sensible for the
/// Vietnamese Phổ Thông translation; override them in TOML to tune tone
/// or target another translation.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub challenge_system: String,
  pub challenge_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      challenge_system:
        "You are a Bible memorization game generator. Respond ONLY with a single strict JSON object, no surrounding text.".into(),
      challenge_user_template: "The user asked for a verse related to: \"{query}\".\n\
        1. Find the best matching Bible verse, using the Vietnamese Phổ Thông translation.\n\
        2. Create a fill-in-the-blank challenge by replacing roughly {blank_share} of the key words (nouns, verbs) with \"[...]\".\n\
        3. Split the verse into 5-8 logical phrases, kept in order, as orderedChunks.\n\
        4. For every removed word in answers, provide the correct 'answer' and 2-3 plausible 'distractors' (synonyms, antonyms, or related words).\n\
        5. Provide firstLetters: the first letter of every word of the verse, space-separated.\n\
        Return one JSON object with: verseText, reference, challenge, answers, orderedChunks, multipleChoiceOptions, firstLetters.".into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO
/// error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "versicle_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "versicle_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "versicle_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn config_parses_prompt_overrides_and_verses() {
    let cfg: AgentConfig = toml::from_str(
      r#"
        [prompts]
        challenge_system = "system"
        challenge_user_template = "user {query} {blank_share}"

        [[verses]]
        reference = "Giăng 11:35"
        verse = "Đức Chúa Jêsus khóc."
        keywords = ["khóc"]

        [[verses]]
        reference = "Rô-ma 12:12"
        verse = "Hãy vui mừng trong sự trông cậy, nhịn nhục trong sự hoạn nạn, bền lòng mà cầu nguyện."
      "#,
    )
    .expect("valid TOML");

    assert_eq!(cfg.prompts.challenge_system, "system");
    assert_eq!(cfg.verses.len(), 2);
    assert_eq!(cfg.verses[0].keywords, vec!["khóc"]);
    assert!(cfg.verses[1].keywords.is_empty());
  }

  #[test]
  fn default_prompts_mention_the_gap_marker_and_placeholders() {
    let prompts = Prompts::default();
    assert!(prompts.challenge_user_template.contains("{query}"));
    assert!(prompts.challenge_user_template.contains("{blank_share}"));
    assert!(prompts.challenge_user_template.contains("[...]"));
  }
}
