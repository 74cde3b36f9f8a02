//! System prompt rendering via `minijinja`.
//!
//! The default template is compiled into the binary. When a templates
//! directory is configured and contains `system.j2`, that file is used
//! instead so the persona can be tuned without recompiling.

use std::path::Path;

use aura_types::CognitiveMode;
use minijinja::{Environment, context};

use crate::error::OracleError;

/// Name of the system prompt template.
pub const SYSTEM_TEMPLATE: &str = "system.j2";

const DEFAULT_SYSTEM_TEMPLATE: &str = include_str!("../templates/system.j2");

/// Core label for the reasoning model.
pub const PRO_CORE_LABEL: &str = "GEMINI_PRO (LOGIC)";

/// Core label for the fast model.
pub const FLASH_CORE_LABEL: &str = "GEMINI_FLASH (REFLEX)";

/// Renders the system prompt.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Build the engine, preferring `{templates_dir}/system.j2` when present.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Template`] if the chosen template does not parse.
    pub fn new(templates_dir: Option<&str>) -> Result<Self, OracleError> {
        let mut env = Environment::new();
        match templates_dir {
            Some(dir) if Path::new(dir).join(SYSTEM_TEMPLATE).is_file() => {
                tracing::info!(dir, "Loading system prompt override");
                env.set_loader(minijinja::path_loader(dir));
            }
            _ => env.add_template(SYSTEM_TEMPLATE, DEFAULT_SYSTEM_TEMPLATE)?,
        }
        // Surface syntax errors at startup rather than on the first turn.
        env.get_template(SYSTEM_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render the system prompt for one turn.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Template`] if rendering fails.
    pub fn render_system(
        &self,
        core: &str,
        mode: CognitiveMode,
        shadow: &str,
    ) -> Result<String, OracleError> {
        let rendered = self.env.get_template(SYSTEM_TEMPLATE)?.render(context! {
            core => core,
            mode => mode.as_str(),
            shadow => shadow,
        })?;
        Ok(rendered)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_template_fills_header() {
        let engine = PromptEngine::new(None).unwrap();
        let text = engine
            .render_system(PRO_CORE_LABEL, CognitiveMode::Alchemy, "CALM | FOCUSED")
            .unwrap();
        assert!(text.contains("[ЯДРО: GEMINI_PRO (LOGIC)]"));
        assert!(text.contains("[РЕЖИМ: ALCHEMY]"));
        assert!(text.contains("[ТЕНЕВОЙ КОНТЕКСТ: CALM | FOCUSED]"));
        assert!(text.contains("[SYSTEM_BURST]"));
    }

    #[test]
    fn directory_override_wins() {
        let unique = format!(
            "aura_prompt_override_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        std::fs::write(dir.join(SYSTEM_TEMPLATE), "custom {{ mode }}/{{ core }}").ok();

        let engine = PromptEngine::new(dir.to_str()).unwrap();
        let text = engine
            .render_system(FLASH_CORE_LABEL, CognitiveMode::Empathic, "")
            .unwrap();
        assert_eq!(text, "custom EMPATHIC/GEMINI_FLASH (REFLEX)");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_override_falls_back_to_default() {
        let engine = PromptEngine::new(Some("/nonexistent/aura/templates")).unwrap();
        let text = engine
            .render_system(FLASH_CORE_LABEL, CognitiveMode::Dream, "")
            .unwrap();
        assert!(text.contains("MUZA AURA 2.0"));
    }
}
