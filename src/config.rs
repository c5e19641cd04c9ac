use serde::{Deserialize, Serialize};

use crate::error::ExtError;

/// Storage key holding optional [`Config`] overrides.
pub const CONFIG_KEY: &str = "foras.config";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    #[default]
    Alt,
    Ctrl,
    Meta,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub notes_key: String,
    /// Microphone button container. Its parent is the preferred mount point.
    pub mic_selector: String,
    pub actions_selector: String,
    /// Candidate hosts for the panel container, tried in order before `body`.
    pub host_selectors: Vec<String>,
    pub button_id: String,
    pub panel_id: String,
    pub styles_id: String,
    pub open_class: String,
    pub button_resource: String,
    pub panel_resource: String,
    pub debounce_ms: u32,
    pub fab_offset_px: f64,
    pub title_max_chars: usize,
    pub default_title: String,
    pub fab_label: String,
    pub shortcut_modifier: Modifier,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notes_key: "foras.notes".to_string(),
            mic_selector: r#"[data-testid="composer-speech-button-container"]"#.to_string(),
            actions_selector: r#"[data-testid="composer-footer-actions"]"#.to_string(),
            host_selectors: vec!["#__next".to_string(), "main".to_string()],
            button_id: "uc-notes-button".to_string(),
            panel_id: "uc-notes-sidebar".to_string(),
            styles_id: "uc-notes-styles".to_string(),
            open_class: "uc-notes-open".to_string(),
            button_resource: "recursos/boton-notas.html".to_string(),
            panel_resource: "recursos/barra-lateral.html".to_string(),
            debounce_ms: 100,
            fab_offset_px: 6.0,
            title_max_chars: 60,
            default_title: "Untitled note".to_string(),
            fab_label: "Save to FORAS".to_string(),
            shortcut_modifier: Modifier::Alt,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parses a JSON object of overrides. Missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ExtError> {
        serde_json::from_str(raw).map_err(|e| ExtError::Config(e.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ExtError> {
        serde_json::from_value(value).map_err(|e| ExtError::Config(e.to_string()))
    }

    pub fn level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }

    /// Stylesheet driving the panel's open/closed state.
    pub fn base_styles(&self) -> String {
        let panel = &self.panel_id;
        let open = &self.open_class;
        format!(
            ":root {{ --uc-notes-width: 320px; }}
#{panel} {{ position: fixed; top: 0; right: 0; height: 100vh; width: var(--uc-notes-width); z-index: 2147483000; display: flex; flex-direction: column; box-shadow: -8px 0 20px rgba(0,0,0,.08); transform: translateX(100%); transition: transform .22s ease; pointer-events: none; box-sizing: border-box; }}
#{panel} > * {{ height: 100%; max-height: 100%; box-sizing: border-box; }}
html.{open} #{panel} {{ transform: translateX(0); pointer-events: auto; }}
html.{open} :is(main, #__next) {{ padding-right: var(--uc-notes-width); transition: padding-right .22s ease; }}
@media (max-width: 1200px) {{ :root {{ --uc-notes-width: 280px; }} }}
@media (max-width: 1024px) {{ html.{open} :is(main, #__next) {{ padding-right: 0; }} html.{open} #{panel} {{ width: 100vw; }} }}
"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_overrides_keep_defaults() {
        let config =
            Config::from_json(r#"{"debounce_ms": 250, "shortcut_modifier": "ctrl"}"#).unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.shortcut_modifier, Modifier::Ctrl);
        assert_eq!(config.notes_key, "foras.notes");
        assert_eq!(config.host_selectors, vec!["#__next", "main"]);
    }

    #[test]
    fn rejects_malformed_overrides() {
        assert!(matches!(
            Config::from_json("{not json"),
            Err(ExtError::Config(_))
        ));
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let config = Config {
            log_level: "chatty".to_string(),
            ..Config::default()
        };
        assert_eq!(config.level(), log::Level::Info);
        let config = Config {
            log_level: "debug".to_string(),
            ..Config::default()
        };
        assert_eq!(config.level(), log::Level::Debug);
    }

    #[test]
    fn styles_reference_configured_ids() {
        let css = Config::default().base_styles();
        assert!(css.contains("#uc-notes-sidebar {"));
        assert!(css.contains("html.uc-notes-open #uc-notes-sidebar"));
    }
}
