//! Browser snippet builder
//!
//! Renders the script block that loads the browser SDK and initializes it
//! with the sanitized delivery options. Identity only reaches the page
//! when PII delivery is allowed and the viewer is a real, authenticated
//! user; session replay masks all text and media unless PII is allowed.

use serde_json::{Map, Value};
use tracing::debug;

use errbeacon_core::config::DeliveryConfig;
use errbeacon_core::scope::UserIdentity;

/// The viewer of the page the snippet is injected into.
#[derive(Debug, Clone, Default)]
pub struct ViewerSession {
    pub user: UserIdentity,
    pub authenticated: bool,
    pub guest: bool,
}

impl ViewerSession {
    /// Whether this viewer's identity may be attached at all.
    fn identifiable(&self) -> bool {
        self.authenticated && !self.guest
    }
}

/// Builds the loader snippet, or `None` when no loader URL is configured.
pub fn build_snippet(config: &DeliveryConfig, viewer: Option<&ViewerSession>) -> Option<String> {
    let Some(loader_url) = &config.js_loader_url else {
        debug!("no loader URL configured, skipping snippet");
        return None;
    };

    let mut options = Map::new();
    for (key, value) in config.sdk_options() {
        options.insert(camel_case(key), value.clone());
    }
    if let Some(rate) = config.replay_session_sample_rate {
        options.insert("replaysSessionSampleRate".into(), Value::from(rate));
    }
    if let Some(rate) = config.replay_on_error_sample_rate {
        options.insert("replaysOnErrorSampleRate".into(), Value::from(rate));
    }

    if config.send_default_pii {
        if let Some(viewer) = viewer.filter(|v| v.identifiable()) {
            if let Ok(user) = serde_json::to_value(&viewer.user) {
                let mut scope = Map::new();
                scope.insert("user".into(), user);
                options.insert("initialScope".into(), Value::Object(scope));
            }
        }
    }

    let with_replay =
        config.replay_session_sample_rate.is_some() || config.replay_on_error_sample_rate.is_some();
    let replay_setup = if with_replay {
        // Masking is only relaxed when PII delivery is explicitly allowed.
        let mask = !config.send_default_pii;
        format!(
            "        options.integrations = [Sentry.replayIntegration({{maskAllText: {mask}, blockAllMedia: {mask}}})];\n"
        )
    } else {
        String::new()
    };

    let snippet = format!(
        "<script>\n\
         (function() {{\n\
         \x20   try {{\n\
         \x20       window.sentryOnLoad = function() {{\n\
         \x20           var options = {options};\n\
         {replay_setup}\
         \x20           Sentry.init(options);\n\
         \x20       }};\n\
         \x20       var loader = document.createElement(\"script\");\n\
         \x20       loader.src = {url};\n\
         \x20       loader.crossOrigin = \"anonymous\";\n\
         \x20       document.head.appendChild(loader);\n\
         \x20   }} catch (err) {{}}\n\
         }})();\n\
         </script>\n",
        options = js_literal(&Value::Object(options)),
        url = js_literal(&Value::String(loader_url.clone())),
    );
    Some(snippet)
}

/// Serializes a value as a JS literal safe for embedding in a script
/// block. `<` is escaped so a value can never close the surrounding tag.
fn js_literal(value: &Value) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
}

/// snake_case setting names to the camelCase the browser SDK expects.
fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use errbeacon_core::config::{sanitize, RawConfig};

    fn config_from(entries: &[(&str, Value)]) -> DeliveryConfig {
        let mut raw = RawConfig::new();
        raw.insert("enabled".into(), json!("1"));
        raw.insert("dsn".into(), json!("https://key@errors.example.com/1"));
        for (key, value) in entries {
            raw.insert((*key).to_string(), value.clone());
        }
        sanitize(&raw).unwrap()
    }

    fn viewer(authenticated: bool, guest: bool) -> ViewerSession {
        ViewerSession {
            user: UserIdentity {
                id: Some("7".into()),
                username: Some("alice".into()),
                ..UserIdentity::default()
            },
            authenticated,
            guest,
        }
    }

    #[test]
    fn test_no_loader_url_yields_no_snippet() {
        let config = config_from(&[]);
        assert!(build_snippet(&config, None).is_none());
    }

    #[test]
    fn test_snippet_echoes_camel_cased_options() {
        let config = config_from(&[
            ("js_loader_url", json!("https://js.example.com/loader.js")),
            ("sample_rate", json!("0.5")),
            ("max_breadcrumbs", json!("50")),
        ]);
        let snippet = build_snippet(&config, None).unwrap();

        assert!(snippet.contains("\"dsn\":\"https://key@errors.example.com/1\""));
        assert!(snippet.contains("\"sampleRate\":0.5"));
        assert!(snippet.contains("\"maxBreadcrumbs\":50"));
        assert!(snippet.contains("loader.src = \"https://js.example.com/loader.js\""));
        // Local-only settings never reach the page.
        assert!(!snippet.contains("jsLoaderUrl"));
        assert!(!snippet.contains("autoHook"));
    }

    #[test]
    fn test_values_cannot_close_the_script_tag() {
        let config = config_from(&[
            ("js_loader_url", json!("https://js.example.com/loader.js")),
            ("environment", json!("</script><script>alert(1)")),
        ]);
        let snippet = build_snippet(&config, None).unwrap();
        assert!(!snippet.contains("</script><script>"));
        assert!(snippet.contains("\\u003c/script>\\u003cscript>"));
    }

    #[test]
    fn test_identity_requires_pii_and_real_authentication() {
        let loader = ("js_loader_url", json!("https://js.example.com/l.js"));

        let config = config_from(&[loader.clone(), ("send_default_pii", json!("1"))]);
        let snippet = build_snippet(&config, Some(&viewer(true, false))).unwrap();
        assert!(snippet.contains("initialScope"));
        assert!(snippet.contains("\"username\":\"alice\""));

        // PII disabled.
        let config = config_from(&[loader.clone()]);
        let snippet = build_snippet(&config, Some(&viewer(true, false))).unwrap();
        assert!(!snippet.contains("initialScope"));

        // Guest and anonymous viewers stay anonymous even with PII on.
        let config = config_from(&[loader.clone(), ("send_default_pii", json!("1"))]);
        assert!(!build_snippet(&config, Some(&viewer(true, true)))
            .unwrap()
            .contains("initialScope"));
        assert!(!build_snippet(&config, Some(&viewer(false, false)))
            .unwrap()
            .contains("initialScope"));
        assert!(!build_snippet(&config, None).unwrap().contains("initialScope"));
    }

    #[test]
    fn test_replay_masks_unless_pii_allowed() {
        let entries = [
            ("js_loader_url", json!("https://js.example.com/l.js")),
            ("replays_session_sample_rate", json!("0.1")),
            ("replays_on_error_sample_rate", json!("1")),
        ];
        let snippet = build_snippet(&config_from(&entries), None).unwrap();
        assert!(snippet.contains("\"replaysSessionSampleRate\":0.1"));
        assert!(snippet.contains("\"replaysOnErrorSampleRate\":1.0"));
        assert!(snippet.contains("maskAllText: true, blockAllMedia: true"));

        let mut with_pii = entries.to_vec();
        with_pii.push(("send_default_pii", json!("1")));
        let snippet = build_snippet(&config_from(&with_pii), None).unwrap();
        assert!(snippet.contains("maskAllText: false, blockAllMedia: false"));
    }

    #[test]
    fn test_replay_integration_absent_without_rates() {
        let config = config_from(&[("js_loader_url", json!("https://js.example.com/l.js"))]);
        let snippet = build_snippet(&config, None).unwrap();
        assert!(!snippet.contains("replayIntegration"));
    }
}
