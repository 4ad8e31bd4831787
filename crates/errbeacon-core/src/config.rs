//! Delivery configuration sanitation
//!
//! Turns the untyped admin settings map ([`RawConfig`]) into a typed
//! [`DeliveryConfig`], or into nothing when delivery is disabled or the
//! DSN is missing. Sanitation never fails hard: malformed individual
//! fields are dropped so the remote SDK defaults apply.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};
use tracing::debug;

/// Untyped admin settings as stored by the host: setting name to raw value.
///
/// Values arrive as strings, numbers, flags, or multi-valued selects encoded
/// as comma-lists or arrays. The map is external input and read-only here.
pub type RawConfig = BTreeMap<String, Value>;

/// Breadcrumb ring size applied when the setting is absent.
pub const DEFAULT_MAX_BREADCRUMBS: usize = 100;

/// Attached-value length bound applied when the setting is absent.
pub const DEFAULT_MAX_VALUE_LENGTH: u32 = 1024;

/// Keys that control forwarder behavior locally and must never reach the
/// remote SDK options.
const LOCAL_ONLY_KEYS: &[&str] = &[
    "enabled",
    "version",
    "js_loader_url",
    "enable_logs",
    "log_messages",
    "auto_hook",
    "replays_session_sample_rate",
    "replays_on_error_sample_rate",
];

/// Settings stored as comma-separated multi-selects.
const SET_VALUED_KEYS: &[&str] = &[
    "ignore_exceptions",
    "ignore_transactions",
    "in_app_include",
    "in_app_exclude",
];

/// Settings coerced with truthy semantics (any non-empty, non-zero value
/// counts as enabled).
const TRUTHY_KEYS: &[&str] = &["enable_tracing", "attach_stacktrace", "send_default_pii"];

/// How much of a request body may be attached to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestBodySize {
    Never,
    Small,
    #[default]
    Medium,
    Always,
}

impl RequestBodySize {
    /// Parses the setting value; unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "never" => Some(RequestBodySize::Never),
            "small" => Some(RequestBodySize::Small),
            "medium" => Some(RequestBodySize::Medium),
            "always" => Some(RequestBodySize::Always),
            _ => None,
        }
    }
}

/// Validated, typed delivery configuration.
///
/// Exists only when delivery is possible (`enabled` truthy and a non-empty
/// DSN). The cleaned options destined for the remote SDK are retained in
/// [`DeliveryConfig::sdk_options`]; the remaining fields control local
/// forwarder behavior and are stripped from that payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryConfig {
    pub dsn: String,
    pub environment: Option<String>,
    /// Always textual, even when it looks numeric (e.g. a build number).
    pub release: Option<String>,
    pub sample_rate: Option<f64>,
    pub traces_sample_rate: Option<f64>,
    pub profiles_sample_rate: Option<f64>,
    pub enable_tracing: bool,
    pub attach_stacktrace: bool,
    pub send_default_pii: bool,
    pub max_breadcrumbs: Option<usize>,
    pub max_request_body_size: Option<RequestBodySize>,
    pub max_value_length: Option<u32>,
    /// Bitwise OR of the selected host error codes.
    pub error_type_mask: Option<i64>,
    pub ignore_exceptions: Vec<String>,
    pub ignore_transactions: Vec<String>,
    pub in_app_include: Vec<String>,
    pub in_app_exclude: Vec<String>,
    pub server_name: Option<String>,
    // Local-only fields, never part of the SDK options.
    pub auto_hook: bool,
    pub log_messages_enabled: bool,
    pub js_loader_url: Option<String>,
    pub replay_session_sample_rate: Option<f64>,
    pub replay_on_error_sample_rate: Option<f64>,
    sdk_options: Map<String, Value>,
}

impl DeliveryConfig {
    /// The cleaned option map forwarded to the remote SDK (and echoed to the
    /// browser snippet). Local-only flags are already stripped.
    pub fn sdk_options(&self) -> &Map<String, Value> {
        &self.sdk_options
    }

    /// Breadcrumb bound with the default applied.
    pub fn breadcrumb_limit(&self) -> usize {
        self.max_breadcrumbs.unwrap_or(DEFAULT_MAX_BREADCRUMBS)
    }

    /// Attached-value length bound with the default applied.
    pub fn value_length_limit(&self) -> u32 {
        self.max_value_length.unwrap_or(DEFAULT_MAX_VALUE_LENGTH)
    }

    /// Request-body policy with the default applied.
    pub fn body_size_limit(&self) -> RequestBodySize {
        self.max_request_body_size.unwrap_or_default()
    }
}

/// Sanitizes raw admin settings into a [`DeliveryConfig`].
///
/// Returns `None` when the `enabled` flag is not truthy or the `dsn` is
/// empty; no other processing happens in that case. Otherwise:
///
/// - local-only flags are extracted and stripped from the SDK options
/// - set-valued fields are split on `,`, trimmed, empties dropped
/// - `error_types` is reduced to one integer bitmask (soft-failing to
///   "absent" on a non-numeric scalar)
/// - the three boolean-ish fields are coerced with truthy semantics
/// - remaining numeric-looking scalars become numbers, except `release`
///
/// Pure function: the same input always yields the same output.
pub fn sanitize(raw: &RawConfig) -> Option<DeliveryConfig> {
    if !is_truthy(raw.get("enabled")) {
        return None;
    }
    let dsn = match raw.get("dsn").and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return None,
    };

    // Local-only fields first; they are dropped from the SDK payload below.
    let auto_hook = is_truthy(raw.get("auto_hook"));
    // `enable_logs` is canonical; the legacy `log_messages` key is honored
    // when the new one is absent. Neither key present means unrestricted.
    let log_messages_enabled = match raw.get("enable_logs").or_else(|| raw.get("log_messages")) {
        Some(value) => is_truthy(Some(value)),
        None => true,
    };
    let js_loader_url = raw
        .get("js_loader_url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);
    let replay_session_sample_rate = raw.get("replays_session_sample_rate").and_then(as_float);
    let replay_on_error_sample_rate = raw.get("replays_on_error_sample_rate").and_then(as_float);

    let mut options = Map::new();
    for (key, value) in raw {
        if LOCAL_ONLY_KEYS.contains(&key.as_str()) {
            continue;
        }
        options.insert(key.clone(), value.clone());
    }

    for key in SET_VALUED_KEYS {
        normalize_set_field(&mut options, key);
    }
    normalize_error_types(&mut options);

    for key in TRUTHY_KEYS {
        let truthy = is_truthy(options.get(*key));
        options.insert((*key).to_string(), Value::Bool(truthy));
    }

    // A numeric-looking release must round-trip as text.
    if let Some(Value::Number(n)) = options.get("release") {
        let text = n.to_string();
        options.insert("release".to_string(), Value::String(text));
    }

    coerce_numeric_scalars(&mut options);

    Some(DeliveryConfig {
        dsn,
        environment: opt_string(&options, "environment"),
        release: opt_string(&options, "release"),
        sample_rate: options.get("sample_rate").and_then(as_float),
        traces_sample_rate: options.get("traces_sample_rate").and_then(as_float),
        profiles_sample_rate: options.get("profiles_sample_rate").and_then(as_float),
        enable_tracing: is_truthy(options.get("enable_tracing")),
        attach_stacktrace: is_truthy(options.get("attach_stacktrace")),
        send_default_pii: is_truthy(options.get("send_default_pii")),
        max_breadcrumbs: options
            .get("max_breadcrumbs")
            .and_then(Value::as_u64)
            .map(|n| n as usize),
        max_request_body_size: options
            .get("max_request_body_size")
            .and_then(Value::as_str)
            .and_then(RequestBodySize::parse),
        max_value_length: options
            .get("max_value_length")
            .and_then(Value::as_u64)
            .map(|n| n as u32),
        error_type_mask: options.get("error_types").and_then(Value::as_i64),
        ignore_exceptions: string_set(&options, "ignore_exceptions"),
        ignore_transactions: string_set(&options, "ignore_transactions"),
        in_app_include: string_set(&options, "in_app_include"),
        in_app_exclude: string_set(&options, "in_app_exclude"),
        server_name: opt_string(&options, "server_name"),
        auto_hook,
        log_messages_enabled,
        js_loader_url,
        replay_session_sample_rate,
        replay_on_error_sample_rate,
        sdk_options: options,
    })
}

/// Truthy semantics of the settings store: absent, null, false, zero, the
/// empty string, `"0"`, and empty collections all count as false.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty() && s != "0",
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn opt_string(options: &Map<String, Value>, key: &str) -> Option<String> {
    options
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn string_set(options: &Map<String, Value>, key: &str) -> Vec<String> {
    match options.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// Empty string means "unset"; a comma-separated string becomes a list of
/// trimmed, non-empty tokens in the given order. Arrays pass through.
fn normalize_set_field(options: &mut Map<String, Value>, key: &str) {
    let Some(value) = options.get(key).cloned() else {
        return;
    };
    match value {
        Value::String(s) if s.is_empty() => {
            options.remove(key);
        }
        Value::String(s) => {
            let items: Vec<Value> = s
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| Value::String(token.to_string()))
                .collect();
            if items.is_empty() {
                options.remove(key);
            } else {
                options.insert(key.to_string(), Value::Array(items));
            }
        }
        _ => {}
    }
}

/// Reduces `error_types` (list or comma-string of codes) to one integer
/// bitmask. A non-numeric scalar is dropped so the remote default applies.
fn normalize_error_types(options: &mut Map<String, Value>) {
    let Some(value) = options.get("error_types").cloned() else {
        return;
    };
    let mask = match value {
        Value::Array(items) => {
            let mut mask = 0i64;
            for item in &items {
                mask |= scalar_to_int(item).unwrap_or(0);
            }
            Some(mask)
        }
        Value::String(s) if s.contains(',') => {
            let mut mask = 0i64;
            for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                mask |= token.parse::<i64>().unwrap_or(0);
            }
            Some(mask)
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    };
    match mask {
        Some(mask) => {
            options.insert("error_types".to_string(), Value::Number(Number::from(mask)));
        }
        None => {
            debug!("dropping non-numeric error_types setting");
            options.remove("error_types");
        }
    }
}

fn scalar_to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Converts remaining numeric-looking string scalars to numbers: float when
/// they contain a decimal point, integer otherwise. `release` is exempt.
fn coerce_numeric_scalars(options: &mut Map<String, Value>) {
    let keys: Vec<String> = options.keys().cloned().collect();
    for key in keys {
        if key == "release" {
            continue;
        }
        let Some(Value::String(s)) = options.get(&key) else {
            continue;
        };
        let s = s.trim();
        let coerced = if s.contains('.') {
            s.parse::<f64>().ok().and_then(Number::from_f64)
        } else {
            s.parse::<i64>().ok().map(Number::from)
        };
        if let Some(number) = coerced {
            options.insert(key, Value::Number(number));
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn base_raw() -> RawConfig {
        let mut raw = RawConfig::new();
        raw.insert("enabled".into(), json!("1"));
        raw.insert("dsn".into(), json!("https://key@errors.example.com/7"));
        raw
    }

    // -- Gate: enabled + dsn --

    #[test]
    fn disabled_config_yields_absent() {
        let mut raw = base_raw();
        raw.insert("enabled".into(), json!("0"));
        assert!(sanitize(&raw).is_none());

        raw.insert("enabled".into(), json!(""));
        assert!(sanitize(&raw).is_none());

        raw.remove("enabled");
        assert!(sanitize(&raw).is_none());
    }

    #[test]
    fn empty_dsn_yields_absent() {
        let mut raw = base_raw();
        raw.insert("dsn".into(), json!(""));
        assert!(sanitize(&raw).is_none());

        raw.remove("dsn");
        assert!(sanitize(&raw).is_none());
    }

    #[test]
    fn enabled_with_dsn_yields_config() {
        let config = sanitize(&base_raw()).expect("config should be present");
        assert_eq!(config.dsn, "https://key@errors.example.com/7");
    }

    // -- Local-only flags are stripped from the SDK options --

    #[test]
    fn local_flags_never_reach_sdk_options() {
        let mut raw = base_raw();
        raw.insert("version".into(), json!("2025102400"));
        raw.insert("js_loader_url".into(), json!("https://js.example.com/loader.js"));
        raw.insert("enable_logs".into(), json!("1"));
        raw.insert("log_messages".into(), json!("1"));
        raw.insert("auto_hook".into(), json!("1"));
        raw.insert("replays_session_sample_rate".into(), json!("0.1"));
        raw.insert("replays_on_error_sample_rate".into(), json!("1"));

        let config = sanitize(&raw).unwrap();
        for key in [
            "enabled",
            "version",
            "js_loader_url",
            "enable_logs",
            "log_messages",
            "auto_hook",
            "replays_session_sample_rate",
            "replays_on_error_sample_rate",
        ] {
            assert!(
                !config.sdk_options().contains_key(key),
                "{key} should be stripped"
            );
        }
        assert!(config.auto_hook);
        assert!(config.log_messages_enabled);
        assert_eq!(
            config.js_loader_url.as_deref(),
            Some("https://js.example.com/loader.js")
        );
        assert_eq!(config.replay_session_sample_rate, Some(0.1));
        assert_eq!(config.replay_on_error_sample_rate, Some(1.0));
    }

    #[test]
    fn legacy_log_toggle_is_honored_when_canonical_absent() {
        let mut raw = base_raw();
        raw.insert("log_messages".into(), json!("0"));
        assert!(!sanitize(&raw).unwrap().log_messages_enabled);

        raw.insert("enable_logs".into(), json!("1"));
        assert!(sanitize(&raw).unwrap().log_messages_enabled);
    }

    #[test]
    fn message_logging_defaults_to_enabled_without_either_toggle() {
        assert!(sanitize(&base_raw()).unwrap().log_messages_enabled);
    }

    // -- Set-valued fields --

    #[test]
    fn empty_set_field_is_omitted() {
        for key in ["ignore_exceptions", "ignore_transactions", "in_app_include", "in_app_exclude"]
        {
            let mut raw = base_raw();
            raw.insert(key.into(), json!(""));
            let config = sanitize(&raw).unwrap();
            assert!(!config.sdk_options().contains_key(key), "{key}");
        }
    }

    #[test]
    fn comma_list_is_split_trimmed_and_ordered() {
        let mut raw = base_raw();
        raw.insert("ignore_exceptions".into(), json!("a, b ,c"));
        let config = sanitize(&raw).unwrap();
        assert_eq!(
            config.sdk_options().get("ignore_exceptions"),
            Some(&json!(["a", "b", "c"]))
        );
        assert_eq!(config.ignore_exceptions, vec!["a", "b", "c"]);
    }

    #[test]
    fn comma_list_drops_empty_tokens() {
        let mut raw = base_raw();
        raw.insert("in_app_exclude".into(), json!("vendor, ,,tests"));
        let config = sanitize(&raw).unwrap();
        assert_eq!(config.in_app_exclude, vec!["vendor", "tests"]);
    }

    #[test]
    fn set_field_array_input_passes_through() {
        let mut raw = base_raw();
        raw.insert("in_app_include".into(), json!(["app", "lib"]));
        let config = sanitize(&raw).unwrap();
        assert_eq!(config.in_app_include, vec!["app", "lib"]);
    }

    // -- error_types bitmask --

    #[test]
    fn error_types_comma_string_becomes_bitmask() {
        let mut raw = base_raw();
        raw.insert("error_types".into(), json!("1,2,4"));
        let config = sanitize(&raw).unwrap();
        assert_eq!(config.error_type_mask, Some(7));
        assert_eq!(config.sdk_options().get("error_types"), Some(&json!(7)));
    }

    #[test]
    fn error_types_list_becomes_bitmask() {
        let mut raw = base_raw();
        raw.insert("error_types".into(), json!([1, 2, 4]));
        assert_eq!(sanitize(&raw).unwrap().error_type_mask, Some(7));

        raw.insert("error_types".into(), json!(["1", "8"]));
        assert_eq!(sanitize(&raw).unwrap().error_type_mask, Some(9));
    }

    #[test]
    fn error_types_single_numeric_scalar_is_kept() {
        let mut raw = base_raw();
        raw.insert("error_types".into(), json!("32767"));
        assert_eq!(sanitize(&raw).unwrap().error_type_mask, Some(32767));
    }

    #[test]
    fn error_types_non_numeric_scalar_is_dropped() {
        let mut raw = base_raw();
        raw.insert("error_types".into(), json!("abc"));
        let config = sanitize(&raw).unwrap();
        assert_eq!(config.error_type_mask, None);
        assert!(!config.sdk_options().contains_key("error_types"));
    }

    // -- Truthy coercion --

    #[test]
    fn boolean_ish_fields_use_truthy_semantics() {
        let mut raw = base_raw();
        raw.insert("enable_tracing".into(), json!("1"));
        raw.insert("attach_stacktrace".into(), json!("0"));
        // send_default_pii absent
        let config = sanitize(&raw).unwrap();
        assert!(config.enable_tracing);
        assert!(!config.attach_stacktrace);
        assert!(!config.send_default_pii);
        // All three are always present as booleans in the SDK options.
        assert_eq!(config.sdk_options().get("enable_tracing"), Some(&json!(true)));
        assert_eq!(config.sdk_options().get("attach_stacktrace"), Some(&json!(false)));
        assert_eq!(config.sdk_options().get("send_default_pii"), Some(&json!(false)));
    }

    #[test]
    fn truthy_accepts_any_non_zero_value() {
        for value in [json!("yes"), json!(1), json!(2.5), json!(true)] {
            let mut raw = base_raw();
            raw.insert("send_default_pii".into(), value);
            assert!(sanitize(&raw).unwrap().send_default_pii);
        }
    }

    // -- Numeric coercion --

    #[test]
    fn numeric_strings_are_coerced() {
        let mut raw = base_raw();
        raw.insert("sample_rate".into(), json!("0.5"));
        raw.insert("max_breadcrumbs".into(), json!("50"));
        raw.insert("max_value_length".into(), json!("2048"));
        let config = sanitize(&raw).unwrap();
        assert_eq!(config.sample_rate, Some(0.5));
        assert_eq!(config.max_breadcrumbs, Some(50));
        assert_eq!(config.max_value_length, Some(2048));
        assert_eq!(config.sdk_options().get("sample_rate"), Some(&json!(0.5)));
        assert_eq!(config.sdk_options().get("max_breadcrumbs"), Some(&json!(50)));
    }

    #[test]
    fn release_stays_textual_even_when_numeric_looking() {
        let mut raw = base_raw();
        raw.insert("release".into(), json!("2.3"));
        let config = sanitize(&raw).unwrap();
        assert_eq!(config.release.as_deref(), Some("2.3"));
        assert_eq!(config.sdk_options().get("release"), Some(&json!("2.3")));
    }

    #[test]
    fn numeric_release_is_converted_back_to_text() {
        let mut raw = base_raw();
        raw.insert("release".into(), json!(42));
        let config = sanitize(&raw).unwrap();
        assert_eq!(config.release.as_deref(), Some("42"));
    }

    #[test]
    fn non_numeric_strings_are_left_alone() {
        let mut raw = base_raw();
        raw.insert("environment".into(), json!("production"));
        raw.insert("max_request_body_size".into(), json!("medium"));
        let config = sanitize(&raw).unwrap();
        assert_eq!(config.environment.as_deref(), Some("production"));
        assert_eq!(config.max_request_body_size, Some(RequestBodySize::Medium));
    }

    #[test]
    fn unknown_body_size_is_ignored() {
        let mut raw = base_raw();
        raw.insert("max_request_body_size".into(), json!("gigantic"));
        let config = sanitize(&raw).unwrap();
        assert_eq!(config.max_request_body_size, None);
        assert_eq!(config.body_size_limit(), RequestBodySize::Medium);
    }

    #[test]
    fn value_length_limit_defaults_to_1024() {
        let config = sanitize(&base_raw()).unwrap();
        assert_eq!(config.value_length_limit(), DEFAULT_MAX_VALUE_LENGTH);
    }

    // -- Determinism / end-to-end --

    #[test]
    fn sanitize_is_deterministic() {
        let mut raw = base_raw();
        raw.insert("error_types".into(), json!("1,8"));
        raw.insert("ignore_exceptions".into(), json!("A,B"));
        raw.insert("sample_rate".into(), json!("0.25"));
        let first = sanitize(&raw).unwrap();
        let second = sanitize(&raw).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn end_to_end_sample_config() {
        let mut raw = RawConfig::new();
        raw.insert("enabled".into(), json!(true));
        raw.insert("dsn".into(), json!("https://x"));
        raw.insert("error_types".into(), json!("1,8"));
        raw.insert("release".into(), json!("2.3"));

        let config = sanitize(&raw).unwrap();
        assert_eq!(config.dsn, "https://x");
        assert_eq!(config.error_type_mask, Some(9));
        assert_eq!(config.release.as_deref(), Some("2.3"));
    }

    #[test]
    fn breadcrumb_limit_defaults_to_100() {
        let config = sanitize(&base_raw()).unwrap();
        assert_eq!(config.breadcrumb_limit(), DEFAULT_MAX_BREADCRUMBS);

        let mut raw = base_raw();
        raw.insert("max_breadcrumbs".into(), json!("2"));
        assert_eq!(sanitize(&raw).unwrap().breadcrumb_limit(), 2);
    }
}
