use std::env;
use std::fs;
use std::path::Path;

use toml::Value;
use vendorly_core::config::{resolve_config_path, AppConfig, LoadOptions};

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: [(&str, String, &[&str]); 8] = [
        ("portal.vendor_name", config.portal.vendor_name.clone(), &["VENDORLY_PORTAL_VENDOR_NAME"]),
        ("portal.currency", config.portal.currency.clone(), &["VENDORLY_PORTAL_CURRENCY"]),
        ("portal.locale", config.portal.locale.to_string(), &["VENDORLY_PORTAL_LOCALE"]),
        (
            "portal.invoice_prefix",
            config.portal.invoice_prefix.clone(),
            &["VENDORLY_PORTAL_INVOICE_PREFIX"],
        ),
        (
            "portal.default_page",
            config.portal.default_page.to_string(),
            &["VENDORLY_PORTAL_DEFAULT_PAGE"],
        ),
        (
            "notifications.ttl_ms",
            config.notifications.ttl_ms.to_string(),
            &["VENDORLY_NOTIFICATIONS_TTL_MS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["VENDORLY_LOGGING_LEVEL", "VENDORLY_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["VENDORLY_LOGGING_FORMAT", "VENDORLY_LOG_FORMAT"],
        ),
    ];

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in fields {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::contains_path;

    #[test]
    fn nested_keys_are_found_in_file_document() {
        let doc: Value = "[portal]\nlocale = \"en-US\"\n".parse().expect("toml");
        assert!(contains_path(&doc, "portal.locale"));
        assert!(!contains_path(&doc, "portal.currency"));
        assert!(!contains_path(&doc, "notifications.ttl_ms"));
    }
}
