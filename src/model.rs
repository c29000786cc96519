use crate::order::pricing::default_categories;
use crate::order::{CategoryPrice, PriceTable};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_title")]
    pub title: String,
    // Overrides the built-in price table when present
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryPrice>,
    // Order-intake command; the payload JSON is written to its stdin
    #[serde(default)]
    pub submit_cmd: Option<String>,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            categories: default_categories(),
            submit_cmd: None,
            log_file: None,
        }
    }
}

fn default_title() -> String {
    "Order".to_string()
}

/// Checks the config and builds its price table.
pub(crate) fn validate_app_config(cfg: &AppConfig) -> Result<PriceTable, String> {
    let table = PriceTable::new(cfg.categories.clone()).map_err(|e| e.to_string())?;
    if let Some(cmd) = &cfg.submit_cmd {
        match shlex::split(cmd) {
            Some(parts) if !parts.is_empty() => {}
            _ => return Err(format!("submit_cmd is not a valid command line: '{cmd}'")),
        }
    }
    if let Some(path) = &cfg.log_file {
        if path.trim().is_empty() {
            return Err("log_file must not be empty".to_string());
        }
    }
    Ok(table)
}

pub(crate) fn parse_config(text: &str, origin: &Path) -> Result<AppConfig> {
    let cfg: AppConfig =
        serde_yaml::from_str(text).with_context(|| format!("parsing {origin:?}"))?;
    validate_app_config(&cfg).map_err(|e| anyhow!("invalid config {origin:?}: {e}"))?;
    Ok(cfg)
}

/// Resolves the config file: `ORDER_FORM_CONFIG`, then `order-form.yaml` and
/// `.tui/order-form.yaml` in the working directory. Built-in defaults apply
/// when none exists.
pub fn load_config() -> Result<(AppConfig, Option<PathBuf>)> {
    if let Ok(path) = std::env::var("ORDER_FORM_CONFIG") {
        let p = PathBuf::from(path);
        let s = fs::read_to_string(&p).with_context(|| format!("reading {p:?}"))?;
        let cfg = parse_config(&s, &p)?;
        return Ok((cfg, Some(p)));
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let candidates = [
        cwd.join("order-form.yaml"),
        cwd.join(".tui").join("order-form.yaml"),
    ];
    for p in candidates {
        if p.exists() {
            let s = fs::read_to_string(&p).with_context(|| format!("reading {p:?}"))?;
            let cfg = parse_config(&s, &p)?;
            return Ok((cfg, Some(p)));
        }
    }
    Ok((AppConfig::default(), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_keys_missing() {
        let cfg = parse_config("{}", Path::new("mem.yaml")).unwrap();
        assert_eq!(cfg.title, "Order");
        assert_eq!(cfg.categories.len(), 4);
        assert!(cfg.submit_cmd.is_none());
    }

    #[test]
    fn categories_override_price_table() {
        let yaml = r#"
title: Parcel order
categories:
  - name: Local
    price_per_kg: 5
  - name: Express
    price_per_kg: 12.5
submit_cmd: "order-intake --stdin"
"#;
        let cfg = parse_config(yaml, Path::new("mem.yaml")).unwrap();
        let table = validate_app_config(&cfg).unwrap();
        assert_eq!(table.price_for_category("Express"), 12.5);
        assert_eq!(table.price_of("Temu"), None);
        assert_eq!(cfg.title, "Parcel order");
    }

    #[test]
    fn validate_detects_duplicate_categories() {
        let cfg = AppConfig {
            categories: vec![
                CategoryPrice::new("Temu", 50.0),
                CategoryPrice::new("Temu", 10.0),
            ],
            ..Default::default()
        };
        let err = validate_app_config(&cfg).unwrap_err();
        assert!(err.contains("duplicate category"));
    }

    #[test]
    fn validate_rejects_unparseable_submit_cmd() {
        let cfg = AppConfig {
            submit_cmd: Some("intake \"unterminated".into()),
            ..Default::default()
        };
        let err = validate_app_config(&cfg).unwrap_err();
        assert!(err.contains("submit_cmd"));
    }

    #[test]
    fn parse_reports_invalid_tables() {
        let yaml = "categories: []\n";
        let err = parse_config(yaml, Path::new("mem.yaml")).unwrap_err();
        assert!(err.to_string().contains("at least one category"));
    }
}
