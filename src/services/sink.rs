use crate::model::AppConfig;
use crate::order::OrderPayload;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::{env, fmt};

/// Receives validated orders. Returns a short receipt for the status line.
pub trait OrderSink: Send + Sync {
    fn submit(&self, payload: &OrderPayload) -> Result<String>;
}

/// Default sink: records the payload in the log and accepts it.
#[derive(Debug, Default)]
pub struct LogSink;

impl OrderSink for LogSink {
    fn submit(&self, payload: &OrderPayload) -> Result<String> {
        let json = payload.to_json().context("serializing order payload")?;
        tracing::info!(target: "order", payload = %json, "order submitted");
        Ok(format!("logged, total {}", payload.total_price))
    }
}

/// Hands the payload JSON to an order-intake command on stdin.
pub struct CommandSink {
    cmdline: String,
}

impl CommandSink {
    pub fn new(cmdline: impl Into<String>) -> Self {
        Self {
            cmdline: cmdline.into(),
        }
    }
}

impl fmt::Debug for CommandSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSink")
            .field("cmdline", &self.cmdline)
            .finish()
    }
}

impl OrderSink for CommandSink {
    fn submit(&self, payload: &OrderPayload) -> Result<String> {
        let json = payload.to_json().context("serializing order payload")?;
        let expanded = expand_cmdline_env(&self.cmdline);
        let parts = shlex::split(&expanded).ok_or_else(|| anyhow!("Failed to parse command line"))?;
        let (program, args) = parts
            .split_first()
            .ok_or_else(|| anyhow!("Empty command line"))?;
        tracing::debug!(target: "order", cmd = %expanded, "spawning order intake");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawning {expanded}"))?;
        // A child that exits early closes the pipe; keep the write error and
        // still reap the child so its exit status wins.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(json.as_bytes()),
            None => Err(std::io::Error::other("order intake has no stdin")),
        };
        let output = child
            .wait_with_output()
            .with_context(|| format!("waiting for {expanded}"))?;
        if !output.status.success() {
            let err = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(anyhow!("Command failed: {} ({})\n{}", self.cmdline, output.status, err));
        }
        written.context("writing order payload")?;
        let text = String::from_utf8_lossy(&output.stdout);
        let receipt = text.lines().next().unwrap_or("").trim();
        if receipt.is_empty() {
            Ok("accepted".to_string())
        } else {
            Ok(receipt.to_string())
        }
    }
}

/// Expands `${VAR}` references from the environment; unset variables expand
/// to nothing.
pub fn expand_cmdline_env(cmdline: &str) -> String {
    let Ok(re) = Regex::new(r"\$\{([A-Za-z0-9_]+)\}") else {
        return cmdline.to_string();
    };
    let env_map: HashMap<String, String> = env::vars().collect();
    re.replace_all(cmdline, |caps: &regex::Captures| {
        env_map.get(&caps[1]).cloned().unwrap_or_default()
    })
    .to_string()
}

pub fn sink_from_config(cfg: &AppConfig) -> Arc<dyn OrderSink> {
    match &cfg.submit_cmd {
        Some(cmd) => Arc::new(CommandSink::new(cmd.clone())),
        None => Arc::new(LogSink),
    }
}
