use std::net::SocketAddr;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Request body cap in bytes; 0 disables the limit.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            worker_threads: Some(4),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// `host:port`, or a full `redis://` / `rediss://` URL.
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tls: bool,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            host: String::new(),
            password: None,
            tls: false,
            command_timeout_secs: default_command_timeout(),
        }
    }
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8080 }
fn default_command_timeout() -> u64 { 5 }
fn default_max_body_bytes() -> usize { 16 * 1024 * 1024 }

/// Load from `CONFIG_PATH` (default `config.toml`); a missing file yields defaults.
pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if !Path::new(&path).exists() {
        return Ok(AppConfig::default());
    }
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// File (if any), then process environment, then validation.
    pub fn load_and_validate() -> Result<Self> {
        // 先读配置文件（不存在时使用默认值），再用环境变量覆盖
        let mut cfg = load_default()?;
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Overlay environment variables through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(n) = lookup("SERVER_MAX_BODY_BYTES").and_then(|v| v.parse::<usize>().ok()) {
            self.server.max_body_bytes = n;
        }
        if let Some(w) = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        // 未识别的后端名称直接忽略，保持原值
        if let Some(backend) = lookup("STORE_BACKEND") {
            match backend.trim().to_lowercase().as_str() {
                "memory" => self.store.backend = StoreBackend::Memory,
                "redis" => self.store.backend = StoreBackend::Redis,
                _ => {}
            }
        }
        if let Some(host) = lookup("REDIS_HOST") {
            self.store.host = host;
        }
        if let Some(password) = lookup("REDIS_PASSWORD") {
            self.store.password = Some(password);
        }
        if let Some(tls) = lookup("REDIS_TLS") {
            self.store.tls = matches!(tls.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(secs) = lookup("REDIS_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
            self.store.command_timeout_secs = secs;
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.store.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        // 空 host 回退为监听所有网卡
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if self.worker_threads == Some(0) || self.worker_threads.is_none() {
            self.worker_threads = Some(4);
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        // memory 后端无需连接信息
        if self.backend == StoreBackend::Redis && self.host.trim().is_empty() {
            return Err(anyhow!("store.host is empty; set it in config.toml or REDIS_HOST"));
        }
        if self.command_timeout_secs == 0 {
            return Err(anyhow!("store.command_timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }

    /// Connection URL without credentials; the password travels separately.
    pub fn connection_url(&self) -> String {
        let host = self.host.trim();
        if host.contains("://") {
            return host.to_string();
        }
        let scheme = if self.tls { "rediss" } else { "redis" };
        format!("{scheme}://{host}")
    }

    pub fn command_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.command_timeout_secs)
    }
}
