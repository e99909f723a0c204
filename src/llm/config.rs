//! LLM 配置加载
//!
//! 从环境变量（及 `.env` 文件）读取模型配置，格式：
//! ```text
//! AGENT_MODEL_<ID>_MODEL=gpt-4o
//! AGENT_MODEL_<ID>_BASEURL=https://api.openai.com/v1/chat/completions
//! AGENT_MODEL_<ID>_APIKEY=sk-...
//! ```
//! `<ID>` 为自定义标识（如 `GPT4O`、`QWEN`），不区分大小写。
//! agent 里引用的模型名是 `MODEL` 的值，而不是 `<ID>`。

use crate::error::{AliveError, ConfigError, Result};
use dotenv::dotenv;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

const PREFIX: &str = "AGENT_MODEL_";

/// 单个模型的连接配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelConfig {
    /// LLM 接口中使用的模型名（如 `gpt-4o`）
    pub model: String,
    /// Chat Completions 接口完整 URL
    pub baseurl: String,
    pub apikey: String,
}

/// 全局配置，持有所有已加载的模型配置表（key = model 字段值）
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub models: HashMap<String, ModelConfig>,
}

static MODEL_CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// 从任意键值对解析，忽略不带 `AGENT_MODEL_` 前缀的键
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let mut model_configs: HashMap<String, HashMap<String, String>> = HashMap::new();
        for (key, value) in vars {
            let Some(suffix) = key.strip_prefix(PREFIX) else {
                continue;
            };
            let Some((model_id, config_key)) = suffix.rsplit_once('_') else {
                return Err(AliveError::Config(ConfigError::EnvFormatError(key)));
            };
            if model_id.is_empty() {
                return Err(AliveError::Config(ConfigError::EnvFormatError(key)));
            }
            let model_id = model_id.to_lowercase();
            let config_key = config_key.to_lowercase();

            match config_key.as_str() {
                "model" | "baseurl" | "apikey" => {}
                _ => {
                    return Err(AliveError::Config(ConfigError::UnMatchConfigError(
                        config_key, key,
                    )));
                }
            }
            model_configs
                .entry(model_id)
                .or_default()
                .insert(config_key, value);
        }

        let mut models = HashMap::new();
        for (model_id, mut config_map) in model_configs {
            let mut take = |field: &str| {
                config_map
                    .remove(field)
                    .ok_or_else(|| ConfigError::MissingConfig(model_id.clone(), field.to_string()))
            };
            let model = take("model")?;
            let baseurl = take("baseurl")?;
            let apikey = take("apikey")?;

            models.insert(
                model.clone(),
                ModelConfig {
                    model,
                    baseurl,
                    apikey,
                },
            );
        }

        Ok(Self { models })
    }

    /// 按模型名查找连接配置；首次调用时从环境变量加载并缓存
    pub fn get_model(model: &str) -> Result<ModelConfig> {
        let config = match MODEL_CONFIG.get() {
            Some(config) => config,
            None => {
                let loaded = Config::from_env()?;
                MODEL_CONFIG.get_or_init(|| loaded)
            }
        };
        config.lookup(model)
    }

    pub fn lookup(&self, model: &str) -> Result<ModelConfig> {
        self.models
            .get(model)
            .cloned()
            .ok_or_else(|| AliveError::Config(ConfigError::NotFindModelError(model.to_string())))
    }
}
