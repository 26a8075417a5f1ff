// Runtime configuration handed to the application layer

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub data_dir: String,
    pub catalog_path: Option<String>,
    pub pools_path: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub export_app: String,
    pub export_app_version: String,
    pub lang: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            data_dir: "./data/gacha_log".to_string(),
            catalog_path: None,
            pools_path: None,
            max_body_bytes: 5 * 1024 * 1024,
            request_timeout_seconds: 15,
            export_app: "gacha-ledger".to_string(),
            export_app_version: env!("CARGO_PKG_VERSION").to_string(),
            lang: "zh-cn".to_string(),
        }
    }
}
