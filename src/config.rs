use num_cpus;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use core::str;
use log::{error, warn};
use std::fs::File;
use std::io::prelude::*;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    port: u16,
    worker_threads: usize,
    local: bool,
    #[serde(default = "default_content_type")]
    default_content_type: String,
    #[serde(default = "default_charset")]
    default_charset: String,
    #[serde(default = "default_compression_level")]
    compression_level: u32,
}

fn default_content_type() -> String {
    "text/html".to_string()
}

fn default_charset() -> String {
    "UTF-8".to_string()
}

fn default_compression_level() -> u32 {
    6 // flate2 的默认压缩级别
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: 7878,
            worker_threads: 0,
            local: true,
            default_content_type: default_content_type(),
            default_charset: default_charset(),
            compression_level: default_compression_level(),
        }
    }

    pub fn from_toml(filename: &str) -> Self {
        let mut file = match File::open(filename) {
            Ok(f) => f,
            Err(e) => panic!("no such file {} exception:{}", filename, e),
        };
        let mut str_val = String::new();
        match file.read_to_string(&mut str_val) {
            Ok(s) => s,
            Err(e) => panic!("Error Reading file: {}", e),
        };

        let mut raw_config: Config = match toml::from_str(&str_val) {
            Ok(t) => t,
            Err(_) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置");
                Config::new()
            }
        };
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.compression_level > 9 {
            warn!(
                "compression_level被设置为{}，超出gzip支持的0-9范围，改用默认级别6。",
                raw_config.compression_level
            );
            raw_config.compression_level = default_compression_level();
        }
        raw_config
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn default_content_type(&self) -> &str {
        &self.default_content_type
    }

    pub fn default_charset(&self) -> &str {
        &self.default_charset
    }

    pub fn compression_level(&self) -> u32 {
        self.compression_level
    }
}
