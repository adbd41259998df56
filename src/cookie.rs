// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Cookie 模块
//!
//! 该模块定义了响应累积的 Cookie 值对象：
//! 1. `CookieOptions`：调用方可选提供的属性子集（path、domain、secure、httponly）。
//! 2. `CookieSpec`：合并后的完整 Cookie 描述，name/value/ttl 始终以调用方实参
//!    为准，可选属性按「实参 > options > 默认值」的优先级合并。
//!
//! ttl 字段存放**绝对**过期时间（Unix 秒），0 表示会话 Cookie（浏览器关闭即失效）。

use chrono::{TimeZone, Utc};

/// 调用方在设置 Cookie 时可选提供的属性。
///
/// 未提供的字段采用默认值：path 为 `/`，domain 为空，secure 与 httponly 关闭。
#[derive(Debug, Clone, Default)]
pub struct CookieOptions {
    /// Cookie 生效的路径
    pub path: Option<String>,
    /// Cookie 生效的域名
    pub domain: Option<String>,
    /// 仅通过 HTTPS 发送
    pub secure: Option<bool>,
    /// 禁止脚本读取
    pub httponly: Option<bool>,
}

/// 一条完整的 Set-Cookie 指令描述。
///
/// 同名 Cookie 不做去重，响应按注册顺序逐条发出。
#[derive(Debug, Clone, PartialEq)]
pub struct CookieSpec {
    name: String,
    value: String,
    /// 绝对过期时间（Unix 秒），0 表示会话 Cookie
    ttl: i64,
    path: String,
    domain: String,
    secure: bool,
    httponly: bool,
}

impl CookieSpec {
    /// 将调用方实参与可选属性合并为完整的 Cookie 描述。
    ///
    /// `ttl` 在此处已经是绝对时间；相对时长到绝对时间的换算由
    /// `Response::cookie` 完成。
    pub fn new(name: &str, value: &str, ttl: i64, options: CookieOptions) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            ttl,
            path: options.path.unwrap_or_else(|| "/".to_string()),
            domain: options.domain.unwrap_or_default(),
            secure: options.secure.unwrap_or(false),
            httponly: options.httponly.unwrap_or(false),
        }
    }

    /// 渲染 `Set-Cookie` 标头的完整取值部分。
    ///
    /// 会话 Cookie（ttl 为 0）不携带 Expires 属性；空 domain 不输出
    /// Domain 属性；secure/httponly 仅在开启时追加标志。
    pub fn directive(&self) -> String {
        let mut directive = format!("{}={}", self.name, self.value);
        if self.ttl != 0 {
            directive.push_str(&format!("; Expires={}", format_expires(self.ttl)));
        }
        directive.push_str(&format!("; Path={}", self.path));
        if !self.domain.is_empty() {
            directive.push_str(&format!("; Domain={}", self.domain));
        }
        if self.secure {
            directive.push_str("; Secure");
        }
        if self.httponly {
            directive.push_str("; HttpOnly");
        }
        directive
    }
}

// --- Getter 访问器实现 ---

impl CookieSpec {
    /// 获取 Cookie 名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 获取 Cookie 取值
    pub fn value(&self) -> &str {
        &self.value
    }

    /// 获取绝对过期时间（Unix 秒），0 表示会话 Cookie
    pub fn ttl(&self) -> i64 {
        self.ttl
    }

    /// 获取生效路径
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 获取生效域名
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// 是否仅通过 HTTPS 发送
    pub fn secure(&self) -> bool {
        self.secure
    }

    /// 是否禁止脚本读取
    pub fn httponly(&self) -> bool {
        self.httponly
    }
}

/// 将绝对 Unix 秒格式化为 Cookie Expires 属性要求的 IMF-fixdate 文本
fn format_expires(ttl: i64) -> String {
    match Utc.timestamp_opt(ttl, 0).single() {
        Some(time) => time.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        // chrono 无法表示的时间戳按纪元起点处理
        None => Utc
            .timestamp_opt(0, 0)
            .unwrap()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 验证默认属性合并：path 为 /，domain 为空，两个布尔标志关闭
    #[test]
    fn test_cookie_defaults() {
        let cookie = CookieSpec::new("session", "abc123", 0, CookieOptions::default());

        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.value(), "abc123");
        assert_eq!(cookie.ttl(), 0);
        assert_eq!(cookie.path(), "/");
        assert_eq!(cookie.domain(), "");
        assert!(!cookie.secure());
        assert!(!cookie.httponly());
    }

    /// 验证调用方 options 覆盖默认值
    #[test]
    fn test_cookie_options_override_defaults() {
        let options = CookieOptions {
            path: Some("/admin".to_string()),
            domain: Some("example.com".to_string()),
            secure: Some(true),
            httponly: Some(true),
        };
        let cookie = CookieSpec::new("token", "xyz", 1893456000, options);

        assert_eq!(cookie.path(), "/admin");
        assert_eq!(cookie.domain(), "example.com");
        assert!(cookie.secure());
        assert!(cookie.httponly());
    }

    /// 会话 Cookie 的指令不携带 Expires 属性
    #[test]
    fn test_directive_session_cookie() {
        let cookie = CookieSpec::new("a", "v", 0, CookieOptions::default());
        let directive = cookie.directive();

        assert!(directive.starts_with("a=v"));
        assert!(!directive.contains("Expires="));
        assert!(directive.contains("Path=/"));
        assert!(!directive.contains("Domain="));
        assert!(!directive.contains("Secure"));
        assert!(!directive.contains("HttpOnly"));
    }

    /// 持久 Cookie 的指令携带 GMT 格式的 Expires 属性
    #[test]
    fn test_directive_with_expires() {
        // 2030-01-01 00:00:00 UTC
        let cookie = CookieSpec::new("a", "v", 1893456000, CookieOptions::default());
        let directive = cookie.directive();

        assert!(directive.contains("Expires=Tue, 01 Jan 2030 00:00:00 GMT"));
    }

    /// 完整属性集合的渲染顺序与标志位
    #[test]
    fn test_directive_full_attribute_set() {
        let options = CookieOptions {
            path: Some("/app".to_string()),
            domain: Some("example.com".to_string()),
            secure: Some(true),
            httponly: Some(true),
        };
        let cookie = CookieSpec::new("sid", "1", 1893456000, options);
        let directive = cookie.directive();

        assert!(directive.starts_with("sid=1; Expires="));
        assert!(directive.contains("; Path=/app"));
        assert!(directive.contains("; Domain=example.com"));
        assert!(directive.ends_with("; Secure; HttpOnly"));
    }
}
