// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求协作对象模块
//!
//! 该模块定义了响应构建器消费的只读请求视图 `Request`。它涵盖了：
//! 1. 大小写不敏感的请求标头查询（如 `if-none-match`、`referer`）。
//! 2. 服务器变量查询（如 `SERVER_PROTOCOL`、`FCGI_SERVER_VERSION`）。
//! 3. 从 TCP 流原始字节码解析请求行与标头的 `try_from` 构造器，
//!    供演示服务端与集成测试使用。
//!
//! 响应层只读取该对象，从不修改它。

use crate::{exception::Exception, param::*};
use log::error;
use std::collections::HashMap;

/// 表示一个入站 HTTP 请求的只读元数据视图。
///
/// 该结构体不包含请求体（Body），只保留响应构建所需的标头与服务器变量。
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// 请求标头，键为小写标头名
    headers: HashMap<String, String>,
    /// 服务器变量（请求行解析产物与宿主环境注入值）
    server: HashMap<String, String>,
}

impl Request {
    /// 构造一个空请求视图。
    ///
    /// 标头与服务器变量可通过 [`Request::set_header`] 和
    /// [`Request::set_server`] 逐条填充，主要供测试与手工装配场景使用。
    pub fn new() -> Self {
        Self::default()
    }

    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 逻辑步骤
    /// 1. 验证编码：确保请求数据是合法的 UTF-8 字符串。
    /// 2. 解析请求行：提取方法、路径和协议版本，写入服务器变量
    ///    `REQUEST_METHOD`、`REQUEST_URI`、`SERVER_PROTOCOL`。
    /// 3. 迭代解析标头：所有标头以小写键存入映射，供大小写不敏感查询。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的原始数据。
    /// * `id` - 全局请求 ID，用于在多线程环境下追踪日志。
    ///
    /// # 错误处理
    /// 请求不是合法 UTF-8 或请求行结构残缺时，返回相应的 `Exception`。
    pub fn try_from(buffer: &Vec<u8>, id: u128) -> Result<Self, Exception> {
        // 1. 将字节流转换为字符串，失败则判定为非法的 HTTP 请求
        let request_string = match String::from_utf8(buffer.to_vec()) {
            Ok(string) => string,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let request_lines: Vec<&str> = request_string.split(CRLF).collect();

        // 2. 解析请求行 (e.g., "GET /index.html HTTP/1.1")
        let first_line_parts: Vec<&str> = request_lines[0].split(' ').collect();

        if first_line_parts.len() < 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_lines[0]);
            return Err(Exception::MalformedRequestLine);
        }

        let mut request = Self::new();
        request.set_server("REQUEST_METHOD", &first_line_parts[0].to_uppercase());
        // 路径中可能包含空格，虽然不规范但通过 join 尝试恢复
        let path = if first_line_parts.len() == 3 {
            first_line_parts[1].to_string()
        } else {
            first_line_parts[1..first_line_parts.len() - 1].join(" ")
        };
        request.set_server("REQUEST_URI", &path);
        request.set_server(
            SERVER_PROTOCOL_KEY,
            &first_line_parts.last().unwrap().to_uppercase(),
        );

        // 3. 迭代各行解析 Headers，空行标志标头区结束
        for line in &request_lines[1..] {
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(": ") {
                request.set_header(name, value);
            }
        }

        Ok(request)
    }

    /// 写入一条请求标头，标头名统一转为小写存储
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    /// 写入一个服务器变量
    pub fn set_server(&mut self, key: &str, value: &str) -> &mut Self {
        self.server.insert(key.to_string(), value.to_string());
        self
    }
}

// --- Getter 访问器实现 ---

impl Request {
    /// 按标头名查询请求标头，查询不区分大小写
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|v| v.as_str())
    }

    /// 按键名查询服务器变量；默认值由调用方通过 `unwrap_or` 提供
    pub fn server(&self, key: &str) -> Option<&str> {
        self.server.get(key).map(|v| v.as_str())
    }

    /// 获取来源页地址，缺失时返回空字符串
    pub fn referer(&self) -> &str {
        self.header("referer").unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 验证常规 GET 请求的解析，包括请求行变量和标头
    #[test]
    fn test_parse_get_request() {
        let request_str = "GET /index.html HTTP/1.1\r\nHost: localhost:7878\r\nUser-Agent: Test-Browser\r\nIf-None-Match: \"abc\"\r\n\r\n";
        let buffer = request_str.as_bytes().to_vec();

        let request = Request::try_from(&buffer, 0).unwrap();

        assert_eq!(request.server("REQUEST_METHOD"), Some("GET"));
        assert_eq!(request.server("REQUEST_URI"), Some("/index.html"));
        assert_eq!(request.server(SERVER_PROTOCOL_KEY), Some("HTTP/1.1"));
        assert_eq!(request.header("user-agent"), Some("Test-Browser"));
        assert_eq!(request.header("if-none-match"), Some("\"abc\""));
    }

    /// 验证标头查询的大小写不敏感性
    #[test]
    fn test_case_insensitive_headers() {
        let request_str = "GET / HTTP/1.1\r\nhost: localhost:7878\r\nReferer: http://example.com/prev\r\n\r\n";
        let buffer = request_str.as_bytes().to_vec();

        let request = Request::try_from(&buffer, 0).unwrap();

        assert_eq!(request.header("Host"), Some("localhost:7878"));
        assert_eq!(request.header("HOST"), Some("localhost:7878"));
        assert_eq!(request.referer(), "http://example.com/prev");
    }

    /// 验证 UTF-8 编码检查
    #[test]
    fn test_invalid_utf8() {
        let buffer = vec![0xFF, 0xFE, 0xFD];

        let result = Request::try_from(&buffer, 0);

        assert!(result.is_err());
        match result.unwrap_err() {
            Exception::RequestIsNotUtf8 => {}
            _ => panic!("Expected RequestIsNotUtf8 error"),
        }
    }

    /// 残缺的请求行应当被拒绝
    #[test]
    fn test_malformed_request_line() {
        let request_str = "GET /\r\nHost: localhost:7878\r\n\r\n";
        let buffer = request_str.as_bytes().to_vec();

        let result = Request::try_from(&buffer, 0);

        assert!(result.is_err());
        match result.unwrap_err() {
            Exception::MalformedRequestLine => {}
            _ => panic!("Expected MalformedRequestLine error"),
        }
    }

    /// 确保带查询参数的路径能完整提取
    #[test]
    fn test_path_with_query_string() {
        let request_str = "GET /page?id=123&name=test HTTP/1.1\r\nHost: localhost:7878\r\n\r\n";
        let buffer = request_str.as_bytes().to_vec();

        let request = Request::try_from(&buffer, 0).unwrap();

        assert_eq!(request.server("REQUEST_URI"), Some("/page?id=123&name=test"));
    }

    /// 空白请求视图的缺省查询行为
    #[test]
    fn test_empty_request_defaults() {
        let request = Request::new();

        assert_eq!(request.header("if-none-match"), None);
        assert_eq!(request.server(SERVER_PROTOCOL_KEY), None);
        assert_eq!(request.referer(), "");
    }

    /// 请求体之后的行不应被当作标头解析
    #[test]
    fn test_headers_stop_at_empty_line() {
        let request_str =
            "POST /submit HTTP/1.1\r\nHost: localhost:7878\r\n\r\nnot-a-header: value";
        let buffer = request_str.as_bytes().to_vec();

        let request = Request::try_from(&buffer, 0).unwrap();

        assert_eq!(request.header("not-a-header"), None);
    }

    /// 手工装配的服务器变量可被查询到
    #[test]
    fn test_manual_server_vars() {
        let mut request = Request::new();
        request
            .set_server(FCGI_SERVER_KEY, "1")
            .set_header("X-Custom", "yes");

        assert_eq!(request.server(FCGI_SERVER_KEY), Some("1"));
        assert_eq!(request.header("x-custom"), Some("yes"));
    }
}
