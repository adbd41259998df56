// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了响应在渲染与发送生命周期中可能抛出的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖了传输层写入错误、压缩编码错误、文件容器的文件系统
//!   错误以及请求解析错误。
//! - **配置零异常**：响应的各个配置方法（状态码、标头、Cookie 等）从不产生
//!   异常；非法输入会被静默忽略，只有发送阶段才会返回 `Exception`。
//! - **用户友好**：通过实现 `std::fmt::Display`，确保错误信息可以被安全地
//!   记录到日志或返回给客户端。

use std::fmt;

/// 响应发送过程中发生的异常类型。
///
/// 该枚举通常作为 `Result` 的 `Err` 部分返回，用于指示处理失败的具体原因。
/// 底层错误（如 `io::Error`）在失败现场通过日志记录，不在此处携带。
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Exception {
    /// 向传输层写入状态行、标头或响应体失败。通常意味着对端已断开连接。
    TransportWrite,
    /// gzip 压缩输出作用域写入或收尾失败。
    CompressFailed,
    /// 文件容器指定的路径不存在或无法获取元数据。在 Web 语义中对应 `404 Not Found`。
    FileNotFound,
    /// 文件容器打开或读取文件失败。对应 `500 Internal Server Error`。
    FileReadFailed,
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行不满足 `方法 路径 协议` 的基本结构，无法提取服务器变量。
    MalformedRequestLine,
}

use Exception::*;

/// 为 `Exception` 实现 `Display` 特性，使其支持字符串格式化输出。
impl fmt::Display for Exception {
    /// 根据错误类型写入人类可读的描述文本。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportWrite => write!(f, "Failed to write to the underlying transport"),
            CompressFailed => write!(f, "Gzip output buffering failed"),
            FileNotFound => write!(f, "File not found (404)"),
            FileReadFailed => write!(f, "Couldn't read file contents"),
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            MalformedRequestLine => write!(f, "Malformed HTTP request line"),
        }
    }
}
