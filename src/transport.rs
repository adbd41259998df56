// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 传输层模块
//!
//! 该模块把宿主运行时的「原生 HTTP 输出原语」抽象为 `Transport` 特征：
//! 状态行、标头行、Set-Cookie 指令、标头区结束符以及响应体字节。
//! `Response` 只对这组原语编程，不关心字节最终去向。
//!
//! `HttpTransport` 是默认实现，向任意 `std::io::Write`
//! 汇（TCP 流、内存缓冲、文件）渲染 HTTP/1.1 报文文本。

use crate::{cookie::CookieSpec, exception::Exception, param::CRLF};
use log::error;
use std::io::Write;

/// 宿主运行时的原生 HTTP 输出原语。
///
/// 各方法的调用次序由 `Response::send` 保证：恰好一条状态行、一条
/// Content-Type、若干标头行、若干 Cookie 指令、一次标头区结束，随后才是
/// 响应体字节。
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// 发出状态行。`protocol` 为 `HTTP/1.1` 这样的版本标记，或 FCGI 环境
    /// 下的 `Status:` 标记。
    fn send_status_line(&mut self, protocol: &str, code: u16, reason: &str)
        -> Result<(), Exception>;

    /// 发出一条 `名称: 取值` 标头行
    fn send_header(&mut self, name: &str, value: &str) -> Result<(), Exception>;

    /// 发出一条携带完整属性集的 Set-Cookie 指令
    fn send_cookie(&mut self, cookie: &CookieSpec) -> Result<(), Exception>;

    /// 结束标头区（HTTP 报文中的空行）
    fn end_headers(&mut self) -> Result<(), Exception>;

    /// 发出一段响应体字节，可多次调用以分块发送
    fn send_body(&mut self, chunk: &[u8]) -> Result<(), Exception>;
}

/// 向任意 `Write` 汇渲染 HTTP/1.1 报文文本的默认传输实现。
pub struct HttpTransport<W: Write> {
    writer: W,
}

impl<W: Write> HttpTransport<W> {
    /// 包装一个底层写入器
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// 取回底层写入器，通常在响应发送完毕后用于回收缓冲区
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for HttpTransport<W> {
    fn send_status_line(
        &mut self,
        protocol: &str,
        code: u16,
        reason: &str,
    ) -> Result<(), Exception> {
        write!(self.writer, "{} {} {}{}", protocol, code, reason, CRLF).map_err(|e| {
            error!("写入状态行失败: {}", e);
            Exception::TransportWrite
        })
    }

    fn send_header(&mut self, name: &str, value: &str) -> Result<(), Exception> {
        write!(self.writer, "{}: {}{}", name, value, CRLF).map_err(|e| {
            error!("写入响应标头{}失败: {}", name, e);
            Exception::TransportWrite
        })
    }

    fn send_cookie(&mut self, cookie: &CookieSpec) -> Result<(), Exception> {
        write!(self.writer, "Set-Cookie: {}{}", cookie.directive(), CRLF).map_err(|e| {
            error!("写入Set-Cookie指令{}失败: {}", cookie.name(), e);
            Exception::TransportWrite
        })
    }

    fn end_headers(&mut self) -> Result<(), Exception> {
        self.writer.write_all(CRLF.as_bytes()).map_err(|e| {
            error!("写入标头结束符失败: {}", e);
            Exception::TransportWrite
        })
    }

    fn send_body(&mut self, chunk: &[u8]) -> Result<(), Exception> {
        self.writer
            .write_all(chunk)
            .and_then(|_| self.writer.flush())
            .map_err(|e| {
                error!("写入响应体失败: {}", e);
                Exception::TransportWrite
            })
    }
}
