// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应构建模块
//!
//! 该模块是整个库的核心，负责累积一次响应的全部状态（状态码、标头、
//! Cookie、正文、内容类型/字符集、缓存与压缩开关），并在终结操作
//! `send` 中按固定次序渲染到传输层。主要包括：
//! 1. 链式配置接口：全部返回 `&mut Self`，不做任何 I/O。
//! 2. 重定向辅助方法：发出标头后消费自身，终结本次请求处理。
//! 3. `send`：过滤器管线、ETag 条件响应、gzip 输出缓冲、
//!    content-length 结算与标头/Cookie 发送。
//!
//! 每个入站请求对应一个 `Response` 实例，由 `send` 或 `redirect`
//! 恰好消费一次，之后不可复用（由所有权系统保证）。

use crate::{
    config::Config,
    container::{ChunkedWriter, File, FileOptions, ResponseContainer, Stream},
    cookie::{CookieOptions, CookieSpec},
    exception::Exception,
    param::*,
    request::Request,
    transport::Transport,
};

use bytes::Bytes;
use chrono::Utc;
use flate2::{write::GzEncoder, Compression};
use log::{debug, error, warn};
use sha1::{Digest, Sha1};

use std::{collections::HashMap, io::Write, path::PathBuf};

/// 响应体过滤器：按注册顺序依次接收上一环的输出
pub type OutputFilter = Box<dyn Fn(Bytes) -> Bytes>;

/// 响应体：标量字节或自带发送逻辑的容器。
///
/// 以带标签的联合类型建模，避免在发送时做运行期类型探测。
pub enum Body {
    /// 普通的字节正文
    Scalar(Bytes),
    /// 自己负责全部输出的响应容器（流式/文件）
    Container(Box<dyn ResponseContainer>),
}

impl Default for Body {
    fn default() -> Self {
        Body::Scalar(Bytes::new())
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Scalar(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Scalar(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Scalar(Bytes::from(text))
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Scalar(Bytes::from(text.to_string()))
    }
}

/// 将另一个响应的正文取出作为本响应的正文（解包语义）
impl From<Response> for Body {
    fn from(response: Response) -> Self {
        response.body
    }
}

/// 一次 HTTP 响应的可变状态与发送逻辑。
pub struct Response {
    body: Body,
    content_type: String,
    charset: String,
    status_code: u16,
    /// 键为小写标头名，同名后写覆盖先写
    headers: HashMap<String, String>,
    /// 按注册顺序逐条发出，同名不去重
    cookies: Vec<CookieSpec>,
    output_compression: bool,
    response_cache: bool,
    output_filters: Vec<OutputFilter>,
    compression_level: u32,
}

impl Response {
    /// 构造一个使用默认参数的响应：200、`text/html`、UTF-8，
    /// 不开启缓存与压缩。
    pub fn new() -> Self {
        Self {
            body: Body::default(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            charset: DEFAULT_CHARSET.to_string(),
            status_code: 200,
            headers: HashMap::new(),
            cookies: Vec::new(),
            output_compression: false,
            response_cache: false,
            output_filters: Vec::new(),
            compression_level: Compression::default().level(),
        }
    }

    /// 按配置文件给定的默认值构造响应
    pub fn with_config(config: &Config) -> Self {
        let mut response = Self::new();
        response.content_type = config.default_content_type().to_string();
        response.charset = config.default_charset().to_string();
        response.compression_level = config.compression_level();
        response
    }
}

// --- 链式配置接口 ---

impl Response {
    /// 设置响应体。传入另一个 `Response` 时取出其正文（解包语义）。
    pub fn body(&mut self, body: impl Into<Body>) -> &mut Self {
        self.body = body.into();
        self
    }

    /// 设置内容类型，字符集保持不变
    pub fn content_type(&mut self, content_type: &str) -> &mut Self {
        self.content_type = content_type.to_string();
        self
    }

    /// 同时设置内容类型与字符集
    pub fn content_type_with_charset(&mut self, content_type: &str, charset: &str) -> &mut Self {
        self.content_type = content_type.to_string();
        self.charset = charset.to_string();
        self
    }

    /// 设置字符集
    pub fn charset(&mut self, charset: &str) -> &mut Self {
        self.charset = charset.to_string();
        self
    }

    /// 设置状态码。
    ///
    /// 只接受状态码表中存在的取值；未知状态码被静默忽略（保持原状态），
    /// 日志中会留下一条警告作为唯一的观测信号。
    pub fn status(&mut self, code: u16) -> &mut Self {
        if STATUS_CODES.contains_key(&code) {
            self.status_code = code;
        } else {
            warn!("忽略未知的HTTP状态码：{}", code);
        }
        self
    }

    /// 追加一个响应体过滤器，发送时按注册顺序执行
    pub fn filter(&mut self, filter: impl Fn(Bytes) -> Bytes + 'static) -> &mut Self {
        self.output_filters.push(Box::new(filter));
        self
    }

    /// 清空全部过滤器
    pub fn clear_filters(&mut self) -> &mut Self {
        self.output_filters.clear();
        self
    }

    /// 设置一条响应标头。标头名转为小写存储，同名后写覆盖先写。
    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    /// 清空全部响应标头
    pub fn clear_headers(&mut self) -> &mut Self {
        self.headers.clear();
        self
    }

    /// 追加一条 Cookie。
    ///
    /// `ttl` 为相对时长（秒）：大于 0 时换算为 `当前时间 + ttl` 的绝对
    /// 过期时间，否则记为 0（会话 Cookie）。同名 Cookie 不做去重。
    pub fn cookie(
        &mut self,
        name: &str,
        value: &str,
        ttl: i64,
        options: CookieOptions,
    ) -> &mut Self {
        let ttl = if ttl > 0 { Utc::now().timestamp() + ttl } else { 0 };
        self.cookies.push(CookieSpec::new(name, value, ttl, options));
        self
    }

    /// 删除一条客户端 Cookie：发出一条过期时间严格早于当前时间的
    /// 同名空值 Cookie，促使客户端移除。
    pub fn delete_cookie(&mut self, name: &str, options: CookieOptions) -> &mut Self {
        let expired = Utc::now().timestamp() - 3600;
        self.cookies.push(CookieSpec::new(name, "", expired, options));
        self
    }

    /// 清空全部待发送的 Cookie
    pub fn clear_cookies(&mut self) -> &mut Self {
        self.cookies.clear();
        self
    }

    /// 开关 ETag 条件响应（304 协商）
    pub fn cache(&mut self, enabled: bool) -> &mut Self {
        self.response_cache = enabled;
        self
    }

    /// 开关 gzip 输出压缩
    pub fn compress(&mut self, enabled: bool) -> &mut Self {
        self.output_compression = enabled;
        self
    }

    /// 构造一个流式响应容器，通常作为 `body` 的实参使用。
    /// 只做构造，不改动任何响应状态。
    pub fn stream(
        producer: impl FnOnce(&mut ChunkedWriter) -> Result<(), Exception> + 'static,
    ) -> Stream {
        Stream::new(producer)
    }

    /// 构造一个文件响应容器，通常作为 `body` 的实参使用。
    /// 只做构造，不改动任何响应状态。
    pub fn file(path: impl Into<PathBuf>, options: FileOptions) -> File {
        File::new(path, options)
    }
}

// --- 重定向辅助方法 ---

impl Response {
    /// 重定向到指定地址。
    ///
    /// 设置状态码与 `Location` 标头后立即发出标头区并消费自身：
    /// 不发送正文、不执行过滤器，之后的任何响应操作在编译期即被禁止。
    pub fn redirect(
        mut self,
        request: &Request,
        transport: &mut dyn Transport,
        location: &str,
        status_code: u16,
    ) -> Result<(), Exception> {
        self.status(status_code);
        self.header("Location", location);
        debug!("重定向至{}，状态码{}", location, self.status_code);
        self.send_headers(request, transport)?;
        transport.end_headers()
    }

    /// 重定向回来源页（请求的 referer），常用于表单提交后返回
    pub fn back(
        self,
        request: &Request,
        transport: &mut dyn Transport,
        status_code: u16,
    ) -> Result<(), Exception> {
        let location = request.referer().to_string();
        self.redirect(request, transport, &location, status_code)
    }
}

// --- 终结发送 ---

impl Response {
    /// 将累积的响应状态渲染到传输层，消费自身。
    ///
    /// 容器正文整体委托给容器的 `send` 契约；标量正文按以下次序处理：
    /// 过滤器管线 → ETag 协商（可能强制 304 并抑制正文）→ 无正文状态码
    /// 判定 → gzip 嵌套作用域（先于长度测量收尾）→ content-length 结算 →
    /// 状态行/标头/Cookie → 缓冲正文一次性刷出。
    pub fn send(
        mut self,
        request: &Request,
        transport: &mut dyn Transport,
    ) -> Result<(), Exception> {
        match std::mem::take(&mut self.body) {
            Body::Container(container) => container.send(request, self, transport),
            Body::Scalar(mut body) => {
                // 外层输出缓冲作用域从这里开始：正文先进入内存缓冲，
                // 待标头全部发出后一次性刷出
                for filter in &self.output_filters {
                    body = filter(body);
                }

                let mut send_body = true;
                if self.response_cache {
                    let hash = format!("\"{}\"", sha1_hex(&body));
                    self.header("ETag", &hash);
                    if request.header("if-none-match") == Some(hash.as_str()) {
                        debug!("if-none-match命中ETag {}，返回304", hash);
                        self.status_code = 304;
                        send_body = false;
                    }
                }

                let mut emitted: Vec<u8> = Vec::new();
                if send_body && !BODYLESS_STATUS.contains(&self.status_code) {
                    emitted = if self.output_compression {
                        // 嵌套的gzip作用域必须在测量长度之前收尾，
                        // content-length要反映压缩后的字节数
                        gzip(&body, self.compression_level)?
                    } else {
                        body.to_vec()
                    };
                    if !self.headers.contains_key("transfer-encoding") {
                        let length = emitted.len().to_string();
                        self.header("content-length", &length);
                    }
                }

                self.send_headers(request, transport)?;
                transport.end_headers()?;
                // 外层缓冲作用域收尾：刷出正文（可能为空）
                transport.send_body(&emitted)
            }
        }
    }

    /// 发出状态行、Content-Type、全部标头与全部 Cookie 指令。
    ///
    /// 状态行协议标记的选择：FCGI 环境使用 `Status:`，否则使用请求声明
    /// 的协议版本（缺省 `HTTP/1.1`）。字符集后缀仅在内容类型为文本类
    /// （`text/` 前缀，不区分大小写）或恰为 `application/json` /
    /// `application/xml` 时追加。
    ///
    /// 通常由 `send`/`redirect` 内部调用；响应容器的实现也会在接管
    /// 输出前调用它。
    pub fn send_headers(
        &mut self,
        request: &Request,
        transport: &mut dyn Transport,
    ) -> Result<(), Exception> {
        let protocol = match request.server(FCGI_SERVER_KEY) {
            Some(_) => FCGI_STATUS_TOKEN,
            None => request.server(SERVER_PROTOCOL_KEY).unwrap_or(DEFAULT_PROTOCOL),
        };

        let reason = match STATUS_CODES.get(&self.status_code) {
            Some(&reason) => reason,
            None => {
                error!(
                    "非法的状态码：{}。这条错误说明代码编写出现了错误。",
                    self.status_code
                );
                panic!();
            }
        };
        transport.send_status_line(protocol, self.status_code, reason)?;

        let mut content_type = self.content_type.clone();
        if content_type.to_lowercase().starts_with("text/")
            || content_type == "application/json"
            || content_type == "application/xml"
        {
            content_type = format!("{}; charset={}", content_type, self.charset);
        }
        transport.send_header("Content-Type", &content_type)?;

        for (name, value) in &self.headers {
            transport.send_header(name, value)?;
        }
        for cookie in &self.cookies {
            transport.send_cookie(cookie)?;
        }
        Ok(())
    }
}

// --- Getter 访问器实现 ---

impl Response {
    /// 获取当前状态码
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// 获取当前状态码对应的原因短语
    pub fn information(&self) -> &'static str {
        STATUS_CODES.get(&self.status_code).copied().unwrap_or("")
    }

    /// 获取当前的标头映射（键为小写标头名）
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// 获取当前累积的 Cookie 列表
    pub fn cookies(&self) -> &[CookieSpec] {
        &self.cookies
    }
}

/// 计算正文的 SHA-1 摘要并渲染为小写十六进制文本
fn sha1_hex(data: &[u8]) -> String {
    let digest = Sha1::digest(data);
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// gzip 压缩输出作用域：写入全部正文后收尾，返回压缩后的字节
fn gzip(data: &[u8], level: u32) -> Result<Vec<u8>, Exception> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
    let result = encoder.write_all(data).and_then(|_| encoder.finish());
    match result {
        Ok(compressed) => {
            debug!(
                "gzip压缩完成，原始大小: {} bytes, 压缩后: {} bytes",
                data.len(),
                compressed.len()
            );
            Ok(compressed)
        }
        Err(e) => {
            error!("gzip压缩响应体失败: {}", e);
            Err(Exception::CompressFailed)
        }
    }
}
