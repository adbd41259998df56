// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 响应容器模块
//!
//! 标量正文之外的另一条发送路径：正文本身携带发送逻辑。
//! `Response::send` 检测到容器正文时整体委托给容器的 `send` 契约，
//! 此后标头与正文的全部输出都由容器负责。
//!
//! 内置两种容器：
//! - `Stream`：调用方提供生产者闭包，以 chunked 编码分块推送正文，
//!   适合长度未知或逐步生成的内容。
//! - `File`：按路径发送磁盘文件，自动推断 MIME 类型、结算
//!   content-length，并以固定大小的块读取转发，避免整文件驻留内存。

use crate::{
    exception::Exception,
    param::{CRLF, FILE_CHUNK_SIZE, MIME_TYPES},
    request::Request,
    response::{Body, Response},
    transport::Transport,
    util::format_file_size,
};

use log::{debug, error};

use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};

/// 自带发送逻辑的响应容器契约。
///
/// 实现方接管该响应的全部输出：先通过 `response` 上累积的状态发出
/// 标头，然后自行向 `transport` 写入正文。
pub trait ResponseContainer {
    /// 发送整个响应。`response` 按值传入并被消费，与标量路径的
    /// 「恰好消费一次」语义保持一致。
    fn send(
        self: Box<Self>,
        request: &Request,
        response: Response,
        transport: &mut dyn Transport,
    ) -> Result<(), Exception>;
}

/// 面向流式生产者的 chunked 块写入器。
///
/// 每次 `write` 发出一个带十六进制长度前缀的数据块；终止块由
/// `Stream::send` 在生产者返回后统一发出。
pub struct ChunkedWriter<'a> {
    transport: &'a mut dyn Transport,
}

impl<'a> ChunkedWriter<'a> {
    fn new(transport: &'a mut dyn Transport) -> Self {
        Self { transport }
    }

    /// 推送一个数据块。空块直接忽略，空块在 chunked 编码中意味着结束。
    pub fn write(&mut self, chunk: &[u8]) -> Result<(), Exception> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.transport
            .send_body(format!("{:x}{}", chunk.len(), CRLF).as_bytes())?;
        self.transport.send_body(chunk)?;
        self.transport.send_body(CRLF.as_bytes())
    }
}

/// 生产者闭包：通过 `ChunkedWriter` 逐块推送正文
type StreamProducer = Box<dyn FnOnce(&mut ChunkedWriter) -> Result<(), Exception>>;

/// 流式响应容器。
pub struct Stream {
    producer: StreamProducer,
}

impl Stream {
    /// 包装一个生产者闭包，构造流式容器
    pub fn new(
        producer: impl FnOnce(&mut ChunkedWriter) -> Result<(), Exception> + 'static,
    ) -> Self {
        Self {
            producer: Box::new(producer),
        }
    }
}

impl ResponseContainer for Stream {
    fn send(
        self: Box<Self>,
        request: &Request,
        mut response: Response,
        transport: &mut dyn Transport,
    ) -> Result<(), Exception> {
        response.header("transfer-encoding", "chunked");
        response.send_headers(request, transport)?;
        transport.end_headers()?;

        let mut writer = ChunkedWriter::new(&mut *transport);
        (self.producer)(&mut writer)?;

        // chunked 编码的终止块
        transport.send_body(format!("0{}{}", CRLF, CRLF).as_bytes())
    }
}

/// 文件响应的可选参数。
///
/// 未提供 `content_type` 时按扩展名查 MIME 表；提供了 `file_name` 或
/// `disposition` 任意一项时发出 content-disposition 标头（处置方式
/// 缺省为 attachment，文件名缺省为路径的最后一段）。
#[derive(Debug, Clone, Default)]
pub struct FileOptions {
    /// 覆盖自动推断的内容类型
    pub content_type: Option<String>,
    /// 下载对话框展示的文件名
    pub file_name: Option<String>,
    /// 内容处置方式（attachment / inline）
    pub disposition: Option<String>,
}

/// 文件响应容器。
pub struct File {
    path: PathBuf,
    options: FileOptions,
}

impl File {
    /// 记录路径与可选参数，构造文件容器。此时不触碰文件系统，
    /// 一切 I/O 推迟到发送阶段。
    pub fn new(path: impl Into<PathBuf>, options: FileOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }
}

impl ResponseContainer for File {
    fn send(
        self: Box<Self>,
        request: &Request,
        mut response: Response,
        transport: &mut dyn Transport,
    ) -> Result<(), Exception> {
        let metadata = match fs::metadata(&self.path) {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => {
                error!("路径{}不是常规文件", self.path.display());
                return Err(Exception::FileNotFound);
            }
            Err(e) => {
                error!("无法获取文件{}的元数据: {}", self.path.display(), e);
                return Err(Exception::FileNotFound);
            }
        };

        let content_type = match &self.options.content_type {
            Some(content_type) => content_type.clone(),
            None => mime_for(&self.path).to_string(),
        };
        response.content_type(&content_type);
        response.header("content-length", &metadata.len().to_string());

        if self.options.disposition.is_some() || self.options.file_name.is_some() {
            let disposition = self.options.disposition.as_deref().unwrap_or("attachment");
            let file_name = match &self.options.file_name {
                Some(name) => Some(name.clone()),
                None => self
                    .path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(String::from),
            };
            let value = match file_name {
                Some(name) => format!("{}; filename=\"{}\"", disposition, name),
                None => disposition.to_string(),
            };
            response.header("content-disposition", &value);
        }

        debug!(
            "发送文件{}，类型: {}，大小: {}",
            self.path.display(),
            content_type,
            format_file_size(metadata.len())
        );

        response.send_headers(request, transport)?;
        transport.end_headers()?;

        let mut file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                error!("无法打开文件{}: {}", self.path.display(), e);
                return Err(Exception::FileReadFailed);
            }
        };
        let mut buffer = vec![0u8; FILE_CHUNK_SIZE];
        loop {
            match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => transport.send_body(&buffer[..n])?,
                Err(e) => {
                    error!("读取文件{}失败: {}", self.path.display(), e);
                    return Err(Exception::FileReadFailed);
                }
            }
        }
        Ok(())
    }
}

impl From<Stream> for Body {
    fn from(stream: Stream) -> Self {
        Body::Container(Box::new(stream))
    }
}

impl From<File> for Body {
    fn from(file: File) -> Self {
        Body::Container(Box::new(file))
    }
}

/// 按扩展名推断 MIME 类型，未识别的后缀回落到二进制流类型
fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|extension| extension.to_str()) {
        Some(extension) => MIME_TYPES
            .get(extension)
            .copied()
            .unwrap_or("application/octet-stream"),
        None => "application/octet-stream",
    }
}
