// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 响应构建器演示服务端
//!
//! 该二进制程序把 `responder` 库端到端跑起来：接收 TCP 连接、解析请求、
//! 用响应构建器装配各种形态的响应（HTML + Cookie + ETag、JSON、gzip 压缩、
//! 文件下载、chunked 流式输出、重定向），再把渲染好的报文写回连接。
//! 它只是库的演示载体，路由与连接管理都刻意保持简单。

// --- 模块定义 ---
mod config;     // 配置解析与管理
mod container;  // 流式/文件响应容器
mod cookie;     // Cookie 值对象
mod exception;  // 自定义异常与错误处理
mod param;      // 全局常量与静态参数
mod request;    // HTTP 请求只读视图与解析器
mod response;   // HTTP 响应构建器
mod transport;  // 传输层抽象与 HTTP/1.1 渲染
mod util;       // 通用工具函数

use config::Config;
use container::FileOptions;
use cookie::CookieOptions;
use request::Request;
use response::Response;
use transport::HttpTransport;
use util::HtmlBuilder;

use log::{debug, error, info, warn};
use log4rs;
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    runtime::Builder,
};

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    sync::Arc,
    time::Instant,
};

/// # 程序入口点
///
/// 初始化日志与配置，按配置启动多线程运行时并进入接收循环。
fn main() {
    // 1. 初始化日志系统：采用 log4rs 异步日志架构，通过外部 YAML 灵活配置级别与输出目的地
    log4rs::init_file("config/log4rs.yaml", Default::default()).unwrap();

    // 2. 环境配置加载：从 TOML 文件读取运行参数与响应默认值
    let config = Config::from_toml("config/development.toml");
    info!("配置文件已载入");

    // 3. 异步运行时定制：根据配置文件动态分配工作线程数
    let worker_threads = config.worker_threads();
    let runtime = Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()
        .unwrap();

    let config_arc = Arc::new(config);

    runtime.block_on(async {
        // 4. 网络层初始化：支持全地址监听 (0.0.0.0) 或本地回环监听 (127.0.0.1)
        let port: u16 = config_arc.port();
        let address = match config_arc.local() {
            true => Ipv4Addr::new(127, 0, 0, 1),
            false => Ipv4Addr::new(0, 0, 0, 0),
        };
        info!("服务端将在{}:{}上监听Socket连接", address, port);
        let socket = SocketAddrV4::new(address, port);

        let listener = match TcpListener::bind(socket).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("无法绑定端口：{}，错误：{}", port, e);
                panic!("无法绑定端口：{}，错误：{}", port, e);
            }
        };
        info!("端口{}绑定完成", port);

        let mut id: u128 = 0;

        // 5. 主事件循环 (Accept Loop)
        loop {
            let (mut stream, addr) = listener.accept().await.unwrap();
            debug!("[ID{}]新的连接：{}", id, addr);

            let config_clone = Arc::clone(&config_arc);
            tokio::spawn(async move {
                handle_connection(&mut stream, id, config_clone).await;
            });
            id += 1;
        }
    });
}

/// # 连接处理器
///
/// 负责单个 TCP 流的生命周期：读取解析请求、装配响应、写回渲染结果。
async fn handle_connection(stream: &mut TcpStream, id: u128, config: Arc<Config>) {
    let mut buffer = vec![0; 4096];

    // 等待流进入可读状态
    stream.readable().await.unwrap();

    // 尝试非阻塞读取 HTTP 报文
    match stream.try_read(&mut buffer) {
        Ok(0) => return, // 客户端主动关闭连接
        Err(e) => {
            error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
            return;
        }
        _ => {}
    }
    debug!("[ID{}]HTTP请求接收完毕", id);

    let start_time = Instant::now();

    // 1. 协议解析阶段：将字节流转换为只读的 Request 视图
    let request = match Request::try_from(&buffer, id) {
        Ok(req) => req,
        Err(e) => {
            error!("[ID{}]解析HTTP请求失败: {:?}", id, e);
            let response = "HTTP/1.1 400 Bad Request\r\nContent-Length: 11\r\n\r\nBad Request";
            let _ = stream.write_all(response.as_bytes()).await;
            return;
        }
    };
    debug!("[ID{}]成功解析HTTP请求", id);

    let path = request
        .server("REQUEST_URI")
        .unwrap_or("/")
        .split('?')
        .next()
        .unwrap()
        .to_string();

    // 2. 响应装配与渲染阶段：所有输出先进入内存缓冲
    let mut transport = HttpTransport::new(Vec::new());
    let result = build_response(&path, &request, id, &config)
        .and_then(|outcome| match outcome {
            Outcome::Send(response) => {
                let status = response.status_code();
                let r = response.send(&request, &mut transport);
                r.map(|_| status)
            }
            Outcome::Redirect(response, location) => {
                let status = 302;
                response
                    .redirect(&request, &mut transport, &location, status)
                    .map(|_| status)
            }
            Outcome::Back(response) => {
                response.back(&request, &mut transport, 302).map(|_| 302)
            }
        });

    let status = match result {
        Ok(status) => status,
        Err(e) => {
            error!("[ID{}]响应发送失败: {}", id, e);
            return;
        }
    };

    debug!(
        "[ID{}]HTTP响应渲染完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );

    // 3. 结构化日志记录：便于后期审计与性能监控
    info!(
        "[ID{}] {}, {}, {}, {}",
        id,
        request.server("REQUEST_METHOD").unwrap_or("-"),
        path,
        status,
        request.header("user-agent").unwrap_or("-"),
    );

    // 4. 数据发送阶段：渲染好的报文一次性写回连接
    let bytes = transport.into_inner();
    let _ = stream.write_all(&bytes).await;
    let _ = stream.flush().await;
}

/// 路由产物：常规发送、带目标地址的重定向，或回跳来源页
enum Outcome {
    Send(Response),
    Redirect(Response, String),
    Back(Response),
}

/// # 演示路由
///
/// 将请求路径映射为一个装配好的响应：
/// 1. `/` -> HTML 欢迎页，演示 Cookie、ETag 缓存与过滤器。
/// 2. `/api/status` -> JSON 负载，客户端声明支持时开启 gzip。
/// 3. `/download` -> 文件容器下载。
/// 4. `/stream` -> chunked 流式输出。
/// 5. `/old` -> 重定向回首页；`/back` -> 重定向回来源页。
fn build_response(
    path: &str,
    request: &Request,
    id: u128,
    config: &Config,
) -> Result<Outcome, exception::Exception> {
    let accepts_gzip = request
        .header("accept-encoding")
        .map_or(false, |encoding| encoding.contains("gzip"));

    let outcome = match path {
        "/" => {
            debug!("[ID{}]装配HTML欢迎页", id);
            let mut response = Response::with_config(config);
            response
                .body("<h1>responder</h1><p>HTTP响应构建器演示</p>")
                .cookie("visited", "1", 86400, CookieOptions::default())
                .cache(true)
                .filter(|body| {
                    let mut page = body.to_vec();
                    page.extend_from_slice("<hr><p>由responder生成</p>".as_bytes());
                    bytes::Bytes::from(page)
                });
            Outcome::Send(response)
        }
        "/api/status" => {
            debug!("[ID{}]装配JSON状态响应，gzip: {}", id, accepts_gzip);
            let payload = serde_json::json!({
                "name": "responder",
                "status": "ok",
            });
            let mut response = Response::with_config(config);
            response
                .body(payload.to_string())
                .content_type("application/json")
                .compress(accepts_gzip);
            if accepts_gzip {
                response.header("Content-Encoding", "gzip");
            }
            Outcome::Send(response)
        }
        "/download" => {
            debug!("[ID{}]装配文件下载响应", id);
            let options = FileOptions {
                file_name: Some("hello.txt".to_string()),
                ..Default::default()
            };
            let mut response = Response::with_config(config);
            response.body(Response::file("static/hello.txt", options));
            Outcome::Send(response)
        }
        "/stream" => {
            debug!("[ID{}]装配流式响应", id);
            let mut response = Response::with_config(config);
            response.content_type("text/plain");
            response.body(Response::stream(|writer| {
                for index in 0..5 {
                    writer.write(format!("chunk {}\n", index).as_bytes())?;
                }
                Ok(())
            }));
            Outcome::Send(response)
        }
        "/old" => {
            debug!("[ID{}]路径已迁移，重定向回首页", id);
            Outcome::Redirect(Response::with_config(config), "/".to_string())
        }
        "/back" => {
            debug!("[ID{}]重定向回来源页：{}", id, request.referer());
            Outcome::Back(Response::with_config(config))
        }
        _ => {
            warn!("[ID{}]请求的路径：{} 不存在，返回404", id, path);
            let page = HtmlBuilder::from_status_code(404, Some("<h2>噢！</h2><p>你指定的网页无法找到。</p>")).build();
            let mut response = Response::with_config(config);
            response.body(page).status(404);
            Outcome::Send(response)
        }
    };
    Ok(outcome)
}
