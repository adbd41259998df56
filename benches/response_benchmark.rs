use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use responder::{CookieOptions, HttpTransport, Request, Response};

fn build_response_benchmark(c: &mut Criterion) {
    c.bench_function("build_response_fluent", |b| {
        b.iter(|| {
            let mut response = Response::new();
            response
                .status(black_box(200))
                .content_type("application/json")
                .header("X-Request-Id", "bench")
                .cookie("session", "abc123", 3600, CookieOptions::default())
                .body(black_box("{\"ok\":true}"));
            response
        });
    });
}

fn send_plain_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("send_plain");

    for size in [1024usize, 65536].iter() {
        let payload = "a".repeat(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            let request = Request::new();
            b.iter(|| {
                let mut response = Response::new();
                response.body(payload.as_str()).content_type("text/plain");
                let mut transport = HttpTransport::new(Vec::with_capacity(payload.len() + 256));
                response.send(&request, &mut transport).unwrap();
                black_box(transport.into_inner())
            });
        });
    }

    group.finish();
}

fn send_gzip_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("send_gzip");

    for size in [1024usize, 65536].iter() {
        let payload = "responder ".repeat(*size / 10);
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            let request = Request::new();
            b.iter(|| {
                let mut response = Response::new();
                response
                    .body(payload.as_str())
                    .content_type("text/plain")
                    .compress(true);
                let mut transport = HttpTransport::new(Vec::new());
                response.send(&request, &mut transport).unwrap();
                black_box(transport.into_inner())
            });
        });
    }

    group.finish();
}

fn etag_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("etag");

    let payload = "cacheable ".repeat(1000);

    group.bench_function("first_visit", |b| {
        let request = Request::new();
        b.iter(|| {
            let mut response = Response::new();
            response.body(payload.as_str()).cache(true);
            let mut transport = HttpTransport::new(Vec::new());
            response.send(&request, &mut transport).unwrap();
            black_box(transport.into_inner())
        });
    });

    group.bench_function("not_modified_revisit", |b| {
        // 先取得ETag，再用携带if-none-match的请求测量304路径
        let mut probe = Response::new();
        probe.body(payload.as_str()).cache(true);
        let mut transport = HttpTransport::new(Vec::new());
        probe.send(&Request::new(), &mut transport).unwrap();
        let raw = String::from_utf8(transport.into_inner()).unwrap();
        let etag = raw
            .split("\r\n")
            .find(|line| line.starts_with("etag"))
            .and_then(|line| line.split(": ").nth(1))
            .unwrap()
            .to_string();

        let mut request = Request::new();
        request.set_header("If-None-Match", &etag);
        b.iter(|| {
            let mut response = Response::new();
            response.body(payload.as_str()).cache(true);
            let mut transport = HttpTransport::new(Vec::new());
            response.send(&request, &mut transport).unwrap();
            black_box(transport.into_inner())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    build_response_benchmark,
    send_plain_benchmark,
    send_gzip_benchmark,
    etag_benchmark
);
criterion_main!(benches);
