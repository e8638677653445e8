use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ratelimiter::{AdmissionLayer, LeakyBucket, TokenBucket};

use std::convert::Infallible;
use std::time::Duration;
use tower::{service_fn, Service, ServiceBuilder};

fn token_bucket_try_acquire(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let _guard = rt.enter();
    // Refills faster than the bench drains, so both outcomes get exercised.
    let bucket = TokenBucket::new(1_000, Duration::from_micros(10)).unwrap();

    c.bench_function("token_bucket_try_acquire", |b| {
        b.iter(|| black_box(bucket.try_acquire()));
    });
}

fn leaky_bucket_allow(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let _guard = rt.enter();
    let bucket = LeakyBucket::new(1_000, Duration::from_micros(10), 100).unwrap();

    c.bench_function("leaky_bucket_allow", |b| {
        b.iter(|| black_box(bucket.allow()));
    });
}

fn admission_layer_rejecting(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let bucket = {
        let _guard = rt.enter();
        TokenBucket::new(0, Duration::from_secs(60)).unwrap()
    };
    let svc = ServiceBuilder::new()
        .layer(AdmissionLayer::new(bucket))
        .service(service_fn(|req: &'static str| async move { Ok::<_, Infallible>(req) }));

    c.bench_function("admission_layer_rejecting", |b| {
        b.to_async(&rt).iter(|| async {
            let mut local_svc = svc.clone();
            let _ = black_box(local_svc.call(black_box("request"))).await;
        });
    });
}

criterion_group!(benches, token_bucket_try_acquire, leaky_bucket_allow, admission_layer_rejecting);
criterion_main!(benches);
