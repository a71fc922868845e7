#![allow(
    missing_docs,
    clippy::missing_docs_in_private_items,
    unused_results,
    clippy::unwrap_used
)]

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use etl_grpc::callback::{Counter, Echo, Hl7Ack};
use etl_grpc::handler::TransformHandler;
use etl_grpc::proto::transform::transform_payload::Content;
use etl_grpc::proto::transform::TransformPayload;
use etl_grpc::transitive::transform_client;
use std::time::Duration;

const ADT: &[u8] = b"MSH|^~\\&|SENDER|SENDFAC|RECEIVER|RECVFAC|20240101120000||ADT^A01|MSG00001|P|2.5\r\
    PID|1||12345^^^^MR^HOSP&1.2.3.4&ISO||DOE^JOHN\r";

fn create_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap()
}

fn payload(content: Content) -> TransformPayload {
    TransformPayload {
        content: Some(content),
    }
}

fn transform(c: &mut Criterion) {
    let runtime = create_runtime();
    let client = runtime.block_on(async {
        let handler = TransformHandler::new()
            .with_string(Counter::default())
            .with_bytes(Echo);
        transform_client(handler).await.unwrap()
    });

    c.bench_function("transform_counter_string", |b| {
        b.to_async(&runtime).iter_batched(
            || (*client).clone(),
            |mut client| async move {
                client
                    .transform(payload(Content::StringContent("payload".to_owned())))
                    .await
                    .unwrap();
            },
            BatchSize::SmallInput,
        );
    });

    let bytes = vec![0xa5; 64 * 1024];
    c.bench_function("transform_echo_64k_bytes", |b| {
        b.to_async(&runtime).iter_batched(
            || ((*client).clone(), bytes.clone()),
            |(mut client, bytes)| async move {
                client
                    .transform(payload(Content::BytesContent(bytes)))
                    .await
                    .unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn hl7_ack(c: &mut Criterion) {
    let runtime = create_runtime();
    let client = runtime.block_on(async {
        let handler = TransformHandler::new().with_bytes(Hl7Ack::default());
        transform_client(handler).await.unwrap()
    });

    c.bench_function("transform_hl7_ack", |b| {
        b.to_async(&runtime).iter_batched(
            || (*client).clone(),
            |mut client| async move {
                client
                    .transform(payload(Content::BytesContent(ADT.to_vec())))
                    .await
                    .unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn criterion_config() -> Criterion {
    Criterion::default().measurement_time(Duration::from_secs(5))
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = transform, hl7_ack
}
criterion_main!(benches);
