//! Benchmarks for response synthesis.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ollama_bridge::prompt::{compile_openai, MessageContent, OpenAiMessage};
use ollama_bridge::server::openai_api::Usage;
use ollama_bridge::server::streaming::{completion_chunks, sse_frames};

fn bench_stream_synthesis(c: &mut Criterion) {
    // A ~2000-word reply.
    let text = "lorem ipsum dolor sit amet ".repeat(400);
    let usage = Usage::from_texts("user: hi\nassistant: ", &text);

    c.bench_function("sse_frames_2000_words", |b| {
        b.iter(|| {
            let chunks = completion_chunks("chatcmpl-1", 0, "copilot:latest", black_box(&text), Some(usage));
            black_box(sse_frames(&chunks));
        })
    });
}

fn bench_prompt_compilation(c: &mut Criterion) {
    let messages: Vec<OpenAiMessage> = (0..200)
        .map(|i| OpenAiMessage {
            role: if i % 2 == 0 { "user" } else { "assistant" }.to_string(),
            content: Some(MessageContent::Text(format!("message number {i} with some text"))),
        })
        .collect();

    c.bench_function("compile_openai_200_messages", |b| {
        b.iter(|| black_box(compile_openai(black_box(&messages))))
    });
}

criterion_group!(benches, bench_stream_synthesis, bench_prompt_compilation);
criterion_main!(benches);
