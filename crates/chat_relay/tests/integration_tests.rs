#[allow(dead_code)]
mod mocks;

use std::{sync::Arc, time::Duration};

use chat_memory::{FileSessionStore, InMemorySessionStore, SessionTracker, TranscriptStore};
use chat_relay::{
    document::{DocumentSummarizer, SummaryOutcome},
    ChatError, ChatRequest, ChatService, ChatServiceBuilder, GenerationConfig,
};
use mocks::{
    generator::{question_of, MockGenerator},
    session_store::BrokenSessionStore,
    summarizer::MockSummarizer,
};

const V1: &str = "https://www.youtube.com/watch?v=aaaaaaaaaaa";
const V2: &str = "https://www.youtube.com/watch?v=bbbbbbbbbbb";

async fn file_service(
    dir: &tempfile::TempDir,
    generator: MockGenerator,
) -> ChatService<FileSessionStore, MockGenerator> {
    let store = FileSessionStore::init(dir.path())
        .await
        .expect("Store should open in a temp dir");
    ChatServiceBuilder::new()
        .store(store)
        .generator(generator)
        .build()
}

// ─── Session scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_first_identifier_starts_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let generator = MockGenerator::answering();
    let service = file_service(&dir, generator.clone()).await;

    let reply = service
        .chat(ChatRequest::new("What is this video about?").with_active_resource(V1))
        .await
        .expect("Chat should succeed");

    assert_eq!(reply, "Answer to: What is this video about?");
    assert_eq!(
        service.store().current_identifier().await.unwrap().as_deref(),
        Some(V1)
    );

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(
        prompts[0].starts_with("Previous conversation:\n\n"),
        "First turn should carry empty context: {:?}",
        prompts[0]
    );
}

#[tokio::test]
async fn test_same_identifier_keeps_history() {
    let dir = tempfile::tempdir().unwrap();
    let generator = MockGenerator::answering();
    let service = file_service(&dir, generator.clone()).await;

    service
        .chat(ChatRequest::new("first").with_active_resource(V1))
        .await
        .unwrap();
    service
        .chat(ChatRequest::new("second").with_active_resource(V1))
        .await
        .unwrap();

    let transcript = service.store().read_all().await.unwrap();
    assert_eq!(
        transcript,
        "User: first\nBot: Answer to: first\nUser: second\nBot: Answer to: second\n"
    );

    let prompts = generator.prompts();
    assert!(
        prompts[1].contains("User: first\nBot: Answer to: first"),
        "Second turn should see the first exchange"
    );
}

#[tokio::test]
async fn test_missing_identifier_uses_existing_context() {
    let dir = tempfile::tempdir().unwrap();
    let generator = MockGenerator::answering();
    let service = file_service(&dir, generator.clone()).await;

    service
        .chat(ChatRequest::new("first").with_active_resource(V1))
        .await
        .unwrap();
    service.chat(ChatRequest::new("second")).await.unwrap();

    assert_eq!(
        service.store().current_identifier().await.unwrap().as_deref(),
        Some(V1),
        "Identifier should be untouched by a request without one"
    );
    assert!(generator.prompts()[1].contains("User: first"));
    assert!(service
        .store()
        .read_all()
        .await
        .unwrap()
        .ends_with("User: second\nBot: Answer to: second\n"));
}

#[tokio::test]
async fn test_new_identifier_clears_history_before_generating() {
    let dir = tempfile::tempdir().unwrap();
    let generator = MockGenerator::answering();
    let service = file_service(&dir, generator.clone()).await;

    service
        .chat(ChatRequest::new("about video one").with_active_resource(V1))
        .await
        .unwrap();
    service
        .chat(ChatRequest::new("about video two").with_active_resource(V2))
        .await
        .unwrap();

    let prompts = generator.prompts();
    assert!(
        !prompts[1].contains("video one"),
        "Context should be empty after a switch: {:?}",
        prompts[1]
    );
    assert_eq!(
        service.store().read_all().await.unwrap(),
        "User: about video two\nBot: Answer to: about video two\n"
    );
    assert_eq!(
        service.store().current_identifier().await.unwrap().as_deref(),
        Some(V2)
    );
}

#[tokio::test]
async fn test_generation_failure_leaves_transcript_untouched() {
    let dir = tempfile::tempdir().unwrap();

    {
        let service = file_service(&dir, MockGenerator::answering()).await;
        service
            .chat(ChatRequest::new("first").with_active_resource(V1))
            .await
            .unwrap();
    }

    let service = file_service(&dir, MockGenerator::failing("quota exceeded")).await;
    let before = service.store().read_all().await.unwrap();

    let err = service
        .chat(ChatRequest::new("second").with_active_resource(V1))
        .await
        .expect_err("Generation failure should surface");

    assert!(matches!(err, ChatError::Generation { .. }));
    assert_eq!(
        err.to_string(),
        "I'm sorry, I encountered an error: quota exceeded"
    );
    assert_eq!(service.store().read_all().await.unwrap(), before);
}

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let service = file_service(&dir, MockGenerator::answering()).await;
        service
            .chat(ChatRequest::new("before restart").with_active_resource(V1))
            .await
            .unwrap();
    }

    let generator = MockGenerator::answering();
    let service = file_service(&dir, generator.clone()).await;
    service
        .chat(ChatRequest::new("after restart").with_active_resource(V1))
        .await
        .unwrap();

    assert!(generator.prompts()[0].contains("User: before restart"));
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_empty_prompt_has_no_side_effects() {
    let generator = MockGenerator::answering();
    let service = ChatService::new(InMemorySessionStore::new(), generator.clone());

    let result = service
        .chat(ChatRequest::new("").with_active_resource(V1))
        .await;

    assert!(matches!(result, Err(ChatError::Validation(_))));
    assert!(generator.prompts().is_empty());
    assert_eq!(service.store().current_identifier().await.unwrap(), None);
}

#[tokio::test]
async fn test_generation_config_is_forwarded() {
    let config = GenerationConfig {
        temperature: 0.2,
        ..GenerationConfig::default()
    };
    let service = ChatServiceBuilder::new()
        .store(InMemorySessionStore::new())
        .generator(MockGenerator::new("ok"))
        .generation_config(config)
        .build();

    assert_eq!(service.generation_config(), &config);
    assert_eq!(service.chat(ChatRequest::new("hi")).await.unwrap(), "ok");
}

// ─── Storage degradation ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_storage_failures_do_not_abort_the_request() {
    let store = BrokenSessionStore::default();
    let attempts = store.attempts.clone();
    let generator = MockGenerator::answering();
    let service = ChatService::new(store, generator.clone());

    let reply = service
        .chat(ChatRequest::new("still there?").with_active_resource(V1))
        .await
        .expect("Storage failures should be logged, not surfaced");

    assert_eq!(reply, "Answer to: still there?");
    assert!(generator.prompts()[0].starts_with("Previous conversation:\n\n"));
    // identifier read, clear, commit, history read, append
    assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 5);
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_do_not_interleave_resets() {
    let service = Arc::new(ChatService::new(
        InMemorySessionStore::new(),
        MockGenerator::answering().with_delay(Duration::from_millis(5)),
    ));

    let handles = (0..20)
        .map(|i| {
            let service = Arc::clone(&service);
            let (video, tag) = if i % 3 == 0 { (V2, "v2") } else { (V1, "v1") };
            tokio::spawn(async move {
                service
                    .chat(ChatRequest::new(format!("{tag}-q{i}")).with_active_resource(video))
                    .await
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        handle.await.unwrap().expect("Every request should succeed");
    }

    let current = service.store().current_identifier().await.unwrap().unwrap();
    let tag = if current == V1 { "v1" } else { "v2" };
    let transcript = service.store().read_all().await.unwrap();
    let lines = transcript.lines().collect::<Vec<_>>();

    assert!(!lines.is_empty());
    assert_eq!(lines.len() % 2, 0, "Every exchange should be complete");
    for pair in lines.chunks(2) {
        let question = pair[0].strip_prefix("User: ").expect("User line first");
        assert!(
            question.starts_with(tag),
            "Transcript should only hold exchanges for {current}: {transcript}"
        );
        assert_eq!(pair[1], format!("Bot: Answer to: {question}"));
    }
}

#[test]
fn test_question_extraction_matches_prompt_layout() {
    let prompt = ChatService::<InMemorySessionStore, MockGenerator>::build_prompt("", "Why?");
    assert_eq!(question_of(&prompt), "Why?");
}

// ─── Document summarization ──────────────────────────────────────────────────

#[tokio::test]
async fn test_document_summary_joins_chunk_summaries() {
    let summarizer = MockSummarizer::new("A concise summary.");
    let calls = summarizer.calls.clone();

    let text = "Lecture notes on ownership and borrowing. ".repeat(200);
    let summary = DocumentSummarizer::new(summarizer)
        .with_chunk_size(3000)
        .summarize_text("notes.pdf", &text)
        .await;

    let chunks = calls.lock().unwrap().len();
    assert_eq!(chunks, text.chars().count().div_ceil(3000));
    assert_eq!(
        summary.outcome,
        SummaryOutcome::Summarized {
            chunks,
            summarized: chunks
        }
    );
    assert_eq!(
        summary.text,
        vec!["A concise summary."; chunks].join("\n\n")
    );
}

#[tokio::test]
async fn test_document_summary_falls_back_when_summarizer_fails() {
    let text = "x".repeat(5000);
    let summary = DocumentSummarizer::new(MockSummarizer::failing("rate limited"))
        .summarize_text("notes.docx", &text)
        .await;

    assert_eq!(summary.outcome, SummaryOutcome::Fallback);
    assert_eq!(summary.text, format!("{}...", "x".repeat(1000)));
}
