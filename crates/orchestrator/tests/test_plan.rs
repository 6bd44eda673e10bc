//! Integration tests for the orchestrator crate.

use std::{
    fs,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use futures_util::StreamExt;
use letterpress_config::{GeneratorMode, OrchestratorConfig};
use letterpress_orchestrator::{
    tone, upstream::STUB_SOURCE_TAG, DocumentOrchestrator, DocumentRequest, DocumentType,
    OrchestratorError, RefinementChunk, RefinementRequest, TemplateStore, TextGenerator, Tone,
    UpstreamError,
};
use tempfile::tempdir;

/// Records every instruction and answers with a fixed text.
struct RecordingGenerator {
    reply: Result<String, ()>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    instructions: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
            instructions: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(()),
            delay: None,
            calls: AtomicUsize::new(0),
            instructions: Mutex::new(Vec::new()),
        })
    }

    fn slow(text: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            instructions: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_instruction(&self) -> String {
        self.instructions
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("generator was never called")
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate_text(&self, instruction: &str) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.instructions
            .lock()
            .unwrap()
            .push(instruction.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.reply.clone().map_err(|_| UpstreamError::EmptyResponse)
    }

    fn source_tag(&self) -> &str {
        "recording"
    }
}

fn orchestrator(generator: Arc<RecordingGenerator>) -> DocumentOrchestrator {
    DocumentOrchestrator::new(generator).with_chunking(50, Duration::ZERO)
}

async fn collect(stream: letterpress_orchestrator::RefinementStream) -> Vec<RefinementChunk> {
    stream.collect().await
}

#[tokio::test]
async fn generate_returns_upstream_text_verbatim() {
    let text = "Announcement: Registration deadline extended\n\nDear Students,\n...";
    let generator = RecordingGenerator::replying(text);
    let orchestrator = orchestrator(generator.clone());

    let request = DocumentRequest::new(
        "Extend the registration deadline by one week",
        DocumentType::Announcement,
        Tone::Formal,
    );
    let response = orchestrator.generate(&request).await.unwrap();

    assert_eq!(response.document, text);
    assert_eq!(response.metadata["doc_type"], "Announcement");
    assert_eq!(response.metadata["tone"], "Formal");
    assert_eq!(response.metadata["language"], "English");
    assert_eq!(response.metadata["generated_with"], "recording");
    assert!(chrono::DateTime::parse_from_rfc3339(&response.metadata["created_at"]).is_ok());

    let history = response.history.expect("generation returns history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].user, request.prompt);
    assert_eq!(history[0].assistant, text);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn generate_keeps_leading_and_trailing_whitespace() {
    let text = "\n  Dear Students,\nKind regards\n\n";
    let orchestrator = orchestrator(RecordingGenerator::replying(text));

    let request = DocumentRequest::new("Room change", DocumentType::Announcement, Tone::Neutral);
    let response = orchestrator.generate(&request).await.unwrap();

    assert_eq!(response.document, text);
}

#[tokio::test]
async fn generate_matches_metadata_for_every_type_and_tone() {
    let generator = RecordingGenerator::replying("Dear all");
    let orchestrator = orchestrator(generator);

    for doc_type in DocumentType::ALL {
        for tone in Tone::ALL {
            let request = DocumentRequest::new("Library closed on Friday", doc_type, tone);
            let response = orchestrator.generate(&request).await.unwrap();
            assert_eq!(response.metadata["doc_type"], doc_type.label());
            assert_eq!(response.metadata["tone"], tone.label());
        }
    }
}

#[tokio::test]
async fn generation_instruction_carries_every_field() {
    let generator = RecordingGenerator::replying("ok");
    let orchestrator = orchestrator(generator.clone());

    let request = DocumentRequest::new(
        "Kick-off meeting moved to room 2.011",
        DocumentType::MeetingSummary,
        Tone::Friendly,
    )
    .with_sender("Dr. Weber", "Program Coordinator")
    .with_language("German")
    .with_additional_context("Only for MIE students");

    orchestrator.generate(&request).await.unwrap();
    let instruction = generator.last_instruction();

    assert!(instruction.contains("User prompt: Kick-off meeting moved to room 2.011"));
    assert!(instruction.contains("Sender Name: Dr. Weber"));
    assert!(instruction.contains("Sender Profession: Program Coordinator"));
    assert!(instruction.contains("Language: German"));
    assert!(instruction.contains("Additional Context: Only for MIE students"));
    assert!(instruction.contains(tone::instructions_for(Tone::Friendly)));
    assert!(!instruction.contains("{prompt}"));
}

#[tokio::test]
async fn absent_optional_fields_render_defaults() {
    let generator = RecordingGenerator::replying("ok");
    let orchestrator = orchestrator(generator);

    let request = DocumentRequest::new("Exam results online", DocumentType::Announcement, Tone::Neutral);
    let instruction = orchestrator.render_generation_prompt(&request).unwrap();

    assert!(instruction.contains("Sender Name: \n"));
    assert!(instruction.contains("Additional Context: None provided"));
    assert!(instruction.contains("Language: English"));
}

#[tokio::test]
async fn blank_prompt_is_rejected_without_upstream_call() {
    let generator = RecordingGenerator::replying("never used");
    let orchestrator = orchestrator(generator.clone());

    let request = DocumentRequest::new("  \n\t", DocumentType::Announcement, Tone::Neutral);
    let error = orchestrator.generate(&request).await.unwrap_err();

    assert!(matches!(error, OrchestratorError::Validation(_)));
    assert!(error.is_client_error());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn whitespace_only_upstream_text_is_an_upstream_error() {
    let orchestrator = orchestrator(RecordingGenerator::replying("   \n"));
    let request = DocumentRequest::new("Room change", DocumentType::Announcement, Tone::Neutral);

    let error = orchestrator.generate(&request).await.unwrap_err();
    assert!(matches!(
        error,
        OrchestratorError::Upstream(UpstreamError::EmptyResponse)
    ));
    assert_eq!(error.to_string(), "document generation failed");
}

#[tokio::test]
async fn upstream_failure_hides_details() {
    let orchestrator = orchestrator(RecordingGenerator::failing());
    let request = DocumentRequest::new("Room change", DocumentType::Announcement, Tone::Neutral);

    let error = orchestrator.generate(&request).await.unwrap_err();
    assert!(matches!(error, OrchestratorError::Upstream(_)));
    assert!(!error.is_client_error());
    assert_eq!(error.to_string(), "document generation failed");
}

#[tokio::test(start_paused = true)]
async fn slow_upstream_times_out() {
    let generator = RecordingGenerator::slow("late", Duration::from_secs(60));
    let orchestrator = orchestrator(generator).with_request_timeout(Duration::from_secs(5));
    let request = DocumentRequest::new("Room change", DocumentType::Announcement, Tone::Neutral);

    let error = orchestrator.generate(&request).await.unwrap_err();
    assert!(matches!(
        error,
        OrchestratorError::Upstream(UpstreamError::Timeout(_))
    ));
}

#[tokio::test]
async fn refine_yields_ceiling_of_length_over_chunk_size() {
    let refined = "x".repeat(173);
    let orchestrator = orchestrator(RecordingGenerator::replying(&refined));

    let request = RefinementRequest::new(
        "Dear Students, ... Kind regards",
        "shorten it",
        DocumentType::StudentCommunication,
        Tone::Neutral,
    );
    let chunks = collect(orchestrator.refine(&request).await.unwrap()).await;

    assert_eq!(chunks.len(), 4);
    let rebuilt: String = chunks.iter().map(|chunk| chunk.document.as_str()).collect();
    assert_eq!(rebuilt, refined);

    for (index, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.metadata.chunk_index, index);
        assert_eq!(chunk.metadata.chunk_count, 4);
        assert_eq!(chunk.metadata.is_complete, index == 3);
        assert!(chunk.metadata.is_refinement);
        assert!(chunk.metadata.is_streaming);
        assert_eq!(chunk.metadata.doc_type, DocumentType::StudentCommunication);
        assert_eq!(chunk.metadata.generated_with, "recording");
    }
}

#[tokio::test]
async fn refine_reconstructs_changed_deadline() {
    let refined = "Dear Students,\n\nThe registration deadline is now March 30. Please make \
                   sure to register in TUMonline before then.\n\nKind regards";
    let orchestrator = orchestrator(RecordingGenerator::replying(refined));

    let request = RefinementRequest::new(
        "Dear Students,\n\nThe registration deadline is March 23.\n\nKind regards",
        "change the deadline to March 30",
        DocumentType::Announcement,
        Tone::Formal,
    );
    let chunks = collect(orchestrator.refine(&request).await.unwrap()).await;

    assert!(chunks.len() > 1);
    let rebuilt: String = chunks.into_iter().map(|chunk| chunk.document).collect();
    assert_eq!(rebuilt, refined);
}

#[tokio::test]
async fn refine_splits_multibyte_text_on_char_boundaries() {
    let refined = "Liebe Studierende, die Frist für die Anmeldung endet am 30. März. Grüße ✉️";
    let orchestrator = DocumentOrchestrator::new(RecordingGenerator::replying(refined))
        .with_chunking(7, Duration::ZERO);

    let request = RefinementRequest::new("Liebe Studierende", "auf Deutsch", DocumentType::Announcement, Tone::Neutral);
    let chunks = collect(orchestrator.refine(&request).await.unwrap()).await;

    let expected = refined.chars().count().div_ceil(7);
    assert_eq!(chunks.len(), expected);
    assert!(chunks.iter().all(|chunk| chunk.document.chars().count() <= 7));
    let rebuilt: String = chunks.into_iter().map(|chunk| chunk.document).collect();
    assert_eq!(rebuilt, refined);
}

#[tokio::test]
async fn refine_instruction_embeds_document_and_history() {
    let generator = RecordingGenerator::replying("refined");
    let orchestrator = orchestrator(generator.clone());

    let request = RefinementRequest::new(
        "Dear all, the seminar starts at 10:00.",
        "start at 11:00 instead",
        DocumentType::MeetingSummary,
        Tone::FirmButPolite,
    )
    .with_history(vec!["First draft".to_string(), "Second draft".to_string()]);

    let _ = collect(orchestrator.refine(&request).await.unwrap()).await;
    let instruction = generator.last_instruction();

    assert!(instruction.contains("-----------------\nDear all, the seminar starts at 10:00.\n-----------------"));
    assert!(instruction.contains("start at 11:00 instead"));
    assert!(instruction.contains("Previous Conversation/Document History"));
    assert!(instruction.contains("[1] First draft"));
    assert!(instruction.contains("[2] Second draft"));
    assert!(instruction.contains("Document Type: Meeting Summary"));
    assert!(instruction.contains(tone::instructions_for(Tone::FirmButPolite)));
}

#[tokio::test]
async fn refine_without_history_omits_history_block() {
    let generator = RecordingGenerator::replying("refined");
    let orchestrator = orchestrator(generator.clone());

    let request = RefinementRequest::new("Dear all", "add a sign-off", DocumentType::Announcement, Tone::Neutral)
        .with_history(Vec::new());
    let _ = collect(orchestrator.refine(&request).await.unwrap()).await;

    assert!(!generator
        .last_instruction()
        .contains("Previous Conversation/Document History"));
}

#[tokio::test]
async fn refine_failures_surface_before_streaming() {
    let generator = RecordingGenerator::failing();
    let orchestrator = orchestrator(generator.clone());

    let request = RefinementRequest::new("Dear all", "fix typo", DocumentType::Announcement, Tone::Neutral);
    let result = orchestrator.refine(&request).await;
    assert!(matches!(result, Err(OrchestratorError::Upstream(_))));

    let invalid = RefinementRequest::new("Dear all", "   ", DocumentType::Announcement, Tone::Neutral);
    let result = orchestrator.refine(&invalid).await;
    assert!(matches!(result, Err(OrchestratorError::Validation(_))));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn refine_paces_chunks_after_the_first() {
    let orchestrator = DocumentOrchestrator::new(RecordingGenerator::replying(&"y".repeat(30)))
        .with_chunking(10, Duration::from_millis(100));

    let request = RefinementRequest::new("Dear all", "expand", DocumentType::Announcement, Tone::Neutral);
    let started = tokio::time::Instant::now();
    let chunks = collect(orchestrator.refine(&request).await.unwrap()).await;

    assert_eq!(chunks.len(), 3);
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(started.elapsed() < Duration::from_millis(300));
}

#[tokio::test]
async fn stub_mode_needs_no_credentials() {
    let config = OrchestratorConfig {
        mode: GeneratorMode::Stub,
        stub_response: Some("Canned document".to_string()),
        ..OrchestratorConfig::default()
    };
    let orchestrator = DocumentOrchestrator::from_config(&config).unwrap();
    assert_eq!(orchestrator.source_tag(), STUB_SOURCE_TAG);

    let request = DocumentRequest::new("Room change", DocumentType::Announcement, Tone::Neutral);
    let response = orchestrator.generate(&request).await.unwrap();
    assert_eq!(response.document, "Canned document");
    assert_eq!(response.metadata["generated_with"], STUB_SOURCE_TAG);
}

#[test]
fn live_mode_with_explicit_key_builds() {
    let mut config = OrchestratorConfig::default();
    config.openrouter.api_key = Some("sk-test".to_string());

    let orchestrator = DocumentOrchestrator::from_config(&config).unwrap();
    assert_eq!(orchestrator.source_tag(), config.default_model);
}

#[tokio::test]
async fn template_overrides_are_used_for_generation() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("announcement.txt"),
        "CUSTOM {prompt} | {tone} | {language}",
    )
    .unwrap();

    let config = OrchestratorConfig {
        mode: GeneratorMode::Stub,
        template_dir: Some(dir.path().display().to_string()),
        ..OrchestratorConfig::default()
    };
    let orchestrator = DocumentOrchestrator::from_config(&config).unwrap();

    let request = DocumentRequest::new("Hello", DocumentType::Announcement, Tone::Formal);
    let instruction = orchestrator.render_generation_prompt(&request).unwrap();
    assert_eq!(
        instruction,
        format!(
            "CUSTOM Hello | {} | English",
            tone::instructions_for(Tone::Formal)
        )
    );
}

#[test]
fn invalid_template_override_fails_construction() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("student_communication.txt"), "no placeholder").unwrap();

    let config = OrchestratorConfig {
        mode: GeneratorMode::Stub,
        template_dir: Some(dir.path().display().to_string()),
        ..OrchestratorConfig::default()
    };
    let result = DocumentOrchestrator::from_config(&config);
    assert!(matches!(result, Err(OrchestratorError::TemplateInvalid { .. })));
}

#[test]
fn every_combination_has_template_and_tone_text() {
    let store = TemplateStore::builtin();
    for doc_type in DocumentType::ALL {
        assert!(!store.template_for(doc_type).unwrap().is_empty());
        for tone_value in Tone::ALL {
            assert!(!tone::instructions_for(tone_value).is_empty());
        }
    }
}
