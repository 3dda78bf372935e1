mod common;

use common::{filter, test_config, FakeBank, FakeConverter, FakeUploader};
use quml_to_odk::infrastructure::Xls2XformConverter;
use quml_to_odk::models::{FormDocument, QuestionDetail, UploadStatus};
use quml_to_odk::services::{FormStrategy, FormStrategyRegistry, McqFormStrategy, RandomSampler};
use quml_to_odk::FormFilter;
use quml_to_odk::{FlowState, FormError, FormFlow, QuestionType};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn flow(
    config: &quml_to_odk::Config,
    bank: &Arc<FakeBank>,
    converter: Arc<dyn quml_to_odk::infrastructure::FormConverter>,
    uploader: &Arc<FakeUploader>,
) -> FormFlow {
    FormFlow::new(config, bank.clone(), converter, uploader.clone())
}

#[tokio::test]
async fn test_sample_of_five_from_twenty() {
    let _ = tracing_subscriber::fmt::try_init();
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), false);
    let bank = Arc::new(FakeBank::with_questions(20));
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Uploaded));

    let result = tokio_test::assert_ok!(
        flow(&config, &bank, Arc::new(FakeConverter::ok()), &uploader)
            .run(&filter(5))
            .await
    );

    assert!(result.is_success(), "{:?}", result);
    let calls = bank.detail_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 5);
    let unique: HashSet<_> = calls[0].iter().collect();
    assert_eq!(unique.len(), 5);
    assert!(calls[0].iter().all(|id| id.starts_with("do_")));
    assert!(Path::new(&result.xlsx_file).exists());
    assert!(Path::new(&result.odk_file).exists());
}

#[tokio::test]
async fn test_seeded_sampler_picks_exact_members() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), false);
    let bank = Arc::new(FakeBank::with_questions(20));
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Uploaded));

    let available: Vec<String> = (0..20).map(|i| format!("do_{}", i)).collect();
    let expected = RandomSampler::with_seed(99).sample(&available, 4).unwrap();

    flow(&config, &bank, Arc::new(FakeConverter::ok()), &uploader)
        .with_sampler(RandomSampler::with_seed(99))
        .run(&filter(4))
        .await
        .unwrap();

    assert_eq!(bank.detail_calls()[0], expected);
}

#[tokio::test]
async fn test_insufficient_questions_halts_at_sampling() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), true);
    let bank = Arc::new(FakeBank::with_questions(3));
    let converter = Arc::new(FakeConverter::ok());
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Uploaded));

    let result = flow(&config, &bank, converter.clone(), &uploader)
        .run(&filter(10))
        .await
        .unwrap();

    assert!(result.error);
    assert_eq!(result.state, FlowState::Failed);
    assert_eq!(result.failed_stage, Some(FlowState::Sampling));
    assert_eq!(result.error_kind.as_deref(), Some("INSUFFICIENT_QUESTIONS"));
    assert!(bank.detail_calls().is_empty());
    assert!(!Path::new(&result.xlsx_file).exists());
    assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
    assert_eq!(uploader.call_count(), 0);
}

#[tokio::test]
async fn test_exactly_enough_questions_is_insufficient() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), false);
    let bank = Arc::new(FakeBank::with_questions(5));
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Uploaded));

    let result = flow(&config, &bank, Arc::new(FakeConverter::ok()), &uploader)
        .run(&filter(5))
        .await
        .unwrap();

    assert_eq!(result.failed_stage, Some(FlowState::Sampling));
}

#[tokio::test]
async fn test_conversion_failure_keeps_xlsx() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), true);
    let bank = Arc::new(FakeBank::with_questions(20));
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Uploaded));

    let result = flow(&config, &bank, Arc::new(FakeConverter::failing()), &uploader)
        .run(&filter(5))
        .await
        .unwrap();

    assert!(result.error);
    assert!(!result.error_msg.is_empty());
    assert_eq!(result.failed_stage, Some(FlowState::Converting));
    assert!(Path::new(&result.xlsx_file).exists());
    assert!(!Path::new(&result.odk_file).exists());
    assert_eq!(uploader.call_count(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_real_converter_non_zero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), false);
    let bank = Arc::new(FakeBank::with_questions(20));
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Uploaded));
    let converter = Xls2XformConverter::new("sh", Duration::from_secs(10))
        .with_args(["-c", "echo 'invalid type' >&2; exit 2", "xls2xform"]);

    let result = flow(&config, &bank, Arc::new(converter), &uploader)
        .run(&filter(5))
        .await
        .unwrap();

    assert!(result.error);
    assert!(result.error_msg.contains("invalid type"));
    assert!(Path::new(&result.xlsx_file).exists());
    assert!(!Path::new(&result.odk_file).exists());
}

#[tokio::test]
async fn test_upload_disabled_skips_uploader() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), false);
    let bank = Arc::new(FakeBank::with_questions(20));
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Uploaded));

    let result = flow(&config, &bank, Arc::new(FakeConverter::ok()), &uploader)
        .run(&filter(5))
        .await
        .unwrap();

    assert_eq!(result.state, FlowState::Done);
    assert!(!result.error);
    assert!(result.error_msg.is_empty());
    assert!(result.upload.is_none());
    assert_eq!(uploader.call_count(), 0);
}

#[tokio::test]
async fn test_upload_success() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), true);
    let bank = Arc::new(FakeBank::with_questions(20));
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Uploaded));

    let result = flow(&config, &bank, Arc::new(FakeConverter::ok()), &uploader)
        .run(&filter(5))
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(uploader.call_count(), 1);
    let (xform, media) = uploader.calls.lock().unwrap()[0].clone();
    assert_eq!(xform.to_string_lossy(), result.odk_file);
    assert!(media.is_empty());
}

#[tokio::test]
async fn test_rejected_upload_keeps_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), true);
    let bank = Arc::new(FakeBank::with_questions(20));
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Other("REJECTED".to_string())));

    let result = flow(&config, &bank, Arc::new(FakeConverter::ok()), &uploader)
        .run(&filter(5))
        .await
        .unwrap();

    assert!(result.error);
    assert_eq!(result.failed_stage, Some(FlowState::Uploading));
    assert_eq!(result.error_kind.as_deref(), Some("UPLOAD_FAILED"));
    assert!(result.error_msg.contains("REJECTED"));
    assert!(Path::new(&result.xlsx_file).exists());
    assert!(Path::new(&result.odk_file).exists());
    assert_eq!(
        result.upload.as_ref().map(|u| u.status.clone()),
        Some(UploadStatus::Other("REJECTED".to_string()))
    );
}

#[tokio::test]
async fn test_upload_transport_fault_is_upload_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), true);
    let bank = Arc::new(FakeBank::with_questions(20));
    let uploader = Arc::new(FakeUploader::unreachable());

    let result = flow(&config, &bank, Arc::new(FakeConverter::ok()), &uploader)
        .run(&filter(5))
        .await
        .unwrap();

    assert_eq!(uploader.call_count(), 1);
    assert!(result.error);
    assert_eq!(result.state, FlowState::Failed);
    assert_eq!(result.failed_stage, Some(FlowState::Uploading));
    assert_eq!(result.error_kind.as_deref(), Some("UPLOAD_FAILED"));
    assert!(result.error_msg.contains("connection refused"));
    assert!(result.upload.is_none());
    assert!(Path::new(&result.xlsx_file).exists());
    assert!(Path::new(&result.odk_file).exists());
}

#[tokio::test]
async fn test_local_media_is_forwarded_to_uploader() {
    let dir = tempfile::tempdir().unwrap();
    let media_root = dir.path().join("media");
    std::fs::create_dir_all(&media_root).unwrap();
    std::fs::write(media_root.join("diagram.png"), b"png").unwrap();

    let mut config = test_config(dir.path(), true);
    config.media_root = Some(media_root.to_string_lossy().to_string());
    let bank = Arc::new(FakeBank::with_media(
        20,
        &[
            "https://cdn.example.org/assets/do_1/diagram.png",
            "https://cdn.example.org/assets/do_1/missing.png",
        ],
    ));
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Uploaded));

    let result = flow(&config, &bank, Arc::new(FakeConverter::ok()), &uploader)
        .run(&filter(5))
        .await
        .unwrap();

    assert!(result.is_success());
    // 每道题都引用同一文件，只转发一次；本地不存在的文件不转发
    assert_eq!(uploader.media_of_first_call(), vec![media_root.join("diagram.png")]);
}

/// 把表单写到旁边的 `.built.xlsx`，用来确认转换器拿到的是构建结果本身
struct SideFileStrategy(McqFormStrategy);

impl FormStrategy for SideFileStrategy {
    fn question_type(&self) -> QuestionType {
        QuestionType::mcq()
    }

    fn create_form(
        &self,
        details: &[QuestionDetail],
        filter: &FormFilter,
        output_path: &Path,
    ) -> quml_to_odk::Result<FormDocument> {
        self.0
            .create_form(details, filter, &output_path.with_extension("built.xlsx"))
    }
}

#[tokio::test]
async fn test_converter_receives_built_document() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), false);
    let bank = Arc::new(FakeBank::with_questions(20));
    let converter = Arc::new(FakeConverter::ok());
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Uploaded));

    let mut strategies = FormStrategyRegistry::new();
    strategies.register(Box::new(SideFileStrategy(McqFormStrategy::new(false))));

    let result = flow(&config, &bank, converter.clone(), &uploader)
        .with_strategies(strategies)
        .run(&filter(5))
        .await
        .unwrap();

    assert!(result.is_success());
    let inputs = converter.inputs.lock().unwrap().clone();
    assert_eq!(inputs.len(), 1);
    assert!(inputs[0].to_string_lossy().ends_with(".built.xlsx"));
    assert!(inputs[0].exists());
}

#[tokio::test]
async fn test_upstream_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), false);
    let bank = Arc::new(FakeBank::unavailable());
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Uploaded));

    let result = flow(&config, &bank, Arc::new(FakeConverter::ok()), &uploader)
        .run(&filter(5))
        .await
        .unwrap();

    assert_eq!(result.failed_stage, Some(FlowState::Fetching));
    assert_eq!(result.error_kind.as_deref(), Some("UPSTREAM_UNAVAILABLE"));
}

#[tokio::test]
async fn test_unsupported_type_fails_before_io() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), false);
    let bank = Arc::new(FakeBank::with_questions(20));
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Uploaded));

    let mut request = filter(5);
    request.q_type = QuestionType::new("FTB");

    let err = flow(&config, &bank, Arc::new(FakeConverter::ok()), &uploader)
        .run(&request)
        .await
        .unwrap_err();

    assert!(matches!(err, FormError::UnsupportedQuestionType { .. }));
    assert_eq!(bank.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_filter_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), false);
    let bank = Arc::new(FakeBank::with_questions(20));
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Uploaded));

    let err = tokio_test::assert_err!(
        flow(&config, &bank, Arc::new(FakeConverter::ok()), &uploader)
            .run(&filter(0))
            .await
    );

    assert_eq!(err.kind(), "INVALID_FILTER");
    assert_eq!(bank.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_runs_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), false);
    let bank = Arc::new(FakeBank::with_questions(20));
    let uploader = Arc::new(FakeUploader::returning(UploadStatus::Uploaded));
    let flow = Arc::new(flow(&config, &bank, Arc::new(FakeConverter::ok()), &uploader));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let flow = flow.clone();
            tokio::spawn(async move { flow.run(&filter(3)).await })
        })
        .collect();

    let mut xlsx_files = HashSet::new();
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert!(result.is_success());
        xlsx_files.insert(result.xlsx_file);
    }
    assert_eq!(xlsx_files.len(), 4);
}
