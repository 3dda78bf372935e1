#![allow(dead_code)]

use async_trait::async_trait;
use quml_to_odk::clients::{FormUploader, QuestionBank};
use quml_to_odk::infrastructure::FormConverter;
use quml_to_odk::models::{AnswerOption, MediaRef, QuestionDetail, SearchOutcome, UploadResult, UploadStatus};
use quml_to_odk::{Config, FormError, FormFilter, QuestionType};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// 内存题库：返回固定的 ID 列表，详情按输入逆序返回
pub struct FakeBank {
    identifiers: Vec<String>,
    pub search_calls: AtomicUsize,
    pub detail_calls: Mutex<Vec<Vec<String>>>,
    search_error: Option<FormError>,
    media_srcs: Vec<String>,
}

impl FakeBank {
    pub fn with_questions(n: usize) -> Self {
        Self {
            identifiers: (0..n).map(|i| format!("do_{}", i)).collect(),
            search_calls: AtomicUsize::new(0),
            detail_calls: Mutex::new(Vec::new()),
            search_error: None,
            media_srcs: Vec::new(),
        }
    }

    /// 每道题都引用给定的媒体地址
    pub fn with_media(n: usize, srcs: &[&str]) -> Self {
        Self {
            media_srcs: srcs.iter().map(|s| s.to_string()).collect(),
            ..Self::with_questions(n)
        }
    }

    pub fn unavailable() -> Self {
        Self {
            search_error: Some(FormError::upstream("search", Some(503), "maintenance")),
            ..Self::with_questions(0)
        }
    }

    pub fn detail_calls(&self) -> Vec<Vec<String>> {
        self.detail_calls.lock().unwrap().clone()
    }
}

pub fn mcq_detail(id: &str) -> QuestionDetail {
    QuestionDetail {
        identifier: id.to_string(),
        q_type: "MCQ".to_string(),
        stem: format!("<p>Question <strong>{}</strong>&nbsp;?</p>", id),
        options: vec![
            AnswerOption {
                value: "0".to_string(),
                label: "<p>yes</p>".to_string(),
                is_correct: true,
            },
            AnswerOption {
                value: "1".to_string(),
                label: "<p>no</p>".to_string(),
                is_correct: false,
            },
        ],
        media: Vec::new(),
    }
}

#[async_trait]
impl QuestionBank for FakeBank {
    async fn search(&self, _filter: &FormFilter) -> quml_to_odk::Result<SearchOutcome> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.search_error {
            return Err(err.clone());
        }
        Ok(SearchOutcome {
            total_available: self.identifiers.len(),
            identifiers: self.identifiers.clone(),
        })
    }

    async fn fetch_details(&self, identifiers: &[String]) -> quml_to_odk::Result<Vec<QuestionDetail>> {
        self.detail_calls.lock().unwrap().push(identifiers.to_vec());
        Ok(identifiers
            .iter()
            .rev()
            .map(|id| {
                let mut detail = mcq_detail(id);
                detail.media = self
                    .media_srcs
                    .iter()
                    .map(|src| MediaRef {
                        id: None,
                        src: src.clone(),
                        media_type: Some("image".to_string()),
                    })
                    .collect();
                detail
            })
            .collect())
    }
}

/// 转换器替身：成功时写一个最小 XForm
pub struct FakeConverter {
    pub fail: bool,
    pub calls: AtomicUsize,
    pub inputs: Mutex<Vec<PathBuf>>,
}

impl FakeConverter {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FormConverter for FakeConverter {
    async fn convert(&self, input_path: &Path, output_path: &Path) -> quml_to_odk::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input_path.to_path_buf());
        if self.fail {
            return Err(FormError::conversion_failed("exit status 1: bad survey"));
        }
        assert!(input_path.exists());
        std::fs::write(output_path, "<h:html/>").map_err(|e| FormError::conversion_failed(e.to_string()))
    }
}

/// 上传替身：返回固定状态（或传输错误）并记录调用
pub struct FakeUploader {
    status: UploadStatus,
    transport_error: Option<FormError>,
    pub calls: Mutex<Vec<(PathBuf, Vec<PathBuf>)>>,
}

impl FakeUploader {
    pub fn returning(status: UploadStatus) -> Self {
        Self {
            status,
            transport_error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 模拟连接被拒绝之类的传输层故障
    pub fn unreachable() -> Self {
        Self {
            transport_error: Some(FormError::upload_failed("connection refused")),
            ..Self::returning(UploadStatus::Failed)
        }
    }

    pub fn media_of_first_call(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap()[0].1.clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl FormUploader for FakeUploader {
    async fn upload_form(&self, xform_path: &Path, media_paths: &[PathBuf]) -> quml_to_odk::Result<UploadResult> {
        self.calls
            .lock()
            .unwrap()
            .push((xform_path.to_path_buf(), media_paths.to_vec()));
        if let Some(err) = &self.transport_error {
            return Err(err.clone());
        }
        Ok(UploadResult::new(
            self.status.clone(),
            serde_json::json!({ "status": self.status.as_str() }),
        ))
    }
}

pub fn test_config(root: &Path, upload_forms: bool) -> Config {
    let xlsx_root = root.join("xlsx");
    let odk_root = root.join("xml");
    std::fs::create_dir_all(&xlsx_root).unwrap();
    std::fs::create_dir_all(&odk_root).unwrap();

    Config {
        xlsx_root: xlsx_root.to_string_lossy().to_string(),
        odk_root: odk_root.to_string_lossy().to_string(),
        upload_forms,
        sampler_seed: Some(7),
        request_folder: root.join("requests").to_string_lossy().to_string(),
        result_log_file: root.join("results.jsonl").to_string_lossy().to_string(),
        ..Config::default()
    }
}

pub fn filter(count: usize) -> FormFilter {
    FormFilter {
        boards: vec!["CBSE".to_string()],
        grades: vec!["Class 5".to_string()],
        subjects: vec!["Mathematics".to_string()],
        competencies: Vec::new(),
        q_type: QuestionType::mcq(),
        random_questions_count: count,
        form_title: Some("Test form".to_string()),
    }
}
