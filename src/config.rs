/// 程序配置
///
/// 进程启动时构造一次，之后以引用方式传入各个组件，组件内部不再读取环境变量。
#[derive(Clone, Debug)]
pub struct Config {
    // --- 题库 API 配置 ---
    /// 题目搜索接口
    pub question_bank_url: String,
    /// 题目详情接口
    pub question_details_url: String,
    /// 单次网络请求超时（秒）
    pub http_timeout_secs: u64,

    // --- 文件存放目录 ---
    /// xlsx 表格文件目录
    pub xlsx_root: String,
    /// XForm 文件目录
    pub odk_root: String,
    /// 本地媒体文件目录（可选）
    pub media_root: Option<String>,

    // --- 转换工具配置 ---
    /// 转换程序，需在 PATH 中
    pub converter_program: String,
    /// 放在路径参数之前的额外参数
    pub converter_args: Vec<String>,
    /// 转换超时（秒）
    pub converter_timeout_secs: u64,

    // --- 上传配置 ---
    /// 是否上传到 Aggregate
    pub upload_forms: bool,
    pub aggregate_url: String,
    pub aggregate_username: Option<String>,
    pub aggregate_password: Option<String>,

    // --- 表单内容配置 ---
    /// `&nbsp;` 替换为换行而不是空格
    pub nbsp_as_line_break: bool,
    /// 固定随机种子（测试 / 复现用）
    pub sampler_seed: Option<u64>,

    // --- 批量处理配置 ---
    /// 待处理的筛选请求 TOML 目录
    pub request_folder: String,
    /// 同时执行的流水线数量
    pub max_concurrent_runs: usize,
    /// 结果日志文件（JSON Lines）
    pub result_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_bank_url: "https://dock.sunbirded.org/action/composite/v3/search".to_string(),
            question_details_url: "https://dock.sunbirded.org/api/question/v1/list".to_string(),
            http_timeout_secs: 30,
            xlsx_root: "gen/xlsx".to_string(),
            odk_root: "gen/xml".to_string(),
            media_root: None,
            converter_program: "xls2xform".to_string(),
            converter_args: Vec::new(),
            converter_timeout_secs: 120,
            upload_forms: false,
            aggregate_url: "http://localhost:8080".to_string(),
            aggregate_username: None,
            aggregate_password: None,
            nbsp_as_line_break: false,
            sampler_seed: None,
            request_folder: "form_requests".to_string(),
            max_concurrent_runs: 4,
            result_log_file: "form_results.jsonl".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            question_bank_url: std::env::var("QUML_ODK_QUESTION_BANK_URL").unwrap_or(default.question_bank_url),
            question_details_url: std::env::var("QUML_ODK_QUESTION_BANK_DETAILS_URL").unwrap_or(default.question_details_url),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.http_timeout_secs),
            xlsx_root: std::env::var("QUML_XLSX_FILE_STORAGE_PATH").unwrap_or(default.xlsx_root),
            odk_root: std::env::var("QUML_ODK_FORM_FILE_STORAGE_PATH").unwrap_or(default.odk_root),
            media_root: std::env::var("QUML_MEDIA_STORAGE_PATH").ok().or(default.media_root),
            converter_program: std::env::var("XLS2XFORM_PROGRAM").unwrap_or(default.converter_program),
            converter_args: std::env::var("XLS2XFORM_ARGS").map(|v| v.split_whitespace().map(String::from).collect()).unwrap_or(default.converter_args),
            converter_timeout_secs: std::env::var("XLS2XFORM_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.converter_timeout_secs),
            upload_forms: std::env::var("UPLOAD_FORMS").ok().map(|v| parse_flag(&v)).unwrap_or(default.upload_forms),
            aggregate_url: std::env::var("ODK_AGGREGATE_URL").unwrap_or(default.aggregate_url),
            aggregate_username: std::env::var("ODK_AGGREGATE_USERNAME").ok().or(default.aggregate_username),
            aggregate_password: std::env::var("ODK_AGGREGATE_PASSWORD").ok().or(default.aggregate_password),
            nbsp_as_line_break: std::env::var("NBSP_AS_LINE_BREAK").ok().map(|v| parse_flag(&v)).unwrap_or(default.nbsp_as_line_break),
            sampler_seed: std::env::var("SAMPLER_SEED").ok().and_then(|v| v.parse().ok()).or(default.sampler_seed),
            request_folder: std::env::var("REQUEST_FOLDER").unwrap_or(default.request_folder),
            max_concurrent_runs: std::env::var("MAX_CONCURRENT_RUNS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_runs),
            result_log_file: std::env::var("RESULT_LOG_FILE").unwrap_or(default.result_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().map(|v| parse_flag(&v)).unwrap_or(default.verbose_logging),
        }
    }
}

/// 解析 `TRUE` / `true` / `1` / `yes` 形式的开关
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
