//! 单选 / 多选题表单策略
//!
//! 生成 XLSForm 工作簿：`survey`（题目行）、`choices`（选项行）、`settings`（表单信息）。

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::path::Path;
use tracing::{debug, info, warn};

use super::sanitize::clean_html;
use super::FormStrategy;
use crate::error::{FormError, Result};
use crate::models::filter::{FormFilter, QuestionType};
use crate::models::question::QuestionDetail;
use crate::models::result::FormDocument;

const SURVEY_HEADER: [&str; 4] = ["type", "name", "label", "required"];
const CHOICES_HEADER: [&str; 4] = ["list_name", "name", "label", "correct"];
const SETTINGS_HEADER: [&str; 3] = ["form_title", "form_id", "version"];
const DEFAULT_FORM_TITLE: &str = "Assessment";

/// 题目标签在日志中的单行预览
fn label_preview(label: &str) -> String {
    let flat = label.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 80 {
        flat.chars().take(80).collect::<String>() + "..."
    } else {
        flat
    }
}

/// 三张表的行数据（不含表头）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct XlsFormSheets {
    pub survey: Vec<Vec<String>>,
    pub choices: Vec<Vec<String>>,
    pub settings: Vec<Vec<String>>,
}

/// MCQ 表单策略
pub struct McqFormStrategy {
    nbsp_as_line_break: bool,
}

impl McqFormStrategy {
    pub fn new(nbsp_as_line_break: bool) -> Self {
        Self { nbsp_as_line_break }
    }

    /// 构建三张表的行数据
    ///
    /// 没有选项的题目跳过；一个正确选项用 `select_one`，多个用 `select_multiple`。
    pub fn build_sheets(
        &self,
        details: &[QuestionDetail],
        filter: &FormFilter,
        form_id: &str,
    ) -> XlsFormSheets {
        let mut sheets = XlsFormSheets::default();
        let mut question_no = 0;

        for detail in details {
            if detail.options.is_empty() {
                warn!("⚠️ 题目 {} 没有选项，已跳过", detail.identifier);
                continue;
            }
            question_no += 1;

            let list_name = format!("q{}_options", question_no);
            let select = if detail.correct_count() > 1 {
                "select_multiple"
            } else {
                "select_one"
            };
            let label = clean_html(&detail.stem, self.nbsp_as_line_break);
            debug!("题目 {}: {}", question_no, label_preview(&label));

            sheets.survey.push(vec![
                format!("{} {}", select, list_name),
                format!("q{}", question_no),
                label,
                "yes".to_string(),
            ]);

            for (idx, option) in detail.options.iter().enumerate() {
                sheets.choices.push(vec![
                    list_name.clone(),
                    format!("opt{}", idx + 1),
                    clean_html(&option.label, self.nbsp_as_line_break),
                    if option.is_correct { "yes" } else { "" }.to_string(),
                ]);
            }
        }

        let title = filter
            .form_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_FORM_TITLE);

        sheets.settings.push(vec![
            title.to_string(),
            form_id.to_string(),
            chrono::Utc::now().format("%Y%m%d%H%M").to_string(),
        ]);

        sheets
    }

    /// 由输出文件名派生 form_id（XML 名称不能以数字开头，也不能含 `-`）
    pub fn form_id_for(output_path: &Path) -> String {
        let stem = output_path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .replace('-', "_");
        format!("form_{}", stem)
    }

    fn write_workbook(sheets: &XlsFormSheets, output_path: &Path) -> std::result::Result<(), XlsxError> {
        let mut workbook = Workbook::new();

        write_sheet(workbook.add_worksheet(), "survey", &SURVEY_HEADER, &sheets.survey)?;
        write_sheet(workbook.add_worksheet(), "choices", &CHOICES_HEADER, &sheets.choices)?;
        write_sheet(workbook.add_worksheet(), "settings", &SETTINGS_HEADER, &sheets.settings)?;

        workbook.save(output_path)
    }
}

impl FormStrategy for McqFormStrategy {
    fn question_type(&self) -> QuestionType {
        QuestionType::mcq()
    }

    fn create_form(
        &self,
        details: &[QuestionDetail],
        filter: &FormFilter,
        output_path: &Path,
    ) -> Result<FormDocument> {
        let path_str = output_path.to_string_lossy().to_string();
        let sheets = self.build_sheets(details, filter, &Self::form_id_for(output_path));

        if sheets.survey.is_empty() {
            return Err(FormError::build_failed(path_str, "没有可用的选择题"));
        }

        Self::write_workbook(&sheets, output_path)
            .map_err(|e| FormError::build_failed(path_str.clone(), e.to_string()))?;

        info!(
            "✓ 表格表单已生成: {} (题目 {} 道, 选项 {} 个)",
            path_str,
            sheets.survey.len(),
            sheets.choices.len()
        );

        Ok(FormDocument {
            path: output_path.to_path_buf(),
            question_rows: sheets.survey.len(),
            choice_rows: sheets.choices.len(),
        })
    }
}

fn write_sheet(
    sheet: &mut Worksheet,
    name: &str,
    header: &[&str],
    rows: &[Vec<String>],
) -> std::result::Result<(), XlsxError> {
    sheet.set_name(name)?;

    for (col, title) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, *title)?;
    }
    for (row_idx, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(row_idx as u32 + 1, col as u16, value.as_str())?;
            }
        }
    }
    Ok(())
}
