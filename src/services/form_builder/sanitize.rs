//! 题干文本清洗
//!
//! 表单渲染端不解析 HTML：除 `<strong>` 外的标签全部去掉，`&nbsp;` 替换为空格或换行。

use regex::Regex;
use std::sync::OnceLock;

fn tag_regex() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| {
        Regex::new(r"</?([A-Za-z][A-Za-z0-9]*)(?:\s[^<>]*)?/?>").expect("tag regex is valid")
    })
}

/// 清洗 HTML 文本
///
/// - `nbsp_as_line_break`: `&nbsp;` 替换为 `\n`，否则替换为单个空格
pub fn clean_html(text: &str, nbsp_as_line_break: bool) -> String {
    let re = tag_regex();
    let nbsp = if nbsp_as_line_break { "\n" } else { " " };

    // `&nbsp;` 可能充当标签内的空白（`<p&nbsp;class="x">`），去标签后也可能拼出新的
    // 标签或 `&nbsp;`（如 `<<b>p>`），两步一起重复到不再变化
    let mut current = text.to_string();
    loop {
        let next = re
            .replace_all(&current.replace("&nbsp;", nbsp), |caps: &regex::Captures| {
                if caps[1].eq_ignore_ascii_case("strong") {
                    caps[0].to_string()
                } else {
                    String::new()
                }
            })
            .into_owned();
        if next == current {
            break;
        }
        current = next;
    }

    current
}
