//! 通用文本工具函数

/// 去除首尾空白后非空则返回
pub fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// 可选字段去除首尾空白后非空则返回
pub fn non_blank_opt(value: Option<&str>) -> Option<&str> {
    value.and_then(non_blank)
}

/// 按行拆分，去除首尾空白并丢弃空行，保持原顺序
pub fn non_blank_lines(text: &str) -> Vec<&str> {
    text.lines().filter_map(non_blank).collect()
}
