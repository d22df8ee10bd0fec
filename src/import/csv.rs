//! CSV parsing for the import pipeline, plus the downloadable template.
//!
//! The dialect is intentionally simple: a quote character toggles an
//! "inside quoted field" flag and commas split only outside quotes. Quoted
//! fields may therefore contain commas, but escaped quotes (`""`) inside a
//! field are not supported. This matches the files the catalog itself
//! produces.

use super::normalize::RawRow;

/// Parse CSV bytes into raw rows keyed by the header line.
///
/// The text is decoded as UTF-8 (invalid sequences are replaced, as a
/// browser decoder would), a leading BOM is stripped, and blank lines are
/// discarded. Fewer than two remaining lines means no data rows.
pub fn parse_rows(bytes: &[u8]) -> Vec<RawRow> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let lines: Vec<&str> = text
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect();
    if lines.len() < 2 {
        return Vec::new();
    }

    let headers = split_line(lines[0]);

    lines[1..]
        .iter()
        .map(|line| {
            let values = split_line(line);
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = values.get(i).cloned().unwrap_or_default();
                    (header.clone(), value)
                })
                .collect()
        })
        .collect()
}

/// Split one CSV line, honoring quoted commas.
///
/// Quote characters themselves are consumed by the toggle and never appear
/// in the output; every field is trimmed.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// The import template shipped to users: BOM-prefixed, fully quoted,
/// bilingual headers and two sample rows.
pub fn template() -> Vec<u8> {
    let headers = ["剧名", "年份", "集数", "人物", "身份", "时间戳"];
    let samples = [
        ["示例电视剧", "2024", "1", "张三", "主角", "00:15:30"],
        ["另一部剧", "2023", "5", "李四", "配角", "01:02:30"],
    ];

    let mut lines = vec![quote_row(&headers)];
    lines.extend(samples.iter().map(|row| quote_row(row)));

    let mut text = String::from('\u{feff}');
    text.push_str(&lines.join("\n"));
    text.into_bytes()
}

fn quote_row(cells: &[&str]) -> String {
    cells
        .iter()
        .map(|cell| format!("\"{cell}\""))
        .collect::<Vec<_>>()
        .join(",")
}
