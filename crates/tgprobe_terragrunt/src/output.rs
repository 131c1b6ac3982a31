//! Extraction of output values from terragrunt's mixed log/payload output.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::TerragruntResult;

/// Structured terragrunt log line: `time=.. level=.. prefix=.. binary=.. msg=..`.
static LOG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".*time=\S+ level=\S+ prefix=\S+ binary=\S+ msg=.*").expect("log line regex is valid")
});

/// Drop log lines and blank lines, trimming what is left.
///
/// Lines are removed twice: once by the full log-line signature and once
/// by a plain ` msg=` check on whatever survived.
fn strip_log_lines(raw: &str) -> String {
    let cleaned = LOG_LINE.replace_all(raw, "");

    cleaned
        .split('\n')
        .filter(|line| !line.contains(" msg="))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract a value from `terragrunt stack output` text.
///
/// Example input:
///
/// ```text
/// time=2023-07-11T10:30:45Z level=info prefix=terragrunt binary=terragrunt msg="Initializing..."
/// "my-bucket-name"
/// ```
///
/// cleans to `my-bucket-name`. Text starting with `{` or `[` is returned as
/// is, without validation. Otherwise one pair of surrounding double quotes
/// is removed. Nothing left after filtering yields an empty string.
pub fn clean_output(raw: &str) -> String {
    let filtered = strip_log_lines(raw);
    let value = filtered.trim();

    if value.starts_with('{') || value.starts_with('[') {
        return value.to_string();
    }

    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.to_string(),
        None => value.to_string(),
    }
}

/// Extract and pretty-print the JSON document from
/// `terragrunt stack output -json` text.
///
/// Field order is kept; indentation is two spaces.
pub fn clean_json_output(raw: &str) -> TerragruntResult<String> {
    let filtered = strip_log_lines(raw);
    let value: serde_json::Value = serde_json::from_str(&filtered)?;
    Ok(serde_json::to_string_pretty(&value)?)
}
