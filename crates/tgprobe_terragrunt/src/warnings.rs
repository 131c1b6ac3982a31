//! Promotion of terragrunt warnings to hard failures.

use crate::error::{TerragruntError, TerragruntResult};
use crate::patterns::PatternTable;

/// Fail if `output` contains a warning listed in `warnings_as_errors`.
///
/// Each pattern is matched as `\nWarning: <pattern>[^\n]*\n`. Patterns are
/// checked in table order and the first one with any match fails with every
/// line it matched. All patterns are compiled up front, so a malformed one
/// is reported even when the output carries no warnings.
pub fn check_warnings(warnings_as_errors: &PatternTable, output: &str) -> TerragruntResult<()> {
    let compiled = warnings_as_errors.compile_with(|pattern| format!("\nWarning: {}[^\n]*\n", pattern))?;

    for (regex, message) in &compiled {
        let matches: Vec<String> = regex
            .find_iter(output)
            .map(|m| m.as_str().trim().to_string())
            .collect();

        if !matches.is_empty() {
            return Err(TerragruntError::WarningsFound {
                message: message.to_string(),
                warnings: matches,
            });
        }
    }
    Ok(())
}
