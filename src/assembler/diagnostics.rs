//! Rendering of compiler diagnostics into a failure message.

use crate::types::knowledge::BuildDiagnostic;

/// Joins line numbers with commas, keeping every entry in order.
pub fn join_lines(lines: &[u32]) -> String {
    lines
        .iter()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders every diagnostic of a failed build.
///
/// ```text
/// Rule compilation failed with 2 error(s):
///   Error in line(s) [3,7] of /repo/rules/a.drl: unknown fact type
///   Error in line(s) [12]: missing 'end'
/// ```
pub fn render_diagnostics(diagnostics: &[BuildDiagnostic]) -> String {
    let mut message = format!(
        "Rule compilation failed with {} error(s):",
        diagnostics.len()
    );

    for diagnostic in diagnostics {
        message.push_str("\n  Error in line(s) [");
        message.push_str(&join_lines(&diagnostic.lines));
        message.push(']');
        if let Some(source) = &diagnostic.source {
            message.push_str(" of ");
            message.push_str(&source.display().to_string());
        }
        message.push_str(": ");
        message.push_str(&diagnostic.message);
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_lines_keeps_first_line() {
        assert_eq!(join_lines(&[3, 7, 9]), "3,7,9");
        assert_eq!(join_lines(&[4]), "4");
        assert_eq!(join_lines(&[]), "");
    }

    #[test]
    fn test_render_all_diagnostics() {
        let diagnostics = vec![
            BuildDiagnostic::new(vec![3, 7], "unknown fact type 'Order'")
                .with_source("/repo/rules/a.drl"),
            BuildDiagnostic::new(vec![12], "missing 'end'"),
        ];

        let message = render_diagnostics(&diagnostics);

        assert!(message.starts_with("Rule compilation failed with 2 error(s):"));
        assert!(message.contains("Error in line(s) [3,7] of /repo/rules/a.drl: unknown fact type 'Order'"));
        assert!(message.contains("Error in line(s) [12]: missing 'end'"));
    }

    #[test]
    fn test_render_without_lines() {
        let message = render_diagnostics(&[BuildDiagnostic::new(Vec::new(), "parser crashed")]);
        assert!(message.contains("[]: parser crashed"));
    }
}
