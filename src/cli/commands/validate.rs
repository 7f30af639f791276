use std::path::PathBuf;

use tracing::debug;

use super::{load_config, CommandHandler};
use crate::config::{Config, ValidationIssue};
use crate::{Result, TripwireError};

/// Handler for the `validate` command
pub struct ValidateCommand {
    pub config: Option<PathBuf>,
    pub json: bool,
}

impl CommandHandler for ValidateCommand {
    fn execute(&self) -> Result<()> {
        let (path, config) = load_config(self.config.as_ref())?;
        debug!(path = %path.display(), "Validating configuration");

        let issues = config.validate();
        if self.json {
            println!("{}", serde_json::to_string_pretty(&issues)?);
        } else {
            print!("{}", render_report(&path, &config, &issues));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(TripwireError::Generic(anyhow::anyhow!(
                "{} invalid expression(s) in {}",
                issues.len(),
                path.display()
            )))
        }
    }

    fn name(&self) -> &'static str {
        "validate"
    }
}

impl ValidateCommand {
    /// Create new validate command
    pub fn new(config: Option<PathBuf>, json: bool) -> Self {
        Self { config, json }
    }
}

fn render_report(path: &std::path::Path, config: &Config, issues: &[ValidationIssue]) -> String {
    let mut out = String::new();
    if issues.is_empty() {
        out.push_str(&format!(
            "{}: {} breakpoint(s), all expressions valid\n",
            path.display(),
            config.breakpoints.len()
        ));
        return out;
    }
    for issue in issues {
        out.push_str(&format!(
            "{} [{}] {:?}: {}\n",
            issue.tag, issue.facet, issue.expression, issue.message
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_validate_accepts_clean_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bp.yml");
        fs::write(&path, "breakpoints:\n  fuel: { return_code: '[0.2, 0.1].min' }\n").unwrap();

        let command = ValidateCommand::new(Some(path), false);
        assert!(command.execute().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_expression() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bp.yml");
        fs::write(&path, "breakpoints:\n  fuel: { pre_call: 'log((' }\n").unwrap();

        let command = ValidateCommand::new(Some(path), true);
        assert!(command.execute().is_err());
    }

    #[test]
    fn test_report_lists_issues() {
        let config = Config::default();
        let issues = vec![ValidationIssue {
            tag: "fuel".into(),
            facet: "pre_call",
            expression: "log((".into(),
            message: "unexpected end".into(),
        }];
        let report = render_report(std::path::Path::new("bp.yml"), &config, &issues);
        assert_eq!(report, "fuel [pre_call] \"log((\": unexpected end\n");
    }
}
