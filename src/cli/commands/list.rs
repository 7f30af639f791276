use std::path::PathBuf;

use serde::Serialize;

use super::{load_config, CommandHandler};
use crate::config::Config;
use crate::Result;

/// Handler for the `list` command
pub struct ListCommand {
    pub config: Option<PathBuf>,
    pub json: bool,
}

#[derive(Debug, Serialize, PartialEq)]
struct TagSummary {
    tag: String,
    armed: bool,
    facets: Vec<&'static str>,
}

impl CommandHandler for ListCommand {
    fn execute(&self) -> Result<()> {
        let (_, config) = load_config(self.config.as_ref())?;
        let summaries = summarize(&config);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
            return Ok(());
        }

        if summaries.is_empty() {
            println!("No breakpoints configured");
            return Ok(());
        }
        let width = summaries.iter().map(|s| s.tag.len()).max().unwrap_or(0);
        for summary in &summaries {
            println!(
                "{:<width$}  {:<8}  {}",
                summary.tag,
                if summary.armed { "armed" } else { "disabled" },
                summary.facets.join(", "),
                width = width
            );
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "list"
    }
}

impl ListCommand {
    pub fn new(config: Option<PathBuf>, json: bool) -> Self {
        Self { config, json }
    }
}

fn summarize(config: &Config) -> Vec<TagSummary> {
    config
        .breakpoints
        .iter()
        .map(|(tag, def)| TagSummary {
            tag: tag.clone(),
            armed: def.is_enabled(),
            facets: def.facets(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summaries_are_sorted_by_tag() {
        let config = Config::from_yaml(
            r#"
breakpoints:
  zeta: { enabled: false, return: 1 }
  alpha: { pre_call: "log(1)", return_code: "2" }
"#,
        )
        .unwrap();

        assert_eq!(
            summarize(&config),
            vec![
                TagSummary {
                    tag: "alpha".into(),
                    armed: true,
                    facets: vec!["pre_call", "return_code"],
                },
                TagSummary {
                    tag: "zeta".into(),
                    armed: false,
                    facets: vec!["return"],
                },
            ]
        );
    }
}
