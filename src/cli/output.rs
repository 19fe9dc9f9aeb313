//! Output formatting for build reports and plans
//!
//! JSON and YAML are meant for CI steps that consume the result; the human
//! format is a short tree per folder.

use anyhow::{Context, Result};

use crate::decision::RebuildDecision;
use crate::pipeline::BuildReport;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_report(&self, report: &BuildReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(report).context("Failed to serialize report to YAML")
            }
            OutputFormat::Human => Ok(self.format_report_human(report)),
        }
    }

    pub fn format_plan(&self, decisions: &[RebuildDecision]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(decisions).context("Failed to serialize plan to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(decisions).context("Failed to serialize plan to YAML")
            }
            OutputFormat::Human => Ok(self.format_plan_human(decisions)),
        }
    }

    fn format_report_human(&self, report: &BuildReport) -> String {
        let mut output = String::new();
        output.push_str("\u{2713} Gateway Build Report\n");
        output.push_str(RULE);
        output.push_str("\n\n");

        for outcome in &report.folders {
            let decision = &outcome.decision;
            match &outcome.published {
                Some(published) => {
                    output.push_str(&format!(
                        "{} (rebuilt: {})\n",
                        decision.folder_id, decision.reason
                    ));
                    output.push_str(&format!("\u{251C}\u{2500} Image:    {}\n", published.unique));
                    output.push_str(&format!("\u{251C}\u{2500} Latest:   {}\n", published.latest));
                    if published.services.is_empty() {
                        output.push_str("\u{2514}\u{2500} Services: (none)\n");
                    } else {
                        output.push_str("\u{2514}\u{2500} Services:\n");
                        for service in &published.services {
                            output.push_str(&format!("   \u{2500} {}\n", service));
                        }
                    }
                }
                None => {
                    output.push_str(&format!("{} (skipped: no changes)\n", decision.folder_id));
                }
            }
            output.push('\n');
        }

        output.push_str(&format!(
            "Built {}, skipped {}\n",
            report.built(),
            report.skipped()
        ));
        output
    }

    fn format_plan_human(&self, decisions: &[RebuildDecision]) -> String {
        let mut output = String::new();
        output.push_str("Rebuild Plan\n");
        output.push_str(RULE);
        output.push('\n');

        for decision in decisions {
            let verdict = if decision.should_build {
                "build"
            } else {
                "skip"
            };
            output.push_str(&format!(
                "{:<24} {:<6} ({})\n",
                decision.folder_id, verdict, decision.reason
            ));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::RebuildReason;
    use crate::pipeline::{FolderOutcome, PublishedImage};

    fn sample_report() -> BuildReport {
        BuildReport {
            folders: vec![
                FolderOutcome {
                    decision: RebuildDecision {
                        folder_id: "svc1".to_string(),
                        should_build: true,
                        reason: RebuildReason::ImageAbsent,
                    },
                    published: Some(PublishedImage {
                        unique: "registry/gw:grpc-gateway-svc1-1700000000".to_string(),
                        latest: "registry/gw:grpc-gateway-svc1-latest".to_string(),
                        services: vec!["RegisterUserServiceHandlerFromEndpoint".to_string()],
                    }),
                },
                FolderOutcome {
                    decision: RebuildDecision {
                        folder_id: "svc2".to_string(),
                        should_build: false,
                        reason: RebuildReason::Unchanged,
                    },
                    published: None,
                },
            ],
        }
    }

    #[test]
    fn test_json_format() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_report(&sample_report())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["folders"][0]["reason"], "image-absent");
        assert_eq!(
            value["folders"][0]["published"]["latest"],
            "registry/gw:grpc-gateway-svc1-latest"
        );
        assert!(value["folders"][1].get("published").is_none());
    }

    #[test]
    fn test_yaml_format() {
        let output = OutputFormatter::new(OutputFormat::Yaml)
            .format_report(&sample_report())
            .unwrap();
        assert!(output.contains("folder_id: svc1"));
        assert!(output.contains("reason: none"));
    }

    #[test]
    fn test_human_format() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_report(&sample_report())
            .unwrap();
        assert!(output.contains("svc1 (rebuilt: image-absent)"));
        assert!(output.contains("RegisterUserServiceHandlerFromEndpoint"));
        assert!(output.contains("svc2 (skipped: no changes)"));
        assert!(output.contains("Built 1, skipped 1"));
    }

    #[test]
    fn test_plan_formats() {
        let decisions: Vec<_> = sample_report()
            .folders
            .into_iter()
            .map(|f| f.decision)
            .collect();

        let human = OutputFormatter::new(OutputFormat::Human)
            .format_plan(&decisions)
            .unwrap();
        assert!(human.contains("svc1"));
        assert!(human.contains("build"));
        assert!(human.contains("skip"));

        let json = OutputFormatter::new(OutputFormat::Json)
            .format_plan(&decisions)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[1]["should_build"], false);
    }
}
