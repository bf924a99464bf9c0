// file: src/pipeline/report.rs
// description: llm-driven code quality scoring and improvement task extraction
// reference: LLM code review report format

use crate::error::{PipelineError, Result};
use crate::llm::ChatModel;
use crate::models::{CodeScores, ReportTask, Score};
use crate::pipeline::metadata::{CodeReport, FileMetadata};
use crate::pipeline::stage::PipelineStage;
use crate::utils::Validator;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

pub const NO_CODE_MARKER: &str = "This file does not contain code";
pub const MAX_TASKS: usize = 5;

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("CODE_FENCE regex is valid");
}

const PROMPT_TEMPLATE: &str = r#"Generate a report for this file {file_path}:

{content}

The report must contain these scores, each an integer from 0 to 100:

- documentation_score: how well the file is documented.
- bugs_score: the presence of potential bugs.
- security_score: the presence of potential security vulnerabilities.
- performance_score: the presence of potential performance issues.

Also list up to 5 tasks that would improve those scores. Each task has a title,
a description, a category (documentation, bugs, security or performance), a
priority (low, medium or high) and a prompt an LLM can use to start working on it.
Tasks must be specific to this code, not generic advice.

If the file does not contain code, reply only with the text "This file does not contain code".

Reply with a JSON object of this shape:

{
    "documentation_score": 80,
    "bugs_score": 60,
    "security_score": 40,
    "performance_score": 20,
    "tasks": [
        {
            "title": "Document public functions",
            "description": "Explain the purpose and arguments of each public function.",
            "category": "documentation",
            "priority": "high",
            "prompt": "Add doc comments to every public function in this file."
        }
    ]
}
"#;

#[derive(Debug, Deserialize)]
struct RawReport {
    documentation_score: i64,
    bugs_score: i64,
    security_score: i64,
    performance_score: i64,
    tasks: Vec<ReportTask>,
}

pub struct ReportStage {
    model: Arc<dyn ChatModel>,
}

impl ReportStage {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub fn render_prompt(file_path: &Path, content: &str) -> String {
        PROMPT_TEMPLATE
            .replacen("{file_path}", &file_path.display().to_string(), 1)
            .replacen("{content}", content, 1)
    }

    /// Parses a raw model reply. The no-code marker wins over anything else
    /// in the reply.
    pub fn parse_report(raw: &str) -> Result<CodeReport> {
        if raw.contains(NO_CODE_MARKER) {
            return Ok(CodeReport::no_code());
        }

        let json = extract_json(raw).ok_or_else(|| {
            PipelineError::ReportParse("response contains no JSON object".to_string())
        })?;

        let report: RawReport = serde_json::from_str(json)
            .map_err(|e| PipelineError::ReportParse(format!("invalid report JSON: {}", e)))?;

        let scores = CodeScores {
            documentation: Score::new(report.documentation_score)?,
            bugs: Score::new(report.bugs_score)?,
            security: Score::new(report.security_score)?,
            performance: Score::new(report.performance_score)?,
        };

        let mut tasks = report.tasks;
        if tasks.len() > MAX_TASKS {
            debug!("Truncating {} tasks to {}", tasks.len(), MAX_TASKS);
            tasks.truncate(MAX_TASKS);
        }

        Ok(CodeReport {
            scores,
            tasks,
            contains_code: true,
        })
    }
}

fn extract_json(raw: &str) -> Option<&str> {
    let body = CODE_FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end > start).then(|| &body[start..=end])
}

#[async_trait]
impl PipelineStage for ReportStage {
    fn name(&self) -> &'static str {
        "report"
    }

    async fn process(
        &self,
        file_path: &Path,
        content: &str,
        metadata: &mut FileMetadata,
    ) -> Result<()> {
        let prompt = Self::render_prompt(file_path, content);

        let raw = match self.model.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(file = %file_path.display(), "Report generation failed: {}", e);
                return Ok(());
            }
        };

        match Self::parse_report(&raw) {
            Ok(report) => {
                debug!(
                    file = %file_path.display(),
                    tasks = report.tasks.len(),
                    contains_code = report.contains_code,
                    "Report parsed"
                );
                metadata.record_report(report);
            }
            Err(e) => {
                warn!(file = %file_path.display(), "Discarding malformed report: {}", e);
                debug!("Raw report: {}", Validator::truncate_text(&raw, 200));
            }
        }

        Ok(())
    }
}
