use colored::*;
use quick_xml::se::to_string as to_xml_string;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::OutputFormat;
use crate::errors::CalculatorResult;
use crate::operation::{Evaluation, OperationKind};
use crate::session::Session;

#[derive(Serialize)]
struct Report<'a> {
    total: usize,
    failed: usize,
    evaluations: &'a [Evaluation],
}

impl Session {
    /// Prints the report in the configured output format
    pub fn generate_report(&self) -> CalculatorResult<()> {
        println!("{}", self.render_report()?);
        Ok(())
    }

    pub fn render_report(&self) -> CalculatorResult<String> {
        match self.config.output.format {
            OutputFormat::Console => Ok(self.render_console_report()),
            OutputFormat::Json => self.render_json_report(),
            OutputFormat::Xml => self.render_xml_report(),
        }
    }

    fn report(&self) -> Report<'_> {
        Report {
            total: self.evaluations.len(),
            failed: self.failures().count(),
            evaluations: &self.evaluations,
        }
    }

    fn render_console_report(&self) -> String {
        let color = self.config.output.color;
        let paint = |text: &str, painted: ColoredString| {
            if color {
                painted.to_string()
            } else {
                text.to_string()
            }
        };

        let mut out = String::new();
        let title = "=== CALCULATION REPORT ===";
        out.push_str(&format!("{}\n", paint(title, title.bold().blue())));
        out.push_str(&format!(
            "Evaluated: {}, failed: {}\n\n",
            self.evaluations.len(),
            self.failures().count()
        ));

        // Unparseable lines have no kind and are listed last
        let mut by_kind: BTreeMap<Option<OperationKind>, Vec<&Evaluation>> = BTreeMap::new();
        for evaluation in &self.evaluations {
            by_kind.entry(evaluation.operation).or_default().push(evaluation);
        }
        let unparsed = by_kind.remove(&None);
        let groups = by_kind
            .into_iter()
            .map(|(kind, evals)| (kind.map_or("Unparsed", |k| k.description()), kind, evals))
            .chain(unparsed.map(|evals| ("Unparsed", None, evals)));

        for (heading, kind, evaluations) in groups {
            let header = format!("{} ({})", heading, evaluations.len());
            let painted = match kind {
                Some(k) => header.color(k.color()).bold(),
                None => header.red().bold(),
            };
            out.push_str(&format!("{}\n", paint(&header, painted)));

            for evaluation in evaluations {
                let location = format!("{}:{}", evaluation.source, evaluation.line_number);
                out.push_str(&format!("  {}  {}", paint(&location, location.dimmed()), evaluation.expression));
                match (&evaluation.value, &evaluation.error) {
                    (_, Some(error)) => {
                        let text = format!("error: {}", error);
                        out.push_str(&format!(" => {}\n", paint(&text, text.red())));
                    }
                    (Some(value), None) => {
                        out.push_str(&format!(" = {}\n", value));
                    }
                    (None, None) => {
                        out.push('\n');
                    }
                }
            }
            out.push('\n');
        }

        let status = if self.has_failures() {
            let text = "Some operations failed.";
            paint(text, text.red().bold())
        } else {
            let text = "All operations succeeded.";
            paint(text, text.green().bold())
        };
        out.push_str(&status);
        out
    }

    fn render_json_report(&self) -> CalculatorResult<String> {
        Ok(serde_json::to_string_pretty(&self.report())?)
    }

    fn render_xml_report(&self) -> CalculatorResult<String> {
        #[derive(Serialize)]
        #[serde(rename = "calculation_report")]
        struct XmlReport<'a> {
            total: usize,
            failed: usize,
            #[serde(rename = "evaluation")]
            evaluations: &'a [Evaluation],
        }

        let report = self.report();
        let xml = to_xml_string(&XmlReport {
            total: report.total,
            failed: report.failed,
            evaluations: report.evaluations,
        })?;
        Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::operation::Operation;
    use crate::session::ARGS_SOURCE;
    use std::path::PathBuf;

    fn session_with(format: OutputFormat) -> Session {
        let mut config = Config::default();
        config.output.format = format;
        config.output.color = false;
        let mut session = Session::with_config(config, PathBuf::from(".")).unwrap();
        session.evaluate(ARGS_SOURCE, 1, Operation::Add { a: 1, b: 2 });
        session.evaluate(ARGS_SOURCE, 2, Operation::Divide { a: 3, b: 0 });
        session.evaluate_line(ARGS_SOURCE, 3, "pow 2 3");
        session
    }

    #[test]
    fn test_console_report() {
        let report = session_with(OutputFormat::Console).render_report().unwrap();

        assert!(report.starts_with("=== CALCULATION REPORT ==="));
        assert!(report.contains("Evaluated: 3, failed: 2"));
        assert!(report.contains("Addition (1)"));
        assert!(report.contains("<args>:1  1 + 2 = 3"));
        assert!(report.contains("<args>:2  3 / 0 => error: divide by zero"));
        assert!(report.contains("Unparsed (1)"));
        assert!(report.ends_with("Some operations failed."));
    }

    #[test]
    fn test_console_report_without_color_has_no_escapes() {
        let report = session_with(OutputFormat::Console).render_report().unwrap();
        assert!(!report.contains('\x1b'));
        assert_eq!(report.lines().filter(|l| l.starts_with("  <args>:")).count(), 3);
    }

    #[test]
    fn test_console_report_unparsed_group_comes_last() {
        let report = session_with(OutputFormat::Console).render_report().unwrap();
        let division = report.find("Integer division").unwrap();
        let unparsed = report.find("Unparsed").unwrap();
        assert!(division < unparsed);
    }

    #[test]
    fn test_console_report_all_succeeded() {
        let mut config = Config::default();
        config.output.color = false;
        let mut session = Session::with_config(config, PathBuf::from(".")).unwrap();
        session.evaluate(ARGS_SOURCE, 1, Operation::SquareRoot { a: 9.0 });

        let report = session.render_report().unwrap();
        assert!(report.contains("sqrt(9) = 3"));
        assert!(report.ends_with("All operations succeeded."));
    }

    #[test]
    fn test_json_report() {
        let report = session_with(OutputFormat::Json).render_report().unwrap();
        let json: serde_json::Value = serde_json::from_str(&report).unwrap();

        assert_eq!(json["total"], 3);
        assert_eq!(json["failed"], 2);
        assert_eq!(json["evaluations"][0]["value"], 3);
        assert_eq!(json["evaluations"][1]["error"], "divide by zero");
        assert!(json["evaluations"][2].get("operation").is_none());
    }

    #[test]
    fn test_xml_report() {
        let report = session_with(OutputFormat::Xml).render_report().unwrap();

        assert!(report.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(report.contains("<calculation_report>"));
        assert!(report.contains("<total>3</total>"));
        assert!(report.contains("<failed>2</failed>"));
        assert!(report.contains("<error>divide by zero</error>"));
    }
}
