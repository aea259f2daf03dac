use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::{CampaignRecord, ScenarioResult};

#[allow(clippy::cast_precision_loss)]
fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    (passed as f64 / results.len() as f64) * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    records: &[CampaignRecord],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenario runs: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} (seed {})",
            status,
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    if !records.is_empty() {
        writeln!(out, "{}", "⚔️  Campaign Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "===================".yellow())?;
        let cleared = records.iter().filter(|r| r.end == "cleared").count();
        let stranded = records.iter().filter(|r| r.end == "stranded").count();
        let battles: usize = records.iter().map(|r| r.battles).sum();
        let victories: usize = records.iter().map(|r| r.victories).sum();
        let furthest = records.iter().map(|r| r.final_stage).max().unwrap_or(0);
        writeln!(out, "Campaigns: {}", records.len())?;
        writeln!(out, "Cleared: {cleared}  Stranded: {stranded}")?;
        writeln!(out, "Battles won: {victories}/{battles}")?;
        writeln!(out, "Furthest stage: {furthest}")?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Warbook Logic Test Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenario runs**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {}", total_tests - passed_tests)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(
            out,
            "### {} {} (seed {})\n",
            status, result.scenario_name, result.seed
        )?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_csv_report(out: &mut dyn Write, records: &[CampaignRecord]) -> Result<()> {
    writeln!(
        out,
        "scenario,strategy,seed,rounds,questions,correct,purchases,battles,victories,final_stage,end,currency,troops,rations,digest"
    )?;
    for r in records {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            csv_field(&r.scenario),
            csv_field(&r.strategy),
            r.seed,
            r.rounds,
            r.questions_answered,
            r.correct_answers,
            r.purchases,
            r.battles,
            r.victories,
            r.final_stage,
            r.end,
            r.currency,
            r.troops,
            r.rations,
            r.ledger_digest
        )?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke".to_string(),
            seed: 42,
            passed,
            iterations_run: 2,
            successful_iterations: if passed { 2 } else { 1 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["Iteration 2: broken".to_string()]
            },
            average_duration: Duration::from_millis(3),
            performance_data: vec![Duration::from_millis(3)],
        }
    }

    fn record() -> CampaignRecord {
        CampaignRecord {
            scenario: "Full Campaign".to_string(),
            strategy: "Cautious".to_string(),
            seed: 42,
            rounds: 30,
            questions_answered: 25,
            correct_answers: 20,
            purchases: 9,
            battles: 4,
            victories: 2,
            final_stage: 3,
            end: "stranded".to_string(),
            currency: 10,
            troops: 0,
            rations: 40,
            ledger_digest: "00000000deadbeef".to_string(),
        }
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn console_report_lists_failures_and_campaigns() {
        let text = render(|out| {
            generate_console_report(
                out,
                &[result(true), result(false)],
                &[record()],
                Duration::from_secs(1),
            )
        });
        assert!(text.contains("Success rate: 50.0%"));
        assert!(text.contains("Iteration 2: broken"));
        assert!(text.contains("Battles won: 2/4"));
    }

    #[test]
    fn markdown_report_has_headings() {
        let text = render(|out| generate_markdown_report(out, &[result(true)]));
        assert!(text.starts_with("# Warbook Logic Test Results"));
        assert!(text.contains("### ✅ Smoke (seed 42)"));
    }

    #[test]
    fn csv_report_quotes_awkward_fields() {
        let mut awkward = record();
        awkward.scenario = "Replay, \"strict\"".to_string();
        let text = render(|out| generate_csv_report(out, &[record(), awkward]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("scenario,strategy,seed"));
        assert!(lines[1].starts_with("Full Campaign,Cautious,42,30"));
        assert!(lines[2].starts_with("\"Replay, \"\"strict\"\"\",Cautious"));
    }

    #[test]
    fn json_report_is_an_array() {
        let text = render(|out| generate_json_report(out, &[result(true)]));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(1));
    }
}
