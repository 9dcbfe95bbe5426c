use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};

use crate::analysis::ComprehensiveAnalysis;

use super::styling::{bright, bright_yellow, classification, confidence, cyan, dim};
use super::tables::{
    color_coded_confidence_cell, color_coded_priority_cell, create_cyan_header, create_table,
    status_cell,
};

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

/// Renders a human-readable triage report.
///
/// Sections: overview, failure patterns, evidence checks, classification,
/// recommendations and evidence sources.
#[allow(clippy::too_many_lines)]
pub fn render_summary(analysis: &ComprehensiveAnalysis) -> String {
    let mut output = String::new();
    let intelligence = &analysis.investigation.jenkins_intelligence;
    let metadata = &intelligence.metadata;
    let failures = &intelligence.failure_analysis;
    let solution = &analysis.solution;

    add_section_header(&mut output, "📊", "Overview");
    let _ = write!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n\n",
        dim("Build:"),
        cyan(&analysis.build_url),
        dim("Job:"),
        bright_yellow(format!("{} #{}", metadata.job_name, metadata.build_number)),
        dim("Result:"),
        bright(metadata.result),
        dim("Classification:"),
        classification(analysis.overall_classification),
        dim("Overall confidence:"),
        confidence(analysis.overall_confidence),
        dim("Elapsed:"),
        dim(format!("{:.2}s", analysis.total_elapsed_seconds)),
        dim("Analysis date:"),
        dim(analysis.analyzed_at.format("%Y-%m-%d %H:%M UTC")),
    );

    add_section_header(&mut output, "🔎", "Failure Patterns");
    if failures.failure_patterns.is_empty() {
        let _ = writeln!(output, "  {}\n", bright_yellow("No failure patterns matched."));
    } else {
        let mut table = create_table();
        table.set_header(create_cyan_header(&["Category", "Matches", "Share", "First Match"]));
        for (category, matches) in &failures.failure_patterns {
            let share = solution
                .evidence_analysis
                .error_distribution
                .get(category)
                .copied()
                .unwrap_or_default();
            let mut category_cell = Cell::new(category.as_str());
            if *category == failures.primary_failure_type {
                category_cell = category_cell.fg(TableColor::Yellow);
            }
            table.add_row(vec![
                category_cell,
                Cell::new(failures.count(*category)),
                Cell::new(format!("{share:.1}%")),
                Cell::new(matches.first().map_or("", String::as_str)),
            ]);
        }
        let _ = writeln!(output, "{table}\n");
    }

    add_section_header(&mut output, "🧪", "Evidence Checks");
    let environment = &analysis.investigation.environment_validation;
    let repository = &analysis.investigation.repository_analysis;
    let mut checks = create_table();
    checks.set_header(create_cyan_header(&["Source", "Status", "Confidence", "Detail"]));
    checks.add_row(vec![
        Cell::new("jenkins"),
        status_cell(metadata.result.is_known(), metadata.result.as_str()),
        color_coded_confidence_cell(intelligence.confidence_score),
        Cell::new(format!("{} failure match(es)", failures.total_failures)),
    ]);
    let environment_label = match (environment.probe, environment.environment_healthy) {
        (None, _) => "skipped".to_string(),
        (Some(probe), true) => format!("healthy ({})", probe.as_str()),
        (Some(probe), false) => format!("unhealthy ({})", probe.as_str()),
    };
    checks.add_row(vec![
        Cell::new("environment"),
        status_cell(environment.environment_healthy, &environment_label),
        color_coded_confidence_cell(environment.health_score),
        Cell::new(&environment.detail),
    ]);
    let repository_label = match (repository.source, repository.repository_cloned) {
        (None, _) => "skipped".to_string(),
        (Some(source), true) => format!("cloned ({})", source.as_str()),
        (Some(source), false) => format!("not cloned ({})", source.as_str()),
    };
    checks.add_row(vec![
        Cell::new("repository"),
        status_cell(repository.repository_cloned, &repository_label),
        color_coded_confidence_cell(if repository.repository_cloned { 1.0 } else { 0.0 }),
        Cell::new(&repository.detail),
    ]);
    let _ = writeln!(output, "{checks}\n");

    add_section_header(&mut output, "🏷️", "Classification");
    let bug_classification = &solution.bug_classification;
    let _ = writeln!(
        output,
        "  {} {}",
        classification(bug_classification.classification),
        dim(format!("({:.0}% confidence)", bug_classification.confidence * 100.0))
    );
    for reason in &bug_classification.reasoning {
        let _ = writeln!(output, "  {} {}", dim("•"), reason);
    }
    output.push('\n');

    add_section_header(&mut output, "🛠️", "Recommendations");
    let mut recommendations = create_table();
    recommendations.set_header(create_cyan_header(&[
        "#",
        "Recommendation",
        "Type",
        "Priority",
        "Estimate",
        "Confidence",
    ]));
    for step in &solution.implementation_guidance.ordered_steps {
        let recommendation_confidence = solution
            .fix_recommendations
            .iter()
            .find(|r| r.title == step.title)
            .map_or(0.0, |r| r.confidence);
        recommendations.add_row(vec![
            Cell::new(step.order),
            Cell::new(&step.title),
            Cell::new(step.kind.as_str()),
            color_coded_priority_cell(step.priority),
            Cell::new(&step.estimated_time),
            color_coded_confidence_cell(recommendation_confidence),
        ]);
    }
    let _ = writeln!(output, "{recommendations}\n");

    add_section_header(&mut output, "📚", "Evidence Sources");
    if analysis.evidence_sources.is_empty() {
        let _ = writeln!(output, "  {}", dim("None"));
    }
    for source in &analysis.evidence_sources {
        let _ = writeln!(output, "  {} {}", dim("•"), source);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::solution::tests::investigation_with;
    use crate::agents::SolutionAgent;
    use chrono::Utc;

    fn analysis(console: &str, health_score: f64) -> ComprehensiveAnalysis {
        let investigation = investigation_with(console, health_score);
        let solution = SolutionAgent::new().solve(&investigation);
        ComprehensiveAnalysis {
            build_url: "https://ci.example.com/job/e2e/7/".to_string(),
            analyzed_at: Utc::now(),
            overall_classification: solution.bug_classification.classification,
            evidence_sources: investigation.evidence_sources(),
            overall_confidence: 0.6 * investigation.confidence_score + 0.4 * solution.confidence_score,
            total_elapsed_seconds: 0.01,
            investigation,
            solution,
        }
    }

    #[test]
    fn test_render_summary_sections() {
        let output = render_summary(&analysis("TimeoutError: waiting for #submit", 0.9));

        assert!(output.contains("Overview"));
        assert!(output.contains("e2e #7"));
        assert!(output.contains("Failure Patterns"));
        assert!(output.contains("timeout_errors"));
        assert!(output.contains("AUTOMATION BUG"));
        assert!(output.contains("Comprehensive test suite review"));
        assert!(output.contains("[Console:e2e:7:console_log]"));
    }

    #[test]
    fn test_render_summary_without_patterns() {
        let output = render_summary(&analysis("", 0.0));
        assert!(output.contains("No failure patterns matched."));
        assert!(output.contains("skipped"));
    }

    #[test]
    fn test_render_summary_labels_probe_kind() {
        let output = render_summary(&analysis("connection refused", 0.9));
        assert!(output.contains("healthy (live)"));
        assert!(output.contains("PRODUCT BUG"));
    }
}
