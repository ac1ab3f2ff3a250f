use std::fmt::Write;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::aggregate;
use crate::dataset::{summarize, DatasetStore};
use crate::filter::FilterStore;
use crate::models::Employee;

/// Renders the dashboard for the filtered view of `dataset` as markdown.
pub fn build_report<R: Rng>(
    dataset: &DatasetStore<R>,
    filters: &FilterStore,
    generated_at: DateTime<Utc>,
) -> String {
    let employees: Vec<Employee> = filters
        .filtered_employees(dataset)
        .into_iter()
        .cloned()
        .collect();
    let summary = summarize(&employees);
    let departments = aggregate::department_stats(&employees);
    let distribution = aggregate::performance_distribution(&employees);
    let importance = aggregate::feature_importance(&employees);

    let mut output = String::new();
    let dataset_label = dataset.dataset_name().unwrap_or("no dataset uploaded");

    let _ = writeln!(output, "# Workforce Performance Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        dataset_label,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Filters");

    if filters.has_active_filters() {
        if !filters.selected_departments().is_empty() {
            let _ = writeln!(
                output,
                "- Departments: {}",
                filters.selected_departments().join(", ")
            );
        }
        if !filters.selected_categories().is_empty() {
            let labels: Vec<&str> = filters
                .selected_categories()
                .iter()
                .map(|c| c.as_str())
                .collect();
            let _ = writeln!(output, "- Performance: {}", labels.join(", "));
        }
    } else {
        let _ = writeln!(output, "None; showing every employee.");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Employees: {}", summary.total_employees);
    let _ = writeln!(output, "- Average performance: {:.1}", summary.avg_performance);
    let _ = writeln!(output, "- Average satisfaction: {:.1}", summary.avg_satisfaction);
    let _ = writeln!(
        output,
        "- High / Medium / Low performers: {} / {} / {}",
        summary.high_performers, summary.medium_performers, summary.low_performers
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Departments");

    if departments.is_empty() {
        let _ = writeln!(output, "No employees match the current filters.");
    } else {
        let _ = writeln!(
            output,
            "| Department | Employees | Avg performance | Avg satisfaction | Avg training hours |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|");
        for stats in departments.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {:.1} | {:.1} | {:.0} |",
                stats.department,
                stats.employee_count,
                stats.avg_performance,
                stats.avg_satisfaction,
                stats.avg_training_hours
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Performance Distribution");
    for bucket in distribution.iter() {
        let _ = writeln!(output, "- {}: {}", bucket.range, bucket.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Feature Importance");

    if importance.is_empty() {
        let _ = writeln!(output, "Not enough employees to estimate importance.");
    } else {
        for feature in importance.iter() {
            let _ = writeln!(
                output,
                "- {} ({}): {:.1}%",
                feature.feature,
                feature.category,
                feature.importance * 100.0
            );
        }
    }

    let mut lowest = employees;
    lowest.sort_by(|a, b| {
        a.performance_score()
            .partial_cmp(&b.performance_score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let _ = writeln!(output);
    let _ = writeln!(output, "## Lowest Performers");

    if lowest.is_empty() {
        let _ = writeln!(output, "No employees match the current filters.");
    } else {
        for employee in lowest.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}, {}) score {:.1} [{}]",
                employee.name,
                employee.id,
                employee.department,
                employee.performance_score(),
                employee.performance_category()
            );
        }
    }

    output
}
