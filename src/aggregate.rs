use std::collections::HashMap;

use crate::models::{DepartmentStats, DistributionBucket, Employee, FeatureImportance};

/// Weight assigned to every feature when no signal varies across employees.
pub const FLAT_FALLBACK_IMPORTANCE: f64 = 0.15;

const BUCKETS: [(&str, f64, f64); 5] = [
    ("0-20", 0.0, 20.0),
    ("21-40", 21.0, 40.0),
    ("41-60", 41.0, 60.0),
    ("61-80", 61.0, 80.0),
    ("81-100", 81.0, 100.0),
];

struct Signal {
    feature: &'static str,
    category: &'static str,
    value: fn(&Employee) -> f64,
}

const SIGNALS: [Signal; 6] = [
    Signal {
        feature: "Employee Satisfaction Score",
        category: "Engagement",
        value: |e| e.satisfaction_score * 20.0,
    },
    Signal {
        feature: "Training Hours",
        category: "Development",
        value: |e| e.training_hours,
    },
    Signal {
        feature: "Years at Company",
        category: "Experience",
        value: |e| e.years_at_company * 5.0,
    },
    Signal {
        feature: "Work Hours per Week",
        category: "Workload",
        value: |e| e.work_hours_per_week,
    },
    Signal {
        feature: "Overtime Hours",
        category: "Workload",
        value: |e| e.overtime_hours * 2.0,
    },
    Signal {
        feature: "Sick Days",
        category: "Health",
        value: |e| e.sick_days * -3.0,
    },
];

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Groups by department in order of first appearance.
pub fn department_stats(employees: &[Employee]) -> Vec<DepartmentStats> {
    #[derive(Default)]
    struct Totals {
        count: usize,
        performance: f64,
        satisfaction: f64,
        training: f64,
    }

    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, Totals> = HashMap::new();

    for employee in employees {
        let department = employee.department.as_str();
        let entry = totals.entry(department).or_insert_with(|| {
            order.push(department);
            Totals::default()
        });
        entry.count += 1;
        entry.performance += employee.performance_score();
        entry.satisfaction += employee.satisfaction_score;
        entry.training += employee.training_hours;
    }

    order
        .into_iter()
        .filter_map(|department| {
            let totals = totals.get(department)?;
            let count = totals.count as f64;
            Some(DepartmentStats {
                department: department.to_string(),
                employee_count: totals.count,
                avg_performance: round1(totals.performance / count),
                avg_satisfaction: round1(totals.satisfaction / count),
                avg_training_hours: (totals.training / count).round(),
            })
        })
        .collect()
}

/// Always five buckets in fixed order. Bounds are inclusive; fractional
/// scores between two buckets (e.g. 20.5) land in the upper one.
pub fn performance_distribution(employees: &[Employee]) -> Vec<DistributionBucket> {
    let mut counts = [0usize; BUCKETS.len()];
    for employee in employees {
        if let Some(slot) = bucket_index(employee.performance_score()) {
            counts[slot] += 1;
        }
    }

    BUCKETS
        .iter()
        .zip(counts)
        .map(|(&(range, _, _), count)| DistributionBucket { range, count })
        .collect()
}

fn bucket_index(score: f64) -> Option<usize> {
    if !(0.0..=100.0).contains(&score) {
        return None;
    }
    BUCKETS.iter().position(|&(_, _, max)| score <= max)
}

/// Variance-based importance of six derived signals, normalized to sum to 1
/// and sorted descending (ties keep declaration order).
pub fn feature_importance(employees: &[Employee]) -> Vec<FeatureImportance> {
    if employees.len() < 2 {
        return Vec::new();
    }

    let raw: Vec<f64> = SIGNALS
        .iter()
        .map(|signal| {
            let values: Vec<f64> = employees.iter().map(signal.value).collect();
            population_variance(&values).sqrt() / 10.0
        })
        .collect();
    let total: f64 = raw.iter().sum();

    let mut ranked: Vec<FeatureImportance> = SIGNALS
        .iter()
        .zip(raw)
        .map(|(signal, score)| FeatureImportance {
            feature: signal.feature,
            importance: if total > 0.0 {
                score / total
            } else {
                FLAT_FALLBACK_IMPORTANCE
            },
            category: signal.category,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

fn population_variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(department: &str, performance: f64) -> Employee {
        Employee::new(
            format!("{department}-{performance}"),
            "Avery Lee".to_string(),
            department.to_string(),
            4.0,
            30.0,
            3.0,
            40.0,
            2.0,
            1.0,
            performance,
        )
    }

    fn employee_with_signals(satisfaction: f64, training: f64, sick_days: f64) -> Employee {
        Employee::new(
            "emp".to_string(),
            "Jules Moreno".to_string(),
            "Sales".to_string(),
            satisfaction,
            training,
            3.0,
            40.0,
            0.0,
            sick_days,
            70.0,
        )
    }

    #[test]
    fn department_stats_keep_first_seen_order_and_round() {
        let employees = vec![
            employee("Sales", 70.0),
            employee("Engineering", 90.0),
            employee("Sales", 75.0),
            employee("Sales", 81.0),
        ];
        let stats = department_stats(&employees);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].department, "Sales");
        assert_eq!(stats[0].employee_count, 3);
        assert_eq!(stats[0].avg_performance, 75.3);
        assert_eq!(stats[0].avg_satisfaction, 4.0);
        assert_eq!(stats[0].avg_training_hours, 30.0);
        assert_eq!(stats[1].department, "Engineering");
        assert_eq!(stats[1].employee_count, 1);
        assert_eq!(stats[1].avg_performance, 90.0);
    }

    #[test]
    fn department_counts_cover_every_employee() {
        let departments = ["HR", "Sales", "Finance", "HR", "Ops", "Sales", "HR"];
        let employees: Vec<Employee> = departments
            .iter()
            .enumerate()
            .map(|(i, d)| employee(d, 50.0 + i as f64))
            .collect();
        let stats = department_stats(&employees);

        let total: usize = stats.iter().map(|s| s.employee_count).sum();
        assert_eq!(total, employees.len());
        let mut names: Vec<&str> = stats.iter().map(|s| s.department.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Finance", "HR", "Ops", "Sales"]);
        assert!(department_stats(&[]).is_empty());
    }

    #[test]
    fn distribution_boundaries_are_inclusive() {
        let employees = vec![
            employee("A", 20.0),
            employee("A", 21.0),
            employee("A", 80.0),
            employee("A", 81.0),
        ];
        let buckets = performance_distribution(&employees);
        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 0, 1, 1]);
        let ranges: Vec<&str> = buckets.iter().map(|b| b.range).collect();
        assert_eq!(ranges, vec!["0-20", "21-40", "41-60", "61-80", "81-100"]);
    }

    #[test]
    fn distribution_counts_every_score_in_range() {
        let employees: Vec<Employee> = (0..=200)
            .map(|half_points| employee("A", half_points as f64 / 2.0))
            .collect();
        let buckets = performance_distribution(&employees);
        assert_eq!(buckets.len(), 5);
        let total: usize = buckets.iter().map(|b| b.count).sum();
        assert_eq!(total, employees.len());
    }

    #[test]
    fn empty_distribution_still_has_five_buckets() {
        let buckets = performance_distribution(&[]);
        assert_eq!(buckets.len(), 5);
        assert!(buckets.iter().all(|b| b.count == 0));
    }

    #[test]
    fn feature_importance_needs_two_employees() {
        assert!(feature_importance(&[]).is_empty());
        assert!(feature_importance(&[employee("A", 70.0)]).is_empty());
    }

    #[test]
    fn feature_importance_sums_to_one_and_sorts_descending() {
        let employees = vec![
            employee_with_signals(2.0, 10.0, 0.0),
            employee_with_signals(5.0, 60.0, 4.0),
            employee_with_signals(3.5, 25.0, 1.0),
        ];
        let ranked = feature_importance(&employees);

        assert_eq!(ranked.len(), 6);
        let total: f64 = ranked.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(ranked
            .windows(2)
            .all(|pair| pair[0].importance >= pair[1].importance));
        assert_eq!(ranked[0].feature, "Employee Satisfaction Score");
    }

    #[test]
    fn zero_importance_ties_keep_declaration_order() {
        let employees = vec![
            employee_with_signals(3.0, 10.0, 0.0),
            employee_with_signals(3.0, 30.0, 0.0),
        ];
        let ranked = feature_importance(&employees);
        let features: Vec<&str> = ranked.iter().map(|f| f.feature).collect();
        assert_eq!(
            features,
            vec![
                "Training Hours",
                "Employee Satisfaction Score",
                "Years at Company",
                "Work Hours per Week",
                "Overtime Hours",
                "Sick Days",
            ]
        );
        assert_eq!(ranked[0].importance, 1.0);
    }

    #[test]
    fn identical_employees_get_flat_fallback_weight() {
        let employees = vec![employee("A", 70.0), employee("A", 70.0)];
        let ranked = feature_importance(&employees);
        assert_eq!(ranked.len(), 6);
        assert!(ranked
            .iter()
            .all(|f| f.importance == FLAT_FALLBACK_IMPORTANCE));
        assert_eq!(ranked[0].category, "Engagement");
    }
}
