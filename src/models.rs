use std::fmt;

use serde::{Deserialize, Serialize};

/// One uploaded row, keyed by its original (unnormalized) column names.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerformanceCategory {
    Low,
    Medium,
    High,
}

impl PerformanceCategory {
    pub const ALL: [PerformanceCategory; 3] = [
        PerformanceCategory::Low,
        PerformanceCategory::Medium,
        PerformanceCategory::High,
    ];

    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            PerformanceCategory::High
        } else if score < 60.0 {
            PerformanceCategory::Low
        } else {
            PerformanceCategory::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceCategory::Low => "Low",
            PerformanceCategory::Medium => "Medium",
            PerformanceCategory::High => "High",
        }
    }

    /// The attrition signal runs opposite to the performance category.
    pub fn inverse(&self) -> Self {
        match self {
            PerformanceCategory::Low => PerformanceCategory::High,
            PerformanceCategory::Medium => PerformanceCategory::Medium,
            PerformanceCategory::High => PerformanceCategory::Low,
        }
    }
}

impl fmt::Display for PerformanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PerformanceCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(PerformanceCategory::Low),
            "medium" => Ok(PerformanceCategory::Medium),
            "high" => Ok(PerformanceCategory::High),
            other => Err(format!("unknown performance category: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub department: String,
    pub satisfaction_score: f64,
    pub training_hours: f64,
    pub years_at_company: f64,
    pub work_hours_per_week: f64,
    pub overtime_hours: f64,
    pub sick_days: f64,
    performance_score: f64,
    performance_category: PerformanceCategory,
}

impl Employee {
    /// Builds an employee whose category is derived from `performance_score`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        name: String,
        department: String,
        satisfaction_score: f64,
        training_hours: f64,
        years_at_company: f64,
        work_hours_per_week: f64,
        overtime_hours: f64,
        sick_days: f64,
        performance_score: f64,
    ) -> Self {
        Self {
            id,
            name,
            department,
            satisfaction_score,
            training_hours,
            years_at_company,
            work_hours_per_week,
            overtime_hours,
            sick_days,
            performance_score,
            performance_category: PerformanceCategory::from_score(performance_score),
        }
    }

    pub fn performance_score(&self) -> f64 {
        self.performance_score
    }

    /// Always agrees with [`Employee::performance_score`]; the two are only
    /// set together in [`Employee::new`].
    pub fn performance_category(&self) -> PerformanceCategory {
        self.performance_category
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStats {
    pub department: String,
    pub employee_count: usize,
    pub avg_performance: f64,
    pub avg_satisfaction: f64,
    pub avg_training_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionBucket {
    pub range: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: &'static str,
    pub importance: f64,
    pub category: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub total_employees: usize,
    pub avg_performance: f64,
    pub avg_satisfaction: f64,
    pub departments: Vec<String>,
    pub low_performers: usize,
    pub medium_performers: usize,
    pub high_performers: usize,
}
