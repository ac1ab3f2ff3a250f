use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::aggregate::{self, round1};
use crate::models::{
    DatasetSummary, DepartmentStats, DistributionBucket, Employee, FeatureImportance,
    PerformanceCategory, RawRecord,
};
use crate::normalize::normalize;

#[derive(Debug, Clone, Default)]
struct DerivedViews {
    employees: Vec<Employee>,
    department_stats: Vec<DepartmentStats>,
    performance_distribution: Vec<DistributionBucket>,
    feature_importance: Vec<FeatureImportance>,
}

impl DerivedViews {
    fn compute<R: Rng + ?Sized>(records: &[RawRecord], rng: &mut R) -> Self {
        let employees: Vec<Employee> = records
            .iter()
            .enumerate()
            .map(|(index, raw)| normalize(raw, index + 1, rng))
            .collect();

        Self {
            department_stats: aggregate::department_stats(&employees),
            performance_distribution: aggregate::performance_distribution(&employees),
            feature_importance: aggregate::feature_importance(&employees),
            employees,
        }
    }
}

/// Holds the current upload and the views derived from it. Every mutation
/// recomputes the views before returning, so reads never see stale data.
#[derive(Debug)]
pub struct DatasetStore<R = StdRng> {
    raw_records: Vec<RawRecord>,
    dataset_name: Option<String>,
    analyzing: bool,
    views: DerivedViews,
    rng: R,
}

impl DatasetStore<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Default for DatasetStore<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> DatasetStore<R> {
    /// Uses `rng` for every default the normalizer has to synthesize.
    pub fn with_rng(mut rng: R) -> Self {
        let views = DerivedViews::compute(&[], &mut rng);
        Self {
            raw_records: Vec::new(),
            dataset_name: None,
            analyzing: false,
            views,
            rng,
        }
    }

    pub fn replace_dataset(&mut self, records: Vec<RawRecord>, name: Option<String>) {
        self.views = DerivedViews::compute(&records, &mut self.rng);
        self.raw_records = records;
        self.dataset_name = name;
        info!(
            dataset = self.dataset_name.as_deref().unwrap_or("unnamed"),
            employees = self.views.employees.len(),
            departments = self.views.department_stats.len(),
            "dataset replaced"
        );
    }

    pub fn reset(&mut self) {
        self.raw_records.clear();
        self.dataset_name = None;
        self.analyzing = false;
        self.views = DerivedViews::compute(&[], &mut self.rng);
        info!("dataset reset");
    }

    pub fn set_analyzing(&mut self, analyzing: bool) {
        self.analyzing = analyzing;
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn has_uploaded_data(&self) -> bool {
        !self.raw_records.is_empty()
    }

    pub fn dataset_name(&self) -> Option<&str> {
        self.dataset_name.as_deref()
    }

    pub fn raw_records(&self) -> &[RawRecord] {
        &self.raw_records
    }

    pub fn employees(&self) -> &[Employee] {
        &self.views.employees
    }

    pub fn department_stats(&self) -> &[DepartmentStats] {
        &self.views.department_stats
    }

    pub fn performance_distribution(&self) -> &[DistributionBucket] {
        &self.views.performance_distribution
    }

    pub fn feature_importance(&self) -> &[FeatureImportance] {
        &self.views.feature_importance
    }

    pub fn summary(&self) -> DatasetSummary {
        summarize(&self.views.employees)
    }
}

/// Headline numbers for a set of employees; averages are rounded to one decimal.
pub fn summarize(employees: &[Employee]) -> DatasetSummary {
    let total = employees.len();
    let mean = |value: fn(&Employee) -> f64| {
        if total == 0 {
            0.0
        } else {
            round1(employees.iter().map(value).sum::<f64>() / total as f64)
        }
    };
    let count = |category: PerformanceCategory| {
        employees
            .iter()
            .filter(|e| e.performance_category() == category)
            .count()
    };

    let mut departments: Vec<String> = Vec::new();
    for employee in employees {
        if !departments.contains(&employee.department) {
            departments.push(employee.department.clone());
        }
    }

    DatasetSummary {
        total_employees: total,
        avg_performance: mean(|e| e.performance_score()),
        avg_satisfaction: mean(|e| e.satisfaction_score),
        departments,
        low_performers: count(PerformanceCategory::Low),
        medium_performers: count(PerformanceCategory::Medium),
        high_performers: count(PerformanceCategory::High),
    }
}
