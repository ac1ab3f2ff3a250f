use rand::Rng;

use crate::dataset::DatasetStore;
use crate::models::{Employee, PerformanceCategory};

/// Shown when no dataset has been uploaded.
pub const DEFAULT_DEPARTMENTS: [&str; 6] = [
    "Engineering",
    "Sales",
    "HR",
    "Marketing",
    "Finance",
    "Operations",
];

/// Inclusion filters over the active dataset. An empty selection passes
/// everything; selections keep toggle order for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStore {
    selected_departments: Vec<String>,
    selected_categories: Vec<PerformanceCategory>,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_departments(&self) -> &[String] {
        &self.selected_departments
    }

    pub fn toggle_department(&mut self, department: &str) {
        toggle(&mut self.selected_departments, department.to_string());
    }

    pub fn clear_departments(&mut self) {
        self.selected_departments.clear();
    }

    pub fn set_departments<I, S>(&mut self, departments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_departments.clear();
        for department in departments {
            let department = department.into();
            if !self.selected_departments.contains(&department) {
                self.selected_departments.push(department);
            }
        }
    }

    pub fn selected_categories(&self) -> &[PerformanceCategory] {
        &self.selected_categories
    }

    pub fn toggle_category(&mut self, category: PerformanceCategory) {
        toggle(&mut self.selected_categories, category);
    }

    pub fn set_categories<I>(&mut self, categories: I)
    where
        I: IntoIterator<Item = PerformanceCategory>,
    {
        self.selected_categories.clear();
        for category in categories {
            if !self.selected_categories.contains(&category) {
                self.selected_categories.push(category);
            }
        }
    }

    pub fn has_active_filters(&self) -> bool {
        !self.selected_departments.is_empty() || !self.selected_categories.is_empty()
    }

    pub fn clear_all(&mut self) {
        self.selected_departments.clear();
        self.selected_categories.clear();
    }

    pub fn matches(&self, employee: &Employee) -> bool {
        let department_ok = self.selected_departments.is_empty()
            || self.selected_departments.contains(&employee.department);
        let category_ok = self.selected_categories.is_empty()
            || self
                .selected_categories
                .contains(&employee.performance_category());
        department_ok && category_ok
    }

    pub fn apply<'a>(&self, employees: &'a [Employee]) -> Vec<&'a Employee> {
        employees.iter().filter(|e| self.matches(e)).collect()
    }

    pub fn filtered_employees<'a, R: Rng>(
        &self,
        dataset: &'a DatasetStore<R>,
    ) -> Vec<&'a Employee> {
        self.apply(dataset.employees())
    }
}

/// Distinct departments of the uploaded data sorted lexicographically, or
/// the default list when nothing is uploaded.
pub fn available_departments<R: Rng>(dataset: &DatasetStore<R>) -> Vec<String> {
    if !dataset.has_uploaded_data() || dataset.employees().is_empty() {
        return DEFAULT_DEPARTMENTS.iter().map(|d| d.to_string()).collect();
    }

    let mut departments: Vec<String> = dataset
        .employees()
        .iter()
        .map(|e| e.department.clone())
        .collect();
    departments.sort();
    departments.dedup();
    departments
}

fn toggle<T: PartialEq>(selection: &mut Vec<T>, item: T) {
    if let Some(position) = selection.iter().position(|existing| *existing == item) {
        selection.remove(position);
    } else {
        selection.push(item);
    }
}
