//! Heuristic performance scoring served to the dashboard.
//!
//! The score is a fixed linear formula over sixteen attributes; there is no
//! learned model behind it.

mod validation;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::aggregate::round1;
use crate::models::PerformanceCategory;

pub use validation::{validate_request, FieldError};

pub const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Education {
    #[serde(rename = "High School")]
    HighSchool,
    #[serde(rename = "Associate's")]
    Associates,
    #[serde(rename = "Bachelor's")]
    Bachelors,
    #[serde(rename = "Master's")]
    Masters,
    #[serde(rename = "PhD")]
    Phd,
}

impl Education {
    pub const ALL: [Education; 5] = [
        Education::HighSchool,
        Education::Associates,
        Education::Bachelors,
        Education::Masters,
        Education::Phd,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Education::HighSchool => "High School",
            Education::Associates => "Associate's",
            Education::Bachelors => "Bachelor's",
            Education::Masters => "Master's",
            Education::Phd => "PhD",
        }
    }

    fn weight(&self) -> f64 {
        match self {
            Education::HighSchool => -5.0,
            Education::Associates => 0.0,
            Education::Bachelors => 5.0,
            Education::Masters => 10.0,
            Education::Phd => 15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteFrequency {
    Never,
    Rarely,
    Hybrid,
    Mostly,
    Always,
}

impl RemoteFrequency {
    pub const ALL: [RemoteFrequency; 5] = [
        RemoteFrequency::Never,
        RemoteFrequency::Rarely,
        RemoteFrequency::Hybrid,
        RemoteFrequency::Mostly,
        RemoteFrequency::Always,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RemoteFrequency::Never => "Never",
            RemoteFrequency::Rarely => "Rarely",
            RemoteFrequency::Hybrid => "Hybrid",
            RemoteFrequency::Mostly => "Mostly",
            RemoteFrequency::Always => "Always",
        }
    }

    fn weight(&self) -> f64 {
        match self {
            RemoteFrequency::Never => -2.0,
            RemoteFrequency::Rarely => 0.0,
            RemoteFrequency::Hybrid => 3.0,
            RemoteFrequency::Mostly => 2.0,
            RemoteFrequency::Always => 1.0,
        }
    }
}

/// A validated scoring request, in the field names the wire format uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringInput {
    pub age: f64,
    pub gender: String,
    pub department: String,
    pub education: Education,
    pub job_title: String,
    pub years_at_company: f64,
    /// Monthly salary.
    pub salary: f64,
    pub team_size: f64,
    pub remote: RemoteFrequency,
    pub work_hours: f64,
    pub projects: f64,
    pub overtime: f64,
    pub sick_days: f64,
    pub training: f64,
    pub promotions: f64,
    pub satisfaction: f64,
}

impl Default for ScoringInput {
    fn default() -> Self {
        Self {
            age: 30.0,
            gender: "Unknown".to_string(),
            department: "Unknown".to_string(),
            education: Education::Bachelors,
            job_title: "Employee".to_string(),
            years_at_company: 0.0,
            salary: 5000.0,
            team_size: 5.0,
            remote: RemoteFrequency::Hybrid,
            work_hours: 40.0,
            projects: 0.0,
            overtime: 0.0,
            sick_days: 0.0,
            training: 0.0,
            promotions: 0.0,
            satisfaction: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default = "healthy")]
    pub status: String,
    #[serde(default = "succeeded")]
    pub success: bool,
    pub performance_score: f64,
    /// Carries the performance category (a High value is a strong performer),
    /// not a risk. Kept under this name because consumers read it.
    pub risk_level: PerformanceCategory,
    pub confidence: f64,
    pub probabilities: Probabilities,
    /// The actual attrition signal: the inverse of `risk_level`.
    pub attrition_risk: PerformanceCategory,
    pub recommendations: Vec<String>,
}

fn healthy() -> String {
    "healthy".to_string()
}

fn succeeded() -> bool {
    true
}

/// Range the reported confidence is drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBand {
    pub base: f64,
    pub spread: f64,
}

pub const SERVER_CONFIDENCE: ConfidenceBand = ConfidenceBand {
    base: 82.0,
    spread: 10.0,
};

/// Wider band used when the score is simulated without the service.
pub const SIMULATED_CONFIDENCE: ConfidenceBand = ConfidenceBand {
    base: 75.0,
    spread: 15.0,
};

/// Unrounded score, clamped to `[0, 100]`. A zero work week or salary counts
/// as unreported and is scored at its default.
pub fn performance_score(input: &ScoringInput) -> f64 {
    let work_hours = reported_or(input.work_hours, 40.0);
    let salary = reported_or(input.salary, 5000.0);

    let score = 25.0
        + input.satisfaction * 14.0
        + input.training * 0.55
        + input.years_at_company * 2.5
        + (work_hours - 40.0) * -0.3
        + input.overtime * -1.0
        + input.sick_days * -1.8
        + input.projects * 1.2
        + input.promotions * 3.5
        + input.team_size * 0.2
        + salary * 0.001
        + input.education.weight()
        + input.remote.weight()
        + age_factor(input.age);

    score.clamp(0.0, 100.0)
}

fn reported_or(value: f64, default: f64) -> f64 {
    if value == 0.0 {
        default
    } else {
        value
    }
}

/// Peak performance years are 35 through 45.
fn age_factor(age: f64) -> f64 {
    if age < 25.0 {
        -3.0
    } else if age > 55.0 {
        -5.0
    } else if (35.0..=45.0).contains(&age) {
        5.0
    } else {
        0.0
    }
}

pub fn predict<R: Rng + ?Sized>(
    input: &ScoringInput,
    band: ConfidenceBand,
    rng: &mut R,
) -> Prediction {
    let score = performance_score(input);
    let category = PerformanceCategory::from_score(score);
    let confidence = band.base + rng.gen::<f64>() * band.spread;

    Prediction {
        status: healthy(),
        success: true,
        performance_score: round1(score),
        risk_level: category,
        confidence: round1(confidence),
        probabilities: probabilities(category, rng),
        attrition_risk: category.inverse(),
        recommendations: recommendations(input, score),
    }
}

fn probabilities<R: Rng + ?Sized>(category: PerformanceCategory, rng: &mut R) -> Probabilities {
    let mut draw = |own: PerformanceCategory, favoured: (f64, f64), other: (f64, f64)| {
        let (base, spread) = if category == own { favoured } else { other };
        base + rng.gen::<f64>() * spread
    };
    let low = draw(PerformanceCategory::Low, (0.6, 0.2), (0.1, 0.1));
    let medium = draw(PerformanceCategory::Medium, (0.5, 0.2), (0.2, 0.1));
    let high = draw(PerformanceCategory::High, (0.65, 0.2), (0.15, 0.1));

    let total = low + medium + high;
    let low = round2(low / total);
    let medium = round2(medium / total);
    Probabilities {
        low,
        medium,
        high: round2(1.0 - low - medium),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn recommendations(input: &ScoringInput, score: f64) -> Vec<String> {
    let rules: [(bool, &str); 7] = [
        (
            input.satisfaction < 3.0,
            "Focus on improving employee satisfaction through engagement initiatives and regular feedback sessions.",
        ),
        (
            input.training < 20.0,
            "Increase training hours to boost skill development and career growth opportunities.",
        ),
        (
            input.overtime > 10.0,
            "Reduce overtime hours to prevent burnout and maintain sustainable productivity levels.",
        ),
        (
            input.sick_days > 10.0,
            "Implement wellness programs and flexible work arrangements to reduce sick days.",
        ),
        (
            input.promotions == 0.0 && input.years_at_company > 3.0,
            "Consider career development opportunities and promotion pathways for long-tenured employees.",
        ),
        (
            input.projects < 3.0,
            "Increase project involvement to enhance engagement and skill diversification.",
        ),
        (
            score >= 80.0,
            "Maintain current excellent performance levels through continued support and recognition.",
        ),
    ];

    let mut fired: Vec<String> = rules
        .iter()
        .filter(|(applies, _)| *applies)
        .map(|(_, text)| text.to_string())
        .collect();
    if fired.is_empty() {
        fired.push(
            "Continue monitoring performance metrics regularly and maintain current work patterns."
                .to_string(),
        );
    }
    fired.truncate(MAX_RECOMMENDATIONS);
    fired
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFeature {
    pub feature: String,
    pub importance: f64,
    pub description: String,
}

/// The service's fixed ranking of formula inputs.
pub fn static_feature_importance() -> Vec<RankedFeature> {
    [
        ("satisfaction", 0.22, "Employee Satisfaction Score"),
        ("training", 0.15, "Training Hours"),
        ("overtime", 0.12, "Overtime Hours"),
        ("sickDays", 0.11, "Sick Days"),
        ("promotions", 0.10, "Number of Promotions"),
        ("yearsAtCompany", 0.08, "Years at Company"),
        ("projects", 0.07, "Projects Handled"),
        ("education", 0.06, "Education Level"),
        ("remote", 0.05, "Remote Work Frequency"),
        ("salary", 0.04, "Monthly Salary"),
    ]
    .into_iter()
    .map(|(feature, importance, description)| RankedFeature {
        feature: feature.to_string(),
        importance,
        description: description.to_string(),
    })
    .collect()
}
