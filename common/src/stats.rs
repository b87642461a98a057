//! Análisis de patrones sobre el historial de jobs.
//!
//! Cada analizador es una función pura `(historial, tasa_global) -> JobPattern`.
//! El conjunto es cerrado y se evalúa siempre en el mismo orden.

use serde::{Deserialize, Serialize};

use crate::job::{JobRecord, JobStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPattern {
    pub pattern: String,
    pub match_count: usize,
    pub success_rate: f64,
    pub difference_from_average: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub total_jobs: usize,
    pub overall_success_rate: f64,
    pub patterns: Vec<JobPattern>,
}

pub type PatternAnalyzer = fn(&[JobRecord], f64) -> JobPattern;

/// Orden fijo de los reportes.
pub const PATTERN_ANALYZERS: [PatternAnalyzer; 4] = [
    analyze_name_length,
    analyze_name_digits,
    analyze_argument_count,
    analyze_name_prefix,
];

/// Estadísticas completas sobre el historial.
///
/// La diferencia de cada patrón se calcula contra la tasa global sin
/// redondear; sólo `overall_success_rate` se reporta con 2 decimales.
pub fn compute_stats(history: &[JobRecord]) -> JobStats {
    let total_jobs = history.len();

    if total_jobs == 0 {
        return JobStats {
            total_jobs: 0,
            overall_success_rate: 0.0,
            patterns: Vec::new(),
        };
    }

    let overall = success_rate(history.iter());

    JobStats {
        total_jobs,
        overall_success_rate: round2(overall),
        patterns: analyze_patterns(history, overall),
    }
}

/// Ejecuta todos los analizadores y descarta los patrones sin coincidencias.
pub fn analyze_patterns(jobs: &[JobRecord], overall_rate: f64) -> Vec<JobPattern> {
    PATTERN_ANALYZERS
        .iter()
        .map(|analyzer| analyzer(jobs, overall_rate))
        .filter(|pattern| pattern.match_count > 0)
        .collect()
}

pub fn analyze_name_length(jobs: &[JobRecord], overall_rate: f64) -> JobPattern {
    analyze("Job name length > 10", jobs, overall_rate, |job| {
        job.name.chars().count() > 10
    })
}

pub fn analyze_name_digits(jobs: &[JobRecord], overall_rate: f64) -> JobPattern {
    analyze("Job name contains digits", jobs, overall_rate, |job| {
        job.name.chars().any(|c| c.is_ascii_digit())
    })
}

pub fn analyze_argument_count(jobs: &[JobRecord], overall_rate: f64) -> JobPattern {
    analyze("Jobs with 3+ arguments", jobs, overall_rate, |job| {
        job.arguments.len() >= 3
    })
}

pub fn analyze_name_prefix(jobs: &[JobRecord], overall_rate: f64) -> JobPattern {
    analyze("Job name starts with 'test'", jobs, overall_rate, |job| {
        job.name.to_lowercase().starts_with("test")
    })
}

fn analyze<P>(label: &str, jobs: &[JobRecord], overall_rate: f64, predicate: P) -> JobPattern
where
    P: Fn(&JobRecord) -> bool,
{
    let matching: Vec<&JobRecord> = jobs.iter().filter(|job| predicate(*job)).collect();
    let rate = success_rate(matching.iter().copied());

    JobPattern {
        pattern: label.to_string(),
        match_count: matching.len(),
        success_rate: round2(rate),
        difference_from_average: format_difference(rate - overall_rate),
    }
}

/// Fracción de registros `completed`; 0 si no hay registros.
fn success_rate<'a>(jobs: impl Iterator<Item = &'a JobRecord>) -> f64 {
    let (total, completed) = jobs.fold((0usize, 0usize), |(total, completed), job| {
        let ok = usize::from(job.status == JobStatus::Completed);
        (total + 1, completed + ok)
    });

    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `diff` es una fracción; se reporta en puntos porcentuales enteros con signo.
/// El signo sale del valor ya redondeado: nunca se produce "-0%".
pub fn format_difference(diff: f64) -> String {
    let points = (diff * 100.0).round() as i64;
    if points >= 0 {
        format!("+{}%", points)
    } else {
        format!("{}%", points)
    }
}
