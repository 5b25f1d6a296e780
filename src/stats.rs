use std::collections::HashSet;

use serde::Serialize;

use crate::roster::RosterTable;

/// Headline metrics shown above the dashboard table. Means skip blank or
/// unparseable cells, so a table of imported rows with holes still reports
/// something useful.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub student_count: usize,
    pub unique_specialties: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_age: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpecialtyStat {
    pub specialty: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_grade: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistogramBucket {
    pub label: String,
    pub from: i64,
    pub to: i64,
    pub count: usize,
}

/// Five-number summary backing the grade distribution box plot.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GradeSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// One point of the age-vs-grade scatter, with the hover fields the
/// dashboard shows.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPoint {
    pub age: i64,
    pub grade: f64,
    pub specialty: String,
    pub last_name: String,
    pub first_name: String,
}

fn column_values(table: &RosterTable, name: &str) -> Vec<String> {
    match table.col(name) {
        Some(c) => table
            .rows
            .iter()
            .map(|r| r.get(c).cloned().unwrap_or_default())
            .collect(),
        None => vec![String::new(); table.rows.len()],
    }
}

fn numeric_values(table: &RosterTable, name: &str) -> Vec<f64> {
    column_values(table, name)
        .iter()
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn summary(table: &RosterTable) -> Summary {
    let specialties: HashSet<String> = column_values(table, "specialite")
        .into_iter()
        .filter_map(|v| {
            let t = v.trim().to_string();
            if t.is_empty() {
                None
            } else {
                Some(t)
            }
        })
        .collect();
    Summary {
        student_count: table.rows.len(),
        unique_specialties: specialties.len(),
        avg_grade: mean(&numeric_values(table, "moyenne_generale")),
        avg_age: mean(&numeric_values(table, "age")),
    }
}

/// Per-specialty counts and grade means, ordered by descending count then
/// name, the order the distribution pie is drawn in.
pub fn by_specialty(table: &RosterTable) -> Vec<SpecialtyStat> {
    let specs = column_values(table, "specialite");
    let grades = column_values(table, "moyenne_generale");

    let mut names: Vec<String> = Vec::new();
    for s in &specs {
        let t = s.trim();
        if !t.is_empty() && !names.iter().any(|n| n == t) {
            names.push(t.to_string());
        }
    }

    let mut out: Vec<SpecialtyStat> = names
        .into_iter()
        .map(|name| {
            let mut count = 0usize;
            let mut spec_grades = Vec::new();
            for (s, g) in specs.iter().zip(grades.iter()) {
                if s.trim() == name {
                    count += 1;
                    if let Ok(v) = g.trim().parse::<f64>() {
                        spec_grades.push(v);
                    }
                }
            }
            SpecialtyStat {
                specialty: name,
                count,
                avg_grade: mean(&spec_grades),
            }
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then(a.specialty.cmp(&b.specialty)));
    out
}

/// Fixed-width age buckets covering the observed range.
pub fn age_histogram(table: &RosterTable, bucket_width: i64) -> Vec<HistogramBucket> {
    let ages: Vec<i64> = column_values(table, "age")
        .iter()
        .filter_map(|v| v.trim().parse::<i64>().ok())
        .collect();
    let (Some(&min), Some(&max)) = (ages.iter().min(), ages.iter().max()) else {
        return Vec::new();
    };
    let width = bucket_width.max(1);
    let first = (min / width) * width;

    let mut buckets = Vec::new();
    let mut from = first;
    while from <= max {
        let to = from + width - 1;
        let count = ages.iter().filter(|&&a| a >= from && a <= to).count();
        buckets.push(HistogramBucket {
            label: format!("{}-{}", from, to),
            from,
            to,
            count,
        });
        from += width;
    }
    buckets
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    // Linear interpolation between closest ranks, the convention the
    // dashboard's plotting library uses.
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

pub fn grade_summary(table: &RosterTable) -> Option<GradeSummary> {
    let mut grades = numeric_values(table, "moyenne_generale");
    if grades.is_empty() {
        return None;
    }
    grades.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(GradeSummary {
        min: grades[0],
        q1: quantile(&grades, 0.25),
        median: quantile(&grades, 0.5),
        q3: quantile(&grades, 0.75),
        max: grades[grades.len() - 1],
    })
}

/// Rows with both a parseable age and grade, in table order.
pub fn scatter_points(table: &RosterTable) -> Vec<ScatterPoint> {
    let ages = column_values(table, "age");
    let grades = column_values(table, "moyenne_generale");
    let specs = column_values(table, "specialite");
    let last_names = column_values(table, "nom");
    let first_names = column_values(table, "prenom");

    (0..table.rows.len())
        .filter_map(|i| {
            let age = ages[i].trim().parse::<i64>().ok()?;
            let grade = grades[i].trim().parse::<f64>().ok()?;
            Some(ScatterPoint {
                age,
                grade,
                specialty: specs[i].trim().to_string(),
                last_name: last_names[i].trim().to_string(),
                first_name: first_names[i].trim().to_string(),
            })
        })
        .collect()
}
