use crate::model::{Category, Priority, TestCase};

pub const DEFAULT_TOP_K: usize = 10;
const DURATION_BONUS_CEILING_SECS: u32 = 300;

pub fn priority_weight(priority: Priority) -> f64 {
    match priority {
        Priority::High => 30.0,
        Priority::Medium => 20.0,
        Priority::Low => 10.0,
    }
}

pub fn category_weight(category: Category) -> f64 {
    match category {
        Category::Gameplay => 25.0,
        Category::EdgeCase => 20.0,
        Category::Ui => 15.0,
        Category::Performance => 10.0,
    }
}

/// Shorter tests score higher; zero once the estimate reaches 300 seconds.
pub fn duration_bonus(estimated_duration: u32) -> f64 {
    f64::from(DURATION_BONUS_CEILING_SECS.saturating_sub(estimated_duration)) / 10.0
}

pub fn score(test_case: &TestCase) -> f64 {
    priority_weight(test_case.priority)
        + category_weight(test_case.category)
        + duration_bonus(test_case.estimated_duration)
}

/// Indices of generated cases ordered by score, highest first. Equal scores keep
/// insertion order.
pub fn rank(cases: &[TestCase]) -> Vec<usize> {
    let mut ranked: Vec<(usize, f64)> = cases
        .iter()
        .enumerate()
        .filter(|(_, case)| case.generated)
        .map(|(idx, case)| (idx, score(case)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().map(|(idx, _)| idx).collect()
}

/// Marks the `k` best generated cases as selected and every other case as not
/// selected. Returns the selected ids in rank order.
pub fn select_top(cases: &mut [TestCase], k: usize) -> Vec<String> {
    let chosen: Vec<usize> = rank(cases).into_iter().take(k).collect();
    for case in cases.iter_mut() {
        case.selected = false;
    }
    chosen
        .into_iter()
        .map(|idx| {
            cases[idx].selected = true;
            cases[idx].id.clone()
        })
        .collect()
}

#[cfg(test)]
#[path = "../tests/unit/scoring_tests.rs"]
mod tests;
