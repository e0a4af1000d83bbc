use super::*;

fn generated(id: &str, priority: Priority, category: Category, duration: u32) -> TestCase {
    let mut case = TestCase::new(id, id, priority, category, duration);
    case.generated = true;
    case
}

#[test]
fn high_gameplay_hundred_seconds_scores_seventy_five() {
    let case = generated("a", Priority::High, Category::Gameplay, 100);
    assert_eq!(score(&case), 75.0);
}

#[test]
fn low_performance_at_ceiling_scores_twenty() {
    let case = generated("a", Priority::Low, Category::Performance, 300);
    assert_eq!(score(&case), 20.0);
}

#[test]
fn duration_bonus_is_continuous_and_floors_at_zero() {
    assert_eq!(duration_bonus(0), 30.0);
    assert_eq!(duration_bonus(295), 0.5);
    assert_eq!(duration_bonus(300), 0.0);
    assert_eq!(duration_bonus(301), 0.0);
    assert_eq!(duration_bonus(u32::MAX), 0.0);
}

#[test]
fn score_never_increases_with_duration() {
    for priority in [Priority::High, Priority::Medium, Priority::Low] {
        for category in [
            Category::Gameplay,
            Category::Ui,
            Category::EdgeCase,
            Category::Performance,
        ] {
            let mut previous = f64::INFINITY;
            for duration in (0..=400).step_by(7) {
                let current = score(&generated("x", priority, category, duration));
                assert!(
                    current <= previous,
                    "{priority:?}/{category:?} rose at {duration}s"
                );
                previous = current;
            }
        }
    }
}

#[test]
fn select_top_marks_best_cases_in_rank_order() {
    let mut cases = vec![
        generated("slow-ui", Priority::Medium, Category::Ui, 150),
        generated("fast-gameplay", Priority::High, Category::Gameplay, 120),
        generated("perf", Priority::Low, Category::Performance, 290),
        generated("edge", Priority::High, Category::EdgeCase, 200),
    ];

    let selected = select_top(&mut cases, 2);

    assert_eq!(selected, vec!["fast-gameplay", "edge"]);
    let flags: Vec<bool> = cases.iter().map(|case| case.selected).collect();
    assert_eq!(flags, vec![false, true, false, true]);
}

#[test]
fn ties_keep_insertion_order() {
    let mut cases = vec![
        generated("first", Priority::Medium, Category::Ui, 100),
        generated("second", Priority::Medium, Category::Ui, 100),
        generated("third", Priority::Medium, Category::Ui, 100),
    ];
    assert_eq!(select_top(&mut cases, 2), vec!["first", "second"]);
}

#[test]
fn select_top_is_idempotent() {
    let mut cases: Vec<TestCase> = (0..15)
        .map(|idx| {
            let priority = [Priority::High, Priority::Medium, Priority::Low][idx % 3];
            let category = [Category::Gameplay, Category::Ui, Category::EdgeCase][idx % 3];
            generated(&format!("tc-{idx}"), priority, category, 60 + (idx as u32 * 17) % 250)
        })
        .collect();

    let first = select_top(&mut cases, DEFAULT_TOP_K);
    let snapshot = cases.clone();
    let second = select_top(&mut cases, DEFAULT_TOP_K);

    assert_eq!(first, second);
    assert_eq!(cases, snapshot);
    assert_eq!(first.len(), DEFAULT_TOP_K);
}

#[test]
fn fewer_cases_than_k_selects_all() {
    let mut cases = vec![
        generated("a", Priority::Low, Category::Ui, 10),
        generated("b", Priority::High, Category::Ui, 10),
    ];
    let selected = select_top(&mut cases, 10);
    assert_eq!(selected, vec!["b", "a"]);
    assert!(cases.iter().all(|case| case.selected));
}

#[test]
fn empty_input_selects_nothing() {
    let mut cases: Vec<TestCase> = Vec::new();
    assert!(select_top(&mut cases, 10).is_empty());
}

#[test]
fn ungenerated_cases_are_never_selected() {
    let mut pending = TestCase::new("pending", "p", Priority::High, Category::Gameplay, 1);
    pending.selected = true;
    let mut cases = vec![pending, generated("ready", Priority::Low, Category::Ui, 250)];

    let selected = select_top(&mut cases, 10);

    assert_eq!(selected, vec!["ready"]);
    assert!(!cases[0].selected);
}

#[test]
fn reselecting_with_smaller_k_clears_previous_marks() {
    let mut cases = vec![
        generated("a", Priority::High, Category::Gameplay, 10),
        generated("b", Priority::Medium, Category::Gameplay, 10),
        generated("c", Priority::Low, Category::Gameplay, 10),
    ];
    select_top(&mut cases, 3);
    let selected = select_top(&mut cases, 1);
    assert_eq!(selected, vec!["a"]);
    assert_eq!(cases.iter().filter(|case| case.selected).count(), 1);
}
