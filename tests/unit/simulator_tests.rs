use super::*;
use crate::model::default_agents;

fn reference_simulator() -> Simulator {
    Simulator::new("test-001", reference_phases(), default_agents()).expect("valid simulator")
}

struct FailAt {
    role: PhaseRole,
    calls: Vec<PhaseRole>,
}

impl PhaseWork for FailAt {
    fn complete(&mut self, role: PhaseRole) -> Result<Option<u32>, PhaseFailure> {
        self.calls.push(role);
        if role == self.role {
            return Err(PhaseFailure::new(role, "backend unavailable"));
        }
        FixedCheckpoints.complete(role)
    }
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn overall_progress_matches_four_phase_formula() {
    assert_eq!(overall_progress(0, 4, 0), 0.0);
    assert_eq!(overall_progress(0, 4, 10), 2.5);
    assert_eq!(overall_progress(1, 4, 50), 37.5);
    assert_eq!(overall_progress(3, 4, 100), 100.0);
    assert_eq!(overall_progress(2, 5, 100), 60.0);
    assert_eq!(overall_progress(0, 0, 100), 0.0);
}

#[test]
fn start_marks_first_agent_executing_only() {
    let mut sim = reference_simulator();
    let t0 = Instant::now();
    sim.start(t0, 1_700_000_000).expect("start");

    let execution = sim.execution();
    assert_eq!(execution.status, ExecutionStatus::Running);
    assert_eq!(execution.started_at_epoch_secs, Some(1_700_000_000));
    let planner = execution.agent("planner").expect("planner");
    assert_eq!(planner.status, AgentStatus::Executing);
    assert_eq!(planner.current_task.as_deref(), Some("Analyzing target game..."));
    assert_eq!(execution.active_agent_count(), 1);
    assert_eq!(sim.next_deadline(), Some(t0 + ms(200)));
}

#[test]
fn steps_wait_for_their_delay() {
    let mut sim = reference_simulator();
    let t0 = Instant::now();
    sim.start(t0, 0).expect("start");
    let mut work = FixedCheckpoints;

    sim.poll(t0 + ms(199), &mut work);
    assert_eq!(sim.execution().agent("planner").map(|a| a.progress), Some(0));
    assert!(
        !sim.drain_events()
            .iter()
            .any(|event| matches!(event, SimulationEvent::Step { .. }))
    );

    // progress 0, 10, 20 applied at 200, 400, 600 ms
    sim.poll(t0 + ms(600), &mut work);
    assert_eq!(sim.execution().agent("planner").map(|a| a.progress), Some(20));
    assert_eq!(sim.execution().progress, 5.0);
}

#[test]
fn counters_change_only_at_phase_boundaries() {
    let mut sim = reference_simulator();
    let t0 = Instant::now();
    sim.start(t0, 0).expect("start");
    let mut work = FixedCheckpoints;

    // Planner finishes at 2200 ms; generator steps every 300 ms afterwards.
    sim.poll(t0 + ms(2200), &mut work);
    assert_eq!(sim.execution().test_cases_generated, 0);
    assert_eq!(
        sim.execution().agent("planner").map(|a| a.status),
        Some(AgentStatus::Complete)
    );
    assert_eq!(
        sim.execution().agent("generator").map(|a| a.status),
        Some(AgentStatus::Executing)
    );

    sim.poll(t0 + ms(2200 + 300 * 10), &mut work);
    assert_eq!(sim.execution().agent("generator").map(|a| a.progress), Some(90));
    assert_eq!(sim.execution().test_cases_generated, 0);

    sim.poll(t0 + ms(2200 + 300 * 11), &mut work);
    assert_eq!(sim.execution().test_cases_generated, 25);
    assert_eq!(sim.execution().test_cases_executed, 0);
    assert_eq!(sim.execution().validations_passed, 0);
}

#[test]
fn full_run_reaches_exactly_one_hundred_with_fixed_counters() {
    let mut sim = reference_simulator();
    let t0 = Instant::now();
    sim.start(t0, 0).expect("start");
    let mut work = FixedCheckpoints;

    let mut now = t0;
    while let Some(deadline) = sim.next_deadline() {
        now = deadline;
        sim.poll(now, &mut work);
    }

    let events = sim.drain_events();
    for event in &events {
        if let SimulationEvent::Step { overall, .. } = event {
            assert!((0.0..=100.0).contains(overall));
        }
    }
    let execution = sim.execution();
    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(execution.progress, 100.0);
    assert_eq!(execution.test_cases_generated, 25);
    assert_eq!(execution.test_cases_executed, 10);
    assert_eq!(execution.validations_passed, 8);
    assert!(
        execution
            .agents
            .iter()
            .all(|agent| agent.status == AgentStatus::Complete && agent.progress == 100)
    );
    assert_eq!(now, t0 + ms(2200 + 3300 + 5500 + 2200));
    assert_eq!(execution.duration_ms, Some(13_200));
    assert!(matches!(
        events.last(),
        Some(SimulationEvent::Finished { duration }) if *duration == ms(13_200)
    ));
    assert!(!sim.is_running());
}

#[test]
fn overall_progress_never_decreases_during_run() {
    let mut sim = reference_simulator();
    let t0 = Instant::now();
    sim.start(t0, 0).expect("start");
    sim.poll(t0 + Duration::from_secs(60), &mut FixedCheckpoints);

    let overall: Vec<f64> = sim
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            SimulationEvent::Step { overall, .. } => Some(overall),
            _ => None,
        })
        .collect();
    assert_eq!(overall.len(), 44);
    assert!(overall.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(overall.last().copied(), Some(100.0));
}

#[test]
fn second_start_while_running_is_rejected_without_side_effects() {
    let mut sim = reference_simulator();
    let t0 = Instant::now();
    sim.start(t0, 10).expect("first start");
    sim.poll(t0 + ms(1000), &mut FixedCheckpoints);
    let before = sim.execution().clone();

    let result = sim.start(t0 + ms(1000), 99);

    assert!(matches!(result, Err(RunError::AlreadyRunning)));
    assert_eq!(sim.execution(), &before);
    assert!(sim.is_running());
}

#[test]
fn restart_after_completion_resets_state() {
    let mut sim = reference_simulator();
    let t0 = Instant::now();
    sim.start(t0, 0).expect("start");
    sim.poll(t0 + Duration::from_secs(60), &mut FixedCheckpoints);
    assert_eq!(sim.execution().status, ExecutionStatus::Completed);

    let t1 = t0 + Duration::from_secs(61);
    sim.start(t1, 5).expect("restart");
    let execution = sim.execution();
    assert_eq!(execution.status, ExecutionStatus::Running);
    assert_eq!(execution.progress, 0.0);
    assert_eq!(execution.test_cases_generated, 0);
    assert_eq!(execution.duration_ms, None);
    assert_eq!(execution.active_agent_count(), 1);
}

#[test]
fn phase_failure_halts_later_phases_and_freezes_progress() {
    let mut sim = reference_simulator();
    let t0 = Instant::now();
    sim.start(t0, 0).expect("start");
    let mut work = FailAt {
        role: PhaseRole::Executor,
        calls: Vec::new(),
    };

    sim.poll(t0 + Duration::from_secs(60), &mut work);

    let execution = sim.execution();
    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert_eq!(execution.progress, 75.0);
    assert_eq!(execution.test_cases_generated, 25);
    assert_eq!(execution.test_cases_executed, 0);
    assert_eq!(
        execution.agent("executor").map(|a| a.status),
        Some(AgentStatus::Error)
    );
    assert_eq!(
        execution.agent("validator").map(|a| a.status),
        Some(AgentStatus::Idle)
    );
    assert_eq!(
        work.calls,
        vec![PhaseRole::Planner, PhaseRole::Generator, PhaseRole::Executor]
    );
    assert!(!sim.is_running());
    assert!(sim.drain_events().iter().any(|event| matches!(
        event,
        SimulationEvent::PhaseFailed { index: 2, failure } if failure.role == PhaseRole::Executor
    )));
}

#[test]
fn cancel_keeps_last_applied_step() {
    let mut sim = reference_simulator();
    let t0 = Instant::now();
    sim.start(t0, 0).expect("start");
    sim.poll(t0 + ms(2200 + 450), &mut FixedCheckpoints);
    let progress_before = sim.execution().progress;

    assert!(sim.cancel(t0 + ms(2700)));
    sim.poll(t0 + Duration::from_secs(60), &mut FixedCheckpoints);

    let execution = sim.execution();
    assert_eq!(execution.progress, progress_before);
    assert_eq!(execution.progress, 25.0);
    assert_eq!(execution.agent("generator").map(|a| a.progress), Some(0));
    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert_eq!(execution.duration_ms, Some(2700));
    let generator = execution.agent("generator").expect("generator agent");
    assert_eq!(generator.status, AgentStatus::Idle);
    assert_eq!(generator.current_task, None);
    assert_eq!(execution.active_agent_count(), 0);
    assert!(sim.was_cancelled());
    assert!(!sim.cancel(t0 + ms(2800)));
}

#[test]
fn duration_is_never_negative_for_stale_clock() {
    let mut sim = reference_simulator();
    let t0 = Instant::now() + Duration::from_secs(5);
    sim.start(t0, 0).expect("start");
    assert!(sim.cancel(t0 - Duration::from_secs(1)));
    assert_eq!(sim.execution().duration_ms, Some(0));
}

#[test]
fn rejects_invalid_phase_plans() {
    assert!(matches!(
        Simulator::new("x", Vec::new(), default_agents()),
        Err(ConfigError::NoPhases)
    ));
    assert!(matches!(
        Simulator::new(
            "x",
            vec![Phase::new("planner", PhaseRole::Planner, "t", Duration::ZERO)],
            default_agents()
        ),
        Err(ConfigError::ZeroPhaseDuration(_))
    ));
    assert!(matches!(
        Simulator::new(
            "x",
            vec![Phase::new("ghost", PhaseRole::Planner, "t", ms(10))],
            default_agents()
        ),
        Err(ConfigError::UnknownPhaseAgent(id)) if id == "ghost"
    ));
}

#[test]
fn two_phase_plan_uses_generalized_progress() {
    let phases = vec![
        Phase::new("planner", PhaseRole::Planner, "plan", ms(100)),
        Phase::new("validator", PhaseRole::Validator, "check", ms(100)),
    ];
    let mut sim = Simulator::new("x", phases, default_agents()).expect("valid");
    let t0 = Instant::now();
    sim.start(t0, 0).expect("start");

    sim.poll(t0 + ms(110 + 60), &mut FixedCheckpoints);
    assert_eq!(sim.execution().progress, 75.0);

    sim.poll(t0 + ms(220), &mut FixedCheckpoints);
    assert_eq!(sim.execution().progress, 100.0);
    assert_eq!(sim.execution().validations_passed, 8);
    assert_eq!(sim.execution().test_cases_generated, 0);
}
