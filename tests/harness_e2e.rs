use facloc::{
    run_trials, total_cost, Area, Experiment, ExperimentConfig, ExperimentReport, GeneratorKind, OpeningCost,
    Strategy, StrategyName,
};

fn compare_config(seed: u64) -> ExperimentConfig {
    ExperimentConfig::builder()
        .iterations(6)
        .area(Area::new(40.0, 40.0).unwrap())
        .opening_cost(15.0)
        .strategy(Strategy::CompareAll {
            q: 0.4,
            max_iterations: 30,
        })
        .seed(seed)
        .demand_fraction(0.02, 0.08)
        .build()
        .unwrap()
}

#[test]
fn compare_all_report_has_every_strategy() {
    let report = run_trials(compare_config(7)).unwrap();
    assert_eq!(report.seed, 7);
    assert_eq!(report.trials.len(), 6);

    let opening = OpeningCost::new(15.0).unwrap();
    for (i, trial) in report.trials.iter().enumerate() {
        assert_eq!(trial.index, i);
        assert!(trial.demand_count >= 2);
        let names: Vec<StrategyName> = trial.outcomes.iter().map(|o| o.strategy).collect();
        assert_eq!(
            names,
            vec![StrategyName::Meyerson, StrategyName::QMeyerson, StrategyName::Lloyd]
        );
        for o in &trial.outcomes {
            assert_eq!(o.solution.demand_count(), trial.demand_count);
            assert_eq!(o.total_cost, total_cost(&o.solution, opening));
        }

        let lloyd = trial.outcome(StrategyName::Lloyd).unwrap();
        assert!(lloyd.facility_count() <= facloc::initial_center_count(trial.demand_count));

        for name in [StrategyName::Meyerson, StrategyName::QMeyerson] {
            let rel = trial.comparison(name).unwrap();
            let cost = trial.outcome(name).unwrap().total_cost.as_f64();
            let expected = cost / lloyd.total_cost.as_f64() - 1.0;
            assert!((rel.ratio - expected).abs() < 1e-12);
            assert!(rel.to_string().ends_with('%'));
        }
    }

    assert_eq!(report.summaries.len(), 3);
    assert_eq!(report.summary(StrategyName::Lloyd).unwrap().trials, 6);
    assert!(report.summary(StrategyName::Meyerson).unwrap().mean_relative.is_some());
}

#[test]
fn same_seed_same_report() {
    let a = run_trials(compare_config(11)).unwrap();
    let b = run_trials(compare_config(11)).unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(a.trials, b.trials);
    assert_eq!(a.summaries, b.summaries);

    let c = run_trials(compare_config(12)).unwrap();
    assert_ne!(a.id, c.id);
}

#[test]
fn parallel_workers_do_not_change_results() {
    let sequential = run_trials(compare_config(3)).unwrap();

    let mut config = compare_config(3);
    config.workers = 4;
    let parallel = run_trials(config).unwrap();

    assert_eq!(sequential.trials, parallel.trials);
}

#[test]
fn single_strategies_run_alone() {
    let mut config = compare_config(5);
    config.strategy = Strategy::Clustering { max_iterations: 20 };
    let report = run_trials(config).unwrap();
    for trial in &report.trials {
        assert_eq!(trial.outcomes.len(), 1);
        assert!(trial.outcomes[0].rounds.unwrap() <= 20);
        assert!(trial.comparisons.is_empty());
    }
    assert!(report.summary(StrategyName::Meyerson).is_none());
}

#[test]
fn strategy_selected_by_tag() {
    let mut config = compare_config(5);
    config.strategy = "q-online".parse().unwrap();
    let report = run_trials(config).unwrap();
    assert!(report
        .trials
        .iter()
        .all(|t| t.outcomes.len() == 1 && t.outcomes[0].strategy == StrategyName::QMeyerson));

    assert!("nearest-neighbour".parse::<Strategy>().is_err());
}

#[test]
fn center_biased_generator_stays_near_center() {
    let mut config = compare_config(9);
    config.generator = GeneratorKind::CenterBiased { bias: 0.5 };
    config.strategy = Strategy::Online;
    let experiment = Experiment::new(config).unwrap();
    for i in 0..4 {
        for p in experiment.demands(i) {
            assert!((10.0..=30.0).contains(&p.x), "{p}");
            assert!((10.0..=30.0).contains(&p.y), "{p}");
        }
    }
}

#[test]
fn invalid_configuration_aborts_the_run() {
    let mut config = compare_config(1);
    config.iterations = 0;
    assert!(run_trials(config).unwrap_err().is_invalid_configuration());

    let mut config = compare_config(1);
    config.opening_cost = 0.0;
    assert!(run_trials(config).unwrap_err().is_invalid_configuration());

    let mut config = compare_config(1);
    config.strategy = Strategy::QOnline { q: 0.0 };
    assert!(run_trials(config).unwrap_err().is_invalid_configuration());

    let mut config = compare_config(1);
    config.area = Area::new(1e6, 1e6).unwrap();
    assert!(run_trials(config).unwrap_err().is_invalid_configuration());
}

#[test]
fn unseeded_run_records_its_seed() {
    let mut config = compare_config(0);
    config.seed = None;
    config.iterations = 2;
    let report = run_trials(config.clone()).unwrap();

    config.seed = Some(report.seed);
    let replay = run_trials(config).unwrap();
    assert_eq!(report.trials, replay.trials);
}

#[test]
fn timings_are_observational() {
    let plain = run_trials(compare_config(4)).unwrap();

    let mut config = compare_config(4);
    config.record_timings = true;
    let timed = run_trials(config).unwrap();

    for (a, b) in plain.trials.iter().zip(&timed.trials) {
        assert!(a.timings.is_none());
        let timings = b.timings.as_ref().unwrap();
        assert_eq!(timings.strategy_micros.len(), 3);
        assert_eq!(a.outcomes, b.outcomes);
    }
}

#[test]
fn report_survives_json() {
    for (seed, opening_cost) in [(21, 15.0), (5, 13.3)] {
        let mut config = compare_config(seed);
        config.opening_cost = opening_cost;
        config.record_timings = true;
        let report = run_trials(config).unwrap();

        let json = report.to_json().unwrap();
        let decoded = ExperimentReport::from_json(&json).unwrap();
        // Centroids and ratios carry full f64 precision and must come back bit for bit.
        assert_eq!(decoded, report);
    }

    assert!(ExperimentReport::from_json("[]").unwrap_err().is_report());
}

#[test]
fn config_from_json_runs() {
    let config = ExperimentConfig::from_json(
        r#"{
            "iterations": 2,
            "area": {"width": 20.0, "height": 20.0},
            "opening_cost": 5.0,
            "strategy": {"kind": "compare-all", "q": 0.5, "max_iterations": 10},
            "seed": 77,
            "generator": {"kind": "center-biased", "bias": 0.2}
        }"#,
    )
    .unwrap();
    let report = run_trials(config).unwrap();
    assert_eq!(report.seed, 77);
    assert_eq!(report.trials.len(), 2);
}
