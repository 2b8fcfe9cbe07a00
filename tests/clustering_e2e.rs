use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use facloc::{
    cluster, cluster_from_centers, initial_center_count, total_cost, Area, CenterBiasedGenerator, Cost,
    DemandGenerator, LloydConfig, OpeningCost, Point,
};

fn corners() -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(0.0, 1.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
    ]
}

#[test]
fn unit_square_splits_into_two_pairs() {
    let config = LloydConfig { max_iterations: 10 };
    let centers = vec![Point::new(0.3, 0.4), Point::new(0.9, 0.6)];
    let out = cluster_from_centers(&corners(), centers, &config).unwrap();

    assert_eq!(out.solution.facility_count(), 2);
    for f in out.solution.facilities() {
        assert_eq!(f.service_len(), 2);
    }

    let opening = OpeningCost::new(3.0).unwrap();
    let expected = Cost::from_f64(2.0 * 3.0 + 2.0).unwrap();
    assert_eq!(total_cost(&out.solution, opening), expected);
}

#[test]
fn unit_square_from_random_centers_keeps_invariants() {
    let area = Area::new(1.0, 1.0).unwrap();
    let config = LloydConfig { max_iterations: 10 };
    for seed in 0..50 {
        let out = cluster(&area, &corners(), &config, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
        let count = out.solution.facility_count();
        assert!((1..=2).contains(&count), "seed {seed}: {count}");
        assert!(out.solution.is_consistent());
        assert!(out.solution.facilities().iter().all(|f| f.service_len() > 0));
        assert_eq!(
            out.solution.facilities().iter().map(|f| f.service_len()).sum::<usize>(),
            4
        );
    }
}

#[test]
fn center_count_never_grows() {
    let area = Area::new(60.0, 40.0).unwrap();
    let generator = CenterBiasedGenerator::new(0.5).unwrap();
    let config = LloydConfig::default();

    for seed in 0..10 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let demands = generator.generate(180, &area, &mut rng);
        let out = cluster(&area, &demands, &config, &mut rng).unwrap();

        let k = initial_center_count(demands.len());
        assert_eq!(k, 13);
        assert!(out.solution.facility_count() <= k);
        assert!(out.center_counts.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(out.center_counts.last().copied(), Some(out.solution.facility_count()));
        assert!(out.rounds <= config.max_iterations);
        assert!(out.solution.demands().iter().all(|d| d.facility.is_some()));
    }
}

#[test]
fn facilities_sit_at_member_centroids() {
    let area = Area::new(50.0, 50.0).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let demands: Vec<Point> = (0..64u32)
        .map(|i| Point::new(f64::from(i % 8) * 6.0, f64::from(i / 8) * 6.0))
        .collect();
    let config = LloydConfig { max_iterations: 100 };
    let out = cluster(&area, &demands, &config, &mut rng).unwrap();

    for f in out.solution.facilities() {
        let members: Vec<Point> = out.solution.served_positions(f).collect();
        let mean = Point::centroid(members.iter()).unwrap();
        assert!((mean.x - f.position.x).abs() < 1e-9);
        assert!((mean.y - f.position.y).abs() < 1e-9);
    }
}

#[test]
fn empty_demand_set_yields_no_facilities() {
    let area = Area::default();
    let out = cluster(&area, &[], &LloydConfig::default(), &mut ChaCha8Rng::seed_from_u64(0)).unwrap();
    assert_eq!(out.solution.facility_count(), 0);
    assert_eq!(out.rounds, 0);
    assert_eq!(total_cost(&out.solution, OpeningCost::new(10.0).unwrap()), Cost::ZERO);
}

#[test]
fn zero_iterations_is_rejected() {
    let area = Area::default();
    let err = cluster(
        &area,
        &corners(),
        &LloydConfig { max_iterations: 0 },
        &mut ChaCha8Rng::seed_from_u64(0),
    )
    .unwrap_err();
    assert!(matches!(err, facloc::ValidationError::NonPositiveIterations { .. }));
}

#[test]
fn clustering_is_reproducible_for_a_seed() {
    let area = Area::new(80.0, 80.0).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let demands = facloc::UniformGenerator.generate(150, &area, &mut rng);
    let config = LloydConfig::default();

    let a = cluster(&area, &demands, &config, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
    let b = cluster(&area, &demands, &config, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
    assert_eq!(a, b);
}
