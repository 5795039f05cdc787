use std::collections::HashSet;
use std::sync::Arc;

use super::*;
use crate::cookers::{
    DataCookerDependencyType, DataCookerDescriptor, DataCookerSpec, DataProductionStrategy,
};

fn path(id: &str) -> DataCookerPath {
    DataCookerPath::for_source("S", id)
}

fn cooker(id: &str) -> DataCookerSpec {
    DataCookerSpec::source("S", id)
}

fn as_required(id: &str) -> DataCookerSpec {
    cooker(id).with_strategy(DataProductionStrategy::AsRequired)
}

fn schedule(specs: Vec<DataCookerSpec>) -> Result<SourceDataCookerScheduler, TracecookError> {
    crate::test_utils::init_test_logging(None);
    let mut scheduler = SourceDataCookerScheduler::new("S");
    scheduler.schedule_data_cookers(
        specs.into_iter().map(|spec| Arc::new(spec) as Arc<dyn SourceDataCookerDescriptor>),
    )?;
    Ok(scheduler)
}

fn ids(scheduler: &SourceDataCookerScheduler) -> Vec<Vec<String>> {
    scheduler
        .data_cookers_by_source_pass()
        .iter()
        .map(|pass| pass.iter().map(|c| c.path().data_cooker_id().to_string()).collect())
        .collect()
}

fn placement(scheduler: &SourceDataCookerScheduler, id: &str) -> Placement {
    let placements = scheduler.placements(&path(id));
    assert_eq!(placements.len(), 1, "{id} should have exactly one placement");
    placements[0]
}

#[test]
fn test_independent_cookers_then_dependent_pass() {
    let scheduler = schedule(vec![
        cooker("C1"),
        cooker("C2"),
        cooker("C3").requires(path("C1")).requires(path("C2")),
    ])
    .unwrap();

    assert_eq!(ids(&scheduler), vec![vec!["C1", "C2"], vec!["C3"]]);
    assert_eq!(placement(&scheduler, "C3"), Placement::new(1, 0));
    assert!(scheduler.is_scheduled());
    assert_eq!(scheduler.cooker_count(), 3);
}

#[test]
fn test_cooker_without_requirements_at_origin() {
    let scheduler = schedule(vec![cooker("Lonely")]).unwrap();
    assert_eq!(placement(&scheduler, "Lonely"), Placement::ORIGIN);
    assert_eq!(scheduler.pass_count(), 1);
}

#[test]
fn test_empty_input_yields_single_empty_pass() {
    let scheduler = schedule(Vec::new()).unwrap();
    assert_eq!(scheduler.pass_count(), 1);
    assert_eq!(scheduler.cooker_count(), 0);
}

#[test]
fn test_dependencies_visited_in_declaration_order() {
    // C3 is handed over first, so C1 and C2 enter pass 0 through its traversal
    let scheduler = schedule(vec![
        cooker("C3").requires(path("C2")).requires(path("C1")),
        cooker("C1"),
        cooker("C2"),
    ])
    .unwrap();

    assert_eq!(ids(&scheduler), vec![vec!["C2", "C1"], vec!["C3"]]);
}

#[test]
fn test_post_source_parsing_chain_uses_one_pass_per_link() {
    let scheduler = schedule(vec![
        cooker("A"),
        cooker("B").requires(path("A")),
        cooker("C").requires(path("B")),
    ])
    .unwrap();

    assert_eq!(ids(&scheduler), vec![vec!["A"], vec!["B"], vec!["C"]]);
}

#[test]
fn test_as_consumed_dependency_shares_pass_in_later_block() {
    let scheduler =
        schedule(vec![cooker("A"), cooker("B").requires_as_consumed(path("A"))]).unwrap();

    assert_eq!(placement(&scheduler, "A"), Placement::new(0, 0));
    assert_eq!(placement(&scheduler, "B"), Placement::new(0, 1));
    assert_eq!(ids(&scheduler), vec![vec!["A", "B"]]);
}

#[test]
fn test_aligned_dependency_on_as_consumed_producer_shares_pass() {
    let scheduler = schedule(vec![
        cooker("Producer").with_strategy(DataProductionStrategy::AsConsumed),
        cooker("Consumer").requires(path("Producer")),
    ])
    .unwrap();

    assert_eq!(placement(&scheduler, "Consumer"), Placement::new(0, 1));
}

#[test]
fn test_as_consumed_follows_producer_into_later_pass() {
    let scheduler = schedule(vec![
        cooker("X"),
        cooker("Y").requires(path("X")),
        cooker("C").requires(path("X")).requires_as_consumed(path("Y")),
    ])
    .unwrap();

    assert_eq!(placement(&scheduler, "Y"), Placement::new(1, 0));
    assert_eq!(placement(&scheduler, "C"), Placement::new(1, 1));
}

#[test]
fn test_block_already_after_producer_is_kept() {
    let scheduler = schedule(vec![
        cooker("A"),
        cooker("B").requires_as_consumed(path("A")),
        cooker("C").requires_as_consumed(path("B")).requires_as_consumed(path("A")),
    ])
    .unwrap();

    assert_eq!(placement(&scheduler, "B"), Placement::new(0, 1));
    assert_eq!(placement(&scheduler, "C"), Placement::new(0, 2));
}

#[test]
fn test_pass_change_resets_block() {
    let scheduler = schedule(vec![
        cooker("A"),
        cooker("B").requires_as_consumed(path("A")),
        cooker("D").requires(path("A")),
        cooker("C").requires_as_consumed(path("B")).requires(path("D")),
    ])
    .unwrap();

    assert_eq!(placement(&scheduler, "B"), Placement::new(0, 1));
    assert_eq!(placement(&scheduler, "D"), Placement::new(1, 0));
    assert_eq!(placement(&scheduler, "C"), Placement::new(2, 0));
}

#[test]
fn test_as_required_cooker_runs_in_every_consuming_pass() {
    let scheduler = schedule(vec![
        as_required("C4"),
        cooker("C5").requires(path("C4")),
        cooker("P"),
        cooker("C6").requires(path("P")).requires(path("C4")),
    ])
    .unwrap();

    assert_eq!(ids(&scheduler), vec![vec!["C4", "P", "C5"], vec!["C4", "C6"]]);

    let c4 = scheduler.placements(&path("C4"));
    assert_eq!(c4, &[Placement::new(0, 0), Placement::new(1, 0)]);

    let c5 = placement(&scheduler, "C5");
    let c6 = placement(&scheduler, "C6");
    assert_eq!(c5, Placement::new(c4[0].pass, c4[0].block + 1));
    assert_eq!(c6, Placement::new(c4[1].pass, c4[1].block + 1));
}

#[test]
fn test_as_required_cooker_served_once_per_pass() {
    let scheduler = schedule(vec![
        as_required("R"),
        cooker("A").requires(path("R")),
        cooker("B").requires(path("R")),
    ])
    .unwrap();

    assert_eq!(scheduler.placements(&path("R")), &[Placement::new(0, 0)]);
    assert_eq!(ids(&scheduler), vec![vec!["R", "A", "B"]]);
}

#[test]
fn test_unconsumed_as_required_cooker_is_not_scheduled() {
    let scheduler = schedule(vec![as_required("R"), cooker("A")]).unwrap();

    assert!(scheduler.placements(&path("R")).is_empty());
    assert_eq!(ids(&scheduler), vec![vec!["A"]]);
}

#[test]
fn test_as_required_dependency_must_be_aligned() {
    let result = schedule(vec![as_required("R"), cooker("A").requires_as_consumed(path("R"))]);

    match result {
        Err(TracecookError::InvalidDependencyType {
            cooker,
            dependency,
            ..
        }) => {
            assert_eq!(cooker, "S/A");
            assert_eq!(dependency, "S/R");
        }
        other => panic!("expected invalid dependency type, got {other:?}"),
    }
}

#[test]
fn test_as_required_cooker_cannot_require_normal_cooker() {
    let result = schedule(vec![cooker("A"), as_required("R").requires(path("A"))]);
    assert!(matches!(result, Err(TracecookError::AsRequiredNormalDependency { .. })));
}

#[test]
fn test_cycle_is_fatal() {
    let mut scheduler = SourceDataCookerScheduler::new("S");
    let result = scheduler.schedule_data_cookers(vec![
        Arc::new(cooker("A").requires(path("B"))) as Arc<dyn SourceDataCookerDescriptor>,
        Arc::new(cooker("B").requires(path("A"))),
    ]);

    match result {
        Err(TracecookError::CircularDependency {
            chain,
        }) => assert_eq!(chain, "S/A → S/B → S/A"),
        other => panic!("expected circular dependency, got {other:?}"),
    }
    assert!(!scheduler.is_scheduled());
    assert!(scheduler.data_cookers_by_source_pass().is_empty());
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let result = schedule(vec![cooker("A").requires(path("A"))]);
    assert!(matches!(result, Err(TracecookError::CircularDependency { .. })));
}

#[test]
fn test_cross_source_requirement_is_rejected() {
    let result = schedule(vec![
        cooker("A").requires(DataCookerPath::for_source("Other", "B")),
    ]);

    match result {
        Err(TracecookError::CrossSourceDependency {
            cooker,
            required,
        }) => {
            assert_eq!(cooker, "S/A");
            assert_eq!(required, "Other/B");
        }
        other => panic!("expected cross-source error, got {other:?}"),
    }
}

#[test]
fn test_cooker_for_another_source_is_rejected() {
    let mut scheduler = SourceDataCookerScheduler::new("S");
    let result = scheduler.schedule_data_cookers(vec![
        Arc::new(DataCookerSpec::source("T", "A")) as Arc<dyn SourceDataCookerDescriptor>,
    ]);
    assert!(matches!(result, Err(TracecookError::WrongSourceParser { .. })));
}

#[test]
fn test_missing_requirement_is_internal_error() {
    let result = schedule(vec![cooker("A").requires(path("NotEnabled"))]);
    let error = result.unwrap_err();
    assert!(matches!(error, TracecookError::MissingSchedulingNode { .. }));
    assert!(error.is_internal());
}

#[test]
fn test_second_schedule_call_rejected_and_result_kept() {
    let mut scheduler = schedule(vec![cooker("C1"), cooker("C2").requires(path("C1"))]).unwrap();
    let before = ids(&scheduler);

    let result = scheduler.schedule_data_cookers(vec![
        Arc::new(cooker("C9")) as Arc<dyn SourceDataCookerDescriptor>,
    ]);

    assert!(matches!(result, Err(TracecookError::AlreadyScheduled { .. })));
    assert_eq!(ids(&scheduler), before);
}

#[test]
fn test_failed_schedule_cannot_be_retried() {
    let mut scheduler = SourceDataCookerScheduler::new("S");
    let cyclic = vec![
        Arc::new(cooker("A").requires(path("A"))) as Arc<dyn SourceDataCookerDescriptor>,
    ];
    assert!(scheduler.schedule_data_cookers(cyclic).is_err());

    let result = scheduler.schedule_data_cookers(Vec::new());
    assert!(matches!(result, Err(TracecookError::AlreadyScheduled { .. })));
}

/// Small deterministic generator so the ordering properties can be checked on
/// many graph shapes without a randomness dependency.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) % bound
    }
}

#[test]
fn test_ordering_properties_on_generated_graphs() {
    for seed in 0..300 {
        let mut rng = Lcg(seed);
        let count = 2 + rng.next(12) as usize;
        let mut specs: Vec<DataCookerSpec> = Vec::with_capacity(count);

        // Requirements only point at lower indices, so every graph is acyclic.
        // As-required cookers only take aligned requirements on other as-required ones.
        for i in 0..count {
            let strategy = match rng.next(8) {
                0 | 1 => DataProductionStrategy::AsRequired,
                2 => DataProductionStrategy::AsConsumed,
                _ => DataProductionStrategy::PostSourceParsing,
            };
            let mut spec = cooker(&format!("N{i}")).with_strategy(strategy);
            for j in 0..i {
                let producer_as_required =
                    specs[j].data_production_strategy() == DataProductionStrategy::AsRequired;
                if strategy == DataProductionStrategy::AsRequired && !producer_as_required {
                    continue;
                }
                match rng.next(6) {
                    0 => spec = spec.requires(path(&format!("N{j}"))),
                    1 if !producer_as_required => {
                        spec = spec.requires_as_consumed(path(&format!("N{j}")))
                    }
                    _ => {}
                }
            }
            specs.push(spec);
        }

        // Hand them over in a shuffled order
        let mut order: Vec<usize> = (0..count).collect();
        for i in (1..count).rev() {
            order.swap(i, rng.next(i as u64 + 1) as usize);
        }
        let shuffled: Vec<_> = order.iter().map(|&i| specs[i].clone()).collect();

        let scheduler = schedule(shuffled).unwrap();

        let mut seen = HashSet::new();
        for (pass, cookers) in scheduler.data_cookers_by_source_pass().iter().enumerate() {
            assert!(!cookers.is_empty(), "seed {seed}: pass {pass} is empty");
            for cooker in cookers {
                assert!(
                    seen.insert((cooker.path().clone(), pass)),
                    "seed {seed}: {} twice in pass {pass}",
                    cooker.path()
                );
            }
        }

        // Passes each cooker must occupy: its own for normal cookers, the union
        // of its consumers' passes for as-required ones. Consumers have higher
        // indices, so walking down visits them first.
        let mut expected_passes: Vec<Vec<usize>> = vec![Vec::new(); count];
        for i in (0..count).rev() {
            let spec = &specs[i];
            if spec.data_production_strategy() != DataProductionStrategy::AsRequired {
                expected_passes[i] = vec![placement(&scheduler, spec.path().data_cooker_id()).pass];
            }
            expected_passes[i].sort_unstable();
            expected_passes[i].dedup();
            for required in spec.required_data_cookers() {
                let j = specs.iter().position(|s| s.path() == required).unwrap();
                let passes = expected_passes[i].clone();
                expected_passes[j].extend(passes);
            }
        }

        let mut total = 0;
        for (i, spec) in specs.iter().enumerate() {
            let passes: Vec<usize> = scheduler.placements(spec.path()).iter().map(|p| p.pass).collect();
            assert_eq!(passes, expected_passes[i], "seed {seed}: passes of {}", spec.path());
            total += passes.len();
        }
        assert_eq!(scheduler.cooker_count(), total, "seed {seed}: cooker count");

        for spec in &specs {
            for consumer in scheduler.placements(spec.path()) {
                for required in spec.required_data_cookers() {
                    let producer_spec = specs.iter().find(|s| s.path() == required).unwrap();
                    let producer_placements = scheduler.placements(required);
                    let aligned = spec.dependency_type(required)
                        == DataCookerDependencyType::AlignedWithProductionStrategy;

                    match producer_spec.data_production_strategy() {
                        DataProductionStrategy::AsRequired => {
                            let producer = producer_placements
                                .iter()
                                .find(|p| p.pass == consumer.pass)
                                .unwrap_or_else(|| {
                                    panic!("seed {seed}: {required} missing from pass {}", consumer.pass)
                                });
                            assert!(producer.block < consumer.block, "seed {seed}: {spec:?}");
                        }
                        DataProductionStrategy::PostSourceParsing if aligned => {
                            assert!(consumer.pass > producer_placements[0].pass, "seed {seed}: {spec:?}");
                        }
                        _ => {
                            let producer = producer_placements[0];
                            if consumer.pass == producer.pass {
                                assert!(consumer.block > producer.block, "seed {seed}: {spec:?}");
                            } else {
                                assert!(consumer.pass > producer.pass, "seed {seed}: {spec:?}");
                            }
                        }
                    }
                }
            }
        }
    }
}
