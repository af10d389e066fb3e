use criterion::{black_box, criterion_group, criterion_main, Criterion};
use yield_assessor::data::tables;
use yield_assessor::samples::{keys, StandReductionSample};
use yield_assessor::{
    calculate_stand_reduction, AssessmentOrchestrator, AssessmentParams, AssessmentSampleInput, ChartStore,
    CropStage, EngineConfig, GrowthStage, InterpolationResolver, Peril, PlanarGeometry, StandReductionParams,
};

fn bench_resolve(c: &mut Criterion) {
    let store = ChartStore::with_reference_charts();
    let resolver = InterpolationResolver::new(&store);

    c.bench_function("resolve_interpolated", |b| {
        b.iter(|| resolver.resolve(tables::STAND_REDUCTION_EARLY, black_box(73.5), Some("8thLeaf")))
    });

    let samples: Vec<StandReductionSample> = (1..=20)
        .map(|i| StandReductionSample {
            sample_number: i,
            surviving_plants: 20 + i,
            row_length_m: 10.0,
            row_width_m: 0.9,
        })
        .collect();
    let params = StandReductionParams::new(CropStage::Leaf(8));
    c.bench_function("stand_reduction_20_samples", |b| {
        b.iter(|| calculate_stand_reduction(&resolver, black_box(&samples), &params))
    });
}

fn bench_orchestrator(c: &mut Criterion) {
    let store = ChartStore::with_reference_charts();
    let orchestrator = AssessmentOrchestrator::new(&store, &PlanarGeometry, EngineConfig::default());
    let samples: Vec<AssessmentSampleInput> = (1..=10)
        .map(|i| {
            AssessmentSampleInput::new(i)
                .with_count(keys::DESTROYED, i % 5)
                .with_damage(keys::DEFOLIATION, 10.0 * (i % 4) as f64)
        })
        .collect();
    let params = AssessmentParams::default();

    c.bench_function("resolve_method_hail", |b| {
        b.iter(|| orchestrator.resolve_method(Peril::Hail, GrowthStage::V9V12, black_box(&samples), &params))
    });
}

criterion_group!(benches, bench_resolve, bench_orchestrator);
criterion_main!(benches);
