//! Sampling Integration Tests
//!
//! Field boundary validation, sampling plans, and feeding a generated plan
//! back into an assessment.

use yield_assessor::samples::keys;
use yield_assessor::utils::{haversine_m, LocalProjection};
use yield_assessor::{
    generate_sampling_plan, validate_field_boundary, AssessmentOrchestrator, AssessmentRequest,
    AssessmentSampleInput, ChartStore, CheckType, EngineConfig, EngineError, FieldBoundary, GeoPoint,
    GeometryService, GrowthStage, Peril, PlanarGeometry,
};

/// Rectangle of `width_m` × `height_m` near Harare, as GeoJSON `[lng, lat]` pairs
fn rectangle(width_m: f64, height_m: f64) -> FieldBoundary {
    let projection = LocalProjection::new(GeoPoint::new(-17.80, 31.00));
    let corners = [(0.0, 0.0), (width_m, 0.0), (width_m, height_m), (0.0, height_m), (0.0, 0.0)];
    let coordinates: Vec<[f64; 2]> = corners
        .iter()
        .map(|(x, y)| {
            let p = projection.to_geo(*x, *y);
            [p.lng, p.lat]
        })
        .collect();
    FieldBoundary::from_lng_lat(&coordinates)
}

#[test]
fn test_plan_respects_buffer_and_spacing() {
    let field = rectangle(200.0, 200.0);
    let config = EngineConfig::default();
    let metrics = validate_field_boundary(&PlanarGeometry, &field, &config.sampling).unwrap();
    assert!((metrics.area_ha - 4.0).abs() < 0.01);

    let points = generate_sampling_plan(&PlanarGeometry, &field, 8, 5.0, 20.0).unwrap();
    assert_eq!(points.len(), 8);

    for p in &points {
        assert!(PlanarGeometry.contains_shrunk(&field, 5.0, p.location()));
        assert!(p.distance_from_edge_meters >= 5.0);
        assert_eq!((p.lat * 1e7).round() / 1e7, p.lat);
    }
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            assert!(haversine_m(a.location(), b.location()) >= 20.0);
        }
    }
}

#[test]
fn test_tiny_and_crossed_fields_are_rejected() {
    let config = EngineConfig::default();

    // 5 m × 5 m = 0.0025 ha
    let tiny = rectangle(5.0, 5.0);
    assert!(matches!(
        validate_field_boundary(&PlanarGeometry, &tiny, &config.sampling),
        Err(EngineError::InvalidBoundary(_))
    ));

    let bowtie = FieldBoundary::from_lng_lat(&[[31.0, -17.8], [31.002, -17.802], [31.002, -17.8], [31.0, -17.802]]);
    assert!(matches!(
        generate_sampling_plan(&PlanarGeometry, &bowtie, 5, 5.0, 20.0),
        Err(EngineError::InvalidBoundary(_))
    ));
}

#[test]
fn test_overcrowded_plan_fails_instead_of_shrinking() {
    let field = rectangle(100.0, 100.0);
    match generate_sampling_plan(&PlanarGeometry, &field, 1000, 5.0, 20.0) {
        Err(EngineError::InsufficientPoints { generated, required, attempts }) => {
            assert!(generated < required);
            assert_eq!(required, 1000);
            assert_eq!(attempts, 100_000);
        }
        other => panic!("expected InsufficientPoints, got {:?}", other),
    }
}

#[test]
fn test_planned_points_pass_gps_checks() {
    let field = rectangle(300.0, 200.0);
    let points = generate_sampling_plan(&PlanarGeometry, &field, 6, 10.0, 30.0).unwrap();

    let samples: Vec<AssessmentSampleInput> = points
        .iter()
        .map(|p| {
            AssessmentSampleInput::new(p.sample_number)
                .with_location(p.lat, p.lng)
                .with_count(keys::SURVIVING_PLANTS, 30 + p.sample_number)
        })
        .collect();

    let request: AssessmentRequest = serde_json::from_value(serde_json::json!({
        "primary_peril": "FLOOD",
        "growth_stage": "V3-V5",
        "measurement_date": "2026-01-05T07:45:00",
        "field_context": { "field_area_ha": 6.0 },
        "field_boundary": field,
        "samples": samples
    }))
    .unwrap();
    assert_eq!(request.primary_peril, Peril::Flood);
    assert_eq!(request.growth_stage, GrowthStage::V3V5);

    let store = ChartStore::with_reference_charts();
    let orchestrator = AssessmentOrchestrator::new(&store, &PlanarGeometry, EngineConfig::default());
    let result = orchestrator.assess(&request).unwrap();

    assert!(
        result.validation_flags.iter().all(|f| f.check_type != CheckType::Gps),
        "{:?}",
        result.validation_flags
    );
}
