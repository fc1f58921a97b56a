use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use loam_field::config::FieldConfig;
use loam_field::{ChunkCoord, ConstantHeight, DensityFieldGenerator, FieldShape, HeightField};
use loam_geom::{Bounds, Vec3};
use loam_mesh::{MeshPackage, NaiveSurfaceNets, extract_field};
use loam_render::{ChunkRender, MeshTarget, PresentationApplier, TickStats};
use loam_runtime::{ChunkPool, ChunkStage, MeshReceiver, PoolConfig};
use proptest::prelude::*;

const WAIT: Duration = Duration::from_secs(30);

fn spawn(cfg: &PoolConfig, shape: FieldShape) -> (ChunkPool, MeshReceiver) {
    let generator = Arc::new(DensityFieldGenerator::new(shape));
    ChunkPool::spawn(cfg, generator, Arc::new(NaiveSurfaceNets)).unwrap()
}

fn single(edge: usize) -> PoolConfig {
    PoolConfig {
        grid_width: 1,
        grid_height: 1,
        chunk_edge: edge,
        threads: 1,
        channel_capacity: 0,
    }
}

fn run_until_applied(pool: &ChunkPool, rx: &MeshReceiver, applier: &mut PresentationApplier) {
    for _ in 0..30_000 {
        applier.tick(pool, rx);
        if pool.slots().all(|s| s.stage() == ChunkStage::Applied) {
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("chunks never reached Applied: {:?}", pool.stage_counts());
}

#[test]
fn full_grid_applies_one_mesh_per_chunk() {
    let cfg = PoolConfig::default();
    let generator = Arc::new(DensityFieldGenerator::from_config(&FieldConfig::default()));
    let (pool, rx) = ChunkPool::spawn(&cfg, Arc::clone(&generator), Arc::new(NaiveSurfaceNets)).unwrap();
    assert_eq!(pool.len(), 64);
    let mut applier = PresentationApplier::new(&pool);
    run_until_applied(&pool, &rx, &mut applier);

    assert_eq!(applier.totals().applied, 64);
    assert_eq!(applier.totals().stale, 0);
    let mut seen = HashSet::new();
    for (coord, render) in applier.targets() {
        let mesh = render.mesh().expect("applied mesh");
        assert_eq!(mesh.coord, *coord);
        assert_eq!(
            mesh.origin,
            Vec3::new(coord.cx as f32 * 16.0, 0.0, coord.cz as f32 * 16.0)
        );
        assert!(mesh.triangle_count() > 0);
        assert!(seen.insert(mesh.vertices.as_ptr()));

        // Content must be this chunk's own surface, not a neighbor's.
        let field = generator.generate(mesh.origin, pool.dims());
        let (_, expected) = extract_field(&NaiveSurfaceNets, &field).unwrap();
        assert_eq!(mesh.vertices, expected.vertices, "chunk {coord}");
        assert_eq!(mesh.normals, expected.normals, "chunk {coord}");
        assert_eq!(mesh.indices, expected.indices, "chunk {coord}");
        assert_eq!(mesh.bounds, expected.bounds, "chunk {coord}");
    }
    assert_eq!(seen.len(), 64);
    let first = applier.target(ChunkCoord::from_grid(0, 0)).and_then(|r| r.mesh()).unwrap();
    let distinct = applier
        .targets()
        .filter_map(|(_, r)| r.mesh())
        .filter(|m| m.vertices != first.vertices)
        .count();
    assert!(distinct > 0, "noise terrain should differ between chunks");
    assert!(pool.drain_reports().iter().all(|r| !r.is_failure()));
}

#[test]
fn constant_height_bounds_center_near_height() {
    let c = 7.3;
    let shape = FieldShape::HeightField(HeightField::new(Arc::new(ConstantHeight(c)), 1.0, 0.0));
    let (pool, rx) = spawn(&single(16), shape);
    let mut applier = PresentationApplier::new(&pool);
    run_until_applied(&pool, &rx, &mut applier);

    let render = applier.target(ChunkCoord::from_grid(0, 0)).unwrap();
    let bounds = render.world_bounds().expect("surface");
    assert!((bounds.center.y - c).abs() < 0.5, "center {:?}", bounds.center);
    assert!(bounds.spans_y(c));
}

#[test]
fn stale_generation_is_discarded() {
    let (pool, rx) = spawn(&single(8), FieldShape::Plane { height: 3.5 });
    assert!(pool.wait_idle(WAIT));
    let coord = ChunkCoord::from_grid(0, 0);
    assert_eq!(pool.cancel(coord), Some(1));

    let mut applier = PresentationApplier::new(&pool);
    let stats = applier.tick(&pool, &rx);
    assert_eq!(
        stats,
        TickStats {
            applied: 0,
            stale: 1,
            pending: 0
        }
    );
    assert!(!applier.target(coord).unwrap().has_mesh());
    assert_eq!(pool.slot(coord).unwrap().stage(), ChunkStage::Cancelled);
}

#[test]
fn budget_limits_each_tick() {
    let cfg = PoolConfig {
        grid_width: 2,
        grid_height: 2,
        ..single(8)
    };
    let (pool, rx) = spawn(&cfg, FieldShape::Plane { height: 3.5 });
    assert!(pool.wait_idle(WAIT));
    let mut applier = PresentationApplier::new(&pool).with_budget(Some(1));
    let first = applier.tick(&pool, &rx);
    assert_eq!((first.applied, first.pending), (1, 3));
    for _ in 0..3 {
        applier.tick(&pool, &rx);
    }
    assert_eq!(applier.totals().applied, 4);
    assert_eq!(applier.tick(&pool, &rx), TickStats::default());
}

#[test]
fn unknown_chunk_is_rejected() {
    let (pool, _rx) = spawn(&single(4), FieldShape::Plane { height: 2.5 });
    let mut applier = PresentationApplier::new(&pool);
    let stray = MeshPackage {
        coord: ChunkCoord::from_grid(9, 9),
        generation: 0,
        origin: Vec3::ZERO,
        vertices: Vec::new(),
        normals: Vec::new(),
        tangents: Vec::new(),
        indices: Vec::new(),
        bounds: Bounds::EMPTY,
    };
    assert!(!applier.apply(&pool, stray));
}

#[test]
fn holder_ignores_mesh_for_another_chunk() {
    let mut render = ChunkRender::new(ChunkCoord::from_grid(0, 0), Vec3::ZERO);
    render.set_mesh(MeshPackage {
        coord: ChunkCoord::from_grid(1, 0),
        generation: 0,
        origin: Vec3::ZERO,
        vertices: Vec::new(),
        normals: Vec::new(),
        tangents: Vec::new(),
        indices: Vec::new(),
        bounds: Bounds::EMPTY,
    });
    assert!(!render.has_mesh());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn applying_same_package_repeatedly_is_idempotent(
        height in 1.25f32..6.75,
        repeats in 1usize..4,
    ) {
        let (pool, rx) = spawn(&single(6), FieldShape::Plane { height });
        prop_assert!(pool.wait_idle(WAIT));
        let package = rx.try_take().expect("published package");
        let mut applier = PresentationApplier::new(&pool);

        prop_assert!(applier.apply(&pool, package.clone()));
        let once = applier.target(package.coord).cloned();
        for _ in 0..repeats {
            prop_assert!(applier.apply(&pool, package.clone()));
        }
        prop_assert_eq!(applier.target(package.coord).cloned(), once);
        prop_assert_eq!(pool.slot(package.coord).unwrap().stage(), ChunkStage::Applied);
    }
}
