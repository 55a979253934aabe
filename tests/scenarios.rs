//! End-to-end movement scenarios driven through `Simulation`.

use ledgeline::game::actor::TickReport;
use ledgeline::game::config::SimConfig;
use ledgeline::game::events::GameEventData;
use ledgeline::game::input::{ButtonId, InputFrame};
use ledgeline::{Simulation, Spawn, StaticGeometry, Vec2};

fn jumped(report: &TickReport) -> bool {
    report.events.iter().any(|e| e.data == GameEventData::JumpStarted)
}

fn settle(sim: &mut Simulation) {
    for _ in 0..120 {
        if sim.step(&InputFrame::new()).grounded {
            return;
        }
    }
    panic!("actor never landed");
}

fn no_boost_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.movement.jump_x_boost = 0.0;
    config
}

/// Floor at y = 0 plus a ceiling slab whose right edge overhangs the
/// actor's left side by 0.1.
fn overhang_level() -> StaticGeometry {
    StaticGeometry::new()
        .with_box(Vec2::new(-20.0, -1.0), Vec2::new(40.0, 1.0))
        .with_box(Vec2::new(-3.0, 1.8), Vec2::new(2.7, 1.0))
}

/// Highest top edge of the collider over a jump.
fn jump_apex(sim: &mut Simulation) -> (f32, bool) {
    let jump = InputFrame::with_buttons(&[ButtonId::Jump]);
    let mut top = f32::MIN;
    let mut corrected = false;
    for _ in 0..60 {
        let report = sim.step(&jump);
        corrected |= report.corrected;
        top = top.max(sim.actor().collider_aabb().max().y);
    }
    (top, corrected)
}

#[test]
fn test_corner_correction_clears_overhang() {
    let mut sim = Simulation::new(no_boost_config(), overhang_level(), Spawn::at(Vec2::ZERO));
    settle(&mut sim);

    let (top, corrected) = jump_apex(&mut sim);
    assert!(corrected);
    assert!(top > 2.1, "head should pass the overhang, reached {top}");
    assert!(sim.actor().collider_aabb().min().x >= -0.3 - 1e-4);
}

#[test]
fn test_overhang_blocks_without_correction() {
    let mut config = no_boost_config();
    config.collision.upward_corner_correction = 0;
    let mut sim = Simulation::new(config, overhang_level(), Spawn::at(Vec2::ZERO));
    settle(&mut sim);

    let (top, corrected) = jump_apex(&mut sim);
    assert!(!corrected);
    assert!(top <= 1.8, "head went through the overhang: {top}");
    assert_eq!(sim.actor().position.x, 0.0);
}

#[test]
fn test_ceiling_bonk_zeroes_rise() {
    let level = StaticGeometry::new()
        .with_box(Vec2::new(-20.0, -1.0), Vec2::new(40.0, 1.0))
        .with_box(Vec2::new(-20.0, 2.0), Vec2::new(40.0, 1.0));
    let mut sim = Simulation::new(no_boost_config(), level, Spawn::at(Vec2::ZERO));
    settle(&mut sim);

    let jump = InputFrame::with_buttons(&[ButtonId::Jump]);
    let mut bonked = false;
    for _ in 0..20 {
        let report = sim.step(&jump);
        if report.contacts.ceiling {
            bonked = true;
            assert!(report.velocity.y <= 0.0);
            break;
        }
    }
    assert!(bonked);
    assert!(sim.actor().collider_aabb().max().y <= 2.0);
}

/// Ledge ends at x = 0; the actor walks off to the right.
fn ledge_run(jump_delay: u32) -> bool {
    let level = StaticGeometry::new().with_box(Vec2::new(-10.0, -1.0), Vec2::new(10.0, 1.0));
    let mut sim = Simulation::new(SimConfig::default(), level, Spawn::at(Vec2::new(-3.0, 0.0)));
    settle(&mut sim);

    let right = InputFrame::with_buttons(&[ButtonId::Right]);
    let mut left_ground = false;
    for _ in 0..120 {
        if !sim.step(&right).grounded {
            left_ground = true;
            break;
        }
    }
    assert!(left_ground, "never reached the ledge");

    for _ in 1..jump_delay {
        sim.step(&right);
    }
    jumped(&sim.step(&right.pressing(ButtonId::Jump)))
}

#[test]
fn test_coyote_jump_after_leaving_ledge() {
    assert!(ledge_run(1));
    assert!(ledge_run(4));
}

#[test]
fn test_coyote_window_closes() {
    assert!(!ledge_run(12));
}

#[test]
fn test_json_config_changes_motion() {
    let floaty = SimConfig::from_json_str(r#"{ "movement": { "jump_speed": 14.0, "jump_x_boost": 0.0 } }"#).unwrap();
    let level = || StaticGeometry::new().with_box(Vec2::new(-20.0, -1.0), Vec2::new(40.0, 1.0));

    let mut normal = Simulation::new(no_boost_config(), level(), Spawn::at(Vec2::ZERO));
    let mut high = Simulation::new(floaty, level(), Spawn::at(Vec2::ZERO));
    settle(&mut normal);
    settle(&mut high);

    let (normal_top, _) = jump_apex(&mut normal);
    let (high_top, _) = jump_apex(&mut high);
    assert!(high_top > normal_top + 0.3);
}

#[test]
fn test_landing_reports_impact_speed() {
    let level = StaticGeometry::new().with_box(Vec2::new(-20.0, -1.0), Vec2::new(40.0, 1.0));
    let config = SimConfig::default();
    let max_fall = config.movement.max_fall;

    let mut low = Simulation::new(config.clone(), level.clone(), Spawn::at(Vec2::new(0.0, 0.5)));
    let mut high = Simulation::new(config, level, Spawn::at(Vec2::new(0.0, 12.0)));

    let impact = |sim: &mut Simulation| {
        for _ in 0..300 {
            let report = sim.step(&InputFrame::new());
            for event in &report.events {
                if let GameEventData::LandedWithImpactSpeed { speed } = event.data {
                    return speed;
                }
            }
        }
        panic!("no landing");
    };

    let soft = impact(&mut low);
    let hard = impact(&mut high);
    assert!(soft < hard);
    assert!(hard <= max_fall);
    assert!((hard - max_fall).abs() < 1e-4, "long fall hits terminal speed");
}
