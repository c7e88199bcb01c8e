//! Integration tests for the simulation engine.
//!
//! These drive the public API the way the viewer and the render binary do:
//! text goes in through a rasterizer or a session, frames are advanced with
//! a parameter source, and the settled field is inspected afterwards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rdtype::field::update_cell;
use rdtype::prelude::*;

fn assert_bounded(field: &ConcentrationField) {
    for cell in field.current() {
        assert!((0.0..=1.0).contains(&cell.a), "a out of range: {}", cell.a);
        assert!((0.0..=1.0).contains(&cell.b), "b out of range: {}", cell.b);
    }
}

fn randomize(field: &mut ConcentrationField, mask: &mut TextMask, rng: &mut StdRng) {
    for y in 0..field.height() {
        for x in 0..field.width() {
            field.set_cell(x, y, Cell::new(rng.gen(), rng.gen()));
            mask.set(x, y, if rng.gen_bool(0.2) { 1.0 } else { 0.0 });
        }
    }
}

// ============================================================================
// Kernel Properties
// ============================================================================

#[test]
fn test_rest_state_is_stable_without_text() {
    let mut field = ConcentrationField::new(64, 48).unwrap();
    let mask = TextMask::new(64, 48).unwrap();
    let params = SimulationParams::default();

    for _ in 0..500 {
        field.half_step(&mask, &params);
    }
    assert!(field.current().iter().all(|c| *c == Cell::EMPTY));
}

#[test]
fn test_injection_lifts_rest_cell_to_045() {
    let mut field = ConcentrationField::new(9, 9).unwrap();
    let mut mask = TextMask::new(9, 9).unwrap();
    mask.set(4, 4, 1.0);

    field.half_step(&mask, &SimulationParams::default());

    assert!((field.cell(4, 4).b - 0.45).abs() < 1e-6);
    for y in 0..9 {
        for x in 0..9 {
            if (x, y) != (4, 4) {
                assert_eq!(field.cell(x, y).b, 0.0, "cell ({}, {}) picked up b", x, y);
            }
        }
    }
}

#[test]
fn test_injection_blends_stepped_value_halfway_to_target() {
    let params = SimulationParams::default();
    let mut field = ConcentrationField::new(5, 5).unwrap();
    for y in 0..5 {
        for x in 0..5 {
            field.set_cell(x, y, Cell::new(0.5, 0.2));
        }
    }
    let src = field.current().to_vec();
    let unmasked = update_cell(&src, 5, 5, 2, 2, 0.0, &params);

    let mut mask = TextMask::new(5, 5).unwrap();
    mask.set(2, 2, 1.0);
    field.half_step(&mask, &params);

    let expected = unmasked.b * 0.5 + 0.9 * 0.5;
    assert!((field.cell(2, 2).b - expected).abs() < 1e-6);
    assert!(field.cell(2, 2).b > unmasked.b);
    assert_eq!(field.cell(0, 0).b, unmasked.b);
}

#[test]
fn test_field_stays_bounded_for_documented_ranges() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..8 {
        let feed = rng.gen_range(0.01..=0.10);
        let kill = rng.gen_range(0.045..=0.070);
        let params = SimulationParams::default().with_feed_kill(feed, kill);

        let mut field = ConcentrationField::new(40, 40).unwrap();
        let mut mask = TextMask::new(40, 40).unwrap();
        randomize(&mut field, &mut mask, &mut rng);

        for _ in 0..60 {
            field.half_step(&mask, &params);
            assert_bounded(&field);
        }
    }
}

#[test]
fn test_runaway_parameters_saturate_instead_of_nan() {
    let params = SimulationParams::default().with_feed_kill(5.0, -3.0).with_dt(4.0);
    let mut field = ConcentrationField::new(20, 20).unwrap();
    let mut mask = TextMask::new(20, 20).unwrap();
    randomize(&mut field, &mut mask, &mut StdRng::seed_from_u64(3));

    for _ in 0..50 {
        field.half_step(&mask, &params);
    }
    assert_bounded(&field);
    assert!(field.current().iter().all(|c| !c.a.is_nan() && !c.b.is_nan()));
}

#[test]
fn test_parallel_step_matches_reversed_sequential_scan() {
    let (w, h) = (37, 23);
    let mut rng = StdRng::seed_from_u64(42);
    let mut field = ConcentrationField::new(w, h).unwrap();
    let mut mask = TextMask::new(w, h).unwrap();
    randomize(&mut field, &mut mask, &mut rng);
    let params = SimulationParams::default().with_feed_kill(0.037, 0.06);

    let src = field.current().to_vec();
    let mut expected = vec![Cell::EMPTY; w * h];
    for idx in (0..w * h).rev() {
        let (x, y) = (idx % w, idx / w);
        expected[idx] = update_cell(&src, w, h, x, y, mask.data()[idx], &params);
    }

    field.half_step(&mask, &params);

    for (got, want) in field.current().iter().zip(&expected) {
        assert_eq!(got.a.to_bits(), want.a.to_bits());
        assert_eq!(got.b.to_bits(), want.b.to_bits());
    }
}

// ============================================================================
// Text Mask Properties
// ============================================================================

#[test]
fn test_rasterizing_twice_gives_identical_masks() {
    let rasterizer = TextRasterizer::new();

    for family in FontFamily::ALL {
        for use_caps in [true, false] {
            let style = TextStyle {
                font_family: family,
                font_size: 60.0,
                use_caps,
            };
            let mut first = TextMask::new(120, 90).unwrap();
            let mut second = TextMask::new(120, 90).unwrap();
            rasterizer.rasterize("Gray\nScott", &style, &mut first);
            rasterizer.rasterize("Gray\nScott", &style, &mut second);
            assert_eq!(first.data(), second.data(), "{} caps={}", family, use_caps);
        }
    }
}

#[test]
fn test_regenerating_over_old_text_matches_fresh_mask() {
    let rasterizer = TextRasterizer::new();
    let style = TextStyle::default();

    let mut reused = TextMask::new(100, 100).unwrap();
    rasterizer.rasterize("WWWWWW", &style, &mut reused);
    rasterizer.rasterize("i", &style, &mut reused);

    let mut fresh = TextMask::new(100, 100).unwrap();
    rasterizer.rasterize("i", &style, &mut fresh);
    assert_eq!(reused.data(), fresh.data());
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_empty_text_leaves_field_at_rest() {
    let mut session = Session::new(DEFAULT_GRID, DEFAULT_GRID, TextStyle::default()).unwrap();
    session.set_text("");
    assert!(session.instance().mask().is_blank());

    let params = SimulationParams::default().with_iterations(4);
    for _ in 0..100 {
        session.advance_frame(&params);
    }

    let field = session.instance().field();
    assert_eq!(field.half_steps(), 800);
    assert!(field.current().iter().all(|c| *c == Cell::EMPTY));
}

#[test]
fn test_single_letter_grows_from_its_seed() {
    let style = TextStyle {
        font_size: 20.0,
        ..TextStyle::default()
    };
    let mut session = Session::new(DEFAULT_GRID, DEFAULT_GRID, style).unwrap();
    session.set_text("A");

    let params = AppConfig::default().simulation_params();
    for _ in 0..200 {
        session.advance_frame(&params);
    }

    let instance = session.instance();
    let field = instance.field();
    let mask = instance.mask();
    assert!(!mask.is_blank());
    assert_bounded(field);

    let seeded: Vec<f32> = (0..field.len())
        .filter(|&i| mask.data()[i] > 0.1)
        .map(|i| field.current()[i].b)
        .collect();
    let seeded_mean = seeded.iter().sum::<f32>() / seeded.len() as f32;
    assert!(seeded_mean > 0.1, "seeded mean b = {}", seeded_mean);

    let spread = (0..field.len())
        .filter(|&i| mask.data()[i] == 0.0 && field.current()[i].b > 0.05)
        .count();
    assert!(spread > 0, "no growth outside the glyph");

    let last = DEFAULT_GRID - 1;
    for (x, y) in [(0, 0), (last, 0), (0, last), (last, last)] {
        assert!(field.cell(x, y).b < 0.01, "corner ({}, {}) b = {}", x, y, field.cell(x, y).b);
    }
}

#[test]
fn test_reset_replaces_instance_with_fresh_seeded_one() {
    let mut session = Session::new(64, 64, TextStyle::default()).unwrap();
    session.set_text("RD");
    let params = SimulationParams::default();
    for _ in 0..10 {
        session.advance_frame(&params);
    }
    assert!(session.instance().field().total_b() > 0.0);
    let mask_before = session.instance().mask().data().to_vec();

    assert!(!session.sync_reset_key(session.reset_key()).unwrap());
    assert_eq!(session.generation(), 0);

    session.reset().unwrap();
    assert_eq!(session.generation(), 1);
    assert_eq!(session.instance().frames(), 0);
    assert_eq!(session.instance().field().half_steps(), 0);
    assert!(session.instance().field().current().iter().all(|c| *c == Cell::EMPTY));
    assert_eq!(session.instance().mask().data(), &mask_before[..]);
}

#[test]
fn test_parameter_changes_keep_field_state() {
    let mut session = Session::new(48, 48, TextStyle::default()).unwrap();
    session.set_text("X");
    session.advance_frame(&SimulationParams::default());
    let before = session.instance().field().total_b();

    let mitosis = Preset::by_name("mitosis").unwrap();
    let params = SimulationParams::default().with_feed_kill(mitosis.feed, mitosis.kill);
    session.advance_frame(&params);

    assert_eq!(session.generation(), 0);
    assert_eq!(session.instance().frames(), 2);
    assert!(session.instance().field().total_b() > before);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_parameter_updates_are_never_torn() {
    let coral = Preset::by_name("coral").unwrap();
    let chaos = Preset::by_name("chaos").unwrap();
    let initial = SimulationParams::default().with_feed_kill(coral.feed, coral.kill);
    let shared = SharedParams::shared(initial);
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let shared = Arc::clone(&shared);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut flip = false;
            while !done.load(Ordering::Relaxed) {
                let preset = if flip { chaos } else { coral };
                shared.set_feed(preset.feed);
                shared.set_kill(preset.kill);
                flip = !flip;
            }
        })
    };

    let mut session = Session::new(64, 64, TextStyle::default()).unwrap();
    session.set_text("OK");
    for _ in 0..30 {
        let snapshot = shared.snapshot();
        assert!(snapshot.feed == coral.feed || snapshot.feed == chaos.feed);
        assert!(snapshot.kill == coral.kill || snapshot.kill == chaos.kill);
        session.advance_frame(&shared);
    }

    done.store(true, Ordering::Relaxed);
    writer.join().unwrap();

    assert_eq!(session.instance().frames(), 30);
    assert_bounded(session.instance().field());
}
