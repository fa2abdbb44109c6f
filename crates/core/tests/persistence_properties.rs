//! Randomized checks of persistence and pruning invariants
//!
//! Populations and windows are drawn from a seeded `StdRng` so failures are
//! reproducible.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use fire_persist_core::persistence::{persist_fire, persist_fires, resolve_window};
use fire_persist_core::{
    ActiveArea, ActivityEntry, DispersionOverrides, DispersionWindow, FailureReport, FireEvent,
    FireRecord, UnusedFirePruner,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const SEEDS: [u64; 4] = [1, 7, 42, 2015];

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 6, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

fn random_area(rng: &mut StdRng) -> ActiveArea {
    let start = base() + Duration::minutes(rng.random_range(0..240 * 60));
    let end = start + Duration::minutes(rng.random_range(1..48 * 60));
    ActiveArea::new(start, end)
}

fn random_window(rng: &mut StdRng) -> DispersionWindow {
    let start = base() + Duration::hours(rng.random_range(0..120));
    DispersionWindow::try_new(start, rng.random_range(0..240)).unwrap()
}

/// Fire eligible for persistence: one entry, one active area
fn random_valid_fire(rng: &mut StdRng, id: usize) -> FireRecord {
    let area = random_area(rng);
    FireRecord::new(format!("fire-{id}"))
        .with_event(FireEvent::new(format!("event-{id}")))
        .with_activity(ActivityEntry::new(vec![area]))
}

/// Fire with an arbitrary activity layout, possibly empty
fn random_fire(rng: &mut StdRng, id: usize) -> FireRecord {
    let mut fire =
        FireRecord::new(format!("fire-{id}")).with_event(FireEvent::new(format!("event-{id}")));
    for _ in 0..rng.random_range(0..5usize) {
        let areas = (0..rng.random_range(0..3usize))
            .map(|_| random_area(rng))
            .collect();
        fire = fire.with_activity(ActivityEntry::new(areas));
    }
    fire
}

#[test]
fn test_persisted_days_are_consecutive_and_cover_window() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        for id in 0..200 {
            let window = random_window(&mut rng);
            let mut fire = random_valid_fire(&mut rng, id);
            let original = fire.activity[0].active_areas[0].clone();

            let created = persist_fire(&mut fire, &window).unwrap();

            assert_eq!(fire.activity.len(), created + 1);
            for (k, entry) in fire.activity[1..].iter().enumerate() {
                let area = &entry.active_areas[0];
                let offset = Duration::days(k as i64 + 1);
                assert_eq!(area.start, original.start + offset);
                assert_eq!(area.end, original.end + offset);
                assert!(area.start <= window.last_hour());
            }
            // The next day would start past the window
            let next = original.start + Duration::days(created as i64 + 1);
            assert!(next > window.last_hour(), "seed {seed} fire {id}");
        }
    }
}

#[test]
fn test_created_count_matches_daily_steps() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        for id in 0..200 {
            let window = random_window(&mut rng);
            let mut fire = random_valid_fire(&mut rng, id);
            let shifted = fire.activity[0].active_areas[0].start + Duration::days(1);

            let expected = if shifted <= window.last_hour() {
                ((window.last_hour() - shifted).num_minutes() / (24 * 60)) as usize + 1
            } else {
                0
            };

            assert_eq!(persist_fire(&mut fire, &window).unwrap(), expected);
        }
    }
}

#[test]
fn test_invalid_fires_never_affect_valid_ones() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let window = random_window(&mut rng);
        let fires: Vec<FireRecord> = (0..100).map(|id| random_fire(&mut rng, id)).collect();

        let valid: Vec<bool> = fires
            .iter()
            .map(|f| f.activity.len() == 1 && f.activity[0].active_areas.len() == 1)
            .collect();

        // Persisting each valid fire alone gives the reference result
        let mut expected_total = 0;
        let mut expected = fires.clone();
        for (fire, ok) in expected.iter_mut().zip(&valid) {
            if *ok {
                expected_total += persist_fire(fire, &window).unwrap();
            }
        }

        let mut batch = fires.clone();
        let mut report = FailureReport::new();
        let tally = persist_fires(&mut batch, &window, &mut report);

        assert_eq!(tally.created, expected_total);
        assert_eq!(report.len(), valid.iter().filter(|ok| !**ok).count());
        assert_eq!(batch, expected);
        for (fire, ok) in fires.iter().zip(&valid) {
            assert_eq!(report.contains(&fire.id), !*ok);
        }
    }
}

#[test]
fn test_pruning_is_idempotent() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..50 {
            let window = random_window(&mut rng);
            let pruner = UnusedFirePruner::new(window);
            let mut fires: Vec<FireRecord> =
                (0..30).map(|id| random_fire(&mut rng, id)).collect();

            pruner.prune(&mut fires);
            let once = fires.clone();
            let again = pruner.prune(&mut fires);

            assert_eq!(fires, once);
            assert_eq!(again.fires_removed, 0);
            assert_eq!(again.activity_removed, 0);
            for fire in &fires {
                assert!(!fire.activity.is_empty());
                assert!(fire.activity.iter().all(|e| !pruner.is_unused(e)));
            }
        }
    }
}

#[test]
fn test_resolved_window_spans_population() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let fires: Vec<FireRecord> = (0..40).map(|id| random_valid_fire(&mut rng, id)).collect();

        let window = resolve_window(&fires, &DispersionOverrides::default()).unwrap();

        for fire in &fires {
            let area = &fire.activity[0].active_areas[0];
            assert!(area.start >= window.start());
            // Whole hours are truncated, so the end may poke out by under an hour
            assert!(area.end < window.last_hour() + Duration::hours(1));
        }
    }
}
