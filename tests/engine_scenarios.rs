//! End-to-end engine scenarios: timers, notifications, persistence, progression.

use std::cell::Cell;
use std::rc::Rc;

use tower_pull::achievements::{
    FIRST_BLOCK, LEVEL_3, LEVEL_5, LEVEL_8, NO_MISTAKES, SPEED_DEMON, STREAK_5,
};
use tower_pull::persistence::{KeyValueStore, MemoryStore, ProgressStore, StoreError};
use tower_pull::sim::{EngineConfig, GameEngine, GameEvent, GameOverReason, GamePhase, rules};
use tower_pull::{Clock, GameState, ManualClock};

const START_MS: f64 = 1_700_000_000_000.0;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine_with<S: KeyValueStore>(store: S) -> (GameEngine<S, ManualClock>, ManualClock) {
    init_logger();
    let clock = ManualClock::new(START_MS);
    let engine = GameEngine::with_config(store, clock.clone(), EngineConfig::with_seed(2024));
    (engine, clock)
}

/// Store whose writes can be switched off
#[derive(Clone, Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: Rc<Cell<bool>>,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Unavailable("disk full".into()));
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}

fn seed_progress(store: &MemoryStore, unlocked: u32) {
    let mut state = GameState::new();
    state.unlocked_level = unlocked;
    ProgressStore::new(store.clone()).save(&state).unwrap();
}

fn safe_ids<S: KeyValueStore, C: Clock>(engine: &GameEngine<S, C>, n: usize) -> Vec<u32> {
    engine
        .session()
        .blocks
        .iter()
        .filter(|b| !b.vulnerable && !b.removed)
        .take(n)
        .map(|b| b.id)
        .collect()
}

fn clear_level<S: KeyValueStore, C: Clock>(engine: &mut GameEngine<S, C>) {
    let target = engine.current_level().target_blocks as usize;
    for id in safe_ids(engine, target) {
        engine.remove_block(id);
    }
}

#[test]
fn countdown_runs_out_into_game_over() {
    let store = MemoryStore::new();
    seed_progress(&store, 3);
    let (mut engine, clock) = engine_with(store);
    assert!(engine.select_level(3));
    engine.drain_events();
    assert_eq!(engine.session().time_remaining, Some(120));

    clock.advance_secs(1.0);
    assert_eq!(engine.advance(), 1);
    assert_eq!(engine.session().time_remaining, Some(119));

    clock.advance_secs(200.0);
    engine.advance();
    let session = engine.session();
    assert_eq!(session.phase, GamePhase::GameOver);
    assert_eq!(session.game_over_reason, Some(GameOverReason::TimeUp));
    assert_eq!(session.time_remaining, Some(0));
    assert_eq!(engine.next_task_due(), None);

    let events = engine.drain_events();
    let ticks = events
        .iter()
        .filter(|e| matches!(e, GameEvent::TimeTicked { .. }))
        .count();
    assert_eq!(ticks, 120);
    assert!(matches!(
        events.last(),
        Some(GameEvent::GameOver {
            level: 3,
            reason: GameOverReason::TimeUp
        })
    ));

    // Further ticks do nothing on a closed session
    assert!(!engine.tick());
}

#[test]
fn time_up_keeps_score_and_resets_streak() {
    let store = MemoryStore::new();
    let mut state = GameState::new();
    state.unlocked_level = 4;
    state.streak = 2;
    ProgressStore::new(store.clone()).save(&state).unwrap();

    let (mut engine, clock) = engine_with(store.clone());
    assert!(engine.select_level(4));
    let id = safe_ids(&engine, 1)[0];
    engine.remove_block(id);
    let score = engine.session().score;
    assert!(score > 0);

    clock.advance_secs(100.0);
    engine.advance();
    assert!(engine.session().is_game_over());
    assert_eq!(engine.session().score, score);
    assert_eq!(engine.progress().streak, 0);
    assert_eq!(ProgressStore::new(store).load().streak, 0);
}

#[test]
fn retry_cancels_pending_countdown() {
    let store = MemoryStore::new();
    seed_progress(&store, 3);
    let (mut engine, clock) = engine_with(store);
    engine.select_level(3);

    clock.advance_ms(1500.0);
    engine.advance();
    assert_eq!(engine.session().time_remaining, Some(119));
    let old_token = engine.session().token;

    engine.retry_level();
    assert_ne!(engine.session().token, old_token);
    assert_eq!(engine.session().time_remaining, Some(120));

    // The old session's tick would have landed at +2000
    clock.advance_ms(900.0);
    assert_eq!(engine.advance(), 0);
    assert_eq!(engine.session().time_remaining, Some(120));

    clock.advance_ms(100.0);
    assert_eq!(engine.advance(), 1);
    assert_eq!(engine.session().time_remaining, Some(119));
}

#[test]
fn completing_stops_the_countdown() {
    let store = MemoryStore::new();
    seed_progress(&store, 3);
    let (mut engine, clock) = engine_with(store);
    engine.select_level(3);
    clear_level(&mut engine);
    assert!(engine.session().is_complete());
    assert_eq!(engine.next_task_due().map(|d| d > START_MS), Some(true));

    clock.advance_secs(500.0);
    engine.advance();
    assert!(engine.session().is_complete());
    assert_eq!(engine.session().time_remaining, Some(120));
}

#[test]
fn fast_timed_clear_earns_bonus_and_speed_achievement() {
    let store = MemoryStore::new();
    seed_progress(&store, 3);
    let (mut engine, clock) = engine_with(store);
    engine.select_level(3);

    let ids = safe_ids(&engine, 7);
    let running: u64 = ids
        .iter()
        .map(|id| {
            let block = engine.session().block(*id).unwrap();
            rules::block_score(block.layer, engine.current_level().difficulty)
        })
        .sum();

    clock.advance_secs(10.0);
    for id in ids {
        engine.remove_block(id);
    }

    let expected = (running as f64 * (1.0 + 110.0 / 120.0)).floor() as u64;
    let session = engine.session();
    assert!(session.is_complete());
    assert_eq!(session.score, expected);
    assert!((session.time_bonus - (1.0 + 110.0 / 120.0)).abs() < 1e-9);
    assert!(engine.progress().achievement(SPEED_DEMON).unwrap().unlocked);
    assert_eq!(engine.progress().best_score(3), Some(expected));
    assert_eq!(engine.progress().unlocked_level, 4);
}

#[test]
fn slow_timed_clear_gets_no_bonus() {
    let store = MemoryStore::new();
    seed_progress(&store, 3);
    let (mut engine, clock) = engine_with(store);
    engine.select_level(3);
    let ids = safe_ids(&engine, 7);

    // Host never drained the countdown, so the session is still running
    clock.advance_secs(130.0);
    for id in ids {
        engine.remove_block(id);
    }
    assert!(engine.session().is_complete());
    assert_eq!(engine.session().time_bonus, 1.0);
    assert!(!engine.progress().achievement(SPEED_DEMON).unwrap().unlocked);
}

#[test]
fn stale_notification_clear_keeps_newer_notification() {
    let (mut engine, clock) = engine_with(MemoryStore::new());
    let ids = safe_ids(&engine, 3);

    engine.remove_block(ids[0]);
    assert_eq!(engine.notification().map(|a| a.id.as_str()), Some(FIRST_BLOCK));

    clock.advance_secs(2.0);
    engine.remove_block(ids[1]);
    engine.remove_block(ids[2]);
    assert!(engine.session().is_complete());
    assert_eq!(engine.notification().map(|a| a.id.as_str()), Some(NO_MISTAKES));

    // First unlock's clear falls due now but no longer owns the notification
    clock.advance_secs(1.0);
    assert_eq!(engine.advance(), 0);
    assert_eq!(engine.notification().map(|a| a.id.as_str()), Some(NO_MISTAKES));

    clock.advance_secs(2.0);
    assert_eq!(engine.advance(), 1);
    assert!(engine.notification().is_none());
    assert!(engine.drain_events().contains(&GameEvent::NotificationCleared));
}

#[test]
fn dismissed_notification_is_not_cleared_twice() {
    let (mut engine, clock) = engine_with(MemoryStore::new());
    let id = safe_ids(&engine, 1)[0];
    engine.remove_block(id);
    engine.drain_events();

    engine.dismiss_notification();
    assert!(engine.notification().is_none());
    clock.advance_secs(5.0);
    assert_eq!(engine.advance(), 0);
    assert_eq!(engine.drain_events(), vec![GameEvent::NotificationCleared]);
}

#[test]
fn failed_writes_do_not_stop_play() {
    let store = FlakyStore::default();
    store.fail_writes.set(true);
    let (mut engine, _) = engine_with(store.clone());

    clear_level(&mut engine);
    assert!(engine.session().is_complete());
    assert_eq!(engine.progress().unlocked_level, 2);
    assert_eq!(engine.submit_score("Ada"), None);

    // Nothing reached the backend
    assert!(store.inner.is_empty());
    assert!(engine.next_level());
    assert!(engine.session().is_running());
}

#[test]
fn progress_survives_restart() {
    let store = MemoryStore::new();
    let (mut engine, _) = engine_with(store.clone());
    clear_level(&mut engine);
    assert!(engine.next_level());

    // Game over commits the current level along with everything else
    let bad = engine
        .session()
        .blocks
        .iter()
        .find(|b| b.vulnerable)
        .map(|b| b.id)
        .unwrap();
    engine.remove_block(bad);
    let before = engine.progress().clone();

    let (restarted, _) = engine_with(store);
    assert_eq!(restarted.progress(), &before);
    assert_eq!(restarted.current_level().id, 2);
    assert!(restarted.session().is_running());
}

#[test]
fn skipping_ahead_resumes_at_the_skipped_level() {
    let store = MemoryStore::new();
    let (mut engine, _) = engine_with(store.clone());
    assert!(engine.next_level());
    let bad = engine
        .session()
        .blocks
        .iter()
        .find(|b| b.vulnerable)
        .map(|b| b.id)
        .unwrap();
    engine.remove_block(bad);
    let before = engine.progress().clone();
    assert_eq!((before.current_level, before.unlocked_level), (2, 1));

    let (restarted, _) = engine_with(store);
    assert_eq!(restarted.progress(), &before);
    assert_eq!(restarted.current_level().id, 2);
}

#[test]
fn corrupt_save_starts_fresh() {
    let mut store = MemoryStore::new();
    store.set("tower_pull_game_state", "\u{0}garbage").unwrap();
    let (engine, _) = engine_with(store);
    assert_eq!(engine.progress(), &GameState::new());
    assert_eq!(engine.current_level().id, 1);
}

#[test]
fn reset_game_wipes_progress() {
    let store = MemoryStore::new();
    let (mut engine, _) = engine_with(store.clone());
    clear_level(&mut engine);
    engine.next_level();
    engine
        .store_mut()
        .add_leaderboard_entry(tower_pull::LeaderboardEntry::new("a", 1, 1, 0.0))
        .unwrap();

    engine.reset_game();
    assert_eq!(engine.progress().unlocked_level, 1);
    assert_eq!(engine.progress().total_score, 0);
    assert_eq!(engine.current_level().id, 1);
    assert!(engine.session().is_running());
    assert!(engine.notification().is_none());
    assert!(store.get("tower_pull_game_state").unwrap().is_none());
    // Leaderboard is kept
    assert_eq!(engine.leaderboard().len(), 1);
}

#[test]
fn full_campaign_progression() {
    let (mut engine, _) = engine_with(MemoryStore::new());
    let mut last_unlocked = engine.progress().unlocked_level;

    for level_id in 1..=8 {
        assert_eq!(engine.current_level().id, level_id);
        clear_level(&mut engine);
        assert!(engine.session().is_complete(), "level {level_id} not cleared");

        let unlocked = engine.progress().unlocked_level;
        assert!(unlocked >= last_unlocked);
        assert!(unlocked <= 8);
        last_unlocked = unlocked;

        let moved = engine.next_level();
        assert_eq!(moved, level_id < 8);
    }

    let progress = engine.progress();
    assert_eq!(progress.unlocked_level, 8);
    assert_eq!(progress.streak, 8);
    assert_eq!(progress.level_scores.len(), 8);
    assert!(progress.achievement(LEVEL_3).unwrap().unlocked);
    assert!(progress.achievement(LEVEL_5).unwrap().unlocked);
    assert!(progress.achievement(STREAK_5).unwrap().unlocked);
    // Completed count is measured as unlocked - 1, which tops out at 7
    let level_8 = progress.achievement(LEVEL_8).unwrap();
    assert_eq!(level_8.progress, 7);
    assert!(!level_8.unlocked);
    // Clock never moved, so every timed level was a speed run
    assert!(progress.achievement(SPEED_DEMON).unwrap().unlocked);
    let total: u64 = progress.level_scores.values().sum();
    assert_eq!(progress.total_score, total);
}

#[test]
fn replaying_a_level_keeps_the_best_score() {
    let store = MemoryStore::new();
    seed_progress(&store, 3);
    let (mut engine, clock) = engine_with(store);

    engine.select_level(3);
    clear_level(&mut engine);
    let fast = engine.session().score;

    engine.retry_level();
    clock.advance_secs(100.0);
    clear_level(&mut engine);
    let slow = engine.session().score;

    assert!(slow < fast);
    assert_eq!(engine.progress().best_score(3), Some(fast));
    assert_eq!(engine.progress().total_score, fast + slow);
    assert_eq!(engine.progress().unlocked_level, 4);
}
