//! Game session engine
//!
//! Owns the live [`LevelSession`] and a working copy of the player's
//! [`GameState`]. UI code calls the operations below, reads snapshots, and
//! drains [`GameEvent`]s. Level-ending transitions commit progress through
//! the injected store.
//!
//! Phases: `InProgress → LevelComplete | GameOver`. Terminal sessions ignore
//! further removals and ticks until a new session is started.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::rules::{self, CompletionFlags};
use super::state::{GameEvent, GameOverReason, GamePhase, IdAllocator, LevelSession};
use super::timers::{Task, TaskQueue};
use super::tower;
use crate::achievements::Achievement;
use crate::consts::{NOTIFICATION_DURATION_MS, TICK_INTERVAL_MS};
use crate::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::levels::{self, LevelDefinition};
use crate::persistence::{KeyValueStore, ProgressStore, StoreKeys};
use crate::platform::Clock;
use crate::progress::{GameState, PlayerStats};
use crate::settings;

/// Engine tuning
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Tower RNG seed (None = seed from the clock)
    pub seed: Option<u64>,
    /// Countdown step in ms
    pub tick_interval_ms: f64,
    /// How long an unlock notification stays up, in ms
    pub notification_ms: f64,
    pub keys: StoreKeys,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            tick_interval_ms: TICK_INTERVAL_MS,
            notification_ms: NOTIFICATION_DURATION_MS,
            keys: StoreKeys::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}

/// The most recent unlock, shown until its clear task fires
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub achievement: Achievement,
    pub shown_at: f64,
    #[serde(skip)]
    token: u64,
}

/// Owned copy of everything the UI draws
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub session: LevelSession,
    pub progress: GameState,
    pub notification: Option<Achievement>,
    pub stats: PlayerStats,
}

pub struct GameEngine<S, C> {
    store: ProgressStore<S>,
    clock: C,
    config: EngineConfig,
    rng: Pcg32,
    ids: IdAllocator,
    progress: GameState,
    session: LevelSession,
    tasks: TaskQueue,
    next_token: u64,
    notification: Option<Notification>,
    notification_token: u64,
    events: Vec<GameEvent>,
}

impl<S: KeyValueStore, C: Clock> GameEngine<S, C> {
    pub fn new(backend: S, clock: C) -> Self {
        Self::with_config(backend, clock, EngineConfig::default())
    }

    /// Load progress and start the player's current level
    pub fn with_config(backend: S, clock: C, mut config: EngineConfig) -> Self {
        config.tick_interval_ms = config.tick_interval_ms.max(1.0);
        let store = ProgressStore::with_keys(backend, config.keys.clone());
        let progress = store.load();
        let now = clock.now_ms();
        let seed = config.seed.unwrap_or(now as u64);
        let level = *levels::get(progress.current_level).unwrap_or(levels::first());
        log::info!("Engine starting at level {} (seed {})", level.id, seed);

        let mut engine = Self {
            store,
            clock,
            config,
            rng: Pcg32::seed_from_u64(seed),
            ids: IdAllocator::new(),
            progress,
            session: LevelSession::new(level, Vec::new(), now, 0),
            tasks: TaskQueue::new(),
            next_token: 0,
            notification: None,
            notification_token: 0,
            events: Vec::new(),
        };
        engine.start_level(&level);
        engine
    }

    fn fresh_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    /// Replace the session with a fresh attempt at `level`
    pub fn start_level(&mut self, level: &LevelDefinition) {
        self.tasks.cancel_countdowns();
        let token = self.fresh_token();
        let blocks = tower::generate(level, &mut self.rng, &mut self.ids);
        let now = self.clock.now_ms();
        self.session = LevelSession::new(*level, blocks, now, token);

        if level.is_timed() {
            self.tasks.schedule(
                now + self.config.tick_interval_ms,
                Task::CountdownTick { session: token },
            );
        }

        log::info!("Level {} \"{}\" started", level.id, level.name);
        self.events.push(GameEvent::LevelStarted { level: level.id });
    }

    /// Pull a block. Returns false when nothing happened (unknown id, already
    /// removed, or the session is over).
    pub fn remove_block(&mut self, block_id: u32) -> bool {
        if !self.session.is_running() {
            log::debug!("Ignoring removal of {}: session is over", block_id);
            return false;
        }
        let Some(index) = self.session.block_index(block_id) else {
            log::debug!("Ignoring removal of unknown block {}", block_id);
            return false;
        };

        let block = &self.session.blocks[index];
        if block.removed {
            log::debug!("Ignoring removal of already removed block {}", block_id);
            return false;
        }
        if block.vulnerable {
            log::info!("Vulnerable block {} pulled", block_id);
            self.game_over(GameOverReason::VulnerableBlock);
            return true;
        }

        let points = block.score(self.session.level.difficulty);
        self.session.blocks[index].removed = true;
        self.session.blocks_removed += 1;
        self.session.score += points;
        self.progress.blocks_removed += 1;
        self.events.push(GameEvent::BlockRemoved { block_id, points });

        let unlocked = rules::evaluate_blocks(
            &mut self.progress.achievements,
            self.progress.blocks_removed,
        );
        self.announce(unlocked);

        if self.session.blocks_removed >= self.session.level.target_blocks {
            self.complete_level();
        }
        true
    }

    /// One second of countdown. Only acts on a running, timed session.
    pub fn tick(&mut self) -> bool {
        if !self.session.is_running() {
            return false;
        }
        let Some(remaining) = self.session.time_remaining else {
            return false;
        };

        let remaining = remaining.saturating_sub(1);
        self.session.time_remaining = Some(remaining);
        self.events.push(GameEvent::TimeTicked { remaining });

        if remaining == 0 {
            log::info!("Time up on level {}", self.session.level.id);
            self.game_over(GameOverReason::TimeUp);
        }
        true
    }

    /// Run every queued task that is due by the clock's current time.
    /// Returns how many tasks took effect.
    pub fn advance(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut applied = 0;
        while let Some((due, task)) = self.tasks.pop_due(now) {
            if self.run_task(due, task) {
                applied += 1;
            }
        }
        applied
    }

    fn run_task(&mut self, due: f64, task: Task) -> bool {
        match task {
            Task::CountdownTick { session } => {
                if session != self.session.token {
                    log::debug!("Dropping countdown tick for stale session {}", session);
                    return false;
                }
                self.tick();
                if self.session.is_running() {
                    self.tasks.schedule(
                        due + self.config.tick_interval_ms,
                        Task::CountdownTick { session },
                    );
                }
                true
            }
            Task::ClearNotification { token } => {
                if self.notification.as_ref().map(|n| n.token) != Some(token) {
                    log::debug!("Dropping stale notification clear {}", token);
                    return false;
                }
                self.notification = None;
                self.events.push(GameEvent::NotificationCleared);
                true
            }
        }
    }

    /// Cancel the countdown and retire the session token
    fn stop_countdown(&mut self) {
        self.tasks.cancel_countdowns();
        self.session.token = self.fresh_token();
    }

    fn game_over(&mut self, reason: GameOverReason) {
        self.session.phase = GamePhase::GameOver;
        self.session.game_over_reason = Some(reason);
        self.stop_countdown();

        if self.progress.streak > 0 {
            self.progress.streak = 0;
        }

        log::info!("Game over on level {}: {:?}", self.session.level.id, reason);
        self.commit();
        self.events.push(GameEvent::GameOver {
            level: self.session.level.id,
            reason,
        });
    }

    fn complete_level(&mut self) {
        let level = self.session.level;
        let elapsed_secs = ((self.clock.now_ms() - self.session.started_at) / 1000.0).max(0.0);
        let bonus = rules::time_bonus(level.time_limit, elapsed_secs);
        let final_score = rules::final_score(self.session.score, &bonus);

        self.session.score = final_score;
        self.session.time_bonus = bonus.multiplier;
        self.session.phase = GamePhase::LevelComplete;
        self.stop_countdown();

        self.progress.total_score += final_score;
        let flags = CompletionFlags {
            speed_run: bonus.speed_run,
            perfect_run: self.session.mistakes == 0,
        };
        let mut unlocked = rules::evaluate_completion(&mut self.progress.achievements, flags);

        let new_best = self.progress.record_level_score(level.id, final_score);
        self.progress.streak += 1;
        self.progress.unlock_after(level.id);
        let completed = self.progress.levels_completed();
        unlocked.extend(rules::evaluate_levels(
            &mut self.progress.achievements,
            completed,
            self.progress.streak,
        ));

        log::info!(
            "Level {} complete: {} points (x{:.2}), unlocked up to {}",
            level.id,
            final_score,
            bonus.multiplier,
            self.progress.unlocked_level
        );
        self.commit();
        self.events.push(GameEvent::LevelCompleted {
            level: level.id,
            final_score,
            time_bonus: bonus.multiplier,
            new_best,
        });
        self.announce(unlocked);
    }

    /// Best-effort save; gameplay carries on if the write fails
    fn commit(&mut self) {
        self.progress.last_played = Some(self.clock.now_ms());
        if let Err(e) = self.store.save(&self.progress) {
            log::warn!("Could not save progress: {}", e);
        }
    }

    /// Raise notifications for newly unlocked achievements. A newer unlock
    /// takes over the notification and its clear timer.
    fn announce(&mut self, unlocked: Vec<String>) {
        if unlocked.is_empty() {
            return;
        }
        let now = self.clock.now_ms();
        for id in unlocked {
            log::info!("Achievement unlocked: {}", id);
            if let Some(achievement) = self.progress.achievement(&id) {
                self.notification_token += 1;
                let token = self.notification_token;
                self.notification = Some(Notification {
                    achievement: achievement.clone(),
                    shown_at: now,
                    token,
                });
                self.tasks.schedule(
                    now + self.config.notification_ms,
                    Task::ClearNotification { token },
                );
            }
            self.events.push(GameEvent::AchievementUnlocked { id });
        }
    }

    /// Hide the current notification now instead of waiting for its timer
    pub fn dismiss_notification(&mut self) {
        if self.notification.take().is_some() {
            self.tasks.cancel_notification_clears();
            self.events.push(GameEvent::NotificationCleared);
        }
    }

    pub fn retry_level(&mut self) {
        let level = self.session.level;
        self.start_level(&level);
    }

    /// Start `level_id` if it is unlocked. Returns false if rejected.
    pub fn select_level(&mut self, level_id: u32) -> bool {
        let Some(level) = levels::get(level_id) else {
            log::debug!("Ignoring selection of unknown level {}", level_id);
            return false;
        };
        if level_id > self.progress.unlocked_level {
            log::debug!(
                "Ignoring selection of locked level {} (unlocked {})",
                level_id,
                self.progress.unlocked_level
            );
            return false;
        }
        self.progress.current_level = level_id;
        self.start_level(level);
        true
    }

    /// Move to the following catalog level. Returns false on the last level.
    pub fn next_level(&mut self) -> bool {
        let Some(level) = levels::get(self.session.level.id + 1) else {
            log::debug!("No level after {}", self.session.level.id);
            return false;
        };
        self.progress.current_level = level.id;
        self.start_level(level);
        true
    }

    /// Wipe saved progress and start over at level 1
    pub fn reset_game(&mut self) {
        if let Err(e) = self.store.reset() {
            log::warn!("Could not clear saved progress: {}", e);
        }
        self.progress = GameState::new();
        self.notification = None;
        self.tasks.cancel_notification_clears();
        self.start_level(levels::first());
    }

    /// Record the finished attempt on the leaderboard. Only once per
    /// completed session; returns the rank reached.
    pub fn submit_score(&mut self, player_name: &str) -> Option<usize> {
        if !self.session.is_complete() || self.session.submitted {
            return None;
        }
        self.session.submitted = true;
        let entry = LeaderboardEntry::new(
            settings::sanitize_name(player_name),
            self.session.score,
            self.session.level.id,
            self.clock.now_ms(),
        );
        match self.store.add_leaderboard_entry(entry) {
            Ok(rank) => rank,
            Err(e) => {
                log::warn!("Could not save leaderboard: {}", e);
                None
            }
        }
    }

    pub fn session(&self) -> &LevelSession {
        &self.session
    }

    pub fn progress(&self) -> &GameState {
        &self.progress
    }

    pub fn current_level(&self) -> &LevelDefinition {
        &self.session.level
    }

    pub fn notification(&self) -> Option<&Achievement> {
        self.notification.as_ref().map(|n| &n.achievement)
    }

    pub fn stats(&self) -> PlayerStats {
        self.progress.stats()
    }

    pub fn leaderboard(&self) -> Leaderboard {
        self.store.load_leaderboard()
    }

    pub fn store(&self) -> &ProgressStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProgressStore<S> {
        &mut self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// When the next queued task falls due (Unix ms)
    pub fn next_task_due(&self) -> Option<f64> {
        self.tasks.next_due()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            session: self.session.clone(),
            progress: self.progress.clone(),
            notification: self.notification().cloned(),
            stats: self.stats(),
        }
    }

    /// Take all events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
