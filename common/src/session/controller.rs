use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::GameConfig;
use crate::games::SessionRng;
use crate::games::snake::{
    DeathReason, Direction, FieldSize, MapGenerator, Point, RuleTable, SettingKind, Settings,
    SimulationStatus, Snake, SnakeGameState, SpawnPoint, Theme, TickOutcome,
};
use crate::id_generator::generate_room_code;
use crate::multiplayer::{
    ChannelError, GrpcRoomChannel, MultiplayerSync, PlayerSnapshot, RemoteOpponentView, RoomChannel,
    RoomSettings,
};
use crate::{RoomCode, log, log_warn};
use super::clock::{ClockEvent, ClockKind, SimulationClock};
use super::error::SessionError;
use super::score_store::{FileScoreStore, LeaderboardEntry, ScoreStore};

const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// Everything that lives and dies with one run.
#[derive(Clone, Debug)]
pub struct GameSession {
    pub settings: Settings,
    pub state: SnakeGameState,
    pub remaining_seconds: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionResult {
    pub score: u32,
    pub reason: DeathReason,
    pub new_high_score: bool,
}

/// Read-only view handed to the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSnapshot {
    pub theme: Theme,
    pub mode_label: String,
    pub field_size: FieldSize,
    pub cell_size: f32,
    pub snake: Vec<Point>,
    pub food: Option<Point>,
    pub poison: Option<Point>,
    pub obstacles: Vec<Point>,
    pub score: u32,
    pub time_display: String,
    pub opponent: Option<RemoteOpponentView>,
    pub status: SimulationStatus,
    pub end_reason: Option<DeathReason>,
}

pub fn format_remaining(remaining_seconds: Option<u32>) -> String {
    match remaining_seconds {
        Some(seconds) => format!("{:02}:{:02}", seconds / 60, seconds % 60),
        None => "--:--".to_string(),
    }
}

pub struct SessionController<S: ScoreStore, C: RoomChannel> {
    settings: Settings,
    session: Option<GameSession>,
    tick_clock: SimulationClock,
    countdown_clock: SimulationClock,
    events: mpsc::UnboundedReceiver<ClockEvent>,
    scores: S,
    multiplayer: Option<MultiplayerSync<C>>,
    rng: SessionRng,
    last_result: Option<SessionResult>,
}

impl SessionController<FileScoreStore, GrpcRoomChannel> {
    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(
            config.settings,
            FileScoreStore::new(config.scores_file.clone()),
            SessionRng::from_random(),
        )
    }

    /// Opens a stream to the room server named in the config.
    pub async fn connect_room_server(config: &GameConfig) -> Result<Arc<GrpcRoomChannel>, SessionError> {
        let address = config.multiplayer.server_address.clone();
        let channel = GrpcRoomChannel::connect(address.clone())
            .await
            .inspect_err(|e| log_warn!("Room server {} unreachable: {}", address, e))?;
        Ok(Arc::new(channel))
    }
}

impl<S: ScoreStore, C: RoomChannel> SessionController<S, C> {
    pub fn new(settings: Settings, scores: S, rng: SessionRng) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        Self {
            settings,
            session: None,
            tick_clock: SimulationClock::new(ClockKind::Tick, events_tx.clone()),
            countdown_clock: SimulationClock::new(ClockKind::Countdown, events_tx),
            events,
            scores,
            multiplayer: None,
            rng,
            last_result: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn scores(&self) -> &S {
        &self.scores
    }

    pub fn last_result(&self) -> Option<SessionResult> {
        self.last_result
    }

    pub fn room_code(&self) -> Option<&RoomCode> {
        self.multiplayer.as_ref().map(|sync| sync.code())
    }

    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.state.is_running())
    }

    pub fn update_settings(&mut self, f: impl FnOnce(&mut Settings)) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(SessionError::SessionActive);
        }
        let mut updated = self.settings;
        f(&mut updated);
        if self.multiplayer.is_some()
            && RoomSettings::from_settings(&updated) != RoomSettings::from_settings(&self.settings)
        {
            return Err(SessionError::InRoom);
        }
        self.settings = updated;
        Ok(())
    }

    pub fn advance_setting(&mut self, kind: SettingKind) -> Result<(), SessionError> {
        self.update_settings(|s| s.advance(kind))
    }

    pub fn retreat_setting(&mut self, kind: SettingKind) -> Result<(), SessionError> {
        self.update_settings(|s| s.retreat(kind))
    }

    pub fn high_score(&self) -> Result<u32, SessionError> {
        self.scores.get_high_score().map_err(SessionError::Storage)
    }

    pub fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, SessionError> {
        self.scores.get_leaderboard().map_err(SessionError::Storage)
    }

    /// Opens a room with the current settings and waits there as player one.
    pub async fn create_room(&mut self, channel: Arc<C>) -> Result<RoomCode, SessionError> {
        if self.is_active() {
            return Err(SessionError::SessionActive);
        }
        let code = generate_room_code();
        let settings = RoomSettings::from_settings(&self.settings);
        let sync = MultiplayerSync::create(channel, code.clone(), settings)
            .await
            .inspect_err(|e| log_warn!("Creating room {} failed: {}", code, e))?;
        self.multiplayer = Some(sync);
        Ok(code)
    }

    /// Joins as player two and adopts the host's rules.
    pub async fn join_room(&mut self, channel: Arc<C>, code: &str) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(SessionError::SessionActive);
        }
        let code = RoomCode::parse(code).ok_or_else(|| ChannelError::InvalidRoomCode(code.to_string()))?;
        let (sync, room_settings) = MultiplayerSync::join(channel, code.clone())
            .await
            .inspect_err(|e| log_warn!("Joining room {} failed: {}", code, e))?;
        room_settings.apply_to(&mut self.settings);
        self.multiplayer = Some(sync);
        Ok(())
    }

    /// Starts once the peer shows up active. A channel failure abandons multiplayer.
    pub async fn await_opponent_and_start(&mut self) -> Result<(), SessionError> {
        let sync = self.multiplayer.as_mut().ok_or(SessionError::NotInRoom)?;
        if let Err(e) = sync.wait_for_active_opponent().await {
            log_warn!("Leaving multiplayer: {}", e);
            self.multiplayer = None;
            return Err(e.into());
        }
        self.start()
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(SessionError::SessionActive);
        }

        let settings = self.settings;
        let field = settings.field_size();
        let spawn = match &self.multiplayer {
            Some(sync) => SpawnPoint::for_slot(sync.slot(), &field),
            None => SpawnPoint::single_player(&field),
        };

        let mut obstacles = if RuleTable::policy(settings.mode, settings.map).uses_map_layout {
            MapGenerator::generate(settings.map, &field, &mut self.rng)
        } else {
            HashSet::new()
        };
        MapGenerator::clear_spawn_area(&mut obstacles, &field);
        for segment in Snake::new(spawn.head, spawn.direction).body {
            obstacles.remove(&segment);
        }

        let mut state = SnakeGameState::new(&settings, spawn, obstacles, &mut self.rng);
        state.start();
        let tick_interval = state.tick_interval();

        self.session = Some(GameSession {
            settings,
            state,
            remaining_seconds: settings.time_limit.seconds(),
        });
        self.last_result = None;

        self.tick_clock.start(tick_interval);
        if settings.time_limit.seconds().is_some() {
            self.countdown_clock.start(COUNTDOWN_PERIOD);
        } else {
            self.countdown_clock.stop();
        }

        log!(
            "Session started: {} on {} ({}, {}, tick {}ms)",
            settings.mode.label(),
            settings.map.label(),
            settings.difficulty.label(),
            settings.grid_size.label(),
            tick_interval.as_millis()
        );
        self.publish_local();
        Ok(())
    }

    pub fn set_direction(&mut self, direction: Direction) {
        if let Some(session) = self.session.as_mut() {
            session.state.set_direction(direction);
        }
    }

    pub async fn next_event(&mut self) -> Option<ClockEvent> {
        self.events.recv().await
    }

    /// Applies one clock event. Returns the result when it ended the session.
    pub fn handle_event(&mut self, event: ClockEvent) -> Option<SessionResult> {
        match event.kind {
            ClockKind::Tick if self.tick_clock.is_current(&event) => self.on_tick(),
            ClockKind::Countdown if self.countdown_clock.is_current(&event) => self.on_countdown(),
            _ => None,
        }
    }

    pub async fn run_until_end(&mut self) -> Option<SessionResult> {
        while self.is_active() {
            let event = self.next_event().await?;
            if let Some(result) = self.handle_event(event) {
                return Some(result);
            }
        }
        None
    }

    /// Abandons the run without recording a score and leaves any room.
    pub fn exit(&mut self) {
        self.tick_clock.stop();
        self.countdown_clock.stop();
        if let Some(session) = self.session.as_mut()
            && session.state.end(DeathReason::Exited)
        {
            log!("Session exited at score {}", session.state.score());
        }
        if let Some(sync) = self.multiplayer.take() {
            log!("Left room {}", sync.code());
        }
    }

    pub fn render_snapshot(&self, canvas_px: u32) -> Option<RenderSnapshot> {
        let session = self.session.as_ref()?;
        let state = &session.state;
        let mode_label = match &self.multiplayer {
            Some(sync) => format!("MULTIPLAYER ({})", sync.code()),
            None => format!("{} ({})", session.settings.mode.label(), session.settings.difficulty.label()),
        };
        let mut obstacles: Vec<Point> = state.obstacles.iter().copied().collect();
        obstacles.sort_by_key(|p| (p.y, p.x));

        Some(RenderSnapshot {
            theme: self.settings.theme,
            mode_label,
            field_size: state.field_size,
            cell_size: canvas_px as f32 / state.field_size.width as f32,
            snake: state.snake.segments(),
            food: state.food,
            poison: state.poison,
            obstacles,
            score: state.score(),
            time_display: format_remaining(session.remaining_seconds),
            opponent: self.multiplayer.as_ref().map(|sync| sync.opponent_view()),
            status: state.status(),
            end_reason: state.end_reason(),
        })
    }

    fn on_tick(&mut self) -> Option<SessionResult> {
        let session = self.session.as_mut()?;
        match session.state.update(&mut self.rng) {
            TickOutcome::Ended(reason) => return Some(self.finish(reason)),
            TickOutcome::Ate {
                new_tick_interval: Some(interval),
                ..
            } => {
                log!(
                    "Campaign speed-up at score {}: tick {}ms",
                    session.state.score(),
                    interval.as_millis()
                );
                self.tick_clock.reschedule(interval);
            }
            _ => {}
        }
        self.publish_local();
        None
    }

    fn on_countdown(&mut self) -> Option<SessionResult> {
        let remaining = self.session.as_mut()?.remaining_seconds.as_mut()?;
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            return Some(self.finish(DeathReason::TimeExpired));
        }
        None
    }

    fn finish(&mut self, reason: DeathReason) -> SessionResult {
        self.tick_clock.stop();
        self.countdown_clock.stop();

        let score = match self.session.as_mut() {
            Some(session) => {
                session.state.end(reason);
                session.state.score()
            }
            None => 0,
        };

        let new_high_score = match self.multiplayer {
            Some(_) => {
                self.publish_local();
                false
            }
            None => self.record_score(score),
        };

        log!("Session ended: {} with score {}", reason.label(), score);
        let result = SessionResult {
            score,
            reason,
            new_high_score,
        };
        self.last_result = Some(result);
        result
    }

    /// Storage failures are logged and otherwise ignored so a finished run is never lost.
    fn record_score(&self, score: u32) -> bool {
        let new_high_score = match self.scores.get_high_score() {
            Ok(high) if score > high => match self.scores.set_high_score(score) {
                Ok(()) => {
                    log!("New high score: {}", score);
                    true
                }
                Err(e) => {
                    log_warn!("Failed to store high score: {}", e);
                    false
                }
            },
            Ok(_) => false,
            Err(e) => {
                log_warn!("Failed to read high score: {}", e);
                false
            }
        };

        let details = self.settings.leaderboard_details();
        if let Err(e) = self.scores.append_leaderboard_entry(score, &details) {
            log_warn!("Failed to update leaderboard: {}", e);
        }
        new_high_score
    }

    fn publish_local(&self) {
        if let (Some(sync), Some(session)) = (&self.multiplayer, &self.session) {
            sync.publish(PlayerSnapshot {
                segments: session.state.snake.segments(),
                score: session.state.score(),
                active: session.state.is_running(),
            });
        }
    }
}
