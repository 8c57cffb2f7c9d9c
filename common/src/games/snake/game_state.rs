use std::collections::HashSet;
use std::time::Duration;

use crate::PlayerSlot;
use crate::games::SessionRng;
use super::placement::RandomPlacement;
use super::rules::{POISON_PENALTY, RulePolicy, RuleTable};
use super::settings::{Difficulty, Mode, Settings};
use super::snake::Snake;
use super::types::{DeathReason, Direction, FieldSize, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationStatus {
    Idle,
    Running,
    Ended,
}

/// What a single tick did, for the controller to react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Skipped,
    Moved,
    Ate {
        points: u32,
        new_tick_interval: Option<Duration>,
    },
    Poisoned {
        penalty: u32,
        shrunk: bool,
    },
    Ended(DeathReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnPoint {
    pub head: Point,
    pub direction: Direction,
}

impl SpawnPoint {
    pub fn single_player(field: &FieldSize) -> Self {
        Self {
            head: field.center(),
            direction: Direction::Right,
        }
    }

    /// Player one starts near the left edge heading right, player two mirrored on the right.
    pub fn for_slot(slot: PlayerSlot, field: &FieldSize) -> Self {
        let row = field.height / 2;
        match slot {
            PlayerSlot::PlayerOne => Self {
                head: Point::new(5, row),
                direction: Direction::Right,
            },
            PlayerSlot::PlayerTwo => Self {
                head: Point::new(field.width - 6, row),
                direction: Direction::Left,
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct SnakeGameState {
    pub snake: Snake,
    pub food: Option<Point>,
    pub poison: Option<Point>,
    pub obstacles: HashSet<Point>,
    pub field_size: FieldSize,
    mode: Mode,
    difficulty: Difficulty,
    policy: RulePolicy,
    score: u32,
    steps: u64,
    tick_interval: Duration,
    status: SimulationStatus,
    end_reason: Option<DeathReason>,
}

impl SnakeGameState {
    /// Builds an idle simulation. `obstacles` must already be generated and swept clear of the spawn.
    pub fn new(
        settings: &Settings,
        spawn: SpawnPoint,
        obstacles: HashSet<Point>,
        rng: &mut SessionRng,
    ) -> Self {
        let field_size = settings.field_size();
        let policy = RuleTable::policy(settings.mode, settings.map);

        let mut state = Self {
            snake: Snake::new(spawn.head, spawn.direction),
            food: None,
            poison: None,
            obstacles,
            field_size,
            mode: settings.mode,
            difficulty: settings.difficulty,
            policy,
            score: 0,
            steps: 0,
            tick_interval: RuleTable::initial_tick_interval(settings.mode, settings.map, settings.difficulty),
            status: SimulationStatus::Idle,
            end_reason: None,
        };

        state.food = state.place_item(rng);
        if policy.has_poison_item {
            state.poison = state.place_item(rng);
        }
        state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn policy(&self) -> &RulePolicy {
        &self.policy
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SimulationStatus::Running
    }

    pub fn end_reason(&self) -> Option<DeathReason> {
        self.end_reason
    }

    pub fn start(&mut self) -> bool {
        if self.status != SimulationStatus::Idle {
            return false;
        }
        self.status = SimulationStatus::Running;
        true
    }

    /// Moves to `Ended`. Returns `false` if the simulation had already ended.
    pub fn end(&mut self, reason: DeathReason) -> bool {
        if self.status == SimulationStatus::Ended {
            return false;
        }
        self.status = SimulationStatus::Ended;
        self.end_reason = Some(reason);
        true
    }

    pub fn set_direction(&mut self, direction: Direction) {
        if self.status == SimulationStatus::Running {
            self.snake.buffer_direction(direction);
        }
    }

    pub fn update(&mut self, rng: &mut SessionRng) -> TickOutcome {
        if self.status != SimulationStatus::Running {
            return TickOutcome::Skipped;
        }
        self.steps += 1;

        self.snake.commit_direction();
        let head = match self.resolve_boundary(self.snake.head().step(self.snake.direction)) {
            Ok(head) => head,
            Err(reason) => return self.finish(reason),
        };

        if let Err(reason) = self.check_hazards(head) {
            return self.finish(reason);
        }

        if self.poison == Some(head) {
            return self.apply_poison(rng);
        }

        self.snake.push_head(head);

        if self.food == Some(head) {
            self.eat(rng)
        } else {
            self.snake.pop_tail();
            TickOutcome::Moved
        }
    }

    fn in_grace_period(&self) -> bool {
        RuleTable::in_grace_period(self.steps)
    }

    fn resolve_boundary(&self, projected: Point) -> Result<Point, DeathReason> {
        if self.field_size.contains(projected) {
            return Ok(projected);
        }
        if self.policy.wraps || self.in_grace_period() {
            return Ok(self.field_size.wrap(projected));
        }
        Err(DeathReason::WallCollision)
    }

    fn check_hazards(&self, head: Point) -> Result<(), DeathReason> {
        if self.in_grace_period() {
            return Ok(());
        }
        if self.snake.occupies(head) {
            return Err(DeathReason::SelfCollision);
        }
        if self.obstacles.contains(&head) {
            return Err(DeathReason::ObstacleCollision);
        }
        Ok(())
    }

    /// The snake does not move on a poisoned tick.
    fn apply_poison(&mut self, rng: &mut SessionRng) -> TickOutcome {
        let before = self.score;
        self.score = self.score.saturating_sub(POISON_PENALTY);
        self.poison = None;
        self.poison = self.place_item(rng);
        let shrunk = self.snake.shrink();
        TickOutcome::Poisoned {
            penalty: before - self.score,
            shrunk,
        }
    }

    fn eat(&mut self, rng: &mut SessionRng) -> TickOutcome {
        let points = self.policy.points_per_food(self.difficulty);
        let previous_score = self.score;
        self.score += points;

        let new_tick_interval = if self.policy.speeds_up_on_milestones
            && RuleTable::crossed_milestone(previous_score, self.score)
        {
            let interval = RuleTable::campaign_tick_interval(self.difficulty, self.score);
            self.tick_interval = interval;
            Some(interval)
        } else {
            None
        };

        self.food = None;
        self.food = self.place_item(rng);

        if self.policy.obstacles_grow_on_eat
            && let Some(obstacle) = self.place_item(rng)
        {
            self.obstacles.insert(obstacle);
        }

        if self.policy.has_poison_item {
            self.poison = None;
            self.poison = self.place_item(rng);
        }

        TickOutcome::Ate {
            points,
            new_tick_interval,
        }
    }

    fn finish(&mut self, reason: DeathReason) -> TickOutcome {
        self.end(reason);
        TickOutcome::Ended(reason)
    }

    fn occupied_cells(&self) -> HashSet<Point> {
        let mut occupied: HashSet<Point> = self.snake.body.iter().copied().collect();
        occupied.extend(self.obstacles.iter().copied());
        occupied.extend(self.food);
        occupied.extend(self.poison);
        occupied
    }

    fn place_item(&self, rng: &mut SessionRng) -> Option<Point> {
        RandomPlacement::place(&self.occupied_cells(), &self.field_size, rng)
    }
}
