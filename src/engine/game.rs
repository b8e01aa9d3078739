use log::{debug, info};
use std::collections::HashSet;
use std::time::{Duration, Instant};

use super::clock::Clock;
use super::guards::{place_guards, RoomSampler};
use super::player::{PlayerState, TimeWarning, WarningFlags};
use crate::error::InputError;
use crate::temple::{Room, RoomGraph, RoomId, Temple};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    AwaitingInput,
    Won,
    LostTime,
    LostCaptured,
    Aborted,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::AwaitingInput)
    }
}

/// Something the presentation layer should narrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    TimeWarning(TimeWarning),
    TimeUp,
    GuardPaidOff { room: RoomId, pendants_left: u32 },
    Captured { room: RoomId },
    Moved { from: RoomId, to: RoomId },
    ArtifactFound,
    Escaped,
    Aborted,
}

/// One entry of the action menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub key: String,
    pub label: String,
    pub destination: RoomId,
    pub destination_name: String,
    pub visited: bool,
    pub artifact_ahead: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRules {
    pub pendants: u32,
    pub time_limit: Duration,
}

/// The temple run state machine.
///
/// Time is wall-clock driven: the countdown runs from [`GameEngine::start`]
/// whether or not the player is making moves. Call [`GameEngine::tick`]
/// regularly while waiting for input so a timeout is noticed.
pub struct GameEngine<C: Clock> {
    graph: RoomGraph,
    guards: HashSet<RoomId>,
    visited: HashSet<RoomId>,
    current: usize,
    player: PlayerState,
    warnings: WarningFlags,
    status: GameStatus,
    clock: C,
    started_at: Option<Instant>,
}

impl<C: Clock> GameEngine<C> {
    pub fn new(graph: RoomGraph, guards: HashSet<RoomId>, rules: GameRules, clock: C) -> Self {
        let current = graph.start_position();
        GameEngine {
            graph,
            guards,
            visited: HashSet::new(),
            current,
            player: PlayerState::new(rules.pendants, rules.time_limit),
            warnings: WarningFlags::default(),
            status: GameStatus::AwaitingInput,
            clock,
            started_at: None,
        }
    }

    /// Builds an engine for `temple`, hiding its guards with `sampler`.
    pub fn from_temple(temple: &Temple, sampler: &mut dyn RoomSampler, clock: C) -> Self {
        let guards = place_guards(&temple.graph, temple.config.temple_guards, sampler);
        let rules = GameRules {
            pendants: temple.config.pendants,
            time_limit: Duration::from_secs(temple.config.time_limit_seconds),
        };
        Self::new(temple.graph.clone(), guards, rules, clock)
    }

    /// Starts the countdown and resolves the start room.
    pub fn start(&mut self) -> Vec<GameEvent> {
        if self.started_at.is_none() {
            self.started_at = Some(self.clock.now());
            info!(
                "temple run started at '{}' with {} guards",
                self.current_room().id,
                self.guards.len()
            );
        }
        self.turn()
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn graph(&self) -> &RoomGraph {
        &self.graph
    }

    #[cfg(test)]
    pub fn guards(&self) -> &HashSet<RoomId> {
        &self.guards
    }

    pub fn visited(&self) -> &HashSet<RoomId> {
        &self.visited
    }

    pub fn current_room(&self) -> &Room {
        self.graph.room(self.current)
    }

    /// Time left on the clock right now, without mutating the player.
    pub fn remaining(&self) -> Duration {
        match self.started_at {
            Some(start) => {
                let elapsed = self.clock.now().saturating_duration_since(start);
                self.player
                    .time_remaining
                    .min(self.player.time_limit.saturating_sub(elapsed))
            }
            None => self.player.time_remaining,
        }
    }

    /// Time check and threshold warnings.
    pub fn tick(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.status.is_terminal() {
            return events;
        }

        self.player.time_remaining = self.remaining();
        if self.player.time_remaining.is_zero() {
            info!("time ran out in '{}'", self.current_room().id);
            self.status = GameStatus::LostTime;
            events.push(GameEvent::TimeUp);
            return events;
        }

        if let Some(warning) = self.warnings.check(self.player.time_remaining) {
            events.push(GameEvent::TimeWarning(warning));
        }
        events
    }

    /// One full turn check: clock, guard, then escape.
    pub fn turn(&mut self) -> Vec<GameEvent> {
        let mut events = self.tick();
        if self.status.is_terminal() {
            return events;
        }
        self.resolve_guard(&mut events);
        if self.status.is_terminal() {
            return events;
        }
        if self.player.has_artifact && self.current == self.graph.start_position() {
            info!("escaped with the artifact after {:?}", self.player.elapsed());
            self.status = GameStatus::Won;
            events.push(GameEvent::Escaped);
        }
        events
    }

    fn resolve_guard(&mut self, events: &mut Vec<GameEvent>) {
        let room = self.current_room().id.clone();
        if !self.guards.contains(&room) || self.visited.contains(&room) {
            return;
        }

        self.player.guards_encountered += 1;
        if self.player.pendants > 0 {
            self.player.pendants -= 1;
            self.guards.remove(&room);
            debug!("paid guard in '{}', {} pendants left", room, self.player.pendants);
            events.push(GameEvent::GuardPaidOff {
                room,
                pendants_left: self.player.pendants,
            });
        } else {
            info!("captured by the guard in '{}'", room);
            self.status = GameStatus::LostCaptured;
            events.push(GameEvent::Captured { room });
        }
    }

    /// The action menu for the current room, in configuration order.
    ///
    /// Every connection gets a number. A `back` connection is also offered
    /// under `b`.
    pub fn choices(&self) -> Vec<Choice> {
        let room = self.current_room();
        let mut choices: Vec<Choice> = room
            .connections
            .iter()
            .enumerate()
            .map(|(i, conn)| self.choice_for((i + 1).to_string(), room.action_label(i), &conn.to))
            .collect();

        if let Some(back) = room.back() {
            choices.push(self.choice_for(String::from("b"), String::from("Go back"), &back.to));
        }
        choices
    }

    fn choice_for(&self, key: String, label: String, destination: &str) -> Choice {
        let destination_name = self
            .graph
            .lookup(destination)
            .map(|r| r.name.clone())
            .unwrap_or_else(|_| destination.to_string());
        Choice {
            key,
            label,
            destination: destination.to_string(),
            destination_name,
            visited: self.visited.contains(destination),
            artifact_ahead: destination == self.graph.artifact_room().id
                && !self.player.has_artifact,
        }
    }

    /// Matches raw menu input against the current choices.
    pub fn parse_choice(&self, input: &str) -> Result<Choice, InputError> {
        if self.status.is_terminal() {
            return Err(InputError::GameOver);
        }
        let input = input.trim();
        if input.is_empty() {
            return Err(InputError::Empty);
        }
        let wanted = input.to_ascii_lowercase();
        self.choices()
            .into_iter()
            .find(|c| c.key == wanted)
            .ok_or_else(|| InputError::InvalidChoice(input.to_string()))
    }

    /// Applies a menu choice and runs the next turn's checks.
    ///
    /// Invalid input leaves the game untouched. If the clock has already run
    /// out the move is not made.
    pub fn choose(&mut self, input: &str) -> Result<Vec<GameEvent>, InputError> {
        let choice = self.parse_choice(input)?;
        let next = self
            .graph
            .position(&choice.destination)
            .ok_or_else(|| InputError::InvalidChoice(input.trim().to_string()))?;
        debug!(
            "'{}' chose {} -> '{}'",
            self.current_room().id,
            choice.key,
            choice.destination
        );

        let mut events = self.tick();
        if self.status.is_terminal() {
            return Ok(events);
        }

        events.extend(self.move_to(next));
        events.extend(self.turn());
        Ok(events)
    }

    fn move_to(&mut self, next: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let from = self.current_room().id.clone();
        self.current = next;
        self.visited.insert(from.clone());
        self.player.path.push(from.clone());
        events.push(GameEvent::Moved {
            from,
            to: self.current_room().id.clone(),
        });

        if self.current == self.graph.artifact_position() && !self.player.has_artifact {
            info!("artifact picked up in '{}'", self.current_room().id);
            self.player.has_artifact = true;
            events.push(GameEvent::ArtifactFound);
        }
        events
    }

    /// Player interrupt. Stats stay readable afterwards.
    pub fn abort(&mut self) -> Vec<GameEvent> {
        if self.status.is_terminal() {
            return Vec::new();
        }
        self.player.time_remaining = self.remaining();
        self.status = GameStatus::Aborted;
        info!("temple run aborted in '{}'", self.current_room().id);
        vec![GameEvent::Aborted]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::manual::ManualClock;
    use crate::engine::guards::tests::FirstRooms;
    use crate::temple::graph::tests::room;
    use proptest::prelude::*;

    const LIMIT: Duration = Duration::from_secs(180);

    // entrance -> hall -> heart_chamber -> crypt -> entrance, plus back edges
    fn temple_graph() -> RoomGraph {
        let rooms = vec![
            room("entrance", false, &[("left", "hall"), ("right", "crypt")]),
            room(
                "hall",
                true,
                &[("north", "heart_chamber"), ("east", "crypt"), ("back", "entrance")],
            ),
            room("heart_chamber", false, &[("down", "crypt"), ("back", "hall")]),
            room("crypt", true, &[("out", "entrance"), ("back", "heart_chamber")]),
        ];
        RoomGraph::new(rooms, "entrance", "heart_chamber").unwrap()
    }

    fn engine(guards: &[&str], pendants: u32) -> (GameEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let guards = guards.iter().map(|g| g.to_string()).collect();
        let rules = GameRules {
            pendants,
            time_limit: LIMIT,
        };
        let mut game = GameEngine::new(temple_graph(), guards, rules, clock.clone());
        game.start();
        (game, clock)
    }

    fn key_for(game: &GameEngine<ManualClock>, to: &str) -> String {
        game.choices()
            .into_iter()
            .find(|c| c.destination == to && c.key != "b")
            .map(|c| c.key)
            .unwrap()
    }

    fn walk(game: &mut GameEngine<ManualClock>, route: &[&str]) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for to in route {
            let key = key_for(game, to);
            events.extend(game.choose(&key).unwrap());
        }
        events
    }

    #[test]
    fn starts_awaiting_input_at_entrance() {
        let (game, _) = engine(&[], 2);
        assert_eq!(game.status(), GameStatus::AwaitingInput);
        assert_eq!(game.current_room().id, "entrance");
        assert_eq!(game.player().time_remaining, LIMIT);
    }

    #[test]
    fn free_traversal_without_guards() {
        let (mut game, _) = engine(&[], 2);
        walk(&mut game, &["hall", "crypt", "heart_chamber", "hall"]);
        assert_eq!(game.status(), GameStatus::AwaitingInput);
        assert_eq!(game.player().guards_encountered, 0);
        assert_eq!(game.player().pendants, 2);
    }

    #[test]
    fn full_run_wins_on_return_to_entrance() {
        let (mut game, _) = engine(&[], 2);
        let events = walk(&mut game, &["hall", "heart_chamber"]);
        assert!(events.contains(&GameEvent::ArtifactFound));
        assert!(game.player().has_artifact);
        assert_eq!(game.status(), GameStatus::AwaitingInput);

        let events = walk(&mut game, &["crypt", "entrance"]);
        assert_eq!(events.last(), Some(&GameEvent::Escaped));
        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(game.player().path, ["entrance", "hall", "heart_chamber", "crypt"]);
    }

    #[test]
    fn entrance_without_artifact_is_not_a_win() {
        let (mut game, _) = engine(&[], 2);
        walk(&mut game, &["hall", "entrance"]);
        assert_eq!(game.status(), GameStatus::AwaitingInput);
    }

    #[test]
    fn artifact_picked_up_only_once() {
        let (mut game, _) = engine(&[], 2);
        let first = walk(&mut game, &["hall", "heart_chamber"]);
        let again = walk(&mut game, &["crypt", "heart_chamber"]);
        assert_eq!(first.iter().filter(|e| **e == GameEvent::ArtifactFound).count(), 1);
        assert!(!again.contains(&GameEvent::ArtifactFound));
        assert!(game.player().has_artifact);
    }

    #[test]
    fn guard_costs_one_pendant_once() {
        let (mut game, _) = engine(&["hall"], 2);
        let events = walk(&mut game, &["hall"]);
        assert!(events.contains(&GameEvent::GuardPaidOff {
            room: "hall".into(),
            pendants_left: 1
        }));
        assert!(!game.guards().contains("hall"));

        walk(&mut game, &["crypt", "heart_chamber", "hall"]);
        assert_eq!(game.player().pendants, 1);
        assert_eq!(game.player().guards_encountered, 1);
    }

    #[test]
    fn captured_without_pendants() {
        let (mut game, _) = engine(&["hall"], 0);
        let events = game.choose("1").unwrap();
        assert!(events.contains(&GameEvent::Captured { room: "hall".into() }));
        assert_eq!(game.status(), GameStatus::LostCaptured);
        assert_eq!(game.player().guards_encountered, 1);
        assert_eq!(game.player().pendants, 0);
        assert_eq!(game.choose("1"), Err(InputError::GameOver));
    }

    #[test]
    fn last_pendant_then_capture() {
        let (mut game, _) = engine(&["hall", "crypt"], 1);
        walk(&mut game, &["hall"]);
        assert_eq!(game.player().pendants, 0);

        let path_before = game.player().path.clone();
        let visited_before = game.visited().clone();
        walk(&mut game, &["crypt"]);
        assert_eq!(game.status(), GameStatus::LostCaptured);
        assert_eq!(game.player().guards_encountered, 2);
        // the move into the crypt happened; the capture itself changes nothing else
        assert_eq!(game.player().path.len(), path_before.len() + 1);
        assert_eq!(game.visited().len(), visited_before.len() + 1);

        // further turns are inert
        assert!(game.turn().is_empty());
        assert_eq!(game.player().path.len(), path_before.len() + 1);
    }

    #[test]
    fn guard_in_start_room_checked_at_start() {
        let clock = ManualClock::new();
        let rules = GameRules {
            pendants: 0,
            time_limit: LIMIT,
        };
        let guards = ["entrance".to_string()].into_iter().collect();
        let mut game = GameEngine::new(temple_graph(), guards, rules, clock);
        let events = game.start();
        assert_eq!(events, [GameEvent::Captured { room: "entrance".into() }]);
        assert!(game.player().path.is_empty());
        assert!(game.visited().is_empty());
    }

    #[test]
    fn menu_numbers_connections_and_adds_back() {
        let (mut game, _) = engine(&[], 2);
        walk(&mut game, &["hall"]);
        let choices = game.choices();
        let keys: Vec<_> = choices.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, ["1", "2", "3", "b"]);
        assert_eq!(choices[0].label, "Take the north path");
        assert!(choices[0].artifact_ahead);
        assert!(choices[3].visited);
        assert_eq!(choices[3].destination, "entrance");
    }

    #[test]
    fn invalid_input_changes_nothing() {
        let (mut game, clock) = engine(&["hall"], 2);
        walk(&mut game, &["hall"]);
        let before = game.player().clone();
        let visited = game.visited().clone();

        clock.advance(Duration::from_secs(5));
        assert_eq!(
            game.choose("xyz"),
            Err(InputError::InvalidChoice("xyz".to_string()))
        );
        assert_eq!(game.choose("  "), Err(InputError::Empty));
        assert_eq!(game.choose("9"), Err(InputError::InvalidChoice("9".to_string())));

        assert_eq!(game.player(), &before);
        assert_eq!(game.visited(), &visited);
        assert_eq!(game.current_room().id, "hall");
        assert_eq!(game.status(), GameStatus::AwaitingInput);
    }

    #[test]
    fn back_accepts_either_case() {
        let (mut game, _) = engine(&[], 2);
        walk(&mut game, &["hall"]);
        game.choose("B").unwrap();
        assert_eq!(game.current_room().id, "entrance");
    }

    #[test]
    fn time_runs_out_on_next_check() {
        let (mut game, clock) = engine(&[], 2);
        clock.advance(LIMIT);
        let events = game.choose("1").unwrap();
        assert_eq!(events, [GameEvent::TimeUp]);
        assert_eq!(game.status(), GameStatus::LostTime);
        assert_eq!(game.current_room().id, "entrance");
        assert_eq!(game.player().time_remaining, Duration::ZERO);
    }

    #[test]
    fn tick_detects_timeout_while_idle() {
        let (mut game, clock) = engine(&[], 2);
        clock.advance(Duration::from_secs(200));
        assert_eq!(game.tick(), [GameEvent::TimeUp]);
        assert!(game.tick().is_empty());
    }

    #[test]
    fn warnings_fire_once_each() {
        let (mut game, clock) = engine(&[], 2);
        clock.advance(Duration::from_secs(125));
        assert_eq!(game.tick(), [GameEvent::TimeWarning(TimeWarning::OneMinute)]);
        assert!(game.tick().is_empty());
        clock.advance(Duration::from_secs(30));
        assert_eq!(game.tick(), [GameEvent::TimeWarning(TimeWarning::ThirtySeconds)]);
        clock.advance(Duration::from_secs(10));
        assert!(game.tick().is_empty());
    }

    #[test]
    fn abort_keeps_partial_stats() {
        let (mut game, clock) = engine(&[], 2);
        walk(&mut game, &["hall"]);
        clock.advance(Duration::from_secs(42));
        assert_eq!(game.abort(), [GameEvent::Aborted]);
        assert_eq!(game.status(), GameStatus::Aborted);
        assert_eq!(game.player().elapsed(), Duration::from_secs(42));
        assert_eq!(game.player().path, ["entrance"]);
        assert!(game.abort().is_empty());
    }

    #[test]
    fn clock_does_not_run_before_start() {
        let clock = ManualClock::new();
        let rules = GameRules {
            pendants: 2,
            time_limit: LIMIT,
        };
        let mut game = GameEngine::new(temple_graph(), HashSet::new(), rules, clock.clone());
        clock.advance(Duration::from_secs(500));
        assert!(game.tick().is_empty());
        assert_eq!(game.remaining(), LIMIT);
    }

    #[test]
    fn from_temple_places_guards() {
        let temple = Temple {
            config: toml::from_str("artifact = \"Crown\"\ntemple_guards = 5").unwrap(),
            graph: temple_graph(),
            root: std::path::PathBuf::from("temple"),
        };
        let game = GameEngine::from_temple(&temple, &mut FirstRooms, ManualClock::new());
        let expected: HashSet<RoomId> = ["hall".to_string(), "crypt".to_string()].into();
        assert_eq!(game.guards(), &expected);
        assert_eq!(game.player().pendants, 2);
    }

    proptest! {
        #[test]
        fn pendants_and_time_never_increase(
            moves in proptest::collection::vec((0usize..4, 0u64..20), 1..40),
            pendants in 0u32..3,
        ) {
            let (mut game, clock) = engine(&["hall", "crypt"], pendants);
            let mut last_pendants = game.player().pendants;
            let mut last_time = game.player().time_remaining;
            let mut had_artifact = false;

            for (pick, secs) in moves {
                clock.advance(Duration::from_secs(secs));
                let choices = game.choices();
                let key = choices[pick % choices.len()].key.clone();
                let _ = game.choose(&key);

                let p = game.player();
                prop_assert!(p.pendants <= last_pendants);
                prop_assert!(p.time_remaining <= last_time);
                prop_assert!(!had_artifact || p.has_artifact);
                prop_assert!(p.guards_encountered <= 2);
                last_pendants = p.pendants;
                last_time = p.time_remaining;
                had_artifact = p.has_artifact;

                if game.status() == GameStatus::Won {
                    prop_assert!(p.has_artifact);
                    prop_assert_eq!(game.current_room().id.as_str(), "entrance");
                }
                if game.status().is_terminal() {
                    break;
                }
            }
        }
    }
}
