//! Engine driver
//!
//! The engine owns every registered combatant, the live sessions, the timer
//! queue and the tracker arena. It advances by popping the next due turn and
//! running that combatant's whole decide-respond-resolve cycle before any
//! other timer fires.

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::check::{CheckEvaluator, Difficulty, StandardCheck};
use crate::combatant::effects::{Effect, EffectKind};
use crate::combatant::stamina::StaminaLedger;
use crate::combatant::Combatant;
use crate::core::config::EngineConfig;
use crate::core::error::{CombatError, Result};
use crate::core::types::{CombatantId, Seconds, SessionId};
use crate::moves::{resolve_move, CombatMove, MoveNote, MoveResult, ResolutionContext};
use crate::session::combat::{CombatSession, SessionState};
use crate::session::events::{CombatEvent, CombatObserver, EventLog, LeaveReason};
use crate::session::scheduler::{ScheduleKey, Scheduler, TimerQueue};
use crate::session::variant::{CombatHooks, NoHooks, SessionRules};
use crate::strategy::{acquire_target, desired_mode, Battlefield, StagedStrategy, Strategy};
use crate::tracking::{Released, TrackerArena, TrackerEvent, TrackerKind};
use crate::world::{LocationGraph, Terrain};

/// What happened on one scheduled turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Acted {
        mv: CombatMove,
        result: MoveResult,
    },
    /// Nothing to do; waits the idle delay
    Idled,
    /// No longer in an active session, or removed before acting
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub actor: CombatantId,
    pub time: Seconds,
    pub outcome: TurnOutcome,
}

/// Result of proposing a truce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruceOutcome {
    /// Marker placed; waiting for every opponent to reciprocate
    Pending,
    /// All opponents agreed and the parties left
    Agreed,
    NotInCombat,
}

/// Seconds before a newly joined combatant first acts
///
/// Aggressors start at Easy; defenders caught prone or helpless start later.
pub fn initial_delay(config: &EngineConfig, combatant: &Combatant, aggressor: bool) -> Seconds {
    let difficulty = if combatant.is_helpless() {
        Difficulty::VeryHard
    } else if !combatant.position.is_upright() {
        Difficulty::Hard
    } else if aggressor {
        Difficulty::Easy
    } else {
        Difficulty::Normal
    };
    let scale =
        (1.0 + config.initial_delay_per_step * difficulty.offset_from_normal() as f64).max(0.1);
    config.initial_delay_base * scale * config.global_speed_multiplier
}

pub struct EngineBuilder {
    config: EngineConfig,
    seed: u64,
    rules: SessionRules,
    terrain: Option<Box<dyn Terrain>>,
    evaluator: Option<Box<dyn CheckEvaluator>>,
    scheduler: Option<Box<dyn Scheduler>>,
    hooks: Option<Box<dyn CombatHooks>>,
    observers: Vec<Box<dyn CombatObserver>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            seed: 0,
            rules: SessionRules::standard(),
            terrain: None,
            evaluator: None,
            scheduler: None,
            hooks: None,
            observers: Vec::new(),
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed for every random roll the engine makes
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Rules for sessions started without explicit rules
    pub fn rules(mut self, rules: SessionRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn terrain(mut self, terrain: impl Terrain + 'static) -> Self {
        self.terrain = Some(Box::new(terrain));
        self
    }

    pub fn evaluator(mut self, evaluator: impl CheckEvaluator + 'static) -> Self {
        self.evaluator = Some(Box::new(evaluator));
        self
    }

    pub fn scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Some(Box::new(scheduler));
        self
    }

    pub fn hooks(mut self, hooks: impl CombatHooks + 'static) -> Self {
        self.hooks = Some(Box::new(hooks));
        self
    }

    pub fn observer(mut self, observer: impl CombatObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn build(self) -> Result<Engine> {
        self.config.validate()?;
        Ok(Engine {
            config: self.config,
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            default_rules: self.rules,
            terrain: self
                .terrain
                .unwrap_or_else(|| Box::new(LocationGraph::new())),
            evaluator: self
                .evaluator
                .unwrap_or_else(|| Box::new(StandardCheck::new())),
            scheduler: self
                .scheduler
                .unwrap_or_else(|| Box::new(TimerQueue::new())),
            hooks: self.hooks.unwrap_or_else(|| Box::new(NoHooks)),
            observers: self.observers,
            combatants: AHashMap::new(),
            sessions: AHashMap::new(),
            finished: Vec::new(),
            trackers: TrackerArena::new(),
            log: EventLog::new(),
        })
    }
}

/// The combat engine
pub struct Engine {
    config: EngineConfig,
    rng: ChaCha8Rng,
    default_rules: SessionRules,
    terrain: Box<dyn Terrain>,
    evaluator: Box<dyn CheckEvaluator>,
    scheduler: Box<dyn Scheduler>,
    hooks: Box<dyn CombatHooks>,
    observers: Vec<Box<dyn CombatObserver>>,
    combatants: AHashMap<CombatantId, Combatant>,
    sessions: AHashMap<SessionId, CombatSession>,
    finished: Vec<CombatSession>,
    trackers: TrackerArena,
    log: EventLog,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn now(&self) -> Seconds {
        self.scheduler.now()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn events(&self) -> &EventLog {
        &self.log
    }

    pub fn take_events(&mut self) -> EventLog {
        std::mem::take(&mut self.log)
    }

    pub fn trackers(&self) -> &TrackerArena {
        &self.trackers
    }

    pub fn terrain(&self) -> &dyn Terrain {
        self.terrain.as_ref()
    }

    // === COMBATANTS ===

    pub fn add_combatant(&mut self, combatant: Combatant) -> CombatantId {
        let id = combatant.id;
        self.combatants.insert(id, combatant);
        id
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(&id)
    }

    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.values()
    }

    /// Take a combatant out of the world, leaving any fight first
    pub fn remove_combatant(&mut self, id: CombatantId) -> Result<Combatant> {
        if !self.combatants.contains_key(&id) {
            return Err(CombatError::CombatantNotFound(id));
        }
        self.depart(id, LeaveReason::Removed);
        self.combatants
            .remove(&id)
            .ok_or(CombatError::CombatantNotFound(id))
    }

    // === SESSIONS ===

    pub fn session(&self, id: SessionId) -> Option<&CombatSession> {
        self.sessions.get(&id)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &CombatSession> {
        self.sessions.values()
    }

    /// Sessions that have ended, oldest first
    pub fn finished_sessions(&self) -> &[CombatSession] {
        &self.finished
    }

    pub fn session_of(&self, combatant: CombatantId) -> Option<&CombatSession> {
        let id = self.combatants.get(&combatant)?.session?;
        self.sessions.get(&id)
    }

    fn active_session_of(&self, combatant: CombatantId) -> Option<SessionId> {
        self.session_of(combatant)
            .filter(|s| s.is_active() && s.contains(combatant))
            .map(|s| s.id)
    }

    /// When the combatant's next turn is due
    pub fn next_turn(&self, combatant: CombatantId) -> Option<Seconds> {
        self.scheduler.pending(ScheduleKey::turn(combatant))
    }

    fn new_session_id(&mut self) -> SessionId {
        SessionId(uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid())
    }

    fn emit(&mut self, event: CombatEvent) {
        let now = self.scheduler.now();
        for observer in &mut self.observers {
            observer.notify(now, &event);
        }
        self.log.push(now, event);
    }

    fn field(&self) -> Battlefield<'_> {
        Battlefield {
            combatants: &self.combatants,
            terrain: self.terrain.as_ref(),
            trackers: &self.trackers,
            config: &self.config,
            evaluator: self.evaluator.as_ref(),
        }
    }

    /// `attacker` attacks `target`, starting or joining a fight under the default rules
    pub fn join_combat(&mut self, attacker: CombatantId, target: CombatantId) -> Result<SessionId> {
        self.join_combat_with(attacker, target, self.default_rules)
    }

    /// As [`Engine::join_combat`]; `rules` apply only if a new session starts
    ///
    /// If both already fight in different sessions, the smaller session is
    /// merged into the larger.
    pub fn join_combat_with(
        &mut self,
        attacker: CombatantId,
        target: CombatantId,
        rules: SessionRules,
    ) -> Result<SessionId> {
        if attacker == target {
            return Err(CombatError::InvalidSettings(format!(
                "{} cannot attack itself",
                attacker
            )));
        }
        for id in [attacker, target] {
            if !self.combatants.contains_key(&id) {
                return Err(CombatError::CombatantNotFound(id));
            }
        }
        let session = match (self.active_session_of(attacker), self.active_session_of(target)) {
            (Some(a), Some(b)) if a == b => a,
            (Some(a), Some(b)) => self.merge(a, b),
            (Some(a), None) => {
                self.enlist(a, target, false);
                a
            }
            (None, Some(b)) => {
                self.enlist(b, attacker, true);
                b
            }
            (None, None) => {
                let id = self.new_session_id();
                let now = self.scheduler.now();
                self.sessions.insert(id, CombatSession::new(id, rules, now));
                info!(session = %id, friendly = rules.friendly, "combat started");
                self.emit(CombatEvent::CombatStarted { session: id });
                self.enlist(id, attacker, true);
                self.enlist(id, target, false);
                id
            }
        };
        self.retarget(attacker, Some(target));
        Ok(session)
    }

    fn enlist(&mut self, session: SessionId, id: CombatantId, aggressor: bool) {
        let Some(combatant) = self.combatants.get_mut(&id) else {
            return;
        };
        combatant.session = Some(session);
        let location = combatant.location;
        let delay = initial_delay(&self.config, combatant, aggressor);
        let Some(combat) = self.sessions.get_mut(&session) else {
            return;
        };
        combat.add(id, location);
        let scripted = combat.rules.scripted;
        self.scheduler.add_schedule(ScheduleKey::turn(id), delay);
        info!(session = %session, combatant = %id, delay, "joined combat");
        self.emit(CombatEvent::Joined {
            session,
            combatant: id,
        });
        if scripted {
            if let Some(combatant) = self.combatants.get(&id) {
                self.hooks.on_join(session, combatant);
            }
        }
    }

    fn merge(&mut self, a: SessionId, b: SessionId) -> SessionId {
        let size = |id: &SessionId| self.sessions.get(id).map_or(0, CombatSession::len);
        let (into, from) = if size(&b) > size(&a) { (b, a) } else { (a, b) };
        let Some(mut absorbed) = self.sessions.remove(&from) else {
            return into;
        };
        absorbed.state = SessionState::Destroyed;
        for id in absorbed.members() {
            if let Some(combatant) = self.combatants.get_mut(id) {
                combatant.session = Some(into);
            }
        }
        if let Some(survivor) = self.sessions.get_mut(&into) {
            survivor.absorb(absorbed);
        }
        info!(from = %from, into = %into, "combat merged");
        self.emit(CombatEvent::CombatMerged { from, into });
        into
    }

    /// Change a combatant's target, dropping aims and firing sequences on the old one
    fn retarget(&mut self, id: CombatantId, target: Option<CombatantId>) {
        let Some(combatant) = self.combatants.get_mut(&id) else {
            return;
        };
        if combatant.target == target {
            return;
        }
        combatant.target = target;
        combatant.melee_range = false;
        combatant.effects.remove_all(EffectKind::FiringInProgress);
        let released = self.trackers.notify(TrackerEvent::TargetChanged(id));
        self.drop_handles(&released);
    }

    fn drop_handles(&mut self, released: &[Released]) {
        for r in released {
            let Some(owner) = self.combatants.get_mut(&r.owner) else {
                continue;
            };
            match r.kind {
                TrackerKind::Aim if owner.aim == Some(r.id) => owner.aim = None,
                TrackerKind::Cover if owner.cover == Some(r.id) => owner.cover = None,
                _ => {}
            }
        }
    }

    fn find_target(&self, id: CombatantId, session: SessionId) -> Option<CombatantId> {
        let combat = self.sessions.get(&session)?;
        let actor = self.combatants.get(&id)?;
        let target = acquire_target(actor, combat.members(), &self.field())?;
        let helpless = self.combatants.get(&target)?.is_incapacitated();
        if helpless && combat.rules.incapacitation_ends_participation {
            return None;
        }
        Some(target)
    }

    /// Leave combat on the combatant's own initiative
    ///
    /// Returns false if the combatant was not fighting or the session's rules
    /// require its opponents' consent.
    pub fn leave_combat(&mut self, id: CombatantId) -> Result<bool> {
        if !self.combatants.contains_key(&id) {
            return Err(CombatError::CombatantNotFound(id));
        }
        Ok(self.depart(id, LeaveReason::Quit))
    }

    fn depart(&mut self, id: CombatantId, reason: LeaveReason) -> bool {
        let Some(session_id) = self.combatants.get(&id).and_then(|c| c.session) else {
            return false;
        };
        let Some(combat) = self.sessions.get_mut(&session_id) else {
            if let Some(combatant) = self.combatants.get_mut(&id) {
                combatant.reset_combat_state();
            }
            return false;
        };
        let ending = !combat.is_active();
        let rules = combat.rules;
        if rules.leave_requires_consent && reason.is_voluntary() && !ending {
            debug!(combatant = %id, session = %session_id, ?reason, "leave refused without consent");
            return false;
        }
        combat.remove(id);
        self.scheduler.destroy(ScheduleKey::turn(id));
        self.release_holds(id);
        let released = self.trackers.notify(TrackerEvent::LeftCombat(id));
        self.drop_handles(&released);
        if let Some(combatant) = self.combatants.get_mut(&id) {
            combatant.reset_combat_state();
        }

        info!(session = %session_id, combatant = %id, ?reason, "left combat");
        self.emit(CombatEvent::Left {
            session: session_id,
            combatant: id,
            reason,
        });
        if rules.scripted {
            if let Some(combatant) = self.combatants.get(&id) {
                self.hooks.on_leave(session_id, combatant, reason);
            }
        }

        if !ending {
            self.cascade(session_id, id);
            self.check_for_combat_end(session_id);
        }
        true
    }

    /// Free every clinch and grapple the leaver is part of
    fn release_holds(&mut self, leaver: CombatantId) {
        let held = self
            .combatants
            .get(&leaver)
            .and_then(|c| c.grapple)
            .map(|g| g.target);
        if let Some(target) = held.and_then(|t| self.combatants.get_mut(&t)) {
            target.body.release_grapple();
        }
        let mut leaver_held = false;
        for combatant in self.combatants.values_mut() {
            if combatant.id == leaver {
                continue;
            }
            if combatant.effects.clinching() == Some(leaver) {
                combatant.effects.remove_all(EffectKind::Clinching);
            }
            if combatant.grapple.is_some_and(|g| g.target == leaver) {
                combatant.grapple = None;
                leaver_held = true;
            }
        }
        if leaver_held {
            if let Some(combatant) = self.combatants.get_mut(&leaver) {
                combatant.body.release_grapple();
            }
        }
    }

    /// Everyone chasing the leaver finds someone else or leaves too
    fn cascade(&mut self, session: SessionId, leaver: CombatantId) {
        let chasing: Vec<CombatantId> = match self.sessions.get(&session) {
            Some(combat) => combat
                .members()
                .iter()
                .copied()
                .filter(|id| {
                    self.combatants
                        .get(id)
                        .is_some_and(|c| c.target == Some(leaver))
                })
                .collect(),
            None => return,
        };
        for id in chasing {
            let still_fighting = self
                .sessions
                .get(&session)
                .is_some_and(|s| s.is_active() && s.contains(id));
            if !still_fighting {
                continue;
            }
            match self.find_target(id, session) {
                Some(next) => {
                    debug!(combatant = %id, target = %next, "retargeted after leave");
                    self.retarget(id, Some(next));
                }
                None => {
                    self.retarget(id, None);
                    self.depart(id, LeaveReason::NoTarget);
                }
            }
        }
    }

    /// Someone able to fight still faces an opponent
    ///
    /// Under rules where incapacitation ends participation both sides of the
    /// pair must be able to fight; otherwise a helpless opponent still counts.
    fn has_live_opposition(&self, combat: &CombatSession) -> bool {
        let members: Vec<&Combatant> = combat
            .members()
            .iter()
            .filter_map(|id| self.combatants.get(id))
            .filter(|c| !c.is_dead())
            .collect();
        let strict = combat.rules.incapacitation_ends_participation;
        members
            .iter()
            .filter(|a| !a.is_incapacitated())
            .any(|a| {
                members
                    .iter()
                    .any(|b| a.is_opponent_of(b) && (!strict || !b.is_incapacitated()))
            })
    }

    /// End the session if fewer than two remain or no opposing pair can still fight
    ///
    /// Returns true if this call ended it.
    pub fn check_for_combat_end(&mut self, session: SessionId) -> bool {
        let Some(combat) = self.sessions.get(&session) else {
            return false;
        };
        if !combat.is_active() {
            return false;
        }
        if combat.len() >= 2 && self.has_live_opposition(combat) {
            return false;
        }
        self.end_combat(session);
        true
    }

    fn end_combat(&mut self, session: SessionId) {
        let members: Vec<CombatantId> = match self.sessions.get_mut(&session) {
            Some(combat) => {
                combat.state = SessionState::Ending;
                combat.members().iter().copied().collect()
            }
            None => return,
        };
        for id in members {
            self.depart(id, LeaveReason::CombatEnded);
        }
        let Some(mut combat) = self.sessions.remove(&session) else {
            return;
        };
        combat.state = SessionState::Destroyed;
        let scripted = combat.rules.scripted;
        info!(session = %session, moves = combat.moves, "combat ends");
        self.finished.push(combat);
        self.emit(CombatEvent::CombatEnds { session });
        if scripted {
            self.hooks.on_end(session);
        }
    }

    /// Propose a truce on behalf of a combatant
    ///
    /// The proposer keeps a truce marker. Once every remaining opponent also
    /// carries one, the proposer and those opponents leave the fight.
    pub fn request_truce(&mut self, id: CombatantId) -> Result<TruceOutcome> {
        let Some(session) = self.combatants.get(&id).map(|c| c.session) else {
            return Err(CombatError::CombatantNotFound(id));
        };
        let Some(session) = session.filter(|s| self.sessions.contains_key(s)) else {
            return Ok(TruceOutcome::NotInCombat);
        };
        if let Some(proposer) = self.combatants.get_mut(&id) {
            if !proposer.effects.has(EffectKind::Truce) {
                proposer.effects.add(Effect::Truce);
            }
        }
        info!(session = %session, combatant = %id, "truce offered");
        self.emit(CombatEvent::TruceOffered {
            session,
            combatant: id,
        });

        let opponents: Vec<CombatantId> = {
            let combat = self
                .sessions
                .get(&session)
                .ok_or(CombatError::SessionNotFound(session))?;
            let proposer = self
                .combatants
                .get(&id)
                .ok_or(CombatError::CombatantNotFound(id))?;
            combat
                .members()
                .iter()
                .filter_map(|o| self.combatants.get(o))
                .filter(|o| o.is_opponent_of(proposer) && !o.is_incapacitated())
                .map(|o| o.id)
                .collect()
        };
        let agreed = opponents.iter().all(|o| {
            self.combatants
                .get(o)
                .is_some_and(|c| c.effects.has(EffectKind::Truce))
        });
        if !agreed {
            debug!(session = %session, combatant = %id, "truce pending");
            return Ok(TruceOutcome::Pending);
        }

        info!(session = %session, "truce agreed");
        self.emit(CombatEvent::TruceAgreed { session });
        for party in std::iter::once(id).chain(opponents) {
            self.depart(party, LeaveReason::Truce);
        }
        Ok(TruceOutcome::Agreed)
    }

    // === DRIVER ===

    /// Run the next scheduled turn, whenever it falls
    pub fn step(&mut self) -> Result<Option<Turn>> {
        self.step_until(f64::INFINITY)
    }

    /// Run every turn due up to `until`; returns how many ran
    pub fn run_until(&mut self, until: Seconds) -> Result<usize> {
        let mut turns = 0;
        while self.step_until(until)?.is_some() {
            turns += 1;
        }
        Ok(turns)
    }

    fn step_until(&mut self, until: Seconds) -> Result<Option<Turn>> {
        let Some((key, time)) = self.scheduler.pop_due(until) else {
            return Ok(None);
        };
        let outcome = self.take_turn(key.actor)?;
        Ok(Some(Turn {
            actor: key.actor,
            time,
            outcome,
        }))
    }

    fn idle(&mut self, id: CombatantId) {
        if let Some(combatant) = self.combatants.get_mut(&id) {
            combatant.stamina.regain(self.config.idle_stamina_regain);
        }
        let delay = self.config.idle_delay * self.config.global_speed_multiplier;
        self.scheduler.add_schedule(ScheduleKey::turn(id), delay);
        debug!(combatant = %id, delay, "idle");
    }

    fn update_mode(&mut self, id: CombatantId) {
        if let Some(combatant) = self.combatants.get_mut(&id) {
            let mode = desired_mode(combatant);
            if mode != combatant.mode {
                debug!(combatant = %id, from = ?combatant.mode, to = ?mode, "mode changed");
                combatant.mode = mode;
            }
        }
    }

    /// Keep a valid target, or acquire one from the session
    fn ensure_target(&mut self, id: CombatantId, session: SessionId) -> Option<CombatantId> {
        let current = self.combatants.get(&id)?.target;
        let able = current.filter(|t| {
            self.sessions.get(&session).is_some_and(|s| s.contains(*t))
                && self
                    .combatants
                    .get(t)
                    .is_some_and(|c| !c.is_incapacitated())
        });
        if able.is_some() {
            return able;
        }
        // a helpless target is kept only while nobody able is left to fight
        let next = self.find_target(id, session);
        self.retarget(id, next);
        next
    }

    fn take_turn(&mut self, id: CombatantId) -> Result<TurnOutcome> {
        let Some(session) = self.active_session_of(id) else {
            return Ok(TurnOutcome::Skipped);
        };
        let rules = match self.sessions.get(&session) {
            Some(combat) => combat.rules,
            None => return Ok(TurnOutcome::Skipped),
        };
        if let Some(reason) = self.combatants.get(&id).and_then(|c| rules.must_leave(c)) {
            self.depart(id, reason);
            return Ok(TurnOutcome::Skipped);
        }

        self.update_mode(id);
        if self.ensure_target(id, session).is_none() {
            self.idle(id);
            return Ok(TurnOutcome::Idled);
        }

        let decision = {
            let field = Battlefield {
                combatants: &self.combatants,
                terrain: self.terrain.as_ref(),
                trackers: &self.trackers,
                config: &self.config,
                evaluator: self.evaluator.as_ref(),
            };
            let Some(actor) = self.combatants.get(&id) else {
                return Ok(TurnOutcome::Skipped);
            };
            let strategy = StagedStrategy::for_mode(actor.mode);
            strategy.choose_move(actor, &field, &mut self.rng).map(|mv| {
                let response = if mv.kind.is_hostile() {
                    mv.target()
                        .filter(|t| *t != id)
                        .and_then(|t| self.combatants.get(&t))
                        .map(|defender| {
                            StagedStrategy::for_mode(defender.mode)
                                .response_to_move(&mv, defender, actor, &field)
                        })
                } else {
                    None
                };
                (mv, response)
            })
        };
        let Some((mv, response)) = decision else {
            self.idle(id);
            return Ok(TurnOutcome::Idled);
        };

        let Some(mut assailant) = self.combatants.remove(&id) else {
            return Ok(TurnOutcome::Skipped);
        };
        let target = mv.target().filter(|t| *t != id);
        let mut defender = target.and_then(|t| self.combatants.remove(&t));
        let resolved = {
            let mut ctx = ResolutionContext {
                evaluator: self.evaluator.as_ref(),
                rng: &mut self.rng,
                config: &self.config,
                terrain: self.terrain.as_ref(),
                trackers: &mut self.trackers,
            };
            resolve_move(
                &mv,
                response.as_ref(),
                &mut assailant,
                defender.as_mut(),
                &mut ctx,
            )
        };
        let result = match resolved {
            Ok(result) => result,
            Err(err) => {
                self.combatants.insert(assailant.id, assailant);
                if let Some(defender) = defender {
                    self.combatants.insert(defender.id, defender);
                }
                return Err(err);
            }
        };

        assailant.stamina.spend(mv.stamina_cost);
        assailant.effects.remove_all(EffectKind::PendingAction);
        assailant.effects.remove_all(EffectKind::Unbalanced);
        let mut stagger = 0.0;
        if let Some(defender) = defender.as_mut() {
            if let (true, Some(response)) = (result.defender_acted, response.as_ref()) {
                defender.stamina.spend(response.stamina_cost(&self.config));
            }
            stagger = defender
                .effects
                .take_all(EffectKind::Staggered)
                .iter()
                .map(|e| match e {
                    Effect::Staggered { delay } => *delay,
                    _ => 0.0,
                })
                .sum();
        }
        self.combatants.insert(assailant.id, assailant);
        if let Some(defender) = defender {
            self.combatants.insert(defender.id, defender);
        }
        self.drop_handles(&result.released);

        if let Some(t) = target {
            let key = ScheduleKey::turn(t);
            if stagger > 0.0 && self.scheduler.pending(key).is_some() {
                self.scheduler
                    .add_or_delay_schedule(key, stagger * self.config.global_speed_multiplier);
            }
        }
        self.record(session, &mv, &result);

        if result.left_combat {
            self.depart(id, LeaveReason::Fled);
        }
        if let Some(t) = target {
            match self.combatants.get(&t).and_then(|d| rules.must_leave(d)) {
                Some(reason) => {
                    self.depart(t, reason);
                }
                None if rules.first_blood_ends && result.drew_blood() => {
                    self.depart(t, LeaveReason::Yielded);
                }
                None => {}
            }
        }
        if let Some(reason) = self.combatants.get(&id).and_then(|c| rules.must_leave(c)) {
            self.depart(id, reason);
        }
        self.check_for_combat_end(session);

        if self.active_session_of(id) == Some(session) {
            let delay = mv.base_delay
                * self.config.recovery.multiplier(result.recovery)
                * self.config.global_speed_multiplier;
            self.scheduler.add_schedule(ScheduleKey::turn(id), delay);
            debug!(combatant = %id, delay, "next turn scheduled");
        }
        Ok(TurnOutcome::Acted { mv, result })
    }

    /// Publish a resolved move and the location changes it caused
    fn record(&mut self, session: SessionId, mv: &CombatMove, result: &MoveResult) {
        let moved_to = result.notes.iter().find_map(|n| match n {
            MoveNote::Moved { to } | MoveNote::Fled { to } => Some(*to),
            _ => None,
        });
        let scripted = match self.sessions.get_mut(&session) {
            Some(combat) => {
                combat.moves += 1;
                if let Some(to) = moved_to {
                    combat.involve(to);
                }
                combat.rules.scripted
            }
            None => false,
        };
        if let Some(to) = moved_to {
            self.emit(CombatEvent::LocationChanged {
                combatant: mv.assailant,
                to,
            });
        }
        self.emit(CombatEvent::MoveResolved {
            session,
            assailant: mv.assailant,
            target: mv.target(),
            action: mv.kind.label(),
            outcome: result.outcome,
            landed: result.landed(),
            notes: result.notes.clone(),
        });
        if let Some(dead) = result.killed() {
            info!(session = %session, combatant = %dead, "killed");
            self.emit(CombatEvent::Died {
                session,
                combatant: dead,
            });
        }
        if scripted {
            self.hooks.on_move(session, mv, result);
        }
    }
}
