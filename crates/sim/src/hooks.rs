use std::cell::RefCell;
use std::rc::Rc;

use crate::pool::Handle;
use crate::state::StateId;
use crate::world::SimulationWorld;

/// One-shot effect identifier handed to the audio/effects boundary. The
/// simulation assigns no meaning to the value; playback is fire-and-forget
/// and can never fail the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    Continue,
    /// Suppress the default behavior that would follow the hook.
    Veto,
}

/// Scripting boundary. Hooks receive the world mutably and may themselves
/// spawn, damage, or remove entities; that is why every call site
/// re-checks entity liveness immediately after invoking one.
pub trait SimHooks {
    fn pre_tick(&mut self, _world: &mut SimulationWorld) {}
    fn post_tick(&mut self, _world: &mut SimulationWorld) {}
    fn on_spawn(&mut self, _world: &mut SimulationWorld, _entity: Handle) {}
    fn on_state_entry(
        &mut self,
        _world: &mut SimulationWorld,
        _entity: Handle,
        _state: StateId,
    ) -> HookOutcome {
        HookOutcome::Continue
    }
    fn on_damage(
        &mut self,
        _world: &mut SimulationWorld,
        _target: Handle,
        _source: Handle,
        _amount: i32,
    ) -> HookOutcome {
        HookOutcome::Continue
    }
    fn on_removal(&mut self, _world: &mut SimulationWorld, _entity: Handle) {}
}

/// Default hook set: everything continues.
pub struct NoHooks;

impl SimHooks for NoHooks {}

/// Audio/effects boundary: play a one-shot effect keyed by entity and id.
pub trait EffectSink {
    fn play(&mut self, source: Handle, effect: EffectId);
}

/// Discards every effect; the headless default.
pub struct NullEffects;

impl EffectSink for NullEffects {
    fn play(&mut self, _source: Handle, _effect: EffectId) {}
}

/// Test sink: records plays into shared storage the test keeps a clone of.
#[derive(Clone, Default)]
pub struct RecordingEffects {
    events: Rc<RefCell<Vec<(Handle, EffectId)>>>,
}

impl RecordingEffects {
    pub fn new() -> RecordingEffects {
        RecordingEffects::default()
    }

    pub fn events(&self) -> Vec<(Handle, EffectId)> {
        self.events.borrow().clone()
    }

    pub fn count_of(&self, effect: EffectId) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|(_, id)| *id == effect)
            .count()
    }
}

impl EffectSink for RecordingEffects {
    fn play(&mut self, source: Handle, effect: EffectId) {
        self.events.borrow_mut().push((source, effect));
    }
}
