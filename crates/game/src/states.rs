use sim::{PlayerAnim, SpriteTag, StateDef, StateId};

use crate::behavior as actions;

pub const SPR_NONE: SpriteTag = SpriteTag(0);
pub const SPR_KART: SpriteTag = SpriteTag(1);
pub const SPR_ITEM_BOX: SpriteTag = SpriteTag(2);
pub const SPR_SHELL: SpriteTag = SpriteTag(3);
pub const SPR_BANANA: SpriteTag = SpriteTag(4);
pub const SPR_BOOM: SpriteTag = SpriteTag(5);
pub const SPR_SPLASH: SpriteTag = SpriteTag(6);
pub const SPR_SPARK: SpriteTag = SpriteTag(7);
pub const SPR_SMOKE: SpriteTag = SpriteTag(8);
pub const SPR_BOSS: SpriteTag = SpriteTag(9);
pub const SPR_TURRET: SpriteTag = SpriteTag(10);
pub const SPR_CRATE: SpriteTag = SpriteTag(11);
pub const SPR_CONE: SpriteTag = SpriteTag(12);
pub const SPR_SPRING: SpriteTag = SpriteTag(13);
pub const SPR_RAIN: SpriteTag = SpriteTag(14);
pub const SPR_CHECKPOINT: SpriteTag = SpriteTag(15);
pub const SPR_OVERLAY: SpriteTag = SpriteTag(16);

pub const S_NULL: StateId = StateId(0);
pub const S_KART_IDLE: StateId = StateId(1);
pub const S_KART_DRIVE1: StateId = StateId(2);
pub const S_KART_DRIVE2: StateId = StateId(3);
pub const S_KART_DRIFT: StateId = StateId(4);
pub const S_KART_SPIN1: StateId = StateId(5);
pub const S_KART_SPIN2: StateId = StateId(6);
pub const S_KART_SPIN3: StateId = StateId(7);
pub const S_KART_SPIN4: StateId = StateId(8);
pub const S_KART_DEAD: StateId = StateId(9);
pub const S_ITEM_BOX_SPIN1: StateId = StateId(10);
pub const S_ITEM_BOX_SPIN2: StateId = StateId(11);
pub const S_ITEM_BOX_POP: StateId = StateId(12);
pub const S_GREEN_SHELL_SPIN1: StateId = StateId(13);
pub const S_GREEN_SHELL_SPIN2: StateId = StateId(14);
pub const S_RED_SHELL_SPIN1: StateId = StateId(15);
pub const S_RED_SHELL_SPIN2: StateId = StateId(16);
pub const S_BANANA: StateId = StateId(17);
pub const S_EXPLOSION1: StateId = StateId(18);
pub const S_EXPLOSION2: StateId = StateId(19);
pub const S_EXPLOSION3: StateId = StateId(20);
pub const S_SPLASH1: StateId = StateId(21);
pub const S_SPLASH2: StateId = StateId(22);
pub const S_DRIFT_SPARK: StateId = StateId(23);
pub const S_SMOKE1: StateId = StateId(24);
pub const S_SMOKE2: StateId = StateId(25);
pub const S_BOSS_HOVER1: StateId = StateId(26);
pub const S_BOSS_HOVER2: StateId = StateId(27);
pub const S_BOSS_SHOOT: StateId = StateId(28);
pub const S_BOSS_DIE1: StateId = StateId(29);
pub const S_BOSS_DIE2: StateId = StateId(30);
pub const S_BOSS_DIE3: StateId = StateId(31);
pub const S_TURRET: StateId = StateId(32);
pub const S_CRATE: StateId = StateId(33);
pub const S_CONE: StateId = StateId(34);
pub const S_SPRING_IDLE: StateId = StateId(35);
pub const S_SPRING_BOUNCE1: StateId = StateId(36);
pub const S_SPRING_BOUNCE2: StateId = StateId(37);
pub const S_RAIN: StateId = StateId(38);
pub const S_CHECKPOINT: StateId = StateId(39);
pub const S_OVERLAY: StateId = StateId(40);

pub const STATE_COUNT: usize = 41;

/// The full state table, in `StateId` order.
pub fn state_table() -> Vec<StateDef> {
    let table = vec![
        // S_NULL: terminal placeholder, never entered.
        StateDef::simple(SPR_NONE, 0, -1, S_NULL),
        // Kart.
        StateDef::simple(SPR_KART, 0, -1, S_KART_IDLE),
        StateDef::simple(SPR_KART, 1, 4, S_KART_DRIVE2),
        StateDef::simple(SPR_KART, 2, 4, S_KART_DRIVE1),
        StateDef::simple(SPR_KART, 3, -1, S_KART_DRIFT),
        StateDef::simple(SPR_KART, 4, 6, S_KART_SPIN2),
        StateDef::simple(SPR_KART, 5, 6, S_KART_SPIN3),
        StateDef::simple(SPR_KART, 6, 6, S_KART_SPIN4),
        StateDef::simple(SPR_KART, 7, 6, S_KART_IDLE),
        StateDef::simple(SPR_KART, 8, -1, S_KART_DEAD),
        // Item box.
        StateDef::simple(SPR_ITEM_BOX, 0, 6, S_ITEM_BOX_SPIN2),
        StateDef::simple(SPR_ITEM_BOX, 1, 6, S_ITEM_BOX_SPIN1),
        StateDef {
            sprite: SPR_ITEM_BOX,
            frame: 2,
            tics: 8,
            action: Some(actions::a_item_pop),
            next: S_NULL,
            var1: 0,
            var2: 0,
        },
        // Shells.
        StateDef::simple(SPR_SHELL, 0, 3, S_GREEN_SHELL_SPIN2),
        StateDef::simple(SPR_SHELL, 1, 3, S_GREEN_SHELL_SPIN1),
        StateDef::simple(SPR_SHELL, 2, 3, S_RED_SHELL_SPIN2),
        StateDef::simple(SPR_SHELL, 3, 3, S_RED_SHELL_SPIN1),
        // Banana.
        StateDef::simple(SPR_BANANA, 0, -1, S_BANANA),
        // Explosion. Entry actions only run on transition, never at spawn,
        // so the blast frame is the second one.
        StateDef::simple(SPR_BOOM, 0, 5, S_EXPLOSION2),
        StateDef {
            sprite: SPR_BOOM,
            frame: 1,
            tics: 5,
            action: Some(actions::a_boom),
            next: S_EXPLOSION3,
            var1: 0,
            var2: 0,
        },
        StateDef::simple(SPR_BOOM, 2, 5, S_NULL),
        // Splash; same transition-entry rule for the fizz.
        StateDef::simple(SPR_SPLASH, 0, 4, S_SPLASH2),
        StateDef {
            sprite: SPR_SPLASH,
            frame: 1,
            tics: 4,
            action: Some(actions::a_splash_fizz),
            next: S_NULL,
            var1: 0,
            var2: 0,
        },
        // Short-lived effects.
        StateDef::simple(SPR_SPARK, 0, 3, S_NULL),
        StateDef::simple(SPR_SMOKE, 0, 6, S_SMOKE2),
        StateDef::simple(SPR_SMOKE, 1, 6, S_NULL),
        // Boss.
        StateDef::simple(SPR_BOSS, 0, 8, S_BOSS_HOVER2),
        StateDef::simple(SPR_BOSS, 1, 8, S_BOSS_HOVER1),
        StateDef {
            sprite: SPR_BOSS,
            frame: 2,
            tics: 12,
            action: Some(actions::a_boss_fire),
            next: S_BOSS_HOVER1,
            var1: 0,
            var2: 0,
        },
        StateDef {
            sprite: SPR_BOSS,
            frame: 3,
            tics: 10,
            action: Some(actions::a_boss_death_blast),
            next: S_BOSS_DIE2,
            var1: 0,
            var2: 0,
        },
        StateDef {
            sprite: SPR_BOSS,
            frame: 4,
            tics: 10,
            action: Some(actions::a_boss_death_blast),
            next: S_BOSS_DIE3,
            var1: 0,
            var2: 0,
        },
        StateDef::simple(SPR_BOSS, 5, 10, S_NULL),
        // Stationary props.
        StateDef::simple(SPR_TURRET, 0, -1, S_TURRET),
        StateDef::simple(SPR_CRATE, 0, -1, S_CRATE),
        StateDef::simple(SPR_CONE, 0, -1, S_CONE),
        StateDef::simple(SPR_SPRING, 0, -1, S_SPRING_IDLE),
        StateDef::simple(SPR_SPRING, 1, 4, S_SPRING_BOUNCE2),
        StateDef::simple(SPR_SPRING, 2, 4, S_SPRING_IDLE),
        StateDef::simple(SPR_RAIN, 0, -1, S_RAIN),
        StateDef::simple(SPR_CHECKPOINT, 0, -1, S_CHECKPOINT),
        StateDef::simple(SPR_OVERLAY, 0, -1, S_OVERLAY),
    ];
    debug_assert_eq!(table.len(), STATE_COUNT);
    table
}

/// Coarse animation category for the presentation boundary, derived only by
/// the player-variant state transition.
pub fn player_anim_for(state: StateId) -> PlayerAnim {
    match state {
        S_KART_DRIVE1 | S_KART_DRIVE2 => PlayerAnim::Drive,
        S_KART_DRIFT => PlayerAnim::Drift,
        S_KART_SPIN1 | S_KART_SPIN2 | S_KART_SPIN3 | S_KART_SPIN4 => PlayerAnim::Spin,
        S_KART_DEAD => PlayerAnim::Dead,
        _ => PlayerAnim::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_declared_length_and_null_head() {
        let table = state_table();
        assert_eq!(table.len(), STATE_COUNT);
        assert_eq!(table[0].next, S_NULL);
        assert!(table[0].action.is_none());
    }

    #[test]
    fn looping_animations_reference_each_other() {
        let table = state_table();
        assert_eq!(table[S_KART_DRIVE1.0 as usize].next, S_KART_DRIVE2);
        assert_eq!(table[S_KART_DRIVE2.0 as usize].next, S_KART_DRIVE1);
        assert_eq!(table[S_ITEM_BOX_SPIN2.0 as usize].next, S_ITEM_BOX_SPIN1);
    }

    #[test]
    fn effect_chains_terminate() {
        let table = state_table();
        let mut state = S_EXPLOSION1;
        for _ in 0..8 {
            if state == S_NULL {
                return;
            }
            state = table[state.0 as usize].next;
        }
        panic!("explosion chain does not reach the terminal state");
    }

    #[test]
    fn every_next_reference_is_in_bounds() {
        let table = state_table();
        for (index, def) in table.iter().enumerate() {
            assert!(
                (def.next.0 as usize) < table.len(),
                "state {index} points past the table"
            );
        }
    }

    #[test]
    fn no_zero_duration_cycles_in_the_shipping_table() {
        let table = state_table();
        for start in 0..table.len() {
            let mut state = StateId(start as u16);
            let mut hops = 0;
            while !state.is_null() && table[state.0 as usize].tics == 0 {
                state = table[state.0 as usize].next;
                hops += 1;
                assert!(hops <= table.len(), "zero-duration cycle from {start}");
            }
        }
    }

    #[test]
    fn player_anim_classification_covers_kart_states() {
        assert_eq!(player_anim_for(S_KART_IDLE), PlayerAnim::Idle);
        assert_eq!(player_anim_for(S_KART_DRIVE2), PlayerAnim::Drive);
        assert_eq!(player_anim_for(S_KART_DRIFT), PlayerAnim::Drift);
        assert_eq!(player_anim_for(S_KART_SPIN3), PlayerAnim::Spin);
        assert_eq!(player_anim_for(S_KART_DEAD), PlayerAnim::Dead);
        assert_eq!(player_anim_for(S_BANANA), PlayerAnim::Idle);
    }
}
