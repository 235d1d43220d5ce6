use gamebot_engine::executor::ExecutorState;
use gamebot_engine::strategy::ScriptedStrategy;
use gamebot_engine::Engine;
use gamebot_protocol::{Button, ButtonState, FrameSnapshot, PlayerId, PlayerSnapshot};
use proptest::prelude::*;

fn player_strategy() -> impl Strategy<Value = PlayerSnapshot> {
    (0i32..=100, 0i32..=400, 100i32..=200, any::<bool>(), any::<bool>(), any::<[bool; 12]>()).prop_map(
        |(health, x, y, jumping, crouching, held)| PlayerSnapshot {
            player_id: 1,
            health,
            x,
            y,
            jumping,
            crouching,
            buttons: ButtonState::pressed(Button::ALL.into_iter().zip(held).filter(|(_, h)| *h).map(|(b, _)| b)),
            ..Default::default()
        },
    )
}

fn frame_strategy() -> impl Strategy<Value = FrameSnapshot> {
    (player_strategy(), player_strategy(), 0i32..=99, any::<bool>()).prop_map(|(player1, player2, timer, round_over)| {
        FrameSnapshot {
            player1,
            player2,
            timer,
            round_started: true,
            round_over,
            result: None,
        }
    })
}

fn player_id_strategy() -> impl Strategy<Value = PlayerId> {
    prop_oneof![Just(PlayerId::One), Just(PlayerId::Two)]
}

fn engine(player: PlayerId, seed: u64) -> Engine {
    Engine::builder(player)
        .with_strategy(ScriptedStrategy::with_seed(seed).unwrap())
        .with_session_id(1)
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn one_maneuver_in_flight_at_a_time(
        frames in prop::collection::vec(frame_strategy(), 1..120),
        player in player_id_strategy(),
        seed in any::<u64>(),
    ) {
        let mut engine = engine(player, seed);

        for frame in &frames {
            let before = engine.executor_state().clone();
            engine.tick(frame).unwrap();

            match (&before, engine.executor_state()) {
                (_, ExecutorState::Running { sequence, cursor }) => {
                    prop_assert!(*cursor >= 1 && *cursor < sequence.len());
                },
                (_, ExecutorState::Idle) => {},
            }

            // A maneuver that was running and hasn't finished is never swapped out.
            if let (
                ExecutorState::Running { sequence: was, cursor: at },
                ExecutorState::Running { sequence: now, cursor },
            ) = (&before, engine.executor_state())
            {
                prop_assert!(was.same_as(now));
                prop_assert_eq!(*cursor, at + 1);
            }
        }
    }

    #[test]
    fn same_seed_same_button_history(
        frames in prop::collection::vec(frame_strategy(), 1..120),
        player in player_id_strategy(),
        seed in any::<u64>(),
    ) {
        let mut a = engine(player, seed);
        let mut b = engine(player, seed);

        for frame in &frames {
            prop_assert_eq!(a.tick(frame).unwrap(), b.tick(frame).unwrap());
        }
    }

    #[test]
    fn other_slot_is_always_released(
        frames in prop::collection::vec(frame_strategy(), 1..60),
        player in player_id_strategy(),
        seed in any::<u64>(),
    ) {
        let mut engine = engine(player, seed);

        for frame in &frames {
            let command = engine.tick(frame).unwrap();
            prop_assert!(command.buttons(player.opponent()).is_released());
            prop_assert_eq!(command.buttons(player), engine.buttons());
        }
    }
}
