use holdem_engine::config::TableConfig;
use holdem_engine::events::{GameEvent, MatchState, Outbound, Phase, Recipient};
use holdem_engine::player::PlayerAction;
use holdem_engine::session::Session;

const TOTAL_CHIPS: u32 = 40_000;

fn seated(seed: u64) -> (Session, Vec<Outbound>) {
    let mut session = Session::with_seed("FLOW01", TableConfig::default(), seed);
    let mut out = session.join("alice").expect("alice joins");
    out.extend(session.join("bob").expect("bob joins"));
    (session, out)
}

/// Picks a legal action for whoever is to act, cycling through checks,
/// bets, calls, raises and the occasional shove.
fn scripted_action(session: &Session, step: usize) -> (String, PlayerAction) {
    let snap = session.snapshot();
    let seat = snap.current_player.expect("someone to act");
    let me = &snap.players[seat];
    let max_bet = snap.players.iter().map(|p| p.current_bet).max().unwrap_or(0);
    let to_call = max_bet - me.current_bet;
    let last_raise = session.hand().map_or(100, |h| h.last_raise());

    let action = if step % 17 == 16 {
        PlayerAction::AllIn
    } else if to_call == 0 {
        if step % 3 == 0 && me.chips >= 100 {
            PlayerAction::Bet(100)
        } else {
            PlayerAction::Check
        }
    } else if step % 5 == 0 && me.chips >= to_call + last_raise {
        PlayerAction::Raise(last_raise)
    } else {
        PlayerAction::Call
    };
    (me.id.clone(), action)
}

fn assert_invariants(session: &Session, out: &[Outbound]) {
    for o in out {
        match &o.event {
            GameEvent::HoleCardsDealt { player_id, .. } => {
                assert_eq!(o.recipient, Recipient::Player(player_id.clone()));
            }
            GameEvent::CommunityCards { cards, phase } => {
                let expected = match phase {
                    Phase::Flop => 3,
                    Phase::Turn => 4,
                    Phase::River => 5,
                    other => panic!("community cards dealt on {other:?}"),
                };
                assert_eq!(cards.len(), expected);
            }
            _ => {}
        }
    }

    if session.state() != MatchState::InGame {
        return;
    }
    let hand = session.hand().expect("hand in progress");
    let contributed: u32 = session.players().iter().map(|p| p.total_bet()).sum();
    assert_eq!(hand.pot(), contributed);
    let stacks: u32 = session.players().iter().map(|p| p.chips()).sum();
    assert_eq!(stacks + hand.pot(), TOTAL_CHIPS);
    assert!(hand.community_cards().len() <= 5);
}

#[test]
fn scripted_match_preserves_chips_and_privacy() {
    let (mut session, out) = seated(2024);
    assert_invariants(&session, &out);

    for step in 0..2_000 {
        if session.state() != MatchState::InGame {
            break;
        }
        let (who, action) = scripted_action(&session, step);
        let out = session
            .act(&who, action.clone())
            .unwrap_or_else(|e| panic!("step {step}: {who} {action:?} rejected: {e}"));
        assert_invariants(&session, &out);
    }

    if session.state() == MatchState::GameOver {
        let stacks: Vec<u32> = session.players().iter().map(|p| p.chips()).collect();
        assert!(stacks.contains(&0));
        assert!(stacks.contains(&TOTAL_CHIPS));
    }
}

#[test]
fn same_seed_and_actions_replay_identically() {
    let run = |seed| {
        let (mut session, mut log) = seated(seed);
        for step in 0..60 {
            if session.state() != MatchState::InGame {
                break;
            }
            let (who, action) = scripted_action(&session, step);
            log.extend(session.act(&who, action).expect("legal action"));
        }
        log
    };
    assert_eq!(run(77), run(77));
}

#[test]
fn hand_numbers_increase_by_one() {
    let (mut session, _) = seated(5);
    let mut seen = Vec::new();
    for step in 0..400 {
        if session.state() != MatchState::InGame {
            break;
        }
        let (who, action) = scripted_action(&session, step);
        for o in session.act(&who, action).expect("legal action") {
            if let GameEvent::NewHand { hand_number, .. } = o.event {
                seen.push(hand_number);
            }
        }
    }
    assert!(seen.windows(2).all(|w| w[1] == w[0] + 1));
}

#[test]
fn game_over_is_terminal() {
    let (mut session, _) = seated(1);
    session.resign("alice").expect("resign");
    assert_eq!(session.state(), MatchState::GameOver);
    assert!(session.join("carol").is_err());
    assert!(session.act("bob", PlayerAction::Check).is_err());
    assert!(session.resign("bob").is_err());
}

#[test]
fn snapshot_never_reveals_hole_cards() {
    let (session, out) = seated(3);
    let json = serde_json::to_string(&session.snapshot()).expect("serialize");
    for o in out {
        if let GameEvent::HoleCardsDealt { cards, .. } = o.event {
            for card in cards {
                let card_json = serde_json::to_string(&card).expect("serialize");
                assert!(!json.contains(&card_json));
            }
        }
    }
}
