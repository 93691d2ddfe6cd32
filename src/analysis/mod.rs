use crate::gameplay::action::Action;
use crate::gameplay::game::Game;
use crate::gameplay::turn::Turn;
use crate::mccfr::path::Path;
use crate::players::ChooseAction;
use crate::Utility;

/// head-to-head evaluation between two agents. seats rotate
/// every hand so positional edge cancels over the match;
/// hands are dealt from per-hand seeded rngs so a match is
/// reproducible.
pub fn duel(
    hero: &dyn ChooseAction,
    villain: &dyn ChooseAction,
    hands: usize,
    seed: u64,
) -> (Utility, Utility) {
    let mut scores = (0.0, 0.0);
    for hand in 0..hands {
        let ref mut rng = crate::rng(seed, ("duel", hand));
        let hero_seat = hand % crate::N;
        let mut game = Game::root(rng);
        let mut path = Path::default();
        while !game.is_terminal() {
            game = match game.turn() {
                Turn::Terminal => unreachable!(),
                Turn::Chance => {
                    path.advance_street();
                    game.apply(Action::Draw(game.draw(rng)))
                }
                Turn::Choice(seat) => {
                    let player = if seat == hero_seat { hero } else { villain };
                    let action = player.choose(&game, path, seat, rng);
                    path.push(game.edgify(&action));
                    game.apply(action)
                }
            };
        }
        scores.0 += game.payoff(hero_seat);
        scores.1 += game.payoff(1 - hero_seat);
        log::trace!("hand {:>6}: {:+.0} / {:+.0}", hand, scores.0, scores.1);
    }
    scores
}

/// mean profit per hand in big blinds, the usual yardstick
pub fn bb_per_hand(score: Utility, hands: usize) -> Utility {
    score / crate::B_BLIND as Utility / hands.max(1) as Utility
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::BucketConfig;
    use crate::abstraction::Model;
    use crate::mccfr::profile::Profile;
    use crate::players::Advisor;
    use crate::players::Caller;

    #[test]
    fn matches_are_zero_sum_and_reproducible() {
        let model = Model::seeded(BucketConfig {
            k_pref: 4,
            k_flop: 4,
            k_turn: 4,
            k_rive: 4,
            ..BucketConfig::default()
        });
        let blueprint = Profile::default();
        let advisor = Advisor {
            blueprint: &blueprint,
            model: &model,
        };
        let (a1, b1) = duel(&advisor, &Caller, 20, 17);
        let (a2, b2) = duel(&advisor, &Caller, 20, 17);
        assert!(a1 + b1 == 0.0);
        assert!((a1, b1) == (a2, b2));
        assert!(bb_per_hand(a1, 20).abs() <= crate::STACK as Utility);
    }
}
