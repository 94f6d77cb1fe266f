use rand::seq::SliceRandom;

use super::*;

pub struct RandomDiscardBuilder;

impl ActorBuilder for RandomDiscardBuilder {
    fn get_default_config(&self) -> Config {
        Config {
            name: "RandomDiscard".to_string(),
            args: vec![Arg::int("seed", 0)],
        }
    }

    fn create(&self, config: Config) -> Box<dyn Actor> {
        Box::new(RandomDiscard::from_config(config))
    }
}

#[derive(Clone)]
pub struct RandomDiscard {
    config: Config,
    rng: rand::rngs::StdRng,
}

impl RandomDiscard {
    pub fn from_config(config: Config) -> Self {
        let seed = config.args[0].value.as_int().unwrap_or(0) as u64;
        Self {
            config,
            rng: rand::SeedableRng::seed_from_u64(seed),
        }
    }

    fn random_discard(&mut self, game: &GameData) -> Option<Command> {
        game.player()
            .hand
            .choose(&mut self.rng)
            .map(|t| Command::Discard(t.id))
    }
}

impl Actor for RandomDiscard {
    fn select(&mut self, game: &GameData, event: &Notification) -> Option<Command> {
        match event {
            Notification::Draw { .. } => {
                // リーチ後はツモ切りのみ
                if game.player().reached {
                    return game.last_tile.map(Command::Discard);
                }
                self.random_discard(game)
            }
            Notification::Discard { seat, callable, .. } if *callable && *seat != game.self_seat => {
                Some(Command::Pass)
            }
            e if must_discard_after_meld(game, e) => self.random_discard(game),
            _ => None,
        }
    }

    fn get_config(&self) -> &Config {
        &self.config
    }
}

impl Listener for RandomDiscard {}

#[test]
fn test_random_discard() {
    let mut a = RandomDiscard::from_config(RandomDiscardBuilder.get_default_config());
    let mut game = GameData::new();
    for id in [0, 4, 8, 12] {
        game.draw(id).unwrap();
    }
    let draw = Notification::Draw {
        tile: Tile::new(12).unwrap(),
        actions: None,
    };
    for _ in 0..10 {
        match a.select(&game, &draw) {
            Some(Command::Discard(id)) => assert!(game.player().has_in_hand(id)),
            c => panic!("unexpected: {:?}", c),
        }
    }

    game.players[0].reached = true;
    assert_eq!(a.select(&game, &draw), Some(Command::Discard(12)));
}
