use super::*;

pub struct NopBuilder;

impl ActorBuilder for NopBuilder {
    fn get_default_config(&self) -> Config {
        Config {
            name: "Nop".to_string(),
            args: vec![],
        }
    }

    fn create(&self, config: Config) -> Box<dyn Actor> {
        Box::new(Nop::from_config(config))
    }
}

// ツモ切りと鳴きのスキップのみ
#[derive(Clone)]
pub struct Nop {
    config: Config,
}

impl Nop {
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }
}

impl Actor for Nop {
    fn select(&mut self, game: &GameData, event: &Notification) -> Option<Command> {
        match event {
            Notification::Draw { tile, .. } => Some(Command::Discard(tile.id)),
            Notification::Discard { seat, callable, .. } if *callable && *seat != game.self_seat => {
                Some(Command::Pass)
            }
            e if must_discard_after_meld(game, e) => {
                game.player().hand.last().map(|t| Command::Discard(t.id))
            }
            _ => None,
        }
    }

    fn get_config(&self) -> &Config {
        &self.config
    }
}

impl Listener for Nop {}

#[test]
fn test_nop() {
    let mut a = Nop::from_config(NopBuilder.get_default_config());
    let mut game = GameData::new();
    let t = game.draw(53).unwrap();

    let draw = Notification::Draw {
        tile: t,
        actions: None,
    };
    assert_eq!(a.select(&game, &draw), Some(Command::Discard(53)));

    let discard = Notification::Discard {
        seat: 2,
        tile: Tile::new(10).unwrap(),
        tsumogiri: true,
        callable: true,
    };
    assert_eq!(a.select(&game, &discard), Some(Command::Pass));
    assert_eq!(a.select(&game, &Notification::GameEnd), None);
}
