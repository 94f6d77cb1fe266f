mod nop;
mod random;

use std::fmt;

use crate::error::{Error, Res};
use crate::listener::Listener;
use crate::model::*;
use crate::util::variant::*;

#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    pub args: Vec<Arg>,
}

// Actor trait
// 通知を受け取り, 必要であればサーバーに送るコマンドを返す
pub trait Actor: Listener {
    // 通知ごとに呼び出される ゲーム状態は通知の内容を反映済み
    fn select(&mut self, game: &GameData, event: &Notification) -> Option<Command>;

    // Actorの詳細表示用
    fn get_config(&self) -> &Config;
}

impl fmt::Debug for dyn Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conf = self.get_config();
        let arg_str = conf
            .args
            .iter()
            .map(|a| format!("{}={}", a.name, a.value))
            .collect::<Vec<String>>()
            .join(",");
        write!(f, "{}({})", conf.name, arg_str)
    }
}

trait ActorBuilder {
    fn get_default_config(&self) -> Config;
    fn create(&self, config: Config) -> Box<dyn Actor>;
}

// "RandomDiscard(7)" のように名前と引数を指定
pub fn create_actor(exp: &str) -> Res<Box<dyn Actor>> {
    let builders: Vec<Box<dyn ActorBuilder>> = vec![
        Box::new(nop::NopBuilder {}),
        Box::new(random::RandomDiscardBuilder {}),
    ];

    let name: &str;
    let args: Vec<&str>;
    let paren_left = exp.find('(');
    let paren_right = exp.rfind(')');
    if let (Some(l), Some(r)) = (paren_left, paren_right) {
        if r < l {
            return Err(Error::Config(format!("invalid paren: {}", exp)));
        }

        args = exp[l + 1..r].split(',').collect();
        name = &exp[..l];
    } else {
        args = vec![];
        name = exp;
    }

    for b in &builders {
        let mut conf = b.get_default_config();
        if name == conf.name {
            if conf.args.len() < args.len() {
                return Err(Error::Config(format!(
                    "expected {} arguments for {}. but {} arguments are provided.",
                    conf.args.len(),
                    name,
                    args.len(),
                )));
            }

            for (i, &a) in args.iter().enumerate() {
                if !a.is_empty() {
                    conf.args[i].value = conf.args[i]
                        .value
                        .parse_as(a)
                        .map_err(|e| Error::Config(format!("{}: {}", e, a)))?;
                }
            }

            return Ok(b.create(conf));
        }
    }

    Err(Error::Config(format!("unknown actor name: {}", name)))
}

// 鳴き(チー・ポン)の直後はツモなしで打牌する
fn must_discard_after_meld(game: &GameData, event: &Notification) -> bool {
    match event {
        Notification::Meld { seat, meld } => {
            *seat == game.self_seat && matches!(meld.meld_type, MeldType::Chii | MeldType::Pon)
        }
        _ => false,
    }
}

#[test]
fn test_create_actor() {
    let a = create_actor("Nop").unwrap();
    assert_eq!(format!("{:?}", a), "Nop()");
    let a = create_actor("RandomDiscard(7)").unwrap();
    assert_eq!(format!("{:?}", a), "RandomDiscard(seed=7)");
    let a = create_actor("RandomDiscard()").unwrap();
    assert_eq!(a.get_config().args[0].value.as_int(), Some(0));

    assert!(matches!(create_actor("Manual"), Err(Error::Config(_))));
    assert!(matches!(create_actor("Nop(1)"), Err(Error::Config(_))));
    assert!(matches!(create_actor("RandomDiscard(x)"), Err(Error::Config(_))));
    assert!(matches!(create_actor("RandomDiscard)1("), Err(Error::Config(_))));
}
