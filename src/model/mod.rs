// 麻雀のデータモデル
mod action;
mod define;
mod event;
mod game;
mod meld;
mod player;
mod tile;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use action::*;
pub use define::*;
pub use event::*;
pub use game::*;
pub use meld::*;
pub use player::*;
pub use tile::*;
