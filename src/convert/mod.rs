// 天鳳のプロトコル形式との相互変換
pub mod command;
pub mod meld;
pub mod tag;
pub mod xml;
