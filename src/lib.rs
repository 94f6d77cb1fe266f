#![warn(rust_2018_idioms)]
// 構造的な意味合いや一貫性を保つために以下のclippy警告は無効化
#![allow(clippy::needless_range_loop)]
#![allow(clippy::single_match)]

mod actor;
mod convert;
mod listener;

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod util;

pub use client::{PlatformClient, TenhouClient};
pub use error::{Error, Res};
