// mainから直接呼び出すアプリケーションのモジュール

mod tenhou;

pub use tenhou::{perform, TenhouApp};
