use std::fmt;
use std::io::Write;

use crate::error::Res;

pub fn vec_to_string<T: fmt::Display>(v: &[T]) -> String {
    let vs: Vec<String> = v.iter().map(|x| format!("{}", x)).collect();
    "[".to_string() + &vs.join(", ") + "]"
}

// 1行追記 (親ディレクトリがなければ作成)
pub fn append_line(file_path: &str, line: &str) -> Res {
    let path = std::path::Path::new(file_path);
    if let Some(prefix) = path.parent() {
        if !prefix.as_os_str().is_empty() {
            std::fs::create_dir_all(prefix)?;
        }
    }
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(f, "{}", line)?;
    Ok(())
}

#[test]
fn test_vec_to_string() {
    assert_eq!(vec_to_string(&[1, 2, 3]), "[1, 2, 3]");
    assert_eq!(vec_to_string::<u8>(&[]), "[]");
}
