// 受信した断片を1つのXML要素として解析
use std::collections::HashMap;

use crate::error::{Error, Res};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    attrs: HashMap<String, String>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    // 空文字列は属性なしと同じ扱い
    pub fn attr_nonempty(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|s| !s.is_empty())
    }

    pub fn require(&self, name: &str) -> Res<&str> {
        self.attr(name).ok_or_else(|| Error::MissingAttribute {
            tag: self.name.clone(),
            attr: name.to_string(),
        })
    }

    pub fn require_num<T: std::str::FromStr>(&self, name: &str) -> Res<T> {
        parse_num(self.require(name)?)
    }

    pub fn has(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }
}

// 要素でない断片(テキストなど)は None
pub fn parse_element(fragment: &str) -> Res<Option<Element>> {
    let text = fragment.trim();
    if !text.starts_with('<') {
        return Ok(None);
    }

    // "&"がエスケープされずに届くことがある
    let text = text.replace('&', "&amp;");
    let doc = roxmltree::Document::parse(&text).map_err(|e| Error::Xml(format!("{} ({})", e, fragment)))?;
    let root = doc.root_element();
    let attrs = root
        .attributes()
        .map(|a| (a.name().to_string(), a.value().to_string()))
        .collect();

    Ok(Some(Element {
        name: root.tag_name().name().to_string(),
        attrs,
    }))
}

pub fn parse_num<T: std::str::FromStr>(s: &str) -> Res<T> {
    s.trim()
        .parse()
        .map_err(|_| Error::InvalidNumber(s.to_string()))
}

// "1,2,3" -> [1, 2, 3] 空文字列は空のリスト
pub fn parse_list<T: std::str::FromStr>(s: &str) -> Res<Vec<T>> {
    if s.trim().is_empty() {
        return Ok(vec![]);
    }
    s.split(',').map(parse_num).collect()
}

#[test]
fn test_parse_element() {
    let e = parse_element(r#"<INIT seed="0,0,0,3,4,12" ten="250,250,250,250" oya="0"/>"#)
        .unwrap()
        .unwrap();
    assert_eq!(e.name, "INIT");
    assert_eq!(e.attr("oya"), Some("0"));
    assert_eq!(parse_list::<u32>(e.require("seed").unwrap()).unwrap(), vec![0, 0, 0, 3, 4, 12]);
    assert_eq!(e.require_num::<u32>("oya").unwrap(), 0);
    assert!(matches!(e.require("hai"), Err(Error::MissingAttribute { .. })));
}

#[test]
fn test_parse_element_quirks() {
    // エスケープされていない"&"
    let e = parse_element(r#"<HELO uname="a&b" />"#).unwrap().unwrap();
    assert_eq!(e.attr("uname"), Some("a&b"));

    assert_eq!(parse_element("hello").unwrap(), None);
    assert_eq!(parse_element("").unwrap(), None);
    assert!(matches!(parse_element("<BROKEN"), Err(Error::Xml(_))));
    assert!(parse_list::<u32>("1,x").is_err());
    assert!(parse_list::<u32>("").unwrap().is_empty());
}
