use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{NamingMapper, changed};
use crate::node::is_numeric;

// acronym run squeezed between two words: `startMIDDLELast`
static INNER_ACRONYM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z]+[0-9]?)([a-z])").expect("inner acronym pattern"));
// acronym (or single capital) followed by a word: `PDFLoad`, `AString`
static LEADING_ACRONYM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+[0-9]?)([a-z])").expect("leading acronym pattern"));
// trailing acronym: `simpleXML`
static TRAILING_ACRONYM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z])([A-Z]+[0-9]?)").expect("trailing acronym pattern"));
static REPEATED_UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").expect("underscore pattern"));

/// `startMIDDLELast` -> `start_middle_last`, `simpleXML` -> `simple_xml`.
///
/// A run of capitals is treated as one acronym word; when the run is
/// followed by a lower-case letter its last capital starts the next word.
#[derive(Debug, Default)]
pub struct SnakeCase {
    cache: DashMap<String, Option<String>>,
}

impl SnakeCase {
    fn convert(name: &str) -> String {
        if name.to_uppercase() == name {
            return name.to_lowercase();
        }

        let snake = INNER_ACRONYM.replace_all(name, |caps: &Captures| {
            let run = &caps[2];
            let (acronym, next) = run.split_at(run.len() - 1);
            format!("{}_{}_{}{}", &caps[1], acronym.to_lowercase(), next.to_lowercase(), &caps[3])
        });
        let snake = LEADING_ACRONYM.replace_all(&snake, |caps: &Captures| {
            let whole = &caps[0];
            let (head, tail) = whole.split_at(whole.len() - 2);
            format!("{}_{}", head.to_lowercase(), tail.to_lowercase())
        });
        let snake = TRAILING_ACRONYM.replace_all(&snake, |caps: &Captures| {
            format!("{}_{}", &caps[1], caps[2].to_lowercase())
        });

        let snake = snake.to_lowercase();
        REPEATED_UNDERSCORE
            .replace_all(&snake, "_")
            .trim_start_matches('_')
            .to_owned()
    }
}

impl NamingMapper for SnakeCase {
    fn resolve(&self, name: &str) -> Option<String> {
        if is_numeric(name) {
            return None;
        }
        if let Some(hit) = self.cache.get(name) {
            return hit.clone();
        }
        let resolved = changed(Self::convert(name), name);
        self.cache.insert(name.to_owned(), resolved.clone());
        resolved
    }
}
