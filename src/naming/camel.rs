use dashmap::DashMap;

use super::{NamingMapper, changed};
use crate::node::is_numeric;

/// `pro_int` -> `proInt`, `PDF_load` -> `pdfLoad`.
///
/// Splits on the configured delimiters, lower-cases every fragment and
/// capitalizes all but the first. Names without a delimiter are left alone.
#[derive(Debug)]
pub struct CamelCase {
    delimiters: Vec<char>,
    cache: DashMap<String, Option<String>>,
}

impl Default for CamelCase {
    fn default() -> Self {
        Self::with_delimiters(['_'])
    }
}

impl CamelCase {
    pub fn with_delimiters(delimiters: impl IntoIterator<Item = char>) -> Self {
        Self { delimiters: delimiters.into_iter().collect(), cache: DashMap::new() }
    }

    fn convert(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        for (i, word) in name.split(|c| self.delimiters.contains(&c)).enumerate() {
            let word = word.to_lowercase();
            if i == 0 {
                out.push_str(&word);
                continue;
            }
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
        out
    }
}

impl NamingMapper for CamelCase {
    fn resolve(&self, name: &str) -> Option<String> {
        if is_numeric(name) || !name.contains(|c: char| self.delimiters.contains(&c)) {
            return None;
        }
        if let Some(hit) = self.cache.get(name) {
            return hit.clone();
        }
        let resolved = changed(self.convert(name), name);
        self.cache.insert(name.to_owned(), resolved.clone());
        resolved
    }
}
