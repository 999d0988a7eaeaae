//! Store key layout
//!
//! Every key is namespaced by filter name, and per-level keys additionally by
//! level index, so two filters or two levels never share a key:
//!
//! ```text
//! sbf:{name}:meta               filter header (sizing parameters)
//! sbf:{name}:levels             level count (decimal counter)
//! sbf:{name}:level:{i}:meta     level sizing record
//! sbf:{name}:level:{i}:count    level item count (decimal counter)
//! sbf:{name}:level:{i}:bits     level bit region
//! ```

/// Root prefix of all keys written by this crate
pub const KEY_PREFIX: &str = "sbf";

/// Key builder for one filter name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterKeys {
    name: String,
}

impl FilterKeys {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> String {
        format!("{}:{}:meta", KEY_PREFIX, self.name)
    }

    pub fn level_count(&self) -> String {
        format!("{}:{}:levels", KEY_PREFIX, self.name)
    }

    pub fn level_meta(&self, index: u32) -> String {
        format!("{}:{}:level:{}:meta", KEY_PREFIX, self.name, index)
    }

    pub fn level_item_count(&self, index: u32) -> String {
        format!("{}:{}:level:{}:count", KEY_PREFIX, self.name, index)
    }

    pub fn level_bits(&self, index: u32) -> String {
        format!("{}:{}:level:{}:bits", KEY_PREFIX, self.name, index)
    }

    /// The three keys of one level
    pub fn level(&self, index: u32) -> [String; 3] {
        [
            self.level_meta(index),
            self.level_item_count(index),
            self.level_bits(index),
        ]
    }

    /// Every key of a filter with `level_count` levels
    pub fn all(&self, level_count: u32) -> Vec<String> {
        let mut keys = vec![self.header(), self.level_count()];
        for index in 0..level_count {
            keys.extend(self.level(index));
        }
        keys
    }
}
