// src/cache.rs
//! Кэш карт городов
//!
//! Явный объект, которым владеет состояние сессии: добавление без
//! перезаписи, ключ — имя города. Персистентный слой сериализует кэш
//! дословно; при потере кэша город пересчитывается из своего сида тем же
//! самым, поэтому кэш — ускорение, а не источник истины.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::town::TownMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TownMapCache {
    entries: HashMap<String, TownMap>,
}

impl TownMapCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, town_name: &str) -> Option<&TownMap> {
        self.entries.get(town_name)
    }

    #[must_use]
    pub fn contains(&self, town_name: &str) -> bool {
        self.entries.contains_key(town_name)
    }

    /// Карта из кэша либо вычисленная и закэшированная. Существующая
    /// запись никогда не перезаписывается.
    pub fn get_or_generate<F>(&mut self, town_name: &str, generate: F) -> &TownMap
    where
        F: FnOnce() -> TownMap,
    {
        self.entries
            .entry(town_name.to_string())
            .or_insert_with(generate)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TownSize;
    use crate::pathfinding::Direction;
    use crate::town::generate_town_map;

    fn town(seed: i64) -> TownMap {
        generate_town_map(TownSize::Hamlet, "Oakford", Direction::South, seed, false, None)
    }

    #[test]
    fn generates_once_per_name() {
        let mut cache = TownMapCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            cache.get_or_generate("Oakford", || {
                calls += 1;
                town(1)
            });
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("Oakford"));
    }

    #[test]
    fn existing_entry_is_never_replaced() {
        let mut cache = TownMapCache::new();
        cache.get_or_generate("Oakford", || town(1));
        let first = cache.get("Oakford").unwrap().clone();
        cache.get_or_generate("Oakford", || town(2));
        assert_eq!(cache.get("Oakford").unwrap(), &first);
    }

    #[test]
    fn cache_roundtrips_through_json() {
        let mut cache = TownMapCache::new();
        cache.get_or_generate("Oakford", || town(5));
        let json = serde_json::to_string(&cache).unwrap();
        let back: TownMapCache = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("Oakford"), cache.get("Oakford"));
    }
}
