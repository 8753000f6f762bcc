// src/config.rs
//! Конфигурация генерации мира
//!
//! Этот модуль определяет входные параметры конвейера генерации:
//! - Размеры сетки мира и мировой сид
//! - Очередь пользовательских названий (города, затем горы)
//! - Таблицу размеров городов (габариты, количество зданий, площадь)
//!
//! Структуры поддерживают сериализацию в TOML/JSON для настройки через
//! конфигурационные файлы.

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::GenerationError;

/// Размер города
///
/// Определяет габариты внутренней карты, квоту зданий и состав "важных"
/// построек. Лестница размеров тасуется при раздаче городам мира.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TownSize {
    Hamlet,
    Village,
    Town,
    City,
}

impl TownSize {
    /// Габариты квадратной карты города в тайлах.
    ///
    /// # Примеры
    /// ```
    /// use realmgen::config::TownSize;
    /// assert_eq!(TownSize::Hamlet.dimensions(), (8, 8));
    /// assert_eq!(TownSize::City.dimensions(), (20, 20));
    /// ```
    #[must_use]
    pub fn dimensions(self) -> (usize, usize) {
        match self {
            TownSize::Hamlet => (8, 8),
            TownSize::Village => (12, 12),
            TownSize::Town => (16, 16),
            TownSize::City => (20, 20),
        }
    }

    /// Общая квота зданий (важные постройки + жилые дома).
    #[must_use]
    pub fn building_count(self) -> usize {
        match self {
            TownSize::Hamlet => 3,
            TownSize::Village => 6,
            TownSize::Town => 10,
            TownSize::City => 15,
        }
    }

    /// Сторона центральной площади.
    #[must_use]
    pub fn square_side(self) -> usize {
        match self {
            TownSize::Hamlet => 1,
            TownSize::Village | TownSize::Town => 2,
            TownSize::City => 3,
        }
    }

    /// Ширина главной дороги.
    #[must_use]
    pub fn road_width(self) -> usize {
        match self {
            TownSize::Hamlet | TownSize::Village => 1,
            TownSize::Town | TownSize::City => 2,
        }
    }

    /// Радиус вокруг центра, свободный от жилых домов.
    #[must_use]
    pub fn house_exclusion_radius(self) -> usize {
        match self {
            TownSize::Hamlet => 1,
            TownSize::Village | TownSize::Town => 2,
            TownSize::City => 3,
        }
    }

    /// Количество декоративных объектов (деревья, кусты, цветы).
    #[must_use]
    pub fn decoration_count(self) -> usize {
        match self {
            TownSize::Hamlet => 4,
            TownSize::Village => 8,
            TownSize::Town => 12,
            TownSize::City => 16,
        }
    }

    /// Вес для сортировки по значимости: город важнее деревушки.
    #[must_use]
    pub fn importance(self) -> u8 {
        match self {
            TownSize::Hamlet => 0,
            TownSize::Village => 1,
            TownSize::Town => 2,
            TownSize::City => 3,
        }
    }

    /// Лестница размеров в порядке возрастания.
    #[must_use]
    pub fn ladder() -> [TownSize; 4] {
        [
            TownSize::Hamlet,
            TownSize::Village,
            TownSize::Town,
            TownSize::City,
        ]
    }
}

/// Основные параметры генерации мира
///
/// Полная конфигурация одного мира. Поддерживает загрузку из TOML-файлов.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Сид генератора случайных чисел (детерминированная генерация)
    pub seed: i64,

    /// Ширина карты мира в тайлах (по умолчанию 10)
    #[serde(default = "default_width")]
    pub width: usize,

    /// Высота карты мира в тайлах (по умолчанию 10)
    #[serde(default = "default_height")]
    pub height: usize,

    /// Очередь пользовательских названий: сначала расходуется на города
    /// (в порядке значимости), остаток — на горные массивы.
    #[serde(default)]
    pub custom_names: Vec<String>,
}

impl GenerationParams {
    /// Загружает параметры из TOML-файла.
    ///
    /// # Пример
    /// ```toml
    /// # world.toml
    /// seed = 4242
    /// width = 10
    /// height = 10
    /// custom_names = ["Karaz Morn"]
    /// ```
    pub fn from_toml_file(path: &str) -> Result<Self, GenerationError> {
        let contents = fs::read_to_string(path)?;
        let params: Self = toml::from_str(&contents)?;
        Ok(params)
    }
}

fn default_width() -> usize {
    10
}
fn default_height() -> usize {
    10
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            // Случайный сид только здесь: внутри конвейера вся случайность
            // идёт из GameRng.
            seed: rand::random(),
            width: 10,
            height: 10,
            custom_names: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_table_matches_ladder() {
        assert_eq!(TownSize::Hamlet.dimensions(), (8, 8));
        assert_eq!(TownSize::Hamlet.building_count(), 3);
        assert_eq!(TownSize::Village.dimensions(), (12, 12));
        assert_eq!(TownSize::Village.building_count(), 6);
        assert_eq!(TownSize::Town.dimensions(), (16, 16));
        assert_eq!(TownSize::Town.building_count(), 10);
        assert_eq!(TownSize::City.dimensions(), (20, 20));
        assert_eq!(TownSize::City.building_count(), 15);
    }

    #[test]
    fn importance_orders_city_first() {
        let mut sizes = TownSize::ladder();
        sizes.sort_by_key(|s| std::cmp::Reverse(s.importance()));
        assert_eq!(sizes[0], TownSize::City);
        assert_eq!(sizes[3], TownSize::Hamlet);
    }

    #[test]
    fn params_parse_with_defaults() {
        let params: GenerationParams = toml::from_str("seed = 7").unwrap();
        assert_eq!(params.seed, 7);
        assert_eq!(params.width, 10);
        assert_eq!(params.height, 10);
        assert!(params.custom_names.is_empty());
    }
}
