// src/rng.rs
//! Детерминированный генератор случайных чисел
//!
//! Точный порт линейно-конгруэнтного генератора из оригинального движка:
//! `state = (state * 9301 + 49297) mod 233280`, значение `state / 233280`.
//! Один и тот же сид обязан давать одну и ту же последовательность, и каждый
//! проход генерации потребляет её в фиксированном порядке — на этом
//! инварианте держится весь конвейер.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::GenerationError;

const MULTIPLIER: i64 = 9301;
const INCREMENT: i64 = 49_297;
const MODULUS: i64 = 233_280;

/// LCG-поток чисел с плавающей точкой в диапазоне `[0, 1)`.
#[derive(Debug, Clone)]
pub struct GameRng {
    state: i64,
}

impl GameRng {
    #[must_use]
    pub fn new(seed: i64) -> Self {
        Self {
            state: seed.rem_euclid(MODULUS),
        }
    }

    /// Следующее значение потока в `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER + INCREMENT).rem_euclid(MODULUS);
        self.state as f64 / MODULUS as f64
    }

    /// Целое в диапазоне `[lo, hi]` включительно. Одно обращение к потоку.
    pub fn range(&mut self, lo: i64, hi: i64) -> i64 {
        debug_assert!(lo <= hi);
        lo + (self.next_f64() * (hi - lo + 1) as f64) as i64
    }

    /// Индекс в `[0, len)`. Одно обращение к потоку.
    pub fn index(&mut self, len: usize) -> usize {
        (self.next_f64() * len as f64) as usize
    }

    /// Случайный элемент непустого среза. Одно обращение к потоку.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.index(items.len())]
    }

    /// `true` с вероятностью `p`. Одно обращение к потоку.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Тасование Фишера–Йетса: ровно `len - 1` обращений к потоку.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.index(i + 1);
            items.swap(i, j);
        }
    }
}

/// Локальный сид города, выведенный из мирового сида и координат тайла.
///
/// Фиксированная функция смешивания: потеря кэша карт городов не страшна,
/// город всегда пересчитывается в точности тем же.
#[must_use]
pub fn town_seed(world_seed: i64, x: usize, y: usize) -> i64 {
    world_seed + (x as i64) * 1000 + (y as i64) * 10_000
}

/// Позиционный сид NPC: чистый хэш от `(сид, x, y, слот)`.
///
/// Никаких обращений к общему потоку — воспроизводимость NPC не зависит от
/// порядка вызовов населения.
#[must_use]
pub fn npc_seed(seed: i64, x: usize, y: usize, slot: usize) -> i64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    x.hash(&mut hasher);
    y.hash(&mut hasher);
    slot.hash(&mut hasher);
    hasher.finish() as i64
}

/// Стабильный сид для легаси-сохранений без явного мирового сида.
///
/// Хэш от `(id сессии, таймстемп, отсортированные имена героев)`. Ошибка
/// только когда хэшировать вообще нечего — в этом случае город пересоздать
/// невозможно и вызывающая сторона показывает ошибку пользователю.
pub fn legacy_world_seed(
    session_id: &str,
    timestamp: i64,
    hero_names: &[String],
) -> Result<i64, GenerationError> {
    if session_id.is_empty() && hero_names.is_empty() {
        return Err(GenerationError::NoUsableSeed);
    }

    let mut sorted: Vec<&str> = hero_names.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = DefaultHasher::new();
    session_id.hash(&mut hasher);
    timestamp.hash(&mut hasher);
    for name in sorted {
        name.hash(&mut hasher);
    }
    Ok(hasher.finish() as i64)
}
