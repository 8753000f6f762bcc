// src/pathfinding.rs
//! Поиск пути A* по сетке
//!
//! Четырёхнаправленный поиск с чувствительными к рельефу стоимостями шага и
//! манхэттенской эвристикой (допустима: стоимость шага всегда >= 1).
//! `None` означает "маршрута нет" — для вызывающих это сигнал пропустить
//! соединение, а не ошибка.
//!
//! Здесь же живут классификаторы направлений: по смещениям предшественника
//! и преемника тайл получает метку (прямая/поворот/тупик), которую читает
//! только слой отрисовки.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::town::{TownTile, TownTileType};
use crate::world::{Biome, Poi, WorldTile};

/// Позиция на сетке: `(x, y)`.
pub type GridPos = (usize, usize);

/// Стоимость, при которой клетка считается непроходимой.
pub const BLOCKED: u32 = u32::MAX;

/// Обход соседей всегда в одном порядке: север, восток, юг, запад.
const DIRECTIONS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Сторона света на сетке. Ось Y растёт вниз.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    #[must_use]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    #[must_use]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Направление по единичному кардинальному смещению.
    #[must_use]
    pub fn from_offset(dx: i32, dy: i32) -> Option<Direction> {
        match (dx, dy) {
            (0, -1) => Some(Direction::North),
            (1, 0) => Some(Direction::East),
            (0, 1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }
}

/// Форма участка дороги или реки, выведенная из связей с соседями.
/// Потребляется только отрисовкой.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathShape {
    Vertical,
    Horizontal,
    CornerNe,
    CornerNw,
    CornerSe,
    CornerSw,
    TJunction,
    Cross,
    DeadEnd,
}

/// Метка формы по набору связей тайла.
#[must_use]
pub fn shape_from_connections(connections: &[Direction]) -> PathShape {
    let n = connections.contains(&Direction::North);
    let e = connections.contains(&Direction::East);
    let s = connections.contains(&Direction::South);
    let w = connections.contains(&Direction::West);

    match connections.len() {
        0 | 1 => PathShape::DeadEnd,
        2 => match (n, e, s, w) {
            (true, false, true, false) => PathShape::Vertical,
            (false, true, false, true) => PathShape::Horizontal,
            (true, true, false, false) => PathShape::CornerNe,
            (true, false, false, true) => PathShape::CornerNw,
            (false, true, true, false) => PathShape::CornerSe,
            _ => PathShape::CornerSw,
        },
        3 => PathShape::TJunction,
        _ => PathShape::Cross,
    }
}

/// Классификатор тайла внутри маршрута: по позициям предшественника и
/// преемника выводит метку прямой, поворота или тупика.
#[must_use]
pub fn path_direction(
    prev: Option<GridPos>,
    current: GridPos,
    next: Option<GridPos>,
) -> PathShape {
    let mut connections = Vec::with_capacity(2);
    for neighbor in [prev, next].into_iter().flatten() {
        let dx = neighbor.0 as i32 - current.0 as i32;
        let dy = neighbor.1 as i32 - current.1 as i32;
        if let Some(dir) = Direction::from_offset(dx, dy) {
            connections.push(dir);
        }
    }
    shape_from_connections(&connections)
}

fn manhattan(a: GridPos, b: GridPos) -> u32 {
    (a.0.abs_diff(b.0) + a.1.abs_diff(b.1)) as u32
}

/// Ядро A*: поиск по произвольной функции стоимости.
///
/// Стоимость начисляется за вход в клетку; `BLOCKED` исключает клетку из
/// поиска. Исключение — сама цель: маршрут к зданию заканчивается на его
/// пороге, поэтому заблокированная цель остаётся достижимой. Равные по
/// приоритету узлы упорядочены номером вставки, поэтому результат
/// полностью детерминирован.
pub fn find_path_with_costs<F>(
    width: usize,
    height: usize,
    cost: F,
    start: GridPos,
    goal: GridPos,
) -> Option<Vec<GridPos>>
where
    F: Fn(usize, usize) -> u32,
{
    if start.0 >= width || start.1 >= height || goal.0 >= width || goal.1 >= height {
        return None;
    }

    let total = width * height;
    let index = |p: GridPos| p.1 * width + p.0;

    let mut g_score = vec![u32::MAX; total];
    let mut came_from: Vec<Option<usize>> = vec![None; total];
    let mut closed = vec![false; total];
    let mut open: BinaryHeap<Reverse<(u32, u64, usize)>> = BinaryHeap::new();
    let mut insertion: u64 = 0;

    g_score[index(start)] = 0;
    open.push(Reverse((manhattan(start, goal), insertion, index(start))));

    while let Some(Reverse((_, _, current))) = open.pop() {
        if closed[current] {
            continue;
        }
        closed[current] = true;

        if current == index(goal) {
            // Восстановление маршрута от цели к старту
            let mut path = Vec::new();
            let mut cursor = Some(current);
            while let Some(idx) = cursor {
                path.push((idx % width, idx / width));
                cursor = came_from[idx];
            }
            path.reverse();
            return Some(path);
        }

        let cx = (current % width) as i32;
        let cy = (current / width) as i32;

        for &(dx, dy) in &DIRECTIONS {
            let nx = cx + dx;
            let ny = cy + dy;
            if nx < 0 || nx >= width as i32 || ny < 0 || ny >= height as i32 {
                continue;
            }
            let npos = (nx as usize, ny as usize);
            let nidx = index(npos);
            if closed[nidx] {
                continue;
            }

            let mut step = cost(npos.0, npos.1);
            if step == BLOCKED {
                if nidx != index(goal) {
                    continue;
                }
                step = 1;
            }

            let tentative = g_score[current].saturating_add(step);
            if tentative < g_score[nidx] {
                g_score[nidx] = tentative;
                came_from[nidx] = Some(current);
                insertion += 1;
                open.push(Reverse((
                    tentative.saturating_add(manhattan(npos, goal)),
                    insertion,
                    nidx,
                )));
            }
        }
    }

    None
}

/// Стоимость шага по тайлу мира. Вода дорогая, но проходимая — крайняя
/// мера, не стена: вырожденные карты всё равно разрешаются.
#[must_use]
pub fn world_step_cost(tile: &WorldTile) -> u32 {
    match tile.biome {
        Biome::Water => 100,
        Biome::Beach => 5,
        Biome::Plains => match tile.poi {
            Some(Poi::Mountain) => 5,
            Some(Poi::Forest) => 2,
            _ => 1,
        },
    }
}

/// Кратчайший маршрут по карте мира, включая обе конечные точки.
///
/// Маршруты соединяют объекты суши: если старт или цель стоят в воде,
/// соединять нечего и результат `None`.
#[must_use]
pub fn find_path(
    map: &[Vec<WorldTile>],
    start: GridPos,
    goal: GridPos,
) -> Option<Vec<GridPos>> {
    let height = map.len();
    let width = map.first().map_or(0, Vec::len);
    if start.0 >= width || start.1 >= height || goal.0 >= width || goal.1 >= height {
        return None;
    }
    if map[start.1][start.0].biome == Biome::Water || map[goal.1][goal.0].biome == Biome::Water {
        return None;
    }
    find_path_with_costs(width, height, |x, y| world_step_cost(&map[y][x]), start, goal)
}

fn town_step_cost(tile: &TownTile) -> u32 {
    match tile.tile_type {
        TownTileType::DirtPath
        | TownTileType::StonePath
        | TownTileType::TownSquare
        | TownTileType::Bridge => 1,
        TownTileType::Grass => 3,
        TownTileType::FarmField => 6,
        TownTileType::Water => 40,
        TownTileType::Building | TownTileType::Wall | TownTileType::KeepWall => BLOCKED,
    }
}

/// Маршрут по внутренней сетке города: существующие дороги дешёвые, трава
/// дороже, вода мостится, здания и стены обходятся.
#[must_use]
pub fn generate_town_paths(
    map: &[Vec<TownTile>],
    start: GridPos,
    goal: GridPos,
) -> Option<Vec<GridPos>> {
    let height = map.len();
    let width = map.first().map_or(0, Vec::len);
    find_path_with_costs(width, height, |x, y| town_step_cost(&map[y][x]), start, goal)
}

/// Помечает тайлы маршрута как дорогу: связи с соседями по маршруту плюс
/// метка формы. Повторные дороги через тайл объединяют связи.
pub fn mark_path_tiles(map: &mut [Vec<WorldTile>], path: &[GridPos]) {
    for (i, &(x, y)) in path.iter().enumerate() {
        let prev = if i > 0 { Some(path[i - 1]) } else { None };
        let next = path.get(i + 1).copied();

        let tile = &mut map[y][x];
        tile.has_path = true;
        for neighbor in [prev, next].into_iter().flatten() {
            let dx = neighbor.0 as i32 - x as i32;
            let dy = neighbor.1 as i32 - y as i32;
            if let Some(dir) = Direction::from_offset(dx, dy) {
                if !tile.path_connections.contains(&dir) {
                    tile.path_connections.push(dir);
                }
            }
        }
        tile.path_direction = Some(shape_from_connections(&tile.path_connections));
    }
}

/// То же для рек: отдельный набор полей, чтобы дорога и река могли
/// пересекаться на одном тайле.
pub fn mark_river_tiles(map: &mut [Vec<WorldTile>], path: &[GridPos]) {
    for (i, &(x, y)) in path.iter().enumerate() {
        let prev = if i > 0 { Some(path[i - 1]) } else { None };
        let next = path.get(i + 1).copied();

        let tile = &mut map[y][x];
        tile.has_river = true;
        for neighbor in [prev, next].into_iter().flatten() {
            let dx = neighbor.0 as i32 - x as i32;
            let dy = neighbor.1 as i32 - y as i32;
            if let Some(dir) = Direction::from_offset(dx, dy) {
                if !tile.river_connections.contains(&dir) {
                    tile.river_connections.push(dir);
                }
            }
        }
        tile.river_direction = Some(shape_from_connections(&tile.river_connections));
    }
}
