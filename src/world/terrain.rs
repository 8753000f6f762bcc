// src/world/terrain.rs
//! Проходы рельефа: побережье, озёра, леса, горные хребты, балансировка
//! квадрантов и согласование названий гор.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::names;
use crate::pathfinding::{Direction, GridPos};
use crate::rng::GameRng;

use super::{Biome, Poi, WorldTile};

const DIRECTIONS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

fn dims(map: &[Vec<WorldTile>]) -> (usize, usize) {
    (map.first().map_or(0, Vec::len), map.len())
}

/// ШАГ 1: побережье. Одна из четырёх кромок заливается водой на глубину
/// 2-3 тайла; внутренний ряд полосы становится пляжем, смотрящим на море.
pub(crate) fn carve_coast(map: &mut [Vec<WorldTile>], rng: &mut GameRng) {
    let (width, height) = dims(map);
    let edge = match rng.index(4) {
        0 => Direction::North,
        1 => Direction::East,
        2 => Direction::South,
        _ => Direction::West,
    };
    let depth = rng.range(2, 3) as usize;

    for y in 0..height {
        for x in 0..width {
            // Расстояние тайла от выбранной кромки
            let from_edge = match edge {
                Direction::North => y,
                Direction::South => height - 1 - y,
                Direction::West => x,
                Direction::East => width - 1 - x,
            };
            if from_edge >= depth {
                continue;
            }
            let tile = &mut map[y][x];
            if from_edge == depth - 1 {
                tile.biome = Biome::Beach;
                tile.beach_direction = Some(edge);
            } else {
                tile.biome = Biome::Water;
            }
        }
    }
}

fn water_within(map: &[Vec<WorldTile>], x: usize, y: usize, radius: usize) -> bool {
    let (width, height) = dims(map);
    for ny in y.saturating_sub(radius)..=(y + radius).min(height - 1) {
        for nx in x.saturating_sub(radius)..=(x + radius).min(width - 1) {
            if x.abs_diff(nx) + y.abs_diff(ny) <= radius && map[ny][nx].biome == Biome::Water {
                return true;
            }
        }
    }
    false
}

/// ШАГ 2: озёра. 1-2 одиночных водных тайла вдали от любой воды,
/// до 50 попыток на каждое.
pub(crate) fn place_lakes(map: &mut [Vec<WorldTile>], rng: &mut GameRng) {
    let (width, height) = dims(map);
    let count = rng.range(1, 2);

    for _ in 0..count {
        let mut placed = false;
        for _ in 0..50 {
            let x = rng.index(width);
            let y = rng.index(height);
            let tile = &map[y][x];
            if tile.biome != Biome::Plains || tile.poi.is_some() {
                continue;
            }
            if water_within(map, x, y, 2) {
                continue;
            }
            let tile = &mut map[y][x];
            tile.biome = Biome::Water;
            tile.is_lake = true;
            placed = true;
            break;
        }
        if !placed {
            debug!("lake placement attempts exhausted");
        }
    }
}

fn random_free_tile<P>(
    map: &[Vec<WorldTile>],
    rng: &mut GameRng,
    attempts: usize,
    accept: P,
) -> Option<GridPos>
where
    P: Fn(&WorldTile) -> bool,
{
    let (width, height) = dims(map);
    for _ in 0..attempts {
        let x = rng.index(width);
        let y = rng.index(height);
        if accept(&map[y][x]) {
            return Some((x, y));
        }
    }
    None
}

/// ШАГ 3: леса. 3-5 кластеров по 2-4 тайла, выращенных случайным
/// расширением от затравки. Ограниченный worklist вместо рекурсии.
pub(crate) fn grow_forests(map: &mut [Vec<WorldTile>], rng: &mut GameRng) {
    let (width, height) = dims(map);
    let clusters = rng.range(3, 5);

    for _ in 0..clusters {
        let size = rng.range(2, 4) as usize;
        let Some(seed_pos) = random_free_tile(map, rng, 30, |t| {
            t.biome != Biome::Water && t.poi.is_none()
        }) else {
            debug!("no room left for a forest cluster");
            continue;
        };
        map[seed_pos.1][seed_pos.0].poi = Some(Poi::Forest);

        let mut cluster = vec![seed_pos];
        let mut attempts = size * 10;
        while cluster.len() < size && attempts > 0 {
            attempts -= 1;
            let (bx, by) = cluster[rng.index(cluster.len())];
            let (dx, dy) = *rng.pick(&DIRECTIONS);
            let nx = bx as i32 + dx;
            let ny = by as i32 + dy;
            if nx < 0 || nx >= width as i32 || ny < 0 || ny >= height as i32 {
                continue;
            }
            let tile = &mut map[ny as usize][nx as usize];
            if tile.biome == Biome::Water || tile.poi.is_some() {
                continue;
            }
            tile.poi = Some(Poi::Forest);
            cluster.push((nx as usize, ny as usize));
        }
    }
}

/// ШАГ 4: горы. 2-3 линейных хребта по 2-3 тайла; рост от последнего
/// добавленного тайла даёт вытянутую форму. Вода и пляж пропускаются.
/// Возвращает хребты — из них берут истоки рек.
pub(crate) fn grow_mountain_ranges(
    map: &mut [Vec<WorldTile>],
    rng: &mut GameRng,
) -> Vec<Vec<GridPos>> {
    let (width, height) = dims(map);
    let range_count = rng.range(2, 3);
    let mut ranges = Vec::new();

    for _ in 0..range_count {
        let len = rng.range(2, 3) as usize;
        let Some(seed_pos) = random_free_tile(map, rng, 30, |t| {
            t.biome == Biome::Plains && t.poi.is_none()
        }) else {
            debug!("no room left for a mountain range");
            continue;
        };
        {
            let tile = &mut map[seed_pos.1][seed_pos.0];
            tile.poi = Some(Poi::Mountain);
            tile.is_first_mountain_in_range = true;
        }

        let mut range = vec![seed_pos];
        let mut attempts = len * 10;
        while range.len() < len && attempts > 0 {
            attempts -= 1;
            let (bx, by) = *range.last().expect("range is never empty");
            let (dx, dy) = *rng.pick(&DIRECTIONS);
            let nx = bx as i32 + dx;
            let ny = by as i32 + dy;
            if nx < 0 || nx >= width as i32 || ny < 0 || ny >= height as i32 {
                continue;
            }
            let tile = &mut map[ny as usize][nx as usize];
            if tile.biome != Biome::Plains || tile.poi.is_some() {
                continue;
            }
            tile.poi = Some(Poi::Mountain);
            range.push((nx as usize, ny as usize));
        }
        ranges.push(range);
    }
    ranges
}

/// ШАГ 4б: входы в пещеры. Часть хребтов получает вход на примыкающей
/// равнине.
pub(crate) fn place_cave_entrances(
    map: &mut [Vec<WorldTile>],
    ranges: &[Vec<GridPos>],
    rng: &mut GameRng,
) {
    let (width, height) = dims(map);
    for range in ranges {
        if !rng.chance(0.4) {
            continue;
        }
        let (bx, by) = range[rng.index(range.len())];
        for (dx, dy) in DIRECTIONS {
            let nx = bx as i32 + dx;
            let ny = by as i32 + dy;
            if nx < 0 || nx >= width as i32 || ny < 0 || ny >= height as i32 {
                continue;
            }
            let tile = &mut map[ny as usize][nx as usize];
            if tile.biome == Biome::Plains && tile.poi.is_none() {
                tile.poi = Some(Poi::CaveEntrance);
                break;
            }
        }
    }
}

/// ШАГ 7: балансировка. В квадранте должно быть хотя бы 3 объекта; недостача
/// добивается лесом и горами на свободной равнине в порядке сканирования.
pub(crate) fn balance_quadrants(map: &mut [Vec<WorldTile>], rng: &mut GameRng) {
    let (width, height) = dims(map);
    let (qx, qy) = (width / 2, height / 2);
    let quadrants = [
        (0, 0, qx, qy),
        (qx, 0, width, qy),
        (0, qy, qx, height),
        (qx, qy, width, height),
    ];

    for (x0, y0, x1, y1) in quadrants {
        let mut count = 0usize;
        for y in y0..y1 {
            for x in x0..x1 {
                if map[y][x].poi.is_some() {
                    count += 1;
                }
            }
        }
        if count >= 3 {
            continue;
        }

        let mut needed = 3 - count;
        'scan: for y in y0..y1 {
            for x in x0..x1 {
                if needed == 0 {
                    break 'scan;
                }
                let tile = &mut map[y][x];
                if tile.biome != Biome::Plains || tile.poi.is_some() || tile.has_river {
                    continue;
                }
                tile.poi = Some(if rng.chance(0.6) {
                    Poi::Forest
                } else {
                    Poi::Mountain
                });
                needed -= 1;
            }
        }
        if needed > 0 {
            warn!(short = needed, "quadrant left short of points of interest");
        }
    }
}

/// ШАГ 11: согласование названий гор. Связные (по 4 соседям) горные
/// кластеры собираются заливкой; каждый кластер носит одно имя.
/// Предпочтение: уже присутствующее имя > очередь пользовательских
/// названий > процедурное.
pub(crate) fn harmonize_mountain_names(
    map: &mut [Vec<WorldTile>],
    name_queue: &mut VecDeque<String>,
    rng: &mut GameRng,
) {
    let (width, height) = dims(map);
    let mut visited = vec![false; width * height];

    for y in 0..height {
        for x in 0..width {
            if visited[y * width + x] || map[y][x].poi != Some(Poi::Mountain) {
                continue;
            }

            // Заливка кластера
            let mut cluster = Vec::new();
            let mut queue = VecDeque::new();
            visited[y * width + x] = true;
            queue.push_back((x, y));
            while let Some((cx, cy)) = queue.pop_front() {
                cluster.push((cx, cy));
                for (dx, dy) in DIRECTIONS {
                    let nx = cx as i32 + dx;
                    let ny = cy as i32 + dy;
                    if nx < 0 || nx >= width as i32 || ny < 0 || ny >= height as i32 {
                        continue;
                    }
                    let nidx = ny as usize * width + nx as usize;
                    if !visited[nidx] && map[ny as usize][nx as usize].poi == Some(Poi::Mountain) {
                        visited[nidx] = true;
                        queue.push_back((nx as usize, ny as usize));
                    }
                }
            }

            let existing = cluster
                .iter()
                .find_map(|&(cx, cy)| map[cy][cx].mountain_name.clone());
            let name = existing
                .or_else(|| name_queue.pop_front())
                .unwrap_or_else(|| names::mountain_name(rng));

            for (cx, cy) in cluster {
                map[cy][cx].mountain_name = Some(name.clone());
            }
        }
    }
}
