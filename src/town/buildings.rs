// src/town/buildings.rs
//! Здания: важные постройки кольцами вокруг площади, жилые дома,
//! тропинки к дорожной сети, поля и декорации.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::config::TownSize;
use crate::names;
use crate::pathfinding::{generate_town_paths, GridPos};
use crate::rng::GameRng;

use super::{BuildingType, TownPoi, TownTile, TownTileType};

fn dims(map: &[Vec<TownTile>]) -> (usize, usize) {
    (map.first().map_or(0, Vec::len), map.len())
}

fn chebyshev(a: GridPos, b: GridPos) -> usize {
    a.0.abs_diff(b.0).max(a.1.abs_diff(b.1))
}

/// Состав важных построек по размеру города. Остаток квоты добирается
/// жилыми домами.
#[must_use]
pub(crate) fn important_buildings(size: TownSize) -> &'static [BuildingType] {
    match size {
        TownSize::Hamlet => &[BuildingType::Inn, BuildingType::Shop],
        TownSize::Village => &[
            BuildingType::Inn,
            BuildingType::Shop,
            BuildingType::Temple,
            BuildingType::Blacksmith,
        ],
        TownSize::Town => &[
            BuildingType::Inn,
            BuildingType::Shop,
            BuildingType::Temple,
            BuildingType::Blacksmith,
            BuildingType::Tavern,
            BuildingType::Tavern,
        ],
        TownSize::City => &[
            BuildingType::Inn,
            BuildingType::Shop,
            BuildingType::Market,
            BuildingType::Temple,
            BuildingType::Blacksmith,
            BuildingType::Tavern,
            BuildingType::Tavern,
            BuildingType::Guild,
            BuildingType::Bank,
            BuildingType::Manor,
        ],
    }
}

fn building_name(kind: BuildingType, rng: &mut GameRng) -> Option<String> {
    match kind {
        BuildingType::Inn | BuildingType::Tavern => Some(names::tavern_name(rng)),
        BuildingType::Shop | BuildingType::Market => Some(names::shop_name(rng)),
        BuildingType::Temple => Some(names::temple_name(rng)),
        BuildingType::Blacksmith => Some(names::smithy_name(rng)),
        BuildingType::Guild => Some(names::guild_name(rng)),
        BuildingType::Bank => Some(names::bank_name(rng)),
        BuildingType::Manor => Some(names::manor_name(rng)),
        BuildingType::Keep => Some(names::keep_name(rng)),
        BuildingType::House => None,
    }
}

/// Клетки прямоугольного кольца на дистанции `radius` от площади, по
/// часовой стрелке от северо-западного угла. Выход за карту отфильтрован.
fn ring_cells(
    center: GridPos,
    square_side: usize,
    radius: usize,
    width: usize,
    height: usize,
) -> Vec<GridPos> {
    let x0 = center.0 as i32 - (square_side / 2) as i32 - radius as i32;
    let y0 = center.1 as i32 - (square_side / 2) as i32 - radius as i32;
    let x1 = center.0 as i32 - (square_side / 2) as i32 + square_side as i32 - 1 + radius as i32;
    let y1 = center.1 as i32 - (square_side / 2) as i32 + square_side as i32 - 1 + radius as i32;

    let mut cells = Vec::new();
    for x in x0..=x1 {
        cells.push((x, y0));
    }
    for y in y0 + 1..=y1 {
        cells.push((x1, y));
    }
    for x in (x0..x1).rev() {
        cells.push((x, y1));
    }
    for y in (y0 + 1..y1).rev() {
        cells.push((x0, y));
    }

    cells
        .into_iter()
        .filter(|&(x, y)| x >= 0 && y >= 0 && x < width as i32 && y < height as i32)
        .map(|(x, y)| (x as usize, y as usize))
        .collect()
}

/// ШАГ 5: важные постройки. Кольцо сразу за площадью обходится по часовой
/// стрелке, занимается каждая вторая свободная клетка; при насыщении
/// кольцо расширяется (радиус 2-4). Непоместившееся — предупреждение,
/// не ошибка.
pub(crate) fn place_important_buildings(
    map: &mut [Vec<TownTile>],
    size: TownSize,
    center: GridPos,
    rng: &mut GameRng,
) {
    let (width, height) = dims(map);
    let mut queue: VecDeque<BuildingType> = important_buildings(size).iter().copied().collect();

    'rings: for radius in 1..=4 {
        let mut take = true;
        for (x, y) in ring_cells(center, size.square_side(), radius, width, height) {
            if queue.is_empty() {
                break 'rings;
            }
            let tile = &map[y][x];
            if tile.tile_type != TownTileType::Grass || tile.poi.is_some() {
                continue;
            }
            if take {
                let kind = queue.pop_front().expect("queue checked non-empty");
                let name = building_name(kind, rng);
                let tile = &mut map[y][x];
                tile.tile_type = TownTileType::Building;
                tile.walkable = false;
                tile.building_type = Some(kind);
                tile.building_name = name;
            }
            take = !take;
        }
    }

    if !queue.is_empty() {
        warn!(
            remaining = queue.len(),
            "key buildings did not fit around the square"
        );
    }
}

/// ШАГ 6: жилые дома. Кандидаты — трава вне радиуса исключения вокруг
/// центра; порядок задаёт тасование, квота — остаток от общего числа
/// зданий.
pub(crate) fn place_houses(
    map: &mut [Vec<TownTile>],
    size: TownSize,
    center: GridPos,
    rng: &mut GameRng,
) -> Vec<GridPos> {
    let (width, height) = dims(map);
    let quota = size.building_count() - important_buildings(size).len();
    let exclusion = size.house_exclusion_radius();

    let mut candidates: Vec<GridPos> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .filter(|&(x, y)| {
            map[y][x].tile_type == TownTileType::Grass
                && map[y][x].poi.is_none()
                && chebyshev((x, y), center) > exclusion
        })
        .collect();
    rng.shuffle(&mut candidates);

    let mut houses = Vec::new();
    for (x, y) in candidates {
        if houses.len() == quota {
            break;
        }
        let tile = &mut map[y][x];
        if tile.tile_type != TownTileType::Grass || tile.poi.is_some() {
            continue;
        }
        tile.tile_type = TownTileType::Building;
        tile.walkable = false;
        tile.building_type = Some(BuildingType::House);
        houses.push((x, y));
    }
    if houses.len() < quota {
        debug!(placed = houses.len(), quota, "house quota not met");
    }
    houses
}

fn is_road(tile: &TownTile) -> bool {
    matches!(
        tile.tile_type,
        TownTileType::DirtPath
            | TownTileType::StonePath
            | TownTileType::TownSquare
            | TownTileType::Bridge
    )
}

fn adjacent_to_road(map: &[Vec<TownTile>], pos: GridPos) -> bool {
    let (width, height) = dims(map);
    [(0i32, -1i32), (1, 0), (0, 1), (-1, 0)]
        .into_iter()
        .any(|(dx, dy)| {
            let nx = pos.0 as i32 + dx;
            let ny = pos.1 as i32 + dy;
            nx >= 0
                && ny >= 0
                && nx < width as i32
                && ny < height as i32
                && is_road(&map[ny as usize][nx as usize])
        })
}

fn nearest_road_tile(map: &[Vec<TownTile>], from: GridPos) -> Option<GridPos> {
    map.iter()
        .flatten()
        .filter(|&t| is_road(t))
        .map(|t| (t.x, t.y))
        .min_by_key(|&(x, y)| (from.0.abs_diff(x) + from.1.abs_diff(y), y, x))
}

/// Вырезает тропу между зданием и целью, не трогая конечные точки.
fn carve_link(map: &mut [Vec<TownTile>], from: GridPos, to: GridPos) -> bool {
    let Some(path) = generate_town_paths(map, from, to) else {
        return false;
    };
    for &(x, y) in &path {
        let tile = &mut map[y][x];
        match tile.tile_type {
            TownTileType::Grass => {
                tile.tile_type = TownTileType::DirtPath;
                tile.walkable = true;
                tile.poi = None;
            }
            TownTileType::Water => {
                tile.tile_type = TownTileType::Bridge;
                tile.walkable = true;
            }
            _ => {}
        }
    }
    true
}

/// Предел дистанции, на которой дом ещё ищет соседа для подключения.
const MAX_LINK_DISTANCE: usize = 8;
const MAX_LINK_PASSES: usize = 5;

/// ШАГ 7: подключение домов к дорожной сети. Примыкающие к дороге дома
/// уже подключены; ~25% остальных тянут тропу к ближайшей дороге сразу,
/// остальные итеративно цепляются к ближайшему подключённому зданию или
/// дороге в пределах дистанции. Несколько проходов, остановка без
/// прогресса; неподключённые дома принимаются.
pub(crate) fn connect_buildings(
    map: &mut [Vec<TownTile>],
    houses: &[GridPos],
    rng: &mut GameRng,
) {
    let mut connected: Vec<GridPos> = Vec::new();
    let mut pending: Vec<GridPos> = Vec::new();

    for &house in houses {
        if adjacent_to_road(map, house) {
            connected.push(house);
            continue;
        }
        if rng.chance(0.25) {
            let linked = nearest_road_tile(map, house)
                .is_some_and(|road| carve_link(map, house, road));
            if linked {
                connected.push(house);
                continue;
            }
        }
        pending.push(house);
    }

    for _ in 0..MAX_LINK_PASSES {
        if pending.is_empty() {
            break;
        }
        let mut progress = false;
        let mut still_pending = Vec::new();

        for &house in &pending {
            // Ближайшая цель: дорожный тайл или уже подключённый дом
            let road_target = nearest_road_tile(map, house)
                .filter(|&(x, y)| house.0.abs_diff(x) + house.1.abs_diff(y) <= MAX_LINK_DISTANCE);
            let house_target = connected
                .iter()
                .copied()
                .filter(|&(x, y)| house.0.abs_diff(x) + house.1.abs_diff(y) <= MAX_LINK_DISTANCE)
                .min_by_key(|&(x, y)| (house.0.abs_diff(x) + house.1.abs_diff(y), y, x));

            let target = match (road_target, house_target) {
                (Some(r), Some(h)) => {
                    let rd = house.0.abs_diff(r.0) + house.1.abs_diff(r.1);
                    let hd = house.0.abs_diff(h.0) + house.1.abs_diff(h.1);
                    Some(if hd < rd { h } else { r })
                }
                (r, h) => r.or(h),
            };

            if let Some(target) = target {
                if carve_link(map, house, target) {
                    connected.push(house);
                    progress = true;
                    continue;
                }
            }
            still_pending.push(house);
        }

        pending = still_pending;
        if !progress {
            break;
        }
    }

    if !pending.is_empty() {
        debug!(unconnected = pending.len(), "houses left without a road link");
    }
}

/// ШАГ 8: поля. 2-3 небольших прямоугольника на дальней траве; город
/// полей не держит.
pub(crate) fn place_farm_fields(map: &mut [Vec<TownTile>], center: GridPos, rng: &mut GameRng) {
    let (width, height) = dims(map);
    let min_distance = width.min(height) / 2 - 1;
    let count = rng.range(2, 3);

    for _ in 0..count {
        let mut placed = false;
        for _ in 0..20 {
            let fw = rng.range(2, 3) as usize;
            let fh = rng.range(2, 3) as usize;
            let x = rng.index(width);
            let y = rng.index(height);
            if chebyshev((x, y), center) < min_distance {
                continue;
            }
            if x + fw > width || y + fh > height {
                continue;
            }
            let clear = (y..y + fh).all(|fy| {
                (x..x + fw).all(|fx| {
                    map[fy][fx].tile_type == TownTileType::Grass && map[fy][fx].poi.is_none()
                })
            });
            if !clear {
                continue;
            }
            for fy in y..y + fh {
                for fx in x..x + fw {
                    map[fy][fx].tile_type = TownTileType::FarmField;
                }
            }
            placed = true;
            break;
        }
        if !placed {
            debug!("farm field attempts exhausted");
        }
    }
}

const DECORATIONS: [TownPoi; 3] = [TownPoi::Tree, TownPoi::Bush, TownPoi::Flowers];

/// ШАГ 9: декорации. Количество масштабируется размером города; садятся
/// только на нетронутую траву, промахи принимаются молча.
pub(crate) fn scatter_decorations(map: &mut [Vec<TownTile>], size: TownSize, rng: &mut GameRng) {
    let (width, height) = dims(map);
    for _ in 0..size.decoration_count() {
        let x = rng.index(width);
        let y = rng.index(height);
        let tile = &mut map[y][x];
        if tile.tile_type == TownTileType::Grass && tile.poi.is_none() {
            tile.poi = Some(*rng.pick(&DECORATIONS));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grass(width: usize, height: usize) -> Vec<Vec<TownTile>> {
        (0..height)
            .map(|y| (0..width).map(|x| TownTile::grass(x, y)).collect())
            .collect()
    }

    #[test]
    fn ring_walks_clockwise_without_duplicates() {
        let cells = ring_cells((8, 8), 2, 1, 16, 16);
        let mut unique = cells.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), cells.len());
        // Кольцо радиуса 1 вокруг площади 2×2 — прямоугольник 4×4
        assert_eq!(cells.len(), 12);
        assert_eq!(cells[0], (6, 6));
    }

    #[test]
    fn important_buildings_take_every_other_cell() {
        let mut map = grass(16, 16);
        let mut rng = GameRng::new(21);
        place_important_buildings(&mut map, TownSize::Town, (8, 8), &mut rng);

        let placed: Vec<&TownTile> = map
            .iter()
            .flatten()
            .filter(|t| t.tile_type == TownTileType::Building)
            .collect();
        assert_eq!(placed.len(), important_buildings(TownSize::Town).len());
        for tile in &placed {
            assert!(!tile.walkable);
            assert!(tile.building_name.is_some());
        }
        // Таверн ровно две
        let taverns = placed
            .iter()
            .filter(|t| t.building_type == Some(BuildingType::Tavern))
            .count();
        assert_eq!(taverns, 2);
    }

    #[test]
    fn houses_respect_exclusion_radius() {
        let mut map = grass(12, 12);
        let mut rng = GameRng::new(9);
        let houses = place_houses(&mut map, TownSize::Village, (6, 6), &mut rng);
        assert_eq!(houses.len(), 2);
        for &(x, y) in &houses {
            assert!(chebyshev((x, y), (6, 6)) > 2);
            assert_eq!(map[y][x].building_type, Some(BuildingType::House));
        }
    }

    #[test]
    fn buildings_only_replace_grass() {
        let mut map = grass(16, 16);
        // Дорога и река до размещения
        for y in 0..16 {
            map[y][3].tile_type = TownTileType::Water;
            map[y][8].tile_type = TownTileType::StonePath;
        }
        let mut rng = GameRng::new(4);
        place_important_buildings(&mut map, TownSize::City, (8, 8), &mut rng);
        place_houses(&mut map, TownSize::City, (8, 8), &mut rng);
        for y in 0..16 {
            assert_eq!(map[y][3].tile_type, TownTileType::Water);
            assert_eq!(map[y][8].tile_type, TownTileType::StonePath);
        }
    }

    #[test]
    fn connection_carves_dirt_paths() {
        let mut map = grass(12, 12);
        // Дорога по центральной колонке
        for y in 0..12 {
            map[y][6].tile_type = TownTileType::DirtPath;
        }
        // Дом в стороне от дороги
        map[3][1].tile_type = TownTileType::Building;
        map[3][1].walkable = false;
        map[3][1].building_type = Some(BuildingType::House);

        let mut rng = GameRng::new(2);
        connect_buildings(&mut map, &[(1, 3)], &mut rng);

        let dirt = map
            .iter()
            .flatten()
            .filter(|t| t.tile_type == TownTileType::DirtPath && t.x != 6)
            .count();
        assert!(dirt > 0, "a path should be carved toward the road");
    }

    #[test]
    fn farms_avoid_the_center() {
        let mut map = grass(12, 12);
        let mut rng = GameRng::new(17);
        place_farm_fields(&mut map, (6, 6), &mut rng);
        // Якорь поля держит дистанцию 5, клетки поля уходят от якоря
        // не дальше чем на 2
        for tile in map.iter().flatten() {
            if tile.tile_type == TownTileType::FarmField {
                assert!(chebyshev((tile.x, tile.y), (6, 6)) >= 3);
            }
        }
    }

    #[test]
    fn decorations_spare_everything_but_grass() {
        let mut map = grass(8, 8);
        for y in 0..8 {
            map[y][4].tile_type = TownTileType::DirtPath;
        }
        let mut rng = GameRng::new(6);
        scatter_decorations(&mut map, TownSize::Hamlet, &mut rng);
        for tile in map.iter().flatten() {
            if tile.poi.is_some() {
                assert_eq!(tile.tile_type, TownTileType::Grass);
            }
        }
    }
}
