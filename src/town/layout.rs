// src/town/layout.rs
//! Каркас города: река, главная дорога, площадь, стены и цитадель.

use tracing::warn;

use crate::config::TownSize;
use crate::names;
use crate::pathfinding::{Direction, GridPos, PathShape};
use crate::rng::GameRng;

use super::{BuildingType, TownPoi, TownTile, TownTileType};

fn dims(map: &[Vec<TownTile>]) -> (usize, usize) {
    (map.first().map_or(0, Vec::len), map.len())
}

/// Смещение русла от центральной оси. Нулевое и соседние значения
/// исключены: река не должна накрывать центр площади.
const RIVER_JITTER: [i32; 4] = [-3, -2, 2, 3];

/// ШАГ 1: прямая река шириной 2 тайла. Ориентация берётся из направления
/// реки на мировом тайле, положение — центр плюс сидированное смещение.
pub(crate) fn carve_river(
    map: &mut [Vec<TownTile>],
    direction: Option<PathShape>,
    rng: &mut GameRng,
) {
    let (width, height) = dims(map);
    let vertical = !matches!(direction, Some(PathShape::Horizontal));
    let jitter = *rng.pick(&RIVER_JITTER);

    if vertical {
        let col = ((width / 2) as i32 + jitter).clamp(1, width as i32 - 3) as usize;
        for y in 0..height {
            for x in [col, col + 1] {
                let tile = &mut map[y][x];
                tile.tile_type = TownTileType::Water;
                tile.walkable = false;
            }
        }
    } else {
        let row = ((height / 2) as i32 + jitter).clamp(1, height as i32 - 3) as usize;
        for x in 0..width {
            for y in [row, row + 1] {
                let tile = &mut map[y][x];
                tile.tile_type = TownTileType::Water;
                tile.walkable = false;
            }
        }
    }
}

/// Укладка одной клетки дороги. Вода превращается в мост, трава — в
/// полотно; остальные тайлы дорога не трогает.
pub(crate) fn carve_road_cell(map: &mut [Vec<TownTile>], x: usize, y: usize, road: TownTileType) {
    let tile = &mut map[y][x];
    match tile.tile_type {
        TownTileType::Water => {
            tile.tile_type = TownTileType::Bridge;
            tile.walkable = true;
        }
        TownTileType::Grass | TownTileType::DirtPath => {
            tile.tile_type = road;
            tile.walkable = true;
        }
        _ => {}
    }
}

/// ШАГ 2: главная дорога от входной кромки до центра. Ширина зависит от
/// размера города, пересечения с рекой становятся мостами.
pub(crate) fn carve_main_road(
    map: &mut [Vec<TownTile>],
    size: TownSize,
    entry: Direction,
    entry_point: GridPos,
    center: GridPos,
) {
    let (width, height) = dims(map);
    let road = match size {
        TownSize::Hamlet | TownSize::Village => TownTileType::DirtPath,
        TownSize::Town | TownSize::City => TownTileType::StonePath,
    };
    let lanes = size.road_width();

    match entry {
        Direction::North | Direction::South => {
            let (y0, y1) = if entry == Direction::North {
                (0, center.1)
            } else {
                (center.1, height - 1)
            };
            for y in y0..=y1 {
                for lane in 0..lanes {
                    let x = (entry_point.0 + lane).min(width - 1);
                    carve_road_cell(map, x, y, road);
                }
            }
        }
        Direction::East | Direction::West => {
            let (x0, x1) = if entry == Direction::West {
                (0, center.0)
            } else {
                (center.0, width - 1)
            };
            for x in x0..=x1 {
                for lane in 0..lanes {
                    let y = (entry_point.1 + lane).min(height - 1);
                    carve_road_cell(map, x, y, road);
                }
            }
        }
    }
}

/// ШАГ 3: площадь вокруг центра. В точном центре — колодец, у города —
/// фонтан. Река, задевающая край площади, остаётся рекой.
pub(crate) fn carve_square(map: &mut [Vec<TownTile>], size: TownSize, center: GridPos) {
    let side = size.square_side();
    let x0 = center.0 - side / 2;
    let y0 = center.1 - side / 2;

    for y in y0..y0 + side {
        for x in x0..x0 + side {
            let tile = &mut map[y][x];
            if matches!(tile.tile_type, TownTileType::Water | TownTileType::Bridge) {
                continue;
            }
            tile.tile_type = TownTileType::TownSquare;
            tile.walkable = true;
        }
    }

    let centerpiece = if size == TownSize::City {
        TownPoi::Fountain
    } else {
        TownPoi::Well
    };
    map[center.1][center.0].poi = Some(centerpiece);
}

/// ШАГ 4 (только город): кольцо стен по границе карты с проёмами там, где
/// её уже пересекли дорога или река, и цитадель у северной стены с
/// собственным кольцом 3×3 и каменной дорожкой на юг к площади.
pub(crate) fn carve_walls_and_keep(
    map: &mut [Vec<TownTile>],
    size: TownSize,
    center: GridPos,
    rng: &mut GameRng,
) {
    let (width, height) = dims(map);

    // Стены: только по нетронутой траве
    for y in 0..height {
        for x in 0..width {
            if x != 0 && y != 0 && x != width - 1 && y != height - 1 {
                continue;
            }
            let tile = &mut map[y][x];
            if tile.tile_type == TownTileType::Grass {
                tile.tile_type = TownTileType::Wall;
                tile.walkable = false;
            }
        }
    }

    // Цитадель: первый из кандидатов, чей блок 3×3 целиком на траве,
    // не конфликтует с дорогой от северного входа и с рекой
    let cx = center.0 as i32;
    let candidates = [cx, cx + 4, cx - 4];
    let keep_x = candidates
        .into_iter()
        .find(|&kx| {
            kx - 1 >= 1
                && kx + 1 <= width as i32 - 2
                && (1..=3).all(|y: usize| {
                    (kx - 1..=kx + 1)
                        .all(|x| map[y][x as usize].tile_type == TownTileType::Grass)
                })
        })
        .unwrap_or(cx);

    let keep_y = 2usize;
    for y in 1..=3 {
        for x in keep_x - 1..=keep_x + 1 {
            let x = x as usize;
            if map[y][x].tile_type != TownTileType::Grass {
                warn!(x, y, "keep ring obstructed, leaving the tile as is");
                continue;
            }
            let tile = &mut map[y][x];
            if (x, y) == (keep_x as usize, keep_y) {
                tile.tile_type = TownTileType::Building;
                tile.walkable = false;
                tile.building_type = Some(BuildingType::Keep);
                tile.building_name = Some(names::keep_name(rng));
            } else {
                tile.tile_type = TownTileType::KeepWall;
                tile.walkable = false;
            }
        }
    }

    // Южные ворота цитадели и каменная дорожка к площади
    let gate_x = keep_x as usize;
    if map[3][gate_x].tile_type == TownTileType::KeepWall {
        let tile = &mut map[3][gate_x];
        tile.tile_type = TownTileType::StonePath;
        tile.walkable = true;
    }
    let square_top = center.1 - size.square_side() / 2;
    for y in 4..square_top {
        carve_road_cell(map, gate_x, y, TownTileType::StonePath);
    }
    // Смещённая цитадель доворачивает дорожку к площади
    if gate_x != center.0 && square_top > 4 {
        let row = square_top - 1;
        let (from, to) = if gate_x < center.0 {
            (gate_x, center.0)
        } else {
            (center.0, gate_x)
        };
        for x in from..=to {
            carve_road_cell(map, x, row, TownTileType::StonePath);
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
    fn river_is_two_tiles_wide_and_off_center() {
        let mut map = grass(12, 12);
        let mut rng = GameRng::new(5);
        carve_river(&mut map, None, &mut rng);

        let mut cols: Vec<usize> = map
            .iter()
            .flatten()
            .filter(|t| t.tile_type == TownTileType::Water)
            .map(|t| t.x)
            .collect();
        cols.sort_unstable();
        cols.dedup();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[1], cols[0] + 1);
        // Центральная колонка свободна: колодец не утонет
        assert!(!cols.contains(&6));
    }

    #[test]
    fn horizontal_river_follows_direction_hint() {
        let mut map = grass(12, 12);
        let mut rng = GameRng::new(5);
        carve_river(&mut map, Some(PathShape::Horizontal), &mut rng);
        let rows: Vec<usize> = map
            .iter()
            .flatten()
            .filter(|t| t.tile_type == TownTileType::Water)
            .map(|t| t.y)
            .collect();
        assert!(!rows.is_empty());
        assert!(!rows.contains(&6));
    }

    #[test]
    fn main_road_reaches_center_from_every_edge() {
        for (entry, ep) in [
            (Direction::North, (4, 0)),
            (Direction::South, (4, 7)),
            (Direction::East, (7, 4)),
            (Direction::West, (0, 4)),
        ] {
            let mut map = grass(8, 8);
            carve_main_road(&mut map, TownSize::Hamlet, entry, ep, (4, 4));
            assert_eq!(map[ep.1][ep.0].tile_type, TownTileType::DirtPath);
            assert_eq!(map[4][4].tile_type, TownTileType::DirtPath);
        }
    }

    #[test]
    fn wide_road_carves_two_lanes() {
        let mut map = grass(16, 16);
        carve_main_road(&mut map, TownSize::Town, Direction::South, (8, 15), (8, 8));
        assert_eq!(map[12][8].tile_type, TownTileType::StonePath);
        assert_eq!(map[12][9].tile_type, TownTileType::StonePath);
    }

    #[test]
    fn square_keeps_river_edge_intact() {
        let mut map = grass(12, 12);
        // Река впритык к площади
        for y in 0..12 {
            for x in [4, 5] {
                map[y][x].tile_type = TownTileType::Water;
                map[y][x].walkable = false;
            }
        }
        carve_square(&mut map, TownSize::Village, (6, 6));
        assert_eq!(map[6][5].tile_type, TownTileType::Water);
        assert_eq!(map[6][6].tile_type, TownTileType::TownSquare);
        assert_eq!(map[6][6].poi, Some(TownPoi::Well));
    }

    #[test]
    fn keep_ring_surrounds_the_keep() {
        let mut map = grass(20, 20);
        let mut rng = GameRng::new(777);
        carve_square(&mut map, TownSize::City, (10, 10));
        carve_walls_and_keep(&mut map, TownSize::City, (10, 10), &mut rng);

        let keep = map
            .iter()
            .flatten()
            .find(|t| t.building_type == Some(BuildingType::Keep))
            .expect("city must have a keep");
        assert!(keep.building_name.is_some());
        assert!(!keep.walkable);

        let (kx, ky) = (keep.x, keep.y);
        let mut ring = 0;
        let mut gate = 0;
        for y in ky - 1..=ky + 1 {
            for x in kx - 1..=kx + 1 {
                match map[y][x].tile_type {
                    TownTileType::KeepWall => ring += 1,
                    TownTileType::StonePath => gate += 1,
                    _ => {}
                }
            }
        }
        assert_eq!(ring, 7, "seven keep-wall tiles plus the south gate");
        assert_eq!(gate, 1);
        // Дорожка от ворот тянется к площади
        assert_eq!(map[5][kx].tile_type, TownTileType::StonePath);
    }
}
