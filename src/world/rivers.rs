// src/world/rivers.rs
//! ШАГ 5: реки. Из истока каждого хребта прокладывается маршрут A* до
//! ближайшей воды; штраф за пляж и воду прижимает русло к суше до самого
//! устья. Отсутствие маршрута — не ошибка: хребет остаётся без реки.

use tracing::debug;

use crate::pathfinding::{find_path_with_costs, mark_river_tiles, GridPos};

use super::{Biome, Poi, WorldTile};

/// Стоимость шага для русла: река охотно идёт по равнине и сквозь горы,
/// но в пляж и чужую воду сворачивает только у цели.
fn river_step_cost(tile: &WorldTile) -> u32 {
    match tile.biome {
        Biome::Water | Biome::Beach => 30,
        Biome::Plains => match tile.poi {
            Some(Poi::Mountain | Poi::Forest) => 2,
            _ => 1,
        },
    }
}

fn nearest_water(map: &[Vec<WorldTile>], from: GridPos) -> Option<GridPos> {
    map.iter()
        .flatten()
        .filter(|t| t.biome == Biome::Water)
        .map(|t| (t.x, t.y))
        .min_by_key(|&(x, y)| (from.0.abs_diff(x) + from.1.abs_diff(y), y, x))
}

pub(crate) fn carve_rivers(map: &mut [Vec<WorldTile>], ranges: &[Vec<GridPos>]) {
    let height = map.len();
    let width = map.first().map_or(0, Vec::len);

    for range in ranges {
        let Some(&source) = range.first() else {
            continue;
        };
        let Some(mouth) = nearest_water(map, source) else {
            debug!(?source, "no water on the map, range stays dry");
            continue;
        };
        let path =
            find_path_with_costs(width, height, |x, y| river_step_cost(&map[y][x]), source, mouth);
        match path {
            Some(path) => mark_river_tiles(map, &path),
            None => debug!(?source, ?mouth, "river could not reach water"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::GameRng;
    use crate::world::terrain;

    #[test]
    fn rivers_run_from_ranges_to_water() {
        let mut map: Vec<Vec<WorldTile>> = (0..10)
            .map(|y| (0..10).map(|x| WorldTile::new(x, y)).collect())
            .collect();
        let mut rng = GameRng::new(4242);
        terrain::carve_coast(&mut map, &mut rng);
        let ranges = terrain::grow_mountain_ranges(&mut map, &mut rng);
        carve_rivers(&mut map, &ranges);

        if ranges.is_empty() {
            return;
        }
        // Исток каждого хребта помечен рекой, и у реки есть устье в воде
        for range in &ranges {
            let (sx, sy) = range[0];
            assert!(map[sy][sx].has_river);
        }
        let mouth_exists = map
            .iter()
            .flatten()
            .any(|t| t.biome == Biome::Water && t.has_river);
        assert!(mouth_exists);
    }

    #[test]
    fn river_tiles_carry_directions() {
        let mut map: Vec<Vec<WorldTile>> = (0..6)
            .map(|y| (0..6).map(|x| WorldTile::new(x, y)).collect())
            .collect();
        map[0][5].biome = Biome::Water;
        carve_rivers(&mut map, &[vec![(0, 5)]]);
        for tile in map.iter().flatten().filter(|t| t.has_river) {
            assert!(tile.river_direction.is_some());
            assert!(!tile.river_connections.is_empty());
        }
    }
}
