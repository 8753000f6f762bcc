// src/world/towns.rs
//! Проходы городов: размещение, выбор стартового, раздача размеров и имён,
//! дороги между соседями.

use std::cmp::Reverse;
use std::collections::{HashSet, VecDeque};

use petgraph::algo::connected_components;
use petgraph::graph::UnGraph;
use tracing::{debug, warn};

use crate::config::TownSize;
use crate::names;
use crate::pathfinding::{find_path, mark_path_tiles, GridPos};
use crate::rng::GameRng;

use super::{Biome, Poi, WorldTile};

/// Минимальная манхэттенская дистанция между городами.
const TOWN_SPACING: usize = 3;

/// ШАГ 6: размещение 2-4 городов на свободной равнине, до 30 попыток на
/// город. Кандидаты ближе `TOWN_SPACING` к уже поставленному городу
/// отбрасываются. Недобор — не ошибка.
pub(crate) fn place_towns(map: &mut [Vec<WorldTile>], rng: &mut GameRng) -> Vec<GridPos> {
    let height = map.len();
    let width = map.first().map_or(0, Vec::len);
    let count = rng.range(2, 4) as usize;
    let mut towns: Vec<GridPos> = Vec::new();

    for i in 0..count {
        let mut placed = false;
        for _ in 0..30 {
            let x = rng.index(width);
            let y = rng.index(height);
            let tile = &map[y][x];
            if tile.biome != Biome::Plains || tile.poi.is_some() {
                continue;
            }
            if towns
                .iter()
                .any(|&(tx, ty)| x.abs_diff(tx) + y.abs_diff(ty) <= TOWN_SPACING)
            {
                continue;
            }
            map[y][x].poi = Some(Poi::Town);
            towns.push((x, y));
            placed = true;
            break;
        }
        if !placed {
            warn!(town_index = i, "town placement retry budget exhausted");
        }
    }
    towns
}

/// ШАГ 8: ровно один стартовый город на карту.
pub(crate) fn select_starting_town(
    map: &mut [Vec<WorldTile>],
    towns: &[GridPos],
    rng: &mut GameRng,
) {
    let (x, y) = towns[rng.index(towns.len())];
    map[y][x].is_starting_town = true;
}

/// ШАГ 9: размеры и имена. Лестница размеров тасуется и раздаётся
/// циклически в порядке размещения; имена выдаются в порядке значимости
/// (сначала город, последней — деревушка), пользовательская очередь
/// расходуется раньше процедурных названий.
pub(crate) fn assign_sizes_and_names(
    map: &mut [Vec<WorldTile>],
    towns: &[GridPos],
    name_queue: &mut VecDeque<String>,
    rng: &mut GameRng,
) {
    let mut ladder = TownSize::ladder().to_vec();
    rng.shuffle(&mut ladder);

    let mut sized: Vec<(GridPos, TownSize)> = towns
        .iter()
        .enumerate()
        .map(|(i, &pos)| (pos, ladder[i % ladder.len()]))
        .collect();
    for &((x, y), size) in &sized {
        map[y][x].town_size = Some(size);
    }

    // Стабильная сортировка сохраняет порядок размещения внутри ранга
    sized.sort_by_key(|&(_, size)| Reverse(size.importance()));
    for ((x, y), _) in sized {
        let name = name_queue
            .pop_front()
            .unwrap_or_else(|| names::town_name(rng));
        map[y][x].town_name = Some(name);
    }
}

/// ШАГ 10: дороги. Каждый город соединяется с 1-2 ближайшими соседями;
/// симметричные пары не прокладываются дважды. Непроложенный маршрут —
/// пропущенное соединение, не ошибка.
pub(crate) fn connect_towns(map: &mut [Vec<WorldTile>], towns: &[GridPos]) {
    if towns.len() < 2 {
        return;
    }

    let mut graph: UnGraph<GridPos, ()> = UnGraph::new_undirected();
    let nodes: Vec<_> = towns.iter().map(|&pos| graph.add_node(pos)).collect();
    let mut linked: HashSet<(usize, usize)> = HashSet::new();

    for (i, &(x, y)) in towns.iter().enumerate() {
        let mut neighbors: Vec<(usize, usize)> = towns
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(j, &(tx, ty))| (x.abs_diff(tx) + y.abs_diff(ty), j))
            .collect();
        neighbors.sort_unstable();

        for &(_, j) in neighbors.iter().take(2) {
            let key = (i.min(j), i.max(j));
            if !linked.insert(key) {
                continue;
            }
            match find_path(map, (x, y), towns[j]) {
                Some(path) => {
                    mark_path_tiles(map, &path);
                    graph.add_edge(nodes[i], nodes[j], ());
                }
                None => debug!(from = i, to = j, "no road between towns"),
            }
        }
    }

    debug!(
        components = connected_components(&graph),
        towns = towns.len(),
        "town road network built"
    );
}
