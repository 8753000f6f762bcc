// src/population/mod.rs
//! Население города
//!
//! По готовой карте города раздаются жители: знать или староста, персонал
//! служебных зданий, семьи в жилых домах. Общий поток сида города решает
//! структуру (составы семей, порядок ролей, квоты занятий), личность
//! каждого жителя раскатывается из его позиционного сида в `npc::spawn`.

pub mod npc;

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::config::TownSize;
use crate::names;
use crate::pathfinding::GridPos;
use crate::rng::GameRng;
use crate::town::{BuildingType, TownMap, TownTileType};

use self::npc::{Archetype, Gender, Location, Npc, NpcPlan, Race};

/// Парные титулы главы дома и супруга: индекс общий, пол разводит форму.
const TITLE_PAIRS: [(&str, &str); 4] = [
    ("Lord", "Lady"),
    ("Baron", "Baroness"),
    ("Count", "Countess"),
    ("Duke", "Duchess"),
];

const CHILD_ACTIVITIES: &[&str] = &[
    "plays by the well",
    "chases geese",
    "collects pebbles",
    "runs errands",
    "feeds the chickens",
];

const GENERIC_ACTIVITIES: &[&str] = &[
    "tends the garden",
    "mends clothes",
    "whittles by the fire",
    "keeps the home",
    "gathers firewood",
];

const OTHER_RACES: [Race; 3] = [Race::Elf, Race::Dwarf, Race::Halfling];

struct Site {
    pos: GridPos,
    kind: BuildingType,
    name: Option<String>,
}

/// Разбор карты: жилые здания, служебные здания и рабочие участки
/// (связный кластер полей — один участок).
fn scan_sites(town: &TownMap) -> (Vec<Site>, Vec<Site>, Vec<GridPos>) {
    let mut residential = Vec::new();
    let mut service = Vec::new();

    for row in &town.map_data {
        for tile in row {
            if tile.tile_type != TownTileType::Building {
                continue;
            }
            let Some(kind) = tile.building_type else {
                continue;
            };
            let site = Site {
                pos: (tile.x, tile.y),
                kind,
                name: tile.building_name.clone(),
            };
            match kind {
                BuildingType::House | BuildingType::Manor | BuildingType::Keep => {
                    residential.push(site);
                }
                _ => service.push(site),
            }
        }
    }

    // Заливка кластеров полей
    let width = town.width;
    let height = town.height;
    let mut visited = vec![false; width * height];
    let mut work_sites = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if visited[y * width + x]
                || town.map_data[y][x].tile_type != TownTileType::FarmField
            {
                continue;
            }
            work_sites.push((x, y));
            let mut queue = VecDeque::from([(x, y)]);
            visited[y * width + x] = true;
            while let Some((cx, cy)) = queue.pop_front() {
                for (dx, dy) in [(0i32, -1i32), (1, 0), (0, 1), (-1, 0)] {
                    let nx = cx as i32 + dx;
                    let ny = cy as i32 + dy;
                    if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                        continue;
                    }
                    let nidx = ny as usize * width + nx as usize;
                    if !visited[nidx]
                        && town.map_data[ny as usize][nx as usize].tile_type
                            == TownTileType::FarmField
                    {
                        visited[nidx] = true;
                        queue.push_back((nx as usize, ny as usize));
                    }
                }
            }
        }
    }

    (residential, service, work_sites)
}

fn next_slot(slots: &mut HashMap<GridPos, usize>, pos: GridPos) -> usize {
    let slot = slots.entry(pos).or_insert(0);
    let current = *slot;
    *slot += 1;
    current
}

fn home_location(site: &Site) -> Location {
    Location {
        x: site.pos.0,
        y: site.pos.1,
        building_name: site.name.clone(),
        building_type: Some(site.kind),
        home_coords: None,
    }
}

fn pick_gender(rng: &mut GameRng) -> Gender {
    if rng.chance(0.5) {
        Gender::Male
    } else {
        Gender::Female
    }
}

fn pick_race(rng: &mut GameRng) -> Race {
    if rng.chance(0.7) {
        Race::Human
    } else {
        *rng.pick(&OTHER_RACES)
    }
}

/// Пул специализированных занятий на весь город: квоты по размеру,
/// расходуются по мере раздачи.
fn vocation_pool(size: TownSize, rng: &mut GameRng) -> Vec<&'static str> {
    let quotas: &[(&str, usize)] = match size {
        TownSize::Hamlet => &[("hunter", 1), ("miller", 1)],
        TownSize::Village => &[("hunter", 2), ("miller", 1), ("weaver", 1), ("baker", 1)],
        TownSize::Town => &[
            ("hunter", 2),
            ("miller", 1),
            ("weaver", 2),
            ("baker", 1),
            ("carpenter", 2),
            ("fisherman", 1),
        ],
        TownSize::City => &[
            ("hunter", 2),
            ("weaver", 2),
            ("baker", 2),
            ("carpenter", 3),
            ("fisherman", 2),
            ("mason", 2),
            ("tailor", 2),
        ],
    };
    let mut pool = Vec::new();
    for &(vocation, count) in quotas {
        for _ in 0..count {
            pool.push(vocation);
        }
    }
    rng.shuffle(&mut pool);
    pool
}

/// Занятие взрослого: ферма, пока остаются рабочие участки, затем квота
/// специализаций, затем бытовое занятие.
fn next_occupation(
    farm_queue: &mut VecDeque<GridPos>,
    vocations: &mut Vec<&'static str>,
    rng: &mut GameRng,
) -> (String, Archetype, Option<GridPos>) {
    if let Some(farm) = farm_queue.pop_front() {
        ("farmer".to_string(), Archetype::Farmer, Some(farm))
    } else if let Some(vocation) = vocations.pop() {
        (vocation.to_string(), Archetype::Crafter, None)
    } else {
        (
            (*rng.pick(GENERIC_ACTIVITIES)).to_string(),
            Archetype::Commoner,
            None,
        )
    }
}

/// Штат служебного здания: роли и архетипы в фиксированном порядке.
fn staff_roles(kind: BuildingType) -> &'static [(&'static str, Archetype)] {
    match kind {
        BuildingType::Inn => &[("innkeeper", Archetype::Keeper), ("co-owner", Archetype::Keeper)],
        BuildingType::Tavern => &[
            ("tavern keeper", Archetype::Keeper),
            ("co-owner", Archetype::Keeper),
        ],
        BuildingType::Shop | BuildingType::Market => &[
            ("merchant", Archetype::Merchant),
            ("shop assistant", Archetype::Commoner),
        ],
        BuildingType::Temple => &[
            ("priest", Archetype::Priest),
            ("acolyte", Archetype::Commoner),
        ],
        BuildingType::Blacksmith => &[
            ("blacksmith", Archetype::Smith),
            ("smith's apprentice", Archetype::Commoner),
        ],
        BuildingType::Guild => &[("guildmaster", Archetype::Guildmaster)],
        BuildingType::Bank => &[("banker", Archetype::Banker), ("bank clerk", Archetype::Commoner)],
        // Жилые здания штата не держат
        BuildingType::House | BuildingType::Manor | BuildingType::Keep => &[],
    }
}

fn spawn_noble_family(
    town: &TownMap,
    seed: i64,
    site: &Site,
    rng: &mut GameRng,
    slots: &mut HashMap<GridPos, usize>,
    npcs: &mut Vec<Npc>,
) {
    let title_index = rng.index(TITLE_PAIRS.len());
    let head_gender = pick_gender(rng);
    let (male_title, female_title) = TITLE_PAIRS[title_index];
    let title_for = |gender: Gender| match gender {
        Gender::Male => male_title.to_string(),
        Gender::Female => female_title.to_string(),
    };

    // Глава дома и супруг: противоположный пол, общий индекс титула
    for gender in [head_gender, head_gender.opposite()] {
        npcs.push(npc::spawn(
            &town.town_name,
            seed,
            NpcPlan {
                pos: site.pos,
                slot: next_slot(slots, site.pos),
                gender,
                race: Race::Human,
                archetype: Archetype::Noble,
                role: "noble".to_string(),
                title: Some(title_for(gender)),
                location: home_location(site),
                name_override: None,
            },
        ));
    }

    let children = rng.range(1, 3);
    for _ in 0..children {
        npcs.push(npc::spawn(
            &town.town_name,
            seed,
            NpcPlan {
                pos: site.pos,
                slot: next_slot(slots, site.pos),
                gender: pick_gender(rng),
                race: Race::Human,
                archetype: Archetype::Child,
                role: "noble child".to_string(),
                title: None,
                location: home_location(site),
                name_override: None,
            },
        ));
    }
}

/// Точка входа: жители для готовой карты города.
///
/// Никогда не выдаёт двух NPC с одинаковым `id`; каждая локация лежит в
/// пределах карты.
#[must_use]
pub fn populate_town(town: &TownMap, seed: i64) -> Vec<Npc> {
    let mut rng = GameRng::new(seed);
    let (residential, service, work_sites) = scan_sites(town);
    let mut npcs: Vec<Npc> = Vec::new();
    let mut slots: HashMap<GridPos, usize> = HashMap::new();

    let manor = residential
        .iter()
        .find(|s| matches!(s.kind, BuildingType::Manor | BuildingType::Keep));
    let mut houses: Vec<&Site> = residential
        .iter()
        .filter(|s| s.kind == BuildingType::House)
        .collect();

    // ШАГ 1: руководство — знать в усадьбе или цитадели, иначе староста
    // в первом жилом доме
    if let Some(site) = manor {
        spawn_noble_family(town, seed, site, &mut rng, &mut slots, &mut npcs);
    } else if !houses.is_empty() {
        let site = houses.remove(0);
        npcs.push(npc::spawn(
            &town.town_name,
            seed,
            NpcPlan {
                pos: site.pos,
                slot: next_slot(&mut slots, site.pos),
                gender: pick_gender(&mut rng),
                race: Race::Human,
                archetype: Archetype::Elder,
                role: "village elder".to_string(),
                title: Some("Elder".to_string()),
                location: home_location(site),
                name_override: None,
            },
        ));
    } else {
        debug!("town has no residential buildings, leadership skipped");
    }

    // ШАГ 2: персонал служебных зданий
    for site in &service {
        let sign_owner = site
            .name
            .as_deref()
            .and_then(names::owner_from_sign)
            .map(str::to_string);

        for (index, &(role, archetype)) in staff_roles(site.kind).iter().enumerate() {
            // Первый в штате лавки зовётся как на вывеске
            let named_after_sign = index == 0 && sign_owner.is_some();
            let gender = if named_after_sign {
                Gender::Male
            } else {
                pick_gender(&mut rng)
            };
            npcs.push(npc::spawn(
                &town.town_name,
                seed,
                NpcPlan {
                    pos: site.pos,
                    slot: next_slot(&mut slots, site.pos),
                    gender,
                    race: pick_race(&mut rng),
                    archetype,
                    role: role.to_string(),
                    title: None,
                    location: home_location(site),
                    name_override: if named_after_sign {
                        sign_owner.clone()
                    } else {
                        None
                    },
                },
            ));
        }
    }

    // ШАГ 3: домохозяйства в оставшихся домах
    let mut vocations = vocation_pool(town.town_size, &mut rng);
    let mut farm_queue: VecDeque<GridPos> = work_sites.into_iter().collect();

    for site in houses {
        let family_size = rng.range(3, 6) as usize;
        let race = if rng.chance(0.7) {
            Race::Human
        } else {
            *rng.pick(&OTHER_RACES)
        };
        let head_gender = pick_gender(&mut rng);

        // Двое взрослых с занятиями
        for gender in [head_gender, head_gender.opposite()] {
            let (role, archetype, workplace) =
                next_occupation(&mut farm_queue, &mut vocations, &mut rng);
            let location = match workplace {
                Some((wx, wy)) => Location {
                    x: wx,
                    y: wy,
                    building_name: None,
                    building_type: None,
                    home_coords: Some(site.pos),
                },
                None => home_location(site),
            };
            npcs.push(npc::spawn(
                &town.town_name,
                seed,
                NpcPlan {
                    pos: site.pos,
                    slot: next_slot(&mut slots, site.pos),
                    gender,
                    race,
                    archetype,
                    role,
                    title: None,
                    location,
                    name_override: None,
                },
            ));
        }

        // Дети с бытовыми занятиями
        for _ in 2..family_size {
            npcs.push(npc::spawn(
                &town.town_name,
                seed,
                NpcPlan {
                    pos: site.pos,
                    slot: next_slot(&mut slots, site.pos),
                    gender: pick_gender(&mut rng),
                    race,
                    archetype: Archetype::Child,
                    role: (*rng.pick(CHILD_ACTIVITIES)).to_string(),
                    title: None,
                    location: home_location(site),
                    name_override: None,
                },
            ));
        }
    }

    debug!(
        residents = npcs.len(),
        town = %town.town_name,
        "population generated"
    );
    npcs
}
