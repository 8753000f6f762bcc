// src/population/npc.rs
//! Модель жителя и его генерация из позиционного сида
//!
//! Каждый NPC получает собственный сид — чистый хэш от сида города, позиции
//! здания и номера слота — и раскатывает из него личный `GameRng`: имя,
//! возраст, характеристики, здоровье, мировоззрение и инвентарь. Общий
//! поток города решает только структуру (состав семей и порядок ролей),
//! поэтому один и тот же житель воспроизводится независимо от порядка
//! вызовов населения.

use serde::{Deserialize, Serialize};

use crate::names;
use crate::pathfinding::GridPos;
use crate::rng::{self, GameRng};
use crate::town::BuildingType;
use crate::world::is_false;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    #[must_use]
    pub fn opposite(self) -> Gender {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Race {
    Human,
    Elf,
    Dwarf,
    Halfling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    LawfulGood,
    NeutralGood,
    ChaoticGood,
    LawfulNeutral,
    TrueNeutral,
    ChaoticNeutral,
    LawfulEvil,
    NeutralEvil,
    ChaoticEvil,
}

const NON_EVIL: [Alignment; 6] = [
    Alignment::LawfulGood,
    Alignment::NeutralGood,
    Alignment::ChaoticGood,
    Alignment::LawfulNeutral,
    Alignment::TrueNeutral,
    Alignment::ChaoticNeutral,
];

const ALL_ALIGNMENTS: [Alignment; 9] = [
    Alignment::LawfulGood,
    Alignment::NeutralGood,
    Alignment::ChaoticGood,
    Alignment::LawfulNeutral,
    Alignment::TrueNeutral,
    Alignment::ChaoticNeutral,
    Alignment::LawfulEvil,
    Alignment::NeutralEvil,
    Alignment::ChaoticEvil,
];

/// Шесть базовых характеристик.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hp {
    pub current: i32,
    pub max: i32,
}

/// Невладеющая ссылка в координатное пространство карты города: несколько
/// жителей спокойно делят одну локацию.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub x: usize,
    pub y: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_type: Option<BuildingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_coords: Option<GridPos>,
}

/// Житель города. Никогда не сохраняется по отдельности: пересоздаётся
/// вместе со своей картой города из того же сида.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Npc {
    pub id: String,
    pub seed: i64,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub race: Race,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub class: String,
    pub level: u32,
    pub alignment: Alignment,
    pub stats: Stats,
    pub hp: Hp,
    pub inventory: Vec<String>,
    pub location: Location,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_child: bool,
}

/// Архетип задаёт ролевой шаблон: класс, уровень, кость здоровья, базовые
/// характеристики, допустимость злых мировоззрений и инвентарь.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Archetype {
    Noble,
    Elder,
    Keeper,
    Merchant,
    Priest,
    Smith,
    Guildmaster,
    Banker,
    Farmer,
    Crafter,
    Commoner,
    Child,
}

enum Slot {
    Fixed(&'static str),
    OneOf(&'static [&'static str]),
}

struct RoleTemplate {
    class: &'static str,
    level: u32,
    hit_die: i64,
    base: [i32; 6],
    allow_evil: bool,
    inventory: &'static [Slot],
    age: (i64, i64),
}

const NOBLE: RoleTemplate = RoleTemplate {
    class: "noble",
    level: 3,
    hit_die: 6,
    base: [9, 10, 10, 12, 12, 14],
    allow_evil: true,
    inventory: &[
        Slot::Fixed("signet ring"),
        Slot::OneOf(&["silk gloves", "jeweled brooch", "ivory fan"]),
        Slot::Fixed("purse of gold coins"),
    ],
    age: (30, 60),
};

const ELDER: RoleTemplate = RoleTemplate {
    class: "adept",
    level: 2,
    hit_die: 6,
    base: [8, 8, 9, 12, 14, 12],
    allow_evil: false,
    inventory: &[Slot::Fixed("walking staff"), Slot::Fixed("ledger of disputes")],
    age: (52, 78),
};

const KEEPER: RoleTemplate = RoleTemplate {
    class: "expert",
    level: 2,
    hit_die: 6,
    base: [11, 10, 12, 10, 11, 13],
    allow_evil: false,
    inventory: &[
        Slot::Fixed("ring of keys"),
        Slot::OneOf(&["bottle of brandy", "cask tap", "polished tankard"]),
        Slot::Fixed("purse of silver coins"),
    ],
    age: (25, 55),
};

const MERCHANT: RoleTemplate = RoleTemplate {
    class: "expert",
    level: 2,
    hit_die: 6,
    base: [9, 11, 10, 13, 11, 13],
    allow_evil: false,
    inventory: &[
        Slot::Fixed("ledger"),
        Slot::OneOf(&["set of scales", "bolt of cloth", "strongbox key"]),
        Slot::Fixed("purse of silver coins"),
    ],
    age: (22, 60),
};

const PRIEST: RoleTemplate = RoleTemplate {
    class: "adept",
    level: 3,
    hit_die: 6,
    base: [9, 9, 10, 11, 15, 12],
    allow_evil: false,
    inventory: &[
        Slot::Fixed("prayer beads"),
        Slot::OneOf(&["censer", "holy symbol", "book of litanies"]),
        Slot::Fixed("vial of blessed water"),
    ],
    age: (28, 70),
};

const SMITH: RoleTemplate = RoleTemplate {
    class: "expert",
    level: 3,
    hit_die: 8,
    base: [15, 10, 14, 10, 10, 8],
    allow_evil: false,
    inventory: &[
        Slot::Fixed("smith's hammer"),
        Slot::Fixed("leather apron"),
        Slot::OneOf(&["iron tongs", "whetstone"]),
    ],
    age: (24, 55),
};

const GUILDMASTER: RoleTemplate = RoleTemplate {
    class: "expert",
    level: 4,
    hit_die: 6,
    base: [10, 11, 10, 14, 12, 13],
    allow_evil: true,
    inventory: &[Slot::Fixed("guild seal"), Slot::Fixed("contract scrolls")],
    age: (35, 65),
};

const BANKER: RoleTemplate = RoleTemplate {
    class: "expert",
    level: 3,
    hit_die: 6,
    base: [8, 10, 9, 15, 12, 12],
    allow_evil: true,
    inventory: &[Slot::Fixed("strongbox key"), Slot::Fixed("promissory notes")],
    age: (30, 65),
};

const FARMER: RoleTemplate = RoleTemplate {
    class: "commoner",
    level: 1,
    hit_die: 8,
    base: [13, 10, 13, 8, 10, 9],
    allow_evil: false,
    inventory: &[
        Slot::OneOf(&["hoe", "sickle", "pitchfork"]),
        Slot::Fixed("sack of grain"),
    ],
    age: (18, 60),
};

const CRAFTER: RoleTemplate = RoleTemplate {
    class: "commoner",
    level: 1,
    hit_die: 6,
    base: [11, 12, 11, 10, 10, 10],
    allow_evil: false,
    inventory: &[
        Slot::OneOf(&["spindle", "awl", "chisel", "needle and thread"]),
        Slot::Fixed("purse of copper coins"),
    ],
    age: (18, 60),
};

const COMMONER: RoleTemplate = RoleTemplate {
    class: "commoner",
    level: 1,
    hit_die: 4,
    base: [10, 10, 10, 10, 10, 10],
    allow_evil: false,
    inventory: &[Slot::OneOf(&["loaf of bread", "clay mug", "bundle of firewood"])],
    age: (18, 65),
};

const CHILD: RoleTemplate = RoleTemplate {
    class: "commoner",
    level: 1,
    hit_die: 4,
    base: [6, 11, 8, 8, 7, 11],
    allow_evil: false,
    inventory: &[Slot::OneOf(&["wooden toy sword", "rag doll", "smooth pebble"])],
    age: (6, 15),
};

impl Archetype {
    fn template(self) -> &'static RoleTemplate {
        match self {
            Archetype::Noble => &NOBLE,
            Archetype::Elder => &ELDER,
            Archetype::Keeper => &KEEPER,
            Archetype::Merchant => &MERCHANT,
            Archetype::Priest => &PRIEST,
            Archetype::Smith => &SMITH,
            Archetype::Guildmaster => &GUILDMASTER,
            Archetype::Banker => &BANKER,
            Archetype::Farmer => &FARMER,
            Archetype::Crafter => &CRAFTER,
            Archetype::Commoner => &COMMONER,
            Archetype::Child => &CHILD,
        }
    }
}

/// План одного жителя: всё, что решает общий поток города. Остальное
/// раскатывается из позиционного сида.
pub(crate) struct NpcPlan {
    pub pos: GridPos,
    pub slot: usize,
    pub gender: Gender,
    pub race: Race,
    pub archetype: Archetype,
    pub role: String,
    pub title: Option<String>,
    pub location: Location,
    /// Имя с вывески: торговец зовётся так, как написано над его лавкой.
    pub name_override: Option<String>,
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect()
}

pub(crate) fn spawn(town_name: &str, town_seed: i64, plan: NpcPlan) -> Npc {
    let seed = rng::npc_seed(town_seed, plan.pos.0, plan.pos.1, plan.slot);
    let mut rng = GameRng::new(seed);
    let template = plan.archetype.template();

    let name = plan
        .name_override
        .unwrap_or_else(|| names::npc_name(&mut rng, plan.gender, plan.race));
    let age = rng.range(template.age.0, template.age.1) as u32;

    let rolled: Vec<i32> = template
        .base
        .iter()
        .map(|&b| b + rng.range(-1, 2) as i32)
        .collect();
    let stats = Stats {
        strength: rolled[0],
        dexterity: rolled[1],
        constitution: rolled[2],
        intelligence: rolled[3],
        wisdom: rolled[4],
        charisma: rolled[5],
    };

    // Здоровье: бросок кости на уровень плюс модификатор телосложения
    let con_mod = (stats.constitution - 10).div_euclid(2);
    let mut hp_max = 0i32;
    for _ in 0..template.level {
        hp_max += rng.range(1, template.hit_die) as i32;
    }
    hp_max = (hp_max + con_mod * template.level as i32).max(1);

    let alignment = if template.allow_evil {
        *rng.pick(&ALL_ALIGNMENTS)
    } else {
        *rng.pick(&NON_EVIL)
    };

    let inventory = template
        .inventory
        .iter()
        .map(|slot| match slot {
            Slot::Fixed(item) => (*item).to_string(),
            Slot::OneOf(options) => (*rng.pick(options)).to_string(),
        })
        .collect();

    Npc {
        id: format!("{}-{}-{}-{}", slugify(town_name), plan.pos.0, plan.pos.1, plan.slot),
        seed,
        name,
        age,
        gender: plan.gender,
        race: plan.race,
        role: plan.role,
        title: plan.title,
        class: template.class.to_string(),
        level: template.level,
        alignment,
        stats,
        hp: Hp {
            current: hp_max,
            max: hp_max,
        },
        inventory,
        location: plan.location,
        is_child: plan.archetype == Archetype::Child,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(slot: usize, archetype: Archetype) -> NpcPlan {
        NpcPlan {
            pos: (3, 4),
            slot,
            gender: Gender::Female,
            race: Race::Human,
            archetype,
            role: "test".to_string(),
            title: None,
            location: Location {
                x: 3,
                y: 4,
                building_name: None,
                building_type: None,
                home_coords: None,
            },
            name_override: None,
        }
    }

    #[test]
    fn spawn_is_reproducible() {
        let a = spawn("Oakford", 100, plan(0, Archetype::Farmer));
        let b = spawn("Oakford", 100, plan(0, Archetype::Farmer));
        assert_eq!(a, b);
    }

    #[test]
    fn slots_produce_distinct_ids_and_people() {
        let a = spawn("Oakford", 100, plan(0, Archetype::Commoner));
        let b = spawn("Oakford", 100, plan(1, Archetype::Commoner));
        assert_ne!(a.id, b.id);
        assert_ne!(a.seed, b.seed);
    }

    #[test]
    fn stats_stay_near_the_template() {
        let npc = spawn("Oakford", 7, plan(2, Archetype::Smith));
        let base = [15, 10, 14, 10, 10, 8];
        let rolled = [
            npc.stats.strength,
            npc.stats.dexterity,
            npc.stats.constitution,
            npc.stats.intelligence,
            npc.stats.wisdom,
            npc.stats.charisma,
        ];
        for (r, b) in rolled.iter().zip(base.iter()) {
            assert!((b - 1..=b + 2).contains(r));
        }
    }

    #[test]
    fn hp_is_positive_and_level_scaled() {
        for slot in 0..50 {
            let npc = spawn("Oakford", 7, plan(slot, Archetype::Noble));
            assert!(npc.hp.max >= 1);
            assert_eq!(npc.hp.current, npc.hp.max);
            // 3 куба по 6 плюс модификатор телосложения
            assert!(npc.hp.max <= 18 + 2 * 3);
        }
    }

    #[test]
    fn commoners_are_never_evil() {
        for slot in 0..80 {
            let npc = spawn("Oakford", 11, plan(slot, Archetype::Commoner));
            assert!(!matches!(
                npc.alignment,
                Alignment::LawfulEvil | Alignment::NeutralEvil | Alignment::ChaoticEvil
            ));
        }
    }

    #[test]
    fn children_are_flagged_and_young() {
        let npc = spawn("Oakford", 11, plan(3, Archetype::Child));
        assert!(npc.is_child);
        assert!((6..=15).contains(&npc.age));
    }

    #[test]
    fn name_override_wins() {
        let mut p = plan(0, Archetype::Merchant);
        p.name_override = Some("Alden".to_string());
        let npc = spawn("Oakford", 1, p);
        assert_eq!(npc.name, "Alden");
    }
}
