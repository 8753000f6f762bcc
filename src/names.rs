// src/names.rs
//! Детерминированная генерация названий
//!
//! Все функции тянут значения из общего `GameRng`, поэтому порядок вызовов
//! фиксирован так же строго, как и у проходов генерации. Названия собираются
//! из списков частей: составные топонимы (приставка + суффикс), имена
//! владельцев для лавок, формулы "The <прилагательное> <существительное>"
//! для таверн.

use crate::population::npc::{Gender, Race};
use crate::rng::GameRng;

const TOWN_PREFIXES: &[&str] = &[
    "Oak", "Ash", "Stone", "River", "Wolf", "Raven", "Green", "Iron", "Mill", "Fox", "Thorn",
    "Elm", "Bright", "Frost", "Amber", "Gold", "Salt", "Marsh", "Hazel", "Cinder",
];

const TOWN_SUFFIXES: &[&str] = &[
    "ford", "bury", "haven", "dale", "wick", "stead", "bridge", "field", "crest", "hollow",
    "brook", "gate", "moor", "reach",
];

const MOUNTAIN_STEMS: &[&str] = &[
    "Grim", "Cloud", "Storm", "Eagle", "Winter", "Shadow", "Thunder", "Raven", "Iron", "Dragon",
    "Silver", "Broken",
];

const MOUNTAIN_FORMS: &[&str] = &["peak", "fang", "horn", "spire", "crag", "tor"];

const TAVERN_ADJECTIVES: &[&str] = &[
    "Prancing", "Drunken", "Golden", "Rusty", "Laughing", "Sleeping", "Wandering", "Crooked",
    "Silver", "Thirsty", "Gilded", "Howling",
];

const TAVERN_NOUNS: &[&str] = &[
    "Pony", "Goose", "Stag", "Anchor", "Lantern", "Kettle", "Boar", "Griffin", "Barrel", "Rose",
    "Hammer", "Crow",
];

const GUILD_CRAFTS: &[&str] = &[
    "Masons", "Weavers", "Chandlers", "Coopers", "Mercers", "Tanners", "Shipwrights", "Scribes",
];

const BANK_FAMILIES: &[&str] = &[
    "Goldweather", "Silverstone", "Marchbanks", "Coppergild", "Thistlewood", "Ashcroft",
];

const SHOP_GOODS: &[&str] = &["Goods", "Wares", "Sundries", "Provisions", "Supplies"];

const SMITHY_FORMS: &[&str] = &["Anvil", "Forge", "Hammer", "Smithy"];

const MANOR_FAMILIES: &[&str] = &[
    "Blackwood", "Hartley", "Ravencourt", "Winterbourne", "Fairfax", "Greymont", "Ashford",
    "Loxley",
];

const TEMPLE_DEITIES: &[&str] = &[
    "the Dawn", "the Silver Flame", "the Harvest", "the Deep Waters", "the Watchful Eye",
    "the Quiet Moon", "the Forge Father",
];

// Имена жителей по расам. Людских имён больше прочих: человеческие семьи
// составляют основную массу населения.
const HUMAN_MALE: &[&str] = &[
    "Alden", "Borin", "Cedric", "Doran", "Edwin", "Gareth", "Harold", "Jorah", "Marten", "Osric",
    "Piter", "Rowan", "Tomas", "Wendel",
];
const HUMAN_FEMALE: &[&str] = &[
    "Alia", "Brenna", "Catrin", "Elsbeth", "Gwen", "Isolde", "Jenna", "Lyra", "Maren", "Nessa",
    "Rosalind", "Sable", "Tamsin", "Wila",
];
const ELF_MALE: &[&str] = &["Aelar", "Caelum", "Erevan", "Ivellios", "Soveliss", "Thamior"];
const ELF_FEMALE: &[&str] = &["Aelene", "Caelynn", "Ielenia", "Lia", "Naivara", "Sariel"];
const DWARF_MALE: &[&str] = &["Adrik", "Baern", "Dain", "Harbek", "Orsik", "Thoradin"];
const DWARF_FEMALE: &[&str] = &["Amber", "Bardryn", "Dagnal", "Helja", "Kathra", "Vistra"];
const HALFLING_MALE: &[&str] = &["Alton", "Cade", "Eldon", "Finnan", "Merric", "Perrin"];
const HALFLING_FEMALE: &[&str] = &["Andry", "Bree", "Cora", "Lidda", "Nedda", "Seraphina"];

/// Составной топоним: "Oakford", "Ravenhollow".
pub fn town_name(rng: &mut GameRng) -> String {
    format!("{}{}", rng.pick(TOWN_PREFIXES), rng.pick(TOWN_SUFFIXES))
}

/// Название горного массива: "Grimfang" или "Mount Grimfang".
pub fn mountain_name(rng: &mut GameRng) -> String {
    let base = format!("{}{}", rng.pick(MOUNTAIN_STEMS), rng.pick(MOUNTAIN_FORMS));
    if rng.chance(0.4) {
        format!("Mount {base}")
    } else {
        base
    }
}

/// Название таверны или постоялого двора: "The Prancing Pony".
pub fn tavern_name(rng: &mut GameRng) -> String {
    format!(
        "The {} {}",
        rng.pick(TAVERN_ADJECTIVES),
        rng.pick(TAVERN_NOUNS)
    )
}

/// Название гильдии: "The Weavers' Guild".
pub fn guild_name(rng: &mut GameRng) -> String {
    format!("The {}' Guild", rng.pick(GUILD_CRAFTS))
}

/// Название банка: "Goldweather & Sons".
pub fn bank_name(rng: &mut GameRng) -> String {
    let family = rng.pick(BANK_FAMILIES);
    if rng.chance(0.5) {
        format!("{family} & Sons")
    } else {
        format!("{family} Counting House")
    }
}

/// Название лавки в формате "<имя владельца>'s <товар>": "Alden's Goods".
///
/// Население опирается на этот формат: торговец получает имя из вывески.
pub fn shop_name(rng: &mut GameRng) -> String {
    let owner = rng.pick(HUMAN_MALE);
    format!("{owner}'s {}", rng.pick(SHOP_GOODS))
}

/// Название кузницы: "Borin's Anvil".
pub fn smithy_name(rng: &mut GameRng) -> String {
    let owner = rng.pick(HUMAN_MALE);
    format!("{owner}'s {}", rng.pick(SMITHY_FORMS))
}

/// Название усадьбы: "Blackwood Manor".
pub fn manor_name(rng: &mut GameRng) -> String {
    format!("{} Manor", rng.pick(MANOR_FAMILIES))
}

/// Название замка-цитадели: "Greymont Keep".
pub fn keep_name(rng: &mut GameRng) -> String {
    format!("{} Keep", rng.pick(MANOR_FAMILIES))
}

/// Название храма: "Temple of the Dawn".
pub fn temple_name(rng: &mut GameRng) -> String {
    format!("Temple of {}", rng.pick(TEMPLE_DEITIES))
}

/// Личное имя жителя по расе и полу.
pub fn npc_name(rng: &mut GameRng, gender: Gender, race: Race) -> String {
    let list = match (race, gender) {
        (Race::Human, Gender::Male) => HUMAN_MALE,
        (Race::Human, Gender::Female) => HUMAN_FEMALE,
        (Race::Elf, Gender::Male) => ELF_MALE,
        (Race::Elf, Gender::Female) => ELF_FEMALE,
        (Race::Dwarf, Gender::Male) => DWARF_MALE,
        (Race::Dwarf, Gender::Female) => DWARF_FEMALE,
        (Race::Halfling, Gender::Male) => HALFLING_MALE,
        (Race::Halfling, Gender::Female) => HALFLING_FEMALE,
    };
    (*rng.pick(list)).to_string()
}

/// Имя владельца из вывески "<имя>'s <...>", если вывеска этому формату
/// соответствует.
#[must_use]
pub fn owner_from_sign(sign: &str) -> Option<&str> {
    let (owner, _) = sign.split_once("'s ")?;
    if owner.is_empty() || owner.contains(' ') {
        return None;
    }
    Some(owner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_deterministic() {
        let mut a = GameRng::new(11);
        let mut b = GameRng::new(11);
        assert_eq!(town_name(&mut a), town_name(&mut b));
        assert_eq!(tavern_name(&mut a), tavern_name(&mut b));
        assert_eq!(temple_name(&mut a), temple_name(&mut b));
    }

    #[test]
    fn shop_sign_roundtrip() {
        let mut rng = GameRng::new(3);
        for _ in 0..50 {
            let sign = shop_name(&mut rng);
            let owner = owner_from_sign(&sign).expect("shop sign must carry an owner");
            assert!(sign.starts_with(owner));
        }
    }

    #[test]
    fn owner_from_sign_rejects_other_formats() {
        assert_eq!(owner_from_sign("The Prancing Pony"), None);
        assert_eq!(owner_from_sign("Temple of the Dawn"), None);
        assert_eq!(owner_from_sign("Alden's Goods"), Some("Alden"));
    }

    #[test]
    fn npc_names_cover_all_races() {
        let mut rng = GameRng::new(5);
        for race in [Race::Human, Race::Elf, Race::Dwarf, Race::Halfling] {
            for gender in [Gender::Male, Gender::Female] {
                assert!(!npc_name(&mut rng, gender, race).is_empty());
            }
        }
    }
}
