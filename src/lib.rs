pub mod cache;
pub mod config;
pub mod error;
pub mod names;
pub mod pathfinding;
pub mod population;
pub mod rng;
pub mod town;
pub mod world;

pub use cache::TownMapCache;
pub use config::{GenerationParams, TownSize};
pub use error::GenerationError;
pub use pathfinding::{
    find_path, generate_town_paths, mark_path_tiles, mark_river_tiles, Direction, PathShape,
};
pub use population::npc::Npc;
pub use population::populate_town;
pub use rng::{legacy_world_seed, town_seed, GameRng};
pub use town::{generate_town_map, TownMap};
pub use world::{generate_map_data, WorldTile};
