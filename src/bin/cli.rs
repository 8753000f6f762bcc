use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use realmgen::pathfinding::Direction;
use realmgen::population::npc::Npc;
use realmgen::world::{Biome, Poi, WorldTile};
use realmgen::{
    generate_map_data, generate_town_map, populate_town, town_seed, GenerationParams, TownMap,
};

/// Генератор мира для Chronicles of the Vale
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Мировой сид (перекрывает значение из конфигурации)
    #[arg(short, long)]
    seed: Option<i64>,

    /// Ширина карты мира в тайлах
    #[arg(long)]
    width: Option<usize>,

    /// Высота карты мира в тайлах
    #[arg(long)]
    height: Option<usize>,

    /// Прегенерировать все города вместе с населением
    #[arg(short, long)]
    towns: bool,

    /// Путь для сохранения JSON-бандла (по умолчанию: ./world.json)
    #[arg(short, long, default_value = "world.json")]
    output: PathBuf,
}

/// Полный снимок мира для персистентного слоя.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WorldBundle {
    seed: i64,
    world: Vec<Vec<WorldTile>>,
    towns: Vec<TownBundle>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TownBundle {
    map: TownMap,
    residents: Vec<Npc>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut params = match &cli.config {
        Some(path) => {
            println!("🔍 Загрузка конфигурации...");
            GenerationParams::from_toml_file(path.to_str().ok_or("invalid config path")?)?
        }
        None => GenerationParams::default(),
    };
    if let Some(seed) = cli.seed {
        params.seed = seed;
    }
    if let Some(width) = cli.width {
        params.width = width;
    }
    if let Some(height) = cli.height {
        params.height = height;
    }

    println!(
        "🌍 Генерация мира (сид: {}, размер: {}×{})...",
        params.seed, params.width, params.height
    );
    let world = generate_map_data(params.width, params.height, params.seed, &params.custom_names)?;
    println!("{}", ascii_preview(&world));

    let towns = if cli.towns {
        let specs: Vec<&WorldTile> = world
            .iter()
            .flatten()
            .filter(|t| t.poi == Some(Poi::Town))
            .collect();
        println!("🏘️  Прегенерация {} городов...", specs.len());

        let build = |tile: &&WorldTile| -> TownBundle {
            let seed = town_seed(params.seed, tile.x, tile.y);
            let map = generate_town_map(
                tile.town_size.expect("town tile carries a size"),
                tile.town_name.as_deref().unwrap_or("Unnamed"),
                Direction::South,
                seed,
                tile.has_river,
                tile.river_direction,
            );
            let residents = populate_town(&map, seed);
            TownBundle { map, residents }
        };

        #[cfg(feature = "parallel")]
        let bundles: Vec<TownBundle> = specs.par_iter().map(build).collect();
        #[cfg(not(feature = "parallel"))]
        let bundles: Vec<TownBundle> = specs.iter().map(build).collect();

        for bundle in &bundles {
            println!(
                "   {} ({:?}): {} жителей",
                bundle.map.town_name,
                bundle.map.town_size,
                bundle.residents.len()
            );
        }
        bundles
    } else {
        Vec::new()
    };

    let bundle = WorldBundle {
        seed: params.seed,
        world,
        towns,
    };
    println!("💾 Сохранение в {:?}", cli.output);
    std::fs::write(&cli.output, serde_json::to_string_pretty(&bundle)?)?;

    println!("\n✅ Готово!");
    Ok(())
}

/// Текстовый предпросмотр мира: по символу на тайл.
fn ascii_preview(world: &[Vec<WorldTile>]) -> String {
    let mut out = String::new();
    for row in world {
        for tile in row {
            let ch = match (tile.poi, tile.biome) {
                (Some(Poi::Town), _) if tile.is_starting_town => '@',
                (Some(Poi::Town), _) => 'T',
                (Some(Poi::Mountain), _) => '^',
                (Some(Poi::Forest), _) => 'f',
                (Some(Poi::CaveEntrance), _) => 'o',
                (None, Biome::Water) => '~',
                (None, Biome::Beach) => '.',
                (None, Biome::Plains) if tile.has_river => '≈',
                (None, Biome::Plains) if tile.has_path => '+',
                (None, Biome::Plains) => ',',
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}
