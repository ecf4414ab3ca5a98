//! Ability Forge - Entry Point
//!
//! Interactive driver over the tree editor: load a tree from disk or from the
//! preset collection, switch to allocation mode and allocate abilities from
//! the command line.

use ability_forge::ability::AbilityKind;
use ability_forge::core::config::{set_config, EditorConfig};
use ability_forge::core::error::{ForgeError, Result};
use ability_forge::core::types::AbilityId;
use ability_forge::preset::{PresetClient, ALL_CLASSES};
use ability_forge::tree::{CharacterClass, TreeEditor};

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ability-forge")]
#[command(about = "Edit ability trees and simulate point allocation")]
struct Args {
    /// Tree JSON file to open
    #[arg(long)]
    file: Option<PathBuf>,

    /// Community preset to open, by catalog filename
    #[arg(long)]
    preset: Option<String>,

    /// Open the base tree of a class (archer, assassin, mage, shaman, warrior)
    #[arg(long)]
    class: Option<String>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the preset base URL or directory
    #[arg(long)]
    base_url: Option<String>,

    /// Debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "ability_forge=debug" } else { "ability_forge=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let mut config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    if let Some(base_url) = &args.base_url {
        config.preset_base_url = base_url.clone();
    }
    config.validate().map_err(ForgeError::Config)?;
    if set_config(config.clone()).is_err() {
        tracing::warn!("Global config was already initialized");
    }

    let rt = Runtime::new()?;
    let client = PresetClient::new(&config);
    let mut editor = TreeEditor::with_config(&config);

    if let Some(path) = &args.file {
        let text = std::fs::read_to_string(path)?;
        editor.load_json(&text, true)?;
    } else if let Some(filename) = &args.preset {
        let preset = rt.block_on(client.fetch_custom(filename))?;
        editor.load_preset(preset);
    } else if let Some(class) = &args.class {
        let class = CharacterClass::parse(class)
            .ok_or_else(|| ForgeError::PresetNotFound(class.clone()))?;
        let base = rt.block_on(client.fetch_base(class))?;
        editor.load_json(&base.to_json()?, false)?;
    }

    println!("\n=== ABILITY FORGE ===");
    print_help();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let mut words = input.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let rest: Vec<&str> = words.collect();

        match command {
            "quit" | "q" => break,
            "help" => print_help(),
            "edit" => {
                editor.set_mode(true);
                println!("Edit mode");
            }
            "alloc" => {
                editor.set_mode(false);
                println!("Allocation mode on '{}'", editor.selected_tree());
            }
            "allocate" | "a" => match parse_id(&rest) {
                Some(id) if editor.allocate_node(id) => println!("Allocated {}", id),
                Some(id) => println!("{} is not allocatable", id),
                None => println!("Usage: allocate <id>"),
            },
            "deallocate" | "d" => match parse_id(&rest) {
                Some(id) if editor.deallocate_node(id) => println!("Deallocated {}", id),
                Some(id) => println!("{} is not allocated", id),
                None => println!("Usage: deallocate <id>"),
            },
            "start" => match parse_id(&rest) {
                Some(id) if editor.select_starting_ability(id) => println!("Starting ability is now {}", id),
                _ => println!("Usage: start <existing id>"),
            },
            "available" => {
                let ids: Vec<String> = editor.allocatable_nodes().iter().map(ToString::to_string).collect();
                println!("Allocatable: {}", ids.join(", "));
            }
            "trees" => {
                for name in editor.snapshot().trees.names() {
                    let marker = if name == editor.selected_tree() { "*" } else { " " };
                    println!(" {} {}", marker, name);
                }
            }
            "tree" => {
                let name = rest.join(" ");
                if !editor.select_tree(&name) {
                    println!("No tree named '{}'", name);
                }
            }
            "newtree" => match editor.add_tree(&rest.join(" ")) {
                Some(name) => println!("Created '{}'", name),
                None => println!("Usage: newtree <name>"),
            },
            "undo" => {
                if !editor.undo() {
                    println!("Nothing to undo");
                }
            }
            "redo" => {
                if !editor.redo() {
                    println!("Nothing to redo");
                }
            }
            "history" | "h" => {
                let history = editor.history();
                for (i, log) in history.iter().enumerate() {
                    let marker = if i == history.cursor() { ">" } else { " " };
                    println!(" {} {:>2} {}", marker, i, log.change);
                }
            }
            "status" | "s" => display_status(&editor),
            "save" => match rest.first() {
                Some(path) => {
                    std::fs::write(path, editor.to_json()?)?;
                    println!("Saved to {}", path);
                }
                None => println!("Usage: save <path>"),
            },
            "presets" => {
                let class = rest.first().copied().unwrap_or(ALL_CLASSES);
                let query = rest.get(1..).map(|q| q.join(" ")).unwrap_or_default();
                match rt.block_on(client.fetch_catalog()) {
                    Ok(catalog) => {
                        for preset in catalog.search(class, &query) {
                            println!("  {:<24} {:<10} {:>5.1}%  by {}", preset.filename, preset.class, preset.completeness, preset.credit);
                        }
                    }
                    Err(e) => println!("Could not load presets: {}", e),
                }
            }
            "random" => {
                let (Some(filename), Some(kind)) = (rest.first(), rest.get(1).and_then(|k| AbilityKind::parse(k))) else {
                    println!("Usage: random <preset> <kind>");
                    continue;
                };
                match rt.block_on(client.random_ability_of_kind(filename, kind)) {
                    Ok(Some(id)) => println!("Random {} ability: {}", kind.as_str(), id),
                    Ok(None) => println!("No {} abilities in {}", kind.as_str(), filename),
                    Err(e) => println!("Could not load preset: {}", e),
                }
            }
            _ => println!("Unknown command '{}', try 'help'", command),
        }
    }

    Ok(())
}

fn parse_id(args: &[&str]) -> Option<AbilityId> {
    args.first()?.parse::<u32>().ok().map(AbilityId)
}

fn print_help() {
    println!("Commands:");
    println!("  edit / alloc          - Switch between edit and allocation mode");
    println!("  allocate <id>         - Allocate an ability (a)");
    println!("  deallocate <id>       - Deallocate an ability (d)");
    println!("  start <id>            - Choose the starting ability");
    println!("  available             - List allocatable abilities");
    println!("  trees / tree <name>   - List or select named trees");
    println!("  newtree <name>        - Add a named tree");
    println!("  undo / redo           - Step through history");
    println!("  history               - Show history (h)");
    println!("  status                - Show tree status (s)");
    println!("  save <path>           - Write the tree as JSON");
    println!("  presets [class] [q]   - Search the preset catalog");
    println!("  random <preset> <kind> - Pick a random ability from a preset");
    println!("  quit                  - Exit (q)");
    println!();
}

fn display_status(editor: &TreeEditor) {
    let snapshot = editor.snapshot();
    let props = editor.properties();
    let current = editor.current_tree();

    println!();
    println!("Class: {}  Mode: {}", props.class, if editor.is_edit_mode() { "edit" } else { "allocation" });
    println!(
        "Abilities: {}  Cells: {}  Archetypes: {}",
        snapshot.abilities.len(),
        snapshot.cell_map.len(),
        snapshot.archetypes.len()
    );
    if !editor.is_edit_mode() {
        println!("Tree: '{}'  AP: {} / {}", editor.selected_tree(), current.ability_points(), props.max_ability_points);
        for (archetype, count) in current.archetype_counts() {
            println!("  {}: {}", archetype, count);
        }
        for id in current.allocated_ids() {
            let name = snapshot.abilities.get(id).map(|a| a.plain_name()).unwrap_or_default();
            println!("  [x] {} {}", id, name);
        }
    }
    println!();
}
