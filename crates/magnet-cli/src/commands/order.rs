use crate::support::{EXIT_CARD_INVALID, print_json, resolve_card_path_or_exit};
use magnet_card::{CardLoader, SymbolGraph};
use serde_json::json;

pub fn run(card: String, cards_dir: String, json_output: bool) {
    let path = resolve_card_path_or_exit(&card, &cards_dir);
    let spec = CardLoader::load_path(&path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(EXIT_CARD_INVALID);
    });
    let graph = SymbolGraph::build(&spec);
    let order = graph.resolution_order().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(EXIT_CARD_INVALID);
    });
    let external: Vec<&str> = graph.external_requirements().collect();

    if json_output {
        print_json(&json!({
            "card": path.display().to_string(),
            "order": order,
            "externalBindings": external,
        }));
    } else {
        println!("magnet order {}", path.display());
        for (position, name) in order.iter().enumerate() {
            let deps = spec
                .symbol(name)
                .map(|symbol| symbol.depends_on.iter().cloned().collect::<Vec<_>>())
                .unwrap_or_default();
            if deps.is_empty() {
                println!("  {}. {name}", position + 1);
            } else {
                println!("  {}. {name} <- {}", position + 1, deps.join(", "));
            }
        }
        if external.is_empty() {
            println!("  External bindings: none");
        } else {
            println!("  External bindings: {}", external.join(", "));
        }
    }
}
