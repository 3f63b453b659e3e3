use crate::cli::CardArgs;
use crate::support::{construct_card_or_exit, print_json};

pub fn run(args: CardArgs, evaluate_first: bool, json_output: bool) {
    let (mut card, _path) = construct_card_or_exit(&args);
    if evaluate_first {
        card.evaluate();
    }
    let summary = card.summarize();

    if json_output {
        print_json(&serde_json::to_value(&summary).expect("json serialization"));
    } else {
        println!("{summary}");
    }
}
