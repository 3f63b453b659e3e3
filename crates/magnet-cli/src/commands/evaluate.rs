use crate::cli::CardArgs;
use crate::support::{construct_card_or_exit, print_json};
use magnet_card::{Detail, EvaluationCard};
use serde_json::{Value, json};

pub fn run(args: CardArgs, with_summary: bool, json_output: bool) {
    let (mut card, path) = construct_card_or_exit(&args);
    let status = card.evaluate();
    tracing::debug!(card = %path.display(), %status, "evaluate command finished");

    if json_output {
        let mut payload = json!({
            "card": path.display().to_string(),
            "title": card.spec().title(),
            "status": status,
        });
        attach_detail(&mut payload, &card);
        if with_summary {
            payload["summary"] = serde_json::to_value(card.summarize()).expect("json serialization");
        }
        print_json(&payload);
    } else {
        println!("{status}");
        if with_summary {
            println!("{}", card.summarize());
        } else {
            match card.detail() {
                Some(Detail::Falsified(message)) => println!("  Falsified: {message}"),
                Some(Detail::Fault(fault)) => println!("  Fault: {fault}"),
                None => {}
            }
        }
    }
}

fn attach_detail(payload: &mut Value, card: &EvaluationCard) {
    match card.detail() {
        Some(Detail::Falsified(message)) => payload["falsification"] = json!(message),
        Some(Detail::Fault(fault)) => {
            payload["fault"] = serde_json::to_value(fault).expect("json serialization")
        }
        None => {}
    }
}
