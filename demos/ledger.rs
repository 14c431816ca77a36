//! Compile a small ledger-style service and resolve a sample call result.
//!
//! Run with: cargo run --example ledger

use candid_fields::{
    FuncMode, FuncTy, NumTy, NumWidth, RecTy, ResolvedKind, ResolvedNode, ServiceMeta, Ty,
};
use serde_json::json;

fn ledger_service() -> Ty {
    // type Tx = variant { Mint : record {...}; Transfer : record {...} }
    // type History = opt record { tx : Tx; next : History }
    let history = RecTy::new("History");
    let tx = Ty::Variant(vec![
        (
            "Mint".to_string(),
            Ty::Record(vec![
                ("to".to_string(), Ty::Principal),
                ("amount".to_string(), Ty::Num(NumTy::nat(NumWidth::W64))),
            ]),
        ),
        (
            "Transfer".to_string(),
            Ty::Record(vec![
                ("from".to_string(), Ty::Principal),
                ("to".to_string(), Ty::Principal),
                ("amount".to_string(), Ty::Num(NumTy::nat(NumWidth::W64))),
                ("memo".to_string(), Ty::Opt(Box::new(Ty::blob()))),
            ]),
        ),
    ]);
    history.fill(Ty::Opt(Box::new(Ty::Record(vec![
        ("tx".to_string(), tx),
        ("created_at".to_string(), Ty::Num(NumTy::nat(NumWidth::W64))),
        ("next".to_string(), Ty::Rec(history.clone())),
    ]))));

    Ty::Service(vec![
        (
            "account_history".to_string(),
            FuncTy {
                args: vec![Ty::Principal],
                rets: vec![Ty::Rec(history)],
                mode: FuncMode::Query,
            },
        ),
        (
            "balance_of".to_string(),
            FuncTy {
                args: vec![Ty::Principal],
                rets: vec![Ty::Num(NumTy::NAT)],
                mode: FuncMode::Query,
            },
        ),
    ])
}

fn print_tree(node: &ResolvedNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let summary = match &node.kind {
        ResolvedKind::Record { .. } => "record".to_string(),
        ResolvedKind::Variant { selected, .. } => format!("variant → {selected}"),
        ResolvedKind::Optional { value } => {
            format!("optional ({})", if value.is_some() { "some" } else { "none" })
        }
        _ => node.display.to_string(),
    };
    println!("{indent}{}: {summary}", node.display_label);
    match &node.kind {
        ResolvedKind::Record { fields } | ResolvedKind::Tuple { fields } => {
            for field in fields {
                print_tree(field, depth + 1);
            }
        }
        ResolvedKind::Variant { value, .. } => print_tree(value, depth + 1),
        ResolvedKind::Optional { value: Some(inner) } => print_tree(inner, depth + 1),
        ResolvedKind::Vector { items } => {
            for item in items {
                print_tree(item, depth + 1);
            }
        }
        _ => {}
    }
}

fn main() {
    let service = ServiceMeta::compile(&ledger_service()).expect("well-formed service");

    for name in service.method_names() {
        let method = service.method(name).expect("listed method");
        println!(
            "{name}: {} args, {} rets, {:?}",
            method.arg_count(),
            method.ret_count(),
            method.mode
        );
        println!("  defaults: {}", method.default_args);
    }

    // a decoded two-entry history, mixing tagged and untagged variants
    let history = json!({
        "tx": {
            "Transfer": {
                "from": [1, 2, 3],
                "to": [4, 5, 6],
                "amount": 250_000u64,
                "memo": ["deadbeef"],
            },
        },
        "created_at": "1620328630000000000",
        "next": {
            "tx": { "_type": "Mint", "Mint": { "to": [4, 5, 6], "amount": 1_000_000u64 } },
            "created_at": "1620242230000000000",
            "next": null,
        },
    });

    let method = service.method("account_history").expect("declared method");
    let results = method
        .resolve_results(&history)
        .expect("history value matches the interface");
    for result in &results {
        print_tree(result, 0);
    }
}
