//! E2E tests for dice rolling through the CLI commands.

use serde_json::json;
use sheetforge_domain::value_objects::GenerationMethod;

use super::E2ETestContext;
use crate::cli::{execute, parse_args, Command, Dice};

#[test]
fn test_drop_lowest_keeps_the_top_three() {
    let ctx = E2ETestContext::srd();
    let command = parse_args(["roll", "4d6dl1", "--rolls", "6,5,4,1"]).expect("valid args");

    let output = execute(&ctx.app, command).expect("roll");

    assert_eq!(output["formula"], "4d6dl1");
    assert_eq!(output["terms"][0]["rawRolls"], json!([6, 5, 4, 1]));
    assert_eq!(output["terms"][0]["keptRolls"], json!([6, 5, 4]));
    assert_eq!(output["total"], 15);
}

#[test]
fn test_seeded_rolls_repeat() {
    let ctx = E2ETestContext::srd();
    let roll = |seed: u64| {
        execute(
            &ctx.app,
            Command::Roll {
                formula: "3d8+2".to_string(),
                mode: None,
                dice: Dice::Seeded(seed),
            },
        )
        .expect("roll")
    };

    assert_eq!(roll(99), roll(99));
    assert_eq!(ctx.app.dice.stats("3d8+2").expect("rolled").count, 2);
}

#[test]
fn test_advantage_reports_both_rolls() {
    let ctx = E2ETestContext::srd();
    let command = parse_args(["roll", "1d20", "--advantage", "--rolls", "7,18"]).expect("args");

    let output = execute(&ctx.app, command).expect("advantage");

    assert_eq!(output["mode"], "advantage");
    assert_eq!(output["first"]["total"], 7);
    assert_eq!(output["second"]["total"], 18);
    assert_eq!(output["total"], 18);
}

#[test]
fn test_advantage_on_a_modified_roll_is_refused() {
    let ctx = E2ETestContext::srd();
    let command = parse_args(["roll", "1d20+3", "--disadvantage", "--seed", "1"]).expect("args");
    let err = execute(&ctx.app, command).expect_err("modifier present");
    assert!(err.to_string().contains("1d20+3"));
}

#[test]
fn test_malformed_formula_is_reported() {
    let ctx = E2ETestContext::srd();
    let command = parse_args(["roll", "2d6+"]).expect("args");
    assert!(execute(&ctx.app, command).is_err());
}

#[test]
fn test_rolled_ability_scores() {
    let ctx = E2ETestContext::srd();
    let faces = "6,6,6,1,5,5,5,5,4,4,4,4,3,3,3,3,2,2,2,2,1,1,1,1";
    let command = parse_args(["abilities", "4d6", "--rolls", faces]).expect("args");

    let output = execute(&ctx.app, command).expect("abilities");

    assert_eq!(
        output["scores"],
        json!({
            "strength": 18,
            "dexterity": 15,
            "constitution": 12,
            "intelligence": 9,
            "wisdom": 6,
            "charisma": 3,
        })
    );
    assert_eq!(
        output["method"],
        serde_json::to_value(GenerationMethod::FourD6DropLowest).expect("serialize")
    );
}
