use datasmith_schema::{ObjectKind, ObjectSchema, build_visible_form, merge_settings, merge_settings_with};
use datasmith_trees::{Tree, plain_leaf};
use serde_json::{Value, json};

fn tree(value: Value) -> Tree {
    value.as_object().cloned().expect("object fixture")
}

fn field_schema() -> ObjectSchema {
    ObjectSchema::builtin(ObjectKind::Field).expect("field schema")
}

#[test]
fn new_over_old_over_defaults() {
    let schema = field_schema();
    let old = merge_settings(
        &schema,
        &Tree::new(),
        &tree(json!({"dataType": {"numberSequence": {"start": 5, "step": 2}}})),
    )
    .expect("old settings");
    let new = tree(json!({"dataType": {"numberSequence": {"step": 3}}}));

    let merged = merge_settings(&schema, &old, &new).expect("merge");

    let sequence = &merged["dataType"]["numberSequence"];
    assert_eq!(sequence["start"], json!(5));
    assert_eq!(sequence["step"], json!(3));
    assert_eq!(sequence["sequenceType"], json!("infinite"));
    assert_eq!(merged["dataType"]["dataType"], json!("null"));
    assert_eq!(merged["keySettings"]["primaryKey"], json!(false));
}

#[test]
fn empty_patches_yield_the_defaults() {
    let schema = field_schema();

    let merged = merge_settings(&schema, &Tree::new(), &Tree::new()).expect("merge");

    assert_eq!(&merged, schema.defaults());
}

#[test]
fn merging_an_empty_patch_again_is_a_no_op() {
    let schema = field_schema();
    let old = tree(json!({
        "keySettings": {"primaryKey": true},
        "dataType": {"dataType": "surname"}
    }));
    let new = tree(json!({"dataType": {"randomNumber": {"end": 100}}}));

    let once = merge_settings(&schema, &old, &new).expect("merge");
    let twice = merge_settings(&schema, &once, &Tree::new()).expect("merge again");

    assert_eq!(once, twice);
    assert_eq!(once["keySettings"]["primaryKey"], json!(true));
    assert_eq!(once["dataType"]["randomNumber"]["end"], json!(100));
}

#[test]
fn result_has_the_shape_of_the_defaults() {
    let schema = field_schema();
    let new = tree(json!({
        "keySettings": {"foreignKeyParams": {"table": "users", "field": "id"}},
        "unknown": {"deep": 1}
    }));

    let merged = merge_settings(&schema, &Tree::new(), &new).expect("merge");

    let mut expected = schema.defaults().clone();
    expected["keySettings"]["foreignKeyParams"] = json!({"table": "users", "field": "id"});
    assert_eq!(merged, expected);
}

#[test]
fn selecting_a_data_type_reveals_its_section() {
    let defaults = tree(json!({
        "dataType": {
            "dataType": "null",
            "numberSequence": {"start": 0, "step": 1, "sequenceType": "infinite"}
        }
    }));
    let new = tree(json!({"dataType": {"dataType": "numberSequence"}}));

    let merged = merge_settings_with(&defaults, &defaults, &new, plain_leaf).expect("merge");

    assert_eq!(merged["dataType"]["dataType"], json!("numberSequence"));
    assert_eq!(
        merged["dataType"]["numberSequence"],
        json!({"start": 0, "step": 1, "sequenceType": "infinite"})
    );

    let schema = field_schema();
    let settings = merge_settings(&schema, schema.defaults(), &new).expect("field merge");
    let form = build_visible_form(&settings, schema.form()).expect("visible form");
    let paths: Vec<String> = form.iter().map(|element| element.path.join("/")).collect();

    let selector = paths
        .iter()
        .position(|path| path == "dataType/dataType")
        .expect("data type selector");
    let sequence = paths
        .iter()
        .position(|path| path == "dataType/numberSequence/start")
        .expect("number sequence section");
    assert!(selector < sequence);
    assert!(paths.iter().all(|path| !path.starts_with("dataType/randomNumber")));
    assert_eq!(
        &paths[selector..],
        [
            "dataType/dataType",
            "dataType/numberSequence/start",
            "dataType/numberSequence/step",
            "dataType/numberSequence/sequenceType",
        ]
    );
}

#[test]
fn random_number_section_follows_number_sequence_in_form_order() {
    let schema = field_schema();
    let settings = merge_settings(
        &schema,
        schema.defaults(),
        &tree(json!({"dataType": {"dataType": "randomNumber"}})),
    )
    .expect("merge");

    let form = schema.visible_form(&settings).expect("visible form");
    let paths: Vec<String> = form.iter().map(|element| element.path.join("/")).collect();

    assert_eq!(
        paths,
        [
            "keySettings/primaryKey",
            "keySettings/foreignKey",
            "dataType/dataType",
            "dataType/randomNumber/start",
            "dataType/randomNumber/end",
            "dataType/randomNumber/round",
        ]
    );
}
