use super::*;
use serde_json::json;

const DFN_CELL: &str = include_str!("../../tests/data/nmc_pouch_cell_dfn.json");
const LINEAR_SPM: &str = include_str!("../../tests/data/linear_ocp_spm.json");

fn dfn() -> Json {
    serde_json::from_str(DFN_CELL).unwrap()
}

fn spm() -> Json {
    serde_json::from_str(LINEAR_SPM).unwrap()
}

fn issues_of(json: &Json) -> SchemaError {
    parse_document(json).unwrap_err()
}

#[test]
fn test_parse_full_dfn_document() {
    let doc = parse_document(&dfn()).unwrap();
    assert_eq!(doc.model(), ModelType::DFN);
    assert_eq!(doc.header.bpx, BpxVersion::Semantic("0.4.0".to_string()));
    assert_eq!(doc.parameterisation.cell.number_of_electrode_pairs, 34);

    let negative = &doc.parameterisation.negative_electrode;
    assert_eq!(negative.conductivity, Some(0.222));
    assert!(matches!(negative.particle().unwrap().ocp, Value::Table(_)));
    assert!(doc.parameterisation.separator.is_some());

    let experiments = doc.validation.as_ref().unwrap();
    assert_eq!(experiments["C/20 discharge"].time.len(), 4);
}

#[test]
fn test_round_trip_is_stable() {
    for json in [dfn(), spm()] {
        let doc = parse_document(&json).unwrap();
        let written = doc.to_json();
        let again = parse_document(&written).unwrap();
        assert_eq!(again, doc);
        assert_eq!(again.to_json(), written);
        assert_eq!(serde_json::to_value(&doc).unwrap(), written);
    }
}

#[test]
fn test_unknown_key_is_reported_with_path() {
    let mut json = dfn();
    json["Parameterisation"]["Negative electrode"]["Colour"] = json!("grey");
    let err = issues_of(&json);
    assert!(err.has_path("Parameterisation/Negative electrode/Colour"));
    assert_eq!(err.issues[0].kind, IssueKind::Unknown);
}

#[test]
fn test_unit_suffix_must_match_exactly() {
    let mut json = spm();
    let cell = json["Parameterisation"]["Cell"].as_object_mut().unwrap();
    let area = cell.remove("Electrode area [m2]").unwrap();
    cell.insert("Electrode area [m^2]".to_string(), area);
    let err = issues_of(&json);
    assert!(err.has_path("Parameterisation/Cell/Electrode area [m^2]"));
    assert!(err.has_path("Parameterisation/Cell/Electrode area [m2]"));
}

#[test]
fn test_all_issues_collected_in_document_order() {
    let mut json = dfn();
    json["Header"].as_object_mut().unwrap().remove("BPX");
    json["Parameterisation"]["Cell"]["Volume [m3]"] = json!("big");
    json["Parameterisation"]["Positive electrode"]["OCP [V]"] = json!("3.5 - ");
    json["Parameterisation"]["Separator"]["Porosity"] = json!(null);

    let err = issues_of(&json);
    let paths: Vec<&str> = err.issues.iter().map(|i| i.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "Header/BPX",
            "Parameterisation/Cell/Volume [m3]",
            "Parameterisation/Positive electrode/OCP [V]",
            "Parameterisation/Separator/Porosity",
        ]
    );
    let kinds: Vec<IssueKind> = err.issues.iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        vec![IssueKind::Missing, IssueKind::WrongType, IssueKind::Syntax, IssueKind::WrongType]
    );
}

#[test]
fn test_requirements_follow_model() {
    // SPM needs no electrolyte, separator or porosity
    assert!(parse_document(&spm()).is_ok());

    let mut json = spm();
    json["Header"]["Model"] = json!("SPMe");
    let err = issues_of(&json);
    assert!(err.has_path("Parameterisation/Electrolyte"));
    assert!(err.has_path("Parameterisation/Separator"));
    assert!(err.has_path("Parameterisation/Negative electrode/Porosity"));
    assert!(!err.has_path("Parameterisation/Negative electrode/Conductivity [S.m-1]"));
    assert!(err.issues.iter().any(|i| i.message.contains("SPMe")));

    let mut json = dfn();
    json["Parameterisation"]["Positive electrode"]
        .as_object_mut()
        .unwrap()
        .remove("Conductivity [S.m-1]");
    assert!(issues_of(&json).has_path("Parameterisation/Positive electrode/Conductivity [S.m-1]"));
}

#[test]
fn test_unknown_model_rejected() {
    let mut json = spm();
    json["Header"]["Model"] = json!("P2D");
    let err = issues_of(&json);
    assert!(err.has_path("Header/Model"));
    assert!(err.to_string().contains("P2D"));
}

#[test]
fn test_legacy_numeric_version_accepted() {
    let mut json = spm();
    json["Header"]["BPX"] = json!(0.1);
    let doc = parse_document(&json).unwrap();
    assert!(doc.header.bpx.is_legacy());
    assert_eq!(doc.to_json()["Header"]["BPX"], json!(0.1));

    json["Header"]["BPX"] = json!("v1");
    assert!(issues_of(&json).has_path("Header/BPX"));
}

#[test]
fn test_number_of_pairs_must_be_positive_integer() {
    let mut json = spm();
    json["Parameterisation"]["Cell"]["Number of electrode pairs connected in parallel to make a cell"] = json!(1.5);
    assert!(issues_of(&json)
        .has_path("Parameterisation/Cell/Number of electrode pairs connected in parallel to make a cell"));

    json["Parameterisation"]["Cell"]["Number of electrode pairs connected in parallel to make a cell"] = json!(2.0);
    let doc = parse_document(&json).unwrap();
    assert_eq!(doc.parameterisation.cell.number_of_electrode_pairs, 2);
}

fn blended_spm(fractions: [f64; 2]) -> Json {
    let mut json = spm();
    let positive = json["Parameterisation"]["Positive electrode"].as_object_mut().unwrap();
    let mut material = serde_json::Map::new();
    for key in [
        "Particle radius [m]",
        "Diffusivity [m2.s-1]",
        "OCP [V]",
        "Surface area per unit volume [m-1]",
        "Reaction rate constant [mol.m-2.s-1]",
        "Minimum stoichiometry",
        "Maximum stoichiometry",
        "Maximum concentration [mol.m-3]",
    ] {
        material.insert(key.to_string(), positive.remove(key).unwrap());
    }
    let mut primary = material.clone();
    primary.insert("Volume fraction".to_string(), json!(fractions[0]));
    let mut secondary = material;
    secondary.insert("Volume fraction".to_string(), json!(fractions[1]));
    positive.insert(
        "Particle".to_string(),
        json!({"Primary": primary, "Secondary": secondary}),
    );
    json
}

#[test]
fn test_blended_electrode() {
    let doc = parse_document(&blended_spm([0.9, 0.1])).unwrap();
    let positive = &doc.parameterisation.positive_electrode;
    assert!(positive.is_blended());
    assert!(positive.particle().is_none());
    let ActiveMaterial::Blended(blend) = &positive.active_material else {
        panic!("expected a blend");
    };
    assert_eq!(blend.get("Secondary").unwrap().volume_fraction, 0.1);

    let paths: Vec<String> = doc.values().into_iter().map(|(p, _)| p).collect();
    assert!(paths.contains(&"Parameterisation/Positive electrode/Particle/Primary/OCP [V]".to_string()));

    let again = parse_document(&doc.to_json()).unwrap();
    assert_eq!(again, doc);
}

#[test]
fn test_blend_fractions_must_sum_to_one() {
    let err = issues_of(&blended_spm([0.9, 0.2]));
    assert!(err.has_path("Parameterisation/Positive electrode/Particle"));
    assert_eq!(err.issues[0].kind, IssueKind::Validation);
}

#[test]
fn test_blend_member_unknown_key() {
    let mut json = blended_spm([0.5, 0.5]);
    json["Parameterisation"]["Positive electrode"]["Particle"]["Primary"]["Thickness [m]"] = json!(1e-5);
    assert!(issues_of(&json).has_path("Parameterisation/Positive electrode/Particle/Primary/Thickness [m]"));
}

#[test]
fn test_values_lists_every_value_field() {
    let doc = parse_document(&dfn()).unwrap();
    let paths: Vec<String> = doc.values().into_iter().map(|(p, _)| p).collect();
    assert!(paths.contains(&"Parameterisation/Electrolyte/Conductivity [S.m-1]".to_string()));
    assert!(paths.contains(&"Parameterisation/Negative electrode/OCP [V]".to_string()));
    assert!(paths.contains(&"Parameterisation/Positive electrode/Entropic change coefficient [V.K-1]".to_string()));
    assert!(paths.contains(&"Parameterisation/User-defined/Electrolyte viscosity [Pa.s]".to_string()));

    let ocp = doc.value("Parameterisation/Positive electrode/OCP [V]").unwrap();
    let v = ocp.evaluate(0.42424, None).unwrap();
    assert!(v > 4.0 && v < 4.5);
    assert!(doc.value("Parameterisation/Cell/Volume [m3]").is_none());
}

#[test]
fn test_invalid_experiment_reported() {
    let mut json = dfn();
    json["Validation"]["C/20 discharge"]["Voltage [V]"] = json!([4.19, 3.95]);
    let err = issues_of(&json);
    assert!(err.has_path("Validation/C/20 discharge"));
    assert!(err.issues[0].message.contains("Voltage [V]"));
}

#[test]
fn test_non_object_root() {
    let err = issues_of(&json!([1, 2, 3]));
    assert_eq!(err.issues.len(), 1);
    assert_eq!(err.issues[0].kind, IssueKind::WrongType);
}
