use pretty_assertions::assert_eq;

use super::*;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn emit_formats() {
    assert_eq!(EmitFormat::parse("listing"), Some(EmitFormat::Listing));
    assert_eq!(EmitFormat::parse("json"), Some(EmitFormat::Json));
    assert_eq!(EmitFormat::parse("bincode"), Some(EmitFormat::Bin));
    assert_eq!(EmitFormat::parse("llvm-ir"), None);
    assert!(EmitFormat::Bin.is_binary());
    assert!(!EmitFormat::Json.is_binary());
}

#[test]
fn parses_every_option() {
    let options = parse_options(&args(&[
        "--emit=json",
        "--output=out.json",
        "--answer=sensor=4",
        "-v",
    ]));
    assert_eq!(options.emit, EmitFormat::Json);
    assert_eq!(options.output, Some(PathBuf::from("out.json")));
    assert_eq!(
        options.answers,
        vec![Answer {
            target: "sensor".to_owned(),
            value: Literal::Integer(4),
        }]
    );
    assert!(options.verbose);
}

#[test]
fn unknown_values_keep_defaults() {
    let options = parse_options(&args(&["--emit=exe", "--answer=noequals", "--frobnicate"]));
    assert_eq!(options.emit, EmitFormat::Listing);
    assert!(options.answers.is_empty());
    assert!(options.output.is_none());
    assert!(!options.verbose);
}

#[test]
fn answer_literals() {
    let value = |s: &str| Answer::parse(s).unwrap().value;
    assert_eq!(value("f=2.5"), Literal::Number(2.5));
    assert_eq!(value("f=true"), Literal::Boolean(true));
    assert_eq!(value("f=null"), Literal::Null);
    assert_eq!(value("f=\"quoted\""), Literal::from("quoted"));
    assert_eq!(value("f=plain words"), Literal::from("plain words"));
    assert_eq!(value("f=a=b"), Literal::from("a=b"));
    assert_eq!(value("f="), Literal::from(""));
    assert!(Answer::parse("=5").is_none());
}

#[test]
fn merge_keeps_earlier_settings() {
    let mut options = parse_options(&args(&["--emit=bin", "--answer=a=1"]));
    options.merge(&parse_options(&args(&["-o=unit.bin"])));
    options.merge(&parse_options(&args(&["--answer=b=2"])));
    assert_eq!(options.emit, EmitFormat::Bin);
    assert_eq!(options.output, Some(PathBuf::from("unit.bin")));
    let targets: Vec<&str> = options.answers.iter().map(|a| a.target.as_str()).collect();
    assert_eq!(targets, vec!["a", "b"]);
}
