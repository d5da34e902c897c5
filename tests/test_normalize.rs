use std::fs;
use std::path::PathBuf;

use tabular_file_sort::error::TabularError;
use tabular_file_sort::normalize::Normalize;

mod common;

fn write_input(content: &str) -> Result<PathBuf, anyhow::Error> {
    let path = common::temp_file_name("./target/results/");
    fs::write(&path, content)?;
    Ok(path)
}

#[test]
fn test_normalize() -> Result<(), anyhow::Error> {
    common::setup();
    let output_path = common::temp_file_name("./target/results/");
    let normalize = Normalize::new(PathBuf::from("./tests/fixtures/test_normalize.csv"), output_path.clone());
    assert_eq!(normalize.normalize()?, 4);

    let lines = common::read_lines(output_path.clone())?;
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "1,\"a,\",b");
    assert_eq!(lines[1], "2,c,d");
    assert_eq!(lines[2], "3,é,f");
    assert_eq!(
        lines[3],
        format!(
            "3.1415926535897932384626433832795028841971693993751058209749445923078164062862089986,\"Pi, Pi, Pi, Pi, Pi, Pi, Pi, Pi\",{}",
            "π".repeat(46)
        )
    );

    // normalizing normalized output changes nothing
    let second_path = common::temp_file_name("./target/results/");
    let normalize = Normalize::new(output_path.clone(), second_path.clone());
    assert_eq!(normalize.normalize()?, 4);
    assert_eq!(fs::read(&output_path)?, fs::read(&second_path)?);

    fs::remove_file(output_path)?;
    fs::remove_file(second_path)?;
    Ok(())
}

#[test]
fn test_normalize_joins_quoted_fields() -> Result<(), anyhow::Error> {
    common::setup();
    let input_path = write_input("1,\"a,b\",c\n2,d\n")?;
    let output_path = common::temp_file_name("./target/results/");
    let normalize = Normalize::new(input_path.clone(), output_path.clone());
    assert_eq!(normalize.normalize()?, 2);
    assert_eq!(fs::read_to_string(&output_path)?, "1,\"a,b\",c\n2,d\n");

    let multiline_path = write_input("x,\"line one\nline two\",\"say \"\"hi\"\"\"\n\ny,z")?;
    let normalize = Normalize::new(multiline_path.clone(), output_path.clone());
    assert_eq!(normalize.normalize()?, 2);
    assert_eq!(fs::read_to_string(&output_path)?, "x,line oneline two,\"say \"\"hi\"\"\"\ny,z\n");

    fs::remove_file(input_path)?;
    fs::remove_file(multiline_path)?;
    fs::remove_file(output_path)?;
    Ok(())
}

#[test]
fn test_normalize_with_header() -> Result<(), anyhow::Error> {
    common::setup();
    let input_path = write_input("id\tname\n1\tAbies alba\n2\t\"Picea\tabies\"\n")?;
    let output_path = common::temp_file_name("./target/results/");
    let mut normalize = Normalize::new(input_path.clone(), output_path.clone());
    normalize.with_delimiter('\t');
    normalize.with_header(true);
    assert_eq!(normalize.normalize()?, 2);
    assert_eq!(fs::read_to_string(&output_path)?, "id\tname\n1\tAbies alba\n2\t\"Picea\tabies\"\n");

    fs::remove_file(input_path)?;
    fs::remove_file(output_path)?;
    Ok(())
}

#[test]
fn test_normalize_crlf() -> Result<(), anyhow::Error> {
    common::setup();
    let input_path = write_input("a,b\r\n\"x\r\ny\",z\r\n,\r\n")?;
    let output_path = common::temp_file_name("./target/results/");
    let mut normalize = Normalize::new(input_path.clone(), output_path.clone());
    normalize.with_record_separator("\r\n");
    assert_eq!(normalize.normalize()?, 3);
    assert_eq!(fs::read_to_string(&output_path)?, "a,b\r\nxy,z\r\n,\r\n");

    fs::remove_file(input_path)?;
    fs::remove_file(output_path)?;
    Ok(())
}

#[test]
fn test_normalize_unterminated_quote() -> Result<(), anyhow::Error> {
    common::setup();
    let input_path = write_input("1,a\n2,\"b\n3,c\n")?;
    let output_path = common::temp_file_name("./target/results/");
    let normalize = Normalize::new(input_path.clone(), output_path.clone());
    let error = normalize.normalize().unwrap_err();
    assert!(matches!(error.downcast_ref::<TabularError>(), Some(TabularError::MalformedQuoting { record: 2 })));
    assert!(!output_path.exists());

    fs::remove_file(input_path)?;
    Ok(())
}

#[test]
fn test_normalize_missing_input() {
    let output_path = PathBuf::from("./target/results/never-normalized");
    let normalize = Normalize::new(PathBuf::from("./tests/fixtures/no-such-file.csv"), output_path.clone());
    let error = normalize.normalize().unwrap_err();
    assert!(matches!(error.downcast_ref::<TabularError>(), Some(TabularError::InputNotFound(_))));
    assert!(!output_path.exists());
}
