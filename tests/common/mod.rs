use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use data_encoding::HEXLOWER;

pub fn setup() {
    let results_dir_path = PathBuf::from_str("./target/results/").unwrap();
    let tmp_dir_path = PathBuf::from_str("./target/tmp/").unwrap();

    if !results_dir_path.exists() {
        fs::create_dir_all(&results_dir_path).unwrap_or_else(|_|
            panic!("Failed to create results directory: {:?}", results_dir_path)
        );
    }

    if !tmp_dir_path.exists() {
        fs::create_dir_all(&tmp_dir_path).unwrap_or_else(|_|
            panic!("Failed to create tmp directory: {:?}", tmp_dir_path)
        );
    }
}

#[allow(dead_code)]
pub fn read_lines(path: PathBuf) -> Result<Vec<String>, anyhow::Error> {
    let content = fs::read_to_string(path)?;
    Ok(content.lines().map(|line| line.to_string()).collect())
}

#[allow(dead_code)]
pub fn temp_file_name(dir: &str) -> PathBuf {
    let mut result = PathBuf::from(dir);
    let name = HEXLOWER.encode(&rand::random::<[u8; 16]>());
    result.push(name);
    result
}

/// A fresh, empty directory under ./target/tmp/ for the intermediate files of one test
#[allow(dead_code)]
pub fn tmp_dir() -> PathBuf {
    let path = temp_file_name("./target/tmp/");
    fs::create_dir_all(&path).unwrap_or_else(|_|
        panic!("Failed to create tmp directory: {:?}", path)
    );
    path
}

#[allow(dead_code)]
pub fn is_empty_dir(path: &PathBuf) -> Result<bool, anyhow::Error> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write `lines`, each followed by `separator`, to a new file under ./target/results/
#[allow(dead_code)]
pub fn write_lines(lines: &[String], separator: &str) -> Result<PathBuf, anyhow::Error> {
    let path = temp_file_name("./target/results/");
    let mut content = String::new();
    for line in lines {
        content.push_str(line);
        content.push_str(separator);
    }
    fs::write(&path, content)?;
    Ok(path)
}

/// Stable sort of `lines` by the `column`-th `delimiter` separated field, a missing field is empty
#[allow(dead_code)]
pub fn expected_order(lines: &[String], column: usize, delimiter: &str) -> Vec<String> {
    let mut expected = lines.to_vec();
    expected.sort_by(|a, b| {
        let key_a = a.split(delimiter).nth(column).unwrap_or("");
        let key_b = b.split(delimiter).nth(column).unwrap_or("");
        key_a.cmp(key_b)
    });
    expected
}
