use std::path::{Path, PathBuf};

use pdf_word_counter::{
    Backends,
    BatchOptions,
    Error,
    SearchOptions,
    TableBackend,
    Value,
    batch,
    testing::pdf_with_pages,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn setup_fixture(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(
        dir.join("2021_annual.pdf"),
        pdf_with_pages(&["Rust is fast", "rust and Rust again"])?,
    )?;
    std::fs::write(
        dir.join("2023_annual.pdf"),
        pdf_with_pages(&["Nothing here", "Still nothing", "rust"])?,
    )?;
    std::fs::write(dir.join("notes.pdf"), pdf_with_pages(&["cargo build"])?)?;
    Ok(())
}

fn pattern(dir: &Path) -> String {
    dir.join("*.pdf").to_string_lossy().into_owned()
}

fn options() -> SearchOptions {
    SearchOptions {
        include_year: true,
        default_year: Some("none".to_string()),
        ..SearchOptions::default()
    }
}

fn text_column(table: &pdf_word_counter::Table, name: &str) -> Vec<String> {
    table
        .column(name)
        .unwrap_or_default()
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn serial_batch_over_generated_pdfs() -> TestResult {
    let tempdir = tempfile::tempdir()?;
    setup_fixture(tempdir.path())?;

    let table = batch::run(
        &[pattern(tempdir.path())],
        &["rust", "cargo"],
        options(),
        &BatchOptions::default(),
        Backends::detect(),
    )?;

    assert_eq!(table.columns(), &["file", "year", "pages", "rust", "cargo"]);
    assert_eq!(
        text_column(&table, "file"),
        vec!["2021_annual", "2023_annual", "notes"]
    );
    assert_eq!(text_column(&table, "year"), vec!["2021", "2023", "none"]);
    assert_eq!(text_column(&table, "pages"), vec!["2", "3", "1"]);
    assert_eq!(text_column(&table, "rust"), vec!["3", "1", "0"]);
    assert_eq!(text_column(&table, "cargo"), vec!["0", "0", "1"]);
    Ok(())
}

#[test]
fn pooled_batch_matches_serial_once_sorted() -> TestResult {
    let tempdir = tempfile::tempdir()?;
    setup_fixture(tempdir.path())?;
    let patterns = [pattern(tempdir.path())];
    let serial_options = BatchOptions {
        sort_columns: vec!["file".to_string()],
        ..BatchOptions::default()
    };
    let pooled_options = BatchOptions {
        workers: 3,
        ..serial_options.clone()
    };

    let serial = batch::run(
        &patterns,
        &["rust"],
        options(),
        &serial_options,
        Backends::detect(),
    )?;
    let pooled = batch::run(
        &patterns,
        &["rust"],
        options(),
        &pooled_options,
        Backends::detect(),
    )?;
    assert_eq!(serial, pooled);
    Ok(())
}

#[test]
fn corrupt_document_fails_the_batch() -> TestResult {
    let tempdir = tempfile::tempdir()?;
    setup_fixture(tempdir.path())?;
    std::fs::write(tempdir.path().join("broken.pdf"), b"%PDF-1.5 garbage")?;

    for workers in [1, 2] {
        let options = BatchOptions {
            workers,
            ..BatchOptions::default()
        };
        let err = batch::run(
            &[pattern(tempdir.path())],
            &["rust"],
            SearchOptions::default(),
            &options,
            Backends::detect(),
        )
        .unwrap_err();
        match err {
            Error::Extraction { path, .. } => {
                assert_eq!(path, tempdir.path().join("broken.pdf"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
    Ok(())
}

#[test]
fn page_selection_and_sorting() -> TestResult {
    let tempdir = tempfile::tempdir()?;
    setup_fixture(tempdir.path())?;
    let batch_options = BatchOptions {
        sort_columns: vec!["rust".to_string(), "missing".to_string()],
        ..BatchOptions::default()
    };
    let search = SearchOptions {
        pages: pdf_word_counter::PageSelection::parse(Some("-1"))?,
        ..SearchOptions::default()
    };

    let table = batch::run(
        &[pattern(tempdir.path())],
        &["rust"],
        search,
        &batch_options,
        Backends::detect(),
    )?;
    // Only the last page of each document is searched.
    assert_eq!(
        table.column("rust"),
        Some(vec![
            &Value::Integer(0),
            &Value::Integer(1),
            &Value::Integer(2)
        ])
    );
    assert_eq!(text_column(&table, "pages"), vec!["1", "1", "1"]);
    Ok(())
}

#[test]
fn page_out_of_range_is_an_error() -> TestResult {
    let tempdir = tempfile::tempdir()?;
    setup_fixture(tempdir.path())?;
    let search = SearchOptions {
        pages: pdf_word_counter::PageSelection::parse(Some("2"))?,
        ..SearchOptions::default()
    };

    let err = batch::run(
        &[pattern(tempdir.path())],
        &["rust"],
        search,
        &BatchOptions::default(),
        Backends::detect(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("2021_annual.pdf"), "{err}");
    Ok(())
}

#[test]
fn writes_json_output() -> TestResult {
    let tempdir = tempfile::tempdir()?;
    setup_fixture(tempdir.path())?;
    let output: PathBuf = tempdir.path().join("counts.json");
    let batch_options = BatchOptions {
        output: Some(output.clone()),
        table_backend: TableBackend::Json,
        ..BatchOptions::default()
    };

    batch::run(
        &[tempdir.path().join("notes.pdf").to_string_lossy().into_owned()],
        &["cargo"],
        SearchOptions::default(),
        &batch_options,
        Backends::detect(),
    )?;

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output)?)?;
    assert_eq!(
        written,
        serde_json::json!([{ "file": "notes", "pages": 1, "cargo": 1 }])
    );
    Ok(())
}

#[cfg(feature = "pdf-extract")]
#[test]
fn whole_document_backend_agrees_with_pages() -> TestResult {
    use pdf_word_counter::search::BackendChoice;

    let tempdir = tempfile::tempdir()?;
    setup_fixture(tempdir.path())?;
    let patterns = [pattern(tempdir.path())];
    let sort = BatchOptions {
        sort_columns: vec!["file".to_string()],
        ..BatchOptions::default()
    };

    let pages = batch::run(
        &patterns,
        &["rust", "cargo"],
        SearchOptions::default(),
        &sort,
        Backends::detect(),
    )?;
    let whole = batch::run(
        &patterns,
        &["rust", "cargo"],
        SearchOptions {
            backend: BackendChoice::Alternate,
            ..SearchOptions::default()
        },
        &sort,
        Backends::detect(),
    )?;
    assert_eq!(pages, whole);
    Ok(())
}
