// ==========================================
// Import pipeline integration tests
// ==========================================
// fetch -> dispatch -> map -> normalize -> assemble -> store
// through ReportImporterImpl with fixture collaborators
// ==========================================


use eeu_ingest::domain::{AreaUnit, FuelCategory, ReportType, WarningCode};
use eeu_ingest::importer::{ImportError, ImportOutcome, ReportImporter, UploadRequest};
use eeu_ingest::logging;
use eeu_ingest::parser::ParseError;
use eeu_ingest::repository::{EeuRecordRepository, InMemoryEeuRecordRepository};
use eeu_ingest::UploadRecord;
use test_helpers::*;

const GENERIC_URL: &str = "https://files.example.com/uploads/building.csv?sig=1";
const STANDARD_URL: &str = "https://files.example.com/uploads/monthly.pdf";
const MULTI_URL: &str = "https://files.example.com/uploads/portfolio.csv";
const BEPS_URL: &str = "https://files.example.com/uploads/beps.pdf";
const METRIC_URL: &str = "https://files.example.com/uploads/metric.csv";

fn fetcher() -> FixtureFetcher {
    FixtureFetcher::new()
        .with(
            GENERIC_URL,
            Fixture::Text(generic_csv("gj", "1000", &[("Heating_Electricity", "10")])),
        )
        .with(STANDARD_URL, Fixture::Pages(equest_standard_pages()))
        .with(MULTI_URL, Fixture::Text(multi_project_csv()))
        .with(BEPS_URL, Fixture::Pages(vec![beps_page("300.0")]))
        .with(
            METRIC_URL,
            Fixture::Text("conditioned_area,area_units,energy_units,zip_code,Heating_Electricity\n100,sm,mbtu,02116,10\n".to_string()),
        )
}

fn single(outcome: ImportOutcome) -> UploadRecord {
    match outcome {
        ImportOutcome::Single(upload) => *upload,
        other => panic!("expected a single record, got {:?}", other),
    }
}

#[tokio::test]
async fn test_generic_spreadsheet_in_gj() {
    logging::init_test();
    let repo = InMemoryEeuRecordRepository::new();
    let importer = build_importer(fetcher(), TableWeatherLookup::default(), Box::new(repo.clone()));

    let upload = single(importer.import(UploadRequest::new(GENERIC_URL)).await.unwrap());
    let record = &upload.record;

    assert_eq!(record.energy_units.as_str(), "mbtu");
    assert!(approx(record.field("Heating_Electricity").unwrap(), 9.47817));
    assert!(approx(record.total(FuelCategory::Electricity), 9.47817));
    assert!(approx(record.total_energy, 9.47817));
    assert_eq!(record.conditioned_area_sf, Some(1000.0));
    assert_eq!(record.report_type, ReportType::GenericXlsx);

    assert_eq!(upload.file_name, "building.csv");
    assert_eq!(upload.file_type, "xlsx");
    assert_eq!(upload.file_url, GENERIC_URL);
    assert_eq!(upload.weather.city.as_deref(), Some("Boston"));
    assert_eq!(record.reported_values[0].energy_value_report, 10.0);

    assert_eq!(repo.len(), 1);
    let stored = repo.find_by_id(&upload.id).await.unwrap().unwrap();
    assert_eq!(stored.record, upload.record);
}

#[tokio::test]
async fn test_square_metre_area_stored_as_sf() {
    let importer = build_importer(
        fetcher(),
        TableWeatherLookup::default(),
        Box::new(InMemoryEeuRecordRepository::new()),
    );

    let upload = single(importer.import(UploadRequest::new(METRIC_URL)).await.unwrap());
    let record = &upload.record;

    assert!(approx(record.conditioned_area_sf.unwrap(), 1076.39));
    assert_eq!(record.area_units, AreaUnit::Sf);
    assert_eq!(record.area_units_report, AreaUnit::Sm);

    let row = upload.to_row();
    assert_eq!(row["area_units"], "sf");
    assert!(approx(row["conditioned_area_sf"].as_f64().unwrap(), 1076.39));
}

#[tokio::test]
async fn test_auto_detects_equest_standard() {
    let importer = build_importer(
        fetcher(),
        TableWeatherLookup::default(),
        Box::new(InMemoryEeuRecordRepository::new()),
    );
    let request = UploadRequest {
        conditioned_area: Some(20_000.0),
        zip_code: Some("02116".to_string()),
        ..UploadRequest::new(STANDARD_URL)
    };

    let upload = single(importer.import(request).await.unwrap());
    let record = &upload.record;

    assert_eq!(record.report_type, ReportType::EquestStandard);
    assert_eq!(upload.file_type, "pdf");
    // 12 MWh and 36 MWh of electricity, 100 MBtu of gas
    assert!(approx(record.field("Cooling_Electricity").unwrap(), 12.0 * 3.4144259497));
    assert!(approx(record.field("Interior Lighting_Electricity").unwrap(), 36.0 * 3.4144259497));
    assert!(approx(record.total(FuelCategory::FossilFuels), 100.0));
    assert!(approx(record.total_energy, 48.0 * 3.4144259497 + 100.0));
    assert_eq!(record.weather_string, "02116");
    assert!(upload.upload_warnings.contains("[PARSER_ATTEMPT_FAILED]"));
    assert!(upload.upload_errors.is_empty());
}

#[tokio::test]
async fn test_multi_project_rejects_btu_row() {
    let repo = InMemoryEeuRecordRepository::new();
    let importer = build_importer(fetcher(), TableWeatherLookup::default(), Box::new(repo.clone()));

    let outcome = importer.import(UploadRequest::new(MULTI_URL)).await.unwrap();
    let ImportOutcome::MultiProject(batch) = outcome else {
        panic!("expected a project batch");
    };

    let names: Vec<&str> = batch.valid.iter().map(|p| p.project_name.as_str()).collect();
    assert_eq!(names, vec!["Oak Street", "Pine Street"]);
    assert_eq!(batch.errors.len(), 1);
    assert!(batch.errors[0].to_string().contains("Allowed: mbtu, gj"));
    assert!(repo.is_empty());
}

#[tokio::test]
async fn test_same_document_normalizes_identically() {
    let importer = build_importer(
        fetcher(),
        TableWeatherLookup::default(),
        Box::new(InMemoryEeuRecordRepository::new()),
    );

    let first = single(importer.import(UploadRequest::new(GENERIC_URL)).await.unwrap());
    let second = single(importer.import(UploadRequest::new(GENERIC_URL)).await.unwrap());

    assert_eq!(first.record, second.record);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn test_beps_sum_mismatch_is_one_warning() {
    let importer = build_importer(
        fetcher(),
        TableWeatherLookup::default(),
        Box::new(InMemoryEeuRecordRepository::new()),
    );
    let request = UploadRequest {
        report_type: Some(ReportType::EquestBeps.code()),
        ..UploadRequest::new(BEPS_URL)
    };

    let upload = single(importer.import(request).await.unwrap());
    let mismatches: Vec<&str> = upload
        .upload_warnings
        .lines()
        .filter(|l| l.starts_with(&format!("[{}]", WarningCode::SumMismatch)))
        .collect();

    assert_eq!(mismatches.len(), 1, "{}", upload.upload_warnings);
    assert!(mismatches[0].contains("280"));
    assert!(mismatches[0].contains("300"));
    assert!(approx(upload.record.total_energy, 280.0));
    assert!(approx(upload.record.conditioned_area_sf.unwrap(), 50_000.0));
}

#[tokio::test]
async fn test_weather_failure_is_a_warning() {
    let importer = build_importer(
        fetcher(),
        TableWeatherLookup { fail: true },
        Box::new(InMemoryEeuRecordRepository::new()),
    );

    let upload = single(importer.import(UploadRequest::new(GENERIC_URL)).await.unwrap());
    assert_eq!(upload.weather.city, None);
    assert!(upload.upload_warnings.contains("weather lookup failed"));
}

#[tokio::test]
async fn test_terminal_errors() {
    let importer = build_importer(
        fetcher().with("file:///notes.txt", Fixture::Text("meeting notes\n".to_string())),
        TableWeatherLookup::default(),
        Box::new(InMemoryEeuRecordRepository::new()),
    );

    let err = importer.import(UploadRequest::new("file:///notes.txt")).await.unwrap_err();
    assert!(matches!(err, ImportError::Parse(ParseError::UnsupportedFileType { .. })));
    assert_eq!(err.to_string(), "unsupported file type");

    let err = importer.import(UploadRequest::new("https://nowhere/x.pdf")).await.unwrap_err();
    assert!(matches!(err, ImportError::Parse(ParseError::Fetch(_))));

    let request = UploadRequest {
        report_type: Some(7),
        ..UploadRequest::new(GENERIC_URL)
    };
    assert!(matches!(
        importer.import(request).await.unwrap_err(),
        ImportError::UnknownReportType(7)
    ));

    let request = UploadRequest {
        conditioned_area: Some(0.0),
        ..UploadRequest::new(GENERIC_URL)
    };
    assert!(matches!(
        importer.import(request).await.unwrap_err(),
        ImportError::InvalidRequest(_)
    ));
}

#[tokio::test]
async fn test_batch_import_is_independent() {
    let importer = build_importer(
        fetcher(),
        TableWeatherLookup::default(),
        Box::new(InMemoryEeuRecordRepository::new()),
    );
    let results = importer
        .batch_import(vec![
            UploadRequest::new(GENERIC_URL),
            UploadRequest::new("https://nowhere/missing.pdf"),
            UploadRequest::new(MULTI_URL),
        ])
        .await;

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert!(matches!(results[2], Ok(ImportOutcome::MultiProject(_))));
}
