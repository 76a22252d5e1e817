// ==========================================
// EEU Ingest - report importer implementation
// ==========================================
// fetch -> dispatch -> map -> normalize -> assemble
//       -> weather -> store
// Multi-project sheets leave after dispatch through
// row validation.
// ==========================================

use crate::config::{CrosswalkConfig, IngestConfig};
use crate::domain::{
    ParseWarning, ParsedEnergyReport, ParsedReport, ReportType, UploadRecord, WarningCode, WeatherInfo,
};
use crate::importer::aggregator::assemble;
use crate::importer::dispatcher::Dispatcher;
use crate::importer::document_fetcher::{DefaultDocumentFetcher, DocumentFetcher};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::project_validator::{validate_projects, EnumLookup};
use crate::importer::report_importer_trait::{ImportOutcome, ReportImporter, UploadRequest};
use crate::importer::weather::WeatherLookup;
use crate::parser::ParseContext;
use crate::repository::EeuRecordRepository;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn, Span};
use uuid::Uuid;

/// Record plus the messages gathered while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedUpload {
    pub record: crate::domain::NormalizedRecord,
    pub warnings: Vec<ParseWarning>,
    pub errors: Vec<String>,
}

/// Crosswalk mapping and assembly for one parsed report; no I/O.
pub fn normalize_report(report: ParsedEnergyReport, crosswalk: &CrosswalkConfig) -> NormalizedUpload {
    let ParsedEnergyReport {
        observations,
        metadata,
        mut warnings,
    } = report;

    let mut mapping = FieldMapper::new(crosswalk).map(&observations, metadata.report_type, metadata.energy_units_declared);
    warnings.append(&mut mapping.warnings);

    let mapped = mapping.mapped.len();
    let mut errors = Vec::new();
    if mapped == 0 {
        errors.push(format!(
            "{}: none of {} extracted fields matched a canonical field",
            metadata.report_type,
            observations.len()
        ));
    }

    let mut assembled = assemble(mapping, &metadata);
    warnings.append(&mut assembled.warnings);

    info!(
        report_type = %metadata.report_type,
        observations = observations.len(),
        mapped,
        unmapped = assembled.record.unmapped_fields.len(),
        warnings = warnings.len(),
        "report normalized"
    );

    NormalizedUpload {
        record: assembled.record,
        warnings,
        errors,
    }
}

fn join_lines<T: ToString>(items: &[T]) -> String {
    items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("\n")
}

// ==========================================
// ReportImporterImpl
// ==========================================
pub struct ReportImporterImpl {
    // shared read-only configuration
    crosswalk: Arc<CrosswalkConfig>,
    config: IngestConfig,

    dispatcher: Dispatcher,

    // external collaborators
    fetcher: Box<dyn DocumentFetcher>,
    weather: Box<dyn WeatherLookup>,
    repository: Box<dyn EeuRecordRepository>,
    enum_lookup: Box<dyn EnumLookup>,
}

impl ReportImporterImpl {
    /// # Arguments
    /// - crosswalk: loaded once per process
    /// - config: runtime settings (sum-check tolerance)
    /// - fetcher / weather / repository / enum_lookup: external collaborators
    pub fn new(
        crosswalk: Arc<CrosswalkConfig>,
        config: IngestConfig,
        fetcher: Box<dyn DocumentFetcher>,
        weather: Box<dyn WeatherLookup>,
        repository: Box<dyn EeuRecordRepository>,
        enum_lookup: Box<dyn EnumLookup>,
    ) -> Self {
        Self {
            crosswalk,
            config,
            dispatcher: Dispatcher::new(),
            fetcher,
            weather,
            repository,
            enum_lookup,
        }
    }

    /// Importer with the scheme-routing fetcher and the crosswalk the config points at.
    pub fn with_default_fetcher(
        config: IngestConfig,
        weather: Box<dyn WeatherLookup>,
        repository: Box<dyn EeuRecordRepository>,
        enum_lookup: Box<dyn EnumLookup>,
    ) -> ImportResult<Self> {
        let crosswalk = Arc::new(config.load_crosswalk()?);
        let fetcher = DefaultDocumentFetcher::new(&config)?;
        Ok(Self::new(crosswalk, config, Box::new(fetcher), weather, repository, enum_lookup))
    }

    fn check_request(request: &UploadRequest) -> ImportResult<Option<ReportType>> {
        if request.url.trim().is_empty() {
            return Err(ImportError::InvalidRequest("url is empty".to_string()));
        }
        if let Some(area) = request.conditioned_area {
            if !(area.is_finite() && area > 0.0) {
                return Err(ImportError::InvalidRequest(format!(
                    "conditioned_area must be positive, got {}",
                    area
                )));
            }
        }
        request.declared_type()
    }

    async fn lookup_weather(
        &self,
        weather_string: &str,
        report_type: ReportType,
        warnings: &mut Vec<ParseWarning>,
    ) -> WeatherInfo {
        if weather_string.trim().is_empty() {
            warnings.push(ParseWarning::new(
                WarningCode::MissingMetadata,
                "no weather string; location fields left empty",
            ));
            return WeatherInfo::default();
        }
        match self.weather.weather_check(weather_string, report_type).await {
            Ok(info) => info,
            Err(err) => {
                warn!(weather_string, error = %err, "weather lookup failed");
                warnings.push(ParseWarning::new(
                    WarningCode::MissingMetadata,
                    format!("weather lookup failed for '{}': {}", weather_string, err),
                ));
                WeatherInfo::default()
            }
        }
    }
}

#[async_trait]
impl ReportImporter for ReportImporterImpl {
    #[instrument(skip(self, request), fields(url = %request.url, report_type, upload_id))]
    async fn import(&self, request: UploadRequest) -> ImportResult<ImportOutcome> {
        let declared = Self::check_request(&request)?;
        info!(declared = ?declared.map(|t| t.code()), "import started");

        // === Step 1: fetch ===
        let doc = self.fetcher.fetch(&request.url).await?;
        debug!(file = doc.file_name(), kind = ?doc.kind(), bytes = doc.bytes().len(), "document loaded");

        // === Step 2: dispatch ===
        let ctx = ParseContext {
            crosswalk: &self.crosswalk,
            baseline_design: request.baseline_design,
            conditioned_area: request.conditioned_area,
            zip_code: request.zip_code.clone(),
            sum_check: self.config.sum_check,
        };
        let parsed = self.dispatcher.dispatch(&doc, declared, &ctx)?;
        Span::current().record("report_type", parsed.report_type().code());

        let report = match parsed {
            // === Step 3: multi-project sheets ===
            ParsedReport::MultiProject(sheet) => {
                let batch = validate_projects(sheet, self.enum_lookup.as_ref()).await;
                return Ok(ImportOutcome::MultiProject(batch));
            }
            ParsedReport::Energy(report) => report,
        };

        // === Step 4: map / normalize / assemble ===
        let NormalizedUpload {
            record,
            mut warnings,
            errors,
        } = normalize_report(report, &self.crosswalk);

        // === Step 5: weather ===
        let weather = self
            .lookup_weather(&record.weather_string, record.report_type, &mut warnings)
            .await;

        // === Step 6: upload record ===
        let id = Uuid::new_v4().to_string();
        Span::current().record("upload_id", id.as_str());
        let upload = UploadRecord {
            id,
            file_type: record.report_type.file_type().to_string(),
            file_name: doc.file_name().to_string(),
            file_url: request.url.clone(),
            baseline_design: request.baseline_design,
            upload_warnings: join_lines(&warnings),
            upload_errors: join_lines(&errors),
            weather,
            record,
            created_at: Utc::now(),
        };

        // === Step 7: store ===
        self.repository.insert(&upload).await?;
        info!(
            total_energy = upload.record.total_energy,
            warnings = warnings.len(),
            errors = errors.len(),
            "import finished"
        );
        Ok(ImportOutcome::Single(Box::new(upload)))
    }

    async fn batch_import(&self, requests: Vec<UploadRequest>) -> Vec<ImportResult<ImportOutcome>> {
        info!(count = requests.len(), "batch import started");
        let results = join_all(requests.into_iter().map(|request| self.import(request))).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(total = results.len(), failed, "batch import finished");
        results
    }
}
