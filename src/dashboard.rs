use crate::config::AppConfig;
use crate::db::{merge_json, Database, KeyValueStorage, SETTINGS_KEY};
use crate::errors::{AppError, AppResult};
use crate::export::{render_csv, CsvOptions, CSV_FILE_NAME};
use crate::models::{
    AppSettings, CoiPatch, CoiRecord, CoiStatus, DashboardStats, ExpiryRange, NewCoi, Notice, PageResponse, PageSize,
    ReminderKind, ReminderStatus, SortKey, StatusFilter, ViewCriteria,
};
use crate::store::RecordStore;
use crate::validation::validate_new_coi;
use crate::view;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::Arc;

impl From<&AppError> for Notice {
    fn from(error: &AppError) -> Self {
        Notice::error(error.user_message())
    }
}

/// Application root: owns the record store plus the table state (criteria and
/// row selection) and turns user actions into store mutations and notices.
pub struct DashboardCore {
    store: RecordStore,
    storage: Arc<dyn KeyValueStorage>,
    criteria: ViewCriteria,
    selection: Vec<String>,
    csv_options: CsvOptions,
    export_dir: PathBuf,
    config_page_size: PageSize,
    config_quote_fields: bool,
}

impl DashboardCore {
    pub fn open(config: &AppConfig) -> AppResult<Self> {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(Database::new(&config.database_path())?);
        let store = RecordStore::load(storage.clone(), &config.storage_key, config.id_strategy);

        let mut dashboard = Self::with_store(store, storage.clone(), config.export_dir());
        dashboard.config_page_size = config.default_page_size;
        dashboard.config_quote_fields = config.export.quote_fields;
        dashboard.criteria.page_size = config.default_page_size;
        dashboard.csv_options.quote_fields = config.export.quote_fields;

        if storage.get_item(SETTINGS_KEY)?.is_some() {
            let settings = storage.get_settings()?;
            dashboard.criteria.page_size = settings.default_page_size;
            dashboard.criteria.sort = settings.last_sort;
            dashboard.csv_options.quote_fields = config.export.quote_fields || settings.quote_csv_fields;
        }

        tracing::info!(
            records = dashboard.store.len(),
            page_size = dashboard.criteria.page_size.get(),
            "dashboard ready"
        );
        Ok(dashboard)
    }

    pub fn with_store(store: RecordStore, storage: Arc<dyn KeyValueStorage>, export_dir: PathBuf) -> Self {
        Self {
            store,
            storage,
            criteria: ViewCriteria::default(),
            selection: Vec::new(),
            csv_options: CsvOptions::default(),
            export_dir,
            config_page_size: PageSize::default(),
            config_quote_fields: false,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn criteria(&self) -> &ViewCriteria {
        &self.criteria
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn set_csv_options(&mut self, options: CsvOptions) {
        self.csv_options = options;
    }

    // ─── Record actions ─────────────────────────────────────────────────────

    /// Validates the create form; the store is untouched when it fails.
    pub fn add_coi(&mut self, mut form: NewCoi) -> AppResult<(CoiRecord, Notice)> {
        if let Err(error) = validate_new_coi(&form) {
            tracing::info!(error = %error, "rejected coi create form");
            return Err(error);
        }
        form.reminder_status = ReminderStatus::NotSent;
        let record = self.store.create(form)?;
        Ok((record, Notice::success("New COI created successfully")))
    }

    pub fn save_edit(&mut self, id: &str, patch: CoiPatch) -> AppResult<Notice> {
        self.store.update(id, patch)?;
        Ok(Notice::success("COI updated successfully"))
    }

    pub fn set_status(&mut self, id: &str, status: CoiStatus) -> AppResult<Notice> {
        self.store.update(id, CoiPatch::status(status))?;
        Ok(Notice::info(format!("Status updated to {}", status.as_str())))
    }

    pub fn send_reminder(&mut self, id: &str) -> AppResult<Notice> {
        self.store
            .update(id, CoiPatch::reminder(ReminderStatus::SentThirtyDays))?;
        Ok(Notice::info("Reminder sent"))
    }

    pub fn delete_coi(&mut self, id: &str) -> AppResult<Notice> {
        self.store.delete(id)?;
        self.selection.retain(|selected| selected != id);
        Ok(Notice::success("COI deleted"))
    }

    pub fn bulk_remind(&mut self, kind: ReminderKind) -> AppResult<Notice> {
        if self.selection.is_empty() {
            return Ok(Notice::info("No items selected"));
        }
        let count = self.selection.len();
        self.store
            .bulk_set_reminder(&self.selection, ReminderStatus::SentThirtyDays)?;
        self.selection.clear();
        Ok(Notice::info(kind.notice_message(count)))
    }

    pub fn bulk_delete_selected(&mut self) -> AppResult<Notice> {
        if self.selection.is_empty() {
            return Ok(Notice::info("No items selected"));
        }
        let count = self.selection.len();
        self.store.bulk_delete(&self.selection)?;
        self.selection.clear();
        Ok(Notice::success(format!("{} items deleted", count)))
    }

    // ─── Selection ──────────────────────────────────────────────────────────

    pub fn toggle_row(&mut self, id: &str) {
        if let Some(index) = self.selection.iter().position(|selected| selected == id) {
            self.selection.remove(index);
        } else {
            self.selection.push(id.to_string());
        }
    }

    /// Selects every filtered row, or clears when the selection already
    /// covers the filtered set.
    pub fn toggle_select_all(&mut self, today: NaiveDate) {
        let filtered = view::filter_records(self.store.records(), &self.criteria, today);
        if self.selection.len() == filtered.len() {
            self.selection.clear();
        } else {
            self.selection = filtered.into_iter().map(|record| record.id.clone()).collect();
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ─── Criteria ───────────────────────────────────────────────────────────

    pub fn set_criteria(&mut self, criteria: ViewCriteria) {
        self.criteria = criteria;
    }

    /// Applies search text that has already passed the debounce window.
    pub fn apply_search(&mut self, text: &str) {
        self.criteria.search = text.to_string();
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.criteria.status = filter;
    }

    pub fn toggle_property(&mut self, property: &str) {
        self.criteria.properties.toggle(property);
    }

    pub fn set_expiry_range(&mut self, range: ExpiryRange) {
        self.criteria.expiry = range;
    }

    /// Header click. The resulting sort is remembered in settings.
    pub fn click_sort(&mut self, key: SortKey) -> AppResult<()> {
        let sort = view::next_sort(self.criteria.sort, key);
        self.criteria.sort = Some(sort);
        self.write_settings(serde_json::json!({ "lastSort": sort }))?;
        Ok(())
    }

    pub fn set_page_size(&mut self, page_size: PageSize) -> AppResult<()> {
        self.criteria.page_size = page_size;
        self.write_settings(serde_json::json!({ "defaultPageSize": page_size }))?;
        Ok(())
    }

    pub fn previous_page(&mut self, today: NaiveDate) -> usize {
        let total = self.total_pages(today);
        self.criteria.page = view::previous_page(view::clamp_page(self.criteria.page, total), total);
        self.criteria.page
    }

    pub fn next_page(&mut self, today: NaiveDate) -> usize {
        let total = self.total_pages(today);
        self.criteria.page = view::next_page(view::clamp_page(self.criteria.page, total), total);
        self.criteria.page
    }

    /// Returns `false` and leaves the page alone when `page` is out of range.
    pub fn go_to_page(&mut self, page: usize, today: NaiveDate) -> bool {
        match view::go_to_page(page, self.total_pages(today)) {
            Some(page) => {
                self.criteria.page = page;
                true
            }
            None => false,
        }
    }

    pub fn settings(&self) -> AppResult<AppSettings> {
        self.storage.get_settings()
    }

    pub fn update_settings(&mut self, update: serde_json::Value) -> AppResult<AppSettings> {
        let settings = self.write_settings(update)?;
        self.criteria.page_size = settings.default_page_size;
        self.csv_options.quote_fields = self.config_quote_fields || settings.quote_csv_fields;
        Ok(settings)
    }

    /// The first write seeds the document from config so a later open does
    /// not mistake built-in defaults for user choices.
    fn write_settings(&self, update: serde_json::Value) -> AppResult<AppSettings> {
        if self.storage.get_item(SETTINGS_KEY)?.is_some() {
            return self.storage.update_settings(update);
        }
        let mut seeded = serde_json::json!({
            "defaultPageSize": self.config_page_size,
            "quoteCsvFields": self.config_quote_fields,
        });
        merge_json(&mut seeded, update);
        self.storage.update_settings(seeded)
    }

    // ─── Views ──────────────────────────────────────────────────────────────

    pub fn total_pages(&self, today: NaiveDate) -> usize {
        let count = view::filter_records(self.store.records(), &self.criteria, today).len();
        view::total_pages(count, self.criteria.page_size)
    }

    pub fn page(&self, today: NaiveDate) -> PageResponse<CoiRecord> {
        view::compute_page(self.store.records(), &self.criteria, today)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> DashboardStats {
        view::compute_stats(self.store.records(), now)
    }

    pub fn property_options(&self) -> Vec<String> {
        view::property_options(self.store.records())
    }

    pub fn export_csv(&self, today: NaiveDate) -> String {
        let rows = view::visible_rows(self.store.records(), &self.criteria, today);
        render_csv(rows, self.csv_options)
    }

    pub fn export_csv_file(&self, today: NaiveDate) -> AppResult<(PathBuf, Notice)> {
        std::fs::create_dir_all(&self.export_dir).map_err(|error| AppError::Io(error.to_string()))?;
        let output_path = self.export_dir.join(CSV_FILE_NAME);
        std::fs::write(&output_path, self.export_csv(today)).map_err(|error| AppError::Io(error.to_string()))?;
        tracing::info!(path = %output_path.display(), "exported csv");
        Ok((output_path, Notice::success("Data exported to CSV")))
    }
}
