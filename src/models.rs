use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

pub const ALL_STATUSES_SENTINEL: &str = "All";
pub const ALL_PROPERTIES_SENTINEL: &str = "All Properties";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoiStatus {
    Active,
    Expired,
    Rejected,
    #[serde(rename = "Expiring Soon")]
    ExpiringSoon,
    #[serde(rename = "Not Processed")]
    NotProcessed,
}

impl CoiStatus {
    pub const ALL: [CoiStatus; 5] = [
        Self::Active,
        Self::Expired,
        Self::Rejected,
        Self::ExpiringSoon,
        Self::NotProcessed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Expired => "Expired",
            Self::Rejected => "Rejected",
            Self::ExpiringSoon => "Expiring Soon",
            Self::NotProcessed => "Not Processed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == raw)
    }
}

impl Default for CoiStatus {
    fn default() -> Self {
        Self::NotProcessed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReminderStatus {
    #[serde(rename = "Not Sent")]
    NotSent,
    #[serde(rename = "Sent (30d)")]
    SentThirtyDays,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl ReminderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotSent => "Not Sent",
            Self::SentThirtyDays => "Sent (30d)",
            Self::NotApplicable => "N/A",
        }
    }
}

impl Default for ReminderStatus {
    fn default() -> Self {
        Self::NotSent
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoiRecord {
    pub id: String,
    pub property: String,
    pub tenant_name: String,
    pub tenant_email: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub coi_name: String,
    #[serde(default)]
    pub expiry_date: String,
    pub status: CoiStatus,
    pub reminder_status: ReminderStatus,
    pub created_at: DateTime<Utc>,
}

impl CoiRecord {
    /// Calendar date of expiry. Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
    pub fn expiry(&self) -> Option<NaiveDate> {
        parse_expiry(&self.expiry_date).map(|instant| instant.date_naive())
    }

    /// Expiry as an instant; bare dates resolve to midnight UTC.
    pub fn expiry_instant(&self) -> Option<DateTime<Utc>> {
        parse_expiry(&self.expiry_date)
    }

    /// String form of a field, used for sorting. Missing values are empty.
    pub fn sort_value(&self, key: SortKey) -> String {
        match key {
            SortKey::Id => self.id.clone(),
            SortKey::Property => self.property.clone(),
            SortKey::TenantName => self.tenant_name.clone(),
            SortKey::TenantEmail => self.tenant_email.clone(),
            SortKey::Unit => self.unit.clone(),
            SortKey::CoiName => self.coi_name.clone(),
            SortKey::ExpiryDate => self.expiry_date.clone(),
            SortKey::Status => self.status.as_str().to_string(),
            SortKey::ReminderStatus => self.reminder_status.as_str().to_string(),
            SortKey::CreatedAt => self.created_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Fields supplied on create; `id` and `createdAt` are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCoi {
    pub property: String,
    pub tenant_name: String,
    pub tenant_email: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub coi_name: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default)]
    pub status: CoiStatus,
    #[serde(default)]
    pub reminder_status: ReminderStatus,
}

/// Partial update. Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoiPatch {
    pub property: Option<String>,
    pub tenant_name: Option<String>,
    pub tenant_email: Option<String>,
    pub unit: Option<String>,
    pub coi_name: Option<String>,
    pub expiry_date: Option<String>,
    pub status: Option<CoiStatus>,
    pub reminder_status: Option<ReminderStatus>,
}

impl CoiPatch {
    pub fn status(status: CoiStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn reminder(reminder_status: ReminderStatus) -> Self {
        Self {
            reminder_status: Some(reminder_status),
            ..Self::default()
        }
    }

    pub fn apply_to(self, record: &mut CoiRecord) {
        if let Some(property) = self.property {
            record.property = property;
        }
        if let Some(tenant_name) = self.tenant_name {
            record.tenant_name = tenant_name;
        }
        if let Some(tenant_email) = self.tenant_email {
            record.tenant_email = tenant_email;
        }
        if let Some(unit) = self.unit {
            record.unit = unit;
        }
        if let Some(coi_name) = self.coi_name {
            record.coi_name = coi_name;
        }
        if let Some(expiry_date) = self.expiry_date {
            record.expiry_date = expiry_date;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(reminder_status) = self.reminder_status {
            record.reminder_status = reminder_status;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Id,
    Property,
    TenantName,
    TenantEmail,
    Unit,
    CoiName,
    ExpiryDate,
    Status,
    ReminderStatus,
    CreatedAt,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "id" => Some(Self::Id),
            "property" => Some(Self::Property),
            "tenantName" | "tenant-name" => Some(Self::TenantName),
            "tenantEmail" | "tenant-email" => Some(Self::TenantEmail),
            "unit" => Some(Self::Unit),
            "coiName" | "coi-name" => Some(Self::CoiName),
            "expiryDate" | "expiry-date" => Some(Self::ExpiryDate),
            "status" => Some(Self::Status),
            "reminderStatus" | "reminder-status" => Some(Self::ReminderStatus),
            "createdAt" | "created-at" => Some(Self::CreatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusFilter {
    #[default]
    All,
    Only(CoiStatus),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == ALL_STATUSES_SENTINEL {
            return Some(Self::All);
        }
        CoiStatus::parse(raw).map(Self::Only)
    }
}

/// Multi-select over property names. Holds the sentinel alone when nothing
/// specific is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilter {
    pub selected: Vec<String>,
}

impl Default for PropertyFilter {
    fn default() -> Self {
        Self {
            selected: vec![ALL_PROPERTIES_SENTINEL.to_string()],
        }
    }
}

impl PropertyFilter {
    pub fn only<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let selected = properties.into_iter().map(Into::into).collect::<Vec<String>>();
        if selected.is_empty() {
            return Self::default();
        }
        Self { selected }
    }

    pub fn is_all(&self) -> bool {
        self.selected.iter().any(|item| item == ALL_PROPERTIES_SENTINEL)
    }

    pub fn matches(&self, property: &str) -> bool {
        self.is_all() || self.selected.iter().any(|item| item == property)
    }

    /// Checkbox semantics of the property dropdown.
    pub fn toggle(&mut self, property: &str) {
        if property == ALL_PROPERTIES_SENTINEL {
            *self = Self::default();
            return;
        }

        let mut next = self
            .selected
            .iter()
            .filter(|item| item.as_str() != ALL_PROPERTIES_SENTINEL)
            .cloned()
            .collect::<Vec<_>>();
        if let Some(index) = next.iter().position(|item| item == property) {
            next.remove(index);
        } else {
            next.push(property.to_string());
        }

        *self = Self::only(next);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpiryRange {
    #[default]
    All,
    Last30Days,
    Next30Days,
    Custom {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PageSize {
    Five,
    Ten,
    Twenty,
}

impl PageSize {
    pub fn get(self) -> usize {
        match self {
            Self::Five => 5,
            Self::Ten => 10,
            Self::Twenty => 20,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::Ten
    }
}

impl TryFrom<u32> for PageSize {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(Self::Five),
            10 => Ok(Self::Ten),
            20 => Ok(Self::Twenty),
            other => Err(format!("Unsupported page size {} (expected 5, 10 or 20)", other)),
        }
    }
}

impl From<PageSize> for u32 {
    fn from(value: PageSize) -> Self {
        value.get() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewCriteria {
    pub search: String,
    pub status: StatusFilter,
    pub properties: PropertyFilter,
    pub expiry: ExpiryRange,
    pub sort: Option<SortConfig>,
    pub page: usize,
    pub page_size: PageSize,
}

impl Default for ViewCriteria {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: StatusFilter::All,
            properties: PropertyFilter::default(),
            expiry: ExpiryRange::All,
            sort: None,
            page: 1,
            page_size: PageSize::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub expiring_in_30_days: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoticeSeverity {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient feedback for the notification surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub message: String,
    pub severity: NoticeSeverity,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: NoticeSeverity::Success,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: NoticeSeverity::Info,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: NoticeSeverity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderKind {
    Primary,
    Secondary,
    Final,
}

impl ReminderKind {
    pub fn notice_message(self, count: usize) -> String {
        match self {
            Self::Primary => format!("Primary reminders sent for {} items", count),
            Self::Secondary => format!("Secondary reminders sent for {} items", count),
            Self::Final => format!("Final notices sent for {} items", count),
        }
    }
}

/// UI preferences persisted next to the record snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub default_page_size: PageSize,
    pub last_sort: Option<SortConfig>,
    pub quote_csv_fields: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_page_size: PageSize::Ten,
            last_sort: None,
            quote_csv_fields: false,
        }
    }
}
