//! Command-line surface over the dashboard.

use crate::models::{
    CoiPatch, CoiStatus, ExpiryRange, NewCoi, PageSize, PropertyFilter, ReminderKind, SortConfig, SortDirection,
    SortKey, StatusFilter, ViewCriteria,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "coi-dashboard")]
#[command(about = "Track certificates of insurance issued by tenants")]
#[command(version)]
pub struct Cli {
    /// YAML config file (defaults to $COI_DASHBOARD_CONFIG, then built-in defaults)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show one page of the filtered and sorted table
    List(ViewArgs),
    /// Create a COI record
    Add(AddArgs),
    /// Edit fields of an existing record
    Update(UpdateArgs),
    /// Change the status of a record
    SetStatus {
        id: String,
        #[arg(value_parser = parse_status)]
        status: CoiStatus,
    },
    /// Mark a reminder as sent for one record
    Remind { id: String },
    /// Mark reminders as sent for several records
    BulkRemind {
        #[arg(long, value_enum, default_value_t = ReminderKindArg::Primary)]
        kind: ReminderKindArg,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Delete one record
    Delete { id: String },
    /// Delete several records
    BulkDelete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Stat cards over all records
    Stats,
    /// Property filter options
    Properties,
    /// Export the filtered and sorted table as CSV
    Export {
        /// Print to stdout instead of writing <data_dir>/exports/coi_data.csv
        #[arg(long)]
        stdout: bool,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Show persisted settings, optionally merging a JSON patch first
    Settings {
        #[arg(long)]
        set: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Case-insensitive match on tenant, property, unit or COI name
    #[arg(long, short = 's')]
    pub search: Option<String>,
    /// Status filter ("All" or a status name)
    #[arg(long, value_parser = parse_status_filter)]
    pub status: Option<StatusFilter>,
    /// Property filter, repeatable
    #[arg(long = "property")]
    pub properties: Vec<String>,
    #[arg(long, value_enum)]
    pub expiry: Option<ExpiryArg>,
    /// Inclusive lower bound for `--expiry custom`
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound for `--expiry custom`
    #[arg(long)]
    pub to: Option<NaiveDate>,
    #[arg(long, value_parser = parse_sort_key)]
    pub sort: Option<SortKey>,
    #[arg(long)]
    pub desc: bool,
    #[arg(long)]
    pub page: Option<usize>,
    #[arg(long, value_parser = parse_page_size)]
    pub page_size: Option<PageSize>,
    /// Reference date for expiry windows (defaults to today)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

impl ViewArgs {
    /// Overlays the given flags on `base`; flags left unset keep base values.
    pub fn criteria(&self, base: &ViewCriteria) -> ViewCriteria {
        let mut criteria = base.clone();
        if let Some(search) = &self.search {
            criteria.search = search.clone();
        }
        if let Some(status) = self.status {
            criteria.status = status;
        }
        if !self.properties.is_empty() {
            criteria.properties = PropertyFilter::only(self.properties.iter().cloned());
        }
        if let Some(expiry) = self.expiry {
            criteria.expiry = match expiry {
                ExpiryArg::All => ExpiryRange::All,
                ExpiryArg::Last30 => ExpiryRange::Last30Days,
                ExpiryArg::Next30 => ExpiryRange::Next30Days,
                ExpiryArg::Custom => ExpiryRange::Custom {
                    start: self.from,
                    end: self.to,
                },
            };
        }
        if let Some(key) = self.sort {
            let direction = if self.desc { SortDirection::Desc } else { SortDirection::Asc };
            criteria.sort = Some(SortConfig { key, direction });
        }
        if let Some(page) = self.page {
            criteria.page = page;
        }
        if let Some(page_size) = self.page_size {
            criteria.page_size = page_size;
        }
        criteria
    }
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long, default_value = "")]
    pub property: String,
    #[arg(long, default_value = "")]
    pub tenant_name: String,
    #[arg(long, default_value = "")]
    pub tenant_email: String,
    #[arg(long, default_value = "")]
    pub unit: String,
    #[arg(long, default_value = "")]
    pub coi_name: String,
    #[arg(long, default_value = "")]
    pub expiry_date: String,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<CoiStatus>,
}

impl From<AddArgs> for NewCoi {
    fn from(args: AddArgs) -> Self {
        NewCoi {
            property: args.property,
            tenant_name: args.tenant_name,
            tenant_email: args.tenant_email,
            unit: args.unit,
            coi_name: args.coi_name,
            expiry_date: args.expiry_date,
            status: args.status.unwrap_or_default(),
            ..NewCoi::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    pub id: String,
    #[arg(long)]
    pub property: Option<String>,
    #[arg(long)]
    pub tenant_name: Option<String>,
    #[arg(long)]
    pub tenant_email: Option<String>,
    #[arg(long)]
    pub unit: Option<String>,
    #[arg(long)]
    pub coi_name: Option<String>,
    #[arg(long)]
    pub expiry_date: Option<String>,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<CoiStatus>,
}

impl UpdateArgs {
    pub fn patch(&self) -> CoiPatch {
        CoiPatch {
            property: self.property.clone(),
            tenant_name: self.tenant_name.clone(),
            tenant_email: self.tenant_email.clone(),
            unit: self.unit.clone(),
            coi_name: self.coi_name.clone(),
            expiry_date: self.expiry_date.clone(),
            status: self.status,
            reminder_status: None,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryArg {
    All,
    Last30,
    Next30,
    Custom,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKindArg {
    Primary,
    Secondary,
    Final,
}

impl From<ReminderKindArg> for ReminderKind {
    fn from(value: ReminderKindArg) -> Self {
        match value {
            ReminderKindArg::Primary => ReminderKind::Primary,
            ReminderKindArg::Secondary => ReminderKind::Secondary,
            ReminderKindArg::Final => ReminderKind::Final,
        }
    }
}

fn parse_status(raw: &str) -> Result<CoiStatus, String> {
    CoiStatus::parse(raw).ok_or_else(|| {
        let known = CoiStatus::ALL.map(CoiStatus::as_str).join(", ");
        format!("unknown status {:?} (expected one of: {})", raw, known)
    })
}

fn parse_status_filter(raw: &str) -> Result<StatusFilter, String> {
    StatusFilter::parse(raw).ok_or_else(|| format!("unknown status filter {:?}", raw))
}

fn parse_sort_key(raw: &str) -> Result<SortKey, String> {
    SortKey::parse(raw).ok_or_else(|| format!("unknown sort key {:?}", raw))
}

fn parse_page_size(raw: &str) -> Result<PageSize, String> {
    let value = raw
        .parse::<u32>()
        .map_err(|error| format!("invalid page size {:?}: {}", raw, error))?;
    PageSize::try_from(value)
}
