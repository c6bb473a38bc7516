use crate::models::CoiRecord;

pub const CSV_HEADER: [&str; 6] = ["Property", "Tenant Name", "Unit", "COI Name", "Expiry Date", "Status"];
pub const CSV_FILE_NAME: &str = "coi_data.csv";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CsvOptions {
    /// RFC 4180 quoting. Off by default: existing consumers read the raw
    /// comma-joined layout, embedded commas included.
    pub quote_fields: bool,
}

pub fn render_csv<'a, I>(rows: I, options: CsvOptions) -> String
where
    I: IntoIterator<Item = &'a CoiRecord>,
{
    let mut lines = vec![CSV_HEADER.join(",")];
    for record in rows {
        let fields = [
            record.property.as_str(),
            record.tenant_name.as_str(),
            record.unit.as_str(),
            record.coi_name.as_str(),
            record.expiry_date.as_str(),
            record.status.as_str(),
        ];
        let line = if options.quote_fields {
            fields.iter().map(|field| quote_field(field)).collect::<Vec<_>>().join(",")
        } else {
            fields.join(",")
        };
        lines.push(line);
    }
    lines.join("\n")
}

fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{render_csv, CsvOptions};
    use crate::store::seed_records;

    #[test]
    fn renders_header_and_rows_in_given_order() {
        let records = seed_records();
        let csv = render_csv(records.iter().take(2), CsvOptions::default());
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Property,Tenant Name,Unit,COI Name,Expiry Date,Status");
        assert_eq!(
            lines[1],
            "Maplewood Shopping Center,Johnson & Sons,101,Tenant_CedarHeights_COI_2026,2026-11-17,Active"
        );
        assert_eq!(lines.len(), 3);
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn embedded_commas_are_left_unescaped_by_default() {
        let mut record = seed_records().remove(0);
        record.property = "Plaza, North".to_string();
        let csv = render_csv([&record], CsvOptions::default());
        assert!(csv.lines().nth(1).expect("row").starts_with("Plaza, North,"));
    }

    #[test]
    fn quoting_escapes_commas_and_quotes() {
        let mut record = seed_records().remove(0);
        record.property = "Plaza, North".to_string();
        record.tenant_name = "The \"Best\" Co".to_string();
        let csv = render_csv([&record], CsvOptions { quote_fields: true });
        assert!(csv
            .lines()
            .nth(1)
            .expect("row")
            .starts_with("\"Plaza, North\",\"The \"\"Best\"\" Co\",101,"));
    }

    #[test]
    fn empty_view_exports_only_the_header() {
        let csv = render_csv(std::iter::empty(), CsvOptions::default());
        assert_eq!(csv, "Property,Tenant Name,Unit,COI Name,Expiry Date,Status");
    }
}
