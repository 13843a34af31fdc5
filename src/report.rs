//! CSV report builder for the bulk endpoint: header, one row per query, a
//! blank separator, legend rows, and an IST generation stamp.

use chrono::{FixedOffset, Utc};

use crate::batch::BatchRow;

pub const CSV_HEADER: [&str; 8] = [
    "#",
    "Input_Query",
    "CCP (%)",
    "Fanout_Queries",
    "Snippets",
    "URLs",
    "Search_Depth",
    "Error (if any)",
];

const CCP_LEGEND: &str = "CCP = Likelihood a query triggers web-search reasoning";
const DEPTH_LEGEND: &str = "Search Depth = Number of fanout queries + snippets + URLs";

/// Always-quote escape: doubles embedded quotes, leaves newlines intact
/// (legal inside a quoted field).
pub fn csv_escape(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Today in Indian Standard Time (UTC+05:30), `dd-mm-yyyy`.
pub fn ist_date_stamp() -> String {
    let ist = FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("IST offset");
    Utc::now().with_timezone(&ist).format("%d-%m-%Y").to_string()
}

/// Attachment name for the bulk download.
pub fn bulk_filename(date_stamp: &str) -> String {
    format!("ccp_bulk_{date_stamp}.csv")
}

fn csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| csv_escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Legend/footer rows mirror the data width, with the text in the second
/// column so it lines up under Input_Query.
fn legend_line(text: &str) -> String {
    let mut fields = vec![""; CSV_HEADER.len()];
    fields[1] = text;
    csv_line(fields)
}

pub fn build_csv(rows: &[BatchRow], date_stamp: &str) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 5);
    lines.push(csv_line(CSV_HEADER));

    for r in rows {
        lines.push(csv_line([
            r.index.to_string(),
            r.query.clone(),
            r.ccp.map(|v| v.to_string()).unwrap_or_default(),
            r.fanouts.clone(),
            r.snippets.clone(),
            r.urls.clone(),
            r.search_depth.map(|v| v.to_string()).unwrap_or_default(),
            r.error.clone(),
        ]));
    }

    lines.push(String::new());
    lines.push(legend_line(CCP_LEGEND));
    lines.push(legend_line(DEPTH_LEGEND));
    lines.push(legend_line(&format!(
        "Generated by search-ccp-analyzer on {date_stamp}"
    )));

    lines.join("\n")
}
