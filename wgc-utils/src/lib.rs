//! Shared utility functions for WGC crates.

/// Date utility functions
pub mod dates {
    use chrono::NaiveDate;

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
    }

    /// Position of a calendar month (1-12) within the water year
    /// (Oct 1 to Sep 30): October = 0, September = 11.
    /// Used for display/reference ordering of monthly summaries.
    pub fn water_year_month_position(month: u32) -> usize {
        if month >= 10 {
            (month - 10) as usize
        } else {
            (month + 2) as usize
        }
    }

}
