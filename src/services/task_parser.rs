//! Quick-add syntax: `Write report +Work #focus @fri 4pm 1h30m`.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::project::Project;
use crate::models::user::User;

pub const UNTITLED_TASK: &str = "Untitled Task";

static PROJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+(\S+)(?:\s|$)").expect("valid project regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(\w+)").expect("valid tag regex"));
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)@(\d{4}-\d{2}-\d{2}|\w+)(?:\s+(\d{1,2}(?:am|pm)?)\b)?").expect("valid date regex")
});
static EFFORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d+)([hm])(?:\s*(\d+)m)?\b").expect("valid effort regex"));
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2})(am|pm)?$").expect("valid time regex"));

const WEEKDAYS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTask {
    pub title: String,
    pub user_id: String,
    pub project_id: Option<String>,
    pub due_date: Option<NaiveDateTime>,
    pub effort_estimate_mins: Option<i64>,
    pub tags: Vec<String>,
}

pub fn parse_task_input(
    input: &str,
    users: &[User],
    projects: &[Project],
    today: NaiveDate,
) -> ParsedTask {
    let mut title = input.trim().to_string();
    let mut project_id = None;
    let mut due_date = None;
    let mut effort_estimate_mins = None;

    if let Some(caps) = PROJECT_RE.captures(&title) {
        let name = caps[1].to_lowercase();
        project_id = projects
            .iter()
            .find(|p| p.title.to_lowercase() == name)
            .map(|p| p.id.clone());
        title = PROJECT_RE.replacen(&title, 1, "").trim().to_string();
    }

    let tags: Vec<String> = TAG_RE
        .captures_iter(&title)
        .map(|caps| caps[1].to_string())
        .collect();
    if !tags.is_empty() {
        title = TAG_RE.replace_all(&title, "").trim().to_string();
    }

    if let Some(caps) = DATE_RE.captures(&title) {
        if let Some(date) = parse_date(&caps[1], today) {
            let time = caps
                .get(2)
                .and_then(|m| parse_time(m.as_str()))
                .unwrap_or_default();
            due_date = Some(date.and_time(time));
        }
        title = DATE_RE.replacen(&title, 1, "").trim().to_string();
    }

    if let Some(caps) = EFFORT_RE.captures(&title) {
        let amount: i64 = caps[1].parse().unwrap_or(0);
        let extra: i64 = caps
            .get(3)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        effort_estimate_mins = Some(match &caps[2] {
            "h" => amount * 60 + extra,
            _ => amount,
        });
        title = EFFORT_RE.replacen(&title, 1, "").trim().to_string();
    }

    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    ParsedTask {
        title: if title.is_empty() { UNTITLED_TASK.to_string() } else { title },
        user_id: users.first().map(|u| u.id.clone()).unwrap_or_default(),
        project_id,
        due_date,
        effort_estimate_mins,
        tags,
    }
}

fn parse_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = raw.to_lowercase();
    match lower.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        _ => {}
    }

    if let Some(target) = lower
        .get(..3)
        .and_then(|prefix| WEEKDAYS.iter().position(|d| *d == prefix))
    {
        let current = today.weekday().num_days_from_sunday() as i64;
        let mut days_until = target as i64 - current;
        if days_until <= 0 {
            days_until += 7;
        }
        return Some(today + Duration::days(days_until));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(raw)?;
    let mut hours: u32 = caps[1].parse().ok()?;
    match caps.get(2).map(|m| m.as_str().to_lowercase()).as_deref() {
        Some("pm") if hours != 12 => hours += 12,
        Some("am") if hours == 12 => hours = 0,
        _ => {}
    }
    NaiveTime::from_hms_opt(hours, 0, 0)
}
