//! Landscape meetings report for the signed-in user.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::pdf::{A4_LANDSCAPE, BODY, MUTED, PRIMARY, PdfWriter, clip};
use crate::db::{DbMeetingDetail, SessionUser};
use crate::error::MeetmindError;

const COLUMNS: [(&str, f32, usize); 9] = [
    ("#", 20.0, 4),
    ("Meeting Name", 32.0, 26),
    ("Agent Name", 80.0, 20),
    ("Status", 118.0, 12),
    ("Created Date", 142.0, 14),
    ("Created Time", 170.0, 10),
    ("Started Date", 195.0, 14),
    ("Ended Date", 223.0, 14),
    ("Duration", 252.0, 10),
];
const ROW_HEIGHT: f32 = 7.0;

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Unknown".to_string(),
    }
}

fn short_date(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

/// The nine table cells for one meeting; `index` is zero-based.
pub fn meeting_row(index: usize, m: &DbMeetingDetail) -> [String; 9] {
    let meeting = &m.meeting;
    let name = if meeting.name.trim().is_empty() {
        "Untitled Meeting".to_string()
    } else {
        meeting.name.clone()
    };
    let agent = if m.agent_name.trim().is_empty() {
        "Unknown Agent".to_string()
    } else {
        m.agent_name.clone()
    };
    let duration = match (meeting.started_at, meeting.ended_at) {
        (Some(start), Some(end)) => {
            let minutes = ((end - start).num_seconds() as f64 / 60.0).round() as i64;
            format!("{minutes} min")
        }
        _ => "N/A".to_string(),
    };

    [
        (index + 1).to_string(),
        name,
        agent,
        capitalize(meeting.status.as_str()),
        short_date(meeting.created_at),
        meeting.created_at.format("%I:%M %p").to_string(),
        meeting
            .started_at
            .map(short_date)
            .unwrap_or_else(|| "Not Started".to_string()),
        meeting
            .ended_at
            .map(short_date)
            .unwrap_or_else(|| "Not Ended".to_string()),
        duration,
    ]
}

/// Meeting count per status, keyed by the capitalized status.
pub fn status_counts(meetings: &[DbMeetingDetail]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for m in meetings {
        let status = capitalize(m.meeting.status.as_str());
        *counts.entry(status).or_insert(0) += 1;
    }
    counts
}

fn table_header(pdf: &mut PdfWriter) {
    for (title, x, _) in COLUMNS {
        pdf.text_at(x, title, 10.0, true, PRIMARY);
    }
    pdf.gap(ROW_HEIGHT);
}

pub fn meetings_report_pdf(
    user: &SessionUser,
    meetings: &[DbMeetingDetail],
    now: DateTime<Utc>,
) -> Result<Vec<u8>, MeetmindError> {
    let mut pdf = PdfWriter::new("MeetMind AI - Meetings Report", A4_LANDSCAPE)?
        .with_footer("Generated by MeetMind AI Platform - meetmindai.online");

    pdf.text_at(20.0, "MeetMind AI", 24.0, true, PRIMARY);
    pdf.text_at(
        200.0,
        &format!("Generated: {}", now.format("%B %-d, %Y %I:%M %p UTC")),
        12.0,
        false,
        MUTED,
    );
    pdf.gap(10.0);
    pdf.text_at(20.0, "Meetings Report", 16.0, false, PRIMARY);
    pdf.gap(15.0);

    pdf.line("Report Details", 14.0, true, 8.0);
    let name = if user.name.trim().is_empty() {
        "N/A"
    } else {
        user.name.as_str()
    };
    pdf.line(&format!("User: {name}"), 11.0, false, 7.0);
    pdf.line(&format!("Email: {}", user.email), 11.0, false, 7.0);
    let total = meetings.len();
    pdf.line(&format!("Total Records: {total}"), 11.0, false, 10.0);

    table_header(&mut pdf);
    for (i, m) in meetings.iter().enumerate() {
        if pdf.ensure_space(ROW_HEIGHT) {
            table_header(&mut pdf);
        }
        let cells = meeting_row(i, m);
        for ((_, x, width), cell) in COLUMNS.iter().zip(cells.iter()) {
            pdf.text_at(*x, &clip(cell, *width), 9.0, false, BODY);
        }
        pdf.gap(ROW_HEIGHT);
    }

    pdf.gap(8.0);
    pdf.heading("Meeting Summary");
    pdf.line(&format!("Total Meetings: {total}"), 11.0, false, 7.0);
    let counts: Vec<String> = status_counts(meetings)
        .into_iter()
        .map(|(status, count)| format!("{status}: {count}"))
        .collect();
    for chunk in counts.chunks(4) {
        pdf.line(&chunk.join("    "), 11.0, false, 7.0);
    }

    pdf.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbMeeting, MeetingStatus};
    use crate::reports::pdf::winansi;

    fn detail(
        status: MeetingStatus,
        started: Option<&str>,
        ended: Option<&str>,
    ) -> DbMeetingDetail {
        let created: DateTime<Utc> = "2024-03-02T15:04:00Z".parse().expect("ts");
        DbMeetingDetail {
            meeting: DbMeeting {
                id: "m1".into(),
                name: "Weekly sync".into(),
                user_id: "u1".into(),
                agent_id: "a1".into(),
                status,
                started_at: started.map(|s| s.parse().expect("ts")),
                ended_at: ended.map(|s| s.parse().expect("ts")),
                transcript_url: None,
                recording_url: None,
                summary: None,
                created_at: created,
                updated_at: created,
            },
            agent_name: "Tutor".into(),
            user_name: "Ada".into(),
            user_email: "ada@example.com".into(),
        }
    }

    #[test]
    fn completed_meeting_row_has_duration() {
        let m = detail(
            MeetingStatus::Completed,
            Some("2024-03-02T15:10:00Z"),
            Some("2024-03-02T15:55:29Z"),
        );
        let row = meeting_row(0, &m);
        assert_eq!(row[0], "1");
        assert_eq!(row[3], "Completed");
        assert_eq!(row[4], "Mar 2, 2024");
        assert_eq!(row[5], "03:04 PM");
        assert_eq!(row[8], "45 min");
    }

    #[test]
    fn upcoming_meeting_row_has_placeholders() {
        let row = meeting_row(4, &detail(MeetingStatus::Upcoming, None, None));
        assert_eq!(row[0], "5");
        assert_eq!(row[6], "Not Started");
        assert_eq!(row[7], "Not Ended");
        assert_eq!(row[8], "N/A");
    }

    #[test]
    fn renders_many_rows_across_pages() {
        let user = SessionUser {
            session_id: "s1".into(),
            user_id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            expires_at: Utc::now(),
        };
        let meetings: Vec<DbMeetingDetail> = (0..40)
            .map(|_| detail(MeetingStatus::Upcoming, None, None))
            .collect();
        assert_eq!(status_counts(&meetings).get("Upcoming"), Some(&40));
        let bytes = meetings_report_pdf(&user, &meetings, Utc::now()).expect("pdf");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn non_latin_names_render_as_placeholders() {
        let user = SessionUser {
            session_id: "s1".into(),
            user_id: "u1".into(),
            name: "张伟 Ōtani".into(),
            email: "zhang@example.com".into(),
            expires_at: Utc::now(),
        };
        let mut m = detail(MeetingStatus::Upcoming, None, None);
        m.agent_name = "Тьютор".into();
        let row = meeting_row(0, &m);
        assert_eq!(winansi(&row[2]), "??????");
        assert_eq!(winansi(&user.name), "?? ?tani");

        let bytes = meetings_report_pdf(&user, &[m], Utc::now()).expect("pdf");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
