//! CSV rendering of a history record.

use rollcall_protocol::HistoryRecord;

/// Column header of every export.
const HEADER: [&str; 7] = [
    "session_id",
    "course_code",
    "section",
    "student_id",
    "name",
    "status",
    "time",
];

/// A rendered CSV file, ready to be sent as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// Suggested download name, `attendance_{session_id}.csv`.
    pub filename: String,
    pub body: Vec<u8>,
}

impl CsvExport {
    pub(crate) fn render(record: &HistoryRecord) -> Self {
        let session = &record.session;
        let session_id = session.session_id.as_str();
        let course_code = session.course.label();
        let section = session.course.section.as_str();

        let mut out = String::new();
        push_row(&mut out, HEADER);
        for entry in session.roster() {
            push_row(
                &mut out,
                [
                    session_id,
                    course_code,
                    section,
                    entry.id.as_str(),
                    entry.name.as_str(),
                    entry.status.as_str(),
                    entry.time.as_str(),
                ],
            );
        }

        Self {
            filename: format!("attendance_{session_id}.csv"),
            body: out.into_bytes(),
        }
    }
}

/// Appends one CRLF-terminated row.
fn push_row<const N: usize>(out: &mut String, fields: [&str; N]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(field));
    }
    out.push_str("\r\n");
}

/// Quotes a field if it contains a delimiter, quote, or line break.
fn escape(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}
