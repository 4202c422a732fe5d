//! HTML rendering for the contact page and the admin view.
//!
//! Deliberately plain markup. Every user-supplied value goes through
//! [`escape_html`].

use std::fmt::Write as _;

use chrono::{Datelike, Utc};

use crate::config::CompanyInfo;
use crate::leads::{Budget, ContactForm, HEADER, LeadRow, Topic};

/// Severity of the banner shown above the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

impl NoticeKind {
    fn class(self) -> &'static str {
        match self {
            Self::Success => "notice success",
            Self::Warning => "notice warning",
            Self::Error => "notice error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:1100px;margin:2rem auto;padding:0 1rem;\
background:#0b0a10;color:#E5E7EB}a{color:#EF4444}.muted{color:#9CA3AF}\
.notice{padding:.6rem 1rem;border-radius:10px;margin:1rem 0}.success{background:#14532d}\
.warning{background:#713f12}.error{background:#7f1d1d}label{display:block;margin:.6rem 0 .2rem}\
input,select,textarea{width:100%;padding:.4rem}\
.hp{position:absolute;left:-10000px;top:auto;width:1px;height:1px;overflow:hidden}\
table{border-collapse:collapse;width:100%}td,th{border:1px solid #333;padding:.3rem;text-align:left}";

fn open_document(out: &mut String, title: &str) {
    let _ = write!(
        out,
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{}</title><style>{STYLE}</style></head><body>",
        escape_html(title)
    );
}

fn footer(out: &mut String, company: &CompanyInfo) {
    let _ = write!(
        out,
        "<footer class=\"muted\" style=\"margin-top:1rem\">Email: {} · Address: {} · \
         Legal form: {} · CVR: {} · © {} {}</footer></body></html>",
        escape_html(&company.email),
        escape_html(&company.address),
        escape_html(&company.legal_form),
        escape_html(&company.cvr),
        Utc::now().year(),
        escape_html(&company.name),
    );
}

fn select(out: &mut String, name: &str, label: &str, options: &[&str], selected: &str) {
    let _ = write!(out, "<label for=\"{name}\">{label}</label><select id=\"{name}\" name=\"{name}\">");
    for option in options {
        let option = escape_html(option);
        let mark = if option == escape_html(selected) { " selected" } else { "" };
        let _ = write!(out, "<option value=\"{option}\"{mark}>{option}</option>");
    }
    out.push_str("</select>");
}

/// The single page: intro, contact form, footer.
///
/// `form` pre-fills the inputs after a rejected submission; `sid` is the
/// correlation id carried in a hidden field.
pub fn render_page(
    company: &CompanyInfo,
    sid: &str,
    notice: Option<&Notice>,
    form: &ContactForm,
) -> String {
    let mut out = String::new();
    open_document(&mut out, &company.name);

    let _ = write!(
        out,
        "<header><h3>{}</h3><h1>Self-tuning wireless speakers</h1>\
         <p>True Wireless Stereo (TWS), rechargeable, and able to estimate the Room \
         Impulse Response (RIR) to auto-tune for optimum performance.</p>\
         <p><a href=\"{}\">LinkedIn</a></p></header>",
        escape_html(&company.name),
        escape_html(&company.linkedin_url),
    );

    out.push_str(
        "<section id=\"contact\"><h3>Contact</h3>\
         <p>Tell us about your product or space. We reply within one business day.</p>",
    );

    if let Some(notice) = notice {
        let _ = write!(
            out,
            "<div class=\"{}\" role=\"status\">{}</div>",
            notice.kind.class(),
            escape_html(&notice.text)
        );
    }

    let selected_topic = if form.topic.is_empty() {
        Topic::default().label()
    } else {
        form.topic.as_str()
    };
    let selected_budget = if form.budget.is_empty() {
        Budget::default().label()
    } else {
        form.budget.as_str()
    };
    let topics: Vec<&str> = Topic::ALL.iter().map(|t| t.label()).collect();
    let budgets: Vec<&str> = Budget::ALL.iter().map(|b| b.label()).collect();

    let _ = write!(
        out,
        "<form method=\"post\" action=\"/contact\">\
         <input type=\"hidden\" name=\"sid\" value=\"{}\">\
         <label for=\"name\">Name *</label><input id=\"name\" name=\"name\" value=\"{}\">\
         <label for=\"email\">Email *</label><input id=\"email\" name=\"email\" type=\"email\" value=\"{}\">\
         <label for=\"company\">Company</label><input id=\"company\" name=\"company\" value=\"{}\">",
        escape_html(sid),
        escape_html(&form.name),
        escape_html(&form.email),
        escape_html(&form.company),
    );
    select(&mut out, "topic", "Topic", &topics, selected_topic);
    select(&mut out, "budget", "Budget", &budgets, selected_budget);
    let _ = write!(
        out,
        "<label for=\"message\">Message *</label>\
         <textarea id=\"message\" name=\"message\" rows=\"6\">{}</textarea>\
         <div class=\"hp\" aria-hidden=\"true\"><label for=\"website\">Leave this empty</label>\
         <input id=\"website\" name=\"website\" tabindex=\"-1\" autocomplete=\"off\" value=\"\"></div>\
         <p><button type=\"submit\">Send</button></p></form></section>",
        escape_html(&form.message),
    );

    footer(&mut out, company);
    out
}

/// Read-only table of stored leads.
pub fn render_admin(company: &CompanyInfo, rows: &[LeadRow]) -> String {
    let mut out = String::new();
    open_document(&mut out, &format!("Leads · {}", company.name));
    out.push_str("<h4>Leads (private)</h4>");

    if rows.is_empty() {
        out.push_str("<p class=\"notice warning\">No leads yet.</p>");
    } else {
        out.push_str("<p><a href=\"/admin/leads.csv\">Download leads.csv</a></p><table><thead><tr>");
        for column in HEADER {
            let _ = write!(out, "<th>{column}</th>");
        }
        out.push_str("</tr></thead><tbody>");
        for row in rows {
            out.push_str("<tr>");
            for field in row.fields() {
                let _ = write!(out, "<td>{}</td>", escape_html(field));
            }
            out.push_str("</tr>");
        }
        out.push_str("</tbody></table>");
    }

    footer(&mut out, company);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn page_carries_session_id_and_empty_honeypot() {
        let html = render_page(&CompanyInfo::default(), "sid-123", None, &ContactForm::default());
        assert!(html.contains(r#"name="sid" value="sid-123""#));
        assert!(html.contains(r#"name="website""#));
        assert!(html.contains(r#"<option value="Other" selected>"#));
        assert!(html.contains(r#"<option value="Not sure" selected>"#));
    }

    #[test]
    fn page_refills_and_escapes_rejected_values() {
        let form = ContactForm {
            name: "<b>Ann</b>".into(),
            topic: "Measurement & QA".into(),
            ..Default::default()
        };
        let notice = Notice {
            kind: NoticeKind::Error,
            text: "Please enter a valid email address.".into(),
        };
        let html = render_page(&CompanyInfo::default(), "s", Some(&notice), &form);
        assert!(html.contains("&lt;b&gt;Ann&lt;/b&gt;"));
        assert!(!html.contains("<b>Ann</b>"));
        assert!(html.contains(r#"<option value="Measurement &amp; QA" selected>"#));
        assert!(html.contains("Please enter a valid email address."));
    }

    #[test]
    fn admin_view_lists_rows_escaped() {
        let rows = vec![LeadRow {
            name: "<i>Eve</i>".into(),
            ..Default::default()
        }];
        let html = render_admin(&CompanyInfo::default(), &rows);
        assert!(html.contains("<th>session_id</th>"));
        assert!(html.contains("&lt;i&gt;Eve&lt;/i&gt;"));
        assert!(html.contains("Download leads.csv"));
    }

    #[test]
    fn admin_view_without_rows() {
        let html = render_admin(&CompanyInfo::default(), &[]);
        assert!(html.contains("No leads yet."));
    }
}
