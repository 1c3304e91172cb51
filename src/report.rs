//! Plain-text reference rendering of a round report.
//!
//! Lays out the same content the PDF collaborator embeds: header with the
//! validation token, task fields, per-item pass/fail checklist marks,
//! observations and the signature notice. Byte-level PDF layout stays with
//! the external renderer.

use std::fmt::Write;

use crate::boundary::ReportRenderer;
use crate::models::RoundLog;
use crate::utils::format_elapsed;

pub struct TextReportRenderer {
    company_name: String,
}

impl TextReportRenderer {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
        }
    }
}

impl ReportRenderer for TextReportRenderer {
    fn render(&self, log: &RoundLog) -> anyhow::Result<Vec<u8>> {
        Ok(render_summary(log, &self.company_name).into_bytes())
    }
}

pub fn render_summary(log: &RoundLog, company_name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{company_name}");
    let _ = writeln!(out, "Round Execution Report");
    let _ = writeln!(out, "Token: {}", log.validation_token);
    let _ = writeln!(out);
    let _ = writeln!(out, "Activity: {}", log.task_title);
    let _ = writeln!(out, "Sector: {}", log.sector);
    if let Some(ticket) = &log.ticket_id {
        let _ = writeln!(out, "Ticket: {ticket}");
    }
    let _ = writeln!(out, "Responsible: {}", log.responsible);
    let _ = writeln!(out, "Start: {}", log.start_time.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "End: {}", log.end_time.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Duration: {}", format_elapsed(log.duration_seconds));
    let _ = writeln!(out);
    let _ = writeln!(out, "Checklist:");
    for item in &log.checklist_state {
        let mark = if item.checked { "[OK]  " } else { "[FAIL]" };
        let _ = writeln!(out, "  {mark} {}", item.label);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Observations:");
    if log.observations.trim().is_empty() {
        let _ = writeln!(out, "  -");
    } else {
        for line in log.observations.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Status: {}",
        if log.issues_detected { "ISSUES DETECTED" } else { "OK" }
    );
    match &log.signature {
        Some(png) => {
            let _ = writeln!(out, "Signature: signed digitally ({} bytes PNG)", png.len());
        }
        None => {
            let _ = writeln!(out, "Signature: NOT SIGNED");
        }
    }
    out
}
