//! Final report assembly

use crate::session::AnalysisSession;
use council_core::{AgentStatus, Catalog, Stage};

/// Project a session's settled agent outputs into one Markdown document
///
/// Returns `None` until the catalog's terminal decision role has settled.
/// Pure: the same session state always produces the same text.
pub fn assemble(catalog: &Catalog, session: &AnalysisSession) -> Option<String> {
    let terminal = catalog.terminal_role()?;
    if !session.board.status(terminal).is_terminal() {
        return None;
    }

    let snapshot = &session.snapshot;
    let mut report = format!(
        "# Research Council Report: {} ({})\n\nLast price {}, daily change {}\n",
        snapshot.name,
        snapshot.subject_id,
        snapshot.price_display(),
        snapshot.change_display()
    );

    for stage in Stage::ALL {
        let settled: Vec<_> = catalog
            .iter()
            .filter(|def| def.stage == stage)
            .filter_map(|def| {
                let state = session.board.agent(def.role)?;
                state.status.is_terminal().then_some((def, state))
            })
            .collect();
        if settled.is_empty() {
            continue;
        }

        report.push_str(&format!("\n## {stage}\n"));
        for (def, state) in settled {
            let marker = if state.status == AgentStatus::Error {
                " (analysis failed)"
            } else {
                ""
            };
            report.push_str(&format!("\n### {}{marker}\n\n{}\n", def.title, state.output.trim_end()));
        }
    }

    Some(report)
}
