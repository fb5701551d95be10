//! Terminal rendering of progress, tables and listings

use comfy_table::{Cell, Color, Table};
use council_core::{AgentStatus, Catalog};
use council_engine::{Council, Plan, PlanStep, RunEvent};

fn status_cell(status: AgentStatus) -> Cell {
    let color = match status {
        AgentStatus::Idle => Color::DarkGrey,
        AgentStatus::Fetching | AgentStatus::Analyzing => Color::Yellow,
        AgentStatus::Success => Color::Green,
        AgentStatus::Error => Color::Red,
    };
    Cell::new(status).fg(color)
}

/// One progress line per interesting event
pub fn event_line(event: &RunEvent) -> Option<String> {
    let line = match event {
        RunEvent::RunStarted { run_id, subject_id } => {
            format!("Run {run_id} started for {subject_id}")
        }
        RunEvent::StepStarted { step } => format!("== {step}"),
        RunEvent::AgentStatusChanged { role, status } => format!("   {role}: {status}"),
        RunEvent::EvidenceResolved {
            role,
            sources,
            from_fallback: true,
        } => format!("   {role}: {sources} fallback sources"),
        RunEvent::Thought { role, cue } => format!("   {role}: {cue}..."),
        RunEvent::DebateMessage {
            speaker,
            round,
            content,
            ..
        } => format!("   [{round}] {speaker}: {content}"),
        RunEvent::DebateFinished { checkpoint, score } => {
            format!("   {} concluded at {score}/100", checkpoint.label())
        }
        RunEvent::RunAborted { subject_id, reason } => {
            format!("Run for {subject_id} aborted: {reason}")
        }
        RunEvent::StepSettled { .. }
        | RunEvent::EvidenceResolved { .. }
        | RunEvent::Tick { .. }
        | RunEvent::RunFinished { .. } => return None,
    };
    Some(line)
}

/// Status of every agent after a run
pub fn status_table(council: &Council) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Agent").fg(Color::Cyan),
        Cell::new("Stage").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Tokens").fg(Color::Cyan),
        Cell::new("Evidence").fg(Color::Cyan),
    ]);

    for (role, state) in council.agent_states() {
        let evidence: u64 = state.evidence_sources.iter().map(|source| source.count).sum();
        table.add_row(vec![
            Cell::new(role.title()),
            Cell::new(role.stage().number()),
            status_cell(state.status),
            Cell::new(state.token_estimate),
            Cell::new(evidence),
        ]);
    }
    table
}

/// The catalogued agents
pub fn catalog_table(catalog: &Catalog) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Id").fg(Color::Cyan),
        Cell::new("Title").fg(Color::Cyan),
        Cell::new("Stage").fg(Color::Cyan),
        Cell::new("Group").fg(Color::Cyan),
    ]);

    for definition in catalog.iter() {
        table.add_row(vec![
            Cell::new(definition.id),
            Cell::new(definition.title),
            Cell::new(definition.stage),
            Cell::new(definition.subgroup.map_or("-", |subgroup| subgroup.label())),
        ]);
    }
    table
}

/// One line per plan step
pub fn plan_listing(plan: &Plan) -> String {
    let mut listing = String::new();
    for (i, step) in plan.steps().iter().enumerate() {
        let detail = match step {
            PlanStep::Group { roles, .. } => roles
                .iter()
                .map(|role| role.title())
                .collect::<Vec<_>>()
                .join(", "),
            PlanStep::Debate(checkpoint) => format!("debate ({checkpoint:?})"),
        };
        listing.push_str(&format!("{}. {}: {detail}\n", i + 1, step.label()));
    }
    listing
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_core::{AgentRole, DebateCheckpoint};

    #[test]
    fn test_event_lines() {
        let line = event_line(&RunEvent::AgentStatusChanged {
            role: AgentRole::NewsAnalyst,
            status: AgentStatus::Analyzing,
        });
        assert_eq!(line.as_deref(), Some("   News Analyst: analyzing"));

        let line = event_line(&RunEvent::DebateFinished {
            checkpoint: DebateCheckpoint::Thesis,
            score: 56,
        });
        assert_eq!(line.as_deref(), Some("   debate_a concluded at 56/100"));

        assert!(event_line(&RunEvent::Tick { elapsed_seconds: 3 }).is_none());
    }

    #[test]
    fn test_plan_listing() {
        let listing = plan_listing(&Plan::standard(&Catalog::standard()));
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(
            lines[0],
            "1. 1a: News Analyst, Social Sentiment Analyst, Regional Market Analyst"
        );
        assert_eq!(lines[3], "4. debate_a: debate (Thesis)");
        assert_eq!(lines[7], "8. stage4: Trader, Portfolio Manager");
    }

    #[test]
    fn test_catalog_table_lists_every_agent() {
        let rendered = catalog_table(&Catalog::standard()).to_string();
        assert!(rendered.contains("portfolio_manager"));
        assert!(rendered.contains("1c"));
    }
}
