//! Markdown tables returned in the `message` of list responses.

use crate::database::models::{Gameday, TeamMemberWithTeam};

/// One row per team, members as `@label` in join order.
pub fn teams_table(members: &[TeamMemberWithTeam]) -> String {
    let mut rows: Vec<(&str, &str, Vec<String>)> = Vec::new();
    for m in members {
        match rows.iter_mut().find(|(team_id, _, _)| *team_id == m.member.team_id) {
            Some((_, _, labels)) => labels.push(format!("@{}", escape(&m.member.label))),
            None => rows.push((
                m.member.team_id.as_str(),
                m.team_name.as_str(),
                vec![format!("@{}", escape(&m.member.label))],
            )),
        }
    }

    let mut txt = String::from("| Team | Members |\n| :-- | :-- |\n");
    for (_, team_name, labels) in rows {
        txt.push_str(&format!("| {} | {} |\n", escape(team_name), labels.join(", ")));
    }
    txt
}

pub fn gamedays_table(gamedays: &[Gameday]) -> String {
    let mut txt = String::from("| Title | Team | Scheduled At | State |\n| :-- | :-- | :-- | :-- |\n");
    for g in gamedays {
        txt.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            escape(&g.title),
            escape(&g.team_name),
            g.scheduled_at_display(),
            g.state
        ));
    }
    txt
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|")
}
