use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::action::Focus;
use crate::app::App;
use crate::types::{IssueEdge, Organization, Repository};

const UNKNOWN_ORGANIZATION: &str = "Unknown organization";
const UNKNOWN_REPOSITORY: &str = "Unknown Repository";
const MORE_HINT: &str = " [m] More ";

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if app.state.has_errors() {
        render_errors(frame, &app.state.errors, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let organization = app.state.organization.as_ref();
    render_summary(frame, organization, chunks[0]);

    match organization.and_then(|o| o.repository.as_ref()) {
        Some(repo) => render_issue_list(frame, app, repo, chunks[1]),
        None => {
            let block = Block::default().borders(Borders::ALL).title(" Issues ");
            let text = if app.loading && organization.is_none() {
                ""
            } else {
                UNKNOWN_REPOSITORY
            };
            let empty = Paragraph::new(text)
                .block(block)
                .style(Style::default().fg(Color::Gray));
            frame.render_widget(empty, chunks[1]);
        }
    }
}

fn render_errors(frame: &mut Frame, errors: &[String], area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Something went wrong:",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(
        errors
            .iter()
            .map(|message| Line::from(format!("  • {}", message))),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_summary(frame: &mut Frame, organization: Option<&Organization>, area: Rect) {
    let label = Style::default().add_modifier(Modifier::BOLD);
    let link = Style::default().fg(Color::DarkGray);

    let mut org_line = vec![
        Span::styled("Issues from Organization: ", label),
        Span::styled(
            organization_name(organization),
            Style::default().fg(Color::Cyan),
        ),
    ];
    if let Some(org) = organization {
        org_line.push(Span::styled(link_label(&org.url), link));
    }

    let repo_line = match organization.and_then(|o| o.repository.as_ref()) {
        Some(repo) => Line::from(vec![
            Span::styled("In Repository: ", label),
            Span::styled(repo.name.as_str(), Style::default().fg(Color::Cyan)),
            Span::styled(link_label(&repo.url), link),
            Span::raw(format!("  {}", showing_label(repo))),
        ]),
        None => Line::from(Span::styled(
            UNKNOWN_REPOSITORY,
            Style::default().fg(Color::Gray),
        )),
    };

    let summary = Paragraph::new(vec![Line::from(org_line), repo_line])
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(summary, area);
}

fn render_issue_list(frame: &mut Frame, app: &App, repo: &Repository, area: Rect) {
    let is_active = app.focus == Focus::Issues;
    let edges = repo.issues.as_ref().map(|i| i.edges.as_slice()).unwrap_or_default();

    let mut block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Open issues ({}) ", edges.len()))
        .border_style(if is_active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        });
    if has_more(repo) {
        block = block
            .title(Span::styled(MORE_HINT, Style::default().fg(Color::Green)))
            .title_bottom(Span::styled(MORE_HINT, Style::default().fg(Color::Green)));
    }

    if edges.is_empty() {
        let empty = Paragraph::new("No Issues")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = edges
        .iter()
        .enumerate()
        .map(|(i, issue)| issue_item(i, issue, is_active && i == app.issue_index))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    if is_active {
        state.select(Some(app.issue_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn issue_item(index: usize, issue: &IssueEdge, selected: bool) -> ListItem<'static> {
    let style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let emoji: String = issue
        .reactions
        .contents
        .iter()
        .take(10)
        .map(|c| c.to_string())
        .collect();

    let title = Line::from(vec![
        Span::styled(format!("{:>3}. ", index + 1), Style::default().fg(Color::Cyan)),
        Span::styled(issue.title.clone(), style),
    ]);
    let detail = Line::from(vec![
        Span::raw("     "),
        Span::styled(
            issue.reactions.to_string(),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw(" "),
        Span::raw(emoji),
        Span::raw("  "),
        Span::styled(issue.url.clone(), Style::default().fg(Color::DarkGray)),
    ]);

    ListItem::new(vec![title, detail])
}

/// "  (<url>)" shown after a name
fn link_label(url: &str) -> String {
    format!("  ({})", url)
}

fn organization_name(organization: Option<&Organization>) -> String {
    organization
        .and_then(|o| o.name.clone())
        .unwrap_or_else(|| UNKNOWN_ORGANIZATION.to_string())
}

/// "(Showing n issues out of total)" for the accumulated edges
fn showing_label(repo: &Repository) -> String {
    let (shown, total) = repo
        .issues
        .as_ref()
        .map(|i| (i.edges.len() as u64, i.total_count))
        .unwrap_or((0, 0));
    format!("(Showing {} issues out of {})", shown, total)
}

fn has_more(repo: &Repository) -> bool {
    repo.issues
        .as_ref()
        .is_some_and(|i| i.page_info.has_next_page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::tests::page;

    #[test]
    fn complete_first_page_has_no_more() {
        let org = page("octocat", "hello-world", &["a", "b"], 2, None, false);
        let repo = org.repository.as_ref().unwrap();
        assert_eq!(showing_label(repo), "(Showing 2 issues out of 2)");
        assert!(!has_more(repo));
    }

    #[test]
    fn partial_page_offers_more() {
        let org = page("octocat", "hello-world", &["a", "b"], 12, Some("X"), true);
        let repo = org.repository.as_ref().unwrap();
        assert_eq!(showing_label(repo), "(Showing 2 issues out of 12)");
        assert!(has_more(repo));
    }

    #[test]
    fn links_are_parenthesized() {
        assert_eq!(
            link_label("https://github.com/octocat"),
            "  (https://github.com/octocat)"
        );
    }

    #[test]
    fn organization_name_falls_back() {
        let mut org = page("octocat", "hello-world", &[], 0, None, false);
        assert_eq!(organization_name(Some(&org)), "octocat");
        org.name = None;
        assert_eq!(organization_name(Some(&org)), UNKNOWN_ORGANIZATION);
        assert_eq!(organization_name(None), UNKNOWN_ORGANIZATION);
    }

    #[test]
    fn repository_without_connection_shows_zero() {
        let mut org = page("octocat", "hello-world", &[], 0, None, false);
        let repo = org.repository.as_mut().unwrap();
        repo.issues = None;
        assert_eq!(showing_label(repo), "(Showing 0 issues out of 0)");
        assert!(!has_more(repo));
    }
}
