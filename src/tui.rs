use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::db::Database;
use crate::models::{ApplicationStatus, Job, JobPatch};
use crate::store::EntityStore;
use crate::views::{self, JobFilter};

struct AppState {
    job_ids: Vec<String>,
    selected: usize,
    scroll_offset: u16,
}

impl AppState {
    fn new(job_ids: Vec<String>) -> Self {
        Self {
            job_ids,
            selected: 0,
            scroll_offset: 0,
        }
    }

    fn current_id(&self) -> Option<&str> {
        self.job_ids.get(self.selected).map(String::as_str)
    }

    fn current_job<'a>(&self, store: &'a EntityStore) -> Option<&'a Job> {
        self.current_id().and_then(|id| store.job(id))
    }

    fn next(&mut self) {
        if !self.job_ids.is_empty() && self.selected < self.job_ids.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }
}

fn status_for_key(code: KeyCode) -> Option<ApplicationStatus> {
    match code {
        KeyCode::Char('s') => Some(ApplicationStatus::Saved),
        KeyCode::Char('a') => Some(ApplicationStatus::Applied),
        KeyCode::Char('i') => Some(ApplicationStatus::Interviewing),
        KeyCode::Char('o') => Some(ApplicationStatus::Offer),
        KeyCode::Char('x') => Some(ApplicationStatus::Rejected),
        KeyCode::Char('w') => Some(ApplicationStatus::Withdrawn),
        _ => None,
    }
}

pub fn run_browse(store: &mut EntityStore, db: &Database, filter: &JobFilter) -> Result<()> {
    let job_ids: Vec<String> = filter
        .apply(store.jobs())
        .into_iter()
        .map(|j| j.id.clone())
        .collect();
    if job_ids.is_empty() {
        println!("No jobs found.");
        return Ok(());
    }

    let mut state = AppState::new(job_ids);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, store, db);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    store: &mut EntityStore,
    db: &Database,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw(frame, state, store, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                code => {
                    if let (Some(status), Some(id)) = (status_for_key(code), state.current_id()) {
                        if store.update_job(id, JobPatch::status(status)) {
                            store.save(db)?;
                        }
                    }
                }
            }
            list_state.select(Some(state.selected));
        }
    }
    Ok(())
}

fn status_style(status: ApplicationStatus) -> Style {
    match status {
        ApplicationStatus::Saved => Style::default(),
        ApplicationStatus::Applied => Style::default().fg(Color::Cyan),
        ApplicationStatus::Interviewing => Style::default().fg(Color::Magenta),
        ApplicationStatus::Offer => Style::default().fg(Color::Green),
        ApplicationStatus::Rejected => Style::default().fg(Color::Red),
        ApplicationStatus::Withdrawn => Style::default().fg(Color::DarkGray),
    }
}

fn draw(frame: &mut Frame, state: &AppState, store: &EntityStore, list_state: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(65),
        ])
        .split(frame.area());

    // Left panel: job list
    let items: Vec<ListItem> = state
        .job_ids
        .iter()
        .filter_map(|id| store.job(id))
        .map(|job| {
            let status_icon = match job.status {
                ApplicationStatus::Saved => " ",
                ApplicationStatus::Applied => "+",
                ApplicationStatus::Interviewing => "*",
                ApplicationStatus::Offer => "$",
                ApplicationStatus::Rejected => "x",
                ApplicationStatus::Withdrawn => "-",
            };
            let title = if job.title.chars().count() > 35 {
                format!("{}...", job.title.chars().take(32).collect::<String>())
            } else {
                job.title.clone()
            };
            ListItem::new(format!("{} {} | {}", status_icon, title, job.company))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Jobs ({}) ", state.job_ids.len()
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: job detail
    let detail = build_detail(state, store);
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    // Footer help
    let help_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let help = Paragraph::new(
        " j/k:navigate  J/K:scroll  s:saved a:applied i:interviewing o:offer x:rejected w:withdrawn  q:quit"
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, help_area[1]);
}

fn build_detail<'a>(state: &AppState, store: &'a EntityStore) -> Text<'a> {
    let Some(job) = state.current_job(store) else {
        return Text::raw("No job selected");
    };

    let mut lines: Vec<Line> = Vec::new();

    // Header
    lines.push(Line::from(Span::styled(
        &job.title,
        Style::default().add_modifier(Modifier::BOLD),
    )));

    if job.location.is_empty() {
        lines.push(Line::from(format!("at {}", job.company)));
    } else {
        lines.push(Line::from(format!("at {} ({})", job.company, job.location)));
    }

    lines.push(Line::from(Span::styled(
        format!("Status: {}", job.status),
        status_style(job.status),
    )));

    lines.push(Line::from(format!("Posted: {}", job.date_posted)));
    if let Some(deadline) = job.application_deadline {
        lines.push(Line::from(format!("Deadline: {}", deadline)));
    }
    if let Some(salary) = &job.salary {
        lines.push(Line::from(format!("Salary: {}", salary)));
    }
    if !job.url.is_empty() {
        lines.push(Line::from(format!("URL: {}", job.url)));
    }

    lines.push(Line::from(""));

    if !job.description.is_empty() {
        push_heading(&mut lines, "DESCRIPTION");
        for line in textwrap::fill(&job.description, 70).lines() {
            lines.push(Line::from(format!("  {}", line)));
        }
        lines.push(Line::from(""));
    }

    for (heading, items) in [
        ("RESPONSIBILITIES", &job.responsibilities),
        ("QUALIFICATIONS", &job.qualifications),
    ] {
        if items.is_empty() {
            continue;
        }
        push_heading(&mut lines, heading);
        for item in items {
            lines.push(Line::from(format!("  - {}", item)));
        }
        lines.push(Line::from(""));
    }

    if let Some(notes) = &job.notes {
        push_heading(&mut lines, "NOTES");
        for line in textwrap::fill(notes, 70).lines() {
            lines.push(Line::from(format!("  {}", line)));
        }
        lines.push(Line::from(""));
    }

    let applications = views::applications_for_job(store, &job.id);
    if applications.is_empty() {
        lines.push(Line::from(Span::styled(
            "(No applications - run: career app add)",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        push_heading(&mut lines, "APPLICATIONS");
        for app in applications {
            let labels = views::application_labels(store, app);
            lines.push(Line::from(vec![
                Span::raw(format!("  {} ", app.applied_date)),
                Span::styled(format!("{:<13}", app.status), status_style(app.status)),
                Span::raw(format!(" with {}", labels.resume)),
            ]));
        }
    }

    Text::from(lines)
}

fn push_heading(lines: &mut Vec<Line<'_>>, heading: &str) {
    lines.push(Line::from(Span::styled(
        heading.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
}
