use std::io::stdout;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use promise_lens_core::{DisplayState, Intent, Status, ViewRow};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::replay::Replay;

const SENT_HISTORY: usize = 6;

fn status_color(status: Status) -> Color {
    match status {
        Status::Pending => Color::Yellow,
        Status::Fulfilled => Color::Green,
        Status::Rejected => Color::Red,
    }
}

fn row_line(row: &ViewRow) -> Line<'static> {
    let marker = match (row.has_children, row.collapsed) {
        (false, _) => "  ",
        (true, true) => "▸ ",
        (true, false) => "▾ ",
    };
    let mut spans = vec![
        Span::raw("  ".repeat(row.depth)),
        Span::raw(marker),
        Span::styled(
            row.label.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(row.status_text, Style::default().fg(status_color(row.status))),
    ];
    if let Some(summary) = &row.value_summary {
        let style = if row.is_object_like {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(summary.clone(), style));
    }
    if let Some(elapsed) = &row.elapsed_text {
        spans.push(Span::styled(
            format!("  {elapsed}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if row.can_trace {
        spans.push(Span::styled("  [t]race", Style::default().fg(Color::Blue)));
    }
    if let Some(action) = row.console_action {
        spans.push(Span::styled(
            format!("  [c] {}", action.label()),
            Style::default().fg(Color::Blue),
        ));
    }
    Line::from(spans)
}

fn draw(frame: &mut Frame<'_>, replay: &Replay, rows: &[ViewRow], list_state: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(SENT_HISTORY as u16 + 2),
        ])
        .split(frame.area());

    let header = Paragraph::new(format!(
        " promise-lens | [{}] instrument with stack | {} queued | n next  a all  enter toggle  o inspect  r refresh  x clear  s stack  p probe  g observe  q quit ",
        if replay.instrument_with_stack { "x" } else { " " },
        replay.remaining(),
    ))
    .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(header, chunks[0]);

    let body = Block::default().borders(Borders::ALL).title(" Promises ");
    match replay.panel().display_state() {
        DisplayState::Checking => {
            let text = Paragraph::new("Waiting for the runtime to report promise support...")
                .block(body);
            frame.render_widget(text, chunks[1]);
        }
        DisplayState::Unsupported => {
            let text = Paragraph::new(
                "Promises not detected! The inspected runtime does not support promise instrumentation.",
            )
            .style(Style::default().fg(Color::Red))
            .block(body);
            frame.render_widget(text, chunks[1]);
        }
        DisplayState::AwaitingPromises => {
            let text = Paragraph::new(
                "No promises seen yet. Press r to reload the page so instrumentation can attach.",
            )
            .block(body);
            frame.render_widget(text, chunks[1]);
        }
        DisplayState::Tree => {
            let items: Vec<ListItem<'_>> = rows
                .iter()
                .map(|row| ListItem::new(row_line(row)))
                .collect();
            let list = List::new(items)
                .block(body)
                .highlight_style(Style::default().bg(Color::Rgb(40, 40, 60)));
            frame.render_stateful_widget(list, chunks[1], list_state);
        }
    }

    let sent: Vec<ListItem<'_>> = replay
        .sent()
        .iter()
        .rev()
        .take(SENT_HISTORY)
        .map(|message| {
            let envelope = message.to_envelope();
            let payload = envelope
                .payload
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            ListItem::new(format!("-> {} {payload}", envelope.name))
        })
        .collect();
    frame.render_widget(
        List::new(sent).block(Block::default().borders(Borders::ALL).title(" Sent ")),
        chunks[2],
    );
}

pub fn run_tui(replay: &mut Replay) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, replay);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    replay: &mut Replay,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        let rows = replay.panel().rows();
        match list_state.selected() {
            _ if rows.is_empty() => list_state.select(None),
            None => list_state.select(Some(0)),
            Some(index) if index >= rows.len() => list_state.select(Some(rows.len() - 1)),
            Some(_) => {}
        }
        let selected = list_state.selected().and_then(|index| rows.get(index));
        let promise_id = selected.map(|row| row.guid);

        terminal.draw(|frame| draw(frame, replay, &rows, &mut list_state))?;

        if !event::poll(std::time::Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let intent = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Up => {
                list_state.select_previous();
                None
            }
            KeyCode::Down => {
                list_state.select_next();
                None
            }
            KeyCode::Char('n') => {
                replay.step();
                None
            }
            KeyCode::Char('a') => {
                replay.replay_all();
                None
            }
            KeyCode::Char('p') => {
                replay.probe();
                None
            }
            KeyCode::Char('g') => {
                replay.observe();
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                promise_id.map(|promise_id| Intent::Toggle { promise_id })
            }
            KeyCode::Char('t') => selected
                .filter(|row| row.can_trace)
                .map(|row| Intent::TracePromise { promise_id: row.guid }),
            KeyCode::Char('c') => selected
                .filter(|row| row.console_action.is_some())
                .map(|row| Intent::SendValueToConsole { promise_id: row.guid }),
            KeyCode::Char('o') => selected
                .filter(|row| row.is_object_like)
                .map(|row| Intent::InspectObject { promise_id: row.guid }),
            KeyCode::Char('s') => Some(Intent::SetInstrumentWithStack {
                instrument_with_stack: !replay.instrument_with_stack,
            }),
            KeyCode::Char('r') => Some(Intent::Refresh),
            KeyCode::Char('x') => Some(Intent::Clear),
            _ => None,
        };
        if let Some(intent) = intent {
            replay.dispatch(intent);
        }
    }

    Ok(())
}
