use std::collections::VecDeque;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Tabs};

use skirmish::relay::{ClientInfo, RelayEvent, RelayStats};

const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Connections,
    Log,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Overview, Tab::Connections, Tab::Log];

    fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Connections => "Connections",
            Tab::Log => "Log",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn color(self) -> Color {
        match self {
            LogLevel::Info => Color::White,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub secs: u64,
    pub level: LogLevel,
    pub text: String,
}

/// Dashboard state. In TUI mode this log pane replaces `env_logger`; relay
/// events are the only thing written to it.
pub struct TuiState {
    started_at: Instant,
    logs: VecDeque<LogLine>,
    scroll: usize,
    tab: Tab,
    selected: usize,
    pending_kick: Option<u32>,
    quit: bool,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            logs: VecDeque::new(),
            scroll: 0,
            tab: Tab::Overview,
            selected: 0,
            pending_kick: None,
            quit: false,
        }
    }

    pub fn active_tab(&self) -> Tab {
        self.tab
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn logs(&self) -> &VecDeque<LogLine> {
        &self.logs
    }

    pub fn log_info(&mut self, text: impl Into<String>) {
        self.push_log(LogLevel::Info, text.into());
    }

    pub fn log_warn(&mut self, text: impl Into<String>) {
        self.push_log(LogLevel::Warn, text.into());
    }

    pub fn log_error(&mut self, text: impl Into<String>) {
        self.push_log(LogLevel::Error, text.into());
    }

    fn push_log(&mut self, level: LogLevel, text: String) {
        if self.logs.len() == MAX_LOG_LINES {
            self.logs.pop_front();
        }
        self.logs.push_back(LogLine {
            secs: self.started_at.elapsed().as_secs(),
            level,
            text,
        });
    }

    pub fn record(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::Listening { addr } => self.log_info(format!("Listening on {}", addr)),
            RelayEvent::ClientConnected { client_id, addr } => {
                self.log_info(format!("Client {} connected from {}", client_id, addr));
            }
            RelayEvent::ClientDisconnected { client_id, reason } => {
                self.log_info(format!("Client {} {}", client_id, reason.as_str()));
            }
            RelayEvent::ConnectionDenied { addr, reason } => {
                self.log_warn(format!("Connection denied to {}: {}", addr, reason));
            }
            RelayEvent::Error { message } => self.log_error(message),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers, clients: &[ClientInfo]) {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Tab => self.next_tab(),
            KeyCode::BackTab => self.prev_tab(),
            KeyCode::PageUp => self.scroll_up(),
            KeyCode::PageDown => self.scroll_down(),
            KeyCode::End => self.scroll = 0,
            KeyCode::Up if self.tab == Tab::Connections => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down if self.tab == Tab::Connections => {
                self.selected = (self.selected + 1).min(clients.len().saturating_sub(1));
            }
            KeyCode::Char('k') | KeyCode::Char('K') if self.tab == Tab::Connections => {
                self.request_kick(clients);
            }
            _ => {}
        }
    }

    pub fn take_pending_kick(&mut self) -> Option<u32> {
        self.pending_kick.take()
    }

    fn request_kick(&mut self, clients: &[ClientInfo]) {
        if let Some(client) = clients.get(self.selected) {
            self.pending_kick = Some(client.client_id);
        }
    }

    fn next_tab(&mut self) {
        self.tab = Tab::ALL[(self.tab.index() + 1) % Tab::ALL.len()];
    }

    fn prev_tab(&mut self) {
        self.tab = Tab::ALL[(self.tab.index() + Tab::ALL.len() - 1) % Tab::ALL.len()];
    }

    fn scroll_up(&mut self) {
        self.scroll = (self.scroll + 10).min(self.logs.len().saturating_sub(1));
    }

    fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(10);
    }
}

pub fn render(frame: &mut Frame, state: &TuiState, stats: &RelayStats, clients: &[ClientInfo]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], stats);
    render_capacity(frame, chunks[1], stats);
    render_tabs(frame, chunks[2], state.active_tab());
    match state.active_tab() {
        Tab::Overview => render_network(frame, chunks[3], stats),
        Tab::Connections => render_connections(frame, chunks[3], state, clients),
        Tab::Log => render_log(frame, chunks[3], state),
    }
    render_help(frame, chunks[4], state.active_tab());
}

fn render_header(frame: &mut Frame, area: Rect, stats: &RelayStats) {
    let title = format!(" Skirmish Relay - Uptime: {} ", format_duration(stats.uptime_secs));

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let text = format!(
        "Clients: {}  |  Total connections: {}  |  Messages relayed: {}",
        stats.client_count, stats.total_connections, stats.messages_relayed
    );

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn render_capacity(frame: &mut Frame, area: Rect, stats: &RelayStats) {
    let block = Block::default()
        .title(" Capacity ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let max = stats.max_clients.max(1);
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(Color::Green))
        .ratio((stats.client_count as f64 / max as f64).min(1.0))
        .label(format!("{}/{} clients", stats.client_count, stats.max_clients));

    frame.render_widget(gauge, area);
}

fn render_tabs(frame: &mut Frame, area: Rect, active: Tab) {
    let titles: Vec<&str> = Tab::ALL.iter().map(|t| t.title()).collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(active.index())
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn render_network(frame: &mut Frame, area: Rect, stats: &RelayStats) {
    let block = Block::default()
        .title(" Network ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let net = &stats.network_stats;
    let lines = vec![
        stat_line(
            "Packets: ",
            format!("{} sent / {} recv", net.packets_sent, net.packets_received),
        ),
        stat_line(
            "Bytes: ",
            format!(
                "{} sent / {} recv",
                format_bytes(net.bytes_sent),
                format_bytes(net.bytes_received)
            ),
        ),
        stat_line("Dropped: ", net.packets_dropped.to_string()),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_connections(frame: &mut Frame, area: Rect, state: &TuiState, clients: &[ClientInfo]) {
    let block = Block::default()
        .title(" Connections ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    if clients.is_empty() {
        let empty = Paragraph::new("No clients connected")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let selected = state.selected.min(clients.len() - 1);
    let lines: Vec<Line> = clients
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let style = if i == selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(
                format!(
                    "#{:<4} {:<22} up {}  in {} / out {}",
                    c.client_id,
                    c.addr,
                    format_duration(c.uptime.as_secs()),
                    format_bytes(c.stats.bytes_received),
                    format_bytes(c.stats.bytes_sent),
                ),
                style,
            ))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_log(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Log ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let visible = area.height.saturating_sub(2) as usize;
    let end = state.logs.len().saturating_sub(state.scroll);
    let start = end.saturating_sub(visible);

    let lines: Vec<Line> = state
        .logs
        .iter()
        .skip(start)
        .take(end - start)
        .map(|line| {
            Line::from(vec![
                Span::styled(
                    format!("[{}] ", format_duration(line.secs)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(line.text.clone(), Style::default().fg(line.level.color())),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect, tab: Tab) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let hint = match tab {
        Tab::Connections => "Up/Down select, 'k' kick, Tab switch, 'q' quit",
        Tab::Log => "PgUp/PgDn scroll, End latest, Tab switch, 'q' quit",
        Tab::Overview => "Tab switch, 'q' or ESC quit",
    };
    let text = Paragraph::new(hint).block(block).style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    );

    frame.render_widget(text, area);
}

fn stat_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1}GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
